//! Address slot assignment
//!
//! Which of the four 802.11 address fields hold the destination, the source
//! and the BSSID is fixed by the direction bits, and the direction bits of a
//! transmitted data frame are fixed by the network role. Both mappings live
//! here so that no call site decides address placement on its own.

use crate::config::NetworkRole;
use crate::frame::{Direction, Dot11Header, MacAddr};
use crate::{Result, XlatError};

/// Address fields for a transmitted data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddrs {
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub addr4: Option<MacAddr>,
    pub direction: Direction,
}

impl ResolvedAddrs {
    /// Data header carrying these addresses and direction bits
    pub fn to_header(&self) -> Dot11Header {
        let mut hdr = Dot11Header::data(self.direction);
        hdr.addr1 = self.addr1;
        hdr.addr2 = self.addr2;
        hdr.addr3 = self.addr3;
        hdr.addr4 = self.addr4;
        hdr
    }
}

/// Role and direction keyed address mapping
pub struct AddressTable;

impl AddressTable {
    /// Direction bits used for data frames sent in `role`
    pub fn direction_for(role: NetworkRole) -> Result<Direction> {
        match role {
            NetworkRole::AccessPoint => Ok(Direction::FromDs),
            NetworkRole::IndependentBss => Ok(Direction::NoDs),
            NetworkRole::Station => Ok(Direction::ToDs),
            NetworkRole::Monitor => Err(XlatError::UnsupportedRole(role)),
        }
    }

    /// Place `dest`, `src` and `bssid` for a frame sent in `role`
    ///
    /// - AccessPoint: DA, BSSID, SA
    /// - IndependentBss: DA, SA, BSSID
    /// - Station: BSSID, SA, DA
    pub fn resolve(
        role: NetworkRole,
        dest: MacAddr,
        src: MacAddr,
        bssid: MacAddr,
    ) -> Result<ResolvedAddrs> {
        let direction = Self::direction_for(role)?;
        let (addr1, addr2, addr3) = match direction {
            Direction::FromDs => (dest, bssid, src),
            Direction::NoDs => (dest, src, bssid),
            Direction::ToDs => (bssid, src, dest),
            // No role transmits four-address frames.
            Direction::DsToDs => return Err(XlatError::UnsupportedRole(role)),
        };

        Ok(ResolvedAddrs {
            addr1,
            addr2,
            addr3,
            addr4: None,
            direction,
        })
    }

    /// Destination and source of a received frame, by its direction bits
    pub fn endpoints(hdr: &Dot11Header) -> (MacAddr, MacAddr) {
        match hdr.direction() {
            Direction::NoDs => (hdr.addr1, hdr.addr2),
            Direction::ToDs => (hdr.addr3, hdr.addr2),
            Direction::FromDs => (hdr.addr1, hdr.addr3),
            // Parsed four-address headers always carry addr4.
            Direction::DsToDs => (hdr.addr3, hdr.addr4.unwrap_or_default()),
        }
    }

    /// Overwrite the two fields that hold destination and source
    pub fn set_endpoints(hdr: &mut Dot11Header, dest: MacAddr, src: MacAddr) {
        match hdr.direction() {
            Direction::NoDs => {
                hdr.addr1 = dest;
                hdr.addr2 = src;
            }
            Direction::ToDs => {
                hdr.addr2 = src;
                hdr.addr3 = dest;
            }
            Direction::FromDs => {
                hdr.addr1 = dest;
                hdr.addr3 = src;
            }
            Direction::DsToDs => {
                hdr.addr3 = dest;
                hdr.addr4 = Some(src);
            }
        }
    }
}
