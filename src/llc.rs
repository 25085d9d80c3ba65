//! LLC/SNAP handling
//!
//! Decides when an Ethernet payload needs an 802.2 LLC/SNAP shim on its way
//! to 802.11 and when a received shim may be dropped on the way back
//! (IEEE Std 802.1H, RFC 1042).

use serde::{Deserialize, Serialize};

use crate::frame::{ETHER_TYPE_AARP, ETHER_TYPE_IPX, ETH_P_802_3_MIN};

pub const LLC_SNAP_EXTENSION: u8 = 0xaa;
pub const LLC_SNAP_UNNUMBERED_INFO: u8 = 0x03;

/// DSAP, SSAP, control and organization code
pub const SNAP_PREFIX_LEN: usize = 6;
/// SNAP prefix plus the 2-byte EtherType
pub const LLC_SNAP_LEN: usize = 8;

pub const RFC1042_SNAP_PREFIX: [u8; SNAP_PREFIX_LEN] = [0xaa, 0xaa, 0x03, 0x00, 0x00, 0x00];
pub const BRIDGE_TUNNEL_SNAP_PREFIX: [u8; SNAP_PREFIX_LEN] = [0xaa, 0xaa, 0x03, 0x00, 0x00, 0xf8];

/// SNAP organization code in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapEncoding {
    /// `00 00 00`
    Rfc1042,
    /// `00 00 F8`, used to tunnel AppleTalk ARP and IPX
    BridgeTunnel,
}

impl SnapEncoding {
    pub fn prefix(self) -> [u8; SNAP_PREFIX_LEN] {
        match self {
            Self::Rfc1042 => RFC1042_SNAP_PREFIX,
            Self::BridgeTunnel => BRIDGE_TUNNEL_SNAP_PREFIX,
        }
    }
}

/// EtherTypes that must travel in a Bridge-Tunnel SNAP header
pub fn needs_bridge_tunnel(ether_type: u16) -> bool {
    ether_type == ETHER_TYPE_AARP || ether_type == ETHER_TYPE_IPX
}

/// An 8-byte LLC/SNAP header carrying an EtherType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LlcSnapHeader {
    pub encoding: SnapEncoding,
    pub ether_type: u16,
}

impl LlcSnapHeader {
    /// Header to insert in front of a payload of the given type
    ///
    /// Returns `None` for 802.3 length values, which get no shim.
    pub fn for_ether_type(ether_type: u16) -> Option<Self> {
        if ether_type < ETH_P_802_3_MIN {
            return None;
        }

        let encoding = if needs_bridge_tunnel(ether_type) {
            SnapEncoding::BridgeTunnel
        } else {
            SnapEncoding::Rfc1042
        };
        Some(Self {
            encoding,
            ether_type,
        })
    }

    /// Classify the front of a received payload
    ///
    /// Returns `None` when the bytes are not a SNAP header with a recognized
    /// organization code.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < LLC_SNAP_LEN {
            return None;
        }
        if bytes[0] != LLC_SNAP_EXTENSION
            || bytes[1] != LLC_SNAP_EXTENSION
            || bytes[2] != LLC_SNAP_UNNUMBERED_INFO
        {
            return None;
        }

        let encoding = match &bytes[3..SNAP_PREFIX_LEN] {
            [0x00, 0x00, 0x00] => SnapEncoding::Rfc1042,
            [0x00, 0x00, 0xf8] => SnapEncoding::BridgeTunnel,
            _ => return None,
        };
        let ether_type = u16::from_be_bytes([bytes[6], bytes[7]]);

        Some(Self {
            encoding,
            ether_type,
        })
    }

    pub fn to_bytes(&self) -> [u8; LLC_SNAP_LEN] {
        let mut out = [0u8; LLC_SNAP_LEN];
        out[..SNAP_PREFIX_LEN].copy_from_slice(&self.encoding.prefix());
        out[SNAP_PREFIX_LEN..].copy_from_slice(&self.ether_type.to_be_bytes());
        out
    }

    /// Whether a received shim is removed when converting to Ethernet-II
    ///
    /// Bridge-Tunnel headers always go. RFC 1042 headers in front of
    /// AppleTalk ARP and IPX stay.
    pub fn strip_on_receive(&self) -> bool {
        match self.encoding {
            SnapEncoding::BridgeTunnel => true,
            SnapEncoding::Rfc1042 => !needs_bridge_tunnel(self.ether_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ETHER_TYPE_ARP, ETHER_TYPE_EAPOL, ETHER_TYPE_IPV4, ETHER_TYPE_IPV6};

    #[test]
    fn test_rfc1042_selection() {
        let ether_types = [
            ETHER_TYPE_IPV4,
            ETHER_TYPE_ARP,
            ETHER_TYPE_IPV6,
            ETHER_TYPE_EAPOL,
            0x0600,
        ];
        for ether_type in ether_types {
            let llc = LlcSnapHeader::for_ether_type(ether_type).unwrap();
            assert_eq!(llc.encoding, SnapEncoding::Rfc1042);
        }
    }

    #[test]
    fn test_bridge_tunnel_selection() {
        for ether_type in [ETHER_TYPE_AARP, ETHER_TYPE_IPX] {
            let llc = LlcSnapHeader::for_ether_type(ether_type).unwrap();
            assert_eq!(llc.encoding, SnapEncoding::BridgeTunnel);
            assert_eq!(llc.to_bytes()[5], 0xf8);
        }
    }

    #[test]
    fn test_length_field_gets_no_shim() {
        assert_eq!(LlcSnapHeader::for_ether_type(0x05ff), None);
        assert_eq!(LlcSnapHeader::for_ether_type(0x0040), None);
    }

    #[test]
    fn test_to_bytes() {
        let llc = LlcSnapHeader::for_ether_type(ETHER_TYPE_IPV4).unwrap();
        assert_eq!(llc.to_bytes(), [0xaa, 0xaa, 0x03, 0x00, 0x00, 0x00, 0x08, 0x00]);
    }

    #[test]
    fn test_parse() {
        let bytes = [0xaa, 0xaa, 0x03, 0x00, 0x00, 0xf8, 0x81, 0x37, 0x01];
        let llc = LlcSnapHeader::parse(&bytes).unwrap();
        assert_eq!(llc.encoding, SnapEncoding::BridgeTunnel);
        assert_eq!(llc.ether_type, ETHER_TYPE_IPX);

        // Unknown organization code
        assert_eq!(LlcSnapHeader::parse(&[0xaa, 0xaa, 0x03, 0x00, 0x17, 0xf2, 0x08, 0x00]), None);
        // Not SNAP
        assert_eq!(LlcSnapHeader::parse(&[0x42, 0x42, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00]), None);
        // Truncated
        assert_eq!(LlcSnapHeader::parse(&RFC1042_SNAP_PREFIX), None);
    }

    #[test]
    fn test_strip_on_receive() {
        let ip = LlcSnapHeader::for_ether_type(ETHER_TYPE_IPV4).unwrap();
        assert!(ip.strip_on_receive());

        let ipx = LlcSnapHeader::for_ether_type(ETHER_TYPE_IPX).unwrap();
        assert!(ipx.strip_on_receive());

        let ipx_rfc1042 = LlcSnapHeader {
            encoding: SnapEncoding::Rfc1042,
            ether_type: ETHER_TYPE_IPX,
        };
        assert!(!ipx_rfc1042.strip_on_receive());

        let aarp_rfc1042 = LlcSnapHeader {
            encoding: SnapEncoding::Rfc1042,
            ether_type: ETHER_TYPE_AARP,
        };
        assert!(!aarp_rfc1042.strip_on_receive());
    }
}
