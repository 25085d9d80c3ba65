//! Ethernet and IEEE 802.11 header structures
//!
//! This module contains the fixed header layouts the translator reads and
//! writes, together with the frame-control bit definitions they depend on.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qos::QosControl;
use crate::{Result, XlatError};

/// IEEE 802 MAC address
pub type MacAddr = [u8; 6];

pub const BROADCAST_ADDR: MacAddr = [0xff; 6];

/// Ethernet-II header: destination, source, type/length
pub const ETHERNET_HDR_LEN: usize = 14;
/// Three-address 802.11 data header
pub const DOT11_HDR_LEN: usize = 24;
/// Four-address 802.11 data header
pub const DOT11_ADDR4_HDR_LEN: usize = 30;
pub const QOS_CTRL_LEN: usize = 2;
pub const HT_CTRL_LEN: usize = 4;
/// Four-address QoS data header with HT control
pub const MAX_DOT11_HDR_LEN: usize = DOT11_ADDR4_HDR_LEN + QOS_CTRL_LEN + HT_CTRL_LEN;

/// Values of the Ethernet type/length field below this are 802.3 lengths
pub const ETH_P_802_3_MIN: u16 = 0x0600;

// https://www.iana.org/assignments/ieee-802-numbers/ieee-802-numbers.xhtml
pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_ARP: u16 = 0x0806;
pub const ETHER_TYPE_AARP: u16 = 0x80f3;
pub const ETHER_TYPE_IPX: u16 = 0x8137;
pub const ETHER_TYPE_IPV6: u16 = 0x86dd;
pub const ETHER_TYPE_EAPOL: u16 = 0x888e;

/// Frame control bits, as the little-endian u16 seen on the air
pub mod fc {
    pub const TYPE_MASK: u16 = 0x000c;
    pub const TYPE_MGMT: u16 = 0x0000;
    pub const TYPE_CTRL: u16 = 0x0004;
    pub const TYPE_DATA: u16 = 0x0008;
    pub const TYPE_EXT: u16 = 0x000c;
    pub const SUBTYPE_QOS: u16 = 0x0080;
    pub const TO_DS: u16 = 0x0100;
    pub const FROM_DS: u16 = 0x0200;
    pub const DIR_MASK: u16 = TO_DS | FROM_DS;
    pub const PROTECTED: u16 = 0x4000;
    pub const ORDER: u16 = 0x8000;
}

/// 802.11 frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Management,
    Control,
    Data,
    Extension,
}

/// Distribution-system direction bits of a frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    NoDs,
    ToDs,
    FromDs,
    DsToDs,
}

impl Direction {
    pub fn from_bits(frame_control: u16) -> Self {
        match frame_control & fc::DIR_MASK {
            fc::TO_DS => Self::ToDs,
            fc::FROM_DS => Self::FromDs,
            fc::DIR_MASK => Self::DsToDs,
            _ => Self::NoDs,
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            Self::NoDs => 0,
            Self::ToDs => fc::TO_DS,
            Self::FromDs => fc::FROM_DS,
            Self::DsToDs => fc::DIR_MASK,
        }
    }

    pub fn has_addr4(self) -> bool {
        self == Self::DsToDs
    }

    /// Header length without QoS or HT control fields
    pub fn base_header_len(self) -> usize {
        if self.has_addr4() {
            DOT11_ADDR4_HDR_LEN
        } else {
            DOT11_HDR_LEN
        }
    }
}

/// 802.11 frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FrameControl(pub u16);

impl FrameControl {
    /// Version 0 data frame with the given direction bits
    pub fn data(direction: Direction) -> Self {
        Self(fc::TYPE_DATA | direction.bits())
    }

    pub fn kind(self) -> FrameKind {
        match self.0 & fc::TYPE_MASK {
            fc::TYPE_MGMT => FrameKind::Management,
            fc::TYPE_CTRL => FrameKind::Control,
            fc::TYPE_DATA => FrameKind::Data,
            _ => FrameKind::Extension,
        }
    }

    pub fn is_data(self) -> bool {
        self.kind() == FrameKind::Data
    }

    pub fn direction(self) -> Direction {
        Direction::from_bits(self.0)
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.0 = (self.0 & !fc::DIR_MASK) | direction.bits();
    }

    /// QoS data frame: data type with the QoS subtype bit
    pub fn is_qos(self) -> bool {
        self.0 & (fc::TYPE_MASK | fc::SUBTYPE_QOS) == fc::TYPE_DATA | fc::SUBTYPE_QOS
    }

    pub fn set_qos(&mut self, qos: bool) {
        self.set_bit(fc::SUBTYPE_QOS, qos);
    }

    pub fn is_protected(self) -> bool {
        self.0 & fc::PROTECTED != 0
    }

    pub fn set_protected(&mut self, protected: bool) {
        self.set_bit(fc::PROTECTED, protected);
    }

    pub fn has_order(self) -> bool {
        self.0 & fc::ORDER != 0
    }

    pub fn set_order(&mut self, order: bool) {
        self.set_bit(fc::ORDER, order);
    }

    /// Length of the MAC header this frame control announces
    pub fn header_len(self) -> usize {
        let mut len = self.direction().base_header_len();
        if self.is_qos() {
            len += QOS_CTRL_LEN;
            if self.has_order() {
                len += HT_CTRL_LEN;
            }
        }
        len
    }

    fn set_bit(&mut self, bit: u16, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// Ethernet-II header, also the layout of an A-MSDU subframe header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthernetHeader {
    pub dest: MacAddr,
    pub src: MacAddr,
    pub ether_type: u16,
}

impl EthernetHeader {
    pub fn new(dest: MacAddr, src: MacAddr, ether_type: u16) -> Self {
        Self {
            dest,
            src,
            ether_type,
        }
    }

    /// Parse the header from the front of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ETHERNET_HDR_LEN {
            return Err(XlatError::BufferTooShort {
                needed: ETHERNET_HDR_LEN,
                available: bytes.len(),
            });
        }

        let mut buf = &bytes[..ETHERNET_HDR_LEN];
        let mut dest = [0u8; 6];
        let mut src = [0u8; 6];
        buf.copy_to_slice(&mut dest);
        buf.copy_to_slice(&mut src);
        let ether_type = buf.get_u16();

        Ok(Self {
            dest,
            src,
            ether_type,
        })
    }

    pub fn serialize(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.dest);
        buf.put_slice(&self.src);
        buf.put_u16(self.ether_type);
    }

    pub fn to_bytes(&self) -> [u8; ETHERNET_HDR_LEN] {
        let mut out = [0u8; ETHERNET_HDR_LEN];
        self.serialize(&mut &mut out[..]);
        out
    }

    /// Whether the type/length field holds an EtherType rather than a length
    pub fn has_ether_type(&self) -> bool {
        self.ether_type >= ETH_P_802_3_MIN
    }
}

/// IEEE 802.11 data frame MAC header
///
/// The optional fields are present exactly when the frame control announces
/// them; use [`crate::qos::insert_qos`] and [`crate::qos::strip_qos`] to keep
/// the two in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dot11Header {
    pub frame_control: FrameControl,
    pub duration: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: u16,
    pub addr4: Option<MacAddr>,
    pub qos_control: Option<QosControl>,
    pub ht_control: Option<u32>,
}

impl Dot11Header {
    /// Blank data header for the given direction
    pub fn data(direction: Direction) -> Self {
        Self {
            frame_control: FrameControl::data(direction),
            duration: 0,
            addr1: [0; 6],
            addr2: [0; 6],
            addr3: [0; 6],
            seq_ctrl: 0,
            addr4: direction.has_addr4().then_some([0; 6]),
            qos_control: None,
            ht_control: None,
        }
    }

    /// Length announced by the frame control at the front of `bytes`
    pub fn peek_len(bytes: &[u8]) -> Result<usize> {
        if bytes.len() < 2 {
            return Err(XlatError::BufferTooShort {
                needed: 2,
                available: bytes.len(),
            });
        }
        Ok(FrameControl(u16::from_le_bytes([bytes[0], bytes[1]])).header_len())
    }

    /// Parse a complete MAC header from the front of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let needed = Self::peek_len(bytes)?;
        if bytes.len() < needed {
            return Err(XlatError::BufferTooShort {
                needed,
                available: bytes.len(),
            });
        }

        let mut buf = &bytes[..needed];
        let frame_control = FrameControl(buf.get_u16_le());
        let duration = buf.get_u16_le();
        let addr1 = read_addr(&mut buf);
        let addr2 = read_addr(&mut buf);
        let addr3 = read_addr(&mut buf);
        let seq_ctrl = buf.get_u16_le();
        let addr4 = frame_control
            .direction()
            .has_addr4()
            .then(|| read_addr(&mut buf));

        let (qos_control, ht_control) = if frame_control.is_qos() {
            let qos = QosControl(buf.get_u16_le());
            let htc = frame_control.has_order().then(|| buf.get_u32_le());
            (Some(qos), htc)
        } else {
            (None, None)
        };

        Ok(Self {
            frame_control,
            duration,
            addr1,
            addr2,
            addr3,
            seq_ctrl,
            addr4,
            qos_control,
            ht_control,
        })
    }

    pub fn direction(&self) -> Direction {
        self.frame_control.direction()
    }

    /// Serialized length of this header
    pub fn header_len(&self) -> usize {
        let mut len = DOT11_HDR_LEN;
        if self.addr4.is_some() {
            len += 6;
        }
        if self.qos_control.is_some() {
            len += QOS_CTRL_LEN;
        }
        if self.ht_control.is_some() {
            len += HT_CTRL_LEN;
        }
        len
    }

    pub fn serialize(&self, buf: &mut impl BufMut) {
        buf.put_u16_le(self.frame_control.0);
        buf.put_u16_le(self.duration);
        buf.put_slice(&self.addr1);
        buf.put_slice(&self.addr2);
        buf.put_slice(&self.addr3);
        buf.put_u16_le(self.seq_ctrl);
        if let Some(addr4) = &self.addr4 {
            buf.put_slice(addr4);
        }
        if let Some(qos) = self.qos_control {
            buf.put_u16_le(qos.0);
        }
        if let Some(htc) = self.ht_control {
            buf.put_u32_le(htc);
        }
    }

    /// Write the header to the front of `out`, returning the bytes written
    pub fn write_to(&self, out: &mut [u8]) -> Result<usize> {
        let len = self.header_len();
        if out.len() < len {
            return Err(XlatError::BufferTooShort {
                needed: len,
                available: out.len(),
            });
        }
        self.serialize(&mut &mut out[..len]);
        Ok(len)
    }
}

fn read_addr(buf: &mut &[u8]) -> MacAddr {
    let mut addr = [0u8; 6];
    buf.copy_to_slice(&mut addr);
    addr
}

/// Group (multicast or broadcast) address
pub fn is_group_addr(addr: &MacAddr) -> bool {
    addr[0] & 0x01 != 0
}

/// Display adapter printing an address as `aa:bb:cc:dd:ee:ff`
pub struct MacFmt<'a>(pub &'a MacAddr);

impl fmt::Display for MacFmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

pub fn format_mac(addr: &MacAddr) -> String {
    MacFmt(addr).to_string()
}

/// Parse `aa:bb:cc:dd:ee:ff` (`-` separators are accepted too)
pub fn parse_mac(s: &str) -> Result<MacAddr> {
    let mut addr = [0u8; 6];
    let mut parts = s.trim().split(|c: char| c == ':' || c == '-');

    for byte in addr.iter_mut() {
        let part = parts
            .next()
            .ok_or_else(|| XlatError::InvalidAddress(s.to_string()))?;
        if part.len() != 2 {
            return Err(XlatError::InvalidAddress(s.to_string()));
        }
        *byte = u8::from_str_radix(part, 16)
            .map_err(|_| XlatError::InvalidAddress(s.to_string()))?;
    }

    if parts.next().is_some() {
        return Err(XlatError::InvalidAddress(s.to_string()));
    }
    Ok(addr)
}

/// Serde adapter storing a [`MacAddr`] in its text form
pub mod mac_serde {
    use super::{format_mac, parse_mac, MacAddr};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &MacAddr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_mac(addr))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MacAddr, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_mac(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::{build_qos, AckPolicy};

    #[test]
    fn test_frame_control_bits() {
        let mut fc = FrameControl::data(Direction::ToDs);
        assert_eq!(fc.0, 0x0108);
        assert_eq!(fc.kind(), FrameKind::Data);
        assert_eq!(fc.direction(), Direction::ToDs);
        assert!(!fc.is_qos());

        fc.set_qos(true);
        fc.set_protected(true);
        assert_eq!(fc.0, 0x4188);
        assert!(fc.is_qos());
        assert!(fc.is_protected());

        fc.set_direction(Direction::DsToDs);
        assert_eq!(fc.direction(), Direction::DsToDs);
        assert_eq!(fc.0 & fc::DIR_MASK, 0x0300);
    }

    #[test]
    fn test_qos_bit_ignored_on_management() {
        // Subtype 8 of a management frame is a beacon, not QoS.
        let fc = FrameControl(0x0080);
        assert_eq!(fc.kind(), FrameKind::Management);
        assert!(!fc.is_qos());
        assert_eq!(fc.header_len(), DOT11_HDR_LEN);
    }

    #[test]
    fn test_header_len() {
        assert_eq!(FrameControl::data(Direction::NoDs).header_len(), 24);
        assert_eq!(FrameControl::data(Direction::DsToDs).header_len(), 30);

        let mut fc = FrameControl::data(Direction::FromDs);
        fc.set_qos(true);
        assert_eq!(fc.header_len(), 26);
        fc.set_order(true);
        assert_eq!(fc.header_len(), 30);
        fc.set_direction(Direction::DsToDs);
        assert_eq!(fc.header_len(), MAX_DOT11_HDR_LEN);
    }

    #[test]
    fn test_ethernet_header() {
        let bytes = [
            1, 2, 3, 4, 5, 6, // dest
            7, 8, 9, 10, 11, 12, // src
            0x08, 0x00, // ether_type
            0xaa, // payload
        ];
        let hdr = EthernetHeader::parse(&bytes).unwrap();
        assert_eq!(hdr.dest, [1, 2, 3, 4, 5, 6]);
        assert_eq!(hdr.src, [7, 8, 9, 10, 11, 12]);
        assert_eq!(hdr.ether_type, ETHER_TYPE_IPV4);
        assert!(hdr.has_ether_type());
        assert_eq!(&hdr.to_bytes()[..], &bytes[..ETHERNET_HDR_LEN]);
    }

    #[test]
    fn test_ethernet_header_too_short() {
        let err = EthernetHeader::parse(&[0u8; 13]).unwrap_err();
        assert!(matches!(
            err,
            XlatError::BufferTooShort {
                needed: 14,
                available: 13
            }
        ));
    }

    #[test]
    fn test_dot11_header_parse() {
        #[rustfmt::skip]
        let bytes = [
            0x88, 0x01, // fc: qos data, to ds
            0x00, 0x00, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x10, 0x00, // seq ctrl
            0x05, 0x00, // qos ctrl
            0xaa, 0xaa, // body
        ];
        let hdr = Dot11Header::parse(&bytes).unwrap();
        assert_eq!(hdr.direction(), Direction::ToDs);
        assert_eq!(hdr.addr1, [1; 6]);
        assert_eq!(hdr.addr2, [2; 6]);
        assert_eq!(hdr.addr3, [3; 6]);
        assert_eq!(hdr.seq_ctrl, 0x0010);
        assert_eq!(hdr.addr4, None);
        assert_eq!(hdr.qos_control.map(|q| q.tid()), Some(5));
        assert_eq!(hdr.header_len(), 26);

        let mut out = [0u8; MAX_DOT11_HDR_LEN];
        let len = hdr.write_to(&mut out).unwrap();
        assert_eq!(&out[..len], &bytes[..26]);
    }

    #[test]
    fn test_dot11_header_four_address() {
        let mut hdr = Dot11Header::data(Direction::DsToDs);
        hdr.addr4 = Some([4; 6]);
        crate::qos::insert_qos(&mut hdr, build_qos(3, AckPolicy::Normal));

        let mut out = [0u8; MAX_DOT11_HDR_LEN];
        let len = hdr.write_to(&mut out).unwrap();
        assert_eq!(len, 32);
        assert_eq!(&out[24..30], &[4; 6]);
        assert_eq!(Dot11Header::parse(&out[..len]).unwrap(), hdr);
    }

    #[test]
    fn test_dot11_header_too_short() {
        let err = Dot11Header::parse(&[0x08, 0x03, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            XlatError::BufferTooShort {
                needed: 30,
                available: 4
            }
        ));
        assert!(Dot11Header::peek_len(&[0x08]).is_err());
    }

    #[test]
    fn test_mac_format() {
        let addr = [0x00, 0x1b, 0x2c, 0xff, 0x0a, 0x01];
        assert_eq!(format_mac(&addr), "00:1b:2c:ff:0a:01");
        assert_eq!(parse_mac("00:1b:2c:ff:0a:01").unwrap(), addr);
        assert_eq!(parse_mac("00-1B-2C-FF-0A-01").unwrap(), addr);
        assert!(parse_mac("00:1b:2c:ff:0a").is_err());
        assert!(parse_mac("00:1b:2c:ff:0a:01:02").is_err());
        assert!(parse_mac("zz:1b:2c:ff:0a:01").is_err());
    }

    #[test]
    fn test_group_addr() {
        assert!(is_group_addr(&BROADCAST_ADDR));
        assert!(is_group_addr(&[0x01, 0x00, 0x5e, 0, 0, 1]));
        assert!(!is_group_addr(&[0x02, 0, 0, 0, 0, 1]));
    }
}
