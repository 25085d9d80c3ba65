//! Transmit path
//!
//! Turns a frame handed down by the host into an 802.11 data frame. The
//! synthesized MAC header (and LLC/SNAP header, if any) goes into the radio
//! descriptor's header slot and the host's own L2 header is pulled from the
//! buffer, which is left holding the payload.

use serde::{Deserialize, Serialize};

use crate::address::AddressTable;
use crate::config::{NetworkRole, TranslatorConfig};
use crate::frame::{
    Dot11Header, EthernetHeader, FrameKind, MacAddr, MacFmt, ETHERNET_HDR_LEN, MAX_DOT11_HDR_LEN,
};
use crate::llc::{LlcSnapHeader, LLC_SNAP_LEN};
use crate::qos::{build_qos, insert_qos, AckPolicy};
use crate::wire::FrameBuffer;
use crate::{Result, XlatError};

/// Largest header the slot must hold: full MAC header plus LLC/SNAP
pub const TX_HEADER_SLOT_LEN: usize = MAX_DOT11_HDR_LEN + LLC_SNAP_LEN;

/// Transmit strategy, resolved once per connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxPath {
    /// Host frames already start with an 802.11 header
    NativeWifi,
    /// Host frames start with an Ethernet header
    Ethernet { insert_llc: bool },
}

/// Per-packet metadata supplied by the queueing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketMeta {
    pub is_unicast: bool,
    /// Peer negotiated QoS
    pub qos_capable: bool,
    /// Traffic identifier, 0..=15
    pub tid: u8,
    pub ack_policy: AckPolicy,
    pub do_encrypt: bool,
    pub frame_kind: FrameKind,
}

impl Default for PacketMeta {
    fn default() -> Self {
        Self {
            is_unicast: true,
            qos_capable: false,
            tid: 0,
            ack_policy: AckPolicy::Normal,
            do_encrypt: false,
            frame_kind: FrameKind::Data,
        }
    }
}

impl PacketMeta {
    /// Data frame metadata
    pub fn data(is_unicast: bool) -> Self {
        Self {
            is_unicast,
            ..Self::default()
        }
    }

    pub fn with_qos(mut self, tid: u8) -> Self {
        self.qos_capable = true;
        self.tid = tid;
        self
    }

    pub fn with_ack_policy(mut self, ack_policy: AckPolicy) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    pub fn with_encryption(mut self, do_encrypt: bool) -> Self {
        self.do_encrypt = do_encrypt;
        self
    }

    pub fn with_kind(mut self, frame_kind: FrameKind) -> Self {
        self.frame_kind = frame_kind;
        self
    }

    /// A QoS control field is added only for unicast frames to QoS peers
    pub fn wants_qos(&self) -> bool {
        self.is_unicast && self.qos_capable
    }
}

/// MPDU header slot of a radio descriptor
///
/// An empty slot means the frame goes out exactly as it sits in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHeaderSlot {
    bytes: [u8; TX_HEADER_SLOT_LEN],
    len: usize,
    l3_hdr_offset: usize,
    orig_l2_hdr_bytes: usize,
}

impl Default for TxHeaderSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl TxHeaderSlot {
    pub fn new() -> Self {
        Self {
            bytes: [0; TX_HEADER_SLOT_LEN],
            len: 0,
            l3_hdr_offset: 0,
            orig_l2_hdr_bytes: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.l3_hdr_offset = 0;
        self.orig_l2_hdr_bytes = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// MAC header followed by the LLC/SNAP header, if any
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn mac_header(&self) -> &[u8] {
        &self.bytes[..self.l3_hdr_offset]
    }

    pub fn llc_header(&self) -> &[u8] {
        &self.bytes[self.l3_hdr_offset..self.len]
    }

    /// Length of the 802.11 MAC header in the slot
    pub fn l3_hdr_offset(&self) -> usize {
        self.l3_hdr_offset
    }

    /// Bytes of the host's L2 header that were pulled from the buffer
    pub fn orig_l2_hdr_bytes(&self) -> usize {
        self.orig_l2_hdr_bytes
    }

    pub fn header(&self) -> Result<Dot11Header> {
        Dot11Header::parse(self.mac_header())
    }

    /// Prepend the slot contents, giving a contiguous 802.11 frame
    pub fn write_into(&self, buf: &mut FrameBuffer) -> Result<()> {
        buf.prepend(self.as_bytes())
    }

    fn fill(
        &mut self,
        hdr: &Dot11Header,
        llc: Option<&LlcSnapHeader>,
        orig_l2_hdr_bytes: usize,
    ) -> Result<()> {
        let mac_len = hdr.write_to(&mut self.bytes)?;
        let mut len = mac_len;
        if let Some(llc) = llc {
            self.bytes[len..len + LLC_SNAP_LEN].copy_from_slice(&llc.to_bytes());
            len += LLC_SNAP_LEN;
        }

        self.len = len;
        self.l3_hdr_offset = mac_len;
        self.orig_l2_hdr_bytes = orig_l2_hdr_bytes;
        Ok(())
    }
}

/// Encapsulate one host frame for transmission
///
/// `peer_addr` is the receiving peer; in station role it is the BSSID.
/// Non-data frames are left untouched. On error the buffer is unchanged and
/// the caller drops the frame.
pub fn encapsulate(
    buf: &mut FrameBuffer,
    path: TxPath,
    config: &TranslatorConfig,
    peer_addr: MacAddr,
    meta: &PacketMeta,
    slot: &mut TxHeaderSlot,
) -> Result<()> {
    slot.clear();

    if config.role == NetworkRole::Monitor {
        return Err(XlatError::UnsupportedRole(config.role));
    }
    if meta.frame_kind != FrameKind::Data {
        log::trace!("tx: {:?} frame passed through", meta.frame_kind);
        return Ok(());
    }

    match path {
        TxPath::NativeWifi => encap_from_native_wifi(buf, config, meta, slot),
        TxPath::Ethernet { insert_llc } => {
            encap_from_ethernet(buf, config, peer_addr, meta, insert_llc, slot)
        }
    }
}

fn encap_from_native_wifi(
    buf: &mut FrameBuffer,
    config: &TranslatorConfig,
    meta: &PacketMeta,
    slot: &mut TxHeaderSlot,
) -> Result<()> {
    let protect = config.sw_protected_frame && meta.do_encrypt;
    if !meta.wants_qos() && !protect {
        return Ok(());
    }

    let mut hdr = Dot11Header::parse(buf.as_slice())?;
    let orig_len = hdr.header_len();

    if meta.wants_qos() {
        insert_qos(&mut hdr, build_qos(meta.tid, meta.ack_policy));
    }
    if protect {
        hdr.frame_control.set_protected(true);
    }

    slot.fill(&hdr, None, orig_len)?;
    buf.pull_head(orig_len)?;

    log::trace!(
        "tx: native wifi header {} -> {} bytes (fc {:#06x})",
        orig_len,
        slot.len(),
        hdr.frame_control.0
    );
    Ok(())
}

fn encap_from_ethernet(
    buf: &mut FrameBuffer,
    config: &TranslatorConfig,
    peer_addr: MacAddr,
    meta: &PacketMeta,
    insert_llc: bool,
    slot: &mut TxHeaderSlot,
) -> Result<()> {
    let eth = EthernetHeader::parse(buf.as_slice())?;

    let bssid = match config.role {
        NetworkRole::Station => peer_addr,
        _ => config.own_addr,
    };
    let mut hdr = AddressTable::resolve(config.role, eth.dest, eth.src, bssid)?.to_header();

    if meta.wants_qos() {
        insert_qos(&mut hdr, build_qos(meta.tid, meta.ack_policy));
    }
    if config.sw_protected_frame && meta.do_encrypt {
        hdr.frame_control.set_protected(true);
    }

    // Length values mean the payload already starts with its own LLC header.
    let llc = if insert_llc {
        LlcSnapHeader::for_ether_type(eth.ether_type)
    } else {
        None
    };

    slot.fill(&hdr, llc.as_ref(), ETHERNET_HDR_LEN)?;
    buf.pull_head(ETHERNET_HDR_LEN)?;

    log::trace!(
        "tx: {} -> {} type {:#06x} as {:?}, header {} bytes",
        MacFmt(&eth.src),
        MacFmt(&eth.dest),
        eth.ether_type,
        hdr.direction(),
        slot.len()
    );
    Ok(())
}
