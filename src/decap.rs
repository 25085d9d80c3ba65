//! Receive path
//!
//! Converts received 802.11 MSDUs and A-MSDU subframes into the frame format
//! the host expects. When the hardware delivers the MAC header only with the
//! first subframe of an aggregate, the header is cached in a [`DecapContext`]
//! and used to rebuild every later subframe of the same MPDU.

use crate::address::AddressTable;
use crate::config::{NetworkRole, TranslatorConfig};
use crate::frame::{
    Dot11Header, EthernetHeader, FrameControl, MacAddr, MacFmt, ETHERNET_HDR_LEN, MAX_DOT11_HDR_LEN,
};
use crate::llc::{LlcSnapHeader, LLC_SNAP_LEN};
use crate::qos::strip_qos;
use crate::wire::FrameBuffer;
use crate::{Result, XlatError};

/// Receive strategy, resolved once per connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RxPath {
    /// Deliver 802.11 headers without QoS control
    NativeWifi,
    /// Deliver Ethernet headers
    Ethernet { strip_llc: bool },
}

/// Position of a buffer within its reassembly unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubframeFlags {
    pub is_subframe: bool,
    pub is_first_subframe: bool,
    pub is_last_subframe: bool,
}

impl SubframeFlags {
    /// A frame that is not part of an A-MSDU
    pub const MSDU: Self = Self {
        is_subframe: false,
        is_first_subframe: false,
        is_last_subframe: false,
    };

    /// Subframe `index` of an A-MSDU holding `count` subframes
    pub fn amsdu(index: usize, count: usize) -> Self {
        Self {
            is_subframe: true,
            is_first_subframe: index == 0,
            is_last_subframe: index + 1 >= count,
        }
    }
}

/// Reassembly state of one A-MSDU
///
/// Keep one per (peer, TID) and feed it subframes in on-air order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecapContext {
    is_subframe: bool,
    is_first_subframe: bool,
    is_last_subframe: bool,
    cached_header: [u8; MAX_DOT11_HDR_LEN],
    cached_header_len: usize,
}

impl Default for DecapContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DecapContext {
    pub fn new() -> Self {
        Self {
            is_subframe: false,
            is_first_subframe: false,
            is_last_subframe: false,
            cached_header: [0; MAX_DOT11_HDR_LEN],
            cached_header_len: 0,
        }
    }

    /// An A-MSDU is in progress and its MAC header is cached
    pub fn is_subframe(&self) -> bool {
        self.is_subframe
    }

    pub fn is_first_subframe(&self) -> bool {
        self.is_first_subframe
    }

    pub fn is_last_subframe(&self) -> bool {
        self.is_last_subframe
    }

    /// MAC header of the A-MSDU in progress, empty when idle
    pub fn cached_header(&self) -> &[u8] {
        &self.cached_header[..self.cached_header_len]
    }

    /// Drop any partial reassembly, e.g. after a reassembly timeout
    pub fn reset(&mut self) {
        self.is_subframe = false;
        self.is_first_subframe = false;
        self.is_last_subframe = false;
        self.cached_header = [0; MAX_DOT11_HDR_LEN];
        self.cached_header_len = 0;
    }

    fn cache(&mut self, header: &[u8]) {
        self.cached_header[..header.len()].copy_from_slice(header);
        self.cached_header_len = header.len();
        self.is_subframe = true;
    }

    fn record(&mut self, flags: SubframeFlags) {
        self.is_first_subframe = flags.is_first_subframe;
        self.is_last_subframe = flags.is_last_subframe;
    }
}

/// Decapsulate one received MSDU or A-MSDU subframe
///
/// `outer` is the subframe header when the caller has already taken it off
/// the buffer; for subframes without it, the header is read from the buffer.
/// A subframe that is both first and last is decoded as a plain MSDU.
/// On error the buffer is unchanged. The context is completed with the last
/// subframe whether or not that subframe translated.
pub fn decapsulate(
    buf: &mut FrameBuffer,
    path: RxPath,
    config: &TranslatorConfig,
    ctx: &mut DecapContext,
    flags: SubframeFlags,
    outer: Option<&EthernetHeader>,
) -> Result<()> {
    if config.role == NetworkRole::Monitor {
        return Err(XlatError::UnsupportedRole(config.role));
    }

    if !flags.is_subframe {
        return decap_msdu(buf, path);
    }

    let result = if flags.is_first_subframe && flags.is_last_subframe {
        decap_msdu(buf, path)
    } else {
        decap_subframe(buf, path, config, ctx, flags, outer)
    };

    if flags.is_last_subframe {
        if ctx.is_subframe() {
            log::debug!("rx: A-MSDU complete, dropping cached header");
        }
        ctx.reset();
    }
    result
}

fn decap_msdu(buf: &mut FrameBuffer, path: RxPath) -> Result<()> {
    // Frames for this path were already converted by the hardware.
    if path == (RxPath::Ethernet { strip_llc: false }) {
        return Ok(());
    }

    if !is_data_frame(buf)? {
        return Ok(());
    }

    let frame = buf.as_slice();
    let hdr = Dot11Header::parse(frame)?;
    let hdr_len = hdr.header_len();

    match path {
        RxPath::NativeWifi => {
            let mut out = hdr;
            if strip_qos(&mut out).is_none() {
                return Ok(());
            }
            let mut scratch = [0u8; MAX_DOT11_HDR_LEN];
            let len = out.write_to(&mut scratch)?;
            buf.replace_head(hdr_len, &scratch[..len])?;
            log::trace!("rx: stripped QoS control, header {} -> {} bytes", hdr_len, len);
        }
        RxPath::Ethernet { .. } => {
            let (dest, src) = AddressTable::endpoints(&hdr);
            let (eth, llc_len) = ethernet_for_body(dest, src, &frame[hdr_len..]);
            buf.replace_head(hdr_len + llc_len, &eth.to_bytes())?;
            log::trace!(
                "rx: {} -> {} type {:#06x} from {:?}",
                MacFmt(&eth.src),
                MacFmt(&eth.dest),
                eth.ether_type,
                hdr.direction()
            );
        }
    }
    Ok(())
}

fn decap_subframe(
    buf: &mut FrameBuffer,
    path: RxPath,
    config: &TranslatorConfig,
    ctx: &mut DecapContext,
    flags: SubframeFlags,
    outer: Option<&EthernetHeader>,
) -> Result<()> {
    let header_in_frame = flags.is_first_subframe || !config.subframe_header_recovery;

    let mut hdr_bytes = [0u8; MAX_DOT11_HDR_LEN];
    let (hdr, hdr_len, consumed_hdr) = if header_in_frame {
        if !is_data_frame(buf)? {
            return Ok(());
        }
        let hdr = Dot11Header::parse(buf.as_slice())?;
        let len = hdr.header_len();
        hdr_bytes[..len].copy_from_slice(&buf.as_slice()[..len]);
        (hdr, len, len)
    } else {
        if !ctx.is_subframe() {
            log::warn!("rx: subframe without a cached A-MSDU header");
            return Err(XlatError::InvalidSequencing);
        }
        let cached = ctx.cached_header();
        hdr_bytes[..cached.len()].copy_from_slice(cached);
        (Dot11Header::parse(cached)?, cached.len(), 0)
    };

    let (sub, consumed) = match outer {
        Some(outer) => (*outer, consumed_hdr),
        None => {
            let sub = EthernetHeader::parse(&buf.as_slice()[consumed_hdr..])?;
            (sub, consumed_hdr + ETHERNET_HDR_LEN)
        }
    };

    match path {
        RxPath::NativeWifi => {
            let mut out = hdr;
            strip_qos(&mut out);
            AddressTable::set_endpoints(&mut out, sub.dest, sub.src);
            let mut scratch = [0u8; MAX_DOT11_HDR_LEN];
            let len = out.write_to(&mut scratch)?;
            buf.replace_head(consumed, &scratch[..len])?;
        }
        RxPath::Ethernet { strip_llc: true } => {
            let body = &buf.as_slice()[consumed..];
            let (eth, llc_len) = ethernet_for_body(sub.dest, sub.src, body);
            buf.replace_head(consumed + llc_len, &eth.to_bytes())?;
        }
        RxPath::Ethernet { strip_llc: false } => {
            buf.replace_head(consumed, &sub.to_bytes())?;
        }
    }

    if flags.is_first_subframe && config.subframe_header_recovery {
        if ctx.is_subframe() {
            log::debug!("rx: new A-MSDU before the previous one completed");
        }
        ctx.cache(&hdr_bytes[..hdr_len]);
        log::debug!("rx: cached {} byte A-MSDU header", hdr_len);
    }
    ctx.record(flags);

    log::trace!(
        "rx: subframe {} -> {} (first {}, last {})",
        MacFmt(&sub.src),
        MacFmt(&sub.dest),
        flags.is_first_subframe,
        flags.is_last_subframe
    );
    Ok(())
}

/// Whether the buffer starts with a data frame; other kinds pass through
fn is_data_frame(buf: &FrameBuffer) -> Result<bool> {
    buf.ensure_len(2)?;
    let frame = buf.as_slice();
    let frame_control = FrameControl(u16::from_le_bytes([frame[0], frame[1]]));
    if !frame_control.is_data() {
        log::trace!("rx: {:?} frame passed through", frame_control.kind());
    }
    Ok(frame_control.is_data())
}

/// Ethernet header for a received body, and how many LLC bytes it replaces
fn ethernet_for_body(dest: MacAddr, src: MacAddr, body: &[u8]) -> (EthernetHeader, usize) {
    match LlcSnapHeader::parse(body) {
        Some(llc) if llc.strip_on_receive() => {
            (EthernetHeader::new(dest, src, llc.ether_type), LLC_SNAP_LEN)
        }
        _ => {
            let len = u16::try_from(body.len()).unwrap_or(u16::MAX);
            (EthernetHeader::new(dest, src, len), 0)
        }
    }
}
