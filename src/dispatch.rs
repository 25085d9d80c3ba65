//! Mode selection
//!
//! Resolves the host wire format and the LLC processing switch into one
//! transmit and one receive strategy when a connection is set up. The
//! encapsulator and decapsulator never look at those switches themselves.

use crate::config::{NetworkRole, TranslatorConfig, WireFormat};
use crate::decap::{decapsulate, DecapContext, RxPath, SubframeFlags};
use crate::encap::{encapsulate, PacketMeta, TxHeaderSlot, TxPath};
use crate::frame::{EthernetHeader, MacAddr};
use crate::wire::FrameBuffer;
use crate::{Result, XlatError};

/// Per-connection translator front end
#[derive(Debug, Clone)]
pub struct ModeDispatcher {
    config: TranslatorConfig,
    tx: TxPath,
    rx: RxPath,
}

impl ModeDispatcher {
    /// Validate `config` and resolve both paths
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        if config.role == NetworkRole::Monitor {
            return Err(XlatError::UnsupportedRole(config.role));
        }

        let validation = config.validate();
        if !validation.valid {
            return Err(XlatError::Config(validation.errors.join("; ")));
        }
        for warning in &validation.warnings {
            log::warn!("{}", warning);
        }

        let (tx, rx) = Self::resolve(config.wire_format, config.sw_llc_processing);
        log::debug!("{:?} connection: tx {:?}, rx {:?}", config.role, tx, rx);

        Ok(Self { config, tx, rx })
    }

    /// Strategies for a wire format and LLC processing switch
    pub fn resolve(wire_format: WireFormat, sw_llc_processing: bool) -> (TxPath, RxPath) {
        match wire_format {
            WireFormat::NativeWifi => (TxPath::NativeWifi, RxPath::NativeWifi),
            WireFormat::Ethernet => (
                TxPath::Ethernet {
                    insert_llc: sw_llc_processing,
                },
                RxPath::Ethernet {
                    strip_llc: sw_llc_processing,
                },
            ),
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn tx_path(&self) -> TxPath {
        self.tx
    }

    pub fn rx_path(&self) -> RxPath {
        self.rx
    }

    /// Encapsulate a host frame addressed to `peer_addr`
    pub fn encapsulate(
        &self,
        buf: &mut FrameBuffer,
        peer_addr: MacAddr,
        meta: &PacketMeta,
        slot: &mut TxHeaderSlot,
    ) -> Result<()> {
        encapsulate(buf, self.tx, &self.config, peer_addr, meta, slot)
    }

    /// Decapsulate a received MSDU or A-MSDU subframe
    pub fn decapsulate(
        &self,
        buf: &mut FrameBuffer,
        ctx: &mut DecapContext,
        flags: SubframeFlags,
        outer: Option<&EthernetHeader>,
    ) -> Result<()> {
        decapsulate(buf, self.rx, &self.config, ctx, flags, outer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWN: MacAddr = [0x02, 0, 0, 0, 0, 0x01];

    #[test]
    fn test_resolve() {
        assert_eq!(
            ModeDispatcher::resolve(WireFormat::NativeWifi, true),
            (TxPath::NativeWifi, RxPath::NativeWifi)
        );
        assert_eq!(
            ModeDispatcher::resolve(WireFormat::NativeWifi, false),
            (TxPath::NativeWifi, RxPath::NativeWifi)
        );
        assert_eq!(
            ModeDispatcher::resolve(WireFormat::Ethernet, true),
            (
                TxPath::Ethernet { insert_llc: true },
                RxPath::Ethernet { strip_llc: true }
            )
        );
        assert_eq!(
            ModeDispatcher::resolve(WireFormat::Ethernet, false),
            (
                TxPath::Ethernet { insert_llc: false },
                RxPath::Ethernet { strip_llc: false }
            )
        );
    }

    #[test]
    fn test_new() {
        let config =
            TranslatorConfig::new(NetworkRole::AccessPoint, OWN).with_llc_processing(false);
        let dispatcher = ModeDispatcher::new(config.clone()).unwrap();
        assert_eq!(dispatcher.config(), &config);
        assert_eq!(dispatcher.tx_path(), TxPath::Ethernet { insert_llc: false });
        assert_eq!(dispatcher.rx_path(), RxPath::Ethernet { strip_llc: false });
    }

    #[test]
    fn test_new_rejects_monitor() {
        let config = TranslatorConfig::new(NetworkRole::Monitor, OWN);
        let err = ModeDispatcher::new(config).unwrap_err();
        assert!(matches!(err, XlatError::UnsupportedRole(NetworkRole::Monitor)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = TranslatorConfig::new(NetworkRole::Station, [0x01, 0, 0x5e, 0, 0, 1]);
        let err = ModeDispatcher::new(config).unwrap_err();
        assert!(matches!(err, XlatError::Config(_)));
    }
}
