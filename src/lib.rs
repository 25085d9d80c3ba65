//! # WLAN frame encapsulation
//!
//! Translation between Ethernet-II frames used by a host network stack and
//! IEEE 802.11 data frames used on the wireless medium.
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//! - `frame`: Ethernet and 802.11 header structures
//! - `wire`: Owned frame buffer with head room
//! - `address`: Address slot assignment per network role
//! - `qos`: QoS control field construction and removal
//! - `llc`: LLC/SNAP classification
//! - `encap`: Transmit path (host frame to 802.11)
//! - `decap`: Receive path (802.11 and A-MSDU subframes to host frame)
//! - `config`: Per-connection translator configuration
//! - `dispatch`: Mode selection in front of both paths

pub mod address;
pub mod config;
pub mod decap;
pub mod dispatch;
pub mod encap;
pub mod frame;
pub mod llc;
pub mod qos;
pub mod wire;

// Re-export commonly used types
pub use crate::{
    address::{AddressTable, ResolvedAddrs},
    config::{NetworkRole, TranslatorConfig, ValidationResult, WireFormat},
    decap::{decapsulate, DecapContext, RxPath, SubframeFlags},
    dispatch::ModeDispatcher,
    encap::{encapsulate, PacketMeta, TxHeaderSlot, TxPath},
    frame::*,
    llc::{LlcSnapHeader, SnapEncoding},
    qos::{build_qos, AckPolicy, QosControl},
    wire::FrameBuffer,
};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XlatError {
    #[error("Buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort { needed: usize, available: usize },

    #[error("Unsupported network role: {0:?}")]
    UnsupportedRole(NetworkRole),

    #[error("A-MSDU subframe without a cached MPDU header")]
    InvalidSequencing,

    #[error("Invalid MAC address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, XlatError>;

// Utility functions
pub fn init_logging() {
    env_logger::init();
}
