//! QoS control field handling
//!
//! Builds the 2-byte QoS control field for transmitted data frames and strips
//! it from received ones, keeping the frame control subtype bit in step.

use serde::{Deserialize, Serialize};

use crate::frame::Dot11Header;

pub const QOS_TID_MASK: u16 = 0x000f;
pub const QOS_EOSP: u16 = 0x0010;
pub const QOS_ACK_POLICY_SHIFT: u16 = 5;
pub const QOS_ACK_POLICY_MASK: u16 = 0x0060;
pub const QOS_AMSDU_PRESENT: u16 = 0x0080;

/// Ack policy carried in bits 5-6 of the QoS control field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
    #[default]
    Normal,
    NoAck,
    NoExplicitAck,
    BlockAck,
}

impl From<u8> for AckPolicy {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0 => Self::Normal,
            1 => Self::NoAck,
            2 => Self::NoExplicitAck,
            _ => Self::BlockAck,
        }
    }
}

impl From<AckPolicy> for u8 {
    fn from(policy: AckPolicy) -> Self {
        match policy {
            AckPolicy::Normal => 0,
            AckPolicy::NoAck => 1,
            AckPolicy::NoExplicitAck => 2,
            AckPolicy::BlockAck => 3,
        }
    }
}

/// QoS control field (IEEE Std 802.11-2016, 9.2.4.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct QosControl(pub u16);

impl QosControl {
    pub fn tid(self) -> u8 {
        (self.0 & QOS_TID_MASK) as u8
    }

    pub fn eosp(self) -> bool {
        self.0 & QOS_EOSP != 0
    }

    pub fn ack_policy(self) -> AckPolicy {
        AckPolicy::from(((self.0 & QOS_ACK_POLICY_MASK) >> QOS_ACK_POLICY_SHIFT) as u8)
    }

    pub fn amsdu_present(self) -> bool {
        self.0 & QOS_AMSDU_PRESENT != 0
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

/// QoS control for a transmitted MSDU; the upper octet is left zero
pub fn build_qos(tid: u8, ack_policy: AckPolicy) -> QosControl {
    let tid = tid as u16 & QOS_TID_MASK;
    let ack = (u8::from(ack_policy) as u16) << QOS_ACK_POLICY_SHIFT;
    QosControl(tid | ack)
}

/// Add (or replace) the QoS control field and set the QoS subtype bit
pub fn insert_qos(hdr: &mut Dot11Header, qos: QosControl) {
    hdr.qos_control = Some(qos);
    hdr.frame_control.set_qos(true);
}

/// Remove the QoS control field along with any HT control field
///
/// Clears the QoS subtype bit and the order bit. Returns the removed field,
/// or `None` when the header carried no QoS control.
pub fn strip_qos(hdr: &mut Dot11Header) -> Option<QosControl> {
    if !hdr.frame_control.is_qos() {
        return None;
    }

    let qos = hdr.qos_control.take();
    hdr.ht_control = None;
    hdr.frame_control.set_order(false);
    hdr.frame_control.set_qos(false);
    qos
}
