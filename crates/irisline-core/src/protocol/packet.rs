//! Packet-level contract between the session loop and the transport.
//!
//! Byte framing belongs to the transport; it hands over decoded packets and
//! classifies each frame by the type nibble in its first byte.

use bytes::Bytes;

use crate::error::{PushError, Result};
use crate::qos::QosLevel;

/// Packet type from the high nibble of the fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
}

impl PacketType {
    /// Classify a frame by its first byte.
    pub fn from_header(first: u8) -> Result<Self> {
        Ok(match first >> 4 {
            1 => PacketType::Connect,
            2 => PacketType::ConnAck,
            3 => PacketType::Publish,
            4 => PacketType::PubAck,
            5 => PacketType::PubRec,
            6 => PacketType::PubRel,
            7 => PacketType::PubComp,
            8 => PacketType::Subscribe,
            9 => PacketType::SubAck,
            10 => PacketType::Unsubscribe,
            11 => PacketType::UnsubAck,
            12 => PacketType::PingReq,
            13 => PacketType::PingResp,
            14 => PacketType::Disconnect,
            n => return Err(PushError::UnknownPacketType(n)),
        })
    }
}

/// QoS bits (1..=2) of a publish header.
pub fn publish_qos(first: u8) -> Result<QosLevel> {
    let level = (first >> 1) & 0x03;
    QosLevel::from_u8(level)
        .ok_or_else(|| PushError::InvalidPayload(format!("unsupported publish qos {level}")))
}

/// Packet delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPacket {
    Publish {
        /// Numeric topic id or full path, as sent by the broker.
        topic: String,
        payload: Bytes,
        qos: QosLevel,
    },
    PubAck {
        packet_id: u16,
    },
    PingResp,
    /// Any other well-formed packet the session does not act on.
    Other(PacketType),
}

/// Packet handed to the transport for writing.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPacket {
    Publish {
        topic: String,
        payload: Bytes,
        qos: QosLevel,
    },
    PingReq,
    Disconnect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_nibble() {
        assert_eq!(PacketType::from_header(0x30).ok(), Some(PacketType::Publish));
        assert_eq!(PacketType::from_header(0x32).ok(), Some(PacketType::Publish));
        assert_eq!(PacketType::from_header(0xd0).ok(), Some(PacketType::PingResp));
        assert_eq!(PacketType::from_header(0x20).ok(), Some(PacketType::ConnAck));
    }

    #[test]
    fn publish_qos_bits() {
        assert_eq!(publish_qos(0x30).ok(), Some(QosLevel::FireAndForget));
        assert_eq!(publish_qos(0x32).ok(), Some(QosLevel::AcknowledgedDelivery));
        // retain and dup flags do not affect the level
        assert_eq!(publish_qos(0x3b).ok(), Some(QosLevel::AcknowledgedDelivery));
        assert!(publish_qos(0x34).is_err());
    }

    #[test]
    fn reserved_nibbles_are_reported() {
        for first in [0x00u8, 0xf0] {
            let err = PacketType::from_header(first).err();
            assert_eq!(err.map(|e| e.kind().as_str()), Some("UNKNOWN_PACKET_TYPE"));
        }
    }
}
