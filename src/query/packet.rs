use crate::packet::PacketWriter;
use bytes::Bytes;

/// Magic bytes opening every serverbound Query datagram.
pub(super) const MAGIC_BYTES: [u8; 2] = [0xFE, 0xFD];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum QueryPacketType {
    Handshake,
    Stat,
}

impl From<QueryPacketType> for u8 {
    fn from(packet_type: QueryPacketType) -> Self {
        match packet_type {
            QueryPacketType::Handshake => 9,
            QueryPacketType::Stat => 0,
        }
    }
}

impl QueryPacketType {
    /// Packet type named by the first byte of a response, if any.
    pub(super) fn from_byte(value: u8) -> Option<Self> {
        match value {
            9 => Some(Self::Handshake),
            0 => Some(Self::Stat),
            _ => None,
        }
    }
}

/// Common request prefix: magic bytes, packet type, session id.
fn request_header(packet_type: QueryPacketType, session_id: [u8; 4]) -> PacketWriter {
    PacketWriter::new()
        .add_slice(&MAGIC_BYTES)
        .add_u8(packet_type.into())
        .add_slice(&session_id)
}

/// Handshake request; its payload is empty.
pub(super) fn handshake_request(session_id: [u8; 4]) -> Bytes {
    request_header(QueryPacketType::Handshake, session_id).build()
}

/// Basic stat request, echoing the packed challenge token.
pub(super) fn stat_request(session_id: [u8; 4], challenge_token: [u8; 4]) -> Bytes {
    request_header(QueryPacketType::Stat, session_id)
        .add_slice(&challenge_token)
        .build()
}

#[cfg(test)]
mod tests {
    use super::{handshake_request, stat_request, QueryPacketType};

    #[test]
    fn test_handshake_request_layout() {
        let bytes = handshake_request([0x00, 0x00, 0x00, 0x01]);

        assert_eq!(bytes.as_ref(), &[0xFE, 0xFD, 0x09, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_stat_request_layout() {
        let bytes = stat_request([0x00, 0x00, 0x00, 0x01], [0x00, 0x00, 0x30, 0x39]);

        assert_eq!(
            bytes.as_ref(),
            &[0xFE, 0xFD, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x30, 0x39]
        );
    }

    #[test]
    fn test_packet_type_bytes() {
        assert_eq!(u8::from(QueryPacketType::Handshake), 9);
        assert_eq!(u8::from(QueryPacketType::Stat), 0);

        assert_eq!(QueryPacketType::from_byte(9), Some(QueryPacketType::Handshake));
        assert_eq!(QueryPacketType::from_byte(0), Some(QueryPacketType::Stat));
        assert_eq!(QueryPacketType::from_byte(1), None);
        assert_eq!(QueryPacketType::from_byte(0xFF), None);
    }
}
