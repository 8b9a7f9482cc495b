//! Byte-level codec for Query datagrams.
//!
//! The wire format mixes raw bytes, null-terminated text, decimal
//! numerals, and one byte-flipped short, so the codec is a pair of
//! small primitives: [`PacketReader`], a consuming cursor over one
//! received datagram, and [`PacketWriter`], an append-only buffer for
//! building one request.
//!
//! Reads never fail. Reading past the end of the buffer yields fewer
//! (possibly zero) bytes, and numeric reads on malformed text yield 0.
//! Higher layers rely on this: a truncated or foreign datagram decodes
//! to values that fail the type/session check and the response is
//! dropped, rather than aborting the exchange.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Read cursor over a single received datagram.
///
/// Each read consumes from the front of the buffer by advancing an
/// internal offset; the underlying bytes are never reallocated.
#[derive(Debug)]
pub struct PacketReader {
    buf: Bytes,
}

impl PacketReader {
    /// Construct a reader over an existing buffer.
    #[must_use]
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Remove and return the first `n` bytes.
    ///
    /// If fewer than `n` bytes remain, returns what is left (possibly
    /// nothing). Callers interpreting the result as a fixed-size field
    /// must check its length.
    pub fn read(&mut self, n: usize) -> Bytes {
        let n = n.min(self.buf.remaining());
        self.buf.copy_to_bytes(n)
    }

    /// Read bytes up to (not including) the first zero byte, consuming
    /// the terminator.
    ///
    /// A buffer with no zero byte is treated as implicitly terminated
    /// at its end: the entire remainder is returned and the cursor is
    /// left empty.
    pub fn read_string_bytes(&mut self) -> Bytes {
        match self.buf.iter().position(|&b| b == 0) {
            Some(end) => {
                let s = self.buf.copy_to_bytes(end);
                self.buf.advance(1);
                s
            }
            None => self.buf.copy_to_bytes(self.buf.remaining()),
        }
    }

    /// Like [`read_string_bytes`](Self::read_string_bytes), but decoded
    /// as text. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&mut self) -> String {
        String::from_utf8_lossy(&self.read_string_bytes()).into_owned()
    }

    /// Read a null-terminated string and parse it as a base-10 integer.
    /// Non-numeric text decodes to 0.
    pub fn read_int(&mut self) -> u32 {
        self.read_string().parse().unwrap_or(0)
    }

    /// Read a 16-bit unsigned integer.
    ///
    /// Shorts arrive little-endian on the wire; the two bytes are
    /// reversed and then interpreted as big-endian. Fewer than 2 bytes
    /// remaining decodes to 0.
    pub fn read_short(&mut self) -> u16 {
        let bytes = self.read(2);
        if bytes.len() < 2 {
            return 0;
        }
        u16::from_be_bytes([bytes[1], bytes[0]])
    }

    /// Number of unconsumed bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}

/// Append-only buffer for building one request datagram.
#[derive(Debug, Default)]
pub struct PacketWriter {
    bytes: BytesMut,
}

impl PacketWriter {
    /// Construct an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a writer seeded with an initial byte sequence.
    #[must_use]
    pub fn seeded(bytes: &[u8]) -> Self {
        Self {
            bytes: BytesMut::from(bytes),
        }
    }

    /// Append a single byte.
    #[must_use]
    pub fn add_u8(mut self, byte: u8) -> Self {
        self.bytes.put_u8(byte);
        self
    }

    /// Append a sequence of bytes in order.
    #[must_use]
    pub fn add_slice(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Clear the buffer back to empty.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Serialize to a flat byte sequence.
    #[must_use]
    pub fn build(self) -> Bytes {
        self.bytes.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::{PacketReader, PacketWriter};
    use bytes::Bytes;

    #[test]
    fn test_read_consumes_from_front() {
        let mut reader = PacketReader::new(Bytes::from_static(&[1, 2, 3, 4, 5]));

        assert_eq!(reader.read(2), Bytes::from_static(&[1, 2]));
        assert_eq!(reader.read(2), Bytes::from_static(&[3, 4]));
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_read_past_end_returns_fewer_bytes() {
        let mut reader = PacketReader::new(Bytes::from_static(&[7, 8]));

        assert_eq!(reader.read(4), Bytes::from_static(&[7, 8]));
        assert_eq!(reader.read(4), Bytes::new());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_string_stops_at_terminator() {
        let mut reader = PacketReader::new(Bytes::from_static(b"A Minecraft Server\0world\0"));

        assert_eq!(reader.read_string(), "A Minecraft Server");
        assert_eq!(reader.read_string(), "world");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_string_without_terminator_takes_remainder() {
        let mut reader = PacketReader::new(Bytes::from_static(b"unterminated"));

        assert_eq!(reader.read_string(), "unterminated");
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read_string(), "");
    }

    #[test]
    fn test_read_string_bytes_keeps_raw_form() {
        let mut reader = PacketReader::new(Bytes::from_static(b"9513307\0"));

        assert_eq!(reader.read_string_bytes(), Bytes::from_static(b"9513307"));
    }

    #[test]
    fn test_read_int() {
        let cases: &[(&[u8], u32)] = &[
            (b"0\0", 0),
            (b"7\0", 7),
            (b"20\0", 20),
            (b"4294967295\0", u32::MAX),
            (b"not a number\0", 0),
            (b"12abc\0", 0),
            (b"\0", 0),
            (b"", 0),
        ];

        for &(input, expected) in cases {
            let mut reader = PacketReader::new(Bytes::copy_from_slice(input));
            assert_eq!(reader.read_int(), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_read_short_flips_wire_order() {
        let mut reader = PacketReader::new(Bytes::from_static(&[0xDD, 0x3D]));

        assert_eq!(reader.read_short(), 0x3DDD);
    }

    #[test]
    fn test_read_short_past_end_is_zero() {
        let mut reader = PacketReader::new(Bytes::from_static(&[0xDD]));

        assert_eq!(reader.read_short(), 0);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_writer_appends_in_order() {
        let bytes = PacketWriter::new()
            .add_slice(&[0xFE, 0xFD])
            .add_u8(0x09)
            .add_slice(&[0x00, 0x00, 0x00, 0x01])
            .build();

        assert_eq!(
            bytes,
            Bytes::from_static(&[0xFE, 0xFD, 0x09, 0x00, 0x00, 0x00, 0x01])
        );
    }

    #[test]
    fn test_writer_reset_clears_to_empty() {
        let mut writer = PacketWriter::new().add_slice(b"stale header");
        writer.reset();

        assert_eq!(writer.add_u8(0x00).build(), Bytes::from_static(&[0x00]));
    }

    #[test]
    fn test_write_read_round_trip() {
        let bytes = PacketWriter::seeded(b"My Server")
            .add_u8(0)
            .add_slice(b"7")
            .add_u8(0)
            .add_slice(&[0x3D, 0xDD])
            .add_slice(b"192.168.1.1")
            .add_u8(0)
            .build();

        let mut reader = PacketReader::new(bytes);
        assert_eq!(reader.read_string(), "My Server");
        assert_eq!(reader.read_int(), 7);
        assert_eq!(reader.read_short(), 0xDD3D);
        assert_eq!(reader.read_string(), "192.168.1.1");
        assert_eq!(reader.remaining(), 0);
    }
}
