use crate::core::error::{Error, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Encode single u32 value
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, etc.
    pub fn encode_u32(output: &mut Vec<u8>, value: u32) {
        Self::encode_u64(output, value as u64);
    }

    /// Encode single u64 value, 1-10 bytes
    pub fn encode_u64(output: &mut Vec<u8>, mut value: u64) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // Set continuation bit
            value >>= 7;
        }
        output.push(value as u8);  // Last byte without continuation bit
    }

    /// Decode single u32 value, returns (value, bytes_consumed)
    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let (value, consumed) = Self::decode_u64(input)?;
        let value = u32::try_from(value)
            .map_err(|_| Error::corrupt_index(format!("VByte value {} exceeds u32", value)))?;
        Ok((value, consumed))
    }

    /// Decode single u64 value, returns (value, bytes_consumed)
    pub fn decode_u64(input: &[u8]) -> Result<(u64, usize)> {
        let mut value = 0u64;
        let mut shift = 0;
        let mut consumed = 0;

        for &byte in input {
            consumed += 1;
            let bits = (byte & 127) as u64;
            // Tenth byte may only carry the top bit of a u64
            if shift == 63 && bits > 1 {
                return Err(Error::corrupt_index("VByte overflow"));
            }
            value |= bits << shift;

            if byte & 128 == 0 {  // No continuation bit
                return Ok((value, consumed));
            }

            shift += 7;
            if shift > 63 {  // Max 10 bytes for u64
                return Err(Error::corrupt_index("VByte overflow"));
            }
        }

        Err(Error::corrupt_index("Incomplete VByte"))
    }

    /// Decode a u64 at `*pos`, advancing it
    pub fn read_u64(data: &[u8], pos: &mut usize) -> Result<u64> {
        let input = data.get(*pos..).unwrap_or(&[]);
        let (value, consumed) = Self::decode_u64(input)?;
        *pos += consumed;
        Ok(value)
    }

    /// Decode a u32 at `*pos`, advancing it
    pub fn read_u32(data: &[u8], pos: &mut usize) -> Result<u32> {
        let input = data.get(*pos..).unwrap_or(&[]);
        let (value, consumed) = Self::decode_u32(input)?;
        *pos += consumed;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn byte_lengths_follow_magnitude() {
        let cases: [(u64, usize); 6] = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (8_000_000_000, 5),
            (u64::MAX, 10),
        ];
        for (value, len) in cases {
            let mut out = Vec::new();
            VByteEncoder::encode_u64(&mut out, value);
            assert_eq!(out.len(), len, "length of {}", value);
            assert_eq!(VByteEncoder::decode_u64(&out).unwrap(), (value, len));
        }
    }

    #[test]
    fn read_advances_position() {
        let mut out = Vec::new();
        VByteEncoder::encode_u32(&mut out, 300);
        VByteEncoder::encode_u64(&mut out, 5_940_594_059);
        let mut pos = 0;
        assert_eq!(VByteEncoder::read_u32(&out, &mut pos).unwrap(), 300);
        assert_eq!(VByteEncoder::read_u64(&out, &mut pos).unwrap(), 5_940_594_059);
        assert_eq!(pos, out.len());
    }

    #[test]
    fn truncated_and_oversized_input_is_corrupt() {
        let err = VByteEncoder::decode_u64(&[0x80, 0x80]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);

        let err = VByteEncoder::decode_u64(&[0xff; 11]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);

        let mut out = Vec::new();
        VByteEncoder::encode_u64(&mut out, u32::MAX as u64 + 1);
        let err = VByteEncoder::decode_u32(&out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);

        let mut pos = 0;
        assert!(VByteEncoder::read_u64(&[], &mut pos).is_err());
    }
}
