use crate::compression::vbyte::VByteEncoder;
use crate::core::error::{Error, Result};

/// Delta encoding for strictly increasing u64 values (document ids).
/// The first value is written as-is, later values as the gap to their predecessor.
#[derive(Debug, Clone, Default)]
pub struct DeltaEncoder {
    last: Option<u64>,
}

impl DeltaEncoder {
    pub fn new() -> Self {
        DeltaEncoder { last: None }
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }

    pub fn push(&mut self, output: &mut Vec<u8>, value: u64) -> Result<()> {
        let delta = match self.last {
            None => value,
            Some(last) if value > last => value - last,
            Some(last) => {
                return Err(Error::invalid_argument(format!(
                    "Values must strictly increase: {} after {}", value, last
                )));
            }
        };
        VByteEncoder::encode_u64(output, delta);
        self.last = Some(value);
        Ok(())
    }

    pub fn encode_u64_list(nums: &[u64]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut encoder = DeltaEncoder::new();
        for &num in nums {
            encoder.push(&mut output, num)?;
        }
        Ok(output)
    }
}

/// Inverse of [`DeltaEncoder`]; can be rebased after a skip
#[derive(Debug, Clone, Default)]
pub struct DeltaDecoder {
    last: Option<u64>,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        DeltaDecoder { last: None }
    }

    /// Continue decoding as if `last` had just been read
    pub fn with_base(last: Option<u64>) -> Self {
        DeltaDecoder { last }
    }

    pub fn read(&mut self, data: &[u8], pos: &mut usize) -> Result<u64> {
        let delta = VByteEncoder::read_u64(data, pos)?;
        let value = match self.last {
            None => delta,
            Some(_) if delta == 0 => {
                return Err(Error::corrupt_index("Non-increasing document id"));
            }
            Some(last) => last
                .checked_add(delta)
                .ok_or_else(|| Error::corrupt_index("Document id overflows u64"))?,
        };
        self.last = Some(value);
        Ok(value)
    }

    pub fn decode_u64_list(data: &[u8]) -> Result<Vec<u64>> {
        let mut decoder = DeltaDecoder::new();
        let mut nums = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            nums.push(decoder.read(data, &mut pos)?);
        }
        Ok(nums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn large_gaps_survive() {
        let ids = vec![0, 2_147_483_647, 2_147_483_648, 20_000_000_000, 79_940_594_059, u64::MAX];
        let encoded = DeltaEncoder::encode_u64_list(&ids).unwrap();
        assert_eq!(DeltaDecoder::decode_u64_list(&encoded).unwrap(), ids);
    }

    #[test]
    fn rejects_non_increasing_input() {
        let err = DeltaEncoder::encode_u64_list(&[5, 5]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = DeltaEncoder::encode_u64_list(&[9, 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn zero_gap_and_overflow_are_corrupt() {
        // 7 then a zero gap
        let err = DeltaDecoder::decode_u64_list(&[7, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);

        let mut data = Vec::new();
        VByteEncoder::encode_u64(&mut data, u64::MAX);
        VByteEncoder::encode_u64(&mut data, 1);
        let err = DeltaDecoder::decode_u64_list(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn rebased_decoder_continues_the_sequence() {
        let encoded = DeltaEncoder::encode_u64_list(&[10, 20, 35]).unwrap();
        // Skip the first value (one byte) and resume from base 10
        let mut decoder = DeltaDecoder::with_base(Some(10));
        let mut pos = 1;
        assert_eq!(decoder.read(&encoded, &mut pos).unwrap(), 20);
        assert_eq!(decoder.read(&encoded, &mut pos).unwrap(), 35);
    }
}
