//! FUEL_PATCH instruction encoding
//!
//! Every instruction starts with one byte: the top two bits select the
//! opcode, the remaining bits carry the length field. Seek reserves bit 5 as
//! a sign flag and keeps five length bits; the other opcodes use six.
//!
//! ```text
//!  7 6 5 4 3 2 1 0
//! +---+-----------+
//! |op | length    |   Copy / Insert / Merge (mask 0x3F)
//! +---+-+---------+
//! |00 |s| length  |   Seek (mask 0x1F, s = backwards)
//! +---+-+---------+
//! ```
//!
//! A length field below `mask - 4` stores `length - 1` inline. The top five
//! field values are escapes: `field - (mask - 5)` big-endian bytes follow and
//! hold `length - 1`.

use crate::fuel_patch::error::{FuelPatchError, FuelPatchResult};
use std::fmt;
use std::io::{ErrorKind, Read, Write};

/// Sign flag of the Seek opcode byte
pub const SEEK_SIGN_BIT: u8 = 0x20;

/// Largest number of escaped length bytes
pub const MAX_ESCAPE_BYTES: usize = 5;

/// Instruction opcode, taken from the top two bits of the opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Move the source cursor
    Seek = 0,
    /// Copy bytes from source to target
    Copy = 1,
    /// Copy literal bytes from patch to target
    Insert = 2,
    /// Write source + patch (mod 256) to target
    Merge = 3,
}

impl Opcode {
    fn from_byte(byte: u8) -> Self {
        match byte >> 6 {
            0 => Self::Seek,
            1 => Self::Copy,
            2 => Self::Insert,
            _ => Self::Merge,
        }
    }

    /// Mask of the length field in the opcode byte
    pub fn length_mask(self) -> u8 {
        match self {
            Self::Seek => 0x1F,
            Self::Copy | Self::Insert | Self::Merge => 0x3F,
        }
    }

    /// Lowercase opcode name
    pub fn name(self) -> &'static str {
        match self {
            Self::Seek => "seek",
            Self::Copy => "copy",
            Self::Insert => "insert",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded instruction header
///
/// Insert and Merge payloads follow the header in the patch stream and are
/// not part of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Relative source seek
    Seek(i64),
    /// Copy this many source bytes
    Copy(u64),
    /// Insert this many patch bytes
    Insert(u64),
    /// Merge this many source and patch bytes
    Merge(u64),
}

impl Instruction {
    /// Opcode of this instruction
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Seek(_) => Opcode::Seek,
            Self::Copy(_) => Opcode::Copy,
            Self::Insert(_) => Opcode::Insert,
            Self::Merge(_) => Opcode::Merge,
        }
    }

    /// Length magnitude of this instruction
    pub fn length(&self) -> u64 {
        match *self {
            Self::Seek(offset) => offset.unsigned_abs(),
            Self::Copy(len) | Self::Insert(len) | Self::Merge(len) => len,
        }
    }

    /// Read the next instruction header
    ///
    /// Returns `None` at a clean end of stream.
    pub fn read_from<R: Read>(reader: &mut R) -> FuelPatchResult<Option<Self>> {
        let mut first = [0u8; 1];
        if read_full(reader, &mut first)? == 0 {
            return Ok(None);
        }

        let byte = first[0];
        let opcode = Opcode::from_byte(byte);
        let mask = opcode.length_mask();
        let field = byte & mask;

        let length = if field < mask - 4 {
            u64::from(field) + 1
        } else {
            let count = usize::from(field - (mask - 5));
            let mut buf = [0u8; 8];
            let actual = read_full(reader, &mut buf[8 - count..])?;
            if actual < count {
                return Err(FuelPatchError::TruncatedInstruction {
                    opcode: opcode.name(),
                    expected: count,
                    actual,
                });
            }
            u64::from_be_bytes(buf) + 1
        };

        Ok(Some(match opcode {
            Opcode::Seek => {
                // at most 2^40, always fits
                let magnitude = length as i64;
                if byte & SEEK_SIGN_BIT == 0 {
                    Self::Seek(magnitude)
                } else {
                    Self::Seek(-magnitude)
                }
            }
            Opcode::Copy => Self::Copy(length),
            Opcode::Insert => Self::Insert(length),
            Opcode::Merge => Self::Merge(length),
        }))
    }

    /// Write this instruction header using the shortest encoding
    pub fn write_to<W: Write>(&self, writer: &mut W) -> FuelPatchResult<()> {
        let opcode = self.opcode();
        let length = self.length();
        if length == 0 {
            return Err(FuelPatchError::ZeroLength(opcode.name()));
        }

        let mask = opcode.length_mask();
        let value = length - 1;
        let mut head = (opcode as u8) << 6;
        if matches!(self, Self::Seek(offset) if *offset < 0) {
            head |= SEEK_SIGN_BIT;
        }

        if value < u64::from(mask - 4) {
            writer.write_all(&[head | value as u8])?;
            return Ok(());
        }

        let count = escape_byte_count(value);
        if count > MAX_ESCAPE_BYTES {
            return Err(FuelPatchError::LengthTooLarge(length));
        }
        writer.write_all(&[head | (mask - 5 + count as u8)])?;
        writer.write_all(&value.to_be_bytes()[8 - count..])?;
        Ok(())
    }
}

/// Bytes needed to hold `value`, at least one
fn escape_byte_count(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Fill `buf` from `reader`, stopping early only at end of stream
pub(crate) fn read_full<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(bytes: &[u8]) -> Instruction {
        Instruction::read_from(&mut Cursor::new(bytes))
            .unwrap()
            .unwrap()
    }

    fn encode(instruction: Instruction) -> Vec<u8> {
        let mut out = Vec::new();
        instruction.write_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_inline_lengths() {
        assert_eq!(decode(&[0x40]), Instruction::Copy(1));
        assert_eq!(decode(&[0x7A]), Instruction::Copy(59));
        assert_eq!(decode(&[0x80]), Instruction::Insert(1));
        assert_eq!(decode(&[0xC5]), Instruction::Merge(6));
        assert_eq!(decode(&[0x00]), Instruction::Seek(1));
        assert_eq!(decode(&[0x1A]), Instruction::Seek(27));
    }

    #[test]
    fn test_seek_sign_bit() {
        assert_eq!(decode(&[0x20]), Instruction::Seek(-1));
        assert_eq!(decode(&[0x24]), Instruction::Seek(-5));
        assert_eq!(encode(Instruction::Seek(-5)), vec![0x24]);
    }

    #[test]
    fn test_escaped_lengths() {
        // field 59 = one length byte for six-bit opcodes
        assert_eq!(decode(&[0x7B, 0x3B]), Instruction::Copy(60));
        // field 63 = five length bytes
        assert_eq!(
            decode(&[0xBF, 0x00, 0x00, 0x01, 0x00, 0x00]),
            Instruction::Insert(65537)
        );
        // field 27 = one length byte for Seek
        assert_eq!(decode(&[0x1B, 0xFF]), Instruction::Seek(256));
        assert_eq!(decode(&[0x3C, 0x01, 0x00]), Instruction::Seek(-257));
    }

    #[test]
    fn test_encoder_picks_shortest_form() {
        assert_eq!(encode(Instruction::Copy(59)), vec![0x7A]);
        assert_eq!(encode(Instruction::Copy(60)), vec![0x7B, 0x3B]);
        assert_eq!(encode(Instruction::Merge(257)), vec![0xFC, 0x01, 0x00]);
        assert_eq!(encode(Instruction::Seek(27)), vec![0x1A]);
        assert_eq!(encode(Instruction::Seek(28)), vec![0x1B, 0x1B]);
    }

    #[test]
    fn test_encoded_instructions_decode_back() {
        for instruction in [
            Instruction::Seek(-1_000_000),
            Instruction::Copy(1 << 39),
            Instruction::Insert(12345),
            Instruction::Merge(1),
        ] {
            assert_eq!(decode(&encode(instruction)), instruction);
        }
    }

    #[test]
    fn test_unencodable_lengths() {
        let mut out = Vec::new();
        assert!(matches!(
            Instruction::Copy(0).write_to(&mut out),
            Err(FuelPatchError::ZeroLength("copy"))
        ));
        assert!(matches!(
            Instruction::Insert((1 << 40) + 1).write_to(&mut out),
            Err(FuelPatchError::LengthTooLarge(_))
        ));
    }

    #[test]
    fn test_clean_end_of_stream() {
        let mut empty = Cursor::new(Vec::<u8>::new());
        assert!(Instruction::read_from(&mut empty).unwrap().is_none());
    }

    #[test]
    fn test_truncated_escape() {
        let err = Instruction::read_from(&mut Cursor::new([0x7D, 0x01])).unwrap_err();
        assert!(matches!(
            err,
            FuelPatchError::TruncatedInstruction {
                opcode: "copy",
                expected: 3,
                actual: 1
            }
        ));
    }
}
