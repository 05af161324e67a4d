//! Content encodings: Numeric, Alphanumeric, and 8-bit byte mode, each able
//! to report how many bits it needs and to write itself into a [`Bits`]
//! buffer with the right mode indicator and character-count field ahead of
//! it.

use crate::bits::Bits;
use crate::error::QrError;

/// Error-correction level, lowest to highest redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    L,
    M,
    Q,
    H,
}

impl Level {
    /// Index into the per-version block tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Level::L => 0,
            Level::M => 1,
            Level::Q => 2,
            Level::H => 3,
        }
    }
}

/// A QR symbol version, 1..=40. Determines the grid size (`17 + 4*version`)
/// and which size class (affecting character-count field widths) applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version(pub u8);

impl Version {
    pub fn size(self) -> i32 {
        17 + 4 * self.0 as i32
    }

    /// 0 for versions 1-9, 1 for 10-26, 2 for 27-40 -- the three bit-width
    /// tiers the character-count field and alphanumeric/numeric bit costs
    /// scale across.
    pub(crate) fn size_class(self) -> usize {
        if self.0 <= 9 {
            0
        } else if self.0 <= 26 {
            1
        } else {
            2
        }
    }
}

const NUM_LEN: [u32; 3] = [10, 12, 14];
const ALPHA_LEN: [u32; 3] = [9, 11, 13];
const STRING_LEN: [u32; 3] = [8, 16, 16];

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

const MODE_NUMERIC: u32 = 0b0001;
const MODE_ALPHANUMERIC: u32 = 0b0010;
const MODE_BYTE: u32 = 0b0100;

/// One piece of content to encode into the QR symbol's data region.
#[derive(Debug, Clone)]
pub enum Encoding {
    Num(String),
    Alpha(String),
    Bytes(Vec<u8>),
}

impl Encoding {
    /// Validates the content is legal for this mode (digits only for
    /// `Num`, the 45-character alphanumeric set for `Alpha`).
    pub fn check(&self) -> Result<(), QrError> {
        match self {
            Encoding::Num(s) => {
                if s.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err(QrError::InvalidContent("numeric mode requires digits 0-9"))
                }
            }
            Encoding::Alpha(s) => {
                if s.bytes().all(|b| ALPHABET.contains(&b)) {
                    Ok(())
                } else {
                    Err(QrError::InvalidContent(
                        "alphanumeric mode requires the 45-character QR alphabet",
                    ))
                }
            }
            Encoding::Bytes(_) => Ok(()),
        }
    }

    fn mode_indicator(&self) -> u32 {
        match self {
            Encoding::Num(_) => MODE_NUMERIC,
            Encoding::Alpha(_) => MODE_ALPHANUMERIC,
            Encoding::Bytes(_) => MODE_BYTE,
        }
    }

    fn content_len(&self) -> usize {
        match self {
            Encoding::Num(s) => s.len(),
            Encoding::Alpha(s) => s.len(),
            Encoding::Bytes(b) => b.len(),
        }
    }

    fn count_bits(&self, version: Version) -> u32 {
        let class = version.size_class();
        match self {
            Encoding::Num(_) => NUM_LEN[class],
            Encoding::Alpha(_) => ALPHA_LEN[class],
            Encoding::Bytes(_) => STRING_LEN[class],
        }
    }

    /// Total bits this encoding occupies once written: 4-bit mode
    /// indicator, the character-count field, and the packed payload.
    pub fn bits(&self, version: Version) -> u32 {
        let payload = match self {
            Encoding::Num(s) => {
                let n = s.len() as u32;
                10 * (n / 3) + [0, 4, 7][(n % 3) as usize]
            }
            Encoding::Alpha(s) => {
                let n = s.len() as u32;
                11 * (n / 2) + 6 * (n % 2)
            }
            Encoding::Bytes(b) => 8 * b.len() as u32,
        };
        4 + self.count_bits(version) + payload
    }

    /// Writes the mode indicator, character count, and packed payload into
    /// `out`.
    pub fn encode(&self, version: Version, out: &mut Bits) {
        out.write(self.mode_indicator(), 4);
        out.write(self.content_len() as u32, self.count_bits(version));

        match self {
            Encoding::Num(s) => {
                let digits: Vec<u32> = s.bytes().map(|b| (b - b'0') as u32).collect();
                for chunk in digits.chunks(3) {
                    let (v, nbit) = match chunk.len() {
                        3 => (chunk[0] * 100 + chunk[1] * 10 + chunk[2], 10),
                        2 => (chunk[0] * 10 + chunk[1], 7),
                        1 => (chunk[0], 4),
                        _ => unreachable!(),
                    };
                    out.write(v, nbit);
                }
            }
            Encoding::Alpha(s) => {
                let codes: Vec<u32> = s
                    .bytes()
                    .map(|b| ALPHABET.iter().position(|&c| c == b).unwrap() as u32)
                    .collect();
                for chunk in codes.chunks(2) {
                    if chunk.len() == 2 {
                        out.write(chunk[0] * 45 + chunk[1], 11);
                    } else {
                        out.write(chunk[0], 6);
                    }
                }
            }
            Encoding::Bytes(b) => {
                for &byte in b {
                    out.write(byte as u32, 8);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_bit_cost_matches_digit_grouping() {
        let e = Encoding::Num("12345".to_string());
        // 4 mode + 10 count (version 1) + 10+10+4 payload bits for "123","45".
        assert_eq!(e.bits(Version(1)), 4 + 10 + 17);
    }

    #[test]
    fn alphanumeric_round_trip_bit_count() {
        let e = Encoding::Alpha("AC-42".to_string());
        let mut out = Bits::new();
        e.encode(Version(1), &mut out);
        assert_eq!(out.len() as u32, e.bits(Version(1)));
    }

    #[test]
    fn rejects_non_digit_numeric_content() {
        assert!(Encoding::Num("12a".to_string()).check().is_err());
    }

    #[test]
    fn rejects_out_of_alphabet_content() {
        assert!(Encoding::Alpha("lowercase".to_string()).check().is_err());
    }
}
