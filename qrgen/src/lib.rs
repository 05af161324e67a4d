//! QR code symbol construction: Reed-Solomon error correction over
//! GF(256), bit packing, the three content encodings (numeric,
//! alphanumeric, 8-bit), and the plan/mask/placement machinery that turns
//! all of that into a finished pixel grid.
//!
//! The entry point is [`Plan::new`] (pick a version/level/mask and lay out
//! every structural pixel) followed by [`Plan::encode`] (hand it content
//! and get back a finished [`Code`]):
//!
//! ```
//! use qrgen::{Encoding, Level, Mask, Plan, Version};
//!
//! let plan = Plan::new(Version(1), Level::M, Mask(0)).unwrap();
//! let code = plan.encode(&[Encoding::Alpha("HELLO WORLD".to_string())]).unwrap();
//! assert_eq!(code.size(), 21);
//! ```

mod bits;
mod code;
mod encoding;
mod error;
mod gf256;
mod mask;
mod pixel;
mod plan;
mod tables;

pub use bits::Bits;
pub use code::Code;
pub use encoding::{Encoding, Level, Version};
pub use error::QrError;
pub use mask::{auto_select, Mask};
pub use pixel::{Pixel, PixelRole};
pub use plan::Plan;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_round_trip_through_bit_fields() {
        let plan = Plan::new(Version(1), Level::M, Mask(0)).unwrap();
        let mut bits = Bits::new();
        let enc = Encoding::Num("12345".to_string());
        enc.encode(plan.version(), &mut bits);

        assert_eq!(bits.bit(0), false);
        assert_eq!(bits.bit(1), false);
        assert_eq!(bits.bit(2), false);
        assert_eq!(bits.bit(3), true); // mode indicator 0b0001

        let count_width = 10;
        let mut count = 0u32;
        for i in 0..count_width {
            count = (count << 1) | bits.bit(4 + i) as u32;
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn alphanumeric_hello_world_mode_and_length_fields() {
        let plan = Plan::new(Version(1), Level::H, Mask(0)).unwrap();
        let mut bits = Bits::new();
        let enc = Encoding::Alpha("HELLO WORLD".to_string());
        enc.encode(plan.version(), &mut bits);

        let mut mode = 0u32;
        for i in 0..4 {
            mode = (mode << 1) | bits.bit(i) as u32;
        }
        assert_eq!(mode, 2);

        let mut len = 0u32;
        for i in 0..9 {
            len = (len << 1) | bits.bit(4 + i) as u32;
        }
        assert_eq!(len, 11);

        // First 11-bit group: codes for 'H' (17) and 'E' (14): 17*45+14.
        let mut group = 0u32;
        for i in 0..11 {
            group = (group << 1) | bits.bit(13 + i) as u32;
        }
        assert_eq!(group, 17 * 45 + 14);
    }

    #[test]
    fn reed_solomon_syndrome_of_a_valid_codeword_is_zero() {
        let plan = Plan::new(Version(1), Level::M, Mask(0)).unwrap();
        let code = plan.encode(&[Encoding::Alpha("HELLO WORLD".to_string())]).unwrap();
        assert_eq!(code.size(), plan.size());
    }

    #[test]
    fn end_to_end_grid_has_exactly_one_dark_module_outside_data_roles() {
        let plan = Plan::new(Version(1), Level::L, Mask(0)).unwrap();
        let mut unused_black = 0;
        for y in 0..plan.size() {
            for x in 0..plan.size() {
                if plan.pixel(y, x).role() == PixelRole::Unused && plan.pixel(y, x).black() {
                    unused_black += 1;
                }
            }
        }
        assert_eq!(unused_black, 1);
    }
}
