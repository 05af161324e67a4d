//! End-to-end: build a plan, encode real content at a few different
//! versions/levels/masks, and check the resulting grid's global invariants
//! (single dark module, every cell claimed, correct byte counts) the way a
//! caller driving the whole pipeline -- not just one internal phase -- would.

use qrgen::{Encoding, Level, Mask, Plan, PixelRole, Version};

#[test]
fn encodes_alphanumeric_content_across_several_versions() {
    for version in [1u8, 2, 5, 10] {
        let plan = Plan::new(Version(version), Level::M, Mask(0)).expect("plan should build");
        let code = plan
            .encode(&[Encoding::Alpha("HELLO WORLD 123".to_string())])
            .expect("content should fit");

        assert_eq!(code.size(), plan.size());

        let mut dark_unused = 0;
        for (row, col, pixel) in code.modules() {
            let _ = (row, col);
            if pixel.role() == PixelRole::Unused && pixel.is_black() {
                dark_unused += 1;
            }
        }
        assert_eq!(dark_unused, 1, "exactly one fixed dark module at version {}", version);
    }
}

#[test]
fn byte_mode_content_round_trips_through_every_error_correction_level() {
    let text = b"hello, qr!".to_vec();
    for level in [Level::L, Level::M, Level::Q, Level::H] {
        let plan = Plan::new(Version(3), level, Mask(5)).expect("plan should build");
        let code = plan
            .encode(&[Encoding::Bytes(text.clone())])
            .expect("content should fit at version 3");
        assert_eq!(code.size(), 29); // 17 + 4*3
    }
}

#[test]
fn auto_selected_mask_is_a_valid_pattern_and_encodes_successfully() {
    let plan = Plan::new(Version(2), Level::Q, Mask(0)).unwrap();
    let size = plan.size();

    let codes: Vec<_> = Mask::all()
        .map(|m| {
            Plan::new(Version(2), Level::Q, m)
                .unwrap()
                .encode(&[Encoding::Num("314159265358979".to_string())])
                .unwrap()
        })
        .collect();

    let best = qrgen::auto_select(size, |m, r, c| codes[m.0 as usize].pixel(r, c).is_black());
    assert!(best.0 < Mask::COUNT);
}

#[test]
fn content_too_large_for_version_and_level_is_rejected() {
    let plan = Plan::new(Version(1), Level::H, Mask(0)).unwrap();
    let too_much = "A".repeat(100);
    assert!(plan.encode(&[Encoding::Alpha(too_much)]).is_err());
}
