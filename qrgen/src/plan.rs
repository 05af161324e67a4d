//! The plan builder: lays out every structural and data-bearing pixel for
//! a given (version, level, mask) ahead of actually having any content to
//! encode. Four phases, run in order and each refining the previous one's
//! grid -- `vplan` (position/timing/alignment/version-info), `fplan`
//! (format metadata), `lplan` (data/check byte interleaving and placement),
//! `mplan` (mask application). Mirrors `qr.go`'s `NewPlan` exactly; this is
//! the single most fiddly piece of the whole crate; get the pixel
//! bookkeeping wrong here and nothing downstream can recover.

use crate::bits::Bits;
use crate::encoding::{Encoding, Level, Version};
use crate::error::QrError;
use crate::gf256::FIELD;
use crate::mask::Mask;
use crate::pixel::{Pixel, PixelRole};
use crate::tables;
use crate::Code;

/// A fully laid-out QR symbol skeleton: every structural pixel (position,
/// alignment, timing, format, version-info) is final, and every data/check
/// pixel knows its bit offset into the eventual interleaved codeword
/// stream and carries its mask-inversion bit -- all that's missing is the
/// actual content, supplied later by [`Plan::encode`].
#[derive(Debug, Clone)]
pub struct Plan {
    version: Version,
    level: Level,
    mask: Mask,
    data_bytes: i32,
    check_bytes: i32,
    blocks: i32,
    size: i32,
    grid: Vec<Pixel>,
}

impl Plan {
    /// Builds the plan for `version` (1..=40), `level`, and `mask` (0..=7).
    pub fn new(version: Version, level: Level, mask: Mask) -> Result<Plan, QrError> {
        if version.0 < 1 || version.0 > 40 {
            return Err(QrError::InvalidVersion(version.0));
        }
        if mask.0 >= Mask::COUNT {
            return Err(QrError::PlanConflict("mask out of range 0..8"));
        }

        let mut plan = vplan(version);
        fplan(&mut plan, level, mask);
        lplan(&mut plan, version, level);
        mplan(&mut plan, mask);
        Ok(plan)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn data_bytes(&self) -> i32 {
        self.data_bytes
    }

    pub fn check_bytes(&self) -> i32 {
        self.check_bytes
    }

    pub fn blocks(&self) -> i32 {
        self.blocks
    }

    pub fn pixel(&self, row: i32, col: i32) -> Pixel {
        self.grid[(row * self.size + col) as usize]
    }

    fn pixel_mut(&mut self, row: i32, col: i32) -> &mut Pixel {
        let size = self.size;
        &mut self.grid[(row * size + col) as usize]
    }

    /// Concatenates `encodings`' content into the data region, pads to
    /// capacity, splits into blocks, computes Reed-Solomon check bytes per
    /// block, and stamps the resulting bits onto this plan's Data/Check
    /// pixels to produce a finished [`Code`].
    pub fn encode(&self, encodings: &[Encoding]) -> Result<Code, QrError> {
        let mut bits = Bits::new();
        for e in encodings {
            e.check()?;
            e.encode(self.version, &mut bits);
        }

        let capacity = self.data_bytes * 8;
        let remaining = capacity - bits.len() as i32;
        if remaining < 0 {
            return Err(QrError::CapacityExceeded {
                need: bits.len() as u32,
                have: capacity as u32,
            });
        }

        // Terminator (up to 4 zero bits), then pad to a byte boundary, then
        // repeat 0xec/0x11 until the data region is full.
        if remaining <= 4 {
            bits.write(0, remaining as u32);
        } else {
            bits.write(0, 4);
            bits.pad_to_byte();
            let pad = self.data_bytes as usize - bits.nbyte();
            for i in 0..pad {
                bits.write(if i % 2 == 0 { 0xec } else { 0x11 }, 8);
            }
        }

        let data = bits.bytes();
        debug_assert_eq!(data.len(), self.data_bytes as usize);

        let nd = self.data_bytes / self.blocks;
        let nc = self.check_bytes / self.blocks;
        let extra = self.data_bytes - nd * self.blocks;

        let mut check: Vec<u8> = Vec::with_capacity(self.check_bytes as usize);
        let mut src = data;
        for i in 0..self.blocks {
            let this_nd = if i >= self.blocks - extra { nd + 1 } else { nd };
            let (block, rest) = src.split_at(this_nd as usize);
            check.extend_from_slice(&FIELD.ec_bytes(block, nc as usize));
            src = rest;
        }
        debug_assert!(src.is_empty());
        debug_assert_eq!(check.len(), self.check_bytes as usize);

        let mut grid = self.grid.clone();
        for cell in &mut grid {
            match cell.role() {
                PixelRole::Data => {
                    let o = cell.offset() as usize;
                    if data[o / 8] & (1 << (7 - (o % 8))) != 0 {
                        cell.set_black(!cell.black());
                    }
                }
                PixelRole::Check => {
                    let o = cell.offset() as usize;
                    if check[o / 8] & (1 << (7 - (o % 8))) != 0 {
                        cell.set_black(!cell.black());
                    }
                }
                _ => {}
            }
        }

        Ok(Code::new(self.size, grid))
    }
}

/// Phase 1: position/timing/alignment boxes and (version >= 7) the
/// version-info block, plus the one fixed dark module.
fn vplan(version: Version) -> Plan {
    let size = version.size();
    let mut plan = Plan {
        version,
        level: Level::L,
        mask: Mask(0),
        data_bytes: 0,
        check_bytes: 0,
        blocks: 0,
        size,
        grid: vec![Pixel::default(); (size * size) as usize],
    };

    const TI: i32 = 6;
    for i in 0..size {
        let black = i & 1 == 0;
        let p = Pixel::new(PixelRole::Timing, black);
        *plan.pixel_mut(i, TI) = p;
        *plan.pixel_mut(TI, i) = p;
    }

    pos_box(&mut plan, 0, 0);
    pos_box(&mut plan, size - 7, 0);
    pos_box(&mut plan, 0, size - 7);

    let info = tables::info(version.0);
    let mut x = 4;
    while x + 5 < size {
        let mut y = 4;
        while y + 5 < size {
            let skip = (x < 7 && y < 7) || (x < 7 && y + 5 >= size - 7) || (x + 5 >= size - 7 && y < 7);
            if !skip {
                align_box(&mut plan, x, y);
            }
            y = if y == 4 { info.apos } else { y + info.astride };
        }
        x = if x == 4 { info.apos } else { x + info.astride };
    }

    if info.pattern != 0 {
        let mut pat = info.pattern;
        for x in 0..6 {
            for y in 0..3 {
                let black = pat & 1 != 0;
                let p = Pixel::new(PixelRole::PVersion, black);
                *plan.pixel_mut(size - 11 + y, x) = p;
                *plan.pixel_mut(x, size - 11 + y) = p;
                pat >>= 1;
            }
        }
    }

    *plan.pixel_mut(size - 8, 8) = Pixel::new(PixelRole::Unused, true);

    plan
}

/// Phase 2: the 15-bit format metadata (level + mask + BCH remainder,
/// XOR-masked), stamped into both loci the standard mandates.
fn fplan(plan: &mut Plan, level: Level, mask: Mask) {
    let mut fb: u32 = (level.index() as u32 ^ 1) << 13;
    fb |= (mask.0 as u32) << 10;

    const FORMAT_POLY: u32 = 0x537;
    let mut rem = fb;
    for i in (10..=14).rev() {
        if rem & (1 << i) != 0 {
            rem ^= FORMAT_POLY << (i - 10);
        }
    }
    fb |= rem;

    const INVERT: u32 = 0x5412;
    let size = plan.size;

    for i in 0..15u32 {
        let mut pix = Pixel::new(PixelRole::Format, (fb >> i) & 1 == 1);
        if (INVERT >> i) & 1 == 1 {
            // The 0x5412 XOR mask is applied straight to the stored black
            // bit, same as `mplan` below; `toggle_invert` just records that
            // this bit was flipped by the mask (see `Pixel::is_black`).
            let black = pix.black();
            pix.set_black(!black);
            pix.toggle_invert();
        }

        // Top-left locus.
        match i {
            _ if i < 6 => *plan.pixel_mut(i as i32, 8) = pix,
            _ if i < 8 => *plan.pixel_mut(i as i32 + 1, 8) = pix,
            _ if i < 9 => *plan.pixel_mut(8, 7) = pix,
            _ => *plan.pixel_mut(8, 14 - i as i32) = pix,
        }
        // Bottom-right / right-column locus.
        if i < 8 {
            *plan.pixel_mut(8, size - 1 - i as i32) = pix;
        } else {
            *plan.pixel_mut(size - 1 - (14 - i as i32), 8) = pix;
        }
    }
}

/// Phase 3: data/check byte-count bookkeeping, block split, interleaving,
/// and the serpentine placement of every resulting bit into the grid.
fn lplan(plan: &mut Plan, version: Version, level: Level) {
    plan.level = level;

    let info = tables::info(version.0);
    let lvl = info.levels[level.index()];
    let nblock = lvl.nblock;
    let ne = lvl.check;
    let nde = (info.bytes - ne * nblock) / nblock;
    let extra = (info.bytes - ne * nblock) % nblock;

    let data_bits = (nde * nblock + extra) * 8;
    let check_bits = ne * nblock * 8;

    plan.data_bytes = info.bytes - ne * nblock;
    plan.check_bytes = ne * nblock;
    plan.blocks = nblock;

    let data: Vec<Pixel> = (0..data_bits)
        .map(|i| Pixel::with_offset(PixelRole::Data, false, i as u32))
        .collect();
    let check: Vec<Pixel> = (0..check_bits)
        .map(|i| Pixel::with_offset(PixelRole::Check, false, i as u32))
        .collect();

    // Split into per-block slices; the last `extra` blocks carry one extra
    // data byte each.
    let mut data_blocks: Vec<&[Pixel]> = Vec::with_capacity(nblock as usize);
    let mut check_blocks: Vec<&[Pixel]> = Vec::with_capacity(nblock as usize);
    let mut d_rest = &data[..];
    let mut c_rest = &check[..];
    for i in 0..nblock {
        let nd = if i >= nblock - extra { nde + 1 } else { nde };
        let (d, d_tail) = d_rest.split_at((nd * 8) as usize);
        data_blocks.push(d);
        d_rest = d_tail;
        let (c, c_tail) = c_rest.split_at((ne * 8) as usize);
        check_blocks.push(c);
        c_rest = c_tail;
    }
    debug_assert!(d_rest.is_empty() && c_rest.is_empty());

    // Interleave: first byte of every block, then second, and so on, data
    // first and then check.
    let mut stream: Vec<Pixel> = Vec::with_capacity((data_bits + check_bits) as usize);
    for i in 0..=nde {
        for block in &data_blocks {
            if (i * 8) as usize < block.len() {
                stream.extend_from_slice(&block[(i * 8) as usize..(i * 8 + 8) as usize]);
            }
        }
    }
    for i in 0..ne {
        for block in &check_blocks {
            if (i * 8) as usize < block.len() {
                stream.extend_from_slice(&block[(i * 8) as usize..(i * 8 + 8) as usize]);
            }
        }
    }
    debug_assert_eq!(stream.len(), (data_bits + check_bits) as usize);

    // Seven trailing pixels with no codeword backing, padding for strides
    // that overshoot the data+check stream (see spec.md's `Extra` role).
    stream.extend(std::iter::repeat(Pixel::new(PixelRole::Extra, false)).take(7));

    serpentine_place(plan, &mut stream);
}

/// Walks the grid in the canonical column-pair, up/down-alternating scan
/// (skipping the vertical timing strip at column 6) and hands the next
/// unclaimed pixel from `src` to every still-unassigned cell it crosses.
fn serpentine_place(plan: &mut Plan, src: &mut Vec<Pixel>) {
    let size = plan.size;
    let mut src_iter = src.drain(..);
    let mut next = || src_iter.next().expect("serpentine scan ran out of codeword bits");

    let mut x = size;
    while x > 0 {
        for y in (0..size).rev() {
            if plan.pixel(y, x - 1).role() == PixelRole::None {
                *plan.pixel_mut(y, x - 1) = next();
            }
            if plan.pixel(y, x - 2).role() == PixelRole::None {
                *plan.pixel_mut(y, x - 2) = next();
            }
        }
        x -= 2;
        if x == 7 {
            x -= 1;
        }
        for y in 0..size {
            if plan.pixel(y, x - 1).role() == PixelRole::None {
                *plan.pixel_mut(y, x - 1) = next();
            }
            if plan.pixel(y, x - 2).role() == PixelRole::None {
                *plan.pixel_mut(y, x - 2) = next();
            }
        }
        x -= 2;
    }
}

/// Phase 4: XOR-masks every Data/Check/Extra pixel the active mask
/// predicate selects.
fn mplan(plan: &mut Plan, mask: Mask) {
    plan.mask = mask;
    let size = plan.size;
    for y in 0..size {
        for x in 0..size {
            let role = plan.pixel(y, x).role();
            if matches!(role, PixelRole::Data | PixelRole::Check | PixelRole::Extra) && mask.invert(y, x) {
                let cell = plan.pixel_mut(y, x);
                cell.set_black(!cell.black());
                cell.toggle_invert();
            }
        }
    }
}

/// Draws a 7x7 position (finder) box at upper-left `(x, y)`, plus its
/// mandatory one-cell white border where the grid has room for it.
fn pos_box(plan: &mut Plan, x: i32, y: i32) {
    for dy in 0..7 {
        for dx in 0..7 {
            let black =
                dx == 0 || dx == 6 || dy == 0 || dy == 6 || (2..=4).contains(&dx) && (2..=4).contains(&dy);
            *plan.pixel_mut(y + dy, x + dx) = Pixel::new(PixelRole::Position, black);
        }
    }

    let size = plan.size;
    let white = Pixel::new(PixelRole::Position, false);
    for dy in -1..8 {
        if 0 <= y + dy && y + dy < size {
            if x > 0 {
                *plan.pixel_mut(y + dy, x - 1) = white;
            }
            if x + 7 < size {
                *plan.pixel_mut(y + dy, x + 7) = white;
            }
        }
    }
    for dx in -1..8 {
        if 0 <= x + dx && x + dx < size {
            if y > 0 {
                *plan.pixel_mut(y - 1, x + dx) = white;
            }
            if y + 7 < size {
                *plan.pixel_mut(y + 7, x + dx) = white;
            }
        }
    }
}

/// Draws a 5x5 alignment box at upper-left `(x, y)`.
fn align_box(plan: &mut Plan, x: i32, y: i32) {
    for dy in 0..5 {
        for dx in 0..5 {
            let black = dx == 0 || dx == 4 || dy == 0 || dy == 4 || (dx == 2 && dy == 2);
            *plan.pixel_mut(y + dy, x + dx) = Pixel::new(PixelRole::Alignment, black);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Encoding;

    #[test]
    fn version_one_grid_is_21_square() {
        let plan = Plan::new(Version(1), Level::L, Mask(0)).unwrap();
        assert_eq!(plan.size(), 21);
    }

    #[test]
    fn version_one_level_l_block_layout() {
        let plan = Plan::new(Version(1), Level::L, Mask(0)).unwrap();
        assert_eq!(plan.data_bytes(), 19);
        assert_eq!(plan.check_bytes(), 7);
        assert_eq!(plan.blocks(), 1);
    }

    #[test]
    fn every_cell_gets_a_named_role() {
        let plan = Plan::new(Version(1), Level::L, Mask(0)).unwrap();
        for y in 0..plan.size() {
            for x in 0..plan.size() {
                assert_ne!(plan.pixel(y, x).role(), PixelRole::None, "({}, {}) unassigned", y, x);
            }
        }
    }

    #[test]
    fn lone_dark_module_is_set() {
        let plan = Plan::new(Version(1), Level::L, Mask(0)).unwrap();
        assert!(plan.pixel(13, 8).black());
        assert_eq!(plan.pixel(13, 8).role(), PixelRole::Unused);
    }

    #[test]
    fn data_and_check_pixel_counts_match_byte_counts() {
        let plan = Plan::new(Version(1), Level::L, Mask(0)).unwrap();
        let mut data = 0;
        let mut check = 0;
        for y in 0..plan.size() {
            for x in 0..plan.size() {
                match plan.pixel(y, x).role() {
                    PixelRole::Data => data += 1,
                    PixelRole::Check => check += 1,
                    _ => {}
                }
            }
        }
        assert_eq!(data, plan.data_bytes() * 8);
        assert_eq!(check, plan.check_bytes() * 8);
    }

    #[test]
    fn rejects_out_of_range_version() {
        assert!(Plan::new(Version(0), Level::L, Mask(0)).is_err());
        assert!(Plan::new(Version(41), Level::L, Mask(0)).is_err());
    }

    #[test]
    fn encode_alphanumeric_hello_world_at_version_1_level_h() {
        let plan = Plan::new(Version(1), Level::H, Mask(0)).unwrap();
        let code = plan.encode(&[Encoding::Alpha("HELLO WORLD".to_string())]).unwrap();
        assert_eq!(code.size(), 21);
    }

    #[test]
    fn encode_rejects_content_exceeding_capacity() {
        let plan = Plan::new(Version(1), Level::H, Mask(0)).unwrap();
        let too_big = "0".repeat(200);
        assert!(plan.encode(&[Encoding::Num(too_big)]).is_err());
    }

    /// Reads a produced [`Code`] back against its own mask and block
    /// layout and confirms every block's data+check codeword divides the
    /// Reed-Solomon generator polynomial evenly (zero syndrome) -- the
    /// spec's round-trip property, and the test that would have caught
    /// `is_black` folding the mask XOR away to a no-op.
    #[test]
    fn decoded_codeword_has_zero_reed_solomon_syndrome() {
        let version = Version(1);
        let level = Level::M;
        let mask = Mask(0);
        let plan = Plan::new(version, level, mask).unwrap();
        let code = plan.encode(&[Encoding::Alpha("HELLO WORLD".to_string())]).unwrap();

        let mut data = vec![0u8; plan.data_bytes() as usize];
        let mut check = vec![0u8; plan.check_bytes() as usize];
        for y in 0..code.size() {
            for x in 0..code.size() {
                let pixel = code.pixel(y, x);
                let bit = pixel.is_black() ^ mask.invert(y, x);
                let dst = match pixel.role() {
                    PixelRole::Data => &mut data,
                    PixelRole::Check => &mut check,
                    _ => continue,
                };
                if bit {
                    let o = pixel.offset() as usize;
                    dst[o / 8] |= 1 << (7 - (o % 8));
                }
            }
        }

        let nblock = plan.blocks();
        let nd = plan.data_bytes() / nblock;
        let nc = plan.check_bytes() / nblock;
        let extra = plan.data_bytes() - nd * nblock;

        let mut d_rest = &data[..];
        let mut c_rest = &check[..];
        for i in 0..nblock {
            let this_nd = if i >= nblock - extra { nd + 1 } else { nd };
            let (dblock, d_tail) = d_rest.split_at(this_nd as usize);
            d_rest = d_tail;
            let (cblock, c_tail) = c_rest.split_at(nc as usize);
            c_rest = c_tail;

            let mut codeword = dblock.to_vec();
            codeword.extend_from_slice(cblock);
            let syndrome = FIELD.ec_bytes(&codeword, nc as usize);
            assert!(syndrome.iter().all(|&b| b == 0), "block {} has a nonzero RS syndrome", i);
        }
    }

    #[test]
    fn mask_inversion_round_trips_through_two_applications() {
        let version = Version(2);
        let mut plan = vplan(version);
        fplan(&mut plan, Level::M, Mask(3));
        lplan(&mut plan, version, Level::M);

        let snapshot = |p: &Plan| -> Vec<(bool, bool)> {
            (0..p.size())
                .flat_map(|y| (0..p.size()).map(move |x| (y, x)))
                .map(|(y, x)| (p.pixel(y, x).black(), p.pixel(y, x).inverted()))
                .collect()
        };

        let before = snapshot(&plan);
        mplan(&mut plan, Mask(3));
        // A single application must actually change some Data/Check pixel,
        // or this test would pass vacuously.
        assert_ne!(before, snapshot(&plan));

        mplan(&mut plan, Mask(3));
        assert_eq!(before, snapshot(&plan), "masking twice must restore the original flags");
    }
}
