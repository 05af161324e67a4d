//! Per-version metadata: alignment-pattern spacing, version-info bit
//! patterns, and block/check-byte counts per error-correction level.
//! Transcribed from the QR specification's version table (the same values
//! `qr.go`'s `vtab` hard-codes); there's no derivation worth doing at
//! runtime since the table is small and fixed by the standard.

/// Data-block and check-byte count for one (version, level) pair.
#[derive(Debug, Clone, Copy)]
pub struct LevelInfo {
    pub nblock: i32,
    pub check: i32,
}

const fn li(nblock: i32, check: i32) -> LevelInfo {
    LevelInfo { nblock, check }
}

/// One version row: alignment pattern placement, total codeword bytes, the
/// 18-bit version-info pattern (0 below version 7, where it's unused), and
/// the four error-correction levels' block layout, indexed `[L, M, Q, H]`.
#[derive(Debug, Clone, Copy)]
pub struct VersionInfo {
    pub apos: i32,
    pub astride: i32,
    pub bytes: i32,
    pub pattern: i32,
    pub levels: [LevelInfo; 4],
}

const fn v(apos: i32, astride: i32, bytes: i32, pattern: i32, levels: [LevelInfo; 4]) -> VersionInfo {
    VersionInfo {
        apos,
        astride,
        bytes,
        pattern,
        levels,
    }
}

/// Index 0 is an unused placeholder so `VTAB[version]` lines up directly
/// with the 1-based version numbers the rest of this crate uses.
pub static VTAB: [VersionInfo; 41] = [
    v(0, 0, 0, 0x0, [li(0, 0), li(0, 0), li(0, 0), li(0, 0)]),
    v(100, 100, 26, 0x0, [li(1, 7), li(1, 10), li(1, 13), li(1, 17)]),
    v(16, 100, 44, 0x0, [li(1, 10), li(1, 16), li(1, 22), li(1, 28)]),
    v(20, 100, 70, 0x0, [li(1, 15), li(1, 26), li(2, 18), li(2, 22)]),
    v(24, 100, 100, 0x0, [li(1, 20), li(2, 18), li(2, 26), li(4, 16)]),
    v(28, 100, 134, 0x0, [li(1, 26), li(2, 24), li(4, 18), li(4, 22)]),
    v(32, 100, 172, 0x0, [li(2, 18), li(4, 16), li(4, 24), li(4, 28)]),
    v(20, 16, 196, 0x7c94, [li(2, 20), li(4, 18), li(6, 18), li(5, 26)]),
    v(22, 18, 242, 0x85bc, [li(2, 24), li(4, 22), li(6, 22), li(6, 26)]),
    v(24, 20, 292, 0x9a99, [li(2, 30), li(5, 22), li(8, 20), li(8, 24)]),
    v(26, 22, 346, 0xa4d3, [li(4, 18), li(5, 26), li(8, 24), li(8, 28)]),
    v(28, 24, 404, 0xbbf6, [li(4, 20), li(5, 30), li(8, 28), li(11, 24)]),
    v(30, 26, 466, 0xc762, [li(4, 24), li(8, 22), li(10, 26), li(11, 28)]),
    v(32, 28, 532, 0xd847, [li(4, 26), li(9, 22), li(12, 24), li(16, 22)]),
    v(24, 20, 581, 0xe60d, [li(4, 30), li(9, 24), li(16, 20), li(16, 24)]),
    v(24, 22, 655, 0xf928, [li(6, 22), li(10, 24), li(12, 30), li(18, 24)]),
    v(24, 24, 733, 0x10b78, [li(6, 24), li(10, 28), li(17, 24), li(16, 30)]),
    v(28, 24, 815, 0x1145d, [li(6, 28), li(11, 28), li(16, 28), li(19, 28)]),
    v(28, 26, 901, 0x12a17, [li(6, 30), li(13, 26), li(18, 28), li(21, 28)]),
    v(28, 28, 991, 0x13532, [li(7, 28), li(14, 26), li(21, 26), li(25, 26)]),
    v(32, 28, 1085, 0x149a6, [li(8, 28), li(16, 26), li(20, 30), li(25, 28)]),
    v(26, 22, 1156, 0x15683, [li(8, 28), li(17, 26), li(23, 28), li(25, 30)]),
    v(24, 24, 1258, 0x168c9, [li(9, 28), li(17, 28), li(23, 30), li(34, 24)]),
    v(28, 24, 1364, 0x177ec, [li(9, 30), li(18, 28), li(25, 30), li(30, 30)]),
    v(26, 26, 1474, 0x18ec4, [li(10, 30), li(20, 28), li(27, 30), li(32, 30)]),
    v(30, 26, 1588, 0x191e1, [li(12, 26), li(21, 28), li(29, 30), li(35, 30)]),
    v(28, 28, 1706, 0x1afab, [li(12, 28), li(23, 28), li(34, 28), li(37, 30)]),
    v(32, 28, 1828, 0x1b08e, [li(12, 30), li(25, 28), li(34, 30), li(40, 30)]),
    v(24, 24, 1921, 0x1cc1a, [li(13, 30), li(26, 28), li(35, 30), li(42, 30)]),
    v(28, 24, 2051, 0x1d33f, [li(14, 30), li(28, 28), li(38, 30), li(45, 30)]),
    v(24, 26, 2185, 0x1ed75, [li(15, 30), li(29, 28), li(40, 30), li(48, 30)]),
    v(28, 26, 2323, 0x1f250, [li(16, 30), li(31, 28), li(43, 30), li(51, 30)]),
    v(32, 26, 2465, 0x209d5, [li(17, 30), li(33, 28), li(45, 30), li(54, 30)]),
    v(28, 28, 2611, 0x216f0, [li(18, 30), li(35, 28), li(48, 30), li(57, 30)]),
    v(32, 28, 2761, 0x228ba, [li(19, 30), li(37, 28), li(51, 30), li(60, 30)]),
    v(28, 24, 2876, 0x2379f, [li(19, 30), li(38, 28), li(53, 30), li(63, 30)]),
    v(22, 26, 3034, 0x24b0b, [li(20, 30), li(40, 28), li(56, 30), li(66, 30)]),
    v(26, 26, 3196, 0x2542e, [li(21, 30), li(43, 28), li(59, 30), li(70, 30)]),
    v(30, 26, 3362, 0x26a64, [li(22, 30), li(45, 28), li(62, 30), li(74, 30)]),
    v(24, 28, 3532, 0x27541, [li(24, 30), li(47, 28), li(65, 30), li(77, 30)]),
    v(28, 28, 3706, 0x28c69, [li(25, 30), li(49, 28), li(68, 30), li(81, 30)]),
];

pub fn info(version: u8) -> &'static VersionInfo {
    &VTAB[version as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_one_has_no_alignment_or_version_pattern() {
        assert_eq!(info(1).pattern, 0);
        assert_eq!(info(1).levels[0].nblock, 1);
        assert_eq!(info(1).levels[0].check, 7);
    }

    #[test]
    fn version_seven_introduces_the_version_pattern() {
        assert_ne!(info(7).pattern, 0);
    }

    #[test]
    fn version_forty_is_the_largest_row() {
        assert_eq!(info(40).bytes, 3706);
    }
}
