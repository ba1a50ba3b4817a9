//! Bitmap glyph atlas for the matrix rain.
//!
//! Each glyph is a 5×7 dot matrix. The atlas holds half-width katakana shapes,
//! digits, Latin capitals and a handful of symbols. Drops store an index into
//! the atlas rather than a `char`.

/// Dot columns per glyph.
pub const GLYPH_COLUMNS: usize = 5;
/// Dot rows per glyph.
pub const GLYPH_ROWS: usize = 7;

/// One 5×7 glyph. Each row holds five bits, most significant bit on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    rows: [u8; GLYPH_ROWS],
}

impl Glyph {
    const fn new(ch: char, rows: [u8; GLYPH_ROWS]) -> Self {
        Self { ch, rows }
    }

    /// Whether the dot at `(col, row)` is lit. Out-of-range positions are unlit.
    #[inline]
    pub fn is_set(&self, col: usize, row: usize) -> bool {
        if col >= GLYPH_COLUMNS || row >= GLYPH_ROWS {
            return false;
        }
        self.rows[row] & (1 << (GLYPH_COLUMNS - 1 - col)) != 0
    }

    /// Number of lit dots.
    pub fn weight(&self) -> u32 {
        self.rows.iter().map(|r| (r & 0x1F).count_ones()).sum()
    }
}

/// The full atlas.
pub fn atlas() -> &'static [Glyph] {
    &ATLAS
}

/// Number of glyphs in the atlas.
pub fn atlas_len() -> usize {
    ATLAS.len()
}

/// Glyph at `index`, wrapping around the atlas.
pub fn glyph(index: u16) -> &'static Glyph {
    &ATLAS[index as usize % ATLAS.len()]
}

/// Look up the glyph drawn for `ch`, if the atlas has one.
pub fn glyph_for(ch: char) -> Option<&'static Glyph> {
    ATLAS.iter().find(|g| g.ch == ch)
}

static ATLAS: [Glyph; 88] = [
    // katakana
    Glyph::new('ア', [0x1F, 0x01, 0x05, 0x06, 0x04, 0x04, 0x08]),
    Glyph::new('イ', [0x01, 0x02, 0x04, 0x0C, 0x14, 0x04, 0x04]),
    Glyph::new('ウ', [0x04, 0x1F, 0x11, 0x01, 0x02, 0x04, 0x08]),
    Glyph::new('エ', [0x00, 0x1F, 0x04, 0x04, 0x04, 0x04, 0x1F]),
    Glyph::new('オ', [0x02, 0x1F, 0x02, 0x06, 0x0A, 0x12, 0x02]),
    Glyph::new('カ', [0x08, 0x1F, 0x09, 0x09, 0x09, 0x11, 0x06]),
    Glyph::new('キ', [0x08, 0x1F, 0x04, 0x1F, 0x02, 0x02, 0x02]),
    Glyph::new('ク', [0x08, 0x0F, 0x11, 0x01, 0x02, 0x04, 0x08]),
    Glyph::new('ケ', [0x08, 0x0F, 0x12, 0x02, 0x02, 0x04, 0x08]),
    Glyph::new('コ', [0x00, 0x1F, 0x01, 0x01, 0x01, 0x01, 0x1F]),
    Glyph::new('サ', [0x0A, 0x1F, 0x0A, 0x0A, 0x02, 0x04, 0x08]),
    Glyph::new('シ', [0x18, 0x00, 0x19, 0x01, 0x02, 0x04, 0x18]),
    Glyph::new('ス', [0x1F, 0x01, 0x02, 0x04, 0x0A, 0x11, 0x00]),
    Glyph::new('セ', [0x08, 0x1F, 0x09, 0x0A, 0x08, 0x08, 0x07]),
    Glyph::new('ソ', [0x11, 0x11, 0x09, 0x01, 0x02, 0x04, 0x08]),
    Glyph::new('タ', [0x08, 0x0F, 0x11, 0x0D, 0x02, 0x04, 0x08]),
    Glyph::new('チ', [0x02, 0x1C, 0x04, 0x1F, 0x04, 0x04, 0x08]),
    Glyph::new('ツ', [0x15, 0x15, 0x01, 0x01, 0x02, 0x04, 0x08]),
    Glyph::new('テ', [0x0E, 0x00, 0x1F, 0x04, 0x04, 0x04, 0x08]),
    Glyph::new('ト', [0x08, 0x08, 0x0C, 0x0A, 0x08, 0x08, 0x08]),
    Glyph::new('ナ', [0x04, 0x1F, 0x04, 0x04, 0x04, 0x08, 0x10]),
    Glyph::new('ニ', [0x00, 0x0E, 0x00, 0x00, 0x00, 0x00, 0x1F]),
    Glyph::new('ヌ', [0x1F, 0x01, 0x0A, 0x04, 0x0A, 0x10, 0x00]),
    Glyph::new('ネ', [0x04, 0x1F, 0x01, 0x02, 0x06, 0x15, 0x04]),
    Glyph::new('ノ', [0x01, 0x01, 0x01, 0x02, 0x04, 0x08, 0x10]),
    Glyph::new('ハ', [0x00, 0x0A, 0x0A, 0x11, 0x11, 0x11, 0x00]),
    Glyph::new('ヒ', [0x10, 0x10, 0x13, 0x1C, 0x10, 0x10, 0x0F]),
    Glyph::new('フ', [0x1F, 0x01, 0x01, 0x02, 0x02, 0x04, 0x08]),
    Glyph::new('ヘ', [0x00, 0x08, 0x14, 0x02, 0x01, 0x00, 0x00]),
    Glyph::new('ホ', [0x04, 0x1F, 0x04, 0x15, 0x15, 0x04, 0x04]),
    Glyph::new('マ', [0x1F, 0x01, 0x01, 0x0A, 0x04, 0x02, 0x00]),
    Glyph::new('ミ', [0x18, 0x06, 0x00, 0x18, 0x06, 0x00, 0x1E]),
    Glyph::new('ム', [0x04, 0x04, 0x08, 0x08, 0x12, 0x1F, 0x01]),
    Glyph::new('メ', [0x01, 0x01, 0x0A, 0x04, 0x0A, 0x10, 0x00]),
    Glyph::new('モ', [0x1F, 0x04, 0x1F, 0x04, 0x04, 0x04, 0x03]),
    Glyph::new('ヤ', [0x08, 0x1F, 0x09, 0x0A, 0x08, 0x08, 0x08]),
    Glyph::new('ユ', [0x00, 0x0E, 0x02, 0x02, 0x02, 0x1F, 0x00]),
    Glyph::new('ヨ', [0x1F, 0x01, 0x01, 0x1F, 0x01, 0x01, 0x1F]),
    Glyph::new('ラ', [0x0E, 0x00, 0x1F, 0x01, 0x01, 0x02, 0x0C]),
    Glyph::new('リ', [0x11, 0x11, 0x11, 0x01, 0x01, 0x02, 0x04]),
    Glyph::new('ル', [0x14, 0x14, 0x14, 0x14, 0x15, 0x15, 0x16]),
    Glyph::new('レ', [0x10, 0x10, 0x10, 0x11, 0x12, 0x14, 0x18]),
    Glyph::new('ロ', [0x00, 0x1F, 0x11, 0x11, 0x11, 0x11, 0x1F]),
    Glyph::new('ワ', [0x1F, 0x11, 0x01, 0x01, 0x02, 0x04, 0x08]),
    Glyph::new('ヲ', [0x1F, 0x01, 0x1F, 0x01, 0x02, 0x04, 0x08]),
    Glyph::new('ン', [0x18, 0x00, 0x01, 0x01, 0x02, 0x04, 0x18]),
    // digits
    Glyph::new('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    Glyph::new('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    Glyph::new('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    Glyph::new('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    Glyph::new('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    Glyph::new('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    Glyph::new('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    Glyph::new('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    Glyph::new('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    Glyph::new('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    // latin
    Glyph::new('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    Glyph::new('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    Glyph::new('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    Glyph::new('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    Glyph::new('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    Glyph::new('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    Glyph::new('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F]),
    Glyph::new('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    Glyph::new('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    Glyph::new('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C]),
    Glyph::new('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    Glyph::new('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    Glyph::new('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    Glyph::new('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    Glyph::new('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    Glyph::new('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    Glyph::new('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    Glyph::new('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    Glyph::new('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    Glyph::new('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    Glyph::new('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    Glyph::new('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    Glyph::new('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A]),
    Glyph::new('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    Glyph::new('Y', [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04]),
    Glyph::new('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
    // symbols
    Glyph::new('@', [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E]),
    Glyph::new('#', [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A]),
    Glyph::new('$', [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04]),
    Glyph::new('%', [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03]),
    Glyph::new('&', [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D]),
    Glyph::new('*', [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00]),
];
