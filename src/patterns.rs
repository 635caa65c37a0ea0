//! Local pattern context.
//!
//! Every point carries a 24-bit code describing the cells around it, two bits
//! per cell (`Stone` discriminants: empty 0, black 1, white 2, off-board 3):
//!
//! ```text
//!         8
//!      7  0  1          fields 0..8  : 3x3 ring, clockwise from north
//!  11  6  .  2  9       fields 8..12 : NN, EE, SS, WW
//!      5  4  3
//!        10
//! ```
//!
//! The low 16 bits are the 3x3 pattern, the whole 24 bits the 12-point
//! (manhattan distance 2) pattern. Codes are updated incrementally whenever a
//! cell changes, so reading a point's pattern is a single load.
//!
//! Symmetry helpers are pure functions over the code: rotating by 90 degrees
//! shifts the ring fields, mirroring reverses them, and colour swapping
//! exchanges the black and white codes of every field.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::board::{Color, Point, Stone, onboard_points};
use crate::constants::{BOARD_MAX, BOARD_SIZE};

/// A 12-point pattern code.
pub type Pattern = u32;

/// Number of 2-bit fields in a pattern.
pub const FIELDS: usize = 12;

/// Mask of the 3x3 part of a pattern.
pub const PAT3_MASK: Pattern = 0xffff;

/// Mask of all pattern fields.
pub const MD2_MASK: Pattern = 0x00ff_ffff;

/// `(dx, dy)` of each field; y grows southwards.
const OFFSETS: [(isize, isize); FIELDS] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -2),
    (2, 0),
    (0, 2),
    (-2, 0),
];

/// Field permutation of a clockwise quarter turn: field `i` moves to `ROT90[i]`.
const ROT90: [usize; FIELDS] = [2, 3, 4, 5, 6, 7, 0, 1, 9, 10, 11, 8];

/// Field permutation of a left-right mirror.
const MIRROR: [usize; FIELDS] = [0, 7, 6, 5, 4, 3, 2, 1, 8, 11, 10, 9];

#[inline]
fn offset(i: usize) -> isize {
    let (dx, dy) = OFFSETS[i];
    dx + dy * BOARD_SIZE as isize
}

/// The 2-bit code of field `i`.
#[inline]
pub fn field(pattern: Pattern, i: usize) -> u32 {
    (pattern >> (2 * i)) & 3
}

/// The 3x3 part of a pattern.
#[inline]
pub fn pat3(pattern: Pattern) -> u16 {
    (pattern & PAT3_MASK) as u16
}

/// Move every field `i` to `perm[i]`.
fn permute(pattern: Pattern, perm: &[usize; FIELDS]) -> Pattern {
    (0..FIELDS).fold(0, |acc, i| acc | (field(pattern, i) << (2 * perm[i])))
}

/// Rotate a pattern a quarter turn clockwise.
pub fn rotate90(pattern: Pattern) -> Pattern {
    permute(pattern, &ROT90)
}

/// Mirror a pattern left to right.
pub fn mirror(pattern: Pattern) -> Pattern {
    permute(pattern, &MIRROR)
}

/// Exchange black and white in every field.
#[inline]
pub fn swap_colors(pattern: Pattern) -> Pattern {
    const LOW: Pattern = 0x0055_5555;
    ((pattern & LOW) << 1) | ((pattern >> 1) & LOW)
}

/// The pattern as seen by `color`: the mover's stones always read as black.
#[inline]
pub fn mover_relative(pattern: Pattern, color: Color) -> Pattern {
    match color {
        Color::Black => pattern,
        Color::White => swap_colors(pattern),
    }
}

/// The 8 images of a pattern under the board symmetries.
pub fn symmetries(pattern: Pattern) -> [Pattern; 8] {
    let mut out = [0; 8];
    let mut p = pattern;
    let mut m = mirror(pattern);
    for i in 0..4 {
        out[2 * i] = p;
        out[2 * i + 1] = m;
        p = rotate90(p);
        m = rotate90(m);
    }
    out
}

/// Canonical representative of a pattern's symmetry class (the smallest image).
pub fn normalize(pattern: Pattern) -> Pattern {
    symmetries(pattern).into_iter().min().unwrap_or(pattern)
}

/// Canonical representative of a 3x3 pattern's symmetry class.
pub fn normalize_pat3(pattern: Pattern) -> u16 {
    pat3(normalize(pattern & PAT3_MASK))
}

/// Read the pattern around `pt` directly from the board.
pub fn compute(board: &[Stone; BOARD_MAX], pt: Point) -> Pattern {
    (0..FIELDS).fold(0, |acc, i| {
        let n = (pt as isize + offset(i)) as usize;
        acc | (board[n].bits() << (2 * i))
    })
}

/// Fill `patterns` for every on-board point of `board`.
pub fn init(board: &[Stone; BOARD_MAX], patterns: &mut [Pattern; BOARD_MAX]) {
    patterns.fill(0);
    for pt in onboard_points() {
        patterns[pt] = compute(board, pt);
    }
}

/// Record that the cell at `pt` now holds `stone`.
///
/// Updates the code of every point that sees `pt` in its neighbourhood.
#[inline]
pub fn update(patterns: &mut [Pattern; BOARD_MAX], pt: Point, stone: Stone) {
    for i in 0..FIELDS {
        let center = (pt as isize - offset(i)) as usize;
        let shift = 2 * i;
        patterns[center] = (patterns[center] & !(3 << shift)) | (stone.bits() << shift);
    }
}

/// Points whose pattern includes `pt`.
pub fn affected_points(pt: Point) -> [Point; FIELDS] {
    std::array::from_fn(|i| (pt as isize - offset(i)) as usize)
}

// =============================================================================
// Pattern tables
// =============================================================================

/// An already-loaded pattern table, consulted as an opaque scorer.
///
/// `pattern` is mover-relative (the player to move reads as black) and not
/// normalised; implementations decide how to treat symmetric shapes.
pub trait PatternTable: Send + Sync {
    /// Logit contribution of playing a move with this surrounding pattern.
    fn weight(&self, pattern: Pattern) -> f64;
}

/// A table that knows no patterns.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPatterns;

impl PatternTable for NoPatterns {
    fn weight(&self, _pattern: Pattern) -> f64 {
        0.0
    }
}

/// Weights keyed by normalised pattern codes, as produced by a pattern
/// database loader. 12-point entries take precedence over 3x3 entries.
#[derive(Debug, Default, Clone)]
pub struct PatternWeights {
    md2: HashMap<Pattern, f64>,
    pat3: HashMap<u16, f64>,
}

impl PatternWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a weight for a 12-point pattern and all its symmetric images.
    pub fn insert_md2(&mut self, pattern: Pattern, weight: f64) {
        self.md2.insert(normalize(pattern & MD2_MASK), weight);
    }

    /// Add a weight for a 3x3 pattern and all its symmetric images.
    pub fn insert_pat3(&mut self, pattern: Pattern, weight: f64) {
        self.pat3.insert(normalize_pat3(pattern), weight);
    }

    pub fn len(&self) -> usize {
        self.md2.len() + self.pat3.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PatternTable for PatternWeights {
    fn weight(&self, pattern: Pattern) -> f64 {
        if let Some(&w) = self.md2.get(&normalize(pattern & MD2_MASK)) {
            return w;
        }
        self.pat3.get(&normalize_pat3(pattern)).copied().unwrap_or(0.0)
    }
}

/// Classic 3x3 shapes around a candidate move, written from the point of
/// view of the player to move. Each string is a 3x3 grid read row by row,
/// north first:
/// - X: player to move
/// - O: opponent
/// - .: empty
/// - x: not X (O, . or #)
/// - o: not O (X, . or #)
/// - ?: anything
/// - #: off board
const PAT3_SRC: &[&str] = &[
    // hane - enclosing hane
    "XOX...???",
    // hane - non-cutting hane
    "XO....?.?",
    // hane - magari
    "XO?X..x.?",
    // katatsuke or diagonal attachment
    ".O.X.....",
    // cut - unprotected cut
    "XO?O.o?o?",
    // cut - peeped cut
    "XO?O.X???",
    // de
    "?X?O.Oooo",
    // cut keima
    "OX?o.O???",
    // side - chase
    "X.?O.?##?",
    // side - block side cut
    "OX?X.O###",
    // side - block side connection
    "?X?x.O###",
    // side - sagari
    "?XOx.x###",
    // side - cut
    "?OXX.O###",
];

/// Field index of each cell of a 3x3 source string (the centre has none).
const SRC_FIELD: [Option<usize>; 9] = [
    Some(7),
    Some(0),
    Some(1),
    Some(6),
    None,
    Some(2),
    Some(5),
    Some(4),
    Some(3),
];

/// The classic 3x3 shapes, matched for either colour in any orientation.
pub struct Pat3Shapes {
    bits: Box<[u64; 1024]>,
    weight: f64,
}

static PAT3_SHAPES: OnceLock<Pat3Shapes> = OnceLock::new();

impl Pat3Shapes {
    /// Build the shape set; every match contributes `weight`.
    pub fn new(weight: f64) -> Self {
        let mut shapes = Self {
            bits: Box::new([0; 1024]),
            weight,
        };
        for src in PAT3_SRC {
            let cells: Vec<u8> = src.bytes().collect();
            shapes.expand(&cells, 0, 0);
        }
        shapes
    }

    /// Process-wide shape set with the default weight.
    pub fn shared() -> &'static Pat3Shapes {
        PAT3_SHAPES.get_or_init(|| Pat3Shapes::new(1.0))
    }

    /// Expand wildcards of `cells[i..]` into concrete codes.
    fn expand(&mut self, cells: &[u8], i: usize, code: Pattern) {
        if i == cells.len() {
            for image in symmetries(code) {
                self.set(image);
                self.set(swap_colors(image));
            }
            return;
        }
        let Some(f) = SRC_FIELD[i] else {
            return self.expand(cells, i + 1, code);
        };
        let choices: &[Stone] = match cells[i] {
            b'X' => &[Stone::Black],
            b'O' => &[Stone::White],
            b'.' => &[Stone::Empty],
            b'#' => &[Stone::OffBoard],
            b'x' => &[Stone::White, Stone::Empty, Stone::OffBoard],
            b'o' => &[Stone::Black, Stone::Empty, Stone::OffBoard],
            _ => &[Stone::Black, Stone::White, Stone::Empty, Stone::OffBoard],
        };
        for &stone in choices {
            self.expand(cells, i + 1, code | (stone.bits() << (2 * f)));
        }
    }

    fn set(&mut self, code: Pattern) {
        let c = (code & PAT3_MASK) as usize;
        self.bits[c >> 6] |= 1 << (c & 63);
    }

    /// Whether the 3x3 part of `pattern` is one of the shapes.
    #[inline]
    pub fn matches(&self, pattern: Pattern) -> bool {
        let c = (pattern & PAT3_MASK) as usize;
        self.bits[c >> 6] & (1 << (c & 63)) != 0
    }

    /// Number of distinct 3x3 codes in the set.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PatternTable for Pat3Shapes {
    fn weight(&self, pattern: Pattern) -> f64 {
        if self.matches(pattern) { self.weight } else { 0.0 }
    }
}
