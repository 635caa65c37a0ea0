//! Board geometry: points, colours and coordinates.
//!
//! Points index a 1D array of `BOARD_SIZE * BOARD_SIZE` cells. The playable
//! region is surrounded by `OB_SIZE` rows/columns of off-board cells, so a
//! neighbour lookup up to two steps away never leaves the array.

use std::fmt;

use crate::constants::{BOARD_END, BOARD_SIZE, BOARD_START, OB_SIZE, PASS, PURE_BOARD_SIZE, RESIGN};

/// A point on the board, represented as an index into the 1D board array.
pub type Point = usize;

/// Colour of a player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Index for per-colour tables (Black = 0, White = 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// Content of a board cell. The discriminants are the 2-bit codes used by
/// the pattern context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Stone {
    Empty = 0,
    Black = 1,
    White = 2,
    OffBoard = 3,
}

impl Stone {
    /// 2-bit pattern code of this cell.
    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Stone::Black => Some(Color::Black),
            Stone::White => Some(Color::White),
            _ => None,
        }
    }

    #[inline]
    pub fn is_stone(self) -> bool {
        matches!(self, Stone::Black | Stone::White)
    }
}

impl From<Color> for Stone {
    #[inline]
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Stone::Black,
            Color::White => Stone::White,
        }
    }
}

/// Point at array coordinates `(x, y)`.
#[inline]
pub const fn pos(x: usize, y: usize) -> Point {
    x + y * BOARD_SIZE
}

#[inline]
pub const fn x_of(pt: Point) -> usize {
    pt % BOARD_SIZE
}

#[inline]
pub const fn y_of(pt: Point) -> usize {
    pt / BOARD_SIZE
}

#[inline]
pub const fn north(pt: Point) -> Point {
    pt - BOARD_SIZE
}

#[inline]
pub const fn south(pt: Point) -> Point {
    pt + BOARD_SIZE
}

#[inline]
pub const fn east(pt: Point) -> Point {
    pt + 1
}

#[inline]
pub const fn west(pt: Point) -> Point {
    pt - 1
}

/// The 4 orthogonal neighbours in the order N, E, S, W.
#[inline]
pub fn neighbors(pt: Point) -> [Point; 4] {
    [north(pt), east(pt), south(pt), west(pt)]
}

/// The 4 diagonal neighbours in the order NE, SE, SW, NW.
#[inline]
pub fn diagonals(pt: Point) -> [Point; 4] {
    [north(pt) + 1, south(pt) + 1, south(pt) - 1, north(pt) - 1]
}

/// All 8 neighbours, orthogonal first.
#[inline]
pub fn all_neighbors(pt: Point) -> [Point; 8] {
    let n = neighbors(pt);
    let d = diagonals(pt);
    [n[0], n[1], n[2], n[3], d[0], d[1], d[2], d[3]]
}

/// Whether `pt` lies inside the playable region.
#[inline]
pub fn is_on_board(pt: Point) -> bool {
    let (x, y) = (x_of(pt), y_of(pt));
    pt < BOARD_SIZE * BOARD_SIZE
        && (BOARD_START..=BOARD_END).contains(&x)
        && (BOARD_START..=BOARD_END).contains(&y)
}

/// Iterate over the playable points in row-major order.
pub fn onboard_points() -> impl Iterator<Item = Point> {
    (BOARD_START..=BOARD_END).flat_map(|y| (BOARD_START..=BOARD_END).map(move |x| pos(x, y)))
}

/// Distance from the nearest edge (0 = first line).
pub fn line_height(pt: Point) -> usize {
    let (x, y) = (x_of(pt) - OB_SIZE, y_of(pt) - OB_SIZE);
    x.min(y).min(PURE_BOARD_SIZE - 1 - x).min(PURE_BOARD_SIZE - 1 - y)
}

/// Move distance used by the rollout features: `dx + dy + max(dx, dy)`.
///
/// Adjacent points are at distance 2, diagonal points at distance 3.
#[inline]
pub fn move_distance(a: Point, b: Point) -> usize {
    let dx = x_of(a).abs_diff(x_of(b));
    let dy = y_of(a).abs_diff(y_of(b));
    dx + dy + dx.max(dy)
}

/// Parse a coordinate string (e.g., "D4", "pass") into a Point.
///
/// Columns use letters A-T skipping I, rows count up from the bottom edge.
/// Returns `None` for anything that is not a playable point or a pass.
pub fn parse_coord(s: &str) -> Option<Point> {
    if s.eq_ignore_ascii_case("pass") {
        return Some(PASS);
    }

    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let col_char = bytes[0].to_ascii_uppercase();
    if !col_char.is_ascii_uppercase() || col_char == b'I' {
        return None;
    }
    let mut col = (col_char - b'A') as usize;
    if col_char > b'I' {
        col -= 1;
    }

    let row: usize = s[1..].parse().ok()?;
    if col >= PURE_BOARD_SIZE || row == 0 || row > PURE_BOARD_SIZE {
        return None;
    }

    Some(pos(col + OB_SIZE, PURE_BOARD_SIZE - row + OB_SIZE))
}

/// Convert a Point to a coordinate string (e.g., "D4").
pub fn str_coord(pt: Point) -> String {
    if pt == PASS {
        return "pass".into();
    }
    if pt == RESIGN {
        return "resign".into();
    }

    let col = x_of(pt) - OB_SIZE;
    let row = PURE_BOARD_SIZE - (y_of(pt) - OB_SIZE);

    let mut c = b'A' + col as u8;
    if c >= b'I' {
        c += 1;
    }

    format!("{}{row}", c as char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BOARD_MAX;

    #[test]
    fn test_parse_str_coord_roundtrip() {
        for pt in onboard_points() {
            let s = str_coord(pt);
            assert_eq!(parse_coord(&s), Some(pt), "Failed roundtrip for {s}");
        }
    }

    #[test]
    fn test_parse_coord_rejects_garbage() {
        assert_eq!(parse_coord("I5"), None);
        assert_eq!(parse_coord("A0"), None);
        assert_eq!(parse_coord("Z1"), None);
        assert_eq!(parse_coord("x"), None);
        assert_eq!(parse_coord("PASS"), Some(PASS));
    }

    #[test]
    fn test_a1_is_bottom_left() {
        let a1 = parse_coord("A1").unwrap();
        assert_eq!(x_of(a1), BOARD_START);
        assert_eq!(y_of(a1), BOARD_END);
        assert!(!is_on_board(south(a1)));
        assert!(!is_on_board(west(a1)));
    }

    #[test]
    fn test_onboard_points_count() {
        assert_eq!(onboard_points().count(), PURE_BOARD_SIZE * PURE_BOARD_SIZE);
        assert!(onboard_points().all(|p| p < BOARD_MAX));
        assert!(!is_on_board(PASS));
    }

    #[test]
    fn test_move_distance() {
        let c = parse_coord("E5").unwrap();
        assert_eq!(move_distance(c, north(c)), 2);
        assert_eq!(move_distance(c, north(c) + 1), 3);
        assert_eq!(move_distance(c, north(north(c))), 4);
    }

    #[test]
    fn test_line_height() {
        assert_eq!(line_height(parse_coord("A1").unwrap()), 0);
        assert_eq!(line_height(parse_coord("C4").unwrap()), 2);
    }
}
