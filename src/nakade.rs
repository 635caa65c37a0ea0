//! Nakade: vital points of small eye spaces.
//!
//! An eye space of 3 to 6 points is classified by its sorted degree
//! sequence (the number of in-space orthogonal neighbours of each point).
//! Shapes that die when the opponent plays the vital point:
//!
//! | shape          | degrees         | vital point  |
//! |----------------|-----------------|--------------|
//! | straight/bent 3| 1 1 2           | the degree-2 |
//! | pyramid 4      | 1 1 1 3         | the degree-3 |
//! | crossed 5      | 1 1 1 1 4       | the degree-4 |
//! | bulky 5        | 1 2 2 2 3       | the degree-3 |
//! | rabbity 6      | 1 1 2 2 2 4     | the degree-4 |
//!
//! Squared four and straight/bent four have no vital point.

use crate::board::{Point, Stone, neighbors};
use crate::position::Position;

/// Largest eye space with a vital point.
pub const NAKADE_MAX: usize = 6;

/// Vital point of the eye space `points`, if its shape has one.
///
/// `points` must be orthogonally connected.
pub fn vital_point(points: &[Point]) -> Option<Point> {
    if !(3..=NAKADE_MAX).contains(&points.len()) {
        return None;
    }
    let mut degrees = [(0usize, 0 as Point); NAKADE_MAX];
    for (i, &p) in points.iter().enumerate() {
        let d = neighbors(p).iter().filter(|n| points.contains(n)).count();
        degrees[i] = (d, p);
    }
    let degrees = &mut degrees[..points.len()];
    degrees.sort_unstable();
    let signature: Vec<usize> = degrees.iter().map(|&(d, _)| d).collect();
    let (_, hub) = degrees[points.len() - 1];
    match signature.as_slice() {
        [1, 1, 2] | [1, 1, 1, 3] | [1, 1, 1, 1, 4] | [1, 2, 2, 2, 3] | [1, 1, 2, 2, 2, 4] => Some(hub),
        _ => None,
    }
}

/// Empty region containing `start`, or `None` if it exceeds `NAKADE_MAX` points.
pub fn eye_space(pos: &Position, start: Point) -> Option<Vec<Point>> {
    if pos.stone(start) != Stone::Empty {
        return None;
    }
    let mut space = vec![start];
    let mut i = 0;
    while i < space.len() {
        for n in neighbors(space[i]) {
            if pos.stone(n) == Stone::Empty && !space.contains(&n) {
                if space.len() == NAKADE_MAX {
                    return None;
                }
                space.push(n);
            }
        }
        i += 1;
    }
    Some(space)
}

/// Vital point of the small empty region containing `start`.
pub fn nakade_at(pos: &Position, start: Point) -> Option<Point> {
    eye_space(pos, start).and_then(|space| vital_point(&space))
}

/// Vital point of the region freed by the last move's captures.
pub fn after_capture(pos: &Position) -> Option<Point> {
    let last = pos.last_move()?;
    let captured = pos.last_captures(last.color);
    if !(3..=NAKADE_MAX).contains(&captured.len()) {
        return None;
    }
    nakade_at(pos, captured[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, parse_coord};

    fn pts(coords: &[&str]) -> Vec<Point> {
        coords.iter().map(|c| parse_coord(c).unwrap()).collect()
    }

    fn vital(coords: &[&str]) -> Option<Point> {
        vital_point(&pts(coords))
    }

    #[test]
    fn test_nakade3() {
        assert_eq!(vital(&["D5", "E5", "F5"]), parse_coord("E5"));
        assert_eq!(vital(&["D5", "E5", "E6"]), parse_coord("E5"));
    }

    #[test]
    fn test_nakade4() {
        // pyramid
        assert_eq!(vital(&["D5", "E5", "F5", "E6"]), parse_coord("E5"));
        // square
        assert_eq!(vital(&["D5", "E5", "D6", "E6"]), None);
        // straight
        assert_eq!(vital(&["C5", "D5", "E5", "F5"]), None);
    }

    #[test]
    fn test_nakade5() {
        assert_eq!(vital(&["D5", "E5", "F5", "E6", "E4"]), parse_coord("E5"));
        assert_eq!(vital(&["D5", "E5", "D6", "E6", "F5"]), parse_coord("E5"));
        assert_eq!(vital(&["C5", "D5", "E5", "F5", "G5"]), None);
    }

    #[test]
    fn test_nakade6() {
        assert_eq!(vital(&["E6", "D5", "E5", "F5", "E4", "F4"]), parse_coord("E5"));
        assert_eq!(vital(&["D5", "E5", "F5", "D4", "E4", "F4"]), None);
    }

    #[test]
    fn test_nakade_after_capture() {
        let mut p = Position::new();
        for c in ["B1", "C1", "D1"] {
            p.apply_move(Color::Black, parse_coord(c).unwrap()).unwrap();
        }
        for c in ["A1", "B2", "C2", "D2"] {
            p.apply_move(Color::White, parse_coord(c).unwrap()).unwrap();
        }
        assert_eq!(after_capture(&p), None);
        let info = p.apply_move(Color::White, parse_coord("E1").unwrap()).unwrap();
        assert_eq!(info.captured, 3);
        assert_eq!(after_capture(&p), parse_coord("C1"));
    }

    #[test]
    fn test_open_area_is_not_an_eye_space() {
        let p = Position::new();
        assert_eq!(eye_space(&p, parse_coord("E5").unwrap()), None);
        assert_eq!(nakade_at(&p, parse_coord("E5").unwrap()), None);
    }
}
