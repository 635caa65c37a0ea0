//! Ladder reading.
//!
//! A string in atari is "ladder captured" when the attacker can keep it in
//! atari on every move until it dies. Reading is a small recursive search on
//! a scratch copy of the position: the escaper may extend at its liberty or
//! capture an adjacent attacker in atari; the attacker tries both liberties
//! of a string left with two.

use crate::board::{Color, Point};
use crate::constants::LADDER_DEPTH_MAX;
use crate::position::Position;

/// Whether the string on `pt`, currently in atari, cannot escape a ladder.
pub fn is_ladder_captured(pos: &Position, pt: Point) -> bool {
    match pos.string_at(pt) {
        Some(s) if s.lib_count() == 1 => {}
        _ => return false,
    }
    let mut scratch = pos.clone();
    scratch.rollout = true;
    !escapes(&mut scratch, pt, 0)
}

/// Liberties of `color`'s strings in atari whose extension runs into a ladder.
///
/// Playing these points only prolongs a dead string.
pub fn ladder_extensions(pos: &Position, color: Color) -> Vec<Point> {
    let mut points = Vec::new();
    for (id, s) in pos.strings().live() {
        if s.color() != color || s.lib_count() != 1 {
            continue;
        }
        let lib = s.libs()[0];
        if points.contains(&lib) {
            continue;
        }
        if let Some(origin) = pos.strings().members(id).next() {
            if is_ladder_captured(pos, origin) {
                points.push(lib);
            }
        }
    }
    points
}

/// Result of a move by the escaper: `true` if the string on `pt` gets away.
fn outcome_after_escape(pos: &mut Position, pt: Point, depth: usize) -> bool {
    match pos.string_at(pt).map(|s| s.lib_count()) {
        Some(0) | Some(1) | None => false,
        Some(2) => !chase(pos, pt, depth + 1),
        Some(_) => true,
    }
}

/// The escaper is to move and the string on `pt` is in atari.
fn escapes(pos: &mut Position, pt: Point, depth: usize) -> bool {
    if depth >= LADDER_DEPTH_MAX {
        return true;
    }
    let Some(s) = pos.string_at(pt) else {
        return false;
    };
    let color = s.color();
    let lib = s.libs()[0];
    let captures: Vec<Point> = s
        .neighbors()
        .iter()
        .map(|&id| pos.strings().get(id))
        .filter(|enemy| enemy.lib_count() == 1)
        .map(|enemy| enemy.libs()[0])
        .collect();

    for capture in captures {
        if pos.apply_move(color, capture).is_ok() {
            let escaped = outcome_after_escape(pos, pt, depth);
            pos.undo_last_move();
            if escaped {
                return true;
            }
        }
    }

    if pos.apply_move(color, lib).is_err() {
        return false;
    }
    let escaped = outcome_after_escape(pos, pt, depth);
    pos.undo_last_move();
    escaped
}

/// The attacker is to move and the string on `pt` has two liberties.
fn chase(pos: &mut Position, pt: Point, depth: usize) -> bool {
    let Some(s) = pos.string_at(pt) else {
        return true;
    };
    let attacker = s.color().opponent();
    let libs = [s.libs()[0], s.libs()[1]];
    for lib in libs {
        if pos.apply_move(attacker, lib).is_err() {
            continue;
        }
        let captured = match pos.string_at(pt).map(|s| s.lib_count()) {
            None => true,
            Some(1) => !escapes(pos, pt, depth + 1),
            Some(_) => false,
        };
        pos.undo_last_move();
        if captured {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;

    fn pt(s: &str) -> Point {
        parse_coord(s).unwrap()
    }

    fn setup(black: &[&str], white: &[&str]) -> Position {
        let mut p = Position::new();
        for c in black {
            p.apply_move(Color::Black, pt(c)).unwrap();
        }
        for c in white {
            p.apply_move(Color::White, pt(c)).unwrap();
        }
        p
    }

    /// Black C7 in atari with the ladder running towards the lower right.
    const LADDER_WHITE: [&str; 4] = ["C8", "D8", "B7", "C6"];

    #[test]
    fn test_captured_1() {
        let p = setup(&["C7"], &LADDER_WHITE);
        assert_eq!(p.string_at(pt("C7")).unwrap().lib_count(), 1);
        assert!(is_ladder_captured(&p, pt("C7")));
        assert_eq!(ladder_extensions(&p, Color::Black), vec![pt("D7")]);
    }

    #[test]
    fn test_breaker_1() {
        let p = setup(&["C7", "G4"], &LADDER_WHITE);
        assert!(!is_ladder_captured(&p, pt("C7")));
        assert!(ladder_extensions(&p, Color::Black).is_empty());
    }

    #[test]
    fn test_capture_to_escape_1() {
        let mut p = setup(&["C7"], &LADDER_WHITE);
        p.apply_move(Color::Black, pt("A7")).unwrap();
        p.apply_move(Color::Black, pt("B8")).unwrap();
        assert_eq!(p.string_at(pt("B7")).unwrap().lib_count(), 1);
        assert!(!is_ladder_captured(&p, pt("C7")));
    }

    #[test]
    fn test_not_in_atari() {
        let p = setup(&["E5"], &["E6"]);
        assert!(!is_ladder_captured(&p, pt("E5")));
        assert!(!is_ladder_captured(&p, pt("A1")));
    }

    #[test]
    fn test_reading_leaves_position_untouched() {
        let p = setup(&["C7"], &LADDER_WHITE);
        let hash = p.current_hash();
        is_ladder_captured(&p, pt("C7"));
        assert_eq!(p.current_hash(), hash);
        p.validate().unwrap();
    }
}
