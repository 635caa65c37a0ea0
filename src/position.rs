//! Go position representation and move execution.
//!
//! A [`Position`] owns the board, the string table, the per-point pattern
//! codes and the hashes. Moves are applied with [`Position::apply_move`],
//! which validates the move completely before touching any state, and are
//! taken back exactly with [`Position::undo_last_move`].
//!
//! Hashes:
//! - `positional_hash`: stones plus side to move. Used for superko.
//! - `current_hash`: positional hash plus the active ko point. Identifies
//!   search tree nodes.
//! - `previous1_hash`, `previous2_hash`: the positional hash before the last
//!   move and before the one preceding it. A move that recreates
//!   `previous1_hash` is an immediate repetition and is caught before the
//!   full record scan.

use std::fmt;

use crate::board::{
    Color, Point, Stone, diagonals, is_on_board, neighbors, onboard_points, pos, str_coord,
};
use crate::constants::{BOARD_END, BOARD_MAX, BOARD_START, MAX_MOVES, PASS};
use crate::error::{IllegalMove, Result};
use crate::patterns::{self, Pattern};
use crate::string::{GoString, StringId, StringTable};
use crate::zobrist::keys;

/// One entry of the game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub color: Color,
    pub point: Point,
    /// Positional hash after the move.
    pub hash: u64,
}

/// What a successful move did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureInfo {
    /// Number of stones captured.
    pub captured: usize,
    /// Ko point created by the move, if any.
    pub ko: Option<Point>,
}

/// State needed to take a move back.
#[derive(Debug, Clone)]
struct UndoRecord {
    /// Side to move before the move, which need not be the mover.
    to_move: Color,
    /// Captured stones with their birth moves.
    captured: Vec<(Point, u32)>,
    /// Birth moves of the placed string's members before the move.
    births: Vec<(Point, u32)>,
    ko_pos: Point,
    ko_move: usize,
    ko_color: Color,
    current_hash: u64,
    previous1_hash: u64,
    previous2_hash: u64,
    pass_count: u32,
    capture_pos: Vec<Point>,
}

/// A Go position.
pub struct Position {
    board: [Stone; BOARD_MAX],
    birth_move: [u32; BOARD_MAX],
    patterns: [Pattern; BOARD_MAX],
    candidates: [bool; BOARD_MAX],
    strings: StringTable,
    current_color: Color,
    record: Vec<MoveRecord>,
    undo: Vec<UndoRecord>,
    initial_hash: u64,
    prisoners: [usize; 2],
    ko_pos: Point,
    ko_move: usize,
    ko_color: Color,
    current_hash: u64,
    previous1_hash: u64,
    previous2_hash: u64,
    positional_hash: u64,
    pass_count: u32,
    capture_pos: [Vec<Point>; 2],
    updated_strings: Vec<StringId>,
    /// Skip the superko scan. Set on playout copies, where only simple ko applies.
    pub rollout: bool,
}

impl Clone for Position {
    fn clone(&self) -> Self {
        Self {
            board: self.board,
            birth_move: self.birth_move,
            patterns: self.patterns,
            candidates: self.candidates,
            strings: self.strings.clone(),
            current_color: self.current_color,
            record: self.record.clone(),
            undo: self.undo.clone(),
            initial_hash: self.initial_hash,
            prisoners: self.prisoners,
            ko_pos: self.ko_pos,
            ko_move: self.ko_move,
            ko_color: self.ko_color,
            current_hash: self.current_hash,
            previous1_hash: self.previous1_hash,
            previous2_hash: self.previous2_hash,
            positional_hash: self.positional_hash,
            pass_count: self.pass_count,
            capture_pos: self.capture_pos.clone(),
            updated_strings: self.updated_strings.clone(),
            rollout: self.rollout,
        }
    }

    /// Reuses the allocations of `self`; playouts copy the root this way.
    fn clone_from(&mut self, source: &Self) {
        self.board = source.board;
        self.birth_move = source.birth_move;
        self.patterns = source.patterns;
        self.candidates = source.candidates;
        self.strings.clone_from(&source.strings);
        self.current_color = source.current_color;
        self.record.clone_from(&source.record);
        self.undo.clone_from(&source.undo);
        self.initial_hash = source.initial_hash;
        self.prisoners = source.prisoners;
        self.ko_pos = source.ko_pos;
        self.ko_move = source.ko_move;
        self.ko_color = source.ko_color;
        self.current_hash = source.current_hash;
        self.previous1_hash = source.previous1_hash;
        self.previous2_hash = source.previous2_hash;
        self.positional_hash = source.positional_hash;
        self.pass_count = source.pass_count;
        self.capture_pos.clone_from(&source.capture_pos);
        self.updated_strings.clone_from(&source.updated_strings);
        self.rollout = source.rollout;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn side_key(color: Color) -> u64 {
    match color {
        Color::Black => 0,
        Color::White => keys().side(),
    }
}

impl Position {
    /// An empty board with Black to move.
    pub fn new() -> Self {
        let mut board = [Stone::OffBoard; BOARD_MAX];
        let mut candidates = [false; BOARD_MAX];
        for pt in onboard_points() {
            board[pt] = Stone::Empty;
            candidates[pt] = true;
        }
        let mut patterns = [0; BOARD_MAX];
        patterns::init(&board, &mut patterns);
        Self {
            board,
            birth_move: [0; BOARD_MAX],
            patterns,
            candidates,
            strings: StringTable::new(),
            current_color: Color::Black,
            record: Vec::with_capacity(MAX_MOVES),
            undo: Vec::with_capacity(MAX_MOVES),
            initial_hash: 0,
            prisoners: [0; 2],
            ko_pos: PASS,
            ko_move: 0,
            ko_color: Color::Black,
            current_hash: 0,
            previous1_hash: 0,
            previous2_hash: 0,
            positional_hash: 0,
            pass_count: 0,
            capture_pos: [Vec::new(), Vec::new()],
            updated_strings: Vec::new(),
            rollout: false,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn stone(&self, pt: Point) -> Stone {
        self.board[pt]
    }

    #[inline]
    pub fn board(&self) -> &[Stone; BOARD_MAX] {
        &self.board
    }

    #[inline]
    pub fn to_move(&self) -> Color {
        self.current_color
    }

    /// Number of moves played, passes included.
    #[inline]
    pub fn moves(&self) -> usize {
        self.record.len()
    }

    pub fn record(&self) -> &[MoveRecord] {
        &self.record
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.record.last()
    }

    /// The move before the last one.
    pub fn previous_move(&self) -> Option<&MoveRecord> {
        self.record.len().checked_sub(2).map(|i| &self.record[i])
    }

    #[inline]
    pub fn prisoners(&self, color: Color) -> usize {
        self.prisoners[color.index()]
    }

    /// The ko point the side to move may not take, if any.
    pub fn ko_point(&self) -> Option<Point> {
        self.ko_active().then_some(self.ko_pos)
    }

    #[inline]
    fn ko_active(&self) -> bool {
        self.ko_pos != PASS && self.ko_move == self.record.len()
    }

    #[inline]
    pub fn current_hash(&self) -> u64 {
        self.current_hash
    }

    #[inline]
    pub fn positional_hash(&self) -> u64 {
        self.positional_hash
    }

    /// Positional hash before the last move.
    #[inline]
    pub fn previous1_hash(&self) -> u64 {
        self.previous1_hash
    }

    /// Positional hash before the move preceding the last one.
    #[inline]
    pub fn previous2_hash(&self) -> u64 {
        self.previous2_hash
    }

    /// 12-point pattern code of `pt`.
    #[inline]
    pub fn pattern(&self, pt: Point) -> Pattern {
        self.patterns[pt]
    }

    /// Whether `pt` is an empty on-board point.
    #[inline]
    pub fn is_candidate(&self, pt: Point) -> bool {
        self.candidates[pt]
    }

    pub fn pass_count(&self) -> u32 {
        self.pass_count
    }

    /// Two consecutive passes end the game.
    pub fn is_game_over(&self) -> bool {
        self.pass_count >= 2
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    #[inline]
    pub fn string_at(&self, pt: Point) -> Option<&GoString> {
        self.strings.at(pt)
    }

    /// Stones captured by `color`'s most recent move.
    pub fn last_captures(&self, color: Color) -> &[Point] {
        &self.capture_pos[color.index()]
    }

    /// Strings whose liberties or membership changed on the last move.
    pub fn updated_strings(&self) -> &[StringId] {
        &self.updated_strings
    }

    pub fn stone_count(&self) -> usize {
        onboard_points().filter(|&pt| self.board[pt].is_stone()).count()
    }

    // -------------------------------------------------------------------------
    // Legality
    // -------------------------------------------------------------------------

    /// Whether `color` may play at `pt`. Never mutates the position.
    pub fn is_legal(&self, color: Color, pt: Point) -> bool {
        self.check_move(color, pt).is_ok()
    }

    /// Validate a move without playing it.
    pub fn check_move(&self, color: Color, pt: Point) -> Result<()> {
        if self.record.len() >= MAX_MOVES {
            return Err(IllegalMove::CapacityExceeded);
        }
        if pt == PASS {
            return Ok(());
        }
        if pt >= BOARD_MAX || !is_on_board(pt) {
            return Err(IllegalMove::OutOfBoard);
        }
        if self.board[pt] != Stone::Empty {
            return Err(IllegalMove::OccupiedPoint);
        }
        if self.ko_active() && pt == self.ko_pos && color == self.ko_color {
            return Err(IllegalMove::KoViolation);
        }

        let mut captured = [usize::MAX; 4];
        let mut n_captured = 0;
        let mut has_liberty = false;
        let mut has_friend = false;
        for n in neighbors(pt) {
            match self.board[n] {
                Stone::Empty => has_liberty = true,
                Stone::OffBoard => {}
                stone => {
                    let Some(id) = self.strings.id_at(n) else {
                        continue;
                    };
                    let libs = self.strings.get(id).lib_count();
                    if stone == Stone::from(color) {
                        has_friend = true;
                        has_liberty |= libs > 1;
                    } else if libs == 1 && !captured[..n_captured].contains(&id) {
                        captured[n_captured] = id;
                        n_captured += 1;
                    }
                }
            }
        }
        if n_captured == 0 && !has_liberty {
            return Err(IllegalMove::Suicide);
        }
        if !has_friend && !self.strings.has_free_slot() {
            return Err(IllegalMove::CapacityExceeded);
        }

        if !self.rollout {
            let k = keys();
            let opponent = color.opponent();
            let mut hash = self.positional_hash
                ^ k.stone(color, pt)
                ^ side_key(self.current_color)
                ^ side_key(opponent);
            for &id in &captured[..n_captured] {
                for m in self.strings.members(id) {
                    hash ^= k.stone(opponent, m);
                }
            }
            if self.repeats(hash) {
                return Err(IllegalMove::SuperkoRepetition);
            }
        }
        Ok(())
    }

    /// Whether a positional hash already occurred in this game.
    fn repeats(&self, hash: u64) -> bool {
        hash == self.previous1_hash
            || hash == self.initial_hash
            || self.record.iter().any(|r| r.hash == hash)
    }

    /// Number of enemy stones a move at `pt` would capture.
    pub fn captures_by_move(&self, color: Color, pt: Point) -> usize {
        let mut seen = [usize::MAX; 4];
        let mut n_seen = 0;
        let mut total = 0;
        for n in neighbors(pt) {
            if let Some(id) = self.strings.id_at(n) {
                let s = self.strings.get(id);
                if s.color() != color && s.lib_count() == 1 && !seen[..n_seen].contains(&id) {
                    seen[n_seen] = id;
                    n_seen += 1;
                    total += s.size();
                }
            }
        }
        total
    }

    /// Liberties of the string formed by playing `pt`, ignoring captures.
    ///
    /// Counting stops at `limit` (at most 8).
    pub fn libs_after_move(&self, color: Color, pt: Point, limit: usize) -> usize {
        let mut libs = [PASS; 8];
        let mut n_libs = 0;
        let mut add = |lib: Point, libs: &mut [Point; 8]| {
            if lib != pt && n_libs < libs.len() && !libs[..n_libs].contains(&lib) {
                libs[n_libs] = lib;
                n_libs += 1;
            }
        };
        for n in neighbors(pt) {
            match self.board[n] {
                Stone::Empty => add(n, &mut libs),
                stone if stone == Stone::from(color) => {
                    if let Some(s) = self.strings.at(n) {
                        for &lib in s.libs() {
                            add(lib, &mut libs);
                        }
                    }
                }
                _ => {}
            }
        }
        n_libs.min(limit)
    }

    /// Whether playing `pt` captures nothing and leaves the string in atari.
    pub fn is_self_atari(&self, color: Color, pt: Point) -> bool {
        self.captures_by_move(color, pt) == 0 && self.libs_after_move(color, pt, 2) <= 1
    }

    /// Whether `pt` is a shared liberty of a seki.
    ///
    /// It must touch a black and a white string that each have two
    /// liberties, and filling it must leave the filler in atari without
    /// capturing, whichever colour plays it.
    pub fn is_seki(&self, pt: Point) -> bool {
        if !self.candidates[pt] {
            return false;
        }
        let mut two_libs = [false; 2];
        for n in neighbors(pt) {
            if let Some(s) = self.strings.at(n) {
                if s.lib_count() == 2 {
                    two_libs[s.color().index()] = true;
                }
            }
        }
        two_libs == [true, true]
            && self.is_self_atari(Color::Black, pt)
            && self.is_self_atari(Color::White, pt)
    }

    /// Colour surrounding `pt` on all on-board sides, if a single one does.
    ///
    /// May be a false eye.
    pub fn is_eyeish(&self, pt: Point) -> Option<Color> {
        if self.board[pt] != Stone::Empty {
            return None;
        }
        let mut eye_color = None;
        for n in neighbors(pt) {
            match self.board[n] {
                Stone::OffBoard => {}
                Stone::Empty => return None,
                stone => match (eye_color, stone.color()) {
                    (None, c) => eye_color = c,
                    (Some(a), Some(b)) if a != b => return None,
                    _ => {}
                },
            }
        }
        eye_color
    }

    /// Whether `pt` is a true eye of `color`.
    ///
    /// The point must be eyeish and have no enemy diagonal (one is tolerated
    /// on the edge).
    pub fn is_true_eye(&self, pt: Point, color: Color) -> bool {
        if self.is_eyeish(pt) != Some(color) {
            return false;
        }
        let enemy = Stone::from(color.opponent());
        let mut at_edge = false;
        let mut false_count = 0;
        for d in diagonals(pt) {
            match self.board[d] {
                Stone::OffBoard => at_edge = true,
                stone if stone == enemy => false_count += 1,
                _ => {}
            }
        }
        false_count <= usize::from(at_edge)
    }

    // -------------------------------------------------------------------------
    // Apply / undo
    // -------------------------------------------------------------------------

    /// Play `color` at `pt` (which may be `PASS`).
    ///
    /// On error the position is unchanged.
    pub fn apply_move(&mut self, color: Color, pt: Point) -> Result<CaptureInfo> {
        self.check_move(color, pt)?;
        if pt == PASS {
            self.apply_pass(color);
            return Ok(CaptureInfo::default());
        }
        Ok(self.apply_stone(color, pt))
    }

    fn push_undo(&mut self, color: Color) -> UndoRecord {
        UndoRecord {
            to_move: self.current_color,
            captured: Vec::new(),
            births: Vec::new(),
            ko_pos: self.ko_pos,
            ko_move: self.ko_move,
            ko_color: self.ko_color,
            current_hash: self.current_hash,
            previous1_hash: self.previous1_hash,
            previous2_hash: self.previous2_hash,
            pass_count: self.pass_count,
            capture_pos: std::mem::take(&mut self.capture_pos[color.index()]),
        }
    }

    fn apply_pass(&mut self, color: Color) {
        let before = self.positional_hash;
        let undo = self.push_undo(color);
        self.undo.push(undo);
        self.finish_move(color, PASS, before);
        self.pass_count += 1;
        self.updated_strings.clear();
    }

    fn apply_stone(&mut self, color: Color, pt: Point) -> CaptureInfo {
        let before = self.positional_hash;
        let mut undo = self.push_undo(color);
        let opponent = color.opponent();
        let birth = self.record.len() as u32 + 1;

        self.updated_strings.clear();
        let id = self.put_stone(color, pt, birth);
        self.updated_strings.push(id);

        // Enemy strings around the stone lost a liberty; take the dead ones.
        let mut captured = 0;
        for n in neighbors(pt) {
            let Some(enemy) = self.strings.id_at(n) else {
                continue;
            };
            if self.strings.get(enemy).color() != opponent {
                continue;
            }
            if self.strings.get(enemy).lib_count() > 0 {
                if !self.updated_strings.contains(&enemy) {
                    self.updated_strings.push(enemy);
                }
                continue;
            }
            let members: Vec<Point> = self.strings.members(enemy).collect();
            for &m in &members {
                undo.captured.push((m, self.birth_move[m]));
                self.lift_stone(opponent, m);
            }
            for &other in self.strings.get(enemy).neighbors() {
                if !self.updated_strings.contains(&other) {
                    self.updated_strings.push(other);
                }
            }
            self.strings.remove(&self.board, enemy);
            self.capture_pos[color.index()].extend_from_slice(&members);
            captured += members.len();
        }
        self.prisoners[color.index()] += captured;
        self.updated_strings.retain(|&s| self.strings.get(s).is_live());

        for m in self.strings.members(id) {
            if m != pt {
                undo.births.push((m, self.birth_move[m]));
            }
        }
        self.undo.push(undo);

        let placed = self.strings.get(id);
        let ko = if captured == 1 && placed.size() == 1 && placed.lib_count() == 1 {
            Some(placed.libs()[0])
        } else {
            None
        };

        self.finish_move(color, pt, before);
        if let Some(ko_pt) = ko {
            self.ko_pos = ko_pt;
            self.ko_move = self.record.len();
            self.ko_color = opponent;
            self.current_hash ^= keys().ko(ko_pt);
        }
        self.pass_count = 0;
        CaptureInfo { captured, ko }
    }

    /// Roll the hashes, record the move and hand the turn over.
    ///
    /// `before` is the positional hash of the position the move was played in.
    fn finish_move(&mut self, color: Color, pt: Point, before: u64) {
        let next = color.opponent();
        self.positional_hash ^= side_key(self.current_color) ^ side_key(next);
        self.current_color = next;
        self.previous2_hash = self.previous1_hash;
        self.previous1_hash = before;
        self.record.push(MoveRecord {
            color,
            point: pt,
            hash: self.positional_hash,
        });
        // Any earlier ko has expired now that the move count advanced.
        self.current_hash = self.positional_hash;
    }

    /// Take back the most recent move. Returns it, or `None` at the start.
    pub fn undo_last_move(&mut self) -> Option<MoveRecord> {
        let rec = self.record.pop()?;
        let undo = self.undo.pop()?;
        let color = rec.color;

        if rec.point != PASS {
            if let Some(id) = self.strings.id_at(rec.point) {
                let members: Vec<Point> = self.strings.members(id).collect();
                for &m in &members {
                    self.lift_stone(color, m);
                }
                self.strings.remove(&self.board, id);
                for &(m, birth) in &undo.births {
                    self.put_stone(color, m, birth);
                }
            }
            let opponent = color.opponent();
            for &(m, birth) in &undo.captured {
                self.put_stone(opponent, m, birth);
            }
            self.prisoners[color.index()] -= undo.captured.len();
        }

        self.positional_hash ^= side_key(self.current_color) ^ side_key(undo.to_move);
        self.current_color = undo.to_move;
        self.ko_pos = undo.ko_pos;
        self.ko_move = undo.ko_move;
        self.ko_color = undo.ko_color;
        self.current_hash = undo.current_hash;
        self.previous1_hash = undo.previous1_hash;
        self.previous2_hash = undo.previous2_hash;
        self.pass_count = undo.pass_count;
        self.capture_pos[color.index()] = undo.capture_pos;
        self.updated_strings.clear();
        debug_assert_eq!(
            self.current_hash,
            self.positional_hash ^ if self.ko_active() { keys().ko(self.ko_pos) } else { 0 }
        );
        Some(rec)
    }

    fn put_stone(&mut self, color: Color, pt: Point, birth: u32) -> StringId {
        let stone = Stone::from(color);
        let key = keys().stone(color, pt);
        self.board[pt] = stone;
        self.positional_hash ^= key;
        self.current_hash ^= key;
        self.birth_move[pt] = birth;
        self.candidates[pt] = false;
        patterns::update(&mut self.patterns, pt, stone);
        self.strings.place(&self.board, pt, color)
    }

    /// Clear `pt` on the board. The caller updates the string table.
    fn lift_stone(&mut self, color: Color, pt: Point) {
        let key = keys().stone(color, pt);
        self.board[pt] = Stone::Empty;
        self.positional_hash ^= key;
        self.current_hash ^= key;
        self.birth_move[pt] = 0;
        self.candidates[pt] = true;
        patterns::update(&mut self.patterns, pt, Stone::Empty);
    }

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------

    /// Check every cached structure against a recomputation from the board.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.strings.validate(&self.board)?;
        let k = keys();
        let mut hash = side_key(self.current_color);
        for pt in onboard_points() {
            if let Some(c) = self.board[pt].color() {
                hash ^= k.stone(c, pt);
            }
            if self.patterns[pt] != patterns::compute(&self.board, pt) {
                return Err(format!("stale pattern at {}", str_coord(pt)));
            }
            if self.candidates[pt] != (self.board[pt] == Stone::Empty) {
                return Err(format!("stale candidate flag at {}", str_coord(pt)));
            }
            let birth = self.birth_move[pt] as usize;
            if self.board[pt].is_stone() != (birth > 0) || birth > self.record.len() {
                return Err(format!("bad birth move {birth} at {}", str_coord(pt)));
            }
        }
        if hash != self.positional_hash {
            return Err("positional hash disagrees with the board".into());
        }
        let ko = if self.ko_active() { k.ko(self.ko_pos) } else { 0 };
        if self.current_hash != self.positional_hash ^ ko {
            return Err("current hash disagrees with the ko state".into());
        }
        let n = self.record.len();
        let expected = |back: usize| match n.checked_sub(back) {
            Some(0) => self.initial_hash,
            Some(i) => self.record[i - 1].hash,
            None => 0,
        };
        if self.previous1_hash != expected(1) || self.previous2_hash != expected(2) {
            return Err("previous hashes disagree with the record".into());
        }
        let live: usize = self.strings.live().map(|(_, s)| s.size()).sum();
        if live != self.stone_count() {
            return Err(format!("{live} stones in strings, {} on the board", self.stone_count()));
        }
        Ok(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.last_move().map(|r| r.point).unwrap_or(PASS);
        writeln!(
            f,
            "Move: {:<3} Black: {} caps  White: {} caps  To move: {}",
            self.moves(),
            self.prisoners(Color::Black),
            self.prisoners(Color::White),
            self.current_color
        )?;
        for y in BOARD_START..=BOARD_END {
            write!(f, " {:>2}", BOARD_END - y + 1)?;
            for x in BOARD_START..=BOARD_END {
                let pt = pos(x, y);
                let c = match self.board[pt] {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    _ if self.ko_point() == Some(pt) => '#',
                    _ => '.',
                };
                if pt == last {
                    write!(f, "({c}")?;
                } else if x > BOARD_START && pos(x - 1, y) == last {
                    write!(f, "){c}")?;
                } else {
                    write!(f, " {c}")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "    ")?;
        for x in BOARD_START..=BOARD_END {
            let col = str_coord(pos(x, BOARD_END));
            write!(f, " {}", &col[..1])?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;

    fn pt(s: &str) -> Point {
        parse_coord(s).unwrap()
    }

    fn play(p: &mut Position, moves: &[&str]) {
        for m in moves {
            let color = p.to_move();
            p.apply_move(color, pt(m)).unwrap();
        }
    }

    #[test]
    fn test_new_position_is_empty() {
        let p = Position::new();
        assert_eq!(p.stone_count(), 0);
        assert_eq!(p.to_move(), Color::Black);
        assert_eq!(p.current_hash(), 0);
        p.validate().unwrap();
    }

    #[test]
    fn test_occupied() {
        let mut p = Position::new();
        play(&mut p, &["E5"]);
        assert_eq!(p.apply_move(Color::White, pt("E5")), Err(IllegalMove::OccupiedPoint));
    }

    #[test]
    fn test_out_of_board() {
        let p = Position::new();
        assert_eq!(p.check_move(Color::Black, 1), Err(IllegalMove::OutOfBoard));
        assert_eq!(p.check_move(Color::Black, BOARD_MAX + 3), Err(IllegalMove::OutOfBoard));
    }

    #[test]
    fn test_capture_in_corner() {
        let mut p = Position::new();
        play(&mut p, &["A1", "B1", "E5", "A2"]);
        assert_eq!(p.stone(pt("A1")), Stone::Empty);
        assert_eq!(p.prisoners(Color::White), 1);
        assert_eq!(p.last_captures(Color::White), &[pt("A1")]);
        p.validate().unwrap();
    }

    #[test]
    fn test_suicide_rejected_without_mutation() {
        let mut p = Position::new();
        play(&mut p, &["B1", "E5", "A2", "E6"]);
        let before = p.current_hash();
        assert_eq!(p.apply_move(Color::White, pt("A1")), Err(IllegalMove::Suicide));
        assert_eq!(p.current_hash(), before);
        assert_eq!(p.moves(), 4);
        p.validate().unwrap();
    }

    /// Black captures a single white stone at E5 by playing F5.
    fn ko_position() -> Position {
        let mut p = Position::new();
        play(&mut p, &["D5", "F6", "E6", "F4", "E4", "G5", "A1", "E5", "F5"]);
        p
    }

    #[test]
    fn test_ko_and_expiry() {
        let mut p = ko_position();
        assert_eq!(p.prisoners(Color::Black), 1);
        assert_eq!(p.ko_point(), Some(pt("E5")));
        assert_eq!(p.apply_move(Color::White, pt("E5")), Err(IllegalMove::KoViolation));
        p.validate().unwrap();

        play(&mut p, &["J9", "A9"]);
        assert_eq!(p.ko_point(), None);
        let info = p.apply_move(Color::White, pt("E5")).unwrap();
        assert_eq!(info.captured, 1);
        assert_eq!(info.ko, Some(pt("F5")));
        p.validate().unwrap();
    }

    #[test]
    fn test_superko_after_passes() {
        let mut p = ko_position();
        p.apply_move(Color::White, PASS).unwrap();
        p.apply_move(Color::Black, PASS).unwrap();
        assert!(p.is_game_over());
        assert_eq!(
            p.apply_move(Color::White, pt("E5")),
            Err(IllegalMove::SuperkoRepetition)
        );
        p.rollout = true;
        assert!(p.is_legal(Color::White, pt("E5")));
    }

    #[test]
    fn test_undo_restores_everything() {
        let mut p = Position::new();
        let mut snapshots = vec![(p.current_hash(), *p.board(), p.prisoners(Color::Black))];
        for m in ["D5", "F6", "E6", "F4", "E4", "G5", "A1", "E5", "F5", "pass", "B1"] {
            let color = p.to_move();
            p.apply_move(color, parse_coord(m).unwrap()).unwrap();
            p.validate().unwrap();
            snapshots.push((p.current_hash(), *p.board(), p.prisoners(Color::Black)));
        }
        snapshots.pop();
        while let Some(expected) = snapshots.pop() {
            p.undo_last_move().unwrap();
            p.validate().unwrap();
            assert_eq!((p.current_hash(), *p.board(), p.prisoners(Color::Black)), expected);
        }
        assert_eq!(p.moves(), 0);
        assert!(p.undo_last_move().is_none());
    }

    #[test]
    fn test_undo_out_of_turn_move_restores_side_to_move() {
        let mut p = Position::new();
        play(&mut p, &["E5"]);
        let (hash, positional) = (p.current_hash(), p.positional_hash());
        // Black plays twice in a row, as ladder reading does.
        p.apply_move(Color::Black, pt("C3")).unwrap();
        assert_eq!(p.to_move(), Color::White);
        p.validate().unwrap();
        p.undo_last_move().unwrap();
        assert_eq!(p.to_move(), Color::White);
        assert_eq!(p.current_hash(), hash);
        assert_eq!(p.positional_hash(), positional);
        p.validate().unwrap();

        p.apply_move(Color::White, PASS).unwrap();
        p.apply_move(Color::White, pt("D4")).unwrap();
        p.undo_last_move().unwrap();
        p.undo_last_move().unwrap();
        assert_eq!(p.to_move(), Color::White);
        assert_eq!(p.positional_hash(), positional);
        p.validate().unwrap();
    }

    #[test]
    fn test_previous_hashes_roll_with_moves() {
        let mut p = Position::new();
        let empty = p.positional_hash();
        play(&mut p, &["E5"]);
        let after_e5 = p.positional_hash();
        assert_eq!(p.previous1_hash(), empty);
        play(&mut p, &["D5"]);
        assert_eq!(p.previous1_hash(), after_e5);
        assert_eq!(p.previous2_hash(), empty);
        assert_eq!(p.record()[0].hash, after_e5);
        p.undo_last_move().unwrap();
        assert_eq!(p.previous1_hash(), empty);
        p.validate().unwrap();
    }

    #[test]
    fn test_self_atari() {
        let mut p = Position::new();
        play(&mut p, &["E5", "B1"]);
        // A1 next to the white stone keeps only A2.
        assert!(p.is_self_atari(Color::Black, pt("A1")));
        assert!(!p.is_self_atari(Color::Black, pt("D4")));
        assert_eq!(p.libs_after_move(Color::Black, pt("C1"), 8), 2);
        assert_eq!(p.libs_after_move(Color::Black, pt("E4"), 8), 6);
    }

    /// A black stone at B2 and white stones around it share the liberties
    /// A2 and B1 inside a black wall.
    fn seki_position(with_a1: bool) -> Position {
        let mut p = Position::new();
        for m in ["A4", "B4", "C4", "D4", "D3", "D2", "D1", "B2"] {
            p.apply_move(Color::Black, pt(m)).unwrap();
        }
        for m in ["A3", "B3", "C3", "C2", "C1"] {
            p.apply_move(Color::White, pt(m)).unwrap();
        }
        if with_a1 {
            p.apply_move(Color::White, pt("A1")).unwrap();
        }
        p.validate().unwrap();
        p
    }

    #[test]
    fn test_seki_shared_liberties() {
        let p = seki_position(true);
        assert!(p.is_seki(pt("A2")));
        assert!(p.is_seki(pt("B1")));
        assert!(!p.is_seki(pt("E1")));
        assert!(!p.is_seki(pt("B2")));
        for color in [Color::Black, Color::White] {
            assert!(p.is_self_atari(color, pt("A2")));
            assert!(p.is_legal(color, pt("B1")));
        }
    }

    #[test]
    fn test_no_seki_when_the_inside_stone_can_extend() {
        // Without White A1, Black B2 extends to A2 keeping A1 and B1.
        let p = seki_position(false);
        assert!(!p.is_self_atari(Color::Black, pt("A2")));
        assert!(!p.is_seki(pt("A2")));
        assert!(!p.is_seki(pt("B1")));
    }

    #[test]
    fn test_eyeish_and_true_eye() {
        let mut p = Position::new();
        play(&mut p, &["B1", "E5", "A2", "E6", "B2"]);
        assert_eq!(p.is_eyeish(pt("A1")), Some(Color::Black));
        assert!(p.is_true_eye(pt("A1"), Color::Black));
        assert!(!p.is_true_eye(pt("A1"), Color::White));
        assert_eq!(p.is_eyeish(pt("C3")), None);
    }
}
