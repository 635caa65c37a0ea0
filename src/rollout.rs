//! Rollout feature engine and playouts.
//!
//! Each candidate point carries a logit for each colour:
//!
//! - the pattern table's weight for the point's (mover-relative) 12-point code,
//! - a penalty when the move is a self-atari.
//!
//! Shared liberties of a seki get no weight for either colour.
//!
//! These "base" logits only change when a point's neighbourhood or the
//! liberties of an adjacent string change, so they are updated incrementally
//! after every move. On top of them the engine adds transient features that
//! depend on the last move: captures, atari escapes, ataris, nakade vital
//! points and the distance to the last move.
//!
//! Moves are sampled with probability proportional to `gamma = exp(logit)`.
//! Gammas are summed per board row and globally, so picking a point walks
//! the row sums first and then a single row.

use fastrand::Rng;
use log::debug;

use crate::board::{self, Color, Point, Stone, move_distance, neighbors, onboard_points, x_of, y_of};
use crate::constants::{BOARD_END, BOARD_MAX, BOARD_SIZE, BOARD_START, MAX_MOVES, PASS};
use crate::nakade;
use crate::patterns::{self, PatternTable, mover_relative};
use crate::position::Position;
use crate::scoring::{ScoreBreakdown, score_position};

/// Total gamma below which a colour has no weighted move left.
const GAMMA_EPSILON: f64 = 1e-12;

/// Feature weights, in logit units.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutWeights {
    /// Added when the move leaves its own string in atari without capturing.
    pub self_atari: f64,
    /// Capturing a string next to the last move.
    pub capture: f64,
    /// Extending a string the last move put in atari.
    pub save_extension: f64,
    /// Capturing a neighbour of a string in atari.
    pub save_capture: f64,
    /// Putting a string next to the last move in atari.
    pub atari: f64,
    /// Vital point of a small eye space.
    pub nakade: f64,
    /// Distance 2, 3 and 4 from the last move.
    pub distance: [f64; 3],
}

impl Default for RolloutWeights {
    fn default() -> Self {
        Self {
            self_atari: -4.0,
            capture: 3.0,
            save_extension: 2.5,
            save_capture: 2.8,
            atari: 1.0,
            nakade: 2.0,
            distance: [1.2, 0.8, 0.4],
        }
    }
}

/// How a playout ended.
#[derive(Clone)]
pub enum PlayoutOutcome {
    /// Two consecutive passes; the final position's score.
    Finished(ScoreBreakdown),
    /// The ply ceiling was reached. Scored as a draw.
    PlyCeiling,
}

impl PlayoutOutcome {
    pub fn winner(&self) -> Option<Color> {
        match self {
            PlayoutOutcome::Finished(score) => score.winner(),
            PlayoutOutcome::PlyCeiling => None,
        }
    }

    /// 1 for a win of `color`, 0 for a loss, 0.5 for a draw.
    pub fn value_for(&self, color: Color) -> f64 {
        match self.winner() {
            Some(c) if c == color => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        }
    }
}

/// Base logit of `color` playing `pt`, or `None` when the point is not a candidate.
fn base_logit(
    pos: &Position,
    color: Color,
    pt: Point,
    weights: &RolloutWeights,
    table: &dyn PatternTable,
) -> Option<f64> {
    if !pos.is_candidate(pt) || pos.is_true_eye(pt, color) {
        return None;
    }
    let mut logit = table.weight(mover_relative(pos.pattern(pt), color));
    if pos.is_self_atari(color, pt) {
        logit += weights.self_atari;
    }
    Some(logit)
}

fn add_bonus(bonus: &mut Vec<(Point, f64)>, pt: Point, w: f64) {
    match bonus.iter_mut().find(|(p, _)| *p == pt) {
        Some((_, b)) => *b += w,
        None => bonus.push((pt, w)),
    }
}

/// Features of `color`'s next move that depend on the opponent's last move.
fn transient_bonuses(pos: &Position, color: Color, weights: &RolloutWeights, bonus: &mut Vec<(Point, f64)>) {
    bonus.clear();
    let Some(last) = pos.last_move().map(|r| r.point).filter(|&pt| pt != PASS) else {
        return;
    };

    // Strings touching the last move, and the last move's own string.
    let mut ids = Vec::with_capacity(5);
    for n in std::iter::once(last).chain(neighbors(last)) {
        if let Some(id) = pos.strings().id_at(n) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    for &id in &ids {
        let s = pos.strings().get(id);
        if s.color() == color {
            if s.lib_count() != 1 {
                continue;
            }
            let lib = s.libs()[0];
            if pos.libs_after_move(color, lib, 2) >= 2 {
                add_bonus(bonus, lib, weights.save_extension);
            }
            for &enemy in s.neighbors() {
                let e = pos.strings().get(enemy);
                if e.lib_count() == 1 {
                    add_bonus(bonus, e.libs()[0], weights.save_capture);
                }
            }
        } else {
            match s.lib_count() {
                1 => add_bonus(bonus, s.libs()[0], weights.capture),
                2 => {
                    for &lib in s.libs() {
                        add_bonus(bonus, lib, weights.atari);
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(vital) = nakade::after_capture(pos) {
        add_bonus(bonus, vital, weights.nakade);
    }
    for n in neighbors(last) {
        if let Some(vital) = nakade::nakade_at(pos, n) {
            if !bonus.iter().any(|&(p, _)| p == vital) {
                add_bonus(bonus, vital, weights.nakade);
            }
        }
    }

    let (lx, ly) = (x_of(last), y_of(last));
    for y in ly.saturating_sub(2)..=ly + 2 {
        for x in lx.saturating_sub(2)..=lx + 2 {
            let pt = board::pos(x, y);
            if pt >= BOARD_MAX || pos.stone(pt) != Stone::Empty {
                continue;
            }
            let d = move_distance(last, pt);
            if (2..=4).contains(&d) {
                add_bonus(bonus, pt, weights.distance[d - 2]);
            }
        }
    }
}

/// Logits of every legal move of `color` (pass excluded), with all features.
///
/// Used for tree priors. Own true eyes are excluded.
pub fn move_logits(
    pos: &Position,
    color: Color,
    weights: &RolloutWeights,
    table: &dyn PatternTable,
) -> Vec<(Point, f64)> {
    let mut bonus = Vec::new();
    transient_bonuses(pos, color, weights, &mut bonus);
    onboard_points()
        .filter_map(|pt| {
            let logit = base_logit(pos, color, pt, weights, table)?;
            if !pos.is_legal(color, pt) {
                return None;
            }
            let extra = bonus.iter().find(|&&(p, _)| p == pt).map_or(0.0, |&(_, b)| b);
            Some((pt, logit + extra))
        })
        .collect()
}

/// Worker-local playout engine.
pub struct Rollout<'a> {
    weights: &'a RolloutWeights,
    table: &'a dyn PatternTable,
    logit: [[f64; BOARD_MAX]; 2],
    gamma: [[f64; BOARD_MAX]; 2],
    row_sum: [[f64; BOARD_SIZE]; 2],
    total: [f64; 2],
    dirty: [[bool; BOARD_SIZE]; 2],
    /// Points whose gamma differs from `exp(logit)` for the colour to move.
    touched: Vec<Point>,
    bonus: Vec<(Point, f64)>,
    affected: Vec<Point>,
}

impl<'a> Rollout<'a> {
    pub fn new(weights: &'a RolloutWeights, table: &'a dyn PatternTable) -> Self {
        Self {
            weights,
            table,
            logit: [[f64::NEG_INFINITY; BOARD_MAX]; 2],
            gamma: [[0.0; BOARD_MAX]; 2],
            row_sum: [[0.0; BOARD_SIZE]; 2],
            total: [0.0; 2],
            dirty: [[false; BOARD_SIZE]; 2],
            touched: Vec::new(),
            bonus: Vec::new(),
            affected: Vec::new(),
        }
    }

    /// Current sampling weight of `pt` for `color`.
    pub fn gamma(&self, color: Color, pt: Point) -> f64 {
        self.gamma[color.index()][pt]
    }

    /// Sum of all gammas of `color`.
    pub fn total(&self, color: Color) -> f64 {
        self.total[color.index()]
    }

    /// Compute every gamma of `pos` from scratch.
    pub fn reset(&mut self, pos: &Position) {
        self.logit = [[f64::NEG_INFINITY; BOARD_MAX]; 2];
        self.gamma = [[0.0; BOARD_MAX]; 2];
        self.row_sum = [[0.0; BOARD_SIZE]; 2];
        self.dirty = [[true; BOARD_SIZE]; 2];
        self.touched.clear();
        for color in [Color::Black, Color::White] {
            for pt in onboard_points() {
                self.recompute(pos, color, pt);
            }
        }
        self.resum();
    }

    fn set_gamma(&mut self, c: usize, pt: Point, gamma: f64) {
        if self.gamma[c][pt] != gamma {
            self.gamma[c][pt] = gamma;
            self.dirty[c][y_of(pt)] = true;
        }
    }

    /// Shared seki liberties are never filled in a playout.
    fn recompute(&mut self, pos: &Position, color: Color, pt: Point) {
        let c = color.index();
        let logit = if pos.is_seki(pt) {
            f64::NEG_INFINITY
        } else {
            base_logit(pos, color, pt, self.weights, self.table).unwrap_or(f64::NEG_INFINITY)
        };
        self.logit[c][pt] = logit;
        self.set_gamma(c, pt, logit.exp());
    }

    /// Re-sum the rows whose gammas changed.
    fn resum(&mut self) {
        for c in 0..2 {
            for y in BOARD_START..=BOARD_END {
                if !self.dirty[c][y] {
                    continue;
                }
                self.dirty[c][y] = false;
                self.row_sum[c][y] = (BOARD_START..=BOARD_END).map(|x| self.gamma[c][board::pos(x, y)]).sum();
            }
            self.total[c] = self.row_sum[c].iter().sum();
        }
    }

    /// Add the last-move features to `color`'s gammas.
    fn apply_transient(&mut self, pos: &Position, color: Color) {
        let c = color.index();
        let mut bonus = std::mem::take(&mut self.bonus);
        transient_bonuses(pos, color, self.weights, &mut bonus);
        for &(pt, b) in &bonus {
            let logit = self.logit[c][pt];
            if logit.is_finite() {
                self.set_gamma(c, pt, (logit + b).exp());
                self.touched.push(pt);
            }
        }
        self.bonus = bonus;
        self.resum();
    }

    /// Restore `color`'s touched gammas to their base values.
    fn revert_transient(&mut self, color: Color) {
        let c = color.index();
        for i in 0..self.touched.len() {
            let pt = self.touched[i];
            self.set_gamma(c, pt, self.logit[c][pt].exp());
        }
        self.touched.clear();
    }

    /// Refresh the base logits around the last move.
    fn update(&mut self, pos: &Position) {
        let Some(last) = pos.last_move().copied() else {
            return;
        };
        self.affected.clear();
        if last.point != PASS {
            self.affected.push(last.point);
            self.affected.extend(patterns::affected_points(last.point));
            for &q in pos.last_captures(last.color) {
                self.affected.push(q);
                self.affected.extend(patterns::affected_points(q));
            }
            for &id in pos.updated_strings() {
                self.affected.extend_from_slice(pos.strings().get(id).libs());
            }
        }
        let affected = std::mem::take(&mut self.affected);
        for &pt in &affected {
            if pt < BOARD_MAX {
                self.recompute(pos, Color::Black, pt);
                self.recompute(pos, Color::White, pt);
            }
        }
        self.affected = affected;
        self.resum();
    }

    /// Walk the row sums to the point holding cumulative weight `r`.
    fn pick(&self, c: usize, mut r: f64) -> Option<Point> {
        for y in BOARD_START..=BOARD_END {
            let row = self.row_sum[c][y];
            if row <= 0.0 {
                continue;
            }
            if r >= row {
                r -= row;
                continue;
            }
            let mut last = None;
            for x in BOARD_START..=BOARD_END {
                let pt = board::pos(x, y);
                let g = self.gamma[c][pt];
                if g <= 0.0 {
                    continue;
                }
                if r < g {
                    return Some(pt);
                }
                r -= g;
                last = Some(pt);
            }
            return last;
        }
        None
    }

    /// Sample a legal move of `color`; pass when nothing is left.
    pub fn choose_move(&mut self, pos: &Position, color: Color, rng: &mut Rng) -> Point {
        let c = color.index();
        while self.total[c] > GAMMA_EPSILON {
            let Some(pt) = self.pick(c, rng.f64() * self.total[c]) else {
                break;
            };
            if pos.is_legal(color, pt) {
                return pt;
            }
            // Zeroed until the next move.
            self.set_gamma(c, pt, 0.0);
            self.touched.push(pt);
            self.resum();
        }
        self.uniform_move(pos, color, rng)
    }

    fn uniform_move(&self, pos: &Position, color: Color, rng: &mut Rng) -> Point {
        let legal: Vec<Point> = onboard_points()
            .filter(|&pt| {
                pos.is_candidate(pt)
                    && !pos.is_true_eye(pt, color)
                    && !pos.is_seki(pt)
                    && pos.is_legal(color, pt)
            })
            .collect();
        if legal.is_empty() {
            return PASS;
        }
        debug!("rollout: uniform fallback over {} points", legal.len());
        legal[rng.usize(..legal.len())]
    }

    /// Play `pos` out to the end of the game.
    ///
    /// The superko scan is switched off on `pos` for the duration.
    pub fn playout(&mut self, pos: &mut Position, rng: &mut Rng, komi: f64) -> PlayoutOutcome {
        pos.rollout = true;
        self.reset(pos);
        loop {
            if pos.is_game_over() {
                return PlayoutOutcome::Finished(score_position(pos, komi));
            }
            if pos.moves() >= MAX_MOVES {
                debug!("rollout: ply ceiling reached at move {}", pos.moves());
                return PlayoutOutcome::PlyCeiling;
            }
            let color = pos.to_move();
            self.apply_transient(pos, color);
            let pt = self.choose_move(pos, color, rng);
            if pos.apply_move(color, pt).is_err() && pos.apply_move(color, PASS).is_err() {
                return PlayoutOutcome::PlyCeiling;
            }
            self.revert_transient(color);
            self.update(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;
    use crate::constants::KOMI;
    use crate::patterns::{NoPatterns, Pat3Shapes};

    fn pt(s: &str) -> Point {
        parse_coord(s).unwrap()
    }

    #[test]
    fn test_incremental_gammas_match_recompute() {
        let weights = RolloutWeights::default();
        let table = Pat3Shapes::shared();
        let mut rollout = Rollout::new(&weights, table);
        let mut p = Position::new();
        rollout.reset(&p);
        for m in ["E5", "E6", "D6", "F5", "D5", "E4", "F6", "D4", "E7"] {
            let color = p.to_move();
            p.apply_move(color, pt(m)).unwrap();
            rollout.update(&p);
        }
        let mut fresh = Rollout::new(&weights, table);
        fresh.reset(&p);
        for color in [Color::Black, Color::White] {
            for q in onboard_points() {
                assert!((rollout.gamma(color, q) - fresh.gamma(color, q)).abs() < 1e-9);
            }
            assert!((rollout.total(color) - fresh.total(color)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_occupied_and_eyes_have_no_weight() {
        let weights = RolloutWeights::default();
        let mut rollout = Rollout::new(&weights, &NoPatterns);
        let mut p = Position::new();
        for (c, m) in [(Color::Black, "B1"), (Color::Black, "A2"), (Color::Black, "B2")] {
            p.apply_move(c, pt(m)).unwrap();
        }
        rollout.reset(&p);
        assert_eq!(rollout.gamma(Color::Black, pt("B1")), 0.0);
        assert_eq!(rollout.gamma(Color::Black, pt("A1")), 0.0);
        assert!(rollout.gamma(Color::White, pt("E5")) > 0.0);
    }

    #[test]
    fn test_seki_liberties_are_not_filled() {
        let weights = RolloutWeights::default();
        let mut rollout = Rollout::new(&weights, &NoPatterns);
        let mut p = Position::new();
        for m in ["A4", "B4", "C4", "D4", "D3", "D2", "D1", "B2"] {
            p.apply_move(Color::Black, pt(m)).unwrap();
        }
        for m in ["A3", "B3", "C3", "C2", "C1"] {
            p.apply_move(Color::White, pt(m)).unwrap();
        }
        rollout.reset(&p);
        // Black can still extend to A2 here.
        assert!(rollout.gamma(Color::Black, pt("A2")) > 0.0);

        p.apply_move(Color::White, pt("A1")).unwrap();
        rollout.update(&p);
        for color in [Color::Black, Color::White] {
            for q in ["A2", "B1"] {
                assert_eq!(rollout.gamma(color, pt(q)), 0.0);
            }
            assert!(rollout.gamma(color, pt("E5")) > 0.0);
        }

        // The uniform fallback skips them as well.
        p.rollout = true;
        let mut rng = Rng::with_seed(1);
        for _ in 0..20 {
            let m = rollout.uniform_move(&p, Color::Black, &mut rng);
            assert!(m != pt("A2") && m != pt("B1"));
        }
    }

    #[test]
    fn test_capture_feature() {
        let weights = RolloutWeights::default();
        let mut p = Position::new();
        // White's last move E6 walks into atari; E5 captures it.
        for m in ["D6", "A1", "F6", "A2", "E7", "E6"] {
            let color = p.to_move();
            p.apply_move(color, pt(m)).unwrap();
        }
        let logits = move_logits(&p, Color::Black, &weights, &NoPatterns);
        let at = |q: &str| logits.iter().find(|(x, _)| *x == pt(q)).map(|&(_, l)| l);
        assert!(at("E6").is_none());
        assert_eq!(at("J9"), Some(0.0));
        assert!(at("E5").unwrap() > weights.capture);
    }

    #[test]
    fn test_choose_move_is_legal() {
        let weights = RolloutWeights::default();
        let mut rollout = Rollout::new(&weights, Pat3Shapes::shared());
        let mut p = Position::new();
        p.rollout = true;
        rollout.reset(&p);
        let mut rng = Rng::with_seed(7);
        for _ in 0..30 {
            let color = p.to_move();
            rollout.apply_transient(&p, color);
            let m = rollout.choose_move(&p, color, &mut rng);
            p.apply_move(color, m).unwrap();
            rollout.revert_transient(color);
            rollout.update(&p);
        }
        p.validate().unwrap();
    }

    #[test]
    fn test_playout_terminates() {
        let weights = RolloutWeights::default();
        let mut rollout = Rollout::new(&weights, Pat3Shapes::shared());
        let mut rng = Rng::with_seed(42);
        for _ in 0..5 {
            let mut p = Position::new();
            let outcome = rollout.playout(&mut p, &mut rng, KOMI);
            assert!(p.moves() <= MAX_MOVES);
            if let PlayoutOutcome::Finished(score) = &outcome {
                assert!(p.is_game_over());
                assert_eq!(score.winner(), outcome.winner());
            }
            let v = outcome.value_for(Color::Black) + outcome.value_for(Color::White);
            assert_eq!(v, 1.0);
            p.validate().unwrap();
        }
    }
}
