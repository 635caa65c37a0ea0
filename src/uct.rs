//! UCT search tree.
//!
//! Nodes live in a fixed arena of `OnceLock<Node>` slots. A slot index is
//! claimed through the [`NodeHashTable`], keyed by (hash, colour to move,
//! move number), so a position reached by two paths shares one node and
//! exactly one worker builds it.
//!
//! Statistics are plain atomics. Wins are fixed point (`WIN_UNIT` per win)
//! so draws and mixed evaluator values back up without loss.
//!
//! Child selection maximises
//!
//! ```text
//! n      = visits + virtual_loss
//! q      = wins / n                      (FPU when n = 0)
//! ucb    = q + C * sqrt(ln(N) / n)
//!            + B * prior * sqrt(E / (E + n))
//!            + K * criticality           (root only)
//! ```
//!
//! over the children admitted by progressive widening. Ties go to the lower
//! child index, and children are ordered by descending prior.

use std::hint;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::thread;

use log::debug;

use crate::board::{Color, Point};
use crate::constants::{
    BONUS_EQUIVALENCE, BONUS_WEIGHT, BOARD_MAX, CRITICALITY_WEIGHT, EXPAND_THRESHOLD,
    EXPLORATION_CONSTANT, FPU, INITIAL_WIDTH, LADDER_PRIOR_FACTOR, PASS, PROGRESSIVE_WIDENING,
    PW_BASE, WIN_UNIT,
};
use crate::ladder::ladder_extensions;
use crate::patterns::PatternTable;
use crate::position::Position;
use crate::rollout::{RolloutWeights, move_logits};
use crate::scoring::ScoreBreakdown;
use crate::zobrist::{Lookup, NodeHashTable};

/// Child index of a child that has no node.
pub const NOT_EXPANDED: usize = usize::MAX;

/// Child index while one worker is creating the node.
const EXPANDING: usize = usize::MAX - 1;

/// Tunable selection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UctParams {
    pub fpu: f64,
    pub exploration: f64,
    pub bonus_weight: f64,
    pub bonus_equivalence: f64,
    pub pw_base: f64,
    pub progressive_widening: f64,
    pub initial_width: usize,
    pub criticality_weight: f64,
    /// Child visits required before a node is created for it.
    pub expand_threshold: u32,
}

impl Default for UctParams {
    fn default() -> Self {
        Self {
            fpu: FPU,
            exploration: EXPLORATION_CONSTANT,
            bonus_weight: BONUS_WEIGHT,
            bonus_equivalence: BONUS_EQUIVALENCE,
            pw_base: PW_BASE,
            progressive_widening: PROGRESSIVE_WIDENING,
            initial_width: INITIAL_WIDTH,
            criticality_weight: CRITICALITY_WEIGHT,
            expand_threshold: EXPAND_THRESHOLD,
        }
    }
}

/// Number of children eligible at a node with `visits` visits.
///
/// A power law: `initial_width + floor((visits / pw_base)^(1 / progressive_widening))`,
/// so the first extra child arrives at `pw_base` visits. Never exceeds
/// `n_children`.
pub fn widening_width(params: &UctParams, visits: u32, n_children: usize) -> usize {
    let grown = (f64::from(visits) / params.pw_base)
        .powf(params.progressive_widening.recip())
        .floor() as usize;
    params.initial_width.max(1).saturating_add(grown).min(n_children)
}

#[inline]
fn to_units(value: f64) -> u64 {
    (value.clamp(0.0, 1.0) * WIN_UNIT as f64).round() as u64
}

/// An edge of the tree: one candidate move of its parent.
#[derive(Debug)]
pub struct Child {
    pub pos: Point,
    pub prior: f64,
    /// Eligible regardless of the parent's width.
    pub open: bool,
    /// The move extends a string caught in a ladder.
    pub ladder: bool,
    visits: AtomicU32,
    win: AtomicU64,
    virtual_loss: AtomicU32,
    index: AtomicUsize,
}

impl Child {
    fn new(pos: Point, prior: f64, open: bool, ladder: bool) -> Self {
        Self {
            pos,
            prior,
            open,
            ladder,
            visits: AtomicU32::new(0),
            win: AtomicU64::new(0),
            virtual_loss: AtomicU32::new(0),
            index: AtomicUsize::new(NOT_EXPANDED),
        }
    }

    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    pub fn virtual_loss(&self) -> u32 {
        self.virtual_loss.load(Ordering::Relaxed)
    }

    /// Mean result for the player making this move.
    pub fn win_rate(&self) -> f64 {
        let visits = self.visits();
        if visits == 0 {
            return 0.0;
        }
        self.win.load(Ordering::Relaxed) as f64 / WIN_UNIT as f64 / f64::from(visits)
    }

    /// Arena index of the child's node, if it was created.
    pub fn node_index(&self) -> Option<usize> {
        let idx = self.index.load(Ordering::Acquire);
        (idx != NOT_EXPANDED && idx != EXPANDING).then_some(idx)
    }

    fn ucb(&self, params: &UctParams, log_parent: f64) -> f64 {
        let n = f64::from(self.visits() + self.virtual_loss());
        let bonus = params.bonus_weight
            * self.prior
            * (params.bonus_equivalence / (params.bonus_equivalence + n)).sqrt();
        if n == 0.0 {
            return params.fpu + bonus;
        }
        let q = self.win.load(Ordering::Relaxed) as f64 / WIN_UNIT as f64 / n;
        q + params.exploration * (log_parent / n).sqrt() + bonus
    }
}

/// A position in the tree.
#[derive(Debug)]
pub struct Node {
    pub hash: u64,
    /// Colour to move.
    pub color: Color,
    pub moves: usize,
    /// Last move before this position; the priors were rated against it.
    pub previous_move1: Point,
    /// The move before `previous_move1`.
    pub previous_move2: Point,
    visits: AtomicU32,
    /// Wins of `color`.
    win: AtomicU64,
    virtual_loss: AtomicU32,
    width: AtomicUsize,
    children: Vec<Child>,
}

impl Node {
    /// Build the node for `pos` with every legal move as a child.
    ///
    /// Priors are the softmax of the rollout logits. Pass is always a child
    /// and always eligible.
    pub fn new(pos: &Position, params: &UctParams, weights: &RolloutWeights, table: &dyn PatternTable) -> Self {
        let color = pos.to_move();
        let logits = move_logits(pos, color, weights, table);
        let ladders = ladder_extensions(pos, color);

        let max = logits.iter().map(|&(_, l)| l).fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = logits.iter().map(|&(_, l)| (l - max).exp()).sum();
        let mut children: Vec<Child> = logits
            .iter()
            .map(|&(pt, l)| {
                let ladder = ladders.contains(&pt);
                let mut prior = (l - max).exp() / sum;
                if ladder {
                    prior *= LADDER_PRIOR_FACTOR;
                }
                Child::new(pt, prior, false, ladder)
            })
            .collect();
        children.sort_by(|a, b| b.prior.total_cmp(&a.prior).then(a.pos.cmp(&b.pos)));
        children.push(Child::new(PASS, 0.0, true, false));

        let width = widening_width(params, 0, children.len() - 1);
        Self {
            hash: pos.current_hash(),
            color,
            moves: pos.moves(),
            previous_move1: pos.last_move().map_or(PASS, |r| r.point),
            previous_move2: pos.previous_move().map_or(PASS, |r| r.point),
            visits: AtomicU32::new(0),
            win: AtomicU64::new(0),
            virtual_loss: AtomicU32::new(0),
            width: AtomicUsize::new(width),
            children,
        }
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    pub fn virtual_loss(&self) -> u32 {
        self.virtual_loss.load(Ordering::Relaxed)
    }

    /// Mean result for the player to move.
    pub fn win_rate(&self) -> f64 {
        let visits = self.visits();
        if visits == 0 {
            return 0.5;
        }
        self.win.load(Ordering::Relaxed) as f64 / WIN_UNIT as f64 / f64::from(visits)
    }

    /// Number of children currently eligible by width (open children excluded).
    pub fn width(&self) -> usize {
        self.width.load(Ordering::Relaxed)
    }

    fn widen(&self, params: &UctParams) -> usize {
        let target = widening_width(params, self.visits(), self.children.len() - 1);
        self.width.fetch_max(target, Ordering::Relaxed).max(target)
    }
}

/// Ownership and criticality statistics of the root.
struct RootStats {
    owned_black: Box<[AtomicU32]>,
    owned_white: Box<[AtomicU32]>,
    owned_by_winner: Box<[AtomicU32]>,
    black_wins: AtomicU32,
    games: AtomicU32,
    criticality: Box<[AtomicU64]>,
}

fn atomic_board<T: Default>() -> Box<[T]> {
    (0..BOARD_MAX).map(|_| T::default()).collect()
}

impl RootStats {
    fn new() -> Self {
        Self {
            owned_black: atomic_board(),
            owned_white: atomic_board(),
            owned_by_winner: atomic_board(),
            black_wins: AtomicU32::new(0),
            games: AtomicU32::new(0),
            criticality: atomic_board(),
        }
    }

    fn reset(&self) {
        for table in [&self.owned_black, &self.owned_white, &self.owned_by_winner] {
            table.iter().for_each(|a| a.store(0, Ordering::Relaxed));
        }
        self.criticality.iter().for_each(|a| a.store(0, Ordering::Relaxed));
        self.black_wins.store(0, Ordering::Relaxed);
        self.games.store(0, Ordering::Relaxed);
    }
}

/// The search tree.
pub struct Tree {
    nodes: Box<[OnceLock<Node>]>,
    table: NodeHashTable,
    params: UctParams,
    stats: RootStats,
}

impl Tree {
    pub fn new(capacity: usize, params: UctParams) -> Self {
        let table = NodeHashTable::new(capacity);
        let nodes = (0..table.capacity()).map(|_| OnceLock::new()).collect();
        Self {
            nodes,
            table,
            params,
            stats: RootStats::new(),
        }
    }

    pub fn params(&self) -> &UctParams {
        &self.params
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Number of nodes in the tree.
    pub fn used(&self) -> usize {
        self.table.used()
    }

    pub fn has_room(&self) -> bool {
        self.table.has_room()
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx).and_then(OnceLock::get)
    }

    /// Drop the nodes of positions before `moves` and reset the root statistics.
    ///
    /// Returns the number of evicted nodes.
    pub fn prepare(&mut self, moves: usize) -> usize {
        let nodes = &mut self.nodes;
        let evicted = self.table.delete_old(moves as u32, |idx| {
            nodes[idx].take();
        });
        self.stats.reset();
        evicted
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        let nodes = &mut self.nodes;
        self.table.clear(|idx| {
            nodes[idx].take();
        });
        self.stats.reset();
    }

    /// Index of the node for `pos`, creating it if needed.
    ///
    /// New nodes are only created while the tree has room, unless `force`.
    /// Returns `None` when no node can be had.
    pub fn find_or_create(
        &self,
        pos: &Position,
        weights: &RolloutWeights,
        table: &dyn PatternTable,
        force: bool,
    ) -> Option<usize> {
        let (hash, color, moves) = (pos.current_hash(), pos.to_move(), pos.moves() as u32);
        let lookup = if force || self.table.has_room() {
            self.table.find_or_claim(hash, color, moves)
        } else {
            match self.table.find(hash, color, moves) {
                Some(idx) => Lookup::Found(idx),
                None => Lookup::Full,
            }
        };
        match lookup {
            Lookup::Found(idx) => {
                while self.nodes[idx].get().is_none() {
                    thread::yield_now();
                }
                Some(idx)
            }
            Lookup::Claimed(idx) => {
                let node = Node::new(pos, &self.params, weights, table);
                // Only the claiming worker sets this slot.
                let _ = self.nodes[idx].set(node);
                Some(idx)
            }
            Lookup::Full => None,
        }
    }

    /// Index of the root node for `pos`, creating it if needed.
    ///
    /// A stored node whose last two moves differ from those of `pos` is
    /// rebuilt, since its priors and ladder flags were computed after other
    /// moves. Its old subtree stays until evicted.
    pub fn root(
        &mut self,
        pos: &Position,
        weights: &RolloutWeights,
        table: &dyn PatternTable,
    ) -> Option<usize> {
        let idx = self.find_or_create(pos, weights, table, true)?;
        let last = pos.last_move().map_or(PASS, |r| r.point);
        let before = pos.previous_move().map_or(PASS, |r| r.point);
        let stale = self.nodes[idx]
            .get()
            .is_some_and(|n| n.previous_move1 != last || n.previous_move2 != before);
        if stale {
            debug!("uct: rebuilding root reached through different moves");
            self.nodes[idx] = OnceLock::from(Node::new(pos, &self.params, weights, table));
        }
        Some(idx)
    }

    /// Index of the child to descend into from `node`.
    pub fn select(&self, node: &Node, is_root: bool) -> usize {
        let width = node.widen(&self.params);
        let parent_n = node.visits() + node.virtual_loss();
        let log_parent = f64::from(parent_n.max(1)).ln();
        let mut best = node.children.len() - 1;
        let mut best_score = f64::NEG_INFINITY;
        for (i, child) in node.children.iter().enumerate() {
            if i >= width && !child.open {
                continue;
            }
            let mut score = child.ucb(&self.params, log_parent);
            if is_root {
                score += self.params.criticality_weight * self.criticality(child.pos);
            }
            if score > best_score {
                best_score = score;
                best = i;
            }
        }
        best
    }

    /// Mark a worker as traversing `node` through child `i`.
    pub fn add_virtual_loss(&self, node: &Node, i: usize) {
        node.virtual_loss.fetch_add(1, Ordering::Relaxed);
        node.children[i].virtual_loss.fetch_add(1, Ordering::Relaxed);
    }

    /// Node below child `i` of `node`, where `pos` is the position after the child's move.
    ///
    /// Creates it once the child has enough visits and the tree has room.
    /// `None` means the leaf is simulated instead.
    pub fn expand_child(
        &self,
        node: &Node,
        i: usize,
        pos: &Position,
        weights: &RolloutWeights,
        table: &dyn PatternTable,
    ) -> Option<usize> {
        let child = &node.children[i];
        loop {
            match child.index.load(Ordering::Acquire) {
                NOT_EXPANDED => {
                    if child.visits() < self.params.expand_threshold {
                        return None;
                    }
                    if child
                        .index
                        .compare_exchange(NOT_EXPANDED, EXPANDING, Ordering::Acquire, Ordering::Relaxed)
                        .is_err()
                    {
                        continue;
                    }
                    let created = self.find_or_create(pos, weights, table, false);
                    child.index.store(created.unwrap_or(NOT_EXPANDED), Ordering::Release);
                    return created;
                }
                EXPANDING => hint::spin_loop(),
                idx => return Some(idx),
            }
        }
    }

    /// Back up `value_black` (Black's result in [0, 1]) along `path` and
    /// remove the virtual loss added on the way down.
    pub fn backup(&self, path: &[(usize, usize)], value_black: f64) {
        for &(idx, i) in path.iter().rev() {
            let Some(node) = self.node(idx) else {
                continue;
            };
            let value = match node.color {
                Color::Black => value_black,
                Color::White => 1.0 - value_black,
            };
            let units = to_units(value);
            let child = &node.children[i];
            child.win.fetch_add(units, Ordering::Relaxed);
            child.visits.fetch_add(1, Ordering::Relaxed);
            child.virtual_loss.fetch_sub(1, Ordering::Relaxed);
            node.win.fetch_add(units, Ordering::Relaxed);
            node.visits.fetch_add(1, Ordering::Relaxed);
            node.virtual_loss.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Record the final ownership of a finished playout from the root.
    pub fn record_ownership(&self, score: &ScoreBreakdown) {
        let Some(winner) = score.winner() else {
            return;
        };
        let s = &self.stats;
        for pt in crate::board::onboard_points() {
            match score.owner(pt) {
                Some(Color::Black) => s.owned_black[pt].fetch_add(1, Ordering::Relaxed),
                Some(Color::White) => s.owned_white[pt].fetch_add(1, Ordering::Relaxed),
                None => continue,
            };
            if score.owner(pt) == Some(winner) {
                s.owned_by_winner[pt].fetch_add(1, Ordering::Relaxed);
            }
        }
        if winner == Color::Black {
            s.black_wins.fetch_add(1, Ordering::Relaxed);
        }
        s.games.fetch_add(1, Ordering::Relaxed);
    }

    /// Recompute the criticality of every point from the ownership counts.
    ///
    /// Criticality is the covariance between owning a point and winning.
    pub fn refresh_criticality(&self) {
        let s = &self.stats;
        let games = s.games.load(Ordering::Relaxed);
        if games == 0 {
            return;
        }
        let t = f64::from(games);
        let black_win = f64::from(s.black_wins.load(Ordering::Relaxed)) / t;
        for pt in crate::board::onboard_points() {
            let winner = f64::from(s.owned_by_winner[pt].load(Ordering::Relaxed)) / t;
            let black = f64::from(s.owned_black[pt].load(Ordering::Relaxed)) / t;
            let white = f64::from(s.owned_white[pt].load(Ordering::Relaxed)) / t;
            let crit = winner - (black * black_win + white * (1.0 - black_win));
            s.criticality[pt].store(crit.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn criticality(&self, pt: Point) -> f64 {
        if pt == PASS {
            return 0.0;
        }
        f64::from_bits(self.stats.criticality[pt].load(Ordering::Relaxed))
    }

    /// Fraction of finished playouts in which `color` owned `pt`.
    pub fn ownership(&self, pt: Point, color: Color) -> f64 {
        let s = &self.stats;
        let games = s.games.load(Ordering::Relaxed);
        if games == 0 {
            return 0.0;
        }
        let owned = match color {
            Color::Black => &s.owned_black,
            Color::White => &s.owned_white,
        };
        f64::from(owned[pt].load(Ordering::Relaxed)) / f64::from(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;
    use crate::patterns::NoPatterns;

    fn tree(capacity: usize) -> Tree {
        Tree::new(capacity, UctParams::default())
    }

    #[test]
    fn test_widening_is_monotone_and_bounded() {
        let params = UctParams::default();
        let mut prev = 0;
        for visits in 0..20_000 {
            let w = widening_width(&params, visits, 30);
            assert!(w >= prev);
            assert!(w <= 30);
            prev = w;
        }
        assert_eq!(widening_width(&params, 0, 30), INITIAL_WIDTH);
        assert_eq!(prev, 30);
        assert_eq!(widening_width(&params, 39, 81), 1);
        assert_eq!(widening_width(&params, 40, 81), 2);
        assert_eq!(widening_width(&params, 1_000, 81), 6);
        assert_eq!(widening_width(&params, 5_000_000, 81), 81);
        assert_eq!(widening_width(&params, 1_000_000, 0), 0);
    }

    #[test]
    fn test_node_priors() {
        let p = Position::new();
        let node = Node::new(&p, &UctParams::default(), &RolloutWeights::default(), &NoPatterns);
        let children = node.children();
        assert_eq!(children.len(), crate::constants::PURE_BOARD_MAX + 1);
        let last = children.last().unwrap();
        assert_eq!(last.pos, PASS);
        assert!(last.open);
        let sum: f64 = children.iter().map(|c| c.prior).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(children.windows(2).take(children.len() - 2).all(|w| w[0].prior >= w[1].prior));
    }

    #[test]
    fn test_select_prefers_unvisited_then_lowest_index() {
        let t = tree(64);
        let p = Position::new();
        let idx = t.find_or_create(&p, &RolloutWeights::default(), &NoPatterns, true).unwrap();
        let node = t.node(idx).unwrap();
        // Equal priors on an empty board: the first eligible child wins the tie.
        assert_eq!(t.select(node, true), 0);
    }

    #[test]
    fn test_virtual_loss_returns_to_zero() {
        let t = tree(64);
        let p = Position::new();
        let idx = t.find_or_create(&p, &RolloutWeights::default(), &NoPatterns, true).unwrap();
        let node = t.node(idx).unwrap();
        let i = t.select(node, true);
        t.add_virtual_loss(node, i);
        assert_eq!(node.virtual_loss(), 1);
        assert_eq!(node.children()[i].virtual_loss(), 1);
        // The pending loss lowers the child's score below an untouched sibling.
        assert_ne!(t.select(node, true), i);
        t.backup(&[(idx, i)], 1.0);
        assert_eq!(node.virtual_loss(), 0);
        assert_eq!(node.children()[i].virtual_loss(), 0);
        assert_eq!(node.visits(), 1);
        assert_eq!(node.children()[i].win_rate(), 1.0);
    }

    #[test]
    fn test_draw_backs_up_half() {
        let t = tree(64);
        let p = Position::new();
        let idx = t.find_or_create(&p, &RolloutWeights::default(), &NoPatterns, true).unwrap();
        let node = t.node(idx).unwrap();
        t.add_virtual_loss(node, 0);
        t.backup(&[(idx, 0)], 0.5);
        assert_eq!(node.children()[0].win_rate(), 0.5);
        assert_eq!(node.win_rate(), 0.5);
    }

    #[test]
    fn test_transposition_shares_node() {
        let t = tree(64);
        let w = RolloutWeights::default();
        let mut a = Position::new();
        let mut b = Position::new();
        for (p, order) in [(&mut a, ["C3", "G7", "G3"]), (&mut b, ["G3", "G7", "C3"])] {
            for m in order {
                let color = p.to_move();
                p.apply_move(color, parse_coord(m).unwrap()).unwrap();
            }
        }
        let ia = t.find_or_create(&a, &w, &NoPatterns, true);
        let ib = t.find_or_create(&b, &w, &NoPatterns, true);
        assert!(ia.is_some());
        assert_eq!(ia, ib);
        assert_eq!(t.used(), 1);
    }

    #[test]
    fn test_root_reached_through_other_moves_is_rebuilt() {
        let mut t = tree(64);
        let w = RolloutWeights::default();
        let mut a = Position::new();
        let mut b = Position::new();
        for (p, order) in [(&mut a, ["C3", "G7", "G3"]), (&mut b, ["G3", "G7", "C3"])] {
            for m in order {
                let color = p.to_move();
                p.apply_move(color, parse_coord(m).unwrap()).unwrap();
            }
        }
        let ia = t.root(&a, &w, &NoPatterns).unwrap();
        let node = t.node(ia).unwrap();
        t.add_virtual_loss(node, 0);
        t.backup(&[(ia, 0)], 1.0);

        // Same path again: the statistics are kept.
        assert_eq!(t.root(&a, &w, &NoPatterns), Some(ia));
        assert_eq!(t.node(ia).unwrap().visits(), 1);

        // Same position after other moves: a fresh node in the same slot.
        assert_eq!(t.root(&b, &w, &NoPatterns), Some(ia));
        let node = t.node(ia).unwrap();
        assert_eq!(node.visits(), 0);
        assert_eq!(node.previous_move1, parse_coord("C3").unwrap());
        assert_eq!(node.previous_move2, parse_coord("G7").unwrap());
        assert_eq!(t.used(), 1);
    }

    #[test]
    fn test_full_tree_refuses_new_nodes() {
        let t = tree(2);
        let w = RolloutWeights::default();
        let mut p = Position::new();
        assert!(t.find_or_create(&p, &w, &NoPatterns, false).is_some());
        p.apply_move(Color::Black, parse_coord("E5").unwrap()).unwrap();
        assert!(t.find_or_create(&p, &w, &NoPatterns, false).is_some());
        p.apply_move(Color::White, parse_coord("D5").unwrap()).unwrap();
        assert!(!t.has_room());
        assert!(t.find_or_create(&p, &w, &NoPatterns, false).is_none());
    }

    #[test]
    fn test_prepare_evicts_old_plies() {
        let mut t = tree(64);
        let w = RolloutWeights::default();
        let mut p = Position::new();
        t.find_or_create(&p, &w, &NoPatterns, true);
        p.apply_move(Color::Black, parse_coord("E5").unwrap()).unwrap();
        let idx = t.find_or_create(&p, &w, &NoPatterns, true).unwrap();
        assert_eq!(t.prepare(p.moves()), 1);
        assert!(t.node(idx).is_some());
        assert_eq!(t.used(), 1);
    }
}
