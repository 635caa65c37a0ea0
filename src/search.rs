//! Search scheduler: worker threads sharing one UCT tree.
//!
//! Each worker repeats select -> expand -> simulate -> backup on its own copy
//! of the root position. Playouts are claimed from a shared counter before
//! they start, so a playout budget of N runs exactly N cycles however many
//! threads there are. Time budgets and stop requests are checked between
//! cycles only.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use fastrand::Rng;
use log::{debug, info, warn};

use crate::board::{Color, Point, str_coord};
use crate::constants::{
    CRITICALITY_INTERVAL, DEFAULT_PLAYOUTS, DEFAULT_TREE_CAPACITY, KOMI, MIXING_PARAMETER, PASS,
    PASS_THRESHOLD, RESIGN_THRESHOLD, THREAD_MAX,
};
use crate::error::IllegalMove;
use crate::patterns::{Pat3Shapes, PatternTable};
use crate::position::Position;
use crate::rollout::{PlayoutOutcome, Rollout, RolloutWeights};
use crate::scoring::score_position;
use crate::uct::{Tree, UctParams};

/// When a search stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Playouts(u64),
    Time(Duration),
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PlayoutBudget,
    TimeBudget,
    Stopped,
}

/// Shared flag to stop a running search from another thread.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Opaque position evaluator mixed into rollout results.
pub trait ValueEvaluator: Send + Sync {
    /// Probability in [0, 1] that Black wins from `pos`.
    fn evaluate(&self, pos: &Position) -> f64;
}

/// Search settings.
#[derive(Clone)]
pub struct SearchConfig {
    threads: usize,
    seed: u64,
    komi: f64,
    budget: Budget,
    tree_capacity: usize,
    params: UctParams,
    rollout: RolloutWeights,
    patterns: Arc<dyn PatternTable>,
    evaluator: Option<Arc<dyn ValueEvaluator>>,
    mixing: f64,
    resign_threshold: f64,
    pass_threshold: f64,
    stop: Option<StopToken>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            seed: 0,
            komi: KOMI,
            budget: Budget::Playouts(DEFAULT_PLAYOUTS),
            tree_capacity: DEFAULT_TREE_CAPACITY,
            params: UctParams::default(),
            rollout: RolloutWeights::default(),
            patterns: Arc::new(Pat3Shapes::new(1.0)),
            evaluator: None,
            mixing: MIXING_PARAMETER,
            resign_threshold: RESIGN_THRESHOLD,
            pass_threshold: PASS_THRESHOLD,
            stop: None,
        }
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("threads", &self.threads)
            .field("seed", &self.seed)
            .field("komi", &self.komi)
            .field("budget", &self.budget)
            .field("tree_capacity", &self.tree_capacity)
            .field("params", &self.params)
            .field("evaluator", &self.evaluator.is_some())
            .finish_non_exhaustive()
    }
}

impl SearchConfig {
    /// Number of worker threads, clamped to `1..=THREAD_MAX`.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.clamp(1, THREAD_MAX);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn komi(mut self, komi: f64) -> Self {
        self.komi = komi;
        self
    }

    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn playouts(self, playouts: u64) -> Self {
        self.budget(Budget::Playouts(playouts))
    }

    pub fn time(self, time: Duration) -> Self {
        self.budget(Budget::Time(time))
    }

    pub fn tree_capacity(mut self, capacity: usize) -> Self {
        self.tree_capacity = capacity;
        self
    }

    pub fn params(mut self, params: UctParams) -> Self {
        self.params = params;
        self
    }

    pub fn expand_threshold(mut self, threshold: u32) -> Self {
        self.params.expand_threshold = threshold;
        self
    }

    pub fn rollout_weights(mut self, weights: RolloutWeights) -> Self {
        self.rollout = weights;
        self
    }

    pub fn patterns(mut self, patterns: Arc<dyn PatternTable>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Mix `evaluator` into leaf values with weight `mixing`.
    pub fn evaluator(mut self, evaluator: Arc<dyn ValueEvaluator>, mixing: f64) -> Self {
        self.evaluator = Some(evaluator);
        self.mixing = mixing.clamp(0.0, 1.0);
        self
    }

    pub fn resign_threshold(mut self, threshold: f64) -> Self {
        self.resign_threshold = threshold;
        self
    }

    pub fn pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    pub fn stop_token(mut self, token: StopToken) -> Self {
        self.stop = Some(token);
        self
    }
}

/// Statistics of one root move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveStats {
    pub point: Point,
    pub visits: u32,
    /// Mean result for the side to move at the root.
    pub win_rate: f64,
    pub prior: f64,
}

/// What to do with a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Play(Point),
    Pass,
    Resign,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Point,
    /// Root win rate for the side to move.
    pub win_rate: f64,
    /// Visited root moves, best first.
    pub moves: Vec<MoveStats>,
    pub playouts: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
    pub tree_nodes: usize,
}

impl SearchResult {
    /// Win rate of the best move, or of the root when nothing was visited.
    pub fn best_win_rate(&self) -> f64 {
        self.moves.first().map_or(self.win_rate, |m| m.win_rate)
    }

    /// Resign when clearly lost; pass when the best move is pass, or when
    /// clearly winning right after the opponent passed.
    pub fn decide(&self, pos: &Position, config: &SearchConfig) -> Decision {
        let win_rate = self.best_win_rate();
        if self.playouts > 0 && win_rate < config.resign_threshold {
            return Decision::Resign;
        }
        let opponent_passed = pos.last_move().is_some_and(|m| m.point == PASS);
        if self.best_move == PASS || (opponent_passed && win_rate > config.pass_threshold) {
            return Decision::Pass;
        }
        Decision::Play(self.best_move)
    }
}

/// A search engine that keeps its tree between moves.
pub struct Search {
    tree: Tree,
    config: SearchConfig,
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            tree: Tree::new(config.tree_capacity, config.params.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Search for the side to move in `root`.
    pub fn run(&mut self, root: &Position) -> SearchResult {
        let start = Instant::now();
        let evicted = self.tree.prepare(root.moves());
        if evicted > 0 {
            debug!("search: evicted {evicted} nodes of earlier moves");
        }

        let config = &self.config;
        let mut root_idx = self.tree.root(root, &config.rollout, config.patterns.as_ref());
        if root_idx.is_none() {
            warn!("search: tree full, clearing {} nodes", self.tree.used());
            self.tree.clear();
            root_idx = self.tree.root(root, &config.rollout, config.patterns.as_ref());
        }
        let Some(root_idx) = root_idx else {
            warn!("search: no room for the root node");
            return SearchResult {
                best_move: PASS,
                win_rate: 0.5,
                moves: Vec::new(),
                playouts: 0,
                stop_reason: StopReason::Stopped,
                elapsed: start.elapsed(),
                tree_nodes: 0,
            };
        };

        let reused = self.tree.node(root_idx).map_or(0, |n| n.visits());
        info!(
            "search: {} to move, {} threads, budget {:?}, root reused with {} visits",
            if root.to_move() == Color::Black { "black" } else { "white" },
            config.threads,
            config.budget,
            reused,
        );

        let shared = Shared {
            tree: &self.tree,
            root,
            root_idx,
            config,
            start,
            claimed: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            stop_reason: OnceLock::new(),
            full_warned: AtomicBool::new(false),
        };
        thread::scope(|s| {
            for id in 0..config.threads {
                let shared = &shared;
                s.spawn(move || shared.worker(id));
            }
        });

        let playouts = shared.completed.load(Ordering::Relaxed);
        let stop_reason = shared.stop_reason.get().copied().unwrap_or(StopReason::Stopped);
        let result = self.collect(root_idx, playouts, stop_reason, start.elapsed());
        let secs = result.elapsed.as_secs_f64().max(1e-9);
        info!(
            "search: {} playouts in {:.2}s ({:.0}/s), best {} at {:.1}%, {} nodes, {:?}",
            result.playouts,
            secs,
            result.playouts as f64 / secs,
            str_coord(result.best_move),
            result.best_win_rate() * 100.0,
            result.tree_nodes,
            result.stop_reason,
        );
        result
    }

    fn collect(&self, root_idx: usize, playouts: u64, stop_reason: StopReason, elapsed: Duration) -> SearchResult {
        let mut moves: Vec<MoveStats> = Vec::new();
        let mut win_rate = 0.5;
        if let Some(root) = self.tree.node(root_idx) {
            win_rate = root.win_rate();
            moves = root
                .children()
                .iter()
                .filter(|c| c.visits() > 0)
                .map(|c| MoveStats {
                    point: c.pos,
                    visits: c.visits(),
                    win_rate: c.win_rate(),
                    prior: c.prior,
                })
                .collect();
        }
        moves.sort_by(|a, b| {
            b.visits
                .cmp(&a.visits)
                .then(b.win_rate.total_cmp(&a.win_rate))
                .then(a.point.cmp(&b.point))
        });
        SearchResult {
            best_move: moves.first().map_or(PASS, |m| m.point),
            win_rate,
            moves,
            playouts,
            stop_reason,
            elapsed,
            tree_nodes: self.tree.used(),
        }
    }
}

/// Search `root` with `color` to move.
///
/// When `color` is not the side to move in `root`, the other side is
/// assumed to have passed.
pub fn run_search(root: &Position, color: Color, config: &SearchConfig) -> SearchResult {
    let mut search = Search::new(config.clone());
    if root.to_move() == color {
        return search.run(root);
    }
    let mut pos = root.clone();
    if let Err(err) = pos.apply_move(color.opponent(), PASS) {
        warn!("search: cannot hand the move to the other side: {err}");
        return search.run(root);
    }
    search.run(&pos)
}

/// State shared by the workers of one search.
struct Shared<'a> {
    tree: &'a Tree,
    root: &'a Position,
    root_idx: usize,
    config: &'a SearchConfig,
    start: Instant,
    claimed: AtomicU64,
    completed: AtomicU64,
    stop_reason: OnceLock<StopReason>,
    full_warned: AtomicBool,
}

impl Shared<'_> {
    /// Claim the next playout, or record why there is none.
    fn claim(&self) -> bool {
        if self.config.stop.as_ref().is_some_and(StopToken::is_stopped) {
            let _ = self.stop_reason.set(StopReason::Stopped);
            return false;
        }
        match self.config.budget {
            Budget::Playouts(n) => {
                if self.claimed.fetch_add(1, Ordering::Relaxed) >= n {
                    let _ = self.stop_reason.set(StopReason::PlayoutBudget);
                    return false;
                }
            }
            Budget::Time(limit) => {
                if self.start.elapsed() >= limit {
                    let _ = self.stop_reason.set(StopReason::TimeBudget);
                    return false;
                }
                self.claimed.fetch_add(1, Ordering::Relaxed);
            }
        }
        true
    }

    fn worker(&self, id: usize) {
        let config = self.config;
        let mut rng = Rng::with_seed(config.seed.wrapping_add(id as u64));
        let mut pos = self.root.clone();
        let mut scratch = self.root.clone();
        let mut rollout = Rollout::new(&config.rollout, config.patterns.as_ref());
        let mut path = Vec::new();
        let mut cycles = 0u64;
        while self.claim() {
            self.cycle(&mut pos, &mut scratch, &mut rollout, &mut rng, &mut path);
            cycles += 1;
            let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % CRITICALITY_INTERVAL == 0 {
                self.tree.refresh_criticality();
            }
        }
        debug!("worker {id}: {cycles} playouts");
    }

    /// One select -> expand -> simulate -> backup cycle. `pos` is back at
    /// the root afterwards.
    fn cycle(
        &self,
        pos: &mut Position,
        scratch: &mut Position,
        rollout: &mut Rollout<'_>,
        rng: &mut Rng,
        path: &mut Vec<(usize, usize)>,
    ) {
        let (tree, config) = (self.tree, self.config);
        path.clear();
        let mut node_idx = self.root_idx;
        let mut applied = 0;

        let value_black = loop {
            let Some(node) = tree.node(node_idx) else {
                break 0.5;
            };
            let i = tree.select(node, node_idx == self.root_idx);
            tree.add_virtual_loss(node, i);
            path.push((node_idx, i));
            let color = node.color;
            if let Err(err) = pos.apply_move(color, node.children()[i].pos) {
                // A repetition of an earlier position on this path loses for the mover.
                break match err {
                    IllegalMove::CapacityExceeded => 0.5,
                    _ if color == Color::Black => 0.0,
                    _ => 1.0,
                };
            }
            applied += 1;

            if pos.is_game_over() {
                let score = score_position(pos, config.komi);
                tree.record_ownership(&score);
                break self.mix(pos, PlayoutOutcome::Finished(score).value_for(Color::Black));
            }

            match tree.expand_child(node, i, pos, &config.rollout, config.patterns.as_ref()) {
                Some(next) => node_idx = next,
                None => {
                    if !tree.has_room() && !self.full_warned.swap(true, Ordering::Relaxed) {
                        warn!("search: tree capacity reached at {} nodes, simulating leaves", tree.used());
                    }
                    scratch.clone_from(pos);
                    let outcome = rollout.playout(scratch, rng, config.komi);
                    if let PlayoutOutcome::Finished(score) = &outcome {
                        tree.record_ownership(score);
                    }
                    break self.mix(pos, outcome.value_for(Color::Black));
                }
            }
        };

        tree.backup(path, value_black);
        for _ in 0..applied {
            pos.undo_last_move();
        }
    }

    fn mix(&self, leaf: &Position, rollout_value: f64) -> f64 {
        match &self.config.evaluator {
            Some(eval) => {
                let lambda = self.config.mixing;
                (1.0 - lambda) * rollout_value + lambda * eval.evaluate(leaf).clamp(0.0, 1.0)
            }
            None => rollout_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_coord;

    fn config(playouts: u64) -> SearchConfig {
        SearchConfig::default().seed(7).playouts(playouts)
    }

    #[test]
    fn test_playout_budget_is_exact() {
        let p = Position::new();
        let mut search = Search::new(config(300).threads(4));
        let result = search.run(&p);
        assert_eq!(result.playouts, 300);
        assert_eq!(result.stop_reason, StopReason::PlayoutBudget);
        let total: u32 = result.moves.iter().map(|m| m.visits).sum();
        assert_eq!(total, 300);
    }

    #[test]
    fn test_virtual_loss_cleared_after_search() {
        let p = Position::new();
        let mut search = Search::new(config(200).threads(4).expand_threshold(5));
        search.run(&p);
        let tree = search.tree();
        let mut seen = 0;
        for idx in 0..tree.capacity() {
            if let Some(node) = tree.node(idx) {
                seen += 1;
                assert_eq!(node.virtual_loss(), 0);
                assert!(node.children().iter().all(|c| c.virtual_loss() == 0));
                assert!(node.width() <= node.children().len());
            }
        }
        assert!(seen > 1);
    }

    #[test]
    fn test_single_thread_is_deterministic() {
        let p = Position::new();
        let a = Search::new(config(150)).run(&p);
        let b = Search::new(config(150)).run(&p);
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.moves, b.moves);
    }

    #[test]
    fn test_best_move_has_most_visits() {
        let p = Position::new();
        let result = Search::new(config(200)).run(&p);
        let max = result.moves.iter().map(|m| m.visits).max().unwrap();
        assert_eq!(result.moves[0].point, result.best_move);
        assert_eq!(result.moves[0].visits, max);
    }

    #[test]
    fn test_tiny_tree_degrades_to_rollouts() {
        let p = Position::new();
        let mut search = Search::new(config(100).tree_capacity(2).expand_threshold(1));
        let result = search.run(&p);
        assert_eq!(result.playouts, 100);
        assert!(result.tree_nodes <= 2);
    }

    #[test]
    fn test_stopped_search_runs_nothing() {
        let token = StopToken::new();
        token.stop();
        let p = Position::new();
        let result = Search::new(config(100).stop_token(token)).run(&p);
        assert_eq!(result.playouts, 0);
        assert_eq!(result.stop_reason, StopReason::Stopped);
        assert_eq!(result.best_move, PASS);
    }

    #[test]
    fn test_time_budget() {
        let p = Position::new();
        let result = Search::new(SearchConfig::default().time(Duration::from_millis(50)).threads(2)).run(&p);
        assert_eq!(result.stop_reason, StopReason::TimeBudget);
    }

    #[test]
    fn test_tree_is_reused() {
        let p = Position::new();
        let mut search = Search::new(config(100));
        search.run(&p);
        let result = search.run(&p);
        assert_eq!(result.playouts, 100);
        let total: u32 = result.moves.iter().map(|m| m.visits).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn test_root_ownership_is_recorded() {
        let p = Position::new();
        let cfg = config(120)
            .patterns(Arc::new(crate::patterns::NoPatterns))
            .rollout_weights(RolloutWeights::default());
        let mut search = Search::new(cfg);
        search.run(&p);
        let tree = search.tree();
        for pt in crate::board::onboard_points() {
            let black = tree.ownership(pt, Color::Black);
            let white = tree.ownership(pt, Color::White);
            assert!((0.0..=1.0).contains(&black));
            assert!(black + white <= 1.0 + 1e-9);
            assert!(tree.criticality(pt).abs() <= 1.0);
        }
    }

    #[test]
    fn test_stop_token_reset() {
        let token = StopToken::new();
        token.stop();
        assert!(token.is_stopped());
        token.reset();
        let result = Search::new(config(20).stop_token(token.clone())).run(&Position::new());
        assert_eq!(result.playouts, 20);
        assert!(!token.is_stopped());
    }

    struct BlackWins;

    impl ValueEvaluator for BlackWins {
        fn evaluate(&self, _pos: &Position) -> f64 {
            1.0
        }
    }

    #[test]
    fn test_evaluator_only() {
        let p = Position::new();
        let cfg = config(50).evaluator(Arc::new(BlackWins), 1.0);
        let result = Search::new(cfg).run(&p);
        assert!(result.moves.iter().all(|m| m.win_rate == 1.0));
    }

    #[test]
    fn test_run_search_for_other_color() {
        let p = Position::new();
        let result = run_search(&p, Color::White, &config(30));
        assert_eq!(result.playouts, 30);
        let mut after_pass = p.clone();
        after_pass.apply_move(Color::Black, PASS).unwrap();
        assert!(after_pass.is_legal(Color::White, result.best_move));
    }

    fn result_with(best: Point, win_rate: f64) -> SearchResult {
        SearchResult {
            best_move: best,
            win_rate,
            moves: vec![MoveStats {
                point: best,
                visits: 10,
                win_rate,
                prior: 0.1,
            }],
            playouts: 10,
            stop_reason: StopReason::PlayoutBudget,
            elapsed: Duration::ZERO,
            tree_nodes: 1,
        }
    }

    #[test]
    fn test_decide() {
        let cfg = SearchConfig::default().resign_threshold(0.1).pass_threshold(0.9);
        let e5 = parse_coord("E5").unwrap();
        let mut p = Position::new();
        assert_eq!(result_with(e5, 0.5).decide(&p, &cfg), Decision::Play(e5));
        assert_eq!(result_with(e5, 0.05).decide(&p, &cfg), Decision::Resign);
        assert_eq!(result_with(PASS, 0.5).decide(&p, &cfg), Decision::Pass);
        p.apply_move(Color::Black, PASS).unwrap();
        assert_eq!(result_with(e5, 0.95).decide(&p, &cfg), Decision::Pass);
        assert_eq!(result_with(e5, 0.6).decide(&p, &cfg), Decision::Play(e5));
    }
}
