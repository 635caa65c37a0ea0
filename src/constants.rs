//! Constants for board geometry, record limits and search parameters.
//!
//! The board is a 1D array with a border of off-board points two points wide,
//! so that every on-board point's 12-point neighbourhood can be read without
//! bounds checks.
//!
//! # Board Size Configuration
//!
//! The board size is controlled by Cargo features:
//! - `board9x9` (default): 9x9 board
//! - `board13x13`: 13x13 board
//! - `board19x19`: 19x19 board
//!
//! ```sh
//! cargo build                                              # 9x9 (default)
//! cargo build --no-default-features --features board19x19  # 19x19
//! ```

// =============================================================================
// Board Geometry
// =============================================================================

/// Playable board size (NxN).
#[cfg(feature = "board9x9")]
pub const PURE_BOARD_SIZE: usize = 9;

#[cfg(feature = "board13x13")]
pub const PURE_BOARD_SIZE: usize = 13;

#[cfg(feature = "board19x19")]
pub const PURE_BOARD_SIZE: usize = 19;

#[cfg(any(
    all(feature = "board9x9", feature = "board13x13"),
    all(feature = "board9x9", feature = "board19x19"),
    all(feature = "board13x13", feature = "board19x19"),
))]
compile_error!("Enable exactly one board size feature: 'board9x9', 'board13x13' or 'board19x19'");

#[cfg(not(any(feature = "board9x9", feature = "board13x13", feature = "board19x19")))]
compile_error!("Must enable exactly one board size feature: 'board9x9', 'board13x13' or 'board19x19'");

/// Width of the off-board border on each side.
pub const OB_SIZE: usize = 2;

/// Board width including the border.
pub const BOARD_SIZE: usize = PURE_BOARD_SIZE + OB_SIZE + OB_SIZE;

/// Number of playable points.
pub const PURE_BOARD_MAX: usize = PURE_BOARD_SIZE * PURE_BOARD_SIZE;

/// Total array size including the border.
pub const BOARD_MAX: usize = BOARD_SIZE * BOARD_SIZE;

/// First playable row/column coordinate.
pub const BOARD_START: usize = OB_SIZE;

/// Last playable row/column coordinate.
pub const BOARD_END: usize = PURE_BOARD_SIZE + OB_SIZE - 1;

/// Maximum number of strings alive at once.
pub const MAX_STRING: usize = PURE_BOARD_MAX * 4 / 5;

/// Maximum number of recorded moves in a game.
pub const MAX_RECORDS: usize = PURE_BOARD_MAX * 3;

/// Hard ply ceiling: no game (and no playout) goes beyond this many moves.
pub const MAX_MOVES: usize = MAX_RECORDS - 1;

// =============================================================================
// Special Move Values
// =============================================================================

/// Pass move marker (index 0 is in the border, so it is never a playable point).
pub const PASS: usize = 0;

/// Resign move marker.
pub const RESIGN: usize = usize::MAX;

/// Default compensation for White.
pub const KOMI: f64 = 6.5;

// =============================================================================
// UCT Search Parameters
// =============================================================================

/// Upper bound on worker threads.
pub const THREAD_MAX: usize = 32;

/// Default number of playouts per search.
pub const DEFAULT_PLAYOUTS: u64 = 4000;

/// Default number of node slots in the search tree (must be a power of two).
pub const DEFAULT_TREE_CAPACITY: usize = 1 << 16;

/// Fraction of the tree that may be filled before expansion stops.
pub const TREE_FILL_LIMIT: f64 = 0.9;

/// Child visits required before a node is materialised for it.
#[cfg(feature = "board9x9")]
pub const EXPAND_THRESHOLD: u32 = 20;

#[cfg(feature = "board13x13")]
pub const EXPAND_THRESHOLD: u32 = 25;

#[cfg(feature = "board19x19")]
pub const EXPAND_THRESHOLD: u32 = 40;

/// Value of an unvisited child (first play urgency).
pub const FPU: f64 = 5.0;

/// Weight of the UCB exploration term.
pub const EXPLORATION_CONSTANT: f64 = 0.31;

/// Weight of the prior bonus.
pub const BONUS_WEIGHT: f64 = 0.35;

/// Visit count at which the prior bonus has decayed to ~70%.
pub const BONUS_EQUIVALENCE: f64 = 1000.0;

/// Exponent of the widening power law: a node admits
/// `(visits / PW_BASE)^(1 / PROGRESSIVE_WIDENING)` children beyond the initial width.
pub const PROGRESSIVE_WIDENING: f64 = 1.8;

/// Visits needed before the first widening step.
pub const PW_BASE: f64 = 40.0;

/// Children eligible at a freshly expanded node.
pub const INITIAL_WIDTH: usize = 1;

/// Weight of the evaluator value when mixing it with the rollout result.
pub const MIXING_PARAMETER: f64 = 0.5;

/// Playouts between criticality refreshes.
pub const CRITICALITY_INTERVAL: u64 = 100;

/// Weight of the criticality bonus at the root.
pub const CRITICALITY_WEIGHT: f64 = 0.1;

/// Prior multiplier for moves that extend a group caught in a ladder.
pub const LADDER_PRIOR_FACTOR: f64 = 0.01;

/// Fixed-point scale of win counters: one win is worth this many units.
pub const WIN_UNIT: u64 = 1 << 10;

/// Win rate below which the engine resigns.
pub const RESIGN_THRESHOLD: f64 = 0.2;

/// Win rate above which the engine answers a pass with a pass.
pub const PASS_THRESHOLD: f64 = 0.9;

/// Maximum ladder reading depth in plies.
pub const LADDER_DEPTH_MAX: usize = 100;
