//! Bamboo-Rust: a multi-threaded UCT Go engine core.
//!
//! This crate provides an incrementally updated Go position with exact undo,
//! a pattern-guided rollout engine and a parallel Monte Carlo tree search.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and engine parameters
//! - [`board`] - Points, colours and coordinates
//! - [`position`] - Game state, move legality, apply and undo
//! - [`string`] - Strings (groups) with liberties and neighbours
//! - [`zobrist`] - Hash keys and the tree's position table
//! - [`patterns`] - Local pattern codes and pattern tables
//! - [`rollout`] - Feature-weighted playouts
//! - [`uct`] - The search tree
//! - [`search`] - Worker threads, budgets and results
//! - [`ladder`], [`nakade`], [`scoring`] - Tactics and end-of-game scoring
//!
//! ## Example
//!
//! ```
//! use bamboo_rust::board::{Color, parse_coord, str_coord};
//! use bamboo_rust::position::Position;
//! use bamboo_rust::search::{SearchConfig, run_search};
//!
//! let mut pos = Position::new();
//! pos.apply_move(Color::Black, parse_coord("E5").unwrap()).unwrap();
//!
//! let config = SearchConfig::default().playouts(100).seed(1);
//! let result = run_search(&pos, Color::White, &config);
//! println!("Best move: {}", str_coord(result.best_move));
//! assert_eq!(result.playouts, 100);
//! ```

pub mod board;
pub mod constants;
pub mod error;
pub mod ladder;
pub mod nakade;
pub mod patterns;
pub mod position;
pub mod rollout;
pub mod scoring;
pub mod search;
pub mod string;
pub mod uct;
pub mod zobrist;
