//! Monte-Carlo tree search for perch.
//!
//! The search walks the tree with PUCT selection, expands leaves with
//! priors (uniform, or from a caller-supplied policy), obtains leaf
//! values (random playout, or from a caller-supplied estimator), and
//! backpropagates from the root player's perspective. Two loops share
//! those pieces:
//!
//! - the **sequential** loop completes one leaf evaluation per
//!   iteration;
//! - the **batched** loop steps a pool of simulated workers under
//!   virtual loss and coalesces their leaf positions by FEN, so an
//!   expensive external evaluator is called once per unique position
//!   per round.
//!
//! Dirichlet noise can be mixed into the root priors for
//! AlphaZero-style exploration. The search is deterministic for a fixed
//! seed and fixed callback outputs.
//!
//! # Example
//!
//! ```
//! use perch_engine::Position;
//! use perch_mcts::{run_mcts, MctsOptions};
//!
//! let position = Position::startpos();
//! let result = run_mcts(&position, 50, 42, &MctsOptions::default());
//! assert_eq!(result.root_visits, 50);
//! assert!(result.best_move().is_some());
//! ```

mod batch;
mod options;
mod search;
mod tree;

pub use options::{BatchPriorFn, BatchValueFn, MctsOptions, PriorFn, ValueFn};
pub use search::{best_move, run_mcts, MctsResult};
