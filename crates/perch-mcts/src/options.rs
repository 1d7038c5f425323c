//! Search configuration.

use perch_core::Move;
use perch_engine::Position;

/// Move priors for one position: given the position and its legal
/// moves, returns one nonnegative weight per move. The engine
/// renormalises; wrong-length or non-finite output falls back to
/// uniform priors.
pub type PriorFn = Box<dyn Fn(&Position, &[Move]) -> Vec<f64>>;

/// Leaf value in [-1, 1] from the side-to-move perspective. Non-finite
/// output is replaced by 0.
pub type ValueFn = Box<dyn Fn(&Position) -> f64>;

/// Batched priors: inputs are the unique leaf FENs and, per FEN, the
/// legal moves as UCI strings; output is one prior vector per FEN.
pub type BatchPriorFn = Box<dyn Fn(&[String], &[Vec<String>]) -> Vec<Vec<f64>>>;

/// Batched values: one scalar per input FEN.
pub type BatchValueFn = Box<dyn Fn(&[String]) -> Vec<f64>>;

/// Options bundle for [`run_mcts`](crate::run_mcts).
///
/// With no callbacks configured the search is plain UCT: uniform priors
/// and uniform random playouts. Providing `prior_fn` / `value_fn`
/// replaces either ingredient; providing **both** batch callbacks
/// switches to the batched loop with `batch_size` simulated workers.
pub struct MctsOptions {
    /// PUCT exploration constant.
    pub c_puct: f64,
    pub prior_fn: Option<PriorFn>,
    pub value_fn: Option<ValueFn>,
    pub batch_prior_fn: Option<BatchPriorFn>,
    pub batch_value_fn: Option<BatchValueFn>,
    /// Worker count in batched mode, clamped to 1..=1024.
    pub batch_size: usize,
    /// Dirichlet concentration; noise is enabled when > 0.
    pub dirichlet_alpha: f64,
    /// Mixing weight: root priors become (1-eps)*P + eps*Dir(alpha).
    pub dirichlet_epsilon: f64,
}

impl Default for MctsOptions {
    fn default() -> Self {
        MctsOptions {
            c_puct: std::f64::consts::SQRT_2,
            prior_fn: None,
            value_fn: None,
            batch_prior_fn: None,
            batch_value_fn: None,
            batch_size: 8,
            dirichlet_alpha: 0.0,
            dirichlet_epsilon: 0.25,
        }
    }
}

impl MctsOptions {
    /// Batched mode requires both batch callbacks.
    pub(crate) fn batched(&self) -> bool {
        self.batch_prior_fn.is_some() && self.batch_value_fn.is_some()
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.batch_size.clamp(1, 1024)
    }
}
