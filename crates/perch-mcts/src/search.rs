//! Sequential search loop and shared search plumbing.

use crate::batch::run_batched;
use crate::options::MctsOptions;
use crate::tree::SearchTree;
use perch_core::{GameResult, Move};
use perch_engine::{is_king_attacked, legal_moves, random_playout, Position};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Dirichlet, Distribution};
use tracing::debug;

/// Outcome of a search.
#[derive(Debug, Clone)]
pub struct MctsResult {
    /// Visit count per root child, in (from, to, promotion) move order.
    pub visits: Vec<(Move, u32)>,
    /// Root average value W/N from the root player's perspective.
    pub root_value: f64,
    /// Total completed evaluations backpropagated through the root.
    pub root_visits: u32,
}

impl MctsResult {
    /// The most-visited move; ties break toward the first encountered.
    /// `None` when the root had no legal moves.
    pub fn best_move(&self) -> Option<Move> {
        let mut best: Option<(Move, u32)> = None;
        for &(mv, visits) in &self.visits {
            if best.map_or(true, |(_, most)| visits > most) {
                best = Some((mv, visits));
            }
        }
        best.map(|(mv, _)| mv)
    }
}

/// Runs a Monte-Carlo tree search from `position`.
///
/// Completes `iterations` leaf evaluations, sequentially or - when both
/// batch callbacks are configured - with `batch_size` coalesced
/// workers. The search is deterministic given the position, iteration
/// count, seed, batch size, and callback outputs.
pub fn run_mcts(
    position: &Position,
    iterations: u32,
    seed: u64,
    options: &MctsOptions,
) -> MctsResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = SearchTree::new();

    debug!(
        iterations,
        seed,
        batched = options.batched(),
        "mcts search starting"
    );

    if iterations > 0 {
        if options.batched() {
            run_batched(position, iterations, options, &mut tree, &mut rng);
        } else {
            run_sequential(position, iterations, options, &mut tree, &mut rng);
        }
    }

    let root = tree.node(SearchTree::ROOT);
    let visits: Vec<(Move, u32)> = root
        .children
        .iter()
        .filter_map(|&child| {
            let node = tree.node(child);
            node.mv.map(|mv| (mv, node.visits))
        })
        .collect();
    let root_value = if root.visits > 0 {
        root.value_sum / root.visits as f64
    } else {
        0.0
    };

    debug!(root_visits = root.visits, root_value, "mcts search finished");

    MctsResult {
        visits,
        root_value,
        root_visits: root.visits,
    }
}

/// Convenience wrapper: search and return the most-visited root move.
pub fn best_move(
    position: &Position,
    iterations: u32,
    seed: u64,
    options: &MctsOptions,
) -> Option<Move> {
    run_mcts(position, iterations, seed, options).best_move()
}

fn run_sequential(
    root_position: &Position,
    iterations: u32,
    options: &MctsOptions,
    tree: &mut SearchTree,
    rng: &mut StdRng,
) {
    let root_white = root_position.white_to_move();

    for _ in 0..iterations {
        let mut position = root_position.clone();
        let mut node = SearchTree::ROOT;

        loop {
            if tree.has_children(node) {
                match tree.select_child(node, options.c_puct) {
                    Some(child) => {
                        position.make(tree.move_of(child));
                        node = child;
                    }
                    None => break,
                }
                continue;
            }

            let moves = legal_moves(&position);
            if moves.is_empty() {
                let value = result_value(terminal_result(&position), root_white);
                tree.backpropagate(node, value, false);
                break;
            }

            let raw = options.prior_fn.as_ref().map(|f| f(&position, &moves));
            let mut priors = normalized_priors(raw, moves.len());
            if node == SearchTree::ROOT {
                mix_root_noise(&mut priors, options, rng);
            }
            for (mv, prior) in moves.iter().zip(&priors) {
                tree.add_child(node, *mv, *prior);
            }

            let child = match tree.select_child(node, options.c_puct) {
                Some(child) => child,
                None => break,
            };
            position.make(tree.move_of(child));

            let value = match &options.value_fn {
                Some(f) => sanitize_value(f(&position)),
                None => result_value(random_playout(position, rng), root_white),
            };
            tree.backpropagate(child, value, true);
            break;
        }
    }
}

/// Result of a position that has no legal moves.
pub(crate) fn terminal_result(position: &Position) -> GameResult {
    if is_king_attacked(position, position.side_to_move()) {
        if position.white_to_move() {
            GameResult::BlackWins
        } else {
            GameResult::WhiteWins
        }
    } else {
        GameResult::Draw
    }
}

/// Maps a game result to a value from the root player's perspective.
/// An unfinished (capped) playout counts as 0.
pub(crate) fn result_value(result: GameResult, root_white: bool) -> f64 {
    match result {
        GameResult::Draw | GameResult::Ongoing => 0.0,
        GameResult::WhiteWins => {
            if root_white {
                1.0
            } else {
                -1.0
            }
        }
        GameResult::BlackWins => {
            if root_white {
                -1.0
            } else {
                1.0
            }
        }
    }
}

/// Replaces a non-finite callback value with 0.
pub(crate) fn sanitize_value(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Turns raw callback priors into per-child probabilities.
///
/// Wrong-length or non-finite output falls back to uniform; otherwise
/// positive entries are normalised by their sum and nonpositive entries
/// get the uniform weight.
pub(crate) fn normalized_priors(raw: Option<Vec<f64>>, count: usize) -> Vec<f64> {
    let uniform = 1.0 / count as f64;
    let raw = match raw {
        Some(raw) if raw.len() == count && raw.iter().all(|p| p.is_finite()) => raw,
        _ => return vec![uniform; count],
    };
    let sum: f64 = raw.iter().filter(|&&p| p > 0.0).sum();
    if sum <= 0.0 {
        return vec![uniform; count];
    }
    raw.iter()
        .map(|&p| if p > 0.0 { p / sum } else { uniform })
        .collect()
}

/// Mixes Dirichlet noise into root priors when enabled.
pub(crate) fn mix_root_noise(priors: &mut [f64], options: &MctsOptions, rng: &mut StdRng) {
    if options.dirichlet_alpha <= 0.0 || priors.len() < 2 {
        return;
    }
    let Ok(dirichlet) = Dirichlet::new_with_size(options.dirichlet_alpha, priors.len()) else {
        return;
    };
    let noise = dirichlet.sample(rng);
    let epsilon = options.dirichlet_epsilon;
    for (prior, noise) in priors.iter_mut().zip(noise) {
        *prior = (1.0 - epsilon) * *prior + epsilon * noise;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priors_fall_back_to_uniform() {
        assert_eq!(normalized_priors(None, 4), vec![0.25; 4]);
        assert_eq!(normalized_priors(Some(vec![1.0, 2.0]), 4), vec![0.25; 4]);
        assert_eq!(
            normalized_priors(Some(vec![f64::NAN, 1.0, 1.0, 1.0]), 4),
            vec![0.25; 4]
        );
        assert_eq!(
            normalized_priors(Some(vec![0.0, -3.0, 0.0, 0.0]), 4),
            vec![0.25; 4]
        );
    }

    #[test]
    fn priors_normalise_positive_entries() {
        let priors = normalized_priors(Some(vec![1.0, 3.0]), 2);
        assert_eq!(priors, vec![0.25, 0.75]);

        // Negative entries are dropped from the sum and get uniform.
        let priors = normalized_priors(Some(vec![2.0, -1.0, 2.0, 0.0]), 4);
        assert_eq!(priors, vec![0.5, 0.25, 0.5, 0.25]);
    }

    #[test]
    fn values_are_sanitised() {
        assert_eq!(sanitize_value(0.5), 0.5);
        assert_eq!(sanitize_value(f64::NAN), 0.0);
        assert_eq!(sanitize_value(f64::INFINITY), 0.0);
    }

    #[test]
    fn result_values_follow_root_perspective() {
        assert_eq!(result_value(GameResult::WhiteWins, true), 1.0);
        assert_eq!(result_value(GameResult::WhiteWins, false), -1.0);
        assert_eq!(result_value(GameResult::BlackWins, true), -1.0);
        assert_eq!(result_value(GameResult::Draw, true), 0.0);
        assert_eq!(result_value(GameResult::Ongoing, false), 0.0);
    }

    #[test]
    fn noise_preserves_probability_mass() {
        let mut options = MctsOptions::default();
        options.dirichlet_alpha = 0.3;
        options.dirichlet_epsilon = 0.25;
        let mut rng = StdRng::seed_from_u64(5);
        let mut priors = vec![0.25; 4];
        mix_root_noise(&mut priors, &options, &mut rng);
        let total: f64 = priors.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(priors.iter().all(|&p| p >= 0.0));
        // With noise enabled the priors are no longer exactly uniform.
        assert!(priors.iter().any(|&p| (p - 0.25).abs() > 1e-6));
    }

    #[test]
    fn noise_disabled_leaves_priors_untouched() {
        let options = MctsOptions::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut priors = vec![0.5, 0.5];
        mix_root_noise(&mut priors, &options, &mut rng);
        assert_eq!(priors, vec![0.5, 0.5]);
    }
}
