//! Batched search loop.
//!
//! Simulates `batch_size` workers inside one thread. Workers walk the
//! tree under virtual loss so concurrent selections diverge, park at
//! unexpanded leaves, and are evaluated together: leaves are grouped by
//! FEN so each unique position is sent to the batch callbacks exactly
//! once per round.

use crate::options::MctsOptions;
use crate::search::{
    mix_root_noise, normalized_priors, result_value, sanitize_value, terminal_result,
};
use crate::tree::SearchTree;
use perch_core::Move;
use perch_engine::{legal_moves, Position};
use rand::rngs::StdRng;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerStatus {
    /// Walking the tree, or freshly reset to the root.
    Running,
    /// Parked at an unexpanded, non-terminal leaf.
    NeedsEvaluation,
    /// Parked at a position with no legal moves.
    Terminal,
}

struct Worker {
    position: Position,
    node: usize,
    /// Nodes this worker holds a virtual visit on.
    path: Vec<usize>,
    status: WorkerStatus,
    /// Legal moves of the parked leaf.
    pending_moves: Vec<Move>,
}

impl Worker {
    fn at_root(root: &Position) -> Self {
        Worker {
            position: root.clone(),
            node: SearchTree::ROOT,
            path: Vec::new(),
            status: WorkerStatus::Running,
            pending_moves: Vec::new(),
        }
    }

    fn reset(&mut self, root: &Position) {
        self.position = root.clone();
        self.node = SearchTree::ROOT;
        self.path.clear();
        self.status = WorkerStatus::Running;
        self.pending_moves.clear();
    }
}

pub(crate) fn run_batched(
    root_position: &Position,
    iterations: u32,
    options: &MctsOptions,
    tree: &mut SearchTree,
    rng: &mut StdRng,
) {
    let (Some(batch_prior_fn), Some(batch_value_fn)) =
        (&options.batch_prior_fn, &options.batch_value_fn)
    else {
        return;
    };

    let root_white = root_position.white_to_move();
    let c_puct = options.c_puct;
    let mut workers: Vec<Worker> = (0..options.worker_count())
        .map(|_| Worker::at_root(root_position))
        .collect();
    let mut completed: u32 = 0;

    while completed < iterations {
        // Walk running workers to an unexpanded leaf. Terminal leaves
        // backpropagate their exact result immediately and the worker
        // restarts from the root.
        for worker in &mut workers {
            if worker.status != WorkerStatus::Running {
                continue;
            }
            while tree.has_children(worker.node) {
                let Some(child) = tree.select_child(worker.node, c_puct) else {
                    break;
                };
                tree.add_virtual_loss(child);
                worker.path.push(child);
                worker.position.make(tree.move_of(child));
                worker.node = child;
            }
            worker.pending_moves = legal_moves(&worker.position);
            worker.status = if worker.pending_moves.is_empty() {
                WorkerStatus::Terminal
            } else {
                WorkerStatus::NeedsEvaluation
            };

            if worker.status == WorkerStatus::Terminal {
                let value = result_value(terminal_result(&worker.position), root_white);
                tree.backpropagate(worker.node, value, false);
                for &node in &worker.path {
                    tree.remove_virtual_loss(node);
                }
                completed += 1;
                worker.reset(root_position);
                if completed >= iterations {
                    return;
                }
            }
        }

        // Coalesce parked workers by position.
        let mut fens: Vec<String> = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (index, worker) in workers.iter().enumerate() {
            if worker.status != WorkerStatus::NeedsEvaluation {
                continue;
            }
            let fen = worker.position.to_fen();
            match fens.iter().position(|known| *known == fen) {
                Some(group) => groups[group].push(index),
                None => {
                    fens.push(fen);
                    groups.push(vec![index]);
                }
            }
        }
        if fens.is_empty() {
            continue;
        }

        let uci_lists: Vec<Vec<String>> = groups
            .iter()
            .map(|group| {
                workers[group[0]]
                    .pending_moves
                    .iter()
                    .map(Move::to_uci)
                    .collect()
            })
            .collect();

        trace!(
            unique = fens.len(),
            parked = groups.iter().map(Vec::len).sum::<usize>(),
            "evaluating coalesced batch"
        );

        let prior_rows = batch_prior_fn(&fens, &uci_lists);
        let value_rows = batch_value_fn(&fens);
        let priors_usable = prior_rows.len() == fens.len();
        let values_usable = value_rows.len() == fens.len();

        for (group_index, group) in groups.iter().enumerate() {
            let value = if values_usable {
                sanitize_value(value_rows[group_index])
            } else {
                0.0
            };
            for &worker_index in group {
                let worker = &mut workers[worker_index];

                // Another worker parked on the same node may already
                // have expanded it.
                if !tree.has_children(worker.node) {
                    let raw = if priors_usable {
                        Some(prior_rows[group_index].clone())
                    } else {
                        None
                    };
                    let mut priors = normalized_priors(raw, worker.pending_moves.len());
                    if worker.node == SearchTree::ROOT {
                        mix_root_noise(&mut priors, options, rng);
                    }
                    for (mv, prior) in worker.pending_moves.iter().zip(&priors) {
                        tree.add_child(worker.node, *mv, *prior);
                    }
                }

                tree.backpropagate(worker.node, value, true);
                for &node in &worker.path {
                    tree.remove_virtual_loss(node);
                }
                worker.path.clear();
                completed += 1;

                // Seed the next batch one ply deeper.
                if let Some(child) = tree.select_child(worker.node, c_puct) {
                    tree.add_virtual_loss(child);
                    worker.path.push(child);
                    worker.position.make(tree.move_of(child));
                    worker.node = child;
                }
                worker.status = WorkerStatus::Running;
                worker.pending_moves.clear();

                if completed >= iterations {
                    return;
                }
            }
        }
    }
}
