//! Cluster pays

use crate::board::{Board, Position};
use crate::symbols::SymbolId;

use super::{EvalContext, WinEvaluator, WinKind, WinMeta, WinRecord, WinSummary};

/// Pays maximal 4-connected regions of identical symbols
#[derive(Debug, Clone)]
pub struct ClusterEvaluator {
    pub min_cluster: u32,
}

impl ClusterEvaluator {
    pub fn new(min_cluster: u32) -> Self {
        Self { min_cluster }
    }
}

/// Find every maximal region of identical symbols with at least `min_size`
/// cells.
///
/// Seeds are visited row by row, left to right, so the output order only
/// depends on the board. Positions inside a region are sorted.
pub fn find_clusters(board: &Board, min_size: usize) -> Vec<(SymbolId, Vec<Position>)> {
    let mut visited: Vec<Vec<bool>> = (0..board.num_reels())
        .map(|reel| vec![false; board.rows(reel)])
        .collect();
    let mut clusters = Vec::new();
    let mut stack = Vec::new();

    for row in 0..board.max_rows() {
        for reel in 0..board.num_reels() {
            let seed = Position::new(reel, row);
            let Some(symbol) = board.get(seed) else {
                continue;
            };
            if visited[reel][row] {
                continue;
            }
            let id = symbol.id;
            let mut region = Vec::new();
            visited[reel][row] = true;
            stack.push(seed);

            while let Some(pos) = stack.pop() {
                region.push(pos);
                for next in board.neighbours(pos) {
                    if visited[next.reel][next.row] {
                        continue;
                    }
                    if board.get(next).is_some_and(|s| s.id == id) {
                        visited[next.reel][next.row] = true;
                        stack.push(next);
                    }
                }
            }

            if region.len() >= min_size {
                region.sort();
                clusters.push((id, region));
            }
        }
    }
    clusters
}

impl WinEvaluator for ClusterEvaluator {
    fn evaluate(&self, board: &Board, ctx: &EvalContext<'_>) -> WinSummary {
        let mut summary = WinSummary::default();
        for (id, positions) in find_clusters(board, self.min_cluster as usize) {
            let count = positions.len() as u32;
            let Some(pay) = ctx.paytable.pay(id, count) else {
                continue;
            };
            // Multipliers inside a cluster add up
            let summed: f64 = positions
                .iter()
                .filter_map(|p| board.get(*p).and_then(|s| s.multiplier()))
                .sum();
            let symbol_multiplier = if summed > 0.0 { summed } else { 1.0 };
            let win = pay * symbol_multiplier * ctx.global_multiplier;
            summary.push(WinRecord {
                kind: WinKind::Cluster,
                symbol: ctx.symbols.name(id).to_string(),
                count,
                win,
                positions,
                meta: WinMeta {
                    global_multiplier: ctx.global_multiplier,
                    symbol_multiplier,
                    base_win: pay,
                    line_index: None,
                },
            });
        }
        summary
    }
}
