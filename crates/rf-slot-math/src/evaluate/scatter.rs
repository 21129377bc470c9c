//! Scatter ("pay anywhere") evaluation

use crate::board::{Board, Position};

use super::{EvalContext, WinEvaluator, WinKind, WinMeta, WinRecord, WinSummary};

/// Pays each symbol by how many times it appears anywhere on the board
#[derive(Debug, Clone, Default)]
pub struct ScatterEvaluator;

impl ScatterEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl WinEvaluator for ScatterEvaluator {
    fn evaluate(&self, board: &Board, ctx: &EvalContext<'_>) -> WinSummary {
        let mut summary = WinSummary::default();
        for id in ctx.paytable.paying_symbols() {
            let positions: Vec<Position> = board
                .positions()
                .filter(|p| board.get(*p).is_some_and(|s| s.id == id))
                .collect();
            if positions.is_empty() {
                continue;
            }
            let count = positions.len() as u32;
            let Some(pay) = ctx.paytable.pay(id, count) else {
                continue;
            };
            summary.push(WinRecord {
                kind: WinKind::Scatter,
                symbol: ctx.symbols.name(id).to_string(),
                count,
                win: pay * ctx.global_multiplier,
                positions,
                meta: WinMeta {
                    global_multiplier: ctx.global_multiplier,
                    symbol_multiplier: 1.0,
                    base_win: pay,
                    line_index: None,
                },
            });
        }
        summary
    }
}
