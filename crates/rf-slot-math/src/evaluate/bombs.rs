//! Bomb pays: each bomb pays `value × prize` independent of other symbols

use crate::board::Board;

use super::{EvalContext, WinEvaluator, WinKind, WinMeta, WinRecord, WinSummary};

#[derive(Debug, Clone)]
pub struct BombEvaluator {
    category: String,
}

impl BombEvaluator {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
        }
    }
}

impl WinEvaluator for BombEvaluator {
    fn evaluate(&self, board: &Board, ctx: &EvalContext<'_>) -> WinSummary {
        let mut summary = WinSummary::default();
        for &pos in board.special_positions(&self.category) {
            // Bombs that lost their value assignment pay nothing
            let Some(symbol) = board.get(pos) else {
                continue;
            };
            let Some((value, prize)) = symbol.bomb() else {
                continue;
            };
            let base_win = value * prize;
            summary.push(WinRecord {
                kind: WinKind::Bomb,
                symbol: ctx.symbols.name(symbol.id).to_string(),
                count: 1,
                win: base_win * ctx.global_multiplier,
                positions: vec![pos],
                meta: WinMeta {
                    global_multiplier: ctx.global_multiplier,
                    symbol_multiplier: value,
                    base_win,
                    line_index: None,
                },
            });
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use crate::paytable::Paytable;
    use crate::symbols::{SymbolPayload, SymbolTable};
    use approx::assert_relative_eq;

    #[test]
    fn test_bombs_pay_value_times_prize() {
        let mut symbols = SymbolTable::new();
        let l1 = symbols.intern("L1");
        let b = symbols.add_category("B", "bomb");
        let mut board = Board::from_ids(&[vec![b, l1], vec![l1, b], vec![b, l1]], &symbols);
        board.get_mut(Position::new(0, 0)).unwrap().attributes.payload =
            Some(SymbolPayload::Bomb { value: 5.0, prize: 2.0 });
        board.get_mut(Position::new(1, 1)).unwrap().attributes.payload =
            Some(SymbolPayload::Bomb { value: 10.0, prize: 2.0 });
        // (2, 0) has no value: a failed assignment, silently skipped

        let paytable = Paytable::default();
        let ctx = EvalContext {
            symbols: &symbols,
            paytable: &paytable,
            global_multiplier: 1.5,
        };
        let summary = BombEvaluator::new("bomb").evaluate(&board, &ctx);
        assert_eq!(summary.wins.len(), 2);
        assert_relative_eq!(summary.total_win, (10.0 + 20.0) * 1.5);
    }
}
