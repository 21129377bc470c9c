//! Payline evaluation with wild substitution

use crate::board::{Board, Position};
use crate::paytable::Payline;
use crate::symbols::SymbolId;

use super::{
    EvalContext, WinEvaluator, WinKind, WinMeta, WinRecord, WinSummary, is_wild, product_multiplier,
};

/// Pays the longest run from reel 0 along each payline
#[derive(Debug, Clone)]
pub struct LinesEvaluator {
    paylines: Vec<Payline>,
    wilds: Vec<SymbolId>,
}

impl LinesEvaluator {
    pub fn new(paylines: Vec<Payline>, wilds: Vec<SymbolId>) -> Self {
        Self { paylines, wilds }
    }

    /// Best `(symbol, run length, pay)` for one line, if it pays
    fn best_run(&self, line: &[SymbolId], ctx: &EvalContext<'_>) -> Option<(SymbolId, u32, f64)> {
        let first = *line.first()?;
        // First non-wild decides what the wilds stand in for
        let base = line
            .iter()
            .copied()
            .find(|id| !is_wild(*id, &self.wilds))
            .unwrap_or(first);

        let run = line
            .iter()
            .take_while(|id| **id == base || is_wild(**id, &self.wilds))
            .count() as u32;
        let base_pay = ctx.paytable.pay(base, run).map(|pay| (base, run, pay));

        // A leading run of wilds may pay more on its own
        let wild_pay = if is_wild(first, &self.wilds) {
            let wild_run = line.iter().take_while(|id| **id == first).count() as u32;
            ctx.paytable.pay(first, wild_run).map(|pay| (first, wild_run, pay))
        } else {
            None
        };

        match (base_pay, wild_pay) {
            (Some(b), Some(w)) => Some(if w.2 > b.2 { w } else { b }),
            (b, w) => b.or(w),
        }
    }
}

impl WinEvaluator for LinesEvaluator {
    fn evaluate(&self, board: &Board, ctx: &EvalContext<'_>) -> WinSummary {
        let mut summary = WinSummary::default();
        for line in &self.paylines {
            let cells: Vec<(Position, SymbolId)> = line
                .positions()
                .filter_map(|p| board.get(p).map(|s| (p, s.id)))
                .collect();
            if cells.len() != line.rows.len() {
                continue;
            }
            let ids: Vec<SymbolId> = cells.iter().map(|(_, id)| *id).collect();
            let Some((symbol, count, pay)) = self.best_run(&ids, ctx) else {
                continue;
            };
            let positions: Vec<Position> =
                cells.iter().take(count as usize).map(|(p, _)| *p).collect();
            let symbol_multiplier = product_multiplier(board, &positions);
            let win = pay * symbol_multiplier * ctx.global_multiplier;
            summary.push(WinRecord {
                kind: WinKind::Line,
                symbol: ctx.symbols.name(symbol).to_string(),
                count,
                win,
                positions,
                meta: WinMeta {
                    global_multiplier: ctx.global_multiplier,
                    symbol_multiplier,
                    base_win: pay,
                    line_index: Some(line.index),
                },
            });
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paytable::{PayEntry, Paytable};
    use crate::symbols::SymbolTable;
    use approx::assert_relative_eq;

    struct Fixture {
        symbols: SymbolTable,
        paytable: Paytable,
        evaluator: LinesEvaluator,
    }

    fn fixture() -> Fixture {
        let mut symbols = SymbolTable::new();
        let paytable = Paytable::from_ranges(
            &[
                PayEntry::new("H1", 3, 3, 2.0),
                PayEntry::new("H1", 4, 4, 5.0),
                PayEntry::new("H1", 5, 5, 20.0),
                PayEntry::new("W", 5, 5, 50.0),
                PayEntry::new("L1", 3, 5, 0.5),
            ],
            &mut symbols,
        )
        .unwrap();
        let wild = symbols.add_category("W", "wild");
        let evaluator = LinesEvaluator::new(vec![Payline::new(0, vec![0; 5])], vec![wild]);
        Fixture {
            symbols,
            paytable,
            evaluator,
        }
    }

    fn single_row(names: &[&str], symbols: &SymbolTable) -> Board {
        let columns: Vec<Vec<SymbolId>> = names
            .iter()
            .map(|n| vec![symbols.id(n).unwrap()])
            .collect();
        Board::from_ids(&columns, symbols)
    }

    fn ctx(f: &Fixture, global: f64) -> EvalContext<'_> {
        EvalContext {
            symbols: &f.symbols,
            paytable: &f.paytable,
            global_multiplier: global,
        }
    }

    #[test]
    fn test_wild_substitutes_in_run() {
        let f = fixture();
        let board = single_row(&["H1", "W", "H1", "H1", "L1"], &f.symbols);
        let summary = f.evaluator.evaluate(&board, &ctx(&f, 1.0));
        assert_eq!(summary.wins.len(), 1);
        assert_eq!(summary.wins[0].symbol, "H1");
        assert_eq!(summary.wins[0].count, 4);
        assert_relative_eq!(summary.total_win, 5.0);
    }

    #[test]
    fn test_leading_wilds_take_first_symbol() {
        let f = fixture();
        let board = single_row(&["W", "W", "H1", "L1", "L1"], &f.symbols);
        let summary = f.evaluator.evaluate(&board, &ctx(&f, 2.0));
        assert_eq!(summary.wins[0].count, 3);
        assert_relative_eq!(summary.total_win, 2.0 * 2.0);
    }

    #[test]
    fn test_pure_wild_line_pays_wild_tier() {
        let f = fixture();
        let board = single_row(&["W"; 5], &f.symbols);
        let summary = f.evaluator.evaluate(&board, &ctx(&f, 1.0));
        assert_eq!(summary.wins[0].symbol, "W");
        assert_relative_eq!(summary.total_win, 50.0);
    }

    #[test]
    fn test_wild_multipliers_multiply() {
        let f = fixture();
        let mut board = single_row(&["H1", "W", "W", "H1", "H1"], &f.symbols);
        board.get_mut(Position::new(1, 0)).unwrap().set_multiplier(2.0);
        board.get_mut(Position::new(2, 0)).unwrap().set_multiplier(3.0);
        let summary = f.evaluator.evaluate(&board, &ctx(&f, 1.0));
        assert_relative_eq!(summary.wins[0].meta.symbol_multiplier, 6.0);
        assert_relative_eq!(summary.total_win, 20.0 * 6.0);
    }

    #[test]
    fn test_short_run_does_not_pay() {
        let f = fixture();
        let board = single_row(&["H1", "H1", "L1", "H1", "H1"], &f.symbols);
        assert!(f.evaluator.evaluate(&board, &ctx(&f, 1.0)).is_empty());
    }
}
