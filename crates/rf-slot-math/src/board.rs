//! Board model
//!
//! A board is a column-major grid of [`Symbol`]s addressed by `(reel, row)`.
//! Reels may have different heights. Alongside the visible cells a board
//! records where each reel stopped, optional padding symbols above and below
//! the window, the anticipation sequence and an index of special-symbol
//! positions per category.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::symbols::{Symbol, SymbolId, SymbolTable};

/// Cell address on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub reel: usize,
    pub row: usize,
}

impl Position {
    pub const fn new(reel: usize, row: usize) -> Self {
        Self { reel, row }
    }
}

/// Symbols read just outside the visible window
#[derive(Debug, Clone, PartialEq)]
pub struct Padding {
    /// One symbol per reel, read above row 0
    pub top: Vec<Symbol>,
    /// One symbol per reel, read below the last row
    pub bottom: Vec<Symbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    reels: Vec<Vec<Symbol>>,
    /// Strip set the board was read from
    pub strip_id: String,
    /// Stop index per reel (top visible row)
    pub stops: Vec<usize>,
    pub padding: Option<Padding>,
    /// Strip index following the bottom padding symbol, per reel
    pub padding_positions: Vec<usize>,
    /// Near-miss counter per reel, non-decreasing left to right
    pub anticipation: Vec<u32>,
    special_positions: BTreeMap<String, Vec<Position>>,
}

impl Board {
    pub fn new(reels: Vec<Vec<Symbol>>) -> Self {
        let num_reels = reels.len();
        Self {
            reels,
            strip_id: String::new(),
            stops: vec![0; num_reels],
            padding: None,
            padding_positions: Vec::new(),
            anticipation: vec![0; num_reels],
            special_positions: BTreeMap::new(),
        }
    }

    /// Build a board of plain symbols from ids, mainly for fixtures
    pub fn from_ids(columns: &[Vec<SymbolId>], symbols: &SymbolTable) -> Self {
        let reels = columns
            .iter()
            .map(|col| {
                col.iter()
                    .map(|&id| Symbol::new(id, symbols.is_special(id)))
                    .collect()
            })
            .collect();
        let mut board = Self::new(reels);
        board.refresh_special_positions(symbols);
        board
    }

    pub fn num_reels(&self) -> usize {
        self.reels.len()
    }

    pub fn rows(&self, reel: usize) -> usize {
        self.reels.get(reel).map_or(0, Vec::len)
    }

    pub fn max_rows(&self) -> usize {
        self.reels.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn reel(&self, reel: usize) -> &[Symbol] {
        &self.reels[reel]
    }

    pub fn get(&self, pos: Position) -> Option<&Symbol> {
        self.reels.get(pos.reel)?.get(pos.row)
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Symbol> {
        self.reels.get_mut(pos.reel)?.get_mut(pos.row)
    }

    /// Replace the symbol at `pos`. Callers must refresh special positions
    /// afterwards if the category membership changed.
    pub fn replace(&mut self, pos: Position, symbol: Symbol) {
        if let Some(cell) = self.get_mut(pos) {
            *cell = symbol;
        }
    }

    /// All positions, reel by reel
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.reels
            .iter()
            .enumerate()
            .flat_map(|(reel, col)| (0..col.len()).map(move |row| Position::new(reel, row)))
    }

    /// Neighbours sharing an edge with `pos`
    pub fn neighbours(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        let up = pos.row.checked_sub(1).map(|row| Position::new(pos.reel, row));
        let down = Some(Position::new(pos.reel, pos.row + 1));
        let left = pos.reel.checked_sub(1).map(|reel| Position::new(reel, pos.row));
        let right = Some(Position::new(pos.reel + 1, pos.row));
        [up, down, left, right]
            .into_iter()
            .flatten()
            .filter(move |p| self.get(*p).is_some())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Special-symbol index
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the category → positions index from the current cells
    pub fn refresh_special_positions(&mut self, symbols: &SymbolTable) {
        let mut index: BTreeMap<String, Vec<Position>> = BTreeMap::new();
        for pos in self.positions().collect::<Vec<_>>() {
            let id = self.reels[pos.reel][pos.row].id;
            for category in &symbols.def(id).categories {
                index.entry(category.clone()).or_default().push(pos);
            }
        }
        self.special_positions = index;
    }

    /// Positions recorded under a special category
    pub fn special_positions(&self, category: &str) -> &[Position] {
        self.special_positions
            .get(category)
            .map_or(&[], Vec::as_slice)
    }

    pub fn count_category(&self, category: &str) -> usize {
        self.special_positions(category).len()
    }

    pub fn count_symbol(&self, id: SymbolId) -> usize {
        self.reels.iter().flatten().filter(|s| s.id == id).count()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Anticipation
    // ─────────────────────────────────────────────────────────────────────────

    /// Derive the anticipation sequence for a target category.
    ///
    /// The first reel where the running count of `category` reaches
    /// `threshold` arms anticipation; every reel to its right then gets
    /// 1, 2, 3, ... A threshold of zero disables anticipation.
    pub fn apply_anticipation(&mut self, category: &str, threshold: u32) -> Result<()> {
        let num_reels = self.num_reels();
        let mut anticipation = vec![0u32; num_reels];

        if threshold > 0 {
            let mut running = 0u32;
            let mut armed_after = None;
            for reel in 0..num_reels {
                running += self
                    .special_positions(category)
                    .iter()
                    .filter(|p| p.reel == reel)
                    .count() as u32;
                if running >= threshold {
                    armed_after = Some(reel + 1);
                    break;
                }
            }
            if let Some(first) = armed_after {
                for (count, slot) in anticipation.iter_mut().skip(first).enumerate() {
                    *slot = count as u32 + 1;
                }
            }
        }

        check_anticipation(&anticipation)?;
        self.anticipation = anticipation;
        Ok(())
    }

    /// Symbol names per reel, for events and debugging
    pub fn names(&self, symbols: &SymbolTable) -> Vec<Vec<String>> {
        self.reels
            .iter()
            .map(|col| col.iter().map(|s| symbols.name(s.id).to_string()).collect())
            .collect()
    }

    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> BoardDisplay<'a> {
        BoardDisplay {
            board: self,
            symbols,
        }
    }
}

/// Reject any anticipation sequence that decreases from one reel to the next
pub fn check_anticipation(anticipation: &[u32]) -> Result<()> {
    for (reel, pair) in anticipation.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(SlotError::AnticipationNotMonotonic {
                reel,
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

/// Row-by-row text rendering of a board
pub struct BoardDisplay<'a> {
    board: &'a Board,
    symbols: &'a SymbolTable,
}

impl fmt::Display for BoardDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.board.max_rows() {
            let cells: Vec<String> = (0..self.board.num_reels())
                .map(|reel| match self.board.get(Position::new(reel, row)) {
                    Some(sym) => format!("{:>3}", self.symbols.name(sym.id)),
                    None => "   ".to_string(),
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}
