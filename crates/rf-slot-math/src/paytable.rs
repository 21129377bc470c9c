//! Tiered paytables and payline definitions
//!
//! Paytables are authored as count ranges per symbol, e.g.
//! `{symbol: "H1", min: 7, max: 8, pay: 10.0}`, and expanded once into exact
//! `(symbol, count)` lookups so evaluators never search ranges at runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::error::ConfigError;
use crate::symbols::{SymbolId, SymbolTable};

/// One authored paytable tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayEntry {
    pub symbol: String,
    /// Smallest count (inclusive) paying this amount
    pub min: u32,
    /// Largest count (inclusive) paying this amount
    pub max: u32,
    /// Payout as a multiple of the bet
    pub pay: f64,
}

impl PayEntry {
    pub fn new(symbol: impl Into<String>, min: u32, max: u32, pay: f64) -> Self {
        Self {
            symbol: symbol.into(),
            min,
            max,
            pay,
        }
    }
}

/// Exact `(symbol, count) → pay` lookup
#[derive(Debug, Clone, Default)]
pub struct Paytable {
    pays: HashMap<(SymbolId, u32), f64>,
    /// Largest authored count per symbol; counts above it pay the top tier
    top_tier: HashMap<SymbolId, u32>,
}

impl Paytable {
    /// Expand range tiers into exact lookups, interning symbol names
    pub fn from_ranges(entries: &[PayEntry], symbols: &mut SymbolTable) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for entry in entries {
            if entry.min == 0 || entry.min > entry.max {
                return Err(ConfigError::Paytable(format!(
                    "symbol '{}': invalid range ({}, {})",
                    entry.symbol, entry.min, entry.max
                )));
            }
            if !entry.pay.is_finite() || entry.pay < 0.0 {
                return Err(ConfigError::Paytable(format!(
                    "symbol '{}': invalid pay {}",
                    entry.symbol, entry.pay
                )));
            }
            let id = symbols.intern(&entry.symbol);
            for count in entry.min..=entry.max {
                if table.pays.insert((id, count), entry.pay).is_some() {
                    return Err(ConfigError::Paytable(format!(
                        "symbol '{}': count {} covered by overlapping tiers",
                        entry.symbol, count
                    )));
                }
            }
            let top = table.top_tier.entry(id).or_insert(entry.max);
            *top = (*top).max(entry.max);
        }
        Ok(table)
    }

    /// Pay for an exact count; counts beyond the top tier pay the top tier
    pub fn pay(&self, symbol: SymbolId, count: u32) -> Option<f64> {
        if let Some(pay) = self.pays.get(&(symbol, count)) {
            return Some(*pay);
        }
        let top = *self.top_tier.get(&symbol)?;
        if count > top {
            self.pays.get(&(symbol, top)).copied()
        } else {
            None
        }
    }

    /// Symbols with at least one paying tier
    pub fn paying_symbols(&self) -> Vec<SymbolId> {
        let mut ids: Vec<SymbolId> = self.top_tier.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.pays.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLINES
// ═══════════════════════════════════════════════════════════════════════════════

/// A payline: one row index per reel, left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payline {
    pub index: usize,
    pub rows: Vec<usize>,
}

impl Payline {
    pub fn new(index: usize, rows: Vec<usize>) -> Self {
        Self { index, rows }
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(reel, &row)| Position::new(reel, row))
    }

    /// Check the line fits a grid with the given rows per reel
    pub fn validate(&self, num_rows: &[usize]) -> Result<(), ConfigError> {
        if self.rows.len() != num_rows.len() {
            return Err(ConfigError::Payline {
                index: self.index,
                reason: format!("{} positions for {} reels", self.rows.len(), num_rows.len()),
            });
        }
        for (reel, (&row, &height)) in self.rows.iter().zip(num_rows).enumerate() {
            if row >= height {
                return Err(ConfigError::Payline {
                    index: self.index,
                    reason: format!("row {row} outside reel {reel} (height {height})"),
                });
            }
        }
        Ok(())
    }
}
