//! Lookup tables
//!
//! A lookup table is the published form of a simulation batch: one row per
//! simulation, `id,weight,payout`, where payout is a multiple of the bet.
//! The optimizer only ever rewrites weights, so rows keep the original text
//! of their id and payout fields and the table keeps its line ending; a
//! rewritten file differs from the original only in the weight column.
//!
//! Segmented tables carry the per-simulation split of the payout into base
//! game and free game wins, keyed by the same ids, plus the criteria each
//! simulation was run for.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::error::{LutError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// Payout text as written for newly produced rows
pub fn format_payout(payout: f64) -> String {
    format!("{payout:.2}")
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOOKUP TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct LookupRow {
    pub id: u64,
    pub weight: u64,
    pub payout: f64,
    id_text: String,
    payout_text: String,
}

impl LookupRow {
    pub fn new(id: u64, weight: u64, payout: f64) -> Self {
        Self {
            id,
            weight,
            payout,
            id_text: id.to_string(),
            payout_text: format_payout(payout),
        }
    }

    pub fn is_paying(&self) -> bool {
        self.payout > 0.0
    }

    pub fn payout_text(&self) -> &str {
        &self.payout_text
    }

    fn parse(line: &str, line_no: usize) -> Result<Self> {
        let fault = |reason: String| LutError::Parse {
            line: line_no,
            reason,
        };
        let fields: Vec<&str> = line.split(',').collect();
        let [id_text, weight_text, payout_text] = fields.as_slice() else {
            return Err(fault(format!("expected 3 fields, found {}", fields.len())));
        };

        let id = id_text
            .trim()
            .parse::<u64>()
            .map_err(|e| fault(format!("id '{id_text}': {e}")))?;
        let weight = weight_text
            .trim()
            .parse::<u64>()
            .map_err(|e| fault(format!("weight '{weight_text}': {e}")))?;
        let payout = payout_text
            .trim()
            .parse::<f64>()
            .map_err(|e| fault(format!("payout '{payout_text}': {e}")))?;
        if !payout.is_finite() || payout < 0.0 {
            return Err(fault(format!("payout {payout} must be finite and non-negative")));
        }

        Ok(Self {
            id,
            weight,
            payout,
            id_text: (*id_text).to_string(),
            payout_text: (*payout_text).to_string(),
        })
    }
}

/// Rows of `(id, weight, payout)` in file order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LookupTable {
    rows: Vec<LookupRow>,
    line_ending: LineEnding,
    trailing_newline: bool,
}

impl LookupTable {
    pub fn from_rows(rows: impl IntoIterator<Item = (u64, u64, f64)>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|(id, weight, payout)| LookupRow::new(id, weight, payout))
                .collect(),
            line_ending: LineEnding::Lf,
            trailing_newline: true,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let rows = text
            .lines()
            .enumerate()
            .map(|(i, line)| LookupRow::parse(line, i + 1))
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Err(LutError::Empty);
        }
        Ok(Self {
            rows,
            line_ending: LineEnding::detect(text),
            trailing_newline: text.ends_with('\n'),
        })
    }

    pub fn format(&self) -> String {
        let eol = self.line_ending.as_str();
        let mut out = String::with_capacity(self.rows.len() * 16);
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                out.push_str(eol);
            }
            let _ = write!(out, "{},{},{}", row.id_text, row.weight, row.payout_text);
        }
        if self.trailing_newline && !self.rows.is_empty() {
            out.push_str(eol);
        }
        out
    }

    pub fn rows(&self) -> &[LookupRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn weights(&self) -> Vec<u64> {
        self.rows.iter().map(|r| r.weight).collect()
    }

    /// Replace every weight, keeping ids and payouts as they are
    pub fn set_weights(&mut self, weights: &[u64]) -> Result<()> {
        if weights.len() != self.rows.len() {
            return Err(LutError::LengthMismatch {
                left: self.rows.len(),
                right: weights.len(),
            });
        }
        for (row, &weight) in self.rows.iter_mut().zip(weights) {
            row.weight = weight;
        }
        Ok(())
    }

    /// Copy of this table carrying `weights`
    pub fn with_weights(&self, weights: &[u64]) -> Result<Self> {
        let mut table = self.clone();
        table.set_weights(weights)?;
        Ok(table)
    }

    pub fn total_weight(&self) -> u64 {
        self.rows.iter().map(|r| r.weight).sum()
    }

    /// Σ weight × payout
    pub fn weighted_payout(&self) -> f64 {
        self.rows.iter().map(|r| r.weight as f64 * r.payout).sum()
    }

    /// Expected payout per unit of `cost`
    pub fn rtp(&self, cost: f64) -> Result<f64> {
        let total = self.total_weight();
        if total == 0 {
            return Err(LutError::ZeroWeight);
        }
        Ok(self.weighted_payout() / total as f64 / cost)
    }

    /// Probability of a paying outcome
    pub fn hit_rate(&self) -> Result<f64> {
        let total = self.total_weight();
        if total == 0 {
            return Err(LutError::ZeroWeight);
        }
        let paying: u64 = self.rows.iter().filter(|r| r.is_paying()).map(|r| r.weight).sum();
        Ok(paying as f64 / total as f64)
    }

    pub fn max_payout(&self) -> f64 {
        self.rows.iter().map(|r| r.payout).fold(0.0, f64::max)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEGMENTED TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedRow {
    pub id: u64,
    pub criteria: String,
    pub base_game_win: f64,
    pub free_game_win: f64,
}

/// Rows of `(id, criteria, base_game_win, free_game_win)`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentedTable {
    rows: Vec<SegmentedRow>,
}

impl SegmentedTable {
    pub fn new(rows: Vec<SegmentedRow>) -> Self {
        Self { rows }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let fault = |reason: String| LutError::Parse { line: i + 1, reason };
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let [id, criteria, base, free] = fields.as_slice() else {
                return Err(fault(format!("expected 4 fields, found {}", fields.len())));
            };
            let parse_win = |text: &str| {
                text.parse::<f64>()
                    .map_err(|e| fault(format!("win '{text}': {e}")))
            };
            rows.push(SegmentedRow {
                id: id.parse().map_err(|e| fault(format!("id '{id}': {e}")))?,
                criteria: (*criteria).to_string(),
                base_game_win: parse_win(base)?,
                free_game_win: parse_win(free)?,
            });
        }
        Ok(Self { rows })
    }

    pub fn format(&self) -> String {
        let mut out = String::with_capacity(self.rows.len() * 24);
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                row.id,
                row.criteria,
                format_payout(row.base_game_win),
                format_payout(row.free_game_win)
            );
        }
        out
    }

    pub fn rows(&self) -> &[SegmentedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn criteria(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.criteria.as_str()).collect()
    }

    /// Simulation id → criteria
    pub fn criteria_by_id(&self) -> BTreeMap<u64, &str> {
        self.rows
            .iter()
            .map(|r| (r.id, r.criteria.as_str()))
            .collect()
    }
}
