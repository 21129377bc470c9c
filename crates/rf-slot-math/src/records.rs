//! Force records
//!
//! Flat key/value descriptors of what a round contained, such as
//! `{kind: 4, symbol: scatter, gametype: basegame}`. The orchestrator
//! indexes them by simulation id so lookup-table tooling can find every
//! round that showed a given feature.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GameType;
use crate::evaluate::{WinKind, WinSummary};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForceRecord(BTreeMap<String, String>);

impl ForceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// Free spin trigger or retrigger by `count` symbols of `category`
    pub fn trigger(count: u32, category: &str, game_type: GameType) -> Self {
        Self::new()
            .with("kind", count)
            .with("symbol", category)
            .with("gametype", game_type)
    }

    /// Scatter pays itemized per symbol, bombs summarized per board
    pub fn from_wins(summary: &WinSummary, game_type: GameType) -> Vec<Self> {
        let mut records: Vec<Self> = summary
            .wins
            .iter()
            .filter(|w| w.kind == WinKind::Scatter)
            .map(|w| {
                Self::new()
                    .with("kind", w.count)
                    .with("symbol", &w.symbol)
                    .with("gametype", game_type)
            })
            .collect();

        let bomb_values: Vec<f64> = summary
            .wins
            .iter()
            .filter(|w| w.kind == WinKind::Bomb)
            .map(|w| w.meta.symbol_multiplier)
            .collect();
        if !bomb_values.is_empty() {
            let min = bomb_values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = bomb_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            records.push(
                Self::new()
                    .with("bombs", bomb_values.len())
                    .with("min_value", min)
                    .with("max_value", max)
                    .with("gametype", game_type),
            );
        }
        records
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Every `(key, value)` pair of `search` is present
    pub fn matches<'a>(&self, search: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
        search.into_iter().all(|(k, v)| self.get(k) == Some(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
