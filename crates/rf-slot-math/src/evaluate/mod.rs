//! Win evaluators
//!
//! Interchangeable strategies that turn a [`Board`] into itemized
//! [`WinRecord`]s. A game lists one or more in its configuration; their
//! summaries are added together each spin.
//!
//! ## Strategies
//!
//! - **Cluster**: 4-directional flood fill over identical symbols
//! - **Lines**: left-to-right runs along configured paylines with wilds
//! - **Scatter**: board-wide count per symbol, position independent
//! - **Bombs**: every landed bomb pays its value times its prize
//!
//! Every strategy applies the round's global multiplier uniformly.

mod bombs;
mod cluster;
mod lines;
mod scatter;

pub use bombs::BombEvaluator;
pub use cluster::{ClusterEvaluator, find_clusters};
pub use lines::LinesEvaluator;
pub use scatter::ScatterEvaluator;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::config::{GameConfig, WILD};
use crate::error::ConfigError;
use crate::paytable::Paytable;
use crate::symbols::{SymbolId, SymbolTable};

// ═══════════════════════════════════════════════════════════════════════════════
// WIN RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Which strategy produced a win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinKind {
    Cluster,
    Line,
    Scatter,
    Bomb,
}

/// Multiplier context of a single win
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinMeta {
    pub global_multiplier: f64,
    /// Combined positional multiplier of the symbols involved (1.0 if none)
    pub symbol_multiplier: f64,
    /// Win before any multiplier
    pub base_win: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
}

/// One itemized win
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRecord {
    pub kind: WinKind,
    pub symbol: String,
    /// Cluster size, run length or board count
    pub count: u32,
    pub win: f64,
    pub positions: Vec<Position>,
    pub meta: WinMeta,
}

/// All wins of one board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinSummary {
    pub total_win: f64,
    pub wins: Vec<WinRecord>,
}

impl WinSummary {
    pub fn push(&mut self, record: WinRecord) {
        self.total_win += record.win;
        self.wins.push(record);
    }

    pub fn extend(&mut self, other: WinSummary) {
        self.total_win += other.total_win;
        self.wins.extend(other.wins);
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVALUATOR TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only inputs shared by all evaluators
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub symbols: &'a SymbolTable,
    pub paytable: &'a Paytable,
    pub global_multiplier: f64,
}

impl<'a> EvalContext<'a> {
    pub fn new(config: &'a GameConfig, global_multiplier: f64) -> Self {
        Self {
            symbols: &config.symbols,
            paytable: &config.paytable,
            global_multiplier,
        }
    }
}

pub trait WinEvaluator: Send + Sync {
    fn evaluate(&self, board: &Board, ctx: &EvalContext<'_>) -> WinSummary;
}

/// Evaluator selection as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluatorSpec {
    Cluster {
        #[serde(default = "default_min_cluster")]
        min_cluster: u32,
    },
    Lines,
    Scatter,
    Bombs {
        #[serde(default = "default_bomb_category")]
        category: String,
    },
}

fn default_min_cluster() -> u32 {
    5
}

fn default_bomb_category() -> String {
    "bomb".to_string()
}

impl EvaluatorSpec {
    pub(crate) fn validate(&self, config: &GameConfig) -> Result<(), ConfigError> {
        match self {
            EvaluatorSpec::Cluster { min_cluster } if *min_cluster == 0 => Err(ConfigError::Paytable(
                "cluster evaluator needs min_cluster >= 1".into(),
            )),
            EvaluatorSpec::Lines if config.paylines.is_empty() => Err(ConfigError::Payline {
                index: 0,
                reason: "lines evaluator configured without paylines".into(),
            }),
            _ => Ok(()),
        }
    }

    /// Instantiate the evaluator for a resolved configuration
    pub fn build(&self, config: &GameConfig) -> Box<dyn WinEvaluator> {
        match self {
            EvaluatorSpec::Cluster { min_cluster } => Box::new(ClusterEvaluator::new(*min_cluster)),
            EvaluatorSpec::Lines => Box::new(LinesEvaluator::new(
                config.paylines.clone(),
                config.symbols.category_members(WILD),
            )),
            EvaluatorSpec::Scatter => Box::new(ScatterEvaluator::new()),
            EvaluatorSpec::Bombs { category } => Box::new(BombEvaluator::new(category.clone())),
        }
    }
}

/// Run a set of evaluators and merge their summaries in order
pub fn evaluate_all(
    evaluators: &[Box<dyn WinEvaluator>],
    board: &Board,
    ctx: &EvalContext<'_>,
) -> WinSummary {
    let mut summary = WinSummary::default();
    for evaluator in evaluators {
        summary.extend(evaluator.evaluate(board, ctx));
    }
    summary
}

/// Product of positional multipliers over a set of cells, 1.0 when none
pub(crate) fn product_multiplier(board: &Board, positions: &[Position]) -> f64 {
    positions
        .iter()
        .filter_map(|p| board.get(*p).and_then(|s| s.multiplier()))
        .filter(|m| *m > 0.0)
        .product()
}

pub(crate) fn is_wild(id: SymbolId, wilds: &[SymbolId]) -> bool {
    wilds.contains(&id)
}
