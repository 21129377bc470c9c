//! Round event log
//!
//! Every round records an ordered list of typed events. The log is the only
//! thing a renderer or replay validator sees, so each event carries the
//! positions and amounts needed to reconstruct the round.
//!
//! Amounts are integers in hundredths of the bet.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::config::GameType;
use crate::evaluate::{WinKind, WinSummary};
use crate::symbols::{SymbolAttributes, SymbolTable};
use crate::wins::to_cents;

/// One revealed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealedSymbol {
    pub name: String,
    #[serde(flatten)]
    pub attributes: SymbolAttributes,
}

/// One itemized win inside a `win_info` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinEntry {
    pub kind: WinKind,
    pub symbol: String,
    pub count: u32,
    pub win: u64,
    pub positions: Vec<Position>,
    pub global_multiplier: f64,
    pub symbol_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A board landed
    Reveal {
        board: Vec<Vec<RevealedSymbol>>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        padding_positions: Vec<usize>,
        game_type: GameType,
        anticipation: Vec<u32>,
    },
    /// Itemized wins of the last board
    WinInfo { total_win: u64, wins: Vec<WinEntry> },
    /// Win of the current spin
    SetWin { amount: u64, win_level: u8 },
    /// Round total so far
    SetTotalWin { amount: u64 },
    /// Free spins awarded from the base game
    FreeSpinTrigger {
        total_fs: u32,
        positions: Vec<Position>,
    },
    /// Free spins added during free spins
    FreeSpinRetrigger {
        total_fs: u32,
        positions: Vec<Position>,
    },
    /// A free spin starts
    UpdateFreeSpin { amount: u32, total: u32 },
    /// Free spins finished
    FreeSpinEnd { amount: u64, win_level: u8 },
    /// An expanding wild grew over its reel
    WildExpansion {
        reel: usize,
        positions: Vec<Position>,
        multiplier: f64,
        sticky: bool,
    },
    /// A guaranteed bomb was placed
    BombPlaced { position: Position, value: f64 },
    /// The free game multiplier changed
    UpdateGlobalMultiplier { multiplier: f64 },
    /// The round hit the win cap
    WinCap { amount: u64 },
    /// Final payout of the round
    FinalWin { amount: u64 },
}

impl EventKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::Reveal { .. } => "reveal",
            EventKind::WinInfo { .. } => "win_info",
            EventKind::SetWin { .. } => "set_win",
            EventKind::SetTotalWin { .. } => "set_total_win",
            EventKind::FreeSpinTrigger { .. } => "free_spin_trigger",
            EventKind::FreeSpinRetrigger { .. } => "free_spin_retrigger",
            EventKind::UpdateFreeSpin { .. } => "update_free_spin",
            EventKind::FreeSpinEnd { .. } => "free_spin_end",
            EventKind::WildExpansion { .. } => "wild_expansion",
            EventKind::BombPlaced { .. } => "bomb_placed",
            EventKind::UpdateGlobalMultiplier { .. } => "update_global_multiplier",
            EventKind::WinCap { .. } => "win_cap",
            EventKind::FinalWin { .. } => "final_win",
        }
    }
}

/// An event with its position in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub index: u32,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Append-only event log of one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: EventKind) {
        let index = self.events.len() as u32;
        self.events.push(Event { index, kind });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Count events of one type
    pub fn count(&self, type_name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind.type_name() == type_name)
            .count()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDERS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn reveal_event(board: &Board, symbols: &SymbolTable, game_type: GameType) -> EventKind {
    let cells = (0..board.num_reels())
        .map(|reel| {
            board
                .reel(reel)
                .iter()
                .map(|s| RevealedSymbol {
                    name: symbols.name(s.id).to_string(),
                    attributes: s.attributes.clone(),
                })
                .collect()
        })
        .collect();
    EventKind::Reveal {
        board: cells,
        padding_positions: board.padding_positions.clone(),
        game_type,
        anticipation: board.anticipation.clone(),
    }
}

pub fn win_info_event(summary: &WinSummary) -> EventKind {
    EventKind::WinInfo {
        total_win: to_cents(summary.total_win),
        wins: summary
            .wins
            .iter()
            .map(|w| WinEntry {
                kind: w.kind,
                symbol: w.symbol.clone(),
                count: w.count,
                win: to_cents(w.win),
                positions: w.positions.clone(),
                global_multiplier: w.meta.global_multiplier,
                symbol_multiplier: w.meta.symbol_multiplier,
                line_index: w.meta.line_index,
            })
            .collect(),
    }
}
