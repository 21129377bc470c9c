//! Feature modifiers
//!
//! Modifiers run between board draw and win evaluation on every spin. Their
//! magnitudes come from per-symbol draws made when the symbols land, so
//! nothing here is cached across spins except sticky wild reels, which live
//! in the round state.
//!
//! ## Modifiers
//!
//! - **Expanding wilds**: a landed expanding wild grows upward over its
//!   reel, multiplying in every multiplier it passes. Optionally sticky for
//!   the rest of the free spins.
//! - **Bomb guarantee**: places a bomb of a minimum value when the board
//!   lacks one; rejects the attempt if it cannot.
//! - **Multiplier ladder**: free spin *n* plays at `start + step·(n−1)`,
//!   capped at `max`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::config::{AttributeRule, GameConfig, GameType};
use crate::error::{ConfigError, Result};
use crate::events::EventKind;
use crate::round::{RoundState, SpinContext};
use crate::symbols::{Symbol, SymbolId, SymbolPayload};

/// A modifier applied after the board is drawn
pub trait FeatureModifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, spin: &mut SpinContext<'_, '_>) -> Result<()>;

    /// Extra acceptance test for the finished round
    fn accepts(&self, _state: &RoundState) -> bool {
        true
    }
}

/// Modifier selection as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureSpec {
    ExpandingWilds {
        /// Symbol that expands
        wild: String,
        /// Symbol whose multiplier is collected on the way up
        #[serde(default)]
        collector: Option<String>,
        #[serde(default)]
        sticky_in_freegame: bool,
    },
    BombGuarantee {
        symbol: String,
        min_value: f64,
        #[serde(default = "default_guarantee_game_types")]
        game_types: Vec<GameType>,
    },
    MultiplierLadder {
        start: f64,
        step: f64,
        max: f64,
    },
}

fn default_guarantee_game_types() -> Vec<GameType> {
    vec![GameType::BaseGame]
}

impl FeatureSpec {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureSpec::ExpandingWilds { .. } => "expanding_wilds",
            FeatureSpec::BombGuarantee { .. } => "bomb_guarantee",
            FeatureSpec::MultiplierLadder { .. } => "multiplier_ladder",
        }
    }

    fn symbol(&self, config: &GameConfig, name: &str) -> std::result::Result<SymbolId, ConfigError> {
        config.symbols.id(name).ok_or_else(|| ConfigError::UnknownSymbol {
            symbol: name.to_string(),
            context: format!("feature '{}'", self.name()),
        })
    }

    pub(crate) fn validate(&self, config: &GameConfig) -> std::result::Result<(), ConfigError> {
        self.build(config).map(|_| ())
    }

    pub fn build(&self, config: &GameConfig) -> std::result::Result<Box<dyn FeatureModifier>, ConfigError> {
        let fault = |reason: String| ConfigError::Feature {
            feature: self.name().to_string(),
            reason,
        };
        match self {
            FeatureSpec::ExpandingWilds {
                wild,
                collector,
                sticky_in_freegame,
            } => {
                let wild = self.symbol(config, wild)?;
                let collector = collector
                    .as_deref()
                    .map(|name| self.symbol(config, name))
                    .transpose()?;
                Ok(Box::new(ExpandingWilds {
                    wild,
                    collector,
                    sticky_in_freegame: *sticky_in_freegame,
                }))
            }
            FeatureSpec::BombGuarantee {
                symbol,
                min_value,
                game_types,
            } => {
                let id = self.symbol(config, symbol)?;
                let prize = match config.attribute_rules.get(&id) {
                    Some(AttributeRule::Bomb { prize, .. }) => prize.clone(),
                    _ => return Err(fault(format!("symbol '{symbol}' has no bomb attribute rule"))),
                };
                if *min_value <= 0.0 {
                    return Err(fault(format!("min_value {min_value} must be positive")));
                }
                Ok(Box::new(BombGuarantee {
                    symbol: id,
                    min_value: *min_value,
                    prize,
                    game_types: game_types.clone(),
                }))
            }
            FeatureSpec::MultiplierLadder { start, step, max } => {
                if *start <= 0.0 || *step < 0.0 || max < start {
                    return Err(fault(format!("invalid ladder start {start} step {step} max {max}")));
                }
                Ok(Box::new(MultiplierLadder {
                    start: *start,
                    step: *step,
                    max: *max,
                }))
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPANDING WILDS
// ═══════════════════════════════════════════════════════════════════════════════

pub struct ExpandingWilds {
    wild: SymbolId,
    collector: Option<SymbolId>,
    sticky_in_freegame: bool,
}

impl ExpandingWilds {
    fn picks_up(&self, symbol: &Symbol) -> Option<f64> {
        let collects = symbol.id == self.wild || Some(symbol.id) == self.collector;
        if collects {
            symbol.multiplier().filter(|m| *m > 0.0)
        } else {
            None
        }
    }
}

impl FeatureModifier for ExpandingWilds {
    fn name(&self) -> &'static str {
        "expanding_wilds"
    }

    fn apply(&self, spin: &mut SpinContext<'_, '_>) -> Result<()> {
        let sticky = self.sticky_in_freegame && spin.state.game_type == GameType::FreeGame;
        let special = spin.config.symbols.is_special(self.wild);
        let mut expansions = Vec::new();

        for reel in 0..spin.state.board.num_reels() {
            let rows = spin.state.board.rows(reel);
            let held = if sticky {
                spin.state.sticky_reels.get(&reel).copied()
            } else {
                None
            };
            let landed = (0..rows).rev().find(|&row| {
                spin.state
                    .board
                    .get(Position::new(reel, row))
                    .is_some_and(|s| s.id == self.wild)
            });

            // A held reel covers the whole column; otherwise grow from the
            // lowest landed wild.
            let top_row = match (held, landed) {
                (Some(_), _) => rows - 1,
                (None, Some(row)) => row,
                (None, None) => continue,
            };

            let mut multiplier = held.unwrap_or(1.0);
            for row in 0..=top_row {
                if let Some(m) = spin
                    .state
                    .board
                    .get(Position::new(reel, row))
                    .and_then(|s| self.picks_up(s))
                {
                    multiplier *= m;
                }
            }

            let mut positions = Vec::with_capacity(top_row + 1);
            for row in 0..=top_row {
                let pos = Position::new(reel, row);
                let mut symbol = Symbol::new(self.wild, special)
                    .with_payload(SymbolPayload::Multiplier { value: multiplier });
                symbol.attributes.expanded = true;
                symbol.attributes.sticky = sticky;
                spin.state.board.replace(pos, symbol);
                positions.push(pos);
            }
            if sticky {
                spin.state.sticky_reels.insert(reel, multiplier);
            }
            expansions.push(EventKind::WildExpansion {
                reel,
                positions,
                multiplier,
                sticky,
            });
        }

        if !expansions.is_empty() {
            spin.state.board.refresh_special_positions(&spin.config.symbols);
            for event in expansions {
                spin.push_event(event);
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BOMB GUARANTEE
// ═══════════════════════════════════════════════════════════════════════════════

pub struct BombGuarantee {
    symbol: SymbolId,
    min_value: f64,
    prize: String,
    game_types: Vec<GameType>,
}

impl FeatureModifier for BombGuarantee {
    fn name(&self) -> &'static str {
        "bomb_guarantee"
    }

    fn apply(&self, spin: &mut SpinContext<'_, '_>) -> Result<()> {
        let game_type = spin.state.game_type;
        if !self.game_types.contains(&game_type) {
            return Ok(());
        }

        let board = &spin.state.board;
        let best = board
            .positions()
            .filter_map(|p| board.get(p).and_then(|s| s.bomb()))
            .map(|(value, _)| value)
            .fold(0.0_f64, f64::max);
        if best >= self.min_value {
            return Ok(());
        }

        let Some(prize) = spin.distribution.conditions.prize(&self.prize, game_type) else {
            log::debug!(
                "criteria '{}': no prize '{}' for {}, cannot guarantee bomb",
                spin.distribution.criteria,
                self.prize,
                game_type
            );
            spin.state.repeat = true;
            return Ok(());
        };

        // Prefer replacing a plain symbol
        let candidates: Vec<Position> = board
            .positions()
            .filter(|p| board.get(*p).is_some_and(|s| !s.special))
            .collect();
        if candidates.is_empty() {
            spin.state.repeat = true;
            return Ok(());
        }
        let position = candidates[spin.rng.random_range(0..candidates.len())];

        let special = spin.config.symbols.is_special(self.symbol);
        let bomb = Symbol::new(self.symbol, special).with_payload(SymbolPayload::Bomb {
            value: self.min_value,
            prize,
        });
        spin.state.board.replace(position, bomb);
        spin.state.board.refresh_special_positions(&spin.config.symbols);
        spin.push_event(EventKind::BombPlaced {
            position,
            value: self.min_value,
        });
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MULTIPLIER LADDER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct MultiplierLadder {
    start: f64,
    step: f64,
    max: f64,
}

impl MultiplierLadder {
    pub fn multiplier_for(&self, free_spin: u32) -> f64 {
        let n = free_spin.saturating_sub(1) as f64;
        (self.start + self.step * n).min(self.max)
    }
}

impl FeatureModifier for MultiplierLadder {
    fn name(&self) -> &'static str {
        "multiplier_ladder"
    }

    fn apply(&self, spin: &mut SpinContext<'_, '_>) -> Result<()> {
        if spin.state.game_type != GameType::FreeGame {
            return Ok(());
        }
        let multiplier = self.multiplier_for(spin.state.fs);
        if (multiplier - spin.state.global_multiplier).abs() > f64::EPSILON {
            spin.state.global_multiplier = multiplier;
            spin.push_event(EventKind::UpdateGlobalMultiplier { multiplier });
        }
        Ok(())
    }
}
