//! Constrained board sampler
//!
//! Draws boards from weighted reel strips.
//!
//! ## Draw modes
//!
//! - **Unconstrained**: pick a strip set by weight, then a uniform stop per
//!   reel. Symbol frequency on the strip is its probability.
//! - **Forced**: land an exact number of a target category. Reels that can
//!   host the target are picked without replacement, weighted by how often
//!   the target appears on them, and their stops are placed so the target
//!   falls on a random visible row. Retries with a fresh strip choice up to
//!   the configured ceiling.
//!
//! Every board leaves the sampler with its special-position index and
//! anticipation sequence populated.

use std::collections::BTreeMap;

use rand::Rng;
use rand::distr::Distribution as _;
use rand::distr::weighted::WeightedIndex;

use crate::board::{Board, Padding};
use crate::config::{AttributeRule, DistributionConditions, GameConfig, GameType, SCATTER};
use crate::error::{AttributeError, Result, SlotError};
use crate::symbols::{ReelSet, Symbol, SymbolId, SymbolPayload};

/// Active sampling conditions for one spin
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    pub criteria: &'a str,
    pub conditions: &'a DistributionConditions,
    pub game_type: GameType,
}

impl<'a> DrawContext<'a> {
    pub fn new(criteria: &'a str, conditions: &'a DistributionConditions, game_type: GameType) -> Self {
        Self {
            criteria,
            conditions,
            game_type,
        }
    }
}

pub struct BoardSampler<'a> {
    config: &'a GameConfig,
}

impl<'a> BoardSampler<'a> {
    pub fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    /// Pick a strip set by the distribution's weights for the current game type
    pub fn choose_strip<R: Rng + ?Sized>(&self, ctx: &DrawContext<'_>, rng: &mut R) -> Result<&'a ReelSet> {
        let weights = ctx
            .conditions
            .reel_weights
            .get(&ctx.game_type)
            .ok_or_else(|| SlotError::MissingReelWeights {
                criteria: ctx.criteria.to_string(),
                game_type: ctx.game_type,
            })?;
        let strip_id = weights
            .draw(rng)
            .ok_or_else(|| SlotError::EmptyWeights(format!("{}/{}", ctx.criteria, ctx.game_type)))?;
        Ok(self.config.reel_set(strip_id)?)
    }

    /// Unconstrained draw
    pub fn draw<R: Rng + ?Sized>(&self, ctx: &DrawContext<'_>, rng: &mut R) -> Result<Board> {
        let set = self.choose_strip(ctx, rng)?;
        let stops: Vec<usize> = set
            .strips
            .iter()
            .map(|strip| rng.random_range(0..strip.len()))
            .collect();
        self.build(set, &stops, ctx, rng)
    }

    /// Unconstrained base game draw that redraws boards which would
    /// trigger free spins.
    ///
    /// Gives up after the configured number of attempts and returns the
    /// last board; the round's acceptance check rejects it if needed.
    pub fn draw_avoiding_trigger<R: Rng + ?Sized>(
        &self,
        ctx: &DrawContext<'_>,
        rng: &mut R,
    ) -> Result<Board> {
        let Some(min_trigger) = self.config.min_trigger(ctx.game_type) else {
            return self.draw(ctx, rng);
        };
        let limit = self.config.ceilings.max_avoid_trigger_attempts.max(1);
        let mut board = self.draw(ctx, rng)?;
        for _ in 1..limit {
            if (board.count_category(SCATTER) as u32) < min_trigger {
                return Ok(board);
            }
            board = self.draw(ctx, rng)?;
        }
        if board.count_category(SCATTER) as u32 >= min_trigger {
            log::warn!(
                "criteria '{}': board still triggers free spins after {} redraws",
                ctx.criteria,
                limit
            );
        }
        Ok(board)
    }

    /// Forced draw landing exactly `count` symbols of `category`
    pub fn force_board<R: Rng + ?Sized>(
        &self,
        category: &str,
        count: usize,
        ctx: &DrawContext<'_>,
        rng: &mut R,
    ) -> Result<Board> {
        let targets = self.config.symbols.category_members(category);
        let attempts = self.config.ceilings.max_force_attempts;

        for attempt in 1..=attempts {
            let set = self.choose_strip(ctx, rng)?;
            let Some(forced) = self.pick_forced_stops(set, &targets, count, rng)? else {
                continue;
            };

            let stops: Vec<usize> = set
                .strips
                .iter()
                .enumerate()
                .map(|(reel, strip)| match forced.get(&reel) {
                    Some(&stop) => {
                        let rows = self.config.num_rows[reel] as i64;
                        let offset = rng.random_range(0..rows);
                        (stop as i64 - offset).rem_euclid(strip.len() as i64) as usize
                    }
                    None => rng.random_range(0..strip.len()),
                })
                .collect();

            let board = self.build(set, &stops, ctx, rng)?;
            if board.count_category(category) == count {
                log::debug!(
                    "criteria '{}': forced {} x '{}' on strip '{}' after {} attempt(s)",
                    ctx.criteria,
                    count,
                    category,
                    set.id,
                    attempt
                );
                return Ok(board);
            }
        }

        Err(SlotError::ForceBoardExhausted {
            criteria: ctx.criteria.to_string(),
            category: category.to_string(),
            count,
            attempts,
        })
    }

    /// Choose `count` distinct reels able to host a target, weighted by the
    /// target's frequency on each reel, and a target stop on each.
    ///
    /// `None` when this strip set has fewer than `count` hosting reels.
    fn pick_forced_stops<R: Rng + ?Sized>(
        &self,
        set: &ReelSet,
        targets: &[SymbolId],
        count: usize,
        rng: &mut R,
    ) -> Result<Option<BTreeMap<usize, usize>>> {
        let target_stops: Vec<Vec<usize>> = set
            .strips
            .iter()
            .map(|strip| strip.stops_matching(targets))
            .collect();
        let mut probabilities: Vec<f64> = set
            .strips
            .iter()
            .zip(&target_stops)
            .map(|(strip, stops)| stops.len() as f64 / strip.len() as f64)
            .collect();

        let mut forced = BTreeMap::new();
        while forced.len() < count {
            if probabilities.iter().all(|p| *p <= 0.0) {
                return Ok(None);
            }
            let index = WeightedIndex::new(&probabilities)
                .map_err(|e| SlotError::EmptyWeights(format!("strip '{}' target reels: {e}", set.id)))?;
            let reel = index.sample(rng);
            let stops = &target_stops[reel];
            forced.insert(reel, stops[rng.random_range(0..stops.len())]);
            probabilities[reel] = 0.0;
        }
        Ok(Some(forced))
    }

    /// Read the visible windows (and padding) at the given stops
    pub fn build<R: Rng + ?Sized>(
        &self,
        set: &ReelSet,
        stops: &[usize],
        ctx: &DrawContext<'_>,
        rng: &mut R,
    ) -> Result<Board> {
        let mut reels = Vec::with_capacity(set.num_reels());
        for (reel, strip) in set.strips.iter().enumerate() {
            let stop = stops[reel] as i64;
            let column = (0..self.config.num_rows[reel] as i64)
                .map(|row| self.create_symbol(strip.symbol_at(stop + row), ctx, rng))
                .collect();
            reels.push(column);
        }

        let mut board = Board::new(reels);
        board.strip_id = set.id.clone();
        board.stops = stops.to_vec();

        if self.config.include_padding {
            let mut top = Vec::with_capacity(set.num_reels());
            let mut bottom = Vec::with_capacity(set.num_reels());
            let mut positions = Vec::with_capacity(set.num_reels());
            for (reel, strip) in set.strips.iter().enumerate() {
                let stop = stops[reel] as i64;
                let rows = self.config.num_rows[reel] as i64;
                top.push(self.plain_symbol(strip.symbol_at(stop - 1)));
                bottom.push(self.plain_symbol(strip.symbol_at(stop + rows)));
                positions.push((stop + rows + 1).rem_euclid(strip.len() as i64) as usize);
            }
            board.padding = Some(Padding { top, bottom });
            board.padding_positions = positions;
        }

        board.refresh_special_positions(&self.config.symbols);
        if self.config.min_trigger(ctx.game_type).is_some() {
            board.apply_anticipation(SCATTER, self.config.anticipation_for(ctx.game_type))?;
        }
        Ok(board)
    }

    fn plain_symbol(&self, id: SymbolId) -> Symbol {
        Symbol::new(id, self.config.symbols.is_special(id))
    }

    /// Create a symbol instance, assigning its attribute on a best-effort
    /// basis: a failing rule leaves the symbol bare.
    pub fn create_symbol<R: Rng + ?Sized>(&self, id: SymbolId, ctx: &DrawContext<'_>, rng: &mut R) -> Symbol {
        let mut symbol = self.plain_symbol(id);
        if let Some(rule) = self.config.attribute_rules.get(&id) {
            match assign_attribute(rule, ctx, rng) {
                Ok(payload) => symbol.attributes.payload = Some(payload),
                Err(e) => log::warn!(
                    "symbol '{}' created without attribute: {}",
                    self.config.symbols.name(id),
                    e
                ),
            }
        }
        symbol
    }
}

/// Draw the value an attribute rule calls for
pub fn assign_attribute<R: Rng + ?Sized>(
    rule: &AttributeRule,
    ctx: &DrawContext<'_>,
    rng: &mut R,
) -> std::result::Result<SymbolPayload, AttributeError> {
    let draw_value = |table: &str, rng: &mut R| -> std::result::Result<f64, AttributeError> {
        ctx.conditions
            .value_table(table, ctx.game_type)
            .ok_or_else(|| AttributeError::MissingTable {
                table: table.to_string(),
                game_type: ctx.game_type,
            })?
            .draw(rng)
            .copied()
            .ok_or_else(|| AttributeError::ZeroWeight(table.to_string()))
    };

    match rule {
        AttributeRule::Multiplier { table } => Ok(SymbolPayload::Multiplier {
            value: draw_value(table, rng)?,
        }),
        AttributeRule::Bomb { table, prize } => {
            let value = draw_value(table, rng)?;
            let prize = ctx
                .conditions
                .prize(prize, ctx.game_type)
                .ok_or_else(|| AttributeError::MissingPrize {
                    table: prize.clone(),
                    game_type: ctx.game_type,
                })?;
            Ok(SymbolPayload::Bomb { value, prize })
        }
    }
}
