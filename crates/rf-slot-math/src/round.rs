//! Round / feature state machine
//!
//! One generic state machine drives every game. What differs between titles
//! is expressed through configuration and the [`RoundHooks`] extension
//! points, not through per-game subclasses.
//!
//! ## Flow
//!
//! ```text
//! BaseSpin ──(scatters ≥ trigger)──► EnterFreeSpins ──► InFreeSpins(n)
//!    │                                                   │   ▲
//!    │                                        retrigger  └───┘ (+spins)
//!    │                                                   │
//!    │                                  budget spent or wincap
//!    ▼                                                   ▼
//! Complete ◄─────────────────────────────────────────────┘
//!    │
//!    └─ final win fails the distribution's acceptance test
//!       ⇒ repeat: discard the attempt, reseed, start over (bounded)
//! ```
//!
//! ## Hooks
//!
//! - `draw_board`: produce the spin's board
//! - `post_draw`: feature modifiers between draw and evaluation
//! - `evaluate`: win evaluator selection
//! - `accept`: extra acceptance predicate for repeat decisions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::{BetMode, Distribution, GameConfig, GameType, SCATTER};
use crate::error::{ConfigError, Result, SlotError};
use crate::evaluate::{EvalContext, WinEvaluator, WinSummary, evaluate_all};
use crate::events::{EventKind, EventLog, reveal_event, win_info_event};
use crate::features::FeatureModifier;
use crate::records::ForceRecord;
use crate::rng::{RoundRng, attempt_seed, round_rng};
use crate::sampler::{BoardSampler, DrawContext};
use crate::wins::{WinManager, round_win, to_cents};

// ═══════════════════════════════════════════════════════════════════════════════
// ROUND STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything one round attempt accumulates.
///
/// Created fresh for every attempt and dropped on repeat.
#[derive(Debug, Clone)]
pub struct RoundState {
    pub sim_index: u64,
    /// Seed of the accepted attempt
    pub seed: u64,
    /// Number of discarded attempts before this one
    pub attempt: u32,
    pub bet_mode: String,
    pub criteria: String,
    pub game_type: GameType,
    pub repeat: bool,
    pub board: Board,
    pub wins: WinManager,
    /// Evaluation of the most recent board
    pub spin_summary: WinSummary,
    /// Free spins played so far
    pub fs: u32,
    /// Free spins granted in total, including retriggers
    pub tot_fs: u32,
    /// Spins added by retriggers
    pub retrigger_spins: u32,
    pub triggered_freegame: bool,
    pub wincap_triggered: bool,
    pub global_multiplier: f64,
    /// Reels held by sticky expanding wilds, with their multiplier
    pub sticky_reels: BTreeMap<usize, f64>,
    pub final_win: f64,
    pub events: EventLog,
    /// Descriptors of triggers and notable wins, for force files
    pub records: Vec<ForceRecord>,
}

impl RoundState {
    pub fn new(sim_index: u64, seed: u64, attempt: u32, bet_mode: &str, criteria: &str) -> Self {
        Self {
            sim_index,
            seed,
            attempt,
            bet_mode: bet_mode.to_string(),
            criteria: criteria.to_string(),
            game_type: GameType::BaseGame,
            repeat: false,
            board: Board::new(Vec::new()),
            wins: WinManager::new(),
            spin_summary: WinSummary::default(),
            fs: 0,
            tot_fs: 0,
            retrigger_spins: 0,
            triggered_freegame: false,
            wincap_triggered: false,
            global_multiplier: 1.0,
            sticky_reels: BTreeMap::new(),
            final_win: 0.0,
            events: EventLog::new(),
            records: Vec::new(),
        }
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            sim_index: self.sim_index,
            criteria: self.criteria.clone(),
            final_win: self.final_win,
            base_game_wins: self.wins.base_game_wins,
            free_game_wins: self.wins.free_game_wins,
            free_spins: self.fs,
            wincap_triggered: self.wincap_triggered,
            attempts: self.attempt + 1,
        }
    }
}

/// Compact outcome of a finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub sim_index: u64,
    pub criteria: String,
    pub final_win: f64,
    pub base_game_wins: f64,
    pub free_game_wins: f64,
    pub free_spins: u32,
    pub wincap_triggered: bool,
    pub attempts: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPIN CONTEXT & HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutable view of a round handed to hooks and feature modifiers
pub struct SpinContext<'s, 'c> {
    pub config: &'c GameConfig,
    pub mode: &'c BetMode,
    pub distribution: &'c Distribution,
    pub sampler: &'s BoardSampler<'c>,
    pub state: &'s mut RoundState,
    pub rng: &'s mut RoundRng,
}

impl<'c> SpinContext<'_, 'c> {
    pub fn draw_context(&self) -> DrawContext<'c> {
        DrawContext::new(
            &self.distribution.criteria,
            &self.distribution.conditions,
            self.state.game_type,
        )
    }

    pub fn push_event(&mut self, kind: EventKind) {
        self.state.events.push(kind);
    }
}

/// Extension points of the round state machine
pub trait RoundHooks: Send + Sync {
    /// Produce the board for the current spin
    fn draw_board(&self, spin: &mut SpinContext<'_, '_>) -> Result<Board> {
        standard_draw(spin)
    }

    /// Modify the board between draw and evaluation
    fn post_draw(&self, _spin: &mut SpinContext<'_, '_>) -> Result<()> {
        Ok(())
    }

    /// Evaluate the current board
    fn evaluate(&self, spin: &mut SpinContext<'_, '_>) -> WinSummary;

    /// Extra acceptance test run after the distribution's own criteria
    fn accept(&self, _state: &RoundState) -> bool {
        true
    }
}

/// Default board draw.
///
/// Forced free game distributions land a weighted scatter count on the base
/// board; other base spins avoid accidental triggers; free spins draw
/// unconstrained.
pub fn standard_draw(spin: &mut SpinContext<'_, '_>) -> Result<Board> {
    let ctx = spin.draw_context();
    let distribution = spin.distribution;
    let conditions = &distribution.conditions;
    match spin.state.game_type {
        GameType::BaseGame if conditions.force_freegame => {
            let count = conditions
                .scatter_triggers
                .as_ref()
                .and_then(|t| t.draw(spin.rng))
                .copied()
                .ok_or_else(|| SlotError::MissingScatterTriggers {
                    criteria: distribution.criteria.clone(),
                })?;
            spin.sampler
                .force_board(SCATTER, count as usize, &ctx, spin.rng)
        }
        GameType::BaseGame => spin.sampler.draw_avoiding_trigger(&ctx, spin.rng),
        GameType::FreeGame => spin.sampler.draw(&ctx, spin.rng),
    }
}

/// Hooks assembled from configuration: configured evaluators plus the
/// game's and the bet mode's feature modifiers, applied in that order.
pub struct StandardHooks {
    evaluators: Vec<Box<dyn WinEvaluator>>,
    modifiers: Vec<Box<dyn FeatureModifier>>,
}

impl StandardHooks {
    pub fn new(config: &GameConfig, mode: &BetMode) -> std::result::Result<Self, ConfigError> {
        let evaluators = config.evaluators.iter().map(|e| e.build(config)).collect();
        let modifiers = config
            .features
            .iter()
            .chain(mode.features.iter())
            .map(|f| f.build(config))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            evaluators,
            modifiers,
        })
    }

    pub fn modifier_names(&self) -> Vec<&'static str> {
        self.modifiers.iter().map(|m| m.name()).collect()
    }
}

impl RoundHooks for StandardHooks {
    fn post_draw(&self, spin: &mut SpinContext<'_, '_>) -> Result<()> {
        for modifier in &self.modifiers {
            modifier.apply(spin)?;
        }
        Ok(())
    }

    fn evaluate(&self, spin: &mut SpinContext<'_, '_>) -> WinSummary {
        let ctx = EvalContext::new(spin.config, spin.state.global_multiplier);
        evaluate_all(&self.evaluators, &spin.state.board, &ctx)
    }

    fn accept(&self, state: &RoundState) -> bool {
        self.modifiers.iter().all(|m| m.accepts(state))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs rounds of one bet mode
pub struct RoundEngine<'c, H: RoundHooks = StandardHooks> {
    config: &'c GameConfig,
    mode: &'c BetMode,
    sampler: BoardSampler<'c>,
    hooks: H,
}

impl<'c> RoundEngine<'c, StandardHooks> {
    pub fn new(config: &'c GameConfig, mode_name: &str) -> Result<Self> {
        let mode = config.bet_mode(mode_name)?;
        let hooks = StandardHooks::new(config, mode)?;
        Ok(Self::with_hooks(config, mode, hooks))
    }
}

impl<'c, H: RoundHooks> RoundEngine<'c, H> {
    pub fn with_hooks(config: &'c GameConfig, mode: &'c BetMode, hooks: H) -> Self {
        Self {
            config,
            mode,
            sampler: BoardSampler::new(config),
            hooks,
        }
    }

    pub fn config(&self) -> &'c GameConfig {
        self.config
    }

    pub fn mode(&self) -> &'c BetMode {
        self.mode
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Play a round for `criteria` until it satisfies the distribution's
    /// acceptance test, reseeding every discarded attempt.
    pub fn run(&self, sim_index: u64, criteria: &str, seed: u64) -> Result<RoundState> {
        let distribution = self
            .mode
            .distribution(criteria)
            .ok_or_else(|| ConfigError::Distribution {
                mode: self.mode.name.clone(),
                criteria: criteria.to_string(),
                reason: "not defined".into(),
            })?;

        let ceiling = self.config.ceilings.max_repeat_attempts;
        for attempt in 0..ceiling {
            let attempt_seed = attempt_seed(seed, attempt);
            let mut rng = round_rng(attempt_seed);
            let mut state = RoundState::new(sim_index, attempt_seed, attempt, &self.mode.name, criteria);
            self.play(distribution, &mut state, &mut rng)?;
            if !state.repeat {
                return Ok(state);
            }
            log::trace!(
                "sim {} criteria '{}': attempt {} rejected (win {})",
                sim_index,
                criteria,
                attempt,
                state.final_win
            );
        }

        Err(SlotError::RepeatExhausted {
            criteria: format!("{}/{}", self.mode.name, criteria),
            attempts: ceiling,
        })
    }

    /// One attempt: base spin, optional free spins, final win, acceptance
    fn play(&self, distribution: &'c Distribution, state: &mut RoundState, rng: &mut RoundRng) -> Result<()> {
        let mut spin = SpinContext {
            config: self.config,
            mode: self.mode,
            distribution,
            sampler: &self.sampler,
            state,
            rng,
        };

        self.spin(&mut spin)?;
        spin.state.wins.commit_spin(GameType::BaseGame);

        if self.fs_condition(spin.state) && self.freespin_entry(&mut spin) {
            self.run_free_spins(&mut spin)?;
        }

        self.finalize(spin.state);
        self.check_repeat(distribution, spin.state);
        Ok(())
    }

    /// Draw, modify, evaluate and account a single board
    fn spin(&self, spin: &mut SpinContext<'_, 'c>) -> Result<()> {
        let board = self.hooks.draw_board(spin)?;
        spin.state.board = board;
        let reveal = reveal_event(&spin.state.board, &self.config.symbols, spin.state.game_type);
        spin.push_event(reveal);

        self.hooks.post_draw(spin)?;
        let summary = self.hooks.evaluate(spin);

        spin.state.wins.update_spin_win(summary.total_win);
        let records = ForceRecord::from_wins(&summary, spin.state.game_type);
        spin.state.records.extend(records);
        if summary.total_win > 0.0 {
            spin.push_event(win_info_event(&summary));
        }
        spin.state.spin_summary = summary;
        self.check_wincap(spin.state);

        let spin_win = spin.state.wins.spin_win;
        spin.push_event(EventKind::SetWin {
            amount: to_cents(spin_win),
            win_level: self.config.win_level(spin_win),
        });
        let running = spin.state.wins.running_bet_win.min(self.mode.wincap);
        spin.push_event(EventKind::SetTotalWin {
            amount: to_cents(running),
        });
        Ok(())
    }

    fn check_wincap(&self, state: &mut RoundState) {
        if !state.wincap_triggered && state.wins.running_bet_win >= self.mode.wincap {
            state.wincap_triggered = true;
            state.events.push(EventKind::WinCap {
                amount: to_cents(self.mode.wincap),
            });
        }
    }

    fn scatter_count(state: &RoundState) -> u32 {
        state.board.count_category(SCATTER) as u32
    }

    /// Enough scatters on the board to (re)trigger in the current game type
    fn fs_condition(&self, state: &RoundState) -> bool {
        match self.config.min_trigger(state.game_type) {
            Some(min) => !state.repeat && Self::scatter_count(state) >= min,
            None => false,
        }
    }

    /// Free spins are only entered by distributions that ask for them;
    /// anywhere else a trigger rejects the attempt.
    fn freespin_entry(&self, spin: &mut SpinContext<'_, 'c>) -> bool {
        if spin.distribution.conditions.force_freegame {
            return true;
        }
        spin.state.repeat = true;
        false
    }

    fn run_free_spins(&self, spin: &mut SpinContext<'_, 'c>) -> Result<()> {
        let count = Self::scatter_count(spin.state);
        let granted = self
            .config
            .spins_for(GameType::BaseGame, count)
            .ok_or(ConfigError::MissingTriggers(GameType::BaseGame))?;
        spin.state.tot_fs = granted;
        spin.state
            .records
            .push(ForceRecord::trigger(count, SCATTER, GameType::BaseGame));
        let positions = spin.state.board.special_positions(SCATTER).to_vec();
        spin.push_event(EventKind::FreeSpinTrigger {
            total_fs: granted,
            positions,
        });

        spin.state.triggered_freegame = true;
        spin.state.game_type = GameType::FreeGame;
        spin.state.wins.reset_spin_win();
        spin.state.sticky_reels.clear();

        while spin.state.fs < spin.state.tot_fs && !spin.state.wincap_triggered {
            spin.state.fs += 1;
            let (fs, tot_fs) = (spin.state.fs, spin.state.tot_fs);
            spin.push_event(EventKind::UpdateFreeSpin {
                amount: fs,
                total: tot_fs,
            });
            spin.state.wins.reset_spin_win();

            self.spin(spin)?;

            if self.fs_condition(spin.state) {
                self.retrigger(spin)?;
            }
            spin.state.wins.commit_spin(GameType::FreeGame);
        }

        let free_wins = spin.state.wins.free_game_wins;
        spin.push_event(EventKind::FreeSpinEnd {
            amount: to_cents(free_wins),
            win_level: self.config.win_level(free_wins),
        });
        spin.state.game_type = GameType::BaseGame;
        spin.state.global_multiplier = 1.0;
        Ok(())
    }

    /// Additive retrigger from the free game trigger table
    fn retrigger(&self, spin: &mut SpinContext<'_, 'c>) -> Result<()> {
        let count = Self::scatter_count(spin.state);
        let extra = self
            .config
            .spins_for(GameType::FreeGame, count)
            .ok_or(ConfigError::MissingTriggers(GameType::FreeGame))?;
        spin.state.tot_fs += extra;
        spin.state.retrigger_spins += extra;
        spin.state
            .records
            .push(ForceRecord::trigger(count, SCATTER, GameType::FreeGame));
        let (total_fs, positions) = (
            spin.state.tot_fs,
            spin.state.board.special_positions(SCATTER).to_vec(),
        );
        spin.push_event(EventKind::FreeSpinRetrigger {
            total_fs,
            positions,
        });
        Ok(())
    }

    fn finalize(&self, state: &mut RoundState) {
        let total = round_win(state.wins.total());
        if total >= self.mode.wincap {
            state.wincap_triggered = true;
        }
        state.final_win = total.min(self.mode.wincap);
        state.events.push(EventKind::FinalWin {
            amount: to_cents(state.final_win),
        });
    }

    fn check_repeat(&self, distribution: &Distribution, state: &mut RoundState) {
        if state.repeat {
            return;
        }
        let conditions = &distribution.conditions;
        let rejected = distribution
            .win_criteria
            .is_some_and(|c| !c.accepts(state.final_win))
            || (conditions.force_freegame && !state.triggered_freegame)
            || (conditions.force_wincap && !state.wincap_triggered)
            || !self.hooks.accept(state);
        state.repeat = rejected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistributionConditions, GameConfigLoader, WinCriteria};
    use crate::weights::WeightTable;

    /// 3x3 lines game. Base strips carry one H1 per reel and no scatters;
    /// the free game strips carry one scatter per reel and H1 elsewhere.
    fn lines_config(wincap: f64) -> GameConfig {
        let json = format!(
            r#"{{
            "game_id": "round-test",
            "num_reels": 3,
            "num_rows": [3, 3, 3],
            "paytable": [{{"symbol": "H1", "min": 3, "max": 3, "pay": 2.0}}],
            "special_symbols": {{"scatter": ["S"]}},
            "freespin_triggers": {{"basegame": {{"3": 4}}, "freegame": {{"3": 2}}}},
            "reels": {{
                "BR0": [["H1","L1","L1","L1","L1","L1"], ["H1","L1","L1","L1","L1","L1"], ["H1","L1","L1","L1","L1","L1"]],
                "FR0": [["S","H1","H1","H1","H1","H1"], ["S","H1","H1","H1","H1","H1"], ["S","H1","H1","H1","H1","H1"]]
            }},
            "paylines": [[0,0,0],[1,1,1],[2,2,2]],
            "evaluators": [{{"type": "lines"}}],
            "bet_modes": [{{
                "name": "base",
                "wincap": {wincap},
                "distributions": [
                    {{"criteria": "0", "quota": 0.5, "win_criteria": {{"type": "exact", "value": 0.0}},
                      "conditions": {{"reel_weights": {{"basegame": [["BR0", 1]]}}}}}},
                    {{"criteria": "freegame", "quota": 0.5,
                      "conditions": {{"force_freegame": true,
                        "scatter_triggers": [[3, 1]],
                        "reel_weights": {{"basegame": [["FR0", 1]], "freegame": [["FR0", 1]]}}}}}}
                ]
            }}]
        }}"#
        );
        GameConfigLoader::new().load_json(&json).unwrap()
    }

    #[test]
    fn test_zero_criteria_never_wins() {
        let config = lines_config(100.0);
        let engine = RoundEngine::new(&config, "base").unwrap();
        for sim in 0..50 {
            let state = engine.run(sim, "0", 1000 + sim).unwrap();
            assert_eq!(state.final_win, 0.0);
            assert!(!state.repeat);
            assert!(!state.triggered_freegame);
        }
    }

    #[test]
    fn test_forced_freegame_grants_and_plays_spins() {
        let config = lines_config(10_000.0);
        let engine = RoundEngine::new(&config, "base").unwrap();
        let state = engine.run(7, "freegame", 77).unwrap();
        assert!(state.triggered_freegame);
        assert!(state.tot_fs >= 4);
        assert_eq!(state.fs, state.tot_fs);
        assert_eq!(state.tot_fs, 4 + state.retrigger_spins);
        assert_eq!(state.events.count("free_spin_trigger"), 1);
        assert_eq!(state.events.count("update_free_spin") as u32, state.fs);
        assert_eq!(state.events.count("free_spin_end"), 1);
        assert_eq!(state.events.last().unwrap().kind.type_name(), "final_win");

        let triggers: Vec<_> = state
            .records
            .iter()
            .filter(|r| r.get("symbol") == Some(SCATTER))
            .collect();
        assert!(triggers[0].matches([("kind", "3"), ("gametype", "basegame")]));
        assert_eq!(
            triggers.iter().filter(|r| r.get("gametype") == Some("freegame")).count(),
            state.events.count("free_spin_retrigger")
        );
    }

    #[test]
    fn test_wincap_stops_free_spins() {
        // Any paying line exceeds a cap of 0.5
        let mut config = lines_config(0.5);
        config.bet_modes[0].distributions[1].win_criteria = Some(WinCriteria::Exact { value: 0.5 });
        let engine = RoundEngine::new(&config, "base").unwrap();
        for sim in 0..20 {
            let state = engine.run(sim, "freegame", 500 + sim).unwrap();
            assert!(state.wincap_triggered);
            assert_eq!(state.final_win, 0.5);
            assert_eq!(state.events.count("win_cap"), 1);
            assert!(state.fs <= state.tot_fs);

            let events = state.events.events();
            let cap_at = events
                .iter()
                .position(|e| e.kind.type_name() == "win_cap")
                .unwrap();
            assert!(
                events[cap_at..]
                    .iter()
                    .all(|e| e.kind.type_name() != "update_free_spin"),
                "free spin started after the cap was hit"
            );
        }
    }

    #[test]
    fn test_force_wincap_finalizes_at_cap() {
        let mut config = lines_config(3.0);
        config.bet_modes[0].distributions[1].conditions.force_wincap = true;
        assert!(config.bet_modes[0].distributions[1].win_criteria.is_none());
        let engine = RoundEngine::new(&config, "base").unwrap();
        for sim in 0..20 {
            let state = engine.run(sim, "freegame", 900 + sim).unwrap();
            assert!(state.wincap_triggered);
            assert_eq!(state.final_win, 3.0);
            assert_eq!(state.events.count("win_cap"), 1);
        }
    }

    #[test]
    fn test_repeat_ceiling_is_exhaustion_fault() {
        let mut config = lines_config(100.0);
        config.ceilings.max_repeat_attempts = 5;
        // Base strips hold one H1 per reel, so at most one line (2.0) can pay
        config.bet_modes[0].distributions[0].win_criteria = Some(WinCriteria::Exact { value: 3.0 });
        let engine = RoundEngine::new(&config, "base").unwrap();
        let err = engine.run(0, "0", 3).unwrap_err();
        assert!(err.is_exhaustion());
    }

    #[test]
    fn test_unknown_criteria_is_config_fault() {
        let config = lines_config(100.0);
        let engine = RoundEngine::new(&config, "base").unwrap();
        assert!(engine.run(0, "missing", 1).unwrap_err().is_configuration_fault());
    }

    #[test]
    fn test_same_seed_same_round() {
        let config = lines_config(10_000.0);
        let engine = RoundEngine::new(&config, "base").unwrap();
        let a = engine.run(3, "freegame", 42).unwrap();
        let b = engine.run(3, "freegame", 42).unwrap();
        assert_eq!(a.events, b.events);
        assert_eq!(a.final_win, b.final_win);
    }

    struct NeverAccept;

    impl RoundHooks for NeverAccept {
        fn evaluate(&self, _spin: &mut SpinContext<'_, '_>) -> WinSummary {
            WinSummary::default()
        }

        fn accept(&self, _state: &RoundState) -> bool {
            false
        }
    }

    #[test]
    fn test_custom_hooks_drive_repeat() {
        let mut config = lines_config(100.0);
        config.ceilings.max_repeat_attempts = 3;
        let mode = config.bet_modes[0].clone();
        let engine = RoundEngine::with_hooks(&config, &mode, NeverAccept);
        assert!(matches!(
            engine.run(0, "0", 1),
            Err(SlotError::RepeatExhausted { attempts: 3, .. })
        ));
    }

    #[test]
    fn test_missing_scatter_weights_fault() {
        let mut config = lines_config(100.0);
        config.bet_modes[0].distributions[1].conditions = DistributionConditions {
            force_freegame: true,
            scatter_triggers: Some(WeightTable::default()),
            reel_weights: config.bet_modes[0].distributions[1].conditions.reel_weights.clone(),
            ..Default::default()
        };
        let engine = RoundEngine::new(&config, "base").unwrap();
        let err = engine.run(0, "freegame", 1).unwrap_err();
        assert!(matches!(err, SlotError::MissingScatterTriggers { .. }));
    }
}
