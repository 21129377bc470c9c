//! Game configuration
//!
//! Configuration arrives as a plain serde document ([`GameConfigFile`]) and
//! is resolved by [`GameConfigLoader`] into an immutable [`GameConfig`]:
//! symbol names are interned, range paytables expanded and every
//! cross-reference checked. The resolved value is shared read-only by the
//! sampler, the round state machine and the orchestrator.
//!
//! ## Structure
//!
//! ```text
//! GameConfig
//!     ├── SymbolTable (names, special categories)
//!     ├── ReelSet per strip id
//!     ├── Paytable / Paylines
//!     ├── free spin trigger tables per game type
//!     ├── evaluators, features, attribute rules
//!     └── BetMode[]
//!           └── Distribution[] (criteria, quota, win criteria, conditions)
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::evaluate::EvaluatorSpec;
use crate::features::FeatureSpec;
use crate::paytable::{PayEntry, Payline, Paytable};
use crate::symbols::{ReelSet, ReelStrip, SymbolId, SymbolTable};
use crate::weights::WeightTable;

/// Category name used for free spin triggers and anticipation
pub const SCATTER: &str = "scatter";
/// Category name for wild substitution
pub const WILD: &str = "wild";

// ═══════════════════════════════════════════════════════════════════════════════
// GAME TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Which phase of a round a spin belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    #[serde(alias = "base")]
    BaseGame,
    #[serde(alias = "free")]
    FreeGame,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::BaseGame => write!(f, "basegame"),
            GameType::FreeGame => write!(f, "freegame"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISTRIBUTIONS & BET MODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Acceptance test applied to a round's final win
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WinCriteria {
    /// Final win must equal `value` (zero-win and wincap categories)
    Exact { value: f64 },
    /// Final win must lie strictly between `min` and `max`
    Range { min: f64, max: f64 },
}

impl WinCriteria {
    pub fn accepts(&self, final_win: f64) -> bool {
        match *self {
            WinCriteria::Exact { value } => (final_win - value).abs() < 1e-9,
            WinCriteria::Range { min, max } => final_win > min && final_win < max,
        }
    }
}

/// Named conditions bound while simulating one distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionConditions {
    /// Strip id weights per game type
    #[serde(default)]
    pub reel_weights: BTreeMap<GameType, WeightTable<String>>,
    /// Scatter count weights for forced free game entry
    #[serde(default)]
    pub scatter_triggers: Option<WeightTable<u32>>,
    #[serde(default)]
    pub force_freegame: bool,
    #[serde(default)]
    pub force_wincap: bool,
    /// Value tables by name, e.g. "bomb_values", "multiplier_values"
    #[serde(default)]
    pub value_tables: BTreeMap<String, BTreeMap<GameType, WeightTable<f64>>>,
    /// Scalar prizes by name, e.g. "bomb_prize"
    #[serde(default)]
    pub prizes: BTreeMap<String, BTreeMap<GameType, f64>>,
}

impl DistributionConditions {
    pub fn value_table(&self, name: &str, game_type: GameType) -> Option<&WeightTable<f64>> {
        self.value_tables.get(name)?.get(&game_type)
    }

    pub fn prize(&self, name: &str, game_type: GameType) -> Option<f64> {
        self.prizes.get(name)?.get(&game_type).copied()
    }
}

/// A named outcome category with its share of the simulation budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub criteria: String,
    pub quota: f64,
    #[serde(default)]
    pub win_criteria: Option<WinCriteria>,
    #[serde(default)]
    pub conditions: DistributionConditions,
}

impl Distribution {
    pub fn new(criteria: impl Into<String>, quota: f64) -> Self {
        Self {
            criteria: criteria.into(),
            quota,
            win_criteria: None,
            conditions: DistributionConditions::default(),
        }
    }

    pub fn with_win_criteria(mut self, criteria: WinCriteria) -> Self {
        self.win_criteria = Some(criteria);
        self
    }

    pub fn with_conditions(mut self, conditions: DistributionConditions) -> Self {
        self.conditions = conditions;
        self
    }
}

/// A purchasable entry point with its own cost, cap and distributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetMode {
    pub name: String,
    #[serde(default = "default_cost")]
    pub cost: f64,
    /// Maximum payout multiple for a round
    pub wincap: f64,
    /// Bonus-buy style mode that always enters the feature
    #[serde(default)]
    pub is_feature: bool,
    /// Modifiers that apply only in this mode
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    pub distributions: Vec<Distribution>,
}

fn default_cost() -> f64 {
    1.0
}

impl BetMode {
    pub fn distribution(&self, criteria: &str) -> Option<&Distribution> {
        self.distributions.iter().find(|d| d.criteria == criteria)
    }

    pub fn quota_sum(&self) -> f64 {
        self.distributions.iter().map(|d| d.quota).sum()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTE RULES & CEILINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// How a special symbol receives its value when it lands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeRule {
    /// Draw a multiplier from the named value table
    Multiplier { table: String },
    /// Draw a bomb value from `table` and attach the prize named `prize`
    Bomb { table: String, prize: String },
}

/// Attempt ceilings for bounded searches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ceilings {
    #[serde(default = "default_force_attempts")]
    pub max_force_attempts: u32,
    #[serde(default = "default_avoid_attempts")]
    pub max_avoid_trigger_attempts: u32,
    #[serde(default = "default_repeat_attempts")]
    pub max_repeat_attempts: u32,
}

fn default_force_attempts() -> u32 {
    2000
}

fn default_avoid_attempts() -> u32 {
    500
}

fn default_repeat_attempts() -> u32 {
    10_000
}

impl Default for Ceilings {
    fn default() -> Self {
        Self {
            max_force_attempts: default_force_attempts(),
            max_avoid_trigger_attempts: default_avoid_attempts(),
            max_repeat_attempts: default_repeat_attempts(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Game configuration as authored (JSON or YAML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfigFile {
    pub game_id: String,
    pub num_reels: usize,
    /// Visible rows per reel
    pub num_rows: Vec<usize>,
    pub paytable: Vec<PayEntry>,
    /// Category → symbol names
    #[serde(default)]
    pub special_symbols: BTreeMap<String, Vec<String>>,
    /// Game type → scatter count → spins granted
    #[serde(default)]
    pub freespin_triggers: BTreeMap<GameType, BTreeMap<u32, u32>>,
    /// Overrides the default of (smallest trigger count − 1)
    #[serde(default)]
    pub anticipation_threshold: BTreeMap<GameType, u32>,
    /// Strip id → per-reel symbol names
    pub reels: BTreeMap<String, Vec<Vec<String>>>,
    #[serde(default)]
    pub paylines: Vec<Vec<usize>>,
    pub evaluators: Vec<EvaluatorSpec>,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    /// Symbol name → attribute rule
    #[serde(default)]
    pub attribute_rules: BTreeMap<String, AttributeRule>,
    #[serde(default = "default_true")]
    pub include_padding: bool,
    /// Ascending win-multiple thresholds for win levels
    #[serde(default)]
    pub win_levels: Vec<f64>,
    #[serde(default)]
    pub ceilings: Ceilings,
    pub bet_modes: Vec<BetMode>,
}

fn default_true() -> bool {
    true
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLVED CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolved, validated game configuration
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub game_id: String,
    pub num_reels: usize,
    pub num_rows: Vec<usize>,
    pub symbols: SymbolTable,
    pub paytable: Paytable,
    pub paylines: Vec<Payline>,
    pub freespin_triggers: BTreeMap<GameType, BTreeMap<u32, u32>>,
    pub anticipation_threshold: BTreeMap<GameType, u32>,
    pub reel_sets: BTreeMap<String, ReelSet>,
    pub evaluators: Vec<EvaluatorSpec>,
    pub features: Vec<FeatureSpec>,
    pub attribute_rules: HashMap<SymbolId, AttributeRule>,
    pub include_padding: bool,
    pub win_levels: Vec<f64>,
    pub ceilings: Ceilings,
    pub bet_modes: Vec<BetMode>,
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        GameConfigLoader::new().load_json(json)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        GameConfigLoader::new().load_yaml(yaml)
    }

    pub fn bet_mode(&self, name: &str) -> Result<&BetMode, ConfigError> {
        self.bet_modes
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ConfigError::BetMode {
                mode: name.to_string(),
                reason: "not defined".into(),
            })
    }

    pub fn reel_set(&self, id: &str) -> Result<&ReelSet, ConfigError> {
        self.reel_sets
            .get(id)
            .ok_or_else(|| ConfigError::UnknownStrip(id.to_string()))
    }

    /// Smallest scatter count that triggers free spins in `game_type`
    pub fn min_trigger(&self, game_type: GameType) -> Option<u32> {
        self.freespin_triggers
            .get(&game_type)?
            .keys()
            .next()
            .copied()
    }

    /// Spins granted for `count` scatters; counts above the table pay its top entry
    pub fn spins_for(&self, game_type: GameType, count: u32) -> Option<u32> {
        let table = self.freespin_triggers.get(&game_type)?;
        table
            .range(..=count)
            .next_back()
            .map(|(_, spins)| *spins)
    }

    /// Running scatter count at which anticipation arms
    pub fn anticipation_for(&self, game_type: GameType) -> u32 {
        self.anticipation_threshold
            .get(&game_type)
            .copied()
            .or_else(|| self.min_trigger(game_type).map(|t| t.saturating_sub(1)))
            .unwrap_or(0)
    }

    /// Win level for a payout multiple: number of thresholds reached
    pub fn win_level(&self, win: f64) -> u8 {
        self.win_levels.iter().filter(|&&t| win >= t).count() as u8
    }

    pub fn is_category(&self, id: SymbolId, category: &str) -> bool {
        self.symbols.in_category(id, category)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOADER
// ═══════════════════════════════════════════════════════════════════════════════

/// Size limits enforced before resolving a document
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    pub max_name_length: usize,
    pub max_symbols: usize,
    pub max_reels: usize,
    pub max_rows: usize,
    pub max_strip_length: usize,
    pub max_paylines: usize,
    pub max_bet_modes: usize,
    pub max_pay_value: f64,
    /// Largest count a paytable tier may cover
    pub max_pay_count: u32,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_name_length: 256,
            max_symbols: 256,
            max_reels: 12,
            max_rows: 12,
            max_strip_length: 10_000,
            max_paylines: 1024,
            max_bet_modes: 32,
            max_pay_value: 1_000_000.0,
            max_pay_count: 1024,
        }
    }
}

/// Parses and resolves game configuration documents
#[derive(Debug, Clone, Default)]
pub struct GameConfigLoader {
    pub limits: ConfigLimits,
}

impl GameConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    pub fn load_json(&self, json: &str) -> Result<GameConfig, ConfigError> {
        let file: GameConfigFile =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        self.resolve(file)
    }

    pub fn load_yaml(&self, yaml: &str) -> Result<GameConfig, ConfigError> {
        let file: GameConfigFile =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        self.resolve(file)
    }

    /// Check limits, intern names and validate cross-references
    pub fn resolve(&self, file: GameConfigFile) -> Result<GameConfig, ConfigError> {
        self.check_limits(&file)?;

        if file.num_rows.len() != file.num_reels || file.num_reels == 0 {
            return Err(ConfigError::Grid(format!(
                "{} row counts for {} reels",
                file.num_rows.len(),
                file.num_reels
            )));
        }
        if file.num_rows.contains(&0) {
            return Err(ConfigError::Grid("reel with zero rows".into()));
        }

        let mut symbols = SymbolTable::new();
        let paytable = Paytable::from_ranges(&file.paytable, &mut symbols)?;
        for (category, names) in &file.special_symbols {
            for name in names {
                symbols.add_category(name, category);
            }
        }

        let mut reel_sets = BTreeMap::new();
        for (strip_id, columns) in &file.reels {
            if columns.len() != file.num_reels {
                return Err(ConfigError::InvalidStrip {
                    strip: strip_id.clone(),
                    reason: format!("{} reels, expected {}", columns.len(), file.num_reels),
                });
            }
            let mut strips = Vec::with_capacity(columns.len());
            for (reel, names) in columns.iter().enumerate() {
                if names.len() < file.num_rows[reel] {
                    return Err(ConfigError::InvalidStrip {
                        strip: strip_id.clone(),
                        reason: format!(
                            "reel {reel} has {} symbols, shorter than its {} rows",
                            names.len(),
                            file.num_rows[reel]
                        ),
                    });
                }
                let ids = names.iter().map(|n| symbols.intern(n)).collect();
                strips.push(ReelStrip::new(reel, ids));
            }
            reel_sets.insert(
                strip_id.clone(),
                ReelSet {
                    id: strip_id.clone(),
                    strips,
                },
            );
        }

        let paylines: Vec<Payline> = file
            .paylines
            .iter()
            .enumerate()
            .map(|(index, rows)| Payline::new(index, rows.clone()))
            .collect();
        for line in &paylines {
            line.validate(&file.num_rows)?;
        }

        let mut attribute_rules = HashMap::new();
        for (name, rule) in &file.attribute_rules {
            let id = symbols.id(name).ok_or_else(|| ConfigError::UnknownSymbol {
                symbol: name.clone(),
                context: "attribute_rules".into(),
            })?;
            attribute_rules.insert(id, rule.clone());
        }

        let config = GameConfig {
            game_id: file.game_id,
            num_reels: file.num_reels,
            num_rows: file.num_rows,
            symbols,
            paytable,
            paylines,
            freespin_triggers: file.freespin_triggers,
            anticipation_threshold: file.anticipation_threshold,
            reel_sets,
            evaluators: file.evaluators,
            features: file.features,
            attribute_rules,
            include_padding: file.include_padding,
            win_levels: file.win_levels,
            ceilings: file.ceilings,
            bet_modes: file.bet_modes,
        };
        validate(&config)?;
        log::debug!(
            "resolved game '{}': {} symbols, {} strip sets, {} bet modes",
            config.game_id,
            config.symbols.len(),
            config.reel_sets.len(),
            config.bet_modes.len()
        );
        Ok(config)
    }

    fn check_limits(&self, file: &GameConfigFile) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if file.game_id.len() > limits.max_name_length {
            return Err(ConfigError::Limit(format!(
                "game id too long: {} > {}",
                file.game_id.len(),
                limits.max_name_length
            )));
        }
        if file.num_reels > limits.max_reels {
            return Err(ConfigError::Limit(format!(
                "too many reels: {} > {}",
                file.num_reels, limits.max_reels
            )));
        }
        if let Some(rows) = file.num_rows.iter().find(|&&r| r > limits.max_rows) {
            return Err(ConfigError::Limit(format!(
                "too many rows: {} > {}",
                rows, limits.max_rows
            )));
        }
        if file.paylines.len() > limits.max_paylines {
            return Err(ConfigError::Limit(format!(
                "too many paylines: {} > {}",
                file.paylines.len(),
                limits.max_paylines
            )));
        }
        if file.bet_modes.len() > limits.max_bet_modes {
            return Err(ConfigError::Limit(format!(
                "too many bet modes: {} > {}",
                file.bet_modes.len(),
                limits.max_bet_modes
            )));
        }
        for columns in file.reels.values() {
            if let Some(len) = columns
                .iter()
                .map(Vec::len)
                .find(|&len| len > limits.max_strip_length)
            {
                return Err(ConfigError::Limit(format!(
                    "reel strip too long: {} > {}",
                    len, limits.max_strip_length
                )));
            }
        }
        if let Some(entry) = file.paytable.iter().find(|e| e.pay > limits.max_pay_value) {
            return Err(ConfigError::Limit(format!(
                "pay for '{}' too large: {} > {}",
                entry.symbol, entry.pay, limits.max_pay_value
            )));
        }
        if let Some(entry) = file.paytable.iter().find(|e| e.max > limits.max_pay_count) {
            return Err(ConfigError::Limit(format!(
                "paytable tier for '{}' reaches count {} > {}",
                entry.symbol, entry.max, limits.max_pay_count
            )));
        }
        let distinct: std::collections::BTreeSet<&str> = file
            .reels
            .values()
            .flatten()
            .flatten()
            .map(String::as_str)
            .chain(file.paytable.iter().map(|e| e.symbol.as_str()))
            .collect();
        if distinct.len() > limits.max_symbols {
            return Err(ConfigError::Limit(format!(
                "too many symbols: {} > {}",
                distinct.len(),
                limits.max_symbols
            )));
        }
        Ok(())
    }
}

/// Cross-reference checks on a resolved configuration
fn validate(config: &GameConfig) -> Result<(), ConfigError> {
    if config.reel_sets.is_empty() {
        return Err(ConfigError::InvalidStrip {
            strip: "<none>".into(),
            reason: "no reel strips defined".into(),
        });
    }
    if config.evaluators.is_empty() {
        return Err(ConfigError::Grid("no win evaluators configured".into()));
    }
    for evaluator in &config.evaluators {
        evaluator.validate(config)?;
    }
    for feature in config
        .features
        .iter()
        .chain(config.bet_modes.iter().flat_map(|m| m.features.iter()))
    {
        feature.validate(config)?;
    }
    for (game_type, table) in &config.freespin_triggers {
        if table.is_empty() {
            return Err(ConfigError::MissingTriggers(*game_type));
        }
    }

    if config.bet_modes.is_empty() {
        return Err(ConfigError::BetMode {
            mode: "<none>".into(),
            reason: "no bet modes defined".into(),
        });
    }
    for mode in &config.bet_modes {
        if mode.distributions.is_empty() {
            return Err(ConfigError::BetMode {
                mode: mode.name.clone(),
                reason: "no distributions".into(),
            });
        }
        if mode.wincap.is_nan() || mode.wincap <= 0.0 || mode.cost.is_nan() || mode.cost <= 0.0 {
            return Err(ConfigError::BetMode {
                mode: mode.name.clone(),
                reason: format!("cost {} and wincap {} must be positive", mode.cost, mode.wincap),
            });
        }
        let sum = mode.quota_sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::QuotaSum {
                mode: mode.name.clone(),
                sum,
            });
        }
        for dist in &mode.distributions {
            validate_distribution(config, mode, dist)?;
        }
    }
    Ok(())
}

fn validate_distribution(
    config: &GameConfig,
    mode: &BetMode,
    dist: &Distribution,
) -> Result<(), ConfigError> {
    let fault = |reason: String| ConfigError::Distribution {
        mode: mode.name.clone(),
        criteria: dist.criteria.clone(),
        reason,
    };

    if dist.quota < 0.0 {
        return Err(fault(format!("negative quota {}", dist.quota)));
    }
    let base_weights = dist
        .conditions
        .reel_weights
        .get(&GameType::BaseGame)
        .ok_or_else(|| fault("missing basegame reel weights".into()))?;
    if base_weights.is_empty() {
        return Err(fault("basegame reel weights have zero total".into()));
    }
    for weights in dist.conditions.reel_weights.values() {
        for (strip, _) in weights.iter() {
            if !config.reel_sets.contains_key(strip) {
                return Err(ConfigError::UnknownStrip(strip.clone()));
            }
        }
    }
    if dist.conditions.force_freegame {
        let triggers = dist
            .conditions
            .scatter_triggers
            .as_ref()
            .ok_or_else(|| fault("force_freegame without scatter_triggers".into()))?;
        if triggers.is_empty() {
            return Err(fault("scatter_triggers have zero total".into()));
        }
        let min = config
            .min_trigger(GameType::BaseGame)
            .ok_or(ConfigError::MissingTriggers(GameType::BaseGame))?;
        if let Some((count, _)) = triggers.iter().find(|(c, w)| *w > 0 && *c < min) {
            return Err(fault(format!("scatter trigger count {count} below minimum {min}")));
        }
        if !dist.conditions.reel_weights.contains_key(&GameType::FreeGame) {
            return Err(fault("force_freegame without freegame reel weights".into()));
        }
    }
    if let Some(WinCriteria::Exact { value }) = dist.win_criteria {
        if value > mode.wincap {
            return Err(fault(format!("win criteria {value} above wincap {}", mode.wincap)));
        }
    }
    Ok(())
}
