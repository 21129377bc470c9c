//! Simulation orchestrator
//!
//! A [`ModeRunner`] owns the criteria plan of one bet mode: every
//! simulation index is bound to a distribution up front, so a round can be
//! replayed from `(index, worker offset)` alone. Batches split the index
//! range into one contiguous chunk per worker and run the chunks on a rayon
//! pool; finished rounds go to a shared [`Aggregator`].

use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rf_slot_lut::{LookupTable, write_segmented, write_table};
use rf_slot_math::{GameConfig, RoundEngine, RoundHooks, RoundState, StandardHooks};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Aggregator};
use crate::book::write_books;
use crate::error::{Result, SimError};
use crate::quota::assign_criteria;
use crate::seed::{MAX_SIMULATIONS, simulation_seed, worker_offset};

/// Batch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_num_sims")]
    pub num_sims: u64,
    #[serde(default)]
    pub base_seed: u64,
    /// Worker threads, 0 for one per logical CPU
    #[serde(default)]
    pub workers: usize,
    /// Keep full event logs for the books file
    #[serde(default)]
    pub keep_books: bool,
}

fn default_num_sims() -> u64 {
    10_000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_sims: default_num_sims(),
            base_seed: 0,
            workers: 0,
            keep_books: false,
        }
    }
}

impl SimulationConfig {
    pub fn worker_count(&self) -> usize {
        let workers = if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        };
        workers.max(1)
    }

    /// Contiguous index range of each worker
    pub fn chunks(&self) -> Vec<(usize, Range<u64>)> {
        let workers = self.worker_count() as u64;
        let size = self.num_sims.div_ceil(workers).max(1);
        (0..workers)
            .map(|w| (w as usize, (w * size).min(self.num_sims)..((w + 1) * size).min(self.num_sims)))
            .filter(|(_, range)| !range.is_empty())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODE RUNNER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct ModeRunner<'c, H: RoundHooks = StandardHooks> {
    engine: RoundEngine<'c, H>,
    settings: SimulationConfig,
    plan: Vec<usize>,
}

impl<'c> ModeRunner<'c, StandardHooks> {
    pub fn new(config: &'c GameConfig, mode_name: &str, settings: SimulationConfig) -> Result<Self> {
        Self::from_engine(RoundEngine::new(config, mode_name)?, settings)
    }
}

impl<'c, H: RoundHooks> ModeRunner<'c, H> {
    pub fn from_engine(engine: RoundEngine<'c, H>, settings: SimulationConfig) -> Result<Self> {
        if settings.num_sims == 0 || settings.num_sims > MAX_SIMULATIONS {
            return Err(SimError::Quota(format!(
                "simulation budget {} outside 1..={}",
                settings.num_sims, MAX_SIMULATIONS
            )));
        }
        let plan = assign_criteria(engine.mode(), settings.num_sims, settings.base_seed)?;
        Ok(Self {
            engine,
            settings,
            plan,
        })
    }

    pub fn mode_name(&self) -> &str {
        &self.engine.mode().name
    }

    pub fn settings(&self) -> &SimulationConfig {
        &self.settings
    }

    /// Criteria bound to a simulation index
    pub fn criteria_of(&self, sim_index: u64) -> Option<&str> {
        let index = *self.plan.get(usize::try_from(sim_index).ok()?)?;
        Some(self.engine.mode().distributions[index].criteria.as_str())
    }

    /// Play one simulation to an accepted round
    pub fn run_round(&self, sim_index: u64, worker_offset: u64) -> Result<RoundState> {
        let criteria = self.criteria_of(sim_index).ok_or_else(|| {
            SimError::Quota(format!(
                "simulation {sim_index} outside the budget of {}",
                self.settings.num_sims
            ))
        })?;
        let seed = simulation_seed(self.settings.base_seed, worker_offset, sim_index);
        self.engine
            .run(sim_index, criteria, seed)
            .map_err(|source| SimError::Round {
                mode: self.mode_name().to_string(),
                sim: sim_index,
                source,
            })
    }

    /// Run the whole budget on the worker pool
    pub fn run(&self) -> Result<ModeResult> {
        let workers = self.settings.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| SimError::Pool(e.to_string()))?;

        let sink = Aggregator::new(self.settings.keep_books);
        let chunks = self.settings.chunks();
        pool.install(|| {
            chunks.par_iter().try_for_each(|(worker, range)| -> Result<()> {
                let offset = worker_offset(*worker);
                for sim in range.clone() {
                    let round = self.run_round(sim, offset)?;
                    sink.record(&round)?;
                }
                Ok(())
            })
        })?;

        let aggregate = sink.finish();
        let cost = self.engine.mode().cost;
        log::info!(
            "bet mode '{}': {} simulations on {} workers, rtp {:.4}",
            self.mode_name(),
            aggregate.outcomes.len(),
            workers,
            aggregate.rtp(cost)
        );
        Ok(ModeResult {
            mode: self.mode_name().to_string(),
            cost,
            aggregate,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Finished batch of one bet mode
#[derive(Debug, Clone)]
pub struct ModeResult {
    pub mode: String,
    pub cost: f64,
    pub aggregate: Aggregate,
}

impl ModeResult {
    pub fn rtp(&self) -> f64 {
        self.aggregate.rtp(self.cost)
    }

    pub fn lookup_table(&self) -> LookupTable {
        self.aggregate.lookup_table()
    }

    /// Write lookup tables, statistics, force records and (if kept) books
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| SimError::io(dir, e))?;

        write_table(dir.join(format!("lookUpTable_{}_0.csv", self.mode)), &self.lookup_table())?;
        write_segmented(
            dir.join(format!("lookUpTableSegmented_{}.csv", self.mode)),
            &self.aggregate.segmented_table(),
        )?;
        write_json(dir.join(format!("stats_{}.json", self.mode)), &self.aggregate.stats)?;
        write_json(dir.join(format!("force_{}.json", self.mode)), &self.aggregate.force)?;

        if !self.aggregate.books.is_empty() {
            write_books(dir.join(format!("books_{}.jsonl", self.mode)), &self.aggregate.books)?;
        }
        Ok(())
    }
}

fn write_json<T: Serialize + ?Sized>(path: PathBuf, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| SimError::io(&path, e.into()))?;
    fs::write(&path, text).map_err(|e| SimError::io(&path, e))
}

/// Run every bet mode of a game with the same settings
pub fn simulate(config: &GameConfig, settings: &SimulationConfig) -> Result<BTreeMap<String, ModeResult>> {
    let mut results = BTreeMap::new();
    for mode in &config.bet_modes {
        let runner = ModeRunner::new(config, &mode.name, settings.clone())?;
        results.insert(mode.name.clone(), runner.run()?);
    }
    Ok(results)
}
