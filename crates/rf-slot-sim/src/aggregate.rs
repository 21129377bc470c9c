//! Aggregation of finished rounds
//!
//! Workers push outcomes into a shared sink keyed by simulation id. The
//! merge is an insert into an ordered map, so the finished tables and
//! statistics do not depend on which worker finished first.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;
use rf_slot_lut::{LookupTable, SegmentedRow, SegmentedTable};
use rf_slot_math::{ForceRecord, RoundState, round_win};
use serde::{Deserialize, Serialize};

use crate::book::Book;
use crate::error::{Result, SimError};

/// What the lookup tables need from one finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: u64,
    pub criteria: String,
    pub payout: f64,
    pub base_game_win: f64,
    pub free_game_win: f64,
    pub wincap: bool,
    pub attempts: u32,
}

impl Outcome {
    pub fn from_round(state: &RoundState) -> Self {
        Self {
            id: state.sim_index,
            criteria: state.criteria.clone(),
            payout: state.final_win,
            base_game_win: round_win(state.wins.base_game_wins),
            free_game_win: round_win(state.wins.free_game_wins),
            wincap: state.wincap_triggered,
            attempts: state.attempt + 1,
        }
    }
}

/// Per-criteria statistics of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaStats {
    pub count: u64,
    pub hits: u64,
    pub total_win: f64,
    pub max_win: f64,
    pub wincap_hits: u64,
    /// Round attempts including discarded repeats
    pub attempts: u64,
}

impl CriteriaStats {
    fn add(&mut self, outcome: &Outcome) {
        self.count += 1;
        if outcome.payout > 0.0 {
            self.hits += 1;
        }
        self.total_win += outcome.payout;
        self.max_win = self.max_win.max(outcome.payout);
        if outcome.wincap {
            self.wincap_hits += 1;
        }
        self.attempts += outcome.attempts as u64;
    }

    pub fn hit_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.hits as f64 / self.count as f64
        }
    }

    pub fn average_win(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_win / self.count as f64
        }
    }

    /// Share of the mode's RTP coming from this criteria
    pub fn rtp_contribution(&self, total_sims: u64, cost: f64) -> f64 {
        if total_sims == 0 {
            0.0
        } else {
            self.total_win / total_sims as f64 / cost
        }
    }
}

/// Every simulation that produced one force descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceEntry {
    pub search: ForceRecord,
    /// Occurrences across all simulations, repeats within a round included
    pub times_triggered: u64,
    pub book_ids: Vec<u64>,
}

#[derive(Default)]
struct ForceTally {
    times_triggered: u64,
    book_ids: BTreeSet<u64>,
}

#[derive(Default)]
struct SinkState {
    outcomes: BTreeMap<u64, Outcome>,
    books: BTreeMap<u64, Book>,
    force: BTreeMap<ForceRecord, ForceTally>,
}

/// Shared, order-independent collection point for worker results
pub struct Aggregator {
    keep_books: bool,
    state: Mutex<SinkState>,
}

impl Aggregator {
    pub fn new(keep_books: bool) -> Self {
        Self {
            keep_books,
            state: Mutex::new(SinkState::default()),
        }
    }

    pub fn record(&self, round: &RoundState) -> Result<()> {
        let outcome = Outcome::from_round(round);
        let book = self.keep_books.then(|| Book::from_round(round));

        let mut state = self.state.lock();
        if state.outcomes.contains_key(&outcome.id) {
            return Err(SimError::DuplicateSimulation(outcome.id));
        }
        if let Some(book) = book {
            state.books.insert(book.id, book);
        }
        for record in &round.records {
            let tally = state.force.entry(record.clone()).or_default();
            tally.times_triggered += 1;
            tally.book_ids.insert(outcome.id);
        }
        state.outcomes.insert(outcome.id, outcome);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state.lock().outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(self) -> Aggregate {
        let state = self.state.into_inner();
        let mut stats: BTreeMap<String, CriteriaStats> = BTreeMap::new();
        for outcome in state.outcomes.values() {
            stats.entry(outcome.criteria.clone()).or_default().add(outcome);
        }
        let force = state
            .force
            .into_iter()
            .map(|(search, tally)| ForceEntry {
                search,
                times_triggered: tally.times_triggered,
                book_ids: tally.book_ids.into_iter().collect(),
            })
            .collect();
        Aggregate {
            outcomes: state.outcomes.into_values().collect(),
            books: state.books.into_values().collect(),
            stats,
            force,
        }
    }
}

/// Finished batch of one bet mode, in simulation id order
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub outcomes: Vec<Outcome>,
    pub books: Vec<Book>,
    pub stats: BTreeMap<String, CriteriaStats>,
    /// Force descriptors in descriptor order
    pub force: Vec<ForceEntry>,
}

impl Aggregate {
    /// One row per simulation with unit weight
    pub fn lookup_table(&self) -> LookupTable {
        LookupTable::from_rows(self.outcomes.iter().map(|o| (o.id, 1, o.payout)))
    }

    pub fn segmented_table(&self) -> SegmentedTable {
        SegmentedTable::new(
            self.outcomes
                .iter()
                .map(|o| SegmentedRow {
                    id: o.id,
                    criteria: o.criteria.clone(),
                    base_game_win: o.base_game_win,
                    free_game_win: o.free_game_win,
                })
                .collect(),
        )
    }

    /// Simulations with a descriptor containing every `(key, value)` pair
    pub fn search<'a>(&self, conditions: &[(&'a str, &'a str)]) -> BTreeSet<u64> {
        self.force
            .iter()
            .filter(|entry| entry.search.matches(conditions.iter().copied()))
            .flat_map(|entry| entry.book_ids.iter().copied())
            .collect()
    }

    pub fn total_win(&self) -> f64 {
        self.outcomes.iter().map(|o| o.payout).sum()
    }

    pub fn rtp(&self, cost: f64) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.total_win() / self.outcomes.len() as f64 / cost
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rf_slot_math::GameType;

    fn round(sim: u64, criteria: &str, win: f64) -> RoundState {
        let mut state = RoundState::new(sim, sim, 0, "base", criteria);
        state.final_win = win;
        state.wins.base_game_wins = win;
        state
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let rounds = vec![
            round(0, "0", 0.0),
            round(1, "basegame", 1.2),
            round(2, "basegame", 0.0),
            round(3, "freegame", 40.0),
        ];

        let forward = Aggregator::new(false);
        rounds.iter().for_each(|r| forward.record(r).unwrap());
        let backward = Aggregator::new(false);
        rounds.iter().rev().for_each(|r| backward.record(r).unwrap());

        let a = forward.finish();
        let b = backward.finish();
        assert_eq!(a.outcomes, b.outcomes);
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.lookup_table().format(), "0,1,0.00\n1,1,1.20\n2,1,0.00\n3,1,40.00\n");
    }

    #[test]
    fn test_criteria_stats() {
        let sink = Aggregator::new(true);
        for r in [round(0, "basegame", 2.0), round(1, "basegame", 0.0), round(2, "freegame", 8.0)] {
            sink.record(&r).unwrap();
        }
        let aggregate = sink.finish();
        assert_eq!(aggregate.books.len(), 3);

        let base = &aggregate.stats["basegame"];
        assert_eq!(base.count, 2);
        assert_relative_eq!(base.hit_rate(), 0.5);
        assert_relative_eq!(base.average_win(), 1.0);
        assert_relative_eq!(base.rtp_contribution(3, 1.0), 2.0 / 3.0);
        assert_relative_eq!(aggregate.rtp(1.0), 10.0 / 3.0);
        assert_eq!(aggregate.stats["freegame"].max_win, 8.0);
    }

    #[test]
    fn test_force_records_merge_by_descriptor() {
        let scatter4 = ForceRecord::trigger(4, "scatter", GameType::BaseGame);
        let scatter3 = ForceRecord::trigger(3, "scatter", GameType::FreeGame);

        let mut a = round(7, "freegame", 20.0);
        a.records = vec![scatter4.clone(), scatter3.clone(), scatter3.clone()];
        let mut b = round(2, "freegame", 12.0);
        b.records = vec![scatter4.clone()];
        let c = round(4, "basegame", 1.0);

        let forward = Aggregator::new(false);
        for r in [&a, &b, &c] {
            forward.record(r).unwrap();
        }
        let backward = Aggregator::new(false);
        for r in [&c, &b, &a] {
            backward.record(r).unwrap();
        }
        let merged = forward.finish();
        assert_eq!(merged.force, backward.finish().force);

        let base = merged.force.iter().find(|e| e.search == scatter4).unwrap();
        assert_eq!(base.times_triggered, 2);
        assert_eq!(base.book_ids, vec![2, 7]);
        let retrigger = merged.force.iter().find(|e| e.search == scatter3).unwrap();
        assert_eq!(retrigger.times_triggered, 2);
        assert_eq!(retrigger.book_ids, vec![7]);

        assert_eq!(merged.search(&[("symbol", "scatter")]), BTreeSet::from([2, 7]));
        assert_eq!(merged.search(&[("gametype", "freegame")]), BTreeSet::from([7]));
        assert!(merged.search(&[("symbol", "B")]).is_empty());
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let sink = Aggregator::new(false);
        sink.record(&round(5, "0", 0.0)).unwrap();
        assert!(matches!(
            sink.record(&round(5, "0", 0.0)),
            Err(SimError::DuplicateSimulation(5))
        ));
    }
}
