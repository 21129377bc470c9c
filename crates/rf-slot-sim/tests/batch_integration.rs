//! Batch Simulation Tests
//!
//! Full batches through the public API:
//! - Quota counts per criteria
//! - Reproducible batches and replayable rounds
//! - Published files feeding the losing-weight optimizer
//! - Force records indexing free spin triggers

use std::collections::BTreeSet;

use approx::assert_relative_eq;
use rf_slot_lut::{optimize_file, read_segmented, read_table, write_table};
use rf_slot_math::GameConfig;
use rf_slot_sim::{ModeRunner, SimulationConfig, read_books, simulate, worker_offset};

const SIM_GAME: &str = r#"
game_id: sim-lines
num_reels: 3
num_rows: [3, 3, 3]
paytable:
  - { symbol: H1, min: 3, max: 3, pay: 5.0 }
  - { symbol: L1, min: 3, max: 3, pay: 1.0 }
reels:
  BR0:
    - [H1, L1, L2, L1, H1, L2]
    - [L1, H1, L2, H1, L2, L1]
    - [L2, L1, H1, L2, L1, H1]
paylines:
  - [0, 0, 0]
  - [1, 1, 1]
  - [2, 2, 2]
evaluators:
  - type: lines
bet_modes:
  - name: base
    wincap: 100.0
    distributions:
      - criteria: "0"
        quota: 0.4
        win_criteria: { type: exact, value: 0.0 }
        conditions:
          reel_weights:
            basegame: [[BR0, 1]]
      - criteria: basegame
        quota: 0.6
        conditions:
          reel_weights:
            basegame: [[BR0, 1]]
"#;

const SCATTER_GAME: &str = r#"
game_id: sim-scatter
num_reels: 3
num_rows: [3, 3, 3]
paytable:
  - { symbol: H1, min: 3, max: 3, pay: 5.0 }
special_symbols:
  scatter: [S]
freespin_triggers:
  basegame: { "3": 5 }
reels:
  BR0:
    - [H1, L1, S, L2, L1, L2]
    - [L1, S, L2, H1, L2, L1]
    - [S, L1, H1, L2, L1, L2]
  BR1:
    - [H1, L1, L2, L1, H1, L2]
    - [L1, H1, L2, H1, L2, L1]
    - [L2, L1, H1, L2, L1, H1]
  FR0:
    - [H1, L1, L2, L1, H1, L2]
    - [L1, H1, L2, H1, L2, L1]
    - [L2, L1, H1, L2, L1, H1]
paylines:
  - [0, 0, 0]
  - [1, 1, 1]
  - [2, 2, 2]
evaluators:
  - type: lines
bet_modes:
  - name: base
    wincap: 100.0
    distributions:
      - criteria: "0"
        quota: 0.5
        win_criteria: { type: exact, value: 0.0 }
        conditions:
          reel_weights:
            basegame: [[BR1, 1]]
      - criteria: freegame
        quota: 0.5
        conditions:
          force_freegame: true
          scatter_triggers: [[3, 1]]
          reel_weights:
            basegame: [[BR0, 1]]
            freegame: [[FR0, 1]]
"#;

fn settings(workers: usize) -> SimulationConfig {
    SimulationConfig {
        num_sims: 50,
        base_seed: 2024,
        workers,
        keep_books: true,
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUOTAS & DETERMINISM
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_quota_counts_per_criteria() {
    init_logging();
    let config = GameConfig::from_yaml(SIM_GAME).unwrap();
    let result = ModeRunner::new(&config, "base", settings(3)).unwrap().run().unwrap();

    let aggregate = &result.aggregate;
    assert_eq!(aggregate.outcomes.len(), 50);
    assert!(aggregate.outcomes.iter().enumerate().all(|(i, o)| o.id == i as u64));
    assert_eq!(aggregate.stats["0"].count, 20);
    assert_eq!(aggregate.stats["basegame"].count, 30);
    assert_eq!(aggregate.stats["0"].total_win, 0.0);
    assert_eq!(aggregate.stats["0"].hits, 0);
}

#[test]
fn test_same_settings_reproduce_batch() {
    let config = GameConfig::from_yaml(SIM_GAME).unwrap();
    let first = ModeRunner::new(&config, "base", settings(4)).unwrap().run().unwrap();
    let second = ModeRunner::new(&config, "base", settings(4)).unwrap().run().unwrap();

    assert_eq!(first.aggregate.outcomes, second.aggregate.outcomes);
    assert_eq!(first.aggregate.books, second.aggregate.books);
    assert_eq!(first.lookup_table().format(), second.lookup_table().format());
}

#[test]
fn test_single_round_replays_from_index() {
    let config = GameConfig::from_yaml(SIM_GAME).unwrap();
    let runner = ModeRunner::new(&config, "base", settings(2)).unwrap();
    let result = runner.run().unwrap();

    for (worker, range) in runner.settings().chunks() {
        for sim in range {
            let replay = runner.run_round(sim, worker_offset(worker)).unwrap();
            let recorded = &result.aggregate.outcomes[sim as usize];
            assert_eq!(replay.criteria, recorded.criteria);
            assert_eq!(replay.final_win, recorded.payout);
        }
    }
    assert!(runner.run_round(50, worker_offset(0)).is_err());
}

#[test]
fn test_unknown_mode_is_configuration_fault() {
    let config = GameConfig::from_yaml(SIM_GAME).unwrap();
    let err = ModeRunner::new(&config, "missing", settings(1)).err().unwrap();
    assert!(err.is_configuration_fault());

    let empty = SimulationConfig {
        num_sims: 0,
        ..settings(1)
    };
    assert!(ModeRunner::new(&config, "base", empty).is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLISHED FILES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_published_files_and_optimizer() {
    init_logging();
    let config = GameConfig::from_yaml(SIM_GAME).unwrap();
    let results = simulate(&config, &settings(2)).unwrap();
    let result = &results["base"];

    let dir = tempfile::tempdir().unwrap();
    result.write(dir.path()).unwrap();

    let table_path = dir.path().join("lookUpTable_base_0.csv");
    let table = read_table(&table_path).unwrap();
    assert_eq!(table.len(), 50);
    assert_relative_eq!(table.rtp(1.0).unwrap(), result.rtp(), epsilon = 1e-9);

    let segmented = read_segmented(dir.path().join("lookUpTableSegmented_base.csv")).unwrap();
    assert_eq!(segmented.criteria(), BTreeSet::from(["0", "basegame"]));

    let books = read_books(dir.path().join("books_base.jsonl")).unwrap();
    assert_eq!(books.len(), 50);
    assert!(dir.path().join("stats_base.json").exists());

    // Reference with the same rows, first losing row three times as heavy
    let mut shape = table.weights();
    let first_losing = table.rows().iter().position(|r| !r.is_paying()).unwrap();
    shape[first_losing] = 3;
    let reference_path = dir.path().join("reference.csv");
    write_table(&reference_path, &table.with_weights(&shape).unwrap()).unwrap();

    let optimized = optimize_file(&table_path, &reference_path, 1.0).unwrap();
    let rewritten = read_table(&table_path).unwrap();
    assert_eq!(rewritten.total_weight(), table.total_weight());
    assert_eq!(rewritten.weights(), optimized.weights);
    assert!(rewritten.weights()[first_losing] >= 2);
    assert!(
        rewritten
            .rows()
            .iter()
            .filter(|r| r.is_paying())
            .all(|r| r.weight == 1)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// FORCE RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_force_file_lists_trigger_rounds() {
    init_logging();
    let config = GameConfig::from_yaml(SCATTER_GAME).unwrap();
    let one = simulate(&config, &settings(1)).unwrap();
    let four = simulate(&config, &settings(4)).unwrap();
    let result = &four["base"];
    assert_eq!(result.aggregate.force, one["base"].aggregate.force);

    let triggered: BTreeSet<u64> = result
        .aggregate
        .outcomes
        .iter()
        .filter(|o| o.criteria == "freegame")
        .map(|o| o.id)
        .collect();
    let found = result
        .aggregate
        .search(&[("kind", "3"), ("symbol", "scatter"), ("gametype", "basegame")]);
    assert_eq!(found, triggered);
    assert_eq!(triggered.len(), 25);

    let dir = tempfile::tempdir().unwrap();
    result.write(dir.path()).unwrap();
    let text = std::fs::read_to_string(dir.path().join("force_base.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), result.aggregate.force.len());
    let base = entries
        .iter()
        .find(|e| e["search"]["gametype"] == "basegame" && e["search"]["symbol"] == "scatter")
        .unwrap();
    let ids: Vec<u64> = base["book_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect();
    assert_eq!(ids, triggered.into_iter().collect::<Vec<_>>());
}
