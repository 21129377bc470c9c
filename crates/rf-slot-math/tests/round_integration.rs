//! End-to-End Round Tests
//!
//! Plays complete rounds through the public API:
//! - Forced free game entry on a 6x5 cluster game
//! - Bomb guarantee with drawn bomb values
//! - Expanding wilds on a YAML-configured lines game

use approx::assert_relative_eq;
use rf_slot_math::{EventKind, GameConfig, GameType, RoundEngine, WinKind};

const CLUSTER_GAME: &str = r#"{
    "game_id": "cluster-6x5",
    "num_reels": 6,
    "num_rows": [5, 5, 5, 5, 5, 5],
    "paytable": [
        {"symbol": "H1", "min": 5, "max": 7, "pay": 2.0},
        {"symbol": "H1", "min": 8, "max": 30, "pay": 10.0},
        {"symbol": "L1", "min": 5, "max": 30, "pay": 0.5},
        {"symbol": "L2", "min": 5, "max": 30, "pay": 0.4}
    ],
    "special_symbols": {"scatter": ["S"], "bomb": ["B"]},
    "freespin_triggers": {"basegame": {"3": 8, "4": 12, "5": 16, "6": 20}},
    "reels": {
        "BR0": [
            ["H1","L1","L2","L3","S","L1","L2","L3","H1","L2","L3","L1","L2","L3","L1","L2","L3","L1","L2","L3"],
            ["L2","L3","H1","L1","L2","L3","L1","S","L2","L3","L1","L2","H1","L3","L1","L2","L3","L1","L2","L3"],
            ["L3","L1","L2","S","L3","L1","H1","L2","L3","L1","L2","L3","L1","L2","H1","L3","L1","L2","L3","L1"],
            ["L1","L2","L3","L1","L2","H1","L3","L1","L2","L3","S","L1","L2","L3","L1","H1","L2","L3","L1","L2"],
            ["L2","L3","L1","L2","L3","L1","L2","H1","L3","L1","L2","L3","S","L1","L2","L3","H1","L1","L2","L3"],
            ["L3","L1","L2","L3","L1","L2","L3","L1","H1","L2","L3","L1","L2","L3","L1","S","L2","L3","H1","L1"]
        ],
        "FR0": [
            ["H1","L1","L2","L3","H1","L1","L2","L3","H1","L2"],
            ["L2","L3","H1","L1","L2","L3","L1","H1","L2","L3"],
            ["L3","L1","L2","H1","L3","L1","H1","L2","L3","L1"],
            ["L1","L2","L3","L1","L2","H1","L3","L1","L2","H1"],
            ["L2","L3","L1","L2","L3","L1","L2","H1","L3","L1"],
            ["L3","L1","L2","L3","L1","L2","L3","L1","H1","L2"]
        ],
        "BRB": [
            ["B","L1","L2","L3","L1","L2","L3","L1","L2","L3"],
            ["L2","L3","L1","L2","B","L3","L1","L2","L3","L1"],
            ["L3","L1","L2","L3","L1","L2","L3","B","L1","L2"],
            ["L1","L2","L3","L1","L2","L3","L1","L2","L3","L1"],
            ["L2","L3","L1","L2","L3","L1","L2","L3","L1","L2"],
            ["L3","L1","L2","L3","L1","L2","L3","L1","L2","L3"]
        ]
    },
    "evaluators": [{"type": "cluster", "min_cluster": 5}, {"type": "bombs"}],
    "attribute_rules": {"B": {"type": "bomb", "table": "bomb_values", "prize": "bomb_prize"}},
    "win_levels": [1.0, 5.0, 15.0, 50.0],
    "bet_modes": [
        {
            "name": "base",
            "wincap": 5000.0,
            "distributions": [
                {"criteria": "0", "quota": 0.5, "win_criteria": {"type": "exact", "value": 0.0},
                 "conditions": {"reel_weights": {"basegame": [["BR0", 1]]}}},
                {"criteria": "freegame", "quota": 0.5,
                 "conditions": {
                    "force_freegame": true,
                    "scatter_triggers": [[4, 1]],
                    "reel_weights": {"basegame": [["BR0", 1]], "freegame": [["FR0", 1]]}
                 }}
            ]
        },
        {
            "name": "bomb",
            "wincap": 5000.0,
            "features": [{"type": "bomb_guarantee", "symbol": "B", "min_value": 10}],
            "distributions": [
                {"criteria": "basegame", "quota": 1.0,
                 "conditions": {
                    "reel_weights": {"basegame": [["BRB", 1]]},
                    "value_tables": {"bomb_values": {"basegame": [[2.0, 3], [10.0, 1]]}},
                    "prizes": {"bomb_prize": {"basegame": 0.5}}
                 }}
            ]
        }
    ]
}"#;

const LINES_GAME: &str = r#"
game_id: wild-lines
num_reels: 3
num_rows: [3, 3, 3]
paytable:
  - { symbol: H1, min: 3, max: 3, pay: 1.0 }
special_symbols:
  wild: [W]
reels:
  BR0:
    - [H1, H1, H1]
    - [L1, L1, W]
    - [H1, H1, H1]
paylines:
  - [0, 0, 0]
  - [1, 1, 1]
  - [2, 2, 2]
evaluators:
  - type: lines
features:
  - type: expanding_wilds
    wild: W
attribute_rules:
  W: { type: multiplier, table: wild_mult }
bet_modes:
  - name: base
    wincap: 100.0
    distributions:
      - criteria: basegame
        quota: 1.0
        conditions:
          reel_weights:
            basegame: [[BR0, 1]]
          value_tables:
            wild_mult:
              basegame: [[2.0, 1]]
"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// FORCED FREE GAME
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_four_forced_scatters_grant_twelve_spins() {
    init_logging();
    let config = GameConfig::from_json(CLUSTER_GAME).unwrap();
    let engine = RoundEngine::new(&config, "base").unwrap();

    for sim in 0..10 {
        let state = engine.run(sim, "freegame", 9_000 + sim).unwrap();
        let events = state.events.events();

        let EventKind::Reveal {
            board,
            game_type,
            anticipation,
            ..
        } = &events[0].kind
        else {
            panic!("round must open with a reveal");
        };
        assert_eq!(*game_type, GameType::BaseGame);
        let scatters = board.iter().flatten().filter(|s| s.name == "S").count();
        assert_eq!(scatters, 4);
        assert_eq!(anticipation.len(), 6);
        assert!(anticipation.windows(2).all(|w| w[0] <= w[1]));

        let trigger = events
            .iter()
            .find_map(|e| match &e.kind {
                EventKind::FreeSpinTrigger { total_fs, positions } => Some((*total_fs, positions.len())),
                _ => None,
            })
            .unwrap();
        assert_eq!(trigger, (12, 4));

        assert_eq!(state.records.len(), 1);
        assert!(state.records[0].matches([("kind", "4"), ("symbol", "scatter"), ("gametype", "basegame")]));

        // Free strips carry no scatters, so no retriggers
        assert_eq!(state.fs, 12);
        assert_eq!(state.events.count("update_free_spin"), 12);
        assert_relative_eq!(
            state.final_win,
            ((state.wins.base_game_wins + state.wins.free_game_wins) * 100.0).round() / 100.0,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_zero_criteria_round_has_no_win_events() {
    let config = GameConfig::from_json(CLUSTER_GAME).unwrap();
    let engine = RoundEngine::new(&config, "base").unwrap();

    for sim in 0..25 {
        let state = engine.run(sim, "0", sim * 31).unwrap();
        assert_eq!(state.final_win, 0.0);
        assert_eq!(state.events.count("win_info"), 0);
        assert_eq!(state.events.count("free_spin_trigger"), 0);
        match state.events.last().map(|e| &e.kind) {
            Some(EventKind::FinalWin { amount }) => assert_eq!(*amount, 0),
            other => panic!("expected final_win, got {other:?}"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BOMBS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_bomb_guarantee_always_pays_minimum_bomb() {
    init_logging();
    let config = GameConfig::from_json(CLUSTER_GAME).unwrap();
    let engine = RoundEngine::new(&config, "bomb").unwrap();
    assert_eq!(engine.hooks().modifier_names(), vec!["bomb_guarantee"]);

    for sim in 0..30 {
        let state = engine.run(sim, "basegame", 40 + sim).unwrap();
        let best_bomb = state
            .spin_summary
            .wins
            .iter()
            .filter(|w| w.kind == WinKind::Bomb)
            .map(|w| w.win)
            .fold(0.0, f64::max);
        assert!(best_bomb >= 5.0 - 1e-9, "sim {sim}: best bomb paid {best_bomb}");
        let bombs = state.records.iter().find(|r| r.get("bombs").is_some()).unwrap();
        assert_eq!(bombs.get("max_value"), Some("10"));
        assert_eq!(bombs.get("gametype"), Some("basegame"));
        assert!(state.final_win >= 5.0 - 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPANDING WILDS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_expanding_wild_multiplies_covered_lines() {
    let config = GameConfig::from_yaml(LINES_GAME).unwrap();
    let engine = RoundEngine::new(&config, "base").unwrap();

    for sim in 0..20 {
        let state = engine.run(sim, "basegame", 700 + sim).unwrap();
        assert_eq!(state.events.count("wild_expansion"), 1);

        let (reel, covered, multiplier) = state
            .events
            .iter()
            .find_map(|e| match &e.kind {
                EventKind::WildExpansion {
                    reel,
                    positions,
                    multiplier,
                    ..
                } => Some((*reel, positions.len(), *multiplier)),
                _ => None,
            })
            .unwrap();
        assert_eq!(reel, 1);
        assert_relative_eq!(multiplier, 2.0);

        // Each covered row completes an H1 line paying 1.0 x 2
        assert_relative_eq!(state.final_win, 2.0 * covered as f64);
        assert_eq!(state.spin_summary.wins.len(), covered);
    }
}
