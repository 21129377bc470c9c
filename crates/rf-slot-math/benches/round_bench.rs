//! Round engine benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rf_slot_math::{GameConfig, RoundEngine};

const LINES_GAME: &str = r#"
game_id: bench-lines
num_reels: 5
num_rows: [3, 3, 3, 3, 3]
paytable:
  - { symbol: H1, min: 3, max: 5, pay: 2.0 }
  - { symbol: L1, min: 3, max: 5, pay: 0.5 }
  - { symbol: L2, min: 3, max: 5, pay: 0.3 }
special_symbols:
  wild: [W]
reels:
  BR0:
    - [H1, L1, L2, W, L1, L2, H1, L2, L1, L2]
    - [L1, H1, L2, L1, L2, W, L1, H1, L2, L1]
    - [L2, L1, H1, L2, L1, H1, W, L2, L1, L2]
    - [H1, L2, L1, L2, H1, L1, L2, W, L1, L2]
    - [L1, L2, L1, H1, L2, L1, H1, L2, W, L1]
paylines:
  - [0, 0, 0, 0, 0]
  - [1, 1, 1, 1, 1]
  - [2, 2, 2, 2, 2]
  - [0, 1, 2, 1, 0]
  - [2, 1, 0, 1, 2]
evaluators:
  - type: lines
bet_modes:
  - name: base
    wincap: 1000.0
    distributions:
      - criteria: basegame
        quota: 1.0
        conditions:
          reel_weights:
            basegame: [[BR0, 1]]
"#;

fn bench_lines_round(c: &mut Criterion) {
    let config = GameConfig::from_yaml(LINES_GAME).unwrap();
    let engine = RoundEngine::new(&config, "base").unwrap();
    let mut sim = 0u64;

    c.bench_function("lines_round_5x3", |b| {
        b.iter(|| {
            sim += 1;
            black_box(engine.run(sim, "basegame", black_box(sim)).unwrap());
        })
    });
}

criterion_group!(benches, bench_lines_round);
criterion_main!(benches);
