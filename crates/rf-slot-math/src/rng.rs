//! Seeding helpers
//!
//! Each round attempt owns one [`RoundRng`] seeded from a 64-bit value, so a
//! round can be replayed from `(seed, attempt)` alone.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub type RoundRng = ChaCha8Rng;

/// SplitMix64 finalizer: spreads nearby inputs over the whole u64 range
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Seed for a repeat attempt of a round; attempt 0 uses the round seed
pub fn attempt_seed(seed: u64, attempt: u32) -> u64 {
    if attempt == 0 {
        seed
    } else {
        splitmix64(seed ^ splitmix64(attempt as u64))
    }
}

pub fn round_rng(seed: u64) -> RoundRng {
    ChaCha8Rng::seed_from_u64(seed)
}
