//! Integer weight tables and weighted draws

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ordered `(value, weight)` pairs.
///
/// Serialized as a list of two-element arrays so that non-string keys
/// (floats, counts) survive JSON/YAML round trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable<K> {
    entries: Vec<(K, u64)>,
}

impl<K> Default for WeightTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K> WeightTable<K> {
    pub fn new(entries: Vec<(K, u64)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(K, u64)] {
        &self.entries
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|(_, w)| *w).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_weight() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, u64)> {
        self.entries.iter()
    }

    /// Draw a value with probability proportional to its weight.
    ///
    /// Returns `None` when the table has zero total weight.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&K> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let mut roll = rng.random_range(0..total);
        for (value, weight) in &self.entries {
            if roll < *weight {
                return Some(value);
            }
            roll -= weight;
        }
        None
    }
}

impl<K: PartialEq> WeightTable<K> {
    pub fn weight_of(&self, key: &K) -> u64 {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, w)| *w)
            .sum()
    }
}

impl<K> FromIterator<(K, u64)> for WeightTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_draw_respects_zero_weights() {
        let table = WeightTable::new(vec![("a", 0), ("b", 5), ("c", 0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(table.draw(&mut rng), Some(&"b"));
        }
    }

    #[test]
    fn test_empty_table_draws_nothing() {
        let table: WeightTable<u32> = WeightTable::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(table.is_empty());
        assert_eq!(table.draw(&mut rng), None);
    }

    #[test]
    fn test_draw_frequencies_follow_weights() {
        let table = WeightTable::new(vec![(1u32, 1), (2u32, 3)]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let twos = (0..20_000)
            .filter(|_| table.draw(&mut rng) == Some(&2))
            .count();
        let ratio = twos as f64 / 20_000.0;
        assert!((ratio - 0.75).abs() < 0.02, "ratio {ratio}");
    }

    #[test]
    fn test_serde_pairs() {
        let table: WeightTable<f64> = serde_json::from_str("[[2.0, 10], [5.0, 1]]").unwrap();
        assert_eq!(table.total_weight(), 11);
        assert_eq!(table.weight_of(&5.0), 1);
    }
}
