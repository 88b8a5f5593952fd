//! Stochastic loot spawner
//!
//! The longer a session goes without new loot, the more likely a spawn
//! becomes. It never spawns more than there are dogs without loot.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Source of uniform samples in `[0, 1]`
pub type RandomSource = Arc<dyn Fn() -> f64 + Send + Sync>;

#[derive(Clone)]
pub struct LootGenerator {
    base_interval: Duration,
    probability: f64,
    time_without_loot: Duration,
    random: RandomSource,
}

impl fmt::Debug for LootGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LootGenerator")
            .field("base_interval", &self.base_interval)
            .field("probability", &self.probability)
            .field("time_without_loot", &self.time_without_loot)
            .finish_non_exhaustive()
    }
}

impl LootGenerator {
    /// Generator whose random factor is always 1.0, so results depend only
    /// on elapsed time
    pub fn new(base_interval: Duration, probability: f64) -> Self {
        Self::with_random(base_interval, probability, Arc::new(|| 1.0))
    }

    pub fn with_random(base_interval: Duration, probability: f64, random: RandomSource) -> Self {
        Self {
            base_interval,
            probability,
            time_without_loot: Duration::ZERO,
            random,
        }
    }

    /// Fresh generator with the same parameters and random source but its
    /// own accumulator
    pub fn fork(&self) -> Self {
        Self {
            time_without_loot: Duration::ZERO,
            ..self.clone()
        }
    }

    pub fn set_random(&mut self, random: RandomSource) {
        self.random = random;
    }

    pub fn time_without_loot(&self) -> Duration {
        self.time_without_loot
    }

    /// Number of items to spawn after `dt` has passed
    pub fn generate(&mut self, dt: Duration, loot_count: u32, dog_count: u32) -> u32 {
        self.time_without_loot += dt;
        let shortage = dog_count.saturating_sub(loot_count);

        let ratio = if self.base_interval.is_zero() {
            f64::INFINITY
        } else {
            self.time_without_loot.as_secs_f64() / self.base_interval.as_secs_f64()
        };
        let chance = (1.0 - (1.0 - self.probability).powf(ratio)) * (self.random)();
        let chance = if chance.is_nan() { 0.0 } else { chance.clamp(0.0, 1.0) };

        let generated = (f64::from(shortage) * chance).round() as u32;
        if generated > 0 {
            self.time_without_loot = Duration::ZERO;
        }
        generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_shortage_no_loot() {
        let mut generator = LootGenerator::new(Duration::from_secs(5), 0.5);
        assert_eq!(generator.generate(Duration::from_secs(100), 3, 3), 0);
        assert_eq!(generator.generate(Duration::from_secs(100), 5, 2), 0);
    }

    #[test]
    fn test_zero_elapsed_spawns_nothing() {
        let mut generator = LootGenerator::new(Duration::from_secs(5), 0.5);
        assert_eq!(generator.generate(Duration::ZERO, 0, 4), 0);
    }

    #[test]
    fn test_probability_grows_with_time() {
        // After one base interval the chance equals `probability`
        let mut generator = LootGenerator::new(Duration::from_secs(1), 0.5);
        assert_eq!(generator.generate(Duration::from_secs(1), 0, 4), 2);
        assert_eq!(generator.time_without_loot(), Duration::ZERO);

        // Two intervals: 1 - 0.25 = 0.75 of the shortage
        let mut generator = LootGenerator::new(Duration::from_secs(1), 0.5);
        assert_eq!(generator.generate(Duration::from_secs(2), 0, 4), 3);
    }

    #[test]
    fn test_accumulates_until_spawn() {
        let mut generator = LootGenerator::new(Duration::from_secs(10), 0.1);
        // 1 - 0.9^0.1 rounds to zero for one dog
        assert_eq!(generator.generate(Duration::from_secs(1), 0, 1), 0);
        assert_eq!(generator.time_without_loot(), Duration::from_secs(1));
        // Enough accumulated time for the chance to pass one half
        let mut spawned = 0;
        for _ in 0..200 {
            spawned = generator.generate(Duration::from_secs(1), 0, 1);
            if spawned > 0 {
                break;
            }
        }
        assert_eq!(spawned, 1);
        assert_eq!(generator.time_without_loot(), Duration::ZERO);
    }

    #[test]
    fn test_random_factor_scales_chance() {
        let mut generator =
            LootGenerator::with_random(Duration::from_secs(1), 1.0, Arc::new(|| 0.0));
        assert_eq!(generator.generate(Duration::from_secs(10), 0, 10), 0);

        let mut generator =
            LootGenerator::with_random(Duration::from_secs(1), 1.0, Arc::new(|| 0.5));
        assert_eq!(generator.generate(Duration::from_secs(1), 0, 10), 5);
    }

    #[test]
    fn test_fork_has_own_accumulator() {
        let mut generator = LootGenerator::new(Duration::from_secs(10), 0.1);
        generator.generate(Duration::from_secs(1), 0, 1);
        let fork = generator.fork();
        assert_eq!(fork.time_without_loot(), Duration::ZERO);
        assert_eq!(generator.time_without_loot(), Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn prop_generated_never_exceeds_shortage(
            dt_ms in 0u64..100_000,
            interval_ms in 0u64..10_000,
            probability in 0.0f64..=1.0,
            sample in 0.0f64..=1.0,
            loot in 0u32..50,
            dogs in 0u32..50,
        ) {
            let mut generator = LootGenerator::with_random(
                Duration::from_millis(interval_ms),
                probability,
                Arc::new(move || sample),
            );
            let n = generator.generate(Duration::from_millis(dt_ms), loot, dogs);
            prop_assert!(n <= dogs.saturating_sub(loot));
        }
    }
}
