#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave composition for Path Defence.
//!
//! Each wave grows in size and strength along linear curves, and its enemy
//! kinds are drawn from a weighted table whose weights drift with the wave
//! number. Every wave derives its own random streams from the session seed,
//! so replaying a session replays the same waves.

use path_defence_core::{CellCoord, EnemyKind, SessionConfig, SpawnOrder, SpawnRoute, WavePlan};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Enemies in the first wave.
pub const BASE_ENEMY_COUNT: u32 = 5;

/// Additional enemies per subsequent wave.
pub const ENEMIES_PER_WAVE: u32 = 2;

/// Every wave whose number is a multiple of this value opens with the boss.
pub const BOSS_WAVE_INTERVAL: u32 = 10;

const RNG_STREAM_KINDS: &str = "kinds";
const RNG_STREAM_COMBAT: &str = "combat";

type WeightFn = fn(u32) -> f64;

/// Non-boss kinds paired with the weight they carry in a given wave.
const KIND_WEIGHTS: [(EnemyKind, WeightFn); 7] = [
    (EnemyKind::Goblin, goblin_weight),
    (EnemyKind::Orc, orc_weight),
    (EnemyKind::Troll, troll_weight),
    (EnemyKind::Spider, spider_weight),
    (EnemyKind::Ghost, rare_weight),
    (EnemyKind::Bat, rare_weight),
    (EnemyKind::Knight, knight_weight),
];

fn goblin_weight(wave: u32) -> f64 {
    (0.8 - 0.02 * f64::from(wave)).max(0.4)
}

fn orc_weight(wave: u32) -> f64 {
    (0.1 + 0.01 * f64::from(wave)).min(0.3)
}

fn troll_weight(wave: u32) -> f64 {
    (0.05 + 0.005 * f64::from(wave)).min(0.15)
}

fn spider_weight(_wave: u32) -> f64 {
    0.10
}

fn rare_weight(_wave: u32) -> f64 {
    0.05
}

fn knight_weight(wave: u32) -> f64 {
    (0.005 * f64::from(wave)).min(0.10)
}

/// Pure system that builds [`WavePlan`] values for a session.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveGeneration {
    global_seed: u64,
    hp_scale_per_wave: f64,
    reward_scale_per_wave: f64,
    spawn_delay_step: u32,
}

impl WaveGeneration {
    /// Creates a generator using the scaling factors of the provided configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            global_seed: config.seed,
            hp_scale_per_wave: config.hp_scale_per_wave,
            reward_scale_per_wave: config.reward_scale_per_wave,
            spawn_delay_step: config.spawn_delay_step,
        }
    }

    /// Builds the plan for `wave` with random streams derived from the session seed.
    #[must_use]
    pub fn plan_wave(&self, wave: u32, start: CellCoord, base: CellCoord) -> WavePlan {
        let base_seed = derive_base_seed(self.global_seed, wave);
        let mut kind_rng =
            ChaCha8Rng::seed_from_u64(derive_labeled_seed(base_seed, RNG_STREAM_KINDS));
        let combat_seed = derive_labeled_seed(base_seed, RNG_STREAM_COMBAT);
        self.generate(wave, start, base, combat_seed, &mut kind_rng)
    }

    /// Builds the plan for `wave`, drawing enemy kinds from `rng`.
    pub fn generate<R>(
        &self,
        wave: u32,
        start: CellCoord,
        base: CellCoord,
        combat_seed: u64,
        rng: &mut R,
    ) -> WavePlan
    where
        R: Rng + ?Sized,
    {
        let waves_elapsed = f64::from(wave.saturating_sub(1));
        let hp_scale = 1.0 + waves_elapsed * self.hp_scale_per_wave;
        let reward_scale = 1.0 + waves_elapsed * self.reward_scale_per_wave;

        let spawns: Vec<SpawnOrder> = (0..enemy_count(wave))
            .map(|index| {
                let kind = if is_boss_slot(wave, index) {
                    EnemyKind::BOSS
                } else {
                    sample_kind(wave, rng)
                };
                let profile = kind.profile();
                let route = if profile.flies_direct {
                    SpawnRoute::Direct {
                        from: start,
                        to: base,
                    }
                } else {
                    SpawnRoute::Path
                };
                SpawnOrder {
                    kind,
                    spawn_delay: index.saturating_mul(self.spawn_delay_step),
                    max_health: scale(profile.max_health, hp_scale).max(1),
                    reward: scale(profile.reward, reward_scale),
                    route,
                }
            })
            .collect();

        debug!(wave, enemies = spawns.len(), hp_scale, reward_scale, "wave planned");
        WavePlan::new(wave, combat_seed, spawns)
    }
}

/// Number of enemies in `wave`.
#[must_use]
pub fn enemy_count(wave: u32) -> u32 {
    BASE_ENEMY_COUNT.saturating_add(ENEMIES_PER_WAVE.saturating_mul(wave.saturating_sub(1)))
}

/// Reports whether the spawn slot is reserved for the boss.
#[must_use]
pub fn is_boss_slot(wave: u32, index: u32) -> bool {
    wave % BOSS_WAVE_INTERVAL == 0 && index == 0
}

/// Normalised probability of every non-boss kind in `wave`.
#[must_use]
pub fn kind_probabilities(wave: u32) -> Vec<(EnemyKind, f64)> {
    let weights: Vec<(EnemyKind, f64)> = KIND_WEIGHTS
        .iter()
        .map(|(kind, weight)| (*kind, weight(wave).max(0.0)))
        .collect();
    let total: f64 = weights.iter().map(|(_, weight)| weight).sum();
    weights
        .into_iter()
        .map(|(kind, weight)| (kind, weight / total))
        .collect()
}

/// Draws one non-boss kind with a single cumulative-distribution sample.
pub fn sample_kind<R>(wave: u32, rng: &mut R) -> EnemyKind
where
    R: Rng + ?Sized,
{
    let draw: f64 = rng.gen();
    let probabilities = kind_probabilities(wave);
    let mut cumulative = 0.0;
    for (kind, probability) in &probabilities {
        cumulative += probability;
        if draw < cumulative {
            return *kind;
        }
    }
    probabilities
        .iter()
        .rev()
        .find(|(_, probability)| *probability > 0.0)
        .map_or(EnemyKind::Goblin, |(kind, _)| *kind)
}

fn scale(value: u32, factor: f64) -> u32 {
    let scaled = (f64::from(value) * factor).floor();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else if scaled > 0.0 {
        scaled as u32
    } else {
        0
    }
}

fn derive_base_seed(global_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    finalize_seed(hasher)
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn generator() -> WaveGeneration {
        WaveGeneration::new(&SessionConfig {
            seed: 1_234,
            ..SessionConfig::default()
        })
    }

    const START: CellCoord = CellCoord::new(13, 0);
    const BASE: CellCoord = CellCoord::new(13, 25);

    #[test]
    fn count_grows_by_two_per_wave() {
        assert_eq!(enemy_count(1), 5);
        assert_eq!(enemy_count(2), 7);
        assert_eq!(enemy_count(10), 23);
    }

    #[test]
    fn probabilities_are_normalised_and_drift_with_waves() {
        for wave in [1, 10, 40] {
            let total: f64 = kind_probabilities(wave).iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
        let early = kind_probabilities(1);
        let late = kind_probabilities(40);
        assert!(late[0].1 < early[0].1);
        assert!(late[1].1 > early[1].1);
    }

    #[test]
    fn weight_floors_and_caps_hold() {
        assert!((goblin_weight(100) - 0.4).abs() < 1e-12);
        assert!((orc_weight(100) - 0.3).abs() < 1e-12);
        assert!((troll_weight(100) - 0.15).abs() < 1e-12);
        assert!((knight_weight(100) - 0.1).abs() < 1e-12);
        assert!((goblin_weight(1) - 0.78).abs() < 1e-12);
        assert!(knight_weight(0).abs() < 1e-12);
    }

    #[test]
    fn extreme_draws_pick_table_ends() {
        assert_eq!(sample_kind(1, &mut StepRng::new(0, 0)), EnemyKind::Goblin);
        assert_eq!(sample_kind(1, &mut StepRng::new(u64::MAX, 0)), EnemyKind::Knight);
    }

    #[test]
    fn spawn_delays_follow_the_step() {
        let plan = generator().generate(3, START, BASE, 0, &mut StepRng::new(0, 0));
        let delays: Vec<u32> = plan.spawns().iter().map(|order| order.spawn_delay).collect();
        assert_eq!(delays, vec![0, 2, 4, 6, 8, 10, 12, 14, 16]);
    }

    #[test]
    fn scaling_is_floored() {
        let plan = generator().generate(4, START, BASE, 0, &mut StepRng::new(0, 0));
        let goblin = plan.spawns()[0];
        assert_eq!(goblin.kind, EnemyKind::Goblin);
        assert_eq!(goblin.max_health, 26);
        assert_eq!(goblin.reward, 5);
    }

    #[test]
    fn plans_replay_for_the_same_seed() {
        let first = generator().plan_wave(7, START, BASE);
        let second = generator().plan_wave(7, START, BASE);
        assert_eq!(first, second);
        assert_ne!(first.combat_seed(), generator().plan_wave(8, START, BASE).combat_seed());
    }
}
