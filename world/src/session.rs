//! Resource counters, cumulative statistics and progression of a session.

use std::collections::BTreeSet;

use path_defence_core::{Achievement, GameSpeed, SessionConfig};
use serde::{Deserialize, Serialize};

const CENTURION_DEFEATS: u32 = 100;
const TYCOON_CURRENCY: u32 = 1000;
const ARCHITECT_TOWERS: u32 = 20;

/// Cumulative statistics gathered over a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Enemies defeated and rewarded.
    pub enemies_defeated: u32,
    /// Currency spent on construction and upgrades.
    pub currency_spent: u32,
    /// Upgrades purchased.
    pub upgrades_performed: u32,
    /// Towers constructed.
    pub towers_built: u32,
    /// Highest currency balance observed.
    pub peak_currency: u32,
}

/// Progression state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Waves remain to be played.
    Ongoing,
    /// Every configured wave was cleared with lives to spare.
    Victory,
    /// The base ran out of lives.
    Defeat,
}

/// Resource and progression counters mutated by the wave loop and player actions.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    config: SessionConfig,
    currency: u32,
    lives: u32,
    wave: u32,
    stats: SessionStats,
    achievements: BTreeSet<Achievement>,
    game_speed: GameSpeed,
}

impl Session {
    /// Starts a fresh session from the configured resources.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let currency = config.starting_currency;
        Self {
            currency,
            lives: config.starting_lives,
            wave: 0,
            stats: SessionStats {
                peak_currency: currency,
                ..SessionStats::default()
            },
            achievements: BTreeSet::new(),
            game_speed: GameSpeed::default(),
            config,
        }
    }

    pub(crate) fn restore(
        config: SessionConfig,
        currency: u32,
        lives: u32,
        wave: u32,
        stats: SessionStats,
        achievements: impl IntoIterator<Item = Achievement>,
    ) -> Self {
        Self {
            currency,
            lives,
            wave,
            stats,
            achievements: achievements.into_iter().collect(),
            game_speed: GameSpeed::default(),
            config,
        }
    }

    /// Adds currency and tracks the peak balance.
    pub fn earn(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount);
        self.stats.peak_currency = self.stats.peak_currency.max(self.currency);
    }

    /// Deducts currency, returning the shortfall as `(required, available)` when unaffordable.
    pub fn spend(&mut self, amount: u32) -> Result<(), (u32, u32)> {
        if amount > self.currency {
            return Err((amount, self.currency));
        }
        self.currency -= amount;
        self.stats.currency_spent = self.stats.currency_spent.saturating_add(amount);
        Ok(())
    }

    /// Removes lives without going below zero and returns the lives left.
    pub fn lose_lives(&mut self, amount: u32) -> u32 {
        self.lives = self.lives.saturating_sub(amount);
        self.lives
    }

    pub(crate) fn record_defeat(&mut self) {
        self.stats.enemies_defeated = self.stats.enemies_defeated.saturating_add(1);
    }

    pub(crate) fn record_build(&mut self) {
        self.stats.towers_built = self.stats.towers_built.saturating_add(1);
    }

    pub(crate) fn record_upgrade(&mut self) {
        self.stats.upgrades_performed = self.stats.upgrades_performed.saturating_add(1);
    }

    pub(crate) fn begin_wave(&mut self, number: u32) {
        self.wave = number;
    }

    pub(crate) fn set_game_speed(&mut self, speed: GameSpeed) {
        self.game_speed = speed;
    }

    /// Unlocks every achievement whose predicate now holds, returning the new ones.
    pub fn unlock_achievements(&mut self) -> Vec<Achievement> {
        let mut unlocked = Vec::new();
        for achievement in Achievement::ALL {
            if self.qualifies_for(achievement) && self.achievements.insert(achievement) {
                unlocked.push(achievement);
            }
        }
        unlocked
    }

    fn qualifies_for(&self, achievement: Achievement) -> bool {
        match achievement {
            Achievement::Centurion => self.stats.enemies_defeated >= CENTURION_DEFEATS,
            Achievement::Tycoon => self.stats.peak_currency >= TYCOON_CURRENCY,
            Achievement::Architect => self.stats.towers_built >= ARCHITECT_TOWERS,
        }
    }

    /// Configuration the session was started with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current currency balance.
    #[must_use]
    pub const fn currency(&self) -> u32 {
        self.currency
    }

    /// Lives remaining.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Number of the most recently started wave, zero before the first.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Cumulative statistics.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Unlocked achievements in stable order.
    #[must_use]
    pub fn achievements(&self) -> &BTreeSet<Achievement> {
        &self.achievements
    }

    /// Presentation pacing multiplier.
    #[must_use]
    pub const fn game_speed(&self) -> GameSpeed {
        self.game_speed
    }

    /// Score used for highscore ranking.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.wave
            .saturating_mul(50)
            .saturating_add(self.stats.enemies_defeated.saturating_mul(10))
    }

    /// Outcome given the waves cleared so far.
    ///
    /// `wave_in_progress` keeps the final wave from counting as a victory
    /// before its last enemy is resolved.
    #[must_use]
    pub fn outcome(&self, wave_in_progress: bool) -> Outcome {
        if self.lives == 0 {
            Outcome::Defeat
        } else if !wave_in_progress && self.wave >= self.config.wave_count {
            Outcome::Victory
        } else {
            Outcome::Ongoing
        }
    }
}
