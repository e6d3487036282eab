use serde::{Deserialize, Serialize};

/// Difficulty presets that seed a session configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Generous resources and gentle scaling.
    Easy,
    /// Balanced preset.
    Normal,
    /// Scarce resources and steep scaling.
    Hard,
    /// Values supplied entirely by the player.
    #[default]
    Custom,
}

/// Shape of the generated enemy path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    /// Straight path down the middle column.
    #[default]
    Linear,
    /// Seeded random walk from top to bottom.
    Winding,
    /// Staircase from the top-left to the bottom-right corner.
    Diagonal,
}

/// Numeric scalars that parameterise a session.
///
/// Values are validated by whichever adapter builds the configuration; the
/// engine consumes them as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Preset the values were derived from.
    pub difficulty: Difficulty,
    /// Currency available before the first build.
    pub starting_currency: u32,
    /// Lives available before the first breach.
    pub starting_lives: u32,
    /// Waves that must be cleared to win.
    pub wave_count: u32,
    /// Additional fraction of base health gained per wave.
    pub hp_scale_per_wave: f64,
    /// Additional fraction of base reward gained per wave.
    pub reward_scale_per_wave: f64,
    /// Ticks separating consecutive spawns within a wave.
    pub spawn_delay_step: u32,
    /// Root seed for map generation and every wave.
    pub seed: u64,
    /// Path generator used for the board.
    pub map: MapKind,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Custom,
            starting_currency: 100,
            starting_lives: 10,
            wave_count: 20,
            hp_scale_per_wave: 0.10,
            reward_scale_per_wave: 0.05,
            spawn_delay_step: 2,
            seed: 0,
            map: MapKind::Linear,
        }
    }
}

impl SessionConfig {
    /// Builds the configuration described by a difficulty preset.
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let base = Self::default();
        let (starting_currency, starting_lives, hp_scale_per_wave, reward_scale_per_wave) =
            match difficulty {
                Difficulty::Easy => (140, 25, 0.10, 0.03),
                Difficulty::Normal => (130, 20, 0.20, 0.05),
                Difficulty::Hard => (110, 15, 0.30, 0.08),
                Difficulty::Custom => return base,
            };
        Self {
            difficulty,
            starting_currency,
            starting_lives,
            hp_scale_per_wave,
            reward_scale_per_wave,
            ..base
        }
    }
}
