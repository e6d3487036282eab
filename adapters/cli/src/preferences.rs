use std::{fs, path::Path};

use anyhow::{Context, Result};
use path_defence_core::{Difficulty, MapKind, SessionConfig};
use serde::Deserialize;

const DEFAULT_SFX_VOLUME: f32 = 1.0;
const DEFAULT_MUSIC_VOLUME: f32 = 0.6;

/// Player preferences read from an optional TOML file.
///
/// ```toml
/// difficulty = "hard"
/// sfx_volume = 0.8
///
/// [session]
/// wave_count = 10
/// map = "winding"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Preferences {
    /// Preset applied before any individual override.
    pub difficulty: Option<Difficulty>,
    /// Sound effect volume, clamped into `0.0..=1.0`.
    pub sfx_volume: Option<f32>,
    /// Music volume, clamped into `0.0..=1.0`.
    pub music_volume: Option<f32>,
    /// Individual session values that replace the preset.
    pub session: SessionOverrides,
}

/// Session values that replace the preset when present.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionOverrides {
    pub starting_currency: Option<u32>,
    pub starting_lives: Option<u32>,
    pub wave_count: Option<u32>,
    pub hp_scale_per_wave: Option<f64>,
    pub reward_scale_per_wave: Option<f64>,
    pub spawn_delay_step: Option<u32>,
    pub seed: Option<u64>,
    pub map: Option<MapKind>,
}

impl SessionOverrides {
    /// Combines two override sets, letting `other` win wherever it is set.
    #[must_use]
    pub(crate) fn or(self, other: Self) -> Self {
        Self {
            starting_currency: other.starting_currency.or(self.starting_currency),
            starting_lives: other.starting_lives.or(self.starting_lives),
            wave_count: other.wave_count.or(self.wave_count),
            hp_scale_per_wave: other.hp_scale_per_wave.or(self.hp_scale_per_wave),
            reward_scale_per_wave: other.reward_scale_per_wave.or(self.reward_scale_per_wave),
            spawn_delay_step: other.spawn_delay_step.or(self.spawn_delay_step),
            seed: other.seed.or(self.seed),
            map: other.map.or(self.map),
        }
    }

    fn apply(&self, config: &mut SessionConfig) {
        if let Some(value) = self.starting_currency {
            config.starting_currency = value;
        }
        if let Some(value) = self.starting_lives {
            config.starting_lives = value;
        }
        if let Some(value) = self.wave_count {
            config.wave_count = value;
        }
        if let Some(value) = self.hp_scale_per_wave {
            config.hp_scale_per_wave = value;
        }
        if let Some(value) = self.reward_scale_per_wave {
            config.reward_scale_per_wave = value;
        }
        if let Some(value) = self.spawn_delay_step {
            config.spawn_delay_step = value;
        }
        if let Some(value) = self.seed {
            config.seed = value;
        }
        if let Some(value) = self.map {
            config.map = value;
        }
    }
}

/// Reasons a session configuration is refused before it reaches the engine.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// The preferences file is not valid TOML for [`Preferences`].
    #[error("could not parse preferences: {0}")]
    Parse(#[from] toml::de::Error),
    /// A count that must be at least one was zero.
    #[error("`{field}` must be at least 1")]
    Zero {
        /// Name of the offending setting.
        field: &'static str,
    },
    /// A scale factor was negative or not a finite number.
    #[error("`{field}` must be a finite, non-negative number (got {value})")]
    InvalidScale {
        /// Name of the offending setting.
        field: &'static str,
        /// Value that was rejected.
        value: f64,
    },
}

impl Preferences {
    /// Parses preferences from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses the preferences file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read preferences at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid preferences file {}", path.display()))
    }

    /// Effect and music volumes, each clamped into `0.0..=1.0`.
    #[must_use]
    pub(crate) fn volumes(&self) -> (f32, f32) {
        (
            clamp_volume(self.sfx_volume.unwrap_or(DEFAULT_SFX_VOLUME)),
            clamp_volume(self.music_volume.unwrap_or(DEFAULT_MUSIC_VOLUME)),
        )
    }

    /// Resolves the session configuration.
    ///
    /// The difficulty preset comes first (the flag beats the file), then the
    /// file's overrides, then the flag overrides. The result is validated.
    pub(crate) fn session_config(
        &self,
        difficulty: Option<Difficulty>,
        flags: &SessionOverrides,
    ) -> Result<SessionConfig, ConfigError> {
        let difficulty = difficulty.or(self.difficulty).unwrap_or_default();
        let mut config = SessionConfig::for_difficulty(difficulty);
        self.session.clone().or(flags.clone()).apply(&mut config);
        validate(&config)?;
        Ok(config)
    }
}

/// Checks the values the engine relies on without re-validating.
pub(crate) fn validate(config: &SessionConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("starting_currency", config.starting_currency),
        ("starting_lives", config.starting_lives),
        ("wave_count", config.wave_count),
    ] {
        if value == 0 {
            return Err(ConfigError::Zero { field });
        }
    }
    for (field, value) in [
        ("hp_scale_per_wave", config.hp_scale_per_wave),
        ("reward_scale_per_wave", config.reward_scale_per_wave),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidScale { field, value });
        }
    }
    Ok(())
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
