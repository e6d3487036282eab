#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Path Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that drivers turn
//! into notifications, audio cues and persistence requests. Systems consume
//! read-only queries and respond exclusively with new commands or plans.

mod config;
mod roster;

pub use config::{Difficulty, MapKind, SessionConfig};
pub use roster::{
    EnemyKind, EnemyProfile, TowerKind, TowerProfile, COST_GROWTH_DENOMINATOR,
    COST_GROWTH_NUMERATOR, MAX_TOWER_LEVEL,
};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Path Defence.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests construction of a tower on the provided board cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Board cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests that an existing tower gains one level.
    UpgradeTower {
        /// Identifier of the tower targeted for the upgrade.
        tower: TowerId,
    },
    /// Requests that the world activates the provided wave.
    BeginWave {
        /// Generated plan describing every enemy of the wave.
        plan: WavePlan,
    },
    /// Advances the active wave by one simulation tick.
    Tick,
    /// Moves the presentation pacing multiplier by one step.
    AdjustGameSpeed {
        /// Speeds the game up when `true`, slows it down otherwise.
        faster: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a wave became active.
    WaveStarted {
        /// Number of the wave that started.
        wave: u32,
        /// Number of enemies that compose the wave.
        enemies: u32,
    },
    /// Reports that the world refused to start a wave.
    WaveRejected {
        /// Number of the wave that was requested.
        wave: u32,
        /// Specific reason the wave could not start.
        reason: WaveStartError,
    },
    /// Reports that an enemy reached the base and cost the player lives.
    EnemyBreached {
        /// Slot of the enemy within the active wave.
        enemy: EnemyId,
        /// Kind of the enemy that breached.
        kind: EnemyKind,
        /// Lives removed from the session.
        damage: u32,
        /// Lives left after the breach was applied.
        lives_remaining: u32,
    },
    /// Reports that a tower resolved an attack this tick.
    TowerFired {
        /// Identifier of the tower that fired.
        tower: TowerId,
        /// Kind of the tower that fired.
        kind: TowerKind,
        /// Number of enemies hit by the attack.
        hits: u32,
        /// Total damage dealt across every hit.
        damage: u32,
    },
    /// Reports that an enemy was defeated and its reward was granted.
    EnemyDefeated {
        /// Slot of the enemy within the active wave.
        enemy: EnemyId,
        /// Kind of the defeated enemy.
        kind: EnemyKind,
        /// Currency granted for the kill.
        reward: u32,
        /// Indicates whether the bounty multiplier applied.
        bounty: bool,
    },
    /// Announces that an achievement became unlocked.
    AchievementUnlocked {
        /// Achievement that was unlocked.
        achievement: Achievement,
    },
    /// Announces that the session ran out of lives.
    LivesDepleted,
    /// Announces that every enemy of the active wave was resolved.
    WaveCompleted {
        /// Totals describing how the wave ended.
        summary: WaveSummary,
    },
    /// Confirms that a tower was placed on the board.
    TowerPlaced {
        /// Identifier allocated to the new tower.
        tower: TowerId,
        /// Kind of tower that was placed.
        kind: TowerKind,
        /// Board cell occupied by the tower.
        cell: CellCoord,
        /// Currency charged for the construction.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Kind of tower requested for placement.
        kind: TowerKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower gained a level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Kind of the upgraded tower.
        kind: TowerKind,
        /// Level reached after the upgrade.
        level: u32,
        /// Currency charged for the upgrade.
        price: u32,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for the upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that the presentation pacing multiplier changed.
    GameSpeedChanged {
        /// Multiplier that became active.
        speed: GameSpeed,
    },
}

impl Event {
    /// Human-readable line describing the event for the notification feed.
    ///
    /// Per-shot events are too noisy for the feed and yield `None`.
    #[must_use]
    pub fn notification(&self) -> Option<String> {
        let line = match self {
            Self::WaveStarted { wave, enemies } => {
                format!("Wave {wave} begins with {enemies} enemies!")
            }
            Self::WaveRejected { wave, reason } => {
                format!("Wave {wave} cannot start: {reason}.")
            }
            Self::EnemyBreached { kind, damage, .. } => {
                format!("{} reached the base! -{damage} lives", kind.name())
            }
            Self::TowerFired { .. } => return None,
            Self::EnemyDefeated { kind, reward, .. } => {
                format!("Defeated {}! +{reward} gold", kind.name())
            }
            Self::AchievementUnlocked { achievement } => {
                format!("Achievement unlocked: {}", achievement.title())
            }
            Self::LivesDepleted => "The base has fallen.".to_owned(),
            Self::WaveCompleted { summary } => format!(
                "Wave {} complete: {} defeated, {} got through",
                summary.wave, summary.defeated, summary.breached
            ),
            Self::TowerPlaced { kind, cell, .. } => {
                format!("Built {} at {}.", kind.name(), cell.label())
            }
            Self::TowerPlacementRejected { reason, .. } => format!("Cannot build: {reason}."),
            Self::TowerUpgraded { kind, level, .. } => {
                format!("Upgraded {} to level {level}.", kind.name())
            }
            Self::TowerUpgradeRejected { reason, .. } => format!("Cannot upgrade: {reason}."),
            Self::GameSpeedChanged { speed } => format!("Game speed x{:.1}", speed.multiplier()),
        };
        Some(line)
    }

    /// Audio cue that accompanies the event, if any.
    #[must_use]
    pub fn audio_cue(&self) -> Option<AudioCue> {
        match self {
            Self::EnemyBreached { .. } => Some(AudioCue::LoseLife),
            Self::EnemyDefeated { .. } => Some(AudioCue::Death),
            Self::TowerPlaced { .. } => Some(AudioCue::Build),
            Self::TowerFired { kind, .. } => Some(AudioCue::Shoot(*kind)),
            _ => None,
        }
    }
}

/// Named sound effects the engine may trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// Background music loop.
    Music,
    /// A tower was constructed.
    Build,
    /// An enemy was defeated.
    Death,
    /// An enemy breached the base.
    LoseLife,
    /// A tower of the provided kind fired.
    Shoot(TowerKind),
}

impl AudioCue {
    /// Stable key used by audio backends to resolve the cue to a sample.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Build => "build",
            Self::Death => "death",
            Self::LoseLife => "lose-life",
            Self::Shoot(TowerKind::Archer) => "shoot-archer",
            Self::Shoot(TowerKind::Cannon) => "shoot-cannon",
            Self::Shoot(TowerKind::Frost) => "shoot-frost",
            Self::Shoot(TowerKind::Fire) => "shoot-fire",
            Self::Shoot(TowerKind::Laser) => "shoot-laser",
        }
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position of an enemy inside the ordered list of its wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single board cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new board cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev distance, where diagonal neighbours are one apart.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Moves at most one cell along each axis toward `target`.
    #[must_use]
    pub fn step_toward(self, target: CellCoord) -> CellCoord {
        CellCoord::new(
            step_axis(self.column, target.column),
            step_axis(self.row, target.row),
        )
    }

    /// Player-facing label such as `B4`: column letter followed by the 1-based row.
    ///
    /// Columns beyond `Z` fall back to a numeric `column:row` form.
    #[must_use]
    pub fn label(&self) -> String {
        match u8::try_from(self.column) {
            Ok(column) if column < 26 => format!("{}{}", char::from(b'A' + column), self.row + 1),
            _ => format!("{}:{}", self.column, self.row + 1),
        }
    }
}

fn step_axis(from: u32, to: u32) -> u32 {
    match from.cmp(&to) {
        std::cmp::Ordering::Less => from + 1,
        std::cmp::Ordering::Greater => from - 1,
        std::cmp::Ordering::Equal => from,
    }
}

/// Presentation pacing multiplier, stored in half steps between x0.5 and x5.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameSpeed(u8);

impl GameSpeed {
    const MIN_HALVES: u8 = 1;
    const MAX_HALVES: u8 = 10;

    /// Slowest supported pacing.
    pub const SLOWEST: Self = Self(Self::MIN_HALVES);
    /// Fastest supported pacing.
    pub const FASTEST: Self = Self(Self::MAX_HALVES);

    /// Pacing multiplier expressed as a float.
    #[must_use]
    pub fn multiplier(self) -> f32 {
        f32::from(self.0) / 2.0
    }

    /// Returns the next faster step, saturating at [`GameSpeed::FASTEST`].
    #[must_use]
    pub fn faster(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX_HALVES))
    }

    /// Returns the next slower step, saturating at [`GameSpeed::SLOWEST`].
    #[must_use]
    pub fn slower(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN_HALVES))
    }
}

impl Default for GameSpeed {
    fn default() -> Self {
        Self(2)
    }
}

/// Milestones unlocked by cumulative session statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Achievement {
    /// One hundred enemies defeated.
    Centurion,
    /// One thousand gold held at once.
    Tycoon,
    /// Twenty towers built.
    Architect,
}

impl Achievement {
    /// Every achievement in presentation order.
    pub const ALL: [Achievement; 3] = [Self::Centurion, Self::Tycoon, Self::Architect];

    /// Short player-facing title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Centurion => "100 enemies defeated",
            Self::Tycoon => "1000 gold in the bank",
            Self::Architect => "20 towers built",
        }
    }
}

/// Totals reported once a wave has been fully resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSummary {
    /// Number of the wave being summarised.
    pub wave: u32,
    /// Enemies that were defeated and rewarded.
    pub defeated: u32,
    /// Enemies that reached the base.
    pub breached: u32,
}

/// Ordered description of every enemy a wave will spawn.
#[derive(Clone, Debug, PartialEq)]
pub struct WavePlan {
    number: u32,
    combat_seed: u64,
    spawns: Vec<SpawnOrder>,
}

impl WavePlan {
    /// Creates a plan for the provided wave number.
    #[must_use]
    pub fn new(number: u32, combat_seed: u64, spawns: Vec<SpawnOrder>) -> Self {
        Self {
            number,
            combat_seed,
            spawns,
        }
    }

    /// Number of the wave the plan describes.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Seed for probabilistic tower effects resolved during the wave.
    #[must_use]
    pub const fn combat_seed(&self) -> u64 {
        self.combat_seed
    }

    /// Spawn orders in the order enemies are created.
    #[must_use]
    pub fn spawns(&self) -> &[SpawnOrder] {
        &self.spawns
    }
}

/// Single enemy instantiation request produced by wave generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnOrder {
    /// Kind of enemy to create.
    pub kind: EnemyKind,
    /// Ticks the enemy waits before entering the board.
    pub spawn_delay: u32,
    /// Scaled maximum health, also used as starting health.
    pub max_health: u32,
    /// Scaled currency reward granted on defeat.
    pub reward: u32,
    /// How the enemy travels toward the base.
    pub route: SpawnRoute,
}

/// Movement strategy assigned to a spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnRoute {
    /// Follows the map's ordered path.
    Path,
    /// Ignores the path and flies in a straight line.
    Direct {
        /// Cell the enemy starts from.
        from: CellCoord,
        /// Cell the enemy flies toward.
        to: CellCoord,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The requested cell lies outside the board.
    #[error("that cell is outside the board")]
    OutOfBounds,
    /// The requested cell belongs to the enemy path, start or base.
    #[error("cannot build on the path, start or base")]
    OnPath,
    /// Another tower already occupies the requested cell.
    #[error("that cell is already occupied")]
    Occupied,
    /// The session cannot afford the tower.
    #[error("not enough gold ({available}/{required})")]
    InsufficientFunds {
        /// Currency the construction costs.
        required: u32,
        /// Currency the session holds.
        available: u32,
    },
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The tower already reached the maximum level.
    #[error("tower is already at the maximum level ({level}/{max})", max = MAX_TOWER_LEVEL)]
    MaxLevel {
        /// Level the tower currently holds.
        level: u32,
    },
    /// The session cannot afford the upgrade.
    #[error("not enough gold ({available}/{required})")]
    InsufficientFunds {
        /// Currency the upgrade costs.
        required: u32,
        /// Currency the session holds.
        available: u32,
    },
}

/// Reasons the world may refuse to start a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum WaveStartError {
    /// Another wave is still being simulated.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// The session has already been won or lost.
    #[error("the session is over")]
    SessionOver,
    /// The plan does not describe the next wave of the session.
    #[error("expected wave {expected}")]
    UnexpectedNumber {
        /// Wave number the session expects next.
        expected: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        Achievement, AudioCue, CellCoord, Event, GameSpeed, PlacementError, TowerId, TowerKind,
        UpgradeError, WaveSummary,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn step_toward_moves_diagonally_until_aligned() {
        let target = CellCoord::new(2, 4);
        let first = CellCoord::new(0, 0).step_toward(target);
        assert_eq!(first, CellCoord::new(1, 1));
        let second = first.step_toward(target);
        assert_eq!(second, CellCoord::new(2, 2));
        assert_eq!(second.step_toward(target), CellCoord::new(2, 3));
        assert_eq!(target.step_toward(target), target);
    }

    #[test]
    fn labels_use_column_letters_and_one_based_rows() {
        assert_eq!(CellCoord::new(0, 0).label(), "A1");
        assert_eq!(CellCoord::new(1, 3).label(), "B4");
        assert_eq!(CellCoord::new(25, 25).label(), "Z26");
        assert_eq!(CellCoord::new(30, 2).label(), "30:3");
    }

    #[test]
    fn game_speed_saturates_at_bounds() {
        let mut speed = GameSpeed::default();
        assert!((speed.multiplier() - 1.0).abs() < f32::EPSILON);
        for _ in 0..20 {
            speed = speed.faster();
        }
        assert_eq!(speed, GameSpeed::FASTEST);
        assert!((speed.multiplier() - 5.0).abs() < f32::EPSILON);
        for _ in 0..20 {
            speed = speed.slower();
        }
        assert_eq!(speed, GameSpeed::SLOWEST);
        assert!((speed.multiplier() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn shot_events_have_cues_but_no_notification() {
        let event = Event::TowerFired {
            tower: TowerId::new(3),
            kind: TowerKind::Frost,
            hits: 1,
            damage: 2,
        };
        assert!(event.notification().is_none());
        assert_eq!(event.audio_cue(), Some(AudioCue::Shoot(TowerKind::Frost)));
        assert_eq!(AudioCue::Shoot(TowerKind::Frost).key(), "shoot-frost");
    }

    #[test]
    fn completion_notification_reports_totals() {
        let event = Event::WaveCompleted {
            summary: WaveSummary {
                wave: 4,
                defeated: 9,
                breached: 2,
            },
        };
        assert_eq!(
            event.notification().as_deref(),
            Some("Wave 4 complete: 9 defeated, 2 got through")
        );
        assert!(event.audio_cue().is_none());
    }

    #[test]
    fn rejection_reasons_render_for_players() {
        let reason = PlacementError::InsufficientFunds {
            required: 120,
            available: 80,
        };
        assert_eq!(reason.to_string(), "not enough gold (80/120)");
        assert_eq!(
            UpgradeError::MaxLevel { level: 20 }.to_string(),
            "tower is already at the maximum level (20/20)"
        );
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn persisted_contract_types_survive_bincode() {
        assert_round_trip(&TowerId::new(42));
        assert_round_trip(&CellCoord::new(5, 7));
        assert_round_trip(&Achievement::Tycoon);
        assert_round_trip(&UpgradeError::InsufficientFunds {
            required: 10,
            available: 3,
        });
    }
}
