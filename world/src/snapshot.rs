//! Serializable snapshot of a session between waves.

use path_defence_core::{
    Achievement, CellCoord, MapKind, PlacementError, SessionConfig, TowerKind,
    MAX_TOWER_LEVEL,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    map::{MapError, MapLayout},
    session::{Session, SessionStats},
    tower::Tower,
    World,
};

/// Everything needed to resume a session at a wave boundary.
///
/// Snapshots are taken between waves; enemies of an active wave are not part
/// of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    /// Configuration the session was started with.
    pub config: SessionConfig,
    /// Currency balance.
    pub currency: u32,
    /// Lives remaining.
    pub lives: u32,
    /// Number of the last wave played.
    pub wave: u32,
    /// Cumulative statistics.
    pub stats: SessionStats,
    /// Unlocked achievements.
    pub achievements: Vec<Achievement>,
    /// Board and path.
    pub map: MapSnapshot,
    /// Towers in construction order.
    pub towers: Vec<TowerSnapshot>,
}

/// Serialized board description.
///
/// Start and base are the first and last path cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Generator that produced the path; `None` for hand-made paths.
    #[serde(default)]
    pub kind: Option<MapKind>,
    /// Board width.
    pub columns: u32,
    /// Board height.
    pub rows: u32,
    /// Ordered path from start to base.
    pub path: Vec<CellCoord>,
}

/// Serialized tower.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerSnapshot {
    /// Kind of the tower.
    pub kind: TowerKind,
    /// Cell the tower occupies.
    pub cell: CellCoord,
    /// Level reached through upgrades.
    pub level: u32,
    /// Enemies hit over the tower's lifetime.
    pub hits: u32,
    /// Damage dealt over the tower's lifetime.
    pub total_damage: u32,
    /// Attacks resolved over the tower's lifetime.
    pub shots_fired: u32,
    /// Ticks left before the tower may fire again.
    #[serde(default)]
    pub cooldown: u32,
}

/// Reasons a snapshot cannot be restored.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The stored board or path is invalid.
    #[error("saved map is invalid: {0}")]
    Map(#[from] MapError),
    /// A stored tower level lies outside the supported range.
    #[error("saved tower level {level} is outside 1..={max}", max = MAX_TOWER_LEVEL)]
    TowerLevel {
        /// Level found in the snapshot.
        level: u32,
    },
    /// A stored tower cannot stand on its cell.
    #[error("saved tower at {label} cannot be placed: {reason}")]
    TowerPlacement {
        /// Player-facing label of the cell.
        label: String,
        /// Why the cell was refused.
        reason: PlacementError,
    },
}

impl SaveGame {
    pub(crate) fn capture(world: &World) -> Self {
        let session = &world.session;
        Self {
            config: session.config().clone(),
            currency: session.currency(),
            lives: session.lives(),
            wave: session.wave(),
            stats: *session.stats(),
            achievements: session.achievements().iter().copied().collect(),
            map: MapSnapshot {
                kind: world.map.kind(),
                columns: world.map.columns(),
                rows: world.map.rows(),
                path: world.map.path().to_vec(),
            },
            towers: world
                .towers
                .iter()
                .map(|tower| TowerSnapshot {
                    kind: tower.kind(),
                    cell: tower.position(),
                    level: tower.level(),
                    hits: tower.hits(),
                    total_damage: tower.total_damage(),
                    shots_fired: tower.shots_fired(),
                    cooldown: tower.cooldown(),
                })
                .collect(),
        }
    }
}

impl World {
    /// Rebuilds a world from a snapshot, refusing anything inconsistent.
    ///
    /// Towers are re-created at level one and upgraded to their stored level,
    /// so derived statistics always follow the current progression rules.
    pub fn from_save(save: SaveGame) -> Result<Self, LoadError> {
        let map = MapLayout::from_path(save.map.columns, save.map.rows, save.map.path)?
            .with_kind(save.map.kind);
        let session = Session::restore(
            save.config,
            save.currency,
            save.lives,
            save.wave,
            save.stats,
            save.achievements,
        );
        let mut world = World::assemble(map, session);

        for stored in save.towers {
            if !(1..=MAX_TOWER_LEVEL).contains(&stored.level) {
                return Err(LoadError::TowerLevel {
                    level: stored.level,
                });
            }
            if let Some(reason) = occupancy_conflict(&world.map, stored.cell) {
                return Err(LoadError::TowerPlacement {
                    label: stored.cell.label(),
                    reason,
                });
            }
            let id = world.allocate_tower_id();
            let mut tower = Tower::new(id, stored.kind, stored.cell);
            for _ in 1..stored.level {
                tower
                    .upgrade()
                    .map_err(|_| LoadError::TowerLevel {
                        level: stored.level,
                    })?;
            }
            tower.restore_progress(
                stored.hits,
                stored.total_damage,
                stored.shots_fired,
                stored.cooldown,
            );
            world.install_tower(tower);
        }

        info!(
            wave = world.session.wave(),
            towers = world.towers.len(),
            "session restored"
        );
        Ok(world)
    }
}

fn occupancy_conflict(map: &MapLayout, cell: CellCoord) -> Option<PlacementError> {
    match map.marker(cell) {
        None => Some(PlacementError::OutOfBounds),
        Some(marker) if marker.is_path() => Some(PlacementError::OnPath),
        Some(crate::CellMarker::Tower(_)) => Some(PlacementError::Occupied),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, query};
    use path_defence_core::{Command, MapKind};

    fn built_world() -> World {
        let mut world = World::new(SessionConfig {
            starting_currency: 500,
            map: MapKind::Linear,
            ..SessionConfig::default()
        });
        let mut events = Vec::new();
        for (kind, column) in [(TowerKind::Archer, 12), (TowerKind::Laser, 14)] {
            apply(
                &mut world,
                Command::PlaceTower {
                    kind,
                    cell: CellCoord::new(column, 4),
                },
                &mut events,
            );
        }
        let tower = query::towers(&world)[1].id();
        apply(&mut world, Command::UpgradeTower { tower }, &mut events);
        world
    }

    #[test]
    fn snapshot_restores_towers_and_resources() {
        let world = built_world();
        let save = query::save_game(&world);
        assert_eq!(save.towers.len(), 2);
        assert_eq!(save.towers[1].level, 2);

        let restored = World::from_save(save.clone()).expect("valid snapshot");
        assert_eq!(query::save_game(&restored), save);
        assert_eq!(query::towers(&restored), query::towers(&world));
        assert_eq!(
            query::map(&restored).marker(CellCoord::new(14, 4)),
            Some(crate::CellMarker::Tower(TowerKind::Laser))
        );
    }

    #[test]
    fn snapshot_keeps_map_kind_and_tower_cooldowns() {
        let mut world = built_world();
        let plan = path_defence_core::WavePlan::new(
            1,
            9,
            vec![path_defence_core::SpawnOrder {
                kind: path_defence_core::EnemyKind::Goblin,
                spawn_delay: 0,
                max_health: 1,
                reward: 5,
                route: path_defence_core::SpawnRoute::Path,
            }],
        );
        let mut events = Vec::new();
        apply(&mut world, Command::BeginWave { plan }, &mut events);
        while query::active_wave(&world).is_some() {
            apply(&mut world, Command::Tick, &mut events);
        }

        let save = query::save_game(&world);
        assert_eq!(save.map.kind, Some(MapKind::Linear));
        let cooling: Vec<u32> = query::towers(&world).iter().map(Tower::cooldown).collect();
        assert!(cooling.iter().any(|cooldown| *cooldown > 0));

        let restored = World::from_save(save).expect("valid snapshot");
        assert_eq!(query::map(&restored).kind(), Some(MapKind::Linear));
        let restored_cooling: Vec<u32> =
            query::towers(&restored).iter().map(Tower::cooldown).collect();
        assert_eq!(restored_cooling, cooling);
    }

    #[test]
    fn upgrades_announce_achievements_earned_before_a_restore() {
        let mut save = query::save_game(&built_world());
        save.stats.peak_currency = 1_000;
        save.achievements.clear();
        let mut world = World::from_save(save).expect("valid snapshot");

        let tower = query::towers(&world)[0].id();
        let mut events = Vec::new();
        apply(&mut world, Command::UpgradeTower { tower }, &mut events);
        assert!(matches!(events[0], path_defence_core::Event::TowerUpgraded { .. }));
        assert_eq!(
            events[1],
            path_defence_core::Event::AchievementUnlocked {
                achievement: Achievement::Tycoon
            }
        );
        assert!(query::session(&world)
            .achievements()
            .contains(&Achievement::Tycoon));
    }

    #[test]
    fn snapshot_survives_json() {
        let save = query::save_game(&built_world());
        let json = serde_json::to_string(&save).expect("serialize");
        let decoded: SaveGame = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, save);
    }

    #[test]
    fn corrupt_snapshots_are_refused() {
        let mut save = query::save_game(&built_world());
        save.towers[0].level = 0;
        assert!(matches!(
            World::from_save(save.clone()),
            Err(LoadError::TowerLevel { level: 0 })
        ));

        save.towers[0].level = 1;
        save.towers[0].cell = CellCoord::new(13, 3);
        assert!(matches!(
            World::from_save(save.clone()),
            Err(LoadError::TowerPlacement {
                reason: PlacementError::OnPath,
                ..
            })
        ));

        save.map.path.truncate(1);
        assert!(matches!(
            World::from_save(save),
            Err(LoadError::Map(MapError::PathTooShort { len: 1 }))
        ));
    }
}
