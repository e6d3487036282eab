#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Path Defence.

mod enemy;
mod map;
mod session;
mod snapshot;
mod tower;

pub use enemy::{Enemy, StatusEffect};
pub use map::{CellMarker, MapError, MapLayout, STANDARD_COLUMNS, STANDARD_ROWS};
pub use session::{Outcome, Session, SessionStats};
pub use snapshot::{LoadError, MapSnapshot, SaveGame, TowerSnapshot};
pub use tower::{
    cost_at_level, Tower, Volley, ARCHER_CRITICAL_EVERY, BURN_TICKS, LASER_MAX_TARGETS,
    SLOW_TICKS, STUN_CHANCE, STUN_TICKS,
};

use path_defence_core::{
    CellCoord, Command, EnemyId, Event, PlacementError, SessionConfig, TowerId, TowerKind,
    UpgradeError, WavePlan, WaveStartError, WaveSummary, MAX_TOWER_LEVEL, WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Enemies of the wave currently being simulated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wave {
    number: u32,
    enemies: Vec<Enemy>,
    defeated: u32,
    breached: u32,
}

impl Wave {
    /// Instantiates every enemy described by a generated plan.
    #[must_use]
    pub fn from_plan(plan: &WavePlan, path_start: CellCoord) -> Self {
        let enemies = plan
            .spawns()
            .iter()
            .map(|order| Enemy::spawn(order, path_start))
            .collect();
        Self::new(plan.number(), enemies)
    }

    /// Wraps an explicit list of enemies.
    #[must_use]
    pub fn new(number: u32, enemies: Vec<Enemy>) -> Self {
        Self {
            number,
            enemies,
            defeated: 0,
            breached: 0,
        }
    }

    /// Number of the wave.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Enemies in spawn order, including resolved ones.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Reports whether any enemy is still active.
    #[must_use]
    pub fn has_alive(&self) -> bool {
        self.enemies.iter().any(Enemy::is_alive)
    }

    /// Totals gathered so far.
    #[must_use]
    pub const fn summary(&self) -> WaveSummary {
        WaveSummary {
            wave: self.number,
            defeated: self.defeated,
            breached: self.breached,
        }
    }
}

/// Represents the authoritative Path Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    map: MapLayout,
    session: Session,
    towers: Vec<Tower>,
    next_tower_id: TowerId,
    wave: Option<Wave>,
    combat_rng: ChaCha8Rng,
}

impl World {
    /// Creates a world on the standard board generated for the configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let map = MapLayout::standard(config.map, config.seed);
        Self::with_map(config, map)
    }

    /// Creates a world around a caller-provided board.
    #[must_use]
    pub fn with_map(config: SessionConfig, map: MapLayout) -> Self {
        let session = Session::new(config);
        Self::assemble(map, session)
    }

    fn assemble(map: MapLayout, session: Session) -> Self {
        let combat_rng = ChaCha8Rng::seed_from_u64(session.config().seed);
        Self {
            banner: WELCOME_BANNER,
            map,
            session,
            towers: Vec::new(),
            next_tower_id: TowerId::new(0),
            wave: None,
            combat_rng,
        }
    }

    fn tower_mut(&mut self, tower_id: TowerId) -> Option<&mut Tower> {
        self.towers.iter_mut().find(|tower| tower.id() == tower_id)
    }

    fn allocate_tower_id(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        id
    }

    fn check_placement(&self, kind: TowerKind, cell: CellCoord) -> Result<(), PlacementError> {
        match self.map.marker(cell) {
            None => Err(PlacementError::OutOfBounds),
            Some(marker) if marker.is_path() => Err(PlacementError::OnPath),
            Some(CellMarker::Tower(_)) => Err(PlacementError::Occupied),
            Some(_) => {
                let required = kind.profile().cost;
                let available = self.session.currency();
                if required > available {
                    Err(PlacementError::InsufficientFunds {
                        required,
                        available,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    fn install_tower(&mut self, tower: Tower) {
        self.map.place_tower(tower.position(), tower.kind());
        self.towers.push(tower);
    }

    fn place_tower(&mut self, kind: TowerKind, cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.check_placement(kind, cell) {
            debug!(?kind, cell = %cell.label(), %reason, "tower placement rejected");
            out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            return;
        }
        let cost = kind.profile().cost;
        if let Err((required, available)) = self.session.spend(cost) {
            out_events.push(Event::TowerPlacementRejected {
                kind,
                cell,
                reason: PlacementError::InsufficientFunds {
                    required,
                    available,
                },
            });
            return;
        }

        let tower = self.allocate_tower_id();
        self.install_tower(Tower::new(tower, kind, cell));
        self.session.record_build();
        info!(?kind, cell = %cell.label(), cost, "tower placed");
        out_events.push(Event::TowerPlaced {
            tower,
            kind,
            cell,
            cost,
        });
        announce_achievements(&mut self.session, out_events);
    }

    fn upgrade_tower(&mut self, tower_id: TowerId, out_events: &mut Vec<Event>) {
        let Some((level, price)) = query::tower(self, tower_id)
            .map(|tower| (tower.level(), tower.upgrade_price()))
        else {
            out_events.push(Event::TowerUpgradeRejected {
                tower: tower_id,
                reason: UpgradeError::MissingTower,
            });
            return;
        };

        let charged = if level >= MAX_TOWER_LEVEL {
            Err(UpgradeError::MaxLevel { level })
        } else {
            self.session
                .spend(price)
                .map_err(|(required, available)| UpgradeError::InsufficientFunds {
                    required,
                    available,
                })
        };
        if let Err(reason) = charged {
            debug!(tower = tower_id.get(), %reason, "tower upgrade rejected");
            out_events.push(Event::TowerUpgradeRejected {
                tower: tower_id,
                reason,
            });
            return;
        }

        let Some(tower) = self.tower_mut(tower_id) else {
            return;
        };
        if tower.upgrade().is_err() {
            return;
        }
        let kind = tower.kind();
        let level = tower.level();
        self.session.record_upgrade();
        info!(?kind, level, price, "tower upgraded");
        out_events.push(Event::TowerUpgraded {
            tower: tower_id,
            kind,
            level,
            price,
        });
        announce_achievements(&mut self.session, out_events);
    }

    fn begin_wave(&mut self, plan: WavePlan, out_events: &mut Vec<Event>) {
        let expected = self.session.wave().saturating_add(1);
        let rejection = if self.wave.is_some() {
            Some(WaveStartError::WaveInProgress)
        } else if self.session.outcome(false) != Outcome::Ongoing {
            Some(WaveStartError::SessionOver)
        } else if plan.number() != expected {
            Some(WaveStartError::UnexpectedNumber { expected })
        } else {
            None
        };
        if let Some(reason) = rejection {
            out_events.push(Event::WaveRejected {
                wave: plan.number(),
                reason,
            });
            return;
        }

        self.combat_rng = ChaCha8Rng::seed_from_u64(plan.combat_seed());
        let wave = Wave::from_plan(&plan, self.map.start());
        let enemies = u32::try_from(wave.enemies.len()).unwrap_or(u32::MAX);
        self.session.begin_wave(wave.number);
        info!(wave = wave.number, enemies, "wave started");
        out_events.push(Event::WaveStarted {
            wave: wave.number,
            enemies,
        });
        self.wave = Some(wave);
        if enemies == 0 {
            finish_wave(self, out_events);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected player actions never mutate state; they surface as rejection
/// events instead.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTower { kind, cell } => world.place_tower(kind, cell, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::BeginWave { plan } => world.begin_wave(plan, out_events),
        Command::Tick => tick(world, out_events),
        Command::AdjustGameSpeed { faster } => {
            let current = world.session.game_speed();
            let next = if faster {
                current.faster()
            } else {
                current.slower()
            };
            if next != current {
                world.session.set_game_speed(next);
                out_events.push(Event::GameSpeedChanged { speed: next });
            }
        }
    }
}

fn tick(world: &mut World, out_events: &mut Vec<Event>) {
    let World {
        map,
        session,
        towers,
        wave,
        combat_rng,
        ..
    } = world;
    let Some(wave) = wave.as_mut() else {
        debug!("tick ignored without an active wave");
        return;
    };

    let base = map.base();
    for (slot, enemy) in wave.enemies.iter_mut().enumerate() {
        if !enemy.is_alive() {
            continue;
        }
        enemy.advance(map.path());
        let at_base = enemy.reached_base() || (enemy.is_alive() && enemy.position() == base);
        if at_base && enemy.mark_breached() {
            let had_lives = session.lives() > 0;
            let damage = enemy.damage();
            let lives_remaining = session.lose_lives(damage);
            wave.breached += 1;
            debug!(slot, kind = ?enemy.kind(), damage, lives_remaining, "base breached");
            out_events.push(Event::EnemyBreached {
                enemy: enemy_id(slot),
                kind: enemy.kind(),
                damage,
                lives_remaining,
            });
            if had_lives && lives_remaining == 0 {
                info!(wave = wave.number, "lives depleted");
                out_events.push(Event::LivesDepleted);
            }
        }
    }

    for tower in towers.iter_mut() {
        if let Some(volley) = tower.attack(&mut wave.enemies, combat_rng) {
            out_events.push(Event::TowerFired {
                tower: tower.id(),
                kind: tower.kind(),
                hits: volley.hits,
                damage: volley.damage,
            });
        }
    }

    for (slot, enemy) in wave.enemies.iter_mut().enumerate() {
        if !enemy.awaiting_reward() || !enemy.mark_rewarded() {
            continue;
        }
        let reward = enemy.payout();
        session.earn(reward);
        session.record_defeat();
        wave.defeated += 1;
        out_events.push(Event::EnemyDefeated {
            enemy: enemy_id(slot),
            kind: enemy.kind(),
            reward,
            bounty: enemy.is_bounty_marked(),
        });
        announce_achievements(session, out_events);
    }

    if !wave.has_alive() {
        finish_wave(world, out_events);
    }
}

fn finish_wave(world: &mut World, out_events: &mut Vec<Event>) {
    if let Some(wave) = world.wave.take() {
        let summary = wave.summary();
        info!(
            wave = summary.wave,
            defeated = summary.defeated,
            breached = summary.breached,
            "wave complete"
        );
        out_events.push(Event::WaveCompleted { summary });
    }
}

fn announce_achievements(session: &mut Session, out_events: &mut Vec<Event>) {
    for achievement in session.unlock_achievements() {
        info!(?achievement, "achievement unlocked");
        out_events.push(Event::AchievementUnlocked { achievement });
    }
}

fn enemy_id(slot: usize) -> EnemyId {
    EnemyId::new(u32::try_from(slot).unwrap_or(u32::MAX))
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Enemy, MapLayout, Outcome, SaveGame, Session, Tower, Wave, World};
    use path_defence_core::TowerId;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the board and path.
    #[must_use]
    pub fn map(world: &World) -> &MapLayout {
        &world.map
    }

    /// Provides read-only access to resources and statistics.
    #[must_use]
    pub fn session(world: &World) -> &Session {
        &world.session
    }

    /// Towers in construction order.
    #[must_use]
    pub fn towers(world: &World) -> &[Tower] {
        &world.towers
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<&Tower> {
        world.towers.iter().find(|candidate| candidate.id() == tower)
    }

    /// Active wave, if one is being simulated.
    #[must_use]
    pub fn active_wave(world: &World) -> Option<&Wave> {
        world.wave.as_ref()
    }

    /// Enemies of the active wave, or an empty slice between waves.
    #[must_use]
    pub fn enemies(world: &World) -> &[Enemy] {
        world.wave.as_ref().map_or(&[], |wave| wave.enemies())
    }

    /// Number the next wave must carry to be accepted.
    #[must_use]
    pub fn next_wave_number(world: &World) -> u32 {
        world.session.wave().saturating_add(1)
    }

    /// Progression state of the session.
    #[must_use]
    pub fn outcome(world: &World) -> Outcome {
        world.session.outcome(world.wave.is_some())
    }

    /// Captures everything a save file needs to restore the session.
    #[must_use]
    pub fn save_game(world: &World) -> SaveGame {
        SaveGame::capture(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::{EnemyKind, MapKind, SpawnOrder, SpawnRoute};

    fn short_map() -> MapLayout {
        MapLayout::from_path(
            5,
            3,
            (0..5).map(|column| CellCoord::new(column, 1)).collect(),
        )
        .expect("valid path")
    }

    fn world_with(currency: u32) -> World {
        World::with_map(
            SessionConfig {
                starting_currency: currency,
                starting_lives: 5,
                wave_count: 3,
                ..SessionConfig::default()
            },
            short_map(),
        )
    }

    fn goblin_plan(number: u32, count: u32) -> WavePlan {
        let spawns = (0..count)
            .map(|index| SpawnOrder {
                kind: EnemyKind::Goblin,
                spawn_delay: index,
                max_health: 20,
                reward: 5,
                route: SpawnRoute::Path,
            })
            .collect();
        WavePlan::new(number, 7, spawns)
    }

    #[test]
    fn new_world_uses_standard_board() {
        let world = World::new(SessionConfig {
            map: MapKind::Diagonal,
            ..SessionConfig::default()
        });
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(query::map(&world).columns(), STANDARD_COLUMNS);
        assert_eq!(query::map(&world).start(), CellCoord::new(0, 0));
        assert_eq!(query::next_wave_number(&world), 1);
        assert_eq!(query::outcome(&world), Outcome::Ongoing);
    }

    #[test]
    fn placement_rejections_leave_state_untouched() {
        let mut world = world_with(60);
        let mut events = Vec::new();
        let attempts = [
            (TowerKind::Archer, CellCoord::new(9, 0), PlacementError::OutOfBounds),
            (TowerKind::Archer, CellCoord::new(2, 1), PlacementError::OnPath),
            (TowerKind::Archer, CellCoord::new(0, 1), PlacementError::OnPath),
            (
                TowerKind::Cannon,
                CellCoord::new(2, 0),
                PlacementError::InsufficientFunds {
                    required: 120,
                    available: 60,
                },
            ),
        ];
        for (kind, cell, reason) in attempts {
            apply(&mut world, Command::PlaceTower { kind, cell }, &mut events);
            assert_eq!(
                events.pop(),
                Some(Event::TowerPlacementRejected { kind, cell, reason })
            );
        }
        assert_eq!(query::session(&world).currency(), 60);
        assert!(query::towers(&world).is_empty());
    }

    #[test]
    fn placement_charges_cost_and_occupies_cell() {
        let mut world = world_with(200);
        let mut events = Vec::new();
        let cell = CellCoord::new(2, 0);
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Archer,
                cell,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TowerPlaced {
                tower: TowerId::new(0),
                kind: TowerKind::Archer,
                cell,
                cost: 50,
            }]
        );
        assert_eq!(query::session(&world).currency(), 150);
        assert_eq!(query::session(&world).stats().towers_built, 1);
        assert_eq!(
            query::map(&world).marker(cell),
            Some(CellMarker::Tower(TowerKind::Archer))
        );

        events.clear();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Frost,
                cell,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TowerPlacementRejected {
                kind: TowerKind::Frost,
                cell,
                reason: PlacementError::Occupied,
            }]
        );
    }

    #[test]
    fn upgrade_charges_three_quarters_of_cost() {
        let mut world = world_with(100);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Archer,
                cell: CellCoord::new(1, 0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
            &mut events,
        );
        assert_eq!(
            events.last(),
            Some(&Event::TowerUpgraded {
                tower: TowerId::new(0),
                kind: TowerKind::Archer,
                level: 2,
                price: 37,
            })
        );
        assert_eq!(query::session(&world).currency(), 13);
        assert_eq!(query::session(&world).stats().upgrades_performed, 1);
        assert_eq!(query::session(&world).stats().currency_spent, 87);

        apply(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
            &mut events,
        );
        assert_eq!(
            events.last(),
            Some(&Event::TowerUpgradeRejected {
                tower: TowerId::new(0),
                reason: UpgradeError::InsufficientFunds {
                    required: 46,
                    available: 13,
                },
            })
        );
        apply(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(4),
            },
            &mut events,
        );
        assert_eq!(
            events.last(),
            Some(&Event::TowerUpgradeRejected {
                tower: TowerId::new(4),
                reason: UpgradeError::MissingTower,
            })
        );
    }

    #[test]
    fn waves_must_arrive_in_order() {
        let mut world = world_with(0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BeginWave {
                plan: goblin_plan(2, 1),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::WaveRejected {
                wave: 2,
                reason: WaveStartError::UnexpectedNumber { expected: 1 },
            }]
        );

        events.clear();
        apply(
            &mut world,
            Command::BeginWave {
                plan: goblin_plan(1, 2),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::BeginWave {
                plan: goblin_plan(2, 2),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::WaveStarted {
                    wave: 1,
                    enemies: 2
                },
                Event::WaveRejected {
                    wave: 2,
                    reason: WaveStartError::WaveInProgress,
                },
            ]
        );
    }

    #[test]
    fn undefended_wave_breaches_each_enemy_once() {
        let mut world = world_with(0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BeginWave {
                plan: goblin_plan(1, 2),
            },
            &mut events,
        );
        for _ in 0..20 {
            apply(&mut world, Command::Tick, &mut events);
        }
        let breaches = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyBreached { .. }))
            .count();
        assert_eq!(breaches, 2);
        assert_eq!(query::session(&world).lives(), 3);
        assert!(events.contains(&Event::WaveCompleted {
            summary: WaveSummary {
                wave: 1,
                defeated: 0,
                breached: 2,
            },
        }));
        assert!(query::active_wave(&world).is_none());
        assert!(query::enemies(&world).is_empty());
    }

    #[test]
    fn empty_wave_completes_immediately() {
        let mut world = world_with(0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BeginWave {
                plan: goblin_plan(1, 0),
            },
            &mut events,
        );
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Event::WaveCompleted { .. }));
        assert_eq!(query::next_wave_number(&world), 2);
    }

    #[test]
    fn game_speed_changes_are_announced_until_saturated() {
        let mut world = world_with(0);
        let mut events = Vec::new();
        for _ in 0..12 {
            apply(
                &mut world,
                Command::AdjustGameSpeed { faster: true },
                &mut events,
            );
        }
        assert_eq!(events.len(), 8);
        assert_eq!(
            query::session(&world).game_speed(),
            path_defence_core::GameSpeed::FASTEST
        );
    }
}
