//! Tower model: targeting policies, on-hit effects and level progression.

use path_defence_core::{
    CellCoord, TowerId, TowerKind, UpgradeError, COST_GROWTH_DENOMINATOR, COST_GROWTH_NUMERATOR,
    MAX_TOWER_LEVEL,
};
use rand::Rng;

use crate::enemy::{Enemy, StatusEffect};

/// Probability that a cannon hit stuns its target.
pub const STUN_CHANCE: f64 = 0.3;
/// Ticks a cannon stun lasts.
pub const STUN_TICKS: u32 = 1;
/// Ticks a frost hit slows its target.
pub const SLOW_TICKS: u32 = 2;
/// Ticks a fire hit keeps its target burning.
pub const BURN_TICKS: u32 = 3;
/// Most enemies a laser strikes per attack.
pub const LASER_MAX_TARGETS: usize = 5;
/// Archer shots that land as double-damage critical hits.
pub const ARCHER_CRITICAL_EVERY: u32 = 5;

/// Outcome of a resolved attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Volley {
    /// Enemies hit by the attack.
    pub hits: u32,
    /// Damage dealt across every hit.
    pub damage: u32,
}

/// Tower placed on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tower {
    id: TowerId,
    kind: TowerKind,
    position: CellCoord,
    range: u32,
    damage: u32,
    attack_interval: u32,
    cooldown: u32,
    level: u32,
    cost: u32,
    hits: u32,
    total_damage: u32,
    shots_fired: u32,
}

impl Tower {
    /// Creates a level-one tower ready to fire.
    #[must_use]
    pub fn new(id: TowerId, kind: TowerKind, position: CellCoord) -> Self {
        let profile = kind.profile();
        Self {
            id,
            kind,
            position,
            range: profile.range,
            damage: profile.damage,
            attack_interval: profile.attack_interval,
            cooldown: 0,
            level: 1,
            cost: profile.cost,
            hits: 0,
            total_damage: 0,
            shots_fired: 0,
        }
    }

    /// Reports whether the enemy lies within Manhattan range.
    #[must_use]
    pub fn in_range(&self, enemy: &Enemy) -> bool {
        self.position.manhattan_distance(enemy.position()) <= self.range
    }

    /// Reports whether the tower may attack the enemy right now.
    #[must_use]
    pub fn can_target(&self, enemy: &Enemy) -> bool {
        enemy.is_alive()
            && (!enemy.is_invisible() || self.kind.profile().targets_invisible)
            && self.in_range(enemy)
    }

    /// Indices of every enemy the tower may attack, in wave order.
    #[must_use]
    pub fn find_targets(&self, enemies: &[Enemy]) -> Vec<usize> {
        enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| self.can_target(enemy))
            .map(|(index, _)| index)
            .collect()
    }

    /// Resolves one tick of the tower's attack cycle.
    ///
    /// A cooling tower only counts down. A ready tower without targets keeps
    /// its cooldown at zero and fires as soon as something comes in range.
    pub fn attack<R>(&mut self, enemies: &mut [Enemy], rng: &mut R) -> Option<Volley>
    where
        R: Rng + ?Sized,
    {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        let targets = self.select_targets(enemies);
        if targets.is_empty() {
            return None;
        }

        self.shots_fired = self.shots_fired.saturating_add(1);
        let mut volley = Volley::default();
        for index in targets {
            if let Some(enemy) = enemies.get_mut(index) {
                volley.damage = volley.damage.saturating_add(self.strike(enemy, rng));
                volley.hits += 1;
            }
        }
        self.hits = self.hits.saturating_add(volley.hits);
        self.total_damage = self.total_damage.saturating_add(volley.damage);
        self.cooldown = self.attack_interval;
        Some(volley)
    }

    fn select_targets(&self, enemies: &[Enemy]) -> Vec<usize> {
        let eligible = self.find_targets(enemies);
        match self.kind {
            TowerKind::Archer | TowerKind::Cannon => eligible
                .into_iter()
                .min_by_key(|index| enemies[*index].health())
                .into_iter()
                .collect(),
            TowerKind::Frost | TowerKind::Fire => {
                let mut furthest: Option<usize> = None;
                for index in eligible {
                    let ahead = furthest.map_or(true, |best| {
                        enemies[index].path_index() > enemies[best].path_index()
                    });
                    if ahead {
                        furthest = Some(index);
                    }
                }
                furthest.into_iter().collect()
            }
            TowerKind::Laser => eligible.into_iter().take(LASER_MAX_TARGETS).collect(),
        }
    }

    fn strike<R>(&self, enemy: &mut Enemy, rng: &mut R) -> u32
    where
        R: Rng + ?Sized,
    {
        let damage = match self.kind {
            TowerKind::Archer if self.shots_fired % ARCHER_CRITICAL_EVERY == 0 => {
                self.damage.saturating_mul(2)
            }
            _ => self.damage,
        };
        enemy.take_damage(damage);
        match self.kind {
            TowerKind::Archer => {}
            TowerKind::Cannon => {
                if rng.gen_bool(STUN_CHANCE) {
                    enemy.inflict(StatusEffect::Stun(STUN_TICKS));
                }
            }
            TowerKind::Frost => enemy.inflict(StatusEffect::Slow(SLOW_TICKS)),
            TowerKind::Fire => enemy.inflict(StatusEffect::Burn(BURN_TICKS)),
            TowerKind::Laser => enemy.mark_bounty(),
        }
        damage
    }

    /// Raises the tower one level, or leaves it untouched at the maximum level.
    pub fn upgrade(&mut self) -> Result<(), UpgradeError> {
        if self.level >= MAX_TOWER_LEVEL {
            return Err(UpgradeError::MaxLevel { level: self.level });
        }
        self.level += 1;
        self.range += 1;
        self.damage += 1;
        self.attack_interval = self.attack_interval.saturating_sub(1).max(1);
        self.cost = cost_at_level(self.kind, self.level);
        Ok(())
    }

    /// Currency charged to raise the tower one level.
    #[must_use]
    pub const fn upgrade_price(&self) -> u32 {
        self.cost.saturating_mul(3) / 4
    }

    /// Restores lifetime counters and the pending cooldown when rebuilding a
    /// tower from a save.
    pub(crate) fn restore_progress(
        &mut self,
        hits: u32,
        total_damage: u32,
        shots_fired: u32,
        cooldown: u32,
    ) {
        self.hits = hits;
        self.total_damage = total_damage;
        self.shots_fired = shots_fired;
        self.cooldown = cooldown.min(self.attack_interval);
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Kind of the tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Cell the tower occupies.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Manhattan reach in cells.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Damage per hit before critical multipliers.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Ticks between attacks.
    #[must_use]
    pub const fn attack_interval(&self) -> u32 {
        self.attack_interval
    }

    /// Ticks left before the next attack.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Value of the tower at its current level.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Enemies hit over the tower's lifetime.
    #[must_use]
    pub const fn hits(&self) -> u32 {
        self.hits
    }

    /// Damage dealt over the tower's lifetime.
    #[must_use]
    pub const fn total_damage(&self) -> u32 {
        self.total_damage
    }

    /// Attacks resolved over the tower's lifetime.
    #[must_use]
    pub const fn shots_fired(&self) -> u32 {
        self.shots_fired
    }
}

/// Cost of a tower at `level`: base cost times 1.25^(level - 1), rounded down.
#[must_use]
pub fn cost_at_level(kind: TowerKind, level: u32) -> u32 {
    let steps = level.saturating_sub(1);
    let numerator = u128::from(COST_GROWTH_NUMERATOR).pow(steps);
    let denominator = u128::from(COST_GROWTH_DENOMINATOR).pow(steps);
    let cost = u128::from(kind.profile().cost) * numerator / denominator;
    u32::try_from(cost).unwrap_or(u32::MAX)
}
