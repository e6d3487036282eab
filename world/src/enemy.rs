//! Enemy model: movement, status effects and damage intake.

use path_defence_core::{CellCoord, EnemyKind, SpawnOrder, SpawnRoute};

/// Status effects towers may inflict on an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusEffect {
    /// Suppresses movement for the provided number of ticks.
    Slow(u32),
    /// Deals one damage per tick for the provided number of ticks.
    Burn(u32),
    /// Skips the provided number of whole ticks.
    Stun(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    Path,
    Direct { target: CellCoord },
}

/// Single enemy of a wave.
///
/// Enemies are never removed from their wave while it runs; the `alive`,
/// `breached` and `rewarded` flags only ever move from their initial value
/// once, which keeps indices stable for the whole tick loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    kind: EnemyKind,
    route: Route,
    path_index: usize,
    position: CellCoord,
    max_health: u32,
    health: u32,
    speed: u32,
    reward: u32,
    damage: u32,
    alive: bool,
    reached_base: bool,
    breached: bool,
    rewarded: bool,
    bounty_marked: bool,
    spawn_delay: u32,
    slowed: u32,
    burning: u32,
    stunned: u32,
    skip_move: bool,
    regen_counter: u32,
}

impl Enemy {
    /// Creates an unscaled enemy of the provided kind standing on `start`.
    ///
    /// Flying kinds created this way still follow the path; use
    /// [`Enemy::spawn`] to give them direct-flight endpoints.
    #[must_use]
    pub fn new(kind: EnemyKind, start: CellCoord) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            route: Route::Path,
            path_index: 0,
            position: start,
            max_health: profile.max_health,
            health: profile.max_health,
            speed: profile.speed,
            reward: profile.reward,
            damage: profile.damage,
            alive: profile.max_health > 0,
            reached_base: false,
            breached: false,
            rewarded: false,
            bounty_marked: false,
            spawn_delay: 0,
            slowed: 0,
            burning: 0,
            stunned: 0,
            skip_move: false,
            regen_counter: 0,
        }
    }

    /// Instantiates the enemy described by a generated spawn order.
    #[must_use]
    pub fn spawn(order: &SpawnOrder, path_start: CellCoord) -> Self {
        let (route, position) = match order.route {
            SpawnRoute::Path => (Route::Path, path_start),
            SpawnRoute::Direct { from, to } => (Route::Direct { target: to }, from),
        };
        Self {
            route,
            spawn_delay: order.spawn_delay,
            ..Self::new(order.kind, position).with_health(order.max_health)
        }
        .with_reward(order.reward)
    }

    /// Replaces both the maximum and the current health.
    #[must_use]
    pub fn with_health(mut self, health: u32) -> Self {
        self.max_health = health;
        self.health = health;
        self.alive = health > 0;
        self
    }

    /// Replaces the number of path cells advanced per tick.
    #[must_use]
    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    /// Replaces the currency granted on defeat.
    #[must_use]
    pub fn with_reward(mut self, reward: u32) -> Self {
        self.reward = reward;
        self
    }

    /// Replaces the number of ticks before the enemy enters the board.
    #[must_use]
    pub fn with_spawn_delay(mut self, ticks: u32) -> Self {
        self.spawn_delay = ticks;
        self
    }

    /// Advances the enemy by one tick along `path`.
    ///
    /// Pending spawn delay and stun each consume the whole tick. Path walkers
    /// then resolve status effects and move unless a slow suppressed it.
    /// Flyers ignore slow, burn and regeneration and always take their step.
    /// Running off the end of the path, or landing on the flight target,
    /// marks the enemy as having reached the base; the caller applies the
    /// breach.
    pub fn advance(&mut self, path: &[CellCoord]) {
        if !self.alive {
            return;
        }
        if self.spawn_delay > 0 {
            self.spawn_delay -= 1;
            return;
        }
        if self.stunned > 0 {
            self.stunned -= 1;
            return;
        }

        match self.route {
            Route::Path => {
                self.apply_effects();
                if !self.alive || self.skip_move {
                    return;
                }
                let next = self.path_index.saturating_add(self.speed as usize);
                match path.get(next) {
                    Some(cell) => {
                        self.path_index = next;
                        self.position = *cell;
                    }
                    None => self.arrive(),
                }
            }
            Route::Direct { target } => {
                self.position = self.position.step_toward(target);
                if self.position == target {
                    self.arrive();
                }
            }
        }
    }

    /// Resolves slow, burn and regeneration for the current tick.
    pub fn apply_effects(&mut self) {
        if self.slowed > 0 {
            self.slowed -= 1;
            self.skip_move = true;
        } else {
            self.skip_move = false;
        }

        if self.burning > 0 {
            self.burning -= 1;
            if !self.kind.profile().fire_immune {
                self.take_damage(1);
            }
        }

        if let Some(interval) = self.kind.profile().regen_interval {
            if self.alive {
                self.regen_counter += 1;
                if self.regen_counter >= interval {
                    self.regen_counter = 0;
                    self.health = self.health.saturating_add(1).min(self.max_health);
                }
            }
        }
    }

    /// Removes health, killing the enemy once it reaches zero.
    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.alive = false;
        }
    }

    /// Applies a status effect, replacing any shorter duration of the same kind.
    pub fn inflict(&mut self, effect: StatusEffect) {
        match effect {
            StatusEffect::Slow(ticks) => self.slowed = self.slowed.max(ticks),
            StatusEffect::Burn(ticks) => self.burning = self.burning.max(ticks),
            StatusEffect::Stun(ticks) => self.stunned = self.stunned.max(ticks),
        }
    }

    /// Marks the enemy so its defeat pays the bounty multiplier.
    pub fn mark_bounty(&mut self) {
        self.bounty_marked = true;
    }

    /// Records the breach, returning `true` only the first time.
    pub fn mark_breached(&mut self) -> bool {
        if self.breached {
            return false;
        }
        self.breached = true;
        self.arrive();
        true
    }

    /// Records that the defeat reward was paid, returning `true` only the first time.
    pub fn mark_rewarded(&mut self) -> bool {
        !std::mem::replace(&mut self.rewarded, true)
    }

    fn arrive(&mut self) {
        self.alive = false;
        self.reached_base = true;
    }

    /// Reports whether the enemy awaits a defeat reward.
    #[must_use]
    pub const fn awaiting_reward(&self) -> bool {
        !self.alive && !self.reached_base && !self.rewarded
    }

    /// Currency granted on defeat, including the bounty multiplier.
    #[must_use]
    pub const fn payout(&self) -> u32 {
        if self.bounty_marked {
            self.reward.saturating_mul(3) / 2
        } else {
            self.reward
        }
    }

    /// Kind of the enemy.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Cell currently occupied.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Offset along the path; flying enemies stay at zero.
    #[must_use]
    pub const fn path_index(&self) -> usize {
        self.path_index
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Path cells advanced per tick.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Base currency granted on defeat.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Lives removed on breach.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Whether the enemy is still active in the wave.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the enemy got to the base.
    #[must_use]
    pub const fn reached_base(&self) -> bool {
        self.reached_base
    }

    /// Whether the defeat reward was paid.
    #[must_use]
    pub const fn is_rewarded(&self) -> bool {
        self.rewarded
    }

    /// Whether a bounty mark is pending.
    #[must_use]
    pub const fn is_bounty_marked(&self) -> bool {
        self.bounty_marked
    }

    /// Hidden from towers without special sight.
    #[must_use]
    pub const fn is_invisible(&self) -> bool {
        self.kind.profile().invisible
    }

    /// Remaining spawn delay.
    #[must_use]
    pub const fn spawn_delay(&self) -> u32 {
        self.spawn_delay
    }

    /// Remaining slow ticks.
    #[must_use]
    pub const fn slowed(&self) -> u32 {
        self.slowed
    }

    /// Remaining burn ticks.
    #[must_use]
    pub const fn burning(&self) -> u32 {
        self.burning
    }

    /// Remaining stun ticks.
    #[must_use]
    pub const fn stunned(&self) -> u32 {
        self.stunned
    }
}
