//! Constant stat tables for every enemy and tower kind.

use serde::{Deserialize, Serialize};

/// Highest level a tower may reach through upgrades.
pub const MAX_TOWER_LEVEL: u32 = 20;

/// Numerator of the per-level tower cost growth factor (1.25).
pub const COST_GROWTH_NUMERATOR: u32 = 5;

/// Denominator of the per-level tower cost growth factor (1.25).
pub const COST_GROWTH_DENOMINATOR: u32 = 4;

/// Enemy variants that may appear in a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Cheap and plentiful foot soldier.
    Goblin,
    /// Sturdier foot soldier.
    Orc,
    /// Boss that leads every tenth wave.
    Dragon,
    /// Invisible to towers without special sight.
    Ghost,
    /// Flies straight from the start to the base.
    Bat,
    /// Regenerates health over time.
    Troll,
    /// Fragile but hits the base hard.
    Spider,
    /// Armoured against burning.
    Knight,
}

/// Base statistics shared by every enemy of a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyProfile {
    /// Health before wave scaling.
    pub max_health: u32,
    /// Path cells advanced per tick.
    pub speed: u32,
    /// Currency granted on defeat before wave scaling.
    pub reward: u32,
    /// Lives removed when the enemy breaches the base.
    pub damage: u32,
    /// Hidden from towers that cannot target invisible enemies.
    pub invisible: bool,
    /// Ignores damage from burning.
    pub fire_immune: bool,
    /// Ticks between each regenerated health point, when regenerating.
    pub regen_interval: Option<u32>,
    /// Ignores the path and flies straight toward the base.
    pub flies_direct: bool,
}

impl EnemyProfile {
    const fn plain(max_health: u32, speed: u32, reward: u32, damage: u32) -> Self {
        Self {
            max_health,
            speed,
            reward,
            damage,
            invisible: false,
            fire_immune: false,
            regen_interval: None,
            flies_direct: false,
        }
    }
}

impl EnemyKind {
    /// Kind forced at the head of every tenth wave.
    pub const BOSS: EnemyKind = EnemyKind::Dragon;

    /// Every kind in roster order.
    pub const ALL: [EnemyKind; 8] = [
        Self::Goblin,
        Self::Orc,
        Self::Dragon,
        Self::Ghost,
        Self::Bat,
        Self::Troll,
        Self::Spider,
        Self::Knight,
    ];

    /// Constant statistics describing the kind.
    #[must_use]
    pub const fn profile(self) -> EnemyProfile {
        match self {
            Self::Goblin => EnemyProfile::plain(20, 1, 5, 1),
            Self::Orc => EnemyProfile::plain(25, 1, 10, 2),
            Self::Dragon => EnemyProfile::plain(100, 2, 50, 5),
            Self::Ghost => EnemyProfile {
                invisible: true,
                ..EnemyProfile::plain(15, 1, 12, 1)
            },
            Self::Bat => EnemyProfile {
                flies_direct: true,
                ..EnemyProfile::plain(5, 2, 8, 1)
            },
            Self::Troll => EnemyProfile {
                regen_interval: Some(5),
                ..EnemyProfile::plain(35, 1, 15, 3)
            },
            Self::Spider => EnemyProfile::plain(10, 1, 12, 2),
            Self::Knight => EnemyProfile {
                fire_immune: true,
                ..EnemyProfile::plain(18, 1, 18, 4)
            },
        }
    }

    /// Player-facing name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Goblin => "Goblin",
            Self::Orc => "Orc",
            Self::Dragon => "Dragon",
            Self::Ghost => "Ghost",
            Self::Bat => "Bat",
            Self::Troll => "Troll",
            Self::Spider => "Spider",
            Self::Knight => "Knight",
        }
    }

    /// Single character used by text renderers.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Goblin => 'g',
            Self::Orc => 'o',
            Self::Dragon => 'D',
            Self::Ghost => 'h',
            Self::Bat => 'b',
            Self::Troll => 't',
            Self::Spider => 's',
            Self::Knight => 'k',
        }
    }
}

/// Tower variants a player may construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Fast single-target shooter with periodic critical shots.
    Archer,
    /// Heavy hitter that may stun its target.
    Cannon,
    /// Slows the most advanced enemy in range.
    Frost,
    /// Sets the most advanced enemy in range on fire.
    Fire,
    /// Strikes several enemies at once and marks them for bounty.
    Laser,
}

/// Level-one statistics of a tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerProfile {
    /// Manhattan reach in cells.
    pub range: u32,
    /// Damage dealt per hit.
    pub damage: u32,
    /// Ticks between attacks.
    pub attack_interval: u32,
    /// Construction cost.
    pub cost: u32,
    /// Whether invisible enemies may be targeted.
    pub targets_invisible: bool,
}

impl TowerKind {
    /// Every kind in build-menu order; slot `n` selects `ALL[n - 1]`.
    pub const ALL: [TowerKind; 5] = [
        Self::Archer,
        Self::Cannon,
        Self::Frost,
        Self::Fire,
        Self::Laser,
    ];

    /// Constant level-one statistics describing the kind.
    #[must_use]
    pub const fn profile(self) -> TowerProfile {
        let (range, damage, attack_interval, cost, targets_invisible) = match self {
            Self::Archer => (3, 2, 1, 50, false),
            Self::Cannon => (2, 5, 2, 120, false),
            Self::Frost => (3, 2, 1, 70, false),
            Self::Fire => (3, 2, 2, 100, true),
            Self::Laser => (4, 2, 1, 60, true),
        };
        TowerProfile {
            range,
            damage,
            attack_interval,
            cost,
            targets_invisible,
        }
    }

    /// Resolves a 1-based build-menu slot.
    #[must_use]
    pub fn from_slot(slot: usize) -> Option<TowerKind> {
        slot.checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }

    /// Player-facing name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Archer => "Archer",
            Self::Cannon => "Cannon",
            Self::Frost => "Frost",
            Self::Fire => "Fire",
            Self::Laser => "Laser",
        }
    }

    /// Single character used by text renderers.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Archer => 'A',
            Self::Cannon => 'C',
            Self::Frost => 'F',
            Self::Fire => 'R',
            Self::Laser => 'L',
        }
    }
}
