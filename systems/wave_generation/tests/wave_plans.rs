use path_defence_core::{EnemyKind, MapKind, SessionConfig, SpawnRoute};
use path_defence_system_wave_generation::{enemy_count, WaveGeneration};
use path_defence_world::{MapLayout, Wave};
use rand::{rngs::mock::StepRng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn config(seed: u64) -> SessionConfig {
    SessionConfig {
        seed,
        ..SessionConfig::default()
    }
}

#[test]
fn every_tenth_wave_opens_with_the_boss() {
    let map = MapLayout::standard(MapKind::Winding, 5);
    for seed in 0..32 {
        let generator = WaveGeneration::new(&config(seed));
        for wave in [10, 20, 30] {
            let plan = generator.plan_wave(wave, map.start(), map.base());
            assert_eq!(plan.spawns()[0].kind, EnemyKind::Dragon, "seed {seed}");
            assert!(plan.spawns()[1..]
                .iter()
                .all(|order| order.kind != EnemyKind::Dragon));
        }
    }
}

#[test]
fn boss_slot_ignores_the_random_source() {
    let generator = WaveGeneration::new(&config(0));
    let map = MapLayout::standard(MapKind::Linear, 0);
    for state in [0, u64::MAX / 2, u64::MAX] {
        let plan = generator.generate(10, map.start(), map.base(), 0, &mut StepRng::new(state, 0));
        assert_eq!(plan.spawns()[0].kind, EnemyKind::Dragon);
        assert_eq!(plan.spawns()[0].max_health, 190);
        assert_eq!(plan.spawns()[0].reward, 72);
    }
}

#[test]
fn non_boss_waves_never_spawn_the_boss() {
    let generator = WaveGeneration::new(&config(3));
    let map = MapLayout::standard(MapKind::Linear, 0);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for wave in (1..40).filter(|wave| wave % 10 != 0) {
        let plan = generator.generate(wave, map.start(), map.base(), 0, &mut rng);
        assert_eq!(plan.spawns().len() as u32, enemy_count(wave));
        assert!(plan
            .spawns()
            .iter()
            .all(|order| order.kind != EnemyKind::Dragon));
    }
}

#[test]
fn bats_fly_from_start_to_base() {
    let map = MapLayout::standard(MapKind::Diagonal, 0);
    let generator = WaveGeneration::new(&config(0));
    let plan = generator.generate(
        1,
        map.start(),
        map.base(),
        0,
        &mut StepRng::new(u64::MAX / 100 * 97, 0),
    );
    for order in plan.spawns() {
        assert_eq!(order.kind, EnemyKind::Bat);
        assert_eq!(
            order.route,
            SpawnRoute::Direct {
                from: map.start(),
                to: map.base(),
            }
        );
    }

    let wave = Wave::from_plan(&plan, map.start());
    assert!(wave
        .enemies()
        .iter()
        .all(|enemy| enemy.position() == map.start()));
}

#[test]
fn scaled_health_becomes_current_health() {
    let map = MapLayout::standard(MapKind::Linear, 0);
    let generator = WaveGeneration::new(&SessionConfig {
        hp_scale_per_wave: 0.5,
        reward_scale_per_wave: 0.25,
        ..config(9)
    });
    let plan = generator.generate(3, map.start(), map.base(), 0, &mut StepRng::new(0, 0));
    let wave = Wave::from_plan(&plan, map.start());
    for enemy in wave.enemies() {
        assert_eq!(enemy.kind(), EnemyKind::Goblin);
        assert_eq!(enemy.max_health(), 40);
        assert_eq!(enemy.health(), 40);
        assert_eq!(enemy.reward(), 7);
    }
}
