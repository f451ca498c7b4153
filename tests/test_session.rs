use stormz_day::armor::ArmorKind;
use stormz_day::config::{GameConfig, PoolConfig, WaveGroup, WaveSpec, WaveTable};
use stormz_day::entities::{CombatEvent, KillCause, RunState, ZombieKind};
use stormz_day::error::GameError;
use stormz_day::input::{ControlScheme, InputEvent, InputSnapshot, Key};
use stormz_day::session::*;
use stormz_day::storage::{GameStorage, Perk};
use stormz_day::weapons::WeaponKind;

use glam::Vec2;

fn single_walker_config() -> GameConfig {
    GameConfig {
        waves: WaveTable {
            waves: vec![WaveSpec {
                groups: vec![WaveGroup {
                    kind: ZombieKind::Walker,
                    count: 1,
                }],
                spawn_interval: 0.1,
            }],
            wave_break: 0.0,
        },
        ..GameConfig::default()
    }
}

fn started(config: GameConfig) -> GameSession {
    let mut session = GameSession::new(config, 42);
    session.start(&GameStorage::default()).unwrap();
    session
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn start_spawns_player_at_centre() {
    let session = started(GameConfig::default());

    assert_eq!(session.state(), RunState::Running);
    let player = session.world.player().unwrap();
    assert_eq!(player.position, Vec2::new(480.0, 270.0));
    assert_eq!(player.hp, 5.0);
    assert_eq!(player.weapon.as_ref().unwrap().kind, WeaponKind::Pistol);
    assert!(player.armor.is_none());
}

#[test]
fn frame_before_start_does_nothing() {
    let mut session = GameSession::new(GameConfig::default(), 42);
    session.frame(1.0, &InputSnapshot::default()).unwrap();

    assert_eq!(session.state(), RunState::NotStarted);
    assert_eq!(session.run_time(), 0.0);
    assert_eq!(session.wave_count(), 0);
}

#[test]
fn waves_start_then_trickle_in() {
    let mut session = started(GameConfig::default());
    let input = InputSnapshot::default();

    session.frame(1.0, &input).unwrap();
    assert_eq!(session.wave_count(), 1);
    assert_eq!(session.spawner().queued(), 6);
    assert!(session.world.zombies.is_empty());

    session.frame(1.0, &input).unwrap();
    assert_eq!(session.spawner().queued(), 5);
    assert_eq!(session.world.zombies.active_len(), 1);

    // Wave 1 spawns every 1.12 s
    session.frame(60.0, &input).unwrap();
    assert_eq!(session.world.zombies.active_len(), 1);
    session.frame(8.0, &input).unwrap();
    assert_eq!(session.world.zombies.active_len(), 2);
}

#[test]
fn zombies_spawn_on_the_display_edge() {
    let mut session = started(GameConfig::default());
    let input = InputSnapshot::default();
    session.frame(1.0, &input).unwrap();
    session.frame(1.0, &input).unwrap();

    let (_, zombie) = session.world.zombies.iter().next().unwrap();
    let p = zombie.position;
    let on_edge = p.x <= 1.2 || p.y <= 1.2 || p.x >= 958.8 || p.y >= 538.8;
    assert!(on_edge, "spawned at {p}");
}

#[test]
fn same_seed_same_spawns() {
    let run = || {
        let mut session = started(GameConfig::default());
        let input = InputSnapshot::default();
        for _ in 0..200 {
            session.frame(1.0, &input).unwrap();
        }
        session
            .world
            .zombies
            .iter()
            .map(|(_, z)| (z.kind, z.position))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn pause_freezes_the_run() {
    let mut session = started(GameConfig::default());
    let input = InputSnapshot::default();
    session.frame(6.0, &input).unwrap();
    let time = session.run_time();

    session.pause();
    assert_eq!(session.state(), RunState::Paused);
    session.frame(60.0, &input).unwrap();
    assert_eq!(session.run_time(), time);

    // Shots are refused while paused
    session.handle_event(InputEvent::KeyDown(Key::Space), &input).unwrap();
    assert!(session.world.projectiles.is_empty());

    session.resume();
    assert_eq!(session.state(), RunState::Running);
    session.handle_event(InputEvent::KeyDown(Key::Space), &input).unwrap();
    assert_eq!(session.world.projectiles.active_len(), 1);
}

#[test]
fn full_zombie_pool_fails_the_frame() {
    let mut config = single_walker_config();
    config.waves.waves[0].groups[0].count = 2;
    config.pools = PoolConfig {
        zombies: 1,
        ..PoolConfig::default()
    };
    let mut session = started(config);
    let input = InputSnapshot::default();

    session.frame(1.0, &input).unwrap();
    session.frame(1.0, &input).unwrap();
    assert_eq!(session.world.zombies.active_len(), 1);

    // The second walker is due 0.1 s later, with no free slot
    assert_eq!(
        session.frame(12.0, &input),
        Err(GameError::PoolExhausted {
            pool: "zombie",
            capacity: 1,
        })
    );
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[test]
fn dead_player_loses_the_run() {
    let mut session = started(GameConfig::default());
    let id = session.world.players.active_ids()[0];
    session.world.players.get_mut(id).unwrap().hp = 0.0;

    session.frame(1.0, &InputSnapshot::default()).unwrap();
    assert_eq!(session.state(), RunState::Lost);

    let mut storage = GameStorage::default();
    let summary = session.finish(&mut storage);
    assert!(!summary.victory);
    assert_eq!(summary.tokens_gained, 0);
    assert_eq!(storage.tokens, 20);
    assert_eq!(session.state(), RunState::NotStarted);
    assert!(session.world.players.is_empty());
}

#[test]
fn clearing_every_wave_wins() {
    let mut session = started(single_walker_config());
    let input = InputSnapshot::default();

    session.frame(1.0, &input).unwrap();
    assert_eq!(session.wave_count(), 1);
    session.frame(1.0, &input).unwrap();
    assert_eq!(session.world.zombies.active_len(), 1);
    assert_eq!(session.state(), RunState::Running);

    let zombie = session.world.zombies.active_ids()[0];
    session.world.zombies.recycle(zombie);
    session.world.events.push(CombatEvent::ZombieKilled {
        kind: ZombieKind::Walker,
        cause: KillCause::Projectile,
    });
    session.frame(1.0, &input).unwrap();

    assert_eq!(session.state(), RunState::Won);
    assert_eq!(session.score(), 10);

    let mut storage = GameStorage::default();
    let summary = session.finish(&mut storage);
    assert_eq!(
        summary,
        RunSummary {
            score: 10,
            wave: 1,
            tokens_gained: 15,
            victory: true,
        }
    );
    assert_eq!(storage.tokens, 35);
    assert_eq!(storage.highscore, 10);
}

#[test]
fn empty_wave_table_wins_immediately() {
    let config = GameConfig {
        waves: WaveTable {
            waves: Vec::new(),
            wave_break: 0.0,
        },
        ..GameConfig::default()
    };
    let mut session = started(config);
    session.frame(1.0, &InputSnapshot::default()).unwrap();
    assert_eq!(session.state(), RunState::Won);
}

#[test]
fn restart_clears_previous_run() {
    let mut session = started(GameConfig::default());
    let input = InputSnapshot::default();
    for _ in 0..120 {
        session.frame(1.0, &input).unwrap();
    }
    assert!(!session.world.zombies.is_empty());

    session.start(&GameStorage::default()).unwrap();
    assert!(session.world.zombies.is_empty());
    assert_eq!(session.world.players.active_len(), 1);
    assert_eq!(session.wave_count(), 0);
    assert_eq!(session.score(), 0);
}

// ── Loadout ───────────────────────────────────────────────────────────────────

#[test]
fn loadout_applies_saved_perks() {
    let mut storage = GameStorage {
        tokens: 1000,
        ..GameStorage::default()
    };
    storage.upgrade_weapon_perk(WeaponKind::Pistol, Perk::Damage).unwrap();
    storage.upgrade_weapon_perk(WeaponKind::Pistol, Perk::Damage).unwrap();
    storage.armor_interact(ArmorKind::Heavy).unwrap();
    storage.upgrade_armor_perk(ArmorKind::Heavy, Perk::Vitality).unwrap();
    storage.general_upgrades.insert(Perk::Vitality, 1);

    let spawn = loadout(&storage, &GameConfig::default(), ControlScheme::Simple);

    let weapon = spawn.weapon.unwrap();
    assert!((weapon.stats.damage() - 7.0).abs() < 1e-5);
    assert!(weapon.can_shoot());
    let armor = spawn.armor.unwrap();
    assert!((armor.stats.max_health() - 6.0).abs() < 1e-5);
    assert_eq!(armor.stats.health, armor.stats.max_health());
    assert!((spawn.max_hp - 6.0).abs() < 1e-5);
    assert!(spawn.joystick.is_none());
}

#[test]
fn mobile_loadout_places_joystick_bottom_left() {
    let spawn = loadout(&GameStorage::default(), &GameConfig::default(), ControlScheme::Mobile);
    let joystick = spawn.joystick.unwrap();
    assert_eq!(joystick.start(), Vec2::new(70.0, 470.0));
    assert_eq!(joystick.amplitude(), 60.0);
}

#[test]
fn sounds_drain_once() {
    let mut session = started(GameConfig::default());
    let input = InputSnapshot::default();
    session.handle_event(InputEvent::KeyDown(Key::Space), &input).unwrap();

    assert_eq!(session.drain_sounds().count(), 1);
    assert_eq!(session.drain_sounds().count(), 0);
}
