use stormz_day::armor::{Armor, ArmorKind};
use stormz_day::entities::*;
use stormz_day::geometry::{sprites_overlap, Rect};
use stormz_day::pool::{Pool, Pooled};
use stormz_day::stats::{ArmorStat, ArmorStats, StatSheet};
use stormz_day::weapons::{Weapon, WeaponKind};

use glam::Vec2;

fn split_armor(health: f32, resistance: f32) -> Armor {
    Armor::with_stats(
        ArmorKind::Light,
        ArmorStats::new(StatSheet::new(&[
            (ArmorStat::MaxHealth, health),
            (ArmorStat::Resistance, resistance),
            (ArmorStat::RegenCooldown, 2.0),
            (ArmorStat::RegenRate, 1.0),
            (ArmorStat::SpeedPenalty, 1.0),
        ])),
    )
}

fn player_with(armor: Option<Armor>, hp: f32) -> Player {
    let mut player = Player::default();
    player.on_spawn(PlayerSpawn {
        position: Vec2::new(100.0, 100.0),
        weapon: None,
        armor,
        max_hp: hp,
        speed: 7.0,
        joystick: None,
    });
    player
}

#[test]
fn enums_compare_and_default() {
    assert_eq!(Hostility::default(), Hostility::Friendly);
    assert_ne!(Hostility::Friendly, Hostility::Hostile);
    assert_eq!(ZombieKind::default(), ZombieKind::Walker);
    assert_eq!(RunState::default(), RunState::NotStarted);

    assert!(RunState::Won.is_over());
    assert!(RunState::Lost.is_over());
    assert!(!RunState::Paused.is_over());
    assert!(!RunState::Running.is_over());
}

// ── Damage ────────────────────────────────────────────────────────────────────

#[test]
fn armor_absorbs_its_share_of_a_hit() {
    let mut player = player_with(Some(split_armor(10.0, 0.5)), 10.0);

    let through = player.take_damage(8.0);

    assert_eq!(through, 4.0);
    assert_eq!(player.hp, 6.0);
    assert_eq!(player.armor.as_ref().unwrap().stats.health, 6.0);
}

#[test]
fn depleted_armor_passes_the_overflow() {
    let mut player = player_with(Some(split_armor(2.0, 0.5)), 10.0);

    let through = player.take_damage(8.0);

    assert_eq!(through, 6.0);
    assert_eq!(player.hp, 4.0);
    assert_eq!(player.armor.as_ref().unwrap().stats.health, 0.0);
}

#[test]
fn unarmored_player_takes_full_damage_and_stops_at_zero() {
    let mut player = player_with(None, 5.0);
    player.take_damage(1.0);
    assert_eq!(player.hp, 4.0);
    assert!(player.is_alive());

    player.take_damage(50.0);
    assert_eq!(player.hp, 0.0);
    assert!(!player.is_alive());
}

#[test]
fn healthbars_track_fractions() {
    let mut player = player_with(Some(split_armor(4.0, 0.5)), 10.0);
    assert_eq!(player.hp_bar, HEALTHBAR_WIDTH);
    assert_eq!(player.armor_bar, HEALTHBAR_WIDTH);

    // 4 damage: armor 4 → 2, hp 10 → 8
    player.take_damage(4.0);
    assert_eq!(player.hp_bar, HEALTHBAR_WIDTH * 0.8);
    assert_eq!(player.armor_bar, HEALTHBAR_WIDTH * 0.5);

    let bare = player_with(None, 5.0);
    assert_eq!(bare.armor_fraction(), None);
    assert_eq!(bare.armor_bar, 0.0);
}

#[test]
fn healthbar_width_clamps() {
    assert_eq!(healthbar_width(0.5, 150.0), 75.0);
    assert_eq!(healthbar_width(-1.0, 150.0), 0.0);
    assert_eq!(healthbar_width(3.0, 150.0), 150.0);
}

#[test]
fn zero_max_hp_reads_as_empty() {
    let player = Player::default();
    assert_eq!(player.health_fraction(), 0.0);
    assert!(!player.is_alive());
}

// ── Pool lifecycle ────────────────────────────────────────────────────────────

#[test]
fn recycled_player_is_back_to_sentinels() {
    let mut pool: Pool<Player> = Pool::with_capacity(1);
    let id = pool
        .spawn(PlayerSpawn {
            position: Vec2::new(30.0, 40.0),
            weapon: Some(Weapon::new(WeaponKind::Rifle)),
            armor: Some(Armor::new(ArmorKind::Heavy)),
            max_hp: 6.0,
            speed: 7.0,
            joystick: None,
        })
        .unwrap();
    pool.get_mut(id).unwrap().finger_stack.push(3);

    assert!(pool.recycle(id));

    assert_eq!(pool.slot(0), Some(&Player::default()));
    assert_eq!(pool.roster_count(0), (0, 1));
}

#[test]
fn recycled_zombie_is_back_to_sentinels() {
    let mut pool: Pool<Zombie> = Pool::with_capacity(2);
    let id = pool
        .spawn(ZombieSpawn {
            kind: ZombieKind::Spitter,
            position: Vec2::new(5.0, 5.0),
        })
        .unwrap();
    let zombie = pool.get(id).unwrap();
    assert_eq!(zombie.hp, ZombieKind::Spitter.max_hp());
    assert_eq!(zombie.spit_cooldown, FIRST_SPIT_DELAY);

    pool.recycle(id);
    assert_eq!(pool.slot(id.index()), Some(&Zombie::default()));
}

#[test]
fn respawned_projectile_forgets_pierced_targets() {
    let mut zombies: Pool<Zombie> = Pool::with_capacity(1);
    let target = zombies
        .spawn(ZombieSpawn {
            kind: ZombieKind::Walker,
            position: Vec2::ZERO,
        })
        .unwrap();

    let mut pool: Pool<Projectile> = Pool::with_capacity(1);
    let spawn = || ProjectileSpawn {
        position: Vec2::new(10.0, 10.0),
        direction: Vec2::new(0.0, 3.0),
        speed: 12.0,
        damage: 4.0,
        hostility: Hostility::Friendly,
        piercing: true,
        ttl: 1.5,
        sprite: SpriteId::Bullet,
    };
    let first = pool.spawn(spawn()).unwrap();
    pool.get_mut(first).unwrap().pierced.push(target);
    pool.recycle(first);

    let clean = pool.slot(0).unwrap();
    assert!(clean.pierced.is_empty());
    assert_eq!(clean.damage, 0.0);
    assert_eq!(clean.hostility, Hostility::Friendly);

    let second = pool.spawn(spawn()).unwrap();
    let projectile = pool.get(second).unwrap();
    assert!(projectile.pierced.is_empty());
    // Direction is stored as a unit vector
    assert_eq!(projectile.direction, Vec2::Y);
}

#[test]
fn player_spawn_defaults_to_shooting_up() {
    let player = player_with(None, 5.0);
    assert_eq!(player.last_shot_direction, Vec2::NEG_Y);
    assert_eq!(player.hp, 5.0);
    assert_eq!(player.rect(), Rect::new(84, 84, 32, 32));
}

// ── Sprites ───────────────────────────────────────────────────────────────────

#[test]
fn sprite_masks_match_sizes() {
    let bank = SpriteBank::new();
    for sprite in SpriteId::ALL {
        assert_eq!(bank.mask(sprite).size(), sprite.size(), "{sprite:?}");
    }
    let (w, h) = SpriteId::Bullet.size();
    assert_eq!(bank.mask(SpriteId::Bullet).count(), (w * h) as u32);
    // Circles leave the corners clear
    assert!(!bank.mask(SpriteId::Player).get(0, 0));
    assert!(bank.mask(SpriteId::Player).get(16, 16));
}

#[test]
fn circle_masks_ignore_corner_contact() {
    let bank = SpriteBank::new();
    let mask = bank.mask(SpriteId::Player);
    let a = Rect::new(0, 0, 32, 32);
    // Bounding boxes overlap by 4×4 pixels at the corner, discs do not
    let b = Rect::new(28, 28, 32, 32);
    assert!(a.colliderect(&b));
    assert!(!sprites_overlap(&a, mask, &b, mask));

    let c = Rect::new(20, 0, 32, 32);
    assert!(sprites_overlap(&a, mask, &c, mask));
}

#[test]
fn zombie_kinds_have_distinct_profiles() {
    assert!(ZombieKind::Runner.speed() > ZombieKind::Walker.speed());
    assert!(ZombieKind::Brute.max_hp() > ZombieKind::Walker.max_hp());
    assert_eq!(ZombieKind::Brute.contact_damage(), 2.0);
    assert_eq!(ZombieKind::Spitter.contact_damage(), 1.0);
    assert_eq!(ZombieKind::Brute.sprite(), SpriteId::Brute);
}

#[test]
fn world_draws_player_last() {
    struct Recorder(Vec<SpriteId>);
    impl Surface for Recorder {
        fn blit(&mut self, sprite: SpriteId, _rect: Rect) {
            self.0.push(sprite);
        }
    }

    let mut world = stormz_day::world::World::new(&stormz_day::config::PoolConfig::default());
    world
        .players
        .spawn(PlayerSpawn {
            position: Vec2::new(50.0, 50.0),
            weapon: None,
            armor: None,
            max_hp: 5.0,
            speed: 7.0,
            joystick: None,
        })
        .unwrap();
    world
        .zombies
        .spawn(ZombieSpawn {
            kind: ZombieKind::Runner,
            position: Vec2::new(90.0, 90.0),
        })
        .unwrap();

    let mut recorder = Recorder(Vec::new());
    world.draw_all_sprites(&mut recorder);
    assert_eq!(recorder.0, vec![SpriteId::Runner, SpriteId::Player]);
}
