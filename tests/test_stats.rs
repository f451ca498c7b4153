use stormz_day::armor::{Armor, ArmorKind, ADAPTIVE_MAX_STACKS, ADAPTIVE_STEP};
use stormz_day::stats::*;
use stormz_day::weapons::{Weapon, WeaponKind};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn damage_sheet(base: f32) -> StatSheet<WeaponStat> {
    StatSheet::new(&[(WeaponStat::Damage, base)])
}

// ── Buff math ─────────────────────────────────────────────────────────────────

#[test]
fn permanent_and_temporary_buffs_multiply() {
    let mut sheet = damage_sheet(10.0);
    sheet.apply_perma_buff(WeaponStat::Damage, 0.2);
    sheet.apply_temp_buff(WeaponStat::Damage, 0.1);

    assert!(approx(sheet.get(WeaponStat::Damage), 13.2));
    assert_eq!(sheet.base(WeaponStat::Damage), 10.0);
}

#[test]
fn buffs_of_one_kind_add() {
    let mut sheet = damage_sheet(10.0);
    sheet.apply_perma_buff(WeaponStat::Damage, 0.2);
    sheet.apply_perma_buff(WeaponStat::Damage, 0.2);

    assert!(approx(sheet.get(WeaponStat::Damage), 14.0));
    assert!(approx(sheet.multiplier(WeaponStat::Damage), 1.4));
}

#[test]
fn buffs_only_touch_their_stat() {
    let mut sheet = StatSheet::new(&[(WeaponStat::Damage, 10.0), (WeaponStat::Firerate, 2.0)]);
    sheet.apply_perma_buff(WeaponStat::Firerate, 0.5);

    assert_eq!(sheet.get(WeaponStat::Damage), 10.0);
    assert_eq!(sheet.get(WeaponStat::Firerate), 3.0);
    // Missing stats start at zero and stay there under buffs
    sheet.apply_perma_buff(WeaponStat::Pellets, 1.0);
    assert_eq!(sheet.get(WeaponStat::Pellets), 0.0);
}

#[test]
fn reset_drops_temporary_buffs_and_is_idempotent() {
    let mut sheet = damage_sheet(10.0);
    sheet.apply_perma_buff(WeaponStat::Damage, 0.2);
    sheet.apply_temp_buff(WeaponStat::Damage, 0.5);

    sheet.reset();
    let once = sheet.clone();
    sheet.reset();

    assert_eq!(sheet, once);
    assert!(approx(sheet.get(WeaponStat::Damage), 12.0));
    assert_eq!(sheet.buffs(), &[Buff::permanent(WeaponStat::Damage, 0.2)]);
}

#[test]
fn full_reset_restores_base() {
    let mut sheet = damage_sheet(10.0);
    sheet.apply_perma_buff(WeaponStat::Damage, 0.2);
    sheet.apply_temp_buff(WeaponStat::Damage, 0.5);

    sheet.full_reset();
    assert_eq!(sheet.get(WeaponStat::Damage), 10.0);
    assert!(sheet.buffs().is_empty());
    assert_eq!(sheet, damage_sheet(10.0));
}

#[test]
fn remove_buff_takes_one_matching_entry() {
    let mut sheet = damage_sheet(10.0);
    let buff = Buff::temporary(WeaponStat::Damage, 0.5);
    sheet.apply(buff);
    sheet.apply(buff);

    assert!(sheet.remove_buff(&buff));
    assert!(approx(sheet.get(WeaponStat::Damage), 15.0));
    assert!(sheet.remove_buff(&buff));
    assert!(!sheet.remove_buff(&buff));
    assert_eq!(sheet.get(WeaponStat::Damage), 10.0);
}

// ── Weapon stats ──────────────────────────────────────────────────────────────

#[test]
fn fire_interval_follows_firerate() {
    let mut weapon = Weapon::new(WeaponKind::Pistol);
    assert!(approx(weapon.stats.fire_interval(), 1.0 / 3.0));

    weapon.stats.apply_perma_buff(WeaponStat::Firerate, 1.0);
    assert!(approx(weapon.stats.fire_interval(), 1.0 / 6.0));

    let stalled = WeaponStats::new(damage_sheet(1.0), FireMode::Manual, false);
    assert_eq!(stalled.fire_interval(), f32::INFINITY);
}

#[test]
fn pellet_count_never_drops_below_one() {
    assert_eq!(Weapon::new(WeaponKind::Shotgun).stats.pellet_count(), 5);
    let bare = WeaponStats::new(damage_sheet(1.0), FireMode::Manual, false);
    assert_eq!(bare.pellet_count(), 1);
}

#[test]
fn weapon_catalog_modes() {
    assert_eq!(WeaponKind::Rifle.base_stats().fire_mode, FireMode::Automatic);
    assert_eq!(WeaponKind::Piercer.base_stats().fire_mode, FireMode::Burst(2));
    assert!(WeaponKind::Piercer.base_stats().piercing);
    assert!(!WeaponKind::Pistol.base_stats().piercing);
    assert_eq!("rifle".parse::<WeaponKind>().unwrap(), WeaponKind::Rifle);
    assert!("laser".parse::<WeaponKind>().is_err());
}

// ── Armor ─────────────────────────────────────────────────────────────────────

#[test]
fn armor_regenerates_after_cooldown() {
    let mut armor = Armor::new(ArmorKind::Balanced);
    armor.take_damage(2.0); // absorbs 0.6 × 2 = 1.2
    assert!(approx(armor.stats.health, 1.8));

    // Cooldown is 3 s: nothing yet
    armor.update(2.5);
    assert!(approx(armor.stats.health, 1.8));

    // Past the cooldown, 1 health per second
    armor.update(0.5);
    assert!(approx(armor.stats.health, 2.3));
    armor.update(5.0);
    assert_eq!(armor.stats.health, armor.stats.max_health());
}

#[test]
fn hit_restarts_regen_cooldown() {
    let mut armor = Armor::new(ArmorKind::Light);
    armor.take_damage(1.0);
    armor.update(1.5);
    assert!(approx(armor.since_hit(), 1.5));

    armor.take_damage(1.0);
    assert_eq!(armor.since_hit(), 0.0);
}

#[test]
fn adaptive_armor_stacks_resistance_up_to_cap() {
    let mut armor = Armor::new(ArmorKind::Adaptative);
    let base = armor.stats.resistance();

    for _ in 0..ADAPTIVE_MAX_STACKS + 3 {
        armor.take_damage(0.1);
    }

    let stacks = armor
        .stats
        .sheet()
        .buffs()
        .iter()
        .filter(|b| b.kind == BuffKind::Temporary)
        .count();
    assert_eq!(stacks, ADAPTIVE_MAX_STACKS);
    let expected = base * (1.0 + ADAPTIVE_STEP * ADAPTIVE_MAX_STACKS as f32);
    assert!(approx(armor.stats.resistance(), expected));
}

#[test]
fn full_regen_drops_adaptive_stacks() {
    let mut armor = Armor::new(ArmorKind::Adaptative);
    armor.take_damage(1.0);
    assert_eq!(armor.stats.sheet().buffs().len(), 1);

    armor.update(10.0);
    assert_eq!(armor.stats.health, armor.stats.max_health());
    assert!(armor.stats.sheet().buffs().is_empty());
}

#[test]
fn max_health_buff_clamps_on_removal() {
    let mut armor = Armor::new(ArmorKind::Heavy);
    let buff = Buff::permanent(ArmorStat::MaxHealth, 0.4);
    armor.stats.apply_perma_buff(ArmorStat::MaxHealth, 0.4);
    armor.stats.refill();
    assert!(approx(armor.stats.health, 7.0));

    assert!(armor.remove_buff(&buff));
    assert_eq!(armor.stats.health, 5.0);
    assert!(approx(armor.fraction(), 1.0));
}

#[test]
fn heavier_armor_slows_more() {
    let light = Armor::new(ArmorKind::Light).speed_pen();
    let heavy = Armor::new(ArmorKind::Heavy).speed_pen();
    assert!(heavy < light);
    assert!(light <= 1.0);
}
