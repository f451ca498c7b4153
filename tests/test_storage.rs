use stormz_day::armor::ArmorKind;
use stormz_day::error::{GameError, PurchaseError};
use stormz_day::storage::*;
use stormz_day::weapons::WeaponKind;

use std::fs;

#[test]
fn fresh_save_defaults() {
    let storage = GameStorage::default();
    assert_eq!(storage.tokens, STARTING_TOKENS);
    assert_eq!(storage.weapon_equipped, WeaponKind::Pistol);
    assert_eq!(storage.owned_weapons, vec![WeaponKind::Pistol]);
    assert_eq!(storage.armor_equipped, None);
    assert_eq!(storage.highest_wave, 1);
    assert_eq!(storage.isvalid, SCHEMA_VERSION);
    assert_eq!(storage.current_weapon_perks.len(), WeaponKind::ALL.len());
    assert_eq!(storage.current_armor_perks.len(), ArmorKind::ALL.len());
}

// ── Perks ─────────────────────────────────────────────────────────────────────

#[test]
fn perk_purchases_follow_cost_table() {
    let mut storage = GameStorage::default();

    assert_eq!(storage.upgrade_weapon_perk(WeaponKind::Pistol, Perk::Damage), Ok(1));
    assert_eq!(storage.tokens, 15);
    assert_eq!(storage.upgrade_weapon_perk(WeaponKind::Pistol, Perk::Damage), Ok(2));
    assert_eq!(storage.tokens, 5);
    assert_eq!(storage.weapon_perk_level(WeaponKind::Pistol, Perk::Damage), 2);
}

#[test]
fn maxed_perk_is_rejected_without_charge() {
    let mut storage = GameStorage::default();
    storage
        .current_weapon_perks
        .entry(WeaponKind::Rifle)
        .or_default()
        .insert(Perk::Firerate, 5);

    let result = storage.upgrade_weapon_perk(WeaponKind::Rifle, Perk::Firerate);

    assert_eq!(result, Err(PurchaseError::AlreadyMaxed { level: 5 }));
    assert_eq!(storage.tokens, STARTING_TOKENS);
    assert_eq!(storage.weapon_perk_level(WeaponKind::Rifle, Perk::Firerate), 5);
}

#[test]
fn unaffordable_perk_is_rejected_without_charge() {
    let mut storage = GameStorage {
        tokens: 4,
        ..GameStorage::default()
    };

    let result = storage.upgrade_weapon_perk(WeaponKind::Pistol, Perk::Firerate);

    assert_eq!(result, Err(PurchaseError::NotEnoughTokens { cost: 5, available: 4 }));
    assert_eq!(storage.tokens, 4);
    assert_eq!(storage.weapon_perk_level(WeaponKind::Pistol, Perk::Firerate), 0);
}

#[test]
fn perks_belong_to_their_equipment() {
    let mut storage = GameStorage::default();

    let err = storage.upgrade_weapon_perk(WeaponKind::Pistol, Perk::Vitality).unwrap_err();
    assert!(matches!(err, PurchaseError::Catalog(GameError::UnknownPerk { .. })));

    let err = storage.upgrade_armor_perk(ArmorKind::Heavy, Perk::Damage).unwrap_err();
    assert!(matches!(err, PurchaseError::Catalog(GameError::UnknownPerk { .. })));

    assert_eq!(storage.upgrade_armor_perk(ArmorKind::Heavy, Perk::Vitality), Ok(1));
    assert_eq!(storage.armor_perk_level(ArmorKind::Heavy, Perk::Vitality), 1);
}

#[test]
fn perk_cost_past_table_is_an_error() {
    assert_eq!(perk_cost("Pistol", Perk::Damage, 5), Ok(50));
    assert!(matches!(
        perk_cost("Pistol", Perk::Damage, 6),
        Err(GameError::PerkLevelOutOfRange { level: 6, .. })
    ));
}

// ── Shop ──────────────────────────────────────────────────────────────────────

#[test]
fn buying_a_weapon_equips_it() {
    let mut storage = GameStorage {
        tokens: 60,
        ..GameStorage::default()
    };

    assert_eq!(
        storage.weapon_interact(WeaponKind::Rifle),
        Ok(ShopOutcome::Bought { cost: 50 })
    );
    assert_eq!(storage.tokens, 10);
    assert_eq!(storage.weapon_equipped, WeaponKind::Rifle);

    // Owned: switching back is free
    assert_eq!(storage.weapon_interact(WeaponKind::Pistol), Ok(ShopOutcome::Equipped));
    assert_eq!(storage.tokens, 10);
    assert_eq!(
        storage.weapon_interact(WeaponKind::Pistol),
        Err(PurchaseError::AlreadyEquipped)
    );
}

#[test]
fn weapon_too_expensive_leaves_state_alone() {
    let mut storage = GameStorage::default();
    let before = storage.clone();

    assert_eq!(
        storage.weapon_interact(WeaponKind::Piercer),
        Err(PurchaseError::NotEnoughTokens { cost: 100, available: 20 })
    );
    assert_eq!(storage, before);
}

#[test]
fn armor_toggles_once_owned() {
    let mut storage = GameStorage {
        tokens: 30,
        ..GameStorage::default()
    };

    assert_eq!(
        storage.armor_interact(ArmorKind::Light),
        Ok(ShopOutcome::Bought { cost: 30 })
    );
    assert_eq!(storage.armor_equipped, Some(ArmorKind::Light));
    assert_eq!(storage.armor_interact(ArmorKind::Light), Ok(ShopOutcome::Unequipped));
    assert_eq!(storage.armor_equipped, None);
    assert_eq!(storage.armor_interact(ArmorKind::Light), Ok(ShopOutcome::Equipped));
    assert_eq!(storage.tokens, 0);
}

// ── Runs ──────────────────────────────────────────────────────────────────────

#[test]
fn run_rewards() {
    assert_eq!(tokens_for_run(0, 3), 0);
    assert_eq!(tokens_for_run(120, 0), 0);
    assert_eq!(tokens_for_run(120, 3), 15 + 10 + 10);
    assert_eq!(tokens_for_run(11, 1), 15);
}

#[test]
fn record_run_keeps_best_results() {
    let mut storage = GameStorage::default();

    assert_eq!(storage.record_run(240, 4), 20 + 20 + 10);
    assert_eq!(storage.tokens, STARTING_TOKENS + 50);
    assert_eq!(storage.highscore, 240);
    assert_eq!(storage.highest_wave, 4);

    storage.record_run(100, 2);
    assert_eq!(storage.highscore, 240);
    assert_eq!(storage.highest_wave, 4);
}

#[test]
fn reset_starts_over() {
    let mut storage = GameStorage::default();
    storage.record_run(500, 6);
    storage.reset();
    assert_eq!(storage, GameStorage::default());
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[test]
fn save_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");

    let mut storage = GameStorage {
        tokens: 200,
        ..GameStorage::default()
    };
    storage.weapon_interact(WeaponKind::Shotgun).unwrap();
    storage.armor_interact(ArmorKind::Balanced).unwrap();
    storage.upgrade_weapon_perk(WeaponKind::Shotgun, Perk::Firerate).unwrap();
    storage.general_upgrades.insert(Perk::Vitality, 2);
    storage.save_to_file(&path).unwrap();

    assert_eq!(GameStorage::load_from_file(&path), storage);
}

#[test]
fn missing_save_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let storage = GameStorage::load_from_file(&dir.path().join("nope.json"));
    assert_eq!(storage, GameStorage::default());
}

#[test]
fn outdated_or_corrupt_save_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();

    let old = dir.path().join("old.json");
    fs::write(&old, r#"{"isvalid": 1, "tokens": 999}"#).unwrap();
    assert_eq!(GameStorage::from_json_str(&fs::read_to_string(&old).unwrap()).unwrap(), None);
    assert_eq!(GameStorage::load_from_file(&old), GameStorage::default());

    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "{ not json").unwrap();
    assert!(GameStorage::from_json_str("{ not json").is_err());
    assert_eq!(GameStorage::load_from_file(&corrupt), GameStorage::default());
}

#[test]
fn save_without_general_upgrades_still_loads() {
    let mut value = serde_json::to_value(GameStorage::default()).unwrap();
    value.as_object_mut().unwrap().remove("general_upgrades");
    value["tokens"] = serde_json::json!(42);

    let storage = GameStorage::from_json_str(&value.to_string()).unwrap().unwrap();
    assert_eq!(storage.tokens, 42);
    assert!(storage.general_upgrades.is_empty());
}

#[test]
fn unknown_entries_are_skipped_not_fatal() {
    let mut value = serde_json::to_value(GameStorage::default()).unwrap();
    value["tokens"] = serde_json::json!(77);
    value["weapon_equipped"] = serde_json::json!("Railgun");
    value["owned_weapons"] = serde_json::json!(["Pistol", "Railgun", "Rifle"]);
    value["armor_equipped"] = serde_json::json!("Cloak");
    value["current_weapon_perks"]["Pistol"] = serde_json::json!({"Damage": 2, "Sharpshooter": 1});
    value["current_weapon_perks"]["Railgun"] = serde_json::json!({"Damage": 1});
    value["general_upgrades"] = serde_json::json!({"Vitality": 1, "Luck": 3});

    let storage = GameStorage::from_json_str(&value.to_string()).unwrap().unwrap();

    assert_eq!(storage.tokens, 77);
    assert_eq!(storage.weapon_equipped, WeaponKind::Pistol);
    assert_eq!(storage.owned_weapons, vec![WeaponKind::Pistol, WeaponKind::Rifle]);
    assert_eq!(storage.armor_equipped, None);
    assert_eq!(storage.weapon_perk_level(WeaponKind::Pistol, Perk::Damage), 2);
    assert_eq!(storage.current_weapon_perks.len(), WeaponKind::ALL.len());
    assert_eq!(storage.general_level(Perk::Vitality), 1);
    assert_eq!(storage.general_upgrades.len(), 1);
}
