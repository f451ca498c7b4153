/// Per-frame combat logic for players, zombies and projectiles.
///
/// Every update takes the entity's id, the frame delta (1.0 = one 60 Hz
/// frame), the read-only `FrameContext` and the `World` it lives in. Side
/// effects stay inside the world: pools, queued `CombatEvent`s and sound
/// cues.
use glam::Vec2;
use tracing::{debug, info};

use crate::audio::{SoundCue, SoundSink};
use crate::config::AimTuning;
use crate::entities::{
    CombatEvent, Hostility, KillCause, Player, Projectile, ProjectileSpawn, SpriteBank, SpriteId,
    Zombie, ZombieKind,
};
use crate::error::GameError;
use crate::geometry::{angle_between_deg, sprites_overlap, Rect};
use crate::input::{ControlScheme, InputEvent, InputSnapshot, Key, MouseButton};
use crate::pool::{EntityId, Pool};
use crate::raycast::RayCastMask;
use crate::weapons::Weapon;
use crate::world::{FrameContext, World};

/// What pulled the trigger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShotInput {
    /// Mouse button, at this pointer position.
    Mouse(Vec2),
    Space,
    /// A finger outside the joystick, at this position.
    Touch(Vec2),
}

// ── Aiming ───────────────────────────────────────────────────────────────────

/// WASD for keyboard schemes, the touch joystick for Mobile.
pub fn movement_vector(player: &Player, input: &InputSnapshot, control: ControlScheme) -> Vec2 {
    match control {
        ControlScheme::Mobile => player
            .joystick
            .as_ref()
            .map(|joystick| joystick.vector())
            .unwrap_or(Vec2::ZERO),
        _ => input.wasd_vector(),
    }
}

/// Retarget `aim` to the target with the smallest angular difference, when
/// that difference lies in `(min_deg, tolerance_deg]`.
pub fn correct_aim<I>(aim: Vec2, origin: Vec2, targets: I, min_deg: f32, tolerance_deg: f32) -> Vec2
where
    I: IntoIterator<Item = Vec2>,
{
    let best = targets
        .into_iter()
        .filter_map(|target| {
            let to_target = target - origin;
            angle_between_deg(aim, to_target).map(|angle| (angle, to_target))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));
    match best {
        Some((angle, to_target)) if angle > min_deg && angle <= tolerance_deg => {
            to_target.normalize_or_zero()
        }
        _ => aim,
    }
}

/// Shot direction for one trigger pull under the given control scheme.
/// Degenerate inputs resolve to `fallback` (the last shot direction).
pub fn resolve_aim<I>(
    shot: ShotInput,
    control: ControlScheme,
    origin: Vec2,
    fallback: Vec2,
    input: &InputSnapshot,
    targets: I,
    tuning: &AimTuning,
) -> Vec2
where
    I: IntoIterator<Item = Vec2>,
{
    let fallback = fallback.try_normalize().unwrap_or(Vec2::NEG_Y);
    let toward = |point: Vec2| (point - origin).try_normalize().unwrap_or(fallback);
    let arrows = input.arrow_vector();

    match (control, shot) {
        (_, ShotInput::Mouse(point)) | (_, ShotInput::Touch(point)) => toward(point),
        (ControlScheme::Expert, ShotInput::Space) => input.pointer.map(toward).unwrap_or(fallback),
        (ControlScheme::Mixed, ShotInput::Space) => {
            let base = if arrows != Vec2::ZERO { arrows } else { fallback };
            correct_aim(base, origin, targets, tuning.min_snap_deg, tuning.mixed_snap_deg)
        }
        (ControlScheme::Simple, ShotInput::Space) => {
            if arrows != Vec2::ZERO {
                return correct_aim(arrows, origin, targets, tuning.min_snap_deg, tuning.simple_snap_deg);
            }
            let nearest = targets
                .into_iter()
                .min_by(|a, b| a.distance_squared(origin).total_cmp(&b.distance_squared(origin)));
            match nearest {
                Some(target) => toward(target),
                None => fallback,
            }
        }
        (ControlScheme::Mobile, ShotInput::Space) => fallback,
    }
}

fn zombie_positions(zombies: &Pool<Zombie>) -> impl Iterator<Item = Vec2> + '_ {
    zombies.iter().map(|(_, zombie)| zombie.position)
}

/// Pull the player's trigger. Returns whether anything was fired.
pub fn shoot(
    player: &mut Player,
    shot: ShotInput,
    ctx: &FrameContext,
    zombies: &Pool<Zombie>,
    projectiles: &mut Pool<Projectile>,
    sounds: &mut dyn SoundSink,
) -> Result<bool, GameError> {
    if !player.is_alive() || !player.weapon.as_ref().is_some_and(Weapon::can_shoot) {
        return Ok(false);
    }
    let origin = player.position;
    let direction = resolve_aim(
        shot,
        ctx.control,
        origin,
        player.last_shot_direction,
        ctx.input,
        zombie_positions(zombies),
        &ctx.config.aim,
    );
    let Some(weapon) = player.weapon.as_mut() else {
        return Ok(false);
    };
    let fired = weapon.shoot(origin, direction, projectiles, &ctx.config.projectiles, sounds)?;
    if fired {
        player.last_shot_direction = direction;
    }
    Ok(fired)
}

// ── Player ───────────────────────────────────────────────────────────────────

pub fn update_player(
    id: EntityId,
    delta: f32,
    ctx: &FrameContext,
    world: &mut World,
) -> Result<(), GameError> {
    let secs = delta / 60.0;
    let World {
        players,
        zombies,
        projectiles,
        sprites,
        events,
        sounds,
        hits,
        ..
    } = world;
    let Some(player) = players.get_mut(id) else {
        return Ok(());
    };

    if let Some(joystick) = player.joystick.as_mut() {
        joystick.update(&ctx.input.fingers);
    }
    if !ctx.running || !player.is_alive() {
        return Ok(());
    }
    player.current_direction = movement_vector(player, ctx.input, ctx.control);

    let origin = player.position;
    if let Some(weapon) = player.weapon.as_mut() {
        weapon.update(secs, origin, projectiles, &ctx.config.projectiles, sounds)?;
    }
    input_action(player, ctx, zombies, projectiles, sounds)?;
    do_movement(player, delta, ctx.bounds);
    do_collisions(player, zombies, projectiles, sprites, events, sounds, hits);

    if let Some(armor) = player.armor.as_mut() {
        armor.update(secs);
    }
    player.update_healthbars();
    Ok(())
}

/// Held-trigger fire for automatic weapons.
fn input_action(
    player: &mut Player,
    ctx: &FrameContext,
    zombies: &Pool<Zombie>,
    projectiles: &mut Pool<Projectile>,
    sounds: &mut Vec<SoundCue>,
) -> Result<(), GameError> {
    if !player.weapon.as_ref().is_some_and(Weapon::is_automatic) {
        return Ok(());
    }
    let input = ctx.input;
    let shot = match ctx.control {
        ControlScheme::Mobile => player
            .finger_stack
            .last()
            .and_then(|finger| input.fingers.get(finger))
            .map(|&at| ShotInput::Touch(at)),
        _ if input.pointer_pressed && ctx.run_time > ctx.config.aim.mouse_hold_delay => {
            input.pointer.map(ShotInput::Mouse)
        }
        _ if input.is_held(Key::Space) => Some(ShotInput::Space),
        _ => None,
    };
    if let Some(shot) = shot {
        shoot(player, shot, ctx, zombies, projectiles, sounds)?;
    }
    Ok(())
}

fn do_movement(player: &mut Player, delta: f32, bounds: Rect) {
    let mut speed = player.speed;
    if let Some(armor) = &player.armor {
        speed *= armor.speed_pen();
    }
    player.position += player.current_direction * speed * delta;

    let rect = player.rect();
    let clamped = rect.clamp_inside(&bounds);
    player.position += Vec2::new((clamped.x - rect.x) as f32, (clamped.y - rect.y) as f32);
}

fn do_collisions(
    player: &mut Player,
    zombies: &mut Pool<Zombie>,
    projectiles: &mut Pool<Projectile>,
    sprites: &SpriteBank,
    events: &mut Vec<CombatEvent>,
    sounds: &mut Vec<SoundCue>,
    hits: &mut Vec<EntityId>,
) {
    let rect = player.rect();
    let mask = sprites.mask(SpriteId::Player);

    hits.clear();
    hits.extend(zombies.iter().filter_map(|(zid, zombie)| {
        sprites_overlap(&rect, mask, &zombie.rect(), sprites.mask(zombie.kind.sprite())).then_some(zid)
    }));
    for &zid in hits.iter() {
        let Some(kind) = zombies.get(zid).map(|zombie| zombie.kind) else {
            continue;
        };
        zombies.recycle(zid);
        events.push(CombatEvent::ZombieKilled {
            kind,
            cause: KillCause::Contact,
        });
        apply_player_damage(player, kind.contact_damage(), events, sounds);
    }

    hits.clear();
    hits.extend(projectiles.iter().filter_map(|(pid, projectile)| {
        (projectile.hostility == Hostility::Hostile
            && sprites_overlap(&rect, mask, &projectile.rect(), sprites.mask(projectile.sprite)))
        .then_some(pid)
    }));
    for &pid in hits.iter() {
        let Some(damage) = projectiles.get(pid).map(|projectile| projectile.damage) else {
            continue;
        };
        apply_player_damage(player, damage, events, sounds);
        projectile_hit(projectiles, pid, None);
    }
}

/// Damage the player, queue the hit cue and report the outcome.
pub fn apply_player_damage(
    player: &mut Player,
    damage: f32,
    events: &mut Vec<CombatEvent>,
    sounds: &mut dyn SoundSink,
) {
    let was_alive = player.is_alive();
    player.take_damage(damage);
    sounds.play_sfx(SoundCue::Hit);
    events.push(CombatEvent::PlayerHit {
        damage,
        hp_left: player.hp,
    });
    if was_alive && !player.is_alive() {
        info!(damage, "player died");
        events.push(CombatEvent::PlayerDied);
    }
}

/// Discrete presses: Space, left click and touches.
pub fn handle_player_event(
    id: EntityId,
    event: InputEvent,
    ctx: &FrameContext,
    world: &mut World,
) -> Result<(), GameError> {
    let World {
        players,
        zombies,
        projectiles,
        sounds,
        ..
    } = world;
    let Some(player) = players.get_mut(id) else {
        return Ok(());
    };
    let keyboard = ctx.control != ControlScheme::Mobile;

    match event {
        InputEvent::KeyDown(Key::Space) if keyboard && ctx.running => {
            shoot(player, ShotInput::Space, ctx, zombies, projectiles, sounds)?;
        }
        InputEvent::MouseDown {
            button: MouseButton::Left,
            position,
        } if keyboard && ctx.running => {
            shoot(player, ShotInput::Mouse(position), ctx, zombies, projectiles, sounds)?;
        }
        InputEvent::FingerDown { id: finger, position } if !keyboard => {
            if !player.finger_stack.contains(&finger) {
                player.finger_stack.push(finger);
            }
            let grabbed = match player.joystick.as_mut() {
                Some(joystick) => {
                    joystick.update(&ctx.input.fingers);
                    joystick.grab(finger, position)
                }
                None => false,
            };
            if grabbed {
                player.finger_stack.retain(|&f| f != finger);
            } else if ctx.running {
                shoot(player, ShotInput::Touch(position), ctx, zombies, projectiles, sounds)?;
            }
        }
        InputEvent::FingerUp { id: finger } => {
            player.finger_stack.retain(|&f| f != finger);
            if let Some(joystick) = player.joystick.as_mut() {
                if joystick.grab_id() == Some(finger) {
                    joystick.stop_grab();
                }
            }
        }
        _ => {}
    }
    Ok(())
}

// ── Zombies ──────────────────────────────────────────────────────────────────

/// True when no zombie other than `shooter` sits on the segment.
pub fn line_of_sight_clear(
    from: Vec2,
    to: Vec2,
    shooter: EntityId,
    zombies: &Pool<Zombie>,
    sprites: &SpriteBank,
) -> bool {
    let ray = RayCastMask::from_ray_ignore_points(from, to);
    !zombies.iter().any(|(zid, zombie)| {
        zid != shooter && ray.hits_sprite(&zombie.rect(), sprites.mask(zombie.kind.sprite()))
    })
}

pub fn update_zombie(
    id: EntityId,
    delta: f32,
    ctx: &FrameContext,
    world: &mut World,
) -> Result<(), GameError> {
    let secs = delta / 60.0;
    let World {
        players,
        zombies,
        projectiles,
        sprites,
        ..
    } = world;
    // Track the first living player; hold position without one.
    let Some(target) = players
        .iter()
        .find(|(_, player)| player.is_alive())
        .map(|(_, player)| player.position)
    else {
        return Ok(());
    };
    let Some(zombie) = zombies.get_mut(id) else {
        return Ok(());
    };

    let to_player = target - zombie.position;
    let distance = to_player.length();
    let direction = to_player.normalize_or_zero();
    let tuning = &ctx.config.spitter;

    if zombie.kind != ZombieKind::Spitter {
        zombie.position += direction * zombie.kind.speed() * delta;
        return Ok(());
    }

    if distance > tuning.keep_distance {
        zombie.position += direction * zombie.kind.speed() * delta;
    }
    zombie.spit_cooldown = (zombie.spit_cooldown - secs).max(0.0);
    if zombie.spit_cooldown > 0.0 || distance > tuning.range || direction == Vec2::ZERO {
        return Ok(());
    }
    let origin = zombie.position;
    if !line_of_sight_clear(origin, target, id, zombies, sprites) {
        return Ok(());
    }

    projectiles.spawn(ProjectileSpawn {
        position: origin,
        direction,
        speed: tuning.speed,
        damage: tuning.damage,
        hostility: Hostility::Hostile,
        piercing: false,
        ttl: ctx.config.projectiles.ttl,
        sprite: SpriteId::Spit,
    })?;
    if let Some(zombie) = zombies.get_mut(id) {
        zombie.spit_cooldown = tuning.cooldown;
    }
    debug!(x = origin.x, y = origin.y, distance, "spitter fired");
    Ok(())
}

// ── Projectiles ──────────────────────────────────────────────────────────────

/// On-hit handler. Piercing projectiles remember `target` and fly on;
/// everything else is recycled.
fn projectile_hit(projectiles: &mut Pool<Projectile>, id: EntityId, target: Option<EntityId>) {
    let pierce = match (projectiles.get_mut(id), target) {
        (Some(projectile), Some(target)) if projectile.piercing => {
            projectile.pierced.push(target);
            true
        }
        _ => false,
    };
    if !pierce {
        projectiles.recycle(id);
    }
}

pub fn update_projectile(
    id: EntityId,
    delta: f32,
    ctx: &FrameContext,
    world: &mut World,
) -> Result<(), GameError> {
    let secs = delta / 60.0;
    let World {
        zombies,
        projectiles,
        sprites,
        events,
        hits,
        ..
    } = world;
    let Some(projectile) = projectiles.get_mut(id) else {
        return Ok(());
    };

    projectile.position += projectile.direction * projectile.speed * delta;
    projectile.ttl -= secs;
    let rect = projectile.rect();
    if projectile.ttl <= 0.0 || !rect.colliderect(&ctx.bounds) {
        projectiles.recycle(id);
        return Ok(());
    }
    // Hostile projectiles are resolved by the player's collision pass.
    if projectile.hostility == Hostility::Hostile {
        return Ok(());
    }
    let damage = projectile.damage;
    let mask = sprites.mask(projectile.sprite);

    hits.clear();
    hits.extend(zombies.iter().filter_map(|(zid, zombie)| {
        (!projectile.pierced.contains(&zid)
            && sprites_overlap(&rect, mask, &zombie.rect(), sprites.mask(zombie.kind.sprite())))
        .then_some(zid)
    }));
    for &zid in hits.iter() {
        if !projectiles.is_active(id) {
            break;
        }
        let Some(zombie) = zombies.get_mut(zid) else {
            continue;
        };
        zombie.hp -= damage;
        if zombie.hp <= 0.0 {
            let kind = zombie.kind;
            zombies.recycle(zid);
            events.push(CombatEvent::ZombieKilled {
                kind,
                cause: KillCause::Projectile,
            });
        }
        projectile_hit(projectiles, id, Some(zid));
    }
    Ok(())
}
