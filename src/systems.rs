#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]

use bevy_ecs::prelude::*;
use log::{debug, info, trace, warn};
use std::sync::Arc;

use crate::catalog::{MineralType, choose_mineral};
use crate::components::{GameSession, Mineral, Position, Surface, Timers};
use crate::game;

/// Spawns one falling mineral just above the top edge of the surface.
/// No-op after the round is over or while the active-entity cap is hit.
pub fn spawn_mineral(world: &mut World) {
    let active = world.query::<&Mineral>().iter(world).count();
    if active >= game::MAX_ACTIVE_MINERALS {
        trace!("skipping spawn, {active} minerals already active");
        return;
    }

    let surface = *world.resource::<Surface>();
    let (kind, spawn_seq, min_speed, max_speed) = {
        let mut session = world.resource_mut::<GameSession>();
        if !session.is_running() {
            return;
        }
        let Some(kind) = choose_mineral(&session.level.minerals, session.weighting).cloned()
        else {
            return;
        };
        let seq = session.take_spawn_seq();
        let config = &session.level.config;
        (kind, seq, config.min_fall_speed, config.max_fall_speed)
    };

    let radius = game::MINERAL_RADIUS;
    let diameter = radius * 2.0;

    // Positions are sprite centers. Center-x anywhere that keeps the
    // sprite fully on the surface; center-y puts the sprite's top edge one
    // diameter above the surface, entering fully off-screen.
    let span = (surface.width - diameter).max(0.0);
    let x = radius + fastrand::f32() * span;
    let y = -radius;

    let fall_speed =
        (min_speed + fastrand::f32() * (max_speed - min_speed)) * surface.speed_scale();
    let rotation_speed = (fastrand::f32() * 2.0 - 1.0) * game::MAX_SPIN_SPEED;

    trace!("spawning {} #{spawn_seq} at x={x:.1}", kind.symbol);
    world.spawn((
        Mineral {
            spawn_seq,
            radius,
            fall_speed,
            rotation: 0.0,
            rotation_speed,
            kind,
            collected: false,
        },
        Position { x, y },
    ));
}

/// Advances one frame of the round: kinematics, off-screen despawn, then
/// the spawn and countdown timers. Invalid frame deltas are dropped
/// without touching session state.
pub fn game_tick_system(world: &mut World, delta_seconds: f32) {
    if !delta_seconds.is_finite() || delta_seconds < 0.0 {
        warn!("ignoring invalid frame delta {delta_seconds}");
        return;
    }
    if delta_seconds == 0.0 {
        return;
    }
    let dt = delta_seconds.min(game::MAX_FRAME_DELTA);

    if !world.resource::<GameSession>().is_running() {
        return;
    }

    // Kinematics before off-screen filtering, filtering before the timers.
    let surface_height = world.resource::<Surface>().height;
    let mut off_screen = Vec::new();
    {
        let mut query = world.query::<(Entity, &mut Mineral, &mut Position)>();
        for (entity, mut mineral, mut position) in query.iter_mut(world) {
            mineral.advance(&mut position, dt);
            if mineral.is_off_screen(*position, surface_height) {
                off_screen.push(entity);
            }
        }
    }
    for entity in off_screen {
        trace!("mineral despawned off-screen");
        world.despawn(entity);
    }

    let (spawns, countdowns) = {
        let mut timers = world.resource_mut::<Timers>();
        (timers.spawn.advance(dt), timers.countdown.advance(dt))
    };

    for _ in 0..spawns {
        spawn_mineral(world);
    }

    let finished = {
        let mut session = world.resource_mut::<GameSession>();
        let mut finished = false;
        for _ in 0..countdowns {
            if session.countdown_tick() {
                finished = true;
                break;
            }
        }
        finished
    };

    if finished {
        finish_round(world);
    }
}

/// Consumes at most one mineral under the pointer: the most recently
/// spawned among all overlapping candidates. A miss is a normal no-op.
pub fn pointer_system(world: &mut World, x: f32, y: f32) -> Option<Arc<MineralType>> {
    if !x.is_finite() || !y.is_finite() {
        warn!("ignoring pointer event at non-finite ({x}, {y})");
        return None;
    }
    if !world.resource::<GameSession>().is_running() {
        return None;
    }

    let mut top_hit: Option<(Entity, u64)> = None;
    {
        let mut query = world.query::<(Entity, &Mineral, &Position)>();
        for (entity, mineral, position) in query.iter(world) {
            if mineral.contains(*position, x, y)
                && top_hit.is_none_or(|(_, seq)| mineral.spawn_seq > seq)
            {
                top_hit = Some((entity, mineral.spawn_seq));
            }
        }
    }

    let (entity, _) = top_hit?;
    let kind = {
        let mut mineral = world.get_mut::<Mineral>(entity)?;
        mineral.collected = true;
        mineral.kind.clone()
    };
    world.despawn(entity);
    world.resource_mut::<GameSession>().record_hit(&kind);
    debug!("collected {} (+{})", kind.symbol, kind.value);
    Some(kind)
}

/// `Running -> Over` housekeeping: the score and counts are already frozen
/// by the phase change; drop the live entity set so nothing from this
/// round leaks into the next one.
fn finish_round(world: &mut World) {
    let leftovers: Vec<Entity> = world
        .query_filtered::<Entity, With<Mineral>>()
        .iter(world)
        .collect();
    let session = world.resource::<GameSession>();
    info!(
        "round over: score={} kinds_collected={}",
        session.score,
        session.collected.len()
    );
    for entity in leftovers {
        world.despawn(entity);
    }
}
