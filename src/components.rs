#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Precision is not critical for cosmetic rotation and pixel-space kinematics
    clippy::cast_precision_loss
)]

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::{LevelRuntime, MineralType, SpawnWeighting};
use crate::game;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// One falling collectible. The entity id plus `spawn_seq` identify it for
/// the lifetime of a round; `spawn_seq` is strictly increasing so the hit
/// tester can prefer the most recently spawned (top-most) candidate.
#[derive(Component, Debug, Clone)]
pub struct Mineral {
    pub spawn_seq: u64,
    pub radius: f32,
    pub fall_speed: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub kind: Arc<MineralType>,
    pub collected: bool,
}

impl Mineral {
    /// Advances position and rotation by `dt` seconds. Pure per-entity
    /// kinematics: x never changes, y moves down by `fall_speed * dt`.
    pub fn advance(&mut self, position: &mut Position, dt: f32) {
        position.y += self.fall_speed * dt;
        self.rotation += self.rotation_speed * dt;
    }

    /// True once the entity has fully left the bottom of the surface.
    #[must_use]
    pub fn is_off_screen(&self, position: Position, surface_height: f32) -> bool {
        position.y - self.radius > surface_height
    }

    /// Circle hit test with the touch-target tolerance applied.
    #[must_use]
    pub fn contains(&self, position: Position, x: f32, y: f32) -> bool {
        let dx = x - position.x;
        let dy = y - position.y;
        let reach = self.radius + game::HIT_TOLERANCE;
        dx * dx + dy * dy <= reach * reach
    }
}

/// The rendering surface in pixel space. Read-only for game systems within
/// a frame; the host updates it when the terminal is resized.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    /// Fall speeds are tuned against `REFERENCE_HEIGHT`; this keeps the
    /// relative fall time constant across surface sizes.
    #[must_use]
    pub fn speed_scale(&self) -> f32 {
        self.height / game::REFERENCE_HEIGHT
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            width: 390.0,
            height: game::REFERENCE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Running,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectedEntry {
    pub count: u32,
    pub unit_value: u32,
}

/// Read-only snapshot emitted when a round ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub final_score: u32,
    pub collected: BTreeMap<String, CollectedEntry>,
}

/// The stateful orchestrator of one timed round.
///
/// Single-writer: only the game-tick and pointer paths mutate it, both on
/// the same thread. `score` is monotonically non-decreasing while
/// `Running` and frozen at `Over`; `collected` is the per-symbol breakdown
/// of the same total.
#[derive(Resource, Debug)]
pub struct GameSession {
    pub level: Arc<LevelRuntime>,
    pub weighting: SpawnWeighting,
    pub score: u32,
    pub collected: BTreeMap<String, CollectedEntry>,
    pub time_remaining: u32,
    pub phase: SessionPhase,
    pub next_spawn_seq: u64,
    pub summary_posted: bool,
}

impl GameSession {
    #[must_use]
    pub fn new(level: Arc<LevelRuntime>, weighting: SpawnWeighting) -> Self {
        let time_remaining = level.config.duration_secs;
        Self {
            level,
            weighting,
            score: 0,
            collected: BTreeMap::new(),
            time_remaining,
            phase: SessionPhase::Running,
            next_spawn_seq: 0,
            summary_posted: false,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Hands out the next spawn sequence number.
    pub fn take_spawn_seq(&mut self) -> u64 {
        let seq = self.next_spawn_seq;
        self.next_spawn_seq += 1;
        seq
    }

    /// Credits one collected mineral. No-op after the round is over.
    pub fn record_hit(&mut self, kind: &MineralType) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.score += kind.value;
        let entry = self
            .collected
            .entry(kind.symbol.clone())
            .or_insert(CollectedEntry {
                count: 0,
                unit_value: kind.value,
            });
        entry.count += 1;
    }

    /// One 1-second countdown step. Returns true on the single
    /// `Running -> Over` transition.
    pub fn countdown_tick(&mut self) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.phase = SessionPhase::Over;
            return true;
        }
        false
    }

    #[must_use]
    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            final_score: self.score,
            collected: self.collected.clone(),
        }
    }
}

/// Fixed-interval accumulator. `advance` reports how many whole intervals
/// elapsed, so a long frame fires the timer the right number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTimer {
    interval: f32,
    accumulated: f32,
}

impl IntervalTimer {
    #[must_use]
    pub fn from_millis(interval_ms: u64) -> Self {
        Self {
            interval: interval_ms as f32 / 1000.0,
            accumulated: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulated += dt;
        let mut fired = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            fired += 1;
        }
        fired
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

/// The two named timer sources driving a round. Replacing this resource
/// (session teardown or restart) cancels both at once.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Timers {
    pub spawn: IntervalTimer,
    pub countdown: IntervalTimer,
}

impl Timers {
    #[must_use]
    pub fn for_level(spawn_interval_ms: u64) -> Self {
        Self {
            spawn: IntervalTimer::from_millis(spawn_interval_ms),
            countdown: IntervalTimer::from_millis(game::COUNTDOWN_INTERVAL_MS),
        }
    }
}
