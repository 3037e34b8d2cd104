#![warn(clippy::all, clippy::pedantic)]

// Surface geometry
//
// Game logic runs in an abstract pixel space; the renderer maps terminal
// cells onto it. Fall speeds in level configs are tuned against
// REFERENCE_HEIGHT and scaled to the actual surface so a mineral takes the
// same wall-clock time to cross the screen on any terminal size.
pub const REFERENCE_HEIGHT: f32 = 780.0;
pub const CELL_PIXEL_WIDTH: f32 = 10.0;
pub const CELL_PIXEL_HEIGHT: f32 = 20.0;

// Entity tuning
pub const MINERAL_RADIUS: f32 = 20.0;
pub const HIT_TOLERANCE: f32 = 8.0; // extra touch-target slack around the collision radius
pub const MAX_SPIN_SPEED: f32 = 3.0; // radians/second, cosmetic only

// Cap on concurrently live minerals. Spawns past the cap are skipped so a
// frame-rate stall cannot grow the entity set without bound.
pub const MAX_ACTIVE_MINERALS: usize = 64;

// Frame deltas above this are clamped before kinematics run; dropped frames
// advance the round by at most this much per tick.
pub const MAX_FRAME_DELTA: f32 = 0.1;

// Countdown cadence, independent of frame rate.
pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;

pub const STARTING_LEVEL: u32 = 1;
