#![warn(clippy::all, clippy::pedantic)]

// Test modules
pub mod app_tests;
pub mod auth_tests;

// Shared test utilities
pub mod test_utils {
    use bevy_ecs::prelude::*;
    use std::sync::Arc;

    use crate::Time;
    use crate::catalog::{LevelConfig, LevelRuntime, MineralType, SpawnWeighting};
    use crate::components::{GameSession, Mineral, Position, Surface, Timers};
    use crate::game;

    #[must_use]
    pub fn mineral_type(symbol: &str, value: u32, frequency: u32) -> MineralType {
        MineralType {
            symbol: symbol.to_string(),
            name: format!("{symbol} test mineral"),
            sprite: "●".to_string(),
            value,
            frequency,
        }
    }

    #[must_use]
    pub fn level_config(
        spawn_interval_ms: u64,
        min_fall_speed: f32,
        max_fall_speed: f32,
        duration_secs: u32,
    ) -> LevelConfig {
        LevelConfig {
            level: 1,
            spawn_interval_ms,
            min_fall_speed,
            max_fall_speed,
            duration_secs,
            minerals: None,
        }
    }

    #[must_use]
    pub fn level_runtime(config: LevelConfig, types: Vec<MineralType>) -> Arc<LevelRuntime> {
        Arc::new(LevelRuntime {
            config,
            minerals: types.into_iter().map(Arc::new).collect(),
        })
    }

    /// World with a session at reference surface size (speed scale 1.0).
    #[must_use]
    pub fn test_world(runtime: &Arc<LevelRuntime>) -> World {
        let mut world = World::new();
        world.insert_resource(Time::new());
        world.insert_resource(Surface {
            width: 400.0,
            height: game::REFERENCE_HEIGHT,
        });
        world.insert_resource(GameSession::new(
            Arc::clone(runtime),
            SpawnWeighting::Uniform,
        ));
        world.insert_resource(Timers::for_level(runtime.config.spawn_interval_ms));
        world
    }

    /// The property-test setup: one mineral type worth a single point,
    /// spawning every 200 ms over a 2 second round at a fixed speed.
    #[must_use]
    pub fn hydrogen_world() -> World {
        let runtime = level_runtime(
            level_config(200, 100.0, 100.0, 2),
            vec![mineral_type("H", 1, 1)],
        );
        test_world(&runtime)
    }

    /// Places a mineral directly, bypassing the spawner.
    pub fn place_mineral(
        world: &mut World,
        kind: &Arc<MineralType>,
        x: f32,
        y: f32,
        fall_speed: f32,
    ) -> Entity {
        let spawn_seq = world.resource_mut::<GameSession>().take_spawn_seq();
        world
            .spawn((
                Mineral {
                    spawn_seq,
                    radius: game::MINERAL_RADIUS,
                    fall_speed,
                    rotation: 0.0,
                    rotation_speed: 0.0,
                    kind: Arc::clone(kind),
                    collected: false,
                },
                Position { x, y },
            ))
            .id()
    }

    #[must_use]
    pub fn active_minerals(world: &mut World) -> Vec<(Mineral, Position)> {
        world
            .query::<(&Mineral, &Position)>()
            .iter(world)
            .map(|(mineral, position)| (mineral.clone(), *position))
            .collect()
    }
}
