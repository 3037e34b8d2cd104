#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]

use bevy_ecs::prelude::*;
use log::debug;
use ratatui::layout::Rect;
use std::sync::Arc;

use crate::Time;
use crate::auth::PlayerIdentity;
use crate::catalog::{Catalog, LevelRuntime, SpawnWeighting};
use crate::components::{GameSession, RoundSummary, SessionPhase, Surface, Timers};
use crate::config::Config;
use crate::game;
use crate::persistence::RewardWorker;
use crate::systems::pointer_system;

pub type AppResult<T> = anyhow::Result<T>;

/// Owns the ECS world for the current round plus everything that outlives
/// rounds: the player identity, the reward worker, and the resolved level.
pub struct App {
    pub world: World,
    pub should_quit: bool,
    pub identity: Option<PlayerIdentity>,
    pub last_summary: Option<RoundSummary>,
    /// Playfield area of the last rendered frame, for pointer mapping.
    pub playfield: Option<Rect>,
    rewards: Option<RewardWorker>,
    level_runtime: Arc<LevelRuntime>,
    weighting: SpawnWeighting,
}

impl App {
    pub fn new(
        catalog: &Catalog,
        config: &Config,
        identity: Option<PlayerIdentity>,
        rewards: Option<RewardWorker>,
    ) -> AppResult<Self> {
        let level_runtime = Arc::new(catalog.resolve_level(config.level)?);

        let mut world = World::new();
        world.insert_resource(Time::new());
        world.insert_resource(Surface::default());
        world.insert_resource(GameSession::new(
            Arc::clone(&level_runtime),
            config.spawn_weighting,
        ));
        world.insert_resource(Timers::for_level(level_runtime.config.spawn_interval_ms));

        Ok(Self {
            world,
            should_quit: false,
            identity,
            last_summary: None,
            playfield: None,
            rewards,
            level_runtime,
            weighting: config.spawn_weighting,
        })
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        self.world.resource::<GameSession>()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.session().phase == SessionPhase::Over
    }

    /// True once a reward save has failed; the UI shows a non-fatal notice.
    #[must_use]
    pub fn save_failed(&self) -> bool {
        self.rewards.as_ref().is_some_and(RewardWorker::save_failed)
    }

    pub fn set_surface(&mut self, width: f32, height: f32) {
        let surface = Surface { width, height };
        if *self.world.resource::<Surface>() != surface {
            self.world.insert_resource(surface);
        }
    }

    /// Maps a terminal mouse click onto the game surface and runs the hit
    /// test. Clicks outside the playfield are ignored.
    pub fn handle_click(&mut self, column: u16, row: u16) {
        let Some(area) = self.playfield else {
            return;
        };
        if column < area.left() || column >= area.right() || row < area.top() || row >= area.bottom()
        {
            return;
        }
        let x = (f32::from(column - area.left()) + 0.5) * game::CELL_PIXEL_WIDTH;
        let y = (f32::from(row - area.top()) + 0.5) * game::CELL_PIXEL_HEIGHT;
        pointer_system(&mut self.world, x, y);
    }

    /// Posts the round summary exactly once after the session ends. Guest
    /// rounds keep the summary in memory but skip persistence.
    pub fn on_tick(&mut self) {
        let summary = {
            let mut session = self.world.resource_mut::<GameSession>();
            if session.phase == SessionPhase::Over && !session.summary_posted {
                session.summary_posted = true;
                Some(session.summary())
            } else {
                None
            }
        };
        let Some(summary) = summary else {
            return;
        };
        self.last_summary = Some(summary.clone());
        match (&self.identity, &self.rewards) {
            (Some(identity), Some(rewards)) => rewards.post(identity.clone(), summary),
            _ => debug!("guest round, skipping reward save"),
        }
    }

    /// Starts a fresh round: drops every live entity and replaces the
    /// session and both timers, so nothing carries over.
    pub fn reset(&mut self) {
        let surface = *self.world.resource::<Surface>();
        self.world.clear_entities();
        self.world.insert_resource(Time::new());
        self.world.insert_resource(surface);
        self.world.insert_resource(GameSession::new(
            Arc::clone(&self.level_runtime),
            self.weighting,
        ));
        self.world.insert_resource(Timers::for_level(
            self.level_runtime.config.spawn_interval_ms,
        ));
        self.last_summary = None;
    }
}
