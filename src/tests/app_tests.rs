#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;
    use std::sync::{Arc, Mutex};

    use crate::app::App;
    use crate::auth::PlayerIdentity;
    use crate::catalog::Catalog;
    use crate::components::{GameSession, Mineral, SessionPhase, Surface};
    use crate::config::Config;
    use crate::game;
    use crate::persistence::{RewardStore, RewardWorker, StoreError, UserRecord};
    use crate::systems::spawn_mineral;

    fn guest_app() -> App {
        App::new(&Catalog::builtin(), &Config::default(), None, None).expect("app builds")
    }

    #[test]
    fn test_new_app_starts_running() {
        let app = guest_app();
        let session = app.session();

        assert_eq!(session.phase, SessionPhase::Running);
        assert_eq!(session.score, 0);
        assert_eq!(session.time_remaining, 60);
        assert!(session.collected.is_empty());
    }

    #[test]
    fn test_unknown_level_is_an_error() {
        let mut config = Config::default();
        config.level = 99;
        assert!(App::new(&Catalog::builtin(), &config, None, None).is_err());
    }

    #[test]
    fn test_set_surface_updates_resource() {
        let mut app = guest_app();
        app.set_surface(500.0, 1000.0);

        let surface = app.world.resource::<Surface>();
        assert_eq!(surface.width, 500.0);
        assert_eq!(surface.height, 1000.0);
    }

    #[test]
    fn test_click_outside_playfield_is_ignored() {
        let mut app = guest_app();
        app.playfield = Some(Rect::new(2, 2, 20, 20));
        spawn_mineral(&mut app.world);

        app.handle_click(0, 0);

        assert_eq!(app.session().score, 0);
    }

    #[test]
    fn test_click_maps_terminal_cell_to_surface() {
        let mut app = guest_app();
        let area = Rect::new(1, 1, 30, 30);
        app.playfield = Some(area);
        app.set_surface(
            f32::from(area.width) * game::CELL_PIXEL_WIDTH,
            f32::from(area.height) * game::CELL_PIXEL_HEIGHT,
        );

        // Place a mineral at the surface point cell (5, 3) maps to
        let x = (5.0 + 0.5) * game::CELL_PIXEL_WIDTH;
        let y = (3.0 + 0.5) * game::CELL_PIXEL_HEIGHT;
        let kind = {
            let session = app.world.resource::<GameSession>();
            std::sync::Arc::clone(&session.level.minerals[0])
        };
        crate::tests::test_utils::place_mineral(&mut app.world, &kind, x, y, 100.0);

        app.handle_click(area.x + 5, area.y + 3);

        assert!(app.session().score > 0);
    }

    #[test]
    fn test_reset_clears_round_state() {
        let mut app = guest_app();
        spawn_mineral(&mut app.world);
        {
            let mut session = app.world.resource_mut::<GameSession>();
            session.score = 42;
            session.phase = SessionPhase::Over;
        }
        app.on_tick();
        assert!(app.last_summary.is_some());

        app.reset();

        let session = app.session();
        assert_eq!(session.phase, SessionPhase::Running);
        assert_eq!(session.score, 0);
        assert_eq!(session.time_remaining, 60);
        assert_eq!(app.world.query::<&Mineral>().iter(&app.world).count(), 0);
        assert!(app.last_summary.is_none());
    }

    #[derive(Default)]
    struct RecordingStore {
        applied: Arc<Mutex<Vec<(i64, u32)>>>,
    }

    impl RewardStore for RecordingStore {
        fn find_or_create_user(
            &mut self,
            identity: &PlayerIdentity,
        ) -> Result<UserRecord, StoreError> {
            Ok(UserRecord {
                external_id: identity.external_id,
                display_name: identity.display_name.clone(),
                username: identity.username.clone(),
                coins: 0,
                boosts: Vec::new(),
                collected_minerals: Default::default(),
            })
        }

        fn increment_coins(&mut self, external_id: i64, amount: u32) -> Result<u64, StoreError> {
            self.applied
                .lock()
                .expect("test store lock")
                .push((external_id, amount));
            Ok(u64::from(amount))
        }

        fn record_collected_mineral(
            &mut self,
            _external_id: i64,
            _symbol: &str,
            _count: u32,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_summary_posted_exactly_once() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let store = RecordingStore {
            applied: Arc::clone(&applied),
        };
        let identity = PlayerIdentity {
            external_id: 7,
            display_name: "Ada".to_string(),
            username: None,
        };
        let worker = RewardWorker::spawn(Box::new(store));
        let mut app = App::new(
            &Catalog::builtin(),
            &Config::default(),
            Some(identity),
            Some(worker),
        )
        .expect("app builds");

        {
            let mut session = app.world.resource_mut::<GameSession>();
            session.score = 13;
            session.phase = SessionPhase::Over;
        }
        // Repeated ticks after the transition post only one summary
        app.on_tick();
        app.on_tick();
        app.on_tick();

        drop(app); // joins the worker

        let applied = applied.lock().expect("test store lock");
        assert_eq!(applied.as_slice(), &[(7, 13)]);
    }

    #[test]
    fn test_guest_round_keeps_summary_in_memory() {
        let mut app = guest_app();
        {
            let mut session = app.world.resource_mut::<GameSession>();
            session.score = 5;
            session.phase = SessionPhase::Over;
        }

        app.on_tick();

        let summary = app.last_summary.as_ref().expect("summary kept");
        assert_eq!(summary.final_score, 5);
        assert!(!app.save_failed());
    }
}
