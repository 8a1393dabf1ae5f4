use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::tokio::sync::watch;
use rocket::tokio::task::JoinHandle;
use rocket::{Orbit, Rocket};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::security::auth;
use crate::store::Store;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Periodic purge of expired session rows. The first purge runs as soon as
/// the task starts; `stop` ends the loop and waits for it.
pub struct SessionSweeper {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SessionSweeper {
    pub fn start(store: Arc<dyn Store>, every: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sweep(Arc::clone(&store)).await;
                    }
                    _ = stopped.changed() => break,
                }
            }
            log::debug!("[task] Session sweeper stopped");
        });

        SessionSweeper { stop, handle }
    }

    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            log::error!("[task] Session sweeper ended abnormally: {}", e);
        }
    }
}

/// One purge pass, run off the async workers. Failures are logged and
/// reported as zero rows removed.
pub async fn sweep(store: Arc<dyn Store>) -> usize {
    let result =
        tokio::task::spawn_blocking(move || auth::cleanup_expired_sessions(&*store)).await;

    match result {
        Ok(Ok(count)) => {
            if count > 0 {
                log::info!("[task] Cleaned up {} expired sessions", count);
            }
            count
        }
        Ok(Err(e)) => {
            log::error!("[task] Session cleanup failed: {}", e);
            0
        }
        Err(e) => {
            log::error!("[task] Session cleanup panicked: {}", e);
            0
        }
    }
}

/// Starts the sweeper at liftoff and stops it on shutdown.
pub struct SessionSweep {
    every: Duration,
    running: Mutex<Option<SessionSweeper>>,
}

impl SessionSweep {
    pub fn every(every: Duration) -> Self {
        SessionSweep {
            every,
            running: Mutex::new(None),
        }
    }

    pub fn hourly() -> Self {
        Self::every(SWEEP_INTERVAL)
    }
}

#[rocket::async_trait]
impl Fairing for SessionSweep {
    fn info(&self) -> Info {
        Info {
            name: "Session Sweep",
            kind: Kind::Liftoff | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let store = match rocket.state::<Arc<dyn Store>>() {
            Some(store) => Arc::clone(store),
            None => {
                log::error!("[task] Store not in managed state, session sweep disabled");
                return;
            }
        };

        let sweeper = SessionSweeper::start(store, self.every);
        if let Ok(mut running) = self.running.lock() {
            *running = Some(sweeper);
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        let sweeper = self.running.lock().ok().and_then(|mut running| running.take());
        if let Some(sweeper) = sweeper {
            sweeper.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use crate::models::session::Session;
    use crate::store::tests::test_store;
    use chrono::Utc;

    fn expired(token: &str) -> Session {
        Session {
            token: token.to_string(),
            user_id: auth::ADMIN_USER_ID,
            expires_at: Utc::now().naive_utc() - chrono::Duration::hours(1),
        }
    }

    // session_get hides expired rows, so count them directly
    fn row_count(pool: &DbPool, token: &str) -> i64 {
        let conn = pool.get().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE token = ?1",
            [token],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[rocket::async_test]
    async fn sweep_removes_only_expired_rows() {
        let s = test_store();
        s.session_insert(&expired("old")).unwrap();
        let live = auth::create_session(&s, auth::ADMIN_USER_ID).unwrap();

        let store: Arc<dyn Store> = Arc::new(s);
        assert_eq!(sweep(Arc::clone(&store)).await, 1);
        assert_eq!(sweep(Arc::clone(&store)).await, 0);
        assert!(auth::get_session(&*store, &live.token).unwrap().is_some());
    }

    #[rocket::async_test]
    async fn sweeper_purges_on_start_and_stops() {
        let s = test_store();
        let pool = s.pool.clone();
        s.session_insert(&expired("stale")).unwrap();

        let store: Arc<dyn Store> = Arc::new(s);
        let sweeper = SessionSweeper::start(Arc::clone(&store), Duration::from_secs(3600));

        let mut purged = false;
        for _ in 0..100 {
            if row_count(&pool, "stale") == 0 {
                purged = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(purged, "first tick should purge immediately");

        tokio::time::timeout(Duration::from_secs(5), sweeper.stop())
            .await
            .expect("sweeper should stop promptly");
    }
}
