//! Background job: purge expired refresh-token records.
//!
//! Runs once a day at a configured UTC wall-clock time. A failed sweep is
//! logged and retried on the next tick; it never touches the request path.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};

use crate::store::RefreshStore;

/// Spawn the daily sweep task. Call this once at startup.
pub fn spawn(store: Arc<dyn RefreshStore>, fire_at: NaiveTime) {
    tokio::spawn(async move {
        loop {
            let wait = until_next(Utc::now(), fire_at);
            tokio::time::sleep(wait).await;
            run_once(store.as_ref()).await;
        }
    });
}

/// One sweep pass: delete every record with `expiration <= now`. Returns the
/// number of records removed (zero when the sweep fails; the error is logged
/// and the next tick retries).
pub async fn run_once(store: &dyn RefreshStore) -> u64 {
    match store.delete_expired_before(Utc::now()).await {
        Ok(0) => 0,
        Ok(rows) => {
            tracing::info!(rows, "purged expired refresh tokens");
            rows
        }
        Err(e) => {
            tracing::error!("refresh token sweep failed: {}", e);
            0
        }
    }
}

/// Time until the next occurrence of `fire_at` on the UTC wall clock.
fn until_next(now: DateTime<Utc>, fire_at: NaiveTime) -> std::time::Duration {
    let today = now.date_naive().and_time(fire_at).and_utc();
    let next = if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

// ── Tests ────────────────────────────────────────────────────
