use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Spawn the background task that drives every active session's countdown,
/// one second at a time.
///
/// Timer updates and the end-of-game broadcast happen inside
/// `tick_session`. Missed ticks are delayed rather than bursted, so a
/// stalled runtime can never make a clock jump by more than one second per
/// call.
pub fn spawn_session_ticker(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let room_ids: Vec<String> = state.sessions.read().await.keys().cloned().collect();

            for room_id in room_ids {
                state.tick_session(&room_id).await;
            }
        }
    });
}
