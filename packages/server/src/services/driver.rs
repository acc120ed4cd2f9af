//! Per-room advancement driver. One task per room evaluates the current
//! phase's exit predicate on a fixed tick and commits the transition.

use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{game_service, now_millis, ServiceError};
use crate::{state::AppState, utils::tasks::spawn_named_task};

pub fn spawn_driver(state: AppState, room_id: String) -> JoinHandle<()> {
    spawn_named_task(format!("driver-{}", room_id), run_driver(state, room_id))
}

pub async fn run_driver(state: AppState, room_id: String) {
    let tick = Duration::from_millis(state.game_config.driver_tick_ms);
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(room_id = %room_id, "driver started");

    loop {
        interval.tick().await;
        match game_service::advance_as_host(&state, &room_id, now_millis()).await {
            Ok(game_service::Advance::Advanced { phase, .. }) => {
                debug!(room_id = %room_id, ?phase, "driver advanced room");
            }
            Ok(_) => {}
            Err(ServiceError::RoomNotFound(_)) => break,
            Err(e) => warn!(room_id = %room_id, error = %e, "driver tick failed"),
        }
    }
    info!(room_id = %room_id, "driver stopped");
}
