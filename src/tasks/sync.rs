//! Background Sync Task
//!
//! Periodically refreshes a fixed set of resources so the cache holds recent
//! data for them. Refreshes go through the governor, so offline mode and the
//! daily quota apply to them like to any other request.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::governor::{Lookup, RequestGovernor};
use crate::upstream::ResourceRequest;

/// Spawns a background task that refreshes the first page of each resource
/// every `interval_secs` seconds.
///
/// The first round runs after one full interval, not immediately.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sync_task(governor.clone(), vec!["products".into()], 300);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sync_task(
    governor: RequestGovernor,
    resources: Vec<String>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting sync task for {:?} with interval of {} seconds",
            resources,
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut refreshed = 0;
            for resource in &resources {
                let request = ResourceRequest::new(resource.as_str(), governor.policy());
                match governor.refresh(&request).await {
                    Lookup::Fetched(_) => refreshed += 1,
                    other => debug!(
                        "Sync of '{}' skipped: {:?}",
                        resource,
                        other.reason()
                    ),
                }
            }

            if refreshed > 0 {
                info!("Sync: refreshed {} of {} resources", refreshed, resources.len());
            } else {
                debug!("Sync: nothing refreshed");
            }
        }
    })
}
