//! Live group snapshot channels.
//!
//! One `watch` channel per group. Subscribers get the current snapshot
//! immediately and a fresh snapshot after every mutation; intermediate
//! snapshots may be coalesced but a stale snapshot is never delivered
//! after a newer one. Dropping the stream unsubscribes.

use std::collections::HashMap;

use tokio::sync::{watch, RwLock};
use tokio_stream::wrappers::WatchStream;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{normalize_group_code, Group};

/// Registry of per-group snapshot channels.
pub struct GroupWatch {
    channels: RwLock<HashMap<String, watch::Sender<Group>>>,
}

impl GroupWatch {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Publish a fresh snapshot after a mutation.
    ///
    /// Publishing is guarded by version comparison, so two racing writers
    /// cannot push an older snapshot over a newer one. A group nobody is
    /// watching has no channel and the publish is a no-op.
    pub async fn publish(&self, group: &Group) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(&group.code) {
            send_newer(tx, group);
        }
    }

    /// Subscribe to a group's snapshots.
    ///
    /// The registry lock is held across the seeding read so that a
    /// mutation committed before the read is observed by it, and one
    /// committed after publishes into the registered channel. Either way
    /// the subscriber cannot miss the latest state.
    pub async fn subscribe(
        &self,
        repo: &Repository,
        code: &str,
    ) -> Result<WatchStream<Group>, AppError> {
        let code = normalize_group_code(code);

        let mut channels = self.channels.write().await;

        let group = repo
            .get_group(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", code)))?;

        let rx = match channels.get(&code) {
            Some(tx) => {
                send_newer(tx, &group);
                tx.subscribe()
            }
            None => {
                let (tx, rx) = watch::channel(group);
                channels.insert(code, tx);
                rx
            }
        };

        Ok(WatchStream::new(rx))
    }
}

fn send_newer(tx: &watch::Sender<Group>, group: &Group) {
    tx.send_if_modified(|current| {
        if group.version > current.version {
            *current = group.clone();
            true
        } else {
            false
        }
    });
}
