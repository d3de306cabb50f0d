//! Content observers.

use crate::domain::entities::UnitId;
use crate::ipc::messages::{ReplicationMessage, Target};
use crate::ports::outbound::{ContentObserver, Transport};
use std::sync::Mutex;
use tracing::warn;

/// Ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ContentObserver for NoopObserver {
    fn on_content_changed(&self, _unit: &UnitId) {}
}

/// Collects notified ids in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<UnitId>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<UnitId> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    pub fn take(&self) -> Vec<UnitId> {
        self.seen
            .lock()
            .map(|mut seen| std::mem::take(&mut *seen))
            .unwrap_or_default()
    }
}

impl ContentObserver for RecordingObserver {
    fn on_content_changed(&self, unit: &UnitId) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(unit.clone());
        }
    }
}

/// Broadcasts a change notification to every peer.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier<T> {
    transport: T,
}

impl<T: Transport> BroadcastNotifier<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> ContentObserver for BroadcastNotifier<T> {
    fn on_content_changed(&self, unit: &UnitId) {
        let message = ReplicationMessage::change_notification(unit.clone());
        if let Err(e) = self.transport.send(message, Target::Broadcast) {
            warn!(unit = %unit, error = %e, "Change notification not delivered");
        }
    }
}
