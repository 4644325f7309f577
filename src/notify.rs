//! Notification dispatcher.
//!
//! Notifications are fire-and-forget: a failed append is logged and
//! swallowed so it can never block the ledger operation that triggered it.

use crate::engine::LedgerEngine;
use crate::error::Result;
use crate::notification::Notification;
use crate::store::Store;
use log::warn;
use uuid::Uuid;

/// Appends an unread notification, swallowing store failures.
pub(crate) fn dispatch<S: Store>(store: &mut S, user_id: Uuid, message: impl Into<String>) {
    let note = Notification::new(user_id, message);
    if let Err(e) = store.append_notification(note) {
        warn!("Dropped notification for user {}: {}", user_id, e);
    }
}

impl<S: Store> LedgerEngine<S> {
    /// One user's notifications, newest first.
    ///
    /// This listing is the single source of truth for "what's new";
    /// refresh cadence is the caller's concern.
    pub fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut notes = self.store.notifications_for(user_id)?;
        notes.reverse();
        Ok(notes)
    }

    /// Bulk-flips all of a user's notifications to read. There is no
    /// per-notification read operation.
    pub fn mark_all_notifications_read(&mut self, user_id: Uuid) -> Result<()> {
        self.store.mark_all_read(user_id)
    }
}
