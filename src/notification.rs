//! User-facing notification records.
//!
//! Notifications are a side effect of ledger and admin actions. The read
//! flag flips only through the bulk mark-read operation; clients poll
//! [`LedgerEngine::list_notifications`](crate::engine::LedgerEngine::list_notifications)
//! at whatever cadence suits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message targeted at one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates an unread notification stamped with the current time.
    pub fn new(user_id: Uuid, message: impl Into<String>) -> Self {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            message: message.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
