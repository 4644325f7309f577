//! Persistent store abstraction and the in-memory implementation.
//!
//! The store exposes atomic single-row reads and writes; it guarantees
//! nothing across rows. The one deliberate exception is
//! [`Store::apply_entry`], which adjusts a user's denormalized balance and
//! appends the matching transaction as a single store call, so the balance
//! and the log cannot drift apart on a half-applied write.

use crate::error::{LedgerError, Result};
use crate::matches::Match;
use crate::notification::Notification;
use crate::transaction::Transaction;
use crate::user::User;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use uuid::Uuid;

/// Durable tables for users, matches, transactions, and notifications.
///
/// Listing methods return rows in insertion order (oldest first); callers
/// that promise newest-first reverse at the surface.
pub trait Store {
    /// All user rows, soft-deleted included.
    fn list_users(&self) -> Result<Vec<User>>;

    /// Single-row user read.
    fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Inserts a user, enforcing username and email uniqueness against
    /// non-deleted rows.
    fn insert_user(&mut self, user: User) -> Result<()>;

    /// Replaces the user row with the same id.
    fn update_user(&mut self, user: User) -> Result<()>;

    /// All match rows.
    fn list_matches(&self) -> Result<Vec<Match>>;

    /// Single-row match read.
    fn get_match(&self, id: Uuid) -> Result<Option<Match>>;

    /// Inserts a match row.
    fn insert_match(&mut self, m: Match) -> Result<()>;

    /// Replaces the match row with the same id.
    fn update_match(&mut self, m: Match) -> Result<()>;

    /// Atomically adds `tx.amount` to the user's balance and appends `tx`
    /// to the transaction log. Fails without effect if the user is absent.
    fn apply_entry(&mut self, tx: Transaction) -> Result<()>;

    /// One user's transactions, oldest first.
    fn transactions_for(&self, user_id: Uuid) -> Result<Vec<Transaction>>;

    /// Every transaction, oldest first.
    fn all_transactions(&self) -> Result<Vec<Transaction>>;

    /// Appends an unread notification row.
    fn append_notification(&mut self, note: Notification) -> Result<()>;

    /// One user's notifications, oldest first.
    fn notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>>;

    /// Bulk-flips all of a user's notifications to read.
    fn mark_all_read(&mut self, user_id: Uuid) -> Result<()>;
}

/// In-memory store with JSON snapshot persistence.
///
/// The serialized field layout is the persisted schema: four tables keyed
/// by the column names in the row structs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    users: Vec<User>,
    matches: Vec<Match>,
    transactions: Vec<Transaction>,
    notifications: Vec<Notification>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes a snapshot to a JSON writer.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl Store for MemoryStore {
    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.clone())
    }

    fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    fn insert_user(&mut self, user: User) -> Result<()> {
        for existing in self.users.iter().filter(|u| !u.is_deleted) {
            if existing.username == user.username {
                return Err(LedgerError::DuplicateUser {
                    field: "username",
                    value: user.username,
                });
            }
            if existing.email == user.email {
                return Err(LedgerError::DuplicateUser {
                    field: "email",
                    value: user.email,
                });
            }
        }
        self.users.push(user);
        Ok(())
    }

    fn update_user(&mut self, user: User) -> Result<()> {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(row) => {
                *row = user;
                Ok(())
            }
            None => Err(LedgerError::UserNotFound(user.id)),
        }
    }

    fn list_matches(&self) -> Result<Vec<Match>> {
        Ok(self.matches.clone())
    }

    fn get_match(&self, id: Uuid) -> Result<Option<Match>> {
        Ok(self.matches.iter().find(|m| m.id == id).cloned())
    }

    fn insert_match(&mut self, m: Match) -> Result<()> {
        self.matches.push(m);
        Ok(())
    }

    fn update_match(&mut self, m: Match) -> Result<()> {
        match self.matches.iter_mut().find(|row| row.id == m.id) {
            Some(row) => {
                *row = m;
                Ok(())
            }
            None => Err(LedgerError::MatchNotFound(m.id)),
        }
    }

    fn apply_entry(&mut self, tx: Transaction) -> Result<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == tx.user_id)
            .ok_or(LedgerError::UserNotFound(tx.user_id))?;

        user.balance += tx.amount;
        self.transactions.push(tx);
        Ok(())
    }

    fn transactions_for(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn all_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.clone())
    }

    fn append_notification(&mut self, note: Notification) -> Result<()> {
        self.notifications.push(note);
        Ok(())
    }

    fn notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    fn mark_all_read(&mut self, user_id: Uuid) -> Result<()> {
        for note in self.notifications.iter_mut().filter(|n| n.user_id == user_id) {
            note.is_read = true;
        }
        Ok(())
    }
}
