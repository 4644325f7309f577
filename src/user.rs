//! User model: the root entity transactions and notifications hang off of.
//!
//! A user's `balance` is denormalized alongside the transaction log and is
//! mutated only through [`Store::apply_entry`](crate::store::Store::apply_entry)
//! or an explicit admin override. Users never mutate their own balance.

use crate::credits::Credits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role. Admins may create matches, adjust balances, and clear debts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Player,
}

/// A wallet holder.
///
/// Field names double as the persisted column names, so renames here are
/// schema changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable unique identifier.
    pub id: Uuid,

    /// Display name, stored uppercased and trimmed.
    pub username: String,

    /// Login email, stored lowercased and trimmed.
    pub email: String,

    /// Authentication secret: exactly 6 ASCII digits.
    pub pin: String,

    /// Role controlling administrative operations.
    pub role: Role,

    /// Denormalized running balance. May go negative: a negative balance
    /// is an outstanding debt, not an error state.
    pub balance: Credits,

    /// Blocked users can hold balance but cannot authenticate.
    pub is_blocked: bool,

    /// Soft-delete flag; deleted users are hidden from default listings.
    pub is_deleted: bool,

    /// Non-admins need this to create matches.
    pub can_create_match: bool,

    /// Lifetime count of debts this user has cleared out of band.
    pub total_matches_paid: u32,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns `true` if this user may create matches.
    pub fn may_create_match(&self) -> bool {
        self.role == Role::Admin || self.can_create_match
    }
}

/// Input for [`LedgerEngine::create_user`](crate::engine::LedgerEngine::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Defaults to `"000000"` when empty.
    pub pin: String,
    pub role: Role,
    pub starting_balance: Credits,
    pub can_create_match: bool,
}

/// Partial user update; `None` fields are left untouched.
///
/// Note the absence of `balance`: balances move only through the ledger
/// engine or an admin adjustment, never through a field update.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub pin: Option<String>,
    pub role: Option<Role>,
    pub is_blocked: Option<bool>,
    pub can_create_match: Option<bool>,
}

impl UserUpdate {
    /// Applies the non-`None` fields to `user`.
    pub(crate) fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(pin) = self.pin {
            user.pin = pin;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(is_blocked) = self.is_blocked {
            user.is_blocked = is_blocked;
        }
        if let Some(can_create_match) = self.can_create_match {
            user.can_create_match = can_create_match;
        }
    }
}

/// Validates that a PIN is exactly 6 ASCII digits.
pub fn pin_is_valid(pin: &str) -> bool {
    pin.len() == 6 && pin.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ALICE".to_string(),
            email: "alice@example.com".to_string(),
            pin: "123456".to_string(),
            role: Role::Player,
            balance: Credits::ZERO,
            is_blocked: false,
            is_deleted: false,
            can_create_match: false,
            total_matches_paid: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_may_always_create_matches() {
        let mut user = sample_user();
        assert!(!user.may_create_match());

        user.role = Role::Admin;
        assert!(user.may_create_match());
    }

    #[test]
    fn test_permission_flag_allows_match_creation() {
        let mut user = sample_user();
        user.can_create_match = true;
        assert!(user.may_create_match());
    }

    #[test]
    fn test_update_applies_only_set_fields() {
        let mut user = sample_user();
        let update = UserUpdate {
            is_blocked: Some(true),
            ..Default::default()
        };
        update.apply(&mut user);

        assert!(user.is_blocked);
        assert_eq!(user.username, "ALICE");
        assert_eq!(user.pin, "123456");
    }

    #[test]
    fn test_pin_validation() {
        assert!(pin_is_valid("000000"));
        assert!(pin_is_valid("123456"));
        assert!(!pin_is_valid("12345"));
        assert!(!pin_is_valid("1234567"));
        assert!(!pin_is_valid("12345a"));
        assert!(!pin_is_valid(""));
    }

    #[test]
    fn test_role_serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::Player).unwrap(), "\"PLAYER\"");
    }
}
