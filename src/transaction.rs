//! Immutable ledger entries.
//!
//! The transaction log is append-only. A user's balance must always equal
//! their starting balance plus the sum of their transaction amounts; the
//! denormalized balance on [`User`](crate::user::User) exists for fast
//! reads and is reconciled with the log by
//! [`Store::apply_entry`](crate::store::Store::apply_entry).

use crate::credits::Credits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    /// Stake credited to a winning-roster member at settlement.
    Win,

    /// Stake debited from a losing-roster member at settlement.
    Loss,

    /// Explicit admin override, the only balance change without a match event.
    AdminAdjust,

    /// Credit-back when a loser's out-of-band payment is recorded.
    PaymentClear,
}

/// An immutable, signed ledger entry belonging to exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Signed delta applied to the user's balance.
    pub amount: Credits,

    /// Persisted under the `type` column.
    #[serde(rename = "type")]
    pub kind: TxKind,

    /// Human-readable description shown in wallet history.
    pub description: String,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new entry stamped with a fresh id and the current time.
    pub fn new(
        user_id: Uuid,
        amount: Credits,
        kind: TxKind,
        description: impl Into<String>,
    ) -> Self {
        Transaction {
            id: Uuid::new_v4(),
            user_id,
            amount,
            kind,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&TxKind::Win).unwrap(), "\"WIN\"");
        assert_eq!(serde_json::to_string(&TxKind::Loss).unwrap(), "\"LOSS\"");
        assert_eq!(
            serde_json::to_string(&TxKind::AdminAdjust).unwrap(),
            "\"ADMIN_ADJUST\""
        );
        assert_eq!(
            serde_json::to_string(&TxKind::PaymentClear).unwrap(),
            "\"PAYMENT_CLEAR\""
        );
    }

    #[test]
    fn test_kind_persists_under_type_column() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            Credits::from(-50),
            TxKind::AdminAdjust,
            "Admin override: penalty",
        );

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "ADMIN_ADJUST");
        assert_eq!(json["amount"], "-50.00");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, TxKind::AdminAdjust);
        assert_eq!(back.amount, tx.amount);
    }
}
