//! # Wager Ledger
//!
//! Wallet and ledger engine for a peer-wagered match competition app:
//! players join matches, stake credits, and settle win/loss outcomes
//! against a shared virtual currency balance.
//!
//! ## Design Principles
//!
//! - **Exact arithmetic**: balances use 2-decimal fixed-point via `rust_decimal`
//! - **Append-only ledger**: `balance == starting balance + sum(transactions)`,
//!   enforced by applying balance and transaction as one atomic store call
//! - **Idempotent settlement**: an already-settled match is a silent no-op
//! - **Best-effort payouts**: one participant's failure never blocks the rest
//!
//! ## Example
//!
//! ```
//! use wager_ledger::{Credits, LedgerEngine, MatchPlayer, MemoryStore, NewUser, Role, Team};
//!
//! let mut engine = LedgerEngine::new(MemoryStore::new());
//! let admin = engine.create_admin("HQ", "hq@example.com", "999999", Credits::ZERO).unwrap();
//! let alice = engine.create_user(NewUser {
//!     username: "alice".into(),
//!     email: "alice@example.com".into(),
//!     pin: "123456".into(),
//!     role: Role::Player,
//!     starting_balance: Credits::from(500),
//!     can_create_match: false,
//! }).unwrap();
//! let bob = engine.create_user(NewUser {
//!     username: "bob".into(),
//!     email: "bob@example.com".into(),
//!     pin: "123456".into(),
//!     role: Role::Player,
//!     starting_balance: Credits::from(500),
//!     can_create_match: false,
//! }).unwrap();
//!
//! let m = engine.create_match(
//!     "DERBY",
//!     vec![MatchPlayer::new(alice.id, "ALICE", Credits::from(100))],
//!     vec![MatchPlayer::new(bob.id, "BOB", Credits::from(100))],
//!     admin.id,
//! ).unwrap();
//!
//! engine.settle_match(m.id, Team::A).unwrap();
//! assert_eq!(engine.get_user(alice.id).unwrap().unwrap().balance, Credits::from(600));
//! ```

pub mod credits;
pub mod engine;
pub mod error;
pub mod matches;
pub mod notification;
pub mod notify;
pub mod registry;
pub mod store;
pub mod transaction;
pub mod user;

pub use credits::Credits;
pub use engine::{LedgerEngine, ParticipantResult, SettlementReport, SettlementStatus};
pub use error::{LedgerError, Result};
pub use matches::{Match, MatchPlayer, MatchStatus, Team};
pub use notification::Notification;
pub use store::{MemoryStore, Store};
pub use transaction::{Transaction, TxKind};
pub use user::{NewUser, Role, User, UserUpdate};
