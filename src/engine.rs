//! Core ledger engine.
//!
//! Applies balance deltas for match settlement, debt clearing, and admin
//! adjustments, recording an append-only transaction trail and notifying
//! affected users. The engine holds no state of its own beyond the store
//! handle: every method is a function of (store state, arguments).
//!
//! # Settlement semantics
//!
//! Settlement is externally idempotent: the match status guard is read
//! first and an already-settled match is a silent no-op, so repeated calls
//! never double-pay. Participants are processed best-effort: one
//! participant's failed write is logged and reported, and does not abort
//! the rest.

use crate::credits::Credits;
use crate::error::{LedgerError, Result};
use crate::matches::{MatchStatus, Team};
use crate::notify;
use crate::store::Store;
use crate::transaction::{Transaction, TxKind};
use crate::user::{pin_is_valid, NewUser, Role, User, UserUpdate};
use chrono::Utc;
use log::{debug, warn};
use uuid::Uuid;

/// What a `settle_match` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    /// Payouts were applied (possibly with per-participant failures).
    Applied,

    /// The match was already settled; nothing changed.
    AlreadySettled,

    /// No such match; nothing changed.
    NotFound,
}

/// Per-participant settlement result.
///
/// A failed participant keeps the error text so callers can retry just the
/// failed subset instead of assuming all-or-nothing.
#[derive(Debug, Clone)]
pub struct ParticipantResult {
    pub user_id: Uuid,
    pub username: String,
    pub team: Team,
    /// Signed delta that was (or should have been) applied.
    pub delta: Credits,
    /// `None` on success.
    pub error: Option<String>,
}

/// Outcome of a settlement call.
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub status: SettlementStatus,
    pub participants: Vec<ParticipantResult>,
}

impl SettlementReport {
    fn no_op(status: SettlementStatus) -> Self {
        SettlementReport {
            status,
            participants: Vec::new(),
        }
    }

    /// Participants whose writes failed.
    pub fn failures(&self) -> impl Iterator<Item = &ParticipantResult> {
        self.participants.iter().filter(|p| p.error.is_some())
    }
}

/// The ledger engine and its operation surface.
///
/// Generic over the backing [`Store`]; constructed with a store handle and
/// otherwise stateless.
pub struct LedgerEngine<S: Store> {
    pub(crate) store: S,
}

impl<S: Store> LedgerEngine<S> {
    /// Creates an engine over the given store.
    pub fn new(store: S) -> Self {
        LedgerEngine { store }
    }

    /// Read access to the backing store, e.g. for snapshotting.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the engine, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    // ---- users ----------------------------------------------------------

    /// Lists users, hiding soft-deleted rows unless asked for.
    pub fn list_users(&self, include_soft_deleted: bool) -> Result<Vec<User>> {
        let mut users = self.store.list_users()?;
        if !include_soft_deleted {
            users.retain(|u| !u.is_deleted);
        }
        Ok(users)
    }

    /// Single-user lookup.
    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.store.get_user(id)
    }

    /// Creates a user with a normalized username/email and a validated PIN.
    ///
    /// An empty PIN defaults to `000000`. Uniqueness of username and email
    /// is enforced by the store insert.
    pub fn create_user(&mut self, new: NewUser) -> Result<User> {
        let pin = if new.pin.is_empty() {
            "000000".to_string()
        } else {
            new.pin
        };
        if !pin_is_valid(&pin) {
            return Err(LedgerError::InvalidPin);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new.username.trim().to_uppercase(),
            email: new.email.trim().to_lowercase(),
            pin,
            role: new.role,
            balance: new.starting_balance,
            is_blocked: false,
            is_deleted: false,
            can_create_match: new.can_create_match,
            total_matches_paid: 0,
            created_at: Utc::now(),
        };

        self.store.insert_user(user.clone())?;
        debug!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Applies a partial field update. Fields are stored as given.
    pub fn set_user_fields(&mut self, id: Uuid, update: UserUpdate) -> Result<()> {
        let mut user = self
            .store
            .get_user(id)?
            .ok_or(LedgerError::UserNotFound(id))?;
        update.apply(&mut user);
        self.store.update_user(user)
    }

    /// Soft-deletes a user. Balance and history are retained.
    pub fn soft_delete_user(&mut self, id: Uuid) -> Result<()> {
        let mut user = self
            .store
            .get_user(id)?
            .ok_or(LedgerError::UserNotFound(id))?;
        user.is_deleted = true;
        self.store.update_user(user)
    }

    /// Looks up a user by normalized email and PIN.
    ///
    /// Deleted and blocked accounts are rejected after the credential
    /// check, with distinct errors.
    pub fn authenticate(&self, email: &str, pin: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .list_users()?
            .into_iter()
            .find(|u| u.email == email && u.pin == pin)
            .ok_or(LedgerError::InvalidCredentials)?;

        if user.is_deleted {
            return Err(LedgerError::AccountDeleted);
        }
        if user.is_blocked {
            return Err(LedgerError::AccountBlocked);
        }
        Ok(user)
    }

    /// Admin resets a user's PIN and leaves a security notification.
    pub fn reset_pin(&mut self, user_id: Uuid, new_pin: &str) -> Result<()> {
        if !pin_is_valid(new_pin) {
            return Err(LedgerError::InvalidPin);
        }
        let mut user = self
            .store
            .get_user(user_id)?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        user.pin = new_pin.to_string();
        self.store.update_user(user)?;

        notify::dispatch(
            &mut self.store,
            user_id,
            "Security notice: an admin has reset your PIN.",
        );
        Ok(())
    }

    // ---- ledger core -----------------------------------------------------

    /// Adjusts a user's balance by a signed amount outside any match event.
    ///
    /// The only validation is that the target exists. Balance and
    /// transaction move in one atomic store call; the notification follows
    /// fire-and-forget.
    pub fn admin_adjust_balance(
        &mut self,
        admin_id: Uuid,
        target_id: Uuid,
        amount: Credits,
        reason: &str,
    ) -> Result<()> {
        if self.store.get_user(target_id)?.is_none() {
            return Err(LedgerError::UserNotFound(target_id));
        }

        self.store.apply_entry(Transaction::new(
            target_id,
            amount,
            TxKind::AdminAdjust,
            format!("Admin override: {}", reason),
        ))?;
        debug!(
            "Admin {} adjusted balance of {} by {}",
            admin_id, target_id, amount
        );

        let verb = if amount.is_negative() { "debited" } else { "credited" };
        notify::dispatch(
            &mut self.store,
            target_id,
            format!(
                "Admin has {} {} credits {} your wallet. Reason: {}",
                verb,
                amount.abs(),
                if amount.is_negative() { "from" } else { "to" },
                reason
            ),
        );
        Ok(())
    }

    /// Declares a winner and pays out every participant.
    ///
    /// The match row is flipped to `SETTLED` with its winner before any
    /// payout, so a crash mid-settlement cannot be replayed as a fresh
    /// settlement with a different winner. Winners are credited their
    /// stake, losers debited theirs (balances may go negative); each
    /// participant gets an atomic balance-plus-transaction write followed
    /// by a notification.
    pub fn settle_match(&mut self, match_id: Uuid, winner: Team) -> Result<SettlementReport> {
        let mut m = match self.store.get_match(match_id)? {
            Some(m) => m,
            None => {
                debug!("Settle of unknown match {}, ignoring", match_id);
                return Ok(SettlementReport::no_op(SettlementStatus::NotFound));
            }
        };

        if m.status == MatchStatus::Settled {
            debug!("Match {} already settled, ignoring", match_id);
            return Ok(SettlementReport::no_op(SettlementStatus::AlreadySettled));
        }

        m.status = MatchStatus::Settled;
        m.winning_team = Some(winner);
        self.store.update_match(m.clone())?;

        let mut participants = Vec::new();

        for p in m.roster(winner) {
            let result = self.pay_participant(
                p.user_id,
                p.stake,
                TxKind::Win,
                format!("Match victory: {}", m.name),
                format!(
                    "VICTORY: your team won {}. {} credits added to your wallet.",
                    m.name, p.stake
                ),
            );
            participants.push(ParticipantResult {
                user_id: p.user_id,
                username: p.username.clone(),
                team: winner,
                delta: p.stake,
                error: result.err().map(|e| e.to_string()),
            });
        }

        for p in m.roster(winner.other()) {
            let result = self.pay_participant(
                p.user_id,
                -p.stake,
                TxKind::Loss,
                format!("Match defeat: {}", m.name),
                format!(
                    "DEFEAT: your team lost {}. {} credits deducted from your wallet.",
                    m.name, p.stake
                ),
            );
            participants.push(ParticipantResult {
                user_id: p.user_id,
                username: p.username.clone(),
                team: winner.other(),
                delta: -p.stake,
                error: result.err().map(|e| e.to_string()),
            });
        }

        Ok(SettlementReport {
            status: SettlementStatus::Applied,
            participants,
        })
    }

    /// Applies one participant's (balance, transaction, notification)
    /// triplet. Failures are logged here and surfaced in the report; they
    /// never abort the surrounding settlement loop.
    fn pay_participant(
        &mut self,
        user_id: Uuid,
        delta: Credits,
        kind: TxKind,
        description: String,
        message: String,
    ) -> Result<()> {
        match self
            .store
            .apply_entry(Transaction::new(user_id, delta, kind, description))
        {
            Ok(()) => {
                notify::dispatch(&mut self.store, user_id, message);
                Ok(())
            }
            Err(e) => {
                warn!("Settlement write for user {} failed: {}", user_id, e);
                Err(e)
            }
        }
    }

    /// Records that a losing player paid their debt out of band.
    ///
    /// Flips the roster `paid` flag, credits the stake back (the LOSS and
    /// the PAYMENT_CLEAR net to zero for that match), bumps the lifetime
    /// paid counter, and notifies the player. Any failed precondition is a
    /// silent no-op returning `Ok(false)`.
    pub fn mark_loser_paid(&mut self, match_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut m = match self.store.get_match(match_id)? {
            Some(m) => m,
            None => return Ok(false),
        };

        let winner = match (m.status, m.winning_team) {
            (MatchStatus::Settled, Some(w)) => w,
            _ => return Ok(false),
        };
        let losing = winner.other();

        let idx = match m.roster(losing).iter().position(|p| p.user_id == user_id) {
            Some(idx) if !m.roster(losing)[idx].paid => idx,
            _ => return Ok(false),
        };

        let stake = m.roster(losing)[idx].stake;
        let name = m.name.clone();
        m.roster_mut(losing)[idx].paid = true;
        self.store.update_match(m)?;

        match self.store.apply_entry(Transaction::new(
            user_id,
            stake,
            TxKind::PaymentClear,
            format!("Debt settled: {}", name),
        )) {
            Ok(()) => {
                // Counter bump is a separate single-row write; it is not
                // part of the balance/log invariant.
                if let Some(mut user) = self.store.get_user(user_id)? {
                    user.total_matches_paid += 1;
                    self.store.update_user(user)?;
                }
            }
            Err(LedgerError::UserNotFound(_)) => {
                warn!(
                    "Debt clearing for missing user {} on match {}: flag set, no credit",
                    user_id, match_id
                );
            }
            Err(e) => return Err(e),
        }

        notify::dispatch(
            &mut self.store,
            user_id,
            format!("Debt cleared: your payment for {} has been recorded.", name),
        );
        Ok(true)
    }

    // ---- transaction history ---------------------------------------------

    /// One user's transactions, newest first.
    pub fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        let mut txs = self.store.transactions_for(user_id)?;
        txs.reverse();
        Ok(txs)
    }

    /// Every transaction, newest first.
    pub fn list_all_transactions(&self) -> Result<Vec<Transaction>> {
        let mut txs = self.store.all_transactions()?;
        txs.reverse();
        Ok(txs)
    }

    /// Convenience for seeding: creates an admin user.
    pub fn create_admin(
        &mut self,
        username: &str,
        email: &str,
        pin: &str,
        starting_balance: Credits,
    ) -> Result<User> {
        self.create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            pin: pin.to_string(),
            role: Role::Admin,
            starting_balance,
            can_create_match: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::MatchPlayer;
    use crate::notification::Notification;
    use crate::store::MemoryStore;
    use crate::matches::Match;

    fn engine() -> LedgerEngine<MemoryStore> {
        LedgerEngine::new(MemoryStore::new())
    }

    fn new_player(engine: &mut LedgerEngine<MemoryStore>, name: &str, balance: i64) -> User {
        engine
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                pin: "123456".to_string(),
                role: Role::Player,
                starting_balance: Credits::from(balance),
                can_create_match: false,
            })
            .unwrap()
    }

    fn derby(
        engine: &mut LedgerEngine<MemoryStore>,
        alice: &User,
        bob: &User,
        stake: i64,
    ) -> Match {
        let admin = engine
            .create_admin("HQ", "hq@example.com", "999999", Credits::ZERO)
            .unwrap();
        engine
            .create_match(
                "DERBY",
                vec![MatchPlayer::new(alice.id, &alice.username, Credits::from(stake))],
                vec![MatchPlayer::new(bob.id, &bob.username, Credits::from(stake))],
                admin.id,
            )
            .unwrap()
    }

    #[test]
    fn test_settle_credits_winners_and_debits_losers() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        let bob = new_player(&mut engine, "BOB", 0);
        let m = derby(&mut engine, &alice, &bob, 100);

        let report = engine.settle_match(m.id, Team::A).unwrap();
        assert_eq!(report.status, SettlementStatus::Applied);
        assert_eq!(report.participants.len(), 2);
        assert_eq!(report.failures().count(), 0);

        let alice = engine.get_user(alice.id).unwrap().unwrap();
        let bob = engine.get_user(bob.id).unwrap().unwrap();
        assert_eq!(alice.balance, Credits::from(100));
        assert_eq!(bob.balance, Credits::from(-100));

        let m = engine.get_match(m.id).unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Settled);
        assert_eq!(m.winning_team, Some(Team::A));
    }

    #[test]
    fn test_settle_is_idempotent_even_with_different_winner() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        let bob = new_player(&mut engine, "BOB", 0);
        let m = derby(&mut engine, &alice, &bob, 100);

        engine.settle_match(m.id, Team::A).unwrap();
        let report = engine.settle_match(m.id, Team::B).unwrap();

        assert_eq!(report.status, SettlementStatus::AlreadySettled);
        assert!(report.participants.is_empty());

        let m = engine.get_match(m.id).unwrap().unwrap();
        assert_eq!(m.winning_team, Some(Team::A));
        assert_eq!(
            engine.get_user(alice.id).unwrap().unwrap().balance,
            Credits::from(100)
        );
        assert_eq!(engine.list_all_transactions().unwrap().len(), 2);
    }

    #[test]
    fn test_settle_unknown_match_is_a_no_op() {
        let mut engine = engine();
        let report = engine.settle_match(Uuid::new_v4(), Team::A).unwrap();
        assert_eq!(report.status, SettlementStatus::NotFound);
        assert!(engine.list_all_transactions().unwrap().is_empty());
    }

    #[test]
    fn test_settle_never_touches_paid_flags() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        let bob = new_player(&mut engine, "BOB", 0);
        let m = derby(&mut engine, &alice, &bob, 100);

        engine.settle_match(m.id, Team::A).unwrap();

        let m = engine.get_match(m.id).unwrap().unwrap();
        assert!(m.participants().all(|p| !p.paid));
    }

    #[test]
    fn test_settlement_failure_for_one_participant_does_not_block_others() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        let bob = new_player(&mut engine, "BOB", 0);
        let ghost = Uuid::new_v4();

        let admin = engine
            .create_admin("HQ", "hq@example.com", "999999", Credits::ZERO)
            .unwrap();
        let m = engine
            .create_match(
                "DERBY",
                vec![
                    MatchPlayer::new(alice.id, "ALICE", Credits::from(100)),
                    MatchPlayer::new(ghost, "GHOST", Credits::from(30)),
                ],
                vec![MatchPlayer::new(bob.id, "BOB", Credits::from(100))],
                admin.id,
            )
            .unwrap();

        let report = engine.settle_match(m.id, Team::A).unwrap();

        assert_eq!(report.status, SettlementStatus::Applied);
        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].user_id, ghost);

        // The glitch did not stop alice's credit or bob's debit.
        assert_eq!(
            engine.get_user(alice.id).unwrap().unwrap().balance,
            Credits::from(100)
        );
        assert_eq!(
            engine.get_user(bob.id).unwrap().unwrap().balance,
            Credits::from(-100)
        );
    }

    #[test]
    fn test_mark_loser_paid_nets_to_zero_and_bumps_counter() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        let bob = new_player(&mut engine, "BOB", 0);
        let m = derby(&mut engine, &alice, &bob, 100);
        engine.settle_match(m.id, Team::A).unwrap();

        assert!(engine.mark_loser_paid(m.id, bob.id).unwrap());

        let bob = engine.get_user(bob.id).unwrap().unwrap();
        assert_eq!(bob.balance, Credits::ZERO);
        assert_eq!(bob.total_matches_paid, 1);

        let m = engine.get_match(m.id).unwrap().unwrap();
        assert!(m.roster(Team::B)[0].paid);

        let kinds: Vec<_> = engine
            .list_transactions(bob.id)
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(kinds, vec![TxKind::PaymentClear, TxKind::Loss]);
    }

    #[test]
    fn test_mark_loser_paid_is_a_no_op_second_time() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        let bob = new_player(&mut engine, "BOB", 0);
        let m = derby(&mut engine, &alice, &bob, 100);
        engine.settle_match(m.id, Team::A).unwrap();

        assert!(engine.mark_loser_paid(m.id, bob.id).unwrap());
        assert!(!engine.mark_loser_paid(m.id, bob.id).unwrap());

        let bob = engine.get_user(bob.id).unwrap().unwrap();
        assert_eq!(bob.balance, Credits::ZERO);
        assert_eq!(bob.total_matches_paid, 1);
    }

    #[test]
    fn test_mark_loser_paid_rejects_winners_and_unsettled_matches() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        let bob = new_player(&mut engine, "BOB", 0);
        let m = derby(&mut engine, &alice, &bob, 100);

        // Not settled yet.
        assert!(!engine.mark_loser_paid(m.id, bob.id).unwrap());

        engine.settle_match(m.id, Team::A).unwrap();

        // Alice won; she has no debt to clear.
        assert!(!engine.mark_loser_paid(m.id, alice.id).unwrap());
        // Unknown match.
        assert!(!engine.mark_loser_paid(Uuid::new_v4(), bob.id).unwrap());
    }

    #[test]
    fn test_admin_adjust_records_transaction_and_notification() {
        let mut engine = engine();
        let admin = engine
            .create_admin("HQ", "hq@example.com", "999999", Credits::ZERO)
            .unwrap();
        let carol = new_player(&mut engine, "CAROL", 0);

        engine
            .admin_adjust_balance(admin.id, carol.id, Credits::from(-50), "penalty")
            .unwrap();

        let carol = engine.get_user(carol.id).unwrap().unwrap();
        assert_eq!(carol.balance, Credits::from(-50));

        let txs = engine.list_transactions(carol.id).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TxKind::AdminAdjust);
        assert_eq!(txs[0].amount, Credits::from(-50));

        let notes = engine.list_notifications(carol.id).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("penalty"));
        assert!(notes[0].message.contains("debited"));
    }

    #[test]
    fn test_admin_adjust_unknown_target_fails_without_effect() {
        let mut engine = engine();
        let admin = engine
            .create_admin("HQ", "hq@example.com", "999999", Credits::ZERO)
            .unwrap();

        let err = engine
            .admin_adjust_balance(admin.id, Uuid::new_v4(), Credits::from(10), "oops")
            .unwrap_err();

        assert!(matches!(err, LedgerError::UserNotFound(_)));
        assert!(engine.list_all_transactions().unwrap().is_empty());
    }

    #[test]
    fn test_create_user_normalizes_and_defaults_pin() {
        let mut engine = engine();
        let user = engine
            .create_user(NewUser {
                username: "  alice ".to_string(),
                email: " Alice@Example.COM ".to_string(),
                pin: String::new(),
                role: Role::Player,
                starting_balance: Credits::from(500),
                can_create_match: false,
            })
            .unwrap();

        assert_eq!(user.username, "ALICE");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.pin, "000000");
        assert_eq!(user.balance, Credits::from(500));
    }

    #[test]
    fn test_create_user_rejects_malformed_pin() {
        let mut engine = engine();
        let err = engine
            .create_user(NewUser {
                username: "ALICE".to_string(),
                email: "alice@example.com".to_string(),
                pin: "12ab".to_string(),
                role: Role::Player,
                starting_balance: Credits::ZERO,
                can_create_match: false,
            })
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidPin));
    }

    #[test]
    fn test_soft_delete_hides_user_from_default_listing() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);
        new_player(&mut engine, "BOB", 0);

        engine.soft_delete_user(alice.id).unwrap();

        assert_eq!(engine.list_users(false).unwrap().len(), 1);
        assert_eq!(engine.list_users(true).unwrap().len(), 2);
        // Row and balance survive the soft delete.
        assert!(engine.get_user(alice.id).unwrap().unwrap().is_deleted);
    }

    #[test]
    fn test_authenticate_checks_credentials_and_account_state() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);

        let ok = engine.authenticate(" ALICE@example.com ", "123456").unwrap();
        assert_eq!(ok.id, alice.id);

        assert!(matches!(
            engine.authenticate("alice@example.com", "654321"),
            Err(LedgerError::InvalidCredentials)
        ));

        engine
            .set_user_fields(
                alice.id,
                UserUpdate {
                    is_blocked: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(matches!(
            engine.authenticate("alice@example.com", "123456"),
            Err(LedgerError::AccountBlocked)
        ));

        engine.soft_delete_user(alice.id).unwrap();
        assert!(matches!(
            engine.authenticate("alice@example.com", "123456"),
            Err(LedgerError::AccountDeleted)
        ));
    }

    #[test]
    fn test_reset_pin_validates_and_notifies() {
        let mut engine = engine();
        let alice = new_player(&mut engine, "ALICE", 0);

        assert!(matches!(
            engine.reset_pin(alice.id, "12"),
            Err(LedgerError::InvalidPin)
        ));

        engine.reset_pin(alice.id, "777777").unwrap();
        assert_eq!(engine.get_user(alice.id).unwrap().unwrap().pin, "777777");

        let notes = engine.list_notifications(alice.id).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("PIN"));
    }

    #[test]
    fn test_transaction_listings_are_newest_first() {
        let mut engine = engine();
        let admin = engine
            .create_admin("HQ", "hq@example.com", "999999", Credits::ZERO)
            .unwrap();
        let carol = new_player(&mut engine, "CAROL", 0);

        engine
            .admin_adjust_balance(admin.id, carol.id, Credits::from(10), "first")
            .unwrap();
        engine
            .admin_adjust_balance(admin.id, carol.id, Credits::from(20), "second")
            .unwrap();

        let txs = engine.list_transactions(carol.id).unwrap();
        assert_eq!(txs[0].description, "Admin override: second");
        assert_eq!(txs[1].description, "Admin override: first");
    }

    #[test]
    fn test_notification_failure_never_blocks_the_ledger_write() {
        // Store whose notification table is broken; the ledger write must
        // still land.
        struct NoNotes(MemoryStore);

        impl Store for NoNotes {
            fn list_users(&self) -> crate::error::Result<Vec<User>> {
                self.0.list_users()
            }
            fn get_user(&self, id: Uuid) -> crate::error::Result<Option<User>> {
                self.0.get_user(id)
            }
            fn insert_user(&mut self, user: User) -> crate::error::Result<()> {
                self.0.insert_user(user)
            }
            fn update_user(&mut self, user: User) -> crate::error::Result<()> {
                self.0.update_user(user)
            }
            fn list_matches(&self) -> crate::error::Result<Vec<Match>> {
                self.0.list_matches()
            }
            fn get_match(&self, id: Uuid) -> crate::error::Result<Option<Match>> {
                self.0.get_match(id)
            }
            fn insert_match(&mut self, m: Match) -> crate::error::Result<()> {
                self.0.insert_match(m)
            }
            fn update_match(&mut self, m: Match) -> crate::error::Result<()> {
                self.0.update_match(m)
            }
            fn apply_entry(&mut self, tx: Transaction) -> crate::error::Result<()> {
                self.0.apply_entry(tx)
            }
            fn transactions_for(&self, user_id: Uuid) -> crate::error::Result<Vec<Transaction>> {
                self.0.transactions_for(user_id)
            }
            fn all_transactions(&self) -> crate::error::Result<Vec<Transaction>> {
                self.0.all_transactions()
            }
            fn append_notification(&mut self, _note: Notification) -> crate::error::Result<()> {
                Err(LedgerError::Store("notification table offline".to_string()))
            }
            fn notifications_for(&self, user_id: Uuid) -> crate::error::Result<Vec<Notification>> {
                self.0.notifications_for(user_id)
            }
            fn mark_all_read(&mut self, user_id: Uuid) -> crate::error::Result<()> {
                self.0.mark_all_read(user_id)
            }
        }

        let mut engine = LedgerEngine::new(NoNotes(MemoryStore::new()));
        let admin = engine
            .create_admin("HQ", "hq@example.com", "999999", Credits::ZERO)
            .unwrap();
        let carol = engine
            .create_user(NewUser {
                username: "CAROL".to_string(),
                email: "carol@example.com".to_string(),
                pin: "123456".to_string(),
                role: Role::Player,
                starting_balance: Credits::ZERO,
                can_create_match: false,
            })
            .unwrap();

        engine
            .admin_adjust_balance(admin.id, carol.id, Credits::from(25), "bonus")
            .unwrap();

        assert_eq!(
            engine.get_user(carol.id).unwrap().unwrap().balance,
            Credits::from(25)
        );
        assert_eq!(engine.list_transactions(carol.id).unwrap().len(), 1);
    }
}
