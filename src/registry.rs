//! Match registry: creation and lookup of matches and their rosters.

use crate::error::{LedgerError, Result};
use crate::matches::{Match, MatchPlayer};
use crate::notify;
use crate::store::Store;
use crate::engine::LedgerEngine;
use chrono::Utc;
use log::debug;
use uuid::Uuid;

impl<S: Store> LedgerEngine<S> {
    /// Creates an undecided match with the given rosters.
    ///
    /// The creator must be an admin or hold the match-creation permission.
    /// A blank name gets a time-based placeholder (collisions improbable,
    /// not prevented). Rosters are persisted exactly as given: stakes and
    /// roster membership are the caller's responsibility.
    pub fn create_match(
        &mut self,
        name: &str,
        team_a: Vec<MatchPlayer>,
        team_b: Vec<MatchPlayer>,
        creator_id: Uuid,
    ) -> Result<Match> {
        let authorized = self
            .store
            .get_user(creator_id)?
            .map(|c| c.may_create_match())
            .unwrap_or(false);
        if !authorized {
            return Err(LedgerError::Unauthorized(
                "match creation requires admin role or the match-creation permission".to_string(),
            ));
        }

        let trimmed = name.trim();
        let final_name = if trimmed.is_empty() {
            format!("ENGAGEMENT_{}", Utc::now().timestamp_millis())
        } else {
            trimmed.to_string()
        };

        let m = Match::new(final_name, team_a, team_b);
        self.store.insert_match(m.clone())?;
        debug!("Created match {} ({})", m.name, m.id);

        for p in m.participants() {
            notify::dispatch(
                &mut self.store,
                p.user_id,
                format!(
                    "New match assignment: you have been added to {}. Stake: {} credits.",
                    m.name, p.stake
                ),
            );
        }

        Ok(m)
    }

    /// All matches, newest first.
    pub fn list_matches(&self) -> Result<Vec<Match>> {
        let mut matches = self.store.list_matches()?;
        matches.reverse();
        Ok(matches)
    }

    /// Single-match lookup.
    pub fn get_match(&self, id: Uuid) -> Result<Option<Match>> {
        self.store.get_match(id)
    }
}
