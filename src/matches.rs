//! Match model: two staked rosters and a terminal settlement state.
//!
//! State machine: `UNDECIDED --settle--> SETTLED`. There is no reopen or
//! cancel; once settled, `winning_team` and `status` never change.

use crate::credits::Credits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which roster a player belongs to / which roster won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// The opposing roster.
    pub fn other(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::A => write!(f, "A"),
            Team::B => write!(f, "B"),
        }
    }
}

/// Settlement state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Undecided,
    Settled,
}

/// A user's entry on a match roster.
///
/// The username is denormalized for display so roster listings do not need
/// a user lookup. `paid` is meaningful only after settlement and only on
/// the losing roster; it is `false` at creation and stays `false` for
/// winners for the match's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPlayer {
    pub user_id: Uuid,
    pub username: String,
    /// Positive by convention; not validated at creation.
    pub stake: Credits,
    pub paid: bool,
}

impl MatchPlayer {
    pub fn new(user_id: Uuid, username: impl Into<String>, stake: Credits) -> Self {
        MatchPlayer {
            user_id,
            username: username.into(),
            stake,
            paid: false,
        }
    }
}

/// A peer-wagered match between two rosters.
///
/// Owns its roster entries; players are embedded, not referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub name: String,
    pub team_a: Vec<MatchPlayer>,
    pub team_b: Vec<MatchPlayer>,
    pub status: MatchStatus,
    pub winning_team: Option<Team>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Creates an undecided match with the given rosters.
    pub fn new(name: impl Into<String>, team_a: Vec<MatchPlayer>, team_b: Vec<MatchPlayer>) -> Self {
        Match {
            id: Uuid::new_v4(),
            name: name.into(),
            team_a,
            team_b,
            status: MatchStatus::Undecided,
            winning_team: None,
            created_at: Utc::now(),
        }
    }

    /// The roster for a given team tag.
    pub fn roster(&self, team: Team) -> &[MatchPlayer] {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    /// Mutable roster access, used when flipping a loser's `paid` flag.
    pub fn roster_mut(&mut self, team: Team) -> &mut Vec<MatchPlayer> {
        match team {
            Team::A => &mut self.team_a,
            Team::B => &mut self.team_b,
        }
    }

    /// All participants across both rosters, Team A first.
    pub fn participants(&self) -> impl Iterator<Item = &MatchPlayer> {
        self.team_a.iter().chain(self.team_b.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, stake: i64) -> MatchPlayer {
        MatchPlayer::new(Uuid::new_v4(), name, Credits::from(stake))
    }

    #[test]
    fn test_new_match_is_undecided_with_unpaid_players() {
        let m = Match::new("DERBY", vec![player("ALICE", 100)], vec![player("BOB", 100)]);

        assert_eq!(m.status, MatchStatus::Undecided);
        assert!(m.winning_team.is_none());
        assert!(m.participants().all(|p| !p.paid));
    }

    #[test]
    fn test_roster_lookup_by_team() {
        let m = Match::new("DERBY", vec![player("ALICE", 100)], vec![player("BOB", 50)]);

        assert_eq!(m.roster(Team::A)[0].username, "ALICE");
        assert_eq!(m.roster(Team::B)[0].username, "BOB");
        assert_eq!(Team::A.other(), Team::B);
        assert_eq!(Team::B.other(), Team::A);
    }

    #[test]
    fn test_participants_iterates_both_rosters_in_order() {
        let m = Match::new(
            "DERBY",
            vec![player("ALICE", 100), player("CAROL", 20)],
            vec![player("BOB", 100)],
        );

        let names: Vec<_> = m.participants().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["ALICE", "CAROL", "BOB"]);
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::Undecided).unwrap(),
            "\"UNDECIDED\""
        );
        assert_eq!(
            serde_json::to_string(&MatchStatus::Settled).unwrap(),
            "\"SETTLED\""
        );
    }
}
