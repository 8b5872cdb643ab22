use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type PlayerId = i64;
pub type TournamentId = i64;

/// A player's record within one tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
	pub id: PlayerId,
	pub name: String,
	pub wins: u32,
	pub matches: u32,
}

/// Two players drawn from adjacent standings positions, higher rank first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
	pub first: PlayerRecord,
	pub second: PlayerRecord,
}

impl Pairing {
	pub fn contains(&self, id: PlayerId) -> bool {
		self.first.id == id || self.second.id == id
	}
}

/// Flat row used when writing pairings as CSV.
#[derive(Debug, Serialize)]
pub struct PairingRow<'a> {
	pub id1: PlayerId,
	pub name1: &'a str,
	pub id2: PlayerId,
	pub name2: &'a str,
}

impl<'a> From<&'a Pairing> for PairingRow<'a> {
	fn from(pairing: &'a Pairing) -> Self {
		Self {
			id1: pairing.first.id,
			name1: &pairing.first.name,
			id2: pairing.second.id,
			name2: &pairing.second.name,
		}
	}
}

/// A registered player with counters across every tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
	pub id: PlayerId,
	pub name: String,
	pub total_wins: u32,
	pub total_matches: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tournament {
	pub id: TournamentId,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
	pub id: i64,
	pub tournament_id: TournamentId,
	pub winner_id: PlayerId,
	pub loser_id: PlayerId,
	pub played_at: NaiveDateTime,
}

/// One line of a match results file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchRow {
	pub winner: PlayerId,
	pub loser: PlayerId,
}
