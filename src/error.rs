use thiserror::Error;

use crate::data::{PlayerId, TournamentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
	Tournament,
	Player,
}

impl std::fmt::Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EntityKind::Tournament => f.write_str("tournament"),
			EntityKind::Player => f.write_str("player"),
		}
	}
}

#[derive(Debug, Error)]
pub enum TournamentError {
	/// Connection, transport or busy-timeout failure from the store.
	#[error("store unavailable: {0}")]
	StoreUnavailable(#[from] rusqlite::Error),

	#[error("unknown {kind} {id}")]
	UnknownEntity { kind: EntityKind, id: i64 },

	/// Pairing was requested on a snapshot that cannot be split into pairs.
	#[error("cannot pair an odd number of players ({0})")]
	OddPlayerCount(usize),

	#[error("invalid match: {0}")]
	InvalidMatch(String),

	#[error("player {player} is already entered in tournament {tournament}")]
	AlreadyEntered {
		player: PlayerId,
		tournament: TournamentId,
	},

	#[error("could not load config: {0}")]
	Config(String),

	#[error("could not import matches: {0}")]
	Import(#[from] csv::Error),
}

impl TournamentError {
	pub fn unknown_player(id: PlayerId) -> Self {
		TournamentError::UnknownEntity {
			kind: EntityKind::Player,
			id,
		}
	}

	pub fn unknown_tournament(id: TournamentId) -> Self {
		TournamentError::UnknownEntity {
			kind: EntityKind::Tournament,
			id,
		}
	}
}

pub type TournamentResult<T> = Result<T, TournamentError>;
