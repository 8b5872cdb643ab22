//! Swiss-system tournament bookkeeping.
//!
//! Tournaments, players and match results live in a [`store::Store`]; the
//! [`pairing`] module ranks a tournament's standings by wins and pairs
//! neighbouring players for the next round.

pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod pairing;
pub mod report;
pub mod store;

pub use config::Config;
pub use data::{MatchRecord, Pairing, Player, PlayerId, PlayerRecord, Tournament, TournamentId};
pub use error::{EntityKind, TournamentError, TournamentResult};
pub use pairing::{next_round, rank, standings, swiss_pairings};
pub use store::{SqliteStore, Store};
