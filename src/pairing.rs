//! Standings and Swiss pairings.
//!
//! Standings rank players by wins alone. Players tied on wins keep the order
//! the store returned them in; no further tie-break is applied.

use tracing::debug;

use crate::data::{Pairing, PlayerRecord, TournamentId};
use crate::error::{TournamentError, TournamentResult};
use crate::store::Store;

/// Sorts records by wins, highest first. The sort is stable.
pub fn rank(mut records: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
	records.sort_by(|a, b| b.wins.cmp(&a.wins));
	records
}

pub fn standings<S: Store + ?Sized>(
	store: &S,
	tournament: TournamentId,
) -> TournamentResult<Vec<PlayerRecord>> {
	Ok(rank(store.fetch_standings(tournament)?))
}

/// Pairs each player with their neighbour in `standings`: ranks 0 and 1,
/// then 2 and 3, and so on.
///
/// `standings` must already be ranked; it is not re-sorted here. An odd
/// number of players is rejected rather than leaving one out.
pub fn swiss_pairings(standings: &[PlayerRecord]) -> TournamentResult<Vec<Pairing>> {
	if standings.len() % 2 != 0 {
		return Err(TournamentError::OddPlayerCount(standings.len()));
	}

	let pairings = standings
		.chunks_exact(2)
		.map(|pair| Pairing {
			first: pair[0].clone(),
			second: pair[1].clone(),
		})
		.collect::<Vec<_>>();

	debug!(pairings = pairings.len(), "paired standings");
	Ok(pairings)
}

/// Pairings for the next round of `tournament`, from its current standings.
pub fn next_round<S: Store + ?Sized>(
	store: &S,
	tournament: TournamentId,
) -> TournamentResult<Vec<Pairing>> {
	swiss_pairings(&standings(store, tournament)?)
}
