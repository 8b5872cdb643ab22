use std::io::{Read, Write};

use tracing::info;

use crate::data::{MatchRecord, MatchRow, Pairing, PairingRow, PlayerRecord, TournamentId};
use crate::error::TournamentResult;
use crate::store::Store;

pub fn standings_string(standings: &[PlayerRecord]) -> String {
	let mut string = String::from("# Standings\n```");

	for (rank, record) in standings.iter().enumerate() {
		let PlayerRecord {
			id,
			name,
			wins,
			matches,
		} = record;
		string.push_str(&format!(
			"\n{}: {name} (#{id}) {wins}/{matches}",
			rank + 1
		));
	}

	string.push_str("\n```\n");
	string
}

pub fn pairings_string(pairings: &[Pairing]) -> String {
	let mut string = String::from("# Pairings\n```");

	for (table, pairing) in pairings.iter().enumerate() {
		string.push_str(&format!(
			"\n{}: {} (#{}) vs {} (#{})",
			table + 1,
			pairing.first.name,
			pairing.first.id,
			pairing.second.name,
			pairing.second.id
		));
	}

	string.push_str("\n```\n");
	string
}

pub fn matches_string(matches: &[MatchRecord]) -> String {
	let mut string = String::from("# Matches\n```");

	for record in matches {
		string.push_str(&format!(
			"\n{}: #{} beat #{}",
			record.played_at.format("%Y-%m-%d %H:%M:%S"),
			record.winner_id,
			record.loser_id
		));
	}

	string.push_str("\n```\n");
	string
}

pub fn write_standings_csv<W: Write>(out: W, standings: &[PlayerRecord]) -> TournamentResult<()> {
	let mut writer = csv::Writer::from_writer(out);
	for record in standings {
		writer.serialize(record)?;
	}
	writer.flush().map_err(csv::Error::from)?;
	Ok(())
}

pub fn write_pairings_csv<W: Write>(out: W, pairings: &[Pairing]) -> TournamentResult<()> {
	let mut writer = csv::Writer::from_writer(out);
	for pairing in pairings {
		writer.serialize(PairingRow::from(pairing))?;
	}
	writer.flush().map_err(csv::Error::from)?;
	Ok(())
}

/// Records every `winner,loser` row of `input` against `tournament`.
///
/// Each row is its own match; a failing row stops the load and leaves the
/// rows before it recorded. Returns the number of matches recorded.
pub fn load_matches<S: Store + ?Sized, R: Read>(
	store: &mut S,
	tournament: TournamentId,
	input: R,
) -> TournamentResult<usize> {
	let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
	let mut recorded = 0;

	for row in reader.deserialize::<MatchRow>() {
		let MatchRow { winner, loser } = row?;
		store.record_match(winner, loser, tournament)?;
		recorded += 1;
	}

	info!(tournament, recorded, "loaded matches");
	Ok(recorded)
}
