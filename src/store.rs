//! Durable tournament records.
//!
//! [`Store`] is the contract the pairing engine and the command line consume.
//! [`SqliteStore`] implements it over a single owned `rusqlite` connection;
//! every mutation runs in its own transaction, and every value reaches SQL as
//! a bound parameter.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::{MatchRecord, Player, PlayerId, PlayerRecord, Tournament, TournamentId};
use crate::db::create_schema;
use crate::error::{TournamentError, TournamentResult};

pub trait Store {
	fn create_tournament(&mut self, name: &str) -> TournamentResult<TournamentId>;

	fn create_player(&mut self, name: &str) -> TournamentResult<PlayerId>;

	fn enter_player(&mut self, tournament: TournamentId, player: PlayerId) -> TournamentResult<()>;

	/// Every entry of `tournament`, in the order the players were entered.
	///
	/// An unknown tournament yields an empty list. Ranking is left to
	/// [`crate::pairing::standings`].
	fn fetch_standings(&self, tournament: TournamentId) -> TournamentResult<Vec<PlayerRecord>>;

	/// Applies one match result to both players' tournament and global
	/// counters and appends a match record, all or nothing.
	///
	/// Not idempotent: reporting the same result twice counts it twice.
	fn record_match(
		&mut self,
		winner: PlayerId,
		loser: PlayerId,
		tournament: TournamentId,
	) -> TournamentResult<()>;

	fn clear_matches(&mut self) -> TournamentResult<()>;

	/// Removes every player along with their tournament entries.
	fn clear_players(&mut self) -> TournamentResult<()>;

	fn clear_tournaments(&mut self) -> TournamentResult<()>;

	fn count_players(&self) -> TournamentResult<i64>;

	fn fetch_player(&self, id: PlayerId) -> TournamentResult<Option<Player>>;

	fn fetch_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

	fn fetch_matches(&self, tournament: TournamentId) -> TournamentResult<Vec<MatchRecord>>;
}

pub struct SqliteStore {
	conn: Connection,
}

impl SqliteStore {
	pub fn open(config: &Config) -> TournamentResult<Self> {
		debug!(database = %config.database.display(), "opening store");
		let conn = Connection::open(&config.database)?;
		Self::with_connection(conn, config.busy_timeout())
	}

	pub fn open_path(path: impl AsRef<Path>) -> TournamentResult<Self> {
		let conn = Connection::open(path)?;
		Self::with_connection(conn, Config::default().busy_timeout())
	}

	pub fn open_in_memory() -> TournamentResult<Self> {
		let conn = Connection::open_in_memory()?;
		Self::with_connection(conn, Config::default().busy_timeout())
	}

	fn with_connection(mut conn: Connection, busy_timeout: Duration) -> TournamentResult<Self> {
		conn.busy_timeout(busy_timeout)?;
		create_schema(&mut conn)?;
		Ok(Self { conn })
	}
}

enum Table {
	Tournaments,
	Players,
}

fn exists(conn: &Connection, table: Table, id: i64) -> TournamentResult<bool> {
	let sql = match table {
		Table::Tournaments => "SELECT 1 FROM tournaments WHERE id = ?1;",
		Table::Players => "SELECT 1 FROM players WHERE id = ?1;",
	};
	let found = conn
		.query_row(sql, [id], |_| Ok(()))
		.optional()?
		.is_some();
	Ok(found)
}

impl Store for SqliteStore {
	fn create_tournament(&mut self, name: &str) -> TournamentResult<TournamentId> {
		let tx = self.conn.transaction()?;
		tx.execute("INSERT INTO tournaments (name) VALUES (?1);", [name])?;
		let id = tx.last_insert_rowid();
		tx.commit()?;

		info!(tournament = id, name, "registered tournament");
		Ok(id)
	}

	fn create_player(&mut self, name: &str) -> TournamentResult<PlayerId> {
		let tx = self.conn.transaction()?;
		tx.execute("INSERT INTO players (name) VALUES (?1);", [name])?;
		let id = tx.last_insert_rowid();
		tx.commit()?;

		info!(player = id, name, "registered player");
		Ok(id)
	}

	fn enter_player(&mut self, tournament: TournamentId, player: PlayerId) -> TournamentResult<()> {
		// Checks and insert run under one write lock.
		let tx = self
			.conn
			.transaction_with_behavior(TransactionBehavior::Immediate)?;
		if !exists(&tx, Table::Tournaments, tournament)? {
			return Err(TournamentError::unknown_tournament(tournament));
		}
		if !exists(&tx, Table::Players, player)? {
			return Err(TournamentError::unknown_player(player));
		}

		let inserted = tx.execute(
			"INSERT OR IGNORE INTO entries (player_id, tournament_id) VALUES (?1, ?2);",
			params![player, tournament],
		)?;
		if inserted == 0 {
			return Err(TournamentError::AlreadyEntered { player, tournament });
		}
		tx.commit()?;

		info!(tournament, player, "entered player");
		Ok(())
	}

	fn fetch_standings(&self, tournament: TournamentId) -> TournamentResult<Vec<PlayerRecord>> {
		let mut stmt = self.conn.prepare(
			"SELECT players.id, players.name, entries.wins, entries.matches
			 FROM entries JOIN players ON entries.player_id = players.id
			 WHERE entries.tournament_id = ?1
			 ORDER BY entries.rowid;",
		)?;
		let records = stmt
			.query_map([tournament], |row| {
				Ok(PlayerRecord {
					id: row.get(0)?,
					name: row.get(1)?,
					wins: row.get(2)?,
					matches: row.get(3)?,
				})
			})?
			.collect::<Result<Vec<_>, _>>()?;

		debug!(tournament, players = records.len(), "fetched standings");
		Ok(records)
	}

	fn record_match(
		&mut self,
		winner: PlayerId,
		loser: PlayerId,
		tournament: TournamentId,
	) -> TournamentResult<()> {
		if winner == loser {
			warn!(tournament, player = winner, "rejected match against self");
			return Err(TournamentError::InvalidMatch(format!(
				"player {winner} cannot play against themselves"
			)));
		}

		let tx = self.conn.transaction()?;

		let updated = tx.execute(
			"UPDATE entries SET wins = wins + 1, matches = matches + 1
			 WHERE player_id = ?1 AND tournament_id = ?2;",
			params![winner, tournament],
		)?;
		if updated == 0 {
			warn!(tournament, player = winner, "winner is not entered");
			return Err(TournamentError::unknown_player(winner));
		}

		let updated = tx.execute(
			"UPDATE entries SET matches = matches + 1
			 WHERE player_id = ?1 AND tournament_id = ?2;",
			params![loser, tournament],
		)?;
		if updated == 0 {
			warn!(tournament, player = loser, "loser is not entered");
			return Err(TournamentError::unknown_player(loser));
		}

		tx.execute(
			"UPDATE players SET total_wins = total_wins + 1, total_matches = total_matches + 1
			 WHERE id = ?1;",
			[winner],
		)?;
		tx.execute(
			"UPDATE players SET total_matches = total_matches + 1 WHERE id = ?1;",
			[loser],
		)?;
		tx.execute(
			"INSERT INTO matches (tournament_id, winner_id, loser_id, played_at)
			 VALUES (?1, ?2, ?3, ?4);",
			params![tournament, winner, loser, Utc::now().naive_utc()],
		)?;

		tx.commit()?;

		info!(tournament, winner, loser, "recorded match");
		Ok(())
	}

	fn clear_matches(&mut self) -> TournamentResult<()> {
		let tx = self.conn.transaction()?;
		let removed = tx.execute("DELETE FROM matches;", [])?;
		tx.commit()?;

		info!(removed, "cleared matches");
		Ok(())
	}

	fn clear_players(&mut self) -> TournamentResult<()> {
		let tx = self.conn.transaction()?;
		tx.execute("DELETE FROM entries;", [])?;
		let removed = tx.execute("DELETE FROM players;", [])?;
		tx.commit()?;

		info!(removed, "cleared players");
		Ok(())
	}

	fn clear_tournaments(&mut self) -> TournamentResult<()> {
		let tx = self.conn.transaction()?;
		let removed = tx.execute("DELETE FROM tournaments;", [])?;
		tx.commit()?;

		info!(removed, "cleared tournaments");
		Ok(())
	}

	fn count_players(&self) -> TournamentResult<i64> {
		let count = self
			.conn
			.query_row("SELECT COUNT(*) FROM players;", [], |row| row.get(0))?;
		Ok(count)
	}

	fn fetch_player(&self, id: PlayerId) -> TournamentResult<Option<Player>> {
		let player = self
			.conn
			.query_row(
				"SELECT id, name, total_wins, total_matches FROM players WHERE id = ?1;",
				[id],
				|row| {
					Ok(Player {
						id: row.get(0)?,
						name: row.get(1)?,
						total_wins: row.get(2)?,
						total_matches: row.get(3)?,
					})
				},
			)
			.optional()?;
		Ok(player)
	}

	fn fetch_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
		let tournament = self
			.conn
			.query_row(
				"SELECT id, name FROM tournaments WHERE id = ?1;",
				[id],
				|row| {
					Ok(Tournament {
						id: row.get(0)?,
						name: row.get(1)?,
					})
				},
			)
			.optional()?;
		Ok(tournament)
	}

	fn fetch_matches(&self, tournament: TournamentId) -> TournamentResult<Vec<MatchRecord>> {
		let mut stmt = self.conn.prepare(
			"SELECT id, tournament_id, winner_id, loser_id, played_at
			 FROM matches WHERE tournament_id = ?1 ORDER BY id;",
		)?;
		let matches = stmt
			.query_map([tournament], |row| {
				Ok(MatchRecord {
					id: row.get(0)?,
					tournament_id: row.get(1)?,
					winner_id: row.get(2)?,
					loser_id: row.get(3)?,
					played_at: row.get(4)?,
				})
			})?
			.collect::<Result<Vec<_>, _>>()?;
		Ok(matches)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::error::EntityKind;

	struct Fixture {
		store: SqliteStore,
		tournament: TournamentId,
		alice: PlayerId,
		bob: PlayerId,
	}

	fn fixture() -> Fixture {
		let mut store = SqliteStore::open_in_memory().unwrap();
		let tournament = store.create_tournament("Spring Open").unwrap();
		let alice = store.create_player("Alice").unwrap();
		let bob = store.create_player("Bob").unwrap();
		store.enter_player(tournament, alice).unwrap();
		store.enter_player(tournament, bob).unwrap();
		Fixture {
			store,
			tournament,
			alice,
			bob,
		}
	}

	fn record_of(store: &SqliteStore, tournament: TournamentId, id: PlayerId) -> PlayerRecord {
		store
			.fetch_standings(tournament)
			.unwrap()
			.into_iter()
			.find(|r| r.id == id)
			.unwrap()
	}

	#[test]
	fn new_entries_start_at_zero() {
		let f = fixture();
		let standings = f.store.fetch_standings(f.tournament).unwrap();

		assert_eq!(
			standings,
			vec![
				PlayerRecord {
					id: f.alice,
					name: "Alice".to_string(),
					wins: 0,
					matches: 0,
				},
				PlayerRecord {
					id: f.bob,
					name: "Bob".to_string(),
					wins: 0,
					matches: 0,
				},
			]
		);
	}

	#[test]
	fn unknown_tournament_has_empty_standings() {
		let f = fixture();
		assert!(f.store.fetch_standings(f.tournament + 100).unwrap().is_empty());
	}

	#[test]
	fn record_match_updates_both_players() {
		let mut f = fixture();
		f.store.record_match(f.alice, f.bob, f.tournament).unwrap();

		let winner = record_of(&f.store, f.tournament, f.alice);
		let loser = record_of(&f.store, f.tournament, f.bob);
		assert_eq!((winner.wins, winner.matches), (1, 1));
		assert_eq!((loser.wins, loser.matches), (0, 1));

		let winner = f.store.fetch_player(f.alice).unwrap().unwrap();
		let loser = f.store.fetch_player(f.bob).unwrap().unwrap();
		assert_eq!((winner.total_wins, winner.total_matches), (1, 1));
		assert_eq!((loser.total_wins, loser.total_matches), (0, 1));

		let matches = f.store.fetch_matches(f.tournament).unwrap();
		assert_eq!(matches.len(), 1);
		assert_eq!(matches[0].winner_id, f.alice);
		assert_eq!(matches[0].loser_id, f.bob);
		assert_eq!(matches[0].tournament_id, f.tournament);
	}

	#[test]
	fn recording_twice_counts_twice() {
		let mut f = fixture();
		f.store.record_match(f.alice, f.bob, f.tournament).unwrap();
		f.store.record_match(f.alice, f.bob, f.tournament).unwrap();

		let winner = record_of(&f.store, f.tournament, f.alice);
		assert_eq!(winner.wins, 2);
		assert_eq!(winner.matches, 2);
		assert_eq!(f.store.fetch_matches(f.tournament).unwrap().len(), 2);
	}

	#[test]
	fn self_match_is_rejected_without_mutation() {
		let mut f = fixture();
		let before = f.store.fetch_standings(f.tournament).unwrap();

		let err = f
			.store
			.record_match(f.alice, f.alice, f.tournament)
			.unwrap_err();
		assert!(matches!(err, TournamentError::InvalidMatch(_)));

		assert_eq!(f.store.fetch_standings(f.tournament).unwrap(), before);
		assert!(f.store.fetch_matches(f.tournament).unwrap().is_empty());
	}

	#[test]
	fn unentered_loser_rolls_back_winner_update() {
		let mut f = fixture();
		let outsider = f.store.create_player("Carol").unwrap();

		let err = f
			.store
			.record_match(f.alice, outsider, f.tournament)
			.unwrap_err();
		assert!(matches!(
			err,
			TournamentError::UnknownEntity {
				kind: EntityKind::Player,
				id
			} if id == outsider
		));

		let alice = record_of(&f.store, f.tournament, f.alice);
		assert_eq!((alice.wins, alice.matches), (0, 0));
		let totals = f.store.fetch_player(f.alice).unwrap().unwrap();
		assert_eq!(totals.total_wins, 0);
		assert!(f.store.fetch_matches(f.tournament).unwrap().is_empty());
	}

	#[test]
	fn counters_are_scoped_per_tournament() {
		let mut f = fixture();
		let other = f.store.create_tournament("Autumn Open").unwrap();
		f.store.enter_player(other, f.alice).unwrap();
		f.store.enter_player(other, f.bob).unwrap();

		f.store.record_match(f.bob, f.alice, other).unwrap();
		f.store.record_match(f.alice, f.bob, f.tournament).unwrap();

		assert_eq!(record_of(&f.store, f.tournament, f.alice).wins, 1);
		assert_eq!(record_of(&f.store, other, f.alice).wins, 0);
		assert_eq!(record_of(&f.store, other, f.bob).wins, 1);

		let alice = f.store.fetch_player(f.alice).unwrap().unwrap();
		assert_eq!((alice.total_wins, alice.total_matches), (1, 2));
	}

	#[test]
	fn enter_player_validates_references() {
		let mut f = fixture();

		let err = f.store.enter_player(f.tournament + 100, f.alice).unwrap_err();
		assert!(matches!(
			err,
			TournamentError::UnknownEntity {
				kind: EntityKind::Tournament,
				..
			}
		));

		let err = f.store.enter_player(f.tournament, f.bob + 100).unwrap_err();
		assert!(matches!(
			err,
			TournamentError::UnknownEntity {
				kind: EntityKind::Player,
				..
			}
		));

		let err = f.store.enter_player(f.tournament, f.alice).unwrap_err();
		assert!(matches!(err, TournamentError::AlreadyEntered { .. }));
	}

	#[test]
	fn names_are_stored_verbatim() {
		let mut store = SqliteStore::open_in_memory().unwrap();
		let name = "Robert'); DROP TABLE players;--";
		let id = store.create_player(name).unwrap();

		assert_eq!(store.fetch_player(id).unwrap().unwrap().name, name);
		assert_eq!(store.count_players().unwrap(), 1);
	}

	#[test]
	fn clearing_in_dependency_order_empties_the_store() {
		let mut f = fixture();
		f.store.record_match(f.alice, f.bob, f.tournament).unwrap();
		assert_eq!(f.store.count_players().unwrap(), 2);

		f.store.clear_matches().unwrap();
		assert!(f.store.fetch_matches(f.tournament).unwrap().is_empty());

		f.store.clear_players().unwrap();
		assert_eq!(f.store.count_players().unwrap(), 0);
		assert!(f.store.fetch_standings(f.tournament).unwrap().is_empty());

		f.store.clear_tournaments().unwrap();
		assert_eq!(f.store.fetch_tournament(f.tournament).unwrap(), None);
	}

	#[test]
	fn clearing_players_with_recorded_matches_fails() {
		let mut f = fixture();
		f.store.record_match(f.alice, f.bob, f.tournament).unwrap();

		let err = f.store.clear_players().unwrap_err();
		assert!(matches!(err, TournamentError::StoreUnavailable(_)));
		assert_eq!(f.store.count_players().unwrap(), 2);
	}

	fn open_with_timeout(path: &Path, busy_timeout_ms: u64) -> SqliteStore {
		SqliteStore::open(&Config {
			database: path.to_path_buf(),
			busy_timeout_ms,
			..Config::default()
		})
		.unwrap()
	}

	#[test]
	fn locked_database_times_out_without_recording() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tournament.db");

		let mut holder = open_with_timeout(&path, 100);
		let tournament = holder.create_tournament("Locked Cup").unwrap();
		let alice = holder.create_player("Alice").unwrap();
		let bob = holder.create_player("Bob").unwrap();
		holder.enter_player(tournament, alice).unwrap();
		holder.enter_player(tournament, bob).unwrap();

		let mut waiter = open_with_timeout(&path, 100);
		holder.conn.execute_batch("BEGIN IMMEDIATE;").unwrap();

		let started = std::time::Instant::now();
		let err = waiter.record_match(alice, bob, tournament).unwrap_err();
		assert!(matches!(err, TournamentError::StoreUnavailable(_)));
		assert!(started.elapsed() < Duration::from_secs(5));

		holder.conn.execute_batch("ROLLBACK;").unwrap();

		let alice_record = record_of(&waiter, tournament, alice);
		let bob_record = record_of(&waiter, tournament, bob);
		assert_eq!((alice_record.wins, alice_record.matches), (0, 0));
		assert_eq!(bob_record.matches, 0);
		assert_eq!(waiter.fetch_player(alice).unwrap().unwrap().total_wins, 0);
		assert!(waiter.fetch_matches(tournament).unwrap().is_empty());
	}

	#[test]
	fn enter_player_checks_references_under_the_write_lock() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tournament.db");

		let mut writer = open_with_timeout(&path, 100);
		let tournament = writer.create_tournament("Late Entry").unwrap();
		let mut entrant = open_with_timeout(&path, 100);

		writer.conn.execute_batch("BEGIN IMMEDIATE;").unwrap();
		writer
			.conn
			.execute("INSERT INTO players (name) VALUES ('Erin');", [])
			.unwrap();
		let erin = writer.conn.last_insert_rowid();

		// The pending player must not be reported as unknown while the writer holds the lock.
		let err = entrant.enter_player(tournament, erin).unwrap_err();
		assert!(matches!(err, TournamentError::StoreUnavailable(_)));

		writer.conn.execute_batch("COMMIT;").unwrap();
		entrant.enter_player(tournament, erin).unwrap();
		assert_eq!(entrant.fetch_standings(tournament).unwrap().len(), 1);
	}

	#[test]
	fn store_persists_across_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tournament.db");

		let tournament = {
			let mut store = SqliteStore::open_path(&path).unwrap();
			let tournament = store.create_tournament("Club Night").unwrap();
			let player = store.create_player("Dana").unwrap();
			store.enter_player(tournament, player).unwrap();
			tournament
		};

		let store = SqliteStore::open_path(&path).unwrap();
		assert_eq!(
			store.fetch_tournament(tournament).unwrap().unwrap().name,
			"Club Night"
		);
		assert_eq!(store.fetch_standings(tournament).unwrap().len(), 1);
	}
}
