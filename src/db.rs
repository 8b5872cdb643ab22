use rusqlite::{Connection, Result};

pub fn create_schema(conn: &mut Connection) -> Result<()> {
	conn.pragma_update(None, "foreign_keys", "ON")?;

	let tx = conn.transaction()?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS tournaments (
			id   INTEGER PRIMARY KEY AUTOINCREMENT,
			name TEXT    NOT NULL
		);",
		[],
	)?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS players (
			id            INTEGER PRIMARY KEY AUTOINCREMENT,
			name          TEXT    NOT NULL,
			total_wins    INTEGER NOT NULL DEFAULT 0,
			total_matches INTEGER NOT NULL DEFAULT 0
		);",
		[],
	)?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS entries (
			player_id     INTEGER REFERENCES players (id)
								  NOT NULL,
			tournament_id INTEGER REFERENCES tournaments (id)
								  NOT NULL,
			wins          INTEGER NOT NULL DEFAULT 0,
			matches       INTEGER NOT NULL DEFAULT 0,
			UNIQUE (player_id, tournament_id),
			CHECK (wins <= matches)
		);",
		[],
	)?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS matches (
			id            INTEGER PRIMARY KEY AUTOINCREMENT,
			tournament_id INTEGER REFERENCES tournaments (id)
								  NOT NULL,
			winner_id     INTEGER REFERENCES players (id)
								  NOT NULL,
			loser_id      INTEGER REFERENCES players (id)
								  NOT NULL,
			played_at             NOT NULL
		);",
		[],
	)?;

	tx.commit()
}
