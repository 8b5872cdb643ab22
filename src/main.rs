mod cli;

use std::{
	fs::File,
	io::{self, Write},
	path::Path,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use swissbook::{next_round, report, standings, Config, SqliteStore, Store};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "swissbook.toml";

fn main() -> Result<()> {
	let cli = Cli::parse();

	let mut config = Config::load(cli.config.as_deref(), Path::new(DEFAULT_CONFIG))
		.context("could not load configuration")?;
	if let Some(database) = cli.database.clone() {
		config.database = database;
	}
	if let Some(level) = cli.log_level.clone() {
		config.log_level = level;
	}

	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(&config.log_level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();

	let mut store = SqliteStore::open(&config)
		.with_context(|| format!("could not open {}", config.database.display()))?;

	let mut out = match cli.output.as_deref() {
		Some(path) => Box::new(
			File::create(path).with_context(|| format!("could not create {}", path.display()))?,
		) as Box<dyn Write>,
		None => Box::new(io::stdout()) as Box<dyn Write>,
	};

	run(cli.command, &mut store, &mut out)?;
	out.flush()?;

	Ok(())
}

fn run(command: Commands, store: &mut SqliteStore, out: &mut dyn Write) -> Result<()> {
	match command {
		Commands::NewTournament { name } => {
			let id = store.create_tournament(&name)?;
			writeln!(out, "{id}")?;
		}
		Commands::NewPlayer { name } => {
			let id = store.create_player(&name)?;
			writeln!(out, "{id}")?;
		}
		Commands::Enter { tournament, player } => {
			store.enter_player(tournament, player)?;
		}
		Commands::Report {
			tournament,
			winner,
			loser,
		} => {
			store.record_match(winner, loser, tournament)?;
		}
		Commands::Load {
			tournament,
			matches,
		} => {
			let file = File::open(&matches)
				.with_context(|| format!("could not open {}", matches.display()))?;
			let recorded = report::load_matches(store, tournament, file)
				.with_context(|| format!("loading {}", matches.display()))?;
			writeln!(out, "{recorded}")?;
		}
		Commands::Standings { tournament, csv } => {
			let standings = standings(&*store, tournament)?;
			if csv {
				report::write_standings_csv(&mut *out, &standings)?;
			} else {
				out.write_all(report::standings_string(&standings).as_bytes())?;
			}
		}
		Commands::Pairings { tournament, csv } => {
			let pairings = next_round(&*store, tournament)?;
			if csv {
				report::write_pairings_csv(&mut *out, &pairings)?;
			} else {
				out.write_all(report::pairings_string(&pairings).as_bytes())?;
			}
		}
		Commands::Matches { tournament } => {
			let matches = store.fetch_matches(tournament)?;
			out.write_all(report::matches_string(&matches).as_bytes())?;
		}
		Commands::CountPlayers => {
			writeln!(out, "{}", store.count_players()?)?;
		}
		Commands::Reset {
			matches,
			players,
			tournaments,
		} => {
			let all = !(matches || players || tournaments);
			if all || matches {
				store.clear_matches()?;
			}
			if all || players {
				store.clear_players()?;
			}
			if all || tournaments {
				store.clear_tournaments()?;
			}
		}
	}

	Ok(())
}
