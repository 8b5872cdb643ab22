use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Swiss-system tournament bookkeeping", long_about = None)]
pub struct Cli {
	/// Config file (defaults to ./swissbook.toml when present)
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Database file, overriding the config
	#[arg(short, long, value_name = "FILE")]
	pub database: Option<PathBuf>,

	/// Log level, overriding the config
	#[arg(long)]
	pub log_level: Option<String>,

	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	NewTournament {
		name: String,
	},
	NewPlayer {
		name: String,
	},
	Enter {
		tournament: i64,
		player: i64,
	},
	Report {
		tournament: i64,
		winner: i64,
		loser: i64,
	},
	/// Record every `winner,loser` row of a CSV file
	Load {
		tournament: i64,
		#[arg(value_name = "FILE")]
		matches: PathBuf,
	},
	Standings {
		tournament: i64,
		#[arg(long)]
		csv: bool,
	},
	Pairings {
		tournament: i64,
		#[arg(long)]
		csv: bool,
	},
	Matches {
		tournament: i64,
	},
	CountPlayers,
	/// Delete records; with no flags, deletes everything
	Reset {
		#[arg(long)]
		matches: bool,
		#[arg(long)]
		players: bool,
		#[arg(long)]
		tournaments: bool,
	},
}
