//! Configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{TournamentError, TournamentResult};

/// Store and logging settings, read from an optional TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// SQLite database file
	#[serde(default = "default_database")]
	pub database: PathBuf,

	/// How long a statement waits on a locked database before failing
	#[serde(default = "default_busy_timeout_ms")]
	pub busy_timeout_ms: u64,

	/// Default log filter when `RUST_LOG` is unset
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

fn default_database() -> PathBuf {
	PathBuf::from("tournament.db")
}

fn default_busy_timeout_ms() -> u64 {
	5000
}

fn default_log_level() -> String {
	"info".to_string()
}

impl Default for Config {
	fn default() -> Self {
		Self {
			database: default_database(),
			busy_timeout_ms: default_busy_timeout_ms(),
			log_level: default_log_level(),
		}
	}
}

impl Config {
	pub fn from_toml(contents: &str) -> TournamentResult<Self> {
		toml::from_str(contents).map_err(|e| TournamentError::Config(e.to_string()))
	}

	pub fn from_file(path: &Path) -> TournamentResult<Self> {
		let contents = std::fs::read_to_string(path)
			.map_err(|e| TournamentError::Config(format!("{}: {e}", path.display())))?;
		Self::from_toml(&contents)
	}

	/// Loads `path` when given. Without one, falls back to `default_path` if
	/// it exists and to built-in defaults otherwise.
	pub fn load(path: Option<&Path>, default_path: &Path) -> TournamentResult<Self> {
		match path {
			Some(path) => Self::from_file(path),
			None if default_path.exists() => Self::from_file(default_path),
			None => Ok(Self::default()),
		}
	}

	pub fn busy_timeout(&self) -> Duration {
		Duration::from_millis(self.busy_timeout_ms)
	}
}
