use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "hive")]
#[command(about = "Inspect a registry bootstrapped from an INI config file")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Config file to bootstrap from
	pub config: PathBuf,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print the resolved value of a key as JSON
	Get {
		/// Delimited key, e.g. core/env
		key: String,
	},
	/// Print whether a key exists
	Exists {
		/// Delimited key, e.g. core/log/Stream
		key: String,
	},
	/// Print the whole scope, or a reference-resolved slice of it, as JSON
	Dump {
		/// Key to slice at
		key: Option<String>,
	},
	/// List configured log targets
	LogTargets,
}
