//! `hive` binary: bootstraps a registry from an INI config file and queries it.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use hive_bootstrap::{Bootstrap, BootstrapOptions, Core, Level, LogTarget};
use hive_registry::{FlatScope, Registry, Value};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);
	println!("{}", run(&cli)?);
	Ok(())
}

/// Bootstraps the config, routes its log targets to `tracing` and runs the command.
fn run(cli: &Cli) -> anyhow::Result<String> {
	let core = Bootstrap::init_by_path(&cli.config, BootstrapOptions::default())?;
	core.route_logs(forward)?;
	tracing::debug!(config = %cli.config.display(), command = ?cli.command, "running command");
	execute(&core, &cli.command)
}

/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
	let fallback = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn execute(core: &Core, command: &Command) -> anyhow::Result<String> {
	match command {
		Command::Get { key } => to_json(core.registry.get(key)?),
		Command::Exists { key } => Ok(core.registry.exists(key).to_string()),
		Command::Dump { key: None } => to_json(&Value::Map(core.registry.scope().clone())),
		Command::Dump { key: Some(key) } => {
			let slice = core.registry.new_from_key(key)?;
			to_json(&Value::Map(slice.scope().clone()))
		}
		Command::LogTargets => Ok(core.log_targets.iter().map(describe).collect::<Vec<_>>().join("\n")),
	}
}

fn to_json(value: &Value) -> anyhow::Result<String> {
	Ok(serde_json::to_string_pretty(value)?)
}

/// Re-emits a message accepted by a log target as a `tracing` event.
fn forward(target: &LogTarget, level: Level, args: &FlatScope) {
	let text = |key: &str| args.try_get(key).ok().flatten().and_then(Value::as_str).unwrap_or_default();
	let id = target.id();
	let (log_target, source, message) = (id.as_str(), text("source"), text("message"));
	match level {
		Level::Error => tracing::error!(log_target, source, "{message}"),
		Level::Warning => tracing::warn!(log_target, source, "{message}"),
		Level::Notice => tracing::info!(log_target, source, event = text("name"), "{message}"),
	}
}

fn describe(target: &LogTarget) -> String {
	format!("{}\t{}\t{}", target.method, target.level_name, target.sources.join(","))
}
