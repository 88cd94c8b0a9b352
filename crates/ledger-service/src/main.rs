//! Main entry point for the ledger console.
//!
//! This binary reads chain state from a node, submits token mints and
//! transfers through a wallet, and tracks each submission to a final status.
//! Node and wallet backends are pluggable and selected by configuration.

use clap::{Parser, Subcommand};
use ledger_config::Config;
use ledger_core::{LedgerBuilder, LedgerEngine, LedgerFactories};
use std::collections::HashMap;
use std::path::PathBuf;

mod commands;
mod display;

/// Command-line arguments for the ledger console.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
	/// Show the latest block and the workshop phase
	Block,
	/// Show the native balance of the connected account
	Balance,
	/// Show the token balance of the connected account
	TokenBalance,
	/// Show the token's total supply
	TotalSupply,
	/// Mint tokens to the connected account
	Mint {
		/// Amount in token units, e.g. 1.5
		#[arg(long)]
		amount: String,
	},
	/// Transfer tokens from the connected account
	Transfer {
		/// Recipient address
		#[arg(long)]
		to: String,
		/// Amount in token units, e.g. 1.5
		#[arg(long)]
		amount: String,
	},
	/// Print live block, balance and supply updates until interrupted
	Watch,
}

/// Main entry point for the ledger console.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the engine with the configured backends
/// 5. Runs the requested command
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.ledger.name);

	let engine = build_engine(config).await?;
	let result = run(&engine, args.command).await;
	engine.shutdown().await;

	Ok(result?)
}

async fn run(engine: &LedgerEngine, command: Command) -> Result<(), commands::CommandError> {
	match command {
		Command::Block => commands::block(engine).await,
		Command::Balance => commands::balance(engine).await,
		Command::TokenBalance => commands::token_balance(engine).await,
		Command::TotalSupply => commands::total_supply(engine).await,
		Command::Mint { amount } => return commands::mint(engine, &amount).await,
		Command::Transfer { to, amount } => return commands::transfer(engine, &to, &amount).await,
		Command::Watch => commands::watch(engine).await,
	}
	Ok(())
}

/// Picks the factory for every configured implementation from the ones the
/// backend crate registers.
///
/// A configured name with no registered implementation is an error listing
/// the available names.
fn select_factories<F: Copy>(
	kind: &str,
	registered: Vec<(&'static str, F)>,
	configured: &HashMap<String, toml::Value>,
) -> Result<HashMap<String, F>, Box<dyn std::error::Error>> {
	let registered: HashMap<&'static str, F> = registered
		.into_iter()
		.inspect(|(name, _)| tracing::debug!("Registering {} implementation: {}", kind, name))
		.collect();

	let mut factories = HashMap::new();
	for name in configured.keys() {
		let Some(factory) = registered.get(name.as_str()) else {
			let mut available: Vec<&str> = registered.keys().copied().collect();
			available.sort_unstable();
			return Err(format!(
				"Unknown {} implementation '{}'. Available: [{}]",
				kind,
				name,
				available.join(", ")
			)
			.into());
		};
		factories.insert(name.clone(), *factory);
	}
	Ok(factories)
}

/// Builds the engine with the configured backend implementations.
///
/// Names match the `implementations.<name>` tables in configuration:
/// - Node backends (e.g., JSON-RPC over HTTP)
/// - Wallet backends (e.g., a local private key)
async fn build_engine(config: Config) -> Result<LedgerEngine, Box<dyn std::error::Error>> {
	let node_factories = select_factories(
		"node",
		ledger_node::get_all_implementations(),
		&config.node.implementations,
	)?;
	let wallet_factories = select_factories(
		"wallet",
		ledger_wallet::get_all_implementations(),
		&config.wallet.implementations,
	)?;

	let factories = LedgerFactories {
		node_factories,
		wallet_factories,
	};

	Ok(LedgerBuilder::new(config).build(factories).await?)
}
