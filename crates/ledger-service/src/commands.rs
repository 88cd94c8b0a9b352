//! Console commands.
//!
//! Read commands print one snapshot. Write commands print each phase label as
//! the operation progresses and wait for it to settle; `watch` prints live
//! snapshots until interrupted.

use crate::display::{render_block, render_native, render_token};
use alloy_primitives::Address;
use ledger_calls::{parse_address, parse_amount, BuildError};
use ledger_core::{phase_label, EngineError, LedgerEngine, SubmitOutcome};
use ledger_types::{truncate_id, ActionKind, OperationError, OperationStatus};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

/// Errors reported to the console user.
#[derive(Debug, Error)]
pub enum CommandError {
	#[error("Invalid input: {0}")]
	Input(#[from] BuildError),
	#[error("A {0} is already in progress")]
	Refused(ActionKind),
	#[error("Operation failed: {0}")]
	Operation(OperationError),
	#[error(transparent)]
	Engine(#[from] EngineError),
}

pub async fn block(engine: &LedgerEngine) {
	let result = engine.block().await;
	let phase = engine.workshop().classify_result(&result);
	println!("Block: {}", render_block(&result, phase));
}

pub async fn balance(engine: &LedgerEngine) {
	let result = engine.native_balance().await;
	println!("Balance of {}: {}", engine.account(), render_native(&result));
}

pub async fn token_balance(engine: &LedgerEngine) {
	let result = engine.token_balance().await;
	println!(
		"Token balance of {}: {}",
		engine.account(),
		render_token(&result, engine.config())
	);
}

pub async fn total_supply(engine: &LedgerEngine) {
	let result = engine.total_supply().await;
	println!("Total supply: {}", render_token(&result, engine.config()));
}

pub async fn mint(engine: &LedgerEngine, amount: &str) -> Result<(), CommandError> {
	let amount = parse_amount(amount, engine.config().token.decimals)?;
	let printer = spawn_phase_printer(engine, ActionKind::Mint);
	let outcome = engine.mint(amount).await;
	settle(engine, ActionKind::Mint, outcome, printer).await
}

pub async fn transfer(engine: &LedgerEngine, to: &str, amount: &str) -> Result<(), CommandError> {
	let to: Address = parse_address(to)?;
	let amount = parse_amount(amount, engine.config().token.decimals)?;
	let printer = spawn_phase_printer(engine, ActionKind::Transfer);
	let outcome = engine.transfer(to, amount).await;
	settle(engine, ActionKind::Transfer, outcome, printer).await
}

/// Prints every phase the action passes through, ending at a terminal one.
fn spawn_phase_printer(engine: &LedgerEngine, action: ActionKind) -> JoinHandle<()> {
	let mut states = engine.orchestrator().subscribe(action);
	tokio::spawn(async move {
		while states.changed().await.is_ok() {
			let state = states.borrow_and_update().clone();
			println!("[{}] {}", action, phase_label(action, &state));
			if state.status().is_terminal() {
				break;
			}
		}
	})
}

async fn settle(
	engine: &LedgerEngine,
	action: ActionKind,
	outcome: SubmitOutcome,
	printer: JoinHandle<()>,
) -> Result<(), CommandError> {
	let handle = match outcome {
		SubmitOutcome::Submitted(handle) => handle,
		SubmitOutcome::Failed(error) => {
			let _ = printer.await;
			return Err(CommandError::Operation(error));
		},
		SubmitOutcome::Refused => {
			printer.abort();
			return Err(CommandError::Refused(action));
		},
	};

	println!("Transaction {}", handle.tx_hash);
	if let Some(url) = engine.transaction_url(&handle) {
		println!("View on explorer: {}", url);
	}

	let state = tokio::select! {
		state = engine.wait_settled(action) => state?,
		_ = tokio::signal::ctrl_c() => {
			engine.orchestrator().cancel_confirmation(action).await;
			printer.abort();
			println!(
				"Stopped tracking {}; it may still be included",
				truncate_id(&handle.tx_hash.to_hex())
			);
			return Ok(());
		}
	};
	let _ = printer.await;

	match state.status() {
		OperationStatus::Confirmed => {
			token_balance(engine).await;
			if action == ActionKind::Mint {
				total_supply(engine).await;
			}
			Ok(())
		},
		_ => Err(CommandError::Operation(state.error().cloned().unwrap_or_else(|| {
			OperationError::BroadcastFailed(format!("ended as {:?}", state.status()))
		}))),
	}
}

/// Prints live snapshots of every watched read until Ctrl-C.
pub async fn watch(engine: &LedgerEngine) {
	let block = engine.watch_block();
	let native = engine.watch_native_balance();
	let token = engine.watch_token_balance();
	let supply = engine.watch_total_supply();
	let workshop = engine.workshop();

	let mut blocks = block.stream();
	let mut natives = native.stream();
	let mut tokens = token.stream();
	let mut supplies = supply.stream();

	let shutdown = tokio::signal::ctrl_c();
	tokio::pin!(shutdown);

	loop {
		tokio::select! {
			_ = &mut shutdown => {
				tracing::info!("Stopping watches");
				break;
			}
			Some(result) = blocks.next() => {
				println!("Block: {}", render_block(&result, workshop.classify_result(&result)));
			}
			Some(result) = natives.next() => {
				println!("Balance: {}", render_native(&result));
			}
			Some(result) = tokens.next() => {
				println!("Token balance: {}", render_token(&result, engine.config()));
			}
			Some(result) = supplies.next() => {
				println!("Total supply: {}", render_token(&result, engine.config()));
			}
		}
	}

	for handle in [&block, &native, &token, &supply] {
		handle.cancel();
	}
}
