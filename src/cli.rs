//! CLI types and command routing.
//!
//! The binary drives a local rehearsal sandbox: an embedded chain persisted
//! as a snapshot under the data directory, so the full deploy / status /
//! upgrade lifecycle can be exercised across invocations before the same
//! flows are pointed at a real network backend.

use crate::artifacts::DirArtifacts;
use crate::chain::Chain;
use crate::deployer::{BOOTSTRAP_SIGNER, DEPLOYMENT_COST};
use crate::error::OrchestratorError;
use crate::manifest::Manifest;
use crate::net::DevNetwork;
use crate::ops;
use crate::quorum::{decode_signatures, encode_signatures, SubmitOutcome};
use crate::signer::KeySigner;
use crate::store::MetadataStore;
use crate::types::Address;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Capstan - upgrade orchestration for proxied contract fleets
#[derive(Parser)]
#[command(name = "capstan")]
#[command(about = "Auditable upgrade orchestration for fleets of proxied contracts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Declared contract manifest
    #[arg(long, default_value = "capstan.toml")]
    pub manifest: PathBuf,

    /// Build artifact directory
    #[arg(long, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Data directory (chain snapshot and deployment metadata)
    #[arg(long, default_value = ".capstan")]
    pub data_dir: PathBuf,

    /// Target network name, scoping the persisted deployment metadata
    #[arg(long, default_value = "sandbox")]
    pub network: String,

    /// Seed for the development signer
    #[arg(long, default_value = "deployer")]
    pub signer_seed: String,

    /// Don't ask for confirmation, useful in scripts and tests
    #[arg(long)]
    pub auto_confirm: bool,

    /// Prior quorum signatures collected for this operation
    #[arg(long)]
    pub prior_signatures: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy new contracts and stage changes for existing ones
    Deploy {
        /// Preview what would happen without writing to the chain
        #[arg(long)]
        dry_run: bool,
    },
    /// Show deploy status; exits non-zero when drift is detected
    Status {
        /// Don't exit non-zero on drift
        #[arg(long)]
        quiet: bool,
    },
    /// Apply pending contract upgrades and staged calls atomically
    Upgrade {
        /// The new version to set on the ledger
        new_version: String,
    },
    /// Withdraw all abstract contract proposals
    WithdrawAbstractProposals,
    /// Add an upgrade proposer
    AddProposer { proposer: String },
    /// Remove an upgrade proposer
    RemoveProposer { proposer: String },
    /// Transfer ledger ownership (typically to a multisignature owner)
    TransferOwnership { new_owner: String },
}

/// Execute a command, returning the process exit code.
pub async fn run(cli: &Cli) -> Result<i32, OrchestratorError> {
    std::fs::create_dir_all(&cli.data_dir).map_err(|e| {
        OrchestratorError::Store(format!("failed to create {}: {e}", cli.data_dir.display()))
    })?;

    let chain_path = cli.data_dir.join("chain.bin");
    let chain = match std::fs::read(&chain_path) {
        Ok(raw) => Chain::from_bytes(&raw)?,
        Err(_) => {
            let mut chain = Chain::new(31337);
            chain.fund(BOOTSTRAP_SIGNER, DEPLOYMENT_COST);
            chain
        }
    };
    let network = DevNetwork::new(chain);
    let store = MetadataStore::open(cli.data_dir.join("metadata"))?;
    let artifacts = DirArtifacts::new(&cli.artifacts);
    let signer = Arc::new(KeySigner::from_seed(&cli.signer_seed));
    let prior_signatures =
        decode_signatures(cli.prior_signatures.as_deref().unwrap_or_default())?;

    let ctx = ops::OpsContext {
        network: &network,
        network_name: &cli.network,
        store: &store,
        artifacts: &artifacts,
        signer,
        auto_confirm: cli.auto_confirm,
        dry_run: matches!(cli.command, Commands::Deploy { dry_run: true }),
        prior_signatures,
        retry_attempts: 10,
        retry_delay: Duration::from_secs(1),
    };

    let exit_code = dispatch(cli, &ctx).await?;

    let snapshot = network.with_chain(|chain| chain.to_bytes());
    std::fs::write(&chain_path, snapshot).map_err(|e| {
        OrchestratorError::Store(format!("failed to write chain snapshot: {e}"))
    })?;

    Ok(exit_code)
}

async fn dispatch(cli: &Cli, ctx: &ops::OpsContext<'_>) -> Result<i32, OrchestratorError> {
    match &cli.command {
        Commands::Deploy { dry_run } => {
            let manifest = Manifest::load(&cli.manifest)?;
            let outcome = ops::deploy(ctx, &manifest).await?;
            if *dry_run {
                println!("Dry run; planned actions:");
                for action in &outcome.planned {
                    println!("  {action}");
                }
                if outcome.planned.is_empty() {
                    println!("  (none)");
                }
            } else {
                for (id, address) in &outcome.addresses {
                    println!("{id}: {address}");
                }
            }
            Ok(0)
        }
        Commands::Status { quiet } => {
            let manifest = Manifest::load(&cli.manifest)?;
            let report = ops::protocol_status(ctx, &manifest).await?;
            println!("{}", report.table);
            if report.any_changed {
                println!("Changes detected");
                Ok(if *quiet { 0 } else { 1 })
            } else {
                println!("No changes detected to deploy");
                Ok(0)
            }
        }
        Commands::Upgrade { new_version } => print_outcome(ops::upgrade(ctx, new_version).await?),
        Commands::WithdrawAbstractProposals => {
            ops::withdraw_all_abstract_proposals(ctx).await?;
            Ok(0)
        }
        Commands::AddProposer { proposer } => {
            print_outcome(ops::add_proposer(ctx, parse_address(proposer)?).await?)
        }
        Commands::RemoveProposer { proposer } => {
            print_outcome(ops::remove_proposer(ctx, parse_address(proposer)?).await?)
        }
        Commands::TransferOwnership { new_owner } => {
            print_outcome(ops::transfer_ownership(ctx, parse_address(new_owner)?).await?)
        }
    }
}

fn print_outcome(outcome: SubmitOutcome) -> Result<i32, OrchestratorError> {
    match outcome {
        SubmitOutcome::Executed(_) => {
            println!("Success");
            Ok(0)
        }
        SubmitOutcome::Pending(signatures) => {
            println!(
                "Not enough signatures yet; relay to the remaining signers:\n\"{}\"",
                encode_signatures(&signatures)
            );
            Ok(0)
        }
    }
}

fn parse_address(raw: &str) -> Result<Address, OrchestratorError> {
    Address::from_hex(raw)
        .map_err(|_| OrchestratorError::InvalidInput(format!("malformed address {raw}")))
}
