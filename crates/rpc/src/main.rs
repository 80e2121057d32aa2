//! Zenopay CLI - Main entry point

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use zenopay_bus::LogSubscriber;
use zenopay_core::AccountId;
use zenopay_ledger::RequestId;
use zenopay_rpc::context::bridge_from_config;
use zenopay_rpc::{commands, AppContext, VaultConfig};

#[derive(Parser)]
#[command(name = "zenopay")]
#[command(about = "Zenopay - contributor payout vault", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Account the command runs as
    #[arg(long = "as", default_value = "admin")]
    account: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a payout request
    Submit {
        /// Amount in native units (e.g. 0.5)
        amount: Decimal,
        /// Destination chain id or name
        chain: String,
        /// Destination wallet
        wallet: String,
    },

    /// Show one request
    Request { id: RequestId },

    /// List requests
    Requests {
        /// Filter by status (pending, awaiting_signatures, approved, executed, rejected)
        #[arg(long)]
        status: Option<String>,
    },

    /// Approve a request (high-value requests open a multisig proposal)
    Approve { id: RequestId },

    /// Sign a high-value request as a multisig owner
    Sign {
        id: RequestId,
        /// File holding the hex Ed25519 seed
        #[arg(long)]
        key: PathBuf,
    },

    /// Reject a request
    Reject {
        id: RequestId,
        /// Optional reason
        #[arg(long)]
        reason: Option<String>,
    },

    /// Forward an approved request to the payout bridge
    Forward { id: RequestId },

    /// Settle a payout left in doubt (dispatched, outcome never recorded)
    Resolve {
        id: RequestId,
        /// Bridge transaction hash if the payout went through
        #[arg(long)]
        tx: Option<String>,
    },

    /// Append an entry to the audit trail
    Log {
        id: RequestId,
        /// approve, reject or sign
        action: String,
        /// Actor (defaults to --as)
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        transcript: Option<String>,
    },

    /// Approve from a voice transcript, e.g. "approve 0.5 eth to alice on base"
    Voice { id: RequestId, transcript: String },

    /// Show the audit trail
    Audit {
        /// Only entries for this request
        #[arg(long)]
        request: Option<RequestId>,
        /// Re-verify journal and audit hash chains
        #[arg(long)]
        verify: bool,
    },

    /// Show multisig configuration
    Multisig,

    /// Configure the multisig wallet
    ConfigureMultisig {
        /// Multisig wallet address
        #[arg(long)]
        address: String,
        /// Owner as <signer_id>:<public_key_hex> (repeatable)
        #[arg(long = "owner", required = true)]
        owners: Vec<String>,
        /// Signatures required (N of M)
        #[arg(long)]
        required: u8,
        /// High-value threshold in native units (defaults to config)
        #[arg(long)]
        threshold: Option<Decimal>,
    },

    /// Register a contributor
    Register {
        account: String,
        #[arg(long, default_value = "1")]
        tier: u8,
    },

    /// Generate a multisig owner signing key
    Keygen {
        /// Owner id the key belongs to
        signer: String,
        /// Output file path
        #[arg(long, default_value = "signer.key")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Commands::Keygen { signer, output } = &cli.command {
        return commands::keygen(signer, output);
    }

    let config = VaultConfig::load(cli.config.as_deref())?;
    let bridge = Arc::new(bridge_from_config(&config));
    let mut ctx = AppContext::with_config(&cli.data, config, bridge)?;
    let logger = ctx.bus().spawn(Arc::new(LogSubscriber));

    let caller = ctx.caller_for(AccountId::new(&cli.account)?);

    match cli.command {
        Commands::Submit {
            amount,
            chain,
            wallet,
        } => commands::submit(&mut ctx, &caller, amount, &chain, &wallet)?,

        Commands::Request { id } => commands::request(&ctx, id)?,

        Commands::Requests { status } => commands::requests(&ctx, status.as_deref())?,

        Commands::Approve { id } => commands::approve(&mut ctx, &caller, id)?,

        Commands::Sign { id, key } => commands::sign(&mut ctx, &caller, id, &key)?,

        Commands::Reject { id, reason } => {
            commands::reject(&mut ctx, &caller, id, reason.as_deref())?
        }

        Commands::Forward { id } => commands::forward(&mut ctx, &caller, id).await?,

        Commands::Resolve { id, tx } => commands::resolve(&mut ctx, &caller, id, tx.as_deref())?,

        Commands::Log {
            id,
            action,
            actor,
            transcript,
        } => {
            let actor = actor.unwrap_or_else(|| caller.account.to_string());
            commands::log(&mut ctx, id, &actor, &action, transcript.as_deref())?
        }

        Commands::Voice { id, transcript } => commands::voice(&mut ctx, &caller, id, &transcript)?,

        Commands::Audit { request, verify } => commands::audit(&ctx, request, verify)?,

        Commands::Multisig => commands::multisig(&ctx)?,

        Commands::ConfigureMultisig {
            address,
            owners,
            required,
            threshold,
        } => commands::configure_multisig(&mut ctx, &caller, &address, &owners, required, threshold)?,

        Commands::Register { account, tier } => commands::register(&mut ctx, &caller, &account, tier)?,

        Commands::Keygen { .. } => {}
    }

    // Dropping the context closes the bus; the log subscriber drains and stops
    drop(ctx);
    logger.await?;

    Ok(())
}
