//! CLI commands

use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use zenopay_approval::{
    ApprovalOutcome, KeypairSigner, MultisigOwner, MultisigWallet, RequestSigner,
};
use zenopay_audit::AuditAction;
use zenopay_core::{AccountId, Amount, Caller, ChainId, WalletAddress, NATIVE_DECIMALS};
use zenopay_ledger::{PayoutRequest, RequestId, RequestStatus};

use crate::context::AppContext;

/// Human-readable amount in the chain's native unit
pub fn format_amount(amount: Amount, chain: ChainId) -> String {
    let symbol = chain.native_symbol().unwrap_or("units");
    match amount.to_units(NATIVE_DECIMALS) {
        Some(value) => format!("{} {}", value, symbol),
        None => format!("{} wei", amount),
    }
}

fn print_outcome(id: RequestId, outcome: &ApprovalOutcome) {
    match outcome {
        ApprovalOutcome::Approved => println!("✅ Request #{} approved", id),
        ApprovalOutcome::AwaitingSignatures {
            proposal_id,
            collected,
            required,
        } => {
            println!("🔐 Request #{} is high value, routed to multisig", id);
            println!("   Proposal: {} ({}/{} signatures)", proposal_id, collected, required);
        }
    }
}

/// Submit a payout request for `amount` (native units) on `chain`
pub fn submit(
    ctx: &mut AppContext,
    caller: &Caller,
    amount: Decimal,
    chain: &str,
    wallet: &str,
) -> Result<(), anyhow::Error> {
    let amount = Amount::from_ether(amount)?;
    let chain = ChainId::from_str(chain)?;

    let id = ctx.submit_request(caller, amount, chain.id(), wallet)?;

    println!(
        "✅ Request #{} submitted: {} to {} on {}",
        id,
        format_amount(amount, chain),
        wallet,
        chain
    );
    Ok(())
}

/// Show one request
pub fn request(ctx: &AppContext, id: RequestId) -> Result<(), anyhow::Error> {
    let request = ctx.get_request(id)?;

    println!("Request #{}", request.id);
    println!("   Requester: {}", request.requester);
    println!("   Amount:    {}", format_amount(request.amount, request.target_chain));
    println!("   Chain:     {}", request.target_chain);
    println!("   Wallet:    {}", request.target_wallet);
    println!("   Status:    {}", request.status);
    println!("   Submitted: {}", request.timestamp.to_rfc3339());
    if let Some(reason) = &request.rejection_reason {
        println!("   Reason:    {}", reason);
    }
    if let Some(tx) = &request.payout_tx {
        println!("   Payout tx: {}", tx);
    }
    if ctx.payouts_in_doubt().contains(&id) {
        println!("   ⚠️  Payout in doubt: dispatched, outcome never recorded (see `resolve`)");
    }

    if request.requires_multisig {
        if let Some(proposal) = ctx.proposal_for(id)? {
            let signers: Vec<&str> = proposal.signers().iter().map(|s| s.as_str()).collect();
            println!(
                "   Multisig:  {} {} ({}/{}) signed by [{}]",
                proposal.id,
                proposal.status.as_str(),
                proposal.signatures_collected(),
                proposal.required_signatures,
                signers.join(", ")
            );
        }
    }

    Ok(())
}

/// List requests, optionally filtered by status
pub fn requests(ctx: &AppContext, status: Option<&str>) -> Result<(), anyhow::Error> {
    let status = status.map(RequestStatus::from_str).transpose()?;
    let list: Vec<&PayoutRequest> = ctx.list_requests(status);

    if list.is_empty() {
        println!("No requests found");
        return Ok(());
    }

    println!("Payout Requests ({}):", list.len());
    println!("{:-<88}", "");
    println!(
        "{:>5} | {:<14} | {:>16} | {:<10} | {:<12} | {:<19}",
        "ID", "Requester", "Amount", "Chain", "Wallet", "Status"
    );
    println!("{:-<88}", "");

    for request in list {
        println!(
            "{:>5} | {:<14} | {:>16} | {:<10} | {:<12} | {:<19}",
            request.id,
            request.requester,
            format_amount(request.amount, request.target_chain),
            request.target_chain.name(),
            request.target_wallet.short(),
            request.status,
        );
    }

    Ok(())
}

pub fn approve(ctx: &mut AppContext, caller: &Caller, id: RequestId) -> Result<(), anyhow::Error> {
    let outcome = ctx.approve(caller, id)?;
    print_outcome(id, &outcome);
    Ok(())
}

/// Sign a high-value request with the Ed25519 seed stored at `key_path`
pub fn sign(
    ctx: &mut AppContext,
    caller: &Caller,
    id: RequestId,
    key_path: &Path,
) -> Result<(), anyhow::Error> {
    let seed = std::fs::read_to_string(key_path)?;
    let signer = KeypairSigner::from_hex(caller.account.clone(), &seed)?;

    let payload = ctx.signable_payload(id)?;
    let signature = signer.sign(&payload);
    let outcome = ctx.sign_request(caller, id, signature)?;

    println!(
        "✍️  Signature by {} recorded for request #{} ({}/{})",
        caller.account, id, outcome.collected, outcome.required
    );
    if outcome.approved {
        println!("✅ Request #{} approved by multisig", id);
    }
    Ok(())
}

pub fn reject(
    ctx: &mut AppContext,
    caller: &Caller,
    id: RequestId,
    reason: Option<&str>,
) -> Result<(), anyhow::Error> {
    ctx.reject(caller, id, reason)?;

    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => println!("🚫 Request #{} rejected: {}", id, reason),
        None => println!("🚫 Request #{} rejected", id),
    }
    Ok(())
}

/// Forward an approved request to the payout bridge
pub async fn forward(ctx: &mut AppContext, caller: &Caller, id: RequestId) -> Result<(), anyhow::Error> {
    let handle = ctx.forward_to_payout(caller, id).await?;

    println!(
        "🚀 Request #{} paid out: {} on {} via {}",
        id,
        format_amount(handle.amount, handle.dest_chain),
        handle.dest_chain,
        handle.bridge
    );
    println!("   Tx: {}", handle.tx_hash);
    Ok(())
}

/// Settle a payout left in doubt
pub fn resolve(
    ctx: &mut AppContext,
    caller: &Caller,
    id: RequestId,
    tx_hash: Option<&str>,
) -> Result<(), anyhow::Error> {
    match ctx.resolve_payout(caller, id, tx_hash)? {
        RequestStatus::Executed => println!("✅ Request #{} recorded as paid out", id),
        status => println!("↩️  Request #{} recorded as not sent ({}), forward it again", id, status),
    }
    Ok(())
}

/// Append a free-form audit entry
pub fn log(
    ctx: &mut AppContext,
    id: RequestId,
    actor: &str,
    action: &str,
    transcript: Option<&str>,
) -> Result<(), anyhow::Error> {
    let action = AuditAction::from_str(action)?;
    let entry = ctx.log_action(id, actor, action, transcript)?;

    println!(
        "📝 Logged {} by {} on request #{} (seq: {})",
        entry.action, entry.actor, entry.request_id, entry.sequence
    );
    Ok(())
}

/// Approve from a voice transcript
pub fn voice(
    ctx: &mut AppContext,
    caller: &Caller,
    id: RequestId,
    transcript: &str,
) -> Result<(), anyhow::Error> {
    let outcome = ctx.voice_approve(caller, id, transcript)?;
    println!("🎙️  \"{}\"", transcript.trim());
    print_outcome(id, &outcome);
    Ok(())
}

/// Print the audit trail, optionally re-verifying both hash chains
pub fn audit(ctx: &AppContext, id: Option<RequestId>, verify: bool) -> Result<(), anyhow::Error> {
    if verify {
        match ctx.verify_journal() {
            Ok(count) => println!("✅ Journal hash chain verified ({} entries)", count),
            Err(e) => {
                println!("❌ Journal hash chain broken: {}", e);
                return Ok(());
            }
        }
        match ctx.verify_audit() {
            Ok(count) => println!("✅ Audit hash chain verified ({} entries)", count),
            Err(e) => {
                println!("❌ Audit hash chain broken: {}", e);
                return Ok(());
            }
        }
    }

    let entries: Vec<_> = match id {
        Some(id) => ctx.audit_entries_for(id),
        None => ctx.audit_entries().iter().collect(),
    };

    if entries.is_empty() {
        println!("No audit entries");
        return Ok(());
    }

    println!("Audit Trail ({} entries):", entries.len());
    for entry in entries {
        println!(
            "{:>5} | {} | #{:<4} | {:<8} | {}{}",
            entry.sequence,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.request_id,
            entry.action,
            entry.actor,
            entry
                .transcript
                .as_deref()
                .map(|t| format!(" | \"{}\"", t))
                .unwrap_or_default(),
        );
    }

    Ok(())
}

/// Show the multisig configuration and proposal counts
pub fn multisig(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let (Some(config), Some(wallet)) = (ctx.multisig_config(), ctx.multisig_wallet()) else {
        println!("No multisig configured");
        return Ok(());
    };

    println!("Multisig {}", config.multisig_address);
    println!(
        "   Threshold: {} (requests at or above need signatures)",
        format_amount(config.high_value_threshold, ChainId::Ethereum)
    );
    println!(
        "   Policy:    {} of {}",
        wallet.required_signatures,
        wallet.total_signers()
    );
    for owner in &wallet.owners {
        println!("   Owner:     {} ({})", owner.signer_id, owner.public_key);
    }

    let stats = ctx.approval_stats()?;
    println!(
        "   Proposals: {} open, {} approved, {} rejected, {} expired",
        stats.open, stats.approved, stats.rejected, stats.expired
    );

    for proposal in ctx.open_proposals()? {
        println!(
            "   ⏳ {} request #{} ({}/{}), expires {}",
            proposal.id,
            proposal.request_id,
            proposal.signatures_collected(),
            proposal.required_signatures,
            proposal.expires_at.to_rfc3339()
        );
    }

    Ok(())
}

/// Install the multisig; owners are given as `signer_id:public_key_hex`
pub fn configure_multisig(
    ctx: &mut AppContext,
    caller: &Caller,
    address: &str,
    owners: &[String],
    required: u8,
    threshold: Option<Decimal>,
) -> Result<(), anyhow::Error> {
    let address = WalletAddress::parse(address)?;
    let owners = owners
        .iter()
        .map(|spec| parse_owner(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let wallet = MultisigWallet::new(address, owners, required)?;

    let threshold = threshold.unwrap_or(ctx.config().high_value_threshold);
    let threshold = Amount::from_ether(threshold)?;

    let config = ctx.configure_multisig(caller, wallet, threshold)?;

    println!("✅ Multisig configured: {}", config.multisig_address);
    println!(
        "   {} of {} signatures required at or above {}",
        required,
        ctx.multisig_wallet().map(|w| w.total_signers()).unwrap_or(0),
        format_amount(config.high_value_threshold, ChainId::Ethereum)
    );
    Ok(())
}

fn parse_owner(spec: &str) -> Result<MultisigOwner, anyhow::Error> {
    let (id, key) = spec
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("owner must be <signer_id>:<public_key_hex>, got '{}'", spec))?;

    Ok(MultisigOwner {
        signer_id: AccountId::new(id)?,
        public_key: key.trim().to_lowercase(),
    })
}

pub fn register(
    ctx: &mut AppContext,
    caller: &Caller,
    account: &str,
    tier: u8,
) -> Result<(), anyhow::Error> {
    let account = AccountId::new(account)?;
    let profile = ctx.register_contributor(caller, account, tier)?;

    println!(
        "✅ Contributor {} registered (tier {})",
        profile.account, profile.tier
    );
    Ok(())
}

/// Generate an Ed25519 signing key for a multisig owner
pub fn keygen(signer_id: &str, output: &Path) -> Result<(), anyhow::Error> {
    let signer = KeypairSigner::generate(AccountId::new(signer_id)?);
    let seed = signer.seed_hex();

    std::fs::write(output, &seed)?;

    println!("✅ Generated signing key for {}", signer.signer_id());
    println!("   Private key saved to: {}", output.display());
    println!("   Public key: {}", signer.public_key_hex());
    println!();
    println!(
        "To register: --owner {}:{}",
        signer.signer_id(),
        signer.public_key_hex()
    );
    Ok(())
}
