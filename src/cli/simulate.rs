//! `simulate` command: scripted proposal lifecycle against the
//! in-memory mock contract and codec.
//!
//! Useful for demos and for eyeballing the registry's tracing output
//! without a deployed contract: deposit, submit, vote, reveal, finalize.

use super::VaultConfig;
use futures::StreamExt;
use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};
use vaultguard::chain::{MockTreasury, TreasuryContract};
use vaultguard::codec::MockCodec;
use vaultguard::registry::{
    Address, Category, Currency, FinalizeOutcome, ProposalDraft, ProposalRegistry, Urgency,
    VoteChoice,
};
use vaultguard::wallet::WalletSession;

#[derive(clap::Args)]
pub struct SimulateArgs {
    /// Votes to cast, in order (e.g. "approve,reject,approve")
    #[arg(long, default_value = "approve,approve,reject")]
    votes: String,

    /// Voting deadline as a duration from now (e.g. 7d, 48h)
    #[arg(long, default_value = "7d")]
    deadline: String,

    /// Initial treasury deposit
    #[arg(long, default_value_t = 1_000)]
    deposit: u64,
}

pub async fn run(config: &VaultConfig, args: SimulateArgs) -> Result<(), Box<dyn Error>> {
    let votes = args
        .votes
        .split(',')
        .map(|v| v.trim().parse::<VoteChoice>())
        .collect::<Result<Vec<_>, _>>()?;
    let deadline_in = humantime::parse_duration(&args.deadline)?;

    let required = config.multisig.required_signers;
    let chain = MockTreasury::new(required);
    let codec = MockCodec::new();
    let mut registry = ProposalRegistry::new(chain.clone(), codec, required);

    // Mirror contract events the way a dashboard would.
    let mut events = chain.subscribe().await?;
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!(?event, "contract event");
        }
    });

    let proposer = WalletSession::connected(signer_address(0)?);
    registry.deposit(&proposer, args.deposit).await?;

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let draft = ProposalDraft {
        title: "Treasury Diversification".to_string(),
        description: "Allocate treasury funds to a DeFi yield strategy".to_string(),
        amount: "10".to_string(),
        currency: Currency::Eth,
        recipient: format!("0x{}", "b".repeat(40)),
        category: Category::Treasury,
        deadline: now + deadline_in.as_secs(),
        urgency: Urgency::Medium,
    };

    let id = registry.submit_proposal(&proposer, draft).await?;
    println!("Submitted proposal {id}");

    for (i, choice) in votes.iter().enumerate() {
        let session = WalletSession::connected(signer_address(i as u64 + 1)?);
        let receipt = registry.cast_vote(&session, id, *choice).await?;
        println!(
            "Vote {} recorded (quorum {})",
            receipt.vote_id,
            if receipt.quorum_reached {
                "reached"
            } else {
                "pending"
            }
        );
    }

    registry.refresh(id).await?;
    let view = registry.evaluate_quorum(id).await?;
    if !view.reached {
        println!(
            "Quorum pending: {} votes cast, {} required",
            votes.len(),
            required
        );
        return Ok(());
    }

    match registry.finalize(id).await? {
        FinalizeOutcome::Executed { tally, transaction } => {
            println!(
                "Executed ({} approve / {} reject), transfer {}",
                tally.approve, tally.reject, transaction
            );
        }
        FinalizeOutcome::Rejected { tally } => {
            println!(
                "Rejected ({} approve / {} reject)",
                tally.approve, tally.reject
            );
        }
        FinalizeOutcome::AlreadyFinal { status } => {
            println!("Already finalized: {status:?}");
        }
    }

    let treasury = registry.treasury().await?;
    println!(
        "Treasury: {} total, {} signatures required",
        treasury.total_funds, treasury.required_signatures
    );
    println!("{}", serde_json::to_string_pretty(&registry.snapshot())?);
    Ok(())
}

fn signer_address(n: u64) -> Result<Address, Box<dyn Error>> {
    Address::parse(&format!("0x{:040x}", n + 1)).map_err(Into::into)
}
