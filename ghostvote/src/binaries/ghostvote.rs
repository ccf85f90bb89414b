use std::path::PathBuf;
use std::sync::Arc;

use alloy::providers::Provider;
use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use ghostvote::Config;
use ghostvote_client::{BallotContract, HandleCollector, Notice};
use ghostvote_contract::GhostVote;
use ghostvote_contract::provider::build_provider;
use ghostvote_contract::provider::build_signer;
use ghostvote_types::{Category, NewProposal};
use ghostvote_utils::logging;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the client configuration.
    #[clap(long, short, env = "GHOSTVOTE_CONFIG", default_value = "./test-configs/ghostvote.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all registered proposals.
    Proposals,

    /// Show the ballots of a category.
    ///
    /// Vote counts stay encrypted; proposals without votes are marked.
    Standings {
        #[clap(long, short, default_value_t = Category::default())]
        category: Category,
    },

    /// Register a new proposal.
    Submit {
        #[clap(long)]
        title: String,

        /// Reference to the long description.
        #[clap(long, default_value = "")]
        description: String,

        /// Reference to supporting documents.
        #[clap(long, default_value = "")]
        file: String,

        /// Comma separated tags.
        #[clap(long, default_value = "")]
        tags: String,

        /// Category to compete in. May be given more than once.
        #[clap(long = "category", short, required = true)]
        categories: Vec<Category>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    let config = Config::read(&cli.config)
        .await
        .context("failed to read configuration")?;

    let signer = build_signer(&config.wallet.mnemonic, config.wallet.account_index)
        .context("failed to derive wallet from mnemonic")?;
    let sender = signer.address();

    let provider = build_provider(signer, config.chain.rpc_url.clone());

    let chain_id = provider
        .get_chain_id()
        .await
        .with_context(|| format!("failed to query chain id from {}", config.chain.rpc_url))?;
    ensure!(
        chain_id == config.chain.id,
        "connected to chain {chain_id}, expected {}",
        config.chain.id
    );

    info!(%sender, contract = %config.chain.ghostvote_contract, chain_id, "connected");

    let contract = Arc::new(GhostVote::new(config.chain.ghostvote_contract, provider));

    match cli.command {
        Command::Proposals => {
            for id in contract.list_proposal_ids().await? {
                let p = contract.fetch_proposal(id).await?;
                let cats = p
                    .categories
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{id:>5}  {:<40}  {}  [{cats}]", p.title, p.author);
            }
        }
        Command::Standings { category } => {
            let d = category.descriptor();
            println!("{} {} ({category})", d.icon, d.name);
            let entries = HandleCollector::new(contract).ballots(category).await?;
            if entries.is_empty() {
                println!("{}", Notice::NoProposals(category));
            }
            for e in entries {
                let votes = if e.handle.is_sentinel() {
                    "no votes".to_string()
                } else {
                    e.handle.to_string()
                };
                println!("{:>5}  {:<40}  {}  {votes}", e.id, e.title, e.author);
            }
        }
        Command::Submit {
            title,
            description,
            file,
            tags,
            categories,
        } => {
            let p = NewProposal::builder()
                .title(title)
                .description_ref(description)
                .file_ref(file)
                .tags(NewProposal::parse_tags(&tags))
                .categories(categories)
                .build();
            p.validate()?;
            let tx = contract.register_proposal(&p).await?;
            println!("{}", Notice::ProposalSubmitted(tx));
        }
    }

    Ok(())
}
