use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ledger_dapp_kit::blockchain::{GatewayApi, GatewayClient, StateReader, WalletRelay};
use ledger_dapp_kit::cli::{Cli, Commands};
use ledger_dapp_kit::core::config::DappConfig;
use ledger_dapp_kit::core::domain::{AccountRef, ReceiptStatus};
use ledger_dapp_kit::core::validation::validate_address;
use ledger_dapp_kit::manifest::{build_operation, render, Operation, OperationContext, OPERATION_USAGE};
use ledger_dapp_kit::monitoring::DappMetrics;
use ledger_dapp_kit::service::{AccountResolver, FileAddressStore, TracingNotifier, TransactionFlow};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = cli.load_config()?;
    info!(network = %config.network.name, "dapp-cli v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Manifest { account, operation, args } => {
            let account = AccountRef::new(account).context("account address must not be empty")?;
            let op = Operation::parse(&operation, &args)?;
            let ctx = OperationContext::new(account, config.addresses.clone());
            println!("{}", render(&build_operation(&ctx, &op)?));
        }
        Commands::Operations => {
            for (name, usage) in OPERATION_USAGE {
                println!("{} {}", name, usage);
            }
        }
        Commands::Balances { account } => {
            let account = AccountRef::new(account).context("account address must not be empty")?;
            let reader = StateReader::new(Arc::new(GatewayClient::from_config(&config)?));
            let balances = reader.account_balances(&account).await?;
            for balance in &balances.fungibles {
                println!("{} {}", balance.resource_address, balance.amount);
            }
            for holding in &balances.non_fungibles {
                println!("{} {} NFT(s)", holding.resource_address, holding.count);
            }
        }
        Commands::Status { intent_hash } => {
            let gateway = GatewayClient::from_config(&config)?;
            let status = gateway.transaction_status(&intent_hash).await?;
            println!("{} ({})", status.status, ReceiptStatus::from_gateway(&status.status));
            if let Some(message) = status.error_message {
                println!("{}", message);
            }
        }
        Commands::Submit { operation, args, message } => {
            let op = Operation::parse(&operation, &args)?;
            submit(&config, &op, message).await?;
        }
        Commands::ValidateAddress { address, kind } => {
            validate_address(&address, kind.into(), &config.network.hrp_suffix)?;
            println!("{} is a valid {:?} address on {}", address, kind, config.network.name);
        }
    }
    Ok(())
}

async fn submit(config: &DappConfig, op: &Operation, message: Option<String>) -> Result<()> {
    let relay_url = config.wallet.relay_url.as_deref().context("wallet.relay_url is not configured")?;
    let timeout = config.submission.request_timeout();
    let metrics = Arc::new(DappMetrics::new()?);

    let wallet = Arc::new(WalletRelay::new(relay_url, timeout)?);
    let gateway = Arc::new(GatewayClient::from_config(config)?.with_metrics(metrics.clone()));

    let mut resolver = AccountResolver::new(wallet.clone());
    if let Some(path) = &config.account_store_path {
        resolver = resolver.with_store(Arc::new(FileAddressStore::new(path)));
    }
    resolver.restore().await?;

    let mut flow = TransactionFlow::new(
        wallet,
        gateway,
        config.addresses.clone(),
        config.submission.clone(),
        Arc::new(TracingNotifier),
    )
    .with_resolver(resolver)
    .with_metrics(metrics);
    if let Some(message) = message {
        flow = flow.with_message(message);
    }

    let outcome = flow.run(op).await?;
    println!("{}", outcome.notification);
    if let Ok(receipt) = &outcome.result {
        println!("intent hash: {}", receipt.intent_hash);
    }
    if !outcome.is_success() {
        bail!("{} did not succeed", outcome.operation);
    }
    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=info,h2=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
