use banka_ledger::infra::config::Config;
use banka_ledger::infra::evm::{self, DeploymentInfo, EvmClient};
use banka_ledger::domain::ledger::normalize_address;
use banka_ledger::PgLedgerStore;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--record-factory <address>] [--network <name>]\n\
         \n\
         Reads env vars:\n\
           DATABASE_URL (when STORAGE=postgres), WEB3_PROVIDER_URL, CHAIN_ID,\n\
           EVENT_FACTORY_ADDRESS, DEPLOYMENT_FILE\n\
         \n\
         --record-factory writes the address into DEPLOYMENT_FILE after checking\n\
         that code is deployed there.\n"
    );
    std::process::exit(2);
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let record_factory = arg_value(&args, "--record-factory");
    if args.iter().any(|a| a == "--record-factory") && record_factory.is_none() {
        usage_and_exit();
    }

    let config = Config::from_env()?;

    println!("> Preflight:");
    println!("  STORAGE={:?}", config.storage);
    println!("  CHAIN_ID={}", config.chain_id);
    println!("  DEPLOYMENT_FILE={}", config.deployment_file.display());

    // Database reachable + schema bootstrapped.
    if let Some(url) = config.database_url.as_deref() {
        let store = PgLedgerStore::connect(url, 1).await?;
        sqlx::query("SELECT 1").execute(store.pool()).await?;
        println!("  Database reachable, schema in place.");
    }

    // Basic RPC connectivity
    let rpc_url = config
        .web3_provider_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("WEB3_PROVIDER_URL is empty; nothing to check on chain"))?;
    println!("  WEB3_PROVIDER_URL={}", rpc_url);
    let client = EvmClient::new(rpc_url)?;
    let chain_id = client.chain_id().await?;
    if chain_id != config.chain_id {
        return Err(anyhow::anyhow!(
            "RPC endpoint is on chain {} but CHAIN_ID={}",
            chain_id,
            config.chain_id
        ));
    }
    println!("  Chain id matches ({}).", chain_id);
    println!("  Latest block: {}", client.block_number().await?);

    // Factory deployed
    let factory = match &record_factory {
        Some(addr) => Some(normalize_address(addr)?),
        None => evm::resolve_factory_address(&config),
    };
    let factory = factory.ok_or_else(|| {
        anyhow::anyhow!(
            "No event factory address. Set EVENT_FACTORY_ADDRESS or re-run with --record-factory <address>"
        )
    })?;
    let code = client.get_code(&factory).await?;
    if code == "0x" || code.is_empty() {
        return Err(anyhow::anyhow!("No contract code at event factory {}", factory));
    }
    println!("  Event factory {} is deployed ({} bytes of code).", factory, code.len().saturating_sub(2) / 2);

    if record_factory.is_some() {
        let network = arg_value(&args, "--network").unwrap_or_else(|| match chain_id {
            97 => "bscTestnet".to_string(),
            56 => "bsc".to_string(),
            _ => format!("chain-{}", chain_id),
        });
        let info = DeploymentInfo::for_event_factory(&network, chain_id, "unknown", &factory);
        info.save(&config.deployment_file)?;
        println!("  Recorded factory in {}.", config.deployment_file.display());
    }

    println!("> Preflight OK.");
    Ok(())
}
