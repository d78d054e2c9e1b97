use color_eyre::eyre::{
    Result,
    eyre,
};
use cryptodevs_mint::{
    config::AppConfig,
    controller::MintController,
    error::AppResult,
    snapshot::MAX_SUPPLY,
    workflow::{
        TransactionOutcome,
        WorkflowKind,
    },
};
use std::path::PathBuf;
use tokio::io::{
    AsyncBufReadExt,
    BufReader,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "mint-config.json";

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: cryptodevs-mint [--config <path>] [--rpc-url <url>]\n\
         \n\
         Flags:\n\
           --config <path>  Config file to load (defaults to {DEFAULT_CONFIG_PATH})\n\
           --rpc-url <url>  Override the RPC URL from the config file\n\
         \n\
         Commands once running:\n\
           start | presale-mint | mint | state | quit"
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<(PathBuf, Option<String>)> {
    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut rpc_url: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--config requires a path argument"))?;
                if config_path.is_some() {
                    return Err(eyre!("--config may only be specified once"));
                }
                config_path = Some(PathBuf::from(path));
            }
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if rpc_url.is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                rpc_url = Some(url);
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    Ok((
        config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        rpc_url,
    ))
}

fn report(result: AppResult<TransactionOutcome>) {
    match result {
        Ok(outcome) => println!("outcome: {:?}", outcome),
        Err(e) => println!("not submitted: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let (config_path, rpc_override) = parse_cli_args()?;
    let mut config = AppConfig::load(&config_path)?;
    if let Some(url) = rpc_override {
        config.rpc_url = url;
    }

    let mut controller = MintController::new(&config)?;
    let session = controller.connect().await?;
    tracing::info!(address = %session.address, chain_id = session.chain_id, "connected");
    controller.mount()?;

    let mut snapshots = controller.snapshots();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("commands: start | presale-mint | mint | state | quit");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(snapshot) = *snapshots.borrow() {
                    println!(
                        "{} | tokens minted: {}/{MAX_SUPPLY}",
                        controller.current_state(),
                        snapshot.tokens_minted,
                    );
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "quit" | "q" => break,
                    "state" => println!("{}", controller.current_state()),
                    "start" => report(controller.run(WorkflowKind::StartPresale).await),
                    "presale-mint" => report(controller.run(WorkflowKind::PresaleMint).await),
                    "mint" => report(controller.run(WorkflowKind::PublicMint).await),
                    other => println!("unknown command: {other}"),
                }
            }
        }
    }

    controller.unmount().await;
    Ok(())
}
