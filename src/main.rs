use alphalend_report::{
    error::error_chain, telemetry, AlphalendClient, ReportConfig, ReportError, ReportGenerator, DETAIL_MARKET_ID,
    TBTC_COIN_TYPE,
};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "alphalend-report")]
#[command(about = "Report tBTC market totals on AlphaLend")]
struct Args {
    /// Only print market 14 as one line of compact JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init_tracing("warn");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error while fetching TBTC data: {}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), ReportError> {
    let config = ReportConfig::from_env()?;
    let client = Arc::new(AlphalendClient::from_config(&config)?);
    let report = ReportGenerator::new(client, TBTC_COIN_TYPE, DETAIL_MARKET_ID);

    let mut out = std::io::stdout();
    if args.json {
        report.run_json(&mut out).await?;
    } else {
        report.run(&mut out).await?;
    }
    Ok(())
}
