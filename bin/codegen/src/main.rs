use clap::Parser;
use entity_codegen_cli::{args::Args, logger::configure_logging, run};
use entity_codegen_config::load_config;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.clone(), args.overrides())?;
    configure_logging(&config.log);

    let summary = run(&config).await?;
    if summary.all_failed() {
        error!("Every configured entity failed, see the errors above");
        std::process::exit(1);
    }

    Ok(())
}
