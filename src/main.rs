use clap::Parser;
use explore_model::cli::commands::{cmd_dump, cmd_load, init_logging};
use explore_model::cli::config::{Cli, Commands, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    let succeeded = match cli.command {
        Commands::Load {
            source,
            format,
            features_out,
        } => cmd_load(&source, &config, &format, features_out.as_deref()).await?,
        Commands::Dump { source, out } => cmd_dump(&source, &config, &out).await?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
