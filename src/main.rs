use clap::Parser;
use tracing_subscriber::EnvFilter;

use app_crawler::cli::commands::{cmd_crawl, cmd_inspect};
use app_crawler::cli::config::{Cli, Commands, load_config};

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    let result = match &cli.command {
        Commands::Crawl(args) => cmd_crawl(args, &config, cli.verbose).map(|_| ()),
        Commands::Inspect {
            endpoint,
            signature_length,
        } => cmd_inspect(endpoint.as_deref(), *signature_length, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
