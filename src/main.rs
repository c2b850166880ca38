use clap::Parser;

use notification_hub::cli::{self, Cli, CommandOutcome};
use notification_hub::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    cli::init_logger_from_settings(&settings)?;

    match cli::execute_command(&cli, settings.clone()).await? {
        CommandOutcome::StartServer => Server::new(settings).run().await,
        CommandOutcome::Exit => Ok(()),
    }
}
