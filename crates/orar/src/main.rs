use crate::prelude::{println, *};
use clap::Parser;

mod config;
mod error;
mod fetch;
mod grid;
mod notify;
mod parse;
mod prelude;
mod sync;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Keeps a JSON copy of a school's weekly timetable PDFs"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Path to the config file (defaults to <config dir>/orar/config.toml)
    #[clap(long, env = "ORAR_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "ORAR_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Fetch, parse and store every configured timetable
    Sync(crate::sync::SyncOptions),

    /// Parse a local timetable PDF and print it as JSON
    Parse(crate::parse::ParseOptions),

    /// Show the reconstructed grid of each day zone
    Grid(crate::grid::GridOptions),

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    let default_filter = if app.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    color_eyre::install()?;

    match app.command {
        SubCommands::Sync(options) => crate::sync::run(options, app.global).await,
        SubCommands::Parse(options) => crate::parse::run(options, app.global).await,
        SubCommands::Grid(options) => crate::grid::run(options, app.global).await,
        SubCommands::Config => {
            let config = crate::config::AppConfig::load(app.global.config.as_deref())?;
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
