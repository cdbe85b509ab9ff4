use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fastui::{compile, config, scaffold, specs};

#[derive(Parser)]
#[command(name = "fastui", version, about = "Design-blueprint compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Work with blueprint specifications
    Specs {
        #[command(subcommand)]
        command: SpecsCommand,
    },
    /// Scaffold the project: blueprint folder, watcher, start script
    Init,
    /// (Re)create the blueprint watcher file
    Watch,
}

#[derive(Subcommand)]
enum SpecsCommand {
    /// List blueprint files under a folder (or matching a single file name)
    List {
        #[arg(default_value = config::BLUEPRINTS_DIR)]
        path: String,
    },
    /// Build component sources from blueprints
    Build {
        #[arg(default_value = config::BLUEPRINTS_DIR)]
        path: String,
    },
    /// Import the design document and write blueprints
    Automate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Specs { command } => match command {
            SpecsCommand::List { path } => {
                for spec in specs::read_specs(&path) {
                    println!("{}", spec.display());
                }
            }
            SpecsCommand::Build { path } => {
                compile::build_specs(&path).await?;
                println!("Done build from specs");
            }
            SpecsCommand::Automate => {
                let figma = config::figma_config().await?;
                compile::automate(&figma).await?;
                println!("Done write specs from design document");
            }
        },
        Command::Init => {
            scaffold::ensure_blueprint_folder(&cwd.join(config::BLUEPRINTS_DIR)).await?;
            scaffold::ensure_watch_file(&cwd).await?;
            scaffold::ensure_start_script(&cwd).await?;
            println!("Done initiate");
        }
        Command::Watch => {
            scaffold::ensure_watch_file(&cwd).await?;
            println!("Done create watch file");
        }
    }

    Ok(())
}
