mod cli;
mod config;
mod conversation;
mod error;
mod gemini_client;
mod targets;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_print::cformat;
use dotenv::dotenv;
use eyre::{Result, WrapErr};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::{prompt, ChatContext};
use crate::cli::targets::{list_contacts, list_targets, remove_target, select_targets};
use crate::config::GeminiConfig;
use crate::conversation::{ConversationController, QuestionSet};
use crate::gemini_client::GeminiClient;
use crate::targets::{pick_random, KeyValueStore, TargetStore};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a few questions about someone and get conversation starters
    Chat {
        /// Who you want to reconnect with
        #[arg(short, long)]
        name: String,

        /// Answer to use instead of prompting; repeat once per question
        #[arg(short, long = "answer")]
        answers: Vec<String>,
    },
    /// Pick a random saved target and start a chat
    Random {
        /// Start without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Manage the saved targets
    Targets {
        #[command(subcommand)]
        command: TargetsCommand,
    },
    /// List contacts from an exported address book
    Contacts {
        /// JSON array of {id, name, phoneNumbers}
        file: PathBuf,

        /// Filter by name or phone number
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
enum TargetsCommand {
    /// Show the saved targets
    List,
    /// Forget a saved target
    Remove { id: String },
    /// Toggle contacts from an exported address book in or out of the targets
    Select {
        file: PathBuf,

        /// Contact id to toggle; repeatable
        #[arg(short, long = "toggle")]
        toggles: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("Failed to set tracing subscriber")?;

    let store = TargetStore::new(KeyValueStore::open(&config::data_dir()?));
    let mut stdout = io::stdout();

    match cli.command {
        Commands::Chat { name, answers } => {
            if name.trim().is_empty() {
                eyre::bail!("--name cannot be empty");
            }
            run_chat(&store, &name, answers).await
        }
        Commands::Random { yes } => {
            let targets = store.load()?;
            let Some(target) = pick_random(&targets, &mut rand::thread_rng()) else {
                println!("No named targets are saved, so a random selection cannot be made.");
                return Ok(ExitCode::FAILURE);
            };
            info!(id = %target.id, "Randomly selected target");

            if !yes && !prompt::confirm(&format!("Start Linkle with '{}'?", target.name))? {
                return Ok(ExitCode::SUCCESS);
            }
            run_chat(&store, &target.name, Vec::new()).await
        }
        Commands::Targets { command } => {
            match command {
                TargetsCommand::List => list_targets(&mut stdout, &store)?,
                TargetsCommand::Remove { id } => remove_target(&mut stdout, &store, &id)?,
                TargetsCommand::Select { file, toggles } => {
                    select_targets(&mut stdout, &store, &file, &toggles)?
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Contacts { file, search } => {
            list_contacts(&mut stdout, &store, &file, search.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_chat(store: &TargetStore, name: &str, answers: Vec<String>) -> Result<ExitCode> {
    let client = match GeminiConfig::from_env()
        .map_err(eyre::Report::from)
        .and_then(|config| GeminiClient::new(&config).map_err(eyre::Report::from))
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", cformat!("<red>Failed to initialize Gemini client:</red> {}", e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let show_welcome = !store.onboarding_completed()?;
    if show_welcome {
        store.mark_onboarding_completed()?;
    }

    let controller = ConversationController::new(client, QuestionSet::default());
    let mut chat = ChatContext::new(Box::new(io::stdout()), answers, show_welcome, controller);
    chat.run(name).await
}
