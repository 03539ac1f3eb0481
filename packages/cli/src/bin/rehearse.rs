// ABOUTME: rehearse binary - practice technical interviews generated from your portfolio
// ABOUTME: Parses subcommands and dispatches them to the InterviewService

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::*;
use rehearse_cli::{init_tracing, App};
use rehearse_core::QuestionCategory;

mod commands;

#[derive(Parser)]
#[command(name = "rehearse")]
#[command(about = "Rehearse - interview practice generated from your portfolio")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a question set from a portfolio text file
    Questions {
        /// Path to the portfolio text
        file: PathBuf,
    },
    /// Show the most recently generated question set
    Latest,
    /// Start (or resume) a conversation on a generated question
    Start {
        /// Question category: TECH_STACK or PROJECT
        category: QuestionCategory,
        /// Question ID from the question set
        question_id: String,
    },
    /// Answer the current question of a conversation
    Answer {
        conversation_id: String,
        /// Your answer
        text: String,
    },
    /// Show a conversation transcript
    Show { conversation_id: String },
    /// List conversations, newest first
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value = "0")]
        offset: u32,
        /// Print a summary table instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Generate the closing feedback for an ended conversation
    Feedback { conversation_id: String },
    /// Show stored feedback for a conversation
    ShowFeedback { conversation_id: String },
    /// Answer questions interactively until the conversation ends, then get feedback
    Interview { conversation_id: String },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let app = App::from_env().await?;

    match command {
        Commands::Questions { file } => commands::questions::generate(&app, &file).await,
        Commands::Latest => commands::questions::latest(&app).await,
        Commands::Start {
            category,
            question_id,
        } => commands::conversations::start(&app, category, &question_id).await,
        Commands::Answer {
            conversation_id,
            text,
        } => commands::conversations::answer(&app, &conversation_id, &text).await,
        Commands::Show { conversation_id } => commands::conversations::show(&app, &conversation_id).await,
        Commands::List {
            limit,
            offset,
            table,
        } => commands::conversations::list(&app, limit, offset, table).await,
        Commands::Feedback { conversation_id } => commands::feedback::generate(&app, &conversation_id).await,
        Commands::ShowFeedback { conversation_id } => commands::feedback::show(&app, &conversation_id).await,
        Commands::Interview { conversation_id } => {
            commands::conversations::interview(&app, &conversation_id).await
        }
    }
}
