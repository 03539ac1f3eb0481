// ABOUTME: Conversation subcommands and the interactive interview loop
// ABOUTME: Advances conversations one answer at a time and prints transcripts

use colored::*;
use inquire::Text;
use rehearse_cli::render::{conversation_table, feedback_report, to_pretty_json, transcript, turn_line};
use rehearse_cli::App;
use rehearse_core::QuestionCategory;
use rehearse_interview::Page;

pub async fn start(app: &App, category: QuestionCategory, question_id: &str) -> anyhow::Result<()> {
    let view = app.service.start_conversation(category, question_id).await?;
    println!("{}", to_pretty_json(&view)?);
    Ok(())
}

pub async fn answer(app: &App, conversation_id: &str, text: &str) -> anyhow::Result<()> {
    let view = app.service.advance_conversation(conversation_id, text).await?;
    println!("{}", to_pretty_json(&view)?);
    Ok(())
}

pub async fn show(app: &App, conversation_id: &str) -> anyhow::Result<()> {
    let view = app.service.get_conversation(conversation_id).await?;
    println!("{}", to_pretty_json(&view)?);
    Ok(())
}

pub async fn list(app: &App, limit: Option<u32>, offset: u32, table: bool) -> anyhow::Result<()> {
    let page = Page { limit, offset };
    let views = app.service.list_conversations(page).await?;

    if table {
        if views.is_empty() {
            println!("{}", "No conversations yet".yellow());
            println!("{}", "Use 'rehearse questions <file>' to generate some".dimmed());
        } else {
            println!("{}", conversation_table(&views));
            println!("Total: {} conversations", views.len().to_string().cyan());
        }
    } else {
        println!("{}", to_pretty_json(&views)?);
    }
    Ok(())
}

pub async fn interview(app: &App, conversation_id: &str) -> anyhow::Result<()> {
    let mut view = app.service.get_conversation(conversation_id).await?;
    println!("{}", transcript(&view));

    while !view.status().is_ended() {
        let answer = Text::new("Your answer:").prompt()?;
        if answer.trim().is_empty() {
            continue;
        }

        match app.service.advance_conversation(conversation_id, &answer).await {
            Ok(next) => {
                view = next;
                if let Some(turn) = view.last_turn() {
                    println!("{}", turn_line(turn));
                }
            }
            Err(e) if e.is_retryable() => {
                eprintln!("{} {}", "Please answer again:".yellow(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!();
    println!("{}", "Generating feedback...".dimmed());
    let feedback = app.service.generate_feedback(conversation_id).await?;
    println!("{}", feedback_report(&feedback));
    Ok(())
}
