// ABOUTME: Question-set subcommands
// ABOUTME: Generates a set from a portfolio file and prints stored sets as JSON

use std::path::Path;

use anyhow::Context;
use rehearse_cli::render::to_pretty_json;
use rehearse_cli::App;

pub async fn generate(app: &App, file: &Path) -> anyhow::Result<()> {
    let portfolio = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read portfolio from {}", file.display()))?;

    let set = app.service.generate_question_set(&portfolio).await?;
    println!("{}", to_pretty_json(&set)?);
    Ok(())
}

pub async fn latest(app: &App) -> anyhow::Result<()> {
    let set = app.service.latest_question_set().await?;
    println!("{}", to_pretty_json(&set)?);
    Ok(())
}
