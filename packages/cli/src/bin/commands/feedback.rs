// ABOUTME: Feedback subcommands
// ABOUTME: Generates or shows the closing report of an ended conversation

use rehearse_cli::render::to_pretty_json;
use rehearse_cli::App;

pub async fn generate(app: &App, conversation_id: &str) -> anyhow::Result<()> {
    let feedback = app.service.generate_feedback(conversation_id).await?;
    println!("{}", to_pretty_json(&feedback)?);
    Ok(())
}

pub async fn show(app: &App, conversation_id: &str) -> anyhow::Result<()> {
    let feedback = app.service.get_feedback(conversation_id).await?;
    println!("{}", to_pretty_json(&feedback)?);
    Ok(())
}
