// ABOUTME: Terminal rendering for transcripts, feedback and conversation listings
// ABOUTME: JSON for scripting, colored text and tables for interactive use

use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use rehearse_core::{parse_timestamp, truncate, TurnRole};
use rehearse_interview::{ConversationView, Feedback, Turn};
use serde::Serialize;

pub fn to_pretty_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One transcript line with a speaker label
pub fn turn_line(turn: &Turn) -> String {
    match turn.role {
        TurnRole::Prompt => format!("{} {}", "Interviewer:".cyan().bold(), turn.content),
        TurnRole::Response => format!("{} {}", "You:".green().bold(), turn.content),
    }
}

pub fn transcript(view: &ConversationView) -> String {
    view.turns.iter().map(turn_line).collect::<Vec<_>>().join("\n")
}

pub fn feedback_report(feedback: &Feedback) -> String {
    let sections = [
        ("Summary", &feedback.content),
        ("Strengths", &feedback.strengths),
        ("To improve", &feedback.improvement_points),
        ("Overall impression", &feedback.overall_impression),
        ("Advice", &feedback.additional_advice),
    ];

    sections
        .iter()
        .map(|(title, body)| format!("{}\n{}", title.blue().bold(), body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn short_timestamp(value: &str) -> String {
    parse_timestamp(value)
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

pub fn conversation_table(views: &[ConversationView]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["ID", "Category", "Status", "Turns", "Seed question", "Created"]);

    for view in views {
        let conversation = &view.conversation;
        table.add_row(vec![
            conversation.id.clone(),
            conversation.category.to_string(),
            conversation.status.to_string(),
            view.turns.len().to_string(),
            truncate(&conversation.seed_question_text, 48).to_string(),
            short_timestamp(&conversation.created_at),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rehearse_core::{ConversationStatus, QuestionCategory};
    use rehearse_interview::Conversation;

    fn view() -> ConversationView {
        let turn = |position: i64, role: TurnRole, content: &str| Turn {
            id: format!("turn-{:04}", position),
            conversation_id: "conv-0001".to_string(),
            position,
            role,
            content: content.to_string(),
            evaluator_note: None,
            purpose: None,
            created_at: "2026-10-01T00:00:00Z".to_string(),
        };

        ConversationView {
            conversation: Conversation {
                id: "conv-0001".to_string(),
                seed_question_id: "seed-0001".to_string(),
                seed_question_text: "Why did you choose PostgreSQL?".to_string(),
                category: QuestionCategory::TechStack,
                status: ConversationStatus::Ongoing,
                turn_count: 2,
                created_at: "2026-10-01T00:00:00Z".to_string(),
                updated_at: "2026-10-01T00:00:00Z".to_string(),
            },
            turns: vec![
                turn(0, TurnRole::Prompt, "Why did you choose PostgreSQL?"),
                turn(1, TurnRole::Response, "For ACID guarantees"),
            ],
            completion_message: None,
        }
    }

    #[test]
    fn test_transcript_labels_speakers() {
        colored::control::set_override(false);
        assert_eq!(
            transcript(&view()),
            "Interviewer: Why did you choose PostgreSQL?\nYou: For ACID guarantees"
        );
    }

    #[test]
    fn test_json_output_uses_wire_codes() {
        let json = to_pretty_json(&view()).unwrap();
        assert!(json.contains("\"status\": \"ONGOING\""));
        assert!(json.contains("\"category\": \"TECH_STACK\""));
        assert!(!json.contains("completion_message"));
    }

    #[test]
    fn test_short_timestamp_falls_back_to_raw_value() {
        assert_eq!(short_timestamp("2026-10-01T09:30:00Z"), "2026-10-01 09:30");
        assert_eq!(short_timestamp("not a date"), "not a date");
    }

    #[test]
    fn test_table_has_one_row_per_conversation() {
        let table = conversation_table(&[view(), view()]);
        assert_eq!(table.row_iter().count(), 2);
    }
}
