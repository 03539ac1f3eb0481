// ABOUTME: Subcommand handlers for the rehearse binary
// ABOUTME: One module per resource: question sets, conversations and feedback

pub mod conversations;
pub mod feedback;
pub mod questions;
