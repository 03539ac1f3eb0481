// ABOUTME: Rehearse CLI library - application bootstrap and terminal rendering
// ABOUTME: Shared by the rehearse binary; wires config, storage, generator and cache into the service

pub mod app;
pub mod render;

pub use app::{init_tracing, App};
