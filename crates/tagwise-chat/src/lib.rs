//! Per-user chat sessions and the chat turn service

mod service;
mod store;

pub use service::ChatService;
pub use store::{ChatSession, ChatSessionStore, SessionState};
