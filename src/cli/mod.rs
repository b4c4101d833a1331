pub mod chat;
pub mod targets;
