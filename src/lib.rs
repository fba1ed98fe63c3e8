pub mod attributes;
pub mod client;
pub mod config;
pub mod filter;
pub mod insight;
pub mod metadata;
pub mod openai;
pub mod orchestrator;
pub mod render;
pub mod server;
pub mod widget;
