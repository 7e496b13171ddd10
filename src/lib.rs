pub mod app;
pub mod config;
pub mod conversation;
pub mod ollama;
pub mod persistence;
pub mod render;
pub mod shared;
