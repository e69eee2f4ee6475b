pub mod config;
pub mod generator;
pub mod io;
pub mod llm;
pub mod models;
pub mod render;
pub mod session;
pub mod tokens;
