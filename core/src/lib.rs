pub mod db;
pub mod gemini;
pub mod generation;
pub mod models;
pub mod prompts;
pub mod service;
pub mod session;
