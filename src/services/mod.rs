// src/services/mod.rs
pub mod content_store;
pub mod gemini;
pub mod generation;
pub mod response_filter;
pub mod session_manager;
pub mod turn_processor;
