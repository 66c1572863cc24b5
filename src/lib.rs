//! Cinebot - a conversational assistant for a personal movie library
//!
//! A language model drives a bounded tool-calling loop over a fixed set of
//! media tools (search, download, availability). Each chat user gets their
//! own agent, created lazily and kept for the life of the process.

pub mod agent;
pub mod error;
pub mod llm;
pub mod services;
pub mod session;
pub mod tools;

pub use error::{CinebotError, Result};
