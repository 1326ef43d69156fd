//! Scary story generator - turns a handful of keywords into a short Korean
//! horror story with a matching illustration
//!
//! The backend exposes `POST /api/generate` and calls a generative-AI
//! provider for the story and then the image. The `client` module models the
//! ad-gated submission flow that sits in front of it.

pub mod ai;
pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod keywords;
pub mod models;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
