//! Mathmate is a terminal assistant for working through math questions with a
//! remote reasoning model.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session store, its durable persistence, user
//!   configuration, and the session controller that sequences submissions.
//! - [`api`] defines the wire payloads and the model orchestrator that turns
//!   conversation history plus attachments into a single request and splits
//!   the reply into an answer and an optional reasoning trace.
//! - [`render`] converts a mixed LaTeX/markdown-lite answer into structured
//!   blocks for display.
//! - [`speech`] synthesizes spoken answers and decodes the returned PCM, and
//!   declares the capability seam for dictation input.
//!
//! The binary entrypoint (`src/main.rs`) routes through [`cli::run`].

pub mod api;
pub mod cli;
pub mod core;
pub mod render;
pub mod speech;
pub mod utils;
