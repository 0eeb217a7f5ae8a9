//! agentrun — drive a hosted persistent-agent run to completion.
//!
//! Creates a thread, posts a prompt, starts a run of a remote agent, polls it
//! until it finishes while approving the tool calls it blocks on, and renders
//! the thread's messages as a transcript.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentrun::prelude::*;
//!
//! # async fn example() -> agentrun::error::Result<()> {
//! let config = AgentConfig::load(None)?.validate()?;
//! let credential = Arc::new(ChainedCredential::default_chain());
//! let lines = Conversation::from_config(&config, credential)?
//!     .run_conversation("Summarize the open incidents")
//!     .await?;
//! for line in lines {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod approval;
pub mod auth;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod transcript;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
