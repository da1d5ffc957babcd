//! threadkit: threads, runs and tool outputs for the hosted Assistants API.
//!
//! Create a [`Conversation`](conversation::Conversation), send it a query,
//! and react to the events its run poller reports. When the assistant asks
//! for tools, answer the [`PendingToolRequest`](conversation::PendingToolRequest)
//! and polling picks up where it left off.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use threadkit::prelude::*;
//!
//! # async fn example() -> threadkit::error::Result<()> {
//! let config = ClientConfig::from_env();
//! let api = Arc::new(OpenAiAssistantsClient::from_config(&config)?);
//! let tools = ToolRegistry::new();
//!
//! let mut conversation = Conversation::create(api).await?.with_config(&config);
//! let mut events = conversation.subscribe();
//! conversation.query("What is covered?", "asst_123").await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ConversationEvent::RequiresAction(mut request) => tools.resolve(&mut request).await?,
//!         ConversationEvent::Message(text) => println!("{text}"),
//!         other if other.is_final() => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod prelude;
pub mod tools;
