//! LLM integration crate for docpilot.
//!
//! Provides a provider-agnostic abstraction for text generation. The
//! pipeline is responsible for prompt construction; this crate is only
//! the transport to a completion capability.
//!
//! # Providers
//! - **Ollama**: local LLM runtime (default)

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
