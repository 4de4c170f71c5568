//! LLM completion provider implementations.

/// No-op completion provider: always signals "no opinion".
pub mod null;

pub use null::NullLlmProvider;
