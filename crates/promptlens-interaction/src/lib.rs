//! Interaction layer for PromptLens.
//!
//! Adapters that speak to external generative-model APIs and expose them
//! through the core `TransformGateway` trait.

pub mod gemini_gateway;

pub use gemini_gateway::GeminiGateway;
