//! Conversational cryptocurrency price assistant
//!
//! A [`agent::CryptoAgent`] classifies each user message through an LLM and
//! answers price questions from a cached, rate-limited pricing API.

pub mod agent;
pub mod config;
pub mod pricing;
pub mod providers;
