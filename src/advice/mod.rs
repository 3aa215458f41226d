pub mod client;
pub mod worker;

pub use client::{AdviceModel, AdviceRequest, GeminiClient, DEFAULT_MODEL};
pub use worker::{advice_or_fallback, fallback_advice, AdvicePipeline};
