pub mod client;
pub mod config;

pub use client::{AnswerRequest, AnswerResponse, HealthResponse, InferenceApi, InferenceClient};
pub use config::ApiConfig;
