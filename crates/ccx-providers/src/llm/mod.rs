//! LLM clients

pub mod openai;

pub use openai::OpenAiCompatClient;
