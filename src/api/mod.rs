pub mod generation_client;
pub mod openai_api;

pub use generation_client::GenerationClient;
pub use openai_api::OpenAiApi;
