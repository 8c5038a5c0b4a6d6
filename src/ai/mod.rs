pub mod backend;
pub mod generator;
pub mod ollama;
pub mod prompts;
pub mod stub;
pub mod utils;

pub use backend::InferenceBackend;
pub use generator::MetadataGenerator;
pub use ollama::OllamaBackend;
pub use stub::StubBackend;
