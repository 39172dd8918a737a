pub mod edgar;
pub(crate) mod http;
pub mod llm;
