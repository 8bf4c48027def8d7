pub mod llm_logs;
pub mod response;
