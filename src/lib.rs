pub mod app;
pub mod config;
pub mod orchestration;
pub mod prompts;
pub mod provider;
pub mod runtime;
pub mod shared;
pub mod storage;
pub mod templates;
