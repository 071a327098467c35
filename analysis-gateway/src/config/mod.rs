//! Configuration: provider/model settings and gateway tuning, loaded from
//! environment variables.

pub mod default_config;
pub mod gateway_config;
pub mod llm_model_config;
pub mod llm_provider;

use std::collections::HashMap;

/// Source of configuration variables.
///
/// The process environment in production; a plain map in tests so
/// configuration can be exercised without touching global state.
pub trait VarSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
