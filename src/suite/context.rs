use crate::env::{expand_placeholders, EnvMap, PlaceholderError};

/// State threaded through one run: the credential and every binding
/// captured so far.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    credential: Option<String>,
    bindings: EnvMap,
}

impl RunContext {
    pub fn new(credential: Option<String>) -> Self {
        Self {
            credential,
            bindings: EnvMap::new(),
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn bindings(&self) -> &EnvMap {
        &self.bindings
    }

    /// Expand `{name}` references against the current bindings.
    pub fn resolve(&self, template: &str) -> Result<String, PlaceholderError> {
        expand_placeholders(template, &self.bindings)
    }
}
