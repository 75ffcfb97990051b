use std::fmt;

use reqwest::Method;
use serde_json::{Map, Value};

use crate::env::PlaceholderError;
use crate::executor::ApiRequest;

use super::context::RunContext;

pub type PayloadBuilder =
    Box<dyn Fn(&RunContext) -> Result<Value, PlaceholderError> + Send + Sync>;
pub type Extractor = Box<dyn Fn(&mut RunContext, &Value) + Send + Sync>;

/// One request, its expected status, and an optional binding capture.
///
/// Built with chained setters:
///
/// ```
/// use taskprobe::suite::{extract, TestStep};
/// use serde_json::json;
///
/// let step = TestStep::post("POST /tasks (create)", "/tasks")
///     .with_json(json!({ "title": "Integration Test Task" }))
///     .expect(201)
///     .on_success(extract::pointer("task_id", "/data/id"));
/// assert_eq!(step.expected_status, 201);
/// ```
pub struct TestStep {
    pub name: String,
    pub group: Option<String>,
    pub method: Method,
    /// Request path; `{name}` segments are filled from bindings.
    pub path: String,
    pub uses_credential: bool,
    pub expected_status: u16,
    payload: Option<PayloadBuilder>,
    on_success: Option<Extractor>,
}

impl TestStep {
    /// Authenticated step expecting `200`.
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            method,
            path: path.into(),
            uses_credential: true,
            expected_status: 200,
            payload: None,
            on_success: None,
        }
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::GET, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::POST, path)
    }

    pub fn put(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::PUT, path)
    }

    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::DELETE, path)
    }

    pub fn expect(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// Send the request without the run's credential.
    pub fn anonymous(mut self) -> Self {
        self.uses_credential = false;
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// JSON payload whose string leaves are templates.
    ///
    /// `{name}` is filled from bindings, so literal braces must be escaped
    /// as `\{` and `\}`. Use [`TestStep::with_literal_json`] for bodies
    /// that reference no bindings.
    pub fn with_json(self, payload: Value) -> Self {
        self.with_payload(move |ctx| expand_value(&payload, ctx))
    }

    /// JSON payload sent exactly as given.
    pub fn with_literal_json(self, payload: Value) -> Self {
        self.with_payload(move |_| Ok(payload.clone()))
    }

    pub fn with_payload<F>(mut self, builder: F) -> Self
    where
        F: Fn(&RunContext) -> Result<Value, PlaceholderError> + Send + Sync + 'static,
    {
        self.payload = Some(Box::new(builder));
        self
    }

    pub fn on_success(mut self, extractor: Extractor) -> Self {
        self.on_success = Some(extractor);
        self
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn has_extractor(&self) -> bool {
        self.on_success.is_some()
    }

    /// Build the concrete request for this step against the current context.
    pub fn resolve(&self, ctx: &RunContext) -> Result<ApiRequest, PlaceholderError> {
        let path = ctx.resolve(&self.path)?;
        let payload = self.payload.as_ref().map(|build| build(ctx)).transpose()?;
        let credential = if self.uses_credential {
            ctx.credential().map(str::to_string)
        } else {
            None
        };

        Ok(ApiRequest {
            method: self.method.clone(),
            path,
            payload,
            credential,
        })
    }

    pub(crate) fn capture(&self, ctx: &mut RunContext, body: &Value) {
        if let Some(extract) = &self.on_success {
            extract(ctx, body);
        }
    }
}

impl fmt::Debug for TestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestStep")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("uses_credential", &self.uses_credential)
            .field("expected_status", &self.expected_status)
            .field("payload", &self.payload.is_some())
            .field("on_success", &self.on_success.is_some())
            .finish()
    }
}

fn expand_value(value: &Value, ctx: &RunContext) -> Result<Value, PlaceholderError> {
    Ok(match value {
        Value::String(s) => Value::String(ctx.resolve(s)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| expand_value(item, ctx))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut expanded = Map::with_capacity(map.len());
            for (key, item) in map {
                expanded.insert(key.clone(), expand_value(item, ctx)?);
            }
            Value::Object(expanded)
        }
        other => other.clone(),
    })
}
