use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// What a step actually saw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// The service answered with this status.
    Status { code: u16 },
    /// The request could not be built because a binding was missing;
    /// nothing was sent.
    Unresolved { reason: String },
    /// The request was sent but no HTTP response came back.
    Transport { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub name: String,
    pub method: String,
    /// Resolved path, or the raw template when resolution failed.
    pub path: String,
    pub expected_status: u16,
    pub observed: Observation,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl StepResult {
    pub fn observed_status(&self) -> Option<u16> {
        match self.observed {
            Observation::Status { code } => Some(code),
            _ => None,
        }
    }

    /// Whether the response body is worth showing to a human.
    pub fn wants_diagnostics(&self) -> bool {
        !self.passed || self.observed_status().is_some_and(|code| code >= 400)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_results(results: &[StepResult]) -> Self {
        Self {
            passed: results.iter().filter(|r| r.passed).count(),
            total: results.len(),
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

/// Every result of one run, in step declaration order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub results: Vec<StepResult>,
}

impl RunReport {
    pub fn summary(&self) -> Summary {
        Summary::from_results(&self.results)
    }

    pub fn exit_code(&self) -> i32 {
        self.summary().exit_code()
    }
}
