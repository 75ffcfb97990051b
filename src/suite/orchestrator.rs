use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::executor::RequestExecutor;

use super::{
    context::RunContext,
    printer::ReportSink,
    result::{Observation, RunReport, StepResult},
    step::TestStep,
};

/// Runs a step script against a [`RequestExecutor`], one step at a time.
#[derive(Debug)]
pub struct Orchestrator<E> {
    executor: E,
}

impl<E: RequestExecutor> Orchestrator<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Execute `steps` in order and collect one result per step.
    ///
    /// No step failure aborts the run. A step whose path or payload refers
    /// to an unbound name is recorded as failed without being sent.
    pub async fn run(
        &self,
        steps: &[TestStep],
        credential: Option<String>,
        sink: &mut dyn ReportSink,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut ctx = RunContext::new(credential);
        let mut results = Vec::with_capacity(steps.len());
        let mut current_group: Option<&str> = None;

        info!(%run_id, steps = steps.len(), "starting run");
        sink.run_started(steps.len());

        for (index, step) in steps.iter().enumerate() {
            if let Some(group) = step.group.as_deref() {
                if current_group != Some(group) {
                    sink.group_started(group);
                    current_group = Some(group);
                }
            }

            let span = info_span!("step", index, name = %step.name);
            let result = self.run_step(step, &mut ctx).instrument(span).await;
            sink.step_finished(&result);
            results.push(result);
        }

        let report = RunReport {
            run_id,
            started_at,
            results,
        };
        let summary = report.summary();
        info!(%run_id, passed = summary.passed, total = summary.total, "run finished");
        sink.run_finished(&summary);
        report
    }

    async fn run_step(&self, step: &TestStep, ctx: &mut RunContext) -> StepResult {
        let request = match step.resolve(ctx) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "step not sent: unresolved binding");
                return StepResult {
                    name: step.name.clone(),
                    method: step.method.to_string(),
                    path: step.path.clone(),
                    expected_status: step.expected_status,
                    observed: Observation::Unresolved {
                        reason: err.to_string(),
                    },
                    passed: false,
                    response_body: None,
                    duration_ms: None,
                };
            }
        };

        let outcome = self.executor.execute(&request).await;
        let (observed, passed, response_body, duration_ms) = match outcome {
            Ok(response) => {
                let passed = response.status == step.expected_status;
                if passed {
                    step.capture(ctx, &response.body);
                }
                (
                    Observation::Status {
                        code: response.status,
                    },
                    passed,
                    Some(response.body),
                    Some(response.duration_ms),
                )
            }
            Err(err) => {
                warn!(error = %err, "transport failure");
                (
                    Observation::Transport {
                        message: err.to_string(),
                    },
                    false,
                    None,
                    None,
                )
            }
        };

        StepResult {
            name: step.name.clone(),
            method: request.method.to_string(),
            path: request.path,
            expected_status: step.expected_status,
            observed,
            passed,
            response_body,
            duration_ms,
        }
    }
}
