use std::io::{self, Write};

use colored::{Color, Colorize};
use serde_json::Value;

use super::result::{Observation, StepResult, Summary};

pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Receives run progress as it happens.
pub trait ReportSink {
    fn run_started(&mut self, _total_steps: usize) {}
    fn group_started(&mut self, _group: &str) {}
    fn step_finished(&mut self, _result: &StepResult) {}
    fn run_finished(&mut self, _summary: &Summary) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ReportSink for SilentSink {}

/// Human-readable report on any writer, stdout by default.
pub struct ConsoleReporter<W = io::Stdout> {
    out: W,
    title: String,
    preview_chars: usize,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(title: impl Into<String>, preview_chars: usize) -> Self {
        Self::new(io::stdout(), title, preview_chars)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, title: impl Into<String>, preview_chars: usize) -> Self {
        Self {
            out,
            title: title.into(),
            preview_chars,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // A closed stdout is not worth aborting the run over.
    fn emit(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> ReportSink for ConsoleReporter<W> {
    fn run_started(&mut self, _total_steps: usize) {
        let rule = "=".repeat(60);
        self.emit(&rule);
        let title = self.title.bold().to_string();
        self.emit(&title);
        self.emit(&rule);
    }

    fn group_started(&mut self, group: &str) {
        let rule = "-".repeat(40);
        self.emit(&format!("\n{rule}"));
        self.emit(&group.to_uppercase().cyan().bold().to_string());
        self.emit(&rule);
    }

    fn step_finished(&mut self, result: &StepResult) {
        let icon = if result.passed { "✅" } else { "❌" };
        self.emit(&format!("\n{} {}", icon, result.name.bold()));

        let expected = format!("(expected {})", result.expected_status).dimmed();
        match &result.observed {
            Observation::Status { code } => {
                let timing = result
                    .duration_ms
                    .map(|ms| format!(" ({ms:.1} ms)").dimmed().to_string())
                    .unwrap_or_default();
                self.emit(&format!(
                    "   {} {} {}{}",
                    "Status:".bold(),
                    code.to_string().color(status_color(*code, result.passed)),
                    expected,
                    timing
                ));
            }
            Observation::Unresolved { reason } => {
                self.emit(&format!(
                    "   {} {} {}",
                    "Not sent:".bold(),
                    reason.yellow(),
                    expected
                ));
            }
            Observation::Transport { message } => {
                self.emit(&format!(
                    "   {} {} {}",
                    "No response:".bold(),
                    message.red(),
                    expected
                ));
            }
        }

        if result.wants_diagnostics() {
            if let Some(body) = &result.response_body {
                let preview = excerpt(body, self.preview_chars);
                self.emit(&format!("   {} {}", "Response:".bold(), preview.dimmed()));
            }
        }
    }

    fn run_finished(&mut self, summary: &Summary) {
        let rule = "=".repeat(60);
        self.emit(&format!("\n{rule}"));
        self.emit(&"TEST SUMMARY".bold().to_string());
        self.emit(&rule);
        self.emit(&format!(
            "\nTotal: {}/{} tests passed",
            summary.passed, summary.total
        ));

        if summary.all_passed() {
            self.emit(&format!("\n🎉 {}", "All tests passed!".green().bold()));
        } else {
            let line = format!("{} test(s) failed", summary.failed());
            self.emit(&format!("\n⚠️  {}", line.red().bold()));
        }
    }
}

fn status_color(code: u16, passed: bool) -> Color {
    if !passed || code >= 500 {
        Color::Red
    } else if code >= 400 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Pretty-printed body cut to at most `limit` characters.
pub fn excerpt(body: &Value, limit: usize) -> String {
    let rendered = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    rendered.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step_result(passed: bool, observed: Observation, body: Option<Value>) -> StepResult {
        StepResult {
            name: "GET /tasks/{id} (get)".to_string(),
            method: "GET".to_string(),
            path: "/tasks/T1".to_string(),
            expected_status: 200,
            observed,
            passed,
            response_body: body,
            duration_ms: Some(12.5),
        }
    }

    fn render(f: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
        colored::control::set_override(false);
        let mut reporter = ConsoleReporter::new(Vec::new(), "Task API", 200);
        f(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn excerpt_truncates_on_char_boundaries() {
        let body = json!({"message": "ééééé"});
        let full = excerpt(&body, 1000);
        assert!(full.contains("ééééé"));

        let cut = excerpt(&body, 18);
        assert_eq!(cut.chars().count(), 18);
        assert!(full.starts_with(&cut));
    }

    #[test]
    fn passing_step_omits_body() {
        let out = render(|r| {
            r.step_finished(&step_result(
                true,
                Observation::Status { code: 200 },
                Some(json!({"data": {"id": "T1"}})),
            ))
        });
        assert!(out.contains("✅ GET /tasks/{id} (get)"));
        assert!(out.contains("Status: 200 (expected 200) (12.5 ms)"));
        assert!(!out.contains("Response:"));
    }

    #[test]
    fn failing_step_shows_truncated_body() {
        let long = "x".repeat(500);
        let out = render(|r| {
            r.step_finished(&step_result(
                false,
                Observation::Status { code: 500 },
                Some(json!({ "error": long })),
            ))
        });
        assert!(out.contains("❌"));
        assert!(out.contains("Status: 500 (expected 200)"));
        assert!(out.contains("Response:"));
        assert!(out.contains(&"x".repeat(150)));
        assert!(!out.contains(&"x".repeat(200)));
    }

    #[test]
    fn structural_and_transport_failures_do_not_claim_a_status() {
        let out = render(|r| {
            r.step_finished(&step_result(
                false,
                Observation::Unresolved {
                    reason: "Missing template variable: task_id".to_string(),
                },
                None,
            ));
            r.step_finished(&step_result(
                false,
                Observation::Transport {
                    message: "no response from http://localhost:1/tasks".to_string(),
                },
                None,
            ));
        });
        assert!(!out.contains("Status:"));
        assert!(out.contains("Not sent: Missing template variable: task_id"));
        assert!(out.contains("No response: no response from http://localhost:1/tasks"));
    }

    #[test]
    fn summary_reports_tally_and_verdict() {
        let out = render(|r| {
            r.group_started("Tasks endpoints");
            r.run_finished(&Summary { passed: 5, total: 6 });
            r.run_finished(&Summary { passed: 6, total: 6 });
        });
        assert!(out.contains("TASKS ENDPOINTS"));
        assert!(out.contains("Total: 5/6 tests passed"));
        assert!(out.contains("1 test(s) failed"));
        assert!(out.contains("Total: 6/6 tests passed"));
        assert!(out.contains("All tests passed!"));
    }
}
