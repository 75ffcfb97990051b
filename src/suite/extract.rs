//! Ready-made `on_success` extractors.

use serde_json::Value;

use super::{context::RunContext, step::Extractor};

/// Bind `name` to the scalar found at a JSON pointer (e.g. `/data/id`).
pub fn pointer(name: impl Into<String>, pointer: impl Into<String>) -> Extractor {
    first_pointer(name, [pointer.into()])
}

/// Bind `name` to the first pointer that yields a usable scalar.
///
/// Missing fields, empty strings and non-scalar values are skipped; when
/// nothing matches no binding is written.
pub fn first_pointer<I, S>(name: impl Into<String>, pointers: I) -> Extractor
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let name = name.into();
    let pointers: Vec<String> = pointers.into_iter().map(Into::into).collect();

    Box::new(move |ctx: &mut RunContext, body: &Value| {
        let found = pointers
            .iter()
            .find_map(|p| body.pointer(p).and_then(scalar_to_string));
        match found {
            Some(value) => {
                tracing::debug!(binding = %name, value = %value, "captured binding");
                ctx.bind(name.clone(), value);
            }
            None => {
                tracing::debug!(binding = %name, ?pointers, "no value to capture");
            }
        }
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pointer_binds_string_field() {
        let extractor = pointer("task_id", "/data/id");
        let mut ctx = RunContext::default();
        extractor(&mut ctx, &json!({"data": {"id": "T1"}}));
        assert_eq!(ctx.binding("task_id"), Some("T1"));
    }

    #[test]
    fn pointer_binds_numeric_field() {
        let extractor = pointer("task_id", "/data/id");
        let mut ctx = RunContext::default();
        extractor(&mut ctx, &json!({"data": {"id": 42}}));
        assert_eq!(ctx.binding("task_id"), Some("42"));
    }

    #[test]
    fn pointer_leaves_context_untouched_when_absent() {
        let extractor = pointer("task_id", "/data/id");
        let mut ctx = RunContext::default();
        extractor(&mut ctx, &json!({"message": "created"}));
        extractor(&mut ctx, &json!({"data": {"id": null}}));
        assert!(ctx.bindings().is_empty());
    }

    #[test]
    fn first_pointer_falls_back_in_order() {
        let extractor = first_pointer("user_id", ["/data/0/id", "/data/0/userId"]);

        let mut ctx = RunContext::default();
        extractor(&mut ctx, &json!({"data": [{"userId": "U7"}]}));
        assert_eq!(ctx.binding("user_id"), Some("U7"));

        let mut ctx = RunContext::default();
        extractor(&mut ctx, &json!({"data": [{"id": "", "userId": "U8"}]}));
        assert_eq!(ctx.binding("user_id"), Some("U8"));

        let mut ctx = RunContext::default();
        extractor(&mut ctx, &json!({"data": []}));
        assert_eq!(ctx.binding("user_id"), None);
    }
}
