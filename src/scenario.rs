//! The built-in conformance script for the task management API.

use serde_json::json;

use crate::suite::{extract, TestStep};

pub const SUITE_TITLE: &str = "Task Management API - Integration Tests";

pub const HEALTH: &str = "Health endpoints";
pub const TASKS: &str = "Tasks endpoints";
pub const USERS: &str = "Users endpoints";
pub const CLEANUP: &str = "Cleanup";

/// Binding holding the id of the task created by the script.
pub const TASK_ID: &str = "task_id";
/// Binding holding the id of the first user returned by `GET /users`.
pub const USER_ID: &str = "user_id";

/// Every step, in execution order.
///
/// The created task is deleted last; the step after the delete confirms
/// the task is gone.
pub fn task_api_steps() -> Vec<TestStep> {
    let new_task = json!({
        "title": "Integration Test Task",
        "description": "Created by test script",
        "priority": "MEDIUM",
        "dueDate": "2026-03-01",
    });

    vec![
        TestStep::get("GET /health (public)", "/health")
            .anonymous()
            .in_group(HEALTH),
        TestStep::get("GET /tasks (list)", "/tasks").in_group(TASKS),
        TestStep::post("POST /tasks (create)", "/tasks")
            .with_literal_json(new_task.clone())
            .expect(201)
            .on_success(extract::pointer(TASK_ID, "/data/id"))
            .in_group(TASKS),
        TestStep::get("GET /tasks/{id} (get)", "/tasks/{task_id}").in_group(TASKS),
        TestStep::put("PUT /tasks/{id} (update)", "/tasks/{task_id}")
            .with_literal_json(json!({
                "title": "Updated Test Task",
                "status": "IN_PROGRESS",
                "priority": "HIGH",
            }))
            .in_group(TASKS),
        TestStep::get("GET /tasks/{id} (not found)", "/tasks/nonexistent-id-12345")
            .expect(404)
            .in_group(TASKS),
        TestStep::post("POST /tasks (no auth)", "/tasks")
            .with_literal_json(new_task)
            .anonymous()
            .expect(401)
            .in_group(TASKS),
        TestStep::get("GET /users/me", "/users/me").in_group(USERS),
        TestStep::get("GET /users (list)", "/users")
            .on_success(extract::first_pointer(
                USER_ID,
                ["/data/0/id", "/data/0/userId"],
            ))
            .in_group(USERS),
        TestStep::get("GET /users/{id}", "/users/{user_id}").in_group(USERS),
        TestStep::get("GET /users/{id} (not found)", "/users/nonexistent-user-12345")
            .expect(404)
            .in_group(USERS),
        TestStep::delete("DELETE /tasks/{id}", "/tasks/{task_id}").in_group(CLEANUP),
        TestStep::get("GET /tasks/{id} (after delete)", "/tasks/{task_id}")
            .expect(404)
            .in_group(CLEANUP),
    ]
}
