/// Access control through the HTTP surface
///
/// Missing and inaccessible resources must be indistinguishable to the
/// caller: same status, same body shape, same message.

mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestContext};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_creator_can_read_new_project() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let (status, body) = ctx
        .get(&format!("/v1/projects/{}", id_of(&project)), &alice)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Garden plans");
    assert_eq!(body["members"], json!([alice.id()]));
    assert_eq!(body["sections"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_outsider_gets_not_found_for_task() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let task = ctx.task(&alice, &section, "Plant tomatoes").await;
    let task_id = id_of(&task);

    let (status, body) = ctx.get(&format!("/v1/tasks/{task_id}"), &bob).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], format!("No task with id '{task_id}' found"));
}

#[tokio::test]
async fn test_forbidden_and_missing_render_identically() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let project_id = id_of(&project);
    let missing_id = Uuid::new_v4().to_string();

    let (forbidden_status, forbidden) = ctx.get(&format!("/v1/projects/{project_id}"), &bob).await;
    let (missing_status, missing) = ctx.get(&format!("/v1/projects/{missing_id}"), &bob).await;

    assert_eq!(forbidden_status, missing_status);
    assert_eq!(forbidden["error"], missing["error"]);
    assert_eq!(
        forbidden["message"].as_str().unwrap().replace(&project_id, "ID"),
        missing["message"].as_str().unwrap().replace(&missing_id, "ID"),
    );
}

#[tokio::test]
async fn test_malformed_section_id_is_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let (status, body) = ctx.get("/v1/sections/invalidid", &alice).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No section with id 'invalidid' found");
}

#[tokio::test]
async fn test_outsider_cannot_write_through_guarded_routes() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let mallory = ctx.user("mallory").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let task = ctx.task(&alice, &section, "Plant tomatoes").await;

    let attempts = [
        ctx.post(
            &format!("/v1/projects/{}/sections", id_of(&project)),
            &mallory,
            json!({ "sections": [{ "name": "Mine", "colour": "#000000" }] }),
        )
        .await,
        ctx.patch(
            &format!("/v1/sections/{}", id_of(&section)),
            &mallory,
            json!({ "name": "Hijacked" }),
        )
        .await,
        ctx.delete(&format!("/v1/tasks/{}", id_of(&task)), &mallory).await,
        ctx.post(
            &format!("/v1/tasks/{}/comments", id_of(&task)),
            &mallory,
            json!({ "text": "hello" }),
        )
        .await,
    ];

    for (status, body) in attempts {
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    }

    // Nothing changed
    let (status, task) = ctx.get(&format!("/v1/tasks/{}", id_of(&task)), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["comments"], json!([]));
}

#[tokio::test]
async fn test_added_member_gains_access() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let section_uri = format!("/v1/sections/{}", id_of(&section));

    let (status, _) = ctx.get(&section_uri, &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .post(
            &format!("/v1/projects/{}/members", id_of(&project)),
            &alice,
            json!({ "user_id": bob.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = ctx.get(&section_uri, &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["section"]["id"], section["id"]);
}

#[tokio::test]
async fn test_adding_unknown_member_is_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let project = ctx.project(&alice, "Garden plans").await;
    let ghost = Uuid::new_v4();

    let (status, body) = ctx
        .post(
            &format!("/v1/projects/{}/members", id_of(&project)),
            &alice,
            json!({ "user_id": ghost }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("No user with id '{ghost}' found"));
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .send(Method::GET, "/v1/projects", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_projects_are_self_only() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    ctx.project(&alice, "Garden plans").await;

    let (status, body) = ctx
        .get(&format!("/v1/users/{}/projects", alice.id()), &alice)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = ctx
        .get(&format!("/v1/users/{}/projects", alice.id()), &bob)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_project_list_only_shows_memberships() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    ctx.project(&alice, "Garden plans").await;
    ctx.project(&bob, "Kitchen remodel").await;

    let (status, body) = ctx.get("/v1/projects", &bob).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Kitchen remodel"]);
}

#[tokio::test]
async fn test_bulk_comments_names_only_missing_ids() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let task = ctx.task(&alice, &section, "Water plants").await;
    let (status, comment) = ctx
        .post(
            &format!("/v1/tasks/{}/comments", id_of(&task)),
            &alice,
            json!({ "text": "Every morning" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["owner_id"], alice.id());

    let c1 = id_of(&comment);
    let c2 = Uuid::new_v4().to_string();

    let (status, body) = ctx.get(&format!("/v1/comments?ids={c1},{c2}"), &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Comments not found: `{c2}`"));

    let (status, body) = ctx.get(&format!("/v1/comments?ids={c1}"), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["text"], "Every morning");
}

#[tokio::test]
async fn test_bulk_comments_hide_other_projects() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let task = ctx.task(&alice, &section, "Water plants").await;
    let (_, comment) = ctx
        .post(
            &format!("/v1/tasks/{}/comments", id_of(&task)),
            &alice,
            json!({ "text": "Every morning" }),
        )
        .await;
    let c1 = id_of(&comment);

    let (status, body) = ctx.get(&format!("/v1/comments?ids={c1}"), &bob).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Comments not found: `{c1}`"));
}

#[tokio::test]
async fn test_bulk_endpoints_accept_empty_ids() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    for uri in ["/v1/comments", "/v1/comments?ids=", "/v1/tasks", "/v1/tags?ids=,"] {
        let (status, body) = ctx.get(uri, &alice).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn test_bulk_tasks_missing_wins_over_forbidden() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let hidden = id_of(&ctx.task(&alice, &section, "Plant tomatoes").await);
    let missing = Uuid::new_v4().to_string();

    let (status, body) = ctx
        .get(&format!("/v1/tasks?ids={hidden},{missing}"), &bob)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Tasks not found: `{missing}`"));

    let (status, body) = ctx.get(&format!("/v1/tasks?ids={hidden}"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Tasks not found: `{hidden}`"));
}

#[tokio::test]
async fn test_bulk_tasks_in_request_order() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let first = id_of(&ctx.task(&alice, &section, "First").await);
    let second = id_of(&ctx.task(&alice, &section, "Second").await);

    let (status, body) = ctx
        .get(&format!("/v1/tasks?ids={second},{first},{second}"), &alice)
        .await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_bulk_tasks_collapse_spellings_of_one_id() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let task = id_of(&ctx.task(&alice, &section, "Water beds").await);
    let upper = task.to_uppercase();

    let (status, body) = ctx
        .get(&format!("/v1/tasks?ids={task},{upper}"), &alice)
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], task);
}

#[tokio::test]
async fn test_tags_are_reached_through_their_project() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let (status, tag) = ctx
        .post(
            &format!("/v1/projects/{}/tags", id_of(&project)),
            &alice,
            json!({ "name": "urgent", "colour": "#ff0000" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{tag}");
    let tag_id = id_of(&tag);

    let (status, body) = ctx.get(&format!("/v1/tags?ids={tag_id}"), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "urgent");

    let (status, body) = ctx.get(&format!("/v1/tags?ids={tag_id}"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Tags not found: `{tag_id}`"));

    let (status, _) = ctx
        .patch(&format!("/v1/tags/{tag_id}"), &bob, json!({ "name": "mine" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&format!("/v1/tags/{tag_id}"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .patch(&format!("/v1/tags/{tag_id}"), &alice, json!({ "name": "later" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "later");
    assert_eq!(body["colour"], "#ff0000");
}
