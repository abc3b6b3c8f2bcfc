/// Feedback lifecycle through the router against a real database
///
/// ```text
/// DATABASE_URL=postgresql://... cargo test -p feedtrack-api --test feedback_flow_test -- --ignored
/// ```

mod common;

use axum::http::StatusCode;
use common::{TestContext, TestUser};
use serde_json::{json, Value};

async fn give_feedback(ctx: &TestContext, manager: &TestUser, employee: &TestUser, sentiment: &str) -> Value {
    let response = ctx
        .post(
            "/api/feedback",
            manager,
            json!({
                "employee_id": employee.id,
                "strengths": "Owns incidents end to end",
                "areas_to_improve": "Write things down",
                "overall_sentiment": sentiment,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["id"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_feedback_is_authored_by_team_manager() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let outsider = ctx.manager().await;
    let employee = ctx.employee(&manager).await;

    let feedback = give_feedback(&ctx, &manager, &employee, "positive").await;
    assert_eq!(feedback["manager_id"], manager.id.to_string());
    assert_eq!(feedback["employee_id"], employee.id.to_string());
    assert_eq!(feedback["is_acknowledged"], false);

    let response = ctx
        .post(
            "/api/feedback",
            &outsider,
            json!({
                "employee_id": employee.id,
                "strengths": "x",
                "areas_to_improve": "y",
                "overall_sentiment": "neutral",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_employee_cannot_write_feedback() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let employee = ctx.employee(&manager).await;

    let response = ctx
        .post(
            "/api/feedback",
            &employee,
            json!({
                "employee_id": employee.id,
                "strengths": "Me",
                "areas_to_improve": "Nothing",
                "overall_sentiment": "positive",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Manager access required");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_acknowledge_exactly_once() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let employee = ctx.employee(&manager).await;
    let feedback = give_feedback(&ctx, &manager, &employee, "neutral").await;
    let uri = format!("/api/feedback/{}/acknowledge", feedback["id"].as_str().unwrap());

    let first = ctx.post(&uri, &employee, json!({})).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["feedback"]["is_acknowledged"], true);
    let acknowledged_at = first.body["feedback"]["acknowledged_at"].clone();
    assert!(acknowledged_at.is_string());

    let second = ctx.post(&uri, &employee, json!({})).await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let after = ctx
        .get(&format!("/api/feedback/{}", feedback["id"].as_str().unwrap()), &employee)
        .await;
    assert_eq!(after.body["is_acknowledged"], true);
    assert_eq!(after.body["acknowledged_at"], acknowledged_at);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_only_recipient_acknowledges() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let employee = ctx.employee(&manager).await;
    let teammate = ctx.employee(&manager).await;
    let feedback = give_feedback(&ctx, &manager, &employee, "negative").await;
    let uri = format!("/api/feedback/{}/acknowledge", feedback["id"].as_str().unwrap());

    assert_eq!(ctx.post(&uri, &teammate, json!({})).await.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.post(&uri, &manager, json!({})).await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_listing_is_scoped_by_role() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let other_manager = ctx.manager().await;
    let alice = ctx.employee(&manager).await;
    let bob = ctx.employee(&manager).await;
    let carol = ctx.employee(&other_manager).await;

    let to_alice = give_feedback(&ctx, &manager, &alice, "positive").await;
    let to_bob = give_feedback(&ctx, &manager, &bob, "neutral").await;
    let to_carol = give_feedback(&ctx, &other_manager, &carol, "negative").await;

    let as_alice = ctx.get("/api/feedback", &alice).await;
    assert_eq!(ids(&as_alice.body), vec![to_alice["id"].as_str().unwrap()]);

    // Newest first
    let as_manager = ctx.get("/api/feedback", &manager).await;
    assert_eq!(
        ids(&as_manager.body),
        vec![to_bob["id"].as_str().unwrap(), to_alice["id"].as_str().unwrap()]
    );

    let filtered = ctx.get(&format!("/api/feedback?employee_id={}", bob.id), &manager).await;
    assert_eq!(ids(&filtered.body), vec![to_bob["id"].as_str().unwrap()]);

    let outside = ctx.get(&format!("/api/feedback?employee_id={}", carol.id), &manager).await;
    assert_eq!(outside.status, StatusCode::NOT_FOUND);

    let foreign = ctx
        .get(&format!("/api/feedback/{}", to_carol["id"].as_str().unwrap()), &manager)
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_update_merges_and_checks_author() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let other_manager = ctx.manager().await;
    let employee = ctx.employee(&manager).await;
    let feedback = give_feedback(&ctx, &manager, &employee, "neutral").await;
    let uri = format!("/api/feedback/{}", feedback["id"].as_str().unwrap());

    let updated = ctx.put(&uri, &manager, json!({ "overall_sentiment": "positive" })).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["overall_sentiment"], "positive");
    assert_eq!(updated.body["strengths"], feedback["strengths"]);
    assert!(updated.body["updated_at"].is_string());

    let foreign = ctx.put(&uri, &other_manager, json!({ "strengths": "Hijacked" })).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_deleted_feedback_disappears() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let employee = ctx.employee(&manager).await;
    let feedback = give_feedback(&ctx, &manager, &employee, "positive").await;
    let id = feedback["id"].as_str().unwrap();
    let uri = format!("/api/feedback/{}", id);

    let deleted = ctx.delete(&uri, &manager).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Feedback deleted successfully");

    assert_eq!(ctx.get(&uri, &manager).await.status, StatusCode::NOT_FOUND);
    let listed = ctx.get("/api/feedback", &manager).await;
    assert!(!ids(&listed.body).contains(&id.to_string()));

    assert_eq!(ctx.delete(&uri, &manager).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_dashboards_reflect_feedback() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let employee = ctx.employee(&manager).await;

    give_feedback(&ctx, &manager, &employee, "positive").await;
    let second = give_feedback(&ctx, &manager, &employee, "negative").await;
    ctx.post(
        &format!("/api/feedback/{}/acknowledge", second["id"].as_str().unwrap()),
        &employee,
        json!({}),
    )
    .await;

    let manager_view = ctx.get("/api/dashboard/manager", &manager).await;
    assert_eq!(manager_view.status, StatusCode::OK);
    assert_eq!(manager_view.body["team_size"], 1);
    assert_eq!(manager_view.body["total_feedback_given"], 2);
    assert_eq!(manager_view.body["pending_acknowledgement"], 1);
    assert_eq!(manager_view.body["sentiment_trends"]["positive"], 1);
    assert_eq!(manager_view.body["team_members"][0]["feedback_count"], 2);

    let employee_view = ctx.get("/api/dashboard/employee", &employee).await;
    assert_eq!(employee_view.body["total_feedback_received"], 2);
    assert_eq!(employee_view.body["unacknowledged_count"], 1);
    assert_eq!(employee_view.body["recent_feedback"].as_array().unwrap().len(), 2);

    assert_eq!(ctx.get("/api/dashboard/employee", &manager).await.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.get("/api/dashboard/stats", &employee).await.status, StatusCode::FORBIDDEN);

    let stats = ctx.get("/api/dashboard/stats", &manager).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert!(stats.body["total_feedback"].as_i64().unwrap() >= 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_feedback_form_must_belong_to_author() {
    let ctx = TestContext::new().await.unwrap();
    let manager = ctx.manager().await;
    let employee = ctx.employee(&manager).await;
    let form_owner = ctx.manager().await;

    let form = ctx.post("/api/forms", &form_owner, json!({ "title": "Pulse", "fields": [] })).await;
    assert_eq!(form.status, StatusCode::CREATED, "{}", form.body);
    let form_id = form.body["id"].as_str().unwrap().to_string();

    let body = |form_id: &str| {
        json!({
            "employee_id": employee.id,
            "strengths": "x",
            "areas_to_improve": "y",
            "overall_sentiment": "neutral",
            "form_id": form_id,
        })
    };

    let foreign = ctx.post("/api/feedback", &manager, body(&form_id)).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let unknown = ctx
        .post("/api/feedback", &manager, body(&uuid::Uuid::new_v4().to_string()))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let submissions = ctx.get(&format!("/api/forms/{}/submissions", form_id), &form_owner).await;
    assert!(submissions.body.as_array().unwrap().is_empty());
    let forms = ctx.get("/api/forms", &form_owner).await;
    assert_eq!(forms.body[0]["submission_count"], 0);
}
