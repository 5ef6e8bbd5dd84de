//! End-to-end flows against a real Postgres. Set `TEST_DATABASE_URL` to run.

mod common;

use axum::http::{Method, StatusCode};
use finmind::{app::build_app, state::AppState};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{send, unique_email};

async fn call(state: &AppState, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    send(build_app(state.clone()), method, uri, token, body).await
}

async fn register(state: &AppState) -> (String, Value) {
    let (status, body) = call(
        state,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Tester", "email": unique_email(), "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (body["token"].as_str().unwrap().to_string(), body["user"].clone())
}

async fn own_category(state: &AppState, token: &str, kind: &str) -> String {
    let (status, body) = call(
        state,
        Method::POST,
        "/api/v1/categories",
        Some(token),
        Some(json!({
            "name": format!("cat-{}", Uuid::new_v4().simple()),
            "type": kind,
            "icon": "tag",
            "color": "#123456",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn add_bill(state: &AppState, token: &str, category: &str, kind: &str, amount: f64, time: &str) -> Value {
    let (status, body) = call(
        state,
        Method::POST,
        "/api/v1/bills",
        Some(token),
        Some(json!({
            "type": kind,
            "amount": amount,
            "category_id": category,
            "merchant": "Corner Shop",
            "bill_time": time,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn register_login_and_profile() {
    let state = require_db!();
    let email = unique_email();
    let payload = json!({ "name": "Ann", "email": email.to_uppercase(), "password": "secret123" });

    let (status, body) = call(&state, Method::POST, "/api/v1/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"].get("password_hash").is_none());

    let (status, _) = call(&state, Method::POST, "/api/v1/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &state,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = call(
        &state,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap();

    let (status, updated) = call(
        &state,
        Method::PUT,
        "/api/v1/user/profile",
        Some(token),
        Some(json!({ "name": "Ann Lee" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ann Lee");

    let (status, refreshed) = call(
        &state,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": login["refresh_token"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, profile) = call(
        &state,
        Method::GET,
        "/api/v1/user/profile",
        Some(refreshed["token"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], email);
}

#[tokio::test]
async fn listing_paginates_and_counts() {
    let state = require_db!();
    let (token, _) = register(&state).await;
    let category = own_category(&state, &token, "expense").await;

    for i in 0..45 {
        let time = format!("2023-05-{:02}T12:00:00Z", i % 28 + 1);
        add_bill(&state, &token, &category, "expense", 1.0 + i as f64, &time).await;
    }

    let (status, body) = call(&state, Method::GET, "/api/v1/bills", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bills"].as_array().unwrap().len(), 20);
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 20, "total": 45, "total_pages": 3 }));

    let (_, last) = call(&state, Method::GET, "/api/v1/bills?page=3", Some(&token), None).await;
    assert_eq!(last["bills"].as_array().unwrap().len(), 5);

    let (_, sorted) = call(
        &state,
        Method::GET,
        "/api/v1/bills?sort_by=amount&sort_order=asc&limit=2",
        Some(&token),
        None,
    )
    .await;
    let amounts: Vec<f64> = sorted["bills"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![1.0, 2.0]);
}

#[tokio::test]
async fn end_date_includes_the_whole_day() {
    let state = require_db!();
    let (token, _) = register(&state).await;
    let category = own_category(&state, &token, "expense").await;

    add_bill(&state, &token, &category, "expense", 5.0, "2022-01-31T23:59:59Z").await;
    add_bill(&state, &token, &category, "expense", 6.0, "2022-02-01T00:00:00Z").await;

    let (status, body) = call(
        &state,
        Method::GET,
        "/api/v1/bills?start_date=2022-01-31&end_date=2022-01-31",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["bills"][0]["amount"], 5.0);
}

#[tokio::test]
async fn bills_are_private_to_their_owner() {
    let state = require_db!();
    let (alice, _) = register(&state).await;
    let (bob, _) = register(&state).await;
    let category = own_category(&state, &alice, "expense").await;
    let bill = add_bill(&state, &alice, &category, "expense", 9.5, "2023-01-01T10:00:00Z").await;
    let uri = format!("/api/v1/bills/{}", bill["id"].as_str().unwrap());

    let (status, _) = call(&state, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&state, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = call(
        &state,
        Method::PUT,
        &uri,
        Some(&alice),
        Some(json!({ "merchant": "Bakery", "description": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["merchant"], "Bakery");
    assert_eq!(updated["amount"], 9.5);

    let (status, _) = call(&state, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&state, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let state = require_db!();
    let (token, _) = register(&state).await;
    let category = own_category(&state, &token, "expense").await;
    let bill = add_bill(&state, &token, &category, "expense", 3.0, "2023-02-02T08:00:00Z").await;
    let category_uri = format!("/api/v1/categories/{category}");

    let (status, body) = call(&state, Method::DELETE, &category_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot delete category with existing bills");

    let bill_uri = format!("/api/v1/bills/{}", bill["id"].as_str().unwrap());
    call(&state, Method::DELETE, &bill_uri, Some(&token), None).await;

    let (status, _) = call(&state, Method::DELETE, &category_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = call(&state, Method::GET, "/api/v1/categories", Some(&token), None).await;
    let ids: Vec<&str> = list["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert!(!ids.contains(&category.as_str()));
    assert_eq!(list["categories"][0]["is_default"], true);
}

#[tokio::test]
async fn default_categories_are_read_only() {
    let state = require_db!();
    let (token, _) = register(&state).await;
    let (_, list) = call(&state, Method::GET, "/api/v1/categories?type=income", Some(&token), None).await;
    let salary = list["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Salary")
        .cloned()
        .unwrap();
    assert!(list["categories"].as_array().unwrap().iter().all(|c| c["type"] == "income"));

    let uri = format!("/api/v1/categories/{}", salary["id"].as_str().unwrap());
    let (status, _) = call(&state, Method::PUT, &uri, Some(&token), Some(json!({ "name": "Wages" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&state, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn statistics_summarize_the_month() {
    let state = require_db!();
    let (token, _) = register(&state).await;
    let income = own_category(&state, &token, "income").await;
    let expense = own_category(&state, &token, "expense").await;

    add_bill(&state, &token, &income, "income", 100.0, "2023-03-05T09:00:00Z").await;
    add_bill(&state, &token, &expense, "expense", 40.0, "2023-03-20T18:30:00Z").await;
    add_bill(&state, &token, &expense, "expense", 999.0, "2023-04-01T00:00:00Z").await;

    let (status, body) = call(
        &state,
        Method::GET,
        "/api/v1/bills/statistics?period=month&year=2023&month=3",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_date"], "2023-03-01");
    assert_eq!(body["end_date"], "2023-03-31");
    assert_eq!(
        body["summary"],
        json!([
            { "type": "income", "total": 100.0, "count": 1 },
            { "type": "expense", "total": 40.0, "count": 1 },
        ])
    );
    assert_eq!(body["categories"].as_array().unwrap().len(), 2);
    assert_eq!(body["categories"][0]["category_id"], income.as_str());
}

async fn named_category(state: &AppState, token: &str, name: &str, kind: &str) -> (StatusCode, Value) {
    call(
        state,
        Method::POST,
        "/api/v1/categories",
        Some(token),
        Some(json!({ "name": name, "type": kind, "icon": "tag", "color": "#654321" })),
    )
    .await
}

#[tokio::test]
async fn category_names_are_unique_per_type() {
    let state = require_db!();
    let (alice, _) = register(&state).await;
    let (bob, _) = register(&state).await;
    let name = format!("Pets {}", Uuid::new_v4().simple());

    let (status, _) = named_category(&state, &alice, &name, "expense").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = named_category(&state, &bob, &name, "expense").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Category with this name already exists");

    let (status, _) = named_category(&state, &bob, &name, "income").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, other) = named_category(&state, &alice, &format!("{name} 2"), "expense").await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/v1/categories/{}", other["id"].as_str().unwrap());
    let (status, _) = call(&state, Method::PUT, &uri, Some(&alice), Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn foreign_categories_are_invisible_to_writers() {
    let state = require_db!();
    let (alice, _) = register(&state).await;
    let (bob, _) = register(&state).await;
    let alices = own_category(&state, &alice, "expense").await;
    let uri = format!("/api/v1/categories/{alices}");

    let (status, _) = call(&state, Method::PUT, &uri, Some(&bob), Some(json!({ "icon": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&state, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bobs = own_category(&state, &bob, "expense").await;
    let bill = add_bill(&state, &bob, &bobs, "expense", 12.0, "2023-06-01T12:00:00Z").await;
    let bill_uri = format!("/api/v1/bills/{}", bill["id"].as_str().unwrap());
    let (status, body) = call(&state, Method::PUT, &bill_uri, Some(&bob), Some(json!({ "category_id": alices }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid category");

    let (_, unchanged) = call(&state, Method::GET, &bill_uri, Some(&bob), None).await;
    assert_eq!(unchanged["category_id"], bobs.as_str());
}

#[tokio::test]
async fn list_filters_by_type_category_and_search() {
    let state = require_db!();
    let (token, _) = register(&state).await;
    let coffee = own_category(&state, &token, "expense").await;
    let groceries = own_category(&state, &token, "expense").await;

    for (category, merchant, description) in [
        (&coffee, "Morning LATTE", ""),
        (&coffee, "Starbucks", "cold brew"),
        (&groceries, "Market", "weekly latte beans"),
        (&groceries, "50% off_store", ""),
    ] {
        let (status, _) = call(
            &state,
            Method::POST,
            "/api/v1/bills",
            Some(&token),
            Some(json!({
                "type": "expense",
                "amount": 3.0,
                "category_id": category,
                "merchant": merchant,
                "description": description,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let total = |body: &Value| body["pagination"]["total"].as_i64().unwrap();
    let list = |query: String| {
        let state = state.clone();
        let token = token.clone();
        async move { call(&state, Method::GET, &format!("/api/v1/bills?{query}"), Some(&token), None).await }
    };

    let (status, body) = list("search=latte".into()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total(&body), 2);

    let (_, body) = list("search=STAR".into()).await;
    assert_eq!(total(&body), 1);
    assert_eq!(body["bills"][0]["merchant"], "Starbucks");

    let (_, body) = list("search=50%25".into()).await;
    assert_eq!(total(&body), 1);
    let (_, body) = list("search=_".into()).await;
    assert_eq!(total(&body), 1);

    let (_, body) = list(format!("category_id={coffee}")).await;
    assert_eq!(total(&body), 2);
    let (_, body) = list(format!("category_id={groceries}&search=latte")).await;
    assert_eq!(total(&body), 1);

    let (_, body) = list("type=income".into()).await;
    assert_eq!(total(&body), 0);
    let (_, body) = list("type=".into()).await;
    assert_eq!(total(&body), 4);
}

#[tokio::test]
async fn blank_query_values_are_ignored() {
    let state = require_db!();
    let (token, _) = register(&state).await;

    let (status, body) = call(&state, Method::GET, "/api/v1/categories?type=", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["categories"].as_array().unwrap().iter().any(|c| c["type"] == "income"));

    let (status, body) = call(&state, Method::GET, "/api/v1/bills/statistics?year=&month=", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "month");
}
