use api::auth::TokenKeys;
use api::db::MemoryStore;
use api::{router, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    router(AppState::new(MemoryStore::new(), TokenKeys::new("test-secret", 7)))
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signup(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "Secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": "Secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["accessToken"].as_str().unwrap().to_string()
}

async fn make_folder(app: &Router, token: &str, name: &str, parent: Option<&str>) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/folders",
        Some(token),
        Some(json!({ "name": name, "parentId": parent })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_missing_token_is_unauthorized_regardless_of_payload() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/notes", None, Some(json!({ "bogus": 1 }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, "/users/@me", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/folders/tree", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = app();
    let token = signup(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/users/@me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_rejects_invalid_and_duplicate_users() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "al", "email": "al@example.com", "password": "Secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 3"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "bob", "email": "bob@example.com", "password": "weak" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    signup(&app, "carol").await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "carol", "email": "other@example.com", "password": "Secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = app();
    signup(&app, "alice").await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "Wrong123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "Secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_note_crud() {
    let app = app();
    let token = signup(&app, "alice").await;

    let (status, note) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&token),
        Some(json!({ "title": "First", "content": "[{\"type\":\"paragraph\"}]" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = note["id"].as_str().unwrap().to_string();
    assert_eq!(note["title"], "First");
    assert_eq!(note["folderId"], Value::Null);

    let (status, listed) = send(&app, Method::GET, "/notes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, patched) = send(
        &app,
        Method::PATCH,
        &format!("/notes/{id}"),
        Some(&token),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "Renamed");
    assert_eq!(patched["content"], note["content"]);

    let (status, _) = send(&app, Method::DELETE, &format!("/notes/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/notes/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &format!("/notes/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_validation() {
    let app = app();
    let token = signup(&app, "alice").await;

    let (status, _) = send(&app, Method::POST, "/notes", Some(&token), Some(json!({ "content": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/notes", Some(&token), Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long = "a".repeat(257);
    let (status, _) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&token),
        Some(json!({ "title": long, "content": "[]" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, note) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&token),
        Some(json!({ "title": "", "content": "[]" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["title"], Value::Null);

    let (status, _) = send(&app, Method::GET, "/notes/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notes_filter_by_folder() {
    let app = app();
    let token = signup(&app, "alice").await;
    let folder = make_folder(&app, &token, "Work", None).await;

    for folder_id in [Some(folder.as_str()), None] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/notes",
            Some(&token),
            Some(json!({ "content": "[]", "folderId": folder_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, inside) = send(&app, Method::GET, &format!("/notes?folderId={folder}"), Some(&token), None).await;
    assert_eq!(inside.as_array().unwrap().len(), 1);
    assert_eq!(inside[0]["folderId"], folder.as_str());

    let (_, root) = send(&app, Method::GET, "/notes?folderId=root", Some(&token), None).await;
    assert_eq!(root.as_array().unwrap().len(), 1);
    assert_eq!(root[0]["folderId"], Value::Null);

    let (status, _) = send(&app, Method::GET, "/notes?folderId=nope", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_users_rows_are_not_found() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let (_, note) = send(&app, Method::POST, "/notes", Some(&alice), Some(json!({ "content": "[]" }))).await;
    let id = note["id"].as_str().unwrap();
    let folder = make_folder(&app, &alice, "Private", None).await;

    let (status, _) = send(&app, Method::GET, &format!("/notes/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/notes/{id}"),
        Some(&bob),
        Some(json!({ "title": "mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &format!("/folders/{folder}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, Method::GET, "/notes", Some(&bob), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_folder_path_and_depth() {
    let app = app();
    let token = signup(&app, "alice").await;
    let a = make_folder(&app, &token, "A", None).await;
    let b = make_folder(&app, &token, "B", Some(&a)).await;
    let c = make_folder(&app, &token, "C", Some(&b)).await;
    let d = make_folder(&app, &token, "D", Some(&c)).await;

    let (status, folder) = send(
        &app,
        Method::GET,
        &format!("/folders/{d}?path=true&noteCount=true"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(folder["depth"], 3);
    assert_eq!(folder["noteCount"], 0);
    let names: Vec<&str> = folder["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    let (_, plain) = send(&app, Method::GET, &format!("/folders/{a}"), Some(&token), None).await;
    assert!(plain.get("path").is_none());
    assert!(plain.get("noteCount").is_none());
}

#[tokio::test]
async fn test_folder_list_and_tree() {
    let app = app();
    let token = signup(&app, "alice").await;
    let work = make_folder(&app, &token, "work", None).await;
    make_folder(&app, &token, "Archive", None).await;
    let child = make_folder(&app, &token, "  projects  ", Some(&work)).await;
    send(
        &app,
        Method::POST,
        "/notes",
        Some(&token),
        Some(json!({ "content": "[]", "folderId": child })),
    )
    .await;

    let (_, roots) = send(&app, Method::GET, "/folders?parentId=root&noteCount=true", Some(&token), None).await;
    let roots = roots.as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert!(roots.iter().all(|f| f["noteCount"] == 0));

    let (_, children) = send(&app, Method::GET, &format!("/folders?parentId={work}"), Some(&token), None).await;
    assert_eq!(children[0]["name"], "projects");
    assert_eq!(children[0]["depth"], 1);

    let (status, tree) = send(&app, Method::GET, "/folders/tree", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree[0]["name"], "Archive");
    assert_eq!(tree[1]["name"], "work");
    assert_eq!(tree[1]["children"][0]["noteCount"], 1);
}

#[tokio::test]
async fn test_folder_validation_and_cycles() {
    let app = app();
    let token = signup(&app, "alice").await;

    let (status, _) = send(&app, Method::POST, "/folders", Some(&token), Some(json!({ "name": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(
        &app,
        Method::POST,
        "/folders",
        Some(&token),
        Some(json!({ "name": "x", "parentId": missing })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let a = make_folder(&app, &token, "A", None).await;
    let b = make_folder(&app, &token, "B", Some(&a)).await;
    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/folders/{a}"),
        Some(&token),
        Some(json!({ "parentId": b })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, moved) = send(
        &app,
        Method::PATCH,
        &format!("/folders/{b}"),
        Some(&token),
        Some(json!({ "parentId": null, "name": "B2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["parentId"], Value::Null);
    assert_eq!(moved["depth"], 0);
    assert_eq!(moved["name"], "B2");
}

#[tokio::test]
async fn test_deleting_folder_detaches_notes_and_children() {
    let app = app();
    let token = signup(&app, "alice").await;
    let parent = make_folder(&app, &token, "Parent", None).await;
    let child = make_folder(&app, &token, "Child", Some(&parent)).await;
    let (_, note) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&token),
        Some(json!({ "content": "[]", "folderId": parent })),
    )
    .await;
    let note_id = note["id"].as_str().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/folders/{parent}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, note) = send(&app, Method::GET, &format!("/notes/{note_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["folderId"], Value::Null);

    let (_, child) = send(&app, Method::GET, &format!("/folders/{child}"), Some(&token), None).await;
    assert_eq!(child["parentId"], Value::Null);
    assert_eq!(child["depth"], 0);

    let (status, _) = send(&app, Method::GET, &format!("/folders/{parent}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
