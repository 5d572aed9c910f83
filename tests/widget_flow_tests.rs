//! End-to-end flows over the HTTP surface: operator provisioning, artifact
//! delivery and visitor subscription against one running server.

use anyhow::{Context, Result as AnyhowResult};
use collecty::{config::AppConfig, server::create_app, server::create_test_app_state};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;

const OPERATOR_TOKEN: &str = "lifecycle-token";
const OWNER: &str = "b6f5a1c0-22d9-4f8e-bd3a-9d7c51f0aa11";

struct TestServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<AnyhowResult<()>>>,
}

impl TestServerHandle {
    async fn shutdown(mut self) -> AnyhowResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.join_handle.take() {
            handle.await.context("server task join failed")??;
        }
        Ok(())
    }
}

impl Drop for TestServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn spawn_test_app() -> (String, TestServerHandle) {
    let config = AppConfig {
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        ..Default::default()
    };
    let db = test_utils::setup_test_db().await.unwrap();
    let app = create_app(create_test_app_state(config, db));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_url = format!("http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .context("axum server error")
    });

    (
        server_url,
        TestServerHandle {
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(join_handle),
        },
    )
}

fn operator(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", OPERATOR_TOKEN))
        .header("X-Owner-Id", OWNER)
}

async fn create_project(client: &reqwest::Client, server_url: &str, name: &str) -> Uuid {
    let response = operator(client.post(format!("{}/api/v1/projects", server_url)))
        .json(&json!({"name": name}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

async fn create_widget(
    client: &reqwest::Client,
    server_url: &str,
    project_id: Uuid,
    payload: Value,
) -> Uuid {
    let response = operator(client.post(format!(
        "{}/api/v1/projects/{}/widgets",
        server_url, project_id
    )))
    .json(&payload)
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_full_widget_lifecycle() {
    let (server_url, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();

    let project_id = create_project(&client, &server_url, "Acme Blog").await;
    let widget_id = create_widget(
        &client,
        &server_url,
        project_id,
        json!({
            "name": "Footer signup",
            "title": "Get our letters",
            "primary_color": "#123abc"
        }),
    )
    .await;

    // The embed script carries the configured values
    let response = client
        .get(format!("{}/widget/{}/popup.js", server_url, widget_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-store"
    );
    let script = response.text().await.unwrap();
    assert!(script.contains("var TITLE = \"Get our letters\";"));
    assert!(script.contains("var PRIMARY_COLOR = \"#123abc\";"));

    // Embeds minted before widgets existed pass the project id; the
    // default widget answers for it
    let response = client
        .get(format!("{}/widget/{}/widget.js", server_url, project_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let legacy_script = response.text().await.unwrap();
    assert!(legacy_script.contains(&format!("var WIDGET_ID = \"{}\";", widget_id)));

    // The HTML snippet is frameable and cacheable
    let response = client
        .get(format!("{}/widget/{}/inline.html", server_url, widget_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-frame-options").is_none());
    let snippet = response.text().await.unwrap();
    assert!(snippet.starts_with("<!-- collecty widget"));

    // A visitor subscribes through the embed
    let response = client
        .post(format!("{}/api/v1/subscribe", server_url))
        .header("Origin", "https://blog.example.com")
        .header(
            "User-Agent",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
        )
        .json(&json!({
            "email": "Reader@Example.com",
            "projectId": project_id,
            "widgetId": widget_id,
            "metadata": {"source": "popup", "pageUrl": "https://blog.example.com/post"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["alreadySubscribed"], false);
    let subscriber_id = body["subscriberId"].as_str().unwrap().to_string();

    // Submitting the same address again is answered, not errored
    let response = client
        .post(format!("{}/api/v1/subscribe", server_url))
        .json(&json!({
            "email": "reader@example.com",
            "projectId": project_id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["alreadySubscribed"], true);
    assert_eq!(body["subscriberId"], subscriber_id.as_str());

    // The operator sees one subscriber with derived context attached
    let response = operator(client.get(format!(
        "{}/api/v1/projects/{}/subscribers",
        server_url, project_id
    )))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let subscribers = body["data"].as_array().unwrap();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["email"], "reader@example.com");
    assert_eq!(subscribers[0]["source"], "popup");
    assert_eq!(subscribers[0]["metadata"]["server"]["device"], "mobile");
    assert_eq!(body["next_cursor"], Value::Null);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_api_key_gate_over_http() {
    let (server_url, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();

    let project_id = create_project(&client, &server_url, "Keyed Project").await;
    create_widget(&client, &server_url, project_id, json!({"name": "Main"})).await;

    let response = operator(client.post(format!(
        "{}/api/v1/projects/{}/api-keys",
        server_url, project_id
    )))
    .json(&json!({"label": "embed"}))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let secret = body["data"]["key"].as_str().unwrap().to_string();

    // Wrong key is rejected
    let response = client
        .post(format!("{}/api/v1/subscribe", server_url))
        .header("x-api-key", "definitely-wrong")
        .json(&json!({"email": "gate@example.com", "projectId": project_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The minted key passes and its use is recorded
    let response = client
        .post(format!("{}/api/v1/subscribe", server_url))
        .header("x-api-key", &secret)
        .json(&json!({"email": "gate@example.com", "projectId": project_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = operator(client.get(format!(
        "{}/api/v1/projects/{}/api-keys",
        server_url, project_id
    )))
    .send()
    .await
    .unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body["data"][0]["last_used_at"].is_string());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_widget_config_changes_are_live() {
    let (server_url, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();

    let project_id = create_project(&client, &server_url, "Live Config").await;
    let widget_id = create_widget(&client, &server_url, project_id, json!({"name": "Main"})).await;

    let script = client
        .get(format!("{}/widget/{}/popup.js", server_url, widget_id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(script.contains("var TITLE = \"Join our newsletter\";"));

    let response = operator(client.patch(format!("{}/api/v1/widgets/{}", server_url, widget_id)))
        .json(&json!({"title": "Fresh title"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // no-store delivery means the very next fetch sees the edit
    let script = client
        .get(format!("{}/widget/{}/popup.js", server_url, widget_id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(script.contains("var TITLE = \"Fresh title\";"));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_deactivated_widget_serves_inert_artifact() {
    let (server_url, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();

    let project_id = create_project(&client, &server_url, "Toggled").await;
    let widget_id = create_widget(&client, &server_url, project_id, json!({"name": "Main"})).await;

    let response = operator(client.patch(format!("{}/api/v1/widgets/{}", server_url, widget_id)))
        .json(&json!({"is_active": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/widget/{}/popup.js", server_url, widget_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-store"
    );
    let body = response.text().await.unwrap();
    assert_eq!(body, "/* collecty: unknown widget */\n");

    // Reactivation restores delivery
    let response = operator(client.patch(format!("{}/api/v1/widgets/{}", server_url, widget_id)))
        .json(&json!({"is_active": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/widget/{}/popup.js", server_url, widget_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    handle.shutdown().await.unwrap();
}
