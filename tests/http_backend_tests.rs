use serde_json::{Value, json};
use tagtrack::errors::AppError;
use tagtrack::models::{GeoFix, PendingEvent, Status};
use tagtrack::remote::{
    Authenticator, BatchPayload, BatchSink, Delivery, EventSubmitter, HttpBackend, StatusSource,
    SubmitReply,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event(tag: &str, status: Status) -> PendingEvent {
    PendingEvent::new(
        tag,
        status,
        "maria",
        GeoFix::new(Some(-23.5), Some(-46.25), Some(12.0)),
        "dev-1",
        "",
    )
}

async fn backend() -> (MockServer, HttpBackend) {
    let server = MockServer::start().await;
    let backend = HttpBackend::new(&server.uri()).unwrap();
    (server, backend)
}

#[tokio::test]
async fn status_table_is_parsed_leniently() {
    let (server, backend) = backend().await;
    Mock::given(method("GET"))
        .and(query_param("action", "base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "tags": [
                { "tag": "T-1", "status": "CONCLUIDO", "setor": "NORTE", "classe": "A" },
                { "tag": 1042, "status": "PENDENTE OBRA" },
                { "tag": "", "status": "PENDENTE" }
            ]
        })))
        .mount(&server)
        .await;

    let rows = backend.fetch_status_table().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].setor.as_deref(), Some("NORTE"));
    assert_eq!(rows[1].tag.as_deref(), Some("1042"));
    assert_eq!(rows[1].classe, None);
}

#[tokio::test]
async fn status_table_not_ok_is_a_remote_error() {
    let (server, backend) = backend().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "sheet locked" })),
        )
        .mount(&server)
        .await;

    match backend.fetch_status_table().await {
        Err(AppError::Remote(msg)) => assert_eq!(msg, "sheet locked"),
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn unparsable_body_is_a_remote_error() {
    let (server, backend) = backend().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login page</html>"))
        .mount(&server)
        .await;

    match backend.fetch_status_table().await {
        Err(AppError::Remote(msg)) => assert!(msg.contains("invalid response")),
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn batch_is_posted_with_backend_field_names() {
    let (server, backend) = backend().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let batch = BatchPayload {
        device_id: "dev-1".into(),
        user: "maria".into(),
        events: vec![event("T-1", Status::PendingObra)],
    };
    // the response is not inspected
    let delivery = backend.dispatch(&batch).await.unwrap();
    assert_eq!(delivery, Delivery::Assumed);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["device_id"], "dev-1");
    assert_eq!(body["usuario"], "maria");
    let ev = &body["eventos"][0];
    assert_eq!(ev["tag"], "T-1");
    assert_eq!(ev["status"], "PENDENTE OBRA");
    assert_eq!(ev["lat"], "-23,5");
    assert_eq!(ev["lon"], "-46,25");
    assert_eq!(ev["usuario"], "maria");
    assert!(ev["timestamp_iso"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn unreachable_backend_fails_the_dispatch() {
    let server = MockServer::start().await;
    let backend = HttpBackend::new(&server.uri()).unwrap();
    drop(server);

    let batch = BatchPayload {
        device_id: "dev-1".into(),
        user: "maria".into(),
        events: vec![event("T-1", Status::Completed)],
    };
    assert!(matches!(
        backend.dispatch(&batch).await,
        Err(AppError::Http(_))
    ));
}

#[tokio::test]
async fn submit_reports_server_side_confirmation() {
    let (server, backend) = backend().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "action": "evento", "confirm": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "needConfirm": true,
            "lastStatus": "CONCLUIDO"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "action": "evento", "confirm": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let ev = event("T-1", Status::Pending);
    assert_eq!(
        backend.submit(&ev, false).await.unwrap(),
        SubmitReply::NeedsConfirm {
            last_status: "CONCLUIDO".into()
        }
    );
    assert_eq!(backend.submit(&ev, true).await.unwrap(), SubmitReply::Accepted);
}

#[tokio::test]
async fn submit_rejection_carries_the_reason() {
    let (server, backend) = backend().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "tag bloqueada" })),
        )
        .mount(&server)
        .await;

    assert_eq!(
        backend
            .submit(&event("T-1", Status::Completed), false)
            .await
            .unwrap(),
        SubmitReply::Rejected("tag bloqueada".into())
    );
}

#[tokio::test]
async fn login_returns_the_operator_profile() {
    let (server, backend) = backend().await;
    Mock::given(method("POST"))
        .and(body_partial_json(
            json!({ "action": "login", "login": "maria", "senha": "s3cret" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "login": "maria",
            "nomeCompleto": "Maria Souza",
            "trocarSenha": true
        })))
        .mount(&server)
        .await;

    let grant = backend.login("maria", "s3cret").await.unwrap();
    assert_eq!(grant.login, "maria");
    assert_eq!(grant.full_name, "Maria Souza");
    assert!(grant.must_change_password);
}

#[tokio::test]
async fn failed_login_is_a_remote_error() {
    let (server, backend) = backend().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": false, "error": "senha invalida" })),
        )
        .mount(&server)
        .await;

    assert!(matches!(
        backend.login("maria", "wrong").await,
        Err(AppError::Remote(msg)) if msg == "senha invalida"
    ));
}

#[test]
fn invalid_endpoint_is_a_config_error() {
    assert!(matches!(
        HttpBackend::new("not a url"),
        Err(AppError::Config(_))
    ));
}
