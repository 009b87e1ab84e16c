use mockito::{Matcher, Server};
use recondesk_core::integrations::poller::StatusCheck;
use recondesk_core::integrations::supabase::{
    connect_backend, BackendClient, BackendError, BackendHealth, BackendHealthCheck, Filter,
    NoopBackend, RestBackend, SupabaseConfig, Table,
};
use serde_json::json;
use std::sync::Arc;

fn backend_for(server: &Server) -> RestBackend {
    RestBackend::new(SupabaseConfig::new(server.url(), "anon-key")).unwrap()
}

#[tokio::test]
async fn select_sends_auth_headers_filters_and_limit() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/vehicles")
        .match_header("apikey", "anon-key")
        .match_header("authorization", "Bearer anon-key")
        .match_header("prefer", "return=representation")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("dealership_id".into(), "eq.metro".into()),
            Matcher::UrlEncoded("select".into(), "*".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(json!([{ "id": "stock-1042", "dealership_id": "metro" }]).to_string())
        .create_async()
        .await;

    let rows = backend_for(&server)
        .select(Table::Vehicles, &[Filter::eq("dealership_id", "metro")], Some(5))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "stock-1042");
    mock.assert_async().await;
}

#[tokio::test]
async fn insert_update_delete_return_representation() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rest/v1/todos")
        .match_body(Matcher::PartialJson(json!({ "title": "Detail" })))
        .with_status(201)
        .with_body(json!([{ "id": 7, "title": "Detail" }]).to_string())
        .create_async()
        .await;
    server
        .mock("PATCH", "/rest/v1/todos")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.7".into()))
        .with_status(200)
        .with_body(json!([{ "id": 7, "title": "Detail", "status": "completed" }]).to_string())
        .create_async()
        .await;
    server
        .mock("DELETE", "/rest/v1/todos")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.7".into()))
        .with_status(204)
        .create_async()
        .await;

    let backend = backend_for(&server);
    let inserted = backend
        .insert(Table::Todos, &json!({ "title": "Detail" }))
        .await
        .unwrap();
    assert_eq!(inserted[0]["id"], 7);

    let updated = backend
        .update(
            Table::Todos,
            &[Filter::eq("id", "7")],
            &json!({ "status": "completed" }),
        )
        .await
        .unwrap();
    assert_eq!(updated[0]["status"], "completed");

    let deleted = backend
        .delete(Table::Todos, &[Filter::eq("id", "7")])
        .await
        .unwrap();
    assert!(deleted.is_empty());
}

#[tokio::test]
async fn upstream_errors_and_unfiltered_writes_are_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/locations")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"Invalid API key","hint":"check the anon key"}"#)
        .create_async()
        .await;

    let backend = backend_for(&server);
    match backend.select(Table::Locations, &[], None).await.unwrap_err() {
        BackendError::Api {
            table,
            status,
            message,
        } => {
            assert_eq!(table, Table::Locations);
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        backend.delete(Table::Users, &[]).await.unwrap_err(),
        BackendError::MissingFilter(Table::Users)
    ));
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rest/v1/todos")
        .with_status(201)
        .with_header("content-type", "text/html")
        .with_body("<html>proxy page</html>")
        .create_async()
        .await;

    let err = backend_for(&server)
        .insert(Table::Todos, &json!({ "title": "Detail" }))
        .await
        .unwrap_err();

    match err {
        BackendError::Decode { table, status, .. } => {
            assert_eq!(table, Table::Todos);
            assert_eq!(status, 201);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn noop_backend_returns_nothing() {
    let backend = connect_backend(None).unwrap();
    assert!(!backend.is_configured());
    assert!(backend
        .select(Table::Dealerships, &[], None)
        .await
        .unwrap()
        .is_empty());
    assert!(backend
        .insert(Table::Contacts, &json!({ "name": "x" }))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn health_check_reports_configuration_and_reachability() {
    let unconfigured = BackendHealthCheck::new(Arc::new(NoopBackend));
    assert_eq!(
        unconfigured.check().await.unwrap(),
        BackendHealth::NotConfigured
    );

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/dealerships")
        .match_query(Matcher::UrlEncoded("limit".into(), "1".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let reachable = BackendHealthCheck::new(Arc::new(backend_for(&server)));
    assert_eq!(reachable.check().await.unwrap(), BackendHealth::Reachable);

    let down = BackendHealthCheck::new(Arc::new(
        RestBackend::new(SupabaseConfig::new("http://127.0.0.1:9", "anon-key")).unwrap(),
    ));
    assert!(down.check().await.is_err());
}
