// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire-level tests for `HttpResourceClient` against a mock backend.

use std::collections::BTreeSet;

use secrecy::SecretString;
use stockroom_client::HttpResourceClient;
use stockroom_config::model::ApiConfig;
use stockroom_core::forms::BrandForm;
use stockroom_core::{EntityForm, EntityId, ListQuery, ModelName, ResourceClient, StockroomError};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> HttpResourceClient {
    HttpResourceClient::new(&ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        max_retries: 1,
        retry_delay_ms: 10,
        auth_token: Some("tok-123".into()),
    })
    .expect("client should build")
}

fn brand() -> ModelName {
    ModelName::new("brand").unwrap()
}

fn ids(raw: &[&str]) -> BTreeSet<EntityId> {
    raw.iter().map(|s| EntityId::from(*s)).collect()
}

#[tokio::test]
async fn list_active_sends_paging_and_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/soft-delete/brand"))
        .and(query_param("current", "1"))
        .and(query_param("pageSize", "10"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "data": {
                "meta": { "current": 1, "pageSize": 10, "pages": 1, "total": 2 },
                "results": [
                    { "_id": "a1", "name": "Acme" },
                    { "_id": "a2", "name": "Globex" }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.list_active(&ListQuery::active(brand())).await.unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].id().as_str(), "a1");
    assert!(!result.items[0].is_deleted());
    assert_eq!(result.meta.total, 2);
}

#[tokio::test]
async fn list_trash_drops_active_entities() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/soft-delete/brand/deleted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "data": {
                "meta": { "current": 1, "pageSize": 10, "pages": 1, "total": 2 },
                "results": [
                    { "_id": "a1", "deleted": true, "deletedAt": "2026-03-01T10:00:00Z" },
                    { "_id": "a2", "deleted": false }
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.list_trash(&ListQuery::trash(brand())).await.unwrap();

    assert_eq!(result.ids(), vec![EntityId::from("a1")]);
    assert!(result.items[0].deleted_at().is_some());
}

#[tokio::test]
async fn list_retries_transient_status_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/soft-delete/brand"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/soft-delete/brand"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "data": { "results": [{ "_id": "a1" }] }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.list_active(&ListQuery::active(brand())).await.unwrap();
    assert_eq!(result.items.len(), 1);
}

#[tokio::test]
async fn list_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/soft-delete/brand"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "statusCode": 503,
            "message": "maintenance"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .list_active(&ListQuery::active(brand()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StockroomError::Backend {
            status_code: 503,
            message: "maintenance".into()
        }
    );
}

#[tokio::test]
async fn envelope_status_outside_2xx_is_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/soft-delete/brand"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 403,
            "message": "Forbidden resource"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .list_active(&ListQuery::active(brand()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StockroomError::Backend { status_code: 403, ref message } if message == "Forbidden resource"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn soft_delete_uses_plain_model_route() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/brand/a1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client
        .soft_delete(&brand(), &EntityId::from("a1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn restore_without_body_returns_active_entity() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/soft-delete/brand/a1/restore"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "message": "Restored"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let entity = client.restore(&brand(), &EntityId::from("a1")).await.unwrap();
    assert_eq!(entity.id().as_str(), "a1");
    assert!(!entity.is_deleted());
}

#[tokio::test]
async fn restore_of_active_entity_is_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/soft-delete/brand/a1/restore"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "data": { "_id": "a1", "name": "Acme", "deleted": false }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let first = client.restore(&brand(), &EntityId::from("a1")).await.unwrap();
    let second = client.restore(&brand(), &EntityId::from("a1")).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn force_delete_not_found_surfaces_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/soft-delete/brand/zz/force-delete"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "statusCode": 404,
            "message": "Brand not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .force_delete(&brand(), &EntityId::from("zz"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Brand not found");
}

#[tokio::test]
async fn mutations_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/soft-delete/brand/a1/force-delete"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .force_delete(&brand(), &EntityId::from("a1"))
        .await
        .unwrap_err();
    assert!(err.is_backend());
}

#[tokio::test]
async fn bulk_restore_reports_partial_outcome() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/soft-delete/products/bulk-restore"))
        .and(body_json(serde_json::json!({ "ids": ["p1", "p2", "p3"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "data": {
                "succeeded": ["p1", "p3"],
                "failed": [{ "id": "p2", "reason": "category is deleted" }]
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let outcome = client
        .bulk_restore(&ModelName::new("products").unwrap(), &ids(&["p1", "p2", "p3"]))
        .await
        .unwrap();
    assert_eq!(outcome.succeeded, ids(&["p1", "p3"]));
    assert_eq!(outcome.failed[&EntityId::from("p2")], "category is deleted");
    assert!(outcome.is_partial());
}

#[tokio::test]
async fn bulk_force_delete_without_data_means_all_succeeded() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/soft-delete/brand/bulk-force-delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "message": "Deleted"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let outcome = client
        .bulk_force_delete(&brand(), &ids(&["a1", "a2"]))
        .await
        .unwrap();
    assert_eq!(outcome.succeeded, ids(&["a1", "a2"]));
    assert!(outcome.failed.is_empty());
}

#[tokio::test]
async fn bulk_with_empty_ids_never_hits_network() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .bulk_restore(&brand(), &BTreeSet::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Validation(_)));
}

#[tokio::test]
async fn invalid_form_is_rejected_before_io() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let form = EntityForm::Brand(BrandForm {
        name: "  ".into(),
        description: None,
        logo: None,
    });
    let err = client.create(&form).await.unwrap_err();
    assert!(matches!(err, StockroomError::Validation(_)), "got: {err:?}");
}

#[tokio::test]
async fn create_posts_form_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/brand"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "statusCode": 201,
            "data": { "_id": "b9", "name": "Initech" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let form = EntityForm::Brand(BrandForm {
        name: "Initech".into(),
        description: Some("Office supplies".into()),
        logo: None,
    });
    let entity = client.create(&form).await.unwrap();
    assert_eq!(entity.id().as_str(), "b9");
}

#[tokio::test]
async fn bearer_token_can_be_replaced() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/brand/a1"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).with_bearer_token(SecretString::from("fresh"));
    client
        .soft_delete(&brand(), &EntityId::from("a1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let client = HttpResourceClient::new(&ApiConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 2,
        max_retries: 0,
        retry_delay_ms: 1,
        auth_token: None,
    })
    .unwrap();
    let err = client
        .soft_delete(&brand(), &EntityId::from("a1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Network { .. }), "got: {err:?}");
}
