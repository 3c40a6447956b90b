use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use brightpearl::constants::*;
use brightpearl::{sign_token, Client, Context, DescriptionCache, ErrorKind, Settings, StaticEnv};
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::{init_client, init_logger, ok_response, params, MockHttpSend};

#[tokio::test]
async fn test_invoke_get_order() -> Result<()> {
    let http = ok_response(json!([{ "id": 100 }]));
    let (mut client, _) = init_client(http.clone());

    let result = client
        .invoke("getOrder", params(json!({ "id": "100-105", "includeOptional": "customFields" })))
        .await?;
    assert_eq!(result, json!([{ "id": 100 }]));

    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method(), Method::GET);
    assert_eq!(
        req.uri().to_string(),
        "https://ws-eu1.brightpearl.com/2.0.0/acme/order-service/order/100-105?includeOptional=customFields"
    );
    assert_eq!(req.headers()[HEADER_APP_REF], "acme-app");
    assert!(req.headers().get(HEADER_ACCOUNT_TOKEN).is_none());
    assert!(req.body().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invoke_signs_tokens_from_raw_settings() -> Result<()> {
    let http = ok_response(json!({}));
    let (client, _) = init_client(http.clone());
    let mut client = client.with_settings(
        Settings::new()
            .with(ACCOUNT_CODE, "acme")
            .with(ACCOUNT_TOKEN, "account-token")
            .with(STAFF_TOKEN, "staff-token")
            .with(DEV_SECRET, "s3cret"),
    );

    for _ in 0..2 {
        client
            .invoke("getProduct", params(json!({ "id": 1 })))
            .await?;
    }

    let signed = sign_token("account-token", "s3cret");
    for req in http.requests() {
        assert_eq!(req.headers()[HEADER_ACCOUNT_TOKEN], signed.as_str());
        assert!(req.headers()[HEADER_ACCOUNT_TOKEN].is_sensitive());
        assert_eq!(req.headers()[HEADER_STAFF_TOKEN], "staff-token");
        assert!(!req.uri().to_string().contains("s3cret"));
    }
    assert_eq!(client.settings().get(ACCOUNT_TOKEN), Some("account-token"));
    Ok(())
}

#[tokio::test]
async fn test_explicit_params_override_settings() -> Result<()> {
    let http = ok_response(json!({}));
    let (client, _) = init_client(http.clone());
    let mut client = client.with_settings(
        Settings::new()
            .with(ACCOUNT_CODE, "acme")
            .with(ACCOUNT_TOKEN, "account-token")
            .with(DEV_SECRET, "s3cret"),
    );

    client
        .invoke(
            "getContact",
            params(json!({ "id": 7, "account_code": "other", "account_token": "raw" })),
        )
        .await?;

    let req = &http.requests()[0];
    assert_eq!(
        req.uri().path(),
        "/2.0.0/other/contact-service/contact/7"
    );
    assert_eq!(req.headers()[HEADER_ACCOUNT_TOKEN], "raw");
    Ok(())
}

#[tokio::test]
async fn test_invoke_json_body() -> Result<()> {
    let http = MockHttpSend::new(StatusCode::OK, json!({ "response": 42, "reference": null }));
    let (mut client, _) = init_client(http.clone());

    let result = client
        .invoke(
            "updateOrderStatus",
            params(json!({ "id": 42, "orderStatusId": 4, "orderNote": { "text": "shipped" } })),
        )
        .await?;
    assert_eq!(result, json!(42));

    let req = &http.requests()[0];
    assert_eq!(req.method(), Method::PUT);
    assert_eq!(
        req.uri().path(),
        "/2.0.0/acme/order-service/order/42/status"
    );
    assert_eq!(req.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(
        serde_json::from_slice::<Value>(req.body())?,
        json!({ "orderStatusId": 4, "orderNote": { "text": "shipped" } })
    );
    Ok(())
}

#[tokio::test]
async fn test_search_keeps_reference() -> Result<()> {
    let envelope = json!({
        "response": { "metaData": { "resultsReturned": 1 }, "results": [[1, "a@example.com"]] },
        "reference": { "columns": ["contactId", "primaryEmail"] }
    });
    let http = MockHttpSend::new(StatusCode::OK, envelope.clone());
    let (mut client, _) = init_client(http.clone());

    let result = client
        .invoke("searchContacts", params(json!({ "primaryEmail": "a@example.com" })))
        .await?;
    assert_eq!(result, envelope);

    let uri = http.requests()[0].uri().to_string();
    assert!(uri.ends_with("/contact-search?pageSize=200&primaryEmail=a%40example.com"), "{uri}");
    Ok(())
}

#[tokio::test]
async fn test_unknown_operation_sends_nothing() -> Result<()> {
    let http = ok_response(json!({}));
    let (mut client, _) = init_client(http.clone());

    let err = client
        .invoke("deleteEverything", params(json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OperationUnknown);
    assert!(err.is_caller_error());
    assert!(http.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_required_parameter_sends_nothing() -> Result<()> {
    let http = ok_response(json!({}));
    let (mut client, _) = init_client(http.clone());

    let err = client
        .invoke("getOrder", params(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParameterMissing);

    let (client, _) = init_client(http.clone());
    let mut client = client.with_settings(Settings::new());
    let err = client
        .invoke("getOrder", params(json!({ "id": 1 })))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParameterMissing);
    assert!(err.to_string().contains(ACCOUNT_CODE));

    assert!(http.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_http_failure_is_transport_error() -> Result<()> {
    let http = MockHttpSend::new(
        StatusCode::UNAUTHORIZED,
        json!({ "errors": [{ "code": "CMNC-002", "message": "Not authenticated" }] }),
    );
    let (mut client, _) = init_client(http.clone());

    let err = client
        .invoke("getOrder", params(json!({ "id": 1 })))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("401"));
    assert_eq!(http.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_domain_change_rebuilds_description() -> Result<()> {
    let http = ok_response(json!({}));
    let (mut client, cache) = init_client(http.clone());
    assert!(!client.is_bound());

    client.invoke("getProduct", params(json!({ "id": 1 }))).await?;
    let first = client.description().cloned().expect("client must be bound");
    assert_eq!(first.base_url(), "https://ws-eu1.brightpearl.com");

    client
        .update_settings(Settings::new().with(API_DOMAIN, "ws-use1.brightpearl.com"))
        .await?;
    let second = client.description().cloned().expect("client must stay bound");
    assert_eq!(second.base_url(), "https://ws-use1.brightpearl.com");
    assert_eq!(cache.build_count(), 2);
    assert!(!Arc::ptr_eq(&first, &second));

    client.invoke("getProduct", params(json!({ "id": 1 }))).await?;
    let hosts: Vec<_> = http
        .requests()
        .iter()
        .map(|req| req.uri().host().unwrap_or_default().to_string())
        .collect();
    assert_eq!(hosts, vec!["ws-eu1.brightpearl.com", "ws-use1.brightpearl.com"]);
    Ok(())
}

#[tokio::test]
async fn test_other_updates_keep_binding() -> Result<()> {
    let http = ok_response(json!({}));
    let (mut client, cache) = init_client(http.clone());

    let first = client.bind().await?;
    client
        .update_settings(Settings::new().with(STAFF_TOKEN, "staff").with(ACCOUNT_CODE, "acme"))
        .await?;
    client.invoke("getProduct", params(json!({ "id": 1 }))).await?;

    assert!(Arc::ptr_eq(&first, client.description().expect("client must be bound")));
    assert_eq!(cache.build_count(), 1);
    assert_eq!(http.requests()[0].headers()[HEADER_STAFF_TOKEN], "staff");
    Ok(())
}

#[tokio::test]
async fn test_clients_share_a_cache() -> Result<()> {
    let http = ok_response(json!({}));
    let (mut first, cache) = init_client(http.clone());
    let (second, _) = init_client(http);
    let mut second = second.with_cache(cache.clone());

    let a = first.bind().await?;
    let b = second.bind().await?;

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.build_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_default_client_uses_shared_cache() -> Result<()> {
    init_logger();

    let mut client = Client::new(
        Context::new(),
        brightpearl::StaticResourceLoader::bundled()?,
    )
    .with_settings(Settings::new().with(API_DOMAIN, "shared.example"));

    let description = client.bind().await?;
    let current = DescriptionCache::shared()
        .current()
        .expect("shared cache must hold the description");
    assert!(Arc::ptr_eq(&description, &current));

    DescriptionCache::shared().reset();
    assert!(DescriptionCache::shared().current().is_none());
    Ok(())
}

#[tokio::test]
async fn test_settings_from_env() -> Result<()> {
    let http = ok_response(json!({}));
    let ctx = Context::new()
        .with_http_send(http.clone())
        .with_env(StaticEnv {
            envs: HashMap::from([
                (BRIGHTPEARL_ACCOUNT_CODE.to_string(), "envco".to_string()),
                (BRIGHTPEARL_API_DOMAIN.to_string(), "ws-use1.brightpearl.com".to_string()),
                (BRIGHTPEARL_DEV_REFERENCE.to_string(), "dev-ref".to_string()),
            ]),
        });

    let settings = Settings::from_env(&ctx);
    let mut client = Client::new(ctx, brightpearl::StaticResourceLoader::bundled()?)
        .with_settings(settings)
        .with_cache(Arc::new(DescriptionCache::new()));

    client.invoke("getPriceList", params(json!({}))).await?;

    let req = &http.requests()[0];
    assert_eq!(
        req.uri().to_string(),
        "https://ws-use1.brightpearl.com/2.0.0/envco/product-service/price-list/"
    );
    assert_eq!(req.headers()[HEADER_DEV_REF], "dev-ref");
    Ok(())
}
