use anyhow::Result;
use brightpearl::constants::*;
use brightpearl::hash::hex_sha256;
use brightpearl::time::format_rfc3339;
use brightpearl::{CallbackQuery, ErrorKind, Settings};
use serde_json::json;

use super::{init_client, ok_response, params};

fn signed_query(secret: &str, fields: &[(&str, &str)]) -> String {
    let mut sorted = fields.to_vec();
    sorted.sort();

    let canonical: String = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    let signature = hex_sha256(format!("{secret}{canonical}").as_bytes());

    let mut query = form_urlencoded::Serializer::new(String::new());
    for (k, v) in fields {
        query.append_pair(k, v);
    }
    query.append_pair(CALLBACK_SIGNATURE, &signature);
    query.finish()
}

#[tokio::test]
async fn test_install_then_invoke() -> Result<()> {
    let http = ok_response(json!({}));
    let (client, _) = init_client(http.clone());
    let mut client = client.with_settings(Settings::new().with(DEV_SECRET, "s3cret"));

    let raw = signed_query(
        "s3cret",
        &[
            (CALLBACK_TOKEN, "fresh-token"),
            (CALLBACK_ACCOUNT_CODE, "newco"),
            (CALLBACK_TIMESTAMP, "1700000000999"),
        ],
    );
    let callback = client.install_callback(&CallbackQuery::parse(&format!("?{raw}")))?;
    assert_eq!(callback.account_code, "newco");
    assert_eq!(format_rfc3339(callback.timestamp), "2023-11-14T22:13:20Z");
    assert!(!format!("{callback:?}").contains("fresh-token"));

    client.update_settings(callback.into_settings()).await?;
    client.invoke("getProduct", params(json!({ "id": 1 }))).await?;

    let req = &http.requests()[0];
    assert_eq!(req.uri().path(), "/2.0.0/newco/product-service/product/1");
    assert_eq!(
        req.headers()[HEADER_ACCOUNT_TOKEN],
        brightpearl::sign_token("fresh-token", "s3cret").as_str()
    );
    Ok(())
}

#[tokio::test]
async fn test_ongoing_callback_with_wrong_secret() -> Result<()> {
    let (client, _) = init_client(ok_response(json!({})));
    let client = client.with_settings(Settings::new().with(DEV_SECRET, "s3cret"));

    let raw = signed_query(
        "not-the-secret",
        &[(CALLBACK_ACCOUNT_CODE, "newco"), (CALLBACK_TIMESTAMP, "999")],
    );
    let err = client
        .ongoing_callback(&CallbackQuery::parse(&raw))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let raw = signed_query(
        "s3cret",
        &[(CALLBACK_ACCOUNT_CODE, "newco"), (CALLBACK_TIMESTAMP, "999")],
    );
    let callback = client.ongoing_callback(&CallbackQuery::parse(&raw))?;
    assert_eq!(callback.timestamp.timestamp(), 0);
    Ok(())
}
