use anyhow::Result;
use brightpearl::constants::*;
use brightpearl::{
    global_parameters, Context, Description, ErrorKind, FileResourceLoader, Location,
    StaticResourceLoader,
};
use brightpearl_file_read_tokio::TokioFileRead;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::init_logger;

#[tokio::test]
async fn test_bundled_description() -> Result<()> {
    init_logger();

    let desc = Description::build(
        &Context::new(),
        &StaticResourceLoader::bundled()?,
        DEFAULT_API_DOMAIN,
    )
    .await?;

    assert_eq!(desc.base_url(), "https://ws-eu1.brightpearl.com");
    assert_eq!(
        desc.operation_names().collect::<Vec<_>>(),
        vec![
            "createContact",
            "getContact",
            "getOrder",
            "getPriceList",
            "getProduct",
            "searchContacts",
            "searchOrders",
            "updateOrderStatus",
        ]
    );
    assert_eq!(desc.extra()["apiVersion"], json!(API_VERSION));

    for op in desc.operations().values() {
        for (name, def) in global_parameters() {
            assert_eq!(&op.parameters[name], def, "{} {name}", op.name);
        }
    }

    let search = desc.operation("searchContacts")?;
    assert_eq!(search.parameters["pageSize"].location, Location::Query);
    assert_eq!(search.parameters["pageSize"].default, Some(json!(200)));
    assert_eq!(search.extra["responseModel"], json!("SearchResult"));
    assert!(desc.models().contains_key("SearchResult"));
    Ok(())
}

#[tokio::test]
async fn test_file_loader_description() -> Result<()> {
    init_logger();

    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("service-config.json"),
        json!({ "services": ["warehouse-service", "legacy-service"] }).to_string(),
    )?;
    std::fs::write(
        dir.path().join("warehouse-service.json"),
        json!({
            "operations": {
                "getWarehouse": {
                    "httpMethod": "GET",
                    "uri": "/{apiVersion}/{account_code}/warehouse-service/warehouse/{id}",
                    "parameters": {
                        "id": { "location": "uri", "required": true },
                        "staff_token": { "location": "query", "sentAs": "staffToken" }
                    }
                }
            },
            "links": { "docs": "https://api-docs.brightpearl.com" }
        })
        .to_string(),
    )?;
    std::fs::write(
        dir.path().join("legacy-service.json"),
        json!({
            "operations": {
                "getWarehouse": {
                    "httpMethod": "POST",
                    "uri": "/legacy/warehouse"
                }
            },
            "links": { "docs": "https://legacy.example", "status": "https://status.example" }
        })
        .to_string(),
    )?;

    let ctx = Context::new().with_file_read(TokioFileRead);
    let loader = FileResourceLoader::new(dir.path());
    let desc = Description::build(&ctx, &loader, "ws-use1.brightpearl.com").await?;

    let op = desc.operation("getWarehouse")?;
    assert_eq!(op.http_method, "GET");
    assert_eq!(op.parameters[STAFF_TOKEN].location, Location::Query);
    assert_eq!(op.parameters[STAFF_TOKEN].wire_name_or(STAFF_TOKEN), "staffToken");
    assert_eq!(
        desc.extra()["links"],
        json!({ "docs": "https://api-docs.brightpearl.com", "status": "https://status.example" })
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_file_resource() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("service-config.json"),
        json!({ "services": ["missing-service"] }).to_string(),
    )?;

    let ctx = Context::new().with_file_read(TokioFileRead);
    let err = Description::build(&ctx, &FileResourceLoader::new(dir.path()), "example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    Ok(())
}
