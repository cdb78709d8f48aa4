use anyhow::{Context, Result};
use procflow_core::error::Error;
use procflow_core::id::SchemaId;
use serde_json::json;
use tracing::info;

use super::{print_json, Session};

pub fn list(session: &Session) -> Result<bool> {
    print_json(&session.service.list_schemas()?)?;
    Ok(true)
}

pub fn validate(session: &Session, schema: &SchemaId) -> Result<bool> {
    let report = session
        .service
        .validate(schema)
        .with_context(|| format!("Failed to validate schema {}", schema))?;
    print_json(&report)?;
    Ok(report.is_valid)
}

pub fn publish(session: &Session, schema: &SchemaId, unpublish_others: bool) -> Result<bool> {
    match session.service.publish(schema, unpublish_others) {
        Ok(outcome) => {
            session.save()?;
            info!(schema = %schema, version = outcome.schema.version, "published");
            print_json(&outcome)?;
            Ok(true)
        }
        Err(Error::ValidationFailed(errors)) => {
            print_json(&json!({ "published": false, "errors": errors }))?;
            Ok(false)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to publish schema {}", schema)),
    }
}

pub fn unpublish(session: &Session, schema: &SchemaId) -> Result<bool> {
    let schema = session
        .service
        .unpublish(schema)
        .with_context(|| format!("Failed to unpublish schema {}", schema))?;
    session.save()?;
    print_json(&schema)?;
    Ok(true)
}

pub fn versions(session: &Session, schema: &SchemaId) -> Result<bool> {
    print_json(&session.service.list_versions(schema)?)?;
    Ok(true)
}
