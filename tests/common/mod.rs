#![allow(dead_code)]

pub mod strategies;

use serde_json::json;
use space_migrator::models::{MigrationRequest, ResourceIdentifier};
use space_migrator::orchestration::{MigrationOrchestrator, OrchestratorConfig};
use space_migrator::remote::{InMemorySpace, MetadataPayload, RecordPayload, SchemaPayload};
use std::sync::Arc;

pub fn schema(name: &str) -> SchemaPayload {
    SchemaPayload {
        name: Some(name.to_string()),
        display_field: Some("title".to_string()),
        description: None,
        fields: vec![
            json!({"id": "title", "name": "Title", "type": "Symbol", "required": true}),
            json!({"id": "body", "name": "Body", "type": "Text"}),
        ],
    }
}

pub fn metadata() -> MetadataPayload {
    MetadataPayload {
        controls: vec![json!({"fieldId": "title", "widgetId": "singleLine"})],
    }
}

pub fn record(title: &str) -> RecordPayload {
    let mut payload = RecordPayload::default();
    payload
        .fields
        .insert("title".to_string(), json!({ "en-US": title }));
    payload
}

/// Source environment where each content type has metadata and `n` records
pub fn source_space(types: &[(&str, usize)]) -> Arc<InMemorySpace> {
    let space = InMemorySpace::empty("master");
    for (id, count) in types {
        space.insert_schema(id, schema(id));
        space.insert_metadata(id, metadata());
        space.insert_records(
            id,
            (0..*count).map(|n| record(&format!("{id} #{n}"))).collect(),
        );
    }
    Arc::new(space)
}

pub fn target_space() -> Arc<InMemorySpace> {
    Arc::new(InMemorySpace::empty("staging"))
}

pub fn request(values: &[&str], migrate_records: bool) -> MigrationRequest {
    MigrationRequest::new(ids(values), migrate_records).expect("test request should be valid")
}

pub fn ids(values: &[&str]) -> Vec<ResourceIdentifier> {
    values.iter().map(|v| ResourceIdentifier::new(*v).unwrap()).collect()
}

pub fn orchestrator(
    source: &Arc<InMemorySpace>,
    target: &Arc<InMemorySpace>,
    config: OrchestratorConfig,
) -> MigrationOrchestrator {
    MigrationOrchestrator::new(source.clone(), target.clone(), config)
}
