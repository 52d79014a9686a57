//! Routes generated for one catalog resource.
//!
//! Every resource gets the CRUD set:
//!
//! - `POST   /add<name>` (create-or-update for keyed resources)
//! - `GET    /get<plural>`
//! - `GET    /get<name>/{id}`
//! - `PUT    /update<name>/{id}`
//! - `DELETE /delete<name>/{id}`
//!
//! plus, depending on the schema, `GET /getactive<plural>`,
//! `PUT /toggle<name>status/{id}`, `PUT /reorder<plural>`,
//! `GET /get<name>bykey/{key}`, `GET /search<plural>?q=`,
//! `GET /get<name>statuscounts` and the nested sub-collection routes
//! `/<name>/{parent_id}/<sub>[/{sub_ref}]`.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use campus_cms_core::document::model::ACTIVE_FIELD;
use campus_cms_core::resource::{ListQuery, ReorderOutcome};
use campus_cms_core::{Document, ResourceService, SubRef, UpsertOutcome};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::response::{created, ok, ok_with, Reply};

type Svc = State<ResourceService>;

pub fn routes(service: ResourceService) -> Router {
    let schema = service.schema();
    let name = schema.name.as_str();
    let plural = schema.plural.as_str();

    let mut router = Router::new()
        .route(&format!("/get{plural}"), get(list))
        .route(&format!("/get{name}/{{id}}"), get(get_one))
        .route(&format!("/update{name}/{{id}}"), put(update))
        .route(&format!("/delete{name}/{{id}}"), delete(remove));

    router = if schema.unique_key.is_some() {
        router
            .route(&format!("/add{name}"), post(create_or_update))
            .route(&format!("/get{name}bykey/{{key}}"), get(get_by_key))
    } else {
        router.route(&format!("/add{name}"), post(create))
    };

    if schema.toggleable {
        router = router
            .route(&format!("/getactive{plural}"), get(list_active))
            .route(&format!("/toggle{name}status/{{id}}"), put(toggle_status));
    }
    if schema.ordered {
        router = router.route(&format!("/reorder{plural}"), put(reorder));
    }
    if !schema.search_fields.is_empty() {
        router = router.route(&format!("/search{plural}"), get(search));
    }
    if schema.status_field.is_some() {
        router = router.route(&format!("/get{name}statuscounts"), get(status_counts));
    }
    if !schema.sub_collections.is_empty() {
        router = router
            .route(
                &format!("/{name}/{{parent_id}}/{{segment}}"),
                get(list_sub).post(add_sub),
            )
            .route(
                &format!("/{name}/{{parent_id}}/{{segment}}/{{sub_ref}}"),
                put(update_sub).delete(delete_sub),
            );
    }

    router.with_state(service)
}

async fn create(State(svc): Svc, JsonBody(body): JsonBody) -> ApiResult<Reply<Document>> {
    let doc = svc.create(&body).await?;
    Ok(created(doc, format!("{} created successfully", svc.schema().label)))
}

/// 201 when the key was new, 200 when an existing document was replaced.
async fn create_or_update(State(svc): Svc, JsonBody(body): JsonBody) -> ApiResult<Reply<Document>> {
    let (doc, outcome) = svc.create_or_update(&body).await?;
    let label = svc.schema().label;
    Ok(match outcome {
        UpsertOutcome::Created => created(doc, format!("{label} created successfully")),
        UpsertOutcome::Replaced => ok_with(doc, format!("{label} updated successfully")),
    })
}

async fn list(State(svc): Svc, Query(query): Query<ListQuery>) -> ApiResult<Reply<Vec<Document>>> {
    Ok(ok(svc.list(&query).await?))
}

async fn list_active(State(svc): Svc) -> ApiResult<Reply<Vec<Document>>> {
    Ok(ok(svc.list_active().await?))
}

async fn get_one(State(svc): Svc, Path(id): Path<String>) -> ApiResult<Reply<Document>> {
    Ok(ok(svc.get(&id).await?))
}

async fn get_by_key(State(svc): Svc, Path(key): Path<String>) -> ApiResult<Reply<Document>> {
    Ok(ok(svc.get_by_key(&key).await?))
}

async fn update(
    State(svc): Svc,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Reply<Document>> {
    let doc = svc.update(&id, &body).await?;
    Ok(ok_with(doc, format!("{} updated successfully", svc.schema().label)))
}

async fn remove(State(svc): Svc, Path(id): Path<String>) -> ApiResult<Reply<Document>> {
    let doc = svc.delete(&id).await?;
    Ok(ok_with(doc, format!("{} deleted successfully", svc.schema().label)))
}

async fn toggle_status(State(svc): Svc, Path(id): Path<String>) -> ApiResult<Reply<Document>> {
    let doc = svc.toggle_active(&id).await?;
    let state = if doc.flag(ACTIVE_FIELD, true) {
        "activated"
    } else {
        "deactivated"
    };
    Ok(ok_with(doc, format!("{} {state}", svc.schema().label)))
}

/// Per-pair results in request order; `null` marks a pair that did not apply.
async fn reorder(State(svc): Svc, JsonBody(body): JsonBody) -> ApiResult<Reply<Vec<Option<Document>>>> {
    let updates = svc.parse_reorder(&body)?;
    let outcomes = svc.reorder(&updates).await?;

    let data: Vec<Option<Document>> = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            ReorderOutcome::Updated(doc) => Some(doc),
            ReorderOutcome::Missing(_) | ReorderOutcome::Failed { .. } => None,
        })
        .collect();
    let applied = data.iter().flatten().count();
    let message = format!("{applied} of {} {} orders updated", data.len(), svc.schema().label);
    Ok(ok_with(data, message))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search(State(svc): Svc, Query(params): Query<SearchParams>) -> ApiResult<Reply<Vec<Document>>> {
    Ok(ok(svc.search(&params.q).await?))
}

async fn status_counts(State(svc): Svc) -> ApiResult<Reply<Map<String, Value>>> {
    Ok(ok(svc.status_counts().await?))
}

fn sub_label(svc: &ResourceService, segment: &str) -> &'static str {
    svc.schema()
        .sub_collection(segment)
        .map_or("Item", |sub| sub.label)
}

async fn list_sub(
    State(svc): Svc,
    Path((parent_id, segment)): Path<(String, String)>,
) -> ApiResult<Reply<Vec<Value>>> {
    Ok(ok(svc.list_sub(&parent_id, &segment).await?))
}

/// Entities come back as the stored entity; primitives as
/// `{ "index": n, "value": v }` since their position is their address.
async fn add_sub(
    State(svc): Svc,
    Path((parent_id, segment)): Path<(String, String)>,
    JsonBody(body): JsonBody,
) -> ApiResult<Reply<Value>> {
    let added = svc.add_sub(&parent_id, &segment, &body).await?;
    let indexed = svc
        .schema()
        .sub_collection(&segment)
        .is_some_and(|sub| sub.is_indexed());
    let data = if indexed {
        json!({ "index": added.index, "value": added.item })
    } else {
        added.item
    };
    Ok(created(data, format!("{} added successfully", sub_label(&svc, &segment))))
}

async fn update_sub(
    State(svc): Svc,
    Path((parent_id, segment, sub_ref)): Path<(String, String, String)>,
    JsonBody(body): JsonBody,
) -> ApiResult<Reply<Value>> {
    let updated = svc
        .update_sub(&parent_id, &segment, &SubRef::parse(&sub_ref), &body)
        .await?;
    Ok(ok_with(updated, format!("{} updated successfully", sub_label(&svc, &segment))))
}

async fn delete_sub(
    State(svc): Svc,
    Path((parent_id, segment, sub_ref)): Path<(String, String, String)>,
) -> ApiResult<Reply<Document>> {
    let parent = svc
        .delete_sub(&parent_id, &segment, &SubRef::parse(&sub_ref))
        .await?;
    Ok(ok_with(parent, format!("{} deleted successfully", sub_label(&svc, &segment))))
}
