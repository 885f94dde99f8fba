//! Group structure management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::routes::error_response;
use bordereau_core::billing::MappingEntry;
use bordereau_db::repositories::group_structure::{
    CreateGroupStructureInput, GroupStructureError, GroupStructureRepository,
};
use bordereau_shared::AppError;
use bordereau_shared::types::{CursorPage, CursorResponse, GroupId};

/// Creates the group structure routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/group-structures", get(list_structures))
        .route("/group-structures", post(create_structure))
        .route("/group-structures/active", get(get_active_structure))
        .route("/group-structures/{id}", get(get_structure))
        .route("/group-structures/{id}/map", get(get_structure_map))
        .route("/group-structures/{id}/activate", post(activate_structure))
}

/// Query parameters for listing structure versions.
#[derive(Debug, Deserialize)]
pub struct ListStructuresQuery {
    /// Items per page.
    pub limit: Option<u64>,
    /// `next_cursor` of the previous page.
    pub cursor: Option<DateTime<Utc>>,
}

/// Request body for creating a structure version.
#[derive(Debug, Deserialize)]
pub struct CreateGroupStructureRequest {
    /// Optional human-readable label.
    pub label: Option<String>,
    /// Activate the new version immediately.
    #[serde(default)]
    pub activate: bool,
    /// Source-to-billing mapping rows.
    pub mappings: Vec<MappingRequest>,
}

/// One source-to-billing mapping row.
#[derive(Debug, Deserialize)]
pub struct MappingRequest {
    /// Team the subscription originates from.
    pub source_group_id: Uuid,
    /// Parent that receives the consolidated statement.
    pub billing_group_id: Uuid,
}

/// GET `/group-structures` - List structure versions, newest first.
async fn list_structures(
    State(state): State<AppState>,
    Query(query): Query<ListStructuresQuery>,
) -> impl IntoResponse {
    let repo = GroupStructureRepository::new((*state.db).clone());
    let page = CursorPage::new(query.limit, query.cursor);

    match repo.list(&page).await {
        Ok((items, total)) => {
            let body =
                CursorResponse::from_rows(items, total, |row| row.created_at.with_timezone(&Utc));
            (StatusCode::OK, Json(json!(body))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list group structures");
            error_response(&structure_error(e))
        }
    }
}

/// POST `/group-structures` - Create a structure version with its mappings.
async fn create_structure(
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupStructureRequest>,
) -> impl IntoResponse {
    let repo = GroupStructureRepository::new((*state.db).clone());

    let mappings = payload
        .mappings
        .iter()
        .map(|m| MappingEntry {
            source_group_id: GroupId::from_uuid(m.source_group_id),
            billing_group_id: GroupId::from_uuid(m.billing_group_id),
        })
        .collect();

    let input = CreateGroupStructureInput {
        label: payload.label,
        activate: payload.activate,
        mappings,
    };

    match repo.create(input).await {
        Ok(created) => {
            info!(
                structure_id = %created.structure.id,
                mappings = created.mappings.len(),
                active = created.structure.is_active,
                "Group structure created"
            );
            (StatusCode::CREATED, Json(json!(created))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create group structure");
            error_response(&structure_error(e))
        }
    }
}

/// GET `/group-structures/active` - The currently active structure version.
async fn get_active_structure(State(state): State<AppState>) -> impl IntoResponse {
    let repo = GroupStructureRepository::new((*state.db).clone());

    match repo.find_active().await {
        Ok(Some(structure)) => (StatusCode::OK, Json(json!(structure))).into_response(),
        Ok(None) => error_response(&AppError::NotFound("No active group structure".to_string())),
        Err(e) => {
            error!(error = %e, "Failed to load active group structure");
            error_response(&structure_error(e))
        }
    }
}

/// GET `/group-structures/{id}` - One structure version.
async fn get_structure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = GroupStructureRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(Some(structure)) => (StatusCode::OK, Json(json!(structure))).into_response(),
        Ok(None) => error_response(&AppError::NotFound(format!(
            "Group structure not found: {id}"
        ))),
        Err(e) => {
            error!(error = %e, structure_id = %id, "Failed to load group structure");
            error_response(&structure_error(e))
        }
    }
}

/// GET `/group-structures/{id}/map` - Mapping rows of one structure version.
async fn get_structure_map(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = GroupStructureRepository::new((*state.db).clone());

    match repo.mappings(id).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "items": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, structure_id = %id, "Failed to load structure mappings");
            error_response(&structure_error(e))
        }
    }
}

/// POST `/group-structures/{id}/activate` - Make a structure version the active one.
async fn activate_structure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = GroupStructureRepository::new((*state.db).clone());

    match repo.activate(id).await {
        Ok(structure) => {
            info!(structure_id = %structure.id, "Group structure activated");
            (StatusCode::OK, Json(json!(structure))).into_response()
        }
        Err(e) => {
            error!(error = %e, structure_id = %id, "Failed to activate group structure");
            error_response(&structure_error(e))
        }
    }
}

// Helper functions

fn structure_error(e: GroupStructureError) -> AppError {
    match e {
        GroupStructureError::DuplicateSourceGroup(id) => {
            AppError::Validation(format!("Duplicate source group in mappings: {id}"))
        }
        GroupStructureError::NotFound(id) => {
            AppError::NotFound(format!("Group structure not found: {id}"))
        }
        GroupStructureError::Database(err) => AppError::Database(err.to_string()),
    }
}
