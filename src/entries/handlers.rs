use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiQuery};
use crate::models::{
    DeletedEntry, Entry, EntryCandidate, EntryListResponse, EntryPatchInput, ListEntriesQuery,
    RemovedEntries, SeededEntries,
};
use crate::response::{Data, Envelope, data, ok};
use crate::validation::{parse_filter, parse_new_entry, parse_patch};

pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiQuery(query): ApiQuery<ListEntriesQuery>,
) -> Result<Json<Envelope<EntryListResponse>>, ApiError> {
    let filter = parse_filter(&query)?;
    let list = state.entries.list(&identity.user_id, &filter).await?;
    Ok(ok(list.into()))
}

pub async fn get_entry(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Data<Entry>>>, ApiError> {
    let entry = state
        .entries
        .get_by_id(&identity.user_id, &id)
        .await?
        .ok_or(ApiError::NotFound("Entry"))?;
    Ok(data(entry))
}

pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(candidate): ApiJson<EntryCandidate>,
) -> Result<(StatusCode, Json<Envelope<Data<Entry>>>), ApiError> {
    let input = parse_new_entry(&candidate)?;
    let entry = state.entries.create(&identity.user_id, input).await?;
    Ok((StatusCode::CREATED, data(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<EntryPatchInput>,
) -> Result<Json<Envelope<Data<Entry>>>, ApiError> {
    // Unknown ids are reported before payload problems.
    if state.entries.get_by_id(&identity.user_id, &id).await?.is_none() {
        return Err(ApiError::NotFound("Entry"));
    }
    let patch = parse_patch(&input)?;
    let entry = state
        .entries
        .update(&identity.user_id, &id, patch)
        .await?
        .ok_or(ApiError::NotFound("Entry"))?;
    Ok(data(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Data<DeletedEntry>>>, ApiError> {
    if !state.entries.delete_by_id(&identity.user_id, &id).await? {
        return Err(ApiError::NotFound("Entry"));
    }
    Ok(data(DeletedEntry {
        id,
        message: "Entry deleted successfully.".to_string(),
    }))
}

pub async fn delete_all_entries(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Envelope<Data<RemovedEntries>>>, ApiError> {
    let removed = state.entries.delete_all(&identity.user_id).await?;
    Ok(data(RemovedEntries {
        removed,
        message: format!("{removed} entries deleted."),
    }))
}

pub async fn seed_entries(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<(StatusCode, Json<Envelope<Data<SeededEntries>>>), ApiError> {
    let seeded = state.entries.seed_demo(&identity.user_id).await?;
    Ok((
        StatusCode::CREATED,
        data(SeededEntries {
            seeded,
            message: format!("{seeded} demo entries inserted."),
        }),
    ))
}
