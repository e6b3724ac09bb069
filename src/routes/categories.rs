use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{parse_id, single_item, store_err};
use crate::{
    db::{self, SqlArg},
    error::{AppError, AppResult},
    params::{ParamError, Params},
    shape::keyed,
    state::AppState,
    types::{CreatedResponse, NewCategory, CATEGORY_FIELDS},
};

pub fn parse_new_category(params: &Params) -> Result<NewCategory, ParamError> {
    Ok(NewCategory { name: params.text("name")? })
}

pub async fn get_category(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let row = match parse_id(&id) {
        Some(id) => db::query_one(&state.db, "SELECT id, name FROM categories WHERE id = ?1", &[SqlArg::Int(id)])
            .await
            .map_err(store_err(&state))?,
        None => None,
    };
    Ok(Json(single_item(&state, "Category", &CATEGORY_FIELDS, row)?))
}

pub async fn list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = db::query_all(&state.db, "SELECT id, name FROM categories", &[])
        .await
        .map_err(store_err(&state))?;
    Ok(Json(keyed(&CATEGORY_FIELDS, &rows)))
}

pub async fn create_category(
    State(state): State<AppState>,
    params: Result<Params, AppError>,
) -> AppResult<impl IntoResponse> {
    let params = params.map_err(|e| state.record_error(e))?;
    let new = parse_new_category(&params).map_err(|e| state.record_error(e.into()))?;

    let id = db::execute(&state.db, "INSERT INTO categories (name) VALUES (?1)", &[SqlArg::Text(new.name)])
        .await
        .map_err(store_err(&state))?;

    state.metrics.inc_categories();
    tracing::info!(id, "Created category");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}
