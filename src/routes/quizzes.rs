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
    types::{CreatedResponse, NewQuiz, QUIZ_FIELDS},
};

const SELECT_ONE: &str = "SELECT id, title, level, category_id FROM quizes WHERE id = ?1";
const SELECT_ALL: &str = "SELECT id, title, level, category_id FROM quizes";
const INSERT: &str = "INSERT INTO quizes (title, level, category_id) VALUES (?1, ?2, ?3)";

pub fn parse_new_quiz(params: &Params) -> Result<NewQuiz, ParamError> {
    Ok(NewQuiz {
        title: params.text("title")?,
        level: params.int("level")?,
        category_id: params.int("category_id")?,
    })
}

pub async fn get_quiz(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let row = match parse_id(&id) {
        Some(id) => db::query_one(&state.db, SELECT_ONE, &[SqlArg::Int(id)]).await.map_err(store_err(&state))?,
        None => None,
    };
    Ok(Json(single_item(&state, "Quiz", &QUIZ_FIELDS, row)?))
}

pub async fn list_quizzes(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = db::query_all(&state.db, SELECT_ALL, &[]).await.map_err(store_err(&state))?;
    Ok(Json(keyed(&QUIZ_FIELDS, &rows)))
}

// category_id is stored as given; the category does not have to exist.
pub async fn create_quiz(
    State(state): State<AppState>,
    params: Result<Params, AppError>,
) -> AppResult<impl IntoResponse> {
    let params = params.map_err(|e| state.record_error(e))?;
    let new = parse_new_quiz(&params).map_err(|e| state.record_error(e.into()))?;

    let args = [SqlArg::Text(new.title), SqlArg::Int(new.level), SqlArg::Int(new.category_id)];
    let id = db::execute(&state.db, INSERT, &args).await.map_err(store_err(&state))?;

    state.metrics.inc_quizzes();
    tracing::info!(id, category_id = new.category_id, "Created quiz");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}
