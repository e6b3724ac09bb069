use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};

use super::{parse_id, single_item, store_err};
use crate::{
    db::{self, SqlArg},
    error::{AppError, AppResult},
    params::{ParamError, Params},
    shape::{keyed, shape},
    state::AppState,
    types::{CreatedResponse, NewQuestion, OPTION_FIELDS, QUESTION_FIELDS},
};

const SELECT_ONE: &str = "SELECT id, content, score, quiz_id FROM questions WHERE id = ?1";
const SELECT_ALL: &str = "SELECT id, content, score, quiz_id FROM questions";
const SELECT_OPTIONS: &str = "SELECT id, content, is_correct FROM options WHERE question_id = ?1";
const INSERT_QUESTION: &str = "INSERT INTO questions (content, score, quiz_id) VALUES (?1, ?2, ?3)";
const INSERT_OPTION: &str = "INSERT INTO options (content, is_correct, question_id) VALUES (?1, ?2, ?3)";

/// Form field `text` is stored as the question's `content`; `options` are the
/// distractors and `answer` the correct option.
pub fn parse_new_question(params: &Params) -> Result<NewQuestion, ParamError> {
    Ok(NewQuestion {
        content: params.text("text")?,
        score: params.int("score")?,
        distractors: params.text_list("options")?,
        answer: params.text("answer")?,
        quiz_id: params.int("quiz_id")?,
    })
}

/// Nests the question's options as `{ "<option id>": {content, is_correct} }`.
pub async fn get_question(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let Some(id) = parse_id(&id) else {
        return Ok(Json(single_item(&state, "Question", &QUESTION_FIELDS, None)?));
    };
    let row = db::query_one(&state.db, SELECT_ONE, &[SqlArg::Int(id)]).await.map_err(store_err(&state))?;
    let Some(row) = row else {
        return Ok(Json(single_item(&state, "Question", &QUESTION_FIELDS, None)?));
    };

    let mut question = shape(&QUESTION_FIELDS, &row, &[]);
    let option_rows =
        db::query_all(&state.db, SELECT_OPTIONS, &[SqlArg::Int(id)]).await.map_err(store_err(&state))?;
    let options: Map<String, Value> = keyed(&OPTION_FIELDS, &option_rows)
        .into_iter()
        .map(|(opt_id, fields)| (option_key(&opt_id), Value::Object(fields)))
        .collect();
    question.insert("options".to_string(), Value::Object(options));

    Ok(Json(question))
}

fn option_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub async fn list_questions(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = db::query_all(&state.db, SELECT_ALL, &[]).await.map_err(store_err(&state))?;
    Ok(Json(keyed(&QUESTION_FIELDS, &rows)))
}

/// Inserts the question, its distractors and the answer in one transaction:
/// either all rows are written or none.
pub async fn create_question(
    State(state): State<AppState>,
    params: Result<Params, AppError>,
) -> AppResult<impl IntoResponse> {
    let params = params.map_err(|e| state.record_error(e))?;
    let new = parse_new_question(&params).map_err(|e| state.record_error(e.into()))?;

    let id = insert_question(&state, &new).await.map_err(store_err(&state))?;

    let option_count = new.distractors.len() as u64 + 1;
    state.metrics.inc_questions();
    state.metrics.add_options(option_count);
    tracing::info!(id, quiz_id = new.quiz_id, options = option_count, "Created question");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn insert_question(state: &AppState, new: &NewQuestion) -> Result<i64, sqlx::Error> {
    let mut tx = state.db.begin().await?;

    let id = db::execute(
        &mut *tx,
        INSERT_QUESTION,
        &[SqlArg::Text(new.content.clone()), SqlArg::Int(new.score), SqlArg::Int(new.quiz_id)],
    )
    .await?;

    for distractor in &new.distractors {
        db::execute(&mut *tx, INSERT_OPTION, &[SqlArg::from(distractor.as_str()), SqlArg::Int(0), SqlArg::Int(id)])
            .await?;
    }
    db::execute(&mut *tx, INSERT_OPTION, &[SqlArg::from(new.answer.as_str()), SqlArg::Int(1), SqlArg::Int(id)])
        .await?;

    // Dropping an uncommitted transaction rolls it back
    tx.commit().await?;
    Ok(id)
}
