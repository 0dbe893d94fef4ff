use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use crate::dto::practice_dto::{
    AnswerRequest, BookmarkResponse, FilterRequest, ModeRequest, NavigateRequest,
    StartPracticeRequest, StartPracticeResponse, TimerRequest,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::CurrentUser;
use crate::quiz::controller::QuizController;
use crate::quiz::navigation::ArrowKey;
use crate::AppState;

async fn controller_for(
    state: &AppState,
    practice_id: Uuid,
    user: &CurrentUser,
) -> Result<Arc<Mutex<QuizController>>> {
    let Some(controller) = state.sessions.get(practice_id).await else {
        return Err(Error::NotFound("Practice session not found".to_string()));
    };
    if controller.lock().await.owner_id() != user.id {
        return Err(Error::NotFound("Practice session not found".to_string()));
    }
    Ok(controller)
}

#[axum::debug_handler]
pub async fn start_practice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartPracticeRequest>,
) -> Result<Response> {
    req.validate()?;
    let user = CurrentUser::from_claims(&claims)?;

    let subject = state.catalog_service.get_subject(req.subject_id).await?;
    let exam_id = state
        .session_service
        .resolve_exam_id(req.subject_id, req.exam_id)
        .await?;
    let exam = match exam_id {
        Some(id) => Some(state.catalog_service.get_exam(id).await?),
        None => None,
    };
    if let Some(exam) = &exam {
        state
            .access_service
            .ensure_exam_access(user.id, exam.id)
            .await?;
    }

    let controller = QuizController::open(
        user,
        subject,
        exam,
        state.practice_store(),
        state.question_bank.clone(),
    )
    .await?;

    let session_id = controller.session_id();
    let exam_id = controller.exam_id();
    let exam_name = controller.exam_name().map(str::to_string);
    let subject_name = controller.subject_name().to_string();
    let total_questions = controller.total_questions();
    let practice_id = state.sessions.insert(controller).await;

    tracing::info!(%practice_id, ?session_id, "practice session opened");
    Ok(Json(StartPracticeResponse {
        practice_id,
        session_id,
        exam_id,
        exam_name,
        subject_name,
        total_questions,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let view = controller.lock().await.view();
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Response> {
    req.validate()?;
    let user = CurrentUser::from_claims(&claims)?;
    let choice = req
        .choice
        .chars()
        .next()
        .ok_or_else(|| Error::BadRequest("Missing choice letter".to_string()))?;

    let controller = controller_for(&state, practice_id, &user).await?;
    let outcome = controller.lock().await.record_answer(choice).await?;
    Ok(Json(outcome).into_response())
}

#[axum::debug_handler]
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let mut guard = controller.lock().await;
    let question_id = guard.current_question_id();
    let bookmarked = guard.toggle_bookmark().await?;
    Ok(Json(BookmarkResponse {
        question_id,
        bookmarked,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn navigate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
    Json(req): Json<NavigateRequest>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let mut guard = controller.lock().await;

    match req.action.as_str() {
        "next" => {
            guard.next();
        }
        "previous" => {
            guard.previous();
        }
        "arrow_right" => {
            guard.handle_key(ArrowKey::Right);
        }
        "arrow_left" => {
            guard.handle_key(ArrowKey::Left);
        }
        "jump" => {
            let index = req
                .index
                .ok_or_else(|| Error::BadRequest("jump requires an index".to_string()))?;
            guard.jump_to(index)?;
        }
        other => {
            return Err(Error::BadRequest(format!(
                "Unknown navigation action '{}'",
                other
            )));
        }
    }

    Ok(Json(guard.view()).into_response())
}

#[axum::debug_handler]
pub async fn set_filter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
    Json(req): Json<FilterRequest>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let mut guard = controller.lock().await;
    guard.set_filter(req.filter);
    Ok(Json(guard.view()).into_response())
}

#[axum::debug_handler]
pub async fn set_timer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
    Json(req): Json<TimerRequest>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let mut guard = controller.lock().await;
    guard.set_paused(req.paused);
    Ok(Json(guard.view()).into_response())
}

#[axum::debug_handler]
pub async fn set_mode(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
    Json(req): Json<ModeRequest>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let mut guard = controller.lock().await;
    guard.set_quiz_mode(req.quiz_mode);
    Ok(Json(guard.view()).into_response())
}

/// Exit path: finalize and report.
#[axum::debug_handler]
pub async fn exit_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let report = controller.lock().await.finish().await?;
    Ok(Json(report).into_response())
}

/// Score-screen path: same finalize, idempotent against the exit path.
#[axum::debug_handler]
pub async fn score_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(practice_id): Path<Uuid>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let controller = controller_for(&state, practice_id, &user).await?;
    let report = controller.lock().await.finish().await?;
    Ok(Json(report).into_response())
}

#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<Response> {
    let user = CurrentUser::from_claims(&claims)?;
    let progress = state
        .progress_service
        .get_for_exam(user.id, exam_id)
        .await?
        .ok_or_else(|| Error::NotFound("No progress recorded for this exam".to_string()))?;
    Ok(Json(progress).into_response())
}

#[axum::debug_handler]
pub async fn list_exams(State(state): State<AppState>) -> Result<Response> {
    let exams = state.catalog_service.list_exams().await?;
    Ok(Json(exams).into_response())
}

#[axum::debug_handler]
pub async fn list_exam_subjects(
    State(state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> Result<Response> {
    let subjects = state.catalog_service.list_subjects(exam_id).await?;
    Ok(Json(subjects).into_response())
}
