use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use practice_backend::middleware::auth::Claims;
use practice_backend::{routes, AppState};

fn bearer_token(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        email: Some("student@example.com".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret("test_secret_key".as_bytes()),
    )
    .expect("encode token")
}

fn practice_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/practice/sessions",
            post(routes::practice::start_practice),
        )
        .route(
            "/api/practice/sessions/:id",
            get(routes::practice::get_session),
        )
        .route(
            "/api/practice/sessions/:id/answer",
            post(routes::practice::save_answer),
        )
        .route(
            "/api/practice/sessions/:id/bookmark",
            post(routes::practice::toggle_bookmark),
        )
        .route(
            "/api/practice/sessions/:id/navigate",
            post(routes::practice::navigate),
        )
        .route(
            "/api/practice/sessions/:id/exit",
            post(routes::practice::exit_session),
        )
        .route(
            "/api/practice/sessions/:id/score",
            post(routes::practice::score_session),
        )
        .route(
            "/api/practice/progress/:exam_id",
            get(routes::practice::get_progress),
        )
        .layer(axum::middleware::from_fn(
            practice_backend::middleware::auth::require_bearer_auth,
        ))
        .with_state(state)
}

async fn json_body(response: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body")
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn practice_flow_end_to_end() {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("PUBLIC_RPS", "100");

    practice_backend::config::init_config().ok();
    let pool = practice_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let exam_id: i64 =
        sqlx::query_scalar("INSERT INTO s_exams (name) VALUES ('Flow Exam') RETURNING id")
            .fetch_one(&pool)
            .await
            .expect("seed exam");
    let subject_id: i64 = sqlx::query_scalar(
        "INSERT INTO s_practice_subjects (exam_id, name) VALUES ($1, 'Flow Subject') RETURNING id",
    )
    .bind(exam_id)
    .fetch_one(&pool)
    .await
    .expect("seed subject");

    for n in 0..2 {
        let question_id: i64 = sqlx::query_scalar(
            "INSERT INTO s_practice_questions (subject_id, exam_id, question_text, rationale)
             VALUES ($1, $2, $3, 'because') RETURNING id",
        )
        .bind(subject_id)
        .bind(exam_id)
        .bind(format!("Question {n}"))
        .fetch_one(&pool)
        .await
        .expect("seed question");

        // First choice is the correct one for every seeded question.
        for (text, is_correct) in [("right", true), ("wrong", false)] {
            sqlx::query(
                "INSERT INTO s_practice_answers (question_id, answer_text, is_correct) VALUES ($1, $2, $3)",
            )
            .bind(question_id)
            .bind(text)
            .bind(is_correct)
            .execute(&pool)
            .await
            .expect("seed choice");
        }
    }

    let user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO s_user_exams (user_id, exam_id, is_paid, access_type) VALUES ($1, $2, TRUE, 'paid')",
    )
    .bind(user_id)
    .bind(exam_id)
    .execute(&pool)
    .await
    .expect("seed access grant");

    let state = AppState::new(pool.clone());
    let app = practice_router(state);
    let token = bearer_token(user_id);

    // No token: rejected before any handler runs.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/practice/sessions")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"subject_id": subject_id}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/practice/sessions")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    json!({"subject_id": subject_id}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let started = json_body(response).await;
    let practice_id = started["practice_id"].as_str().expect("practice id");
    assert_eq!(started["total_questions"], 2);
    assert!(started["session_id"].is_string());

    // Answer the current question with its correct letter.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/practice/sessions/{practice_id}/answer"))
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(json!({"choice": "a"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let answered = json_body(response).await;
    assert_eq!(answered["is_correct"], true);

    // Bookmark it, then move on.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/practice/sessions/{practice_id}/bookmark"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["bookmarked"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/practice/sessions/{practice_id}/navigate"))
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(json!({"action": "next"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view = json_body(response).await;
    assert_eq!(view["current_index"], 1);

    // Exit, then hit the score path: same finalized numbers both times.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/practice/sessions/{practice_id}/exit"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    assert_eq!(report["total_questions"], 2);
    assert_eq!(report["correct_answers"], 1);
    assert_eq!(report["score"], 50.0);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/practice/sessions/{practice_id}/score"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second_report = json_body(response).await;
    assert_eq!(second_report["correct_answers"], 1);

    // Cumulative progress deduplicates by question across sessions.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/practice/progress/{exam_id}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let progress = json_body(response).await;
    assert_eq!(progress["questions_completed"], 1);
    assert_eq!(progress["correct_answers"], 1);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn start_without_grant_is_forbidden() {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("PUBLIC_RPS", "100");

    practice_backend::config::init_config().ok();
    let pool = practice_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let exam_id: i64 =
        sqlx::query_scalar("INSERT INTO s_exams (name) VALUES ('Locked Exam') RETURNING id")
            .fetch_one(&pool)
            .await
            .expect("seed exam");
    let subject_id: i64 = sqlx::query_scalar(
        "INSERT INTO s_practice_subjects (exam_id, name) VALUES ($1, 'Locked Subject') RETURNING id",
    )
    .bind(exam_id)
    .fetch_one(&pool)
    .await
    .expect("seed subject");

    let state = AppState::new(pool);
    let app = practice_router(state);
    let token = bearer_token(Uuid::new_v4());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/practice/sessions")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    json!({"subject_id": subject_id}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
