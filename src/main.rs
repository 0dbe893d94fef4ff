use axum::{
    routing::{get, post},
    Router,
};
use practice_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // Session clock: one tick per second for every live controller.
    {
        let sessions = app_state.sessions.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                sessions.tick_all().await;
            }
        });
    }

    // Registry janitor: drop finished and abandoned controllers.
    {
        let sessions = app_state.sessions.clone();
        let idle_limit = Duration::from_secs(config.session_idle_minutes as u64 * 60);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                sessions.evict(idle_limit).await;
            }
        });
    }

    // Finalize-retry sweeper for sessions whose end-of-quiz transaction
    // failed.
    {
        let state = app_state.clone();
        tokio::spawn(async move {
            let session_service =
                practice_backend::services::session_service::SessionService::new(
                    state.pool.clone(),
                );
            loop {
                match session_service.list_finalize_pending(20).await {
                    Ok(pending) if !pending.is_empty() => {
                        match state.progress_service.retry_finalize_pending(&pending).await {
                            Ok(retried) => {
                                info!(retried, "finalize sweeper pass complete");
                            }
                            Err(e) => {
                                tracing::error!(error = ?e, "finalize sweeper error");
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = ?e, "failed to list finalize_pending sessions");
                    }
                }
                tokio::time::sleep(Duration::from_secs(get_config().finalize_retry_seconds)).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let practice_api = Router::new()
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
            "/api/practice/sessions/:id/filter",
            post(routes::practice::set_filter),
        )
        .route(
            "/api/practice/sessions/:id/timer",
            post(routes::practice::set_timer),
        )
        .route(
            "/api/practice/sessions/:id/mode",
            post(routes::practice::set_mode),
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
        .route("/api/exams", get(routes::practice::list_exams))
        .route(
            "/api/exams/:id/subjects",
            get(routes::practice::list_exam_subjects),
        )
        .layer(axum::middleware::from_fn(
            practice_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            practice_backend::middleware::rate_limit::RateLimiter::per_second(config.public_rps),
            practice_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(practice_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
