use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub(crate) mod email;
pub(crate) mod handlers;
pub mod tokens;

use self::email::{EmailSender, LogEmailSender};
use self::tokens::ClaimSigner;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::registration_initialize::registration_initialize,
        handlers::registration_finalize::registration_finalize,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::registration_initialize::RegistrationInitialize,
        handlers::registration_initialize::RegistrationInitializeResponse,
        handlers::registration_finalize::RegistrationFinalize,
        handlers::registration_finalize::RegistrationFinalizeResponse,
    )),
    tags(
        (name = "registration", description = "Two-phase account registration"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

/// Start the server
///
/// # Errors
///
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: &str, globals: &GlobalArgs) -> Result<()> {
    let signer = Arc::new(ClaimSigner::new(
        globals.token_secret.clone(),
        globals.claim_token_ttl_seconds,
        globals.session_token_ttl_seconds,
    )?);

    let sender: Arc<dyn EmailSender> = Arc::new(LogEmailSender);

    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")?;

    let app = router()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(signer))
                .layer(Extension(sender))
                .layer(Extension(pool)),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/registration/initialize",
            post(handlers::registration_initialize::registration_initialize),
        )
        .route(
            "/registration/finalize",
            post(handlers::registration_finalize::registration_finalize),
        )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown signal handler: {err}");
        return;
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
