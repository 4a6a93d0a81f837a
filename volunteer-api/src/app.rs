/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use volunteer_api::{app::{build_router, AppState}, config::Config};
/// use volunteer_shared::{auth::notifier::LogNotifier, store::MemoryStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config, Arc::new(LogNotifier))?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::require_auth, headers::security_headers},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use volunteer_shared::{
    auth::{
        notifier::ResetNotifier,
        password::PasswordHasher,
        AuthGuard, AuthService,
    },
    store::Store,
};

/// Shared application state
///
/// Cloned into every handler through `State`; everything inside is behind an
/// `Arc` or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub guard: AuthGuard,
}

impl AppState {
    /// Wires the auth services to a store
    ///
    /// # Errors
    ///
    /// Fails if the configured Argon2 parameters are rejected.
    pub fn new(
        store: Arc<dyn Store>,
        config: Config,
        notifier: Arc<dyn ResetNotifier>,
    ) -> anyhow::Result<Self> {
        let tokens = Arc::new(config.token_service());
        let hasher = PasswordHasher::new(config.hash_params())?;

        let auth = AuthService::new(store.clone(), tokens.clone(), hasher, notifier)?;
        let guard = AuthGuard::new(store.clone(), tokens);

        Ok(Self {
            store,
            config: Arc::new(config),
            auth: Arc::new(auth),
            guard,
        })
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET /health
/// └── /api
///     ├── /auth
///     │   ├── POST   /signup
///     │   ├── POST   /login                      (form-encoded)
///     │   ├── POST   /request-reset
///     │   ├── POST   /reset-password
///     │   └── DELETE /delete-account             (bearer)
///     ├── /users
///     │   ├── GET    /                           (bearer)
///     │   ├── GET    /me                         (bearer)
///     │   ├── GET    /me/registrations           (bearer)
///     │   └── GET    /:user_id                   (bearer)
///     ├── /events
///     │   ├── GET    /
///     │   ├── POST   /                           (bearer, admin)
///     │   ├── GET    /:event_id
///     │   ├── PUT    /:event_id                  (bearer, admin)
///     │   ├── DELETE /:event_id                  (bearer, admin)
///     │   ├── GET    /:event_id/registrations    (bearer, admin)
///     │   ├── POST   /:event_id/registrations    (bearer, admin or self)
///     │   └── DELETE /:event_id/registrations/:user_id   (bearer, admin or self)
///     └── /organization
///         ├── GET    /
///         ├── POST   /                           (bearer)
///         ├── PUT    /:organization_id           (bearer, admin)
///         ├── DELETE /:organization_id           (bearer, creator)
///         ├── GET    /:organization_id/users     (bearer, member)
///         ├── POST   /:organization_id/users     (bearer)
///         ├── PUT    /:organization_id/users/:user_id    (bearer, admin)
///         └── DELETE /:organization_id/users/:user_id    (bearer, admin or self)
/// ```
///
/// Layers, outermost first: security headers, CORS, request tracing, then the
/// bearer guard on protected routes only.
pub fn build_router(state: AppState) -> Router {
    let auth_layer = from_fn_with_state(state.clone(), require_auth);

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/request-reset", post(routes::auth::request_reset))
        .route("/reset-password", post(routes::auth::reset_password))
        .merge(
            Router::new()
                .route("/delete-account", delete(routes::auth::delete_account))
                .route_layer(auth_layer.clone()),
        );

    let user_routes = Router::new()
        .route("/users", get(routes::users::list_users))
        .route("/users/me", get(routes::users::me))
        .route("/users/me/registrations", get(routes::users::my_registrations))
        .route("/users/:user_id", get(routes::users::get_user))
        .route_layer(auth_layer.clone());

    let public_event_routes = Router::new()
        .route("/events", get(routes::events::list_events))
        .route("/events/:event_id", get(routes::events::get_event));

    let protected_event_routes = Router::new()
        .route("/events", post(routes::events::create_event))
        .route(
            "/events/:event_id",
            put(routes::events::update_event).delete(routes::events::delete_event),
        )
        .route(
            "/events/:event_id/registrations",
            get(routes::events::list_registrations).post(routes::events::register),
        )
        .route(
            "/events/:event_id/registrations/:user_id",
            delete(routes::events::unregister),
        )
        .route_layer(auth_layer.clone());

    let public_organization_routes =
        Router::new().route("/organization", get(routes::organizations::list_organizations));

    let protected_organization_routes = Router::new()
        .route("/organization", post(routes::organizations::create_organization))
        .route(
            "/organization/:organization_id",
            put(routes::organizations::update_organization)
                .delete(routes::organizations::delete_organization),
        )
        .route(
            "/organization/:organization_id/users",
            get(routes::organizations::list_members).post(routes::organizations::add_member),
        )
        .route(
            "/organization/:organization_id/users/:user_id",
            put(routes::organizations::update_member_role)
                .delete(routes::organizations::remove_member),
        )
        .route_layer(auth_layer);

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(user_routes)
        .merge(public_event_routes)
        .merge(protected_event_routes)
        .merge(public_organization_routes)
        .merge(protected_organization_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(from_fn_with_state(state.clone(), security_headers))
        .with_state(state)
}
