use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use std::{sync::Arc, time::Instant};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod constants;
pub mod database;
pub mod entries;
pub mod error;
pub mod health;
pub mod models;
pub mod password;
pub mod response;
pub mod token;
pub mod users;
pub mod validation;

use auth::AuthService;
use config::Config;
use database::Db;
use entries::{EntriesService, EntryStore};
use error::ApiError;
use token::TokenService;
use users::UserStore;

/// Services shared by every handler, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: UserStore,
    pub entries: EntriesService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Db, config: &Config) -> Self {
        let tokens = Arc::new(TokenService::new(&config.token_secret, config.token_ttl));
        Self::with_tokens(db, tokens)
    }

    pub fn with_tokens(db: Db, tokens: Arc<TokenService>) -> Self {
        let users = UserStore::new(db.clone());
        Self {
            auth: Arc::new(AuthService::new(users.clone(), tokens)),
            users,
            entries: EntriesService::new(EntryStore::new(db)),
            started_at: Instant::now(),
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route")
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/entries",
            get(entries::handlers::list_entries)
                .post(entries::handlers::create_entry)
                .delete(entries::handlers::delete_all_entries),
        )
        .route("/entries/seed", post(entries::handlers::seed_entries))
        .route(
            "/entries/{id}",
            get(entries::handlers::get_entry)
                .put(entries::handlers::update_entry)
                .delete(entries::handlers::delete_entry),
        )
        .route("/user/me", get(users::me).delete(users::delete_me))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
