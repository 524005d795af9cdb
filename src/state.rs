use crate::config::NetmonConfig;
use axum::extract::FromRef;
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: NetmonConfig,
    pub db: PgPool,
    pub http: Client,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.db.clone()
    }
}

impl FromRef<AppState> for Client {
    fn from_ref(state: &AppState) -> Client {
        state.http.clone()
    }
}
