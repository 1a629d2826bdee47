#![allow(dead_code)]

use actix_web::web;
use std::sync::Arc;
use tracksync::repo::inmem::InMemRepo;
use tracksync::token::TokenService;
use tracksync::AppState;

pub const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

pub fn tokens() -> TokenService {
    TokenService::new(SECRET, chrono::Duration::hours(1))
}

/// Fresh in-memory state; the repo handle is returned for direct inspection.
pub fn state() -> (web::Data<AppState>, InMemRepo) {
    let repo = InMemRepo::new();
    let state = AppState::new(Arc::new(repo.clone()), tokens());
    (web::Data::new(state), repo)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
