use actix_web::{web, HttpResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::AppState;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("username pattern compiles"));

fn default_max_tweets() -> u32 {
    10
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    pub username: String,
    #[validate(range(min = 1, max = 100, message = "max_tweets must be between 1 and 100"))]
    #[serde(default = "default_max_tweets")]
    pub max_tweets: u32,
}

/// Trim, drop a leading `@` and check the handle format.
pub fn normalize_username(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let username = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if username.is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::Validation(
            "username must be 1-15 letters, digits or underscores".to_string(),
        ));
    }
    Ok(username.to_string())
}

/// Analyze a user's recent posts
///
/// POST /analyze
pub async fn analyze(
    state: web::Data<AppState>,
    req: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let username = normalize_username(&req.username)?;

    let result = state.pipeline.analyze(&username, req.max_tweets).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/analyze", web::post().to(analyze));
}
