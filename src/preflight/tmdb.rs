//! TMDB API preflight check.

use super::CheckResult;
use crate::models::config::{Config, TOKEN_ENV};
use crate::services::tmdb::TmdbClient;

/// Check that a bearer token is configured and accepted by TMDB.
pub async fn check(config: &Config) -> CheckResult {
    match TmdbClient::from_config(config) {
        Ok(client) => match client.verify_token().await {
            Ok(true) => CheckResult::ok("TMDB API", "connected"),
            Ok(false) => CheckResult::fail(
                "TMDB API",
                "invalid bearer token",
                &format!("Check your {} environment variable", TOKEN_ENV),
            ),
            Err(_) => CheckResult::fail(
                "TMDB API",
                "connection failed",
                "Check your network connection",
            ),
        },
        Err(_) => CheckResult::fail(
            "TMDB API",
            "bearer token not configured",
            &format!("Set {} environment variable", TOKEN_ENV),
        ),
    }
}
