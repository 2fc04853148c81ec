//! TMDB API client.

use super::CatalogSource;
use crate::models::config::{SortBy, SyncConfig, TmdbConfig};
use crate::models::remote::{
    DiscoverPage, GenreList, RemoteCredits, RemoteGenre, RemoteMovieDetail, RemotePersonDetail,
};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use serde::de::DeserializeOwned;

/// Filters applied to every discover request of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub sort_by: SortBy,
    pub min_vote_count: Option<u32>,
    pub released_after: Option<NaiveDate>,
}

impl Default for DiscoverQuery {
    fn default() -> Self {
        Self {
            sort_by: SortBy::Revenue,
            min_vote_count: None,
            released_after: None,
        }
    }
}

impl DiscoverQuery {
    /// Build the query for a sync run.
    pub fn from_config(config: &SyncConfig) -> Self {
        let released_after = config.released_within_months.and_then(|months| {
            Utc::now()
                .date_naive()
                .checked_sub_months(Months::new(months))
        });

        Self {
            sort_by: config.sort_by,
            min_vote_count: config.min_vote_count,
            released_after,
        }
    }

    /// Query parameters for one page. Adult content is always excluded.
    pub fn params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("include_adult", "false".to_string()),
            ("include_video", "false".to_string()),
            ("page", page.to_string()),
            ("sort_by", self.sort_by.as_param().to_string()),
        ];
        if let Some(votes) = self.min_vote_count {
            params.push(("vote_count.gte", votes.to_string()));
        }
        if let Some(date) = self.released_after {
            params.push(("primary_release_date.gte", date.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

/// TMDB API client.
pub struct TmdbClient {
    base_url: String,
    language: String,
    bearer_token: String,
    client: reqwest::Client,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: &TmdbConfig, bearer_token: &str) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            bearer_token: bearer_token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from configuration, failing when no token is set.
    pub fn from_config(config: &crate::models::config::Config) -> Result<Self> {
        let token = config.bearer_token()?;
        Ok(Self::new(&config.tmdb, token))
    }

    /// Build a request with bearer authentication.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("accept", "application/json")
            .header("Authorization", format!("Bearer {}", self.bearer_token))
    }

    /// Build the full URL for an endpoint, always carrying the language.
    fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}/{}?language={}",
            self.base_url,
            endpoint.trim_start_matches('/'),
            urlencoding::encode(&self.language)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Fetch an endpoint and return the raw JSON body.
    ///
    /// A 401 is reported as [`Error::TmdbTokenInvalid`], any other non-success
    /// status as [`Error::RemoteService`].
    pub async fn fetch_json(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value> {
        let url = self.build_url(endpoint, params);
        tracing::debug!("GET {}", endpoint);

        let resp = self.build_request(&url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::TmdbTokenInvalid);
        }
        if !status.is_success() {
            return Err(Error::RemoteService {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch an endpoint and decode it into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let value = self.fetch_json(endpoint, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Verify the bearer token is accepted.
    pub async fn verify_token(&self) -> Result<bool> {
        let url = format!("{}/authentication", self.base_url);
        match self.build_request(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => Err(Error::Http(e)),
        }
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn discover_movies(&self, query: &DiscoverQuery, page: u32) -> Result<DiscoverPage> {
        self.get("discover/movie", &query.params(page)).await
    }

    async fn movie_details(&self, movie_id: u64) -> Result<RemoteMovieDetail> {
        self.get(&format!("movie/{}", movie_id), &[]).await
    }

    async fn movie_credits(&self, movie_id: u64) -> Result<RemoteCredits> {
        self.get(&format!("movie/{}/credits", movie_id), &[]).await
    }

    async fn person_details(&self, person_id: u64) -> Result<RemotePersonDetail> {
        self.get(&format!("person/{}", person_id), &[]).await
    }

    async fn movie_genres(&self) -> Result<Vec<RemoteGenre>> {
        let list: GenreList = self.get("genre/movie/list", &[]).await?;
        Ok(list.genres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TmdbClient {
        TmdbClient::new(&TmdbConfig::default(), "token")
    }

    #[test]
    fn test_build_url_encodes_params() {
        let url = client().build_url(
            "/discover/movie",
            &[("page", "2".to_string()), ("with_keywords", "a b".to_string())],
        );
        assert_eq!(
            url,
            "https://api.themoviedb.org/3/discover/movie?language=en-US&page=2&with_keywords=a%20b"
        );
    }

    #[test]
    fn test_discover_params_exclude_adult() {
        let query = DiscoverQuery {
            sort_by: SortBy::Popularity,
            min_vote_count: Some(100),
            released_after: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let params = query.params(3);

        assert!(params.contains(&("include_adult", "false".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
        assert!(params.contains(&("sort_by", "popularity.desc".to_string())));
        assert!(params.contains(&("vote_count.gte", "100".to_string())));
        assert!(params.contains(&("primary_release_date.gte", "2024-01-31".to_string())));
    }

    #[test]
    fn test_query_from_config() {
        let config = SyncConfig {
            released_within_months: Some(6),
            ..SyncConfig::default()
        };
        let query = DiscoverQuery::from_config(&config);
        assert_eq!(query.sort_by, SortBy::Revenue);
        assert!(query.released_after.unwrap() < Utc::now().date_naive());
    }
}
