//! Catalog sync loop.
//!
//! Walks the TMDB discover listing page by page and turns every movie not yet
//! stored into local rows:
//! 1. Skip movies whose TMDB id is already stored
//! 2. Fetch details and credits
//! 3. Resolve category, director and leading cast
//! 4. Create the movie and its cast links
//!
//! A failing movie is logged and skipped, a failing page is skipped until too
//! many fail in a row. Rows are committed one by one and never rolled back.

use crate::core::resolver::EntityResolver;
use crate::error::IngestError;
use crate::models::catalog::{LocalMovie, LocalMovieActor, NewMovie, ACTOR_ROLE};
use crate::models::config::SyncConfig;
use crate::models::remote::{PersonRef, RemoteCredits, RemoteMovieDetail, RemoteMovieSummary};
use crate::services::rate_limit::RateLimiter;
use crate::services::tmdb::DiscoverQuery;
use crate::services::CatalogSource;
use crate::store::Repository;
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Options for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Number of new movies to create.
    pub target: usize,
    /// Leading cast members linked per movie.
    pub cast_limit: usize,
    /// Consecutive failed page fetches tolerated; one more ends the run.
    pub max_consecutive_page_errors: u32,
    /// Last page to request.
    pub max_pages: u32,
    /// Movies processed at the same time.
    pub concurrency: usize,
    /// Discover filters.
    pub query: DiscoverQuery,
    /// Create categories for the whole TMDB genre list before crawling.
    pub seed_genres: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            target: config.target,
            cast_limit: config.cast_limit,
            max_consecutive_page_errors: config.max_consecutive_page_errors,
            max_pages: config.max_pages,
            concurrency: config.concurrency.max(1),
            query: DiscoverQuery::from_config(config),
            seed_genres: false,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The target number of movies was created.
    TargetReached,
    /// TMDB returned an empty page or the last page.
    Exhausted,
    /// The configured page limit was passed.
    PageLimit,
    /// More page fetches failed in a row than tolerated.
    TooManyPageErrors,
    /// The run was cancelled.
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::TargetReached => "target reached",
            StopReason::Exhausted => "no more movies",
            StopReason::PageLimit => "page limit reached",
            StopReason::TooManyPageErrors => "too many page errors",
            StopReason::Cancelled => "cancelled",
        };
        write!(f, "{}", text)
    }
}

/// A movie that could not be ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedMovie {
    pub remote_id: u64,
    pub title: String,
    pub reason: String,
}

impl From<&IngestError> for FailedMovie {
    fn from(err: &IngestError) -> Self {
        Self {
            remote_id: err.remote_id,
            title: err.title.clone(),
            reason: err.source.to_string(),
        }
    }
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: String,
    pub finished_at: String,
    pub target: usize,
    /// Movies created by this run, in creation order.
    pub created: Vec<LocalMovie>,
    /// Movies skipped because they were already stored.
    pub skipped: usize,
    pub failed: Vec<FailedMovie>,
    /// Page fetches that failed.
    pub page_errors: u32,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

impl SyncReport {
    fn new(target: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now().to_rfc3339(),
            finished_at: String::new(),
            target,
            created: Vec::new(),
            skipped: 0,
            failed: Vec::new(),
            page_errors: 0,
            pages_fetched: 0,
            stop_reason: StopReason::Exhausted,
        }
    }
}

/// Save a run report to a JSON file.
pub fn save_report(report: &SyncReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(report)?;
    fs::write(path, content)?;
    tracing::info!("Sync report saved to: {}", path.display());
    Ok(())
}

/// Release year from a TMDB release date, 0 when absent or malformed.
///
/// Partial dates such as `2019` or `2019-05` yield their leading year.
pub fn release_year(release_date: Option<&str>) -> i32 {
    let Some(date) = release_date.map(str::trim) else {
        return 0;
    };
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return parsed.year();
    }

    match date.get(..4) {
        Some(year) if year.bytes().all(|b| b.is_ascii_digit()) => {
            let rest = &date[4..];
            if rest.is_empty() || rest.starts_with('-') {
                year.parse().unwrap_or(0)
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Movie row built from the listing entry and its details.
fn new_movie(
    summary: &RemoteMovieSummary,
    detail: &RemoteMovieDetail,
    category_id: u64,
    director_id: u64,
) -> NewMovie {
    NewMovie {
        title: summary.title.clone(),
        description: summary.overview.clone().unwrap_or_default(),
        duration: detail.runtime.unwrap_or(0),
        release_year: release_year(summary.release_date.as_deref()),
        rating: summary.vote_average,
        remote_id: summary.id,
        poster_path: summary.poster_path.clone(),
        backdrop_path: summary.backdrop_path.clone(),
        original_language: summary.original_language.clone(),
        vote_count: summary.vote_count,
        popularity: summary.popularity,
        adult: summary.adult,
        category_id,
        director_id,
    }
}

/// Drives a sync run.
pub struct Orchestrator {
    source: Arc<dyn CatalogSource>,
    repo: Arc<dyn Repository>,
    limiter: Arc<dyn RateLimiter>,
    options: SyncOptions,
    cancel: CancellationToken,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        repo: Arc<dyn Repository>,
        limiter: Arc<dyn RateLimiter>,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            repo,
            limiter,
            options,
            cancel: CancellationToken::new(),
            show_progress: false,
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Draw a progress bar while running.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Token that stops the run between movies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(self.options.target as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    }

    /// Run until the target is reached or the listing stops yielding movies.
    ///
    /// Only setup failures are returned as errors; everything that goes wrong
    /// during the crawl is recorded in the report.
    pub async fn run(&self) -> Result<SyncReport> {
        let resolver = EntityResolver::load(self.source.clone(), self.repo.clone()).await?;
        if self.options.seed_genres {
            if let Err(e) = resolver.sync_genres().await {
                tracing::warn!("Genre seeding failed, categories will be created per movie: {}", e);
            }
        }

        let target = self.options.target;
        let mut report = SyncReport::new(target);
        let pb = self.progress_bar();

        tracing::info!(
            "Syncing {} movies ({}, concurrency {})",
            target,
            self.options.query.sort_by,
            self.options.concurrency
        );

        let mut page: u32 = 1;
        let mut consecutive_errors: u32 = 0;

        let stop_reason = loop {
            if report.created.len() >= target {
                break StopReason::TargetReached;
            }
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if page > self.options.max_pages {
                break StopReason::PageLimit;
            }

            tracing::info!("Fetching discover page {}", page);
            let listing = match self.source.discover_movies(&self.options.query, page).await {
                Ok(listing) => {
                    consecutive_errors = 0;
                    report.pages_fetched += 1;
                    listing
                }
                Err(Error::Cancelled) => break StopReason::Cancelled,
                Err(e) => {
                    report.page_errors += 1;
                    consecutive_errors += 1;
                    tracing::warn!("Error fetching page {}: {}", page, e);
                    page += 1;

                    if consecutive_errors > self.options.max_consecutive_page_errors {
                        tracing::error!(
                            "{} pages failed in a row, stopping sync",
                            consecutive_errors
                        );
                        break StopReason::TooManyPageErrors;
                    }
                    if self.limiter.acquire_page(&self.cancel).await.is_err() {
                        break StopReason::Cancelled;
                    }
                    continue;
                }
            };

            if listing.results.is_empty() {
                tracing::info!("No more movies on page {}", page);
                break StopReason::Exhausted;
            }
            let total_pages = listing.total_pages;

            self.process_page(&resolver, listing.results, &mut report, &pb)
                .await;

            if report.created.len() >= target {
                break StopReason::TargetReached;
            }
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if total_pages.is_some_and(|total| page >= total) {
                tracing::info!("Reached last page {}", page);
                break StopReason::Exhausted;
            }

            page += 1;
            if self.limiter.acquire_page(&self.cancel).await.is_err() {
                break StopReason::Cancelled;
            }
        };

        pb.finish_and_clear();
        report.stop_reason = stop_reason;
        report.finished_at = Utc::now().to_rfc3339();

        tracing::info!(
            "{} movies created out of a target of {} ({} skipped, {} failed, stopped: {})",
            report.created.len(),
            target,
            report.skipped,
            report.failed.len(),
            stop_reason
        );
        Ok(report)
    }

    /// Process the movies of one page in waves of at most `concurrency`
    /// movies, never starting more than the target still needs.
    async fn process_page(
        &self,
        resolver: &EntityResolver,
        movies: Vec<RemoteMovieSummary>,
        report: &mut SyncReport,
        pb: &ProgressBar,
    ) {
        let mut queue = movies.into_iter();
        let mut exhausted = false;

        while !exhausted {
            let remaining = self.options.target.saturating_sub(report.created.len());
            if remaining == 0 || self.cancel.is_cancelled() {
                break;
            }
            let wave_size = self.options.concurrency.min(remaining);

            let mut wave: Vec<RemoteMovieSummary> = Vec::with_capacity(wave_size);
            while wave.len() < wave_size {
                let Some(movie) = queue.next() else {
                    exhausted = true;
                    break;
                };
                if wave.iter().any(|m| m.id == movie.id) {
                    continue;
                }
                match self.repo.find_movie_by_remote_id(movie.id).await {
                    Ok(Some(_)) => {
                        tracing::info!("Movie already exists: {}", movie.title);
                        report.skipped += 1;
                    }
                    Ok(None) => wave.push(movie),
                    Err(e) => {
                        let err = IngestError {
                            remote_id: movie.id,
                            title: movie.title.clone(),
                            source: e,
                        };
                        tracing::error!("Error checking {}", err);
                        report.failed.push(FailedMovie::from(&err));
                    }
                }
            }

            if wave.is_empty() {
                break;
            }

            for outcome in self.run_wave(resolver, wave).await {
                match outcome {
                    Ok(movie) => {
                        pb.inc(1);
                        pb.set_message(movie.title.clone());
                        report.created.push(movie);
                    }
                    // Interrupted mid-flight, not a failure of the movie
                    Err(err) if matches!(err.source, Error::Cancelled) => {
                        tracing::debug!("Cancelled while processing {}", err.title);
                    }
                    Err(err) => report.failed.push(FailedMovie::from(&err)),
                }
            }
        }
    }

    /// Ingest a batch of new movies concurrently, pacing after each one.
    async fn run_wave(
        &self,
        resolver: &EntityResolver,
        wave: Vec<RemoteMovieSummary>,
    ) -> Vec<std::result::Result<LocalMovie, IngestError>> {
        let width = wave.len().max(1);
        stream::iter(wave)
            .map(|summary| async move {
                tracing::info!("Processing: {} (tmdb{})", summary.title, summary.id);
                let outcome = match self.ingest_movie(resolver, &summary).await {
                    Ok(movie) => {
                        tracing::info!("Movie created: {}", movie.title);
                        Ok(movie)
                    }
                    Err(source) => {
                        let err = IngestError {
                            remote_id: summary.id,
                            title: summary.title.clone(),
                            source,
                        };
                        tracing::warn!("Error processing {}", err);
                        Err(err)
                    }
                };

                if let Err(Error::Cancelled) = self.limiter.acquire(&self.cancel).await {
                    tracing::debug!("Pause interrupted by cancellation");
                }
                outcome
            })
            .buffered(width)
            .collect()
            .await
    }

    /// Turn one listing entry into a stored movie with its cast.
    async fn ingest_movie(
        &self,
        resolver: &EntityResolver,
        summary: &RemoteMovieSummary,
    ) -> Result<LocalMovie> {
        let detail = self.source.movie_details(summary.id).await?;
        let credits = self.source.movie_credits(summary.id).await?;

        let category = match detail.genres.first() {
            Some(genre) => resolver.resolve_category(genre).await?,
            None => {
                tracing::debug!("No genres for {}, using fallback category", summary.title);
                resolver.fallback_category().await?
            }
        };

        let director_ref = credits
            .director()
            .map(PersonRef::from)
            .unwrap_or_else(PersonRef::placeholder_director);
        let director = resolver.resolve_director(&director_ref).await?;

        let movie = self
            .repo
            .create_movie(new_movie(summary, &detail, category.id, director.id))
            .await?;

        self.link_cast(resolver, &movie, &credits).await?;
        Ok(movie)
    }

    /// Link the leading cast members of a freshly created movie.
    async fn link_cast(
        &self,
        resolver: &EntityResolver,
        movie: &LocalMovie,
        credits: &RemoteCredits,
    ) -> Result<()> {
        for member in credits.top_cast(self.options.cast_limit) {
            let actor = match resolver.resolve_actor(&PersonRef::from(member)).await {
                Ok(actor) => actor,
                Err(Error::Cancelled) => {
                    tracing::debug!("Cast of {} left partial after cancellation", movie.title);
                    break;
                }
                Err(e) if e.is_remote() => {
                    tracing::warn!(
                        "Skipping cast member {} of {}: {}",
                        member.name,
                        movie.title,
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            let link = LocalMovieActor {
                movie_id: movie.id,
                actor_id: actor.id,
                role: ACTOR_ROLE.to_string(),
                character: member.character.clone().unwrap_or_default(),
                order: member.order.unwrap_or(0),
            };
            match self.repo.create_movie_actor_link(link).await {
                Ok(_) => {}
                // Same person credited twice in the top cast
                Err(e) if e.is_conflict() => {
                    tracing::debug!("Duplicate cast credit for {}: {}", member.name, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year() {
        assert_eq!(release_year(Some("2019-05-30")), 2019);
        assert_eq!(release_year(Some("")), 0);
        assert_eq!(release_year(Some("soon")), 0);
        assert_eq!(release_year(None), 0);
    }

    #[test]
    fn test_release_year_partial_dates() {
        assert_eq!(release_year(Some("2019")), 2019);
        assert_eq!(release_year(Some("2019-05")), 2019);
        assert_eq!(release_year(Some(" 1999-12 ")), 1999);
        assert_eq!(release_year(Some("20190")), 0);
        assert_eq!(release_year(Some("19")), 0);
    }

    #[test]
    fn test_new_movie_defaults() {
        let summary = RemoteMovieSummary {
            id: 496243,
            title: "Parasite".to_string(),
            release_date: Some("2019-05-30".to_string()),
            vote_average: 8.5,
            ..RemoteMovieSummary::default()
        };
        let detail = RemoteMovieDetail {
            id: 496243,
            ..RemoteMovieDetail::default()
        };

        let movie = new_movie(&summary, &detail, 3, 4);
        assert_eq!(movie.description, "");
        assert_eq!(movie.duration, 0);
        assert_eq!(movie.release_year, 2019);
        assert_eq!(movie.category_id, 3);
        assert_eq!(movie.director_id, 4);
    }

    #[test]
    fn test_options_clamp() {
        let config = SyncConfig {
            concurrency: 0,
            max_consecutive_page_errors: 0,
            ..SyncConfig::default()
        };
        let options = SyncOptions::from_config(&config);
        assert_eq!(options.concurrency, 1);
        // Zero tolerated errors is valid: the first failed page ends the run
        assert_eq!(options.max_consecutive_page_errors, 0);
    }
}
