//! Pacing of outbound TMDB traffic.
//!
//! `FixedDelay` is a politeness pause the sync loop takes after every
//! processed movie and after every page. `TokenBucket` caps the request rate
//! itself: [`PacedSource`] takes one permit before each remote call, so the
//! quota is shared by every concurrent worker and every endpoint.

use super::tmdb::DiscoverQuery;
use super::CatalogSource;
use crate::models::config::{RateLimitConfig, RateLimitMode};
use crate::models::remote::{
    DiscoverPage, RemoteCredits, RemoteGenre, RemoteMovieDetail, RemotePersonDetail,
};
use crate::{Error, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Gate in front of the next unit of work.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait for the next permit.
    ///
    /// Returns [`Error::Cancelled`] as soon as `cancel` fires.
    async fn acquire(&self, cancel: &CancellationToken) -> Result<()>;

    /// Wait until the next discover page may be fetched.
    async fn acquire_page(&self, cancel: &CancellationToken) -> Result<()> {
        self.acquire(cancel).await
    }
}

/// Sleep for `delay`, or bail out early when cancelled.
async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Fixed pause between movies and between pages.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    item: Duration,
    page: Duration,
}

impl FixedDelay {
    pub fn new(item: Duration, page: Duration) -> Self {
        Self { item, page }
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        pause(self.item, cancel).await
    }

    async fn acquire_page(&self, cancel: &CancellationToken) -> Result<()> {
        pause(self.page, cancel).await
    }
}

/// Token bucket shared across workers.
pub struct TokenBucket {
    limiter: DefaultDirectRateLimiter,
}

impl TokenBucket {
    /// Allow `per_second` acquisitions per second, with bursts of the same size.
    pub fn per_second(per_second: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: governor::RateLimiter::direct(Quota::per_second(rate)),
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = self.limiter.until_ready() => Ok(()),
        }
    }
}

/// No pacing at all, only honours cancellation.
#[derive(Debug, Clone, Default)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Limiters selected by configuration.
#[derive(Clone)]
pub struct Pacing {
    /// Acquired by the sync loop after each movie and each page.
    pub per_item: Arc<dyn RateLimiter>,
    /// Acquired before every remote request, when set.
    pub per_request: Option<Arc<dyn RateLimiter>>,
}

impl Pacing {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        match config.mode {
            RateLimitMode::Fixed => Self {
                per_item: Arc::new(FixedDelay::new(
                    Duration::from_millis(config.delay_ms),
                    Duration::from_millis(config.page_delay_ms),
                )),
                per_request: None,
            },
            RateLimitMode::TokenBucket => Self {
                per_item: Arc::new(Unlimited),
                per_request: Some(Arc::new(TokenBucket::per_second(
                    config.requests_per_second,
                ))),
            },
        }
    }

    /// Put the per-request limiter in front of `source`.
    pub fn wrap(
        &self,
        source: Arc<dyn CatalogSource>,
        cancel: &CancellationToken,
    ) -> Arc<dyn CatalogSource> {
        match &self.per_request {
            Some(limiter) => Arc::new(PacedSource::new(source, limiter.clone(), cancel.clone())),
            None => source,
        }
    }
}

/// Catalog source that takes a permit before every request.
pub struct PacedSource {
    inner: Arc<dyn CatalogSource>,
    limiter: Arc<dyn RateLimiter>,
    cancel: CancellationToken,
}

impl PacedSource {
    pub fn new(
        inner: Arc<dyn CatalogSource>,
        limiter: Arc<dyn RateLimiter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner,
            limiter,
            cancel,
        }
    }
}

#[async_trait]
impl CatalogSource for PacedSource {
    async fn discover_movies(&self, query: &DiscoverQuery, page: u32) -> Result<DiscoverPage> {
        self.limiter.acquire(&self.cancel).await?;
        self.inner.discover_movies(query, page).await
    }

    async fn movie_details(&self, movie_id: u64) -> Result<RemoteMovieDetail> {
        self.limiter.acquire(&self.cancel).await?;
        self.inner.movie_details(movie_id).await
    }

    async fn movie_credits(&self, movie_id: u64) -> Result<RemoteCredits> {
        self.limiter.acquire(&self.cancel).await?;
        self.inner.movie_credits(movie_id).await
    }

    async fn person_details(&self, person_id: u64) -> Result<RemotePersonDetail> {
        self.limiter.acquire(&self.cancel).await?;
        self.inner.person_details(person_id).await
    }

    async fn movie_genres(&self) -> Result<Vec<RemoteGenre>> {
        self.limiter.acquire(&self.cancel).await?;
        self.inner.movie_genres().await
    }
}
