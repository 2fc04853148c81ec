//! External services: the TMDB catalog and request pacing.

pub mod rate_limit;
pub mod tmdb;

use crate::models::remote::{
    DiscoverPage, RemoteCredits, RemoteGenre, RemoteMovieDetail, RemotePersonDetail,
};
use crate::Result;
use async_trait::async_trait;
use tmdb::DiscoverQuery;

/// Read-only view of the remote movie catalog.
///
/// [`tmdb::TmdbClient`] is the production implementation; the sync pipeline
/// only depends on this trait.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// One page of the discover listing.
    async fn discover_movies(&self, query: &DiscoverQuery, page: u32) -> Result<DiscoverPage>;

    /// Runtime and genres of a movie.
    async fn movie_details(&self, movie_id: u64) -> Result<RemoteMovieDetail>;

    /// Cast and crew of a movie.
    async fn movie_credits(&self, movie_id: u64) -> Result<RemoteCredits>;

    /// Biography, birth data and picture of a person.
    async fn person_details(&self, person_id: u64) -> Result<RemotePersonDetail>;

    /// Full list of movie genres.
    async fn movie_genres(&self) -> Result<Vec<RemoteGenre>>;
}
