//! Catalog persistence.
//!
//! The sync pipeline talks to storage only through [`Repository`]. Creation
//! methods report uniqueness violations as [`Error::Conflict`]; the provided
//! `*_or_existing` methods turn a conflict into a re-read by the unique key,
//! which makes creation safe to retry and safe to race.

mod catalog_store;
mod sqlite;

pub use catalog_store::{CatalogSnapshot, CatalogStats, CatalogStore};
pub use sqlite::SqliteStore;

use crate::models::catalog::{
    LocalActor, LocalCategory, LocalDirector, LocalMovie, LocalMovieActor, NewActor,
    NewCategory, NewDirector, NewMovie,
};
use crate::{Error, Result};
use async_trait::async_trait;

/// Storage operations used by the sync pipeline.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_movie_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalMovie>>;
    async fn create_movie(&self, movie: NewMovie) -> Result<LocalMovie>;

    async fn find_category_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalCategory>>;
    async fn find_category_by_name(&self, name: &str) -> Result<Option<LocalCategory>>;
    async fn create_category(&self, category: NewCategory) -> Result<LocalCategory>;
    /// Attach a TMDB genre id to a category that has none.
    async fn update_category_remote_id(&self, id: u64, remote_id: u64) -> Result<LocalCategory>;
    /// All categories, ordered by local id.
    async fn list_categories(&self) -> Result<Vec<LocalCategory>>;

    async fn find_director_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalDirector>>;
    async fn create_director(&self, director: NewDirector) -> Result<LocalDirector>;

    async fn find_actor_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalActor>>;
    async fn create_actor(&self, actor: NewActor) -> Result<LocalActor>;

    async fn create_movie_actor_link(&self, link: LocalMovieActor) -> Result<LocalMovieActor>;

    /// Create a category, or return the row that won the race for its name.
    async fn create_category_or_existing(&self, category: NewCategory) -> Result<LocalCategory> {
        let name = category.name.clone();
        let remote_id = category.remote_id;
        match self.create_category(category).await {
            Err(e) if e.is_conflict() => {
                tracing::debug!("Category already exists: {}, using the existing one", name);
                if let Some(existing) = self.find_category_by_name(&name).await? {
                    return Ok(existing);
                }
                match remote_id {
                    Some(remote_id) => self
                        .find_category_by_remote_id(remote_id)
                        .await?
                        .ok_or_else(|| conflict_without_row("category", name)),
                    None => Err(conflict_without_row("category", name)),
                }
            }
            other => other,
        }
    }

    /// Create a director, or return the row already stored for its TMDB id.
    async fn create_director_or_existing(&self, director: NewDirector) -> Result<LocalDirector> {
        let remote_id = director.remote_id;
        match self.create_director(director).await {
            Err(e) if e.is_conflict() => self
                .find_director_by_remote_id(remote_id)
                .await?
                .ok_or_else(|| conflict_without_row("director", remote_id.to_string())),
            other => other,
        }
    }

    /// Create an actor, or return the row already stored for its TMDB id.
    async fn create_actor_or_existing(&self, actor: NewActor) -> Result<LocalActor> {
        let remote_id = actor.remote_id;
        match self.create_actor(actor).await {
            Err(e) if e.is_conflict() => self
                .find_actor_by_remote_id(remote_id)
                .await?
                .ok_or_else(|| conflict_without_row("actor", remote_id.to_string())),
            other => other,
        }
    }
}

// A conflict whose winning row cannot be read back means the conflict was on
// a different unique key; surface it unchanged.
fn conflict_without_row(entity: &'static str, key: String) -> Error {
    Error::Conflict { entity, key }
}
