//! In-memory catalog tables.

use super::Repository;
use crate::models::catalog::{
    LocalActor, LocalCategory, LocalDirector, LocalMovie, LocalMovieActor, NewActor,
    NewCategory, NewDirector, NewMovie,
};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

/// Full content of the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub categories: Vec<LocalCategory>,
    pub directors: Vec<LocalDirector>,
    pub actors: Vec<LocalActor>,
    pub movies: Vec<LocalMovie>,
    pub movie_actors: Vec<LocalMovieActor>,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub categories: usize,
    pub directors: usize,
    pub actors: usize,
    pub movies: usize,
    pub movie_actors: usize,
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0) + 1
}

/// Catalog kept in memory, with the same constraints as the database.
///
/// Checks run before the row is pushed, so a rejected create changes nothing.
#[derive(Default)]
pub struct CatalogStore {
    data: RwLock<CatalogSnapshot>,
}

impl CatalogStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Copy of the current content.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.data.read().await.clone()
    }

    /// Row counts.
    pub async fn stats(&self) -> CatalogStats {
        let data = self.data.read().await;
        CatalogStats {
            categories: data.categories.len(),
            directors: data.directors.len(),
            actors: data.actors.len(),
            movies: data.movies.len(),
            movie_actors: data.movie_actors.len(),
        }
    }

    /// Delete every row.
    pub async fn reset(&self) {
        *self.data.write().await = CatalogSnapshot::default();
    }
}

#[async_trait]
impl Repository for CatalogStore {
    async fn find_movie_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalMovie>> {
        let data = self.data.read().await;
        Ok(data.movies.iter().find(|m| m.remote_id == remote_id).cloned())
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<LocalMovie> {
        let mut data = self.data.write().await;
        if data.movies.iter().any(|m| m.remote_id == movie.remote_id) {
            return Err(Error::Conflict {
                entity: "movie",
                key: movie.remote_id.to_string(),
            });
        }
        if !data.categories.iter().any(|c| c.id == movie.category_id) {
            return Err(Error::NotFound {
                entity: "category",
                key: movie.category_id.to_string(),
            });
        }
        if !data.directors.iter().any(|d| d.id == movie.director_id) {
            return Err(Error::NotFound {
                entity: "director",
                key: movie.director_id.to_string(),
            });
        }

        let row = LocalMovie {
            id: next_id(data.movies.iter().map(|m| m.id)),
            title: movie.title,
            description: movie.description,
            duration: movie.duration,
            release_year: movie.release_year,
            rating: movie.rating,
            remote_id: movie.remote_id,
            poster_path: movie.poster_path,
            backdrop_path: movie.backdrop_path,
            original_language: movie.original_language,
            vote_count: movie.vote_count,
            popularity: movie.popularity,
            adult: movie.adult,
            category_id: movie.category_id,
            director_id: movie.director_id,
        };
        data.movies.push(row.clone());
        Ok(row)
    }

    async fn find_category_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalCategory>> {
        let data = self.data.read().await;
        Ok(data
            .categories
            .iter()
            .find(|c| c.remote_id == Some(remote_id))
            .cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<LocalCategory>> {
        let data = self.data.read().await;
        Ok(data.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn create_category(&self, category: NewCategory) -> Result<LocalCategory> {
        let mut data = self.data.write().await;
        let taken = data.categories.iter().any(|c| {
            c.name == category.name
                || (category.remote_id.is_some() && c.remote_id == category.remote_id)
        });
        if taken {
            return Err(Error::Conflict {
                entity: "category",
                key: category.name,
            });
        }

        let row = LocalCategory {
            id: next_id(data.categories.iter().map(|c| c.id)),
            name: category.name,
            remote_id: category.remote_id,
            description: category.description,
        };
        data.categories.push(row.clone());
        Ok(row)
    }

    async fn update_category_remote_id(&self, id: u64, remote_id: u64) -> Result<LocalCategory> {
        let mut data = self.data.write().await;
        if data
            .categories
            .iter()
            .any(|c| c.id != id && c.remote_id == Some(remote_id))
        {
            return Err(Error::Conflict {
                entity: "category",
                key: remote_id.to_string(),
            });
        }

        let row = match data.categories.iter_mut().find(|c| c.id == id) {
            Some(category) => {
                category.remote_id = Some(remote_id);
                category.clone()
            }
            None => {
                return Err(Error::NotFound {
                    entity: "category",
                    key: id.to_string(),
                })
            }
        };
        Ok(row)
    }

    async fn list_categories(&self) -> Result<Vec<LocalCategory>> {
        let data = self.data.read().await;
        let mut categories = data.categories.clone();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn find_director_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalDirector>> {
        let data = self.data.read().await;
        Ok(data
            .directors
            .iter()
            .find(|d| d.remote_id == remote_id)
            .cloned())
    }

    async fn create_director(&self, director: NewDirector) -> Result<LocalDirector> {
        let mut data = self.data.write().await;
        if data.directors.iter().any(|d| d.remote_id == director.remote_id) {
            return Err(Error::Conflict {
                entity: "director",
                key: director.remote_id.to_string(),
            });
        }

        let row = LocalDirector {
            id: next_id(data.directors.iter().map(|d| d.id)),
            first_name: director.first_name,
            last_name: director.last_name,
            remote_id: director.remote_id,
            nationality: director.nationality,
            profile_path: director.profile_path,
            biography: director.biography,
            birth_date: director.birth_date,
            birth_place: director.birth_place,
        };
        data.directors.push(row.clone());
        Ok(row)
    }

    async fn find_actor_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalActor>> {
        let data = self.data.read().await;
        Ok(data.actors.iter().find(|a| a.remote_id == remote_id).cloned())
    }

    async fn create_actor(&self, actor: NewActor) -> Result<LocalActor> {
        let mut data = self.data.write().await;
        if data.actors.iter().any(|a| a.remote_id == actor.remote_id) {
            return Err(Error::Conflict {
                entity: "actor",
                key: actor.remote_id.to_string(),
            });
        }

        let row = LocalActor {
            id: next_id(data.actors.iter().map(|a| a.id)),
            first_name: actor.first_name,
            last_name: actor.last_name,
            remote_id: actor.remote_id,
            profile_path: actor.profile_path,
            biography: actor.biography,
            birth_date: actor.birth_date,
            birth_place: actor.birth_place,
            gender: actor.gender,
        };
        data.actors.push(row.clone());
        Ok(row)
    }

    async fn create_movie_actor_link(&self, link: LocalMovieActor) -> Result<LocalMovieActor> {
        let mut data = self.data.write().await;
        if data
            .movie_actors
            .iter()
            .any(|l| l.movie_id == link.movie_id && l.actor_id == link.actor_id)
        {
            return Err(Error::Conflict {
                entity: "movie actor",
                key: format!("{}/{}", link.movie_id, link.actor_id),
            });
        }
        if !data.movies.iter().any(|m| m.id == link.movie_id) {
            return Err(Error::NotFound {
                entity: "movie",
                key: link.movie_id.to_string(),
            });
        }
        if !data.actors.iter().any(|a| a.id == link.actor_id) {
            return Err(Error::NotFound {
                entity: "actor",
                key: link.actor_id.to_string(),
            });
        }

        data.movie_actors.push(link.clone());
        Ok(link)
    }
}
