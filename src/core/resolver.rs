//! Entity resolution.
//!
//! Maps TMDB genres and people to local rows, creating each row the first
//! time its TMDB id is seen and reusing it afterwards.

use crate::core::names::parse_full_name;
use crate::core::nationality::resolve_nationality;
use crate::models::catalog::{
    LocalActor, LocalCategory, LocalDirector, NewActor, NewCategory, NewDirector,
};
use crate::models::remote::{PersonRef, RemoteGenre};
use crate::services::CatalogSource;
use crate::store::Repository;
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;

/// TMDB id used for the shared placeholder director.
pub const PLACEHOLDER_DIRECTOR_ID: u64 = 0;

/// Display name of the placeholder director.
pub const PLACEHOLDER_DIRECTOR_NAME: &str = "Unknown Director";

/// Category used when a movie has no genre and no category exists yet.
pub const FALLBACK_CATEGORY_NAME: &str = "Uncategorized";

impl PersonRef {
    /// Stand-in for movies whose credits list no director.
    pub fn placeholder_director() -> Self {
        Self::new(PLACEHOLDER_DIRECTOR_ID, PLACEHOLDER_DIRECTOR_NAME)
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_DIRECTOR_ID
    }
}

/// Parse a TMDB `YYYY-MM-DD` date, ignoring anything malformed.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

/// Resolves remote references to local rows.
pub struct EntityResolver {
    source: Arc<dyn CatalogSource>,
    repo: Arc<dyn Repository>,
    /// Categories seen so far, ordered by local id.
    known_categories: RwLock<Vec<LocalCategory>>,
}

impl EntityResolver {
    /// Create a resolver with an empty category snapshot.
    pub fn new(source: Arc<dyn CatalogSource>, repo: Arc<dyn Repository>) -> Self {
        Self {
            source,
            repo,
            known_categories: RwLock::new(Vec::new()),
        }
    }

    /// Create a resolver seeded with the categories already stored.
    pub async fn load(source: Arc<dyn CatalogSource>, repo: Arc<dyn Repository>) -> Result<Self> {
        let categories = repo.list_categories().await?;
        tracing::debug!("Loaded {} known categories", categories.len());
        Ok(Self {
            source,
            repo,
            known_categories: RwLock::new(categories),
        })
    }

    /// Current category snapshot.
    pub async fn known_categories(&self) -> Vec<LocalCategory> {
        self.known_categories.read().await.clone()
    }

    async fn remember(&self, category: &LocalCategory) {
        let mut known = self.known_categories.write().await;
        match known.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category.clone(),
            None => {
                known.push(category.clone());
                known.sort_by_key(|c| c.id);
            }
        }
    }

    /// Resolve a TMDB genre to its category.
    ///
    /// Looks up by genre id first, then by name. A category found by name
    /// without a genre id gets it backfilled.
    pub async fn resolve_category(&self, genre: &RemoteGenre) -> Result<LocalCategory> {
        let cached = self
            .known_categories
            .read()
            .await
            .iter()
            .find(|c| c.remote_id == Some(genre.id))
            .cloned();
        if let Some(category) = cached {
            return Ok(category);
        }

        if let Some(category) = self.repo.find_category_by_remote_id(genre.id).await? {
            self.remember(&category).await;
            return Ok(category);
        }

        if let Some(mut category) = self.repo.find_category_by_name(&genre.name).await? {
            if category.remote_id.is_none() {
                match self.repo.update_category_remote_id(category.id, genre.id).await {
                    Ok(updated) => {
                        tracing::info!("Updated TMDB id for category: {}", genre.name);
                        category = updated;
                    }
                    Err(e) => {
                        tracing::warn!("Could not update TMDB id for {}: {}", genre.name, e);
                    }
                }
            }
            self.remember(&category).await;
            return Ok(category);
        }

        let category = self
            .repo
            .create_category_or_existing(NewCategory::from_genre(genre.id, &genre.name))
            .await?;
        tracing::info!("Category created: {}", category.name);
        self.remember(&category).await;
        Ok(category)
    }

    /// Category for a movie that lists no genre.
    ///
    /// The lowest-id known category, or an "Uncategorized" row when the
    /// catalog has no category at all.
    pub async fn fallback_category(&self) -> Result<LocalCategory> {
        if let Some(first) = self.known_categories.read().await.first().cloned() {
            return Ok(first);
        }

        if let Some(first) = self.repo.list_categories().await?.into_iter().next() {
            self.remember(&first).await;
            return Ok(first);
        }

        let category = self
            .repo
            .create_category_or_existing(NewCategory {
                name: FALLBACK_CATEGORY_NAME.to_string(),
                remote_id: None,
                description: "Películas sin género asignado".to_string(),
            })
            .await?;
        self.remember(&category).await;
        Ok(category)
    }

    /// Create a category for every genre of the TMDB movie genre list.
    pub async fn sync_genres(&self) -> Result<Vec<LocalCategory>> {
        let genres = self.source.movie_genres().await?;
        let mut categories = Vec::with_capacity(genres.len());
        for genre in &genres {
            categories.push(self.resolve_category(genre).await?);
        }
        tracing::info!("{} genres processed", categories.len());
        Ok(categories)
    }

    /// Resolve a director, fetching person details only when it is new.
    ///
    /// Existing rows are returned as stored, without refreshing them.
    pub async fn resolve_director(&self, person: &PersonRef) -> Result<LocalDirector> {
        if let Some(director) = self.repo.find_director_by_remote_id(person.id).await? {
            return Ok(director);
        }

        let name = parse_full_name(&person.name);
        let new_director = if person.is_placeholder() {
            NewDirector {
                first_name: name.first_name,
                last_name: name.last_name,
                remote_id: person.id,
                ..NewDirector::default()
            }
        } else {
            let details = self.source.person_details(person.id).await?;
            NewDirector {
                first_name: name.first_name,
                last_name: name.last_name,
                remote_id: person.id,
                nationality: resolve_nationality(details.place_of_birth.as_deref()),
                profile_path: details.profile_path,
                biography: details.biography,
                birth_date: parse_date(details.birthday.as_deref()),
                birth_place: details.place_of_birth,
            }
        };

        let director = self.repo.create_director_or_existing(new_director).await?;
        tracing::debug!("Director resolved: {} (tmdb{})", person.name, person.id);
        Ok(director)
    }

    /// Resolve an actor, fetching person details only when it is new.
    pub async fn resolve_actor(&self, person: &PersonRef) -> Result<LocalActor> {
        if let Some(actor) = self.repo.find_actor_by_remote_id(person.id).await? {
            return Ok(actor);
        }

        let details = self.source.person_details(person.id).await?;
        let name = parse_full_name(&person.name);
        let actor = self
            .repo
            .create_actor_or_existing(NewActor {
                first_name: name.first_name,
                last_name: name.last_name,
                remote_id: person.id,
                profile_path: details.profile_path,
                biography: details.biography,
                birth_date: parse_date(details.birthday.as_deref()),
                birth_place: details.place_of_birth,
                gender: details.gender,
            })
            .await?;
        tracing::debug!("Actor resolved: {} (tmdb{})", person.name, person.id);
        Ok(actor)
    }
}
