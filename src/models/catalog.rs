//! Local catalog rows.
//!
//! Every row derived from TMDB keeps the TMDB id it came from; that id is the
//! idempotency key used by the resolver.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role label stored on every cast link created by the sync.
pub const ACTOR_ROLE: &str = "Actor";

/// Movie category (TMDB genre).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalCategory {
    pub id: u64,
    pub name: String,
    pub remote_id: Option<u64>,
    pub description: String,
}

/// Fields for a new category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub remote_id: Option<u64>,
    pub description: String,
}

impl NewCategory {
    /// Category for a TMDB genre.
    pub fn from_genre(remote_id: u64, name: &str) -> Self {
        Self {
            name: name.to_string(),
            remote_id: Some(remote_id),
            description: format!("Películas del género {}", name),
        }
    }
}

/// Director.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDirector {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub remote_id: u64,
    pub nationality: Option<String>,
    pub profile_path: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
}

/// Fields for a new director.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDirector {
    pub first_name: String,
    pub last_name: String,
    pub remote_id: u64,
    pub nationality: Option<String>,
    pub profile_path: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
}

/// Actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalActor {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub remote_id: u64,
    pub profile_path: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    /// TMDB gender code (0 unknown, 1 female, 2 male, 3 non-binary).
    pub gender: u8,
}

/// Fields for a new actor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewActor {
    pub first_name: String,
    pub last_name: String,
    pub remote_id: u64,
    pub profile_path: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub gender: u8,
}

/// Movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalMovie {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Runtime in minutes, 0 when unknown.
    pub duration: u32,
    /// Release year, 0 when unknown.
    pub release_year: i32,
    pub rating: f64,
    pub remote_id: u64,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub original_language: Option<String>,
    pub vote_count: u32,
    pub popularity: f64,
    pub adult: bool,
    pub category_id: u64,
    pub director_id: u64,
}

/// Fields for a new movie.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub release_year: i32,
    pub rating: f64,
    pub remote_id: u64,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub original_language: Option<String>,
    pub vote_count: u32,
    pub popularity: f64,
    pub adult: bool,
    pub category_id: u64,
    pub director_id: u64,
}

/// Cast link between a movie and an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalMovieActor {
    pub movie_id: u64,
    pub actor_id: u64,
    pub role: String,
    pub character: String,
    pub order: u32,
}
