//! TMDB response shapes consumed by the sync pipeline.
//!
//! One struct per endpoint. Fields TMDB may omit or null are `Option` or
//! carry a serde default, so a sparse record still decodes.

use serde::{Deserialize, Serialize};

/// Movie listing entry from the discover endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteMovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    /// Release date as sent by TMDB, may be empty or malformed.
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub adult: bool,
}

/// One page of discover results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<RemoteMovieSummary>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_results: Option<u32>,
}

/// Genre reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGenre {
    pub id: u64,
    pub name: String,
}

/// Response of `/genre/movie/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<RemoteGenre>,
}

/// Movie details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteMovieDetail {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Runtime in minutes; absent or 0 when unknown.
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<RemoteGenre>,
}

/// Movie credits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

impl RemoteCredits {
    /// First crew member credited as "Director".
    pub fn director(&self) -> Option<&CrewMember> {
        self.crew.iter().find(|member| member.job == "Director")
    }

    /// Leading cast members, in billing order.
    pub fn top_cast(&self, limit: usize) -> Vec<&CastMember> {
        let mut cast: Vec<&CastMember> = self.cast.iter().collect();
        // Stable sort keeps TMDB's listing order for members without an order
        cast.sort_by_key(|member| member.order.unwrap_or(u32::MAX));
        cast.truncate(limit);
        cast
    }
}

/// Cast member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

/// Crew member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub department: Option<String>,
}

/// Minimal person reference handed to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRef {
    pub id: u64,
    pub name: String,
}

impl PersonRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<&CrewMember> for PersonRef {
    fn from(member: &CrewMember) -> Self {
        Self::new(member.id, member.name.clone())
    }
}

impl From<&CastMember> for PersonRef {
    fn from(member: &CastMember) -> Self {
        Self::new(member.id, member.name.clone())
    }
}

/// Person details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemotePersonDetail {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub gender: u8,
}
