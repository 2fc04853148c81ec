//! Shared fixtures for the integration tests: a scripted TMDB catalog and a
//! repository that fails on demand.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_sync::core::ingest::{Orchestrator, SyncOptions};
use catalog_sync::models::catalog::{
    LocalActor, LocalCategory, LocalDirector, LocalMovie, LocalMovieActor, NewActor,
    NewCategory, NewDirector, NewMovie,
};
use catalog_sync::models::remote::{
    CastMember, CrewMember, DiscoverPage, RemoteCredits, RemoteGenre, RemoteMovieDetail,
    RemoteMovieSummary, RemotePersonDetail,
};
use catalog_sync::services::rate_limit::Unlimited;
use catalog_sync::services::tmdb::DiscoverQuery;
use catalog_sync::services::CatalogSource;
use catalog_sync::store::{CatalogStore, Repository};
use catalog_sync::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ========== FAKE CATALOG ==========

pub const GENRES: [(u64, &str); 3] = [(28, "Action"), (18, "Drama"), (35, "Comedy")];

/// Scripted catalog source.
///
/// Pages are served from `pages` (page 1 is index 0); any page past the end is
/// empty. Movies without an explicit detail or credits entry get generated
/// ones.
#[derive(Default)]
pub struct FakeCatalog {
    pub pages: Vec<Vec<RemoteMovieSummary>>,
    pub total_pages: Option<u32>,
    pub failing_pages: HashSet<u32>,
    pub details: HashMap<u64, RemoteMovieDetail>,
    pub failing_details: HashSet<u64>,
    pub credits: HashMap<u64, RemoteCredits>,
    pub failing_persons: HashSet<u64>,
    pub genres: Vec<RemoteGenre>,
    pub genres_fail: bool,
    /// Delay inside `movie_details`, used to observe overlapping calls.
    pub detail_delay: Option<Duration>,

    pub discover_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub credits_calls: AtomicUsize,
    pub person_calls: AtomicUsize,
    pub person_ids: std::sync::Mutex<Vec<u64>>,
    /// Start time of every request, in call order.
    pub call_times: std::sync::Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeCatalog {
    /// `count` movies with ids `1..=count`, split into pages of `per_page`.
    pub fn with_movies(count: u64, per_page: usize) -> Self {
        let movies: Vec<RemoteMovieSummary> = (1..=count).map(summary).collect();
        Self {
            pages: movies.chunks(per_page.max(1)).map(|c| c.to_vec()).collect(),
            genres: GENRES
                .iter()
                .map(|(id, name)| RemoteGenre {
                    id: *id,
                    name: name.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn discover_count(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }

    pub fn detail_count(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn credits_count(&self) -> usize {
        self.credits_calls.load(Ordering::SeqCst)
    }

    pub fn person_count(&self) -> usize {
        self.person_calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn record_call(&self) {
        if let Ok(mut times) = self.call_times.lock() {
            times.push(Instant::now());
        }
    }

    fn server_error(endpoint: String) -> Error {
        Error::RemoteService {
            status: 500,
            endpoint,
            reason: "Internal Server Error".to_string(),
        }
    }
}

/// Listing entry for a generated movie.
pub fn summary(id: u64) -> RemoteMovieSummary {
    RemoteMovieSummary {
        id,
        title: format!("Movie {}", id),
        overview: Some(format!("Overview of movie {}", id)),
        release_date: Some(format!("{}-06-15", 1990 + id % 30)),
        vote_average: 7.0,
        vote_count: 1000,
        popularity: 50.0,
        ..RemoteMovieSummary::default()
    }
}

/// Generated details: one genre out of three, runtime 100 + id.
pub fn generated_detail(id: u64) -> RemoteMovieDetail {
    let (genre_id, name) = GENRES[(id % 3) as usize];
    RemoteMovieDetail {
        id,
        title: format!("Movie {}", id),
        runtime: Some(100 + id as u32),
        genres: vec![RemoteGenre {
            id: genre_id,
            name: name.to_string(),
        }],
    }
}

/// Generated credits: one of four directors and three actors out of a shared
/// pool of ten.
pub fn generated_credits(id: u64) -> RemoteCredits {
    let director_id = 1000 + id % 4;
    RemoteCredits {
        cast: (0..3)
            .map(|i| {
                let actor_id = 2000 + (id + i) % 10;
                cast_member(actor_id, i as u32)
            })
            .collect(),
        crew: vec![
            CrewMember {
                id: 3000 + id,
                name: format!("Writer {}", id),
                job: "Screenplay".to_string(),
                department: Some("Writing".to_string()),
            },
            CrewMember {
                id: director_id,
                name: format!("Director Number {}", director_id),
                job: "Director".to_string(),
                department: Some("Directing".to_string()),
            },
        ],
    }
}

pub fn cast_member(id: u64, order: u32) -> CastMember {
    CastMember {
        id,
        name: format!("Actor {}", id),
        character: Some(format!("Character {}", id)),
        order: Some(order),
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn discover_movies(&self, _query: &DiscoverQuery, page: u32) -> Result<DiscoverPage> {
        self.record_call();
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_pages.contains(&page) {
            return Err(Self::server_error("discover/movie".to_string()));
        }
        let results = self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(DiscoverPage {
            page,
            results,
            total_pages: self.total_pages,
            total_results: None,
        })
    }

    async fn movie_details(&self, movie_id: u64) -> Result<RemoteMovieDetail> {
        self.record_call();
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.detail_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_details.contains(&movie_id) {
            return Err(Self::server_error(format!("movie/{}", movie_id)));
        }
        Ok(self
            .details
            .get(&movie_id)
            .cloned()
            .unwrap_or_else(|| generated_detail(movie_id)))
    }

    async fn movie_credits(&self, movie_id: u64) -> Result<RemoteCredits> {
        self.record_call();
        self.credits_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .credits
            .get(&movie_id)
            .cloned()
            .unwrap_or_else(|| generated_credits(movie_id)))
    }

    async fn person_details(&self, person_id: u64) -> Result<RemotePersonDetail> {
        self.record_call();
        self.person_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut ids) = self.person_ids.lock() {
            ids.push(person_id);
        }
        if self.failing_persons.contains(&person_id) {
            return Err(Error::RemoteService {
                status: 404,
                endpoint: format!("person/{}", person_id),
                reason: "Not Found".to_string(),
            });
        }
        Ok(RemotePersonDetail {
            id: person_id,
            name: format!("Person {}", person_id),
            profile_path: Some(format!("/p{}.jpg", person_id)),
            biography: Some("Biography".to_string()),
            birthday: Some("1970-01-31".to_string()),
            place_of_birth: Some("Berlin, Germany".to_string()),
            gender: 2,
        })
    }

    async fn movie_genres(&self) -> Result<Vec<RemoteGenre>> {
        self.record_call();
        if self.genres_fail {
            return Err(Self::server_error("genre/movie/list".to_string()));
        }
        Ok(self.genres.clone())
    }
}

// ========== FAILING REPOSITORY ==========

/// Delegates to a [`CatalogStore`] but refuses to create the listed movies.
pub struct FailingRepository {
    pub inner: Arc<CatalogStore>,
    pub fail_movies: HashSet<u64>,
}

impl FailingRepository {
    pub fn new(inner: Arc<CatalogStore>, fail_movies: impl IntoIterator<Item = u64>) -> Self {
        Self {
            inner,
            fail_movies: fail_movies.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Repository for FailingRepository {
    async fn find_movie_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalMovie>> {
        self.inner.find_movie_by_remote_id(remote_id).await
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<LocalMovie> {
        if self.fail_movies.contains(&movie.remote_id) {
            return Err(Error::other(format!("injected failure for {}", movie.remote_id)));
        }
        self.inner.create_movie(movie).await
    }

    async fn find_category_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalCategory>> {
        self.inner.find_category_by_remote_id(remote_id).await
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<LocalCategory>> {
        self.inner.find_category_by_name(name).await
    }

    async fn create_category(&self, category: NewCategory) -> Result<LocalCategory> {
        self.inner.create_category(category).await
    }

    async fn update_category_remote_id(&self, id: u64, remote_id: u64) -> Result<LocalCategory> {
        self.inner.update_category_remote_id(id, remote_id).await
    }

    async fn list_categories(&self) -> Result<Vec<LocalCategory>> {
        self.inner.list_categories().await
    }

    async fn find_director_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalDirector>> {
        self.inner.find_director_by_remote_id(remote_id).await
    }

    async fn create_director(&self, director: NewDirector) -> Result<LocalDirector> {
        self.inner.create_director(director).await
    }

    async fn find_actor_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalActor>> {
        self.inner.find_actor_by_remote_id(remote_id).await
    }

    async fn create_actor(&self, actor: NewActor) -> Result<LocalActor> {
        self.inner.create_actor(actor).await
    }

    async fn create_movie_actor_link(&self, link: LocalMovieActor) -> Result<LocalMovieActor> {
        self.inner.create_movie_actor_link(link).await
    }
}

// ========== HELPERS ==========

/// Options for a test run: no genre seeding, sequential.
pub fn options(target: usize) -> SyncOptions {
    SyncOptions {
        target,
        seed_genres: false,
        ..SyncOptions::default()
    }
}

/// Orchestrator over a fake catalog and a store, without pacing.
pub fn orchestrator(
    source: Arc<FakeCatalog>,
    repo: Arc<dyn Repository>,
    options: SyncOptions,
) -> Orchestrator {
    Orchestrator::new(source, repo, Arc::new(Unlimited), options)
}
