//! SQLite catalog store.
//!
//! Uniqueness and foreign keys are enforced by the schema; violations are
//! mapped to [`Error::Conflict`] and [`Error::NotFound`]. Every create is a
//! single statement, so a failed write never leaves a row behind.

use super::{CatalogStats, Repository};
use crate::models::catalog::{
    LocalActor, LocalCategory, LocalDirector, LocalMovie, LocalMovieActor, NewActor,
    NewCategory, NewDirector, NewMovie,
};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        remote_id INTEGER UNIQUE,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS directors (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        remote_id INTEGER NOT NULL UNIQUE,
        nationality TEXT,
        profile_path TEXT,
        biography TEXT,
        birth_date TEXT,
        birth_place TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS actors (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        remote_id INTEGER NOT NULL UNIQUE,
        profile_path TEXT,
        biography TEXT,
        birth_date TEXT,
        birth_place TEXT,
        gender INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movies (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        duration INTEGER NOT NULL DEFAULT 0,
        release_year INTEGER NOT NULL DEFAULT 0,
        rating REAL NOT NULL DEFAULT 0,
        remote_id INTEGER NOT NULL UNIQUE,
        poster_path TEXT,
        backdrop_path TEXT,
        original_language TEXT,
        vote_count INTEGER NOT NULL DEFAULT 0,
        popularity REAL NOT NULL DEFAULT 0,
        adult BOOLEAN NOT NULL DEFAULT FALSE,
        category_id INTEGER NOT NULL REFERENCES categories (id),
        director_id INTEGER NOT NULL REFERENCES directors (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movie_actors (
        movie_id INTEGER NOT NULL REFERENCES movies (id),
        actor_id INTEGER NOT NULL REFERENCES actors (id),
        role TEXT NOT NULL,
        character TEXT NOT NULL DEFAULT '',
        "order" INTEGER NOT NULL DEFAULT 0,
        UNIQUE (movie_id, actor_id)
    )
    "#,
];

const CATEGORY_COLUMNS: &str = "id, name, remote_id, description";
const DIRECTOR_COLUMNS: &str = "id, first_name, last_name, remote_id, nationality, profile_path, \
                                biography, birth_date, birth_place";
const ACTOR_COLUMNS: &str = "id, first_name, last_name, remote_id, profile_path, biography, \
                             birth_date, birth_place, gender";
const MOVIE_COLUMNS: &str = "id, title, description, duration, release_year, rating, remote_id, \
                             poster_path, backdrop_path, original_language, vote_count, \
                             popularity, adult, category_id, director_id";

/// Catalog store backed by a SQLite database file.
pub struct SqliteStore {
    path: PathBuf,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database, creating the file and the schema when missing.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::InvalidStoreFile(format!("{}: {}", path.display(), e)))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| Error::InvalidStoreFile(format!("{}: {}", path.display(), e)))?;
        }
        tracing::debug!("Catalog database ready: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            pool,
        })
    }

    /// Database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Row counts.
    pub async fn stats(&self) -> Result<CatalogStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM directors) AS directors,
                (SELECT COUNT(*) FROM actors) AS actors,
                (SELECT COUNT(*) FROM movies) AS movies,
                (SELECT COUNT(*) FROM movie_actors) AS movie_actors
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CatalogStats {
            categories: row.try_get::<i64, _>("categories")? as usize,
            directors: row.try_get::<i64, _>("directors")? as usize,
            actors: row.try_get::<i64, _>("actors")? as usize,
            movies: row.try_get::<i64, _>("movies")? as usize,
            movie_actors: row.try_get::<i64, _>("movie_actors")? as usize,
        })
    }

    /// Delete every row.
    pub async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["movie_actors", "movies", "actors", "directors", "categories"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::info!("Catalog database cleared");
        Ok(())
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Map a write failure, turning constraint violations into store errors.
fn write_error(e: sqlx::Error, entity: &'static str, key: String) -> Error {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return Error::Conflict { entity, key };
        }
        if db.is_foreign_key_violation() {
            return Error::NotFound {
                entity: "referenced row",
                key,
            };
        }
    }
    Error::Database(e)
}

fn category_from_row(row: &SqliteRow) -> Result<LocalCategory> {
    Ok(LocalCategory {
        id: row.try_get::<i64, _>("id")? as u64,
        name: row.try_get("name")?,
        remote_id: row.try_get::<Option<i64>, _>("remote_id")?.map(|id| id as u64),
        description: row.try_get("description")?,
    })
}

fn director_from_row(row: &SqliteRow) -> Result<LocalDirector> {
    Ok(LocalDirector {
        id: row.try_get::<i64, _>("id")? as u64,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        remote_id: row.try_get::<i64, _>("remote_id")? as u64,
        nationality: row.try_get("nationality")?,
        profile_path: row.try_get("profile_path")?,
        biography: row.try_get("biography")?,
        birth_date: row.try_get("birth_date")?,
        birth_place: row.try_get("birth_place")?,
    })
}

fn actor_from_row(row: &SqliteRow) -> Result<LocalActor> {
    Ok(LocalActor {
        id: row.try_get::<i64, _>("id")? as u64,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        remote_id: row.try_get::<i64, _>("remote_id")? as u64,
        profile_path: row.try_get("profile_path")?,
        biography: row.try_get("biography")?,
        birth_date: row.try_get("birth_date")?,
        birth_place: row.try_get("birth_place")?,
        gender: row.try_get::<i64, _>("gender")? as u8,
    })
}

fn movie_from_row(row: &SqliteRow) -> Result<LocalMovie> {
    Ok(LocalMovie {
        id: row.try_get::<i64, _>("id")? as u64,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        duration: row.try_get::<i64, _>("duration")? as u32,
        release_year: row.try_get::<i64, _>("release_year")? as i32,
        rating: row.try_get("rating")?,
        remote_id: row.try_get::<i64, _>("remote_id")? as u64,
        poster_path: row.try_get("poster_path")?,
        backdrop_path: row.try_get("backdrop_path")?,
        original_language: row.try_get("original_language")?,
        vote_count: row.try_get::<i64, _>("vote_count")? as u32,
        popularity: row.try_get("popularity")?,
        adult: row.try_get("adult")?,
        category_id: row.try_get::<i64, _>("category_id")? as u64,
        director_id: row.try_get::<i64, _>("director_id")? as u64,
    })
}

#[async_trait]
impl Repository for SqliteStore {
    async fn find_movie_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalMovie>> {
        let sql = format!("SELECT {} FROM movies WHERE remote_id = ?", MOVIE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(remote_id as i64)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(movie_from_row).transpose()
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<LocalMovie> {
        let result = sqlx::query(
            r#"
            INSERT INTO movies (
                title, description, duration, release_year, rating, remote_id, poster_path,
                backdrop_path, original_language, vote_count, popularity, adult, category_id,
                director_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.duration as i64)
        .bind(movie.release_year as i64)
        .bind(movie.rating)
        .bind(movie.remote_id as i64)
        .bind(&movie.poster_path)
        .bind(&movie.backdrop_path)
        .bind(&movie.original_language)
        .bind(movie.vote_count as i64)
        .bind(movie.popularity)
        .bind(movie.adult)
        .bind(movie.category_id as i64)
        .bind(movie.director_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "movie", movie.remote_id.to_string()))?;

        Ok(LocalMovie {
            id: result.last_insert_rowid() as u64,
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
        })
    }

    async fn find_category_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalCategory>> {
        let sql = format!("SELECT {} FROM categories WHERE remote_id = ?", CATEGORY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(remote_id as i64)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<LocalCategory>> {
        let sql = format!("SELECT {} FROM categories WHERE name = ?", CATEGORY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn create_category(&self, category: NewCategory) -> Result<LocalCategory> {
        let result =
            sqlx::query("INSERT INTO categories (name, remote_id, description) VALUES (?, ?, ?)")
                .bind(&category.name)
                .bind(category.remote_id.map(|id| id as i64))
                .bind(&category.description)
                .execute(&self.pool)
                .await
                .map_err(|e| write_error(e, "category", category.name.clone()))?;

        Ok(LocalCategory {
            id: result.last_insert_rowid() as u64,
            name: category.name,
            remote_id: category.remote_id,
            description: category.description,
        })
    }

    async fn update_category_remote_id(&self, id: u64, remote_id: u64) -> Result<LocalCategory> {
        let result = sqlx::query("UPDATE categories SET remote_id = ? WHERE id = ?")
            .bind(remote_id as i64)
            .bind(id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "category", remote_id.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                entity: "category",
                key: id.to_string(),
            });
        }

        let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id as i64)
            .fetch_one(&self.pool)
            .await?;
        category_from_row(&row)
    }

    async fn list_categories(&self) -> Result<Vec<LocalCategory>> {
        let sql = format!("SELECT {} FROM categories ORDER BY id", CATEGORY_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn find_director_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalDirector>> {
        let sql = format!("SELECT {} FROM directors WHERE remote_id = ?", DIRECTOR_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(remote_id as i64)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(director_from_row).transpose()
    }

    async fn create_director(&self, director: NewDirector) -> Result<LocalDirector> {
        let result = sqlx::query(
            r#"
            INSERT INTO directors (
                first_name, last_name, remote_id, nationality, profile_path, biography,
                birth_date, birth_place
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&director.first_name)
        .bind(&director.last_name)
        .bind(director.remote_id as i64)
        .bind(&director.nationality)
        .bind(&director.profile_path)
        .bind(&director.biography)
        .bind(director.birth_date)
        .bind(&director.birth_place)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "director", director.remote_id.to_string()))?;

        Ok(LocalDirector {
            id: result.last_insert_rowid() as u64,
            first_name: director.first_name,
            last_name: director.last_name,
            remote_id: director.remote_id,
            nationality: director.nationality,
            profile_path: director.profile_path,
            biography: director.biography,
            birth_date: director.birth_date,
            birth_place: director.birth_place,
        })
    }

    async fn find_actor_by_remote_id(&self, remote_id: u64) -> Result<Option<LocalActor>> {
        let sql = format!("SELECT {} FROM actors WHERE remote_id = ?", ACTOR_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(remote_id as i64)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(actor_from_row).transpose()
    }

    async fn create_actor(&self, actor: NewActor) -> Result<LocalActor> {
        let result = sqlx::query(
            r#"
            INSERT INTO actors (
                first_name, last_name, remote_id, profile_path, biography, birth_date,
                birth_place, gender
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&actor.first_name)
        .bind(&actor.last_name)
        .bind(actor.remote_id as i64)
        .bind(&actor.profile_path)
        .bind(&actor.biography)
        .bind(actor.birth_date)
        .bind(&actor.birth_place)
        .bind(actor.gender as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "actor", actor.remote_id.to_string()))?;

        Ok(LocalActor {
            id: result.last_insert_rowid() as u64,
            first_name: actor.first_name,
            last_name: actor.last_name,
            remote_id: actor.remote_id,
            profile_path: actor.profile_path,
            biography: actor.biography,
            birth_date: actor.birth_date,
            birth_place: actor.birth_place,
            gender: actor.gender,
        })
    }

    async fn create_movie_actor_link(&self, link: LocalMovieActor) -> Result<LocalMovieActor> {
        sqlx::query(
            r#"
            INSERT INTO movie_actors (movie_id, actor_id, role, character, "order")
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.movie_id as i64)
        .bind(link.actor_id as i64)
        .bind(&link.role)
        .bind(&link.character)
        .bind(link.order as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                "movie actor",
                format!("{}/{}", link.movie_id, link.actor_id),
            )
        })?;
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_temp() -> (TempDir, SqliteStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("nested").join("catalog.db"))
            .await
            .unwrap();
        (temp_dir, store)
    }

    fn director(remote_id: u64) -> NewDirector {
        NewDirector {
            first_name: "Bong".to_string(),
            last_name: "Joon-ho".to_string(),
            remote_id,
            nationality: Some("Surcoreano".to_string()),
            birth_date: chrono::NaiveDate::from_ymd_opt(1969, 9, 14),
            ..NewDirector::default()
        }
    }

    #[tokio::test]
    async fn test_unique_constraints_map_to_conflict() {
        let (_temp, store) = open_temp().await;
        store
            .create_category(NewCategory::from_genre(28, "Action"))
            .await
            .unwrap();

        let err = store
            .create_category(NewCategory::from_genre(99, "Action"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        // The rejected row is not visible under its other key
        assert!(store.find_category_by_remote_id(99).await.unwrap().is_none());

        store.create_director(director(7)).await.unwrap();
        assert!(store.create_director(director(7)).await.unwrap_err().is_conflict());
        let again = store.create_director_or_existing(director(7)).await.unwrap();
        assert_eq!(again.birth_date, chrono::NaiveDate::from_ymd_opt(1969, 9, 14));
        assert_eq!(store.stats().await.unwrap().directors, 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let (_temp, store) = open_temp().await;
        let err = store
            .create_movie(NewMovie {
                title: "Orphan".to_string(),
                remote_id: 1,
                category_id: 1,
                director_id: 1,
                ..NewMovie::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(store.find_movie_by_remote_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_row() {
        let (_temp, store) = open_temp().await;
        sqlx::query(
            r#"
            CREATE TRIGGER refuse_director BEFORE INSERT ON directors
            WHEN NEW.remote_id = 2
            BEGIN
                SELECT RAISE(ABORT, 'disk full');
            END
            "#,
        )
        .execute(&store.pool)
        .await
        .unwrap();

        store.create_director(director(1)).await.unwrap();
        let err = store.create_director(director(2)).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));

        assert!(store.find_director_by_remote_id(2).await.unwrap().is_none());
        assert_eq!(store.stats().await.unwrap().directors, 1);
    }

    #[tokio::test]
    async fn test_movie_and_links_round_trip() {
        let (temp, store) = open_temp().await;
        let category = store
            .create_category(NewCategory::from_genre(18, "Drama"))
            .await
            .unwrap();
        let director = store.create_director(director(1)).await.unwrap();
        let movie = store
            .create_movie(NewMovie {
                title: "Parasite".to_string(),
                remote_id: 496243,
                release_year: 2019,
                rating: 8.5,
                adult: false,
                category_id: category.id,
                director_id: director.id,
                ..NewMovie::default()
            })
            .await
            .unwrap();
        let actor = store
            .create_actor(NewActor {
                first_name: "Song".to_string(),
                last_name: "Kang-ho".to_string(),
                remote_id: 20738,
                gender: 2,
                ..NewActor::default()
            })
            .await
            .unwrap();

        let link = LocalMovieActor {
            movie_id: movie.id,
            actor_id: actor.id,
            role: "Actor".to_string(),
            character: "Kim Ki-taek".to_string(),
            order: 0,
        };
        store.create_movie_actor_link(link.clone()).await.unwrap();
        assert!(store
            .create_movie_actor_link(link)
            .await
            .unwrap_err()
            .is_conflict());

        let path = store.path().to_path_buf();
        store.close().await;

        let reopened = SqliteStore::open(&path).await.unwrap();
        let stored = reopened.find_movie_by_remote_id(496243).await.unwrap().unwrap();
        assert_eq!(stored, movie);
        assert_eq!(
            reopened.find_actor_by_remote_id(20738).await.unwrap().unwrap(),
            actor
        );
        assert_eq!(
            reopened.stats().await.unwrap(),
            CatalogStats {
                categories: 1,
                directors: 1,
                actors: 1,
                movies: 1,
                movie_actors: 1,
            }
        );

        reopened.reset().await.unwrap();
        assert_eq!(reopened.stats().await.unwrap(), CatalogStats::default());
        drop(temp);
    }

    #[tokio::test]
    async fn test_backfill_remote_id() {
        let (_temp, store) = open_temp().await;
        let comedy = store
            .create_category(NewCategory {
                name: "Comedy".to_string(),
                remote_id: None,
                description: String::new(),
            })
            .await
            .unwrap();
        store
            .create_category(NewCategory::from_genre(35, "Humor"))
            .await
            .unwrap();

        let err = store
            .update_category_remote_id(comedy.id, 35)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let updated = store.update_category_remote_id(comedy.id, 36).await.unwrap();
        assert_eq!(updated.remote_id, Some(36));
        assert!(matches!(
            store.update_category_remote_id(999, 37).await,
            Err(Error::NotFound { entity: "category", .. })
        ));
        let names: Vec<String> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Comedy", "Humor"]);
    }

    #[tokio::test]
    async fn test_invalid_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.db");
        std::fs::write(&path, "not a sqlite database\n".repeat(20)).unwrap();
        assert!(matches!(
            SqliteStore::open(&path).await,
            Err(Error::InvalidStoreFile(_))
        ));
    }
}
