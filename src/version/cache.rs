use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::version::error::CacheError;
use crate::version::store::MetadataStore;
use crate::version::types::{Availability, Loader, ProjectDump};

/// Entry namespaces within a package's partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    /// Raw provider dump, covering every version and loader
    Project,
    /// Resolved result for one (version, loader) pair
    Availability,
}

impl EntryKind {
    fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Project => "project",
            EntryKind::Availability => "availability",
        }
    }
}

/// Key of one cache entry
struct EntryKey<'a> {
    slug: &'a str,
    kind: EntryKind,
    game_version: &'a str,
    loader: &'a str,
}

impl<'a> EntryKey<'a> {
    fn project(slug: &'a str) -> Self {
        Self {
            slug,
            kind: EntryKind::Project,
            game_version: "",
            loader: "",
        }
    }

    fn availability(slug: &'a str, game_version: &'a str, loader: Loader) -> Self {
        Self {
            slug,
            kind: EntryKind::Availability,
            game_version,
            loader: loader.as_str(),
        }
    }
}

/// SQLite-backed metadata cache with lazy TTL expiry
pub struct Cache {
    conn: Mutex<Connection>,
    ttl_ms: i64,
}

impl Cache {
    pub fn new(db_path: &Path, ttl_ms: i64) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let cache = Self {
            conn: Mutex::new(conn),
            ttl_ms,
        };

        cache.create_schema()?;
        info!("Cache initialized successfully");

        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Get current timestamp in milliseconds since UNIX epoch
    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                slug TEXT NOT NULL,
                kind TEXT NOT NULL,
                game_version TEXT NOT NULL,
                loader TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (slug, kind, game_version, loader)
            )
            "#,
            [],
        )?;

        debug!("Database schema created successfully");
        Ok(())
    }

    fn read_entry<T: DeserializeOwned>(&self, key: &EntryKey<'_>) -> Result<Option<T>, CacheError> {
        let conn = self.lock_conn()?;

        let row: Option<(i64, String)> = conn
            .query_row(
                r#"
                SELECT cached_at, payload FROM entries
                WHERE slug = ?1 AND kind = ?2 AND game_version = ?3 AND loader = ?4
                "#,
                (key.slug, key.kind.as_str(), key.game_version, key.loader),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((cached_at, payload)) = row else {
            return Ok(None);
        };

        if Self::current_timestamp_ms() - cached_at >= self.ttl_ms {
            debug!(
                "Cache entry expired for {} ({} {}@{})",
                key.slug,
                key.kind.as_str(),
                key.game_version,
                key.loader
            );
            Self::delete_entry(&conn, key)?;
            return Ok(None);
        }

        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    "Discarding unreadable cache entry for {} ({}): {}",
                    key.slug,
                    key.kind.as_str(),
                    e
                );
                Self::delete_entry(&conn, key)?;
                Ok(None)
            }
        }
    }

    fn write_entry<T: Serialize>(&self, key: &EntryKey<'_>, value: &T) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        let now = Self::current_timestamp_ms();
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO entries (slug, kind, game_version, loader, cached_at, payload)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            (
                key.slug,
                key.kind.as_str(),
                key.game_version,
                key.loader,
                now,
                payload,
            ),
        )?;

        Ok(())
    }

    fn delete_entry(conn: &Connection, key: &EntryKey<'_>) -> Result<(), CacheError> {
        conn.execute(
            "DELETE FROM entries WHERE slug = ?1 AND kind = ?2 AND game_version = ?3 AND loader = ?4",
            (key.slug, key.kind.as_str(), key.game_version, key.loader),
        )?;
        Ok(())
    }

    /// Drop every entry cached for one package
    pub fn invalidate(&self, slug: &str) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM entries WHERE slug = ?1", [slug])?;
        debug!("Invalidated {} cache entries for {}", removed, slug);
        Ok(())
    }

    /// Drop every cached entry
    pub fn clear(&self) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM entries", [])?;
        info!("Cleared {} cache entries", removed);
        Ok(())
    }
}

impl MetadataStore for Cache {
    fn get_project(&self, slug: &str) -> Result<Option<ProjectDump>, CacheError> {
        self.read_entry(&EntryKey::project(slug))
    }

    fn put_project(&self, slug: &str, dump: &ProjectDump) -> Result<(), CacheError> {
        debug!("Caching {} releases for {}", dump.releases.len(), slug);
        self.write_entry(&EntryKey::project(slug), dump)
    }

    fn get_availability(
        &self,
        slug: &str,
        game_version: &str,
        loader: Loader,
    ) -> Result<Option<Availability>, CacheError> {
        self.read_entry(&EntryKey::availability(slug, game_version, loader))
    }

    fn put_availability(
        &self,
        slug: &str,
        game_version: &str,
        loader: Loader,
        availability: &Availability,
    ) -> Result<(), CacheError> {
        self.write_entry(
            &EntryKey::availability(slug, game_version, loader),
            availability,
        )
    }
}
