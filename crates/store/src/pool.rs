use crate::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Owns the single SQLite file behind two pools, see spec §4.4 and §5.
///
/// `writer`: `max_connections(1)`. A pool of size 1 already serialises
/// every connection checkout, but the `write_lock` mutex is held for the
/// full duration of a logical write (which may span several statements
/// inside one transaction), making the single-writer invariant a fact
/// readable at the call site rather than an emergent property of pool
/// sizing.
///
/// `reader`: `max_connections(10)`, opened with `journal_mode=WAL` so
/// reads never block behind the writer's transaction.
#[derive(Clone)]
pub struct InventoryStore {
    pub(crate) writer: SqlitePool,
    pub(crate) reader: SqlitePool,
    pub(crate) write_lock: Arc<Mutex<()>>,
}

impl InventoryStore {
    pub async fn connect(sqlite_path: &str) -> Result<Self, StoreError> {
        let writer_opts = SqliteConnectOptions::from_str(&format!("sqlite://{sqlite_path}"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let writer = SqlitePoolOptions::new().max_connections(1).connect_with(writer_opts).await?;

        let reader_opts = SqliteConnectOptions::from_str(&format!("sqlite://{sqlite_path}"))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .read_only(false);

        let reader = SqlitePoolOptions::new().max_connections(10).connect_with(reader_opts).await?;

        sqlx::migrate!("./migrations").run(&writer).await?;

        info!(sqlite_path, "inventory store connected, migrations applied");

        Ok(Self {
            writer,
            reader,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// An ephemeral, single-connection store backed by `sqlite::memory:`,
    /// for store/applier tests that need a real (if throwaway) database
    /// rather than a mock — see spec §8 properties 3, 4, 8.
    pub async fn connect_in_memory() -> Result<Self, StoreError> {
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let reader = writer.clone();
        sqlx::migrate!("./migrations").run(&writer).await?;
        Ok(Self {
            writer,
            reader,
            write_lock: Arc::new(Mutex::new(())),
        })
    }
}
