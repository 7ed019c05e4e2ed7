//! Connection pool and single-writer actor for the SQLite store.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::debug;
use tokio::sync::{mpsc, oneshot};

use apiario_core::errors::{DatabaseError, Error, Result};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const POOL_MAX_SIZE: u32 = 8;

#[derive(Debug)]
struct ConnectionOptions;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        // WAL keeps readers unblocked while the writer actor holds its
        // transaction; busy_timeout covers the brief checkpoint windows.
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Build the pool for `database_url` and run pending embedded migrations.
pub fn create_pool(database_url: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))?;

    let mut conn = pool
        .get()
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Database(DatabaseError::Migration(e.to_string())))?;
    debug!("[Storage] pool ready for {}", database_url);

    Ok(Arc::new(pool))
}

/// Checkout a read connection.
pub fn get_connection(
    pool: &Arc<DbPool>,
) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))
}

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send>;

enum TxError {
    App(Error),
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Db(err)
    }
}

/// Handle to the single-writer actor.
///
/// SQLite allows one writer at a time, so every mutation runs as a closure on
/// a dedicated thread inside an immediate transaction. Multi-table cascades
/// and full-table swaps are atomic for free, and the optimistic write path
/// and the sync engine cannot interleave partial writes.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<WriteJob>,
}

impl WriteHandle {
    /// Spawn the writer thread on its own pooled connection.
    pub fn spawn(pool: Arc<DbPool>) -> Result<Self> {
        let mut conn = pool
            .get()
            .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))?;
        let (sender, mut receiver) = mpsc::unbounded_channel::<WriteJob>();

        std::thread::Builder::new()
            .name("apiario-db-writer".to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut conn);
                }
                debug!("[Storage] writer actor stopped");
            })
            .map_err(|e| {
                Error::Database(DatabaseError::Internal(format!(
                    "failed to spawn writer thread: {e}"
                )))
            })?;

        Ok(Self { sender })
    }

    /// Run `job` inside an immediate transaction on the writer connection.
    /// An `Err` from the job rolls the transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(Box::new(move |conn: &mut SqliteConnection| {
                let result = conn
                    .immediate_transaction::<T, TxError, _>(|conn| {
                        job(conn).map_err(TxError::App)
                    })
                    .map_err(|err| match err {
                        TxError::App(inner) => inner,
                        TxError::Db(inner) => {
                            Error::Database(DatabaseError::Query(inner.to_string()))
                        }
                    });
                let _ = tx.send(result);
            }))
            .map_err(|_| {
                Error::Database(DatabaseError::Internal(
                    "writer actor is no longer running".to_string(),
                ))
            })?;

        rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "writer actor dropped the job".to_string(),
            ))
        })?
    }
}
