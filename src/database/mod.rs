pub mod users;

#[cfg(test)]
pub mod memory;

pub use users::{MongoUserStore, UserStore};

use mongodb::{Client, Collection, Database};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::utils::{AppError, AppResult};

pub const USERS_COLLECTION: &str = "users";

/// Shared database handle. Building it does not contact the server; the
/// first successful `ready` creates the indexes.
#[derive(Clone)]
pub struct MongoDB {
    db: Database,
    indexes: Arc<OnceCell<()>>,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> AppResult<Self> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        // URI options win over these defaults
        client_options
            .connect_timeout
            .get_or_insert(Duration::from_secs(5));
        client_options
            .server_selection_timeout
            .get_or_insert(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        Ok(Self {
            db: client.database(db_name),
            indexes: Arc::new(OnceCell::new()),
        })
    }

    /// Builds the handle and waits for the server, retrying `retries` more
    /// times with `delay` in between. An unreachable server is logged and the
    /// handle is returned anyway; only an unusable URI is an error.
    pub async fn connect_with_retry(
        uri: &str,
        db_name: &str,
        retries: u32,
        delay: Duration,
    ) -> AppResult<Self> {
        let mongodb = Self::new(uri, db_name).await?;

        let mut attempt = 0;
        loop {
            log::info!("🔄 Connecting to MongoDB (database: {})...", db_name);
            match mongodb.ready().await {
                Ok(()) => {
                    log::info!("✅ MongoDB connected successfully");
                    return Ok(mongodb);
                }
                Err(e) if attempt < retries => {
                    attempt += 1;
                    log::warn!("⚠️  MongoDB connection failed: {}", e);
                    log::info!("🔄 Retry {}/{} in {}s...", attempt, retries, delay.as_secs());
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    log::error!("❌ MongoDB unreachable after {} retries: {}", retries, e);
                    log::error!("⚠️  Serving without database; requests needing it will fail");
                    return Ok(mongodb);
                }
            }
        }
    }

    /// Pings the server and creates the indexes once. Retried on the next
    /// call while the server stays unreachable.
    pub async fn ready(&self) -> AppResult<()> {
        self.indexes
            .get_or_try_init(|| async {
                self.ping().await?;
                self.ensure_indexes().await;
                Ok::<(), AppError>(())
            })
            .await
            .map(|_| ())
    }

    /// Unique indexes back the duplicate-user checks.
    async fn ensure_indexes(&self) {
        use mongodb::bson::Document;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<Document>(USERS_COLLECTION);

        for field in ["email", "username", "user_id"] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build();

            // Re-creating an identical index succeeds, so any error is real
            match users.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index ready: users({}) unique", field),
                Err(e) => log::warn!(
                    "   ⚠️  Could not create unique index on users({}): {}",
                    field,
                    e
                ),
            }
        }
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Round-trip to the server, used by the health endpoint.
    pub async fn ping(&self) -> AppResult<()> {
        self.db.run_command(mongodb::bson::doc! { "ping": 1 }).await?;
        Ok(())
    }
}
