use crate::domain::auth::AuthSession;
use crate::domain::ports::CredentialStore;
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the persisted login.
pub const CF_CREDENTIALS: &str = "credentials";
const SESSION_KEY: &[u8] = b"auth_session";

/// Credential store backed by RocksDB.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbCredentialStore {
    db: Arc<DB>,
}

impl RocksDbCredentialStore {
    /// Opens or creates the database at `path`, with its column family.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf = ColumnFamilyDescriptor::new(CF_CREDENTIALS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf]).map_err(storage)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_CREDENTIALS).ok_or_else(|| {
            BookingError::Storage("credentials column family not found".to_string())
        })
    }
}

fn storage(err: rocksdb::Error) -> BookingError {
    BookingError::Storage(err.to_string())
}

#[async_trait]
impl CredentialStore for RocksDbCredentialStore {
    async fn save(&self, session: &AuthSession) -> Result<()> {
        let value = serde_json::to_vec(session)?;
        self.db
            .put_cf(self.cf()?, SESSION_KEY, value)
            .map_err(storage)
    }

    async fn load(&self) -> Result<Option<AuthSession>> {
        match self.db.get_cf(self.cf()?, SESSION_KEY).map_err(storage)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<()> {
        self.db
            .delete_cf(self.cf()?, SESSION_KEY)
            .map_err(storage)
    }
}
