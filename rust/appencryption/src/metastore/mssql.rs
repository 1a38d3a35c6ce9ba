//! Microsoft SQL Server metastore implementation placeholder
//!
//! This module provides a placeholder implementation of the `Metastore` trait for SQL Server.
//! In a real implementation, you would integrate with your preferred SQL Server driver.

use crate::envelope::EnvelopeKeyRecord;
use crate::error::{Error, Result};
use crate::Metastore;
use async_trait::async_trait;

/// SQL Server metastore implementation placeholder
///
/// This is a placeholder implementation that would need to be completed
/// with actual SQL Server connectivity using your preferred driver.
#[derive(Debug)]
pub struct MssqlMetastore;

impl Default for MssqlMetastore {
    fn default() -> Self {
        Self
    }
}

impl MssqlMetastore {
    /// Creates a new SQL Server metastore (placeholder)
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Metastore for MssqlMetastore {
    async fn load(&self, _id: &str, _created: i64) -> Result<Option<EnvelopeKeyRecord>> {
        // In a real implementation, you would:
        // 1. Execute a SQL query like: SELECT key_record FROM encryption_key WHERE id = @P1 AND created = @P2
        // 2. Deserialize the result into an EnvelopeKeyRecord
        // 3. Return the result

        Err(Error::Metastore(
            "SQL Server metastore not implemented".into(),
        ))
    }

    async fn load_latest(&self, _id: &str) -> Result<Option<EnvelopeKeyRecord>> {
        // In a real implementation, you would:
        // 1. Execute a SQL query like: SELECT TOP 1 key_record FROM encryption_key WHERE id = @P1 ORDER BY created DESC
        // 2. Deserialize the result into an EnvelopeKeyRecord
        // 3. Return the result

        Err(Error::Metastore(
            "SQL Server metastore not implemented".into(),
        ))
    }

    async fn store(&self, _id: &str, _created: i64, _envelope: &EnvelopeKeyRecord) -> Result<bool> {
        // In a real implementation, you would:
        // 1. Serialize the envelope to JSON
        // 2. Execute a SQL query like: INSERT INTO encryption_key (id, created, key_record) VALUES (@P1, @P2, @P3)
        // 3. Return whether the insert was successful

        Err(Error::Metastore(
            "SQL Server metastore not implemented".into(),
        ))
    }
}
