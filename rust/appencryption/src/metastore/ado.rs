//! ADO (ActiveX Data Objects) metastore implementation
//!
//! This module provides a metastore implementation for ADO.NET compatible databases.
//! It is a placeholder implementation that follows the pattern of other SQL metastores
//! but would need integration with a specific ADO.NET driver in production.

use crate::envelope::EnvelopeKeyRecord;
use crate::error::{Error, Result};
use crate::Metastore;
use async_trait::async_trait;
use std::sync::Arc;

/// ADO.NET metastore implementation for key storage.
/// 
/// This is a placeholder implementation that would need to be connected
/// to a real ADO.NET compatible database using an appropriate driver.
pub struct AdoMetastore {
    // Connection string for the ADO.NET database
    connection_string: String,
    
    // Table name for storing the encryption keys
    table_name: String,
}

impl AdoMetastore {
    /// Creates a new ADO.NET metastore with the given connection string and table name
    pub fn new(connection_string: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            table_name: table_name.into(),
        }
    }
    
    /// Creates a new ADO.NET metastore with default table name "encryption_key"
    pub fn with_connection(connection_string: impl Into<String>) -> Self {
        Self::new(connection_string, "encryption_key")
    }
    
    /// Creates the encryption_key table if it doesn't exist
    pub async fn create_table_if_not_exists(&self) -> Result<()> {
        // In a real implementation, this would use ADO.NET to create the table
        // with appropriate schema for storing encryption keys
        
        // Example SQL for different database types:
        //
        // SQL Server:
        // IF NOT EXISTS (SELECT * FROM sys.objects WHERE object_id = OBJECT_ID(N'[dbo].[encryption_key]') AND type in (N'U'))
        // BEGIN
        //   CREATE TABLE [dbo].[encryption_key] (
        //     [id] NVARCHAR(255) NOT NULL,
        //     [created] BIGINT NOT NULL,
        //     [key_record] VARBINARY(MAX) NOT NULL,
        //     CONSTRAINT [PK_encryption_key] PRIMARY KEY CLUSTERED ([id], [created])
        //   )
        // END
        //
        // MySQL:
        // CREATE TABLE IF NOT EXISTS encryption_key (
        //   id VARCHAR(255) NOT NULL,
        //   created BIGINT NOT NULL,
        //   key_record BLOB NOT NULL,
        //   PRIMARY KEY (id, created)
        // )
        //
        // PostgreSQL:
        // CREATE TABLE IF NOT EXISTS encryption_key (
        //   id VARCHAR(255) NOT NULL,
        //   created BIGINT NOT NULL,
        //   key_record BYTEA NOT NULL,
        //   PRIMARY KEY (id, created)
        // )
        //
        // Oracle:
        // BEGIN
        //   EXECUTE IMMEDIATE 'CREATE TABLE encryption_key (
        //     id VARCHAR2(255) NOT NULL,
        //     created NUMBER(19) NOT NULL,
        //     key_record BLOB NOT NULL,
        //     CONSTRAINT pk_encryption_key PRIMARY KEY (id, created)
        //   )';
        // EXCEPTION
        //   WHEN OTHERS THEN
        //     IF SQLCODE = -955 THEN NULL; ELSE RAISE; END IF;
        // END;
        
        Err(Error::NotImplemented("ADO.NET metastore is a placeholder implementation - full implementation will be available in a future release".to_string()))
    }
}

#[async_trait]
impl Metastore for AdoMetastore {
    async fn load(&self, id: &str, created: i64) -> Result<Option<EnvelopeKeyRecord>> {
        // In a real implementation, this would execute a SQL query like:
        // SELECT key_record FROM encryption_key WHERE id = @P1 AND created = @P2
        
        Err(Error::NotImplemented("ADO.NET metastore is a placeholder implementation - full implementation will be available in a future release".to_string()))
    }
    
    async fn load_latest(&self, id: &str) -> Result<Option<EnvelopeKeyRecord>> {
        // In a real implementation, this would execute a SQL query like:
        // SELECT key_record FROM encryption_key WHERE id = @P1 ORDER BY created DESC LIMIT 1
        
        Err(Error::NotImplemented("ADO.NET metastore is a placeholder implementation - full implementation will be available in a future release".to_string()))
    }
    
    async fn store(&self, id: &str, created: i64, envelope: &EnvelopeKeyRecord) -> Result<bool> {
        // In a real implementation, this would execute a SQL query like:
        // INSERT INTO encryption_key (id, created, key_record) VALUES (@P1, @P2, @P3)
        // ON CONFLICT DO NOTHING
        
        Err(Error::NotImplemented("ADO.NET metastore is a placeholder implementation - full implementation will be available in a future release".to_string()))
    }
}

// Factory function to create a boxed AdoMetastore
pub fn new_ado_metastore(connection_string: impl Into<String>, table_name: impl Into<String>) -> Arc<dyn Metastore> {
    Arc::new(AdoMetastore::new(connection_string, table_name))
}