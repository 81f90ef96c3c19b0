//! SurrealDB schema migrations and initialization
//!
//! Sets up the event log and agent memory tables with their constraints
//! and indexes.

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all eventfeed tables in SurrealDB
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing eventfeed SurrealDB schema");

    init_events_table(db).await?;
    init_event_sequence_table(db).await?;
    init_agent_memory_table(db).await?;

    info!("eventfeed schema initialization complete");
    Ok(())
}

/// Initialize `events` table
///
/// Schema:
/// ```text
/// TABLE events {
///   event_id:    INT (unique)
///   source_id:   STRING (indexed)
///   payload:     OBJECT
///   created_at:  DATETIME
/// }
/// ```
///
/// Events are append-only: updates and deletes are denied.
async fn init_events_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing events table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS events AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_event_id ON TABLE events COLUMNS event_id UNIQUE;

        -- Per-source scans (cold start fan-out)
        DEFINE INDEX IF NOT EXISTS idx_source_event ON TABLE events COLUMNS source_id, event_id;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(format!("events table: {e}")))?;
    Ok(())
}

/// Initialize `event_sequence` table (single row `event_sequence:global`)
async fn init_event_sequence_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing event_sequence table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS event_sequence SCHEMALESS;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(format!("event_sequence table: {e}")))?;
    Ok(())
}

/// Initialize `agent_memory` table
///
/// Schema:
/// ```text
/// TABLE agent_memory {
///   agent_id:    STRING (unique, also the record key)
///   memory:      OBJECT
///   updated_at:  DATETIME
/// }
/// ```
async fn init_agent_memory_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing agent_memory table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS agent_memory SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_agent_id ON TABLE agent_memory COLUMNS agent_id UNIQUE;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(format!("agent_memory table: {e}")))?;
    Ok(())
}
