//! SQLite-backed store.
//!
//! Each persisted collection lives as one keyed row in a single table,
//! upserted on write. The connection URL decides whether the database is a
//! shared in-memory one or a file on disk.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};

use super::LocalStore;
use crate::entities::store_entry;

/// A [`LocalStore`] persisting to SQLite via SeaORM.
pub struct SqliteStore {
    conn: DatabaseConnection,
}

impl SqliteStore {
    /// Connect and create the schema if it does not exist yet.
    pub async fn new(database_url: &str) -> Result<Self> {
        let conn = Database::connect(database_url).await?;

        let backend = conn.get_database_backend();
        let schema = Schema::new(backend);
        let mut create = schema.create_table_from_entity(store_entry::Entity);
        create.if_not_exists();
        conn.execute(backend.build(&create)).await?;

        Ok(Self { conn })
    }

    /// Access to the underlying connection, for embedding applications that
    /// share the database.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(store_entry::Entity::find_by_id(key)
            .one(&self.conn)
            .await?
            .map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = store_entry::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
            updated_at: ActiveValue::Set(Utc::now().to_rfc3339()),
        };

        store_entry::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(store_entry::Column::Key)
                    .update_columns([store_entry::Column::Value, store_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        store_entry::Entity::delete_by_id(key).exec(&self.conn).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        store_entry::Entity::delete_many().exec(&self.conn).await?;
        Ok(())
    }
}
