use serde::{de::DeserializeOwned, Serialize};

use super::schema::Database;
use super::types::StorageError;

/// Ordered JSON array of saved facts.
pub const FAVORITES_KEY: &str = "favorites";
/// Boolean flag set once the onboarding overlay has been completed.
pub const ONBOARDING_COMPLETE_KEY: &str = "onboardingComplete";

impl Database {
    // ========================================================================
    // Key/Value Operations
    // ========================================================================

    /// Get the raw stored text for a key, or `None` if the key was never set.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Store raw text under a key (UPSERT).
    ///
    /// Inserts the pair if the key doesn't exist, otherwise replaces the
    /// value and refreshes the timestamp.
    pub async fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read and deserialize a JSON blob.
    ///
    /// # Errors
    ///
    /// `StorageError::Corrupt` if the stored text does not parse as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_raw(key).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Serialize a value as JSON and store it.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        self.set_raw(key, &text).await
    }

    pub async fn get_flag(&self, key: &str) -> Result<Option<bool>, StorageError> {
        self.get_json(key).await
    }

    pub async fn set_flag(&self, key: &str, value: bool) -> Result<(), StorageError> {
        self.set_json(key, &value).await
    }

    /// Remove every key (favorites and onboarding state).
    pub async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store").execute(&self.pool).await?;
        Ok(())
    }
}
