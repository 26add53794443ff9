use crate::error::StoreError;
use crate::pool::InventoryStore;
use crate::row::ItemRow;
use chrono::Utc;
use common::InventoryItem;
use sqlx::{Row, Sqlite, Transaction};
use uuid::Uuid;

/// Result of applying a write: either the event was new and the mutation
/// ran, or it had already been recorded in `processed_events` and the
/// write was a no-op (spec §4.5 step 2).
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    Applied(InventoryItem),
    AlreadyProcessed,
}

impl InventoryStore {
    async fn is_processed(tx: &mut Transaction<'_, Sqlite>, event_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM processed_events WHERE event_id = ?")
            .bind(event_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }

    async fn mark_processed(
        tx: &mut Transaction<'_, Sqlite>,
        event_id: &str,
        aggregate_id: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO processed_events (event_id, aggregate_id, applied_at) VALUES (?, ?, ?)")
            .bind(event_id)
            .bind(aggregate_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn load_for_update(tx: &mut Transaction<'_, Sqlite>, id: Uuid) -> Result<Option<InventoryItem>, StoreError> {
        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Insert a new item, see spec §4.4. Fails with `DuplicateSku` if the
    /// sku already exists; starts at `version=1`, `reserved=0`,
    /// `available=quantity`.
    pub async fn insert_item(
        &self,
        event_id: &str,
        id: Uuid,
        sku: &str,
        name: &str,
        description: Option<&str>,
        quantity: i64,
    ) -> Result<ApplyOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.writer.begin().await?;

        if Self::is_processed(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(ApplyOutcome::AlreadyProcessed);
        }

        let existing: Option<i64> = sqlx::query("SELECT 1 FROM inventory_items WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&mut *tx)
            .await?
            .map(|row| row.get(0));
        if existing.is_some() {
            return Err(StoreError::DuplicateSku(sku.to_string()));
        }

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO inventory_items (id, sku, name, description, quantity, reserved, available, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, 1, ?, ?)",
        )
        .bind(id.to_string())
        .bind(sku)
        .bind(name)
        .bind(description)
        .bind(quantity)
        .bind(quantity)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        Self::mark_processed(&mut tx, event_id, &id.to_string()).await?;
        let item = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tx.commit().await?;
        Ok(ApplyOutcome::Applied(item))
    }

    /// Update name/description, see spec §4.4. Zero rows affected by the
    /// version-guarded UPDATE means an optimistic-lock conflict.
    pub async fn update_item(
        &self,
        event_id: &str,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<ApplyOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.writer.begin().await?;

        if Self::is_processed(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(ApplyOutcome::AlreadyProcessed);
        }

        let current = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE inventory_items SET name = ?, description = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(name)
        .bind(description)
        .bind(&now)
        .bind(id.to_string())
        .bind(current.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OptimisticLock(id.to_string()));
        }

        Self::mark_processed(&mut tx, event_id, &id.to_string()).await?;
        let item = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tx.commit().await?;
        Ok(ApplyOutcome::Applied(item))
    }

    /// Hard delete, see spec §3/§4.4. Zero rows from the version-guarded
    /// DELETE is disambiguated by a follow-up existence probe: if the row
    /// still exists (at a different version) it's a lock conflict,
    /// otherwise the item was already gone.
    pub async fn delete_item(&self, event_id: &str, id: Uuid) -> Result<ApplyOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.writer.begin().await?;

        if Self::is_processed(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(ApplyOutcome::AlreadyProcessed);
        }

        let current = Self::load_for_update(&mut tx, id).await?;
        let Some(current) = current else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ? AND version = ?")
            .bind(id.to_string())
            .bind(current.version)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            let still_there = Self::load_for_update(&mut tx, id).await?;
            return Err(match still_there {
                Some(_) => StoreError::OptimisticLock(id.to_string()),
                None => StoreError::NotFound(id.to_string()),
            });
        }

        Self::mark_processed(&mut tx, event_id, &id.to_string()).await?;
        tx.commit().await?;
        Ok(ApplyOutcome::Applied(current))
    }

    /// Apply a signed delta to `quantity`, see spec §4.4/§4.5. The guard
    /// embeds both the version check and the non-negativity invariants in
    /// the `WHERE` clause; zero rows is disambiguated by reloading and
    /// re-checking which guard failed, matching the applier contract in
    /// spec §4.5 step 4.
    pub async fn adjust_stock(&self, event_id: &str, id: Uuid, delta: i64) -> Result<ApplyOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.writer.begin().await?;

        if Self::is_processed(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(ApplyOutcome::AlreadyProcessed);
        }

        let current = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE inventory_items
             SET quantity = quantity + ?, available = (quantity + ?) - reserved, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ? AND quantity + ? >= 0 AND (quantity + ?) - reserved >= 0",
        )
        .bind(delta)
        .bind(delta)
        .bind(&now)
        .bind(id.to_string())
        .bind(current.version)
        .bind(delta)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::classify_zero_rows(&current, delta));
        }

        Self::mark_processed(&mut tx, event_id, &id.to_string()).await?;
        let item = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tx.commit().await?;
        Ok(ApplyOutcome::Applied(item))
    }

    /// Reserve `r` units, guarded by `reserved + r <= quantity`.
    pub async fn reserve_stock(&self, event_id: &str, id: Uuid, amount: i64) -> Result<ApplyOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.writer.begin().await?;

        if Self::is_processed(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(ApplyOutcome::AlreadyProcessed);
        }

        let current = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE inventory_items
             SET reserved = reserved + ?, available = quantity - (reserved + ?), version = version + 1, updated_at = ?
             WHERE id = ? AND version = ? AND reserved + ? <= quantity",
        )
        .bind(amount)
        .bind(amount)
        .bind(&now)
        .bind(id.to_string())
        .bind(current.version)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(if current.reserved + amount > current.quantity {
                StoreError::InsufficientStock(id.to_string())
            } else {
                StoreError::OptimisticLock(id.to_string())
            });
        }

        Self::mark_processed(&mut tx, event_id, &id.to_string()).await?;
        let item = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tx.commit().await?;
        Ok(ApplyOutcome::Applied(item))
    }

    /// Release `r` units, guarded by `r <= reserved`.
    pub async fn release_stock(&self, event_id: &str, id: Uuid, amount: i64) -> Result<ApplyOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.writer.begin().await?;

        if Self::is_processed(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(ApplyOutcome::AlreadyProcessed);
        }

        let current = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE inventory_items
             SET reserved = reserved - ?, available = quantity - (reserved - ?), version = version + 1, updated_at = ?
             WHERE id = ? AND version = ? AND ? <= reserved",
        )
        .bind(amount)
        .bind(amount)
        .bind(&now)
        .bind(id.to_string())
        .bind(current.version)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(if amount > current.reserved {
                StoreError::InsufficientStock(id.to_string())
            } else {
                StoreError::OptimisticLock(id.to_string())
            });
        }

        Self::mark_processed(&mut tx, event_id, &id.to_string()).await?;
        let item = Self::load_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tx.commit().await?;
        Ok(ApplyOutcome::Applied(item))
    }

    fn classify_zero_rows(current: &InventoryItem, delta: i64) -> StoreError {
        let would_be_negative = current.quantity + delta < 0 || (current.quantity + delta) - current.reserved < 0;
        if would_be_negative {
            StoreError::InsufficientStock(current.id.to_string())
        } else {
            StoreError::OptimisticLock(current.id.to_string())
        }
    }
}
