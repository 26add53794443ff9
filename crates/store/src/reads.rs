use crate::error::StoreError;
use crate::pool::InventoryStore;
use crate::row::ItemRow;
use common::{InventoryItem, StockStatus};
use uuid::Uuid;

/// Read queries used by the Query Service, see spec §4.4. All go through
/// the reader pool; none ever touch `write_lock`.
impl InventoryStore {
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InventoryItem>, StoreError> {
        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.reader)
            .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<InventoryItem>, StoreError> {
        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM inventory_items WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&self.reader)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Paginated list ordered by `created_at DESC`. `page` is 1-indexed;
    /// callers (the HTTP layer) are responsible for clamping `page_size`
    /// into the 1-100 range per spec §6.
    pub async fn list_items(&self, page: u32, page_size: u32) -> Result<Vec<InventoryItem>, StoreError> {
        let offset = (page.saturating_sub(1)) as i64 * page_size as i64;
        let rows: Vec<ItemRow> = sqlx::query_as("SELECT * FROM inventory_items ORDER BY created_at DESC LIMIT ? OFFSET ?")
            .bind(page_size as i64)
            .bind(offset)
            .fetch_all(&self.reader)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn stock_status(&self, id: Uuid) -> Result<Option<StockStatus>, StoreError> {
        Ok(self.find_by_id(id).await?.as_ref().map(StockStatus::from))
    }
}
