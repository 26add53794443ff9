use chrono::{DateTime, Utc};
use common::InventoryItem;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// Maps a `inventory_items` row to `common::InventoryItem`.
///
/// A local type is required here rather than `impl FromRow for
/// InventoryItem` directly: neither `sqlx::FromRow` nor `InventoryItem`
/// is defined in this crate, so the orphan rule forbids it.
pub(crate) struct ItemRow(pub InventoryItem);

impl FromRow<'_, SqliteRow> for ItemRow {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let id: String = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(ItemRow(InventoryItem {
            id: Uuid::parse_str(&id).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            quantity: row.try_get("quantity")?,
            reserved: row.try_get("reserved")?,
            available: row.try_get("available")?,
            version: row.try_get("version")?,
            created_at: parse_rfc3339(&created_at)?,
            updated_at: parse_rfc3339(&updated_at)?,
        }))
    }
}

fn parse_rfc3339(s: &str) -> sqlx::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
