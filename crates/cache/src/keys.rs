use uuid::Uuid;

/// The four typed key families from spec §4.7.
pub fn item_id_key(id: Uuid) -> String {
    format!("item:id:{id}")
}

pub fn item_sku_key(sku: &str) -> String {
    format!("item:sku:{sku}")
}

pub fn stock_key(id: Uuid) -> String {
    format!("stock:{id}")
}

pub fn list_key(page: u32, page_size: u32) -> String {
    format!("items:list:{page}:{page_size}")
}

pub const ITEM_ID_PATTERN: &str = "item:id:*";
pub const ITEM_SKU_PATTERN: &str = "item:sku:*";
pub const STOCK_PATTERN: &str = "stock:*";
pub const LIST_PATTERN: &str = "items:list:*";

/// All four key families, for the fallback invalidation path when a
/// Confirmed event carries neither an extractable `itemId` nor `sku`.
pub const ALL_PATTERNS: [&str; 4] = [ITEM_ID_PATTERN, ITEM_SKU_PATTERN, STOCK_PATTERN, LIST_PATTERN];
