pub mod error;
mod pool;
mod reads;
mod row;
mod writes;

pub use error::StoreError;
pub use pool::InventoryStore;
pub use writes::ApplyOutcome;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn store() -> InventoryStore {
        InventoryStore::connect_in_memory().await.expect("in-memory store")
    }

    #[tokio::test]
    async fn insert_then_find_by_sku() {
        let store = store().await;
        let id = Uuid::new_v4();
        store
            .insert_item("e1", id, "SKU-001", "Laptop", None, 100)
            .await
            .expect("insert succeeds");

        let item = store.find_by_sku("SKU-001").await.unwrap().expect("item exists");
        assert_eq!(item.quantity, 100);
        assert_eq!(item.reserved, 0);
        assert_eq!(item.available, 100);
        assert_eq!(item.version, 1);
    }

    #[tokio::test]
    async fn duplicate_sku_is_rejected() {
        let store = store().await;
        store
            .insert_item("e1", Uuid::new_v4(), "SKU-001", "Laptop", None, 100)
            .await
            .expect("first insert succeeds");

        let result = store.insert_item("e2", Uuid::new_v4(), "SKU-001", "Laptop 2", None, 5).await;
        assert!(matches!(result, Err(StoreError::DuplicateSku(_))));
    }

    #[tokio::test]
    async fn replaying_the_same_event_id_is_a_no_op() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.insert_item("e1", id, "SKU-001", "Laptop", None, 100).await.unwrap();

        let outcome = store.update_item("e1", id, "Laptop Pro", None).await.unwrap();
        assert!(matches!(outcome, ApplyOutcome::AlreadyProcessed));

        let item = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(item.name, "Laptop");
        assert_eq!(item.version, 1);
    }

    #[tokio::test]
    async fn reserve_then_release_round_trip() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.insert_item("e1", id, "SKU-001", "Laptop", None, 100).await.unwrap();

        store.reserve_stock("e2", id, 30).await.unwrap();
        let outcome = store.release_stock("e3", id, 10).await.unwrap();

        let ApplyOutcome::Applied(item) = outcome else { panic!("expected Applied") };
        assert_eq!(item.quantity, 100);
        assert_eq!(item.reserved, 20);
        assert_eq!(item.available, 80);
        assert_eq!(item.version, 3);
    }

    #[tokio::test]
    async fn over_reserve_is_rejected_without_mutating_state() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.insert_item("e1", id, "SKU-001", "Laptop", None, 100).await.unwrap();
        store.reserve_stock("e2", id, 20).await.unwrap();

        let result = store.reserve_stock("e3", id, 200).await;
        assert!(matches!(result, Err(StoreError::InsufficientStock(_))));

        let item = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(item.version, 2);
    }

    #[tokio::test]
    async fn adjust_by_delta_recomputes_from_loaded_row() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.insert_item("e1", id, "SKU-001", "Laptop", None, 100).await.unwrap();
        store.reserve_stock("e2", id, 20).await.unwrap();

        let outcome = store.adjust_stock("e3", id, 25).await.unwrap();
        let ApplyOutcome::Applied(item) = outcome else { panic!("expected Applied") };
        assert_eq!(item.quantity, 125);
        assert_eq!(item.reserved, 20);
        assert_eq!(item.available, 105);
        assert_eq!(item.version, 3);
    }

    #[tokio::test]
    async fn delete_missing_item_is_not_found() {
        let store = store().await;
        let result = store.delete_item("e1", Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_items_orders_by_created_at_desc() {
        let store = store().await;
        store.insert_item("e1", Uuid::new_v4(), "SKU-001", "First", None, 10).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.insert_item("e2", Uuid::new_v4(), "SKU-002", "Second", None, 20).await.unwrap();

        let page = store.list_items(1, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sku, "SKU-002");
    }
}
