//! Menu catalog and store locations.

use crustline_core::Price;

use crate::db::{Backend, RepositoryError};
use crate::error::{CoreError, Result};
use crate::models::{Item, ItemField, ItemFilter, SortKey, Store};

/// A way of browsing the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuQuery {
    /// Every item in the given order.
    All(SortKey),
    /// Items of one category, optionally below a price.
    Search(ItemFilter),
    /// Every item strictly cheaper than the price.
    Below(Price),
}

/// Catalog reads and manager-authorized writes.
///
/// Access control happens in the command router; methods here assume the
/// caller is allowed.
pub struct Catalog<'a> {
    backend: &'a dyn Backend,
}

impl<'a> Catalog<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// # Errors
    ///
    /// Returns `CoreError::StoreUnavailable` if the query fails.
    pub async fn list_all(&self, sort: SortKey) -> Result<Vec<Item>> {
        Ok(self.backend.list_items(sort).await?)
    }

    /// # Errors
    ///
    /// Returns `CoreError::StoreUnavailable` if the query fails.
    pub async fn search(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        Ok(self.backend.search_items(filter).await?)
    }

    /// Run a menu query.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StoreUnavailable` if the query fails.
    pub async fn browse(&self, query: &MenuQuery) -> Result<Vec<Item>> {
        match query {
            MenuQuery::All(sort) => self.list_all(*sort).await,
            MenuQuery::Search(filter) => self.search(filter).await,
            MenuQuery::Below(max) => {
                let mut items = self.list_all(SortKey::None).await?;
                items.retain(|item| item.price < *max);
                Ok(items)
            }
        }
    }

    /// Current price of an item.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ItemNotFound` if no item has that name.
    pub async fn price_of(&self, name: &str) -> Result<Price> {
        self.item(name).await.map(|item| item.price)
    }

    /// # Errors
    ///
    /// Returns `CoreError::ItemNotFound` if no item has that name.
    pub async fn item(&self, name: &str) -> Result<Item> {
        let name = name.trim();
        self.backend
            .get_item(name)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(name.to_owned()))
    }

    /// Add a new item.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for a blank name and
    /// `CoreError::DuplicateItem` if the name is taken.
    pub async fn add_item(&self, mut item: Item) -> Result<()> {
        item.name = item.name.trim().to_owned();
        if item.name.is_empty() {
            return Err(CoreError::InvalidInput("item name cannot be empty".to_owned()));
        }

        self.backend.insert_item(&item).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => CoreError::DuplicateItem(item.name.clone()),
            other => CoreError::StoreUnavailable(other),
        })?;

        tracing::info!(item = %item.name, price = %item.price, "Menu item added");
        Ok(())
    }

    /// Add the item, or overwrite every field of the existing one.
    ///
    /// Returns `true` if the item was new.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for a blank name.
    pub async fn upsert_item(&self, item: Item) -> Result<bool> {
        match self.add_item(item.clone()).await {
            Ok(()) => Ok(true),
            Err(CoreError::DuplicateItem(name)) => {
                let changes = [
                    ItemField::Price(item.price),
                    ItemField::Ingredients(item.ingredients),
                    ItemField::TypeOfItem(item.type_of_item),
                    ItemField::Description(item.description),
                ];
                self.update_item(&name, &changes).await?;
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }

    /// Apply a batch of field changes, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ItemNotFound` if no item has that name.
    pub async fn update_item(&self, name: &str, changes: &[ItemField]) -> Result<()> {
        let name = name.trim();
        if changes.is_empty() {
            // Still report a missing item.
            self.item(name).await?;
            return Ok(());
        }

        self.backend
            .update_item(name, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CoreError::ItemNotFound(name.to_owned()),
                other => CoreError::StoreUnavailable(other),
            })?;

        tracing::info!(item = %name, fields = changes.len(), "Menu item updated");
        Ok(())
    }

    /// Change a single field.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ItemNotFound` if no item has that name.
    pub async fn update_field(&self, name: &str, change: ItemField) -> Result<()> {
        self.update_item(name, &[change]).await
    }

    /// Every store location.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StoreUnavailable` if the query fails.
    pub async fn stores(&self) -> Result<Vec<Store>> {
        Ok(self.backend.list_stores().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryBackend;

    fn item(name: &str, cents: i64, kind: &str) -> Item {
        Item {
            name: name.to_owned(),
            price: Price::from_cents(cents).unwrap(),
            ingredients: String::new(),
            type_of_item: kind.to_owned(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_lists_nothing() {
        let backend = MemoryBackend::new();
        let items = Catalog::new(&backend).list_all(SortKey::PriceAsc).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_price_of_unknown_item() {
        let backend = MemoryBackend::with_demo_data();
        let catalog = Catalog::new(&backend);

        assert_eq!(
            catalog.price_of("Cola").await.unwrap().amount(),
            Decimal::new(150, 2)
        );
        let err = catalog.price_of("Calzone").await.unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(name) if name == "Calzone"));
    }

    #[tokio::test]
    async fn test_browse_below_is_exclusive() {
        let backend = MemoryBackend::with_demo_data();
        let items = Catalog::new(&backend)
            .browse(&MenuQuery::Below(Price::from_cents(200).unwrap()))
            .await
            .unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Cola"]);
    }

    #[tokio::test]
    async fn test_search_normalizes_category() {
        let backend = MemoryBackend::with_demo_data();
        let items = Catalog::new(&backend)
            .search(&ItemFilter::new(" DRINKS ", None))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_add_item_duplicate() {
        let backend = MemoryBackend::new();
        let catalog = Catalog::new(&backend);
        catalog.add_item(item("Calzone", 900, "entree")).await.unwrap();

        let err = catalog.add_item(item(" Calzone ", 950, "entree")).await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateItem(name) if name == "Calzone"));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing() {
        let backend = MemoryBackend::new();
        let catalog = Catalog::new(&backend);

        assert!(catalog.upsert_item(item("Calzone", 900, "entree")).await.unwrap());
        assert!(!catalog.upsert_item(item("Calzone", 1000, "specials")).await.unwrap());

        let stored = catalog.item("Calzone").await.unwrap();
        assert_eq!(stored.price, Price::from_cents(1000).unwrap());
        assert_eq!(stored.type_of_item, "specials");
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let backend = MemoryBackend::new();
        let catalog = Catalog::new(&backend);

        let err = catalog
            .update_field("Calzone", ItemField::Description("folded".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(_)));
        assert!(matches!(
            catalog.update_item("Calzone", &[]).await,
            Err(CoreError::ItemNotFound(_))
        ));
    }
}
