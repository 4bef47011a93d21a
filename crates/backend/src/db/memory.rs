//! In-process backing store.
//!
//! Every table lives behind one mutex. Each trait method takes the lock
//! once, does all of its reads and writes, and releases it before
//! returning, so every operation is atomic with respect to the others and
//! the lock is never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crustline_core::{Login, OrderId, OrderStatus, Password, Price, Quantity, Role, StoreId};

use super::{CatalogStore, OrderStore, RepositoryError, StoreDirectory, UserStore};
use crate::models::user::renamed_to;
use crate::models::{
    Item, ItemField, ItemFilter, NewOrder, NewUser, Order, OrderLine, OrderScope, SortKey, Store,
    User, UserField,
};

struct UserRecord {
    user: User,
    password: String,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<Login, UserRecord>,
    items: BTreeMap<String, Item>,
    stores: BTreeMap<StoreId, Store>,
    orders: BTreeMap<OrderId, Order>,
    lines: BTreeMap<(OrderId, String), Quantity>,
    last_order_id: i32,
}

/// A backing store held entirely in memory.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with three locations, a small menu, and a
    /// `manager`/`manager` account for trying the terminal out.
    #[must_use]
    pub fn with_demo_data() -> Self {
        let backend = Self::new();
        for (id, address, city) in [
            (1, "100 University Ave", "Riverside"),
            (2, "2500 Main St", "Irvine"),
            (3, "77 Ocean Blvd", "Long Beach"),
        ] {
            backend.add_store(Store {
                id: StoreId::new(id),
                address: address.to_owned(),
                city: city.to_owned(),
                state: "CA".to_owned(),
            });
        }
        for (name, cents, kind, ingredients) in [
            ("Pepperoni Slice", 350, "entree", "dough, tomato, mozzarella, pepperoni"),
            ("Cheese Slice", 300, "entree", "dough, tomato, mozzarella"),
            ("Garlic Knots", 450, "sides", "dough, garlic, butter"),
            ("Caesar Salad", 600, "sides", "romaine, parmesan, croutons"),
            ("Cola", 150, "drinks", "carbonated water, sugar"),
            ("Lemonade", 200, "drinks", "lemon, water, sugar"),
        ] {
            backend.add_item(Item {
                name: name.to_owned(),
                price: Price::from_cents(cents).unwrap_or(Price::ZERO),
                ingredients: ingredients.to_owned(),
                type_of_item: kind.to_owned(),
                description: String::new(),
            });
        }
        if let Ok(login) = Login::parse("manager") {
            backend.add_user(login, "manager", Role::Manager);
        }
        backend
    }

    /// Insert or replace a store location.
    pub fn add_store(&self, store: Store) {
        self.tables().stores.insert(store.id, store);
    }

    /// Insert or replace a menu item.
    pub fn add_item(&self, item: Item) {
        self.tables().items.insert(item.name.clone(), item);
    }

    /// Insert or replace an account with an explicit role.
    pub fn add_user(&self, login: Login, password: &str, role: Role) {
        let user = User {
            login: login.clone(),
            phone_num: String::new(),
            role,
            favorite_items: String::new(),
        };
        self.tables().users.insert(
            login,
            UserRecord {
                user,
                password: password.to_owned(),
            },
        );
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn insert_user(&self, user: &NewUser) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if tables.users.contains_key(&user.login) {
            return Err(RepositoryError::Conflict("login already exists".to_owned()));
        }
        tables.users.insert(
            user.login.clone(),
            UserRecord {
                user: User {
                    login: user.login.clone(),
                    phone_num: user.phone_num.clone(),
                    role: user.role,
                    favorite_items: String::new(),
                },
                password: user.password.expose().to_owned(),
            },
        );
        Ok(())
    }

    async fn find_role(
        &self,
        login: &Login,
        password: &Password,
    ) -> Result<Option<Role>, RepositoryError> {
        Ok(self
            .tables()
            .users
            .get(login)
            .filter(|record| password.matches(&record.password))
            .map(|record| record.user.role))
    }

    async fn get_user(&self, login: &Login) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables().users.get(login).map(|r| r.user.clone()))
    }

    async fn update_user(
        &self,
        login: &Login,
        changes: &[UserField],
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if !tables.users.contains_key(login) {
            return Err(RepositoryError::NotFound);
        }
        let rename = renamed_to(changes).filter(|new| *new != login);
        if let Some(new_login) = rename
            && tables.users.contains_key(new_login)
        {
            return Err(RepositoryError::Conflict("login already exists".to_owned()));
        }

        // Validated: nothing below can fail.
        let Some(mut record) = tables.users.remove(login) else {
            return Err(RepositoryError::NotFound);
        };
        for change in changes {
            match change {
                UserField::Login(_) => {}
                UserField::Password(password) => password.expose().clone_into(&mut record.password),
                UserField::Role(role) => record.user.role = *role,
                UserField::FavoriteItems(items) => record.user.favorite_items.clone_from(items),
                UserField::Phone(phone) => record.user.phone_num.clone_from(phone),
            }
        }
        let key = match rename {
            Some(new_login) => {
                for order in tables.orders.values_mut() {
                    if &order.login == login {
                        order.login = new_login.clone();
                    }
                }
                record.user.login = new_login.clone();
                new_login.clone()
            }
            None => login.clone(),
        };
        tables.users.insert(key, record);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryBackend {
    async fn list_items(&self, sort: SortKey) -> Result<Vec<Item>, RepositoryError> {
        let mut items: Vec<Item> = self.tables().items.values().cloned().collect();
        match sort {
            SortKey::None => {}
            SortKey::PriceAsc => items.sort_by(|a, b| a.price.cmp(&b.price)),
            SortKey::PriceDesc => items.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        Ok(items)
    }

    async fn search_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, RepositoryError> {
        Ok(self
            .tables()
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn get_item(&self, name: &str) -> Result<Option<Item>, RepositoryError> {
        Ok(self.tables().items.get(name.trim()).cloned())
    }

    async fn insert_item(&self, item: &Item) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if tables.items.contains_key(&item.name) {
            return Err(RepositoryError::Conflict("item already exists".to_owned()));
        }
        tables.items.insert(item.name.clone(), item.clone());
        Ok(())
    }

    async fn update_item(&self, name: &str, changes: &[ItemField]) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let item = tables
            .items
            .get_mut(name.trim())
            .ok_or(RepositoryError::NotFound)?;
        for change in changes {
            match change {
                ItemField::Price(price) => item.price = *price,
                ItemField::Ingredients(v) => item.ingredients.clone_from(v),
                ItemField::TypeOfItem(v) => item.type_of_item.clone_from(v),
                ItemField::Description(v) => item.description.clone_from(v),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StoreDirectory for MemoryBackend {
    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        Ok(self.tables().stores.values().cloned().collect())
    }

    async fn store_exists(&self, id: StoreId) -> Result<bool, RepositoryError> {
        Ok(self.tables().stores.contains_key(&id))
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn reserve_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tables = self.tables();
        if !tables.stores.contains_key(&order.store_id) || !tables.users.contains_key(&order.login)
        {
            return Err(RepositoryError::NotFound);
        }
        let next = tables
            .last_order_id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::DataCorruption("order ID space exhausted".to_owned()))?;
        tables.last_order_id = next;
        let id = OrderId::new(next);
        tables.orders.insert(
            id,
            Order {
                id,
                login: order.login.clone(),
                store_id: order.store_id,
                total_price: Decimal::ZERO,
                ordered_at: order.ordered_at,
                status: OrderStatus::Incomplete,
            },
        );
        Ok(id)
    }

    async fn insert_line(
        &self,
        order_id: OrderId,
        item_name: &str,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if !tables.orders.contains_key(&order_id) || !tables.items.contains_key(item_name) {
            return Err(RepositoryError::NotFound);
        }
        let key = (order_id, item_name.to_owned());
        let combined = match tables.lines.get(&key) {
            Some(existing) => existing
                .get()
                .checked_add(quantity.get())
                .and_then(|n| Quantity::new(n).ok())
                .ok_or_else(|| RepositoryError::Conflict("quantity overflow".to_owned()))?,
            None => quantity,
        };
        tables.lines.insert(key, combined);
        Ok(())
    }

    async fn set_total(&self, order_id: OrderId, total: Decimal) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.total_price = total;
        Ok(())
    }

    async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        Ok(())
    }

    async fn list_orders(
        &self,
        scope: &OrderScope,
        limit: Option<i64>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .tables()
            .orders
            .values()
            .filter(|order| scope.includes(order))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.ordered_at
                .cmp(&a.ordered_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = limit {
            orders.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(orders)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables().orders.get(&order_id).cloned())
    }

    async fn get_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self
            .tables()
            .lines
            .iter()
            .filter(|((id, _), _)| *id == order_id)
            .map(|((id, name), quantity)| OrderLine {
                order_id: *id,
                item_name: name.clone(),
                quantity: *quantity,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn login(s: &str) -> Login {
        Login::parse(s).unwrap()
    }

    fn new_order(who: &str) -> NewOrder {
        NewOrder {
            login: login(who),
            store_id: StoreId::new(1),
            ordered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reserve_order_assigns_increasing_ids() {
        let backend = MemoryBackend::with_demo_data();
        let a = backend.reserve_order(&new_order("manager")).await.unwrap();
        let b = backend.reserve_order(&new_order("manager")).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_reserve_order_unknown_store() {
        let backend = MemoryBackend::with_demo_data();
        let mut order = new_order("manager");
        order.store_id = StoreId::new(99);
        assert!(matches!(
            backend.reserve_order(&order).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_insert_line_accumulates_quantity() {
        let backend = MemoryBackend::with_demo_data();
        let id = backend.reserve_order(&new_order("manager")).await.unwrap();
        backend
            .insert_line(id, "Cola", Quantity::new(1).unwrap())
            .await
            .unwrap();
        backend
            .insert_line(id, "Cola", Quantity::new(2).unwrap())
            .await
            .unwrap();
        let lines = backend.get_lines(id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity.get(), 3);
    }

    #[tokio::test]
    async fn test_update_user_conflict_changes_nothing() {
        let backend = MemoryBackend::with_demo_data();
        backend.add_user(login("alice"), "pw1", Role::Customer);
        backend.add_user(login("bob"), "pw2", Role::Customer);

        let result = backend
            .update_user(
                &login("alice"),
                &[
                    UserField::Phone("555-0000".to_owned()),
                    UserField::Login(login("bob")),
                ],
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let alice = backend.get_user(&login("alice")).await.unwrap().unwrap();
        assert_eq!(alice.phone_num, "");
    }

    #[tokio::test]
    async fn test_list_items_sorted_by_price() {
        let backend = MemoryBackend::with_demo_data();
        let items = backend.list_items(SortKey::PriceDesc).await.unwrap();
        assert!(items.windows(2).all(|w| w[0].price >= w[1].price));
    }

    #[tokio::test]
    async fn test_list_orders_limit() {
        let backend = MemoryBackend::with_demo_data();
        for _ in 0..7 {
            backend.reserve_order(&new_order("manager")).await.unwrap();
        }
        let orders = backend.list_orders(&OrderScope::All, Some(5)).await.unwrap();
        assert_eq!(orders.len(), 5);
        assert_eq!(orders[0].id, OrderId::new(7));
    }
}
