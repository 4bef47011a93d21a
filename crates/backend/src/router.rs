//! Role-gated command dispatch.
//!
//! [`is_allowed`] is the whole access policy: a `match` over every
//! (role, action) pair, so adding an action or role without deciding its
//! outcome does not compile. [`CommandRouter::dispatch`] re-reads the
//! user's role from the account directory before every action, so a
//! demotion takes effect on the next command rather than the next log-in.

use std::fmt;

use crustline_core::{Login, OrderId, OrderStatus, Role, StoreId};

use crate::db::Backend;
use crate::error::{CoreError, Result};
use crate::models::user::renamed_to;
use crate::models::{Item, ItemField, Order, OrderDetail, ProfileField, Store, User, UserField};
use crate::services::{
    AccountDirectory, Catalog, MenuQuery, OrderLedger, PlacedOrder, RECENT_ORDER_LIMIT,
};
use crate::session::{Identity, Session};

/// Menu number that ends a session.
pub const LOG_OUT_CHOICE: u32 = 20;

/// Everything a logged-in user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewProfile,
    UpdateProfile,
    ViewMenu,
    PlaceOrder,
    ViewOrderHistory,
    ViewRecentOrders,
    ViewOrderInfo,
    ViewStores,
    UpdateOrderStatus,
    UpdateMenu,
    UpdateUser,
}

impl Action {
    /// Every action, in menu order.
    pub const ALL: [Self; 11] = [
        Self::ViewProfile,
        Self::UpdateProfile,
        Self::ViewMenu,
        Self::PlaceOrder,
        Self::ViewOrderHistory,
        Self::ViewRecentOrders,
        Self::ViewOrderInfo,
        Self::ViewStores,
        Self::UpdateOrderStatus,
        Self::UpdateMenu,
        Self::UpdateUser,
    ];

    /// The number typed at the main menu.
    #[must_use]
    pub const fn menu_number(self) -> u32 {
        match self {
            Self::ViewProfile => 1,
            Self::UpdateProfile => 2,
            Self::ViewMenu => 3,
            Self::PlaceOrder => 4,
            Self::ViewOrderHistory => 5,
            Self::ViewRecentOrders => 6,
            Self::ViewOrderInfo => 7,
            Self::ViewStores => 8,
            Self::UpdateOrderStatus => 9,
            Self::UpdateMenu => 10,
            Self::UpdateUser => 11,
        }
    }

    /// The action behind a menu number.
    #[must_use]
    pub fn from_menu_number(n: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.menu_number() == n)
    }

    /// Main-menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewProfile => "View Profile",
            Self::UpdateProfile => "Update Profile",
            Self::ViewMenu => "View Menu",
            Self::PlaceOrder => "Place Order",
            Self::ViewOrderHistory => "View Full Order ID History",
            Self::ViewRecentOrders => "View Past 5 Order IDs",
            Self::ViewOrderInfo => "View Order Information",
            Self::ViewStores => "View Stores",
            Self::UpdateOrderStatus => "Update Order Status",
            Self::UpdateMenu => "Update Menu",
            Self::UpdateUser => "Update User",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ViewProfile => "view their profile",
            Self::UpdateProfile => "update their profile",
            Self::ViewMenu => "view the menu",
            Self::PlaceOrder => "place an order",
            Self::ViewOrderHistory => "view order history",
            Self::ViewRecentOrders => "view recent orders",
            Self::ViewOrderInfo => "view order information",
            Self::ViewStores => "view stores",
            Self::UpdateOrderStatus => "update order status",
            Self::UpdateMenu => "update the menu",
            Self::UpdateUser => "update users",
        })
    }
}

/// Whether `role` may perform `action`.
#[must_use]
pub const fn is_allowed(role: Role, action: Action) -> bool {
    use Action::{
        PlaceOrder, UpdateMenu, UpdateOrderStatus, UpdateProfile, UpdateUser, ViewMenu,
        ViewOrderHistory, ViewOrderInfo, ViewProfile, ViewRecentOrders, ViewStores,
    };

    match (role, action) {
        (
            Role::Customer | Role::Driver | Role::Manager,
            ViewProfile | UpdateProfile | ViewMenu | PlaceOrder | ViewOrderHistory
            | ViewRecentOrders | ViewOrderInfo | ViewStores,
        )
        | (Role::Driver | Role::Manager, UpdateOrderStatus)
        | (Role::Manager, UpdateMenu | UpdateUser) => true,
        (Role::Customer, UpdateOrderStatus | UpdateMenu | UpdateUser)
        | (Role::Driver, UpdateMenu | UpdateUser) => false,
    }
}

/// The actions a role sees on its menu, in menu order.
#[must_use]
pub fn available_actions(role: Role) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|action| is_allowed(role, *action))
        .collect()
}

/// A catalog write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChange {
    Add(Item),
    Update { name: String, changes: Vec<ItemField> },
}

/// A fully parsed command from the presentation layer.
#[derive(Debug, Clone)]
pub enum Request {
    ViewProfile,
    UpdateProfile(Vec<ProfileField>),
    ViewMenu(MenuQuery),
    PlaceOrder {
        store_id: StoreId,
        lines: Vec<(String, i32)>,
    },
    ViewOrderHistory,
    ViewRecentOrders,
    ViewOrderInfo(OrderId),
    ViewStores,
    UpdateOrderStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
    UpdateMenu(MenuChange),
    UpdateUser {
        login: Login,
        changes: Vec<UserField>,
    },
}

impl Request {
    /// The action this request needs permission for.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::ViewProfile => Action::ViewProfile,
            Self::UpdateProfile(_) => Action::UpdateProfile,
            Self::ViewMenu(_) => Action::ViewMenu,
            Self::PlaceOrder { .. } => Action::PlaceOrder,
            Self::ViewOrderHistory => Action::ViewOrderHistory,
            Self::ViewRecentOrders => Action::ViewRecentOrders,
            Self::ViewOrderInfo(_) => Action::ViewOrderInfo,
            Self::ViewStores => Action::ViewStores,
            Self::UpdateOrderStatus { .. } => Action::UpdateOrderStatus,
            Self::UpdateMenu(_) => Action::UpdateMenu,
            Self::UpdateUser { .. } => Action::UpdateUser,
        }
    }
}

/// What a dispatched request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Profile(User),
    Items(Vec<Item>),
    Placed(PlacedOrder),
    Orders(Vec<Order>),
    OrderDetail(OrderDetail),
    Stores(Vec<Store>),
    /// A write succeeded.
    Done,
}

/// Routes requests from one session to the services.
pub struct CommandRouter<'a> {
    backend: &'a dyn Backend,
}

impl<'a> CommandRouter<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Authenticate and bind the session to the user.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCredentials` on any mismatch; the session
    /// is left as it was.
    pub async fn log_in(
        &self,
        session: &mut Session,
        login: &str,
        password: &str,
    ) -> Result<Role> {
        let (login, role) = AccountDirectory::new(self.backend)
            .authenticate(login, password)
            .await?;
        session.log_in(login, role);
        Ok(role)
    }

    /// Check that the session's user may perform `action`, using the role
    /// currently on record.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unauthenticated` if nobody is logged in or the
    /// account no longer exists (the session is logged out), and
    /// `CoreError::Forbidden` if the role lacks the action.
    pub async fn authorize(&self, session: &mut Session, action: Action) -> Result<Identity> {
        let login = session.login()?.clone();
        let Some(role) = AccountDirectory::new(self.backend)
            .current_role(&login)
            .await?
        else {
            tracing::warn!(login = %login, "Account vanished; ending session");
            session.log_out();
            return Err(CoreError::Unauthenticated);
        };

        if session.role()? != role {
            tracing::info!(login = %login, role = %role, "Role changed since log-in");
            session.refresh_role(role);
        }

        if !is_allowed(role, action) {
            tracing::warn!(login = %login, role = %role, action = %action, "Forbidden action");
            return Err(CoreError::Forbidden { role, action });
        }
        Ok(Identity { login, role })
    }

    /// Authorize and run one request.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::authorize`] or of the service handling the
    /// request.
    pub async fn dispatch(&self, session: &mut Session, request: Request) -> Result<Response> {
        let identity = self.authorize(session, request.action()).await?;
        let accounts = AccountDirectory::new(self.backend);
        let catalog = Catalog::new(self.backend);
        let ledger = OrderLedger::new(self.backend);

        let response = match request {
            Request::ViewProfile => Response::Profile(accounts.profile(&identity.login).await?),
            Request::UpdateProfile(changes) => {
                accounts.update_self(&identity.login, changes).await?;
                Response::Done
            }
            Request::ViewMenu(query) => Response::Items(catalog.browse(&query).await?),
            Request::PlaceOrder { store_id, lines } => {
                Response::Placed(ledger.place_order(session, store_id, &lines).await?)
            }
            Request::ViewOrderHistory => {
                Response::Orders(ledger.list_orders_for_user(&identity).await?)
            }
            Request::ViewRecentOrders => Response::Orders(
                ledger
                    .list_recent_orders(&identity, RECENT_ORDER_LIMIT)
                    .await?,
            ),
            Request::ViewOrderInfo(order_id) => {
                Response::OrderDetail(ledger.get_order_detail(&identity, order_id).await?)
            }
            Request::ViewStores => Response::Stores(catalog.stores().await?),
            Request::UpdateOrderStatus { order_id, status } => {
                ledger.update_status(identity.role, order_id, status).await?;
                Response::Done
            }
            Request::UpdateMenu(MenuChange::Add(item)) => {
                catalog.add_item(item).await?;
                Response::Done
            }
            Request::UpdateMenu(MenuChange::Update { name, changes }) => {
                catalog.update_item(&name, &changes).await?;
                Response::Done
            }
            Request::UpdateUser { login, changes } => {
                accounts.update_any(&login, &changes).await?;
                if login == identity.login
                    && let Some(new) = renamed_to(&changes)
                {
                    session.rename(new.clone());
                }
                Response::Done
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;

    #[test]
    fn test_menu_numbers_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_menu_number(action.menu_number()), Some(action));
        }
        assert_eq!(Action::from_menu_number(LOG_OUT_CHOICE), None);
        assert_eq!(Action::from_menu_number(0), None);
    }

    #[test]
    fn test_available_actions_per_role() {
        assert_eq!(available_actions(Role::Customer).len(), 8);
        assert_eq!(available_actions(Role::Driver).len(), 9);
        assert_eq!(available_actions(Role::Manager), Action::ALL.to_vec());
        assert!(!available_actions(Role::Driver).contains(&Action::UpdateMenu));
    }

    #[tokio::test]
    async fn test_dispatch_requires_login() {
        let backend = MemoryBackend::with_demo_data();
        let mut session = Session::anonymous();
        let err = CommandRouter::new(&backend)
            .dispatch(&mut session, Request::ViewStores)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_demotion_applies_on_next_dispatch() {
        let backend = MemoryBackend::with_demo_data();
        let router = CommandRouter::new(&backend);
        let dave = Login::parse("dave").unwrap();
        backend.add_user(dave.clone(), "pw", Role::Driver);

        let mut session = Session::anonymous();
        router.log_in(&mut session, "dave", "pw").await.unwrap();
        router
            .authorize(&mut session, Action::UpdateOrderStatus)
            .await
            .unwrap();

        backend.add_user(dave, "pw", Role::Customer);
        let err = router
            .authorize(&mut session, Action::UpdateOrderStatus)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { role: Role::Customer, .. }));
        assert_eq!(session.role().unwrap(), Role::Customer);
    }

    #[tokio::test]
    async fn test_vanished_account_logs_out() {
        let backend = MemoryBackend::with_demo_data();
        let router = CommandRouter::new(&backend);
        let mut session = Session::anonymous();
        session.log_in(Login::parse("ghost").unwrap(), Role::Manager);

        let err = router
            .dispatch(&mut session, Request::ViewProfile)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_self_rename_follows_session() {
        let backend = MemoryBackend::with_demo_data();
        let router = CommandRouter::new(&backend);
        let mut session = Session::anonymous();
        router.log_in(&mut session, "manager", "manager").await.unwrap();

        let boss = Login::parse("boss").unwrap();
        router
            .dispatch(
                &mut session,
                Request::UpdateUser {
                    login: Login::parse("manager").unwrap(),
                    changes: vec![UserField::Login(boss.clone())],
                },
            )
            .await
            .unwrap();
        assert_eq!(session.login().unwrap(), &boss);

        let response = router.dispatch(&mut session, Request::ViewProfile).await.unwrap();
        assert!(matches!(response, Response::Profile(user) if user.login == boss));
    }
}
