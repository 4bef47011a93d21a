//! The ordering and account properties against a real `PostgreSQL`.
//!
//! Every scenario shares one database, so they run in sequence inside a
//! single test. Set `TEST_DATABASE_URL` and pass `--include-ignored`.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;

use crustline_backend::db::OrderStore;
use crustline_backend::models::{Item, ItemField, OrderScope, UserField};
use crustline_backend::{AccountDirectory, Catalog, CoreError, OrderLedger, PgBackend, Session};
use crustline_core::{Login, OrderId, OrderStatus, Price, Role, StoreId};
use crustline_integration_tests::fresh_postgres;

fn login(s: &str) -> Login {
    Login::parse(s).unwrap()
}

fn item(name: &str, cents: i64, kind: &str) -> Item {
    Item {
        name: name.to_owned(),
        price: Price::from_cents(cents).unwrap(),
        ingredients: String::new(),
        type_of_item: kind.to_owned(),
        description: String::new(),
    }
}

async fn customer(backend: &PgBackend, name: &str) -> Session {
    let accounts = AccountDirectory::new(backend);
    let who = accounts.register(name, "pw", "555-0000").await.unwrap();
    let mut session = Session::anonymous();
    session.log_in(who, Role::Customer);
    session
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_backend() {
    let Some(backend) = fresh_postgres().await else {
        return;
    };
    let catalog = Catalog::new(&backend);
    for (name, cents, kind) in [
        ("Cola", 150, "drinks"),
        ("Garlic Knots", 450, "sides"),
        ("Lemonade", 200, "drinks"),
    ] {
        catalog.add_item(item(name, cents, kind)).await.unwrap();
    }

    let alice = customer(&backend, "alice").await;
    placement_totals_and_no_repricing(&backend, &alice).await;
    unknown_store_and_item(&backend, &alice).await;
    concurrent_reservations_are_distinct(&backend).await;
    duplicate_login_is_rejected(&backend).await;
    rename_moves_orders(&backend).await;
    conflicting_rename_changes_nothing(&backend).await;
}

async fn placement_totals_and_no_repricing(backend: &PgBackend, session: &Session) {
    let ledger = OrderLedger::new(backend);
    let mut draft = ledger.begin_order(session, StoreId::new(1)).await.unwrap();
    ledger.add_line(&mut draft, "Cola", 3).await.unwrap();
    ledger.add_line(&mut draft, "Garlic Knots", 1).await.unwrap();
    let placed = ledger.commit_order(draft).await.unwrap();
    assert_eq!(placed.total, Decimal::new(900, 2));

    Catalog::new(backend)
        .update_field("Cola", ItemField::Price(Price::from_cents(500).unwrap()))
        .await
        .unwrap();

    let stored = backend.get_order(placed.order_id).await.unwrap().unwrap();
    assert_eq!(stored.total_price, Decimal::new(900, 2));
    assert_eq!(stored.status, OrderStatus::Incomplete);

    let lines = backend.get_lines(placed.order_id).await.unwrap();
    let names: Vec<&str> = lines.iter().map(|l| l.item_name.as_str()).collect();
    assert_eq!(names, ["Cola", "Garlic Knots"]);

    // Adding the same item twice accumulates on one line.
    let mut draft = ledger.begin_order(session, StoreId::new(2)).await.unwrap();
    ledger.add_line(&mut draft, "Lemonade", 1).await.unwrap();
    ledger.add_line(&mut draft, "Lemonade", 2).await.unwrap();
    let placed = ledger.commit_order(draft).await.unwrap();
    let lines = backend.get_lines(placed.order_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity.get(), 3);
    assert_eq!(placed.total, Decimal::new(600, 2));

    ledger
        .update_status(Role::Driver, placed.order_id, OrderStatus::Complete)
        .await
        .unwrap();
    let stored = backend.get_order(placed.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Complete);
}

async fn unknown_store_and_item(backend: &PgBackend, session: &Session) {
    let ledger = OrderLedger::new(backend);

    let err = ledger.begin_order(session, StoreId::new(99)).await.unwrap_err();
    assert!(matches!(err, CoreError::StoreNotFound(id) if id == StoreId::new(99)));

    let mut draft = ledger.begin_order(session, StoreId::new(1)).await.unwrap();
    let err = ledger.add_line(&mut draft, "Anchovy Surprise", 1).await.unwrap_err();
    assert!(matches!(err, CoreError::ItemNotFound(_)));
    assert!(draft.lines().is_empty());

    let err = ledger
        .update_status(Role::Manager, OrderId::new(-1), OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::OrderNotFound(_)));
}

async fn concurrent_reservations_are_distinct(backend: &PgBackend) {
    let backend = Arc::new(backend.clone());
    let session = customer(&backend, "rushhour").await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let backend = Arc::clone(&backend);
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            let ledger = OrderLedger::new(&*backend);
            let draft = ledger.begin_order(&session, StoreId::new(1)).await.unwrap();
            ledger.commit_order(draft).await.unwrap().order_id
        }));
    }

    let mut ids = BTreeSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 16);
}

async fn duplicate_login_is_rejected(backend: &PgBackend) {
    let accounts = AccountDirectory::new(backend);
    let err = accounts.register("alice", "other", "").await.unwrap_err();
    assert!(matches!(err, CoreError::DuplicateLogin(_)));

    // The original password still works.
    let (_, role) = accounts.authenticate("alice", "pw").await.unwrap();
    assert_eq!(role, Role::Customer);
}

async fn rename_moves_orders(backend: &PgBackend) {
    let session = customer(backend, "bob").await;
    let ledger = OrderLedger::new(backend);
    for _ in 0..2 {
        ledger.place_order(&session, StoreId::new(1), &[]).await.unwrap();
    }

    AccountDirectory::new(backend)
        .update_any(
            &login("bob"),
            &[UserField::Login(login("robert")), UserField::Role(Role::Driver)],
        )
        .await
        .unwrap();

    let moved = backend
        .list_orders(&OrderScope::Owner(login("robert")), None)
        .await
        .unwrap();
    let left = backend
        .list_orders(&OrderScope::Owner(login("bob")), None)
        .await
        .unwrap();
    assert_eq!(moved.len(), 2);
    assert!(left.is_empty());

    let (_, role) = AccountDirectory::new(backend)
        .authenticate("robert", "pw")
        .await
        .unwrap();
    assert_eq!(role, Role::Driver);
}

async fn conflicting_rename_changes_nothing(backend: &PgBackend) {
    let accounts = AccountDirectory::new(backend);
    let before = accounts.profile(&login("robert")).await.unwrap();

    let err = accounts
        .update_any(
            &login("robert"),
            &[
                UserField::Phone("555-9999".to_owned()),
                UserField::Login(login("alice")),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateLogin(_)));

    let after = accounts.profile(&login("robert")).await.unwrap();
    assert_eq!(before, after);
    let orders = backend
        .list_orders(&OrderScope::Owner(login("robert")), None)
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
}
