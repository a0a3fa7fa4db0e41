//! Concurrent mutation against a file database with a multi-connection pool.

mod common;

use folio_core::{CoreError, LineRequest, LocationKind, OrderStatus, PageRequest, StockKey};
use folio_db::DbError;

fn count_outcomes<T>(results: Vec<Result<T, DbError>>) -> (usize, usize) {
    let mut ok = 0;
    let mut insufficient = 0;
    for result in results {
        match result {
            Ok(_) => ok += 1,
            Err(err) => {
                assert!(
                    matches!(err.domain(), Some(CoreError::InsufficientStock { .. })),
                    "unexpected error: {err}"
                );
                insufficient += 1;
            }
        }
    }
    (ok, insufficient)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decreases_never_oversell() {
    let (_dir, db) = common::file_db(8).await;
    let key = StockKey::store("s1", "dune");
    db.stock().increase(&key, 3).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..12 {
        let ledger = db.stock();
        let key = key.clone();
        handles.push(tokio::spawn(async move { ledger.decrease(&key, 1).await }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let (ok, insufficient) = count_outcomes(results);
    assert_eq!(ok, 3);
    assert_eq!(insufficient, 9);
    assert_eq!(db.stock().read(&key).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_increases_share_one_row() {
    let (_dir, db) = common::file_db(8).await;
    let key = StockKey::warehouse("w1", "dune");

    let mut handles = Vec::new();
    for n in 1..=10 {
        let ledger = db.stock();
        let key = key.clone();
        handles.push(tokio::spawn(async move { ledger.increase(&key, n).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(db.stock().read(&key).await.unwrap(), 55);
    let page = db
        .stock()
        .page(LocationKind::Warehouse, "w1", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let journal = db.stock().movements(&key, PageRequest::default()).await.unwrap();
    assert_eq!(journal.total, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_traffic_stays_non_negative() {
    let (_dir, db) = common::file_db(8).await;
    let key = StockKey::store("s1", "dune");
    db.stock().increase(&key, 5).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let ledger = db.stock();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            if i % 4 == 0 {
                ledger.increase(&key, 1).await
            } else {
                ledger.decrease(&key, 1).await
            }
        }));
    }

    let mut decreased = 0;
    for (i, handle) in handles.into_iter().enumerate() {
        if handle.await.unwrap().is_ok() && i % 4 != 0 {
            decreased += 1;
        }
    }

    let remaining = db.stock().read(&key).await.unwrap();
    assert!(remaining >= 0);
    assert_eq!(remaining, 5 + 5 - decreased);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_compete_for_last_copies() {
    let (_dir, db) = common::file_db(8).await;
    let book = common::book(&db, "Dune", 1250).await;
    let key = StockKey::store("s1", &book.id);
    db.stock().increase(&key, 2).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let sales = db.sales();
        let book_id = book.id.clone();
        handles.push(tokio::spawn(async move {
            sales.process_sale("s1", &[LineRequest::new(book_id, 1)]).await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let (ok, _) = count_outcomes(results);
    assert_eq!(ok, 2);
    assert_eq!(db.stock().read(&key).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancels_return_stock_once() {
    let (_dir, db) = common::file_db(8).await;
    let book = common::book(&db, "Dune", 1250).await;
    let key = StockKey::warehouse("w1", &book.id);
    db.stock().increase(&key, 5).await.unwrap();

    let order = db
        .orders()
        .create("w1", &[LineRequest::new(&book.id, 5)])
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..6 {
        let orders = db.orders();
        let id = order.id.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                orders.cancel(&id).await
            } else {
                orders.complete(&id).await
            }
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => winners.push(order.status),
            Err(err) => assert!(matches!(
                err.domain(),
                Some(CoreError::InvalidOrderTransition { .. })
            )),
        }
    }

    assert_eq!(winners.len(), 1);
    let expected_stock = match winners[0] {
        OrderStatus::Canceled => 5,
        _ => 0,
    };
    assert_eq!(db.stock().read(&key).await.unwrap(), expected_stock);
    assert_eq!(db.orders().get(&order.id).await.unwrap().status, winners[0]);
}
