use catalog_core::{
    in_transaction, Category, CategoryRepository, CategoryService, EntityKind, Product,
    ProductFilter, ProductService, Store, StoreError, StoreOptions,
};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn services() -> (Arc<Store>, CategoryService, ProductService) {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let categories = CategoryService::new(Arc::clone(&store));
    let products = ProductService::new(Arc::clone(&store));
    (store, categories, products)
}

#[test]
fn hammer_lifecycle_end_to_end() {
    let (_store, categories, products) = services();

    let tools = categories.create(&Category::new("Tools")).unwrap();
    assert_eq!(tools, 1);

    let hammer_id = products
        .create(&Product::new("Hammer", tools, 9.99).with_description(""))
        .unwrap();
    assert_eq!(hammer_id, 1);

    let loaded = products.get(hammer_id).unwrap().unwrap();
    assert_eq!(
        loaded,
        Product {
            id: 1,
            name: "Hammer".to_string(),
            description: String::new(),
            category: 1,
            price: 9.99,
        }
    );

    let repriced = Product {
        price: 12.5,
        ..loaded
    };
    products.update(&repriced).unwrap();
    assert_eq!(products.get(hammer_id).unwrap().unwrap().price, 12.5);

    products.delete(hammer_id).unwrap();
    assert!(products.get(hammer_id).unwrap().is_none());

    let err = products.delete(hammer_id).unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: EntityKind::Product,
            id: 1
        }
    ));
}

#[test]
fn category_service_crud() {
    let (_store, categories, _products) = services();

    let id = categories.create(&Category::new("Garden")).unwrap();
    assert_eq!(categories.list().unwrap().len(), 1);

    categories
        .update(&Category {
            id,
            name: "Outdoor".to_string(),
        })
        .unwrap();
    assert_eq!(categories.get(id).unwrap().unwrap().name, "Outdoor");

    categories.delete(id).unwrap();
    assert!(categories.get(id).unwrap().is_none());
    assert!(categories.list().unwrap().is_empty());
}

#[test]
fn service_mutations_on_missing_ids_return_not_found() {
    let (_store, categories, products) = services();

    let err = categories
        .update(&Category {
            id: 5,
            name: "ghost".to_string(),
        })
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(categories.delete(5).unwrap_err().is_not_found());

    let mut ghost = Product::new("Ghost", 1, 1.0);
    ghost.id = 5;
    assert!(products.update(&ghost).unwrap_err().is_not_found());
    assert!(products.delete(5).unwrap_err().is_not_found());

    assert!(categories.list().unwrap().is_empty());
}

#[test]
fn list_by_category_matches_filter() {
    let (_store, _categories, products) = services();

    let a = products.create(&Product::new("Alpha", 1, 1.0)).unwrap();
    let b = products.create(&Product::new("Bravo", 2, 2.0)).unwrap();
    let c = products.create(&Product::new("Charlie", 1, 3.0)).unwrap();

    let in_one: Vec<_> = products
        .list_by_category(1)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(in_one, [a, c]);

    let all: Vec<_> = products
        .list(&ProductFilter::default())
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(all, [a, b, c]);
}

#[test]
fn failed_unit_of_work_is_rolled_back_as_a_whole() {
    let (store, categories, _products) = services();

    let err = in_transaction(&store, |scope| {
        store.create_category(scope, &Category::new("Partial"))?;
        store.delete_category(scope, 1_000)
    })
    .unwrap_err();
    assert!(err.is_not_found());

    assert!(categories.list().unwrap().is_empty());
}

#[test]
fn successful_unit_of_work_commits_every_statement() {
    let (store, categories, _products) = services();

    let (first, second) = in_transaction(&store, |scope| {
        let first = store.create_category(scope, &Category::new("One"))?;
        let second = store.create_category(scope, &Category::new("Two"))?;
        Ok((first, second))
    })
    .unwrap();

    assert_eq!(categories.get(first).unwrap().unwrap().name, "One");
    assert_eq!(categories.get(second).unwrap().unwrap().name, "Two");
}

#[test]
fn concurrent_creates_get_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(dir.path().join("concurrent.db")).unwrap());
    let products = ProductService::new(Arc::clone(&store));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let products = products.clone();
            thread::spawn(move || {
                (0..10)
                    .map(|n| {
                        products
                            .create(&Product::new(format!("item-{worker}-{n}"), worker, 1.0))
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(ids.len(), 80);
    assert_eq!(products.list(&ProductFilter::default()).unwrap().len(), 80);
    assert_eq!(products.list_by_category(3).unwrap().len(), 10);
}

fn impatient_store(path: &Path) -> Arc<Store> {
    let options = StoreOptions {
        busy_timeout: Duration::from_millis(50),
    };
    Arc::new(Store::open_with(path, options).unwrap())
}

#[test]
fn create_surfaces_begin_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let categories = CategoryService::new(impatient_store(&path));

    let other = Connection::open(&path).unwrap();
    other.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let err = categories.create(&Category::new("Blocked")).unwrap_err();
    assert!(matches!(err, StoreError::Transaction(_)), "{err}");

    other.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(categories.create(&Category::new("Unblocked")).unwrap(), 1);
}

#[test]
fn failed_commit_replaces_success_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reader.db");
    let categories = CategoryService::new(impatient_store(&path));

    let other = Connection::open(&path).unwrap();
    let mut stmt = other.prepare("SELECT name FROM sqlite_master;").unwrap();
    let mut rows = stmt.query([]).unwrap();
    assert!(rows.next().unwrap().is_some());

    let err = categories.create(&Category::new("Unwritten")).unwrap_err();
    assert!(matches!(err, StoreError::Transaction(_)), "{err}");

    drop(rows);
    drop(stmt);
    assert!(categories.list().unwrap().is_empty());
    assert_eq!(categories.create(&Category::new("Written")).unwrap(), 1);
}
