//! End-to-end tests against a SQLite database file.
//!
//! This module tests:
//! - Load, modify, reconcile and reload a record set
//! - Caller-managed transactions surviving or rolling back reconciliation
//! - Model inserts, updates and typed loads with a property map
//! - Driver failures surfacing as statement execution errors

use recordset_adapter::{
    CancellationToken, CompareOp, Condition, DbDataAdapter, Error, PropertyMap, Query, RecordSet,
    SortField, SqliteCommandBuilder, SqliteConfig, SqliteConnection, Value,
};
use tempfile::TempDir;

type SqliteAdapter = DbDataAdapter<SqliteConnection, SqliteCommandBuilder>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fresh database with an `items` table holding three rows.
fn setup() -> (TempDir, SqliteAdapter) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut connection = SqliteConnection::new(SqliteConfig::new(dir.path().join("test.db")));
    connection
        .execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, qty INTEGER);
             INSERT INTO items VALUES (1, 'bolt', 10), (2, 'nut', 20), (3, 'gear', NULL);",
        )
        .unwrap();
    (dir, DbDataAdapter::new(connection, SqliteCommandBuilder::default()))
}

fn load(adapter: &mut SqliteAdapter) -> RecordSet {
    let mut rs = adapter
        .select(Query::new("items").order_by(SortField::asc("id")))
        .unwrap()
        .record_set()
        .unwrap();
    rs.set_primary_key(&["id"]).unwrap();
    rs
}

fn ids(rs: &RecordSet) -> Vec<Value> {
    rs.rows().map(|row| row.values()[0].clone()).collect()
}

#[test]
fn test_reconcile_round_trip() {
    let (_dir, mut adapter) = setup();
    let mut rs = load(&mut adapter);
    assert_eq!(rs.len(), 3);

    rs.row_mut(0).unwrap().set("qty", 11i64).unwrap();
    rs.delete(1).unwrap();
    rs.add(vec![4i64.into(), "washer".into(), Value::Null]).unwrap();

    assert_eq!(adapter.reconcile("items", &mut rs).unwrap(), 3);
    assert!(!rs.has_changes());
    assert_eq!(ids(&rs), vec![1i64.into(), 3i64.into(), 4i64.into()]);

    let reloaded = load(&mut adapter);
    assert_eq!(ids(&reloaded), ids(&rs));
    assert_eq!(reloaded.value(0, "qty").unwrap(), &Value::Integer(11));
    assert_eq!(reloaded.value(2, "name").unwrap(), &Value::from("washer"));
    assert_eq!(reloaded.value(1, "qty").unwrap(), &Value::Null);
}

#[test]
fn test_failed_statement_leaves_record_set_pending() {
    let (_dir, mut adapter) = setup();
    let mut rs = load(&mut adapter);

    rs.row_mut(0).unwrap().set("name", "BOLT").unwrap();
    // Violates NOT NULL.
    rs.row_mut(1).unwrap().set("name", Value::Null).unwrap();

    let err = adapter.reconcile("items", &mut rs).unwrap_err();
    assert!(matches!(err, Error::StatementExecution { .. }));
    assert!(rs.has_changes());

    // Without a transaction the first update stays applied.
    let reloaded = load(&mut adapter);
    assert_eq!(reloaded.value(0, "name").unwrap(), &Value::from("BOLT"));
    assert_eq!(reloaded.value(1, "name").unwrap(), &Value::from("nut"));
}

#[test]
fn test_rolled_back_transaction_discards_reconciliation() {
    let (_dir, mut adapter) = setup();
    let mut rs = load(&mut adapter);
    for row_idx in 0..3 {
        rs.delete(row_idx).unwrap();
    }

    let tx = {
        let connection = adapter.connection_mut();
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(recordset_adapter::Connection::open(
                connection,
                &CancellationToken::new(),
            ))
            .unwrap();
        connection.begin_transaction().unwrap()
    };
    adapter.set_transaction(Some(tx));

    assert_eq!(adapter.reconcile("items", &mut rs).unwrap(), 3);
    assert!(rs.is_empty());

    let tx = adapter.set_transaction(None).unwrap();
    adapter.connection_mut().rollback(tx).unwrap();

    assert_eq!(load(&mut adapter).len(), 3);
}

#[test]
fn test_models_with_property_map() {
    #[derive(serde::Serialize)]
    struct Item {
        id: i64,
        label: String,
        quantity: Option<i64>,
        in_stock: bool,
    }

    let (_dir, mut adapter) = setup();
    let map: PropertyMap = [("id", "id"), ("label", "name"), ("quantity", "qty")]
        .into_iter()
        .map(|(property, column)| (property.to_string(), column.to_string()))
        .collect();

    let item = Item {
        id: 7,
        label: "spring".into(),
        quantity: None,
        in_stock: true,
    };
    assert_eq!(adapter.insert_model("items", &item, Some(&map)).unwrap(), 1);

    let restock = Item {
        quantity: Some(40),
        ..item
    };
    let by_id = Query::new("items").filter(Condition::eq("id", 7i64));
    assert_eq!(adapter.update_model(&by_id, &restock, Some(&map)).unwrap(), 1);

    let rows = adapter.select(by_id).unwrap().fetch().unwrap();
    assert_eq!(rows.columns, vec!["id", "name", "qty"]);
    assert_eq!(
        rows.rows,
        vec![vec![Value::Integer(7), Value::from("spring"), Value::Integer(40)]]
    );
}

#[test]
fn test_select_into_models() {
    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Stock {
        label: String,
        quantity: Option<i64>,
    }

    let (_dir, mut adapter) = setup();
    let map: PropertyMap = [("label", "name"), ("quantity", "qty")]
        .into_iter()
        .map(|(property, column)| (property.to_string(), column.to_string()))
        .collect();

    let stock: Vec<Stock> = adapter
        .select(Query::new("items").order_by(SortField::asc("id")))
        .unwrap()
        .models(Some(&map))
        .unwrap();

    assert_eq!(
        stock,
        vec![
            Stock { label: "bolt".into(), quantity: Some(10) },
            Stock { label: "nut".into(), quantity: Some(20) },
            Stock { label: "gear".into(), quantity: None },
        ]
    );

    // Without a map the column names must match the fields.
    let err = adapter
        .select(Query::new("items"))
        .unwrap()
        .models::<Stock>(None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidModel(_)));
}

#[test]
fn test_update_and_delete_by_condition() {
    let (_dir, mut adapter) = setup();

    let low = Query::new("items").filter(Condition::compare("qty", CompareOp::Lt, 15i64));
    assert_eq!(
        adapter
            .update(&low, recordset_adapter::Changeset::new().set_expression("qty", "\"qty\" * 2"))
            .unwrap(),
        1
    );

    let missing_qty = Query::new("items").filter(Condition::is_null("qty"));
    assert_eq!(adapter.delete(&missing_qty).unwrap(), 1);

    let rs = load(&mut adapter);
    assert_eq!(ids(&rs), vec![1i64.into(), 2i64.into()]);
    assert_eq!(rs.value(0, "qty").unwrap(), &Value::Integer(20));
}

#[tokio::test]
async fn test_async_select_with_paging() {
    let (_dir, mut adapter) = setup();
    let rows = adapter
        .select(
            Query::new("items")
                .select(["name"])
                .order_by(SortField::desc("id"))
                .offset(1),
        )
        .unwrap()
        .fetch_async(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        rows.rows,
        vec![vec![Value::from("nut")], vec![Value::from("bolt")]]
    );
}
