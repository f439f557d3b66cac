use std::time::Duration;

use adventure_data::cursor::{Cursor, ResultSetCursor};
use adventure_data::mapping::{SqlReader, read};
use adventure_data::prelude::*;
use adventure_data::test_utils::FakeServer;
use futures_util::TryStreamExt;
use rust_decimal::Decimal;

#[derive(Debug, Default, PartialEq)]
struct WorkOrder {
    work_order_id: i32,
    product_id: i32,
    order_qty: i32,
    scrap_reason: Option<String>,
    scrapped_qty: i64,
    unit_cost: Decimal,
}

sql_entity!(WorkOrder {
    "WorkOrderID" => work_order_id,
    "ProductID" => product_id,
    "OrderQty" => order_qty,
    "ScrapReason" => scrap_reason,
    "ScrappedQty" => scrapped_qty,
    "UnitCost" => unit_cost,
});

fn work_orders() -> ResultSet {
    let mut rs = ResultSet::with_columns(["WorkOrderID", "OrderQty", "ScrapReason", "Comment"]);
    rs.add_row_values(vec![
        RowValues::Int(13_079),
        RowValues::Int(4),
        RowValues::Text("Color incorrect".into()),
        RowValues::Text("ignored".into()),
    ])
    .unwrap();
    rs.add_row_values(vec![
        RowValues::Int(13_080),
        RowValues::Null,
        RowValues::Null,
        RowValues::Null,
    ])
    .unwrap();
    rs
}

#[tokio::test]
async fn column_subset_maps_one_entity_per_row() {
    let entities: Vec<WorkOrder> = read(ResultSetCursor::new(work_orders()))
        .collect_all()
        .await
        .unwrap();

    assert_eq!(
        entities,
        vec![
            WorkOrder {
                work_order_id: 13_079,
                order_qty: 4,
                scrap_reason: Some("Color incorrect".into()),
                ..Default::default()
            },
            WorkOrder {
                work_order_id: 13_080,
                ..Default::default()
            },
        ]
    );
}

#[tokio::test]
async fn null_cells_keep_defaults_without_error() {
    let rs = ResultSet::with_columns(["UnitCost", "ScrappedQty"])
        .with_row(vec![RowValues::Null, RowValues::Null])
        .unwrap();
    let mut reader = SqlReader::<WorkOrder, _>::new(ResultSetCursor::new(rs));
    let entity = reader.next().await.unwrap().unwrap();
    assert_eq!(entity.unit_cost, Decimal::ZERO);
    assert_eq!(entity.scrapped_qty, 0);
    assert!(reader.next().await.unwrap().is_none());
    assert!(!reader.is_open());
}

#[tokio::test]
async fn column_names_match_case_sensitively() {
    let rs = ResultSet::with_columns(["workorderid", "OrderQty"])
        .with_row(vec![RowValues::Int(1), RowValues::Int(7)])
        .unwrap();
    let reader = SqlReader::<WorkOrder, _>::new(ResultSetCursor::new(rs));
    assert_eq!(reader.mapped_fields().collect::<Vec<_>>(), vec!["OrderQty"]);
    let entities = reader.collect_all().await.unwrap();
    assert_eq!(entities[0].work_order_id, 0);
    assert_eq!(entities[0].order_qty, 7);
}

#[tokio::test]
async fn type_mismatch_is_a_mapping_error() {
    let rs = ResultSet::with_columns(["OrderQty"])
        .with_row(vec![RowValues::Text("four".into())])
        .unwrap();
    let err = read::<WorkOrder, _>(ResultSetCursor::new(rs))
        .collect_all()
        .await
        .unwrap_err();
    match err {
        SqlHelperError::MappingError {
            column,
            expected,
            found,
        } => {
            assert_eq!(column, "OrderQty");
            assert_eq!(expected, "int");
            assert_eq!(found, "text");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn stopping_early_releases_the_connection() {
    let server = FakeServer::with_rows(work_orders());
    let cursor = execute_reader(&server, &SqlCommand::text("SELECT * FROM Production.WorkOrder"))
        .await
        .unwrap();
    assert_eq!(server.connections_open(), 1);

    let mut reader = read::<WorkOrder, _>(cursor);
    assert!(reader.next().await.unwrap().is_some());
    reader.close();
    assert_eq!(server.connections_open(), 0);
}

#[tokio::test]
async fn reader_carries_the_command_timeout() {
    let server = FakeServer::with_rows(work_orders());
    let command = SqlCommand::text("SELECT * FROM Production.WorkOrder")
        .with_timeout(Duration::from_secs(5));
    let cursor = execute_reader(&server, &command).await.unwrap();
    drop(cursor);
    assert_eq!(server.cursor_timeouts(), vec![Duration::from_secs(5)]);
}

#[tokio::test]
async fn exhaustion_releases_the_connection() {
    let server = FakeServer::with_rows(work_orders());
    let cursor = execute_reader(&server, &SqlCommand::text("SELECT * FROM Production.WorkOrder"))
        .await
        .unwrap();
    let mut reader = read::<WorkOrder, _>(cursor);
    while reader.next().await.unwrap().is_some() {}
    assert_eq!(server.connections_open(), 0);
    assert!(reader.next().await.unwrap().is_none());
}

#[tokio::test]
async fn reader_is_also_a_stream() {
    let ids: Vec<i32> = read::<WorkOrder, _>(ResultSetCursor::new(work_orders()))
        .into_stream()
        .map_ok(|w| w.work_order_id)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(ids, vec![13_079, 13_080]);
}

#[tokio::test]
async fn closing_a_raw_cursor_releases_the_connection() {
    let server = FakeServer::with_rows(work_orders());
    let cursor = execute_reader(&server, &SqlCommand::text("SELECT 1")).await.unwrap();
    assert_eq!(cursor.column_names()[0], "WorkOrderID");
    cursor.close();
    assert_eq!(server.connections_open(), 0);
}
