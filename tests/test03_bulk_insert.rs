use adventure_data::prelude::*;
use adventure_data::test_utils::FakeServer;

fn destination() -> Vec<BulkColumn> {
    vec![
        BulkColumn::new("LocationID", "smallint"),
        BulkColumn::new("Name", "nvarchar"),
        BulkColumn::new("CostRate", "decimal"),
        BulkColumn::new("Availability", "decimal"),
        BulkColumn::new("ModifiedDate", "datetime"),
    ]
}

fn locations() -> ResultSet {
    let mut rs = ResultSet::with_columns(["Availability", "Name", "LocationID", "Scratch"]);
    rs.add_row_values(vec![
        RowValues::Float(96.0),
        RowValues::Text("Tool Crib".into()),
        RowValues::Int(1),
        RowValues::Text("x".into()),
    ])
    .unwrap();
    rs.add_row_values(vec![
        RowValues::Float(120.0),
        RowValues::Text("Frame Forming".into()),
        RowValues::Int(10),
        RowValues::Text("y".into()),
    ])
    .unwrap();
    rs
}

fn expected_rows() -> Vec<Vec<RowValues>> {
    vec![
        vec![
            RowValues::Int(1),
            RowValues::Text("Tool Crib".into()),
            RowValues::Null,
            RowValues::Float(96.0),
            RowValues::Null,
        ],
        vec![
            RowValues::Int(10),
            RowValues::Text("Frame Forming".into()),
            RowValues::Null,
            RowValues::Float(120.0),
            RowValues::Null,
        ],
    ]
}

#[tokio::test]
async fn column_order_does_not_change_alignment() {
    let orders: [&[&str]; 4] = [
        &["LocationID", "Name", "Availability"],
        &["Availability", "Name", "LocationID"],
        &["Name", "LocationID", "Availability"],
        &["Availability", "LocationID", "Name"],
    ];

    for columns in orders {
        let server = FakeServer::with_affected(Vec::new()).with_destination(destination());
        let copied = bulk_insert(&server, "Production.Location", columns, &locations())
            .await
            .unwrap();
        assert_eq!(copied, 2);
        assert_eq!(server.loaded_rows(), expected_rows(), "columns {columns:?}");
        assert_eq!(
            server.sql_log().last().map(String::as_str),
            Some("COMMIT TRANSACTION")
        );
        assert_eq!(server.connections_open(), 0);
    }
}

#[tokio::test]
async fn unknown_column_rolls_back() {
    let server = FakeServer::with_affected(Vec::new()).with_destination(destination());
    let err = bulk_insert(&server, "Production.Location", &["Name", "Scratch"], &locations())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "transaction");
    assert_eq!(err.root_cause().kind(), "parameter");
    assert!(err.to_string().contains("Scratch"), "{err}");
    assert!(server.loaded_rows().is_empty());
    assert_eq!(
        server.sql_log().last().map(String::as_str),
        Some("ROLLBACK TRANSACTION")
    );
}

#[tokio::test]
async fn load_failure_rolls_back_with_original_message() {
    let server = FakeServer::with_affected(Vec::new())
        .with_destination(destination())
        .failing_bulk_load("String or binary data would be truncated");
    let err = bulk_insert(&server, "Production.Location", &["Name"], &locations())
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("String or binary data would be truncated"),
        "{err}"
    );
    assert_eq!(
        server.sql_log().last().map(String::as_str),
        Some("ROLLBACK TRANSACTION")
    );
}

#[tokio::test]
async fn invalid_table_name_is_rejected_up_front() {
    let server = FakeServer::with_affected(Vec::new()).with_destination(destination());
    let err = bulk_insert(&server, "Location; DROP TABLE x", &["Name"], &locations())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "parameter");
    assert_eq!(server.connections_opened(), 0);
}
