use adventure_data::prelude::*;
use adventure_data::test_utils::{FakeResponse, FakeServer};

#[derive(Debug, Default, Clone)]
struct ProductReview {
    product_id: i32,
    reviewer_name: String,
    email_address: Option<String>,
    rating: i32,
    comments: Option<String>,
}

sql_entity!(ProductReview {
    "ProductID" => product_id,
    "ReviewerName" => reviewer_name,
    "EmailAddress" => email_address,
    "Rating" => rating,
    "Comments" => comments,
});

#[tokio::test]
async fn every_bag_field_is_bound_including_nulls() {
    let server = FakeServer::with_affected(vec![1]);
    let review = ProductReview {
        product_id: 937,
        reviewer_name: "Alice".into(),
        rating: 5,
        ..Default::default()
    };

    let affected = execute_non_query(
        &server,
        &SqlCommand::stored_procedure("Production.InsertProductReview").bind(&review),
    )
    .await
    .unwrap();
    assert_eq!(affected, 1);

    let statements = server.statements();
    assert_eq!(
        statements[0].sql,
        "EXEC Production.InsertProductReview @ProductID = @P1, @ReviewerName = @P2, \
         @EmailAddress = @P3, @Rating = @P4, @Comments = @P5"
    );
    assert_eq!(
        statements[0].params,
        vec![
            RowValues::Int(937),
            RowValues::Text("Alice".into()),
            RowValues::Null,
            RowValues::Int(5),
            RowValues::Null,
        ]
    );
    assert_eq!(server.connections_open(), 0);
}

#[tokio::test]
async fn affected_rows_are_summed_or_minus_one() {
    let server = FakeServer::with_affected(vec![2, 3]);
    let cmd = SqlCommand::text("UPDATE Sales.SpecialOffer SET DiscountPct = 0 WHERE 1 = 0");
    assert_eq!(execute_non_query(&server, &cmd).await.unwrap(), 5);

    let nocount = FakeServer::with_affected(Vec::new());
    assert_eq!(execute_non_query(&nocount, &cmd).await.unwrap(), -1);
}

#[tokio::test]
async fn scalar_distinguishes_no_rows_from_null() {
    let cmd = SqlCommand::text("SELECT MAX(ListPrice) FROM Production.Product WHERE Color = @Color")
        .bind(&NamedParams::new().with("Color", "Mauve"));

    let empty = FakeServer::with_rows(ResultSet::with_columns(["ListPrice"]));
    assert_eq!(execute_scalar(&empty, &cmd).await.unwrap(), None);

    let null = FakeServer::with_rows(
        ResultSet::with_columns(["ListPrice"])
            .with_row(vec![RowValues::Null])
            .unwrap(),
    );
    assert_eq!(execute_scalar(&null, &cmd).await.unwrap(), Some(RowValues::Null));

    let value = FakeServer::with_rows(
        ResultSet::with_columns(["ListPrice"])
            .with_row(vec![RowValues::Float(3578.27)])
            .unwrap(),
    );
    assert_eq!(
        execute_scalar(&value, &cmd).await.unwrap(),
        Some(RowValues::Float(3578.27))
    );
    assert_eq!(
        value.statements()[0].sql,
        "SELECT MAX(ListPrice) FROM Production.Product WHERE Color = @P1"
    );
}

#[tokio::test]
async fn transaction_commits_on_success() {
    let server = FakeServer::with_affected(vec![4]);
    let cmd = SqlCommand::stored_procedure("dbo.uspLogError");
    assert_eq!(
        execute_non_query_with_transaction(&server, &cmd).await.unwrap(),
        4
    );
    assert_eq!(
        server.sql_log(),
        vec!["BEGIN TRANSACTION", "EXEC dbo.uspLogError", "COMMIT TRANSACTION"]
    );
}

#[tokio::test]
async fn failed_command_is_rolled_back_with_original_message() {
    let server = FakeServer::new(|_, _| FakeResponse::Fail("Violation of PRIMARY KEY".into()));
    let err = execute_non_query_with_transaction(
        &server,
        &SqlCommand::stored_procedure("HumanResources.uspUpdateEmployeeLogin"),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("Violation of PRIMARY KEY"), "{err}");
    match &err {
        SqlHelperError::TransactionError { source, rollback } => {
            assert_eq!(source.kind(), "execution");
            assert!(rollback.is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        server.sql_log().last().map(String::as_str),
        Some("ROLLBACK TRANSACTION")
    );
    assert_eq!(server.connections_open(), 0);
}

#[tokio::test]
async fn failed_rollback_keeps_both_errors() {
    let server =
        FakeServer::new(|_, _| FakeResponse::Fail("deadlock victim".into())).failing_rollback();
    let err = execute_non_query_with_transaction(&server, &SqlCommand::text("DELETE FROM t"))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("deadlock victim"), "{text}");
    assert!(text.contains("connection lost during rollback"), "{text}");
    assert_eq!(err.root_cause().kind(), "execution");
}

#[tokio::test]
async fn failed_commit_is_rolled_back() {
    let server = FakeServer::with_affected(vec![1]).failing_commit();
    let err = execute_non_query_with_transaction(&server, &SqlCommand::text("DELETE FROM t"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("commit failed"), "{err}");
    assert_eq!(
        server.sql_log(),
        vec![
            "BEGIN TRANSACTION",
            "DELETE FROM t",
            "COMMIT TRANSACTION",
            "ROLLBACK TRANSACTION"
        ]
    );
}

#[tokio::test]
async fn invalid_command_never_opens_a_connection() {
    let server = FakeServer::with_affected(vec![1]);
    let err = execute_non_query(&server, &SqlCommand::stored_procedure("x; DROP TABLE y"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "parameter");
    assert_eq!(server.connections_opened(), 0);
}

#[tokio::test]
async fn connection_failures_surface_as_connection_errors() {
    let server = FakeServer::with_affected(vec![1]).failing_connect("Login failed for user 'sa'");
    let err = execute_scalar(&server, &SqlCommand::text("SELECT 1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "connection");
}
