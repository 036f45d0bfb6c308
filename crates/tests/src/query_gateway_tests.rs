//! SELECT-only execution through [`QueryGateway`] over a real in-memory `SQLite` store.

use ethpulse_core::{
    nl2sql::RuleBasedConverter,
    query::{QueryError, QueryGateway},
    store::TransactionStore,
};
use serde_json::json;
use std::sync::Arc;

use crate::mock_infrastructure::{memory_store, test_record};

const ALICE: &str = "0x00000000000000000000000000000000000000a1";
const BOB: &str = "0x00000000000000000000000000000000000000b2";

async fn seeded_gateway() -> (QueryGateway, Arc<dyn TransactionStore>) {
    let store: Arc<dyn TransactionStore> = memory_store().await;
    store
        .upsert_many(&[
            test_record("0x01", 100, ALICE, Some(BOB), "1000000000000000000"),
            test_record("0x02", 101, BOB, Some(ALICE), "500"),
            test_record("0x03", 101, ALICE, None, "0"),
        ])
        .await
        .unwrap();
    (QueryGateway::new(store.clone()), store)
}

#[tokio::test]
async fn test_select_with_positional_params() {
    let (gateway, _) = seeded_gateway().await;

    let response = gateway
        .execute(
            "SELECT hash, block_number FROM transactions WHERE block_number = ? ORDER BY hash",
            &[json!(101)],
        )
        .await
        .unwrap();

    assert_eq!(response.row_count, 2);
    assert_eq!(response.rows[0]["hash"], json!("0x02"));
    assert_eq!(response.rows[1]["block_number"], json!(101));
}

#[tokio::test]
async fn test_destructive_statements_never_reach_store() {
    let (gateway, store) = seeded_gateway().await;

    for sql in [
        "DROP TABLE transactions",
        "DELETE FROM transactions",
        "UPDATE transactions SET value = '0'",
        "SELECT 1; DROP TABLE transactions",
        "",
    ] {
        let err = gateway.execute(sql, &[]).await.unwrap_err();
        assert!(err.is_validation(), "{sql:?} was not rejected as invalid: {err}");
        assert!(matches!(err, QueryError::Validation(_)));
    }

    assert_eq!(store.stats().await.unwrap().total_transactions, 3);
}

#[tokio::test]
async fn test_engine_errors_are_not_validation_errors() {
    let (gateway, _) = seeded_gateway().await;

    let err = gateway.execute("SELECT missing_column FROM transactions", &[]).await.unwrap_err();
    assert!(matches!(err, QueryError::Store(_)));
}

#[tokio::test]
async fn test_unsafe_integers_become_strings() {
    let (gateway, _) = seeded_gateway().await;

    let response = gateway
        .execute("SELECT 9007199254740993 AS big, 42 AS small, NULL AS nothing", &[])
        .await
        .unwrap();

    let row = &response.rows[0];
    assert_eq!(row["big"], json!("9007199254740993"));
    assert_eq!(row["small"], json!(42));
    assert_eq!(row["nothing"], json!(null));
}

#[tokio::test]
async fn test_upsert_replaces_by_hash() {
    let (gateway, store) = seeded_gateway().await;

    store.upsert_many(&[test_record("0x02", 101, BOB, Some(ALICE), "777")]).await.unwrap();

    let response = gateway
        .execute("SELECT value FROM transactions WHERE hash = ?", &[json!("0x02")])
        .await
        .unwrap();
    assert_eq!(response.row_count, 1);
    assert_eq!(response.rows[0]["value"], json!("777"));
    assert_eq!(store.stats().await.unwrap().total_transactions, 3);
}

#[tokio::test]
async fn test_address_lookup_matches_either_side() {
    let (_, store) = seeded_gateway().await;

    let records = store.query_by_address(BOB, 10).await.unwrap();
    let mut hashes: Vec<_> = records.iter().map(|r| r.hash.as_str()).collect();
    hashes.sort_unstable();
    assert_eq!(hashes, vec!["0x01", "0x02"]);
}

#[tokio::test]
async fn test_stats_cover_all_rows() {
    let (_, store) = seeded_gateway().await;

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_transactions, 3);
    assert_eq!(stats.unique_senders, 2);
    assert_eq!(stats.min_block, Some(100));
    assert_eq!(stats.max_block, Some(101));
}

#[tokio::test]
async fn test_eth_threshold_rules_compare_exact_wei() {
    let store: Arc<dyn TransactionStore> = memory_store().await;
    store
        .upsert_many(&[
            test_record("0x0a", 1, ALICE, None, "5000000000000000001"),
            test_record("0x0b", 1, ALICE, None, "5000000000000000000"),
            test_record("0x0c", 1, ALICE, None, "4999999999999999999"),
            test_record("0x0d", 1, ALICE, None, "999"),
            test_record("0x0e", 1, ALICE, None, "12000000000000000000"),
        ])
        .await
        .unwrap();
    let gateway = QueryGateway::new(store);
    let rules = RuleBasedConverter::new(1000);

    let over = gateway.execute(&rules.convert("transactions over 5 eth"), &[]).await.unwrap();
    let mut hashes: Vec<_> = over.rows.iter().map(|row| row["hash"].clone()).collect();
    hashes.sort_by_key(ToString::to_string);
    assert_eq!(hashes, vec![json!("0x0a"), json!("0x0e")]);

    let under = gateway.execute(&rules.convert("transactions under 5 eth"), &[]).await.unwrap();
    let mut hashes: Vec<_> = under.rows.iter().map(|row| row["hash"].clone()).collect();
    hashes.sort_by_key(ToString::to_string);
    assert_eq!(hashes, vec![json!("0x0c"), json!("0x0d")]);

    let large = gateway.execute(&rules.convert("largest transactions"), &[]).await.unwrap();
    let hashes: Vec<_> = large.rows.iter().map(|row| row["hash"].clone()).collect();
    assert_eq!(hashes, vec![json!("0x0e"), json!("0x0a"), json!("0x0b"), json!("0x0c")]);
}
