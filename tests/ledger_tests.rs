mod common;

use common::temp_db_path;
use std::fs;
use villain_forge::ForgeError;
use villain_forge::db::{LedgerReason, Storage};
use villain_forge::service::CreditLedger;

async fn ledger(tag: &str) -> (CreditLedger, Storage, std::path::PathBuf) {
    let path = temp_db_path(tag);
    let storage = Storage::connect(&format!("sqlite:{}", path.display()))
        .await
        .expect("open test database");
    (CreditLedger::new(storage.clone()), storage, path)
}

#[tokio::test]
async fn credit_then_debit_nets_out() {
    let (ledger, storage, path) = ledger("ledger-net").await;
    storage.ensure_account("a@example.com", 2, true).await.unwrap();

    let start = ledger.balance("a@example.com").await.unwrap();
    ledger.credit("a@example.com", 5, LedgerReason::TopUp).await.unwrap();
    let after = ledger.debit("a@example.com", 1, LedgerReason::Portrait).await.unwrap();
    assert_eq!(after, start + 5 - 1);

    let entries = ledger.history("a@example.com").await.unwrap();
    let deltas: Vec<i64> = entries.iter().map(|e| e.delta).collect();
    assert_eq!(deltas, vec![2, 5, -1]);
    assert_eq!(entries.last().unwrap().balance_after, after);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn debit_never_goes_negative() {
    let (ledger, storage, path) = ledger("ledger-floor").await;
    storage.ensure_account("a@example.com", 1, true).await.unwrap();

    assert_eq!(ledger.debit("a@example.com", 1, LedgerReason::Portrait).await.unwrap(), 0);
    let err = ledger
        .debit("a@example.com", 1, LedgerReason::Portrait)
        .await
        .unwrap_err();
    assert!(matches!(err, ForgeError::InsufficientCredit));
    assert_eq!(ledger.balance("a@example.com").await.unwrap(), 0);

    let unknown = ledger.debit("ghost@example.com", 1, LedgerReason::Portrait).await;
    assert!(matches!(unknown, Err(ForgeError::InsufficientCredit)));

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn concurrent_debits_spend_each_credit_once() {
    let (ledger, storage, path) = ledger("ledger-race").await;
    storage.ensure_account("a@example.com", 3, true).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.debit("a@example.com", 1, LedgerReason::Portrait).await
        }));
    }
    let mut ok = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 3);
    assert_eq!(ledger.balance("a@example.com").await.unwrap(), 0);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn admin_adjust_clamps_at_zero() {
    let (ledger, storage, path) = ledger("ledger-adjust").await;
    storage.ensure_account("a@example.com", 1, true).await.unwrap();

    assert_eq!(ledger.adjust("a@example.com", -10).await.unwrap(), 0);
    assert_eq!(ledger.adjust("a@example.com", 4).await.unwrap(), 4);
    assert_eq!(ledger.adjust("new@example.com", 2).await.unwrap(), 2);

    let (account, created) = storage.ensure_account("new@example.com", 1, true).await.unwrap();
    assert!(!created);
    assert!(account.verified);
    assert_eq!(account.credits, 2);

    let _ = fs::remove_file(&path);
}
