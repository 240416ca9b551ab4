// region:    --- Imports
use super::{NewTransaction, Transaction, TransactionLedger, TransactionStatus};
use crate::error::{MarketError, MarketResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::info;

// endregion: --- Imports

// region:    --- In-Memory Transaction Ledger
#[derive(Default)]
pub struct InMemoryTransactionLedger {
    transactions: Mutex<BTreeMap<i64, Transaction>>,
}

impl InMemoryTransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn get_by_offer_id(&self, offer_id: i64) -> MarketResult<Option<Transaction>> {
        let transactions = self.transactions.lock().await;
        Ok(transactions
            .values()
            .find(|t| t.purchase_offer_id == offer_id)
            .cloned())
    }

    async fn create(&self, new: NewTransaction) -> MarketResult<i64> {
        let mut transactions = self.transactions.lock().await;
        if transactions
            .values()
            .any(|t| t.purchase_offer_id == new.purchase_offer_id)
        {
            return Err(MarketError::StateConflict(format!(
                "매입 제안 {}의 거래가 이미 존재합니다",
                new.purchase_offer_id
            )));
        }

        let id = transactions.keys().next_back().copied().unwrap_or(0) + 1;
        transactions.insert(
            id,
            Transaction {
                id,
                sell_request_id: new.sell_request_id,
                purchase_offer_id: new.purchase_offer_id,
                wholesaler_id: new.wholesaler_id,
                seller_id: new.seller_id,
                status: TransactionStatus::InProgress,
                created_at: new.created_at,
                completed_at: None,
            },
        );
        info!("{:<12} --> 거래 생성 id: {}", "MemLedger", id);
        Ok(id)
    }

    async fn complete(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()> {
        let mut transactions = self.transactions.lock().await;
        let transaction = transactions
            .get_mut(&id)
            .ok_or_else(|| MarketError::not_found("거래", id))?;

        if transaction.status == TransactionStatus::Completed {
            return Err(MarketError::StateConflict(format!(
                "거래 {}은(는) 이미 완료되었습니다",
                id
            )));
        }
        transaction.status = TransactionStatus::Completed;
        transaction.completed_at = Some(at);
        Ok(())
    }
}

// endregion: --- In-Memory Transaction Ledger

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn new_transaction(offer_id: i64) -> NewTransaction {
        NewTransaction {
            sell_request_id: 1,
            purchase_offer_id: offer_id,
            wholesaler_id: 20,
            seller_id: 10,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_then_lookup_by_offer() {
        let ledger = InMemoryTransactionLedger::new();
        assert!(ledger.get_by_offer_id(5).await.unwrap().is_none());

        let id = ledger.create(new_transaction(5)).await.unwrap();
        let found = ledger.get_by_offer_id(5).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.status, TransactionStatus::InProgress);

        let again = ledger.create(new_transaction(5)).await;
        assert!(matches!(again, Err(MarketError::StateConflict(_))));
    }

    #[tokio::test]
    async fn test_double_completion_rejected() {
        let ledger = InMemoryTransactionLedger::new();
        let id = ledger.create(new_transaction(7)).await.unwrap();

        ledger.complete(id, Utc::now()).await.unwrap();
        let second = ledger.complete(id, Utc::now()).await;
        assert!(matches!(second, Err(MarketError::StateConflict(_))));

        let missing = ledger.complete(id + 100, Utc::now()).await;
        assert!(matches!(missing, Err(MarketError::NotFound(_))));
    }
}
// endregion: --- Tests
