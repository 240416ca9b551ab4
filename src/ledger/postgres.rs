// region:    --- Imports
use super::{NewTransaction, Transaction, TransactionLedger};
use crate::database::DatabaseManager;
use crate::error::{MarketError, MarketResult};
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Postgres Transaction Ledger
pub struct PostgresTransactionLedger {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresTransactionLedger {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl TransactionLedger for PostgresTransactionLedger {
    async fn get_by_offer_id(&self, offer_id: i64) -> MarketResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(queries::GET_TRANSACTION_BY_OFFER)
            .bind(offer_id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(transaction)
    }

    async fn create(&self, new: NewTransaction) -> MarketResult<i64> {
        info!(
            "{:<12} --> 거래 생성 offer: {}",
            "Ledger", new.purchase_offer_id
        );
        let id: Option<i64> = sqlx::query_scalar(queries::INSERT_TRANSACTION)
            .bind(new.sell_request_id)
            .bind(new.purchase_offer_id)
            .bind(new.wholesaler_id)
            .bind(new.seller_id)
            .bind(new.created_at)
            .fetch_optional(self.db_manager.pool())
            .await?;

        id.ok_or_else(|| {
            MarketError::StateConflict(format!(
                "매입 제안 {}의 거래가 이미 존재합니다",
                new.purchase_offer_id
            ))
        })
    }

    async fn complete(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()> {
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let completed: Option<i64> = sqlx::query_scalar(queries::COMPLETE_TRANSACTION)
                        .bind(id)
                        .bind(at)
                        .fetch_optional(&mut **tx)
                        .await?;
                    if completed.is_some() {
                        info!("{:<12} --> 거래 완료 id: {}", "Ledger", id);
                        return Ok(());
                    }

                    let current = sqlx::query_as::<_, Transaction>(queries::GET_TRANSACTION)
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    match current {
                        None => Err(MarketError::not_found("거래", id)),
                        Some(_) => {
                            warn!("{:<12} --> 이미 완료된 거래 id: {}", "Ledger", id);
                            Err(MarketError::StateConflict(format!(
                                "거래 {}은(는) 이미 완료되었습니다",
                                id
                            )))
                        }
                    }
                })
            })
            .await
    }
}

// endregion: --- Postgres Transaction Ledger

// region:    --- Tests
// Postgres 가 필요하다: DATABASE_URL=postgres://... cargo test -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::ledger::TransactionStatus;
    use crate::market::model::{Category, NewPurchaseOffer, NewSellRequest, PurchaseOffer};
    use crate::store::{MarketStore, PostgresMarketStore};

    async fn setup() -> (PostgresMarketStore, PostgresTransactionLedger) {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL").unwrap(),
            max_connections: 5,
            reset: false,
        };
        let db_manager = DatabaseManager::new(&config).await.unwrap();
        db_manager.initialize_database(false).await.unwrap();
        let db_manager = Arc::new(db_manager);
        (
            PostgresMarketStore::new(Arc::clone(&db_manager)),
            PostgresTransactionLedger::new(db_manager),
        )
    }

    /// 거래 대상이 될 판매 요청과 제안
    async fn deal(store: &PostgresMarketStore, seller_id: i64) -> PurchaseOffer {
        let request = store
            .insert_sell_request(NewSellRequest {
                seller_id,
                title: "아이폰 14 Pro".to_string(),
                description: "배터리 효율 91%".to_string(),
                image_urls: vec![],
                desired_price: None,
                category: Category::Smartphone,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .insert_offer(NewPurchaseOffer {
                sell_request_id: request.id,
                wholesaler_id: seller_id + 100,
                wholesaler_name: "W".to_string(),
                offer_price: 650_000,
                message: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    fn new_transaction(offer: &PurchaseOffer, seller_id: i64) -> NewTransaction {
        NewTransaction {
            sell_request_id: offer.sell_request_id,
            purchase_offer_id: offer.id,
            wholesaler_id: offer.wholesaler_id,
            seller_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_ledger_create_twice_conflicts() {
        let (store, ledger) = setup().await;
        let offer = deal(&store, 11).await;

        let id = ledger.create(new_transaction(&offer, 11)).await.unwrap();
        let again = ledger.create(new_transaction(&offer, 11)).await;
        assert!(matches!(again, Err(MarketError::StateConflict(_))));

        let found = ledger.get_by_offer_id(offer.id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.status, TransactionStatus::InProgress);
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_ledger_double_completion_rejected() {
        let (store, ledger) = setup().await;
        let offer = deal(&store, 12).await;
        let id = ledger.create(new_transaction(&offer, 12)).await.unwrap();

        ledger.complete(id, Utc::now()).await.unwrap();
        let first_completion = ledger.get_by_offer_id(offer.id).await.unwrap().unwrap();

        let second = ledger.complete(id, Utc::now()).await;
        assert!(matches!(second, Err(MarketError::StateConflict(_))));
        let unchanged = ledger.get_by_offer_id(offer.id).await.unwrap().unwrap();
        assert_eq!(unchanged, first_completion);

        let missing = ledger.complete(i64::MAX, Utc::now()).await;
        assert!(matches!(missing, Err(MarketError::NotFound(_))));
    }
}
// endregion: --- Tests
