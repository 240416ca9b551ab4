// region:    --- Imports
use super::{
    check_offer_belongs, explain_rejected_transition, validate_new_offer, Award, MarketStore,
};
use crate::database::DatabaseManager;
use crate::error::{MarketError, MarketResult};
use crate::market::model::{
    NewPurchaseOffer, NewSellRequest, PurchaseOffer, SellRequest, SellRequestStatus,
};
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Postgres Market Store
pub struct PostgresMarketStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresMarketStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

/// 고유 제약 위반(23505)은 상태 충돌로 본다
fn unique_violation_as_conflict(e: sqlx::Error, what: &str) -> MarketError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            MarketError::StateConflict(what.to_string())
        }
        _ => MarketError::Persistence(e),
    }
}

#[async_trait]
impl MarketStore for PostgresMarketStore {
    async fn insert_sell_request(&self, new: NewSellRequest) -> MarketResult<SellRequest> {
        info!(
            "{:<12} --> 판매 요청 저장 seller: {}",
            "Store", new.seller_id
        );
        let request = sqlx::query_as::<_, SellRequest>(queries::INSERT_SELL_REQUEST)
            .bind(new.seller_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.image_urls)
            .bind(&new.desired_price)
            .bind(new.category)
            .bind(new.created_at)
            .fetch_one(self.db_manager.pool())
            .await?;
        Ok(request)
    }

    async fn get_sell_request(&self, id: i64) -> MarketResult<Option<SellRequest>> {
        let request = sqlx::query_as::<_, SellRequest>(queries::GET_SELL_REQUEST)
            .bind(id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(request)
    }

    async fn list_open_sell_requests(&self) -> MarketResult<Vec<SellRequest>> {
        let requests = sqlx::query_as::<_, SellRequest>(queries::GET_OPEN_SELL_REQUESTS)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(requests)
    }

    async fn list_sell_requests_by_seller(&self, seller_id: i64) -> MarketResult<Vec<SellRequest>> {
        let requests = sqlx::query_as::<_, SellRequest>(queries::GET_SELL_REQUESTS_BY_SELLER)
            .bind(seller_id)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(requests)
    }

    async fn cancel_sell_request(
        &self,
        id: i64,
        seller_id: i64,
        at: DateTime<Utc>,
    ) -> MarketResult<SellRequest> {
        info!("{:<12} --> 판매 요청 취소 id: {}", "Store", id);
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let cancelled = sqlx::query_as::<_, SellRequest>(queries::CANCEL_SELL_REQUEST)
                        .bind(id)
                        .bind(seller_id)
                        .bind(at)
                        .fetch_optional(&mut **tx)
                        .await?;

                    match cancelled {
                        Some(request) => Ok(request),
                        None => {
                            let current = sqlx::query_as::<_, SellRequest>(queries::GET_SELL_REQUEST)
                                .bind(id)
                                .fetch_optional(&mut **tx)
                                .await?;
                            Err(explain_rejected_transition(id, seller_id, current.as_ref()))
                        }
                    }
                })
            })
            .await
    }

    async fn insert_offer(&self, new: NewPurchaseOffer) -> MarketResult<PurchaseOffer> {
        validate_new_offer(&new)?;
        info!(
            "{:<12} --> 매입 제안 저장 sell_request: {}, wholesaler: {}",
            "Store", new.sell_request_id, new.wholesaler_id
        );
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    // 마감 트랜잭션과 직렬화되도록 행 잠금
                    let status: Option<SellRequestStatus> =
                        sqlx::query_scalar(queries::LOCK_SELL_REQUEST_STATUS)
                            .bind(new.sell_request_id)
                            .fetch_optional(&mut **tx)
                            .await?;

                    match status {
                        None => {
                            return Err(MarketError::not_found("판매 요청", new.sell_request_id))
                        }
                        Some(SellRequestStatus::Open) => {}
                        Some(status) => {
                            // 재입찰은 상태와 무관하게 중복
                            let existing = sqlx::query_as::<_, PurchaseOffer>(
                                queries::FIND_OFFER_BY_WHOLESALER,
                            )
                            .bind(new.sell_request_id)
                            .bind(new.wholesaler_id)
                            .fetch_optional(&mut **tx)
                            .await?;
                            if existing.is_some() {
                                return Err(MarketError::DuplicateOffer {
                                    sell_request_id: new.sell_request_id,
                                    wholesaler_id: new.wholesaler_id,
                                });
                            }
                            return Err(MarketError::InvalidState {
                                sell_request_id: new.sell_request_id,
                                status,
                            });
                        }
                    }

                    let inserted = sqlx::query_as::<_, PurchaseOffer>(queries::INSERT_OFFER)
                        .bind(new.sell_request_id)
                        .bind(new.wholesaler_id)
                        .bind(&new.wholesaler_name)
                        .bind(new.offer_price)
                        .bind(&new.message)
                        .bind(new.created_at)
                        .fetch_optional(&mut **tx)
                        .await?;

                    inserted.ok_or(MarketError::DuplicateOffer {
                        sell_request_id: new.sell_request_id,
                        wholesaler_id: new.wholesaler_id,
                    })
                })
            })
            .await
    }

    async fn get_offer(&self, id: i64) -> MarketResult<Option<PurchaseOffer>> {
        let offer = sqlx::query_as::<_, PurchaseOffer>(queries::GET_OFFER)
            .bind(id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(offer)
    }

    async fn find_offer(
        &self,
        sell_request_id: i64,
        wholesaler_id: i64,
    ) -> MarketResult<Option<PurchaseOffer>> {
        let offer = sqlx::query_as::<_, PurchaseOffer>(queries::FIND_OFFER_BY_WHOLESALER)
            .bind(sell_request_id)
            .bind(wholesaler_id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(offer)
    }

    async fn list_offers(&self, sell_request_id: i64) -> MarketResult<Vec<PurchaseOffer>> {
        let offers = sqlx::query_as::<_, PurchaseOffer>(queries::GET_OFFERS)
            .bind(sell_request_id)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(offers)
    }

    async fn award_offer(&self, award: Award) -> MarketResult<(SellRequest, PurchaseOffer)> {
        info!(
            "{:<12} --> 낙찰 처리 sell_request: {}, offer: {}",
            "Store", award.sell_request_id, award.offer_id
        );
        let result = self
            .db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let offer = sqlx::query_as::<_, PurchaseOffer>(queries::GET_OFFER)
                        .bind(award.offer_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    let offer = check_offer_belongs(offer, award.offer_id, award.sell_request_id)?;

                    // OPEN 일 때만 마감. 경쟁에서 진 쪽은 여기서 None
                    let closed = sqlx::query_as::<_, SellRequest>(queries::CLOSE_SELL_REQUEST)
                        .bind(award.sell_request_id)
                        .bind(award.seller_id)
                        .bind(offer.wholesaler_id)
                        .bind(award.at)
                        .fetch_optional(&mut **tx)
                        .await?;

                    let closed = match closed {
                        Some(request) => request,
                        None => {
                            let current = sqlx::query_as::<_, SellRequest>(queries::GET_SELL_REQUEST)
                                .bind(award.sell_request_id)
                                .fetch_optional(&mut **tx)
                                .await?;
                            return Err(explain_rejected_transition(
                                award.sell_request_id,
                                award.seller_id,
                                current.as_ref(),
                            ));
                        }
                    };

                    let selected = sqlx::query_as::<_, PurchaseOffer>(queries::MARK_OFFER_SELECTED)
                        .bind(award.offer_id)
                        .bind(award.sell_request_id)
                        .bind(award.at)
                        .fetch_optional(&mut **tx)
                        .await
                        .map_err(|e| unique_violation_as_conflict(e, "이미 낙찰된 제안이 있습니다"))?
                        .ok_or_else(|| {
                            MarketError::StateConflict(format!(
                                "매입 제안 {}은(는) 이미 낙찰되었습니다",
                                award.offer_id
                            ))
                        })?;

                    Ok((closed, selected))
                })
            })
            .await;

        if let Err(e) = &result {
            warn!(
                "{:<12} --> 낙찰 롤백 sell_request: {}, 사유: {}",
                "Store", award.sell_request_id, e
            );
        }
        result
    }
}

// endregion: --- Postgres Market Store

// region:    --- Tests
// Postgres 가 필요하다: DATABASE_URL=postgres://... cargo test -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::market::model::Category;

    async fn setup() -> PostgresMarketStore {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL").unwrap(),
            max_connections: 5,
            reset: false,
        };
        let db_manager = DatabaseManager::new(&config).await.unwrap();
        db_manager.initialize_database(false).await.unwrap();
        PostgresMarketStore::new(Arc::new(db_manager))
    }

    async fn open_request(store: &PostgresMarketStore, seller_id: i64) -> SellRequest {
        store
            .insert_sell_request(NewSellRequest {
                seller_id,
                title: "ThinkPad X1".to_string(),
                description: "2022년식".to_string(),
                image_urls: vec!["a.jpg".to_string(), "b.jpg".to_string()],
                desired_price: Some("80만원".to_string()),
                category: Category::Computer,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    fn bid(sell_request_id: i64, wholesaler_id: i64, offer_price: i64) -> NewPurchaseOffer {
        NewPurchaseOffer {
            sell_request_id,
            wholesaler_id,
            wholesaler_name: format!("W{}", wholesaler_id),
            offer_price,
            message: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_duplicate_offer_rejected() {
        let store = setup().await;
        let request = open_request(&store, 1).await;

        store.insert_offer(bid(request.id, 20, 500_000)).await.unwrap();
        let second = store.insert_offer(bid(request.id, 20, 550_000)).await;
        assert!(matches!(second, Err(MarketError::DuplicateOffer { .. })));
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_concurrent_award_single_winner() {
        let store = Arc::new(setup().await);
        let request = open_request(&store, 2).await;
        let a = store.insert_offer(bid(request.id, 30, 500_000)).await.unwrap();
        let b = store.insert_offer(bid(request.id, 31, 600_000)).await.unwrap();
        let sell_request_id = request.id;

        let handles: Vec<_> = [a.id, b.id]
            .into_iter()
            .map(|offer_id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .award_offer(Award {
                            sell_request_id,
                            offer_id,
                            seller_id: 2,
                            at: Utc::now(),
                        })
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, MarketError::StateConflict(_))),
            }
        }
        assert_eq!(winners, 1);

        let selected = store
            .list_offers(request.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|o| o.is_selected)
            .count();
        assert_eq!(selected, 1);
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_offer_after_cancel_is_invalid_state() {
        let store = setup().await;
        let request = open_request(&store, 3).await;
        store
            .cancel_sell_request(request.id, 3, Utc::now())
            .await
            .unwrap();

        let result = store.insert_offer(bid(request.id, 40, 100_000)).await;
        assert!(matches!(
            result,
            Err(MarketError::InvalidState {
                status: SellRequestStatus::Cancelled,
                ..
            })
        ));
    }
    #[tokio::test]
    #[ignore]
    async fn postgres_select_on_cancelled_request_changes_nothing() {
        let store = setup().await;
        let request = open_request(&store, 4).await;
        let first = store.insert_offer(bid(request.id, 50, 300_000)).await.unwrap();
        let second = store.insert_offer(bid(request.id, 51, 350_000)).await.unwrap();
        let cancelled = store
            .cancel_sell_request(request.id, 4, Utc::now())
            .await
            .unwrap();

        let result = store
            .award_offer(Award {
                sell_request_id: request.id,
                offer_id: first.id,
                seller_id: 4,
                at: Utc::now(),
            })
            .await;
        assert!(matches!(result, Err(MarketError::StateConflict(_))));

        let row = store.get_sell_request(request.id).await.unwrap().unwrap();
        assert_eq!(row, cancelled);
        assert!(row.selected_wholesaler_id.is_none());
        assert_eq!(
            store.list_offers(request.id).await.unwrap(),
            vec![second, first]
        );

        // 기존 입찰자의 재입찰은 취소 후에도 중복
        let repeat = store.insert_offer(bid(request.id, 50, 400_000)).await;
        assert!(matches!(repeat, Err(MarketError::DuplicateOffer { .. })));
    }

    #[tokio::test]
    #[ignore]
    async fn postgres_schema_guards_selection_invariants() {
        let store = setup().await;
        let request = open_request(&store, 5).await;
        let winner = store.insert_offer(bid(request.id, 60, 500_000)).await.unwrap();
        let other = store.insert_offer(bid(request.id, 61, 450_000)).await.unwrap();

        // CLOSED 인데 낙찰 도매상이 없으면 CHECK 위반
        let closed_without_winner =
            sqlx::query("UPDATE sell_requests SET status = 'CLOSED' WHERE id = $1")
                .bind(request.id)
                .execute(store.db_manager.pool())
                .await;
        let err = closed_without_winner.unwrap_err();
        let db_err = err.as_database_error().unwrap();
        assert_eq!(db_err.code().as_deref(), Some("23514"));

        store
            .award_offer(Award {
                sell_request_id: request.id,
                offer_id: winner.id,
                seller_id: 5,
                at: Utc::now(),
            })
            .await
            .unwrap();

        // 같은 판매 요청에 두 번째 낙찰 표시는 부분 고유 인덱스 위반
        let second_selected =
            sqlx::query("UPDATE purchase_offers SET is_selected = TRUE WHERE id = $1")
                .bind(other.id)
                .execute(store.db_manager.pool())
                .await;
        let err = second_selected.unwrap_err();
        let db_err = err.as_database_error().unwrap();
        assert_eq!(db_err.code().as_deref(), Some("23505"));
    }
}
// endregion: --- Tests
