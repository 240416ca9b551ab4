/// 메모리 저장소
/// 하나의 잠금 아래에서 확인과 쓰기를 함께 수행해 Postgres 구현과 같은 원자성을 보장한다.
// region:    --- Imports
use super::{
    check_offer_belongs, explain_rejected_transition, validate_new_offer, Award, MarketStore,
};
use crate::error::{MarketError, MarketResult};
use crate::market::model::{
    sort_offers, NewPurchaseOffer, NewSellRequest, PurchaseOffer, SellRequest, SellRequestStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

// endregion: --- Imports

// region:    --- In-Memory Market Store
#[derive(Default)]
struct MarketState {
    last_request_id: i64,
    last_offer_id: i64,
    requests: BTreeMap<i64, SellRequest>,
    offers: BTreeMap<i64, PurchaseOffer>,
}

#[derive(Default)]
pub struct InMemoryMarketStore {
    state: Mutex<MarketState>,
    #[cfg(test)]
    fail_next_offer_flag: AtomicBool,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn insert_sell_request(&self, new: NewSellRequest) -> MarketResult<SellRequest> {
        let mut state = self.state.lock().await;
        state.last_request_id += 1;
        let request = SellRequest {
            id: state.last_request_id,
            seller_id: new.seller_id,
            title: new.title,
            description: new.description,
            image_urls: new.image_urls,
            desired_price: new.desired_price,
            category: new.category,
            status: SellRequestStatus::Open,
            selected_wholesaler_id: None,
            created_at: new.created_at,
            updated_at: None,
            closed_at: None,
        };
        state.requests.insert(request.id, request.clone());
        info!("{:<12} --> 판매 요청 저장 id: {}", "MemStore", request.id);
        Ok(request)
    }

    async fn get_sell_request(&self, id: i64) -> MarketResult<Option<SellRequest>> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn list_open_sell_requests(&self) -> MarketResult<Vec<SellRequest>> {
        let state = self.state.lock().await;
        let mut requests: Vec<SellRequest> = state
            .requests
            .values()
            .filter(|r| r.is_open())
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn list_sell_requests_by_seller(&self, seller_id: i64) -> MarketResult<Vec<SellRequest>> {
        let state = self.state.lock().await;
        let mut requests: Vec<SellRequest> = state
            .requests
            .values()
            .filter(|r| r.seller_id == seller_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn cancel_sell_request(
        &self,
        id: i64,
        seller_id: i64,
        at: DateTime<Utc>,
    ) -> MarketResult<SellRequest> {
        let mut state = self.state.lock().await;
        match state.requests.get_mut(&id) {
            Some(request) if request.seller_id == seller_id && request.is_open() => {
                request.status = SellRequestStatus::Cancelled;
                request.updated_at = Some(at);
                Ok(request.clone())
            }
            current => Err(explain_rejected_transition(
                id,
                seller_id,
                current.as_deref(),
            )),
        }
    }

    async fn insert_offer(&self, new: NewPurchaseOffer) -> MarketResult<PurchaseOffer> {
        validate_new_offer(&new)?;
        let mut state = self.state.lock().await;

        let request = state
            .requests
            .get(&new.sell_request_id)
            .ok_or_else(|| MarketError::not_found("판매 요청", new.sell_request_id))?;
        let duplicate = state.offers.values().any(|o| {
            o.sell_request_id == new.sell_request_id && o.wholesaler_id == new.wholesaler_id
        });
        if duplicate {
            return Err(MarketError::DuplicateOffer {
                sell_request_id: new.sell_request_id,
                wholesaler_id: new.wholesaler_id,
            });
        }
        if !request.is_open() {
            return Err(MarketError::InvalidState {
                sell_request_id: new.sell_request_id,
                status: request.status,
            });
        }

        state.last_offer_id += 1;
        let offer = PurchaseOffer {
            id: state.last_offer_id,
            sell_request_id: new.sell_request_id,
            wholesaler_id: new.wholesaler_id,
            wholesaler_name: new.wholesaler_name,
            offer_price: new.offer_price,
            message: new.message,
            is_selected: false,
            created_at: new.created_at,
            updated_at: None,
        };
        state.offers.insert(offer.id, offer.clone());
        info!("{:<12} --> 매입 제안 저장 id: {}", "MemStore", offer.id);
        Ok(offer)
    }

    async fn get_offer(&self, id: i64) -> MarketResult<Option<PurchaseOffer>> {
        Ok(self.state.lock().await.offers.get(&id).cloned())
    }

    async fn find_offer(
        &self,
        sell_request_id: i64,
        wholesaler_id: i64,
    ) -> MarketResult<Option<PurchaseOffer>> {
        let state = self.state.lock().await;
        Ok(state
            .offers
            .values()
            .find(|o| o.sell_request_id == sell_request_id && o.wholesaler_id == wholesaler_id)
            .cloned())
    }

    async fn list_offers(&self, sell_request_id: i64) -> MarketResult<Vec<PurchaseOffer>> {
        let state = self.state.lock().await;
        let mut offers: Vec<PurchaseOffer> = state
            .offers
            .values()
            .filter(|o| o.sell_request_id == sell_request_id)
            .cloned()
            .collect();
        sort_offers(&mut offers);
        Ok(offers)
    }

    async fn award_offer(&self, award: Award) -> MarketResult<(SellRequest, PurchaseOffer)> {
        let mut state = self.state.lock().await;

        let offer = check_offer_belongs(
            state.offers.get(&award.offer_id).cloned(),
            award.offer_id,
            award.sell_request_id,
        )?;

        // 1단계: 판매 요청 마감을 사본에 준비
        let mut closed = match state.requests.get(&award.sell_request_id) {
            Some(request) if request.seller_id == award.seller_id && request.is_open() => {
                request.clone()
            }
            current => {
                return Err(explain_rejected_transition(
                    award.sell_request_id,
                    award.seller_id,
                    current,
                ))
            }
        };
        closed.status = SellRequestStatus::Closed;
        closed.selected_wholesaler_id = Some(offer.wholesaler_id);
        closed.closed_at = Some(award.at);
        closed.updated_at = Some(award.at);

        // 2단계: 낙찰 표시를 사본에 준비
        let already_selected = state
            .offers
            .values()
            .any(|o| o.sell_request_id == award.sell_request_id && o.is_selected);
        if already_selected {
            warn!(
                "{:<12} --> 낙찰 거부: 이미 낙찰된 제안 존재 sell_request: {}",
                "MemStore", award.sell_request_id
            );
            return Err(MarketError::StateConflict(
                "이미 낙찰된 제안이 있습니다".to_string(),
            ));
        }
        let mut selected = offer;
        selected.is_selected = true;
        selected.updated_at = Some(award.at);

        #[cfg(test)]
        if self.fail_next_offer_flag.swap(false, Ordering::SeqCst) {
            warn!("{:<12} --> 낙찰 표시 실패 주입", "MemStore");
            return Err(MarketError::Persistence(sqlx::Error::Protocol(
                "injected offer flag failure".to_string(),
            )));
        }

        // 두 단계 모두 준비되었을 때만 반영
        state.requests.insert(closed.id, closed.clone());
        state.offers.insert(selected.id, selected.clone());
        info!(
            "{:<12} --> 낙찰 완료 sell_request: {}, offer: {}",
            "MemStore", closed.id, selected.id
        );
        Ok((closed, selected))
    }
}

// endregion: --- In-Memory Market Store

// endregion: --- Tests
