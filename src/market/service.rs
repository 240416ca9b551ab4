/// 역경매 매칭 서비스
/// 모든 연산은 호출자를 명시적으로 전달받고, 자격/조회 정책은 policy 모듈 하나만 사용한다.
// region:    --- Imports
use crate::clock::{Clock, SystemClock};
use crate::error::{MarketError, MarketResult};
use crate::identity::{Caller, Role};
use crate::ledger::{NewTransaction, Transaction, TransactionLedger};
use crate::market::commands::{CreateSellRequestCommand, SubmitOfferCommand};
use crate::market::events::MarketEvent;
use crate::market::model::{NewPurchaseOffer, NewSellRequest, PurchaseOffer, SellRequest};
use crate::notify::{MarketEventPublisher, NoopPublisher};
use crate::policy;
use crate::store::{Award, MarketStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Market Service
/// 낙찰 결과
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub sell_request: SellRequest,
    pub offer: PurchaseOffer,
}

pub struct MarketService {
    store: Arc<dyn MarketStore>,
    ledger: Arc<dyn TransactionLedger>,
    publisher: Arc<dyn MarketEventPublisher>,
    clock: Arc<dyn Clock>,
}

impl MarketService {
    pub fn new(store: Arc<dyn MarketStore>, ledger: Arc<dyn TransactionLedger>) -> Self {
        Self {
            store,
            ledger,
            publisher: Arc::new(NoopPublisher),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn MarketEventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 커밋 이후 발행. 실패해도 연산 결과는 유지
    async fn publish(&self, event: MarketEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "{:<12} --> 이벤트 발행 실패 {}: {}",
                "Command",
                event.event_type(),
                e
            );
        }
    }

    async fn load_sell_request(&self, id: i64) -> MarketResult<SellRequest> {
        self.store
            .get_sell_request(id)
            .await?
            .ok_or_else(|| MarketError::not_found("판매 요청", id))
    }

    async fn load_offer(&self, id: i64) -> MarketResult<PurchaseOffer> {
        self.store
            .get_offer(id)
            .await?
            .ok_or_else(|| MarketError::not_found("매입 제안", id))
    }

    // region:    --- Sell Requests

    /// 판매 요청 등록 (일반 판매자만)
    pub async fn create_sell_request(
        &self,
        cmd: CreateSellRequestCommand,
        caller: &Caller,
    ) -> MarketResult<SellRequest> {
        info!(
            "{:<12} --> 판매 요청 등록 시작 seller: {}",
            "Command", caller.id
        );
        if caller.role != Role::Seller {
            return Err(MarketError::Authorization(
                "일반 판매자만 판매 요청을 등록할 수 있습니다".to_string(),
            ));
        }
        cmd.validate()?;

        let request = self
            .store
            .insert_sell_request(NewSellRequest {
                seller_id: caller.id,
                title: cmd.title.trim().to_string(),
                description: cmd.description,
                image_urls: cmd.image_urls,
                desired_price: cmd.desired_price.filter(|p| !p.trim().is_empty()),
                category: cmd.category,
                created_at: self.clock.now(),
            })
            .await?;

        self.publish(MarketEvent::SellRequestCreated {
            sell_request_id: request.id,
            seller_id: request.seller_id,
            timestamp: request.created_at,
        })
        .await;
        Ok(request)
    }

    /// 판매 요청 조회
    pub async fn get_sell_request(&self, id: i64) -> MarketResult<SellRequest> {
        info!("{:<12} --> 판매 요청 조회 id: {}", "Query", id);
        self.load_sell_request(id).await
    }

    /// 진행 중인 판매 요청 목록
    pub async fn list_open_sell_requests(&self) -> MarketResult<Vec<SellRequest>> {
        info!("{:<12} --> 진행 중인 판매 요청 목록 조회", "Query");
        self.store.list_open_sell_requests().await
    }

    /// 내 판매 요청 목록
    pub async fn list_my_sell_requests(&self, caller: &Caller) -> MarketResult<Vec<SellRequest>> {
        info!("{:<12} --> 내 판매 요청 목록 seller: {}", "Query", caller.id);
        self.store.list_sell_requests_by_seller(caller.id).await
    }

    /// 판매 요청 취소 (소유자만, OPEN 에서만)
    pub async fn cancel_sell_request(
        &self,
        sell_request_id: i64,
        caller: &Caller,
    ) -> MarketResult<SellRequest> {
        info!(
            "{:<12} --> 판매 요청 취소 id: {}, caller: {}",
            "Command", sell_request_id, caller.id
        );
        let cancelled = self
            .store
            .cancel_sell_request(sell_request_id, caller.id, self.clock.now())
            .await?;

        self.publish(MarketEvent::SellRequestCancelled {
            sell_request_id,
            timestamp: cancelled.updated_at.unwrap_or_else(|| self.clock.now()),
        })
        .await;
        Ok(cancelled)
    }

    // endregion: --- Sell Requests

    // region:    --- Offers

    /// 매입 제안 등록
    pub async fn submit_offer(
        &self,
        sell_request_id: i64,
        cmd: SubmitOfferCommand,
        caller: &Caller,
    ) -> MarketResult<PurchaseOffer> {
        info!(
            "{:<12} --> 매입 제안 등록 시작 sell_request: {}, wholesaler: {}",
            "Command", sell_request_id, caller.id
        );
        cmd.validate()?;

        let request = self.load_sell_request(sell_request_id).await?;
        let existing = self.store.find_offer(sell_request_id, caller.id).await?;
        if let Some(reason) = policy::ineligibility_reason(caller, &request, existing.as_ref()) {
            info!("{:<12} --> 입찰 불가: {}", "Command", reason);
            return Err(reason);
        }

        // 저장소가 상태와 중복 여부를 쓰기 시점에 다시 확인한다
        let offer = self
            .store
            .insert_offer(NewPurchaseOffer {
                sell_request_id,
                wholesaler_id: caller.id,
                wholesaler_name: caller.name.clone(),
                offer_price: cmd.offer_price,
                message: cmd.normalized_message(),
                created_at: self.clock.now(),
            })
            .await?;

        self.publish(MarketEvent::OfferSubmitted {
            sell_request_id,
            offer_id: offer.id,
            wholesaler_id: offer.wholesaler_id,
            timestamp: offer.created_at,
        })
        .await;
        Ok(offer)
    }

    /// 매입 제안 목록 (블라인드 입찰 필터 적용)
    pub async fn list_offers(
        &self,
        sell_request_id: i64,
        viewer: Option<&Caller>,
    ) -> MarketResult<Vec<PurchaseOffer>> {
        info!(
            "{:<12} --> 매입 제안 목록 조회 sell_request: {}",
            "Query", sell_request_id
        );
        let request = self.load_sell_request(sell_request_id).await?;
        let offers = self.store.list_offers(sell_request_id).await?;
        Ok(policy::visible_offers(viewer, &request, offers))
    }

    // endregion: --- Offers

    // region:    --- Selection

    /// 낙찰: 판매 요청 마감과 제안 낙찰 표시를 원자적으로 처리
    pub async fn select_offer(
        &self,
        sell_request_id: i64,
        offer_id: i64,
        caller: &Caller,
    ) -> MarketResult<Selection> {
        info!(
            "{:<12} --> 낙찰 요청 sell_request: {}, offer: {}",
            "Command", sell_request_id, offer_id
        );
        let request = self.load_sell_request(sell_request_id).await?;
        if request.seller_id != caller.id {
            return Err(MarketError::Authorization(
                "판매 요청 소유자만 낙찰할 수 있습니다".to_string(),
            ));
        }
        if !request.is_open() {
            return Err(MarketError::StateConflict(format!(
                "판매 요청 {}은(는) 이미 {} 상태입니다",
                sell_request_id, request.status
            )));
        }

        let offer = self.load_offer(offer_id).await?;
        if offer.sell_request_id != sell_request_id {
            return Err(MarketError::Validation(format!(
                "매입 제안 {}은(는) 판매 요청 {}에 속하지 않습니다",
                offer_id, sell_request_id
            )));
        }
        if offer.is_selected {
            return Err(MarketError::StateConflict(format!(
                "매입 제안 {}은(는) 이미 낙찰되었습니다",
                offer_id
            )));
        }

        // 앞선 조회는 신뢰하지 않는다. 저장소의 조건부 쓰기가 최종 판단
        let (sell_request, offer) = self
            .store
            .award_offer(Award {
                sell_request_id,
                offer_id,
                seller_id: caller.id,
                at: self.clock.now(),
            })
            .await?;

        info!(
            "{:<12} --> 낙찰 완료 sell_request: {}, wholesaler: {}",
            "Command", sell_request.id, offer.wholesaler_id
        );
        self.publish(MarketEvent::OfferSelected {
            sell_request_id,
            offer_id,
            wholesaler_id: offer.wholesaler_id,
            timestamp: offer.updated_at.unwrap_or_else(|| self.clock.now()),
        })
        .await;

        Ok(Selection {
            sell_request,
            offer,
        })
    }

    // endregion: --- Selection

    // region:    --- Transactions

    /// 거래 당사자(판매자 또는 낙찰 도매상) 확인
    async fn load_awarded_deal(
        &self,
        offer_id: i64,
        caller: &Caller,
    ) -> MarketResult<(SellRequest, PurchaseOffer)> {
        let offer = self.load_offer(offer_id).await?;
        let request = self.load_sell_request(offer.sell_request_id).await?;

        if caller.id != offer.wholesaler_id && caller.id != request.seller_id {
            return Err(MarketError::Authorization(
                "거래 당사자만 접근할 수 있습니다".to_string(),
            ));
        }
        if !offer.is_selected {
            return Err(MarketError::StateConflict(format!(
                "매입 제안 {}은(는) 낙찰되지 않았습니다",
                offer_id
            )));
        }
        Ok((request, offer))
    }

    /// 기존 거래를 찾거나 처음 시도할 때 생성
    async fn ensure_transaction(
        &self,
        request: &SellRequest,
        offer: &PurchaseOffer,
    ) -> MarketResult<Transaction> {
        if let Some(existing) = self.ledger.get_by_offer_id(offer.id).await? {
            return Ok(existing);
        }

        let created = self
            .ledger
            .create(NewTransaction {
                sell_request_id: request.id,
                purchase_offer_id: offer.id,
                wholesaler_id: offer.wholesaler_id,
                seller_id: request.seller_id,
                created_at: self.clock.now(),
            })
            .await;

        let created_here = match created {
            Ok(_) => true,
            // 동시에 생성된 경우 먼저 만들어진 거래를 사용
            Err(MarketError::StateConflict(_)) => {
                info!("{:<12} --> 거래가 동시에 생성됨 offer: {}", "Command", offer.id);
                false
            }
            Err(e) => return Err(e),
        };

        let transaction = self
            .ledger
            .get_by_offer_id(offer.id)
            .await?
            .ok_or_else(|| MarketError::not_found("거래", offer.id))?;

        if created_here {
            self.publish(MarketEvent::TransactionOpened {
                transaction_id: transaction.id,
                sell_request_id: transaction.sell_request_id,
                purchase_offer_id: transaction.purchase_offer_id,
                timestamp: transaction.created_at,
            })
            .await;
        }
        Ok(transaction)
    }

    /// 거래 시작: 있으면 기존 거래, 없으면 처음 시도할 때 생성
    pub async fn open_transaction(
        &self,
        offer_id: i64,
        caller: &Caller,
    ) -> MarketResult<Transaction> {
        info!(
            "{:<12} --> 거래 시작 offer: {}, caller: {}",
            "Command", offer_id, caller.id
        );
        let (request, offer) = self.load_awarded_deal(offer_id, caller).await?;
        self.ensure_transaction(&request, &offer).await
    }

    /// 거래 완료. 아직 거래가 없으면 먼저 생성하고, 이미 완료된 거래는 거부
    pub async fn complete_transaction(
        &self,
        offer_id: i64,
        caller: &Caller,
    ) -> MarketResult<Transaction> {
        info!(
            "{:<12} --> 거래 완료 요청 offer: {}, caller: {}",
            "Command", offer_id, caller.id
        );
        let (request, offer) = self.load_awarded_deal(offer_id, caller).await?;
        let transaction = self.ensure_transaction(&request, &offer).await?;

        self.ledger.complete(transaction.id, self.clock.now()).await?;

        let completed = self
            .ledger
            .get_by_offer_id(offer_id)
            .await?
            .ok_or_else(|| MarketError::not_found("거래", transaction.id))?;

        self.publish(MarketEvent::TransactionCompleted {
            transaction_id: completed.id,
            timestamp: completed.completed_at.unwrap_or_else(|| self.clock.now()),
        })
        .await;
        Ok(completed)
    }

    // endregion: --- Transactions
}

// endregion: --- Market Service
