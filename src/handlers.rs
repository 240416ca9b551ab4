// region:    --- Imports
use crate::error::MarketError;
use crate::identity::{caller_from_headers, require_caller};
use crate::market::commands::{CreateSellRequestCommand, SubmitOfferCommand};
use crate::market::service::MarketService;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

pub type AppState = Arc<MarketService>;

// region:    --- Router
/// 라우터 설정
pub fn router(service: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/sell-requests",
            post(handle_create_sell_request).get(handle_list_open_sell_requests),
        )
        .route("/sell-requests/mine", get(handle_list_my_sell_requests))
        .route("/sell-requests/:id", get(handle_get_sell_request))
        .route("/sell-requests/:id/cancel", post(handle_cancel_sell_request))
        .route(
            "/sell-requests/:id/offers",
            post(handle_submit_offer).get(handle_list_offers),
        )
        .route(
            "/sell-requests/:id/offers/:offer_id/select",
            post(handle_select_offer),
        )
        .route("/offers/:offer_id/transaction", post(handle_open_transaction))
        .route(
            "/offers/:offer_id/transaction/complete",
            post(handle_complete_transaction),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(service)
}

// endregion: --- Router

// region:    --- Command Handlers

/// 판매 요청 등록
pub async fn handle_create_sell_request(
    State(service): State<AppState>,
    headers: HeaderMap,
    Json(cmd): Json<CreateSellRequestCommand>,
) -> Result<impl IntoResponse, MarketError> {
    let caller = require_caller(&headers)?;
    info!("{:<12} --> 판매 요청 등록: {:?}", "Handler", cmd);
    let request = service.create_sell_request(cmd, &caller).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// 판매 요청 취소
pub async fn handle_cancel_sell_request(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    let caller = require_caller(&headers)?;
    let request = service.cancel_sell_request(id, &caller).await?;
    Ok(Json(request))
}

/// 매입 제안 등록
pub async fn handle_submit_offer(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(cmd): Json<SubmitOfferCommand>,
) -> Result<impl IntoResponse, MarketError> {
    let caller = require_caller(&headers)?;
    let offer = service.submit_offer(id, cmd, &caller).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "매입 제안이 등록되었습니다.",
            "offer_id": offer.id,
            "offer": offer,
        })),
    ))
}

/// 낙찰
pub async fn handle_select_offer(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path((id, offer_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, MarketError> {
    let caller = require_caller(&headers)?;
    let selection = service.select_offer(id, offer_id, &caller).await?;
    Ok(Json(selection))
}

/// 거래 시작 (없으면 생성)
pub async fn handle_open_transaction(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(offer_id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    let caller = require_caller(&headers)?;
    let transaction = service.open_transaction(offer_id, &caller).await?;
    Ok(Json(transaction))
}

/// 거래 완료
pub async fn handle_complete_transaction(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(offer_id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    let caller = require_caller(&headers)?;
    let transaction = service.complete_transaction(offer_id, &caller).await?;
    Ok(Json(transaction))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 진행 중인 판매 요청 목록
pub async fn handle_list_open_sell_requests(
    State(service): State<AppState>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(service.list_open_sell_requests().await?))
}

/// 내 판매 요청 목록
pub async fn handle_list_my_sell_requests(
    State(service): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, MarketError> {
    let caller = require_caller(&headers)?;
    Ok(Json(service.list_my_sell_requests(&caller).await?))
}

/// 판매 요청 조회
pub async fn handle_get_sell_request(
    State(service): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(service.get_sell_request(id).await?))
}

/// 매입 제안 목록 (익명 허용, 빈 목록)
pub async fn handle_list_offers(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    let viewer = caller_from_headers(&headers)?;
    let offers = service.list_offers(id, viewer.as_ref()).await?;
    Ok(Json(offers))
}

// endregion: --- Query Handlers
