// region:    --- Sell Requests
/// 판매 요청 등록
pub const INSERT_SELL_REQUEST: &str = r#"
    INSERT INTO sell_requests (seller_id, title, description, image_urls, desired_price, category, status, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, 'OPEN', $7)
    RETURNING id, seller_id, title, description, image_urls, desired_price, category, status,
              selected_wholesaler_id, created_at, updated_at, closed_at
"#;

/// 판매 요청 조회
pub const GET_SELL_REQUEST: &str = r#"
    SELECT id, seller_id, title, description, image_urls, desired_price, category, status,
           selected_wholesaler_id, created_at, updated_at, closed_at
    FROM sell_requests
    WHERE id = $1
"#;

/// 진행 중인 판매 요청 목록 (최신순)
pub const GET_OPEN_SELL_REQUESTS: &str = r#"
    SELECT id, seller_id, title, description, image_urls, desired_price, category, status,
           selected_wholesaler_id, created_at, updated_at, closed_at
    FROM sell_requests
    WHERE status = 'OPEN'
    ORDER BY created_at DESC, id DESC
"#;

/// 판매자별 판매 요청 목록 (최신순)
pub const GET_SELL_REQUESTS_BY_SELLER: &str = r#"
    SELECT id, seller_id, title, description, image_urls, desired_price, category, status,
           selected_wholesaler_id, created_at, updated_at, closed_at
    FROM sell_requests
    WHERE seller_id = $1
    ORDER BY created_at DESC, id DESC
"#;

/// 입찰 등록 전 상태 확인 (마감과 동시에 입찰이 들어오지 않도록 공유 잠금)
pub const LOCK_SELL_REQUEST_STATUS: &str =
    "SELECT status FROM sell_requests WHERE id = $1 FOR SHARE";

/// 판매 요청 취소 (OPEN 상태에서만)
pub const CANCEL_SELL_REQUEST: &str = r#"
    UPDATE sell_requests
    SET status = 'CANCELLED', updated_at = $3
    WHERE id = $1 AND seller_id = $2 AND status = 'OPEN'
    RETURNING id, seller_id, title, description, image_urls, desired_price, category, status,
              selected_wholesaler_id, created_at, updated_at, closed_at
"#;

/// 판매 요청 마감 (OPEN 상태에서만)
pub const CLOSE_SELL_REQUEST: &str = r#"
    UPDATE sell_requests
    SET status = 'CLOSED', selected_wholesaler_id = $3, closed_at = $4, updated_at = $4
    WHERE id = $1 AND seller_id = $2 AND status = 'OPEN'
    RETURNING id, seller_id, title, description, image_urls, desired_price, category, status,
              selected_wholesaler_id, created_at, updated_at, closed_at
"#;

// endregion: --- Sell Requests

// region:    --- Purchase Offers
/// 매입 제안 등록 (판매 요청당 도매상 하나)
pub const INSERT_OFFER: &str = r#"
    INSERT INTO purchase_offers (sell_request_id, wholesaler_id, wholesaler_name, offer_price, message, is_selected, created_at)
    VALUES ($1, $2, $3, $4, $5, FALSE, $6)
    ON CONFLICT (sell_request_id, wholesaler_id) DO NOTHING
    RETURNING id, sell_request_id, wholesaler_id, wholesaler_name, offer_price, message,
              is_selected, created_at, updated_at
"#;

/// 매입 제안 조회
pub const GET_OFFER: &str = r#"
    SELECT id, sell_request_id, wholesaler_id, wholesaler_name, offer_price, message,
           is_selected, created_at, updated_at
    FROM purchase_offers
    WHERE id = $1
"#;

/// 도매상의 매입 제안 조회
pub const FIND_OFFER_BY_WHOLESALER: &str = r#"
    SELECT id, sell_request_id, wholesaler_id, wholesaler_name, offer_price, message,
           is_selected, created_at, updated_at
    FROM purchase_offers
    WHERE sell_request_id = $1 AND wholesaler_id = $2
"#;

/// 매입 제안 목록 (가격 내림차순, 동일 가격은 먼저 들어온 순)
pub const GET_OFFERS: &str = r#"
    SELECT id, sell_request_id, wholesaler_id, wholesaler_name, offer_price, message,
           is_selected, created_at, updated_at
    FROM purchase_offers
    WHERE sell_request_id = $1
    ORDER BY offer_price DESC, created_at ASC, id ASC
"#;

/// 낙찰 표시 (한 번만)
pub const MARK_OFFER_SELECTED: &str = r#"
    UPDATE purchase_offers
    SET is_selected = TRUE, updated_at = $3
    WHERE id = $1 AND sell_request_id = $2 AND is_selected = FALSE
    RETURNING id, sell_request_id, wholesaler_id, wholesaler_name, offer_price, message,
              is_selected, created_at, updated_at
"#;

// endregion: --- Purchase Offers

// region:    --- Transactions
/// 제안 id로 거래 조회
pub const GET_TRANSACTION_BY_OFFER: &str = r#"
    SELECT id, sell_request_id, purchase_offer_id, wholesaler_id, seller_id, status, created_at, completed_at
    FROM transactions
    WHERE purchase_offer_id = $1
"#;

/// 거래 조회 (완료 실패 원인 판별)
pub const GET_TRANSACTION: &str = r#"
    SELECT id, sell_request_id, purchase_offer_id, wholesaler_id, seller_id, status, created_at, completed_at
    FROM transactions
    WHERE id = $1
"#;

/// 거래 생성
pub const INSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (sell_request_id, purchase_offer_id, wholesaler_id, seller_id, status, created_at)
    VALUES ($1, $2, $3, $4, 'IN_PROGRESS', $5)
    ON CONFLICT (purchase_offer_id) DO NOTHING
    RETURNING id
"#;

/// 거래 완료 (진행 중일 때만)
pub const COMPLETE_TRANSACTION: &str = r#"
    UPDATE transactions
    SET status = 'COMPLETED', completed_at = $2
    WHERE id = $1 AND status = 'IN_PROGRESS'
    RETURNING id
"#;

// endregion: --- Transactions

/// 스키마 존재 여부
pub const SCHEMA_EXISTS: &str =
    "SELECT to_regclass('public.sell_requests') IS NOT NULL AS schema_exists";
