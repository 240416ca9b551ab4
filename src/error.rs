// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::market::model::SellRequestStatus;

// endregion: --- Imports

// region:    --- Error Kind
/// 프레젠테이션 계층이 사용자 메시지로 번역하는 오류 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Authorization,
    StateConflict,
    NotFound,
    Persistence,
}

// endregion: --- Error Kind

// region:    --- Market Error
/// 매칭 코어 오류
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("입력값이 올바르지 않습니다: {0}")]
    Validation(String),

    #[error("권한이 없습니다: {0}")]
    Authorization(String),

    #[error("이미 매입 제안을 등록했습니다: sell_request={sell_request_id}, wholesaler={wholesaler_id}")]
    DuplicateOffer {
        sell_request_id: i64,
        wholesaler_id: i64,
    },

    #[error("판매 요청이 진행 중이 아닙니다: sell_request={sell_request_id}, status={status}")]
    InvalidState {
        sell_request_id: i64,
        status: SellRequestStatus,
    },

    #[error("상태 충돌: {0}")]
    StateConflict(String),

    #[error("{0}을(를) 찾을 수 없습니다")]
    NotFound(String),

    #[error("저장소 오류: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// 편의 타입
pub type MarketResult<T> = Result<T, MarketError>;

impl MarketError {
    /// 오류 분류
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::Validation(_) => ErrorKind::Validation,
            MarketError::Authorization(_) => ErrorKind::Authorization,
            MarketError::DuplicateOffer { .. }
            | MarketError::InvalidState { .. }
            | MarketError::StateConflict(_) => ErrorKind::StateConflict,
            MarketError::NotFound(_) => ErrorKind::NotFound,
            MarketError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// 응답 본문의 세부 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::Validation(_) => "VALIDATION",
            MarketError::Authorization(_) => "UNAUTHORIZED",
            MarketError::DuplicateOffer { .. } => "DUPLICATE_OFFER",
            MarketError::InvalidState { .. } => "INVALID_STATE",
            MarketError::StateConflict(_) => "STATE_CONFLICT",
            MarketError::NotFound(_) => "NOT_FOUND",
            MarketError::Persistence(_) => "PERSISTENCE",
        }
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        MarketError::NotFound(format!("{} {}", what, id))
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::StateConflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Persistence => {
                error!("{:<12} --> 저장소 오류: {:?}", "Handler", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
                "kind": self.kind(),
            })),
        )
            .into_response()
    }
}

// endregion: --- Market Error

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_and_invalid_state_are_state_conflicts() {
        let duplicate = MarketError::DuplicateOffer {
            sell_request_id: 1,
            wholesaler_id: 2,
        };
        let invalid = MarketError::InvalidState {
            sell_request_id: 1,
            status: SellRequestStatus::Closed,
        };

        assert_eq!(duplicate.kind(), ErrorKind::StateConflict);
        assert_eq!(invalid.kind(), ErrorKind::StateConflict);
        assert_eq!(duplicate.code(), "DUPLICATE_OFFER");
        assert!(invalid.to_string().contains("CLOSED"));
    }

    #[test]
    fn test_error_response_status() {
        let response = MarketError::Authorization("판매자가 아닙니다".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = MarketError::not_found("판매 요청", 7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = MarketError::StateConflict("이미 마감".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
// endregion: --- Tests
