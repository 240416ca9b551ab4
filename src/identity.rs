/// 호출자 식별 정보
/// 인증은 외부 계층이 담당하고, 코어의 모든 연산은 호출자를 명시적으로 전달받는다.
// region:    --- Imports
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MarketError;

// endregion: --- Imports

// region:    --- Caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Seller,
    Wholesaler,
}

/// 도매상 사업자 인증 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub verification: VerificationStatus,
    pub admin_override: bool,
}

impl Caller {
    pub fn seller(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: Role::Seller,
            verification: VerificationStatus::Approved,
            admin_override: false,
        }
    }

    pub fn wholesaler(id: i64, name: impl Into<String>, verification: VerificationStatus) -> Self {
        Self {
            id,
            name: name.into(),
            role: Role::Wholesaler,
            verification,
            admin_override: false,
        }
    }

    pub fn with_admin_override(mut self) -> Self {
        self.admin_override = true;
        self
    }

    pub fn is_wholesaler(&self) -> bool {
        self.role == Role::Wholesaler
    }

    /// 승인된 도매상이거나 관리자 권한 보유
    pub fn is_verified_or_overridden(&self) -> bool {
        self.verification == VerificationStatus::Approved || self.admin_override
    }
}

impl FromStr for Role {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SELLER" | "USER" => Ok(Role::Seller),
            "WHOLESALER" => Ok(Role::Wholesaler),
            other => Err(MarketError::Validation(format!("알 수 없는 역할: {}", other))),
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(VerificationStatus::Pending),
            "APPROVED" => Ok(VerificationStatus::Approved),
            "REJECTED" => Ok(VerificationStatus::Rejected),
            other => Err(MarketError::Validation(format!(
                "알 수 없는 인증 상태: {}",
                other
            ))),
        }
    }
}

// endregion: --- Caller

// region:    --- Header Parsing
pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USER_ROLE: &str = "x-user-role";
pub const HEADER_USER_NAME: &str = "x-user-name";
pub const HEADER_VERIFICATION: &str = "x-verification-status";
pub const HEADER_ADMIN_OVERRIDE: &str = "x-admin-override";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, MarketError> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()))
            .map_err(|_| MarketError::Validation(format!("헤더 {} 형식 오류", name))),
        None => Ok(None),
    }
}

/// 인증 계층이 채운 헤더에서 호출자 추출 (x-user-id 가 없으면 익명)
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Option<Caller>, MarketError> {
    let Some(raw_id) = header(headers, HEADER_USER_ID)? else {
        return Ok(None);
    };
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| MarketError::Validation(format!("잘못된 사용자 id: {}", raw_id)))?;

    let role = header(headers, HEADER_USER_ROLE)?
        .ok_or_else(|| MarketError::Validation("x-user-role 헤더가 필요합니다".to_string()))?
        .parse::<Role>()?;

    let verification = match header(headers, HEADER_VERIFICATION)? {
        Some(value) => value.parse::<VerificationStatus>()?,
        None => VerificationStatus::Pending,
    };

    let admin_override = matches!(
        header(headers, HEADER_ADMIN_OVERRIDE)?,
        Some("true") | Some("1")
    );

    let name = header(headers, HEADER_USER_NAME)?
        .map(str::to_string)
        .unwrap_or_else(|| format!("user-{}", id));

    Ok(Some(Caller {
        id,
        name,
        role,
        verification,
        admin_override,
    }))
}

/// 인증이 필요한 경로용
pub fn require_caller(headers: &HeaderMap) -> Result<Caller, MarketError> {
    caller_from_headers(headers)?
        .ok_or_else(|| MarketError::Authorization("로그인이 필요합니다".to_string()))
}

// endregion: --- Header Parsing

// endregion: --- Tests
