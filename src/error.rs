// region:    --- Imports
use crate::auction::AuctionStatus;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Auction Error
/// 경매 도메인 오류
/// 알림 실패는 여기에 속하지 않는다. 알림은 쓰기 결과를 바꾸지 못한다.
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("요구사항을 찾을 수 없습니다: {0}")]
    NotFound(Uuid),

    #[error("경매가 진행 중이 아닙니다 (현재 상태: {status})")]
    AuctionNotOpen { status: AuctionStatus },

    #[error("입찰 금액이 올바르지 않습니다")]
    InvalidAmount,

    #[error("입찰가는 현재 최저가보다 1% 이상 낮아야 합니다. 최대 허용 금액: {ceiling:.2}")]
    BidNotLowEnough {
        amount: f64,
        lowest_amount: f64,
        ceiling: f64,
    },

    #[error("입찰 기간이 올바르지 않습니다: {0}")]
    InvalidWindow(String),

    #[error("요구사항 입력값이 올바르지 않습니다: {0}")]
    InvalidRequirement(String),

    #[error("권한이 없습니다: {0}")]
    Unauthorized(String),

    #[error("저장소 오류: {0}")]
    StorageFailure(#[source] StoreError),

    #[error("최대 재시도 횟수 초과")]
    TooMuchContention,
}

impl From<StoreError> for AuctionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingRequirement(id) => AuctionError::NotFound(id),
            other => AuctionError::StorageFailure(other),
        }
    }
}

impl AuctionError {
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::AuctionNotOpen { .. } => "AUCTION_NOT_OPEN",
            AuctionError::InvalidAmount => "INVALID_AMOUNT",
            AuctionError::BidNotLowEnough { .. } => "BID_NOT_LOW_ENOUGH",
            AuctionError::InvalidWindow(_) => "INVALID_WINDOW",
            AuctionError::InvalidRequirement(_) => "INVALID_REQUIREMENT",
            AuctionError::Unauthorized(_) => "UNAUTHORIZED",
            AuctionError::StorageFailure(_) => "STORAGE_FAILURE",
            AuctionError::TooMuchContention => "MAX_RETRIES_EXCEEDED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::AuctionNotOpen { .. }
            | AuctionError::InvalidAmount
            | AuctionError::BidNotLowEnough { .. }
            | AuctionError::InvalidWindow(_)
            | AuctionError::InvalidRequirement(_) => StatusCode::BAD_REQUEST,
            AuctionError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AuctionError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuctionError::TooMuchContention => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        match &self {
            AuctionError::AuctionNotOpen { status } => {
                body["status"] = json!(status);
            }
            AuctionError::BidNotLowEnough {
                amount,
                lowest_amount,
                ceiling,
            } => {
                body["amount"] = json!(amount);
                body["lowest_amount"] = json!(lowest_amount);
                body["ceiling"] = json!(ceiling);
            }
            AuctionError::StorageFailure(e) => {
                error!("{:<12} --> 저장소 오류: {:?}", "Error", e);
            }
            _ => {}
        }

        (self.status_code(), Json(body)).into_response()
    }
}
// endregion: --- Auction Error
