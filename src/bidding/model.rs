use crate::requirement::Requirement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// 입찰 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub requirement_id: Uuid,
    pub supplier_id: String,
    pub supplier_name: String,
    pub amount: f64,
    #[sqlx(rename = "created_at")]
    pub timestamp: DateTime<Utc>,
}

// 공급사에게 보여주는 익명 입찰 (순위만 노출)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBid {
    pub id: Uuid,
    pub rank: usize,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub is_lowest: bool,
}

/// 입찰 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidCommand {
    pub requirement_id: Uuid,
    pub supplier_id: String,
    pub supplier_name: String,
    pub amount: f64,
}

/// 입찰 성공 결과. 알림에 요구사항과 직전 최저가가 필요하다.
#[derive(Debug, Clone)]
pub struct BidPlacement {
    pub requirement: Requirement,
    pub bid: Bid,
    pub previous_lowest: Option<Bid>,
}
