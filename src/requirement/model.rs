use crate::auction::{resolve_status, time_remaining, AuctionStatus, TimeRemaining};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// 소싱 요청(요구사항) 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    pub product_name: String,
    pub hs_code: String,
    pub moq: i64,
    pub description: String,
    pub images: Vec<String>,
    pub created_by: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 표시용 캐시 값. 판단에는 항상 `status_at`을 쓴다.
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
}

impl Requirement {
    pub fn status_at(&self, now: DateTime<Utc>) -> AuctionStatus {
        resolve_status(self.start_time, self.end_time, now)
    }

    /// 현재 시각 기준으로 상태를 다시 계산한 사본
    pub fn refreshed(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.status_at(now);
        self
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> TimeRemaining {
        time_remaining(self.end_time, now)
    }
}

// 요구사항 생성 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequirementCommand {
    pub product_name: String,
    pub hs_code: String,
    pub moq: i64,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
