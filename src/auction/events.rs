use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// 변경 대상 테이블
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Requirements,
    Bids,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Requirements => f.write_str("requirements"),
            Table::Bids => f.write_str("bids"),
        }
    }
}

// 변경 알림 이벤트
// 어떤 테이블이 바뀌었는지만 알리고, 수신 측은 저장소를 다시 조회한다.
// origin은 발행한 캐시의 식별자. 자기 변경은 이미 반영했으므로 수신 측에서 건너뛴다.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub origin: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: Table, origin: Uuid) -> Self {
        Self {
            table,
            origin,
            timestamp: Utc::now(),
        }
    }
}
