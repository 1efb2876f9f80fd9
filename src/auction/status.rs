/// 경매 상태 판정
/// 상태는 저장된 값을 믿지 않고 (시작, 종료, 현재 시각)으로 매번 다시 계산한다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
// endregion: --- Imports

// region:    --- Auction Status
/// 경매 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Upcoming,
    Open,
    Closed,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Upcoming => "upcoming",
            AuctionStatus::Open => "open",
            AuctionStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(AuctionStatus::Upcoming),
            "open" => Ok(AuctionStatus::Open),
            "closed" => Ok(AuctionStatus::Closed),
            other => Err(format!("알 수 없는 경매 상태: {other}")),
        }
    }
}

/// 경매 상태 계산
///
/// `now < start` 이면 upcoming, `now > end` 이면 closed, 그 외(경계 포함)는 open.
pub fn resolve_status(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AuctionStatus {
    if now < start_time {
        AuctionStatus::Upcoming
    } else if now > end_time {
        AuctionStatus::Closed
    } else {
        AuctionStatus::Open
    }
}
// endregion: --- Auction Status

// region:    --- Time Remaining
/// 종료까지 남은 시간 (카운트다운 표시용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub is_expired: bool,
}

pub fn time_remaining(end_time: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let millis = (end_time - now).num_milliseconds();
    if millis <= 0 {
        return TimeRemaining {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            is_expired: true,
        };
    }

    let total_seconds = millis / 1000;
    TimeRemaining {
        days: total_seconds / 86_400,
        hours: (total_seconds % 86_400) / 3_600,
        minutes: (total_seconds % 3_600) / 60,
        seconds: total_seconds % 60,
        is_expired: false,
    }
}
// endregion: --- Time Remaining
