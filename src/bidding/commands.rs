/// 입찰 관련 커맨드 처리
/// 역경매: 새 입찰은 현재 최저가의 99% 미만이어야 한다.
// region:    --- Imports
use super::model::{Bid, BidPlacement, PlaceBidCommand};
use crate::auction::AuctionStatus;
use crate::error::AuctionError;
use crate::store::{AuctionStore, StoreError};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Commands
/// 최저가 대비 허용 비율
pub const UNDERCUT_RATIO: f64 = 0.99;

// 최대 재시도 횟수
const MAX_RETRIES: i32 = 100;

/// 입찰 상한 (이 값 이상이면 거절)
pub fn undercut_ceiling(lowest_amount: f64) -> f64 {
    lowest_amount * UNDERCUT_RATIO
}

/// 입찰
///
/// 검증 순서: 요구사항 존재 → 경매 상태 → 금액 → 최저가 대비 1% 인하.
/// 저장은 검증에 쓴 최저 입찰이 그대로일 때만 성공하고, 바뀌었으면 처음부터 다시 검증한다.
pub async fn handle_place_bid(
    store: &dyn AuctionStore,
    cmd: PlaceBidCommand,
    now: DateTime<Utc>,
) -> Result<BidPlacement, AuctionError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    let mut retries = 0;

    while retries < MAX_RETRIES {
        let requirement = store
            .get_requirement(cmd.requirement_id)
            .await?
            .ok_or(AuctionError::NotFound(cmd.requirement_id))?;

        // 경매 상태는 저장값이 아니라 지금 시각으로 판단
        let status = requirement.status_at(now);
        if status != AuctionStatus::Open {
            return Err(AuctionError::AuctionNotOpen { status });
        }

        if !cmd.amount.is_finite() || cmd.amount <= 0.0 {
            return Err(AuctionError::InvalidAmount);
        }

        let previous_lowest = store.lowest_bid(cmd.requirement_id).await?;
        if let Some(lowest) = &previous_lowest {
            let ceiling = undercut_ceiling(lowest.amount);
            if cmd.amount >= ceiling {
                return Err(AuctionError::BidNotLowEnough {
                    amount: cmd.amount,
                    lowest_amount: lowest.amount,
                    ceiling,
                });
            }
        }

        let bid = Bid {
            id: Uuid::new_v4(),
            requirement_id: cmd.requirement_id,
            supplier_id: cmd.supplier_id.clone(),
            supplier_name: cmd.supplier_name.clone(),
            amount: cmd.amount,
            timestamp: now,
        };

        match store
            .insert_bid(&bid, previous_lowest.as_ref().map(|b| b.id))
            .await
        {
            Ok(()) => {
                info!(
                    "{:<12} --> 입찰 성공: id={}, amount={}",
                    "Command", bid.id, bid.amount
                );
                return Ok(BidPlacement {
                    requirement,
                    bid,
                    previous_lowest,
                });
            }
            Err(StoreError::Conflict) => {
                warn!(
                    "{:<12} --> 최저 입찰 변경으로 인한 버전 충돌: 재시도",
                    "Command"
                );
                retries += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AuctionError::TooMuchContention)
}
// endregion: --- Commands
