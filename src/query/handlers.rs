// region:    --- Imports
use crate::auction::TimeRemaining;
use crate::auth::CurrentUser;
use crate::bidding::{ranking, Bid, RankedBid};
use crate::error::AuctionError;
use crate::requirement::Requirement;
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Views
/// 입찰 요약
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BidStats {
    pub bid_count: usize,
    pub lowest_amount: Option<f64>,
}

impl BidStats {
    pub fn from_bids(bids: &[Bid]) -> Self {
        Self {
            bid_count: bids.len(),
            lowest_amount: ranking::lowest_bid(bids).map(|b| b.amount),
        }
    }
}

/// 요구사항 목록 항목
#[derive(Debug, Clone, Serialize)]
pub struct RequirementSummary {
    #[serde(flatten)]
    pub requirement: Requirement,
    #[serde(flatten)]
    pub stats: BidStats,
}

/// 요구사항 상세
#[derive(Debug, Clone, Serialize)]
pub struct RequirementDetail {
    #[serde(flatten)]
    pub requirement: Requirement,
    #[serde(flatten)]
    pub stats: BidStats,
    pub time_remaining: TimeRemaining,
}

/// 조회자 역할에 따른 입찰 목록
/// 관리자는 공급사 정보까지, 공급사는 순위와 금액만 본다.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BidListView {
    Full(Vec<Bid>),
    Anonymous(Vec<RankedBid>),
}

/// 최저 입찰 조회 결과
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LowestBidView {
    Full(Bid),
    Anonymous { amount: f64, timestamp: DateTime<Utc> },
}
// endregion: --- Views

// region:    --- Query Handlers

/// 모든 요구사항 조회 (상태는 현재 시각으로 재계산)
pub async fn get_all_requirements(
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<Vec<RequirementSummary>, AuctionError> {
    info!("{:<12} --> 모든 요구사항 조회", "Query");
    let requirements = store.list_requirements().await?;
    let mut summaries = Vec::with_capacity(requirements.len());
    for requirement in requirements {
        let bids = store.bids_for(requirement.id).await?;
        summaries.push(RequirementSummary {
            requirement: requirement.refreshed(now),
            stats: BidStats::from_bids(&bids),
        });
    }
    Ok(summaries)
}

/// 요구사항 상세 조회
pub async fn get_requirement(
    store: &dyn AuctionStore,
    requirement_id: Uuid,
    now: DateTime<Utc>,
) -> Result<RequirementDetail, AuctionError> {
    info!("{:<12} --> 요구사항 조회 id: {}", "Query", requirement_id);
    let requirement = find_requirement(store, requirement_id).await?;
    let bids = store.bids_for(requirement_id).await?;
    Ok(RequirementDetail {
        time_remaining: requirement.time_remaining(now),
        requirement: requirement.refreshed(now),
        stats: BidStats::from_bids(&bids),
    })
}

/// 요구사항 입찰 조회
pub async fn get_requirement_bids(
    store: &dyn AuctionStore,
    requirement_id: Uuid,
    viewer: &CurrentUser,
) -> Result<BidListView, AuctionError> {
    info!(
        "{:<12} --> 요구사항 입찰 조회 id: {}",
        "Query", requirement_id
    );
    find_requirement(store, requirement_id).await?;
    let bids = ranking::rank_bids(store.bids_for(requirement_id).await?);
    if viewer.is_admin() {
        Ok(BidListView::Full(bids))
    } else {
        Ok(BidListView::Anonymous(ranking::anonymize(&bids)))
    }
}

/// 최저 입찰 조회
pub async fn get_lowest_bid(
    store: &dyn AuctionStore,
    requirement_id: Uuid,
    viewer: &CurrentUser,
) -> Result<Option<LowestBidView>, AuctionError> {
    info!("{:<12} --> 최저 입찰 조회 id: {}", "Query", requirement_id);
    find_requirement(store, requirement_id).await?;
    let lowest = store.lowest_bid(requirement_id).await?;
    Ok(lowest.map(|bid| {
        if viewer.is_admin() {
            LowestBidView::Full(bid)
        } else {
            LowestBidView::Anonymous {
                amount: bid.amount,
                timestamp: bid.timestamp,
            }
        }
    }))
}

async fn find_requirement(
    store: &dyn AuctionStore,
    requirement_id: Uuid,
) -> Result<Requirement, AuctionError> {
    store
        .get_requirement(requirement_id)
        .await?
        .ok_or(AuctionError::NotFound(requirement_id))
}

// endregion: --- Query Handlers
