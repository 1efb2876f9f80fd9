/// 경매 저장소
/// 요구사항과 입찰의 영속화를 담당한다. 정렬 규칙:
/// - 요구사항: 생성 시각 내림차순
/// - 입찰: 금액 오름차순, 같은 금액이면 먼저 들어온 입찰 우선
// region:    --- Imports
use crate::bidding::Bid;
use crate::requirement::Requirement;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Modules
mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
// endregion: --- Modules

// region:    --- Store Error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),

    /// 입찰 검증 이후 최저 입찰이 바뀌었다
    #[error("버전 충돌")]
    Conflict,

    #[error("요구사항이 존재하지 않습니다: {0}")]
    MissingRequirement(Uuid),

    #[error("저장된 데이터가 올바르지 않습니다: {0}")]
    Corrupt(String),
}
// endregion: --- Store Error

// region:    --- Auction Store Trait
/// 경매 저장소 트레이트
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn insert_requirement(&self, requirement: &Requirement) -> Result<(), StoreError>;

    async fn get_requirement(&self, id: Uuid) -> Result<Option<Requirement>, StoreError>;

    async fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError>;

    /// 요구사항과 그 입찰을 함께 삭제한다. 삭제된 입찰 수를 돌려준다.
    /// 둘 다 지워지거나 둘 다 남는다.
    async fn delete_requirement(&self, id: Uuid) -> Result<u64, StoreError>;

    async fn bids_for(&self, requirement_id: Uuid) -> Result<Vec<Bid>, StoreError>;

    async fn lowest_bid(&self, requirement_id: Uuid) -> Result<Option<Bid>, StoreError>;

    /// 입찰 저장 (compare-and-set)
    ///
    /// 저장 시점의 최저 입찰 id가 `expected_lowest`와 다르면 `StoreError::Conflict`.
    /// 요구사항이 이미 삭제되었으면 `StoreError::MissingRequirement`.
    async fn insert_bid(&self, bid: &Bid, expected_lowest: Option<Uuid>) -> Result<(), StoreError>;

    /// 표시용 상태 컬럼 갱신. 바뀐 요구사항 수를 돌려준다.
    async fn refresh_statuses(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
// endregion: --- Auction Store Trait
