// region:    --- Imports
use super::{AuctionStore, StoreError};
use crate::bidding::Bid;
use crate::database::DatabaseManager;
use crate::query::queries;
use crate::requirement::Requirement;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Requirement Row
#[derive(FromRow)]
struct RequirementRow {
    id: Uuid,
    product_name: String,
    hs_code: String,
    moq: i64,
    description: String,
    images: Vec<String>,
    created_by: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RequirementRow> for Requirement {
    type Error = StoreError;

    fn try_from(row: RequirementRow) -> Result<Self, Self::Error> {
        Ok(Requirement {
            id: row.id,
            product_name: row.product_name,
            hs_code: row.hs_code,
            moq: row.moq,
            description: row.description,
            images: row.images,
            created_by: row.created_by,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
        })
    }
}
// endregion: --- Requirement Row

// region:    --- Postgres Store
/// Postgres 저장소 구현체
pub struct PostgresStore {
    db: Arc<DatabaseManager>,
}

impl PostgresStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuctionStore for PostgresStore {
    async fn insert_requirement(&self, requirement: &Requirement) -> Result<(), StoreError> {
        sqlx::query(queries::INSERT_REQUIREMENT)
            .bind(requirement.id)
            .bind(&requirement.product_name)
            .bind(&requirement.hs_code)
            .bind(requirement.moq)
            .bind(&requirement.description)
            .bind(&requirement.images)
            .bind(&requirement.created_by)
            .bind(requirement.start_time)
            .bind(requirement.end_time)
            .bind(requirement.status.as_str())
            .bind(requirement.created_at)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn get_requirement(&self, id: Uuid) -> Result<Option<Requirement>, StoreError> {
        sqlx::query_as::<_, RequirementRow>(&queries::get_requirement())
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .map(Requirement::try_from)
            .transpose()
    }

    async fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError> {
        sqlx::query_as::<_, RequirementRow>(&queries::get_all_requirements())
            .fetch_all(self.db.pool())
            .await?
            .into_iter()
            .map(Requirement::try_from)
            .collect()
    }

    async fn delete_requirement(&self, id: Uuid) -> Result<u64, StoreError> {
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    let locked = sqlx::query_scalar::<_, Uuid>(queries::LOCK_REQUIREMENT)
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    if locked.is_none() {
                        return Err(StoreError::MissingRequirement(id));
                    }

                    // 입찰 먼저, 그 다음 요구사항
                    let removed = sqlx::query(queries::DELETE_REQUIREMENT_BIDS)
                        .bind(id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();

                    let deleted = sqlx::query(queries::DELETE_REQUIREMENT)
                        .bind(id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    if deleted != 1 {
                        error!(
                            "{:<12} --> 요구사항 삭제 불일치: id={}, rows={}",
                            "Store", id, deleted
                        );
                        return Err(StoreError::MissingRequirement(id));
                    }

                    Ok(removed)
                })
            })
            .await
    }

    async fn bids_for(&self, requirement_id: Uuid) -> Result<Vec<Bid>, StoreError> {
        let bids = sqlx::query_as::<_, Bid>(queries::GET_REQUIREMENT_BIDS)
            .bind(requirement_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(bids)
    }

    async fn lowest_bid(&self, requirement_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let bid = sqlx::query_as::<_, Bid>(queries::GET_LOWEST_BID)
            .bind(requirement_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(bid)
    }

    async fn insert_bid(&self, bid: &Bid, expected_lowest: Option<Uuid>) -> Result<(), StoreError> {
        let bid = bid.clone();
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    // 같은 요구사항에 대한 입찰은 행 잠금으로 직렬화된다
                    let locked = sqlx::query_scalar::<_, Uuid>(queries::LOCK_REQUIREMENT)
                        .bind(bid.requirement_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    if locked.is_none() {
                        return Err(StoreError::MissingRequirement(bid.requirement_id));
                    }

                    let current = sqlx::query_as::<_, Bid>(queries::GET_LOWEST_BID)
                        .bind(bid.requirement_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .map(|b| b.id);
                    if current != expected_lowest {
                        return Err(StoreError::Conflict);
                    }

                    sqlx::query(queries::INSERT_BID)
                        .bind(bid.id)
                        .bind(bid.requirement_id)
                        .bind(&bid.supplier_id)
                        .bind(&bid.supplier_name)
                        .bind(bid.amount)
                        .bind(bid.timestamp)
                        .execute(&mut **tx)
                        .await?;
                    Ok(())
                })
            })
            .await
    }

    async fn refresh_statuses(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let changed = sqlx::query(queries::REFRESH_STATUSES)
            .bind(now)
            .execute(self.db.pool())
            .await?
            .rows_affected();
        if changed > 0 {
            info!("{:<12} --> 상태 갱신: {}건", "Store", changed);
        }
        Ok(changed)
    }
}
// endregion: --- Postgres Store
