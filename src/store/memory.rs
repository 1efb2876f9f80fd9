// region:    --- Imports
use super::{AuctionStore, StoreError};
use crate::bidding::{ranking, Bid};
use crate::requirement::Requirement;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
// endregion: --- Imports

#[derive(Default)]
struct State {
    requirements: HashMap<Uuid, Requirement>,
    bids: HashMap<Uuid, Vec<Bid>>,
}

/// 메모리 저장소
/// DATABASE_URL 없이 실행하거나 테스트할 때 쓴다. 하나의 잠금 아래에서 모든 변경이 일어난다.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn insert_requirement(&self, requirement: &Requirement) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.bids.entry(requirement.id).or_default();
        state
            .requirements
            .insert(requirement.id, requirement.clone());
        Ok(())
    }

    async fn get_requirement(&self, id: Uuid) -> Result<Option<Requirement>, StoreError> {
        Ok(self.state.read().await.requirements.get(&id).cloned())
    }

    async fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError> {
        let state = self.state.read().await;
        let mut requirements: Vec<Requirement> = state.requirements.values().cloned().collect();
        requirements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requirements)
    }

    async fn delete_requirement(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        if state.requirements.remove(&id).is_none() {
            return Err(StoreError::MissingRequirement(id));
        }
        let removed = state.bids.remove(&id).map(|b| b.len()).unwrap_or(0);
        Ok(removed as u64)
    }

    async fn bids_for(&self, requirement_id: Uuid) -> Result<Vec<Bid>, StoreError> {
        let state = self.state.read().await;
        let bids = state.bids.get(&requirement_id).cloned().unwrap_or_default();
        Ok(ranking::rank_bids(bids))
    }

    async fn lowest_bid(&self, requirement_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .bids
            .get(&requirement_id)
            .and_then(|bids| ranking::lowest_bid(bids))
            .cloned())
    }

    async fn insert_bid(&self, bid: &Bid, expected_lowest: Option<Uuid>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.requirements.contains_key(&bid.requirement_id) {
            return Err(StoreError::MissingRequirement(bid.requirement_id));
        }

        let bids = state.bids.entry(bid.requirement_id).or_default();
        let current = ranking::lowest_bid(bids).map(|b| b.id);
        if current != expected_lowest {
            return Err(StoreError::Conflict);
        }

        bids.push(bid.clone());
        Ok(())
    }

    async fn refresh_statuses(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for requirement in state.requirements.values_mut() {
            let status = requirement.status_at(now);
            if requirement.status != status {
                requirement.status = status;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
