/// 변경 알림과 조회 캐시
/// 쓰기 후 캐시를 무효화하고, 변경 알림을 받으면 저장소를 다시 조회한다.
/// 캐시는 화면 표시용이며 입찰 판단에는 쓰지 않는다.
// region:    --- Imports
use crate::auction::events::{ChangeEvent, Table};
use crate::error::AuctionError;
use crate::message_broker::{KafkaConsumer, KafkaProducer};
use crate::query::handlers::{self, RequirementSummary};
use crate::store::AuctionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Change Publisher
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("변경 알림 직렬화 실패: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Kafka 전송 실패: {0}")]
    Kafka(String),
}

/// 변경 알림 발행 트레이트
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), FeedError>;
}

/// 프로세스 내부 변경 알림
pub struct LocalFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl LocalFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl ChangePublisher for LocalFeed {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), FeedError> {
        // 구독자가 없으면 보낼 곳이 없을 뿐 오류는 아니다
        let _ = self.sender.send(event.clone());
        Ok(())
    }
}

/// Kafka 토픽으로 변경 알림 발행
pub struct KafkaChangePublisher {
    producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaChangePublisher {
    pub fn new(producer: Arc<KafkaProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl ChangePublisher for KafkaChangePublisher {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), FeedError> {
        let payload = serde_json::to_string(event)?;
        self.producer
            .send_message(&self.topic, &event.table.to_string(), &payload)
            .await
            .map_err(FeedError::Kafka)
    }
}
// endregion: --- Change Publisher

// region:    --- Auction Cache
struct Snapshot {
    summaries: Vec<RequirementSummary>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// 요구사항 목록 캐시
pub struct AuctionCache {
    origin: Uuid,
    store: Arc<dyn AuctionStore>,
    snapshot: RwLock<Snapshot>,
    // 갱신은 한 번에 하나씩. 먼저 조회한 결과가 나중 결과를 덮어쓰지 않게 한다.
    refresh_lock: Mutex<()>,
}

impl AuctionCache {
    pub fn new(store: Arc<dyn AuctionStore>) -> Self {
        Self {
            origin: Uuid::new_v4(),
            store,
            snapshot: RwLock::new(Snapshot {
                summaries: Vec::new(),
                refreshed_at: None,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    /// 이 캐시가 발행하는 변경 알림의 origin
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// 저장소를 다시 조회해 캐시를 교체한다
    pub async fn refresh(&self) -> Result<usize, AuctionError> {
        let _guard = self.refresh_lock.lock().await;
        let now = Utc::now();
        let summaries = handlers::get_all_requirements(self.store.as_ref(), now).await?;
        let count = summaries.len();

        let mut snapshot = self.snapshot.write().await;
        snapshot.summaries = summaries;
        snapshot.refreshed_at = Some(now);
        Ok(count)
    }

    /// 캐시된 목록. 상태는 `now` 기준으로 다시 계산한다.
    pub async fn requirements(&self, now: DateTime<Utc>) -> Vec<RequirementSummary> {
        self.snapshot
            .read()
            .await
            .summaries
            .iter()
            .cloned()
            .map(|mut summary| {
                summary.requirement = summary.requirement.refreshed(now);
                summary
            })
            .collect()
    }

    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.refreshed_at
    }

    /// 변경 알림 반영. 자기 변경은 `record_change`에서 이미 갱신했으므로 건너뛴다.
    async fn apply(&self, event: &ChangeEvent) {
        if event.origin == self.origin {
            debug!(
                "{:<12} --> 자기 변경 알림 생략: table={}",
                "Realtime", event.table
            );
            return;
        }
        self.refresh_logged(event.table).await;
    }

    async fn refresh_logged(&self, table: Table) {
        match self.refresh().await {
            Ok(count) => info!(
                "{:<12} --> 캐시 갱신: table={}, 요구사항 {}건",
                "Realtime", table, count
            ),
            Err(e) => error!("{:<12} --> 캐시 갱신 실패: {:?}", "Realtime", e),
        }
    }
}
// endregion: --- Auction Cache

// region:    --- Listeners
/// 내부 변경 알림 구독
pub fn spawn_local_listener(
    cache: Arc<AuctionCache>,
    mut receiver: broadcast::Receiver<ChangeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => cache.apply(&event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "{:<12} --> 변경 알림 {}건 유실, 전체 갱신",
                        "Realtime", skipped
                    );
                    cache.refresh_logged(Table::Requirements).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Kafka 변경 알림 구독
pub fn spawn_kafka_listener(
    cache: Arc<AuctionCache>,
    consumer: Arc<KafkaConsumer>,
    topic: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = consumer
            .consume_changes(&topic, move |event| {
                let cache = Arc::clone(&cache);
                async move { cache.apply(&event).await }
            })
            .await;
        if let Err(e) = result {
            error!("{:<12} --> 변경 알림 구독 오류: {:?}", "Realtime", e);
        }
    })
}
// endregion: --- Listeners

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::AuctionStatus;
    use crate::bidding::Bid;
    use crate::requirement::Requirement;
    use crate::store::{MemoryStore, StoreError};
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn requirement(now: DateTime<Utc>) -> Requirement {
        Requirement {
            id: Uuid::new_v4(),
            product_name: "Copper wire".to_string(),
            hs_code: "7408.11".to_string(),
            moq: 50,
            description: "Bare, 2.5mm".to_string(),
            images: vec![],
            created_by: "admin-1".to_string(),
            start_time: now + Duration::minutes(5),
            end_time: now + Duration::hours(1),
            status: AuctionStatus::Upcoming,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn cache_reflects_store_after_refresh() {
        let store = Arc::new(MemoryStore::new());
        let cache = AuctionCache::new(store.clone());
        assert!(cache.refreshed_at().await.is_none());

        let now = Utc::now();
        let req = requirement(now);
        store.insert_requirement(&req).await.unwrap();
        assert!(cache.requirements(now).await.is_empty());

        assert_eq!(cache.refresh().await.unwrap(), 1);
        let listed = cache.requirements(now).await;
        assert_eq!(listed[0].requirement.id, req.id);
        assert_eq!(listed[0].requirement.status, AuctionStatus::Upcoming);

        // 캐시 값이라도 상태는 읽는 시각 기준
        let later = cache.requirements(now + Duration::minutes(10)).await;
        assert_eq!(later[0].requirement.status, AuctionStatus::Open);
    }

    #[tokio::test]
    async fn local_feed_triggers_refresh() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(AuctionCache::new(store.clone()));
        let feed = LocalFeed::new(16);
        let listener = spawn_local_listener(Arc::clone(&cache), feed.subscribe());

        let now = Utc::now();
        store.insert_requirement(&requirement(now)).await.unwrap();
        // 다른 인스턴스가 보낸 알림
        feed.publish(&ChangeEvent::new(Table::Requirements, Uuid::new_v4()))
            .await
            .unwrap();

        let mut refreshed = false;
        for _ in 0..50 {
            if !cache.requirements(now).await.is_empty() {
                refreshed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(refreshed);
        listener.abort();
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let feed = LocalFeed::new(4);
        assert!(feed
            .publish(&ChangeEvent::new(Table::Bids, Uuid::new_v4()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn own_changes_are_not_refreshed_twice() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(AuctionCache::new(store.clone()));
        let now = Utc::now();
        store.insert_requirement(&requirement(now)).await.unwrap();

        cache
            .apply(&ChangeEvent::new(Table::Requirements, cache.origin()))
            .await;
        assert!(cache.refreshed_at().await.is_none());

        cache
            .apply(&ChangeEvent::new(Table::Requirements, Uuid::new_v4()))
            .await;
        assert_eq!(cache.requirements(now).await.len(), 1);
    }

    /// 첫 목록 조회만 읽은 뒤 잠시 멈추는 저장소
    struct SlowFirstList {
        inner: MemoryStore,
        delayed: AtomicBool,
    }

    #[async_trait]
    impl AuctionStore for SlowFirstList {
        async fn insert_requirement(&self, requirement: &Requirement) -> Result<(), StoreError> {
            self.inner.insert_requirement(requirement).await
        }
        async fn get_requirement(&self, id: Uuid) -> Result<Option<Requirement>, StoreError> {
            self.inner.get_requirement(id).await
        }
        async fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError> {
            let requirements = self.inner.list_requirements().await?;
            if !self.delayed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            Ok(requirements)
        }
        async fn delete_requirement(&self, id: Uuid) -> Result<u64, StoreError> {
            self.inner.delete_requirement(id).await
        }
        async fn bids_for(&self, requirement_id: Uuid) -> Result<Vec<Bid>, StoreError> {
            self.inner.bids_for(requirement_id).await
        }
        async fn lowest_bid(&self, requirement_id: Uuid) -> Result<Option<Bid>, StoreError> {
            self.inner.lowest_bid(requirement_id).await
        }
        async fn insert_bid(&self, bid: &Bid, expected_lowest: Option<Uuid>) -> Result<(), StoreError> {
            self.inner.insert_bid(bid, expected_lowest).await
        }
        async fn refresh_statuses(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
            self.inner.refresh_statuses(now).await
        }
    }

    #[tokio::test]
    async fn slow_refresh_does_not_overwrite_newer_snapshot() {
        let store = Arc::new(SlowFirstList {
            inner: MemoryStore::new(),
            delayed: AtomicBool::new(false),
        });
        let cache = Arc::new(AuctionCache::new(store.clone()));

        // 빈 목록을 읽고 멈춘 갱신
        let slow = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let now = Utc::now();
        store.insert_requirement(&requirement(now)).await.unwrap();
        assert_eq!(cache.refresh().await.unwrap(), 1);
        slow.await.unwrap().unwrap();

        assert_eq!(cache.requirements(now).await.len(), 1);
    }
}
