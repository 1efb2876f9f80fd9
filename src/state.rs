// region:    --- Imports
use crate::auction::events::{ChangeEvent, Table};
use crate::draft::{DraftStore, MemoryDraftBackend};
use crate::notification::NotificationDispatcher;
use crate::realtime::{AuctionCache, ChangePublisher};
use crate::store::AuctionStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};
// endregion: --- Imports

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub cache: Arc<AuctionCache>,
    pub publisher: Arc<dyn ChangePublisher>,
    pub notifier: NotificationDispatcher,
    pub drafts: Arc<DraftStore<MemoryDraftBackend>>,
    /// 알림 결과를 응답에 싣기 위해 기다리는 최대 시간
    pub notify_wait: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        publisher: Arc<dyn ChangePublisher>,
        notifier: NotificationDispatcher,
        notify_wait: Duration,
    ) -> Self {
        Self {
            cache: Arc::new(AuctionCache::new(Arc::clone(&store))),
            store,
            publisher,
            notifier,
            drafts: Arc::new(DraftStore::new(MemoryDraftBackend::default())),
            notify_wait,
        }
    }

    /// 쓰기 이후 호출: 캐시를 갱신하고 변경 알림을 발행한다
    /// 실패는 로그만 남긴다. 이미 끝난 쓰기를 되돌리지 않는다.
    /// 이 프로세스의 리스너는 같은 origin의 알림을 건너뛰므로 갱신은 한 번만 일어난다.
    pub async fn record_change(&self, table: Table) {
        if let Err(e) = self.cache.refresh().await {
            error!("{:<12} --> 캐시 갱신 실패: {:?}", "State", e);
        }
        let event = ChangeEvent::new(table, self.cache.origin());
        if let Err(e) = self.publisher.publish(&event).await {
            warn!("{:<12} --> 변경 알림 발행 실패: {}", "State", e);
        }
    }
}
