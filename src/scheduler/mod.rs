/// 경매 상태 갱신 스케줄러
/// 표시용 상태 컬럼만 갱신한다. 입찰 판단은 매번 시각으로 다시 계산하므로 이 값에 의존하지 않는다.
// region:    --- Imports
use crate::auction::events::Table;
use crate::error::AuctionError;
use crate::state::AppState;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Status Scheduler
/// 경매 상태 갱신 스케줄러
pub struct StatusScheduler {
    state: AppState,
    period: Duration,
}

/// 경매 상태 갱신 스케줄러 생성
impl StatusScheduler {
    pub fn new(state: AppState, period: Duration) -> Self {
        Self { state, period }
    }

    /// 경매 상태 갱신 스케줄러 시작
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.tick().await {
                    error!(
                        "{:<12} --> 경매 상태 갱신 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        })
    }

    /// 한 번 갱신. 바뀐 요구사항 수를 돌려준다.
    /// 만료된 임시 저장도 이때 정리한다.
    pub async fn tick(&self) -> Result<u64, AuctionError> {
        let now = Utc::now();
        self.state.drafts.purge_expired(now);
        let changed = self.state.store.refresh_statuses(now).await?;
        if changed > 0 {
            self.state.record_change(Table::Requirements).await;
        }
        debug!(
            "{:<12} --> 경매 상태 갱신 완료: {}건 변경",
            "Scheduler", changed
        );
        Ok(changed)
    }
}
// endregion: --- Status Scheduler
