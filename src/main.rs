// region:    --- Imports
use axum::extract::DefaultBodyLimit;
use befach_auction::config::Config;
use befach_auction::database::DatabaseManager;
use befach_auction::handlers;
use befach_auction::message_broker::KafkaManager;
use befach_auction::notification::{
    EmailSender, HttpEmailSender, LogEmailSender, NotificationDispatcher,
};
use befach_auction::realtime::{
    self, ChangePublisher, KafkaChangePublisher, LocalFeed,
};
use befach_auction::scheduler::StatusScheduler;
use befach_auction::state::AppState;
use befach_auction::store::{AuctionStore, MemoryStore, PostgresStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // 저장소 선택
    let store: Arc<dyn AuctionStore> = match &config.database_url {
        Some(database_url) => {
            let db_manager = Arc::new(
                DatabaseManager::connect(database_url, config.database_max_connections).await?,
            );
            if let Err(e) = db_manager.initialize_database(config.database_reset).await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(PostgresStore::new(db_manager))
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL 없음, 메모리 저장소로 실행",
                "Main"
            );
            Arc::new(MemoryStore::new())
        }
    };

    // 이메일 발송기
    let sender: Arc<dyn EmailSender> = match &config.email {
        Some(email) => Arc::new(HttpEmailSender::new(
            &email.function_url,
            &email.api_key,
            config.email_timeout,
        )?),
        None => {
            warn!("{:<12} --> 이메일 설정 없음, 알림은 로그로만 남김", "Main");
            Arc::new(LogEmailSender)
        }
    };
    let notifier = NotificationDispatcher::new(sender);

    // 변경 알림
    let state = match &config.kafka_brokers {
        Some(brokers) => {
            let kafka_manager = KafkaManager::new(brokers, &config.kafka_group_id)?;
            kafka_manager.create_topic(&config.change_topic, 1, 1).await?;
            info!("{:<12} --> Kafka 초기화 성공", "Main");

            let publisher: Arc<dyn ChangePublisher> = Arc::new(KafkaChangePublisher::new(
                kafka_manager.get_producer(),
                config.change_topic.clone(),
            ));
            let state = AppState::new(store, publisher, notifier, config.notify_wait);
            realtime::spawn_kafka_listener(
                Arc::clone(&state.cache),
                kafka_manager.get_consumer(),
                config.change_topic.clone(),
            );
            state
        }
        None => {
            let feed = Arc::new(LocalFeed::new(256));
            let receiver = feed.subscribe();
            let state = AppState::new(store, feed, notifier, config.notify_wait);
            realtime::spawn_local_listener(Arc::clone(&state.cache), receiver);
            state
        }
    };

    // 첫 캐시 적재
    let count = state.cache.refresh().await?;
    info!("{:<12} --> 요구사항 {}건 적재", "Main", count);

    // 경매 상태 갱신
    StatusScheduler::new(state.clone(), config.status_refresh_interval).start();

    // cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정 (이미지 데이터 URL을 위해 본문 20MB 허용)
    let routes_all = handlers::routes(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
