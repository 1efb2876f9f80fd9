use async_trait::async_trait;
use befach_auction::auction::AuctionStatus;
use befach_auction::handlers;
use befach_auction::notification::{
    EmailPayload, EmailResult, EmailSender, EmailType, LogEmailSender, NotificationDispatcher,
    NotificationError,
};
use befach_auction::realtime::{self, LocalFeed};
use befach_auction::requirement::Requirement;
use befach_auction::state::AppState;
use befach_auction::store::{AuctionStore, MemoryStore};
use chrono::{Duration, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use uuid::Uuid;

/// 트레이싱 초기화
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// 항상 실패하는 이메일 발송기
struct FailingSender;

#[async_trait]
impl EmailSender for FailingSender {
    async fn send(
        &self,
        _email_type: EmailType,
        _payload: &EmailPayload,
    ) -> Result<EmailResult, NotificationError> {
        Err(NotificationError::Failed("smtp down".to_string()))
    }
}

struct TestServer {
    base_url: String,
    store: Arc<MemoryStore>,
    client: Client,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn as_admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("x-user-id", "admin-1")
            .header("x-user-name", "Befach Admin")
            .header("x-user-role", "admin")
    }

    fn as_supplier(&self, builder: RequestBuilder, id: &str) -> RequestBuilder {
        builder
            .header("x-user-id", id)
            .header("x-user-name", format!("Supplier {id}"))
            .header("x-user-role", "supplier")
    }

    /// 진행 중인 경매를 저장소에 직접 넣는다
    async fn open_requirement(&self, created_by: &str) -> Requirement {
        let now = Utc::now();
        let requirement = Requirement {
            id: Uuid::new_v4(),
            product_name: "Copper wire".to_string(),
            hs_code: "7408".to_string(),
            moq: 500,
            description: "99.9% copper, 2mm".to_string(),
            images: vec![],
            created_by: created_by.to_string(),
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            status: AuctionStatus::Open,
            created_at: now,
        };
        self.store
            .insert_requirement(&requirement)
            .await
            .expect("요구사항 저장 실패");
        requirement
    }
}

/// 메모리 저장소로 서버를 띄운다
async fn setup_with(sender: Arc<dyn EmailSender>) -> TestServer {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let feed = Arc::new(LocalFeed::new(64));
    let receiver = feed.subscribe();
    let state = AppState::new(
        store.clone(),
        feed,
        NotificationDispatcher::new(sender),
        std::time::Duration::from_millis(500),
    );
    realtime::spawn_local_listener(Arc::clone(&state.cache), receiver);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("리스너 생성 실패");
    let addr = listener.local_addr().expect("주소 조회 실패");
    let app = handlers::routes(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("서버 실행 실패");
    });
    info!("{:<12} --> 테스트 서버 시작: {}", "Test", addr);

    TestServer {
        base_url: format!("http://{addr}"),
        store,
        client: Client::new(),
    }
}

async fn setup() -> TestServer {
    setup_with(Arc::new(LogEmailSender)).await
}

async fn place_bid(server: &TestServer, requirement_id: Uuid, supplier: &str, amount: Value) -> (StatusCode, Value) {
    let response = server
        .as_supplier(
            server
                .client
                .post(server.url(&format!("/requirements/{requirement_id}/bids"))),
            supplier,
        )
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json::<Value>().await.expect("Failed to parse body");
    (status, body)
}

/// 요구사항 등록 테스트
#[tokio::test]
async fn test_create_requirement() {
    let server = setup().await;
    let start = Utc::now() + Duration::hours(1);

    let response = server
        .as_admin(server.client.post(server.url("/requirements")))
        .json(&json!({
            "product_name": "Steel pipe",
            "hs_code": "7304",
            "moq": 100,
            "description": "Seamless, 50mm",
            "start_time": start,
            "end_time": start + Duration::days(2),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.json::<Value>().await.expect("Failed to parse body");
    assert_eq!(body["requirement"]["status"], "upcoming");
    assert_eq!(body["requirement"]["created_by"], "admin-1");
    assert_eq!(body["warnings"], json!([]));
    let id = body["requirement"]["id"].as_str().expect("id 없음").to_string();

    // 목록은 캐시에서 읽는다
    let list = server
        .as_supplier(server.client.get(server.url("/requirements")), "s-1")
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    let items = list.as_array().expect("배열이 아님");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.as_str());
    assert_eq!(items[0]["bid_count"], 0);

    // 시작 전 경매에는 입찰할 수 없다
    let requirement_id: Uuid = id.parse().expect("uuid 아님");
    let (status, body) = place_bid(&server, requirement_id, "s-1", json!(1000)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "AUCTION_NOT_OPEN");
    assert_eq!(body["status"], "upcoming");
}

/// 공급사는 요구사항을 등록할 수 없다
#[tokio::test]
async fn test_supplier_cannot_create_requirement() {
    let server = setup().await;
    let start = Utc::now() + Duration::hours(1);

    let response = server
        .as_supplier(server.client.post(server.url("/requirements")), "s-1")
        .json(&json!({
            "product_name": "Steel pipe",
            "hs_code": "7304",
            "moq": 100,
            "description": "Seamless, 50mm",
            "start_time": start,
            "end_time": start + Duration::days(2),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// 과거 시작 시각은 거절된다
#[tokio::test]
async fn test_create_requirement_rejects_past_start() {
    let server = setup().await;
    let start = Utc::now() - Duration::hours(1);

    let response = server
        .as_admin(server.client.post(server.url("/requirements")))
        .json(&json!({
            "product_name": "Steel pipe",
            "hs_code": "7304",
            "moq": 100,
            "description": "Seamless, 50mm",
            "start_time": start,
            "end_time": start + Duration::days(2),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>().await.expect("Failed to parse body");
    assert_eq!(body["code"], "INVALID_WINDOW");
}

/// 입찰 테스트: 1% 이상 낮아야 한다
#[tokio::test]
async fn test_place_bid() {
    let server = setup().await;
    let requirement = server.open_requirement("admin-1").await;

    let (status, body) = place_bid(&server, requirement.id, "s-1", json!(1000)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["bid"]["amount"], 1000.0);
    assert_eq!(body["previous_lowest_amount"], Value::Null);

    let (status, body) = place_bid(&server, requirement.id, "s-2", json!(991)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BID_NOT_LOW_ENOUGH");
    assert_eq!(body["lowest_amount"], 1000.0);
    assert_eq!(body["ceiling"], 990.0);

    let (status, body) = place_bid(&server, requirement.id, "s-2", json!("989.99")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["previous_lowest_amount"], 1000.0);

    let (status, body) = place_bid(&server, requirement.id, "s-3", json!(-5)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AMOUNT");

    let (status, body) = place_bid(&server, requirement.id, "s-3", json!("abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AMOUNT");

    // 최저 입찰 조회
    let lowest = server
        .as_admin(
            server
                .client
                .get(server.url(&format!("/requirements/{}/lowest-bid", requirement.id))),
        )
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(lowest["amount"], 989.99);
    assert_eq!(lowest["supplier_id"], "s-2");

    // 상세 조회
    let detail = server
        .as_supplier(
            server
                .client
                .get(server.url(&format!("/requirements/{}", requirement.id))),
            "s-1",
        )
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(detail["status"], "open");
    assert_eq!(detail["bid_count"], 2);
    assert_eq!(detail["lowest_amount"], 989.99);
    assert_eq!(detail["time_remaining"]["is_expired"], false);
}

/// 없는 요구사항에 입찰
#[tokio::test]
async fn test_bid_on_missing_requirement() {
    let server = setup().await;
    let (status, body) = place_bid(&server, Uuid::new_v4(), "s-1", json!(1000)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

/// 공급사는 다른 공급사 정보를 볼 수 없다
#[tokio::test]
async fn test_bid_list_visibility() {
    let server = setup().await;
    let requirement = server.open_requirement("admin-1").await;
    place_bid(&server, requirement.id, "s-1", json!(1000)).await;
    place_bid(&server, requirement.id, "s-2", json!(950)).await;

    let path = format!("/requirements/{}/bids", requirement.id);
    let supplier_view = server
        .as_supplier(server.client.get(server.url(&path)), "s-1")
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    let bids = supplier_view.as_array().expect("배열이 아님");
    assert_eq!(bids.len(), 2);
    assert_eq!(bids[0]["rank"], 1);
    assert_eq!(bids[0]["amount"], 950.0);
    assert_eq!(bids[0]["is_lowest"], true);
    assert!(bids.iter().all(|b| b.get("supplier_id").is_none()));
    assert!(bids.iter().all(|b| b.get("supplier_name").is_none()));

    let admin_view = server
        .as_admin(server.client.get(server.url(&path)))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    let bids = admin_view.as_array().expect("배열이 아님");
    assert_eq!(bids[0]["supplier_id"], "s-2");
    assert_eq!(bids[1]["supplier_name"], "Supplier s-1");
}

/// 요구사항 삭제 테스트
#[tokio::test]
async fn test_delete_requirement() {
    let server = setup().await;
    let requirement = server.open_requirement("admin-1").await;
    place_bid(&server, requirement.id, "s-1", json!(1000)).await;
    let path = format!("/requirements/{}", requirement.id);

    // 다른 관리자는 삭제할 수 없다
    let response = server
        .client
        .delete(server.url(&path))
        .header("x-user-id", "admin-2")
        .header("x-user-role", "admin")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .as_admin(server.client.delete(server.url(&path)))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json::<Value>().await.expect("Failed to parse body");
    assert_eq!(body["removed_bids"], 1);

    // 입찰도 함께 삭제된다
    assert!(server
        .store
        .bids_for(requirement.id)
        .await
        .expect("조회 실패")
        .is_empty());
    let response = server
        .as_admin(server.client.get(server.url(&path)))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// 알림 실패는 입찰을 막지 않는다
#[tokio::test]
async fn test_notification_failure_is_a_warning() {
    let server = setup_with(Arc::new(FailingSender)).await;
    let requirement = server.open_requirement("admin-1").await;

    let (status, body) = place_bid(&server, requirement.id, "s-1", json!(1000)).await;
    assert_eq!(status, StatusCode::CREATED);
    let warnings = body["warnings"].as_array().expect("배열이 아님");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap_or_default().contains("smtp down"));

    let bids = server.store.bids_for(requirement.id).await.expect("조회 실패");
    assert_eq!(bids.len(), 1);
}

/// 로그인 헤더가 없으면 401
#[tokio::test]
async fn test_missing_user_header() {
    let server = setup().await;
    let response = server
        .client
        .get(server.url("/requirements"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.json::<Value>().await.expect("Failed to parse body");
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

/// 임시 저장 테스트
#[tokio::test]
async fn test_drafts() {
    let server = setup().await;
    let path = "/drafts/new-requirement";

    let empty = server
        .as_admin(server.client.get(server.url(path)))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(empty, Value::Null);

    let response = server
        .as_admin(server.client.put(server.url(path)))
        .json(&json!({ "product_name": "Half-typed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let saved = server
        .as_admin(server.client.get(server.url(path)))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(saved["data"]["product_name"], "Half-typed");

    // 다른 사용자의 임시 저장은 보이지 않는다
    let other = server
        .as_supplier(server.client.get(server.url(path)), "s-1")
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(other, Value::Null);

    let response = server
        .as_admin(server.client.delete(server.url(path)))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cleared = server
        .as_admin(server.client.get(server.url(path)))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(cleared, Value::Null);

    let response = server
        .as_admin(server.client.get(server.url("/drafts/unknown-form")))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// 입찰 임시 저장은 요구사항과 함께 사라진다
#[tokio::test]
async fn test_bid_drafts_follow_requirement() {
    let server = setup().await;

    // 없는 요구사항의 입찰 폼은 저장하지 않는다
    let response = server
        .as_supplier(
            server
                .client
                .put(server.url(&format!("/drafts/bid-{}", Uuid::new_v4()))),
            "s-1",
        )
        .json(&json!({ "amount": "950" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let requirement = server.open_requirement("admin-1").await;
    let draft_path = format!("/drafts/bid-{}", requirement.id);
    let response = server
        .as_supplier(server.client.put(server.url(&draft_path)), "s-1")
        .json(&json!({ "amount": "950" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .as_admin(
            server
                .client
                .delete(server.url(&format!("/requirements/{}", requirement.id))),
        )
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let draft = server
        .as_supplier(server.client.get(server.url(&draft_path)), "s-1")
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(draft, Value::Null);
}

/// 이메일 발송 점검
#[tokio::test]
async fn test_email_check() {
    let server = setup().await;

    let response = server
        .as_supplier(server.client.post(server.url("/admin/email-test")), "s-1")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let report = server
        .as_admin(server.client.post(server.url("/admin/email-test")))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(report["configured"], false);
    assert_eq!(report["success"], true);
    assert_eq!(report["sent_count"], 0);
    assert_eq!(report["error"], Value::Null);

    let failing = setup_with(Arc::new(FailingSender)).await;
    let report = failing
        .as_admin(failing.client.post(failing.url("/admin/email-test")))
        .send()
        .await
        .expect("Failed to send request")
        .json::<Value>()
        .await
        .expect("Failed to parse body");
    assert_eq!(report["configured"], true);
    assert_eq!(report["success"], false);
    assert!(report["error"].as_str().unwrap_or_default().contains("smtp down"));
}
