/// 이메일 알림
/// 요구사항 등록 시 전체 공급사에게, 입찰 시 전체 공급사와 관리자에게 알린다.
/// 알림은 쓰기가 끝난 뒤 별도 태스크로 보내며, 실패해도 쓰기 결과는 바뀌지 않는다.
// region:    --- Imports
use crate::bidding::Bid;
use crate::requirement::Requirement;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Email Model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailType {
    NewRequirement,
    NewBid,
}

/// 수신 대상
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    AllSuppliers,
    AllSuppliersAndAdmin,
}

impl EmailType {
    pub fn audience(&self) -> Audience {
        match self {
            EmailType::NewRequirement => Audience::AllSuppliers,
            EmailType::NewBid => Audience::AllSuppliersAndAdmin,
        }
    }
}

/// 이메일 함수에 넘기는 데이터 (서버리스 함수 규약에 맞춰 camelCase)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub requirement_id: Uuid,
    pub product_name: String,
    pub hs_code: String,
    pub moq: i64,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_lowest_bid: Option<f64>,
}

impl EmailPayload {
    pub fn for_requirement(requirement: &Requirement) -> Self {
        Self {
            requirement_id: requirement.id,
            product_name: requirement.product_name.clone(),
            hs_code: requirement.hs_code.clone(),
            moq: requirement.moq,
            description: requirement.description.clone(),
            start_time: requirement.start_time,
            end_time: requirement.end_time,
            bid_amount: None,
            bidder_name: None,
            current_lowest_bid: None,
        }
    }

    pub fn for_bid(requirement: &Requirement, bid: &Bid, previous_lowest: Option<&Bid>) -> Self {
        Self {
            bid_amount: Some(bid.amount),
            bidder_name: Some(bid.supplier_name.clone()),
            current_lowest_bid: previous_lowest.map(|b| b.amount),
            ..Self::for_requirement(requirement)
        }
    }

    /// 발송 점검용 가상 요구사항
    pub fn test_requirement(now: DateTime<Utc>) -> Self {
        Self {
            requirement_id: Uuid::nil(),
            product_name: "API Test Product".to_string(),
            hs_code: "TEST.123".to_string(),
            moq: 1,
            description: "이메일 발송 점검".to_string(),
            start_time: now,
            end_time: now + chrono::Duration::hours(24),
            bid_amount: None,
            bidder_name: None,
            current_lowest_bid: None,
        }
    }
}

/// 발송 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailResult {
    pub sent_count: usize,
    pub recipients: Vec<String>,
}

/// 이메일 발송 점검 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailTestReport {
    pub configured: bool,
    pub success: bool,
    pub sent_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("이메일 함수 호출 실패: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("이메일 함수 응답 오류: status={status}, body={body}")]
    Rejected { status: u16, body: String },

    #[error("이메일 발송 실패: {0}")]
    Failed(String),
}
// endregion: --- Email Model

// region:    --- Email Sender
/// 이메일 발송 트레이트
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        email_type: EmailType,
        payload: &EmailPayload,
    ) -> Result<EmailResult, NotificationError>;

    /// 실제로 메일을 보낼 수 있는 발송기인지
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
struct FunctionRequest<'a> {
    #[serde(rename = "type")]
    email_type: EmailType,
    data: &'a EmailPayload,
}

#[derive(Deserialize)]
struct FunctionResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<FunctionResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct FunctionResult {
    email: String,
    status: String,
}

/// 서버리스 이메일 함수 호출
pub struct HttpEmailSender {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpEmailSender {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(
        &self,
        email_type: EmailType,
        payload: &EmailPayload,
    ) -> Result<EmailResult, NotificationError> {
        info!(
            "{:<12} --> 이메일 함수 호출: type={:?}, product={}",
            "Notify", email_type, payload.product_name
        );
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&FunctionRequest {
                email_type,
                data: payload,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: FunctionResponse = response.json().await?;
        if !body.success {
            return Err(NotificationError::Failed(
                body.error.unwrap_or_else(|| "알 수 없는 오류".to_string()),
            ));
        }
        if let Some(message) = &body.message {
            info!("{:<12} --> {}", "Notify", message);
        }

        let recipients: Vec<String> = body
            .results
            .into_iter()
            .filter(|r| r.status == "sent")
            .map(|r| r.email)
            .collect();
        Ok(EmailResult {
            sent_count: recipients.len(),
            recipients,
        })
    }
}

/// 이메일 설정이 없을 때: 내용만 로그로 남긴다
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(
        &self,
        email_type: EmailType,
        payload: &EmailPayload,
    ) -> Result<EmailResult, NotificationError> {
        warn!(
            "{:<12} --> 이메일 설정 없음, 발송 생략: type={:?}, audience={:?}, payload={}",
            "Notify",
            email_type,
            email_type.audience(),
            serde_json::to_string(payload).unwrap_or_default()
        );
        Ok(EmailResult::default())
    }

    fn is_configured(&self) -> bool {
        false
    }
}
// endregion: --- Email Sender

// region:    --- Notification Dispatcher
/// 알림 발송기
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn EmailSender>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// 새 요구사항 알림 (전체 공급사)
    pub fn notify_new_requirement(&self, requirement: &Requirement) -> JoinHandle<Option<String>> {
        self.dispatch(
            EmailType::NewRequirement,
            EmailPayload::for_requirement(requirement),
        )
    }

    /// 새 입찰 알림 (전체 공급사 + 관리자)
    pub fn notify_new_bid(
        &self,
        requirement: &Requirement,
        bid: &Bid,
        previous_lowest: Option<&Bid>,
    ) -> JoinHandle<Option<String>> {
        self.dispatch(
            EmailType::NewBid,
            EmailPayload::for_bid(requirement, bid, previous_lowest),
        )
    }

    /// 관리자 발송 점검: 가상 요구사항 알림을 보내고 결과를 그대로 돌려준다
    pub async fn send_test_email(&self, now: DateTime<Utc>) -> EmailTestReport {
        let configured = self.sender.is_configured();
        let payload = EmailPayload::test_requirement(now);
        match self.sender.send(EmailType::NewRequirement, &payload).await {
            Ok(result) => {
                info!(
                    "{:<12} --> 발송 점검 완료: configured={}, {}명",
                    "Notify", configured, result.sent_count
                );
                EmailTestReport {
                    configured,
                    success: true,
                    sent_count: result.sent_count,
                    error: None,
                }
            }
            Err(e) => {
                warn!("{:<12} --> 발송 점검 실패: {}", "Notify", e);
                EmailTestReport {
                    configured,
                    success: false,
                    sent_count: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// 별도 태스크로 발송하고, 실패하면 경고 문구를 돌려준다
    fn dispatch(&self, email_type: EmailType, payload: EmailPayload) -> JoinHandle<Option<String>> {
        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            match sender.send(email_type, &payload).await {
                Ok(result) => {
                    info!(
                        "{:<12} --> 알림 발송 완료: type={:?}, {}명",
                        "Notify", email_type, result.sent_count
                    );
                    None
                }
                Err(e) => {
                    warn!(
                        "{:<12} --> 알림 발송 실패: type={:?}, {}",
                        "Notify", email_type, e
                    );
                    Some(format!("알림 메일 발송에 실패했습니다: {e}"))
                }
            }
        })
    }
}

/// 알림 결과를 잠시 기다려 경고를 수집한다
/// 제한 시간이 지나면 기다리지 않는다. 태스크는 계속 진행된다.
pub async fn collect_warning(handle: JoinHandle<Option<String>>, wait: Duration) -> Option<String> {
    match tokio::time::timeout(wait, handle).await {
        Ok(Ok(warning)) => warning,
        Ok(Err(e)) => {
            warn!("{:<12} --> 알림 태스크 오류: {:?}", "Notify", e);
            Some("알림 메일 발송 중 오류가 발생했습니다".to_string())
        }
        Err(_) => None,
    }
}
// endregion: --- Notification Dispatcher
