// region:    --- Imports
use crate::auction::events::Table;
use crate::auth::{CurrentUser, Role};
use crate::bidding::commands::handle_place_bid;
use crate::bidding::PlaceBidCommand;
use crate::draft::FormId;
use crate::error::AuctionError;
use crate::notification::collect_warning;
use crate::query;
use crate::requirement::commands::{handle_create_requirement, handle_delete_requirement};
use crate::requirement::CreateRequirementCommand;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Router
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/requirements",
            get(handle_get_requirements).post(handle_create_requirement_request),
        )
        .route(
            "/requirements/:id",
            get(handle_get_requirement).delete(handle_delete_requirement_request),
        )
        .route(
            "/requirements/:id/bids",
            get(handle_get_requirement_bids).post(handle_bid),
        )
        .route("/requirements/:id/lowest-bid", get(handle_get_lowest_bid))
        .route("/admin/email-test", post(handle_email_test))
        .route(
            "/drafts/:form",
            get(handle_get_draft)
                .put(handle_save_draft)
                .delete(handle_clear_draft),
        )
        .with_state(state)
}
// endregion: --- Router

// region:    --- Command Handlers

/// 입찰 요청 본문
/// 금액은 숫자 또는 숫자 문자열을 받는다. 해석할 수 없으면 검증 단계에서 거절된다.
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: Value,
}

fn parse_amount(amount: &Value) -> f64 {
    match amount {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// 요구사항 등록 요청 처리
pub async fn handle_create_requirement_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(cmd): Json<CreateRequirementCommand>,
) -> Result<Response, AuctionError> {
    info!("{:<12} --> 요구사항 등록 요청 처리 시작", "Command");
    let requirement =
        handle_create_requirement(state.store.as_ref(), cmd, &user, Utc::now()).await?;
    state.record_change(Table::Requirements).await;

    let notification = state.notifier.notify_new_requirement(&requirement);
    let warnings: Vec<String> = collect_warning(notification, state.notify_wait)
        .await
        .into_iter()
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "요구사항이 등록되었습니다.",
            "requirement": requirement,
            "warnings": warnings,
        })),
    )
        .into_response())
}

/// 요구사항 삭제 요청 처리
pub async fn handle_delete_requirement_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(requirement_id): Path<Uuid>,
) -> Result<Response, AuctionError> {
    user.require_role(Role::Admin)?;
    let removed_bids =
        handle_delete_requirement(state.store.as_ref(), requirement_id, &user).await?;
    state.record_change(Table::Requirements).await;
    if removed_bids > 0 {
        state.record_change(Table::Bids).await;
    }
    state.drafts.clear_form(FormId::Bid(requirement_id));

    Ok(Json(json!({
        "message": "요구사항이 삭제되었습니다.",
        "id": requirement_id,
        "removed_bids": removed_bids,
    }))
    .into_response())
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(requirement_id): Path<Uuid>,
    Json(request): Json<BidRequest>,
) -> Result<Response, AuctionError> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: requirement={}, supplier={}",
        "Command", requirement_id, user.id
    );
    user.require_role(Role::Supplier)?;

    let cmd = PlaceBidCommand {
        requirement_id,
        supplier_id: user.id.clone(),
        supplier_name: user.name.clone(),
        amount: parse_amount(&request.amount),
    };
    let placement = handle_place_bid(state.store.as_ref(), cmd, Utc::now()).await?;
    state.record_change(Table::Bids).await;

    let notification = state.notifier.notify_new_bid(
        &placement.requirement,
        &placement.bid,
        placement.previous_lowest.as_ref(),
    );
    let warnings: Vec<String> = collect_warning(notification, state.notify_wait)
        .await
        .into_iter()
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "입찰이 성공적으로 처리되었습니다.",
            "bid": placement.bid,
            "previous_lowest_amount": placement.previous_lowest.map(|b| b.amount),
            "warnings": warnings,
        })),
    )
        .into_response())
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 모든 요구사항 조회 (캐시)
pub async fn handle_get_requirements(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> impl IntoResponse {
    info!("{:<12} --> 모든 요구사항 조회", "HandlerQuery");
    Json(state.cache.requirements(Utc::now()).await)
}

/// 요구사항 조회
pub async fn handle_get_requirement(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(requirement_id): Path<Uuid>,
) -> Result<Response, AuctionError> {
    let detail =
        query::handlers::get_requirement(state.store.as_ref(), requirement_id, Utc::now()).await?;
    Ok(Json(detail).into_response())
}

/// 요구사항 입찰 조회
pub async fn handle_get_requirement_bids(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(requirement_id): Path<Uuid>,
) -> Result<Response, AuctionError> {
    let bids =
        query::handlers::get_requirement_bids(state.store.as_ref(), requirement_id, &user).await?;
    Ok(Json(bids).into_response())
}

/// 최저 입찰 조회
pub async fn handle_get_lowest_bid(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(requirement_id): Path<Uuid>,
) -> Result<Response, AuctionError> {
    let lowest =
        query::handlers::get_lowest_bid(state.store.as_ref(), requirement_id, &user).await?;
    Ok(Json(lowest).into_response())
}

// endregion: --- Query Handlers

// region:    --- Admin Handlers

/// 이메일 발송 점검 (관리자)
pub async fn handle_email_test(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AuctionError> {
    user.require_role(Role::Admin)?;
    info!("{:<12} --> 이메일 발송 점검: by={}", "Admin", user.id);
    let report = state.notifier.send_test_email(Utc::now()).await;
    Ok(Json(report).into_response())
}

// endregion: --- Admin Handlers

// region:    --- Draft Handlers

fn parse_form(form: &str) -> Result<FormId, Response> {
    form.parse::<FormId>().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e, "code": "INVALID_FORM" })),
        )
            .into_response()
    })
}

/// 임시 저장 조회
pub async fn handle_get_draft(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(form): Path<String>,
) -> Response {
    match parse_form(&form) {
        Ok(form) => Json(state.drafts.load_draft(&user.id, form, Utc::now())).into_response(),
        Err(response) => response,
    }
}

/// 임시 저장
/// 입찰 폼은 요구사항이 있어야 저장된다.
pub async fn handle_save_draft(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(form): Path<String>,
    Json(data): Json<Value>,
) -> Result<Response, AuctionError> {
    let form = match parse_form(&form) {
        Ok(form) => form,
        Err(response) => return Ok(response),
    };
    if let FormId::Bid(requirement_id) = form {
        state
            .store
            .get_requirement(requirement_id)
            .await?
            .ok_or(AuctionError::NotFound(requirement_id))?;
    }
    let draft = state.drafts.save_draft(&user.id, form, data, Utc::now());
    Ok(Json(draft).into_response())
}

/// 임시 저장 삭제
pub async fn handle_clear_draft(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(form): Path<String>,
) -> Response {
    match parse_form(&form) {
        Ok(form) => {
            state.drafts.clear_draft(&user.id, form);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(response) => response,
    }
}

// endregion: --- Draft Handlers
