/// 요구사항 관련 커맨드 처리
/// 1. 요구사항 등록
/// 2. 요구사항 삭제 (입찰 포함)
// region:    --- Imports
use super::model::{CreateRequirementCommand, Requirement};
use crate::auction::resolve_status;
use crate::auth::{CurrentUser, Role};
use crate::error::AuctionError;
use crate::store::{AuctionStore, StoreError};
use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Commands
/// 1. 요구사항 등록
pub async fn handle_create_requirement(
    store: &dyn AuctionStore,
    cmd: CreateRequirementCommand,
    creator: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<Requirement, AuctionError> {
    info!(
        "{:<12} --> 요구사항 등록 요청: {}",
        "Command", cmd.product_name
    );
    creator.require_role(Role::Admin)?;
    validate_fields(&cmd)?;
    validate_window(cmd.start_time, cmd.end_time, now)?;

    let requirement = Requirement {
        id: Uuid::new_v4(),
        product_name: cmd.product_name.trim().to_string(),
        hs_code: cmd.hs_code.trim().to_string(),
        moq: cmd.moq,
        description: cmd.description.trim().to_string(),
        images: cmd.images,
        created_by: creator.id.clone(),
        start_time: cmd.start_time,
        end_time: cmd.end_time,
        status: resolve_status(cmd.start_time, cmd.end_time, now),
        created_at: now,
    };

    store.insert_requirement(&requirement).await?;
    info!(
        "{:<12} --> 요구사항 등록 완료: id={}",
        "Command", requirement.id
    );
    Ok(requirement)
}

/// 2. 요구사항 삭제
/// 등록한 관리자만 삭제할 수 있다. 삭제된 입찰 수를 돌려준다.
pub async fn handle_delete_requirement(
    store: &dyn AuctionStore,
    requirement_id: Uuid,
    requester: &CurrentUser,
) -> Result<u64, AuctionError> {
    info!(
        "{:<12} --> 요구사항 삭제 요청: id={}",
        "Command", requirement_id
    );
    let requirement = store
        .get_requirement(requirement_id)
        .await?
        .ok_or(AuctionError::NotFound(requirement_id))?;

    if requirement.created_by != requester.id {
        return Err(AuctionError::Unauthorized(
            "요구사항을 등록한 관리자만 삭제할 수 있습니다".to_string(),
        ));
    }

    match store.delete_requirement(requirement_id).await {
        Ok(removed) => {
            info!(
                "{:<12} --> 요구사항 삭제 완료: id={}, 입찰 {}건",
                "Command", requirement_id, removed
            );
            Ok(removed)
        }
        Err(StoreError::MissingRequirement(id)) => Err(AuctionError::NotFound(id)),
        Err(e) => {
            error!(
                "{:<12} --> 요구사항 삭제 실패: id={}, {:?}",
                "Command", requirement_id, e
            );
            Err(e.into())
        }
    }
}
// endregion: --- Commands

// region:    --- Validation
fn validate_fields(cmd: &CreateRequirementCommand) -> Result<(), AuctionError> {
    let required = [
        ("product_name", &cmd.product_name),
        ("hs_code", &cmd.hs_code),
        ("description", &cmd.description),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(AuctionError::InvalidRequirement(format!(
            "{field} 값이 비어 있습니다"
        )));
    }
    if cmd.moq <= 0 {
        return Err(AuctionError::InvalidRequirement(
            "moq는 0보다 커야 합니다".to_string(),
        ));
    }
    Ok(())
}

fn validate_window(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AuctionError> {
    if start_time <= now {
        return Err(AuctionError::InvalidWindow(
            "시작 시간은 현재 이후여야 합니다".to_string(),
        ));
    }
    if end_time <= start_time {
        return Err(AuctionError::InvalidWindow(
            "종료 시간은 시작 시간 이후여야 합니다".to_string(),
        ));
    }
    Ok(())
}
// endregion: --- Validation
