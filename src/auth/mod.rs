/// 인증 사용자
/// 인증 자체는 앞단 게이트웨이가 처리하고, 검증된 사용자 정보를 헤더로 넘겨준다.
// region:    --- Imports
use crate::error::AuctionError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
// endregion: --- Imports

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

// region:    --- Current User
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supplier,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supplier" => Ok(Role::Supplier),
            other => Err(format!("알 수 없는 역할: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_role(&self, role: Role) -> Result<(), AuctionError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AuctionError::Unauthorized(format!(
                "{:?} 역할이 필요합니다",
                role
            )))
        }
    }

    /// 헤더에서 사용자 정보 추출
    /// 이름이 없으면 "User", 역할이 없으면 공급사로 본다.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, String> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let id = header(USER_ID_HEADER).ok_or_else(|| "로그인이 필요합니다".to_string())?;
        let name = header(USER_NAME_HEADER).unwrap_or("User");
        let role = match header(USER_ROLE_HEADER) {
            Some(role) => role.parse()?,
            None => Role::Supplier,
        };

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        CurrentUser::from_headers(&parts.headers).map_err(|e| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": e, "code": "UNAUTHENTICATED" })),
            )
        })
    }
}
// endregion: --- Current User
