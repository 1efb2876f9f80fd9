/// 작성 중인 폼 임시 저장
/// 새로고침이나 탭 전환 후에도 입력값을 되살리기 위한 편의 기능이다.
/// 복원된 값도 일반 입력과 똑같이 검증을 거친다.
// region:    --- Imports
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Form Id
/// 폼 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormId {
    NewRequirement,
    Bid(Uuid),
}

impl FormId {
    /// 이 기간보다 오래된 임시 저장은 버린다
    pub fn staleness_window(&self) -> Duration {
        match self {
            FormId::NewRequirement => Duration::hours(24),
            FormId::Bid(_) => Duration::hours(1),
        }
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormId::NewRequirement => f.write_str("new-requirement"),
            FormId::Bid(id) => write!(f, "bid-{id}"),
        }
    }
}

impl FromStr for FormId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "new-requirement" {
            return Ok(FormId::NewRequirement);
        }
        s.strip_prefix("bid-")
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(FormId::Bid)
            .ok_or_else(|| format!("알 수 없는 폼: {s}"))
    }
}
// endregion: --- Form Id

// region:    --- Draft Backend
/// 키-문자열 저장소
pub trait DraftBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct MemoryDraftBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl DraftBackend for MemoryDraftBackend {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }
}
// endregion: --- Draft Backend

// region:    --- Draft Store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub data: serde_json::Value,
    pub saved_at: DateTime<Utc>,
}

pub struct DraftStore<B> {
    backend: B,
}

impl<B: DraftBackend> DraftStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    fn key(owner: &str, form: FormId) -> String {
        format!("draft:{owner}:{form}")
    }

    pub fn save_draft(
        &self,
        owner: &str,
        form: FormId,
        data: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Draft {
        let draft = Draft {
            data,
            saved_at: now,
        };
        // Value와 DateTime 직렬화는 실패하지 않는다
        let encoded = serde_json::to_string(&draft).unwrap_or_default();
        self.backend.set(&Self::key(owner, form), encoded);
        debug!("{:<12} --> 임시 저장: owner={}, form={}", "Draft", owner, form);
        draft
    }

    /// 임시 저장 불러오기
    /// 보관 기간이 지났거나 읽을 수 없는 항목은 지우고 None을 돌려준다.
    pub fn load_draft(&self, owner: &str, form: FormId, now: DateTime<Utc>) -> Option<Draft> {
        let key = Self::key(owner, form);
        let raw = self.backend.get(&key)?;

        let draft: Draft = match serde_json::from_str(&raw) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("{:<12} --> 손상된 임시 저장 삭제: key={}, {}", "Draft", key, e);
                self.backend.remove(&key);
                return None;
            }
        };

        if now - draft.saved_at > form.staleness_window() {
            debug!("{:<12} --> 만료된 임시 저장 삭제: key={}", "Draft", key);
            self.backend.remove(&key);
            return None;
        }

        Some(draft)
    }

    pub fn clear_draft(&self, owner: &str, form: FormId) {
        self.backend.remove(&Self::key(owner, form));
    }

    /// 모든 사용자의 해당 폼 임시 저장 삭제 (요구사항 삭제 시)
    pub fn clear_form(&self, form: FormId) -> usize {
        let suffix = format!(":{form}");
        let mut removed = 0;
        for key in self.backend.keys() {
            if key.starts_with("draft:") && key.ends_with(&suffix) {
                self.backend.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// 만료되었거나 읽을 수 없는 임시 저장을 모두 지운다
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for key in self.backend.keys() {
            let Some(form) = key
                .rsplit_once(':')
                .and_then(|(_, form)| form.parse::<FormId>().ok())
            else {
                continue;
            };
            let expired = match self.backend.get(&key) {
                Some(raw) => match serde_json::from_str::<Draft>(&raw) {
                    Ok(draft) => now - draft.saved_at > form.staleness_window(),
                    Err(_) => true,
                },
                None => false,
            };
            if expired {
                self.backend.remove(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("{:<12} --> 만료된 임시 저장 {}건 삭제", "Draft", removed);
        }
        removed
    }
}
// endregion: --- Draft Store
