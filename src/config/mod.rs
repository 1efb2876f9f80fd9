/// 환경 변수 기반 설정
// region:    --- Imports
use std::str::FromStr;
use std::time::Duration;
// endregion: --- Imports

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} 값이 올바르지 않습니다: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 이메일 함수 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub function_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// 없으면 메모리 저장소로 실행
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_reset: bool,
    /// 없으면 프로세스 내부 변경 알림만 사용
    pub kafka_brokers: Option<String>,
    pub kafka_group_id: String,
    pub change_topic: String,
    pub status_refresh_interval: Duration,
    pub notify_wait: Duration,
    pub email_timeout: Duration,
    /// 없으면 알림은 로그로만 남긴다
    pub email: Option<EmailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let email = match (var("EMAIL_FUNCTION_URL"), var("EMAIL_API_KEY")) {
            (Some(function_url), Some(api_key)) => Some(EmailConfig {
                function_url,
                api_key,
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: var("DATABASE_URL"),
            database_max_connections: non_zero(&var, "DATABASE_MAX_CONNECTIONS", 5)?,
            database_reset: parse_or(&var, "DATABASE_RESET", false)?,
            kafka_brokers: var("KAFKA_BROKERS"),
            kafka_group_id: var("KAFKA_GROUP_ID").unwrap_or_else(|| "auction-changes-group".to_string()),
            change_topic: var("CHANGE_TOPIC").unwrap_or_else(|| "auction-changes".to_string()),
            status_refresh_interval: Duration::from_secs(non_zero(&var, "STATUS_REFRESH_SECS", 60)?),
            notify_wait: Duration::from_millis(parse_or(&var, "NOTIFY_WAIT_MS", 1500)?),
            email_timeout: Duration::from_secs(parse_or(&var, "EMAIL_TIMEOUT_SECS", 10)?),
            email,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// 0이면 쓸 수 없는 값 (갱신 주기, 풀 크기)
fn non_zero<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    let value = parse_or(var, name, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        });
    }
    Ok(value)
}
