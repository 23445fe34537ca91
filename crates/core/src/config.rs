//! 설정 관리: contraband.toml 파싱 및 런타임 설정
//!
//! [`ContrabandConfig`]는 스캐너와 CLI가 공유하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CONTRABAND_POOL_WORKER_COUNT=8` 형식)
//! 3. 설정 파일 (`contraband.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), contraband_core::error::ContrabandError> {
//! use contraband_core::config::ContrabandConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ContrabandConfig::load("contraband.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ContrabandConfig::parse("[pool]\nworker_count = 8")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ContrabandError};

/// 워커 수 상한
pub const MAX_WORKER_COUNT: usize = 256;

/// 작업 큐 용량 상한
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

/// contraband 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContrabandConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 크기 제한
    #[serde(default)]
    pub limits: LimitsConfig,
    /// 워커 풀 설정
    #[serde(default)]
    pub pool: PoolConfig,
    /// 검사 정의
    #[serde(default)]
    pub checks: ChecksConfig,
}

impl ContrabandConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ContrabandError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ContrabandError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ContrabandError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ContrabandError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ContrabandError> {
        toml::from_str(toml_str).map_err(|e| {
            ContrabandError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CONTRABAND_{SECTION}_{FIELD}`
    /// 검사 정의(`checks`)는 환경변수로 덮어쓰지 않습니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CONTRABAND_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "CONTRABAND_GENERAL_LOG_FORMAT",
        );

        // Limits
        override_u64(
            &mut self.limits.max_archive_entry_size,
            "CONTRABAND_LIMITS_MAX_ARCHIVE_ENTRY_SIZE",
        );
        override_u64(
            &mut self.limits.max_total_archive_memory,
            "CONTRABAND_LIMITS_MAX_TOTAL_ARCHIVE_MEMORY",
        );
        override_u64(
            &mut self.limits.max_content_scan_file_size,
            "CONTRABAND_LIMITS_MAX_CONTENT_SCAN_FILE_SIZE",
        );

        // Pool
        override_usize(&mut self.pool.worker_count, "CONTRABAND_POOL_WORKER_COUNT");
        override_usize(
            &mut self.pool.queue_capacity,
            "CONTRABAND_POOL_QUEUE_CAPACITY",
        );
        override_string(&mut self.pool.queue_policy, "CONTRABAND_POOL_QUEUE_POLICY");
        override_u64(
            &mut self.pool.admission_wait_ms,
            "CONTRABAND_POOL_ADMISSION_WAIT_MS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ContrabandError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.limits.validate()?;
        self.pool.validate()?;
        self.checks.validate()?;

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ContrabandError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 크기 제한 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// 아카이브 엔트리 최대 크기 (바이트). 초과하는 엔트리는 건너뜁니다.
    pub max_archive_entry_size: u64,
    /// 동시에 메모리에 올릴 수 있는 콘텐츠 총량 (바이트). 메모리 예산 용량입니다.
    pub max_total_archive_memory: u64,
    /// 일반 파일 콘텐츠 스캔 최대 크기 (바이트)
    pub max_content_scan_file_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_archive_entry_size: 10 * 1024 * 1024,     // 10MB
            max_total_archive_memory: 256 * 1024 * 1024,  // 256MB
            max_content_scan_file_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Result<(), ContrabandError> {
        if self.max_archive_entry_size == 0 {
            return Err(invalid(
                "limits.max_archive_entry_size",
                "must be greater than 0",
            ));
        }
        if self.max_total_archive_memory == 0 {
            return Err(invalid(
                "limits.max_total_archive_memory",
                "must be greater than 0",
            ));
        }
        if self.max_content_scan_file_size == 0 {
            return Err(invalid(
                "limits.max_content_scan_file_size",
                "must be greater than 0",
            ));
        }
        if self.max_archive_entry_size > self.max_total_archive_memory {
            return Err(invalid(
                "limits.max_archive_entry_size",
                format!(
                    "must not exceed max_total_archive_memory ({})",
                    self.max_total_archive_memory
                ),
            ));
        }
        if self.max_content_scan_file_size > self.max_total_archive_memory {
            return Err(invalid(
                "limits.max_content_scan_file_size",
                format!(
                    "must not exceed max_total_archive_memory ({})",
                    self.max_total_archive_memory
                ),
            ));
        }
        Ok(())
    }
}

/// 워커 풀 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// 병렬 워커 수
    pub worker_count: usize,
    /// 작업 큐 용량
    pub queue_capacity: usize,
    /// 큐가 가득 찼을 때의 정책 (block, reject)
    pub queue_policy: String,
    /// 메모리 예산 부족 시 대기 시간 (밀리초). 0이면 즉시 건너뜁니다.
    pub admission_wait_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 64,
            queue_policy: "block".to_owned(),
            admission_wait_ms: 5_000,
        }
    }
}

impl PoolConfig {
    fn validate(&self) -> Result<(), ContrabandError> {
        if self.worker_count == 0 || self.worker_count > MAX_WORKER_COUNT {
            return Err(invalid(
                "pool.worker_count",
                format!("must be between 1 and {MAX_WORKER_COUNT}"),
            ));
        }
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(invalid(
                "pool.queue_capacity",
                format!("must be between 1 and {MAX_QUEUE_CAPACITY}"),
            ));
        }
        let valid_policies = ["block", "reject"];
        if !valid_policies.contains(&self.queue_policy.as_str()) {
            return Err(invalid(
                "pool.queue_policy",
                format!("must be one of: {}", valid_policies.join(", ")),
            ));
        }
        Ok(())
    }
}

/// 검사 정의 모음
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// 콘텐츠 키워드 검사
    pub content: Vec<ContentCheckConfig>,
    /// 파일 이름 검사
    pub filename: Vec<FilenameCheckConfig>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            content: vec![ContentCheckConfig {
                name: "credentials".to_owned(),
                reason: "file content contains credential keywords".to_owned(),
                keywords: vec![
                    "password".to_owned(),
                    "secret_key".to_owned(),
                    "private_key".to_owned(),
                    "api_key".to_owned(),
                ],
                include: Vec::new(),
                exclude: Vec::new(),
                scope: "file".to_owned(),
            }],
            filename: vec![FilenameCheckConfig {
                name: "key-material".to_owned(),
                reason: "file name suggests key material".to_owned(),
                patterns: vec!["*.pem".to_owned(), "id_rsa".to_owned(), ".env".to_owned()],
            }],
        }
    }
}

impl ChecksConfig {
    fn validate(&self) -> Result<(), ContrabandError> {
        let mut names = HashSet::new();

        for (i, check) in self.content.iter().enumerate() {
            if check.name.trim().is_empty() {
                return Err(invalid(
                    &format!("checks.content[{i}].name"),
                    "must not be empty",
                ));
            }
            if !names.insert(check.name.as_str()) {
                return Err(invalid(
                    &format!("checks.content[{i}].name"),
                    format!("duplicate check name '{}'", check.name),
                ));
            }
            if check.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(invalid(
                    &format!("checks.content[{i}].keywords"),
                    "must contain at least one non-empty keyword",
                ));
            }
            let valid_scopes = ["file", "repository"];
            if !valid_scopes.contains(&check.scope.as_str()) {
                return Err(invalid(
                    &format!("checks.content[{i}].scope"),
                    format!("must be one of: {}", valid_scopes.join(", ")),
                ));
            }
        }

        for (i, check) in self.filename.iter().enumerate() {
            if check.name.trim().is_empty() {
                return Err(invalid(
                    &format!("checks.filename[{i}].name"),
                    "must not be empty",
                ));
            }
            if !names.insert(check.name.as_str()) {
                return Err(invalid(
                    &format!("checks.filename[{i}].name"),
                    format!("duplicate check name '{}'", check.name),
                ));
            }
            if check.patterns.iter().all(|p| p.trim().is_empty()) {
                return Err(invalid(
                    &format!("checks.filename[{i}].patterns"),
                    "must contain at least one non-empty pattern",
                ));
            }
        }

        Ok(())
    }
}

/// 콘텐츠 키워드 검사 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCheckConfig {
    /// 검사 이름 (고유)
    pub name: String,
    /// 이슈 메시지에 들어갈 사유
    #[serde(default)]
    pub reason: String,
    /// 금지 키워드 (대소문자 무시, 부분 문자열 매칭)
    pub keywords: Vec<String>,
    /// 적용 대상 glob (비어 있으면 전체)
    #[serde(default)]
    pub include: Vec<String>,
    /// 제외 glob (include보다 우선)
    #[serde(default)]
    pub exclude: Vec<String>,
    /// 이슈 범위 (file, repository)
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_scope() -> String {
    "file".to_owned()
}

/// 파일 이름 검사 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilenameCheckConfig {
    /// 검사 이름 (고유)
    pub name: String,
    /// 이슈 메시지에 들어갈 사유
    #[serde(default)]
    pub reason: String,
    /// 금지 파일 이름 glob
    pub patterns: Vec<String>,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = ContrabandConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.pool.worker_count, 4);
        assert_eq!(config.pool.queue_policy, "block");
        assert_eq!(config.checks.content.len(), 1);
        assert_eq!(config.checks.filename.len(), 1);
        assert!(config.limits.max_archive_entry_size <= config.limits.max_total_archive_memory);
    }

    #[test]
    fn default_config_passes_validation() {
        ContrabandConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = ContrabandConfig::parse("").unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.checks.content[0].name, "credentials");
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[pool]
worker_count = 16
"#;
        let config = ContrabandConfig::parse(toml).unwrap();
        assert_eq!(config.pool.worker_count, 16);
        // 나머지는 기본값 유지
        assert_eq!(config.pool.queue_capacity, 64);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn parse_checks_replaces_defaults() {
        let toml = r#"
[[checks.content]]
name = "tokens"
keywords = ["token"]
include = ["*.txt"]
scope = "repository"
"#;
        let config = ContrabandConfig::parse(toml).unwrap();
        assert_eq!(config.checks.content.len(), 1);
        assert_eq!(config.checks.content[0].name, "tokens");
        assert_eq!(config.checks.content[0].scope, "repository");
        // 지정하지 않은 filename 목록은 기본값 유지
        assert_eq!(config.checks.filename[0].name, "key-material");
        config.validate().unwrap();
    }

    #[test]
    fn content_check_scope_defaults_to_file() {
        let toml = r#"
[[checks.content]]
name = "tokens"
keywords = ["token"]
"#;
        let config = ContrabandConfig::parse(toml).unwrap();
        assert_eq!(config.checks.content[0].scope, "file");
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = ContrabandConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            ContrabandError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = ContrabandConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = ContrabandConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = ContrabandConfig::default();
        config.limits.max_total_archive_memory = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_total_archive_memory"));
    }

    #[test]
    fn validate_rejects_entry_size_above_total_memory() {
        let mut config = ContrabandConfig::default();
        config.limits.max_archive_entry_size = 1024;
        config.limits.max_total_archive_memory = 512;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_archive_entry_size"));
    }

    #[test]
    fn validate_rejects_file_size_above_total_memory() {
        let mut config = ContrabandConfig::default();
        config.limits.max_archive_entry_size = 512;
        config.limits.max_total_archive_memory = 1024;
        config.limits.max_content_scan_file_size = 2048;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_content_scan_file_size"));

        config.limits.max_content_scan_file_size = 1024;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_worker_count_out_of_range() {
        let mut config = ContrabandConfig::default();
        config.pool.worker_count = 0;
        assert!(config.validate().is_err());
        config.pool.worker_count = MAX_WORKER_COUNT + 1;
        assert!(config.validate().is_err());
        config.pool.worker_count = MAX_WORKER_COUNT;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_invalid_queue_policy() {
        let mut config = ContrabandConfig::default();
        config.pool.queue_policy = "drop".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("queue_policy"));
    }

    #[test]
    fn validate_rejects_duplicate_check_names() {
        let mut config = ContrabandConfig::default();
        config.checks.filename[0].name = "credentials".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_rejects_content_check_without_keywords() {
        let mut config = ContrabandConfig::default();
        config.checks.content[0].keywords = vec!["  ".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("keywords"));
    }

    #[test]
    fn validate_rejects_filename_check_without_patterns() {
        let mut config = ContrabandConfig::default();
        config.checks.filename[0].patterns.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("patterns"));
    }

    #[test]
    fn validate_rejects_unknown_scope() {
        let mut config = ContrabandConfig::default();
        config.checks.content[0].scope = "global".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scope"));
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_CONTRABAND_STR", "overridden") };
        override_string(&mut val, "TEST_CONTRABAND_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_CONTRABAND_STR") };
    }

    #[test]
    fn env_override_u64_invalid_keeps_original() {
        let mut val = 42u64;
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_CONTRABAND_U64_BAD", "lots") };
        override_u64(&mut val, "TEST_CONTRABAND_U64_BAD");
        assert_eq!(val, 42);
        unsafe { std::env::remove_var("TEST_CONTRABAND_U64_BAD") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = 7usize;
        override_usize(&mut val, "TEST_CONTRABAND_NONEXISTENT_12345");
        assert_eq!(val, 7);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = ContrabandConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = ContrabandConfig::parse(&toml_str).unwrap();
        assert_eq!(config.pool.worker_count, parsed.pool.worker_count);
        assert_eq!(
            config.checks.filename[0].patterns,
            parsed.checks.filename[0].patterns
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = ContrabandConfig::from_file("/nonexistent/path/contraband.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ContrabandError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
