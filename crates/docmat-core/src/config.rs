//! 애플리케이션 설정 구조체.
//!
//! 서버 URL, 인증 엔드포인트, 이미지 준비 정책, 히스토리 인라인 예산, 저장소 경로 등
//! 런타임 설정을 정의한다. `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 예측/뉴스 서버 연결 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 인증(ID 토큰) 서버 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 업로드용 이미지 준비 정책
    #[serde(default)]
    pub vision: ImagePrepConfig,
    /// 히스토리 인라인 이미지 정책
    #[serde(default)]
    pub history: InlineImageConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

// ============================================================
// 서버/인증 설정
// ============================================================

/// 서버 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API 서버 기본 URL (예: "https://api.example.com")
    #[serde(default = "default_server_url")]
    pub base_url: String,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_server_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// 인증 서버 설정 — ID 토큰 발급/갱신 엔드포인트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 계정 REST API 기본 URL (로그인/가입)
    #[serde(default = "default_auth_url")]
    pub base_url: String,
    /// 토큰 갱신 API 기본 URL
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// 프로젝트 API 키 (쿼리 파라미터 `key`)
    #[serde(default)]
    pub api_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_auth_url(),
            token_url: default_token_url(),
            api_key: String::new(),
        }
    }
}

// ============================================================
// 이미지 준비 설정
// ============================================================

/// 업로드용 이미지 준비 정책.
///
/// 압축 루프의 모든 수치 상수는 여기서만 정의된다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrepConfig {
    /// 출력 JPEG 최대 크기 (바이트)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// 시작 JPEG 품질
    #[serde(default = "default_start_quality")]
    pub start_quality: u8,
    /// 최저 JPEG 품질
    #[serde(default = "default_min_quality")]
    pub min_quality: u8,
    /// 품질 감소 단위
    #[serde(default = "default_quality_step")]
    pub quality_step: u8,
    /// 디코딩 후 작업 해상도 상한 (픽셀, 가로/세로 각각)
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// 해상도 축소 비율 (0.0 ~ 1.0)
    #[serde(default = "default_scale_step")]
    pub scale_step: f32,
    /// 축소 하한 (픽셀, 가로/세로 각각)
    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,
    /// 크기 탐지 실패 시 가정할 원본 크기 (픽셀)
    #[serde(default = "default_fallback_probe_dimension")]
    pub fallback_probe_dimension: u32,
}

impl Default for ImagePrepConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            start_quality: default_start_quality(),
            min_quality: default_min_quality(),
            quality_step: default_quality_step(),
            max_dimension: default_max_dimension(),
            scale_step: default_scale_step(),
            min_dimension: default_min_dimension(),
            fallback_probe_dimension: default_fallback_probe_dimension(),
        }
    }
}

impl ImagePrepConfig {
    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_upload_bytes == 0 {
            return Err(invalid("max_upload_bytes", "0보다 커야 함"));
        }
        if self.start_quality == 0 || self.start_quality > 100 {
            return Err(invalid("start_quality", "1..=100 범위여야 함"));
        }
        if self.min_quality == 0 || self.min_quality > self.start_quality {
            return Err(invalid("min_quality", "1..=start_quality 범위여야 함"));
        }
        if self.quality_step == 0 {
            return Err(invalid("quality_step", "0보다 커야 함"));
        }
        if self.max_dimension == 0 || self.min_dimension == 0 {
            return Err(invalid("max_dimension", "해상도 한계는 0보다 커야 함"));
        }
        if !(self.scale_step > 0.0 && self.scale_step < 1.0) {
            return Err(invalid("scale_step", "0.0 < scale_step < 1.0 이어야 함"));
        }
        Ok(())
    }
}

/// 히스토리 문서에 이미지를 직접 넣기 위한 재압축 정책 (품질만 조절)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImageConfig {
    /// 인라인 이미지 최대 크기 (Base64 인코딩 전 바이트)
    #[serde(default = "default_inline_max_bytes")]
    pub inline_max_bytes: usize,
    /// 시작 JPEG 품질
    #[serde(default = "default_start_quality")]
    pub start_quality: u8,
    /// 품질 감소 단위
    #[serde(default = "default_inline_quality_step")]
    pub quality_step: u8,
    /// 최저 JPEG 품질
    #[serde(default = "default_inline_min_quality")]
    pub min_quality: u8,
}

impl Default for InlineImageConfig {
    fn default() -> Self {
        Self {
            inline_max_bytes: default_inline_max_bytes(),
            start_quality: default_start_quality(),
            quality_step: default_inline_quality_step(),
            min_quality: default_inline_min_quality(),
        }
    }
}

// ============================================================
// 저장소 설정
// ============================================================

/// 로컬 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 데이터 디렉토리 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// 히스토리 DB 파일 이름
    #[serde(default = "default_db_file_name")]
    pub db_file_name: String,
    /// 이미지 객체 저장 하위 폴더 이름
    #[serde(default = "default_objects_dir_name")]
    pub objects_dir_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_file_name: default_db_file_name(),
            objects_dir_name: default_objects_dir_name(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            vision: ImagePrepConfig::default(),
            history: InlineImageConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// 서버 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

fn invalid(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_auth_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}
fn default_token_url() -> String {
    "https://securetoken.googleapis.com".to_string()
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_max_upload_bytes() -> usize {
    2 * 1024 * 1024
}
fn default_start_quality() -> u8 {
    90
}
fn default_min_quality() -> u8 {
    50
}
fn default_quality_step() -> u8 {
    5
}
fn default_max_dimension() -> u32 {
    1600
}
fn default_scale_step() -> f32 {
    0.85
}
fn default_min_dimension() -> u32 {
    640
}
fn default_fallback_probe_dimension() -> u32 {
    2000
}
fn default_inline_max_bytes() -> usize {
    800 * 1024
}
fn default_inline_quality_step() -> u8 {
    10
}
fn default_inline_min_quality() -> u8 {
    10
}
fn default_db_file_name() -> String {
    "docmat.db".to_string()
}
fn default_objects_dir_name() -> String {
    "objects".to_string()
}
