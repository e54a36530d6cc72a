//! 네트워크 에러 매핑 및 사용자 메시지 분류.
//!
//! reqwest 전송 에러와 HTTP 상태 코드를 `CoreError`로 매핑하고,
//! 호출자(UI/CLI)에게 보여줄 실패 유형을 분류한다.

use std::error::Error as _;

use docmat_core::error::CoreError;
use tracing::warn;

/// 호스트 도달 불가 표식 (`CoreError::Network` 메시지 접두사)
pub const HOST_UNREACHABLE: &str = "호스트 도달 불가";

/// 잘못된 이미지 형식 (400)
pub const FIELD_IMAGE_FORMAT: &str = "image_format";
/// 이미지 크기 초과 (413)
pub const FIELD_IMAGE_SIZE: &str = "image_size";
/// 처리 불가 이미지 (422)
pub const FIELD_IMAGE_CONTENT: &str = "image_content";

/// Retry-After 헤더가 없을 때 기본 대기 시간 (초)
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// reqwest 전송 에러 → `CoreError`
pub fn map_transport_error(e: reqwest::Error, context: &str) -> CoreError {
    if e.is_timeout() {
        return CoreError::Timeout(format!("{context}: {e}"));
    }
    if e.is_connect() && is_dns_failure(&e) {
        return CoreError::Network(format!("{HOST_UNREACHABLE}: {context}: {e}"));
    }
    CoreError::Network(format!("{context}: {e}"))
}

/// 에러 체인에 DNS 해석 실패가 있는지
fn is_dns_failure(e: &reqwest::Error) -> bool {
    let mut source = e.source();
    while let Some(err) = source {
        let text = err.to_string().to_lowercase();
        if text.contains("dns") || text.contains("resolve") || text.contains("lookup") {
            return true;
        }
        source = err.source();
    }
    false
}

/// 응답 상태 코드 확인 및 에러 매핑
pub async fn check_response(
    resp: reqwest::Response,
    resource_type: &str,
) -> Result<reqwest::Response, CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let text = resp.text().await.unwrap_or_else(|e| {
        warn!("응답 본문 읽기 실패: {e}");
        String::new()
    });

    Err(map_status(status.as_u16(), &text, resource_type, retry_after))
}

/// HTTP 상태 코드 → `CoreError`
pub fn map_status(
    status_code: u16,
    body: &str,
    resource_type: &str,
    retry_after_secs: Option<u64>,
) -> CoreError {
    match status_code {
        400 => validation(FIELD_IMAGE_FORMAT, body),
        401 | 403 => CoreError::Auth(format!("인증 실패 ({status_code}): {body}")),
        404 => CoreError::NotFound {
            resource_type: resource_type.to_string(),
            id: body.to_string(),
        },
        413 => validation(FIELD_IMAGE_SIZE, body),
        422 => validation(FIELD_IMAGE_CONTENT, body),
        429 => CoreError::RateLimit {
            retry_after_secs: retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        500..=599 => CoreError::ServiceUnavailable(format!("서버 에러 ({status_code}): {body}")),
        _ => CoreError::Internal(format!("API 에러 ({status_code}): {body}")),
    }
}

fn validation(field: &str, body: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: body.to_string(),
    }
}

/// 사용자에게 보여줄 실패 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    NoConnectivity,
    HostUnreachable,
    Unauthenticated,
    InvalidImage,
    ImageTooLarge,
    Unprocessable,
    ServerError,
    Other,
}

impl FailureKind {
    /// `CoreError`를 실패 유형으로 분류
    pub fn classify(error: &CoreError) -> Self {
        match error {
            CoreError::Timeout(_) => FailureKind::Timeout,
            CoreError::Network(msg) if msg.starts_with(HOST_UNREACHABLE) => {
                FailureKind::HostUnreachable
            }
            CoreError::Network(_) => FailureKind::NoConnectivity,
            CoreError::Auth(_) => FailureKind::Unauthenticated,
            CoreError::Validation { field, .. } => match field.as_str() {
                FIELD_IMAGE_FORMAT => FailureKind::InvalidImage,
                FIELD_IMAGE_SIZE => FailureKind::ImageTooLarge,
                FIELD_IMAGE_CONTENT => FailureKind::Unprocessable,
                _ => FailureKind::Other,
            },
            CoreError::ImageDecode(_) => FailureKind::InvalidImage,
            CoreError::ServiceUnavailable(_) | CoreError::RateLimit { .. } => {
                FailureKind::ServerError
            }
            _ => FailureKind::Other,
        }
    }

    /// 사용자 메시지 (앱 표시 언어)
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::Timeout => "Koneksi timeout. Periksa internet Anda.",
            FailureKind::NoConnectivity => "Tidak ada koneksi internet.",
            FailureKind::HostUnreachable => "Server tidak dapat dijangkau.",
            FailureKind::Unauthenticated => "Sesi berakhir. Silakan masuk kembali.",
            FailureKind::InvalidImage => "Format gambar tidak valid. Gunakan JPEG, PNG, atau JPG.",
            FailureKind::ImageTooLarge => "Ukuran gambar terlalu besar.",
            FailureKind::Unprocessable => "Gambar tidak dapat diproses. Pastikan gambar jelas.",
            FailureKind::ServerError => "Server sedang bermasalah. Coba lagi nanti.",
            FailureKind::Other => "Terjadi kesalahan.",
        }
    }
}

/// 에러 → 사용자 메시지 (기타 유형은 원인 포함)
pub fn user_message(error: &CoreError) -> String {
    match FailureKind::classify(error) {
        FailureKind::Other => format!("{} {}", FailureKind::Other.user_message(), error),
        kind => kind.user_message().to_string(),
    }
}
