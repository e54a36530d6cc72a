//! Docmat 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 라이브러리 에러를 `map_err`로 `CoreError`에 매핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 이미지 처리, 네트워크, 저장소 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 인증 실패 (미로그인, 토큰 만료 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "History", "News")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 네트워크 에러 (연결 실패, DNS 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("타임아웃: {0}")]
    Timeout(String),

    /// Rate Limit 초과 (429)
    #[error("요청 한도 초과, {retry_after_secs}초 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (초)
        retry_after_secs: u64,
    },

    /// 서비스 일시 불가 (5xx)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 이미지를 열거나 디코딩할 수 없음
    #[error("이미지 디코딩 실패: {0}")]
    ImageDecode(String),

    /// 이미지 인코딩/리사이즈 실패
    #[error("이미지 인코딩 실패: {0}")]
    ImageEncode(String),

    /// 문서/객체 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 히스토리 저장 전략 전부 실패
    #[error("히스토리 저장 실패 — 모든 전략 실패: {}", attempts.join("; "))]
    PersistenceExhausted {
        /// 전략별 실패 사유 (시도 순서)
        attempts: Vec<String>,
    },
}
