//! # docmat-network
//!
//! 네트워크 어댑터 크레이트.
//! 예측 서비스 multipart 업로드, 뉴스 API 조회, ID 토큰 발급/갱신,
//! 전송/상태 코드 에러의 사용자 메시지 분류를 담당한다.

pub mod auth;
pub mod error_mapping;
pub mod news_client;
pub mod prediction_client;
