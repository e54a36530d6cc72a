//! # docmat-storage
//!
//! 로컬 저장소 어댑터.
//! 예측 히스토리 저장 폴백 체인(인라인 → 객체 저장소 → 메타데이터),
//! SQLite 문서 저장소, 파일시스템 객체 저장소를 제공한다.
//!
//! ## 모듈
//! - `history`: 히스토리 저장소 (폴백 체인 + 조회/검색/삭제)
//! - `sqlite`: 사용자별 히스토리 문서 저장소 (DocumentStore 구현)
//! - `object_store`: 이미지 객체 파일 저장소 (ObjectStore 구현)
//! - `migration`: 스키마 마이그레이션

pub mod history;
pub mod migration;
pub mod object_store;
pub mod sqlite;
