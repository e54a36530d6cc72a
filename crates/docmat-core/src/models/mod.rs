//! Docmat 도메인 모델.
//!
//! 예측 결과, 히스토리 기록, 뉴스 등 크레이트 간 공유하는 데이터 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod history;
pub mod news;
pub mod prediction;
