//! # docmat-vision
//!
//! 업로드용 이미지 준비 크레이트.
//! 크기 탐지, 2의 거듭제곱 다운샘플, EXIF 회전, 알파 평탄화,
//! 바이트 예산 기반 적응형 JPEG 압축을 담당한다.

pub mod encoder;
pub mod flatten;
pub mod inline;
pub mod orientation;
pub mod pipeline;
pub mod probe;
pub mod resize;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;
