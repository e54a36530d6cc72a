//! 크기 탐지 및 다운샘플 배율 계산.
//!
//! 픽셀 버퍼를 만들지 않고 헤더만 읽어 원본 크기를 얻는다.

use image::ImageReader;
use tracing::{debug, warn};

use crate::source::ImageSource;

/// 크기 탐지 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsProbe {
    /// 헤더에서 읽은 실제 크기
    Known { width: u32, height: u32 },
    /// 탐지 실패 — 보수적 기본 크기 가정
    Fallback { width: u32, height: u32 },
}

impl BoundsProbe {
    /// 배율 계산에 쓸 크기
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            BoundsProbe::Known { width, height } | BoundsProbe::Fallback { width, height } => {
                (width, height)
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, BoundsProbe::Fallback { .. })
    }
}

/// 헤더만 읽어 이미지 크기 탐지. 실패하면 `fallback_dimension` 정사각형 가정.
pub fn probe_bounds(source: &dyn ImageSource, fallback_dimension: u32) -> BoundsProbe {
    let fallback = BoundsProbe::Fallback {
        width: fallback_dimension,
        height: fallback_dimension,
    };

    let reader = match source.open() {
        Ok(reader) => reader,
        Err(e) => {
            warn!("크기 탐지용 열기 실패, 기본 크기 사용: {e}");
            return fallback;
        }
    };

    let dimensions = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| e.to_string())
        .and_then(|r| r.into_dimensions().map_err(|e| e.to_string()));

    match dimensions {
        Ok((width, height)) if width > 0 && height > 0 => {
            debug!("크기 탐지: {}x{} ({})", width, height, source.describe());
            BoundsProbe::Known { width, height }
        }
        Ok((width, height)) => {
            warn!("크기 탐지 결과 비정상 {}x{}, 기본 크기 사용", width, height);
            fallback
        }
        Err(e) => {
            warn!("크기 탐지 실패, 기본 크기 사용: {e}");
            fallback
        }
    }
}

/// 2의 거듭제곱 다운샘플 배율.
///
/// 배율로 나눈 가로/세로가 각각 `max_dimension` 이하가 되는 최소값.
pub fn in_sample_size(width: u32, height: u32, max_dimension: u32) -> u32 {
    let max_dimension = max_dimension.max(1);
    let mut sample = 1u32;
    while (width / sample > max_dimension || height / sample > max_dimension)
        && sample < (1 << 16)
    {
        sample *= 2;
    }
    sample
}

/// 배율 적용 후 크기 (최소 1px)
pub fn sampled_dimensions(width: u32, height: u32, sample: u32) -> (u32, u32) {
    let sample = sample.max(1);
    ((width / sample).max(1), (height / sample).max(1))
}
