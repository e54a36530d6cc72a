//! EXIF 방향 보정.
//!
//! kamadak-exif로 Orientation 태그(0x0112)를 읽는다.
//! 읽기 실패/태그 없음은 회전 없음으로 취급한다.

use image::DynamicImage;
use tracing::debug;

use crate::source::ImageSource;

/// 적용할 회전 (시계 방향)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    /// EXIF Orientation 값 → 회전. 반전(2/4/5/7)은 회전 없음.
    pub fn from_exif(value: u32) -> Self {
        match value {
            6 => Orientation::Rotate90,
            3 => Orientation::Rotate180,
            8 => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }

    /// 회전 각도
    pub fn degrees(self) -> u16 {
        match self {
            Orientation::Normal => 0,
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
        }
    }

    /// 이미지에 회전 적용 (이전 버퍼는 소비)
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => image,
            Orientation::Rotate90 => image.rotate90(),
            Orientation::Rotate180 => image.rotate180(),
            Orientation::Rotate270 => image.rotate270(),
        }
    }
}

/// 소스의 EXIF 방향 읽기 — 어떤 실패도 `Normal`
pub fn read_orientation(source: &dyn ImageSource) -> Orientation {
    let mut reader = match source.open() {
        Ok(reader) => reader,
        Err(e) => {
            debug!("EXIF 읽기용 열기 실패, 회전 없음: {e}");
            return Orientation::Normal;
        }
    };

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("EXIF 없음/파싱 실패, 회전 없음: {e}");
            return Orientation::Normal;
        }
    };

    let orientation = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from_exif)
        .unwrap_or_default();

    debug!("EXIF 방향: {}°", orientation.degrees());
    orientation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BytesImageSource;
    use crate::test_support::{encode_jpeg_rgb, solid_rgb, with_exif_orientation};

    #[test]
    fn exif_values_map_to_rotation() {
        assert_eq!(Orientation::from_exif(1), Orientation::Normal);
        assert_eq!(Orientation::from_exif(6), Orientation::Rotate90);
        assert_eq!(Orientation::from_exif(3), Orientation::Rotate180);
        assert_eq!(Orientation::from_exif(8), Orientation::Rotate270);
        assert_eq!(Orientation::from_exif(2), Orientation::Normal);
        assert_eq!(Orientation::from_exif(0), Orientation::Normal);
    }

    #[test]
    fn reads_orientation_tag_from_jpeg() {
        let jpeg = with_exif_orientation(&encode_jpeg_rgb(&solid_rgb(16, 8, [10, 200, 10])), 6);
        let orientation = read_orientation(&BytesImageSource::new(jpeg));
        assert_eq!(orientation, Orientation::Rotate90);
    }

    #[test]
    fn missing_exif_is_normal() {
        let jpeg = encode_jpeg_rgb(&solid_rgb(16, 8, [10, 200, 10]));
        assert_eq!(
            read_orientation(&BytesImageSource::new(jpeg)),
            Orientation::Normal
        );
    }

    #[test]
    fn garbage_is_normal() {
        assert_eq!(
            read_orientation(&BytesImageSource::new(vec![0xFFu8; 32])),
            Orientation::Normal
        );
    }

    #[test]
    fn apply_swaps_dimensions_for_quarter_turns() {
        let image = DynamicImage::ImageRgb8(solid_rgb(40, 20, [0, 0, 0]));
        let rotated = Orientation::Rotate90.apply(image.clone());
        assert_eq!((rotated.width(), rotated.height()), (20, 40));
        let flipped = Orientation::Rotate180.apply(image);
        assert_eq!((flipped.width(), flipped.height()), (40, 20));
    }
}
