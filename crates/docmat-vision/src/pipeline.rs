//! 업로드용 이미지 준비 파이프라인.
//!
//! 크기 탐지 → 다운샘플 디코딩 → EXIF 회전 → 알파 평탄화 → 적응형 압축 → 임시 파일.
//! 디코딩 불가만 에러로 전파하고 나머지 실패는 내부에서 기본값으로 처리한다.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use docmat_core::config::ImagePrepConfig;
use docmat_core::error::CoreError;
use image::ImageReader;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::encoder::{self, FinishReason};
use crate::flatten;
use crate::orientation::{self, Orientation};
use crate::probe::{self, BoundsProbe};
use crate::resize;
use crate::source::ImageSource;

/// 준비된 업로드 파일 (호출자 소유, 사용 후 [`PreparedImage::remove`])
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// 생성된 JPEG 파일 경로
    pub path: PathBuf,
    /// 파일 크기 (바이트)
    pub size_bytes: usize,
    pub width: u32,
    pub height: u32,
    /// 최종 JPEG 품질
    pub quality: u8,
    /// 압축 중 해상도 축소 여부
    pub scaled_once: bool,
    /// 압축 종료 사유
    pub reason: FinishReason,
    /// 크기 탐지 결과
    pub probe: BoundsProbe,
    /// 적용된 회전
    pub orientation: Orientation,
    /// 디코딩 다운샘플 배율
    pub sample_size: u32,
}

impl PreparedImage {
    /// 예산 이하 여부
    pub fn within_budget(&self) -> bool {
        self.reason == FinishReason::WithinBudget
    }

    /// 임시 파일 삭제
    pub fn remove(&self) -> Result<(), CoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Io(e)),
        }
    }
}

/// 이미지 준비기
#[derive(Debug, Clone, Default)]
pub struct ImagePreparer {
    policy: ImagePrepConfig,
}

impl ImagePreparer {
    /// 정책 검증 후 생성
    pub fn new(policy: ImagePrepConfig) -> Result<Self, CoreError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ImagePrepConfig {
        &self.policy
    }

    /// 같은 정책에 예산만 바꾼 준비기
    pub fn with_budget(&self, max_upload_bytes: usize) -> Result<Self, CoreError> {
        Self::new(ImagePrepConfig {
            max_upload_bytes,
            ..self.policy.clone()
        })
    }

    /// `dest_dir`에 새 임시 JPEG 파일 생성
    pub fn prepare(
        &self,
        source: &dyn ImageSource,
        dest_dir: &Path,
    ) -> Result<PreparedImage, CoreError> {
        fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(format!(
            "upload_{}_{}.jpg",
            epoch_millis(),
            Uuid::new_v4().simple()
        ));
        self.prepare_to(source, &path)
    }

    /// 지정 경로에 JPEG 파일 생성
    pub fn prepare_to(
        &self,
        source: &dyn ImageSource,
        dest_path: &Path,
    ) -> Result<PreparedImage, CoreError> {
        let policy = &self.policy;

        // 1) 크기 탐지 → 다운샘플 배율
        let probe = probe::probe_bounds(source, policy.fallback_probe_dimension);
        let (src_w, src_h) = probe.dimensions();
        let sample_size = probe::in_sample_size(src_w, src_h, policy.max_dimension);

        // 2) 디코딩 + 배율 적용 (전체 버퍼는 즉시 해제)
        let decoded = ImageReader::new(source.open()?)
            .with_guessed_format()
            .map_err(|e| CoreError::ImageDecode(format!("포맷 판별 실패: {e}")))?
            .decode()
            .map_err(|e| CoreError::ImageDecode(format!("{}: {}", source.describe(), e)))?;

        let working = if sample_size > 1 {
            let (w, h) =
                probe::sampled_dimensions(decoded.width(), decoded.height(), sample_size);
            resize::resize_dynamic(decoded, w, h)?
        } else {
            decoded
        };
        debug!(
            "디코딩: {}x{} (배율 1/{}, 탐지 {:?})",
            working.width(),
            working.height(),
            sample_size,
            probe
        );

        // 3) EXIF 회전
        let orientation = orientation::read_orientation(source);
        let rotated = orientation.apply(working);

        // 4) 알파 평탄화
        let opaque = flatten::flatten_onto_white(rotated);

        // 5) 적응형 압축
        let compressed = encoder::compress_to_budget(opaque, policy)?;
        fs::write(dest_path, &compressed.bytes)?;

        info!(
            "이미지 준비 완료: {} → {} ({}x{}, 품질 {}, {} bytes, {:?})",
            source.describe(),
            dest_path.display(),
            compressed.width,
            compressed.height,
            compressed.quality,
            compressed.bytes.len(),
            compressed.reason
        );

        Ok(PreparedImage {
            path: dest_path.to_path_buf(),
            size_bytes: compressed.bytes.len(),
            width: compressed.width,
            height: compressed.height,
            quality: compressed.quality,
            scaled_once: compressed.scaled_once,
            reason: compressed.reason,
            probe,
            orientation,
            sample_size,
        })
    }

    /// 블로킹 스레드에서 실행 (async 호출자용)
    ///
    /// 호출자 future가 결과를 받기 전에 drop되면 생성된 파일은 삭제된다.
    pub async fn prepare_blocking(
        &self,
        source: Arc<dyn ImageSource>,
        dest_dir: PathBuf,
    ) -> Result<PreparedImage, CoreError> {
        let preparer = self.clone();
        let handoff = Arc::new(Mutex::new(Handoff::default()));
        let mut guard = HandoffGuard {
            handoff: Arc::clone(&handoff),
            armed: true,
        };

        let result = tokio::task::spawn_blocking(move || {
            let prepared = preparer.prepare(source.as_ref(), &dest_dir)?;
            let mut state = lock(&handoff);
            if state.cancelled {
                discard(&prepared.path);
                return Err(CoreError::Internal("이미지 준비 취소됨".to_string()));
            }
            state.pending = Some(prepared.path.clone());
            Ok(prepared)
        })
        .await;

        guard.armed = false;
        result.map_err(|e| CoreError::Internal(format!("이미지 준비 작업 실패: {e}")))?
    }
}

/// 블로킹 작업과 호출자 사이의 결과 파일 인계 상태
#[derive(Debug, Default)]
struct Handoff {
    /// 호출자가 결과를 기다리지 않음
    cancelled: bool,
    /// 작성됐지만 아직 호출자에게 넘어가지 않은 파일
    pending: Option<PathBuf>,
}

/// 호출자 future와 함께 drop되어 인계되지 않은 파일을 정리
struct HandoffGuard {
    handoff: Arc<Mutex<Handoff>>,
    armed: bool,
}

impl Drop for HandoffGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(&self.handoff);
        state.cancelled = true;
        if let Some(path) = state.pending.take() {
            discard(&path);
        }
    }
}

fn lock(handoff: &Mutex<Handoff>) -> MutexGuard<'_, Handoff> {
    handoff.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("취소된 준비 결과 삭제: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("취소된 준비 결과 삭제 실패 {}: {e}", path.display()),
    }
}

fn epoch_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{BytesImageSource, FileImageSource};
    use crate::test_support::{
        encode_jpeg_rgb, encode_png_rgba, noise_rgb, solid_rgba, with_exif_orientation,
    };
    use image::{Rgb, RgbImage, Rgba};
    use tempfile::TempDir;

    fn decode(path: &Path) -> RgbImage {
        image::open(path).unwrap().into_rgb8()
    }

    #[test]
    fn prepares_jpeg_within_budget() {
        let dir = TempDir::new().unwrap();
        let jpeg = encode_jpeg_rgb(&noise_rgb(300, 200, 1));

        let prepared = ImagePreparer::default()
            .prepare(&BytesImageSource::new(jpeg), dir.path())
            .unwrap();

        assert!(prepared.path.exists());
        assert!(prepared.within_budget());
        assert_eq!(prepared.sample_size, 1);
        assert_eq!((prepared.width, prepared.height), (300, 200));
        let written = fs::metadata(&prepared.path).unwrap().len() as usize;
        assert_eq!(written, prepared.size_bytes);
        assert!(written <= 2 * 1024 * 1024);
    }

    #[test]
    fn transparent_pixels_render_white() {
        let dir = TempDir::new().unwrap();
        let mut rgba = solid_rgba(64, 64, [0, 0, 0, 0]);
        for y in 0..64 {
            for x in 0..32 {
                rgba.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let png = encode_png_rgba(&rgba);

        let prepared = ImagePreparer::default()
            .prepare(&BytesImageSource::new(png), dir.path())
            .unwrap();
        let out = decode(&prepared.path);

        let right = out.get_pixel(56, 32);
        assert!(right.0.iter().all(|c| *c > 240), "투명 영역: {:?}", right);
        let left = out.get_pixel(8, 32);
        assert!(left[2] > 200 && left[0] < 60, "불투명 영역: {:?}", left);
    }

    /// 왼쪽 절반 빨강, 오른쪽 절반 파랑인 80x40 JPEG (EXIF 회전 태그 포함)
    fn halves_with_orientation(orientation: u16) -> BytesImageSource {
        let src = RgbImage::from_fn(80, 40, |x, _| {
            if x < 40 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        BytesImageSource::new(with_exif_orientation(&encode_jpeg_rgb(&src), orientation))
    }

    fn assert_red(px: &Rgb<u8>) {
        assert!(px[0] > 200 && px[2] < 60, "빨강이어야 함: {:?}", px);
    }

    fn assert_blue(px: &Rgb<u8>) {
        assert!(px[2] > 200 && px[0] < 60, "파랑이어야 함: {:?}", px);
    }

    #[test]
    fn exif_rotation_applied_once() {
        let dir = TempDir::new().unwrap();
        let prepared = ImagePreparer::default()
            .prepare(&halves_with_orientation(6), dir.path())
            .unwrap();
        assert_eq!(prepared.orientation, Orientation::Rotate90);
        assert_eq!((prepared.width, prepared.height), (40, 80));

        // 시계 방향 90° → 왼쪽 열이 위쪽 행으로
        let out = decode(&prepared.path);
        assert_red(out.get_pixel(20, 10));
        assert_blue(out.get_pixel(20, 70));
    }

    #[test]
    fn exif_rotate_180_swaps_halves() {
        let dir = TempDir::new().unwrap();
        let prepared = ImagePreparer::default()
            .prepare(&halves_with_orientation(3), dir.path())
            .unwrap();
        assert_eq!(prepared.orientation, Orientation::Rotate180);
        assert_eq!((prepared.width, prepared.height), (80, 40));

        let out = decode(&prepared.path);
        assert_blue(out.get_pixel(10, 20));
        assert_red(out.get_pixel(70, 20));
    }

    #[test]
    fn exif_rotate_270_moves_left_half_to_bottom() {
        let dir = TempDir::new().unwrap();
        let prepared = ImagePreparer::default()
            .prepare(&halves_with_orientation(8), dir.path())
            .unwrap();
        assert_eq!(prepared.orientation, Orientation::Rotate270);
        assert_eq!((prepared.width, prepared.height), (40, 80));

        // 시계 방향 270° → 왼쪽 열이 아래쪽 행으로
        let out = decode(&prepared.path);
        assert_blue(out.get_pixel(20, 10));
        assert_red(out.get_pixel(20, 70));
    }

    #[test]
    fn large_rotated_photo_downsampled_without_rescale() {
        let dir = TempDir::new().unwrap();
        let policy = ImagePrepConfig {
            max_dimension: 100,
            min_dimension: 16,
            ..ImagePrepConfig::default()
        };
        let jpeg = with_exif_orientation(&encode_jpeg_rgb(&noise_rgb(400, 300, 8)), 6);

        let prepared = ImagePreparer::new(policy)
            .unwrap()
            .prepare(&BytesImageSource::new(jpeg), dir.path())
            .unwrap();

        assert_eq!(prepared.sample_size, 4);
        assert_eq!((prepared.width, prepared.height), (75, 100));
        assert!(!prepared.scaled_once);
        assert!(prepared.within_budget());
    }

    #[test]
    fn undecodable_source_is_error() {
        let dir = TempDir::new().unwrap();
        let err = ImagePreparer::default()
            .prepare(&BytesImageSource::new(vec![0u8; 128]), dir.path())
            .unwrap_err();
        assert!(matches!(err, CoreError::ImageDecode(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = ImagePreparer::default()
            .prepare(&FileImageSource::new(dir.path().join("none.jpg")), dir.path());
        assert!(matches!(result, Err(CoreError::ImageDecode(_))));
    }

    #[test]
    fn tight_budget_degrades_gracefully() {
        let dir = TempDir::new().unwrap();
        let policy = ImagePrepConfig {
            max_upload_bytes: 1,
            min_dimension: 100,
            ..ImagePrepConfig::default()
        };
        let jpeg = encode_jpeg_rgb(&noise_rgb(200, 200, 4));

        let prepared = ImagePreparer::new(policy)
            .unwrap()
            .prepare(&BytesImageSource::new(jpeg), dir.path())
            .unwrap();

        assert!(!prepared.within_budget());
        assert!(prepared.scaled_once);
        assert_eq!(prepared.quality, 50);
        assert_eq!((prepared.width, prepared.height), (170, 170));
    }

    #[test]
    fn remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let jpeg = encode_jpeg_rgb(&noise_rgb(16, 16, 1));
        let prepared = ImagePreparer::default()
            .prepare(&BytesImageSource::new(jpeg), dir.path())
            .unwrap();

        prepared.remove().unwrap();
        assert!(!prepared.path.exists());
        // 두 번째 삭제도 성공
        prepared.remove().unwrap();
    }

    #[test]
    fn invalid_policy_rejected() {
        let policy = ImagePrepConfig {
            quality_step: 0,
            ..ImagePrepConfig::default()
        };
        assert!(ImagePreparer::new(policy).is_err());
    }

    #[tokio::test]
    async fn prepare_on_blocking_thread() {
        let dir = TempDir::new().unwrap();
        let source: Arc<dyn ImageSource> =
            Arc::new(BytesImageSource::new(encode_jpeg_rgb(&noise_rgb(48, 48, 2))));

        let prepared = ImagePreparer::default()
            .prepare_blocking(source, dir.path().to_path_buf())
            .await
            .unwrap();
        assert!(prepared.path.exists());
    }

    /// 첫 `open` 호출이 신호를 받을 때까지 막히는 소스
    struct GatedSource {
        inner: BytesImageSource,
        gate: std::sync::Mutex<Option<std::sync::mpsc::Receiver<()>>>,
    }

    impl ImageSource for GatedSource {
        fn open(&self) -> Result<Box<dyn crate::source::ReadSeek>, CoreError> {
            if let Some(rx) = self.gate.lock().unwrap().take() {
                let _ = rx.recv();
            }
            self.inner.open()
        }

        fn describe(&self) -> String {
            "<gated>".to_string()
        }
    }

    #[test]
    fn cancelled_prepare_leaves_no_file() {
        // 블로킹 스레드 1개: 뒤에 넣은 작업은 준비 작업이 끝난 뒤에 실행된다
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .max_blocking_threads(1)
            .build()
            .unwrap();
        let dir = TempDir::new().unwrap();
        let (release, gate) = std::sync::mpsc::channel();
        let source: Arc<dyn ImageSource> = Arc::new(GatedSource {
            inner: BytesImageSource::new(encode_jpeg_rgb(&noise_rgb(64, 64, 3))),
            gate: std::sync::Mutex::new(Some(gate)),
        });

        runtime.block_on(async {
            let preparer = ImagePreparer::default();
            let preparing = preparer.prepare_blocking(source, dir.path().to_path_buf());
            let timed_out =
                tokio::time::timeout(std::time::Duration::from_millis(20), preparing).await;
            assert!(timed_out.is_err());

            release.send(()).unwrap();
            tokio::task::spawn_blocking(|| ()).await.unwrap();
        });

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn dropped_guard_removes_unclaimed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload_pending.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let handoff = Arc::new(Mutex::new(Handoff {
            cancelled: false,
            pending: Some(path.clone()),
        }));
        drop(HandoffGuard {
            handoff: Arc::clone(&handoff),
            armed: true,
        });

        assert!(!path.exists());
        assert!(lock(&handoff).cancelled);
    }

    #[test]
    fn disarmed_guard_keeps_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload_done.jpg");
        fs::write(&path, b"jpeg").unwrap();

        drop(HandoffGuard {
            handoff: Arc::new(Mutex::new(Handoff {
                cancelled: false,
                pending: Some(path.clone()),
            })),
            armed: false,
        });
        assert!(path.exists());
    }
}
