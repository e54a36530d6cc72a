//! 이미지 소스 추상화.
//!
//! 파이프라인은 소스를 세 번 연다 (크기 탐지, 디코딩, EXIF).

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docmat_core::error::CoreError;

/// 버퍼링된 탐색 가능 스트림
pub trait ReadSeek: BufRead + Seek + Send {}

impl<T: BufRead + Seek + Send> ReadSeek for T {}

/// 여러 번 열 수 있는 이미지 소스
pub trait ImageSource: Send + Sync {
    /// 새 스트림을 연다 (호출마다 처음부터)
    fn open(&self) -> Result<Box<dyn ReadSeek>, CoreError>;

    /// 로그용 설명
    fn describe(&self) -> String;
}

/// 로컬 파일 소스
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImageSource {
    fn open(&self) -> Result<Box<dyn ReadSeek>, CoreError> {
        let file = File::open(&self.path).map_err(|e| {
            CoreError::ImageDecode(format!("이미지 열기 실패: {}: {}", self.path.display(), e))
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// 메모리 바이트 소스
#[derive(Debug, Clone)]
pub struct BytesImageSource {
    bytes: Arc<[u8]>,
}

impl BytesImageSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl ImageSource for BytesImageSource {
    fn open(&self) -> Result<Box<dyn ReadSeek>, CoreError> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.bytes))))
    }

    fn describe(&self) -> String {
        format!("<memory {} bytes>", self.bytes.len())
    }
}
