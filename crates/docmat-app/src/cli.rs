//! 명령줄 인자 정의.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Docmat 토마토 잎 질병 진단 클라이언트
#[derive(Parser, Debug)]
#[command(name = "docmat")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 예측/뉴스 서버 URL (설정 파일 값 덮어쓰기)
    #[arg(long, short = 's', global = true)]
    pub server: Option<String>,

    /// 데이터 저장 경로 (히스토리 DB, 이미지 객체, 세션 파일)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 이미지 분석: 준비 → 예측 → 히스토리 저장
    Analyze {
        /// 잎 사진 경로
        image: PathBuf,
        /// 업로드용 임시 JPEG를 지우지 않음
        #[arg(long)]
        keep_temp: bool,
    },
    /// 업로드용 이미지 준비만 실행
    Prepare {
        /// 원본 이미지 경로
        image: PathBuf,
        /// 출력 경로 (기본: 캐시 디렉토리의 새 파일)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// 바이트 예산 (설정값 덮어쓰기)
        #[arg(long)]
        max_bytes: Option<usize>,
    },
    /// 분석 히스토리
    #[command(subcommand)]
    History(HistoryCommand),
    /// 농업 뉴스/팁
    #[command(subcommand)]
    News(NewsCommand),
    /// 이메일/비밀번호 로그인
    Login(Credentials),
    /// 신규 계정 가입
    Register(Credentials),
    /// 로그아웃 (세션 파일 삭제)
    Logout,
}

#[derive(ClapArgs, Debug)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// 최신순 목록
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// 단건 상세
    Show { id: String },
    /// 삭제
    Delete { id: String },
    /// 질병 이름/증상 검색
    Search { query: String },
    /// 개수
    Count,
}

#[derive(Subcommand, Debug)]
pub enum NewsCommand {
    /// 뉴스 목록
    List {
        /// 캐시 무시
        #[arg(long)]
        refresh: bool,
    },
    /// 뉴스 상세
    Show { id: i64 },
    /// 키워드 검색
    Search { keyword: String },
    /// 관련 뉴스
    Related { id: i64 },
}
