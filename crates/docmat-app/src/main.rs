//! # docmat-app
//!
//! Docmat 클라이언트 바이너리 진입점.
//! 설정 로드, DI 와이어링, 명령 디스패치.

mod analyze;
mod cli;
mod context;
mod output;
mod session;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use docmat_core::config::AppConfig;
use docmat_core::config_manager::ConfigManager;
use docmat_core::error::CoreError;
use docmat_core::ports::news::NewsService;
use docmat_network::error_mapping::user_message;
use docmat_vision::source::FileImageSource;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command, Credentials, HistoryCommand, NewsCommand};
use crate::context::{resolve_data_dir, AppContext};

/// 로그 필터 대상 크레이트
const LOG_TARGETS: [&str; 5] = [
    "docmat",
    "docmat_core",
    "docmat_vision",
    "docmat_network",
    "docmat_storage",
];

fn init_tracing(level: &str) {
    let log_filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// 설정 로드 (파일 → CLI 오버라이드)
fn load_config(args: &Args) -> Result<AppConfig> {
    let manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let mut config = match manager {
        Ok(manager) => manager.get(),
        Err(e) => {
            warn!("설정 파일 사용 불가, 기본값 사용: {e}");
            AppConfig::default_config()
        }
    };

    if let Some(server_url) = &args.server {
        config.server.base_url = server_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = load_config(&args)?;
    let data_dir = resolve_data_dir(args.data_dir.as_deref(), &config);
    info!("Docmat 시작: 데이터={}", data_dir.display());

    let ctx = AppContext::build(config, data_dir).await?;
    let result = run(&ctx, args.command).await;

    if let Err(e) = ctx.persist_session().await {
        warn!("세션 저장 실패: {e}");
    }

    result.map_err(|e| match e.downcast_ref::<CoreError>() {
        Some(core) => {
            error!("{core}");
            anyhow!(user_message(core))
        }
        None => e,
    })
}

async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Analyze { image, keep_temp } => {
            let outcome = ctx.analyzer.analyze(&image, keep_temp).await?;
            print!("{}", output::prediction(&outcome.prediction));
            match &outcome.history {
                Ok(saved) => println!(
                    "\n✅ Tersimpan di riwayat: {} ({})",
                    saved.id(),
                    saved.strategy.name()
                ),
                Err(e) => println!("\n⚠️  Gagal menyimpan riwayat: {}", user_message(e)),
            }
            if keep_temp {
                println!("   file unggahan: {}", outcome.prepared.path.display());
            } else if !outcome.temp_removed {
                warn!("임시 파일이 남아 있음: {}", outcome.prepared.path.display());
            }
        }

        Command::Prepare {
            image,
            out,
            max_bytes,
        } => {
            let preparer = match max_bytes {
                Some(budget) => ctx.analyzer.preparer().with_budget(budget)?,
                None => ctx.analyzer.preparer().clone(),
            };
            let source = FileImageSource::new(&image);
            let temp_dir = ctx.analyzer.temp_dir().to_path_buf();
            let prepared = tokio::task::spawn_blocking(move || match out {
                Some(path) => preparer.prepare_to(&source, &path),
                None => preparer.prepare(&source, &temp_dir),
            })
            .await
            .context("이미지 준비 작업 실패")??;
            println!("{}", output::prepared(&prepared));
        }

        Command::History(sub) => run_history(ctx, sub).await?,
        Command::News(sub) => run_news(ctx, sub).await?,

        Command::Login(Credentials { email, password }) => {
            let session = ctx.tokens.sign_in(&email, &password).await?;
            ctx.sessions.save(&session)?;
            println!("✅ Masuk sebagai {}", session.email.unwrap_or(session.user_id));
        }
        Command::Register(Credentials { email, password }) => {
            let session = ctx.tokens.sign_up(&email, &password).await?;
            ctx.sessions.save(&session)?;
            println!("✅ Akun dibuat: {}", session.email.unwrap_or(session.user_id));
        }
        Command::Logout => {
            ctx.tokens.sign_out().await;
            ctx.sessions.clear()?;
            info!("세션 파일 삭제: {}", ctx.sessions.path().display());
            println!("Keluar.");
        }
    }
    Ok(())
}

async fn run_history(ctx: &AppContext, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List { limit } => {
            let entries = ctx.history.list(limit).await?;
            if entries.is_empty() {
                println!("Belum ada riwayat.");
            }
            for entry in &entries {
                println!("{}", output::history_line(entry));
            }
        }
        HistoryCommand::Show { id } => {
            let entry = ctx.history.get(&id).await?;
            print!("{}", output::history_detail(&entry));
        }
        HistoryCommand::Delete { id } => {
            ctx.history.delete(&id).await?;
            println!("Dihapus: {id}");
        }
        HistoryCommand::Search { query } => {
            for entry in ctx.history.search(&query).await? {
                println!("{}", output::history_line(&entry));
            }
        }
        HistoryCommand::Count => {
            println!("{}", ctx.history.count().await?);
        }
    }
    Ok(())
}

async fn run_news(ctx: &AppContext, command: NewsCommand) -> Result<()> {
    match command {
        NewsCommand::List { refresh } => {
            let items = if refresh {
                ctx.news.refresh().await?
            } else {
                ctx.news.list().await?
            };
            for item in &items {
                println!("{}", output::news_line(item));
            }
        }
        NewsCommand::Show { id } => {
            let article = ctx.news.detail(id).await?;
            print!("{}", output::news_detail(&article));
        }
        NewsCommand::Search { keyword } => {
            for item in ctx.news.search(&keyword).await? {
                println!("{}", output::news_line(&item));
            }
        }
        NewsCommand::Related { id } => {
            for item in ctx.news.related(id).await? {
                println!("{}", output::news_line(&item));
            }
        }
    }
    Ok(())
}
