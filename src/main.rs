//! PDF Aloud - 终端朗读器
//!
//! 从标准输入读取命令，驱动 PlayerLoop，并打印播放器事件

use std::sync::Arc;

use pdf_aloud::application::{
    PdfUpload, PlaybackConfig, PlaybackController, PlayerCommand, SessionMirror, UploadDocument,
    UploadDocumentHandler,
};
use pdf_aloud::config::{load_config, print_config, LogConfig};
use pdf_aloud::infrastructure::console::{parse_line, render, ConsoleInput, HELP};
use pdf_aloud::infrastructure::{
    EventPublisher, HttpSessionStore, HttpSessionStoreConfig, PacedEngineConfig,
    PacedNarrationEngine, PlayerEvent, PlayerLoop, SledIdentifierStore, SledStoreConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},pdf_aloud={}", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    // 日志写到 stderr，stdout 留给播放器输出
    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);
    tracing::info!("PDF Aloud - 朗读播放器");
    print_config(&config);

    if let Some(parent) = std::path::Path::new(&config.storage.state_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 远端会话服务
    let store_config = HttpSessionStoreConfig::new(&config.session_store.url)
        .with_timeout(config.session_store.timeout_secs);
    let session_store = Arc::new(HttpSessionStore::new(store_config)?);

    // 本地会话标识
    let identifiers = Arc::new(SledIdentifierStore::new(&SledStoreConfig {
        db_path: config.storage.state_path.clone(),
    })?);

    // 朗读引擎：音色目录在启动后异步到达
    let (engine, narration_events) = PacedNarrationEngine::new(PacedEngineConfig {
        words_per_minute: config.narration.words_per_minute,
        voices: Vec::new(),
    });
    let engine = Arc::new(engine);

    let mirror = SessionMirror::new(session_store.clone(), identifiers);
    let controller = PlaybackController::new(
        engine.clone(),
        mirror,
        PlaybackConfig {
            preserve_position_on_settings_change: config
                .playback
                .preserve_position_on_settings_change,
        },
    );
    let uploads = Arc::new(UploadDocumentHandler::new(
        session_store,
        config.upload.max_size_bytes,
    ));
    let event_publisher = EventPublisher::default().arc();

    let printer = tokio::spawn(print_events(event_publisher.subscribe()));

    let (player, commands) =
        PlayerLoop::new(controller, narration_events, uploads, event_publisher);
    let player = tokio::spawn(player.run());

    let voices = config.narration.voice_catalog();
    let voice_engine = engine.clone();
    tokio::spawn(async move { voice_engine.load_voices(voices).await });

    println!("{}", HELP);
    read_commands(&commands).await;

    let _ = commands.send(PlayerCommand::Shutdown).await;
    player.await?;
    printer.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// 读取终端输入直到 quit、EOF 或 Ctrl-C
async fn read_commands(commands: &mpsc::Sender<PlayerCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                return;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                return;
            }
        };

        let command = match parse_line(&line) {
            Ok(ConsoleInput::Command(command)) => command,
            Ok(ConsoleInput::Upload(path)) => match tokio::fs::read(&path).await {
                Ok(bytes) => PlayerCommand::Upload(UploadDocument {
                    file: PdfUpload::from_file_name(path.display().to_string(), bytes),
                }),
                Err(e) => {
                    println!("error: cannot read {}: {}", path.display(), e);
                    continue;
                }
            },
            Ok(ConsoleInput::Help) => {
                println!("{}", HELP);
                continue;
            }
            Ok(ConsoleInput::Quit) => return,
            Ok(ConsoleInput::Empty) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if commands.send(command).await.is_err() {
            tracing::warn!("PlayerLoop stopped, no longer accepting commands");
            return;
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<PlayerEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                println!("{}", render(&event));
                if event == PlayerEvent::Shutdown {
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped = skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
