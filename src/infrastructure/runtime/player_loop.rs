//! Player Loop - 单一逻辑线程
//!
//! 独占 PlaybackController，依次处理用户命令、朗读引擎事件与上传完成消息。
//! 上传在独立任务中执行，结果作为消息回到循环；镜像写入由控制器 fire-and-forget

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::{
    ApplicationError, NarrationEvent, PlaybackController, PlayerCommand, UploadDocument,
    UploadDocumentHandler, UploadedDocument,
};
use crate::infrastructure::events::EventPublisher;

type UploadOutcome = Result<UploadedDocument, ApplicationError>;

/// 命令队列容量
const COMMAND_QUEUE_CAPACITY: usize = 64;

/// 播放循环
pub struct PlayerLoop {
    controller: PlaybackController,
    commands: mpsc::Receiver<PlayerCommand>,
    narration_events: mpsc::UnboundedReceiver<NarrationEvent>,
    uploads: Arc<UploadDocumentHandler>,
    upload_tx: mpsc::UnboundedSender<UploadOutcome>,
    upload_rx: mpsc::UnboundedReceiver<UploadOutcome>,
    event_publisher: Arc<EventPublisher>,
}

impl PlayerLoop {
    /// 创建播放循环，返回命令发送端
    pub fn new(
        controller: PlaybackController,
        narration_events: mpsc::UnboundedReceiver<NarrationEvent>,
        uploads: Arc<UploadDocumentHandler>,
        event_publisher: Arc<EventPublisher>,
    ) -> (Self, mpsc::Sender<PlayerCommand>) {
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (upload_tx, upload_rx) = mpsc::unbounded_channel();
        let player = Self {
            controller,
            commands,
            narration_events,
            uploads,
            upload_tx,
            upload_rx,
            event_publisher,
        };
        (player, command_tx)
    }

    /// 运行直到收到 Shutdown 或所有命令发送端被丢弃
    pub async fn run(mut self) {
        tracing::info!("PlayerLoop started");

        if self.controller.rehydrate().await {
            tracing::info!(
                session_id = ?self.controller.snapshot().session_id,
                position = self.controller.state().position(),
                "Session restored"
            );
        }
        self.controller.refresh_voices().await;
        self.publish_state();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(event) = self.narration_events.recv() => self.handle_narration(event),
                Some(outcome) = self.upload_rx.recv() => self.handle_upload(outcome).await,
            }
        }

        self.controller.shutdown().await;
        self.publish_state();
        self.event_publisher.publish_shutdown();
        tracing::info!("PlayerLoop stopped");
    }

    async fn handle_command(&mut self, command: PlayerCommand) {
        let name = command.name();
        tracing::debug!(command = name, "Handling command");

        let result = match command {
            PlayerCommand::Upload(upload) => {
                self.spawn_upload(upload);
                return;
            }
            PlayerCommand::Play => self.controller.play().await,
            PlayerCommand::Pause => self.controller.pause().await,
            PlayerCommand::Resume => self.controller.resume().await,
            PlayerCommand::Stop => {
                self.controller.stop().await;
                Ok(())
            }
            PlayerCommand::Seek(position) => self.controller.seek(position).await.map(|_| ()),
            PlayerCommand::ChangeRate(rate) => self.controller.change_rate(rate).await,
            PlayerCommand::ChangePitch(pitch) => self.controller.change_pitch(pitch).await,
            PlayerCommand::ChangeVoice(voice) => self.controller.change_voice(&voice),
            PlayerCommand::ListVoices => {
                self.event_publisher
                    .publish_voices(self.controller.voices().voices());
                return;
            }
            PlayerCommand::Status => {
                if let Some(document) = self.controller.state().document() {
                    self.event_publisher
                        .publish_preview(document.preview(self.controller.state().position()));
                }
                Ok(())
            }
            PlayerCommand::Shutdown => return,
        };

        if let Err(e) = result {
            tracing::warn!(command = name, error = %e, "Command failed");
            self.event_publisher.publish_error(e.to_string());
        }
        self.publish_state();
    }

    fn handle_narration(&mut self, event: NarrationEvent) {
        let voices_changed = matches!(event, NarrationEvent::VoicesChanged(_));
        match self.controller.handle_event(event) {
            Ok(true) => {
                if voices_changed {
                    self.event_publisher
                        .publish_voices(self.controller.voices().voices());
                }
                self.publish_state();
            }
            Ok(false) => {}
            Err(e) => {
                self.event_publisher.publish_error(e.to_string());
                self.publish_state();
            }
        }
    }

    fn spawn_upload(&self, upload: UploadDocument) {
        let handler = self.uploads.clone();
        let upload_tx = self.upload_tx.clone();
        tracing::debug!(file_name = %upload.file.file_name, "Upload started");

        tokio::spawn(async move {
            let outcome = handler.handle(upload).await;
            if upload_tx.send(outcome).is_err() {
                tracing::debug!("PlayerLoop gone, dropping upload result");
            }
        });
    }

    async fn handle_upload(&mut self, outcome: UploadOutcome) {
        match outcome {
            Ok(uploaded) => self.controller.load_uploaded(uploaded).await,
            Err(e) => {
                tracing::warn!(error = %e, "Upload failed");
                self.controller.report_error(&e);
                self.event_publisher.publish_error(e.to_string());
            }
        }
        self.publish_state();
    }

    fn publish_state(&self) {
        self.event_publisher.publish_state(self.controller.snapshot());
    }
}
