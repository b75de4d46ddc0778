//! Console - 终端命令解析与事件渲染

use std::path::PathBuf;

use crate::application::PlayerCommand;
use crate::infrastructure::events::PlayerEvent;

pub const HELP: &str = "commands: upload <path> | play | pause | resume | stop | seek <n> | \
rate <x> | pitch <x> | voice <name> | voices | status | help | quit";

/// 一行终端输入
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    /// 需要先读取文件再上传
    Upload(PathBuf),
    Command(PlayerCommand),
    Help,
    Quit,
    Empty,
}

/// 解析一行输入
pub fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleInput::Empty);
    }

    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "upload" => {
            if arg.is_empty() {
                return Err("usage: upload <path>".to_string());
            }
            return Ok(ConsoleInput::Upload(PathBuf::from(arg)));
        }
        "play" => PlayerCommand::Play,
        "pause" => PlayerCommand::Pause,
        "resume" => PlayerCommand::Resume,
        "stop" => PlayerCommand::Stop,
        "seek" => PlayerCommand::Seek(parse_arg(arg, "seek <position>")?),
        "rate" => PlayerCommand::ChangeRate(parse_arg(arg, "rate <0.5-2.0>")?),
        "pitch" => PlayerCommand::ChangePitch(parse_arg(arg, "pitch <0.5-2.0>")?),
        "voice" => {
            if arg.is_empty() {
                return Err("usage: voice <name>".to_string());
            }
            PlayerCommand::ChangeVoice(arg.to_string())
        }
        "voices" => PlayerCommand::ListVoices,
        "status" => PlayerCommand::Status,
        "help" | "?" => return Ok(ConsoleInput::Help),
        "quit" | "exit" => return Ok(ConsoleInput::Quit),
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(ConsoleInput::Command(command))
}

fn parse_arg<T: std::str::FromStr>(arg: &str, usage: &str) -> Result<T, String> {
    arg.parse().map_err(|_| format!("usage: {}", usage))
}

/// 渲染事件为一行文本
pub fn render(event: &PlayerEvent) -> String {
    match event {
        PlayerEvent::StateChanged(s) => {
            let mut line = format!(
                "[{}] {}/{} ({:.0}%) rate={:.2} pitch={:.2}",
                s.status.as_str(),
                s.position,
                s.length,
                s.progress_percent,
                s.rate,
                s.pitch
            );
            if let Some(voice) = &s.voice {
                line.push_str(&format!(" voice={}", voice));
            }
            if let Some(error) = &s.last_error {
                line.push_str(&format!(" error={}", error));
            }
            line
        }
        PlayerEvent::Error { message } => format!("error: {}", message),
        PlayerEvent::Voices { voices } => {
            let names: Vec<String> = voices
                .iter()
                .map(|v| {
                    let marker = if v.is_default() { "*" } else { "" };
                    format!("{}{} ({})", v.name(), marker, v.lang())
                })
                .collect();
            format!("voices: {}", names.join(", "))
        }
        PlayerEvent::Preview {
            before,
            current,
            after,
        } => format!(
            "…{}[{}]{}…",
            tail_chars(before, 30),
            current,
            head_chars(after, 30)
        ),
        PlayerEvent::Shutdown => "bye".to_string(),
    }
}

fn tail_chars(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    if count <= n {
        return text;
    }
    let start = text
        .char_indices()
        .nth(count - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &text[start..]
}

fn head_chars(text: &str, n: usize) -> &str {
    let end = text
        .char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}
