//! # Speech 模块
//!
//! 语音合成：把章节正文朗读出来。
//!
//! ## 核心约束
//!
//! - 任意时刻**至多一条**朗读在进行；开始新朗读前必须取消旧的
//! - 取消是幂等的，随时可以调用
//!
//! 合成后端抽象为 [`SpeechSynthesizer`] trait：默认实现
//! [`ProcessSpeech`] 把朗读委托给外部 TTS 进程（espeak 等），
//! 子进程天然是一个可取消的异步资源，kill 即取消。
//! [`NullSpeech`] 用于禁用 TTS 的场合和测试。

use std::process::{Child, Command, Stdio};

use crate::media::MediaError;

/// 朗读参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechOptions {
    /// 语速倍率（1.0 为正常语速）
    pub rate: f32,
    /// 音调倍率（1.0 为正常音调）
    pub pitch: f32,
    /// 音量倍率（1.0 为正常音量）
    pub volume: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// 语音合成后端
pub trait SpeechSynthesizer {
    /// 开始朗读
    ///
    /// 实现必须先取消任何进行中的朗读，再开始新的。
    fn speak(&mut self, text: &str, options: &SpeechOptions) -> Result<(), MediaError>;

    /// 取消朗读（幂等）
    fn cancel(&mut self);

    /// 是否正在朗读
    fn is_speaking(&mut self) -> bool;
}

/// espeak 的默认语速（每分钟词数）
const ESPEAK_BASE_RATE: f32 = 175.0;

/// 子进程 TTS 后端
///
/// 每次朗读启动一个合成器进程，换行即 kill。进程退出后
/// `is_speaking` 自动回到 false。
pub struct ProcessSpeech {
    /// 合成器命令（默认 espeak）
    command: String,
    /// 进行中的朗读进程
    child: Option<Child>,
}

impl ProcessSpeech {
    /// 使用指定命令创建后端
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            child: None,
        }
    }

    /// 把朗读参数映射为 espeak 风格的命令行参数
    ///
    /// `-s` 每分钟词数，`-p` 音调 0-99，`-a` 振幅 0-200。
    fn args_for(options: &SpeechOptions) -> [String; 6] {
        let rate = (options.rate * ESPEAK_BASE_RATE).round().max(1.0) as i32;
        let pitch = ((options.pitch * 50.0).round() as i32).clamp(0, 99);
        let volume = ((options.volume * 100.0).round() as i32).clamp(0, 200);
        [
            "-s".to_string(),
            rate.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            volume.to_string(),
        ]
    }
}

impl Default for ProcessSpeech {
    fn default() -> Self {
        Self::new("espeak")
    }
}

impl SpeechSynthesizer for ProcessSpeech {
    fn speak(&mut self, text: &str, options: &SpeechOptions) -> Result<(), MediaError> {
        self.cancel();

        let child = Command::new(&self.command)
            .args(Self::args_for(options))
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                MediaError::Playback(format!("无法启动语音合成进程 '{}': {}", self.command, e))
            })?;

        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn is_speaking(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                // 进程已退出，朗读结束
                Ok(Some(_)) | Err(_) => {
                    self.child = None;
                    false
                }
                Ok(None) => true,
            },
            None => false,
        }
    }
}

impl Drop for ProcessSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 空后端：TTS 被禁用时使用
///
/// 记录朗读状态但不发出任何声音，测试中用来验证协调器的
/// 停旧再启新契约。
#[derive(Debug, Default)]
pub struct NullSpeech {
    speaking: bool,
}

impl NullSpeech {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpeechSynthesizer for NullSpeech {
    fn speak(&mut self, _text: &str, _options: &SpeechOptions) -> Result<(), MediaError> {
        self.speaking = true;
        Ok(())
    }

    fn cancel(&mut self) {
        self.speaking = false;
    }

    fn is_speaking(&mut self) -> bool {
        self.speaking
    }
}
