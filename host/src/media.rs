//! # Media 模块
//!
//! 媒体协调器：让背景音乐和语音朗读与当前展示的章节保持同步。
//!
//! ## 顺序保证
//!
//! 每次章节切换都严格按"先停旧媒体、再起新媒体"的顺序执行，
//! 这依靠单一控制流的顺序执行来保证，不需要锁：一个 Runtime
//! 实例拥有恰好一个协调器实例。"最新者胜"：换章时在途的音乐和
//! 朗读被取消，绝不排队，也绝不叠音。
//!
//! ## 失败语义
//!
//! 媒体失败绝不阻塞或污染游玩状态：单独调用的操作把错误返回给
//! 调用方，[`MediaCoordinator::sync_chapter`] 则记录日志后降级为
//! "无声章节"继续前进。

use story_engine::Chapter;
use thiserror::Error;
use tracing::warn;

use crate::audio::AudioPlayer;
use crate::speech::{SpeechOptions, SpeechSynthesizer};

/// 媒体错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// 媒体加载失败（文件缺失、解码失败、来源不支持）
    #[error("媒体加载失败: {0}")]
    Load(String),

    /// 媒体播放失败（设备不可用、进程无法启动）
    #[error("媒体播放失败: {0}")]
    Playback(String),
}

/// 媒体协调器
///
/// 至多一条背景音轨 + 至多一条朗读，二者都随章节切换而更替。
pub struct MediaCoordinator {
    audio: AudioPlayer,
    speech: Box<dyn SpeechSynthesizer>,
    speech_options: SpeechOptions,
}

impl MediaCoordinator {
    /// 组装协调器
    pub fn new(audio: AudioPlayer, speech: Box<dyn SpeechSynthesizer>) -> Self {
        Self {
            audio,
            speech,
            speech_options: SpeechOptions::default(),
        }
    }

    /// 设置朗读参数
    pub fn set_speech_options(&mut self, options: SpeechOptions) {
        self.speech_options = options;
    }

    /// 播放背景音乐（同一来源幂等）
    pub fn play_background_music(&mut self, src: &str, looping: bool) -> Result<(), MediaError> {
        self.audio.play(src, looping)
    }

    /// 停止背景音乐（任何时候都安全）
    pub fn stop_background_music(&mut self) {
        self.audio.stop();
    }

    /// 朗读文本
    ///
    /// 空白文本是 no-op；否则先取消在途朗读，再开始新的。
    pub fn speak_text(&mut self, text: &str) -> Result<(), MediaError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.speech.speak(text, &self.speech_options)
    }

    /// 取消朗读（幂等）
    pub fn stop_speaking(&mut self) {
        self.speech.cancel();
    }

    /// 是否正在朗读
    pub fn is_speaking(&mut self) -> bool {
        self.speech.is_speaking()
    }

    /// 设置音乐音量
    pub fn set_music_volume(&mut self, volume: f32) {
        self.audio.set_volume(volume);
    }

    /// 切换音乐静音
    pub fn toggle_mute(&mut self) {
        self.audio.toggle_mute();
    }

    /// 是否静音
    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    /// 与章节对齐
    ///
    /// 章节切换时调用：停掉旧朗读；按章节配置切换或停止背景音乐
    /// （同曲保持不断）；最后按需启动新朗读。媒体失败只记日志，
    /// 章节导航照常进行。
    pub fn sync_chapter(&mut self, chapter: &Chapter) {
        self.stop_speaking();

        match &chapter.background_music {
            Some(src) => {
                if let Err(e) = self.audio.play(src, true) {
                    warn!(error = %e, "背景音乐播放失败，本章节保持静音");
                }
            }
            None => self.audio.stop(),
        }

        if chapter.enable_tts {
            if let Err(e) = self.speak_text(&chapter.content) {
                warn!(error = %e, "语音朗读失败，本章节保持静音");
            }
        }
    }

    /// 会话结束时的完整清场
    pub fn shutdown(&mut self) {
        self.stop_speaking();
        self.stop_background_music();
    }
}
