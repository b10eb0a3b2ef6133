//! # Host 层
//!
//! 分支叙事引擎的宿主层实现：所有触碰操作系统的事务都在这里。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 持久化（故事库的文件存储与导入/导出）
//! - 背景音乐播放（rodio）
//! - 语音合成（可取消的子进程后端）
//! - 配置加载与日志
//!
//! Host 层不包含任何故事图逻辑：图模型、编辑变更、校验和游玩
//! 状态机都在 `story-engine` 中，这里只是它公开契约的调用方。
//! 媒体协调完全跟随 Runtime 的章节切换，先停旧、再放新。

pub mod audio;
pub mod config;
pub mod media;
pub mod speech;
pub mod store;

pub use audio::AudioPlayer;
pub use config::{AudioConfig, ConfigError, HostConfig, TtsConfig};
pub use media::{MediaCoordinator, MediaError};
pub use speech::{NullSpeech, ProcessSpeech, SpeechOptions, SpeechSynthesizer};
pub use store::{StoreError, StoryStore};
