//! # Config 模块
//!
//! 宿主层配置，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::speech::SpeechOptions;

/// 配置错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("无法读取配置文件: {0}")]
    Io(String),

    #[error("配置文件格式错误: {0}")]
    Parse(String),
}

/// 宿主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// 故事库目录
    #[serde(default = "default_library_dir")]
    pub library_dir: PathBuf,

    /// 资源根目录（相对音频路径的解析基准）
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 语音合成配置
    #[serde(default)]
    pub tts: TtsConfig,
}

/// 音频配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// 背景音乐音量 (0.0 - 1.0)
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f32,

    /// 启动时是否静音
    #[serde(default)]
    pub muted: bool,
}

/// 语音合成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// 是否启用朗读
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 合成器命令
    #[serde(default = "default_tts_command")]
    pub command: String,

    /// 语速倍率
    #[serde(default = "default_unit")]
    pub rate: f32,

    /// 音调倍率
    #[serde(default = "default_unit")]
    pub pitch: f32,

    /// 音量倍率
    #[serde(default = "default_unit")]
    pub volume: f32,
}

impl HostConfig {
    /// 从配置文件加载
    ///
    /// 文件不存在时返回默认配置；存在但无法解析时报错，
    /// 避免静默吞掉用户的配置意图。
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 朗读参数
    pub fn speech_options(&self) -> SpeechOptions {
        SpeechOptions {
            rate: self.tts.rate,
            pitch: self.tts.pitch,
            volume: self.tts.volume,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            library_dir: default_library_dir(),
            assets_root: default_assets_root(),
            audio: AudioConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bgm_volume: default_bgm_volume(),
            muted: false,
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            command: default_tts_command(),
            rate: default_unit(),
            pitch: default_unit(),
            volume: default_unit(),
        }
    }
}

fn default_library_dir() -> PathBuf {
    PathBuf::from("library")
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_bgm_volume() -> f32 {
    crate::audio::DEFAULT_BGM_VOLUME
}

fn default_tts_command() -> String {
    "espeak".to_string()
}

fn default_true() -> bool {
    true
}

fn default_unit() -> f32 {
    1.0
}
