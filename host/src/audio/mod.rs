//! # Audio 模块
//!
//! 背景音乐播放，使用 rodio 库实现。
//! 支持 MP3, WAV, FLAC, OGG 格式。
//!
//! ## 核心约束
//!
//! - 任意时刻**至多一条**背景音轨在播放
//! - 换曲先完整释放旧的 Sink，再创建新的，绝不同时出声
//! - 同一来源重复播放是幂等的 no-op
//!
//! 音频来源既可以是文件路径（相对路径按资源根目录解析），
//! 也可以是 `data:` URI（上传内容，base64 解码后从内存播放）。

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::debug;

use crate::media::MediaError;

/// 背景音乐默认音量（与编辑器预览一致）
pub const DEFAULT_BGM_VOLUME: f32 = 0.3;

/// 背景音乐播放器
///
/// 持有至多一个 rodio Sink；`stop()` 之后没有任何残留句柄。
pub struct AudioPlayer {
    /// 音频输出流（必须保持存活）
    _stream: OutputStream,
    /// 音频输出句柄
    stream_handle: OutputStreamHandle,
    /// 当前音轨
    sink: Option<Sink>,
    /// 当前音轨来源（幂等判断用）
    current_src: Option<String>,
    /// 音量 (0.0 - 1.0)
    volume: f32,
    /// 是否静音
    muted: bool,
    /// 资源根目录（相对路径的解析基准）
    assets_root: PathBuf,
}

impl AudioPlayer {
    /// 创建播放器
    ///
    /// 没有可用音频设备时返回 [`MediaError::Playback`]。
    pub fn new(assets_root: impl AsRef<Path>) -> Result<Self, MediaError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| MediaError::Playback(format!("无法初始化音频输出: {}", e)))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            current_src: None,
            volume: DEFAULT_BGM_VOLUME,
            muted: false,
            assets_root: assets_root.as_ref().to_path_buf(),
        })
    }

    /// 播放背景音乐
    ///
    /// 同一来源已在播放时直接返回（幂等）；否则先停止并释放当前
    /// 音轨，再开始新的。加载失败（文件缺失、解码失败、协议不支持）
    /// 返回 [`MediaError::Load`]，设备问题返回 [`MediaError::Playback`]，
    /// 两者都不会留下半启动的音轨。
    pub fn play(&mut self, src: &str, looping: bool) -> Result<(), MediaError> {
        if self.current_src.as_deref() == Some(src)
            && self.sink.as_ref().map(|s| !s.empty()).unwrap_or(false)
        {
            debug!("同一音轨已在播放，跳过: {}", src);
            return Ok(());
        }

        // 先停旧，再放新
        self.stop();

        let bytes = self.load_bytes(src)?;
        let source = Decoder::new(Cursor::new(bytes))
            .map_err(|e| MediaError::Load(format!("无法解码音频 '{}': {}", src, e)))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| MediaError::Playback(format!("无法创建音频播放器: {}", e)))?;
        sink.set_volume(self.effective_volume());

        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }

        self.sink = Some(sink);
        self.current_src = Some(src.to_string());
        debug!("🎵 开始播放背景音乐 (循环: {})", looping);
        Ok(())
    }

    /// 停止背景音乐
    ///
    /// 任何时候调用都安全（包括没有音轨在播放时），
    /// 旧音轨的资源被完整释放。
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            debug!("🎵 背景音乐已停止");
        }
        self.current_src = None;
    }

    /// 是否有音轨在播放
    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().map(|s| !s.empty()).unwrap_or(false)
    }

    /// 当前音轨来源
    pub fn current_src(&self) -> Option<&str> {
        self.current_src.as_deref()
    }

    /// 设置音量
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.effective_volume());
        }
    }

    /// 音量
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// 设置静音状态
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(sink) = &self.sink {
            sink.set_volume(self.effective_volume());
        }
    }

    /// 切换静音状态
    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    /// 是否静音
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// 考虑静音后的有效音量
    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// 把来源解析为内存中的音频数据
    fn load_bytes(&self, src: &str) -> Result<Vec<u8>, MediaError> {
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }

        if src.contains("://") {
            return Err(MediaError::Load(format!(
                "不支持的音频来源协议: {}",
                src
            )));
        }

        let path = self.resolve_path(src);
        fs::read(&path)
            .map_err(|e| MediaError::Load(format!("无法读取音频文件 {:?}: {}", path, e)))
    }

    /// 解析音频路径
    fn resolve_path(&self, src: &str) -> PathBuf {
        let path = Path::new(src);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.assets_root.join(path)
        }
    }
}

/// 解码 `data:<mime>;base64,<payload>` 形式的 URI
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, MediaError> {
    let Some((header, payload)) = uri.split_once(',') else {
        return Err(MediaError::Load("data URI 缺少数据段".to_string()));
    };
    if !header.ends_with(";base64") {
        return Err(MediaError::Load(
            "data URI 只支持 base64 编码".to_string(),
        ));
    }

    BASE64
        .decode(payload.trim())
        .map_err(|e| MediaError::Load(format!("data URI base64 解码失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_uri() {
        let uri = "data:audio/mpeg;base64,SGVsbG8=";
        assert_eq!(decode_data_uri(uri).unwrap(), b"Hello");

        assert!(decode_data_uri("data:audio/mpeg;base64").is_err());
        assert!(decode_data_uri("data:audio/mpeg,plain").is_err());
        assert!(decode_data_uri("data:audio/mpeg;base64,!!!").is_err());
    }

    #[test]
    fn test_volume_settings() {
        // 注意：这个测试在没有音频设备的环境下会被跳过
        if let Ok(mut player) = AudioPlayer::new("assets") {
            player.set_volume(0.5);
            assert_eq!(player.volume(), 0.5);

            // 音量限制
            player.set_volume(1.5);
            assert_eq!(player.volume(), 1.0);
            player.set_volume(-0.5);
            assert_eq!(player.volume(), 0.0);

            assert!(!player.is_muted());
            player.toggle_mute();
            assert!(player.is_muted());
        }
    }

    #[test]
    fn test_stop_without_track_is_safe() {
        if let Ok(mut player) = AudioPlayer::new("assets") {
            player.stop();
            player.stop();
            assert!(!player.is_playing());
            assert!(player.current_src().is_none());
        }
    }

    /// 生成 0.1 秒静音的 WAV 文件（44.1kHz 单声道 16 位 PCM）
    fn write_wav(path: &Path) {
        let data_len: u32 = 4410 * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&44100u32.to_le_bytes());
        bytes.extend_from_slice(&88200u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_track_switch_keeps_single_active_track() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"));
        write_wav(&dir.path().join("b.wav"));

        if let Ok(mut player) = AudioPlayer::new(dir.path()) {
            player.play("a.wav", true).unwrap();
            assert!(player.is_playing());
            assert_eq!(player.current_src(), Some("a.wav"));

            // 换曲：旧音轨被完整释放，只剩新的一条
            player.play("b.wav", true).unwrap();
            assert!(player.is_playing());
            assert_eq!(player.current_src(), Some("b.wav"));

            // 同一来源重复播放是幂等 no-op
            player.play("b.wav", true).unwrap();
            assert!(player.is_playing());
            assert_eq!(player.current_src(), Some("b.wav"));

            player.stop();
            assert!(!player.is_playing());
            assert!(player.current_src().is_none());
        }
    }

    #[test]
    fn test_remote_url_is_load_error() {
        if let Ok(mut player) = AudioPlayer::new("assets") {
            let err = player.play("https://example.com/bgm.mp3", true).unwrap_err();
            assert!(matches!(err, MediaError::Load(_)));
            assert!(player.current_src().is_none());
        }
    }
}
