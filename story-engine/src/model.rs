//! # Model 模块
//!
//! 故事图的数据模型：章节（节点）、选项（边）、故事（图）。
//!
//! ## 设计原则
//!
//! - 所有类型都是纯值类型，可序列化（JSON）
//! - 字段命名与交换格式对齐（camelCase），导出/导入不做任何转换
//! - 选项的 `target_node_id` 允许指向尚不存在的章节：
//!   这是合法的创作期过渡状态，不是错误，只是在游玩时不可通行

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::id::generate_id;

/// 媒体来源类型
///
/// 区分用户上传（data URI 内嵌）和外部 URL。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// 上传内容（data URI）
    Upload,
    /// 外部 URL
    Url,
}

/// 编辑器画布上的节点位置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// 选项（有向边）
///
/// `id` 在所属章节内唯一；`target_node_id` 可以为空字符串（未解析）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    /// 展示给玩家的选项文本
    pub text: String,
    /// 目标章节 id（可能未解析）
    pub target_node_id: String,
}

/// 章节（节点）
///
/// 没有任何选项的章节即为**结局**。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// 正文。引擎将其视为不透明字符串，不做任何理解
    pub content: String,

    /// 章节配图（data URI 或外部 URL）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 配图来源类型
    #[serde(rename = "imageType", default, skip_serializing_if = "Option::is_none")]
    pub image_kind: Option<MediaKind>,

    /// 背景音乐（data URI 或外部 URL）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music: Option<String>,
    /// 背景音乐来源类型
    #[serde(rename = "musicType", default, skip_serializing_if = "Option::is_none")]
    pub music_kind: Option<MediaKind>,

    /// 是否自动朗读正文
    #[serde(rename = "enableTTS", default)]
    pub enable_tts: bool,

    /// 出边列表（有序）
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// 编辑器画布位置（仅供编辑器使用，引擎不理会）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<NodePosition>,
}

impl Chapter {
    /// 是否为结局（没有任何出边）
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }

    /// 按选项 id 查找出边
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// 是否存在指向给定目标的出边
    pub fn has_choice_to(&self, target_node_id: &str) -> bool {
        self.choices.iter().any(|c| c.target_node_id == target_node_id)
    }
}

/// 故事（完整的图 + 元信息）
///
/// 不变式：`start_node_id` 必须始终指向 `nodes` 中存在的章节，
/// 编辑层会拒绝任何破坏该不变式的操作。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// 全局唯一 id
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    /// 创建时间（RFC 3339）
    pub created_at: String,
    /// 最近保存时间（RFC 3339）
    pub updated_at: String,
    /// 起始章节 id
    pub start_node_id: String,
    /// 章节表（key 为章节 id，插入顺序无意义）
    pub nodes: HashMap<String, Chapter>,
}

impl Story {
    /// 按 id 查找章节
    pub fn node(&self, id: &str) -> Option<&Chapter> {
        self.nodes.get(id)
    }

    /// 章节是否存在
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// 章节数量
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 是否没有任何章节
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 起始章节
    pub fn start_node(&self) -> Option<&Chapter> {
        self.nodes.get(&self.start_node_id)
    }
}

/// 当前时间的 RFC 3339 表示（UTC，毫秒精度）
pub fn now_rfc3339() -> String {
    use chrono::{SecondsFormat, Utc};

    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 构造一个空白章节
///
/// 新章节拥有全新 id、空出边列表，默认不开启朗读。
pub fn blank_chapter(title: impl Into<String>, content: impl Into<String>) -> Chapter {
    Chapter {
        id: generate_id(),
        title: title.into(),
        content: content.into(),
        image: None,
        image_kind: None,
        background_music: None,
        music_kind: None,
        enable_tts: false,
        choices: Vec::new(),
        position: Some(NodePosition::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_ending_predicate() {
        let mut chapter = blank_chapter("结局", "全剧终");
        assert!(chapter.is_ending());

        chapter.choices.push(Choice {
            id: generate_id(),
            text: "继续".to_string(),
            target_node_id: "somewhere".to_string(),
        });
        assert!(!chapter.is_ending());
    }

    #[test]
    fn test_wire_field_names() {
        let mut chapter = blank_chapter("第一章", "内容");
        chapter.enable_tts = true;
        chapter.image = Some("data:image/png;base64,AAAA".to_string());
        chapter.image_kind = Some(MediaKind::Upload);
        chapter.background_music = Some("https://example.com/bgm.mp3".to_string());
        chapter.music_kind = Some(MediaKind::Url);
        chapter.choices.push(Choice {
            id: "c1".to_string(),
            text: "走".to_string(),
            target_node_id: "n2".to_string(),
        });

        let json = serde_json::to_string(&chapter).unwrap();
        assert!(json.contains("\"enableTTS\":true"));
        assert!(json.contains("\"imageType\":\"upload\""));
        assert!(json.contains("\"musicType\":\"url\""));
        assert!(json.contains("\"backgroundMusic\""));
        assert!(json.contains("\"targetNodeId\":\"n2\""));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let chapter = Chapter {
            position: None,
            ..blank_chapter("章", "")
        };
        let json = serde_json::to_string(&chapter).unwrap();
        assert!(!json.contains("image"));
        assert!(!json.contains("backgroundMusic"));
        assert!(!json.contains("position"));
    }

    #[test]
    fn test_chapter_deserialize_minimal() {
        // 旧数据可能缺少 enableTTS / choices 字段
        let json = r#"{ "id": "n1", "title": "章", "content": "" }"#;
        let chapter: Chapter = serde_json::from_str(json).unwrap();
        assert!(!chapter.enable_tts);
        assert!(chapter.choices.is_empty());
    }
}
