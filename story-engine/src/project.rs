//! # Project 模块
//!
//! 故事项目：故事本体 + 项目元数据，以及作为交换格式的
//! JSON 导出/导入编解码。
//!
//! ## 设计原则
//!
//! - 导出即规范序列化：字段名与数据模型一一对应，不做变换
//! - `metadata.node_count` 是 `|story.nodes|` 的非权威缓存，
//!   每次保存前重算，仅供列表界面展示
//! - 导入不负责 id 重分配：是否为避免冲突换新 id 由调用方决定

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Story, now_rfc3339};

/// 项目格式版本
pub const PROJECT_VERSION: &str = "1.0";

/// 项目元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    /// 格式版本
    pub version: String,
    /// 章节数缓存（非权威，保存时重算）
    pub node_count: usize,
    /// 最近编辑的章节 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_node: Option<String>,
}

impl ProjectMetadata {
    /// 为给定故事生成元数据
    pub fn for_story(story: &Story) -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            node_count: story.node_count(),
            last_edited_node: None,
        }
    }
}

/// 故事项目（持久化与交换的单元）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryProject {
    pub story: Story,
    pub metadata: ProjectMetadata,
}

impl StoryProject {
    /// 包装故事为项目
    pub fn new(story: Story) -> Self {
        let metadata = ProjectMetadata::for_story(&story);
        Self { story, metadata }
    }

    /// 生成保存用的新值
    ///
    /// 刷新 `updated_at` 并重算 `node_count`，输入保持不变。
    pub fn touched(&self) -> StoryProject {
        let mut next = self.clone();
        next.story.updated_at = now_rfc3339();
        next.metadata.node_count = next.story.node_count();
        next
    }

    /// 记录最近编辑的章节
    pub fn with_last_edited(mut self, node_id: impl Into<String>) -> Self {
        self.metadata.last_edited_node = Some(node_id.into());
        self
    }

    /// 序列化为交换格式 JSON
    pub fn to_json(&self) -> Result<String, ProjectError> {
        serde_json::to_string_pretty(self).map_err(|e| ProjectError::Serialize(e.to_string()))
    }

    /// 从交换格式 JSON 反序列化
    ///
    /// 失败时带上原始的 JSON 错误信息，绝不部分生效。
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(json).map_err(|e| ProjectError::Parse(e.to_string()))
    }
}

/// 项目编解码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    /// 序列化失败
    #[error("序列化失败: {0}")]
    Serialize(String),

    /// 解析失败
    #[error("解析失败: {0}")]
    Parse(String),
}
