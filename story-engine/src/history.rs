//! # History 模块
//!
//! 游玩路径的有序记录，支持回溯（rewind）。
//!
//! ## 设计原则
//!
//! - 记录当前遍历路径上的每一步（章节 id + 标题）
//! - 可截断：回溯到历史中的某一步时，该步之后的记录被丢弃
//! - 所有数据可序列化，与导出格式对齐

use serde::{Deserialize, Serialize};

/// 路径中的一步
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntry {
    /// 章节 id
    pub node_id: String,
    /// 章节标题（供历史面板展示）
    pub title: String,
}

/// 遍历路径容器
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<PathEntry>,
}

impl History {
    /// 创建空路径
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一步
    pub fn push(&mut self, node_id: impl Into<String>, title: impl Into<String>) {
        self.entries.push(PathEntry {
            node_id: node_id.into(),
            title: title.into(),
        });
    }

    /// 全部记录
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// 步数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 最近一步
    pub fn last(&self) -> Option<&PathEntry> {
        self.entries.last()
    }

    /// 章节是否出现在路径中
    pub fn contains(&self, node_id: &str) -> bool {
        self.position_of(node_id).is_some()
    }

    /// 章节在路径中首次出现的位置
    pub fn position_of(&self, node_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.node_id == node_id)
    }

    /// 截断到指定章节（含），返回是否找到
    pub fn truncate_to(&mut self, node_id: &str) -> bool {
        match self.position_of(node_id) {
            Some(index) => {
                self.entries.truncate(index + 1);
                true
            }
            None => false,
        }
    }

    /// 清空
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
