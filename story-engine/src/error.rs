//! # Error 模块
//!
//! 定义 story-engine 中使用的错误类型。

use thiserror::Error;

use crate::project::ProjectError;

/// 编辑错误
///
/// 编辑层的所有错误都是局部可恢复的：调用方放弃这次变更即可，
/// 输入的 Story 不会被部分修改。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// 章节 id 冲突
    #[error("章节 id '{id}' 已存在")]
    DuplicateId { id: String },

    /// 试图删除起始章节
    #[error("章节 '{id}' 是起始章节，不允许删除")]
    ProtectedNode { id: String },

    /// 章节不存在
    #[error("章节 '{id}' 不存在")]
    UnknownNode { id: String },

    /// 选项不存在
    #[error("章节 '{chapter_id}' 中不存在选项 '{choice_id}'")]
    UnknownChoice {
        chapter_id: String,
        choice_id: String,
    },
}

/// 游玩错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    /// 故事没有任何章节
    #[error("故事不包含任何章节，无法开始游玩")]
    EmptyStory,

    /// 起始章节缺失
    #[error("起始章节 '{id}' 不存在")]
    UnknownStartNode { id: String },
}

/// story-engine 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 编辑错误
    #[error("编辑错误: {0}")]
    Edit(#[from] EditError),

    /// 游玩错误
    #[error("游玩错误: {0}")]
    Play(#[from] PlayError),

    /// 项目导入/导出错误
    #[error("项目错误: {0}")]
    Project(#[from] ProjectError),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
