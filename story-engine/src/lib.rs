//! # Story Engine
//!
//! 分支叙事引擎的纯逻辑核心库。
//!
//! ## 架构概述
//!
//! `story-engine` 不依赖任何 IO、音频或渲染设施。一个故事是章节
//! （节点）和选项（有向边）构成的图，引擎提供围绕这张图的四组能力：
//!
//! ```text
//! Editor ──(纯变更函数)──► Story ◄──(只读快照)── StoryRuntime
//!                            │
//!                 validate() │ to_json()/from_json()
//!                            ▼
//!                      Issue 列表 / 交换格式 JSON
//! ```
//!
//! - [`editor`]：创作期的 CRUD 变更层，全部是纯函数，输入永不改变
//! - [`validate`]：可达性分析与结构诊断
//! - [`runtime`]：游玩状态机（当前章节、访问集合、可回溯路径）
//! - [`project`]：项目元数据与 JSON 导出/导入编解码
//!
//! 宿主层（持久化、背景音乐、语音合成、界面）作为调用方存在，
//! 只通过上述公开契约与引擎交互。
//!
//! ## 核心类型
//!
//! - [`Story`] / [`Chapter`] / [`Choice`]：图数据模型
//! - [`StoryRuntime`]：游玩状态机
//! - [`StoryProject`]：持久化与交换的单元
//! - [`Issue`]：结构诊断条目

pub mod editor;
pub mod error;
pub mod history;
pub mod id;
pub mod model;
pub mod project;
pub mod runtime;
pub mod validate;

// 重导出核心类型
pub use error::{EditError, EngineError, EngineResult, PlayError};
pub use history::{History, PathEntry};
pub use id::generate_id;
pub use model::{Chapter, Choice, MediaKind, NodePosition, Story, now_rfc3339};
pub use project::{PROJECT_VERSION, ProjectError, ProjectMetadata, StoryProject};
pub use runtime::StoryRuntime;
pub use validate::{Issue, IssueLevel, StoryStats, reachable_set, stats, validate};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证公共类型组合起来可以走完一个最小会话
        let story = editor::create_story("冒烟测试", "作者");
        assert!(validate(&story).is_empty());

        let project = StoryProject::new(story.clone());
        let json = project.to_json().unwrap();
        assert_eq!(StoryProject::from_json(&json).unwrap(), project);

        let runtime = StoryRuntime::new(story).unwrap();
        assert!(runtime.is_ending());
    }
}
