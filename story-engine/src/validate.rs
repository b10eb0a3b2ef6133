//! # Validate 模块
//!
//! 故事图的静态检查：可达性分析与结构诊断。
//!
//! ## 设计原则
//!
//! - 纯函数 API，不修改输入，不依赖 IO
//! - O(节点数 + 选项数)，按需在创作期调用，不在每次游玩转移时运行
//! - 未解析/悬空的选项**不是**错误类别：遍历时跳过即可，
//!   由编辑器界面单独提示

use std::collections::{HashSet, VecDeque};

use crate::model::Story;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// 诊断级别
    pub level: IssueLevel,
    /// 关联的章节 id（如果可定位）
    pub node_id: Option<String>,
    /// 诊断消息
    pub message: String,
}

impl Issue {
    /// 创建错误诊断
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            node_id: None,
            message: message.into(),
        }
    }

    /// 创建警告诊断
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warn,
            node_id: None,
            message: message.into(),
        }
    }

    /// 关联章节
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.level)?;
        if let Some(node_id) = &self.node_id {
            write!(f, " {}", node_id)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// 校验故事图，返回诊断列表
///
/// 执行以下检查：
/// - 故事标题为空（错误）
/// - 起始章节缺失（错误）
/// - 从起始章节出发不可达的章节（警告，逐个列出）
///
/// 空列表表示结构合法。
pub fn validate(story: &Story) -> Vec<Issue> {
    let mut issues = Vec::new();

    if story.title.trim().is_empty() {
        issues.push(Issue::error("故事标题不能为空"));
    }

    if !story.contains_node(&story.start_node_id) {
        issues.push(
            Issue::error(format!("起始章节 '{}' 不存在", story.start_node_id))
                .with_node(story.start_node_id.clone()),
        );
    }

    let reachable = reachable_set(story);

    // HashMap 遍历顺序不确定，排序保证诊断输出可复现
    let mut unreachable: Vec<&String> = story
        .nodes
        .keys()
        .filter(|id| !reachable.contains(*id))
        .collect();
    unreachable.sort();

    for id in unreachable {
        let title = story.node(id).map(|c| c.title.as_str()).unwrap_or("");
        issues.push(
            Issue::warn(format!("章节 '{}' 从起点不可达", title)).with_node(id.clone()),
        );
    }

    issues
}

/// 从起始章节出发的可达集合
///
/// 广度优先遍历，只沿着目标存在的选项前进；未解析或悬空的选项
/// 不作为遍历边。返回的是集合，遍历顺序不影响结果。
pub fn reachable_set(story: &Story) -> HashSet<String> {
    let mut reachable = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(story.start_node_id.clone());

    while let Some(node_id) = queue.pop_front() {
        if !reachable.insert(node_id.clone()) {
            continue;
        }

        if let Some(chapter) = story.node(&node_id) {
            for choice in &chapter.choices {
                if story.contains_node(&choice.target_node_id) {
                    queue.push_back(choice.target_node_id.clone());
                }
            }
        }
    }

    reachable
}

/// 故事统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoryStats {
    /// 章节总数
    pub node_count: usize,
    /// 选项总数
    pub choice_count: usize,
    /// 结局数量
    pub ending_count: usize,
}

/// 统计故事规模（供编辑器界面展示）
pub fn stats(story: &Story) -> StoryStats {
    StoryStats {
        node_count: story.nodes.len(),
        choice_count: story.nodes.values().map(|c| c.choices.len()).sum(),
        ending_count: story.nodes.values().filter(|c| c.is_ending()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{add_chapter, add_choice, create_chapter, create_choice, create_story};

    /// A(起点) -> B(结局)，C 游离
    fn story_with_orphan() -> (Story, String) {
        let story = create_story("测试", "作者");
        let b = create_chapter("B", "");
        let b_id = b.id.clone();
        let c = create_chapter("C", "");
        let c_id = c.id.clone();

        let start_id = story.start_node_id.clone();
        let story = add_chapter(&story, b).unwrap();
        let story = add_chapter(&story, c).unwrap();
        let story = add_choice(&story, &start_id, create_choice("去B", &b_id)).unwrap();
        (story, c_id)
    }

    #[test]
    fn test_valid_story_has_no_issues() {
        let story = create_story("只有起点", "作者");
        assert!(validate(&story).is_empty());
    }

    #[test]
    fn test_unreachable_chapter_reported_once() {
        let (story, c_id) = story_with_orphan();

        let issues = validate(&story);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, IssueLevel::Warn);
        assert_eq!(issues[0].node_id.as_deref(), Some(c_id.as_str()));
    }

    #[test]
    fn test_empty_title_is_error() {
        let story = create_story("   ", "作者");
        let issues = validate(&story);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, IssueLevel::Error);
    }

    #[test]
    fn test_missing_start_node_is_error() {
        let mut story = create_story("测试", "作者");
        story.start_node_id = "missing".to_string();

        let issues = validate(&story);
        // 起点缺失本身是错误，同时所有章节都变得不可达
        assert!(issues.iter().any(|i| i.level == IssueLevel::Error));
        assert!(issues.iter().any(|i| i.level == IssueLevel::Warn));
    }

    #[test]
    fn test_unresolved_choice_is_not_a_traversal_edge() {
        let story = create_story("测试", "作者");
        let start_id = story.start_node_id.clone();
        // 指向尚未创建的章节：不报错，也不产生可达性
        let story = add_choice(&story, &start_id, create_choice("以后再说", "not-yet")).unwrap();

        assert!(validate(&story).is_empty());
        assert_eq!(reachable_set(&story).len(), 1);
    }

    #[test]
    fn test_stats_counts() {
        let (story, _) = story_with_orphan();
        let s = stats(&story);
        assert_eq!(s.node_count, 3);
        assert_eq!(s.choice_count, 1);
        assert_eq!(s.ending_count, 2);
    }
}
