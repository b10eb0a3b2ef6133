//! # Runtime 模块
//!
//! 游玩状态机：在不可变的故事快照上行走，维护当前章节、
//! 访问集合与可回溯的路径。
//!
//! ## 执行模型
//!
//! 所有转移都是同步的全函数 `(state, input) -> state`，内部没有任何
//! 阻塞或异步工作；音频等异步事务完全委托给宿主层，绝不阻塞转移。
//!
//! ## 快照语义
//!
//! Runtime 持有 Story 的独立快照。作者在别处继续编辑不会影响
//! 进行中的会话；要拿到新的编辑结果必须显式调用 [`StoryRuntime::reload`]，
//! 绝不隐式换绑。

use std::collections::HashSet;

use crate::error::PlayError;
use crate::history::History;
use crate::model::{Chapter, Story};

/// 游玩状态机
///
/// # 使用示例
///
/// ```ignore
/// let mut runtime = StoryRuntime::new(story)?;
///
/// loop {
///     let chapter = runtime.current_node().unwrap();
///     // 宿主展示章节、同步媒体……
///     if runtime.is_ending() {
///         break;
///     }
///     runtime.choose(&player_picked_target);
/// }
/// ```
#[derive(Debug)]
pub struct StoryRuntime {
    /// 故事快照
    story: Story,
    /// 当前章节 id
    current: String,
    /// 访问过的章节集合（单调增长，只用于统计）
    visited: HashSet<String>,
    /// 当前遍历路径（可截断，用于回溯）
    history: History,
}

impl StoryRuntime {
    /// 加载故事，进入起始章节
    ///
    /// 没有任何章节的故事是非法输入；起始章节缺失同样拒绝加载。
    pub fn new(story: Story) -> Result<Self, PlayError> {
        if story.is_empty() {
            return Err(PlayError::EmptyStory);
        }
        let Some(start) = story.start_node() else {
            return Err(PlayError::UnknownStartNode {
                id: story.start_node_id.clone(),
            });
        };

        let current = start.id.clone();
        let mut visited = HashSet::new();
        visited.insert(current.clone());
        let mut history = History::new();
        history.push(&current, &start.title);

        Ok(Self {
            story,
            current,
            visited,
            history,
        })
    }

    /// 执行一次选择
    ///
    /// 仅当当前章节存在指向 `target_node_id` 的选项，且该目标章节
    /// 确实存在时才转移。其余情况（未解析目标误入游玩端等）是
    /// 静默 no-op：不崩溃，也绝不前进到错误章节。
    ///
    /// 返回是否发生了转移，宿主据此决定是否重新同步媒体。
    pub fn choose(&mut self, target_node_id: &str) -> bool {
        let Some(current) = self.story.node(&self.current) else {
            return false;
        };
        if !current.has_choice_to(target_node_id) {
            return false;
        }
        let Some(target) = self.story.node(target_node_id) else {
            return false;
        };

        let title = target.title.clone();
        self.current = target_node_id.to_string();
        self.visited.insert(self.current.clone());
        self.history.push(target_node_id, title);
        true
    }

    /// 回溯到路径中的某一步
    ///
    /// 要求该章节出现在当前路径中；成功后路径截断到该步（含），
    /// 当前章节随之切换。访问集合**不会**收缩，它只服务于
    /// "读过多少章"的统计，与回放正确性无关。
    pub fn rewind_to(&mut self, node_id: &str) -> bool {
        if !self.history.truncate_to(node_id) {
            return false;
        }
        self.current = node_id.to_string();
        true
    }

    /// 重新从头开始
    ///
    /// 等价于对同一个故事重新 load：访问集合和路径全部重置。
    pub fn restart(&mut self) {
        let start = self.story.start_node_id.clone();
        let title = self
            .story
            .start_node()
            .map(|c| c.title.clone())
            .unwrap_or_default();

        self.current = start.clone();
        self.visited.clear();
        self.visited.insert(start.clone());
        self.history.clear();
        self.history.push(start, title);
    }

    /// 显式换上新的故事快照
    ///
    /// 用于拿到作者的最新编辑结果，会话进度随之重置。
    pub fn reload(&mut self, story: Story) -> Result<(), PlayError> {
        *self = Self::new(story)?;
        Ok(())
    }

    /// 当前章节 id
    pub fn current_node_id(&self) -> &str {
        &self.current
    }

    /// 当前章节
    pub fn current_node(&self) -> Option<&Chapter> {
        self.story.node(&self.current)
    }

    /// 当前章节是否为结局
    ///
    /// 这是派生谓词，每次调用都基于快照重新计算，不缓存。
    pub fn is_ending(&self) -> bool {
        self.current_node().map(|c| c.is_ending()).unwrap_or(false)
    }

    /// 访问过的章节数
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// 当前遍历路径
    pub fn history(&self) -> &History {
        &self.history
    }

    /// 故事快照
    pub fn story(&self) -> &Story {
        &self.story
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{add_chapter, add_choice, create_chapter, create_choice, create_story};

    /// A(起点) -> B -> C(结局)
    fn linear_story() -> (Story, String, String) {
        let story = create_story("线性", "作者");
        let b = create_chapter("B", "中段");
        let b_id = b.id.clone();
        let c = create_chapter("C", "结局");
        let c_id = c.id.clone();

        let start_id = story.start_node_id.clone();
        let story = add_chapter(&story, b).unwrap();
        let story = add_chapter(&story, c).unwrap();
        let story = add_choice(&story, &start_id, create_choice("去B", &b_id)).unwrap();
        let story = add_choice(&story, &b_id, create_choice("去C", &c_id)).unwrap();
        (story, b_id, c_id)
    }

    #[test]
    fn test_load_seeds_state() {
        let (story, _, _) = linear_story();
        let start_id = story.start_node_id.clone();
        let runtime = StoryRuntime::new(story).unwrap();

        assert_eq!(runtime.current_node_id(), start_id);
        assert_eq!(runtime.visited_count(), 1);
        assert_eq!(runtime.history().len(), 1);
        assert!(!runtime.is_ending());
    }

    #[test]
    fn test_load_empty_story_fails() {
        let mut story = create_story("空", "作者");
        story.nodes.clear();

        let err = StoryRuntime::new(story).unwrap_err();
        assert_eq!(err, PlayError::EmptyStory);
    }

    #[test]
    fn test_load_missing_start_fails() {
        let (mut story, _, _) = linear_story();
        story.start_node_id = "missing".to_string();

        let err = StoryRuntime::new(story).unwrap_err();
        assert!(matches!(err, PlayError::UnknownStartNode { .. }));
    }

    #[test]
    fn test_choose_advances_and_records() {
        let (story, b_id, _) = linear_story();
        let mut runtime = StoryRuntime::new(story).unwrap();

        assert!(runtime.choose(&b_id));
        assert_eq!(runtime.current_node_id(), b_id);
        assert_eq!(runtime.history().len(), 2);
        assert_eq!(runtime.history().last().unwrap().node_id, b_id);
        assert_eq!(runtime.visited_count(), 2);
    }

    #[test]
    fn test_choose_invalid_target_is_noop() {
        let (story, b_id, _) = linear_story();
        let mut runtime = StoryRuntime::new(story).unwrap();
        runtime.choose(&b_id);

        // 既不是当前章节的出边，也不存在这个章节
        assert!(!runtime.choose("nonexistent"));
        assert_eq!(runtime.current_node_id(), b_id);
        assert_eq!(runtime.history().len(), 2);
    }

    #[test]
    fn test_choose_unresolved_target_is_noop() {
        let story = create_story("悬空", "作者");
        let start_id = story.start_node_id.clone();
        // 创作期遗留的未解析选项流入游玩端
        let story = add_choice(&story, &start_id, create_choice("以后", "not-yet")).unwrap();
        let mut runtime = StoryRuntime::new(story).unwrap();

        assert!(!runtime.choose("not-yet"));
        assert_eq!(runtime.current_node_id(), start_id);
    }

    #[test]
    fn test_rewind_truncates_history_not_visited() {
        let (story, b_id, c_id) = linear_story();
        let start_id = story.start_node_id.clone();
        let mut runtime = StoryRuntime::new(story).unwrap();
        runtime.choose(&b_id);
        runtime.choose(&c_id);
        assert_eq!(runtime.visited_count(), 3);

        assert!(runtime.rewind_to(&start_id));
        assert_eq!(runtime.current_node_id(), start_id);
        assert_eq!(runtime.history().len(), 1);
        // visited 单调增长
        assert_eq!(runtime.visited_count(), 3);
    }

    #[test]
    fn test_rewind_to_unvisited_is_noop() {
        let (story, b_id, c_id) = linear_story();
        let mut runtime = StoryRuntime::new(story).unwrap();
        runtime.choose(&b_id);

        assert!(!runtime.rewind_to(&c_id));
        assert_eq!(runtime.current_node_id(), b_id);
    }

    #[test]
    fn test_restart_resets_everything() {
        let (story, b_id, c_id) = linear_story();
        let start_id = story.start_node_id.clone();
        let mut runtime = StoryRuntime::new(story).unwrap();
        runtime.choose(&b_id);
        runtime.choose(&c_id);

        runtime.restart();
        assert_eq!(runtime.current_node_id(), start_id);
        assert_eq!(runtime.visited_count(), 1);
        assert_eq!(runtime.history().len(), 1);
    }

    #[test]
    fn test_ending_detection_is_derived() {
        let (story, b_id, c_id) = linear_story();
        let mut runtime = StoryRuntime::new(story).unwrap();
        runtime.choose(&b_id);
        assert!(!runtime.is_ending());

        runtime.choose(&c_id);
        // 反复查询结果一致，不依赖缓存
        assert!(runtime.is_ending());
        assert!(runtime.is_ending());
    }

    #[test]
    fn test_reload_picks_up_edits() {
        let (story, b_id, _) = linear_story();
        let mut runtime = StoryRuntime::new(story.clone()).unwrap();
        runtime.choose(&b_id);

        // 编辑发生在独立的快照上，运行中的会话不受影响
        let edited = crate::editor::update_chapter(&story, &b_id, |mut c| {
            c.title = "改过的B".to_string();
            c
        })
        .unwrap();
        assert_eq!(runtime.current_node().unwrap().title, "B");

        runtime.reload(edited).unwrap();
        assert_eq!(runtime.current_node_id(), runtime.story().start_node_id);
        assert_eq!(runtime.story().node(&b_id).unwrap().title, "改过的B");
    }
}
