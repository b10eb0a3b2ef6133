//! # Editor 模块
//!
//! 创作期的变更层：对故事图的全部 CRUD 操作。
//!
//! ## 设计原则
//!
//! - 所有操作都是**纯函数**：输入的 Story 保持不变，返回新的 Story 值。
//!   调用方保留旧快照即可实现撤销/重做，游玩中的 Runtime 持有的快照
//!   也不会被编辑操作影响。
//! - 所有操作都是**全量生效**的：要么返回完整的新 Story，要么返回错误，
//!   绝不产生半途而废的图。
//! - 起始章节受保护：`start_node_id` 必须始终指向存在的章节。

use crate::error::EditError;
use crate::id::generate_id;
use crate::model::{Chapter, Choice, Story, blank_chapter, now_rfc3339};

/// 新故事的起始章节标题
pub const START_CHAPTER_TITLE: &str = "Story Beginning";
/// 新故事的起始章节正文
pub const START_CHAPTER_CONTENT: &str =
    "Welcome to your adventure! What happens next is up to you.";
/// 新章节的默认标题
pub const DEFAULT_CHAPTER_TITLE: &str = "New Chapter";

/// 可被 [`update_choice`] 替换的选项字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceField {
    /// 选项文本
    Text,
    /// 目标章节 id
    Target,
}

/// 创建新故事
///
/// 新故事带有恰好一个预置的起始章节。
pub fn create_story(title: impl Into<String>, author: impl Into<String>) -> Story {
    let start = blank_chapter(START_CHAPTER_TITLE, START_CHAPTER_CONTENT);
    let start_node_id = start.id.clone();
    let now = now_rfc3339();

    let mut nodes = std::collections::HashMap::new();
    nodes.insert(start_node_id.clone(), start);

    Story {
        id: generate_id(),
        title: title.into(),
        description: String::new(),
        author: author.into(),
        created_at: now.clone(),
        updated_at: now,
        start_node_id,
        nodes,
    }
}

/// 创建新章节（不挂入任何故事）
pub fn create_chapter(title: impl Into<String>, content: impl Into<String>) -> Chapter {
    blank_chapter(title, content)
}

/// 创建新选项
///
/// `target_node_id` 允许为空字符串（未解析），这在创作期是合法状态。
pub fn create_choice(text: impl Into<String>, target_node_id: impl Into<String>) -> Choice {
    Choice {
        id: generate_id(),
        text: text.into(),
        target_node_id: target_node_id.into(),
    }
}

/// 插入章节
pub fn add_chapter(story: &Story, chapter: Chapter) -> Result<Story, EditError> {
    if story.contains_node(&chapter.id) {
        return Err(EditError::DuplicateId { id: chapter.id });
    }

    let mut next = story.clone();
    next.nodes.insert(chapter.id.clone(), chapter);
    Ok(next)
}

/// 删除章节
///
/// 起始章节受保护，拒绝删除。删除成功后自动剪除所有指向该章节的
/// 选项（悬空边清理是强制且完整的，不存在部分清理）。
pub fn delete_chapter(story: &Story, id: &str) -> Result<Story, EditError> {
    if id == story.start_node_id {
        return Err(EditError::ProtectedNode { id: id.to_string() });
    }
    if !story.contains_node(id) {
        return Err(EditError::UnknownNode { id: id.to_string() });
    }

    let mut next = story.clone();
    next.nodes.remove(id);
    for chapter in next.nodes.values_mut() {
        chapter.choices.retain(|c| c.target_node_id != id);
    }
    Ok(next)
}

/// 改写章节
///
/// 用调用方提供的闭包替换章节内容（标题、正文、媒体等）。
/// 章节 id 是图的 key，闭包无法改变它。
pub fn update_chapter(
    story: &Story,
    id: &str,
    rewrite: impl FnOnce(Chapter) -> Chapter,
) -> Result<Story, EditError> {
    let Some(chapter) = story.node(id) else {
        return Err(EditError::UnknownNode { id: id.to_string() });
    };

    let mut rewritten = rewrite(chapter.clone());
    rewritten.id = id.to_string();

    let mut next = story.clone();
    next.nodes.insert(id.to_string(), rewritten);
    Ok(next)
}

/// 向章节追加选项
///
/// 选项 id 在所属章节内必须唯一。
pub fn add_choice(story: &Story, chapter_id: &str, choice: Choice) -> Result<Story, EditError> {
    let chapter = story.node(chapter_id).ok_or(EditError::UnknownNode {
        id: chapter_id.to_string(),
    })?;
    if chapter.choice(&choice.id).is_some() {
        return Err(EditError::DuplicateId { id: choice.id });
    }

    update_chapter(story, chapter_id, |mut chapter| {
        chapter.choices.push(choice);
        chapter
    })
}

/// 替换选项的单个字段
///
/// 除目标选项外没有任何结构性副作用。
pub fn update_choice(
    story: &Story,
    chapter_id: &str,
    choice_id: &str,
    field: ChoiceField,
    value: impl Into<String>,
) -> Result<Story, EditError> {
    let value = value.into();
    with_choice(story, chapter_id, choice_id, |choice| match field {
        ChoiceField::Text => choice.text = value,
        ChoiceField::Target => choice.target_node_id = value,
    })
}

/// 删除选项
pub fn delete_choice(
    story: &Story,
    chapter_id: &str,
    choice_id: &str,
) -> Result<Story, EditError> {
    ensure_choice(story, chapter_id, choice_id)?;
    update_chapter(story, chapter_id, |mut chapter| {
        chapter.choices.retain(|c| c.id != choice_id);
        chapter
    })
}

/// 更换起始章节
pub fn set_start_node(story: &Story, id: &str) -> Result<Story, EditError> {
    if !story.contains_node(id) {
        return Err(EditError::UnknownNode { id: id.to_string() });
    }

    let mut next = story.clone();
    next.start_node_id = id.to_string();
    Ok(next)
}

/// 对指定选项就地应用修改
fn with_choice(
    story: &Story,
    chapter_id: &str,
    choice_id: &str,
    apply: impl FnOnce(&mut Choice),
) -> Result<Story, EditError> {
    ensure_choice(story, chapter_id, choice_id)?;
    update_chapter(story, chapter_id, |mut chapter| {
        if let Some(choice) = chapter.choices.iter_mut().find(|c| c.id == choice_id) {
            apply(choice);
        }
        chapter
    })
}

/// 校验章节与选项都存在
fn ensure_choice(story: &Story, chapter_id: &str, choice_id: &str) -> Result<(), EditError> {
    let chapter = story.node(chapter_id).ok_or(EditError::UnknownNode {
        id: chapter_id.to_string(),
    })?;
    if chapter.choice(choice_id).is_none() {
        return Err(EditError::UnknownChoice {
            chapter_id: chapter_id.to_string(),
            choice_id: choice_id.to_string(),
        });
    }
    Ok(())
}
