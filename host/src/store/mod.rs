//! # Store 模块
//!
//! 故事库的持久化存储：每个故事一个 JSON 文件，按 `story.id` 寻址。
//!
//! ## 文件布局
//!
//! ```text
//! library/
//! ├── <story-id>.json
//! ├── <story-id>.json
//! └── ...
//! ```
//!
//! ## 生命周期
//!
//! 存储句柄显式构造、显式 `init()`（幂等），进程退出即回收，
//! 没有隐藏的模块级单例。`init()` 之前的任何操作都返回
//! [`StoreError::Unavailable`]。不同故事各自独占一个文件，
//! 并发保存互不干扰，不需要跨记录加锁。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use story_engine::{ProjectError, StoryProject};

/// 存储错误
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// 尚未调用 init()
    #[error("存储尚未初始化，请先调用 init()")]
    Unavailable,

    /// id 不能用作文件名
    #[error("非法的故事 id: '{id}'")]
    InvalidId { id: String },

    /// 文件操作失败
    #[error("存储 IO 失败: {0}")]
    Io(String),

    /// 记录编解码失败
    #[error(transparent)]
    Codec(#[from] ProjectError),
}

/// 故事存储
pub struct StoryStore {
    /// 故事库目录
    library_dir: PathBuf,
    /// init() 是否已完成
    ready: bool,
}

impl StoryStore {
    /// 创建存储（尚不可用，需要先 init）
    pub fn new(library_dir: impl AsRef<Path>) -> Self {
        Self {
            library_dir: library_dir.as_ref().to_path_buf(),
            ready: false,
        }
    }

    /// 获取底层存储句柄（幂等）
    ///
    /// 创建故事库目录；重复调用是安全的 no-op。
    pub fn init(&mut self) -> Result<(), StoreError> {
        if self.ready {
            return Ok(());
        }
        fs::create_dir_all(&self.library_dir)
            .map_err(|e| StoreError::Io(format!("无法创建故事库目录: {}", e)))?;
        self.ready = true;
        Ok(())
    }

    /// 是否已初始化
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// 保存项目（upsert，同 id 覆盖）
    ///
    /// 先写临时文件再原子改名，保存中断不会留下半个记录。
    pub fn save(&self, project: &StoryProject) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let path = self.record_path(&project.story.id)?;
        let json = project.to_json()?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes())
            .map_err(|e| StoreError::Io(format!("无法写入存储文件: {}", e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| StoreError::Io(format!("无法落盘存储文件: {}", e)))?;

        info!("💾 故事已保存: {} ({})", project.story.title, project.story.id);
        Ok(())
    }

    /// 按 id 读取项目，不存在时返回 None
    pub fn get(&self, id: &str) -> Result<Option<StoryProject>, StoreError> {
        self.ensure_ready()?;
        let path = self.record_path(id)?;
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .map_err(|e| StoreError::Io(format!("无法读取存储文件: {}", e)))?;
        Ok(Some(StoryProject::from_json(&json)?))
    }

    /// 读取全部项目（按最近更新排序）
    ///
    /// 无法解析的记录跳过并记录警告，不让单个坏文件拖垮整个列表。
    pub fn get_all(&self) -> Result<Vec<StoryProject>, StoreError> {
        self.ensure_ready()?;

        let entries = fs::read_dir(&self.library_dir)
            .map_err(|e| StoreError::Io(format!("无法读取故事库目录: {}", e)))?;

        let mut projects = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(json) = fs::read_to_string(&path) else {
                warn!("跳过无法读取的记录: {:?}", path);
                continue;
            };
            match StoryProject::from_json(&json) {
                Ok(project) => projects.push(project),
                Err(e) => warn!(error = %e, "跳过无法解析的记录: {:?}", path),
            }
        }

        projects.sort_by(|a, b| b.story.updated_at.cmp(&a.story.updated_at));
        Ok(projects)
    }

    /// 删除项目（不存在时也算成功）
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let path = self.record_path(id)?;
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| StoreError::Io(format!("无法删除存储文件: {}", e)))?;
            info!("💾 故事已删除: {}", id);
        }
        Ok(())
    }

    /// 记录是否存在
    pub fn exists(&self, id: &str) -> bool {
        self.ready
            && self
                .record_path(id)
                .map(|p| p.exists())
                .unwrap_or(false)
    }

    /// 导出为交换格式文本
    ///
    /// 纯编解码，不触碰存储句柄，init 前也可用。
    pub fn export_to_text(project: &StoryProject) -> Result<String, StoreError> {
        Ok(project.to_json()?)
    }

    /// 从交换格式文本导入
    ///
    /// 解析失败返回带原始 JSON 错误的 [`ProjectError::Parse`]；
    /// 导入不重分配 id，冲突处理由调用方负责。
    pub fn import_from_text(text: &str) -> Result<StoryProject, StoreError> {
        Ok(StoryProject::from_json(text)?)
    }

    fn ensure_ready(&self) -> Result<(), StoreError> {
        if self.ready { Ok(()) } else { Err(StoreError::Unavailable) }
    }

    /// 故事 id 对应的文件路径
    ///
    /// id 必须是安全的文件名主干（引擎生成的 id 天然满足；
    /// 导入的 id 在这里把关，拒绝路径穿越）。
    fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(StoreError::InvalidId { id: id.to_string() });
        }
        Ok(self.library_dir.join(format!("{}.json", id)))
    }
}
