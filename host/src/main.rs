//! 分支叙事引擎 - 终端宿主
//!
//! 负责持久化、媒体播放与终端交互，驱动 story-engine 游玩故事。

use std::io::{self, Write as _};
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing::warn;

use host::{
    AudioPlayer, HostConfig, MediaCoordinator, NullSpeech, ProcessSpeech, SpeechSynthesizer,
    StoryStore,
};
use story_engine::{StoryProject, StoryRuntime, editor, validate};

#[derive(Parser)]
#[command(name = "story-host", about = "分支叙事引擎终端宿主", version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 列出故事库中的全部故事
    List,
    /// 创建新故事
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
    },
    /// 向故事追加章节
    AddChapter {
        id: String,
        /// 章节标题
        #[arg(long, default_value = editor::DEFAULT_CHAPTER_TITLE)]
        title: String,
        /// 章节正文
        #[arg(long, default_value = "")]
        content: String,
    },
    /// 校验故事结构
    Validate { id: String },
    /// 游玩故事
    Play {
        id: String,
        /// 关闭背景音乐与朗读
        #[arg(long)]
        no_audio: bool,
    },
    /// 从交换格式 JSON 导入故事
    Import { file: PathBuf },
    /// 导出故事为交换格式 JSON
    Export { id: String, file: PathBuf },
    /// 删除故事
    Delete { id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = HostConfig::load(&cli.config).context("加载配置失败")?;

    let mut store = StoryStore::new(&config.library_dir);
    store.init().context("初始化故事库失败")?;

    match cli.command {
        Command::List => cmd_list(&store),
        Command::New { title, author } => cmd_new(&store, title, author),
        Command::AddChapter { id, title, content } => cmd_add_chapter(&store, &id, title, content),
        Command::Validate { id } => cmd_validate(&store, &id),
        Command::Play { id, no_audio } => cmd_play(&config, &store, &id, no_audio),
        Command::Import { file } => cmd_import(&store, &file),
        Command::Export { id, file } => cmd_export(&store, &id, &file),
        Command::Delete { id } => {
            store.delete(&id)?;
            println!("已删除: {}", id);
            Ok(())
        }
    }
}

fn cmd_list(store: &StoryStore) -> anyhow::Result<()> {
    let projects = store.get_all()?;
    if projects.is_empty() {
        println!("故事库为空。用 `story-host new` 创建第一个故事。");
        return Ok(());
    }

    for project in projects {
        println!(
            "{}  {}  (作者: {}, {} 章, 更新于 {})",
            project.story.id,
            project.story.title,
            project.story.author,
            project.metadata.node_count,
            project.story.updated_at,
        );
    }
    Ok(())
}

fn cmd_new(store: &StoryStore, title: String, author: String) -> anyhow::Result<()> {
    let story = editor::create_story(title, author);
    let project = StoryProject::new(story).touched();
    store.save(&project)?;
    println!("已创建故事: {} ({})", project.story.title, project.story.id);
    Ok(())
}

fn cmd_add_chapter(
    store: &StoryStore,
    id: &str,
    title: String,
    content: String,
) -> anyhow::Result<()> {
    let mut project = load_project(store, id)?;
    let chapter = editor::create_chapter(title, content);
    let chapter_id = chapter.id.clone();
    let chapter_title = chapter.title.clone();

    project.story = editor::add_chapter(&project.story, chapter)?;
    let project = project.with_last_edited(chapter_id.clone()).touched();
    store.save(&project)?;
    println!("已添加章节: {} ({})", chapter_title, chapter_id);
    Ok(())
}

fn cmd_validate(store: &StoryStore, id: &str) -> anyhow::Result<()> {
    let project = load_project(store, id)?;
    let issues = validate::validate(&project.story);
    let stats = validate::stats(&project.story);

    println!(
        "{}: {} 章, {} 个选项, {} 个结局",
        project.story.title, stats.node_count, stats.choice_count, stats.ending_count
    );

    if issues.is_empty() {
        println!("结构合法，没有发现问题。");
    } else {
        for issue in issues {
            println!("{}", issue);
        }
    }
    Ok(())
}

fn cmd_import(store: &StoryStore, file: &PathBuf) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file).context("读取导入文件失败")?;
    let project = StoryStore::import_from_text(&text)?;
    store.save(&project)?;
    println!("已导入故事: {} ({})", project.story.title, project.story.id);
    Ok(())
}

fn cmd_export(store: &StoryStore, id: &str, file: &PathBuf) -> anyhow::Result<()> {
    let project = load_project(store, id)?;
    let text = StoryStore::export_to_text(&project)?;
    std::fs::write(file, text).context("写入导出文件失败")?;
    println!("已导出到 {:?}", file);
    Ok(())
}

fn cmd_play(
    config: &HostConfig,
    store: &StoryStore,
    id: &str,
    no_audio: bool,
) -> anyhow::Result<()> {
    let project = load_project(store, id)?;
    println!("《{}》 by {}\n", project.story.title, project.story.author);

    let mut runtime = StoryRuntime::new(project.story)?;
    let mut media = build_media(config, no_audio);

    show_chapter(&runtime, media.as_mut());

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "q" => break,
            "r" => {
                runtime.restart();
                show_chapter(&runtime, media.as_mut());
            }
            "h" => show_history(&runtime),
            "m" => {
                if let Some(media) = media.as_mut() {
                    media.toggle_mute();
                    println!("静音: {}", if media.is_muted() { "开" } else { "关" });
                }
            }
            _ if input.starts_with("b ") => {
                let target = input[2..].trim();
                let node_id = runtime
                    .history()
                    .entries()
                    .iter()
                    .find(|e| e.node_id == target || e.title == target)
                    .map(|e| e.node_id.clone());
                match node_id {
                    Some(node_id) if runtime.rewind_to(&node_id) => {
                        show_chapter(&runtime, media.as_mut());
                    }
                    _ => println!("路径中没有这一章，用 h 查看历史。"),
                }
            }
            _ => match input.parse::<usize>() {
                Ok(n) if n >= 1 => {
                    let target = runtime
                        .current_node()
                        .and_then(|c| c.choices.get(n - 1))
                        .map(|c| c.target_node_id.clone());
                    match target {
                        Some(target) if runtime.choose(&target) => {
                            show_chapter(&runtime, media.as_mut());
                        }
                        Some(_) => println!("这个选项还没有通向任何章节。"),
                        None => println!("没有这个选项。"),
                    }
                }
                _ => println!("输入选项编号，或 h 历史 / b <章节> 回溯 / r 重来 / m 静音 / q 退出"),
            },
        }
    }

    if let Some(media) = media.as_mut() {
        media.shutdown();
    }
    Ok(())
}

/// 展示当前章节，并让媒体跟上
fn show_chapter(runtime: &StoryRuntime, media: Option<&mut MediaCoordinator>) {
    let Some(chapter) = runtime.current_node() else {
        return;
    };

    if let Some(media) = media {
        media.sync_chapter(chapter);
    }

    println!("\n━━━ {} ━━━", chapter.title);
    println!("{}\n", chapter.content);

    if runtime.is_ending() {
        println!("~ 完 ~  （本次游玩共经过 {} 章）", runtime.visited_count());
        println!("r 重来 / q 退出");
        return;
    }

    for (i, choice) in chapter.choices.iter().enumerate() {
        let resolved = runtime.story().contains_node(&choice.target_node_id);
        let marker = if resolved { "" } else { "（未完成）" };
        println!("  {}. {}{}", i + 1, choice.text, marker);
    }
}

fn show_history(runtime: &StoryRuntime) {
    println!("已访问 {} 章，当前路径:", runtime.visited_count());
    for entry in runtime.history().entries() {
        println!("  {}  {}", entry.node_id, entry.title);
    }
}

/// 组装媒体协调器
///
/// 音频设备不可用时降级为纯文字游玩，不中断会话。
fn build_media(config: &HostConfig, no_audio: bool) -> Option<MediaCoordinator> {
    if no_audio {
        return None;
    }

    let audio = match AudioPlayer::new(&config.assets_root) {
        Ok(audio) => audio,
        Err(e) => {
            warn!(error = %e, "音频不可用，以静音模式游玩");
            return None;
        }
    };

    let speech: Box<dyn SpeechSynthesizer> = if config.tts.enabled {
        Box::new(ProcessSpeech::new(&config.tts.command))
    } else {
        Box::new(NullSpeech::new())
    };

    let mut media = MediaCoordinator::new(audio, speech);
    media.set_music_volume(config.audio.bgm_volume);
    if config.audio.muted {
        media.toggle_mute();
    }
    media.set_speech_options(config.speech_options());
    Some(media)
}

fn load_project(store: &StoryStore, id: &str) -> anyhow::Result<StoryProject> {
    store
        .get(id)?
        .ok_or_else(|| anyhow!("故事 '{}' 不存在", id))
}
