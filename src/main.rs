// 基于 ratatui + crossterm 的面试题浏览 TUI
// 功能：
// - 从 questions.json 载入题库（只读）
// - 按主题 / 难度 / 状态筛选，多种排序，按主题分组展示
// - 全局搜索：去抖预览 + 全量结果，命中高亮
// - 题目标记 done / revise / starred，回写本地进度文件

mod answer;
mod app;
mod config;
mod controller;
mod criteria;
mod debounce;
mod filter;
mod model;
mod progress;
mod repo;
mod search;
mod sort;
mod store;
mod theme;
mod topics;
mod ui;

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    app::{App, TICK},
    config::{find_config, load_config, Config},
    controller::Browser,
    criteria::{FilterCriteria, SortKey, TopicFilter, ViewMode},
    progress::ProgressStore,
    repo::Repository,
    store::FileStore,
    theme::{theme_of, Theme, ThemeKind},
};

const DATA_FILE: &str = "questions.json";
const STATE_FILE: &str = "progress.json";
const LOG_FILE: &str = "prepmaster.log";

#[derive(Debug, Clone, Parser)]
#[command(name = "prepmaster", about = "面试题浏览与进度跟踪 TUI", version)]
struct Cli {
    /// 题库路径，默认读取环境变量 PREPMASTER_DATA 或向上查找 questions.json
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// 进度文件路径，默认 PREPMASTER_STATE 或题库旁的 progress.json
    #[arg(long)]
    state: Option<PathBuf>,

    /// 配置文件（按键与侧栏分组），默认向上查找 prepmaster.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// 主题（外观）：dark | light
    #[arg(long = "theme", value_enum, default_value_t = ThemeKind::Dark)]
    theme: ThemeKind,

    /// 初始视图：cards | list
    #[arg(long, value_enum, default_value_t = ViewMode::Cards)]
    view: ViewMode,

    /// 初始排序：priority | difficulty | alphabetical | completed | id
    #[arg(long, default_value = "priority")]
    sort: String,

    /// 初始主题；指定后直接进入列表视图
    #[arg(long)]
    topic: Option<String>,

    /// 日志文件，默认进度文件旁的 prepmaster.log
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn default_data_path(cli: &Cli) -> PathBuf {
    if let Some(p) = &cli.file {
        return p.clone();
    }
    if let Ok(envp) = std::env::var("PREPMASTER_DATA") {
        return PathBuf::from(envp);
    }
    // 自动探测：从当前目录向上查找
    if let Ok(cwd) = std::env::current_dir() {
        for anc in cwd.ancestors() {
            for c in [anc.join(DATA_FILE), anc.join("data").join(DATA_FILE)] {
                if c.exists() {
                    return c;
                }
            }
        }
    }
    // 找不到时返回默认路径，load 时给出清晰错误
    PathBuf::from(DATA_FILE)
}

fn default_state_path(cli: &Cli, data_path: &Path) -> PathBuf {
    if let Some(p) = &cli.state {
        return p.clone();
    }
    if let Ok(envp) = std::env::var("PREPMASTER_STATE") {
        return PathBuf::from(envp);
    }
    data_path
        .parent()
        .map(|p| p.join(STATE_FILE))
        .unwrap_or_else(|| PathBuf::from(STATE_FILE))
}

/// stdout 归 TUI 使用，日志只写文件
fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败: {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn load_app_config(cli: &Cli) -> Config {
    let Some(path) = cli.config.clone().or_else(find_config) else {
        return Config::default();
    };
    match load_config(&path) {
        Ok(cfg) => {
            info!(path = %path.display(), "loaded config");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{:#}", err), "config ignored");
            Config::default()
        }
    }
}

fn initial_criteria(cli: &Cli) -> FilterCriteria {
    let criteria = FilterCriteria::default()
        .with_view(cli.view)
        .with_sort(SortKey::parse(&cli.sort));
    match cli.topic.as_deref().map(TopicFilter::parse) {
        Some(topic @ TopicFilter::Topic(_)) => criteria.with_topic(topic).with_view(ViewMode::List),
        _ => criteria,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_path = default_data_path(&cli);
    let state_path = default_state_path(&cli, &data_path);
    let log_path = cli.log_file.clone().unwrap_or_else(|| {
        state_path
            .parent()
            .map(|p| p.join(LOG_FILE))
            .unwrap_or_else(|| PathBuf::from(LOG_FILE))
    });
    if let Err(err) = init_logging(&log_path) {
        eprintln!("日志不可用: {:#}", err);
    }
    let theme = theme_of(cli.theme);

    // 加载失败时保留错误文本，进入失败界面而不是直接退出
    let mut state = match Repository::load(&data_path) {
        Ok(repo) => {
            if repo.is_empty() {
                warn!(path = %data_path.display(), "question bank is empty");
            }
            let config = load_app_config(&cli);
            let store = FileStore::open(&state_path);
            info!(state = %store.path().display(), "opening progress store");
            let progress = ProgressStore::open(Box::new(store));
            info!(tagged = progress.len(), "progress loaded");
            let browser = Browser::new(repo, progress, initial_criteria(&cli));
            Ok(App::new(browser, config, theme))
        }
        Err(err) => {
            error!(path = %data_path.display(), error = %err, "failed to load questions");
            Err(err.to_string())
        }
    };

    // TUI 初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = match &mut state {
        Ok(app) => run_app(&mut terminal, app),
        Err(msg) => run_failure(&mut terminal, &theme, &data_path, msg),
    };

    // 退出还原
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;
        let timeout = app.poll_timeout(Instant::now());
        if event::poll(timeout)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press && app.handle_key(k, Instant::now()) {
                    break;
                }
            }
        }
        app.tick(Instant::now());
    }
    Ok(())
}

fn run_failure<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    theme: &Theme,
    path: &Path,
    error: &str,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw_failure(f, theme, path, error))?;
        if event::poll(TICK)? {
            if let Event::Key(k) = event::read()? {
                if matches!(k.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter) {
                    return Ok(());
                }
            }
        }
    }
}
