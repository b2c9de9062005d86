// ---------------- 配置：按键映射 + 侧栏分组 ----------------
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::topics::{default_groups, TopicGroup};

pub const CONFIG_FILE: &str = "prepmaster.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ToggleDone,
    ToggleRevise,
    ToggleStar,
    CycleSort,
    CycleDifficulty,
    CycleStatus,
    ToggleView,
    ShowRevision,
    ShowStarred,
    ResetFilters,
    ShowProgress,
    HighPriority,
    OpenSearch,
    ClearSearch,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigToml {
    #[serde(default)]
    keys: HashMap<String, String>,
    #[serde(default)]
    groups: Vec<TopicGroup>,
    #[serde(default)]
    search: SearchToml,
}

#[derive(Debug, Default, Deserialize)]
struct SearchToml {
    suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub keymap: HashMap<char, KeyAction>,
    pub groups: Vec<TopicGroup>,
    /// 搜索框为空时下拉里给出的快捷查询
    pub suggestions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keymap: default_keymap(),
            groups: default_groups(),
            suggestions: default_suggestions(),
        }
    }
}

fn default_suggestions() -> Vec<String> {
    ["Selenium", "Java", "API", "SQL", "TestNG"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// 当前目录及其祖先目录中第一个 prepmaster.toml
pub fn find_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|p| p.exists())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("读取配置失败: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("解析配置失败: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let raw: ConfigToml = toml::from_str(content)?;
    let groups = if raw.groups.is_empty() {
        default_groups()
    } else {
        raw.groups
    };
    // 显式写空列表即关闭建议
    let suggestions = match raw.search.suggestions {
        Some(list) => list
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => default_suggestions(),
    };
    Ok(Config {
        keymap: parse_keymap(raw.keys),
        groups,
        suggestions,
    })
}

/// 只接受单字符键；自定义项覆盖默认项
fn parse_keymap(map: HashMap<String, String>) -> HashMap<char, KeyAction> {
    let mut out = default_keymap();
    for (k, v) in map {
        let mut chars = k.chars();
        match (chars.next(), chars.next(), action_from_str(&v)) {
            (Some(ch), None, Some(act)) => {
                out.insert(ch, act);
            }
            _ => warn!(key = %k, action = %v, "ignoring invalid key binding"),
        }
    }
    out
}

fn action_from_str(s: &str) -> Option<KeyAction> {
    use KeyAction::*;
    Some(match s {
        "toggle_done" => ToggleDone,
        "toggle_revise" => ToggleRevise,
        "toggle_star" => ToggleStar,
        "cycle_sort" => CycleSort,
        "cycle_difficulty" => CycleDifficulty,
        "cycle_status" => CycleStatus,
        "toggle_view" => ToggleView,
        "show_revision" => ShowRevision,
        "show_starred" => ShowStarred,
        "reset_filters" => ResetFilters,
        "show_progress" => ShowProgress,
        "high_priority" => HighPriority,
        "open_search" => OpenSearch,
        "clear_search" => ClearSearch,
        _ => return None,
    })
}

fn default_keymap() -> HashMap<char, KeyAction> {
    use KeyAction::*;
    HashMap::from([
        ('d', ToggleDone),
        ('r', ToggleRevise),
        ('s', ToggleStar),
        ('o', CycleSort),
        ('f', CycleDifficulty),
        ('t', CycleStatus),
        ('v', ToggleView),
        ('R', ShowRevision),
        ('S', ShowStarred),
        ('X', ResetFilters),
        ('p', ShowProgress),
        ('H', HighPriority),
        ('/', OpenSearch),
        ('c', ClearSearch),
    ])
}
