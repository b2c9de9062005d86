// ---------------- 筛选条件 ----------------
// 所有选择器都接受字符串输入；无法识别的值回退到默认值，不报错。
use std::fmt;

use clap::ValueEnum;

use crate::model::DIFFICULTIES;

const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TopicFilter {
    #[default]
    All,
    Topic(String),
}

impl TopicFilter {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | ALL => Self::All,
            t => Self::Topic(t.to_string()),
        }
    }

    pub fn matches(&self, topic: &str) -> bool {
        match self {
            Self::All => true,
            Self::Topic(t) => t == topic,
        }
    }

    pub fn as_topic(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Topic(t) => Some(t),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DifficultyFilter {
    #[default]
    All,
    Only(String),
}

impl DifficultyFilter {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | ALL => Self::All,
            d => Self::Only(d.to_string()),
        }
    }

    pub fn matches(&self, difficulty: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(d) => d == difficulty,
        }
    }

    /// all -> Basic -> Intermediate -> Advanced -> all
    pub fn next(&self) -> Self {
        let pos = match self {
            Self::All => None,
            Self::Only(d) => DIFFICULTIES.iter().position(|x| x == d),
        };
        match pos {
            None => Self::Only(DIFFICULTIES[0].to_string()),
            Some(i) if i + 1 < DIFFICULTIES.len() => Self::Only(DIFFICULTIES[i + 1].to_string()),
            Some(_) => Self::All,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Only(d) => d,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    Revise,
    Starred,
    Pending,
}

impl StatusFilter {
    const CYCLE: [StatusFilter; 5] = [
        Self::All,
        Self::Done,
        Self::Revise,
        Self::Starred,
        Self::Pending,
    ];

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "done" => Self::Done,
            "revise" => Self::Revise,
            "starred" => Self::Starred,
            "pending" => Self::Pending,
            _ => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => ALL,
            Self::Done => "done",
            Self::Revise => "revise",
            Self::Starred => "starred",
            Self::Pending => "pending",
        }
    }

    pub fn next(&self) -> Self {
        let i = Self::CYCLE.iter().position(|s| s == self).unwrap_or(0);
        Self::CYCLE[(i + 1) % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Priority,
    Difficulty,
    Alphabetical,
    Completed,
    /// 兜底：按 id 倒序
    Id,
}

impl SortKey {
    const CYCLE: [SortKey; 5] = [
        Self::Priority,
        Self::Difficulty,
        Self::Alphabetical,
        Self::Completed,
        Self::Id,
    ];

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "priority" => Self::Priority,
            "difficulty" => Self::Difficulty,
            "alphabetical" => Self::Alphabetical,
            "completed" => Self::Completed,
            _ => Self::Id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Difficulty => "difficulty",
            Self::Alphabetical => "alphabetical",
            Self::Completed => "completed",
            Self::Id => "id",
        }
    }

    pub fn next(&self) -> Self {
        let i = Self::CYCLE.iter().position(|s| s == self).unwrap_or(0);
        Self::CYCLE[(i + 1) % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ViewMode {
    #[default]
    Cards,
    List,
}

impl ViewMode {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "list" => Self::List,
            _ => Self::Cards,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cards => "cards",
            Self::List => "list",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次完整的筛选条件快照；修改总是产生新值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub topic: TopicFilter,
    pub query: String,
    pub difficulty: DifficultyFilter,
    pub status: StatusFilter,
    pub sort: SortKey,
    pub view: ViewMode,
}

impl FilterCriteria {
    pub fn with_topic(self, topic: TopicFilter) -> Self {
        Self { topic, ..self }
    }

    pub fn with_query(self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..self
        }
    }

    pub fn with_difficulty(self, difficulty: DifficultyFilter) -> Self {
        Self { difficulty, ..self }
    }

    pub fn with_status(self, status: StatusFilter) -> Self {
        Self { status, ..self }
    }

    pub fn with_sort(self, sort: SortKey) -> Self {
        Self { sort, ..self }
    }

    pub fn with_view(self, view: ViewMode) -> Self {
        Self { view, ..self }
    }

    /// 难度或状态不是 all 即视为有激活的筛选
    pub fn has_active_filters(&self) -> bool {
        self.difficulty != DifficultyFilter::All || self.status != StatusFilter::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_fall_back_to_defaults() {
        assert_eq!(SortKey::parse("newest"), SortKey::Id);
        assert_eq!(StatusFilter::parse("archived"), StatusFilter::All);
        assert_eq!(ViewMode::parse("grid"), ViewMode::Cards);
        assert_eq!(TopicFilter::parse("all"), TopicFilter::All);
        assert_eq!(DifficultyFilter::parse("all"), DifficultyFilter::All);
    }

    #[test]
    fn difficulty_cycles_through_all_levels() {
        let mut d = DifficultyFilter::All;
        let mut seen = vec![];
        for _ in 0..4 {
            d = d.next();
            seen.push(d.label().to_string());
        }
        assert_eq!(seen, vec!["Basic", "Intermediate", "Advanced", "all"]);
    }

    #[test]
    fn builders_do_not_touch_other_fields() {
        let c = FilterCriteria::default()
            .with_topic(TopicFilter::parse("Java"))
            .with_sort(SortKey::Alphabetical);
        let d = c.clone().with_status(StatusFilter::Done);
        assert_eq!(d.topic, c.topic);
        assert_eq!(d.sort, SortKey::Alphabetical);
        assert!(d.has_active_filters());
        assert!(!c.has_active_filters());
    }
}
