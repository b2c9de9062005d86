// ---------------- 题目数据结构 ----------------
use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Deserializer, Serialize};

/// 题目 id：数据集里既有数字也有字符串。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Num(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// 数字按数值比较，字符串按字典序；混合时数字在前
impl Ord for QuestionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Num(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for QuestionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

pub const BASIC: &str = "Basic";
pub const INTERMEDIATE: &str = "Intermediate";
pub const ADVANCED: &str = "Advanced";

/// 难度筛选可选值（顺序即循环切换顺序）
pub const DIFFICULTIES: [&str; 3] = [BASIC, INTERMEDIATE, ADVANCED];

/// priority >= 4 视为高优先级
pub const HIGH_PRIORITY: u32 = 4;

const MAX_STARS: u32 = 5;
const NO_LINK: &str = "#";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub topic: String,
    pub question: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub difficulty: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub link: Option<String>,
}

fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl Question {
    /// 星级显示，最多 5 颗
    pub fn stars(&self) -> String {
        "★".repeat(self.priority.min(MAX_STARS) as usize)
    }

    /// 缺省或 "#" 都表示没有链接
    pub fn link(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != NO_LINK)
    }

    /// 按链接地址给出的按钮文字；没有链接时为 None
    pub fn link_label(&self) -> Option<&'static str> {
        let link = self.link()?;
        Some(if link.contains("selenium") {
            "Selenium Docs"
        } else if link.contains("java") {
            "Java Docs"
        } else if link.contains("testng") {
            "TestNG Docs"
        } else {
            "Learn More"
        })
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority >= HIGH_PRIORITY
    }

    pub fn difficulty_rank(&self) -> u8 {
        difficulty_rank(&self.difficulty)
    }

    /// 题干 / 答案 / 主题任一包含（已小写的）查询串即命中
    pub fn matches_lowercase(&self, lower_query: &str) -> bool {
        self.question.to_lowercase().contains(lower_query)
            || self.answer.to_lowercase().contains(lower_query)
            || self.topic.to_lowercase().contains(lower_query)
    }
}

/// Basic:1 Intermediate:2 Advanced:3，其余为 0
pub fn difficulty_rank(difficulty: &str) -> u8 {
    match difficulty {
        BASIC => 1,
        INTERMEDIATE => 2,
        ADVANCED => 3,
        _ => 0,
    }
}

#[cfg(test)]
pub(crate) fn q(id: i64, topic: &str, question: &str, difficulty: &str, priority: u32) -> Question {
    Question {
        id: QuestionId::Num(id),
        topic: topic.into(),
        question: question.into(),
        answer: String::new(),
        difficulty: difficulty.into(),
        priority,
        link: None,
    }
}
