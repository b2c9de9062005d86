// ---------------- 全局搜索 ----------------
// 搜索始终针对整个题库，不受当前主题/难度/状态限制。
use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::{
    model::Question,
    sort::{self, TopicBucket},
};

/// 预览最多展示的条数
pub const PREVIEW_LIMIT: usize = 5;
/// 少于 2 个字符不触发搜索
pub const MIN_QUERY_CHARS: usize = 2;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPreview<'a> {
    pub query: String,
    pub total: usize,
    pub topic_count: usize,
    /// 题库原顺序的前 5 条
    pub top: Vec<&'a Question>,
}

impl SearchPreview<'_> {
    pub fn has_more(&self) -> bool {
        self.total > self.top.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullSearch<'a> {
    pub query: String,
    pub total: usize,
    pub buckets: Vec<TopicBucket<'a>>,
}

/// 去掉首尾空白；过短返回 None
pub fn normalize_query(query: &str) -> Option<&str> {
    let q = query.trim();
    (q.chars().count() >= MIN_QUERY_CHARS).then_some(q)
}

pub fn find<'a>(questions: &'a [Question], query: &str) -> Vec<&'a Question> {
    let lower = query.to_lowercase();
    questions
        .iter()
        .filter(|q| q.matches_lowercase(&lower))
        .collect()
}

pub fn preview<'a>(questions: &'a [Question], query: &str) -> Option<SearchPreview<'a>> {
    let query = normalize_query(query)?;
    let results = find(questions, query);
    let topic_count = sort::group(&results).len();
    Some(SearchPreview {
        query: query.to_string(),
        total: results.len(),
        topic_count,
        top: results.into_iter().take(PREVIEW_LIMIT).collect(),
    })
}

/// 全量结果：按主题分组、主题按字母序，桶内保持题库顺序
pub fn full<'a>(questions: &'a [Question], query: &str) -> Option<FullSearch<'a>> {
    let query = normalize_query(query)?;
    let results = find(questions, query);
    let buckets = sort::group(&results)
        .into_iter()
        .map(|(topic, questions)| TopicBucket { topic, questions })
        .collect();
    Some(FullSearch {
        query: query.to_string(),
        total: results.len(),
        buckets,
    })
}

/// 查询串按字面量匹配（先转义正则元字符），忽略大小写。
#[derive(Debug, Clone)]
pub struct Highlighter {
    re: Option<Regex>,
}

impl Highlighter {
    pub fn new(query: &str) -> Self {
        let re = if query.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(query))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self { re }
    }

    /// 命中区间（字节偏移）
    pub fn ranges(&self, text: &str) -> Vec<Range<usize>> {
        match &self.re {
            Some(re) => re.find_iter(text).map(|m| m.range()).collect(),
            None => vec![],
        }
    }

    /// 把文本切成 (片段, 是否命中)，渲染层据此上色
    pub fn segments<'t>(&self, text: &'t str) -> Vec<(&'t str, bool)> {
        let mut out = vec![];
        let mut last = 0;
        for r in self.ranges(text) {
            if r.start > last {
                out.push((&text[last..r.start], false));
            }
            out.push((&text[r.clone()], true));
            last = r.end;
        }
        if last < text.len() {
            out.push((&text[last..], false));
        }
        out
    }

    pub fn wrap(&self, text: &str, open: &str, close: &str) -> String {
        match &self.re {
            Some(re) => re
                .replace_all(text, |caps: &regex::Captures| {
                    format!("{}{}{}", open, &caps[0], close)
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

/// 命中部分用 <mark> 包裹，保留原文大小写
pub fn highlight(text: &str, query: &str) -> String {
    Highlighter::new(query).wrap(text, MARK_OPEN, MARK_CLOSE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{q, QuestionId};

    fn repo() -> Vec<Question> {
        vec![
            q(1, "Java", "What is JVM?", "Basic", 5),
            q(2, "Java", "Explain GC", "Advanced", 2),
        ]
    }

    #[test]
    fn preview_for_jvm() {
        let items = repo();
        let p = preview(&items, "JVM").unwrap();
        assert_eq!(p.total, 1);
        assert_eq!(p.topic_count, 1);
        assert_eq!(p.top[0].id, QuestionId::Num(1));
        assert_eq!(
            highlight(&p.top[0].question, &p.query),
            "What is <mark>JVM</mark>?"
        );
    }

    #[test]
    fn short_queries_do_not_search() {
        let items = repo();
        assert!(preview(&items, "J").is_none());
        assert!(preview(&items, "  J ").is_none());
        assert!(full(&items, "").is_none());
    }

    #[test]
    fn preview_is_capped_at_five() {
        let items: Vec<Question> = (0..5000)
            .map(|i| q(i, if i % 2 == 0 { "Java" } else { "SQL" }, "select stuff", "Basic", 1))
            .collect();
        let p = preview(&items, "select").unwrap();
        let f = full(&items, "select").unwrap();
        assert_eq!(p.top.len(), PREVIEW_LIMIT);
        assert_eq!(p.total, 5000);
        assert_eq!(p.topic_count, 2);
        assert!(p.has_more());
        assert!(p.total <= f.total);
        let first: Vec<QuestionId> = p.top.iter().map(|q| q.id.clone()).collect();
        assert_eq!(first, (0..5).map(QuestionId::Num).collect::<Vec<_>>());
    }

    #[test]
    fn full_search_groups_alphabetically_without_cap() {
        let mut items = repo();
        items.push(q(3, "Docker", "JVM in containers", "Intermediate", 3));
        let f = full(&items, "jvm").unwrap();
        assert_eq!(f.total, 2);
        let topics: Vec<&str> = f.buckets.iter().map(|b| b.topic).collect();
        assert_eq!(topics, vec!["Docker", "Java"]);
    }

    #[test]
    fn special_characters_match_literally() {
        let mut items = repo();
        items.push(q(3, "C++", "What does C++ add to C?", "Basic", 1));
        items.push(q(4, "C", "Is C a subset?", "Basic", 1));
        let p = preview(&items, "C++").unwrap();
        assert_eq!(p.total, 1);
        assert_eq!(p.top[0].id, QuestionId::Num(3));
        assert_eq!(
            highlight("What does C++ add to C?", "c++"),
            "What does <mark>C++</mark> add to C?"
        );
        assert_eq!(highlight("a (b) [c]", "(b)"), "a <mark>(b)</mark> [c]");
        assert_eq!(highlight("no match here", ".*"), "no match here");
    }

    #[test]
    fn every_occurrence_is_marked() {
        assert_eq!(
            highlight("Git and git and GIT", "git"),
            "<mark>Git</mark> and <mark>git</mark> and <mark>GIT</mark>"
        );
        let h = Highlighter::new("gc");
        assert_eq!(
            h.segments("Explain GC now"),
            vec![("Explain ", false), ("GC", true), (" now", false)]
        );
        assert_eq!(Highlighter::new("").segments("abc"), vec![("abc", false)]);
    }
}
