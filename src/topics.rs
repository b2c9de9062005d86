// ---------------- 侧栏分组与主题卡片 ----------------
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    model::{Question, ADVANCED, BASIC, INTERMEDIATE},
    repo::Repository,
};

pub const OTHER_TOPICS: &str = "Other Topics";

/// 侧栏分组，只影响展示，不影响筛选
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroup {
    pub name: String,
    pub topics: Vec<String>,
}

impl TopicGroup {
    fn new(name: &str, topics: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }
}

pub fn default_groups() -> Vec<TopicGroup> {
    vec![
        TopicGroup::new(
            "Java & OOP",
            &["Java", "Java - OOPS", "Java - Collections", "Java - Strings", "Java - Exceptions"],
        ),
        TopicGroup::new(
            "Selenium",
            &[
                "Selenium",
                "Selenium - XPath",
                "Selenium - Waits",
                "Selenium - Exceptions",
                "Selenium - Actions",
                "Selenium - JavaScript",
                "Advanced Selenium",
            ],
        ),
        TopicGroup::new(
            "Frameworks",
            &["Framework", "Framework - POM", "Framework - OOPS", "TestNG", "Cucumber", "BDD"],
        ),
        TopicGroup::new(
            "API & Database",
            &["API Testing", "API Testing Advanced", "REST API", "SQL", "JDBC", "Apache POI"],
        ),
        TopicGroup::new(
            "DevOps & Tools",
            &["Git", "Maven", "Jenkins", "Docker", "Parallel", "Allure Reports"],
        ),
        TopicGroup::new(
            "Soft Skills",
            &[
                "Interview",
                "Agile",
                "Advanced Concepts",
                "Accessibility Testing",
                "Performance Testing",
            ],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarGroup {
    pub name: String,
    pub entries: Vec<SidebarEntry>,
}

/// 按配置顺序列出分组；空分组省略，未归类主题进 Other Topics（首次出现顺序）
pub fn sidebar(repo: &Repository, groups: &[TopicGroup]) -> Vec<SidebarGroup> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for q in repo.questions() {
        *counts.entry(q.topic.as_str()).or_default() += 1;
    }
    let mut out: Vec<SidebarGroup> = groups
        .iter()
        .filter_map(|g| {
            let entries: Vec<SidebarEntry> = g
                .topics
                .iter()
                .filter_map(|t| {
                    counts.get(t.as_str()).map(|&count| SidebarEntry {
                        topic: t.clone(),
                        count,
                    })
                })
                .collect();
            (!entries.is_empty()).then(|| SidebarGroup {
                name: g.name.clone(),
                entries,
            })
        })
        .collect();

    let categorized: HashSet<&str> = groups
        .iter()
        .flat_map(|g| g.topics.iter().map(String::as_str))
        .collect();
    let other: Vec<SidebarEntry> = repo
        .topics()
        .into_iter()
        .filter(|t| !categorized.contains(t))
        .map(|t| SidebarEntry {
            topic: t.to_string(),
            count: counts.get(t).copied().unwrap_or(0),
        })
        .collect();
    if !other.is_empty() {
        out.push(SidebarGroup {
            name: OTHER_TOPICS.to_string(),
            entries: other,
        });
    }
    out
}

/// 卡片视图中一个主题的统计
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCard {
    pub topic: String,
    pub total: usize,
    pub basic: usize,
    pub intermediate: usize,
    pub advanced: usize,
    pub high_priority: usize,
    pub avg_priority: f64,
}

pub fn topic_cards(questions: &[Question]) -> Vec<TopicCard> {
    let mut topics: Vec<&str> = questions.iter().map(|q| q.topic.as_str()).collect();
    topics.sort_unstable();
    topics.dedup();
    topics
        .into_iter()
        .map(|topic| {
            let items: Vec<&Question> = questions.iter().filter(|q| q.topic == topic).collect();
            let count_difficulty = |d: &str| items.iter().filter(|q| q.difficulty == d).count();
            let priority_sum: u64 = items.iter().map(|q| u64::from(q.priority)).sum();
            let avg = priority_sum as f64 / items.len() as f64;
            TopicCard {
                topic: topic.to_string(),
                total: items.len(),
                basic: count_difficulty(BASIC),
                intermediate: count_difficulty(INTERMEDIATE),
                advanced: count_difficulty(ADVANCED),
                high_priority: items.iter().filter(|q| q.is_high_priority()).count(),
                avg_priority: (avg * 10.0).round() / 10.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::q;

    fn repo() -> Repository {
        Repository::from_questions(vec![
            q(1, "Java", "What is JVM?", "Basic", 5),
            q(2, "Java", "Explain GC", "Advanced", 2),
            q(3, "Kotlin", "Coroutines?", "Intermediate", 4),
            q(4, "Git", "rebase", "Basic", 3),
            q(5, "Rust", "Ownership?", "Advanced", 5),
        ])
        .unwrap()
    }

    #[test]
    fn sidebar_skips_empty_groups_and_collects_others() {
        let groups = sidebar(&repo(), &default_groups());
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Java & OOP", "DevOps & Tools", OTHER_TOPICS]);
        assert_eq!(
            groups[0].entries,
            vec![SidebarEntry {
                topic: "Java".into(),
                count: 2
            }]
        );
        let others: Vec<&str> = groups[2].entries.iter().map(|e| e.topic.as_str()).collect();
        assert_eq!(others, vec!["Kotlin", "Rust"]);
    }

    #[test]
    fn custom_groups_replace_defaults() {
        let groups = vec![TopicGroup::new("JVM", &["Kotlin", "Java"])];
        let out = sidebar(&repo(), &groups);
        assert_eq!(out[0].entries[0].topic, "Kotlin");
        assert_eq!(out[1].name, OTHER_TOPICS);
        assert_eq!(out[1].entries.len(), 2);
    }

    #[test]
    fn cards_summarise_each_topic() {
        let r = repo();
        let cards = topic_cards(r.questions());
        let topics: Vec<&str> = cards.iter().map(|c| c.topic.as_str()).collect();
        assert_eq!(topics, vec!["Git", "Java", "Kotlin", "Rust"]);
        let java = &cards[1];
        assert_eq!(java.total, 2);
        assert_eq!((java.basic, java.intermediate, java.advanced), (1, 0, 1));
        assert_eq!(java.high_priority, 1);
        assert_eq!(java.avg_priority, 3.5);
    }
}
