// ---------------- 分组与排序 ----------------
// 先按主题分桶，再在每个桶内独立排序；slice::sort_by 是稳定排序，
// 相等元素保持题库原顺序。
use std::{cmp::Ordering, collections::BTreeMap};

use crate::{
    criteria::{SortKey, TopicFilter},
    model::Question,
    progress::ProgressStore,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TopicBucket<'a> {
    pub topic: &'a str,
    pub questions: Vec<&'a Question>,
}

/// BTreeMap 的 key 顺序即主题名字母序
pub fn group<'a>(filtered: &[&'a Question]) -> BTreeMap<&'a str, Vec<&'a Question>> {
    let mut out: BTreeMap<&str, Vec<&Question>> = BTreeMap::new();
    for &q in filtered {
        out.entry(q.topic.as_str()).or_default().push(q);
    }
    out
}

pub fn sort_bucket(bucket: &mut [&Question], key: SortKey, progress: &ProgressStore) {
    match key {
        SortKey::Priority => bucket.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortKey::Difficulty => {
            bucket.sort_by(|a, b| b.difficulty_rank().cmp(&a.difficulty_rank()))
        }
        SortKey::Alphabetical => bucket.sort_by(|a, b| locale_cmp(&a.question, &b.question)),
        // done 的排前面
        SortKey::Completed => bucket.sort_by_key(|q| !progress.get(&q.id).done),
        SortKey::Id => bucket.sort_by(|a, b| b.id.cmp(&a.id)),
    }
}

/// 分组 + 桶内排序 + 桶排序。选中单个主题时只返回该主题的桶。
pub fn arrange<'a>(
    filtered: &[&'a Question],
    topic: &TopicFilter,
    key: SortKey,
    progress: &ProgressStore,
) -> Vec<TopicBucket<'a>> {
    let mut grouped = group(filtered);
    for bucket in grouped.values_mut() {
        sort_bucket(bucket, key, progress);
    }
    match topic {
        TopicFilter::All => grouped
            .into_iter()
            .map(|(topic, questions)| TopicBucket { topic, questions })
            .collect(),
        TopicFilter::Topic(t) => grouped
            .into_iter()
            .filter(|(name, _)| *name == t.as_str())
            .map(|(topic, questions)| TopicBucket { topic, questions })
            .collect(),
    }
}

/// 近似 localeCompare：先忽略大小写比较，再让小写排在大写前
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<String>();
    fold(a).cmp(&fold(b)).then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        criteria::TopicFilter,
        model::{q, QuestionId},
        progress::Tag,
    };

    fn ids(bucket: &[&Question]) -> Vec<i64> {
        bucket
            .iter()
            .map(|q| match q.id {
                QuestionId::Num(n) => n,
                QuestionId::Text(_) => -1,
            })
            .collect()
    }

    fn sample() -> Vec<Question> {
        vec![
            q(1, "Java", "What is JVM?", "Basic", 5),
            q(2, "Java", "Explain GC", "Advanced", 2),
            q(3, "Git", "rebase vs merge", "Intermediate", 3),
            q(4, "Java", "abstract class", "", 2),
            q(5, "Agile", "Sprint length", "Basic", 1),
        ]
    }

    #[test]
    fn priority_sort_matches_scenario() {
        let items = sample();
        let refs: Vec<&Question> = items.iter().take(2).collect();
        let store = ProgressStore::in_memory();
        let buckets = arrange(&refs, &TopicFilter::parse("Java"), SortKey::Priority, &store);
        assert_eq!(buckets.len(), 1);
        assert_eq!(ids(&buckets[0].questions), vec![1, 2]);
    }

    #[test]
    fn priority_ties_keep_repository_order() {
        let items = sample();
        let mut java: Vec<&Question> = items.iter().filter(|q| q.topic == "Java").collect();
        sort_bucket(&mut java, SortKey::Priority, &ProgressStore::in_memory());
        assert_eq!(ids(&java), vec![1, 2, 4]);
    }

    #[test]
    fn difficulty_sort_puts_unranked_last() {
        let items = sample();
        let mut java: Vec<&Question> = items.iter().filter(|q| q.topic == "Java").collect();
        sort_bucket(&mut java, SortKey::Difficulty, &ProgressStore::in_memory());
        assert_eq!(ids(&java), vec![2, 1, 4]);
    }

    #[test]
    fn alphabetical_ignores_case() {
        let items = sample();
        let mut java: Vec<&Question> = items.iter().filter(|q| q.topic == "Java").collect();
        sort_bucket(&mut java, SortKey::Alphabetical, &ProgressStore::in_memory());
        assert_eq!(ids(&java), vec![4, 2, 1]);
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("a", "A"), Ordering::Less);
    }

    #[test]
    fn completed_first_then_repository_order() {
        let items = sample();
        let mut store = ProgressStore::in_memory();
        store.toggle(&QuestionId::Num(4), Tag::Done).unwrap();
        let mut java: Vec<&Question> = items.iter().filter(|q| q.topic == "Java").collect();
        sort_bucket(&mut java, SortKey::Completed, &store);
        assert_eq!(ids(&java), vec![4, 1, 2]);
    }

    #[test]
    fn fallback_sort_is_id_descending() {
        let items = sample();
        let mut java: Vec<&Question> = items.iter().filter(|q| q.topic == "Java").collect();
        sort_bucket(&mut java, SortKey::parse("bogus"), &ProgressStore::in_memory());
        assert_eq!(ids(&java), vec![4, 2, 1]);
    }

    #[test]
    fn all_topics_are_ordered_by_name() {
        let items = sample();
        let refs: Vec<&Question> = items.iter().collect();
        let progress = ProgressStore::in_memory();
        let buckets = arrange(&refs, &TopicFilter::All, SortKey::Priority, &progress);
        let topics: Vec<&str> = buckets.iter().map(|b| b.topic).collect();
        assert_eq!(topics, vec!["Agile", "Git", "Java"]);
    }

    #[test]
    fn grouping_never_drops_or_duplicates() {
        let items = sample();
        let refs: Vec<&Question> = items.iter().collect();
        for key in ["priority", "difficulty", "alphabetical", "completed", "id"] {
            let progress = ProgressStore::in_memory();
            let buckets = arrange(&refs, &TopicFilter::All, SortKey::parse(key), &progress);
            let mut seen: Vec<i64> = buckets.iter().flat_map(|b| ids(&b.questions)).collect();
            seen.sort_unstable();
            assert_eq!(seen, vec![1, 2, 3, 4, 5], "sort key {key}");
        }
    }

    #[test]
    fn selected_topic_missing_from_results_yields_nothing() {
        let items = sample();
        let refs: Vec<&Question> = items.iter().filter(|q| q.topic == "Git").collect();
        let progress = ProgressStore::in_memory();
        let java = TopicFilter::parse("Java");
        let buckets = arrange(&refs, &java, SortKey::Priority, &progress);
        assert!(buckets.is_empty());
    }
}
