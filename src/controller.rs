// ---------------- 控制器 ----------------
// 唯一持有当前筛选条件的地方；界面层只发意图（选主题、改条件、切标记、搜索），
// 再从这里取计算好的视图数据。
use tracing::{debug, info};

use crate::{
    criteria::{DifficultyFilter, FilterCriteria, SortKey, StatusFilter, TopicFilter, ViewMode},
    filter,
    model::{Question, QuestionId},
    progress::{ProgressStats, ProgressStore, Tag},
    repo::Repository,
    search::{self, FullSearch, SearchPreview},
    sort::{self, TopicBucket},
    store::StoreError,
    topics::{self, SidebarGroup, TopicCard, TopicGroup},
};

pub type Listener = Box<dyn FnMut(&FilterCriteria)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilters {
    pub labels: Vec<String>,
    /// 有激活筛选且（不计关键词）没有任何题目
    pub no_match: bool,
}

pub struct Browser {
    repo: Repository,
    progress: ProgressStore,
    criteria: FilterCriteria,
    listeners: Vec<Listener>,
}

impl Browser {
    pub fn new(repo: Repository, progress: ProgressStore, criteria: FilterCriteria) -> Self {
        Self {
            repo,
            progress,
            criteria,
            listeners: Vec::new(),
        }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&FilterCriteria) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        for l in &mut self.listeners {
            l(&self.criteria);
        }
    }

    /// 条件没变化时不通知
    pub fn on_filter_change(&mut self, criteria: FilterCriteria) {
        if criteria == self.criteria {
            return;
        }
        debug!(?criteria, "filter criteria changed");
        self.criteria = criteria;
        self.notify();
    }

    pub fn update(&mut self, f: impl FnOnce(FilterCriteria) -> FilterCriteria) {
        let next = f(self.criteria.clone());
        self.on_filter_change(next);
    }

    pub fn on_query_changed(&mut self, query: &str) {
        self.update(|c| c.with_query(query));
    }

    /// 选中具体主题会切到列表视图
    pub fn select_topic(&mut self, topic: &str) {
        self.update(|c| {
            c.with_topic(TopicFilter::parse(topic))
                .with_view(ViewMode::List)
        });
    }

    pub fn select_all_topics(&mut self) {
        self.update(|c| c.with_topic(TopicFilter::All));
    }

    /// 排序、主题、视图一次改完，监听者只收到一次通知
    pub fn show_high_priority(&mut self, topic: &str) {
        self.update(|c| {
            c.with_sort(SortKey::Priority)
                .with_topic(TopicFilter::parse(topic))
                .with_view(ViewMode::List)
        });
    }

    /// 切回卡片视图时主题重置为 all
    pub fn set_view(&mut self, view: ViewMode) {
        self.update(|c| match view {
            ViewMode::Cards => c.with_view(view).with_topic(TopicFilter::All),
            ViewMode::List => c.with_view(view),
        });
    }

    pub fn show_revision_queue(&mut self) {
        self.update(|c| c.with_status(StatusFilter::Revise).with_view(ViewMode::List));
    }

    pub fn show_starred(&mut self) {
        self.update(|c| c.with_status(StatusFilter::Starred).with_view(ViewMode::List));
    }

    pub fn reset_filters(&mut self) {
        self.update(|c| {
            c.with_difficulty(DifficultyFilter::All)
                .with_status(StatusFilter::All)
                .with_sort(SortKey::Priority)
        });
    }

    /// 进入全量搜索：主题置为 all 并切到列表；查询过短返回 false
    pub fn begin_full_search(&mut self, query: &str) -> bool {
        if search::normalize_query(query).is_none() {
            return false;
        }
        info!(query, "full search");
        self.update(|c| c.with_topic(TopicFilter::All).with_view(ViewMode::List));
        true
    }

    pub fn on_toggle_tag(&mut self, id: &QuestionId, tag: Tag) -> Result<bool, StoreError> {
        let value = self.progress.toggle(id, tag)?;
        self.notify();
        Ok(value)
    }

    pub fn on_search(&self, query: &str) -> Option<SearchPreview<'_>> {
        search::preview(self.repo.questions(), query)
    }

    pub fn full_search(&self, query: &str) -> Option<FullSearch<'_>> {
        search::full(self.repo.questions(), query)
    }

    pub fn visible(&self) -> Vec<&Question> {
        filter::apply(self.repo.questions(), &self.criteria, &self.progress)
    }

    pub fn list_view(&self) -> Vec<TopicBucket<'_>> {
        let filtered = self.visible();
        sort::arrange(
            &filtered,
            &self.criteria.topic,
            self.criteria.sort,
            &self.progress,
        )
    }

    pub fn topic_cards(&self) -> Vec<TopicCard> {
        topics::topic_cards(self.repo.questions())
    }

    pub fn sidebar(&self, groups: &[TopicGroup]) -> Vec<SidebarGroup> {
        topics::sidebar(&self.repo, groups)
    }

    pub fn stats(&self) -> ProgressStats {
        self.progress.stats()
    }

    pub fn active_filters(&self) -> ActiveFilters {
        let c = &self.criteria;
        if !c.has_active_filters() {
            return ActiveFilters {
                labels: vec![],
                no_match: false,
            };
        }
        let mut labels = vec![];
        if let DifficultyFilter::Only(d) = &c.difficulty {
            labels.push(d.clone());
        }
        if c.status != StatusFilter::All {
            labels.push(c.status.as_str().to_string());
        }
        let no_match =
            filter::apply_ignoring_query(self.repo.questions(), c, &self.progress).is_empty();
        ActiveFilters { labels, no_match }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::q;
    use std::{cell::RefCell, rc::Rc};

    fn browser() -> Browser {
        let repo = Repository::from_questions(vec![
            q(1, "Java", "What is JVM?", "Basic", 5),
            q(2, "Java", "Explain GC", "Advanced", 2),
            q(3, "SQL", "What is a JOIN?", "Basic", 4),
        ])
        .unwrap();
        Browser::new(repo, ProgressStore::in_memory(), FilterCriteria::default())
    }

    fn ids(buckets: &[TopicBucket<'_>]) -> Vec<QuestionId> {
        buckets
            .iter()
            .flat_map(|b| b.questions.iter().map(|q| q.id.clone()))
            .collect()
    }

    #[test]
    fn listeners_see_every_change_once() {
        let mut b = browser();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        b.subscribe(move |c| sink.borrow_mut().push(c.view));
        b.select_topic("Java");
        b.select_topic("Java");
        b.set_view(ViewMode::Cards);
        assert_eq!(*seen.borrow(), vec![ViewMode::List, ViewMode::Cards]);
        assert_eq!(b.criteria().topic, TopicFilter::All);
    }

    #[test]
    fn topic_list_sorted_by_priority() {
        let mut b = browser();
        b.select_topic("Java");
        assert_eq!(b.criteria().view, ViewMode::List);
        let buckets = b.list_view();
        assert_eq!(buckets.len(), 1);
        assert_eq!(ids(&buckets), vec![QuestionId::Num(1), QuestionId::Num(2)]);
    }

    #[test]
    fn toggling_notifies_and_updates_status_views() {
        let mut b = browser();
        let hits = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&hits);
        b.subscribe(move |_| *sink.borrow_mut() += 1);
        b.on_toggle_tag(&QuestionId::Num(1), Tag::Starred).unwrap();
        assert_eq!(*hits.borrow(), 1);
        b.show_starred();
        assert_eq!(ids(&b.list_view()), vec![QuestionId::Num(1)]);
        assert_eq!(b.stats().starred, 1);
    }

    #[test]
    fn high_priority_action_sets_sort_and_topic() {
        let mut b = browser();
        b.update(|c| c.with_sort(SortKey::Alphabetical));
        b.show_high_priority("SQL");
        assert_eq!(b.criteria().sort, SortKey::Priority);
        assert_eq!(b.criteria().topic, TopicFilter::parse("SQL"));
        assert_eq!(b.criteria().view, ViewMode::List);
    }

    #[test]
    fn high_priority_notifies_once() {
        let mut b = browser();
        b.update(|c| c.with_sort(SortKey::Alphabetical));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        b.subscribe(move |c| sink.borrow_mut().push((c.sort, c.view)));
        b.show_high_priority("SQL");
        assert_eq!(*seen.borrow(), vec![(SortKey::Priority, ViewMode::List)]);
    }

    #[test]
    fn reset_clears_difficulty_status_and_sort() {
        let mut b = browser();
        b.update(|c| {
            c.with_difficulty(DifficultyFilter::parse("Advanced"))
                .with_status(StatusFilter::Done)
                .with_sort(SortKey::Id)
        });
        b.reset_filters();
        let c = b.criteria();
        assert_eq!(c.difficulty, DifficultyFilter::All);
        assert_eq!(c.status, StatusFilter::All);
        assert_eq!(c.sort, SortKey::Priority);
    }

    #[test]
    fn active_filters_warn_when_nothing_matches() {
        let mut b = browser();
        assert!(b.active_filters().labels.is_empty());
        b.update(|c| c.with_status(StatusFilter::Done));
        let af = b.active_filters();
        assert_eq!(af.labels, vec!["done".to_string()]);
        assert!(af.no_match);
        b.on_toggle_tag(&QuestionId::Num(3), Tag::Done).unwrap();
        assert!(!b.active_filters().no_match);
    }

    #[test]
    fn full_search_resets_topic_and_ignores_filters() {
        let mut b = browser();
        b.select_topic("SQL");
        b.update(|c| c.with_difficulty(DifficultyFilter::parse("Advanced")));
        assert!(!b.begin_full_search("w"));
        assert!(b.begin_full_search("what"));
        assert_eq!(b.criteria().topic, TopicFilter::All);
        let full = b.full_search("what").unwrap();
        assert_eq!(full.total, 2);
        let topics: Vec<&str> = full.buckets.iter().map(|b| b.topic).collect();
        assert_eq!(topics, vec!["Java", "SQL"]);
    }

    #[test]
    fn preview_searches_the_whole_repository() {
        let mut b = browser();
        b.select_topic("SQL");
        let p = b.on_search("jvm").unwrap();
        assert_eq!(p.total, 1);
        assert_eq!(p.topic_count, 1);
    }
}
