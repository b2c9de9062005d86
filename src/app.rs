// ---------------- 界面状态与按键处理 ----------------
// 这里只维护光标、焦点、弹窗等纯界面状态；筛选条件和进度都交给 Browser。
use std::{
    cell::Cell,
    collections::HashSet,
    rc::Rc,
    time::{Duration, Instant},
};

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

use crate::{
    config::{Config, KeyAction},
    controller::Browser,
    criteria::{StatusFilter, ViewMode},
    debounce::{Debouncer, FILTER_QUIET, PREVIEW_QUIET},
    model::QuestionId,
    progress::Tag,
    search,
    theme::Theme,
    topics::TopicCard,
};

/// 没有待触发的去抖时，事件循环的轮询间隔
pub const TICK: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Main,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarRow {
    AllTopics { count: usize },
    Group { name: String, collapsed: bool },
    Topic { topic: String, count: usize },
    RevisionQueue,
    Starred,
    ResetFilters,
    Progress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MainRow {
    Card(TopicCard),
    Heading {
        topic: String,
        count: usize,
        noun: &'static str,
    },
    Question(QuestionId),
    Empty(String),
}

impl MainRow {
    fn is_selectable(&self) -> bool {
        matches!(self, Self::Card(_) | Self::Question(_))
    }
}

pub struct SearchBox {
    pub textarea: TextArea<'static>,
    pub active: bool,
    /// 预览下拉中选中的条目
    pub selected: Option<usize>,
    /// 去抖后用于预览的查询
    pub preview_query: Option<String>,
    filter_debounce: Debouncer,
    preview_debounce: Debouncer,
}

impl SearchBox {
    fn new() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("Search questions, answers, topics…");
        Self {
            textarea,
            active: false,
            selected: None,
            preview_query: None,
            filter_debounce: Debouncer::new(FILTER_QUIET),
            preview_debounce: Debouncer::new(PREVIEW_QUIET),
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join(" ")
    }

    fn clear(&mut self) {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("Search questions, answers, topics…");
        self.textarea = textarea;
        self.selected = None;
        self.preview_query = None;
        self.filter_debounce.cancel();
        self.preview_debounce.cancel();
    }
}

/// 详情弹窗：在打开时的列表里前后翻
#[derive(Debug, Clone)]
pub struct Detail {
    pub ids: Vec<QuestionId>,
    pub pos: usize,
}

impl Detail {
    pub fn current(&self) -> Option<&QuestionId> {
        self.ids.get(self.pos)
    }
}

pub struct App {
    pub browser: Browser,
    pub config: Config,
    pub theme: Theme,
    pub focus: Focus,
    pub sidebar_rows: Vec<SidebarRow>,
    pub sidebar_state: ListState,
    pub main_rows: Vec<MainRow>,
    pub main_state: ListState,
    pub search: SearchBox,
    pub full_search: Option<String>,
    pub detail: Option<Detail>,
    pub show_progress: bool,
    pub status: Option<String>,
    collapsed: HashSet<String>,
    dirty: Rc<Cell<bool>>,
}

impl App {
    pub fn new(mut browser: Browser, config: Config, theme: Theme) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        browser.subscribe(move |_| flag.set(true));
        let mut app = Self {
            browser,
            config,
            theme,
            focus: Focus::Main,
            sidebar_rows: vec![],
            sidebar_state: ListState::default(),
            main_rows: vec![],
            main_state: ListState::default(),
            search: SearchBox::new(),
            full_search: None,
            detail: None,
            show_progress: false,
            status: None,
            collapsed: HashSet::new(),
            dirty,
        };
        app.rebuild_sidebar();
        app.sidebar_state.select(Some(0));
        app.sync();
        app
    }

    // ------------- 视图数据重建 -------------

    fn rebuild_sidebar(&mut self) {
        let mut rows = vec![SidebarRow::AllTopics {
            count: self.browser.repo().len(),
        }];
        for group in self.browser.sidebar(&self.config.groups) {
            let collapsed = self.collapsed.contains(&group.name);
            rows.push(SidebarRow::Group {
                name: group.name.clone(),
                collapsed,
            });
            if !collapsed {
                rows.extend(group.entries.into_iter().map(|e| SidebarRow::Topic {
                    topic: e.topic,
                    count: e.count,
                }));
            }
        }
        rows.extend([
            SidebarRow::RevisionQueue,
            SidebarRow::Starred,
            SidebarRow::ResetFilters,
            SidebarRow::Progress,
        ]);
        self.sidebar_rows = rows;
        let n = self.sidebar_rows.len();
        if let Some(sel) = self.sidebar_state.selected() {
            self.sidebar_state.select(Some(sel.min(n - 1)));
        }
    }

    /// 条件或进度变化后重建主区
    pub fn sync(&mut self) {
        if self.dirty.replace(false) {
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        let rows: Vec<MainRow> = if let Some(query) = &self.full_search {
            match self.browser.full_search(query) {
                Some(found) if found.total > 0 => found
                    .buckets
                    .iter()
                    .flat_map(|b| {
                        std::iter::once(MainRow::Heading {
                            topic: b.topic.to_string(),
                            count: b.questions.len(),
                            noun: "matches",
                        })
                        .chain(b.questions.iter().map(|q| MainRow::Question(q.id.clone())))
                    })
                    .collect(),
                _ => vec![MainRow::Empty(format!(
                    "No questions found for \"{}\"",
                    query
                ))],
            }
        } else {
            match self.browser.criteria().view {
                ViewMode::Cards => self
                    .browser
                    .topic_cards()
                    .into_iter()
                    .map(MainRow::Card)
                    .collect(),
                ViewMode::List => {
                    let buckets = self.browser.list_view();
                    if buckets.is_empty() {
                        vec![MainRow::Empty(
                            "No questions found matching your criteria.".into(),
                        )]
                    } else {
                        buckets
                            .iter()
                            .flat_map(|b| {
                                std::iter::once(MainRow::Heading {
                                    topic: b.topic.to_string(),
                                    count: b.questions.len(),
                                    noun: "questions",
                                })
                                .chain(
                                    b.questions.iter().map(|q| MainRow::Question(q.id.clone())),
                                )
                            })
                            .collect()
                    }
                }
            }
        };
        self.main_rows = rows;
        let keep = self
            .main_state
            .selected()
            .filter(|&i| self.main_rows.get(i).is_some_and(MainRow::is_selectable));
        self.main_state.select(keep.or_else(|| self.first_selectable()));
    }

    fn first_selectable(&self) -> Option<usize> {
        self.main_rows.iter().position(MainRow::is_selectable)
    }

    // ------------- 选择 -------------

    fn move_main(&mut self, delta: isize) {
        let n = self.main_rows.len() as isize;
        let mut i = match self.main_state.selected() {
            Some(i) => i as isize,
            None => {
                self.main_state.select(self.first_selectable());
                return;
            }
        };
        loop {
            i += delta;
            if i < 0 || i >= n {
                return;
            }
            if self.main_rows[i as usize].is_selectable() {
                self.main_state.select(Some(i as usize));
                return;
            }
        }
    }

    fn move_sidebar(&mut self, delta: isize) {
        let n = self.sidebar_rows.len();
        if n == 0 {
            return;
        }
        let cur = self.sidebar_state.selected().unwrap_or(0) as isize;
        let next = (cur + delta).clamp(0, n as isize - 1);
        self.sidebar_state.select(Some(next as usize));
    }

    fn selected_main(&self) -> Option<&MainRow> {
        self.main_state.selected().and_then(|i| self.main_rows.get(i))
    }

    fn main_question_ids(&self) -> Vec<QuestionId> {
        self.main_rows
            .iter()
            .filter_map(|r| match r {
                MainRow::Question(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// 标记操作的目标：详情页优先，否则主区选中题
    fn tag_target(&self) -> Option<QuestionId> {
        if let Some(d) = &self.detail {
            return d.current().cloned();
        }
        match self.selected_main() {
            Some(MainRow::Question(id)) if self.focus == Focus::Main => Some(id.clone()),
            _ => None,
        }
    }

    /// 搜索框激活且为空时，下拉里显示建议查询
    pub fn showing_suggestions(&self) -> bool {
        self.search.active
            && self.search.text().trim().is_empty()
            && !self.config.suggestions.is_empty()
    }

    fn dropdown_len(&self) -> usize {
        if self.showing_suggestions() {
            self.config.suggestions.len()
        } else {
            self.preview_ids().len()
        }
    }

    pub fn preview_ids(&self) -> Vec<QuestionId> {
        self.search
            .preview_query
            .as_deref()
            .and_then(|q| self.browser.on_search(q))
            .map(|p| p.top.iter().map(|q| q.id.clone()).collect())
            .unwrap_or_default()
    }

    // ------------- 意图 -------------

    /// 改筛选条件会退出全量搜索结果
    fn change(&mut self, f: impl FnOnce(&mut Browser)) {
        f(&mut self.browser);
        if self.full_search.take().is_some() {
            self.dirty.set(true);
        }
    }

    fn toggle_tag(&mut self, tag: Tag) {
        let Some(id) = self.tag_target() else {
            return;
        };
        match self.browser.on_toggle_tag(&id, tag) {
            Ok(value) => {
                self.status = Some(format!(
                    "#{} {} {} · saved {}",
                    id,
                    tag,
                    if value { "on" } else { "off" },
                    Local::now().format("%H:%M:%S")
                ));
            }
            Err(err) => {
                warn!(%id, %tag, error = %err, "failed to persist progress");
                self.status = Some(format!("save failed: {}", err));
            }
        }
    }

    fn open_detail(&mut self, ids: Vec<QuestionId>, id: &QuestionId) {
        let pos = ids.iter().position(|x| x == id).unwrap_or(0);
        if !ids.is_empty() {
            self.detail = Some(Detail { ids, pos });
        }
    }

    fn high_priority_topic(&self) -> Option<String> {
        match self.selected_main() {
            Some(MainRow::Card(card)) => return Some(card.topic.clone()),
            Some(MainRow::Question(id)) => {
                if let Some(q) = self.browser.repo().get(id) {
                    return Some(q.topic.clone());
                }
            }
            _ => {}
        }
        self.browser
            .criteria()
            .topic
            .as_topic()
            .map(str::to_string)
    }

    fn clear_search(&mut self) {
        self.search.clear();
        self.change(|b| b.on_query_changed(""));
    }

    pub fn apply_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::ToggleDone => self.toggle_tag(Tag::Done),
            KeyAction::ToggleRevise => self.toggle_tag(Tag::Revise),
            KeyAction::ToggleStar => self.toggle_tag(Tag::Starred),
            KeyAction::CycleSort => self.change(|b| {
                b.update(|c| {
                    let next = c.sort.next();
                    c.with_sort(next)
                })
            }),
            KeyAction::CycleDifficulty => self.change(|b| {
                b.update(|c| {
                    let next = c.difficulty.next();
                    c.with_difficulty(next)
                })
            }),
            KeyAction::CycleStatus => self.change(|b| {
                b.update(|c| {
                    let next = c.status.next();
                    c.with_status(next)
                })
            }),
            KeyAction::ToggleView => {
                let next = match self.browser.criteria().view {
                    ViewMode::Cards => ViewMode::List,
                    ViewMode::List => ViewMode::Cards,
                };
                self.change(|b| b.set_view(next));
            }
            KeyAction::ShowRevision => {
                self.change(Browser::show_revision_queue);
                self.focus = Focus::Main;
            }
            KeyAction::ShowStarred => {
                self.change(Browser::show_starred);
                self.focus = Focus::Main;
            }
            KeyAction::ResetFilters => self.change(Browser::reset_filters),
            KeyAction::ShowProgress => self.show_progress = true,
            KeyAction::HighPriority => {
                if let Some(topic) = self.high_priority_topic() {
                    self.change(|b| b.show_high_priority(&topic));
                    self.focus = Focus::Main;
                }
            }
            KeyAction::OpenSearch => {
                self.search.active = true;
                self.search.selected = None;
            }
            KeyAction::ClearSearch => self.clear_search(),
        }
        self.sync();
    }

    fn activate_sidebar(&mut self) {
        let Some(row) = self
            .sidebar_state
            .selected()
            .and_then(|i| self.sidebar_rows.get(i))
            .cloned()
        else {
            return;
        };
        match row {
            SidebarRow::AllTopics { .. } => self.change(Browser::select_all_topics),
            SidebarRow::Group { name, .. } => {
                if !self.collapsed.remove(&name) {
                    self.collapsed.insert(name);
                }
                self.rebuild_sidebar();
                return;
            }
            SidebarRow::Topic { topic, .. } => self.change(|b| b.select_topic(&topic)),
            SidebarRow::RevisionQueue => self.apply_action(KeyAction::ShowRevision),
            SidebarRow::Starred => self.apply_action(KeyAction::ShowStarred),
            SidebarRow::ResetFilters => self.apply_action(KeyAction::ResetFilters),
            SidebarRow::Progress => {
                self.show_progress = true;
                return;
            }
        }
        self.focus = Focus::Main;
    }

    fn activate_main(&mut self) {
        match self.selected_main().cloned() {
            Some(MainRow::Card(card)) => self.change(|b| b.select_topic(&card.topic)),
            Some(MainRow::Question(id)) => {
                let ids = self.main_question_ids();
                self.open_detail(ids, &id);
            }
            _ => {}
        }
    }

    // ------------- 按键 -------------

    /// 返回 true 表示退出
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if self.show_progress {
            self.show_progress = false;
            return false;
        }
        if self.search.active {
            self.handle_search_key(key, now);
            return false;
        }
        if self.detail.is_some() {
            self.handle_detail_key(key);
            return false;
        }
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Main,
                    Focus::Main => Focus::Sidebar,
                };
            }
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Sidebar => self.move_sidebar(1),
                Focus::Main => self.move_main(1),
            },
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Sidebar => self.move_sidebar(-1),
                Focus::Main => self.move_main(-1),
            },
            KeyCode::Enter => match self.focus {
                Focus::Sidebar => self.activate_sidebar(),
                Focus::Main => self.activate_main(),
            },
            KeyCode::Esc => {
                if self.full_search.take().is_some() {
                    self.dirty.set(true);
                }
            }
            KeyCode::Char(ch) => {
                if let Some(action) = self.config.keymap.get(&ch).copied() {
                    self.apply_action(action);
                }
            }
            _ => {}
        }
        self.sync();
        false
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.detail = None,
            KeyCode::Left | KeyCode::Char('h') => detail.pos = detail.pos.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => {
                if detail.pos + 1 < detail.ids.len() {
                    detail.pos += 1;
                }
            }
            KeyCode::Char(ch) => match self.config.keymap.get(&ch).copied() {
                Some(KeyAction::ToggleDone) => self.toggle_tag(Tag::Done),
                Some(KeyAction::ToggleRevise) => self.toggle_tag(Tag::Revise),
                Some(KeyAction::ToggleStar) => self.toggle_tag(Tag::Starred),
                Some(KeyAction::ShowProgress) => self.show_progress = true,
                _ => {}
            },
            _ => {}
        }
        self.sync();
    }

    fn handle_search_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc => {
                self.search.active = false;
                self.search.selected = None;
            }
            KeyCode::Enter if self.showing_suggestions() => {
                let picked = self
                    .search
                    .selected
                    .and_then(|i| self.config.suggestions.get(i).cloned());
                match picked {
                    Some(query) => self.apply_suggestion(&query, now),
                    None => self.run_full_search(),
                }
            }
            KeyCode::Enter => {
                let picked = self
                    .search
                    .selected
                    .and_then(|i| self.preview_ids().get(i).cloned());
                if let Some(id) = picked {
                    let ids = self.preview_ids();
                    self.open_detail(ids, &id);
                    self.search.active = false;
                } else {
                    self.run_full_search();
                }
            }
            KeyCode::Down => {
                let n = self.dropdown_len();
                if n > 0 {
                    self.search.selected = Some(match self.search.selected {
                        Some(i) => (i + 1).min(n - 1),
                        None => 0,
                    });
                }
            }
            KeyCode::Up => {
                self.search.selected = match self.search.selected {
                    Some(0) | None => None,
                    Some(i) => Some(i - 1),
                };
            }
            KeyCode::Backspace => {
                if self.search.textarea.delete_char() {
                    self.on_search_edited(now);
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.search.textarea.delete_line_by_head();
                self.on_search_edited(now);
            }
            KeyCode::Char(ch) => {
                self.search.textarea.insert_char(ch);
                self.on_search_edited(now);
            }
            _ => {}
        }
        self.sync();
    }

    /// 建议项直接填入搜索框，预览立即可见
    fn apply_suggestion(&mut self, query: &str, now: Instant) {
        self.search.textarea.delete_line_by_head();
        self.search.textarea.delete_line_by_end();
        self.search.textarea.insert_str(query);
        self.on_search_edited(now);
        self.search.preview_debounce.cancel();
        self.search.preview_query = search::normalize_query(query).map(str::to_string);
        debug!(query, "search suggestion applied");
    }

    fn on_search_edited(&mut self, now: Instant) {
        self.search.selected = None;
        self.search.filter_debounce.schedule(now);
        self.search.preview_debounce.schedule(now);
    }

    fn run_full_search(&mut self) {
        let query = self.search.text();
        if !self.browser.begin_full_search(&query) {
            self.status = Some(format!(
                "type at least {} characters to search",
                search::MIN_QUERY_CHARS
            ));
            return;
        }
        info!(query = %query.trim(), "showing all search results");
        self.search.filter_debounce.cancel();
        self.search.preview_debounce.cancel();
        self.search.active = false;
        self.full_search = Some(query.trim().to_string());
        self.focus = Focus::Main;
        self.main_state.select(None);
        self.dirty.set(true);
    }

    /// 事件循环每轮调用：触发到期的去抖任务
    pub fn tick(&mut self, now: Instant) {
        if self.search.filter_debounce.fire(now) {
            let text = self.search.text();
            // 列表过滤使用原始输入（不去空白），与搜索框内容一致
            self.change(|b| b.on_query_changed(&text));
        }
        if self.search.preview_debounce.fire(now) {
            let text = self.search.text();
            self.search.preview_query = search::normalize_query(&text).map(str::to_string);
        }
        self.sync();
    }

    pub fn poll_timeout(&self, now: Instant) -> Duration {
        [
            self.search.filter_debounce.time_left(now),
            self.search.preview_debounce.time_left(now),
        ]
        .into_iter()
        .flatten()
        .fold(TICK, Duration::min)
    }

    // ------------- 展示用的派生数据 -------------

    pub fn title(&self) -> (String, String) {
        if let Some(q) = &self.full_search {
            let total = self.browser.full_search(q).map_or(0, |f| f.total);
            return (format!("Search: \"{}\"", q), format!("{} results found", total));
        }
        let c = self.browser.criteria();
        match (c.view, c.status, c.topic.as_topic()) {
            (ViewMode::Cards, ..) => (
                "All Topics".into(),
                "Browse by topic or search for specific questions".into(),
            ),
            (ViewMode::List, StatusFilter::Revise, None) => (
                "Revision Queue".into(),
                "Questions marked for revision".into(),
            ),
            (ViewMode::List, StatusFilter::Starred, None) => (
                "Starred Questions".into(),
                "Your bookmarked questions".into(),
            ),
            (ViewMode::List, _, Some(topic)) => (
                topic.to_string(),
                format!("{} questions", self.browser.repo().count_in_topic(topic)),
            ),
            (ViewMode::List, _, None) => (
                "All Topics".into(),
                format!("{} questions", self.browser.visible().len()),
            ),
        }
    }

    pub fn sidebar_is_active(&self, row: &SidebarRow) -> bool {
        let topic = &self.browser.criteria().topic;
        match row {
            SidebarRow::AllTopics { .. } => topic.as_topic().is_none(),
            SidebarRow::Topic { topic: t, .. } => topic.as_topic() == Some(t.as_str()),
            _ => false,
        }
    }
}
