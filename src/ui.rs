// ---------------- 渲染 ----------------
use std::path::Path;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    answer::{answer_blocks, AnswerBlock},
    app::{App, Focus, MainRow, SidebarRow},
    config::KeyAction,
    model::{Question, QuestionId},
    progress::Tag,
    search::Highlighter,
    theme::Theme,
    topics::TopicCard,
};

const SIDEBAR_WIDTH: u16 = 30;

pub fn ui(f: &mut Frame, app: &mut App) {
    // 顶栏 + 主区 + 底栏
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());
    let h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(v[1]);
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(h[1]);

    draw_header(f, v[0], app);
    draw_sidebar(f, h[0], app);
    draw_search_bar(f, main[0], app);
    draw_title(f, main[1], app);
    draw_main(f, main[2], app);
    draw_footer(f, v[2], app);

    if app.search.active {
        draw_preview(f, main[0], main[2], app);
    }
    if app.detail.is_some() {
        draw_detail(f, app);
    }
    if app.show_progress {
        draw_progress(f, app);
    }
}

/// 数据加载失败时的整屏提示
pub fn draw_failure(f: &mut Frame, th: &Theme, path: &Path, error: &str) {
    let area = centered_rect(70, 40, f.area());
    let block = Block::default()
        .title(Span::styled(
            " Failed to load questions ",
            Style::default().fg(th.danger).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(th.danger));
    let lines = vec![
        Line::from(Span::styled(
            format!("File: {}", path.display()),
            Style::default().fg(th.fg),
        )),
        Line::from(""),
        Line::from(Span::styled(error.to_string(), Style::default().fg(th.warn))),
        Line::from(""),
        Line::from(Span::styled(
            "Check the file or pass --file <path>. Press q to quit.",
            Style::default().fg(th.muted),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}

/// 按显示宽度截断，超出部分用 … 表示
fn truncate(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut w = 0;
    for ch in s.chars() {
        let cw = ch.width().unwrap_or(0);
        if w + cw + 1 > max {
            break;
        }
        w += cw;
        out.push(ch);
    }
    out.push('…');
    out
}

/// 某个动作当前绑定的键，用于提示
fn key_for(app: &App, action: KeyAction) -> String {
    let mut keys: Vec<char> = app
        .config
        .keymap
        .iter()
        .filter(|(_, a)| **a == action)
        .map(|(k, _)| *k)
        .collect();
    keys.sort_unstable();
    keys.first().map(|k| k.to_string()).unwrap_or_else(|| "-".into())
}

fn highlighted(text: &str, hl: &Highlighter, base: Style, th: &Theme) -> Vec<Span<'static>> {
    hl.segments(text)
        .into_iter()
        .map(|(seg, hit)| {
            if hit {
                Span::styled(
                    seg.to_string(),
                    base.bg(th.mark_bg).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(seg.to_string(), base)
            }
        })
        .collect()
}

fn tag_badges(app: &App, id: &QuestionId) -> Vec<Span<'static>> {
    let th = app.theme;
    let tag = app.browser.progress().get(id);
    let badge = |on: bool, icon: &'static str, color| {
        if on {
            Span::styled(icon, Style::default().fg(color))
        } else {
            Span::styled("·", Style::default().fg(th.muted))
        }
    };
    vec![
        badge(tag.done, "✓", th.good),
        badge(tag.revise, "↻", th.warn),
        badge(tag.starred, "★", th.star),
    ]
}

// ------------- 顶栏 / 底栏 -------------

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    f.render_widget(
        Block::default()
            .borders(Borders::NONE)
            .style(Style::default().bg(th.bar_bg)),
        area,
    );
    let repo = app.browser.repo();
    let c = app.browser.criteria();
    let stats = app.browser.stats();
    let segs = vec![
        Span::styled(
            " PrepMaster ",
            Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | questions:", Style::default().fg(th.muted)),
        Span::styled(repo.len().to_string(), Style::default().fg(th.fg)),
        Span::styled(" | high priority:", Style::default().fg(th.muted)),
        Span::styled(
            repo.high_priority_count().to_string(),
            Style::default().fg(th.star),
        ),
        Span::styled(" | done:", Style::default().fg(th.muted)),
        Span::styled(
            format!("{}/{}", stats.completed, repo.len()),
            Style::default().fg(th.good),
        ),
        Span::styled(" | sort:", Style::default().fg(th.muted)),
        Span::styled(c.sort.to_string(), Style::default().fg(th.fg)),
        Span::styled(" | difficulty:", Style::default().fg(th.muted)),
        Span::styled(c.difficulty.label().to_string(), Style::default().fg(th.fg)),
        Span::styled(" | status:", Style::default().fg(th.muted)),
        Span::styled(c.status.to_string(), Style::default().fg(th.fg)),
        Span::styled(" | view:", Style::default().fg(th.muted)),
        Span::styled(c.view.as_str(), Style::default().fg(th.fg)),
    ];
    f.render_widget(
        Paragraph::new(Line::from(segs)).style(Style::default().bg(th.bar_bg)),
        area,
    );
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let line = match &app.status {
        Some(msg) => Line::from(Span::styled(format!(" {}", msg), Style::default().fg(th.fg))),
        None => {
            let tips = format!(
                " [q]quit [Tab]focus [j/k]move [Enter]open [{}]search [{}]clear  \
                 [{}/{}/{}]done/revise/star  [{}]sort [{}]difficulty [{}]status [{}]view \
                 [{}]high priority  [{}]progress ",
                key_for(app, KeyAction::OpenSearch),
                key_for(app, KeyAction::ClearSearch),
                key_for(app, KeyAction::ToggleDone),
                key_for(app, KeyAction::ToggleRevise),
                key_for(app, KeyAction::ToggleStar),
                key_for(app, KeyAction::CycleSort),
                key_for(app, KeyAction::CycleDifficulty),
                key_for(app, KeyAction::CycleStatus),
                key_for(app, KeyAction::ToggleView),
                key_for(app, KeyAction::HighPriority),
                key_for(app, KeyAction::ShowProgress),
            );
            Line::from(Span::styled(tips, Style::default().fg(th.muted)))
        }
    };
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(th.bar_bg)),
        area,
    );
}

// ------------- 侧栏 -------------

fn draw_sidebar(f: &mut Frame, area: Rect, app: &mut App) {
    let th = app.theme;
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);
    let stats = app.browser.stats();
    let inner_w = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .sidebar_rows
        .iter()
        .map(|row| {
            let active = app.sidebar_is_active(row);
            let style = if active {
                Style::default().fg(th.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(th.fg)
            };
            let line = match row {
                SidebarRow::AllTopics { count } => Line::from(vec![
                    Span::styled("All Topics", style),
                    Span::styled(format!(" ({})", count), Style::default().fg(th.muted)),
                ]),
                SidebarRow::Group { name, collapsed } => Line::from(Span::styled(
                    format!("{} {}", if *collapsed { "▸" } else { "▾" }, name),
                    Style::default().fg(th.muted).add_modifier(Modifier::BOLD),
                )),
                SidebarRow::Topic { topic, count } => {
                    let count = count.to_string();
                    let name = truncate(topic, inner_w.saturating_sub(count.len() + 3));
                    let pad = inner_w
                        .saturating_sub(UnicodeWidthStr::width(name.as_str()) + count.len() + 2);
                    Line::from(vec![
                        Span::styled(format!("  {}", name), style),
                        Span::raw(" ".repeat(pad)),
                        Span::styled(count, Style::default().fg(th.muted)),
                    ])
                }
                SidebarRow::RevisionQueue => Line::from(vec![
                    Span::styled("↻ Revision Queue", Style::default().fg(th.warn)),
                    Span::styled(format!(" ({})", stats.revise), Style::default().fg(th.muted)),
                ]),
                SidebarRow::Starred => Line::from(vec![
                    Span::styled("★ Starred", Style::default().fg(th.star)),
                    Span::styled(format!(" ({})", stats.starred), Style::default().fg(th.muted)),
                ]),
                SidebarRow::ResetFilters => {
                    Line::from(Span::styled("⟲ Reset Filters", Style::default().fg(th.fg)))
                }
                SidebarRow::Progress => {
                    Line::from(Span::styled("◔ My Progress", Style::default().fg(th.fg)))
                }
            };
            ListItem::new(line)
        })
        .collect();

    let border = if app.focus == Focus::Sidebar {
        th.accent
    } else {
        th.muted
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(Span::styled(" Topics ", Style::default().fg(th.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .highlight_style(Style::default().bg(th.selection_bg).fg(th.fg))
        .highlight_symbol("▸ ");
    f.render_stateful_widget(list, parts[0], &mut app.sidebar_state);

    let total = app.browser.repo().len();
    let pct = stats.percent_of(total);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.muted)),
        )
        .gauge_style(Style::default().fg(th.good).bg(th.bar_bg))
        .ratio((pct / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.1}% complete", pct));
    f.render_widget(gauge, parts[1]);
}

// ------------- 主区 -------------

fn draw_search_bar(f: &mut Frame, area: Rect, app: &mut App) {
    let th = app.theme;
    let border = if app.search.active { th.accent } else { th.muted };
    app.search.textarea.set_block(
        Block::default()
            .title(Span::styled(" Search ", Style::default().fg(th.accent)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    app.search.textarea.set_cursor_line_style(Style::default());
    app.search.textarea.set_cursor_style(if app.search.active {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });
    f.render_widget(&app.search.textarea, area);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let (title, subtitle) = app.title();
    let mut lines = vec![Line::from(Span::styled(
        title,
        Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
    ))];
    let mut sub = vec![Span::styled(subtitle, Style::default().fg(th.muted))];
    if app.full_search.is_none() {
        let active = app.browser.active_filters();
        if !active.labels.is_empty() {
            sub.push(Span::styled("   Filters: ", Style::default().fg(th.muted)));
            sub.push(Span::styled(
                active.labels.join(" · "),
                Style::default().fg(th.fg),
            ));
        }
        lines.push(Line::from(sub));
        if active.no_match {
            lines.push(Line::from(Span::styled(
                "No questions match these filters",
                Style::default().fg(th.warn),
            )));
        }
    } else {
        lines.push(Line::from(sub));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::NONE)),
        area.inner(ratatui::layout::Margin::new(1, 0)),
    );
}

fn card_item(card: &TopicCard, th: &Theme) -> ListItem<'static> {
    ListItem::new(vec![
        Line::from(vec![
            Span::styled(
                card.topic.clone(),
                Style::default().fg(th.fg).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} questions", card.total),
                Style::default().fg(th.muted),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("  Basic {}", card.basic), Style::default().fg(th.good)),
            Span::styled(
                format!("  Intermediate {}", card.intermediate),
                Style::default().fg(th.warn),
            ),
            Span::styled(
                format!("  Advanced {}", card.advanced),
                Style::default().fg(th.danger),
            ),
            Span::styled(
                format!("  ★ {} high priority", card.high_priority),
                Style::default().fg(th.star),
            ),
            Span::styled(
                format!("  avg priority {:.1}", card.avg_priority),
                Style::default().fg(th.muted),
            ),
        ]),
    ])
}

fn question_item(app: &App, q: &Question, hl: &Highlighter) -> ListItem<'static> {
    let th = app.theme;
    let mut spans = tag_badges(app, &q.id);
    spans.push(Span::styled(
        format!(" {:<5}", q.stars()),
        Style::default().fg(th.star),
    ));
    spans.push(Span::styled(
        format!(" {:<12}", q.difficulty),
        Style::default().fg(th.difficulty(&q.difficulty)),
    ));
    spans.push(Span::styled(
        format!("#{:<5} ", q.id),
        Style::default().fg(th.muted),
    ));
    spans.extend(highlighted(&q.question, hl, Style::default().fg(th.fg), &th));
    ListItem::new(Line::from(spans))
}

fn draw_main(f: &mut Frame, area: Rect, app: &mut App) {
    let th = app.theme;
    let query = match &app.full_search {
        Some(q) => q.clone(),
        None => app.browser.criteria().query.trim().to_string(),
    };
    let hl = Highlighter::new(&query);
    let items: Vec<ListItem> = app
        .main_rows
        .iter()
        .map(|row| match row {
            MainRow::Card(card) => card_item(card, &th),
            MainRow::Heading { topic, count, noun } => ListItem::new(Line::from(vec![
                Span::styled(
                    topic.clone(),
                    Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" ({} {})", count, noun), Style::default().fg(th.muted)),
            ])),
            MainRow::Question(id) => match app.browser.repo().get(id) {
                Some(q) => question_item(app, q, &hl),
                None => ListItem::new(Line::from(format!("#{}", id))),
            },
            MainRow::Empty(msg) => ListItem::new(Line::from(Span::styled(
                msg.clone(),
                Style::default().fg(th.muted),
            ))),
        })
        .collect();

    let border = if app.focus == Focus::Main {
        th.accent
    } else {
        th.muted
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .highlight_style(
            Style::default()
                .bg(th.selection_bg)
                .fg(th.fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    f.render_stateful_widget(list, area, &mut app.main_state);
}

// ------------- 弹窗 -------------

fn draw_preview(f: &mut Frame, search_area: Rect, below: Rect, app: &App) {
    let th = app.theme;
    let width = search_area.width.saturating_sub(4) as usize;
    if app.showing_suggestions() {
        let mut lines = vec![Line::from(Span::styled(
            "Try searching for",
            Style::default().fg(th.muted),
        ))];
        lines.extend(app.config.suggestions.iter().enumerate().map(|(i, s)| {
            let style = if app.search.selected == Some(i) {
                Style::default().fg(th.fg).bg(th.selection_bg)
            } else {
                Style::default().fg(th.accent)
            };
            let text = truncate(s, width.saturating_sub(2));
            Line::from(Span::styled(format!("  {}", text), style))
        }));
        render_dropdown(f, search_area, below, lines, &th);
        return;
    }
    let Some(query) = app.search.preview_query.as_deref() else {
        return;
    };
    let Some(preview) = app.browser.on_search(query) else {
        return;
    };
    let hl = Highlighter::new(query);
    let mut lines: Vec<Line> = vec![];
    if preview.total == 0 {
        lines.push(Line::from(Span::styled(
            "No results found",
            Style::default().fg(th.muted),
        )));
    }
    for (i, q) in preview.top.iter().enumerate() {
        let selected = app.search.selected == Some(i);
        let base = if selected {
            Style::default().fg(th.fg).bg(th.selection_bg)
        } else {
            Style::default().fg(th.fg)
        };
        let topic = format!("[{}] ", q.topic);
        let text = truncate(&q.question, width.saturating_sub(topic.len()));
        let mut spans = vec![Span::styled(topic, base.fg(th.accent))];
        spans.extend(highlighted(&text, &hl, base, &th));
        lines.push(Line::from(spans));
    }
    if preview.total > 0 {
        let footer = if preview.has_more() {
            format!(
                "View all {} results in {} topics  [Enter]",
                preview.total, preview.topic_count
            )
        } else {
            format!("{} results  [Enter] view all", preview.total)
        };
        lines.push(Line::from(Span::styled(footer, Style::default().fg(th.muted))));
    }
    render_dropdown(f, search_area, below, lines, &th);
}

fn render_dropdown(f: &mut Frame, search_area: Rect, below: Rect, lines: Vec<Line>, th: &Theme) {
    let height = (lines.len() as u16 + 2).min(below.height);
    let area = Rect {
        x: search_area.x,
        y: below.y,
        width: search_area.width,
        height,
    };
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.accent)),
        ),
        area,
    );
}

fn draw_detail(f: &mut Frame, app: &App) {
    let th = app.theme;
    let Some(detail) = app.detail.as_ref() else {
        return;
    };
    let Some(q) = detail.current().and_then(|id| app.browser.repo().get(id)) else {
        return;
    };
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<5}", q.stars()), Style::default().fg(th.star)),
            Span::raw("  "),
            Span::styled(
                q.difficulty.clone(),
                Style::default().fg(th.difficulty(&q.difficulty)),
            ),
            Span::raw("  "),
            Span::styled(q.topic.clone(), Style::default().fg(th.muted)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            q.question.clone(),
            Style::default().fg(th.fg).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for block in answer_blocks(&q.answer) {
        match block {
            AnswerBlock::Text(text) => {
                let style = Style::default().fg(th.fg);
                lines.extend(
                    text.lines()
                        .map(|l| Line::from(Span::styled(l.to_string(), style))),
                );
            }
            AnswerBlock::Code(code) => {
                let style = Style::default().fg(th.accent).bg(th.bar_bg);
                lines.extend(
                    code.lines()
                        .map(|l| Line::from(Span::styled(format!("  {}", l), style))),
                );
            }
        }
    }
    if let (Some(link), Some(label)) = (q.link(), q.link_label()) {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", label), Style::default().fg(th.muted)),
            Span::styled(
                link.to_string(),
                Style::default()
                    .fg(th.accent)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ]));
    }

    let tag = app.browser.progress().get(&q.id);
    let tag_span = |t: Tag, action: KeyAction, color| {
        let on = tag.get(t);
        Span::styled(
            format!(
                " [{}] {} {} ",
                key_for(app, action),
                t,
                if on { "●" } else { "○" }
            ),
            if on {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(th.muted)
            },
        )
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        tag_span(Tag::Done, KeyAction::ToggleDone, th.good),
        tag_span(Tag::Revise, KeyAction::ToggleRevise, th.warn),
        tag_span(Tag::Starred, KeyAction::ToggleStar, th.star),
    ]));

    let title = format!(
        " #{} · {} of {}  [←/→] prev/next  [Esc] close ",
        q.id,
        detail.pos + 1,
        detail.ids.len()
    );
    let para = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(title, Style::default().fg(th.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(th.accent)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn draw_progress(f: &mut Frame, app: &App) {
    let th = app.theme;
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(" My Progress ", Style::default().fg(th.accent)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(th.accent));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let total = app.browser.repo().len();
    let stats = app.browser.stats();
    let pct = stats.percent_of(total);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);
    let lines = vec![
        Line::from(Span::styled(
            format!("Completed: {}/{} ({:.1}%)", stats.completed, total, pct),
            Style::default().fg(th.good),
        )),
        Line::from(Span::styled(
            format!("To revise: {}", stats.revise),
            Style::default().fg(th.warn),
        )),
        Line::from(Span::styled(
            format!("Starred: {}", stats.starred),
            Style::default().fg(th.star),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(th.muted),
        )),
    ];
    f.render_widget(Paragraph::new(lines), parts[0]);
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(th.good).bg(th.bar_bg))
            .ratio((pct / 100.0).clamp(0.0, 1.0))
            .label(format!("{:.1}%", pct)),
        parts[1],
    );
}
