// ---------------- 主题与样式 ----------------
use clap::ValueEnum;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeKind {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub bar_bg: Color,
    pub selection_bg: Color,
    pub mark_bg: Color,
    pub good: Color,
    pub warn: Color,
    pub danger: Color,
    pub star: Color,
}

impl Theme {
    /// Basic 绿 / Intermediate 黄 / Advanced 红
    pub fn difficulty(&self, difficulty: &str) -> Color {
        match difficulty {
            "Basic" => self.good,
            "Intermediate" => self.warn,
            "Advanced" => self.danger,
            _ => self.muted,
        }
    }
}

pub fn theme_of(kind: ThemeKind) -> Theme {
    match kind {
        ThemeKind::Dark => Theme {
            fg: Color::Rgb(222, 224, 230),
            muted: Color::Rgb(128, 134, 146),
            accent: Color::Rgb(129, 140, 248),
            bar_bg: Color::Rgb(30, 32, 44),
            selection_bg: Color::Rgb(55, 58, 80),
            mark_bg: Color::Rgb(76, 70, 140),
            good: Color::Rgb(74, 222, 128),
            warn: Color::Rgb(251, 191, 36),
            danger: Color::Rgb(248, 113, 113),
            star: Color::Rgb(250, 204, 21),
        },
        ThemeKind::Light => Theme {
            fg: Color::Rgb(28, 30, 38),
            muted: Color::Rgb(110, 114, 128),
            accent: Color::Rgb(79, 70, 229),
            bar_bg: Color::Rgb(238, 240, 248),
            selection_bg: Color::Rgb(214, 218, 240),
            mark_bg: Color::Rgb(199, 210, 254),
            good: Color::Rgb(22, 163, 74),
            warn: Color::Rgb(202, 138, 4),
            danger: Color::Rgb(220, 38, 38),
            star: Color::Rgb(202, 138, 4),
        },
    }
}
