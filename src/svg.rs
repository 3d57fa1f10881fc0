use crate::stats::ProfileStats;

const START_Y: i32 = 30;
const LINE_HEIGHT: i32 = 20;
const LEFT_PADDING: f32 = 15.0;
const RIGHT_PADDING: f32 = 30.0;
const BOTTOM_PADDING: f32 = 20.0;
const CHAR_WIDTH: f32 = 9.6;
const MIN_COLUMN_CHARS: usize = 50;
const MAX_VALUE_CHARS: usize = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

pub struct ThemeColors {
    pub bg: &'static str,
    pub text: &'static str,
    pub key: &'static str,
    pub value: &'static str,
    pub cc: &'static str,
    pub accent: &'static str,
}

impl Theme {
    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Dark => ThemeColors {
                bg: "#161b22",
                text: "#c9d1d9",
                key: "#ffa657",
                value: "#a5d6ff",
                cc: "#616e7f",
                accent: "#3fb950",
            },
            Theme::Light => ThemeColors {
                bg: "#ffffff",
                text: "#24292f",
                key: "#d73a49",
                value: "#0366d6",
                cc: "#6a737d",
                accent: "#1a7f37",
            },
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Theme::Dark => "dark_mode.svg",
            Theme::Light => "light_mode.svg",
        }
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Split a row into key, dot leader and value so the values line up at
/// `align_width` characters.
pub fn build_stat_row(key: &str, value: &str, align_width: usize) -> (String, String, String) {
    let key_part = format!("{key}: ");
    let base_len = key_part.chars().count() + value.chars().count();
    let available = align_width.saturating_sub(base_len);

    let dots = match available {
        0 => "".to_string(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => format!(" {} ", ".".repeat(n - 2)),
    };

    (key_part, dots, value.to_string())
}

fn build_header_line(label: &str, align_width: usize) -> String {
    let base = format!("{label} ");
    let dash_count = align_width.saturating_sub(base.chars().count()) + 2;
    format!("{base}{}", "-".repeat(dash_count))
}

/// Collapse all whitespace (including newlines) to single spaces and cut the
/// text at `MAX_VALUE_CHARS`, so free-form profile text stays on one row.
fn single_line(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_VALUE_CHARS {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(MAX_VALUE_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}

enum Line {
    Header(String),
    Blank,
    Stat { key: &'static str, value: String },
    /// Value drawn in the accent color (streak, estimates).
    Highlight { key: &'static str, value: String },
}

fn card_lines(stats: &ProfileStats) -> Vec<Line> {
    use Line::*;

    let stat = |key, value: String| Stat { key, value };

    vec![
        Header(format!("{}@github", stats.username)),
        stat("Name", single_line(&stats.name)),
        stat("Location", single_line(&stats.location)),
        stat("Company", single_line(&stats.company)),
        stat("Blog", single_line(&stats.blog)),
        stat("Member for", stats.member_for.clone()),
        Blank,
        stat("Bio", single_line(&stats.bio)),
        Blank,
        Header("- GitHub Stats".to_string()),
        stat("Repos", stats.repositories.to_string()),
        stat("Stars", stats.stars.to_string()),
        stat("Commits (this year)", stats.commits.to_string()),
        stat("Pull Requests", stats.pull_requests.to_string()),
        stat("Issues", stats.issues.to_string()),
        stat(
            "Followers",
            format!("{} (Following: {})", stats.followers, stats.following),
        ),
        Highlight {
            key: "Streak",
            value: format!("{} day{}", stats.streak, if stats.streak == 1 { "" } else { "s" }),
        },
        Highlight {
            key: "LoC (estimated)",
            value: stats.lines_of_code.to_string(),
        },
    ]
}

/// Render the profile card for one theme.
pub fn generate_svg(stats: &ProfileStats, theme: Theme) -> String {
    let colors = theme.colors();
    let lines = card_lines(stats);

    let align_width = lines
        .iter()
        .filter_map(|line| match line {
            Line::Stat { key, value } | Line::Highlight { key, value } => {
                Some(key.chars().count() + 2 + value.chars().count())
            }
            _ => None,
        })
        .max()
        .unwrap_or(0)
        .max(MIN_COLUMN_CHARS);

    let mut tspans = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = START_Y + (i as i32) * LINE_HEIGHT;

        match line {
            Line::Blank => {}
            Line::Header(label) => {
                tspans.push_str(&format!(
                    "<tspan x=\"{LEFT_PADDING}\" y=\"{y}\">{}</tspan>\n",
                    escape_xml(&build_header_line(label, align_width))
                ));
            }
            Line::Stat { key, value } | Line::Highlight { key, value } => {
                let class = if matches!(line, Line::Highlight { .. }) {
                    "accent"
                } else {
                    "value"
                };
                let (k, d, v) = build_stat_row(key, value, align_width);
                tspans.push_str(&format!(
                    r#"<tspan x="{LEFT_PADDING}" y="{y}" class="cc">. </tspan><tspan class="key">{}</tspan><tspan class="cc">{}</tspan><tspan class="{class}">{}</tspan>
"#,
                    escape_xml(&k),
                    escape_xml(&d),
                    escape_xml(&v)
                ));
            }
        }
    }

    let w = LEFT_PADDING + (align_width as f32 + 2.0) * CHAR_WIDTH + RIGHT_PADDING;
    let h = START_Y as f32 + (lines.len() as f32 - 1.0) * LINE_HEIGHT as f32 + BOTTOM_PADDING;

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{w}px" height="{h}px"
     font-family="ConsolasFallback,Consolas,monospace"
     font-size="16px">

<style>
.key    {{ fill: {key}; }}
.value  {{ fill: {value}; }}
.cc     {{ fill: {cc}; }}
.accent {{ fill: {accent}; }}
</style>

<rect width="{w}px" height="{h}px" fill="{bg}" rx="15"/>

<text fill="{text}" xml:space="preserve">
{tspans}</text>

</svg>
"#,
        bg = colors.bg,
        text = colors.text,
        key = colors.key,
        value = colors.value,
        cc = colors.cc,
        accent = colors.accent,
    )
}
