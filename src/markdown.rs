use crate::stats::ProfileStats;
use crate::svg::Theme;

/// Companion document: embeds the themed cards and repeats the numbers as a
/// table for readers that do not load images.
pub fn generate_markdown(stats: &ProfileStats) -> String {
    let rows = [
        ("Repositories", stats.repositories.to_string()),
        ("Stars", stats.stars.to_string()),
        ("Commits (this year)", stats.commits.to_string()),
        ("Pull requests", stats.pull_requests.to_string()),
        ("Issues", stats.issues.to_string()),
        ("Followers", stats.followers.to_string()),
        ("Following", stats.following.to_string()),
        (
            "Current streak",
            format!("{} day{}", stats.streak, if stats.streak == 1 { "" } else { "s" }),
        ),
        ("Lines of code (estimated)", stats.lines_of_code.to_string()),
    ];

    let mut out = format!("# {}\n\n", escape_markdown(&stats.name));
    out.push_str(&format!("> {}\n\n", escape_markdown(&stats.bio)));

    out.push_str("<picture>\n");
    out.push_str(&format!(
        "  <source media=\"(prefers-color-scheme: dark)\" srcset=\"{}\">\n",
        Theme::Dark.file_name()
    ));
    out.push_str(&format!(
        "  <source media=\"(prefers-color-scheme: light)\" srcset=\"{}\">\n",
        Theme::Light.file_name()
    ));
    out.push_str(&format!(
        "  <img alt=\"{}'s GitHub stats\" src=\"{}\">\n",
        crate::svg::escape_xml(&stats.username),
        Theme::Light.file_name()
    ));
    out.push_str("</picture>\n\n");

    out.push_str("| Stat | Value |\n|---|---|\n");
    for (label, value) in rows {
        out.push_str(&format!("| {label} | {value} |\n"));
    }

    out.push_str(&format!(
        "\n_Member for {}. Lines of code are an estimate derived from the repository count._\n",
        stats.member_for
    ));

    out
}

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}
