//! Status page showing the loaded configuration.

use ghia_config::ServerConfig;
use std::fmt::Write;

const STYLES: &str = r"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 2rem; color: #24292e; }
        h1 { font-size: 1.6rem; }
        table { border-collapse: collapse; margin-top: 1rem; }
        th, td { border: 1px solid #e1e4e8; padding: 0.4rem 0.8rem; text-align: left; vertical-align: top; }
        th { background: #f6f8fa; }
        code { background: #f6f8fa; padding: 0 0.2rem; }
        .muted { color: #6a737d; }
";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the status page. Credentials are never included.
#[must_use]
pub fn render_status(config: &ServerConfig) -> String {
    let mut rows = String::new();
    for assignee in config.rules.assignees() {
        let rules = assignee
            .rules
            .iter()
            .map(|r| format!("<code>{}</code>", escape(&r.to_string())))
            .collect::<Vec<_>>()
            .join("<br>");
        let _ = writeln!(
            rows,
            "            <tr><td>{}</td><td>{}</td></tr>",
            escape(&assignee.login),
            if rules.is_empty() {
                "<span class=\"muted\">no rules</span>".to_string()
            } else {
                rules
            }
        );
    }
    if rows.is_empty() {
        rows.push_str("            <tr><td colspan=\"2\" class=\"muted\">no assignment rules</td></tr>\n");
    }

    let fallback = config.rules.fallback().map_or_else(
        || "<span class=\"muted\">no fallback label</span>".to_string(),
        |f| {
            let removal = if f.remove_when_assigned {
                " (removed once assigned)"
            } else {
                ""
            };
            format!("<code>{}</code>{removal}", escape(&f.label))
        },
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>ghia - GitHub Issue Auto-Assigner</title>
    <style>{STYLES}</style>
</head>
<body>
    <h1>GitHub Issue Auto-Assigner</h1>
    <p>Running as GitHub user <strong>{user}</strong>.</p>
    <p>Fallback label: {fallback}</p>
    <table>
        <thead><tr><th>Assignee</th><th>Rules</th></tr></thead>
        <tbody>
{rows}        </tbody>
    </table>
</body>
</html>
"#,
        user = escape(&config.user),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
