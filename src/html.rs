//! HTML painting of history tables and the page around them

use std::fmt::Write;

use crate::page::Page;
use crate::render::{CellContent, TableModel};

/// Marker class for centered header cells
const CENTERED_CLASS: &str = "text-center";

/// Paint a table model as a `<table>` element.
pub fn render_table(model: &TableModel) -> String {
    let mut html = String::from(r#"<table id="history-table" class="history">"#);
    html.push_str("<thead><tr>");
    for cell in &model.header {
        let class = if cell.centered {
            format!(r#" class="{CENTERED_CLASS}""#)
        } else {
            String::new()
        };
        let label = cell.label.map(|tick| tick.to_string()).unwrap_or_default();
        let _ = write!(html, "<th{class}>{label}</th>");
    }
    html.push_str("</tr></thead><tbody>");

    for row in &model.rows {
        let _ = write!(html, "<tr><td>{}</td>", html_escape(&row.team_name));
        for cell in &row.cells {
            html.push_str("<td");
            if let Some(class) = &cell.class {
                let _ = write!(html, r#" class="{}""#, html_escape(class));
            }
            if let Some(tooltip) = &cell.tooltip {
                let _ = write!(html, r#" title="{}""#, html_escape(tooltip));
            }
            html.push('>');
            if let CellContent::Link { href } = &cell.content {
                let _ = write!(
                    html,
                    r#"<a href="{}" target="_blank" rel="noopener">&nbsp;</a>"#,
                    html_escape(href)
                );
            }
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// Paint the whole page: service selector, range inputs, buttons and table.
pub fn render_page(page: &Page) -> String {
    let table = match &page.table {
        Some(model) => render_table(model),
        None => r#"<table id="history-table" class="history" hidden><thead><tr></tr></thead><tbody></tbody></table>"#
            .to_string(),
    };
    let updated = page
        .updated_at
        .map(|t| format!("Last updated {}", t.format("%Y-%m-%d %H:%M:%S UTC")))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Service History</title>
    <style>{css}</style>
</head>
<body>
    <form method="post" action="/select">
        <input type="text" name="service" value="{selector}" placeholder="service">
        <button type="submit">Show</button>
    </form>
    <h2 id="selected-service">{service_name}</h2>
    <form method="post" action="/range">
        <input type="number" name="min-tick" value="{min_tick}">
        <input type="number" name="max-tick" value="{max_tick}">
        <button type="submit">Apply</button>
    </form>
    <form method="post" action="/refresh"><button type="submit">Refresh</button></form>
    <form method="post" action="/current"><button type="submit">Load current</button></form>
    {table}
    <p class="updated">{updated}</p>
</body>
</html>"#,
        css = inline_css(),
        selector = html_escape(&page.inputs.selector),
        service_name = html_escape(&page.service_name),
        min_tick = html_escape(&page.inputs.min_tick),
        max_tick = html_escape(&page.inputs.max_tick),
        table = table,
        updated = updated,
    )
}

fn inline_css() -> &'static str {
    r#"
body { font-family: system-ui, sans-serif; margin: 1rem; }
table.history { border-collapse: collapse; }
table.history td, table.history th { border: 1px solid #dee2e6; padding: 0.1rem 0.3rem; min-width: 1rem; }
table.history td a { display: block; text-decoration: none; }
.text-center { text-align: center; }
.success { background-color: #d4edda; }
.danger { background-color: #f8d7da; }
.warning { background-color: #fff3cd; }
.info { background-color: #d1ecf1; }
.active { background-color: #e2e3e5; }
.updated { color: #6c757d; font-size: 0.85em; }
"#
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
