//! Turns a fetched service history into a table model
//!
//! Rendering is a pure transformation; putting the model on screen is the
//! job of a [`crate::page::Display`].

use reqwest::Url;
use serde::Serialize;

use crate::config::{LogSearchConfig, StatusClasses};
use crate::{ServiceHistory, StatusCode};

/// Widest tick span that still gets a label on every column.
const DENSE_LABEL_SPAN: i64 = 30;
/// Label spacing for wider spans.
const SPARSE_LABEL_INTERVAL: i64 = 5;

const PLACEHOLDERS: [&str; 3] = ["{service}", "{team}", "{tick}"];

/// Everything needed to paint one history table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableModel {
    pub service_name: String,
    pub service_slug: String,
    pub min_tick: i64,
    pub max_tick: i64,
    /// Leading blank cell followed by one cell per tick.
    pub header: Vec<HeaderCell>,
    pub rows: Vec<RowModel>,
}

impl TableModel {
    /// Number of tick columns, excluding the team name column.
    pub fn tick_columns(&self) -> usize {
        self.header.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCell {
    pub label: Option<i64>,
    pub centered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowModel {
    pub team_id: i64,
    pub team_name: String,
    pub cells: Vec<CellModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellModel {
    pub tick: i64,
    pub status: StatusCode,
    pub tooltip: Option<String>,
    pub class: Option<String>,
    pub content: CellContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellContent {
    /// Nothing to link to.
    Placeholder,
    /// Deep link into the log search tool, opened in a new browsing context.
    Link { href: String },
}

/// Label spacing for a tick range.
pub fn label_interval(min_tick: i64, max_tick: i64) -> i64 {
    if max_tick.saturating_sub(min_tick) <= DENSE_LABEL_SPAN {
        1
    } else {
        SPARSE_LABEL_INTERVAL
    }
}

/// Builds the table model for a document.
///
/// Fails only when the document violates its own shape (see
/// [`ServiceHistory::validate`]).
pub fn render(
    history: &ServiceHistory,
    classes: &StatusClasses,
    log_search: &LogSearchConfig,
) -> crate::Result<TableModel> {
    history.validate()?;

    let interval = label_interval(history.min_tick, history.max_tick);
    let header = std::iter::once(HeaderCell {
        label: None,
        centered: true,
    })
    .chain(history.ticks().map(|tick| HeaderCell {
        label: (tick.rem_euclid(interval) == 0).then_some(tick),
        centered: true,
    }))
    .collect();

    let links = history
        .graylog_search_url
        .as_deref()
        .and_then(|template| LinkTemplate::new(template, log_search.relative_seconds));

    let rows = history
        .teams
        .iter()
        .map(|team| RowModel {
            team_id: team.id,
            team_name: team.name.clone(),
            cells: history
                .ticks()
                .zip(&team.checks)
                .map(|(tick, &status)| CellModel {
                    tick,
                    status,
                    tooltip: history.status_descriptions.get(status).map(str::to_string),
                    class: status
                        .is_checked()
                        .then(|| classes.get(status))
                        .flatten()
                        .map(str::to_string),
                    content: links
                        .as_ref()
                        .and_then(|l| l.build(&history.service_slug, team.id, tick))
                        .map_or(CellContent::Placeholder, |href| CellContent::Link { href }),
                })
                .collect(),
        })
        .collect();

    tracing::debug!(
        "Rendered {} teams over ticks {}..={} (label interval {})",
        history.teams.len(),
        history.min_tick,
        history.max_tick,
        interval
    );

    Ok(TableModel {
        service_name: history.service_name.clone(),
        service_slug: history.service_slug.clone(),
        min_tick: history.min_tick,
        max_tick: history.max_tick,
        header,
        rows,
    })
}

/// Log search URL template.
///
/// `{service}`, `{team}` and `{tick}` in the template are replaced by the
/// cell's values. Templates without any placeholder get them appended as query
/// parameters instead. The relative search window is always appended.
#[derive(Debug, Clone)]
pub struct LinkTemplate {
    template: String,
    relative_seconds: u64,
    substitutes: bool,
}

impl LinkTemplate {
    /// Returns `None` when the template does not form a valid URL.
    pub fn new(template: &str, relative_seconds: u64) -> Option<Self> {
        let link = Self {
            template: template.to_string(),
            relative_seconds,
            substitutes: PLACEHOLDERS.iter().any(|p| template.contains(p)),
        };
        if link.build("service", 0, 0).is_none() {
            tracing::warn!("Ignoring unparseable log search URL {:?}", template);
            return None;
        }
        Some(link)
    }

    pub fn build(&self, service_slug: &str, team_id: i64, tick: i64) -> Option<String> {
        let team = team_id.to_string();
        let tick = tick.to_string();

        let mut url = if self.substitutes {
            let filled = self
                .template
                .replace("{service}", service_slug)
                .replace("{team}", &team)
                .replace("{tick}", &tick);
            Url::parse(&filled).ok()?
        } else {
            Url::parse(&self.template).ok()?
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("relative", &self.relative_seconds.to_string());
            if !self.substitutes {
                query
                    .append_pair("service", service_slug)
                    .append_pair("team", &team)
                    .append_pair("tick", &tick);
            }
        }

        Some(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StatusDescriptions, Team};

    fn descriptions() -> StatusDescriptions {
        [
            (StatusCode::NOT_CHECKED, "not checked"),
            (StatusCode(0), "OK"),
            (StatusCode(1), "down"),
            (StatusCode(2), "faulty"),
        ]
        .into_iter()
        .map(|(code, d)| (code, d.to_string()))
        .collect()
    }

    fn history(min_tick: i64, max_tick: i64, teams: Vec<Team>) -> ServiceHistory {
        ServiceHistory {
            service_name: "Web Shop".to_string(),
            service_slug: "webshop".to_string(),
            min_tick,
            max_tick,
            status_descriptions: descriptions(),
            graylog_search_url: None,
            teams,
        }
    }

    fn team(id: i64, checks: &[i32]) -> Team {
        Team {
            id,
            name: format!("Team {id}"),
            checks: checks.iter().copied().map(StatusCode).collect(),
        }
    }

    fn render_default(history: &ServiceHistory) -> TableModel {
        render(history, &StatusClasses::default(), &LogSearchConfig::default()).unwrap()
    }

    #[test]
    fn narrow_range_labels_every_tick() {
        let model = render_default(&history(0, 30, vec![]));

        assert_eq!(model.header.len(), 32);
        assert_eq!(model.header[0].label, None);
        for (cell, tick) in model.header[1..].iter().zip(0..=30) {
            assert_eq!(cell.label, Some(tick));
        }
        assert!(model.header.iter().all(|c| c.centered));
    }

    #[test]
    fn wide_range_labels_every_fifth_tick() {
        let model = render_default(&history(3, 34, vec![]));

        assert_eq!(model.header.len(), 33);
        let labeled: Vec<i64> = model.header.iter().filter_map(|c| c.label).collect();
        assert_eq!(labeled, vec![5, 10, 15, 20, 25, 30]);
        assert!(model.header.iter().all(|c| c.centered));
    }

    #[test]
    fn label_interval_boundary() {
        assert_eq!(label_interval(0, 30), 1);
        assert_eq!(label_interval(0, 31), 5);
        assert_eq!(label_interval(100, 100), 1);
    }

    #[test]
    fn header_and_row_lengths_follow_tick_range() {
        let model = render_default(&history(
            7,
            11,
            vec![team(1, &[0, 0, 1, 0, 0]), team(2, &[-1, -1, -1, 2, 0])],
        ));

        assert_eq!(model.header.len(), 6);
        assert_eq!(model.tick_columns(), 5);
        assert_eq!(model.rows.len(), 2);
        for row in &model.rows {
            assert_eq!(row.cells.len(), model.tick_columns());
            let ticks: Vec<i64> = row.cells.iter().map(|c| c.tick).collect();
            assert_eq!(ticks, vec![7, 8, 9, 10, 11]);
        }
        assert_eq!(model.rows[0].team_name, "Team 1");
        assert_eq!(model.rows[1].team_id, 2);
    }

    #[test]
    fn status_classes_follow_mapping() {
        let checks = [-1, 0, 1, -1, 2, 0, 0, 1, -1, 0, 2];
        let model = render_default(&history(0, 10, vec![team(5, &checks)]));
        let cells = &model.rows[0].cells;

        assert_eq!(cells.len(), 11);
        for position in [0, 3, 8] {
            assert_eq!(cells[position].class, None, "position {position}");
        }
        let classes = StatusClasses::default();
        for (cell, code) in cells.iter().zip(checks) {
            if code != -1 {
                assert_eq!(cell.class.as_deref(), classes.get(StatusCode(code)));
            }
        }
        assert_eq!(cells[1].class.as_deref(), Some("success"));
        assert_eq!(cells[2].class.as_deref(), Some("danger"));
        assert_eq!(cells[4].class.as_deref(), Some("warning"));
    }

    #[test]
    fn substituted_class_mapping() {
        let classes: StatusClasses = [(StatusCode(0), "up".to_string())].into_iter().collect();
        let model = render(
            &history(0, 2, vec![team(1, &[0, 1, -1])]),
            &classes,
            &LogSearchConfig::default(),
        )
        .unwrap();
        let cells = &model.rows[0].cells;

        assert_eq!(cells[0].class.as_deref(), Some("up"));
        assert_eq!(cells[1].class, None);
        assert_eq!(cells[2].class, None);
    }

    #[test]
    fn tooltips_come_from_descriptions() {
        let model = render_default(&history(0, 3, vec![team(1, &[-1, 0, 2, 9])]));
        let tooltips: Vec<Option<&str>> = model.rows[0]
            .cells
            .iter()
            .map(|c| c.tooltip.as_deref())
            .collect();

        assert_eq!(
            tooltips,
            vec![Some("not checked"), Some("OK"), Some("faulty"), None]
        );
    }

    #[test]
    fn no_template_renders_placeholders() {
        let model = render_default(&history(0, 4, vec![team(1, &[0, 1, 2, 0, -1])]));

        assert!(model.rows[0]
            .cells
            .iter()
            .all(|c| c.content == CellContent::Placeholder));
    }

    #[test]
    fn template_with_placeholders_is_substituted() {
        let mut doc = history(4, 5, vec![team(42, &[0, 1])]);
        doc.graylog_search_url = Some(
            "https://logs.example.org/search?q=service:{service}%20AND%20team:{team}%20AND%20tick:{tick}"
                .to_string(),
        );
        let model = render(&doc, &StatusClasses::default(), &LogSearchConfig { relative_seconds: 300 })
            .unwrap();

        match &model.rows[0].cells[1].content {
            CellContent::Link { href } => {
                assert!(href.starts_with("https://logs.example.org/search?"), "{href}");
                assert!(href.contains("service:webshop"), "{href}");
                assert!(href.contains("team:42"), "{href}");
                assert!(href.contains("tick:5"), "{href}");
                assert!(href.ends_with("&relative=300"), "{href}");
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn template_without_placeholders_gets_query_parameters() {
        let link = LinkTemplate::new("https://logs.example.org/search", 0).unwrap();
        assert_eq!(
            link.build("webshop", 3, 17).unwrap(),
            "https://logs.example.org/search?relative=0&service=webshop&team=3&tick=17"
        );
    }

    #[test]
    fn unparseable_template_renders_placeholders() {
        let mut doc = history(0, 1, vec![team(1, &[0, 0])]);
        doc.graylog_search_url = Some("not a url".to_string());
        let model = render_default(&doc);

        assert!(model.rows[0]
            .cells
            .iter()
            .all(|c| c.content == CellContent::Placeholder));
    }

    #[test]
    fn empty_range_renders_only_team_names() {
        let model = render_default(&history(0, -1, vec![team(1, &[])]));

        assert_eq!(model.header.len(), 1);
        assert_eq!(model.rows.len(), 1);
        assert!(model.rows[0].cells.is_empty());
    }

    #[test]
    fn mismatched_checks_fail_to_render() {
        let result = render(
            &history(0, 2, vec![team(1, &[0, 0])]),
            &StatusClasses::default(),
            &LogSearchConfig::default(),
        );
        assert!(matches!(result, Err(crate::ViewerError::InvalidDocument(_))));
    }
}
