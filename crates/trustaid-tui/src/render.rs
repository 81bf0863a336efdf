//! Transcript renderers.
//!
//! Everything here is a pure function from transcript data to styled lines;
//! layout and scrolling live in `ui`.

use ratatui::{
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use trustaid_core::format::{format_cell, format_date, format_number, format_percent, project_rows};
use trustaid_core::{
    ChatEntry, ChatRole, Chart, ChartType, Confidence, Dataset, EntryAction, Evidence,
    NavigatorPayload, Payload, Step, Table, TrustbotPayload,
};

const MAX_COLUMN_WIDTH: usize = 24;
const MAX_BAR_WIDTH: f64 = 30.0;
const MAX_LABEL_WIDTH: usize = 20;
const MAX_SNIPPET_WIDTH: usize = 100;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn heading() -> Style {
    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
}

/// Parse a line of text and convert **bold** markdown to styled spans
pub fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        match after.find("**") {
            Some(end) if end > 0 => {
                if start > 0 {
                    spans.push(Span::raw(rest[..start].to_string()));
                }
                spans.push(Span::styled(
                    after[..end].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after[end + 2..];
            }
            // No closing marker: keep the rest literally
            _ => break,
        }
    }
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

fn text_lines(text: &str) -> Vec<Line<'static>> {
    text.lines().map(parse_markdown_line).collect()
}

/// All lines for one transcript entry, including the role label and a trailing blank.
pub fn entry_lines(entry: &ChatEntry) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match entry.role {
        ChatRole::User => {
            lines.push(Line::from(Span::styled("You:", Style::default().fg(Color::Cyan).bold())));
            lines.extend(text_lines(&entry.content));
        }
        ChatRole::System => {
            for line in entry.content.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    dim().add_modifier(Modifier::ITALIC),
                )));
            }
        }
        ChatRole::Assistant => {
            lines.push(Line::from(Span::styled(
                "TrustAid:",
                Style::default().fg(Color::Yellow).bold(),
            )));
            lines.extend(assistant_body(entry));
            if let Some(EntryAction::ShowSteps { prompt }) = &entry.action {
                lines.push(Line::from(vec![
                    Span::styled(" s ", Style::default().bg(Color::DarkGray).fg(Color::White)),
                    Span::styled(format!(" {}", prompt), dim()),
                ]));
            }
        }
    }

    lines.push(Line::default());
    lines
}

fn assistant_body(entry: &ChatEntry) -> Vec<Line<'static>> {
    match &entry.payload {
        None | Some(Payload::Error { .. }) => text_lines(&entry.content),
        Some(Payload::Navigator(nav)) => navigator_lines(nav, &entry.content),
        Some(Payload::Trustbot(tb)) => trustbot_lines(tb, &entry.content),
        Some(Payload::Unknown { kind, raw }) => unknown_lines(kind, raw, &entry.content),
    }
}

pub fn navigator_lines(nav: &NavigatorPayload, fallback: &str) -> Vec<Line<'static>> {
    let mut lines = match nav.answer.as_deref().filter(|a| !a.trim().is_empty()) {
        Some(answer) => text_lines(answer),
        // The fallback text already carries the numbered steps
        None if nav.steps.is_empty() => text_lines(fallback),
        None => Vec::new(),
    };

    if !nav.steps.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Steps", heading())));
        lines.extend(steps_lines(&nav.steps));
    }

    if !nav.evidence.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Sources", heading())));
        lines.extend(evidence_lines(&nav.evidence));
    }

    lines.extend(footer_lines(nav.confidence.as_ref(), nav.audit_id.as_deref()));
    lines
}

pub fn steps_lines(steps: &[Step]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        let mut spans = vec![
            Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(step.title.clone()),
        ];
        if let Some(deadline) = &step.deadline {
            spans.push(Span::styled(
                format!("  (due: {})", deadline),
                Style::default().fg(Color::LightRed),
            ));
        }
        lines.push(Line::from(spans));
        if let Some(link) = &step.link {
            lines.push(Line::from(Span::styled(
                format!("    {}", link),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            )));
        }
    }
    lines
}

pub fn evidence_lines(evidence: &[Evidence]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for item in evidence {
        let mut spans = vec![Span::raw(" • "), Span::styled(item.title.clone(), Style::default().bold())];
        if let Some(source) = &item.source {
            spans.push(Span::styled(format!(" ({})", source), dim()));
        }
        if let Some(updated) = &item.updated {
            spans.push(Span::styled(format!("  updated {}", format_date(updated)), dim()));
        }
        if let Some(score) = item.score {
            spans.push(Span::styled(format!("  match {}", format_percent(score)), dim()));
        }
        lines.push(Line::from(spans));
        if let Some(url) = &item.url {
            lines.push(Line::from(Span::styled(
                format!("   {}", url),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            )));
        }
        if let Some(snippet) = item.snippet.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let flat = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
            lines.push(Line::from(Span::styled(
                format!("   \"{}\"", truncate(&flat, MAX_SNIPPET_WIDTH)),
                dim().add_modifier(Modifier::ITALIC),
            )));
        }
    }
    lines
}

pub fn trustbot_lines(tb: &TrustbotPayload, fallback: &str) -> Vec<Line<'static>> {
    let answer = tb.answer.as_deref().filter(|a| !a.trim().is_empty()).unwrap_or(fallback);
    let mut lines = text_lines(answer);

    if let Some(dataset) = &tb.dataset {
        if let Some(line) = dataset_line(dataset) {
            lines.push(line);
        }
    }

    if let Some(table) = &tb.table {
        lines.push(Line::default());
        lines.extend(table_lines(table));
    }

    if let (Some(chart), Some(table)) = (&tb.chart, &tb.table) {
        let chart_lines = chart_lines(chart, table);
        if !chart_lines.is_empty() {
            lines.push(Line::default());
            lines.extend(chart_lines);
        }
    }

    if let Some(sql) = &tb.sql {
        lines.push(Line::default());
        lines.extend(sql_lines(sql));
    }

    lines.extend(footer_lines(tb.confidence.as_ref(), tb.audit_id.as_deref()));
    lines
}

fn dataset_line(dataset: &Dataset) -> Option<Line<'static>> {
    let mut parts = Vec::new();
    if let Some(name) = &dataset.name {
        parts.push(name.clone());
    }
    if let Some(period) = &dataset.period {
        parts.push(format!("period {}", period));
    }
    if let Some(updated) = &dataset.last_updated {
        parts.push(format!("updated {}", format_date(updated)));
    }
    if parts.is_empty() {
        return None;
    }
    Some(Line::from(Span::styled(format!("Dataset: {}", parts.join(" · ")), dim())))
}

/// Cut `text` to at most `width` terminal columns, ending in `…` when shortened.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    let len = text.width();
    let fill = " ".repeat(width.saturating_sub(len));
    if right_align {
        format!("{}{}", fill, text)
    } else {
        format!("{}{}", text, fill)
    }
}

/// Aligned text table. Numeric columns are right-aligned.
pub fn table_lines(table: &Table) -> Vec<Line<'static>> {
    if table.columns.is_empty() {
        return Vec::new();
    }

    let rows = project_rows(table);
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|c| truncate(&format_cell(row.get(c)), MAX_COLUMN_WIDTH))
                .collect()
        })
        .collect();
    let numeric: Vec<bool> = table
        .columns
        .iter()
        .map(|c| {
            rows.iter().any(|r| matches!(r.get(c), Some(Value::Number(_))))
                && rows.iter().all(|r| matches!(r.get(c), Some(Value::Number(_)) | Some(Value::Null) | None))
        })
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].width())
                .chain(std::iter::once(truncate(c, MAX_COLUMN_WIDTH).width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 2);

    let header: Vec<Span<'static>> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Span::styled(
                format!("{} ", pad(&truncate(c, MAX_COLUMN_WIDTH), widths[i], numeric[i])),
                Style::default().fg(Color::Cyan).bold(),
            )
        })
        .collect();
    lines.push(Line::from(header));

    let rule: String = widths.iter().map(|w| format!("{} ", "─".repeat(*w))).collect();
    lines.push(Line::from(Span::styled(rule, dim())));

    for row in &cells {
        let spans: Vec<Span<'static>> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| Span::raw(format!("{} ", pad(cell, widths[i], numeric[i]))))
            .collect();
        lines.push(Line::from(spans));
    }

    if table.rows.is_empty() {
        lines.push(Line::from(Span::styled("(no rows)", dim())));
    }

    lines
}

/// (label, value) pairs for a chart, read through the row-object projection.
pub fn chart_points(chart: &Chart, table: &Table) -> Vec<(String, f64)> {
    project_rows(table)
        .iter()
        .filter_map(|row| {
            let value = row.get(&chart.y)?.as_f64()?;
            Some((format_cell(row.get(&chart.x)), value))
        })
        .collect()
}

pub fn chart_lines(chart: &Chart, table: &Table) -> Vec<Line<'static>> {
    let points = chart_points(chart, table);
    if points.is_empty() {
        return Vec::new();
    }

    let title = Line::from(Span::styled(format!("{} by {}", chart.y, chart.x), heading()));
    let mut lines = vec![title];

    match chart.chart_type {
        ChartType::Bar => {
            let max = points.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
            let label_width = points
                .iter()
                .map(|(l, _)| l.width().min(MAX_LABEL_WIDTH))
                .max()
                .unwrap_or(0);
            for (label, value) in &points {
                let len = if max > 0.0 && *value > 0.0 {
                    ((value / max) * MAX_BAR_WIDTH).round() as usize
                } else {
                    0
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("{} ", pad(&truncate(label, MAX_LABEL_WIDTH), label_width, false))),
                    Span::styled("█".repeat(len), Style::default().fg(Color::Green)),
                    Span::styled(format!(" {}", format_number(*value)), dim()),
                ]));
            }
        }
        ChartType::Line => {
            let min = points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
            let max = points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
            let spark: String = points
                .iter()
                .map(|(_, v)| {
                    let level = if max > min {
                        (((v - min) / (max - min)) * (SPARK_LEVELS.len() - 1) as f64).round() as usize
                    } else {
                        SPARK_LEVELS.len() / 2
                    };
                    SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
                })
                .collect();
            lines.push(Line::from(Span::styled(spark, Style::default().fg(Color::Green))));
            let first = &points[0].0;
            let last = &points[points.len() - 1].0;
            lines.push(Line::from(Span::styled(
                format!(
                    "{} → {}  (min {}, max {})",
                    first,
                    last,
                    format_number(min),
                    format_number(max)
                ),
                dim(),
            )));
        }
    }

    lines
}

/// SQL is shown verbatim, never executed.
pub fn sql_lines(sql: &str) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("SQL", heading()))];
    for line in sql.lines() {
        lines.push(Line::from(Span::styled(
            format!("  {}", line),
            Style::default().fg(Color::Green),
        )));
    }
    lines
}

fn confidence_style(level: &str) -> Style {
    match level.to_lowercase().as_str() {
        "exact" | "high" => Style::default().fg(Color::Green),
        "medium" => Style::default().fg(Color::Yellow),
        "low" | "none" => Style::default().fg(Color::Red),
        _ => dim(),
    }
}

fn footer_lines(confidence: Option<&Confidence>, audit_id: Option<&str>) -> Vec<Line<'static>> {
    let mut spans = Vec::new();
    if let Some(confidence) = confidence {
        let text = match confidence.score {
            Some(score) => format!("confidence {} ({})", confidence.level, format_percent(score)),
            None => format!("confidence {}", confidence.level),
        };
        spans.push(Span::styled(text, confidence_style(&confidence.level)));
    }
    if let Some(audit_id) = audit_id {
        if !spans.is_empty() {
            spans.push(Span::styled(" · ", dim()));
        }
        spans.push(Span::styled(format!("audit {}", audit_id), dim()));
    }

    if spans.is_empty() {
        Vec::new()
    } else {
        vec![Line::default(), Line::from(spans)]
    }
}

/// Fallback text plus a pretty-printed dump of a payload this client cannot render.
pub fn unknown_lines(kind: &str, raw: &Value, fallback: &str) -> Vec<Line<'static>> {
    let mut lines = text_lines(fallback);
    let label = if kind.is_empty() {
        "Response without a kind:".to_string()
    } else {
        format!("Unrecognised response kind '{}':", kind)
    };
    lines.push(Line::from(Span::styled(label, Style::default().fg(Color::LightRed))));

    let dump = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
    for line in dump.lines() {
        lines.push(Line::from(Span::styled(format!("  {}", line), dim())));
    }
    lines
}
