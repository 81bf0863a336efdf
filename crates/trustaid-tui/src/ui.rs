use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, BackendStatus, InputMode};
use crate::render::entry_lines;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_api_base_input {
        render_api_base_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mode = if app.settings.demo_mode {
        Span::styled(" DEMO ", Style::default().bg(Color::Magenta).fg(Color::White).bold())
    } else {
        Span::styled(" LIVE ", Style::default().bg(Color::Green).fg(Color::Black).bold())
    };

    let status = match &app.backend_status {
        BackendStatus::Unchecked => Span::raw(""),
        BackendStatus::Checking => Span::styled(" checking… ", Style::default().fg(Color::Yellow)),
        BackendStatus::Up { demo: true } => {
            Span::styled(" backend up (demo data) ", Style::default().fg(Color::Green))
        }
        BackendStatus::Up { demo: false } => Span::styled(" backend up ", Style::default().fg(Color::Green)),
        BackendStatus::Down(_) => Span::styled(" backend down ", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(" TrustAid ", Style::default().fg(Color::Cyan).bold()),
        mode,
        Span::styled(
            format!(" {} ", app.settings.pipeline.display_name()),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!(" {} ", app.settings.api_base), Style::default().fg(Color::Gray)),
        status,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Rows `line` occupies when wrapped to `width` columns.
fn wrapped_height(line: &Line<'_>, width: u16) -> u16 {
    let width = width.max(1) as usize;
    let columns = line.width();
    if columns == 0 {
        1
    } else {
        columns.div_ceil(width) as u16
    }
}

/// The part of `text` shown in a one-row box `width` columns wide, scrolled so
/// the cursor (a char index) stays visible, plus the cursor's column in it.
fn visible_window(text: &str, cursor: usize, width: usize) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let column = |c: &char| c.width().unwrap_or(0);

    let mut start = 0;
    let mut before: usize = chars[..cursor].iter().map(column).sum();
    while start < cursor && before + 1 > width {
        before -= column(&chars[start]);
        start += 1;
    }

    let mut used = 0;
    let mut visible = String::new();
    for c in &chars[start..] {
        let w = column(c);
        if used + w > width {
            break;
        }
        used += w;
        visible.push(*c);
    }
    (visible, before.min(width - 1) as u16)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(" Conversation ");

    let mut lines: Vec<Line> = app
        .conversation
        .transcript()
        .iter()
        .flat_map(entry_lines)
        .collect();

    if app.is_busy() {
        lines.push(Line::from(Span::styled(
            "TrustAid:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Inner size minus borders
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    app.chat_height = inner_height;

    let total: u16 = lines
        .iter()
        .map(|l| wrapped_height(l, inner_width))
        .fold(0u16, u16::saturating_add);
    let max_scroll = total.saturating_sub(inner_height);
    if app.follow_bottom || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_bottom = true;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && !app.show_api_base_input;
    let title = if app.is_busy() {
        " Ask (waiting for answer…) "
    } else {
        " Ask "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) =
        visible_window(&app.conversation.input, app.query_cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    if editing && inner_width > 0 && area.height > 2 {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];

    // Errors and notices take the place of key hints
    let message = app
        .conversation
        .error()
        .map(|e| format!(" Request failed: {} ", e))
        .or_else(|| app.notice.as_ref().map(|n| format!(" {} ", n)))
        .or_else(|| match &app.backend_status {
            BackendStatus::Down(reason) => Some(format!(" Backend down: {} ", reason)),
            _ => None,
        });

    if let Some(message) = message {
        spans.push(Span::styled(message, Style::default().bg(Color::Red).fg(Color::White)));
    } else {
        let hints: &[(&str, &str)] = match app.input_mode {
            InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " stop typing ")],
            InputMode::Normal => &[
                (" i ", " type "),
                (" j/k ", " scroll "),
                (" s ", " steps "),
                (" d ", " demo "),
                (" p ", " pipeline "),
                (" a ", " API "),
                (" H ", " health "),
                (" q ", " quit "),
            ],
        };
        for (key, label) in hints {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::styled(*label, label_style));
        }
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_api_base_input(app: &App, frame: &mut Frame, area: Rect) {
    // Centered, shrunk to the frame on small terminals
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);

    let popup_x = area.x + (area.width - popup_width) / 2;
    let popup_y = area.y + (area.height - popup_height) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Backend API base ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    if inner.is_empty() {
        return;
    }

    // The input row always gets a line; instructions and hint only when they fit
    let row = |offset: u16| Rect::new(inner.x, inner.y + offset, inner.width, 1);
    let (instructions_row, input_row, hint_row) = match inner.height {
        1 => (None, row(0), None),
        2..=4 => (Some(row(0)), row(1), None),
        _ => (Some(row(0)), row(2), Some(row(4))),
    };

    if let Some(rect) = instructions_row {
        let instructions = Paragraph::new("Enter the backend origin. Enter to save, Esc to cancel.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(instructions, rect);
    }

    let (visible, cursor_x) =
        visible_window(&app.api_base_input, app.api_base_cursor, input_row.width as usize);
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_row,
    );
    frame.set_cursor_position((input_row.x + cursor_x, input_row.y));

    if let Some(rect) = hint_row {
        let hint = Paragraph::new(format!(
            "Requests go to {}/chat/query",
            app.api_base_input.trim().trim_end_matches('/')
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, rect);
    }
}
