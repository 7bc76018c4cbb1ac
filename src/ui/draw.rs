//! Rendering. Rebuilt from app state on every frame; rendering twice with
//! the same state produces the same grid.

use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
use tui_widgets::popup::Popup;

use crate::config::RgbColor;
use crate::record::ContactRecord;
use crate::sort::SortKey;

use super::app::{App, PaneFocus, LOAD_ERROR_TEXT, NO_RESULTS_TEXT};

const TABLE_HELP: &str =
    "j/k: nav  /: search  g/G: pluga  s/S: misgeret  1-6: sort  Enter: call  w: WhatsApp  v: save card  e: export group  ?: help  q: quit";
const SEARCH_HELP: &str = "Type to filter  Enter/Esc: back to table";
const HELP_FOOTER: &str = "j/k: scroll  Esc/q: close";

/// Lines shown per page in the help modal.
pub const HELP_VIEWPORT: usize = 16;

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_filter_bar(frame, layout[1], app);
    draw_body(frame, layout[2], app);
    draw_footer(frame, layout[3], app);
    draw_help_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let title_style = header_text_style(app).add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::styled("דף קשר", title_style),
        Span::raw("   "),
        Span::raw(format!("מציג {} מתוך {}", app.filtered.len(), app.total())),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_filter_bar(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = matches!(app.focused, PaneFocus::Search);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let label_style = header_text_style(app);
    let query_style = if active {
        selection_style(app)
    } else {
        Style::default()
    };

    let prefix = format!(
        "פלוגה: {}  │  מסגרת: {}  │  חיפוש: ",
        app.group_label(),
        app.subgroup_label()
    );
    let line = Line::from(vec![
        Span::styled(prefix.clone(), label_style),
        Span::styled(app.search_input.value().to_string(), query_style),
    ]);
    frame.render_widget(Paragraph::new(line), inner);

    if active {
        let prefix_width = Span::raw(prefix).width();
        let x = inner
            .x
            .saturating_add((prefix_width + app.search_input.visual_cursor()) as u16);
        frame.set_cursor_position((x, inner.y));
    }
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &App) {
    if app.load_error().is_some() {
        draw_error_panel(frame, area, app);
    } else if app.filtered.is_empty() {
        draw_no_results(frame, area, app);
    } else {
        draw_table(frame, area, app);
    }
}

fn draw_error_panel(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(error_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled(
            LOAD_ERROR_TEXT,
            error_style(app).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "ודא שהקובץ {} קיים ותקין.",
            app.config.data_path.display()
        )),
    ];
    if let Some(detail) = app.load_error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            detail.to_string(),
            header_text_style(app),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn draw_no_results(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(NO_RESULTS_TEXT)
            .style(header_text_style(app))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_table(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let header_cells: Vec<Cell> = SortKey::ALL
        .iter()
        .map(|&key| {
            let mut text = format!("{} {}", key.digit(), key.title());
            if key == app.sort_key {
                text.push(' ');
                text.push_str(app.sort_dir.indicator());
            }
            let style = if key == app.sort_key {
                header_text_style(app).add_modifier(Modifier::BOLD)
            } else {
                header_text_style(app)
            };
            Cell::from(text).style(style)
        })
        .chain([Cell::from("פעולות").style(header_text_style(app))])
        .collect();
    let header = Row::new(header_cells);

    let rows: Vec<Row> = app
        .visible_records()
        .into_iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.first_name.clone()),
                Cell::from(record.last_name.clone()),
                Cell::from(record.group.clone()),
                Cell::from(record.subgroup.clone()),
                Cell::from(record.role.clone()),
                Cell::from(record.mobile_display.clone()),
                Cell::from(actions_cell(record)),
            ])
        })
        .collect();

    let widths = vec![
        Constraint::Percentage(13),
        Constraint::Percentage(14),
        Constraint::Percentage(12),
        Constraint::Percentage(13),
        Constraint::Percentage(19),
        Constraint::Percentage(16),
        Constraint::Percentage(13),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(selection_style(app));

    let mut state = TableState::default();
    state.select(app.selected);
    frame.render_stateful_widget(table, area, &mut state);
}

/// Which affordances are live for this row: call, message, export. Export
/// is always available for a visible row.
fn actions_cell(record: &ContactRecord) -> String {
    let call = if record.mobile_phone_link.is_empty() {
        "·"
    } else {
        "📞"
    };
    let message = if record.mobile_messaging_link.is_empty() {
        "·"
    } else {
        "💬"
    };
    format!("{} {} 👤", call, message)
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message: String = if app.help_modal.is_some() {
        HELP_FOOTER.to_string()
    } else if matches!(app.focused, PaneFocus::Search) {
        SEARCH_HELP.to_string()
    } else {
        app.status.clone().unwrap_or_else(|| TABLE_HELP.to_string())
    };

    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);
    frame.render_widget(Paragraph::new(message).style(style), area);
}

pub fn help_lines() -> Vec<&'static str> {
    vec![
        "j / k, arrows    move the selection",
        "/                focus the search box (live filter)",
        "Enter / Esc      leave the search box",
        "g / G            next / previous pluga (group)",
        "s / S            next / previous misgeret (subgroup)",
        "1-6              sort by that column; again to flip direction",
        "Enter / c        call the selected contact",
        "w                open WhatsApp for the selected contact",
        "v                save the selected contact as a .vcf card",
        "e                export the filtered pluga+misgeret as one .vcf",
        "?                this help",
        "q / Ctrl-C       quit",
        "",
        "Export of the whole selection is available only when a concrete",
        "pluga and misgeret are chosen and the table is not empty.",
    ]
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(modal) = app.help_modal.as_ref() else {
        return;
    };

    let lines = help_lines();
    let end = (modal.scroll + HELP_VIEWPORT).min(lines.len());
    let body: Vec<Line> = lines[modal.scroll..end]
        .iter()
        .map(|line| Line::from(*line))
        .collect();

    let popup = Popup::new(Text::from(body))
        .title(Line::from(Span::styled(" HELP ", header_text_style(app))))
        .border_style(border_style(app));
    frame.render_widget(&popup, area);
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn header_text_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().header_fg))
}

fn error_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().error_fg))
}
