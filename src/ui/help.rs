use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;

use super::theme::Theme;
use crate::input::keymap::{Binding, DRAG_BINDINGS, INPUT_BINDINGS, NORMAL_BINDINGS};

/// Help sections in display order.
const SECTIONS: &[(&str, &[Binding])] = &[
    ("Normal Mode", NORMAL_BINDINGS),
    ("Dragging (m)", DRAG_BINDINGS),
    ("Add / Edit", INPUT_BINDINGS),
];

const MOUSE_LINES: &[(&str, &str)] = &[
    ("click", "Select item"),
    ("press + move", "Drag item"),
    ("release", "Drop into column under pointer"),
];

fn help_lines() -> Vec<Line<'static>> {
    let key = Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD);
    let dim = Theme::dim_style();
    let heading = Style::default()
        .fg(Theme::FG)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let row = |k: &'static str, d: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {k:<14}"), key),
            Span::styled(d, dim),
        ])
    };

    let mut lines = Vec::new();
    for (title, bindings) in SECTIONS {
        lines.push(Line::from(Span::styled(*title, heading)));
        lines.extend(bindings.iter().map(|b| row(b.key, b.description)));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled("Mouse", heading)));
    lines.extend(MOUSE_LINES.iter().map(|(k, d)| row(*k, *d)));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Esc to close",
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD),
    )));
    lines
}

pub fn render_help(f: &mut Frame, area: Rect) {
    let panel_area = super::centered_rect(area, 60, 85, 56, 24);

    f.render_widget(Clear, panel_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Theme::FG))
        .title(Span::styled(
            " laneboard help ",
            Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::new(2, 2, 1, 1));

    let inner = block.inner(panel_area);
    f.render_widget(block, panel_area);

    if inner.height == 0 {
        return;
    }

    f.render_widget(Paragraph::new(help_lines()).wrap(Wrap { trim: false }), inner);
}
