use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let (completed, total, percent) = app.module_progress();
    let title = format!(
        " {} Lessons ({}/{}, {}%) ",
        app.profile.primary_goal.label(),
        completed,
        total,
        percent
    );

    let items: Vec<ListItem> = app
        .lessons
        .items
        .iter()
        .map(|row| {
            let (marker, marker_color) = if row.completed {
                ("[x]", Color::Green)
            } else if row.locked {
                ("[=]", Color::DarkGray)
            } else {
                ("[ ]", Color::White)
            };

            let title_color = if row.locked {
                Color::DarkGray
            } else {
                Color::White
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", marker), Style::default().fg(marker_color)),
                Span::styled(
                    format!("{:<36}", truncate(&row.lesson.title, 34)),
                    Style::default().fg(title_color),
                ),
                Span::styled(
                    format!("{:<10}", row.lesson.kind.as_str()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:>4} XP", row.lesson.xp_value),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    // Header
    let header = Line::from(vec![
        Span::styled(
            format!("    {:<36}", "Lesson"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<10}", "Kind"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Reward",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.lessons.selected);

    // Render header separately at the top of content area
    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    // Adjust list area to account for header
    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}

