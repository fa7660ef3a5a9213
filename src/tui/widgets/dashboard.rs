use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Profile + progress row
            Constraint::Min(0),    // Next lesson
        ])
        .split(area);

    // Top row: profile and module progress side by side
    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_profile(f, app, top_chunks[0]);
    draw_module_progress(f, app, top_chunks[1]);
    draw_next_lesson(f, app, chunks[1]);
}

fn draw_profile(f: &mut Frame, app: &App, area: Rect) {
    let profile = &app.profile;

    let text = vec![
        Line::from(vec![
            Span::styled("Name: ", Style::default().fg(Color::Gray)),
            Span::styled(
                profile.display_name.as_deref().unwrap_or("(no name)"),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Level: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", profile.level),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!("  ({} XP)", profile.xp),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("To next level: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} XP", profile.xp_to_next_level()),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Streak: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} day(s)", profile.streak),
                Style::default().fg(if profile.streak > 0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Track: ", Style::default().fg(Color::Gray)),
            Span::styled(
                profile.primary_goal.label(),
                Style::default().fg(Color::Green),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Profile ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_module_progress(f: &mut Frame, app: &App, area: Rect) {
    let (completed, total, percent) = app.module_progress();

    let text = vec![
        Line::from(vec![
            Span::styled("Lessons: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{}", completed, total),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Progress: ", Style::default().fg(Color::Gray)),
            Span::styled(progress_bar(percent), Style::default().fg(Color::Green)),
            Span::styled(format!(" {}%", percent), Style::default().fg(Color::White)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.profile.primary_goal.label()))
        .title_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_next_lesson(f: &mut Frame, app: &App, area: Rect) {
    let text = match &app.next_lesson_id {
        Some(id) => {
            let row = app.lessons.items.iter().find(|r| r.lesson.id == *id);
            match row {
                Some(row) => vec![
                    Line::from(vec![
                        Span::styled(
                            format!("{}: ", row.lesson.id),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(
                            row.lesson.title.clone(),
                            Style::default()
                                .fg(Color::White)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  +{} XP", row.lesson.xp_value),
                            Style::default().fg(Color::Green),
                        ),
                    ]),
                    Line::from(""),
                    Line::from(Span::raw(row.lesson.content.clone())),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Open the Lessons tab and press Enter to play.",
                        Style::default().fg(Color::DarkGray),
                    )),
                ],
                None => vec![Line::from("Lesson list out of date; press ^r.")],
            }
        }
        None => vec![Line::from(Span::styled(
            "Track complete! Pick another goal with: finmate goals set",
            Style::default().fg(Color::Green),
        ))],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next Lesson ")
        .title_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn progress_bar(percent: u32) -> String {
    let filled = (percent as usize * 20) / 100;
    let empty = 20 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
