use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::models::QuestionKind;
use crate::session::Phase;
use crate::tui::{App, PlayState};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(play) = &app.play else {
        return;
    };

    match play.session.phase() {
        Phase::Intro => draw_intro(f, play, area),
        Phase::Questioning => {
            if play.feedback.is_some() {
                draw_feedback(f, play, area);
            } else {
                draw_question(f, play, area);
            }
        }
        Phase::Complete => draw_summary(f, play, area),
    }
}

fn draw_intro(f: &mut Frame, play: &PlayState, area: Rect) {
    let lesson = play.session.lesson();
    let mut text = vec![
        Line::from(Span::styled(
            lesson.title.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} questions, up to {} XP",
                lesson.question_count(),
                lesson.xp_value
            ),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::raw(lesson.content.clone())),
    ];

    if let Some(scenario) = &lesson.scenario {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            format!("Scenario: {} (budget ${:.0})", scenario.title, scenario.budget),
            Style::default().fg(Color::Cyan),
        )));
        text.push(Line::from(Span::raw(scenario.description.clone())));
        for expense in &scenario.expenses {
            text.push(Line::from(Span::styled(
                format!(
                    "  {:<20} ${:<8.2} {}{}",
                    expense.name,
                    expense.amount,
                    expense.category,
                    if expense.optional { " (optional)" } else { "" }
                ),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press Enter to start.",
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", lesson.id))
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

fn draw_question(f: &mut Frame, play: &PlayState, area: Rect) {
    let Some(question) = play.session.current_question() else {
        return;
    };
    let (index, total) = play.session.position();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Prompt + options
            Constraint::Length(3), // Input line
        ])
        .split(area);

    let mut text = vec![
        Line::from(Span::styled(
            question.prompt.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    match &question.kind {
        QuestionKind::MultipleChoice { options, .. } | QuestionKind::FillBlank { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                text.push(Line::from(Span::styled(
                    format!("  {}) {}", i + 1, option),
                    Style::default().fg(Color::Gray),
                )));
            }
            text.push(Line::from(""));
            text.push(hint("Type the option number and press Enter"));
        }
        QuestionKind::TrueFalse { .. } => {
            text.push(hint("Type t or f and press Enter"));
        }
        QuestionKind::Calculation { .. } => {
            text.push(hint("Type the number and press Enter"));
        }
        QuestionKind::OpenEnded { .. } => {
            text.push(hint("Type your answer and press Enter"));
        }
        QuestionKind::DragDrop { categories, items } => {
            text.push(Line::from(Span::styled(
                format!("  Categories: {}", categories.join(", ")),
                Style::default().fg(Color::Cyan),
            )));
            text.push(Line::from(""));
            for (i, item) in items.iter().enumerate() {
                let placed = play.placement.get(&item.text);
                let line = match placed {
                    Some(category) => Line::from(Span::styled(
                        format!("  {} -> {}", item.text, category),
                        Style::default().fg(Color::Green),
                    )),
                    None if i == play.item_index => Line::from(Span::styled(
                        format!("  {} -> ?", item.text),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )),
                    None => Line::from(Span::styled(
                        format!("  {}", item.text),
                        Style::default().fg(Color::Gray),
                    )),
                };
                text.push(line);
            }
            text.push(Line::from(""));
            text.push(hint("Type the category for the highlighted item"));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Question {}/{} ", index + 1, total))
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let input = Paragraph::new(Line::from(vec![
        Span::raw(play.input.clone()),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Answer "));
    f.render_widget(input, chunks[1]);
}

fn draw_feedback(f: &mut Frame, play: &PlayState, area: Rect) {
    let Some(verdict) = &play.feedback else {
        return;
    };
    let (index, total) = play.session.position();

    let mut text = if verdict.correct {
        vec![Line::from(Span::styled(
            format!("Correct! +{} XP", verdict.earned_xp),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))]
    } else {
        vec![Line::from(Span::styled(
            "Not quite.",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))]
    };

    if let Some(explanation) = &verdict.explanation {
        text.push(Line::from(""));
        text.push(Line::from(Span::raw(explanation.clone())));
    }

    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press Enter to continue.",
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Question {}/{} ", index + 1, total))
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

fn draw_summary(f: &mut Frame, play: &PlayState, area: Rect) {
    let lesson = play.session.lesson();
    let mut text = vec![
        Line::from(Span::styled(
            "Lesson complete!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{}/{} correct",
                    play.session.correct_count(),
                    lesson.question_count()
                ),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Earned: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} XP", play.session.earned_xp()),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(""),
    ];

    if play.session.is_committed() {
        text.push(Line::from(Span::styled(
            "Saved. Press Enter to return to lessons.",
            Style::default().fg(Color::DarkGray),
        )));
    } else if let Some(err) = &play.commit_error {
        text.push(Line::from(Span::styled(
            format!("Save failed: {}", err),
            Style::default().fg(Color::Red),
        )));
        text.push(Line::from(Span::styled(
            "Press r to retry, Esc to abandon.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        text.push(Line::from(Span::styled(
            "Press Enter to save.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", lesson.title))
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn hint(msg: &str) -> Line<'static> {
    Line::from(Span::styled(
        msg.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}
