mod ui;
mod widgets;

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::catalog;
use crate::db::Database;
use crate::engine;
use crate::models::{Answer, Lesson, LessonKind, Question, QuestionKind, UserProfile};
use crate::progress;
use crate::session::{self, LessonSession, Phase, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Lessons,
    Player,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Lessons,
            View::Lessons => View::Dashboard,
            View::Player => View::Player,
        }
    }

    fn prev(&self) -> Self {
        // Two tabs, so prev mirrors next
        self.next()
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

// A lesson row with its derived lock state
pub struct LessonRow {
    pub lesson: Lesson,
    pub locked: bool,
    pub completed: bool,
}

// Live playthrough state for the player view
pub struct PlayState {
    pub session: LessonSession,
    pub input: String,
    pub feedback: Option<Verdict>,
    pub placement: HashMap<String, String>,
    pub item_index: usize,
    pub commit_error: Option<String>,
}

impl PlayState {
    fn new(session: LessonSession) -> Self {
        Self {
            session,
            input: String::new(),
            feedback: None,
            placement: HashMap::new(),
            item_index: 0,
            commit_error: None,
        }
    }
}

pub struct App {
    db: Database,
    pub view: View,
    pub profile: UserProfile,
    pub lessons: StatefulList<LessonRow>,
    pub next_lesson_id: Option<String>,
    pub play: Option<PlayState>,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self, Box<dyn std::error::Error>> {
        let profile = db
            .current_profile()?
            .ok_or(crate::error::Error::NotSignedIn)?;
        // Opening the TUI counts as a login for the streak
        let profile = db.record_login(&profile.uid)?;

        let mut app = Self {
            db,
            view: View::Dashboard,
            profile,
            lessons: StatefulList::with_items(Vec::new()),
            next_lesson_id: None,
            play: None,
            status: None,
            should_quit: false,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(profile) = self.db.get_profile(&self.profile.uid)? {
            self.profile = profile;
        }
        let module_lessons = catalog::lessons_for_module(self.profile.primary_goal);
        let locks = progress::locked_states(&module_lessons, &self.profile);
        self.next_lesson_id = progress::next_lesson(&module_lessons, &self.profile)
            .map(|lesson| lesson.id.clone());
        let selected = self.lessons.selected;
        let rows: Vec<LessonRow> = module_lessons
            .into_iter()
            .zip(locks)
            .map(|(lesson, locked)| LessonRow {
                completed: self.profile.has_completed(&lesson.id),
                lesson,
                locked,
            })
            .collect();
        self.lessons = StatefulList::with_items(rows);
        if let Some(i) = selected {
            if i < self.lessons.items.len() {
                self.lessons.selected = Some(i);
            }
        }
        Ok(())
    }

    pub fn module_progress(&self) -> (usize, usize, u32) {
        let completed = self.lessons.items.iter().filter(|r| r.completed).count();
        let total = self.lessons.items.len();
        let percent = if total == 0 {
            0
        } else {
            (completed * 100 / total) as u32
        };
        (completed, total, percent)
    }

    fn open_selected_lesson(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(row) = self.lessons.selected_item() else {
            return Ok(());
        };
        if row.locked {
            self.status = Some(format!(
                "'{}' is locked; finish earlier lessons first",
                row.lesson.title
            ));
            return Ok(());
        }

        let lesson = row.lesson.clone();
        if lesson.kind == LessonKind::Info || lesson.question_count() == 0 {
            let already_done = self.profile.has_completed(&lesson.id);
            session::complete_info(&self.db, &self.profile.uid, &lesson)?;
            self.status = Some(if already_done {
                format!("Re-read '{}'", lesson.title)
            } else {
                format!("'{}' complete, +{} XP", lesson.title, lesson.xp_value)
            });
            self.refresh_data()?;
            return Ok(());
        }

        self.play = Some(PlayState::new(LessonSession::start(lesson)?));
        self.view = View::Player;
        self.status = None;
        Ok(())
    }

    fn close_player(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.play = None;
        self.view = View::Lessons;
        self.refresh_data()
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.view == View::Player {
            return self.handle_player_key(key);
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            // Navigation between views: h/l (left/right like vim)
            KeyCode::Char('h') | KeyCode::Left => self.view = self.view.prev(),
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Lessons => self.open_selected_lesson()?,
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
            }

            // List navigation: j/k (vim up/down)
            KeyCode::Char('j') | KeyCode::Down => {
                if self.view == View::Lessons {
                    self.lessons.next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.view == View::Lessons {
                    self.lessons.previous();
                }
            }

            KeyCode::Char('g') => {
                if self.view == View::Lessons && !self.lessons.items.is_empty() {
                    self.lessons.selected = Some(0);
                }
            }
            KeyCode::Char('G') => {
                if self.view == View::Lessons && !self.lessons.items.is_empty() {
                    self.lessons.selected = Some(self.lessons.items.len() - 1);
                }
            }

            KeyCode::Enter => {
                if self.view == View::Lessons {
                    self.open_selected_lesson()?;
                }
            }

            _ => {}
        }
        Ok(())
    }

    fn handle_player_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        let Some(play) = self.play.as_mut() else {
            self.view = View::Lessons;
            return Ok(());
        };

        if key == KeyCode::Esc {
            // Abandoning forfeits unsaved progress
            return self.close_player();
        }

        match play.session.phase() {
            Phase::Intro => {
                if key == KeyCode::Enter {
                    play.session.begin_questions()?;
                }
            }

            Phase::Questioning => {
                if play.feedback.is_some() {
                    if key == KeyCode::Enter {
                        play.feedback = None;
                        play.input.clear();
                        play.placement.clear();
                        play.item_index = 0;
                        play.session.advance()?;
                    }
                    return Ok(());
                }

                match key {
                    KeyCode::Char(c) => play.input.push(c),
                    KeyCode::Backspace => {
                        play.input.pop();
                    }
                    KeyCode::Enter => {
                        let Some(question) = play.session.current_question().cloned() else {
                            return Ok(());
                        };
                        match shape_input(&question, play) {
                            ShapedInput::Answer(answer) => {
                                match play.session.submit(&answer) {
                                    Ok(verdict) => play.feedback = Some(verdict),
                                    Err(e) => self.status = Some(e.to_string()),
                                }
                            }
                            ShapedInput::Pending => {}
                            ShapedInput::Invalid(msg) => self.status = Some(msg),
                        }
                    }
                    _ => {}
                }
            }

            Phase::Complete => match key {
                KeyCode::Enter | KeyCode::Char('r') => {
                    if play.session.is_committed() {
                        return self.close_player();
                    }
                    match play.session.commit(&self.db, &self.profile.uid) {
                        Ok(_) => {
                            play.commit_error = None;
                        }
                        Err(e) => {
                            play.commit_error = Some(e.to_string());
                        }
                    }
                }
                _ => {}
            },
        }
        Ok(())
    }
}

enum ShapedInput {
    Answer(Answer),
    // Drag-drop mid-placement, more items to assign
    Pending,
    Invalid(String),
}

// Turns the player's text input into an answer for the current question.
fn shape_input(question: &Question, play: &mut PlayState) -> ShapedInput {
    let input = play.input.trim().to_string();
    match &question.kind {
        QuestionKind::MultipleChoice { options, .. } | QuestionKind::FillBlank { options, .. } => {
            if let Ok(choice) = input.parse::<usize>() {
                if choice >= 1 && choice <= options.len() {
                    return ShapedInput::Answer(Answer::Text(options[choice - 1].clone()));
                }
            }
            if let Some(option) = options.iter().find(|o| o.as_str() == input) {
                return ShapedInput::Answer(Answer::Text(option.clone()));
            }
            ShapedInput::Invalid(format!("Pick a number between 1 and {}", options.len()))
        }
        QuestionKind::TrueFalse { .. } => match input.to_lowercase().as_str() {
            "t" | "true" => ShapedInput::Answer(Answer::Bool(true)),
            "f" | "false" => ShapedInput::Answer(Answer::Bool(false)),
            _ => ShapedInput::Invalid("Answer t or f".to_string()),
        },
        QuestionKind::Calculation { .. } => {
            match input.trim_start_matches('$').parse::<f64>() {
                Ok(value) => ShapedInput::Answer(Answer::Number(value)),
                Err(_) => ShapedInput::Invalid("Enter a number".to_string()),
            }
        }
        QuestionKind::OpenEnded { .. } => {
            let answer = Answer::Text(input);
            if engine::can_submit(&answer) {
                ShapedInput::Answer(answer)
            } else {
                ShapedInput::Invalid("Type an answer first".to_string())
            }
        }
        QuestionKind::DragDrop { categories, items } => {
            let Some(item) = items.get(play.item_index) else {
                return ShapedInput::Invalid("Nothing left to place".to_string());
            };
            let Some(category) = categories.iter().find(|c| c.eq_ignore_ascii_case(&input))
            else {
                return ShapedInput::Invalid(format!("Use one of: {}", categories.join(", ")));
            };
            play.placement.insert(item.text.clone(), category.clone());
            play.item_index += 1;
            play.input.clear();
            if play.item_index >= items.len() {
                ShapedInput::Answer(Answer::Placement(play.placement.clone()))
            } else {
                ShapedInput::Pending
            }
        }
    }
}

pub fn run(db: Database) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(db)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
