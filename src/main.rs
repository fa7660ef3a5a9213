mod catalog;
mod db;
mod engine;
mod error;
mod models;
mod progress;
mod session;
mod tui;

use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use db::Database;
use error::Error;
use models::{Answer, FinancialGoal, JsonOutput, Lesson, LessonKind, Question, QuestionKind, UserProfile};

const DEFAULT_DB_NAME: &str = "finmate.db";

#[derive(Parser)]
#[command(name = "finmate")]
#[command(about = "A gamified personal-finance learning CLI: lessons, quizzes, XP and streaks")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Create an account and sign in
    Signup {
        /// Email address
        email: String,

        /// Display name
        name: String,
    },

    /// Sign in to an existing account
    Login {
        /// Email address
        email: String,
    },

    /// Sign out
    Logout,

    /// Show who is signed in
    Whoami,

    /// Manage the profile
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Manage financial goals
    #[command(subcommand)]
    Goals(GoalsCommands),

    /// List lessons with lock and completion state
    Lessons {
        /// Module to list (defaults to the primary goal)
        #[arg(long, short)]
        module: Option<String>,
    },

    /// Play a lesson
    Lesson {
        /// Lesson ID, e.g. budget-1
        id: String,
    },

    /// Show the next unlocked lesson
    Next,

    /// Show learning statistics
    Stats,

    /// Answer one random practice question for partial-credit XP
    Drill {
        /// Module to draw from (defaults to the primary goal)
        #[arg(long, short)]
        module: Option<String>,
    },

    /// Reset learning progress (keeps the account)
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the signed-in profile
    Show,

    /// Edit profile fields
    Edit {
        /// New display name
        #[arg(long, short)]
        name: Option<String>,

        /// New avatar URL
        #[arg(long, short)]
        avatar: Option<String>,
    },
}

#[derive(Subcommand)]
enum GoalsCommands {
    /// List available goal tracks
    List,

    /// Replace the selected goals
    Set {
        /// Comma-separated goals: budgeting,credit,investing,debt,saving
        goals: String,

        /// Primary goal (defaults to the first listed)
        #[arg(long, short)]
        primary: Option<String>,
    },
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("FINMATE_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finmate");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            for goal in FinancialGoal::all() {
                catalog::validate(&catalog::lessons_for_module(*goal))?;
            }
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Signup { email, name } => {
            let profile = db.sign_up(&email, &name)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&profile))?);
            } else {
                println!("Welcome, {}! Signed in as {}.", name, profile.email);
                println!("Start with: finmate next");
            }
        }

        Commands::Login { email } => {
            let profile = db.sign_in(&email)?;
            // The daily streak rule runs once per login
            let profile = db.record_login(&profile.uid)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&profile))?);
            } else {
                println!(
                    "Signed in as {}. Streak: {} day{}.",
                    profile.email,
                    profile.streak,
                    if profile.streak == 1 { "" } else { "s" }
                );
            }
        }

        Commands::Logout => {
            db.sign_out()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Signed out.");
            }
        }

        Commands::Whoami => match db.current_profile()? {
            Some(profile) => {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&profile))?);
                } else {
                    println!(
                        "{} <{}>",
                        profile.display_name.as_deref().unwrap_or("(no name)"),
                        profile.email
                    );
                }
            }
            None => {
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Not signed in"))?
                    );
                } else {
                    println!("Not signed in.");
                }
            }
        },

        Commands::Profile(profile_cmd) => match profile_cmd {
            ProfileCommands::Show => {
                let profile = require_profile(&db)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&profile))?);
                } else {
                    print_profile(&profile);
                }
            }

            ProfileCommands::Edit { name, avatar } => {
                let profile = require_profile(&db)?;
                if name.is_none() && avatar.is_none() {
                    return Err(Error::InvalidInput(
                        "nothing to edit; pass --name or --avatar".to_string(),
                    )
                    .into());
                }
                if let Some(name) = &name {
                    db.update_display_name(&profile.uid, name)?;
                }
                if let Some(avatar) = &avatar {
                    db.update_avatar_url(&profile.uid, Some(avatar))?;
                }
                let updated = require_profile(&db)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&updated))?);
                } else {
                    println!("Profile updated.");
                }
            }
        },

        Commands::Goals(goals_cmd) => match goals_cmd {
            GoalsCommands::List => {
                let goals = FinancialGoal::all();
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(goals))?);
                } else {
                    println!("{:<12} TRACK", "GOAL");
                    println!("{}", "-".repeat(40));
                    for goal in goals {
                        println!("{:<12} {}", goal.as_str(), goal.label());
                    }
                }
            }

            GoalsCommands::Set { goals, primary } => {
                let profile = require_profile(&db)?;
                let selected = parse_goals(&goals)?;
                let primary = match primary {
                    Some(p) => FinancialGoal::from_str(&p).ok_or_else(|| {
                        Error::InvalidInput(format!("unknown goal '{}'", p))
                    })?,
                    None => selected[0],
                };
                db.update_goals(&profile.uid, &selected, primary)?;
                let updated = require_profile(&db)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&updated))?);
                } else {
                    println!(
                        "Goals set: {} (primary: {})",
                        updated
                            .selected_goals
                            .iter()
                            .map(|g| g.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                        updated.primary_goal.as_str()
                    );
                }
            }
        },

        Commands::Lessons { module } => {
            let profile = require_profile(&db)?;
            let goal = resolve_module(module.as_deref(), &profile)?;
            let lessons = catalog::lessons_for_module(goal);
            if lessons.is_empty() {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&lessons))?);
                } else {
                    println!("No lessons in the {} track yet.", goal.label());
                }
            } else {
                let locks = progress::locked_states(&lessons, &profile);
                if cli.json {
                    let rows: Vec<_> = lessons
                        .iter()
                        .zip(&locks)
                        .map(|(lesson, locked)| {
                            serde_json::json!({
                                "id": lesson.id,
                                "title": lesson.title,
                                "kind": lesson.kind.as_str(),
                                "xp": lesson.xp_value,
                                "locked": locked,
                                "completed": profile.has_completed(&lesson.id),
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&rows))?);
                } else {
                    println!(
                        "=== {} ({}% complete) ===",
                        goal.label(),
                        progress::progress_percentage(&lessons, &profile)
                    );
                    println!("{:<4} {:<10} {:<40} {:<9} XP", "", "ID", "TITLE", "KIND");
                    println!("{}", "-".repeat(72));
                    for (lesson, locked) in lessons.iter().zip(&locks) {
                        let marker = if profile.has_completed(&lesson.id) {
                            "[x]"
                        } else if *locked {
                            "[=]"
                        } else {
                            "[ ]"
                        };
                        println!(
                            "{:<4} {:<10} {:<40} {:<9} {}",
                            marker,
                            lesson.id,
                            truncate(&lesson.title, 38),
                            lesson.kind.as_str(),
                            lesson.xp_value
                        );
                    }
                    println!();
                    println!("[x] done  [ ] open  [=] locked");
                }
            }
        }

        Commands::Lesson { id } => {
            let profile = require_profile(&db)?;
            let lesson = catalog::lesson_by_id(&id)
                .ok_or_else(|| Error::InvalidInput(format!("no lesson with id '{}'", id)))?;

            let module_lessons = catalog::lessons_for_module(lesson.module);
            let locks = progress::locked_states(&module_lessons, &profile);
            let locked = module_lessons
                .iter()
                .zip(&locks)
                .any(|(l, locked)| l.id == lesson.id && *locked);
            if locked {
                return Err(Error::InvalidInput(format!(
                    "lesson '{}' is locked; finish earlier lessons first",
                    id
                ))
                .into());
            }

            play_lesson(&db, &profile, lesson)?;
        }

        Commands::Next => {
            let profile = require_profile(&db)?;
            let lessons = catalog::lessons_for_module(profile.primary_goal);
            match progress::next_lesson(&lessons, &profile) {
                Some(lesson) => {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(lesson))?);
                    } else {
                        println!("=== Next Lesson ===");
                        println!();
                        println!("{}: {} ({} XP)", lesson.id, lesson.title, lesson.xp_value);
                        println!("{}", lesson.content);
                        println!();
                        println!("Play it with: finmate lesson {}", lesson.id);
                    }
                }
                None => {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!(
                            "The {} track is complete. Try another: finmate goals list",
                            profile.primary_goal.label()
                        );
                    }
                }
            }
        }

        Commands::Stats => {
            let profile = require_profile(&db)?;
            if cli.json {
                let modules: Vec<_> = profile
                    .selected_goals
                    .iter()
                    .map(|goal| {
                        let lessons = catalog::lessons_for_module(*goal);
                        serde_json::json!({
                            "module": goal.as_str(),
                            "completed": progress::completed_count(&lessons, &profile),
                            "total": lessons.len(),
                            "percent": progress::progress_percentage(&lessons, &profile),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "xp": profile.xp,
                        "level": profile.level,
                        "xp_to_next_level": profile.xp_to_next_level(),
                        "streak": profile.streak,
                        "modules": modules,
                    })))?
                );
            } else {
                println!("=== Learning Statistics ===");
                println!(
                    "Level {} ({} XP, {} to next)",
                    profile.level,
                    profile.xp,
                    profile.xp_to_next_level()
                );
                println!("Streak: {} day(s)", profile.streak);
                println!();
                for goal in &profile.selected_goals {
                    let lessons = catalog::lessons_for_module(*goal);
                    println!(
                        "{:<12} {}/{} lessons ({}%)",
                        goal.label(),
                        progress::completed_count(&lessons, &profile),
                        lessons.len(),
                        progress::progress_percentage(&lessons, &profile)
                    );
                }
            }
        }

        Commands::Drill { module } => {
            let profile = require_profile(&db)?;
            let goal = resolve_module(module.as_deref(), &profile)?;
            run_drill(&db, &profile, goal)?;
        }

        Commands::Reset { yes } => {
            if !yes {
                return Err(Error::InvalidInput(
                    "this wipes XP, streak and completions; pass --yes to confirm".to_string(),
                )
                .into());
            }
            let profile = require_profile(&db)?;
            db.reset_progress(&profile.uid)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Progress reset for {}.", profile.email);
            }
        }

        Commands::Tui => {
            tui::run(db)?;
        }
    }

    Ok(())
}

fn require_profile(db: &Database) -> Result<UserProfile, Error> {
    db.current_profile()?.ok_or(Error::NotSignedIn)
}

fn resolve_module(module: Option<&str>, profile: &UserProfile) -> Result<FinancialGoal, Error> {
    match module {
        Some(m) => FinancialGoal::from_str(m)
            .ok_or_else(|| Error::InvalidInput(format!("unknown module '{}'", m))),
        None => Ok(profile.primary_goal),
    }
}

fn parse_goals(raw: &str) -> Result<Vec<FinancialGoal>, Error> {
    let mut goals = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        let goal = FinancialGoal::from_str(part)
            .ok_or_else(|| Error::InvalidInput(format!("unknown goal '{}'", part)))?;
        if !goals.contains(&goal) {
            goals.push(goal);
        }
    }
    if goals.is_empty() {
        return Err(Error::InvalidInput("no goals given".to_string()));
    }
    Ok(goals)
}

fn print_profile(profile: &UserProfile) {
    println!(
        "Name: {}",
        profile.display_name.as_deref().unwrap_or("(no name)")
    );
    println!("Email: {}", profile.email);
    if let Some(avatar) = &profile.avatar_url {
        println!("Avatar: {}", avatar);
    }
    println!("Level: {} ({} XP)", profile.level, profile.xp);
    println!("Streak: {} day(s)", profile.streak);
    println!(
        "Goals: {} (primary: {})",
        profile
            .selected_goals
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        profile.primary_goal.as_str()
    );
    println!("Lessons completed: {}", profile.completed_lessons.len());
    println!("Member since: {}", profile.created_at.format("%Y-%m-%d"));
}

// Interactive lesson playthrough over stdin
fn play_lesson(
    db: &Database,
    profile: &UserProfile,
    lesson: Lesson,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== {} ({} XP) ===", lesson.title, lesson.xp_value);
    println!();
    println!("{}", lesson.content);
    println!();

    if lesson.kind == LessonKind::Info || lesson.question_count() == 0 {
        if let Some(prompt) = &lesson.practice_prompt {
            println!("Practice: {}", prompt);
            println!();
        }
        let updated = session::complete_info(db, &profile.uid, &lesson)?;
        println!(
            "Lesson complete! +{} XP (total {}, level {})",
            lesson.xp_value, updated.xp, updated.level
        );
        return Ok(());
    }

    if let Some(scenario) = &lesson.scenario {
        println!("Scenario: {} (budget ${:.0})", scenario.title, scenario.budget);
        println!("{}", scenario.description);
        println!("Goal: {}", scenario.goal);
        for expense in &scenario.expenses {
            println!(
                "  {:<20} ${:<8.2} {}{}",
                expense.name,
                expense.amount,
                expense.category,
                if expense.optional { " (optional)" } else { "" }
            );
        }
        println!();
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut play = session::LessonSession::start(lesson)?;
    play.begin_questions()?;

    while let Some(question) = play.current_question().cloned() {
        let (index, total) = play.position();
        println!("Question {}/{}: {}", index + 1, total, question.prompt);
        let answer = read_answer(&question, &mut lines)?;
        let verdict = play.submit(&answer)?;
        if verdict.correct {
            println!("Correct! +{} XP", verdict.earned_xp);
        } else {
            println!("Not quite.");
        }
        if let Some(explanation) = &verdict.explanation {
            println!("  {}", explanation);
        }
        println!();
        play.advance()?;
    }

    let updated = play.commit(db, &profile.uid)?;
    println!(
        "Lesson complete: {}/{} correct, +{} XP (total {}, level {})",
        play.correct_count(),
        play.lesson().question_count(),
        play.earned_xp(),
        updated.xp,
        updated.level
    );
    Ok(())
}

// Reads and shapes one answer for the question's modality, re-prompting on
// unusable input.
fn read_answer(
    question: &Question,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<Answer, Box<dyn std::error::Error>> {
    match &question.kind {
        QuestionKind::MultipleChoice { options, .. } | QuestionKind::FillBlank { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                println!("  {}) {}", i + 1, option);
            }
            loop {
                let input = prompt_line(lines)?;
                if let Ok(choice) = input.trim().parse::<usize>() {
                    if choice >= 1 && choice <= options.len() {
                        return Ok(Answer::Text(options[choice - 1].clone()));
                    }
                }
                if options.iter().any(|o| o == input.trim()) {
                    return Ok(Answer::Text(input.trim().to_string()));
                }
                println!("Pick a number between 1 and {}.", options.len());
            }
        }
        QuestionKind::TrueFalse { .. } => loop {
            println!("  (t)rue / (f)alse");
            let input = prompt_line(lines)?;
            match input.trim().to_lowercase().as_str() {
                "t" | "true" => return Ok(Answer::Bool(true)),
                "f" | "false" => return Ok(Answer::Bool(false)),
                _ => println!("Answer t or f."),
            }
        },
        QuestionKind::Calculation { .. } => loop {
            let input = prompt_line(lines)?;
            match input.trim().trim_start_matches('$').parse::<f64>() {
                Ok(value) => return Ok(Answer::Number(value)),
                Err(_) => println!("Enter a number."),
            }
        },
        QuestionKind::OpenEnded { .. } => {
            let input = prompt_line(lines)?;
            Ok(Answer::Text(input.trim().to_string()))
        }
        QuestionKind::DragDrop { categories, items } => {
            let mut placement = std::collections::HashMap::new();
            println!("  Categories: {}", categories.join(", "));
            for item in items {
                loop {
                    print!("  '{}' goes in: ", item.text);
                    io::stdout().flush()?;
                    let input = match lines.next() {
                        Some(line) => line?,
                        None => return Err(Error::InvalidInput("input closed".to_string()).into()),
                    };
                    let matched = categories
                        .iter()
                        .find(|c| c.eq_ignore_ascii_case(input.trim()));
                    match matched {
                        Some(category) => {
                            placement.insert(item.text.clone(), category.clone());
                            break;
                        }
                        None => println!("  Use one of: {}", categories.join(", ")),
                    }
                }
            }
            Ok(Answer::Placement(placement))
        }
    }
}

fn prompt_line(
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<String, Box<dyn std::error::Error>> {
    print!("> ");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(line?),
        None => Err(Error::InvalidInput("input closed".to_string()).into()),
    }
}

// One random question from an unlocked lesson, graded with partial credit
fn run_drill(
    db: &Database,
    profile: &UserProfile,
    goal: FinancialGoal,
) -> Result<(), Box<dyn std::error::Error>> {
    let lessons = catalog::lessons_for_module(goal);
    let locks = progress::locked_states(&lessons, profile);
    let pool: Vec<(&Lesson, &Question)> = lessons
        .iter()
        .zip(&locks)
        .filter(|(_, locked)| !**locked)
        .flat_map(|(lesson, _)| lesson.question_list().iter().map(move |q| (lesson, q)))
        .collect();

    if pool.is_empty() {
        println!("No practice questions unlocked in the {} track yet.", goal.label());
        return Ok(());
    }

    let mut rng = rand::thread_rng();
    let (lesson, question) = pool
        .choose(&mut rng)
        .copied()
        .ok_or_else(|| Error::InvalidInput("no question available".to_string()))?;

    println!("Drill ({}): {}", lesson.title, question.prompt);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let answer = read_answer(question, &mut lines)?;

    let correct = engine::evaluate(question, &answer);
    let earned = engine::award_xp_lenient(correct, engine::question_xp(lesson));
    if correct {
        println!("Correct! +{} XP", earned);
    } else {
        println!("Not quite. +{} XP for trying", earned);
        if let Some(explanation) = &question.explanation {
            println!("  {}", explanation);
        }
    }
    if earned > 0 {
        let updated = db.apply_xp(&profile.uid, earned)?;
        println!("Total: {} XP (level {})", updated.xp, updated.level);
    }
    Ok(())
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
