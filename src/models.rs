use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Financial-literacy tracks a user can pick during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialGoal {
    Budgeting,
    Credit,
    Investing,
    Debt,
    Saving,
}

impl FinancialGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialGoal::Budgeting => "budgeting",
            FinancialGoal::Credit => "credit",
            FinancialGoal::Investing => "investing",
            FinancialGoal::Debt => "debt",
            FinancialGoal::Saving => "saving",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "budgeting" | "budget" => Some(FinancialGoal::Budgeting),
            "credit" => Some(FinancialGoal::Credit),
            "investing" | "invest" => Some(FinancialGoal::Investing),
            "debt" => Some(FinancialGoal::Debt),
            "saving" | "savings" => Some(FinancialGoal::Saving),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FinancialGoal::Budgeting => "Budgeting",
            FinancialGoal::Credit => "Credit",
            FinancialGoal::Investing => "Investing",
            FinancialGoal::Debt => "Debt",
            FinancialGoal::Saving => "Saving",
        }
    }

    pub fn all() -> &'static [FinancialGoal] {
        &[
            FinancialGoal::Budgeting,
            FinancialGoal::Credit,
            FinancialGoal::Investing,
            FinancialGoal::Debt,
            FinancialGoal::Saving,
        ]
    }
}

impl Default for FinancialGoal {
    fn default() -> Self {
        FinancialGoal::Budgeting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Info,
    Quiz,
    Scenario,
}

impl LessonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonKind::Info => "info",
            LessonKind::Quiz => "quiz",
            LessonKind::Scenario => "scenario",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LessonKind::Info => "Info",
            LessonKind::Quiz => "Quiz",
            LessonKind::Scenario => "Scenario",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragDropItem {
    pub text: String,
    pub category: String,
}

// One case per answer modality; evaluation is a total match over this enum,
// so a new modality is a compile-time exhaustiveness requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        answer: String,
    },
    TrueFalse {
        answer: bool,
    },
    FillBlank {
        options: Vec<String>,
        answer: String,
    },
    DragDrop {
        categories: Vec<String>,
        items: Vec<DragDropItem>,
    },
    Calculation {
        answer: f64,
    },
    OpenEnded {
        accepted: Vec<String>,
    },
}

impl QuestionKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::TrueFalse { .. } => "true-false",
            QuestionKind::FillBlank { .. } => "fill-blank",
            QuestionKind::DragDrop { .. } => "drag-drop",
            QuestionKind::Calculation { .. } => "calculation",
            QuestionKind::OpenEnded { .. } => "open-ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub explanation: Option<String>,
    pub kind: QuestionKind,
}

// A user-supplied response, shaped per modality. Placement maps item text to
// the category the user assigned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Number(f64),
    Text(String),
    Placement(HashMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub goal: String,
    pub expenses: Vec<Expense>,
    pub questions: Vec<Question>,
}

// Immutable catalog entry; never created or edited at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub content: String,
    pub kind: LessonKind,
    pub xp_value: u32,
    pub order: u32,
    pub module: FinancialGoal,
    pub practice_prompt: Option<String>,
    pub questions: Vec<Question>,
    pub scenario: Option<Scenario>,
}

impl Lesson {
    // Quiz lessons carry their own questions; scenario lessons carry them on
    // the scenario. Info lessons have none.
    pub fn question_list(&self) -> &[Question] {
        match self.kind {
            LessonKind::Quiz => &self.questions,
            LessonKind::Scenario => self
                .scenario
                .as_ref()
                .map(|s| s.questions.as_slice())
                .unwrap_or(&[]),
            LessonKind::Info => &[],
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_list().len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub xp: u32,
    pub level: u32,
    pub streak: u32,
    pub last_login: DateTime<Utc>,
    pub selected_goals: Vec<FinancialGoal>,
    pub primary_goal: FinancialGoal,
    pub completed_lessons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A brand-new profile: no XP, level 1, no streak, on the default
    /// budgeting track.
    pub fn new(uid: &str, email: &str, display_name: &str) -> Self {
        let now = Utc::now();
        UserProfile {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: Some(display_name.to_string()),
            avatar_url: None,
            xp: 0,
            level: 1,
            streak: 0,
            last_login: now,
            selected_goals: vec![FinancialGoal::Budgeting],
            primary_goal: FinancialGoal::Budgeting,
            completed_lessons: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.iter().any(|id| id == lesson_id)
    }

    // XP still needed before the next level boundary
    pub fn xp_to_next_level(&self) -> u32 {
        1000 - self.xp % 1000
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod financial_goal_tests {
        use super::*;

        #[test]
        fn as_str_round_trips_through_from_str() {
            for goal in FinancialGoal::all() {
                assert_eq!(FinancialGoal::from_str(goal.as_str()), Some(*goal));
            }
        }

        #[test]
        fn from_str_is_case_insensitive() {
            assert_eq!(
                FinancialGoal::from_str("BUDGETING"),
                Some(FinancialGoal::Budgeting)
            );
            assert_eq!(
                FinancialGoal::from_str("Investing"),
                Some(FinancialGoal::Investing)
            );
        }

        #[test]
        fn from_str_accepts_common_aliases() {
            assert_eq!(
                FinancialGoal::from_str("savings"),
                Some(FinancialGoal::Saving)
            );
            assert_eq!(
                FinancialGoal::from_str("budget"),
                Some(FinancialGoal::Budgeting)
            );
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(FinancialGoal::from_str("crypto"), None);
            assert_eq!(FinancialGoal::from_str(""), None);
        }

        #[test]
        fn default_is_budgeting() {
            assert_eq!(FinancialGoal::default(), FinancialGoal::Budgeting);
        }

        #[test]
        fn all_lists_five_goals() {
            assert_eq!(FinancialGoal::all().len(), 5);
        }
    }

    mod question_kind_tests {
        use super::*;

        #[test]
        fn type_name_matches_catalog_vocabulary() {
            let kinds = [
                (
                    QuestionKind::MultipleChoice {
                        options: vec![],
                        answer: String::new(),
                    },
                    "multiple-choice",
                ),
                (QuestionKind::TrueFalse { answer: true }, "true-false"),
                (
                    QuestionKind::FillBlank {
                        options: vec![],
                        answer: String::new(),
                    },
                    "fill-blank",
                ),
                (
                    QuestionKind::DragDrop {
                        categories: vec![],
                        items: vec![],
                    },
                    "drag-drop",
                ),
                (QuestionKind::Calculation { answer: 0.0 }, "calculation"),
                (QuestionKind::OpenEnded { accepted: vec![] }, "open-ended"),
            ];
            for (kind, name) in kinds {
                assert_eq!(kind.type_name(), name);
            }
        }
    }

    mod lesson_tests {
        use super::*;

        fn question(id: &str) -> Question {
            Question {
                id: id.to_string(),
                prompt: "prompt".to_string(),
                explanation: None,
                kind: QuestionKind::TrueFalse { answer: true },
            }
        }

        fn lesson(kind: LessonKind) -> Lesson {
            Lesson {
                id: "l1".to_string(),
                title: "Lesson".to_string(),
                content: "Content".to_string(),
                kind,
                xp_value: 100,
                order: 1,
                module: FinancialGoal::Budgeting,
                practice_prompt: None,
                questions: vec![question("q1"), question("q2")],
                scenario: Some(Scenario {
                    id: "s1".to_string(),
                    title: "Scenario".to_string(),
                    description: "Desc".to_string(),
                    budget: 800.0,
                    goal: "Balance the budget".to_string(),
                    expenses: vec![],
                    questions: vec![question("sq1")],
                }),
            }
        }

        #[test]
        fn quiz_lessons_use_their_own_questions() {
            let l = lesson(LessonKind::Quiz);
            assert_eq!(l.question_count(), 2);
            assert_eq!(l.question_list()[0].id, "q1");
        }

        #[test]
        fn scenario_lessons_use_scenario_questions() {
            let l = lesson(LessonKind::Scenario);
            assert_eq!(l.question_count(), 1);
            assert_eq!(l.question_list()[0].id, "sq1");
        }

        #[test]
        fn info_lessons_have_no_questions() {
            let l = lesson(LessonKind::Info);
            assert_eq!(l.question_count(), 0);
        }

        #[test]
        fn scenario_lesson_without_scenario_is_empty() {
            let mut l = lesson(LessonKind::Scenario);
            l.scenario = None;
            assert_eq!(l.question_count(), 0);
        }
    }

    mod user_profile_tests {
        use super::*;

        fn profile(xp: u32) -> UserProfile {
            UserProfile {
                uid: "u1".to_string(),
                email: "a@b.c".to_string(),
                display_name: None,
                avatar_url: None,
                xp,
                level: xp / 1000 + 1,
                streak: 0,
                last_login: Utc::now(),
                selected_goals: vec![FinancialGoal::Budgeting],
                primary_goal: FinancialGoal::Budgeting,
                completed_lessons: vec!["budget-1".to_string()],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }
        }

        #[test]
        fn has_completed_checks_membership() {
            let p = profile(0);
            assert!(p.has_completed("budget-1"));
            assert!(!p.has_completed("budget-2"));
        }

        #[test]
        fn xp_to_next_level_at_boundary() {
            assert_eq!(profile(0).xp_to_next_level(), 1000);
            assert_eq!(profile(1000).xp_to_next_level(), 1000);
        }

        #[test]
        fn xp_to_next_level_mid_level() {
            assert_eq!(profile(250).xp_to_next_level(), 750);
            assert_eq!(profile(1999).xp_to_next_level(), 1);
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_with_data() {
            let output = JsonOutput::ok(42);
            assert!(output.success);
            assert_eq!(output.data, Some(42));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_with_message() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_ok_correctly() {
            let output = JsonOutput::ok("test");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"data\":\"test\""));
            assert!(json.contains("\"error\":null"));
        }
    }
}
