//! Static lesson content catalog. Lessons are embedded data: ordered per
//! module, immutable, and validated once at startup.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::{
    DragDropItem, Expense, FinancialGoal, Lesson, LessonKind, Question, QuestionKind, Scenario,
};

pub fn lessons_for_module(module: FinancialGoal) -> Vec<Lesson> {
    match module {
        FinancialGoal::Budgeting => budgeting_lessons(),
        // Remaining tracks have no authored content yet
        _ => Vec::new(),
    }
}

pub fn lesson_by_id(id: &str) -> Option<Lesson> {
    FinancialGoal::all()
        .iter()
        .flat_map(|goal| lessons_for_module(*goal))
        .find(|lesson| lesson.id == id)
}

/// Structural checks the rest of the engine relies on: unique order values
/// (unlock resolution is order-based), no empty quizzes, and well-formed
/// questions. Run by `init` so broken content fails loudly, not mid-lesson.
pub fn validate(lessons: &[Lesson]) -> Result<()> {
    let mut seen_orders = HashSet::new();
    let mut seen_ids = HashSet::new();

    for lesson in lessons {
        if !seen_ids.insert(lesson.id.as_str()) {
            return Err(Error::Catalog(format!("duplicate lesson id '{}'", lesson.id)));
        }
        if !seen_orders.insert(lesson.order) {
            return Err(Error::Catalog(format!(
                "duplicate order {} in module '{}'",
                lesson.order,
                lesson.module.as_str()
            )));
        }
        if matches!(lesson.kind, LessonKind::Quiz | LessonKind::Scenario)
            && lesson.question_count() == 0
        {
            return Err(Error::Catalog(format!(
                "{} lesson '{}' has no questions",
                lesson.kind.as_str(),
                lesson.id
            )));
        }
        for question in lesson.question_list() {
            validate_question(&lesson.id, question)?;
        }
    }

    Ok(())
}

fn validate_question(lesson_id: &str, question: &Question) -> Result<()> {
    match &question.kind {
        QuestionKind::MultipleChoice { options, answer }
        | QuestionKind::FillBlank { options, answer } => {
            if options.is_empty() {
                return Err(Error::Catalog(format!(
                    "question '{}' in '{}' has no options",
                    question.id, lesson_id
                )));
            }
            if !options.contains(answer) {
                return Err(Error::Catalog(format!(
                    "question '{}' in '{}': answer is not among the options",
                    question.id, lesson_id
                )));
            }
        }
        QuestionKind::DragDrop { categories, items } => {
            if categories.is_empty() || items.is_empty() {
                return Err(Error::Catalog(format!(
                    "question '{}' in '{}' has empty categories or items",
                    question.id, lesson_id
                )));
            }
            for item in items {
                if !categories.contains(&item.category) {
                    return Err(Error::Catalog(format!(
                        "question '{}' in '{}': item '{}' targets unknown category '{}'",
                        question.id, lesson_id, item.text, item.category
                    )));
                }
            }
        }
        QuestionKind::OpenEnded { accepted } => {
            if accepted.is_empty() {
                return Err(Error::Catalog(format!(
                    "question '{}' in '{}' has no accepted answers",
                    question.id, lesson_id
                )));
            }
        }
        QuestionKind::TrueFalse { .. } | QuestionKind::Calculation { .. } => {}
    }
    Ok(())
}

fn question(
    id: &str,
    prompt: &str,
    explanation: &str,
    kind: QuestionKind,
) -> Question {
    Question {
        id: id.to_string(),
        prompt: prompt.to_string(),
        explanation: Some(explanation.to_string()),
        kind,
    }
}

fn choice(options: &[&str], answer: &str) -> QuestionKind {
    QuestionKind::MultipleChoice {
        options: options.iter().map(|s| s.to_string()).collect(),
        answer: answer.to_string(),
    }
}

fn fill_blank(options: &[&str], answer: &str) -> QuestionKind {
    QuestionKind::FillBlank {
        options: options.iter().map(|s| s.to_string()).collect(),
        answer: answer.to_string(),
    }
}

fn drag_drop(categories: &[&str], items: &[(&str, &str)]) -> QuestionKind {
    QuestionKind::DragDrop {
        categories: categories.iter().map(|s| s.to_string()).collect(),
        items: items
            .iter()
            .map(|(text, category)| DragDropItem {
                text: text.to_string(),
                category: category.to_string(),
            })
            .collect(),
    }
}

fn budgeting_lessons() -> Vec<Lesson> {
    let module = FinancialGoal::Budgeting;
    vec![
        Lesson {
            id: "budget-1".to_string(),
            title: "What is a Budget?".to_string(),
            content: "A budget is a plan for how to spend and save your money. It helps you \
                      control your finances, avoid debt, and reach financial goals. Budgeting \
                      includes tracking income, expenses, and planning ahead."
                .to_string(),
            kind: LessonKind::Info,
            xp_value: 50,
            order: 1,
            module,
            practice_prompt: Some(
                "Match terms: Budget -> Spending Plan, Expense -> Money Going Out, \
                 Goal -> Future Financial Target"
                    .to_string(),
            ),
            questions: vec![],
            scenario: None,
        },
        Lesson {
            id: "budget-2".to_string(),
            title: "Income vs. Expenses".to_string(),
            content: "Income = Money you earn (e.g., salary, gifts, freelance). \
                      Expenses = Money you spend (e.g., rent, food, Netflix)."
                .to_string(),
            kind: LessonKind::Quiz,
            xp_value: 75,
            order: 2,
            module,
            practice_prompt: None,
            questions: vec![
                question(
                    "q1",
                    "Which of the following is an example of income?",
                    "Income is money you receive, while the other options are expenses \
                     (money you spend).",
                    choice(
                        &[
                            "Grocery bill",
                            "Side hustle payment",
                            "Movie ticket",
                            "Electricity bill",
                        ],
                        "Side hustle payment",
                    ),
                ),
                question(
                    "q2",
                    "Money earned from a job is called _____.",
                    "Income refers to money you receive from various sources like \
                     employment, investments, or gifts.",
                    fill_blank(&["income", "expense", "budget", "savings"], "income"),
                ),
                question(
                    "q3",
                    "Sort the following items into Income and Expenses:",
                    "Income includes money you receive, while expenses are money you spend.",
                    drag_drop(
                        &["Income", "Expenses"],
                        &[
                            ("Scholarship", "Income"),
                            ("Part-time job", "Income"),
                            ("Rent", "Expenses"),
                            ("Gas", "Expenses"),
                            ("Coffee", "Expenses"),
                        ],
                    ),
                ),
            ],
            scenario: None,
        },
        Lesson {
            id: "budget-3".to_string(),
            title: "The 50/30/20 Rule".to_string(),
            content: "50% Needs (rent, food, utilities), 30% Wants (entertainment, dining \
                      out), 20% Savings (emergency fund, investing)"
                .to_string(),
            kind: LessonKind::Info,
            xp_value: 50,
            order: 3,
            module,
            practice_prompt: Some(
                "Fill in the blanks: 50% of your budget should go to needs. 30% goes to \
                 wants, and 20% to savings."
                    .to_string(),
            ),
            questions: vec![],
            scenario: None,
        },
        Lesson {
            id: "budget-4".to_string(),
            title: "Needs vs Wants".to_string(),
            content: "Needs: essential to survive and live (food, rent, medicine). \
                      Wants: non-essential, enjoyable (games, dining out, new shoes)."
                .to_string(),
            kind: LessonKind::Quiz,
            xp_value: 100,
            order: 4,
            module,
            practice_prompt: None,
            questions: vec![
                question(
                    "q4",
                    "Netflix subscription is a need.",
                    "Entertainment subscriptions like Netflix are wants, not needs. They're \
                     enjoyable but not essential for survival.",
                    QuestionKind::TrueFalse { answer: false },
                ),
                question(
                    "q5",
                    "Which of the following is a want?",
                    "Concert tickets are entertainment and therefore a want. The other \
                     options are essential needs.",
                    choice(
                        &[
                            "Groceries",
                            "Water bill",
                            "Concert tickets",
                            "Health insurance",
                        ],
                        "Concert tickets",
                    ),
                ),
                question(
                    "q6",
                    "Classify the following items as Needs or Wants:",
                    "Needs are essential for survival and basic living, while wants are \
                     things that enhance your life but aren't necessary.",
                    drag_drop(
                        &["Need", "Want"],
                        &[
                            ("Rent", "Need"),
                            ("Ice cream", "Want"),
                            ("Medication", "Need"),
                            ("Gym membership", "Want"),
                        ],
                    ),
                ),
            ],
            scenario: None,
        },
        Lesson {
            id: "budget-5".to_string(),
            title: "Emergency Fund Basics".to_string(),
            content: "Emergency fund = money set aside for surprise expenses. Aim for 3-6 \
                      months of essential expenses. Helps avoid debt during emergencies."
                .to_string(),
            kind: LessonKind::Info,
            xp_value: 75,
            order: 5,
            module,
            practice_prompt: Some(
                "Complete the sentence: An emergency fund helps protect you from unexpected \
                 costs like job loss or car repairs."
                    .to_string(),
            ),
            questions: vec![],
            scenario: None,
        },
        Lesson {
            id: "budget-6".to_string(),
            title: "Budget Scenario - College Student".to_string(),
            content: "Help Alex create a monthly budget. Alex earns $800/month from a \
                      part-time job and spends $500 on rent, $150 on groceries, and $80 on fun."
                .to_string(),
            kind: LessonKind::Scenario,
            xp_value: 150,
            order: 6,
            module,
            practice_prompt: None,
            questions: vec![],
            scenario: Some(Scenario {
                id: "scenario-1".to_string(),
                title: "Alex's College Budget".to_string(),
                description: "Alex is a college student with a part-time job earning \
                              $800/month. They need to budget for rent, food, and other \
                              expenses."
                    .to_string(),
                budget: 800.0,
                goal: "Create a balanced budget that covers all essential expenses while \
                       leaving room for savings."
                    .to_string(),
                expenses: vec![
                    Expense {
                        id: "rent".to_string(),
                        name: "Rent".to_string(),
                        amount: 500.0,
                        category: "Housing".to_string(),
                        optional: false,
                    },
                    Expense {
                        id: "groceries".to_string(),
                        name: "Groceries".to_string(),
                        amount: 150.0,
                        category: "Food".to_string(),
                        optional: false,
                    },
                    Expense {
                        id: "fun".to_string(),
                        name: "Fun/Entertainment".to_string(),
                        amount: 80.0,
                        category: "Entertainment".to_string(),
                        optional: true,
                    },
                    Expense {
                        id: "savings".to_string(),
                        name: "Savings".to_string(),
                        amount: 70.0,
                        category: "Savings".to_string(),
                        optional: true,
                    },
                ],
                questions: vec![
                    question(
                        "scenario-q1",
                        "How much is left for savings?",
                        "$800 - $500 - $150 - $80 = $70",
                        QuestionKind::Calculation { answer: 70.0 },
                    ),
                    question(
                        "scenario-q2",
                        "What percentage is Alex saving?",
                        "($70 / $800) x 100 = 8.75%",
                        QuestionKind::Calculation { answer: 8.75 },
                    ),
                    question(
                        "scenario-q3",
                        "Suggest one way Alex can increase savings.",
                        "There are many ways to increase savings, including reducing \
                         expenses or increasing income.",
                        QuestionKind::OpenEnded {
                            accepted: vec![
                                "Reduce fun spending".to_string(),
                                "Look for cheaper rent".to_string(),
                                "Add freelance work".to_string(),
                                "Find roommates".to_string(),
                            ],
                        },
                    ),
                ],
            }),
        },
        Lesson {
            id: "budget-7".to_string(),
            title: "Tracking Your Spending".to_string(),
            content: "Use apps, spreadsheets, or a notebook to track. Categorize spending: \
                      food, transport, bills, etc. Helps spot patterns and areas to cut costs."
                .to_string(),
            kind: LessonKind::Info,
            xp_value: 50,
            order: 7,
            module,
            practice_prompt: Some(
                "Complete the sentence: Tracking your spending helps you stay accountable \
                 and spot wasteful habits."
                    .to_string(),
            ),
            questions: vec![],
            scenario: None,
        },
        Lesson {
            id: "budget-8".to_string(),
            title: "Budget Quiz - Final Test".to_string(),
            content: "Test your budgeting knowledge with this comprehensive quiz covering \
                      all the concepts you've learned."
                .to_string(),
            kind: LessonKind::Quiz,
            xp_value: 200,
            order: 8,
            module,
            practice_prompt: None,
            questions: vec![
                question(
                    "q7",
                    "The 50/30/20 rule helps you:",
                    "The 50/30/20 rule is a simple framework for creating a balanced budget \
                     that covers needs, wants, and savings.",
                    choice(
                        &[
                            "Get rich quick",
                            "Create a balanced budget",
                            "Pay more taxes",
                            "Track stock prices",
                        ],
                        "Create a balanced budget",
                    ),
                ),
                question(
                    "q8",
                    "An emergency fund is for planned expenses.",
                    "An emergency fund is specifically for unexpected, unplanned expenses \
                     like medical emergencies or job loss.",
                    QuestionKind::TrueFalse { answer: false },
                ),
                question(
                    "q9",
                    "You earn $2,000/month. Using 50/30/20, how much should go to savings?",
                    "20% of $2,000 = $400",
                    QuestionKind::Calculation { answer: 400.0 },
                ),
                question(
                    "q10",
                    "Classify these budget items:",
                    "Health insurance is essential (need), vacation is discretionary (want), \
                     and Roth IRA is for future financial security (savings).",
                    drag_drop(
                        &["Needs", "Wants", "Savings"],
                        &[
                            ("Health insurance", "Needs"),
                            ("Vacation", "Wants"),
                            ("Roth IRA", "Savings"),
                        ],
                    ),
                ),
            ],
            scenario: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    mod lookup_tests {
        use super::*;

        #[test]
        fn budgeting_module_has_eight_lessons() {
            let lessons = lessons_for_module(FinancialGoal::Budgeting);
            assert_eq!(lessons.len(), 8);
        }

        #[test]
        fn lessons_are_ordered() {
            let lessons = lessons_for_module(FinancialGoal::Budgeting);
            let orders: Vec<u32> = lessons.iter().map(|l| l.order).collect();
            assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        }

        #[test]
        fn unauthored_modules_are_empty() {
            assert!(lessons_for_module(FinancialGoal::Credit).is_empty());
            assert!(lessons_for_module(FinancialGoal::Saving).is_empty());
        }

        #[test]
        fn lesson_by_id_finds_known_lesson() {
            let lesson = lesson_by_id("budget-6").expect("budget-6 should exist");
            assert_eq!(lesson.kind, LessonKind::Scenario);
            assert_eq!(lesson.xp_value, 150);
            assert!(lesson.scenario.is_some());
        }

        #[test]
        fn lesson_by_id_unknown_returns_none() {
            assert!(lesson_by_id("credit-99").is_none());
        }

        #[test]
        fn scenario_questions_are_surfaced() {
            let lesson = lesson_by_id("budget-6").unwrap();
            assert_eq!(lesson.question_count(), 3);
            assert_eq!(lesson.question_list()[0].id, "scenario-q1");
        }
    }

    mod validate_tests {
        use super::*;

        fn info_lesson(id: &str, order: u32) -> Lesson {
            Lesson {
                id: id.to_string(),
                title: "Lesson".to_string(),
                content: "Content".to_string(),
                kind: LessonKind::Info,
                xp_value: 50,
                order,
                module: FinancialGoal::Budgeting,
                practice_prompt: None,
                questions: vec![],
                scenario: None,
            }
        }

        #[test]
        fn embedded_catalog_is_valid() {
            for goal in FinancialGoal::all() {
                let lessons = lessons_for_module(*goal);
                assert!(validate(&lessons).is_ok(), "module {:?} invalid", goal);
            }
        }

        #[test]
        fn duplicate_orders_are_rejected() {
            let lessons = vec![info_lesson("a", 1), info_lesson("b", 1)];
            let err = validate(&lessons).unwrap_err();
            assert!(err.to_string().contains("duplicate order"));
        }

        #[test]
        fn duplicate_ids_are_rejected() {
            let lessons = vec![info_lesson("a", 1), info_lesson("a", 2)];
            let err = validate(&lessons).unwrap_err();
            assert!(err.to_string().contains("duplicate lesson id"));
        }

        #[test]
        fn quiz_without_questions_is_rejected() {
            let mut lesson = info_lesson("a", 1);
            lesson.kind = LessonKind::Quiz;
            let err = validate(&[lesson]).unwrap_err();
            assert!(err.to_string().contains("no questions"));
        }

        #[test]
        fn answer_outside_options_is_rejected() {
            let mut lesson = info_lesson("a", 1);
            lesson.kind = LessonKind::Quiz;
            lesson.questions = vec![Question {
                id: "q1".to_string(),
                prompt: "pick".to_string(),
                explanation: None,
                kind: choice(&["x", "y"], "z"),
            }];
            let err = validate(&[lesson]).unwrap_err();
            assert!(err.to_string().contains("not among the options"));
        }

        #[test]
        fn drag_drop_item_with_unknown_category_is_rejected() {
            let mut lesson = info_lesson("a", 1);
            lesson.kind = LessonKind::Quiz;
            lesson.questions = vec![Question {
                id: "q1".to_string(),
                prompt: "sort".to_string(),
                explanation: None,
                kind: drag_drop(&["Income"], &[("Rent", "Expenses")]),
            }];
            let err = validate(&[lesson]).unwrap_err();
            assert!(err.to_string().contains("unknown category"));
        }
    }
}
