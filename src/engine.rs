//! Answer evaluation and XP math.

use crate::models::{Answer, Lesson, Question, QuestionKind};

/// Decides whether an answer is correct for a question. A response whose
/// shape does not fit the question's modality is wrong, never an error;
/// the mismatch is logged so content bugs surface in diagnostics.
pub fn evaluate(question: &Question, answer: &Answer) -> bool {
    match (&question.kind, answer) {
        (QuestionKind::MultipleChoice { answer: expected, .. }, Answer::Text(given))
        | (QuestionKind::FillBlank { answer: expected, .. }, Answer::Text(given)) => {
            given == expected
        }
        (QuestionKind::TrueFalse { answer: expected }, Answer::Bool(given)) => {
            given == expected
        }
        (QuestionKind::Calculation { answer: expected }, Answer::Number(given)) => {
            (given - expected).abs() < 0.01
        }
        (QuestionKind::OpenEnded { accepted }, Answer::Text(given)) => {
            let given = given.to_lowercase();
            accepted
                .iter()
                .any(|candidate| given.contains(&candidate.to_lowercase()))
        }
        (QuestionKind::DragDrop { items, .. }, Answer::Placement(placement)) => {
            // Every item must be placed, and placed correctly
            items
                .iter()
                .all(|item| placement.get(&item.text) == Some(&item.category))
        }
        (kind, answer) => {
            log::warn!(
                "answer shape {:?} does not match question '{}' ({})",
                answer,
                question.id,
                kind.type_name()
            );
            false
        }
    }
}

/// Whether the answer is substantive enough to submit. Empty text and empty
/// placements are rejected so a stray Enter cannot burn an attempt.
pub fn can_submit(answer: &Answer) -> bool {
    match answer {
        Answer::Text(text) => !text.trim().is_empty(),
        Answer::Placement(placement) => !placement.is_empty(),
        Answer::Bool(_) | Answer::Number(_) => true,
    }
}

/// Per-question XP share: the lesson's XP split evenly across its questions,
/// remainder dropped. Zero-question lessons award their full value on
/// completion instead and never reach this path.
pub fn question_xp(lesson: &Lesson) -> u32 {
    let count = lesson.question_count() as u32;
    if count == 0 {
        0
    } else {
        lesson.xp_value / count
    }
}

/// Strict credit: full share when correct, nothing when wrong. Used inside
/// lesson sessions where the explanation (not XP) is the consolation.
pub fn award_xp(correct: bool, max_xp: u32) -> u32 {
    if correct {
        max_xp
    } else {
        0
    }
}

/// Lenient credit for quick practice: wrong answers still earn 30% of the
/// share, rounded down. Keeps drills rewarding without inflating lessons.
pub fn award_xp_lenient(correct: bool, max_xp: u32) -> u32 {
    if correct {
        max_xp
    } else {
        max_xp * 3 / 10
    }
}
