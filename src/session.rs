//! In-memory lesson playthrough. A session walks Intro, then each question,
//! then Complete; the profile is only touched by the final commit.

use crate::db::Database;
use crate::engine;
use crate::error::{Error, Result};
use crate::models::{Answer, Lesson, Question, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Questioning,
    Complete,
}

#[derive(Debug, Clone)]
pub struct Verdict {
    pub correct: bool,
    pub earned_xp: u32,
    pub explanation: Option<String>,
}

pub struct LessonSession {
    lesson: Lesson,
    phase: Phase,
    current: usize,
    verdicts: Vec<Verdict>,
    earned_xp: u32,
    committed: bool,
}

impl LessonSession {
    /// Starts a session for a lesson with questions. Info lessons go through
    /// `complete_info` instead.
    pub fn start(lesson: Lesson) -> Result<Self> {
        if lesson.question_count() == 0 {
            return Err(Error::InvalidInput(format!(
                "lesson '{}' has no questions; it completes on reading",
                lesson.id
            )));
        }
        Ok(Self {
            lesson,
            phase: Phase::Intro,
            current: 0,
            verdicts: Vec::new(),
            earned_xp: 0,
            committed: false,
        })
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn earned_xp(&self) -> u32 {
        self.earned_xp
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn correct_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.correct).count()
    }

    /// The question awaiting an answer, if the session is on one.
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase != Phase::Questioning {
            return None;
        }
        self.lesson.question_list().get(self.current)
    }

    /// Zero-based position and total, for progress display.
    pub fn position(&self) -> (usize, usize) {
        (self.current, self.lesson.question_count())
    }

    /// Leaves the intro and presents the first question.
    pub fn begin_questions(&mut self) -> Result<()> {
        if self.phase != Phase::Intro {
            return Err(Error::InvalidInput("questions already started".to_string()));
        }
        self.phase = Phase::Questioning;
        Ok(())
    }

    /// Grades the current question. XP is all-or-nothing per question; the
    /// verdict carries the explanation for the feedback screen.
    pub fn submit(&mut self, answer: &Answer) -> Result<Verdict> {
        let question = self
            .current_question()
            .ok_or_else(|| Error::InvalidInput("no question awaiting an answer".to_string()))?;
        if !engine::can_submit(answer) {
            return Err(Error::InvalidInput("answer is empty".to_string()));
        }
        if self.verdicts.len() > self.current {
            return Err(Error::InvalidInput(
                "question already answered; advance first".to_string(),
            ));
        }

        let correct = engine::evaluate(question, answer);
        let earned = engine::award_xp(correct, engine::question_xp(&self.lesson));
        let verdict = Verdict {
            correct,
            earned_xp: earned,
            explanation: question.explanation.clone(),
        };
        self.earned_xp += earned;
        self.verdicts.push(verdict.clone());
        Ok(verdict)
    }

    /// Moves past an answered question, finishing the session after the last.
    pub fn advance(&mut self) -> Result<Phase> {
        if self.phase != Phase::Questioning {
            return Err(Error::InvalidInput("not on a question".to_string()));
        }
        if self.verdicts.len() <= self.current {
            return Err(Error::InvalidInput(
                "answer the current question first".to_string(),
            ));
        }
        self.current += 1;
        if self.current >= self.lesson.question_count() {
            self.phase = Phase::Complete;
        }
        Ok(self.phase)
    }

    /// Persists the finished session. Retryable: a failed commit leaves the
    /// session complete and uncommitted, a second call after success is
    /// rejected rather than double-awarding.
    pub fn commit(&mut self, db: &Database, uid: &str) -> Result<UserProfile> {
        if self.phase != Phase::Complete {
            return Err(Error::InvalidInput(
                "session is not finished yet".to_string(),
            ));
        }
        if self.committed {
            return Err(Error::InvalidInput("session already committed".to_string()));
        }
        let profile = db.apply_lesson_completion(uid, &self.lesson.id, self.earned_xp)?;
        self.committed = true;
        Ok(profile)
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

/// Completes a zero-question lesson: the full XP value, recorded directly.
pub fn complete_info(db: &Database, uid: &str, lesson: &Lesson) -> Result<UserProfile> {
    if lesson.question_count() > 0 {
        return Err(Error::InvalidInput(format!(
            "lesson '{}' has questions; play it as a session",
            lesson.id
        )));
    }
    db.apply_lesson_completion(uid, &lesson.id, lesson.xp_value)
}
