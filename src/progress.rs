//! Derived progress: lesson unlocks, completion stats, levels, and streaks.
//! Everything here is a pure function of the profile plus the catalog; the
//! stored profile never records locks or percentages.

use chrono::{DateTime, Utc};

use crate::models::{Lesson, UserProfile};

/// Index of the highest-order completed lesson in this ordered module, or
/// None when nothing is completed yet.
fn highest_completed_index(lessons: &[Lesson], profile: &UserProfile) -> Option<usize> {
    lessons
        .iter()
        .enumerate()
        .filter(|(_, lesson)| profile.has_completed(&lesson.id))
        .map(|(i, _)| i)
        .max()
}

/// Lock flags aligned with `lessons` (assumed sorted by order). With no
/// completions everything is open; otherwise only lessons up to one past
/// the furthest completion are reachable.
pub fn locked_states(lessons: &[Lesson], profile: &UserProfile) -> Vec<bool> {
    match highest_completed_index(lessons, profile) {
        None => vec![false; lessons.len()],
        Some(highest) => (0..lessons.len()).map(|i| i > highest + 1).collect(),
    }
}

pub fn completed_count(lessons: &[Lesson], profile: &UserProfile) -> usize {
    lessons
        .iter()
        .filter(|lesson| profile.has_completed(&lesson.id))
        .count()
}

/// Whole-number percentage of the module completed. Empty modules are 0,
/// not a divide-by-zero.
pub fn progress_percentage(lessons: &[Lesson], profile: &UserProfile) -> u32 {
    if lessons.is_empty() {
        return 0;
    }
    (completed_count(lessons, profile) * 100 / lessons.len()) as u32
}

/// First unlocked, not-yet-completed lesson in module order.
pub fn next_lesson<'a>(lessons: &'a [Lesson], profile: &UserProfile) -> Option<&'a Lesson> {
    let locks = locked_states(lessons, profile);
    lessons
        .iter()
        .zip(locks)
        .find(|(lesson, locked)| !locked && !profile.has_completed(&lesson.id))
        .map(|(lesson, _)| lesson)
}

/// Level is a pure function of lifetime XP: one level per 1000, starting
/// at level 1.
pub fn level_for_xp(xp: u32) -> u32 {
    xp / 1000 + 1
}

/// Streak update for a login at `now`: consecutive calendar days extend the
/// streak, a gap resets it to 1, a same-day repeat changes nothing.
pub fn bump_streak(streak: u32, last_login: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = (now.date_naive() - last_login.date_naive()).num_days();
    match days {
        0 => streak,
        1 => streak + 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::models::FinancialGoal;
    use chrono::{Duration, TimeZone};

    fn profile_with_completions(ids: &[&str]) -> UserProfile {
        let mut profile = UserProfile::new("uid-1", "alex@example.com", "Alex");
        profile.completed_lessons = ids.iter().map(|s| s.to_string()).collect();
        profile
    }

    mod unlock_tests {
        use super::*;

        #[test]
        fn fresh_profile_has_everything_open() {
            let lessons = catalog::lessons_for_module(FinancialGoal::Budgeting);
            let profile = profile_with_completions(&[]);
            assert!(locked_states(&lessons, &profile).iter().all(|l| !l));
        }

        #[test]
        fn lock_boundary_is_one_past_furthest_completion() {
            // Completing the 2nd of 4 opens up through the 3rd only
            let lessons: Vec<_> = catalog::lessons_for_module(FinancialGoal::Budgeting)
                .into_iter()
                .take(4)
                .collect();
            let profile = profile_with_completions(&["budget-2"]);
            assert_eq!(
                locked_states(&lessons, &profile),
                vec![false, false, false, true]
            );
        }

        #[test]
        fn completing_last_lesson_leaves_nothing_locked() {
            let lessons = catalog::lessons_for_module(FinancialGoal::Budgeting);
            let profile = profile_with_completions(&["budget-8"]);
            assert!(locked_states(&lessons, &profile).iter().all(|l| !l));
        }

        #[test]
        fn next_lesson_skips_completed() {
            let lessons = catalog::lessons_for_module(FinancialGoal::Budgeting);
            let profile = profile_with_completions(&["budget-1", "budget-2"]);
            assert_eq!(next_lesson(&lessons, &profile).unwrap().id, "budget-3");
        }

        #[test]
        fn next_lesson_none_when_module_finished() {
            let lessons = catalog::lessons_for_module(FinancialGoal::Budgeting);
            let all: Vec<&str> = lessons.iter().map(|l| l.id.as_str()).collect();
            let profile = profile_with_completions(&all);
            assert!(next_lesson(&lessons, &profile).is_none());
        }
    }

    mod percentage_tests {
        use super::*;

        #[test]
        fn empty_module_is_zero_percent() {
            let profile = profile_with_completions(&[]);
            assert_eq!(progress_percentage(&[], &profile), 0);
        }

        #[test]
        fn whole_number_percentage() {
            let lessons = catalog::lessons_for_module(FinancialGoal::Budgeting);
            let profile = profile_with_completions(&["budget-1", "budget-2", "budget-3"]);
            assert_eq!(completed_count(&lessons, &profile), 3);
            // 3 of 8 truncates to 37
            assert_eq!(progress_percentage(&lessons, &profile), 37);
        }

        #[test]
        fn stale_completion_ids_are_ignored() {
            let lessons = catalog::lessons_for_module(FinancialGoal::Budgeting);
            let profile = profile_with_completions(&["budget-1", "removed-lesson"]);
            assert_eq!(completed_count(&lessons, &profile), 1);
        }
    }

    mod level_tests {
        use super::*;

        #[test]
        fn level_thresholds() {
            assert_eq!(level_for_xp(0), 1);
            assert_eq!(level_for_xp(999), 1);
            assert_eq!(level_for_xp(1000), 2);
            assert_eq!(level_for_xp(2500), 3);
        }
    }

    mod streak_tests {
        use super::*;

        #[test]
        fn consecutive_day_extends() {
            let now = Utc::now();
            assert_eq!(bump_streak(4, now - Duration::days(1), now), 5);
        }

        #[test]
        fn gap_resets_to_one() {
            let now = Utc::now();
            assert_eq!(bump_streak(9, now - Duration::days(3), now), 1);
        }

        #[test]
        fn same_day_is_unchanged() {
            let now = Utc::now();
            assert_eq!(bump_streak(4, now, now), 4);
        }

        #[test]
        fn calendar_boundary_counts_as_consecutive() {
            // Logins an hour apart straddling midnight are still
            // consecutive days.
            let before = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
            let after = Utc.with_ymd_and_hms(2026, 3, 2, 0, 30, 0).unwrap();
            assert_eq!(bump_streak(4, before, after), 5);
        }
    }
}
