use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{FinancialGoal, UserProfile};
use crate::progress;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                uid TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT,
                avatar_url TEXT,
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                streak INTEGER NOT NULL DEFAULT 0,
                last_login TEXT NOT NULL DEFAULT (datetime('now')),
                selected_goals TEXT NOT NULL DEFAULT '["budgeting"]',
                primary_goal TEXT NOT NULL DEFAULT 'budgeting',
                completed_lessons TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Single-row table holding the signed-in user, if any
            CREATE TABLE IF NOT EXISTS active_session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                uid TEXT NOT NULL,
                signed_in_at TEXT NOT NULL,
                FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            "#,
        )?;

        // Run migrations for existing databases
        self.migrate()?;

        Ok(())
    }

    // Handle schema migrations for existing databases
    fn migrate(&self) -> Result<()> {
        // avatar_url was added after the first release
        let has_avatar_url: bool = self
            .conn
            .prepare("SELECT avatar_url FROM users LIMIT 1")
            .is_ok();

        if !has_avatar_url {
            self.conn
                .execute_batch("ALTER TABLE users ADD COLUMN avatar_url TEXT;")?;
        }

        Ok(())
    }

    // Identity operations

    pub fn sign_up(&self, email: &str, display_name: &str) -> Result<UserProfile> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT uid FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::EmailTaken(email.to_string()));
        }

        let profile = UserProfile::new(&new_uid(), email, display_name);
        self.conn.execute(
            r#"
            INSERT INTO users (uid, email, display_name, avatar_url, xp, level, streak,
                               last_login, selected_goals, primary_goal, completed_lessons,
                               created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
            params![
                profile.uid,
                profile.email,
                profile.display_name,
                profile.avatar_url,
                profile.xp,
                profile.level,
                profile.streak,
                profile.last_login.to_rfc3339(),
                serde_json::to_string(&profile.selected_goals)?,
                profile.primary_goal.as_str(),
                serde_json::to_string(&profile.completed_lessons)?,
                profile.created_at.to_rfc3339(),
            ],
        )?;
        self.set_active_session(&profile.uid)?;
        Ok(profile)
    }

    pub fn sign_in(&self, email: &str) -> Result<UserProfile> {
        let profile = self
            .get_profile_by_email(email)?
            .ok_or_else(|| Error::ProfileNotFound(email.to_string()))?;
        self.set_active_session(&profile.uid)?;
        Ok(profile)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.conn.execute("DELETE FROM active_session", [])?;
        Ok(())
    }

    /// Profile of the signed-in user, or None when signed out.
    pub fn current_profile(&self) -> Result<Option<UserProfile>> {
        let uid: Option<String> = self
            .conn
            .query_row("SELECT uid FROM active_session WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        match uid {
            Some(uid) => self.get_profile(&uid),
            None => Ok(None),
        }
    }

    fn set_active_session(&self, uid: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO active_session (id, uid, signed_in_at) VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET uid = ?1, signed_in_at = ?2
            "#,
            params![uid, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // Profile operations

    pub fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.query_profile("SELECT * FROM users WHERE uid = ?1", uid)
    }

    pub fn get_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        self.query_profile("SELECT * FROM users WHERE email = ?1", email)
    }

    fn query_profile(&self, sql: &str, key: &str) -> Result<Option<UserProfile>> {
        let mut stmt = self.conn.prepare(sql)?;
        let row = stmt
            .query_row(params![key], |row| {
                Ok(RawProfileRow {
                    uid: row.get("uid")?,
                    email: row.get("email")?,
                    display_name: row.get("display_name")?,
                    avatar_url: row.get("avatar_url")?,
                    xp: row.get("xp")?,
                    level: row.get("level")?,
                    streak: row.get("streak")?,
                    last_login: row.get("last_login")?,
                    selected_goals: row.get("selected_goals")?,
                    primary_goal: row.get("primary_goal")?,
                    completed_lessons: row.get("completed_lessons")?,
                    created_at: row.get("created_at")?,
                    updated_at: row.get("updated_at")?,
                })
            })
            .optional()?;
        Ok(row.map(hydrate))
    }

    pub fn update_display_name(&self, uid: &str, display_name: &str) -> Result<()> {
        self.touch_update(
            uid,
            "UPDATE users SET display_name = ?1, updated_at = ?2 WHERE uid = ?3",
            params![display_name, Utc::now().to_rfc3339(), uid],
        )
    }

    pub fn update_avatar_url(&self, uid: &str, avatar_url: Option<&str>) -> Result<()> {
        self.touch_update(
            uid,
            "UPDATE users SET avatar_url = ?1, updated_at = ?2 WHERE uid = ?3",
            params![avatar_url, Utc::now().to_rfc3339(), uid],
        )
    }

    /// Replaces the goal selection. The primary goal is always kept inside
    /// the selected set.
    pub fn update_goals(
        &self,
        uid: &str,
        selected: &[FinancialGoal],
        primary: FinancialGoal,
    ) -> Result<()> {
        let mut selected = selected.to_vec();
        if !selected.contains(&primary) {
            selected.push(primary);
        }
        self.touch_update(
            uid,
            "UPDATE users SET selected_goals = ?1, primary_goal = ?2, updated_at = ?3 WHERE uid = ?4",
            params![
                serde_json::to_string(&selected)?,
                primary.as_str(),
                Utc::now().to_rfc3339(),
                uid
            ],
        )
    }

    /// Commits a finished lesson in one statement: XP added, level recomputed,
    /// lesson id appended. Re-completing an already-recorded lesson changes
    /// nothing.
    pub fn apply_lesson_completion(
        &self,
        uid: &str,
        lesson_id: &str,
        earned_xp: u32,
    ) -> Result<UserProfile> {
        let profile = self
            .get_profile(uid)?
            .ok_or_else(|| Error::ProfileNotFound(uid.to_string()))?;

        if profile.has_completed(lesson_id) {
            return Ok(profile);
        }

        let new_xp = profile.xp + earned_xp;
        let mut completed = profile.completed_lessons.clone();
        completed.push(lesson_id.to_string());

        self.touch_update(
            uid,
            r#"
            UPDATE users
            SET xp = ?1, level = ?2, completed_lessons = ?3, updated_at = ?4
            WHERE uid = ?5
            "#,
            params![
                new_xp,
                progress::level_for_xp(new_xp),
                serde_json::to_string(&completed)?,
                Utc::now().to_rfc3339(),
                uid
            ],
        )?;

        self.get_profile(uid)?
            .ok_or_else(|| Error::ProfileNotFound(uid.to_string()))
    }

    /// XP gain outside a lesson (quick practice). Level is recomputed from
    /// the new total.
    pub fn apply_xp(&self, uid: &str, earned_xp: u32) -> Result<UserProfile> {
        let profile = self
            .get_profile(uid)?
            .ok_or_else(|| Error::ProfileNotFound(uid.to_string()))?;
        let new_xp = profile.xp + earned_xp;
        self.touch_update(
            uid,
            "UPDATE users SET xp = ?1, level = ?2, updated_at = ?3 WHERE uid = ?4",
            params![
                new_xp,
                progress::level_for_xp(new_xp),
                Utc::now().to_rfc3339(),
                uid
            ],
        )?;
        self.get_profile(uid)?
            .ok_or_else(|| Error::ProfileNotFound(uid.to_string()))
    }

    /// Applies the daily streak rule for a login happening now.
    pub fn record_login(&self, uid: &str) -> Result<UserProfile> {
        let profile = self
            .get_profile(uid)?
            .ok_or_else(|| Error::ProfileNotFound(uid.to_string()))?;
        let now = Utc::now();
        let streak = progress::bump_streak(profile.streak, profile.last_login, now);
        self.touch_update(
            uid,
            "UPDATE users SET streak = ?1, last_login = ?2, updated_at = ?2 WHERE uid = ?3",
            params![streak, now.to_rfc3339(), uid],
        )?;
        self.get_profile(uid)?
            .ok_or_else(|| Error::ProfileNotFound(uid.to_string()))
    }

    /// Wipes learning progress and returns goal selection to the default
    /// track, but keeps the account. Idempotent.
    pub fn reset_progress(&self, uid: &str) -> Result<()> {
        self.touch_update(
            uid,
            r#"
            UPDATE users
            SET xp = 0, level = 1, streak = 0, completed_lessons = '[]',
                selected_goals = '["budgeting"]', primary_goal = 'budgeting',
                updated_at = ?1
            WHERE uid = ?2
            "#,
            params![Utc::now().to_rfc3339(), uid],
        )
    }

    fn touch_update(&self, uid: &str, sql: &str, values: &[&dyn rusqlite::ToSql]) -> Result<()> {
        let rows = self.conn.execute(sql, values)?;
        if rows == 0 {
            return Err(Error::ProfileNotFound(uid.to_string()));
        }
        Ok(())
    }
}

fn new_uid() -> String {
    let mut rng = rand::thread_rng();
    format!("u-{:016x}", rng.gen::<u64>())
}

// Column values exactly as stored, before hydration
struct RawProfileRow {
    uid: String,
    email: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    xp: u32,
    level: u32,
    streak: u32,
    last_login: String,
    selected_goals: String,
    primary_goal: String,
    completed_lessons: String,
    created_at: String,
    updated_at: String,
}

/// Turns a stored row into a usable profile, repairing anything corrupt with
/// a documented default rather than failing the read: bad timestamps become
/// now, unparseable goal sets fall back to budgeting, and a primary goal
/// missing from the selected set is coerced back into it.
fn hydrate(row: RawProfileRow) -> UserProfile {
    let mut selected_goals: Vec<FinancialGoal> =
        serde_json::from_str(&row.selected_goals).unwrap_or_else(|e| {
            log::warn!("profile {}: bad selected_goals, defaulting: {}", row.uid, e);
            vec![FinancialGoal::Budgeting]
        });
    if selected_goals.is_empty() {
        selected_goals.push(FinancialGoal::Budgeting);
    }

    let primary_goal = FinancialGoal::from_str(&row.primary_goal).unwrap_or_else(|| {
        log::warn!(
            "profile {}: unknown primary goal '{}', defaulting",
            row.uid,
            row.primary_goal
        );
        FinancialGoal::Budgeting
    });
    if !selected_goals.contains(&primary_goal) {
        selected_goals.push(primary_goal);
    }

    let completed_lessons: Vec<String> =
        serde_json::from_str(&row.completed_lessons).unwrap_or_else(|e| {
            log::warn!(
                "profile {}: bad completed_lessons, defaulting: {}",
                row.uid,
                e
            );
            Vec::new()
        });

    UserProfile {
        uid: row.uid,
        email: row.email,
        display_name: row.display_name,
        avatar_url: row.avatar_url,
        xp: row.xp,
        level: row.level,
        streak: row.streak,
        last_login: parse_timestamp(&row.last_login),
        selected_goals,
        primary_goal,
        completed_lessons,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_creates_tables() {
            let db = setup_db();
            let users: i64 = db
                .conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .expect("users table should exist");
            assert_eq!(users, 0);

            let sessions: i64 = db
                .conn
                .query_row("SELECT COUNT(*) FROM active_session", [], |row| row.get(0))
                .expect("active_session table should exist");
            assert_eq!(sessions, 0);
        }

        #[test]
        fn init_is_idempotent() {
            let db = setup_db();
            db.sign_up("alex@example.com", "Alex").unwrap();
            db.init().expect("Re-init should succeed");
            assert!(db
                .get_profile_by_email("alex@example.com")
                .unwrap()
                .is_some());
        }
    }

    mod identity_tests {
        use super::*;

        #[test]
        fn sign_up_creates_fresh_profile() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            assert_eq!(profile.email, "alex@example.com");
            assert_eq!(profile.display_name, Some("Alex".to_string()));
            assert_eq!(profile.xp, 0);
            assert_eq!(profile.level, 1);
            assert_eq!(profile.streak, 0);
            assert_eq!(profile.selected_goals, vec![FinancialGoal::Budgeting]);
            assert_eq!(profile.primary_goal, FinancialGoal::Budgeting);
            assert!(profile.completed_lessons.is_empty());
        }

        #[test]
        fn sign_up_signs_in() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            let current = db.current_profile().unwrap().unwrap();
            assert_eq!(current.uid, profile.uid);
        }

        #[test]
        fn sign_up_duplicate_email_fails() {
            let db = setup_db();
            db.sign_up("alex@example.com", "Alex").unwrap();
            let err = db.sign_up("alex@example.com", "Other").unwrap_err();
            assert!(matches!(err, Error::EmailTaken(_)));
        }

        #[test]
        fn sign_in_unknown_email_fails() {
            let db = setup_db();
            let err = db.sign_in("nobody@example.com").unwrap_err();
            assert!(matches!(err, Error::ProfileNotFound(_)));
        }

        #[test]
        fn sign_out_clears_session() {
            let db = setup_db();
            db.sign_up("alex@example.com", "Alex").unwrap();
            db.sign_out().unwrap();
            assert!(db.current_profile().unwrap().is_none());
        }

        #[test]
        fn sign_in_replaces_session() {
            let db = setup_db();
            db.sign_up("alex@example.com", "Alex").unwrap();
            let sam = db.sign_up("sam@example.com", "Sam").unwrap();
            db.sign_in("sam@example.com").unwrap();
            assert_eq!(db.current_profile().unwrap().unwrap().uid, sam.uid);
        }
    }

    mod profile_tests {
        use super::*;

        #[test]
        fn get_profile_not_found() {
            let db = setup_db();
            assert!(db.get_profile("u-missing").unwrap().is_none());
        }

        #[test]
        fn update_display_name() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.update_display_name(&profile.uid, "Alexandra").unwrap();
            let updated = db.get_profile(&profile.uid).unwrap().unwrap();
            assert_eq!(updated.display_name, Some("Alexandra".to_string()));
        }

        #[test]
        fn update_display_name_unknown_uid_fails() {
            let db = setup_db();
            let err = db.update_display_name("u-missing", "X").unwrap_err();
            assert!(matches!(err, Error::ProfileNotFound(_)));
        }

        #[test]
        fn update_goals_keeps_primary_selected() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.update_goals(
                &profile.uid,
                &[FinancialGoal::Saving],
                FinancialGoal::Investing,
            )
            .unwrap();
            let updated = db.get_profile(&profile.uid).unwrap().unwrap();
            assert_eq!(updated.primary_goal, FinancialGoal::Investing);
            assert!(updated.selected_goals.contains(&FinancialGoal::Investing));
            assert!(updated.selected_goals.contains(&FinancialGoal::Saving));
        }
    }

    mod hydration_tests {
        use super::*;

        #[test]
        fn corrupt_goals_default_to_budgeting() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.conn
                .execute(
                    "UPDATE users SET selected_goals = 'not json', primary_goal = 'yachts' WHERE uid = ?1",
                    params![profile.uid],
                )
                .unwrap();

            let hydrated = db.get_profile(&profile.uid).unwrap().unwrap();
            assert_eq!(hydrated.selected_goals, vec![FinancialGoal::Budgeting]);
            assert_eq!(hydrated.primary_goal, FinancialGoal::Budgeting);
        }

        #[test]
        fn primary_outside_selected_is_coerced_in() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.conn
                .execute(
                    "UPDATE users SET selected_goals = '[\"saving\"]', primary_goal = 'credit' WHERE uid = ?1",
                    params![profile.uid],
                )
                .unwrap();

            let hydrated = db.get_profile(&profile.uid).unwrap().unwrap();
            assert!(hydrated.selected_goals.contains(&FinancialGoal::Credit));
        }

        #[test]
        fn corrupt_timestamp_becomes_now() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.conn
                .execute(
                    "UPDATE users SET last_login = 'yesterday-ish' WHERE uid = ?1",
                    params![profile.uid],
                )
                .unwrap();

            let hydrated = db.get_profile(&profile.uid).unwrap().unwrap();
            let age = Utc::now() - hydrated.last_login;
            assert!(age.num_seconds() < 5);
        }

        #[test]
        fn corrupt_completed_lessons_default_empty() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.conn
                .execute(
                    "UPDATE users SET completed_lessons = '{oops' WHERE uid = ?1",
                    params![profile.uid],
                )
                .unwrap();

            let hydrated = db.get_profile(&profile.uid).unwrap().unwrap();
            assert!(hydrated.completed_lessons.is_empty());
        }
    }

    mod completion_tests {
        use super::*;

        #[test]
        fn completion_adds_xp_and_lesson() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            let updated = db
                .apply_lesson_completion(&profile.uid, "budget-1", 50)
                .unwrap();
            assert_eq!(updated.xp, 50);
            assert_eq!(updated.level, 1);
            assert!(updated.has_completed("budget-1"));
        }

        #[test]
        fn completion_recomputes_level() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.apply_xp(&profile.uid, 980).unwrap();
            let updated = db
                .apply_lesson_completion(&profile.uid, "budget-2", 75)
                .unwrap();
            assert_eq!(updated.xp, 1055);
            assert_eq!(updated.level, 2);
        }

        #[test]
        fn recompleting_is_a_no_op() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.apply_lesson_completion(&profile.uid, "budget-1", 50)
                .unwrap();
            let second = db
                .apply_lesson_completion(&profile.uid, "budget-1", 50)
                .unwrap();
            assert_eq!(second.xp, 50);
            assert_eq!(second.completed_lessons.len(), 1);
        }

        #[test]
        fn apply_xp_accumulates() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.apply_xp(&profile.uid, 7).unwrap();
            let updated = db.apply_xp(&profile.uid, 25).unwrap();
            assert_eq!(updated.xp, 32);
        }
    }

    mod streak_tests {
        use super::*;

        #[test]
        fn first_login_after_yesterday_extends_streak() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            let yesterday = Utc::now() - chrono::Duration::days(1);
            db.conn
                .execute(
                    "UPDATE users SET streak = 3, last_login = ?1 WHERE uid = ?2",
                    params![yesterday.to_rfc3339(), profile.uid],
                )
                .unwrap();

            let updated = db.record_login(&profile.uid).unwrap();
            assert_eq!(updated.streak, 4);
        }

        #[test]
        fn login_after_gap_resets_streak() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            let last_week = Utc::now() - chrono::Duration::days(7);
            db.conn
                .execute(
                    "UPDATE users SET streak = 12, last_login = ?1 WHERE uid = ?2",
                    params![last_week.to_rfc3339(), profile.uid],
                )
                .unwrap();

            let updated = db.record_login(&profile.uid).unwrap();
            assert_eq!(updated.streak, 1);
        }

        #[test]
        fn same_day_login_keeps_streak() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.conn
                .execute(
                    "UPDATE users SET streak = 5 WHERE uid = ?1",
                    params![profile.uid],
                )
                .unwrap();

            let updated = db.record_login(&profile.uid).unwrap();
            assert_eq!(updated.streak, 5);
        }
    }

    mod reset_tests {
        use super::*;

        #[test]
        fn reset_clears_progress_keeps_account() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.apply_lesson_completion(&profile.uid, "budget-1", 50)
                .unwrap();
            db.apply_xp(&profile.uid, 2000).unwrap();

            db.reset_progress(&profile.uid).unwrap();

            let reset = db.get_profile(&profile.uid).unwrap().unwrap();
            assert_eq!(reset.xp, 0);
            assert_eq!(reset.level, 1);
            assert_eq!(reset.streak, 0);
            assert!(reset.completed_lessons.is_empty());
            assert_eq!(reset.email, "alex@example.com");
        }

        #[test]
        fn reset_returns_goals_to_default() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.update_goals(
                &profile.uid,
                &[FinancialGoal::Investing, FinancialGoal::Debt],
                FinancialGoal::Investing,
            )
            .unwrap();

            db.reset_progress(&profile.uid).unwrap();

            let reset = db.get_profile(&profile.uid).unwrap().unwrap();
            assert_eq!(reset.selected_goals, vec![FinancialGoal::Budgeting]);
            assert_eq!(reset.primary_goal, FinancialGoal::Budgeting);
        }

        #[test]
        fn reset_is_idempotent() {
            let db = setup_db();
            let profile = db.sign_up("alex@example.com", "Alex").unwrap();
            db.reset_progress(&profile.uid).unwrap();
            db.reset_progress(&profile.uid).unwrap();
            let reset = db.get_profile(&profile.uid).unwrap().unwrap();
            assert_eq!(reset.xp, 0);
        }
    }
}
