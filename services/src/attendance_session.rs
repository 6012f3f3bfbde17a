//! Session lifecycle: start, mark, restart, plus the read-only session views.
//!
//! A session is created with `attendance_start` at the scheduled class start.
//! Marking is accepted once that instant has passed; a restart moves the start
//! and issues a fresh QR challenge without touching recorded attendance.

use crate::error::{ServiceError, ServiceResult};
use crate::identity::Caller;
use crate::qr;
use crate::MAX_ROW_COUNT;
use chrono::{DateTime, Datelike, Utc};
use db::models::{
    attendance_record::{self, Channel},
    attendance_session::{self, WindowState},
    class, class_student, user,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use util::config::AttendancePolicy;
use util::state::AppState;

pub const DEFAULT_ATTENDANCE_MINUTES: i32 = 15;
pub const DEFAULT_LIST_LIMIT: u64 = 20;

#[derive(Debug, Clone)]
pub struct StartSession {
    pub class_code: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendance_minutes: i32,
    /// Academic year; defaults to the calendar year of `start`.
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct MarkAttendance {
    pub via: Channel,
    pub qr_payload: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStarted {
    pub session_id: String,
    pub class_code: String,
    pub class_start: DateTime<Utc>,
    pub class_end: DateTime<Utc>,
    pub attendance_start: DateTime<Utc>,
    pub attendance_minutes: i32,
    pub qr_payload: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkAck {
    pub session_id: String,
    pub user_id: i64,
    pub roll: String,
    pub taken_at: DateTime<Utc>,
    pub via: Channel,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowInfo {
    pub session_id: String,
    pub attendance_start: DateTime<Utc>,
    pub attendance_minutes: i32,
    pub window_end: DateTime<Utc>,
    pub qr_payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PresenceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub user_id: i64,
    pub roll: String,
    pub name: String,
    pub status: PresenceStatus,
    pub taken_at: Option<DateTime<Utc>>,
    pub via: Option<Channel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacultyInfo {
    pub id: i64,
    pub roll: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDetails {
    pub session_id: String,
    pub class_code: String,
    pub class_name: String,
    pub faculty: Option<FacultyInfo>,
    pub class_start: DateTime<Utc>,
    pub class_end: DateTime<Utc>,
    pub attendance_start: Option<DateTime<Utc>>,
    pub attendance_minutes: i32,
    pub window_end: Option<DateTime<Utc>>,
    pub qr_payload: String,
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub roster: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    pub user_id: i64,
    pub roll: String,
    pub taken_at: DateTime<Utc>,
    pub via: Channel,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionAttendance {
    pub session_id: String,
    pub class_code: String,
    pub attendance: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub class_code: String,
    pub class_name: String,
    pub class_start: DateTime<Utc>,
    pub class_end: DateTime<Utc>,
    pub faculty_id: i64,
    pub attendance_count: i64,
    pub student_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionList {
    pub sessions: Vec<SessionSummary>,
    pub count: usize,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

pub struct AttendanceSessionService<'a> {
    db: &'a DatabaseConnection,
    qr_secret: &'a str,
    policy: AttendancePolicy,
}

impl<'a> AttendanceSessionService<'a> {
    pub fn new(db: &'a DatabaseConnection, qr_secret: &'a str, policy: AttendancePolicy) -> Self {
        Self {
            db,
            qr_secret,
            policy,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        let config = state.config();
        Self::new(state.db(), &config.qr_secret, config.attendance)
    }

    /// Creates a session for `class_code` with its window opening at `start`.
    pub async fn start_session(
        &self,
        caller: &Caller,
        params: StartSession,
        now: DateTime<Utc>,
    ) -> ServiceResult<SessionStarted> {
        let class = self.class_by_code(&params.class_code).await?;

        if params.start >= params.end {
            return Err(ServiceError::BadRequest(
                "Class start must be before class end".into(),
            ));
        }
        if params.attendance_minutes < 1 {
            return Err(ServiceError::BadRequest(
                "attendance_minutes must be at least 1".into(),
            ));
        }

        caller.ensure_can_manage(&class)?;

        let session_code = format!("S-{}-{}", class.code, now.timestamp_millis());
        let qr_payload = qr::challenge(self.qr_secret, &session_code, now)?;

        let session = attendance_session::ActiveModel {
            session_code: Set(session_code),
            class_id: Set(class.id),
            created_by: Set(caller.id),
            year: Set(params.year.unwrap_or_else(|| params.start.year())),
            class_start: Set(params.start),
            class_end: Set(params.end),
            attendance_start: Set(Some(params.start)),
            attendance_minutes: Set(params.attendance_minutes),
            qr_payload: Set(qr_payload),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::BadRequest(format!(
                "A session for {} was already started at this instant",
                class.code
            )),
            _ => ServiceError::from(e),
        })?;

        info!(
            session = %session.session_code,
            class = %class.code,
            by = caller.id,
            "session started"
        );

        Ok(SessionStarted {
            session_id: session.session_code,
            class_code: class.code,
            class_start: session.class_start,
            class_end: session.class_end,
            attendance_start: params.start,
            attendance_minutes: session.attendance_minutes,
            qr_payload: session.qr_payload,
        })
    }

    /// Records the caller as present in `session_code`.
    ///
    /// Checks run in a fixed order: session exists, window open, caller
    /// enrolled, QR (when required), not already marked. The final check is the
    /// insert itself, so concurrent marks by the same student cannot both land.
    pub async fn mark_attendance(
        &self,
        session_code: &str,
        caller: &Caller,
        params: MarkAttendance,
        now: DateTime<Utc>,
    ) -> ServiceResult<MarkAck> {
        let result = self.try_mark(session_code, caller, params, now).await;
        match &result {
            Ok(ack) => info!(
                session = %ack.session_id,
                user = ack.user_id,
                via = %ack.via,
                "attendance marked"
            ),
            Err(ServiceError::Internal(_)) => {}
            Err(e) => debug!(session = %session_code, user = caller.id, reason = %e, "mark rejected"),
        }
        result
    }

    async fn try_mark(
        &self,
        session_code: &str,
        caller: &Caller,
        params: MarkAttendance,
        now: DateTime<Utc>,
    ) -> ServiceResult<MarkAck> {
        let session = self.session_by_code(session_code).await?;

        match session.window_state(now) {
            WindowState::NotOpen => return Err(ServiceError::WindowNotOpen),
            WindowState::Elapsed if self.policy.enforce_close => {
                return Err(ServiceError::WindowClosed);
            }
            WindowState::Open | WindowState::Elapsed => {}
        }

        if !class_student::Model::is_enrolled(self.db, session.class_id, caller.id).await? {
            return Err(ServiceError::NotEnrolled);
        }

        if self.policy.require_qr {
            let valid = params
                .qr_payload
                .as_deref()
                .is_some_and(|submitted| qr::matches(&session.qr_payload, submitted));
            if !valid {
                return Err(ServiceError::InvalidQr);
            }
        }

        let student = user::Entity::find_by_id(caller.id)
            .one(self.db)
            .await?
            .ok_or(ServiceError::NotEnrolled)?;

        if attendance_record::Model::exists(self.db, session.id, student.id).await? {
            return Err(ServiceError::DuplicateMark);
        }

        let inserted = attendance_record::Model::insert_once(
            self.db,
            session.id,
            student.id,
            &student.username,
            params.via,
            now,
        )
        .await?;
        if !inserted {
            return Err(ServiceError::DuplicateMark);
        }

        Ok(MarkAck {
            session_id: session.session_code,
            user_id: student.id,
            roll: student.username,
            taken_at: now,
            via: params.via,
        })
    }

    /// Reopens the window at `new_start` (or now) with a fresh QR challenge.
    pub async fn restart_attendance(
        &self,
        session_code: &str,
        caller: &Caller,
        new_start: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ServiceResult<WindowInfo> {
        let session = self.session_by_code(session_code).await?;
        let class = self.class_of(&session).await?;
        caller.ensure_can_manage(&class)?;

        let attendance_start = new_start.unwrap_or(now);
        let qr_payload = qr::challenge(self.qr_secret, &session.session_code, now)?;

        let mut active = session.into_active_model();
        active.attendance_start = Set(Some(attendance_start));
        active.qr_payload = Set(qr_payload);
        active.updated_at = Set(now);
        let session = active.update(self.db).await?;

        info!(
            session = %session.session_code,
            by = caller.id,
            attendance_start = %attendance_start,
            "attendance restarted"
        );

        let window_end = session.window_end().unwrap_or(attendance_start);
        Ok(WindowInfo {
            session_id: session.session_code,
            attendance_start,
            attendance_minutes: session.attendance_minutes,
            window_end,
            qr_payload: session.qr_payload,
        })
    }

    /// Per-session roster: present students in mark order, then absentees by roll.
    pub async fn session_details(
        &self,
        session_code: &str,
        caller: &Caller,
    ) -> ServiceResult<SessionDetails> {
        let session = self.session_by_code(session_code).await?;
        let class = self.class_of(&session).await?;
        caller.ensure_can_manage(&class)?;

        let faculty = user::Entity::find_by_id(class.assigned_to)
            .one(self.db)
            .await?
            .map(|f| FacultyInfo {
                id: f.id,
                roll: f.username,
                name: f.name,
            });

        let students = class.students(self.db).await?;
        let records = self.records_in_mark_order(session.id).await?;

        let mut names: HashMap<i64, String> =
            students.iter().map(|s| (s.id, s.name.clone())).collect();
        let missing: Vec<i64> = records
            .iter()
            .map(|r| r.user_id)
            .filter(|id| !names.contains_key(id))
            .collect();
        if !missing.is_empty() {
            for u in user::Entity::find()
                .filter(user::Column::Id.is_in(missing))
                .all(self.db)
                .await?
            {
                names.insert(u.id, u.name);
            }
        }

        let present: HashSet<i64> = records.iter().map(|r| r.user_id).collect();
        let mut roster: Vec<RosterEntry> = records
            .iter()
            .map(|r| RosterEntry {
                user_id: r.user_id,
                roll: r.roll.clone(),
                name: names.get(&r.user_id).cloned().unwrap_or_default(),
                status: PresenceStatus::Present,
                taken_at: Some(r.taken_at),
                via: Some(r.via),
            })
            .collect();
        let present_count = roster.len();

        roster.extend(
            students
                .iter()
                .filter(|s| !present.contains(&s.id))
                .map(|s| RosterEntry {
                    user_id: s.id,
                    roll: s.username.clone(),
                    name: s.name.clone(),
                    status: PresenceStatus::Absent,
                    taken_at: None,
                    via: None,
                }),
        );
        let absent_count = roster.len() - present_count;

        Ok(SessionDetails {
            window_end: session.window_end(),
            session_id: session.session_code,
            class_code: class.code,
            class_name: class.name,
            faculty,
            class_start: session.class_start,
            class_end: session.class_end,
            attendance_start: session.attendance_start,
            attendance_minutes: session.attendance_minutes,
            qr_payload: session.qr_payload,
            total_students: students.len(),
            present_count,
            absent_count,
            roster,
        })
    }

    /// Raw attendance list of a session, in mark order.
    pub async fn session_attendance(
        &self,
        session_code: &str,
        caller: &Caller,
    ) -> ServiceResult<SessionAttendance> {
        let session = self.session_by_code(session_code).await?;
        let class = self.class_of(&session).await?;
        caller.ensure_can_manage(&class)?;

        let attendance = self
            .records_in_mark_order(session.id)
            .await?
            .into_iter()
            .map(|r| AttendanceEntry {
                user_id: r.user_id,
                roll: r.roll,
                taken_at: r.taken_at,
                via: r.via,
            })
            .collect();

        Ok(SessionAttendance {
            session_id: session.session_code,
            class_code: class.code,
            attendance,
        })
    }

    /// Sessions visible to the caller, newest class start first.
    pub async fn list_sessions(
        &self,
        caller: &Caller,
        skip: u64,
        limit: u64,
    ) -> ServiceResult<SessionList> {
        caller.ensure_staff()?;
        if skip > MAX_ROW_COUNT || limit > MAX_ROW_COUNT {
            return Err(ServiceError::BadRequest(format!(
                "skip and limit must not exceed {MAX_ROW_COUNT}"
            )));
        }

        let mut query = attendance_session::Entity::find();
        if !caller.is_admin() {
            let class_ids = class::Model::ids_assigned_to(self.db, caller.id).await?;
            query = query.filter(attendance_session::Column::ClassId.is_in(class_ids));
        }

        let total = query.clone().count(self.db).await?;
        let sessions = query
            .order_by_desc(attendance_session::Column::ClassStart)
            .order_by_desc(attendance_session::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(self.db)
            .await?;

        let class_ids: HashSet<i64> = sessions.iter().map(|s| s.class_id).collect();
        let classes: HashMap<i64, class::Model> = class::Entity::find()
            .filter(class::Column::Id.is_in(class_ids.iter().copied()))
            .all(self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut student_counts = HashMap::with_capacity(class_ids.len());
        for id in &class_ids {
            student_counts.insert(*id, class_student::Model::count_for_class(self.db, *id).await?);
        }

        let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let attendance_counts =
            attendance_record::Model::counts_by_session(self.db, &session_ids).await?;

        let sessions: Vec<SessionSummary> = sessions
            .into_iter()
            .filter_map(|s| {
                let class = classes.get(&s.class_id)?;
                Some(SessionSummary {
                    attendance_count: attendance_counts.get(&s.id).copied().unwrap_or(0),
                    student_count: student_counts.get(&s.class_id).copied().unwrap_or(0),
                    session_id: s.session_code,
                    class_code: class.code.clone(),
                    class_name: class.name.clone(),
                    class_start: s.class_start,
                    class_end: s.class_end,
                    faculty_id: class.assigned_to,
                })
            })
            .collect();

        Ok(SessionList {
            count: sessions.len(),
            sessions,
            total,
            skip,
            limit,
        })
    }

    async fn class_by_code(&self, code: &str) -> ServiceResult<class::Model> {
        class::Model::find_by_code(self.db, code)
            .await?
            .ok_or_else(|| ServiceError::class_not_found(code))
    }

    async fn session_by_code(&self, code: &str) -> ServiceResult<attendance_session::Model> {
        attendance_session::Model::find_by_code(self.db, code)
            .await?
            .ok_or_else(|| ServiceError::session_not_found(code))
    }

    async fn class_of(&self, session: &attendance_session::Model) -> ServiceResult<class::Model> {
        class::Entity::find_by_id(session.class_id)
            .one(self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Class {} not found", session.class_id)))
    }

    async fn records_in_mark_order(
        &self,
        session_id: i64,
    ) -> ServiceResult<Vec<attendance_record::Model>> {
        Ok(attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .order_by_asc(attendance_record::Column::TakenAt)
            .order_by_asc(attendance_record::Column::Roll)
            .all(self.db)
            .await?)
    }
}
