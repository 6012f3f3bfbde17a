//! Attendance analytics over a window of a class's sessions.
//!
//! Every view follows the same pipeline: load the class (and check the caller
//! may see it), resolve the window to a session set, count presences per
//! student once, then derive the view from those counts.

use crate::error::{ServiceError, ServiceResult};
use crate::identity::Caller;
use crate::MAX_ROW_COUNT;
use chrono::{DateTime, Datelike, Duration, Utc};
use db::models::{attendance_record, attendance_session, class, class_student, user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_LAST_N_SESSIONS: u64 = 30;
pub const AT_RISK_RATE: u32 = 80;
pub const DEFAULT_AT_RISK_LIMIT: u64 = 50;
pub const DEFAULT_EXCELLENT: u32 = 90;
pub const DEFAULT_GOOD: u32 = 80;
pub const DEFAULT_TREND_PERIODS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    Days,
    Sessions,
    All,
}

impl FromStr for WindowMode {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "days" => Ok(Self::Days),
            "sessions" => Ok(Self::Sessions),
            other => Err(ServiceError::BadRequest(format!(
                "mode must be 'days' or 'sessions', got '{other}'"
            ))),
        }
    }
}

/// Which sessions of a class an analytics request covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSpec {
    /// Sessions whose class start lies in `[from, to]`.
    Days {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    /// The `last_n` most recent sessions.
    Sessions { last_n: Option<u64> },
    /// Every session of the class.
    All,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::Days {
            from: None,
            to: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WindowRange {
    Days {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    Sessions {
        last_n_sessions: u64,
    },
}

/// A window resolved against the store. Sessions are newest first.
#[derive(Debug, Clone)]
pub struct ResolvedWindow {
    pub mode: WindowMode,
    pub range: Option<WindowRange>,
    pub sessions: Vec<attendance_session::Model>,
}

impl ResolvedWindow {
    pub fn session_count(&self) -> u64 {
        self.sessions.len() as u64
    }

    pub fn session_ids(&self) -> Vec<i64> {
        self.sessions.iter().map(|s| s.id).collect()
    }

    pub fn latest(&self) -> Option<&attendance_session::Model> {
        self.sessions.first()
    }
}

/// Presence count per student over one resolved window.
#[derive(Debug, Clone, Default)]
pub struct PresenceCounts(HashMap<i64, u64>);

impl PresenceCounts {
    pub fn of(&self, user_id: i64) -> u64 {
        self.0.get(&user_id).copied().unwrap_or(0)
    }
}

/// `round(100 * n / d)` with halves rounded up; 0 when `d` is 0.
pub fn percent(n: u64, d: u64) -> u32 {
    if d == 0 {
        return 0;
    }
    ((200 * n + d) / (2 * d)) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn for_rate(rate: u32) -> Self {
        match rate {
            0..60 => Self::High,
            60..80 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LastClassStatus {
    Present,
    Absent,
    #[serde(rename = "N/A")]
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Excellent,
    Good,
    Poor,
}

/// Excellent is strictly above `excellent`; good is `good..=excellent`.
pub fn bucket(rate: u32, excellent: u32, good: u32) -> Bucket {
    if rate > excellent {
        Bucket::Excellent
    } else if rate >= good {
        Bucket::Good
    } else {
        Bucket::Poor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Weekly,
    #[default]
    Monthly,
}

impl FromStr for Period {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ServiceError::BadRequest(format!(
                "period must be 'weekly' or 'monthly', got '{other}'"
            ))),
        }
    }
}

impl Period {
    /// Bucket label: ISO week (`2025-W09`) or year-month (`2025-03`).
    pub fn label(self, at: DateTime<Utc>) -> String {
        match self {
            Period::Weekly => {
                let week = at.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Period::Monthly => at.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub sessions: u64,
    pub attendance_count: u64,
    pub attendance_rate: u32,
}

/// Groups `(class_start, attendance_count)` pairs into period buckets and keeps
/// the most recent `last_n`, oldest first.
pub fn bucket_trend(
    sessions: &[(DateTime<Utc>, u64)],
    period: Period,
    total_students: u64,
    last_n: usize,
) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for (start, count) in sessions {
        let entry = buckets.entry(period.label(*start)).or_default();
        entry.0 += 1;
        entry.1 += count;
    }

    let skip = buckets.len().saturating_sub(last_n);
    buckets
        .into_iter()
        .skip(skip)
        .map(|(label, (sessions, attendance_count))| TrendPoint {
            period: label,
            sessions,
            attendance_count,
            attendance_rate: percent(attendance_count, sessions * total_students),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub class_id: String,
    pub total_students: u64,
    pub avg_attendance_rate: u32,
    pub at_risk_students: u64,
    pub total_absences: u64,
    pub session_count: u64,
    pub mode: WindowMode,
    pub range: Option<WindowRange>,
}

#[derive(Debug, Clone, Copy)]
pub struct AtRiskQuery {
    pub threshold: u32,
    pub skip: u64,
    pub limit: u64,
}

impl Default for AtRiskQuery {
    fn default() -> Self {
        Self {
            threshold: AT_RISK_RATE,
            skip: 0,
            limit: DEFAULT_AT_RISK_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AtRiskStudent {
    pub user_id: i64,
    pub name: String,
    pub roll: String,
    pub attendance_rate: u32,
    pub risk_level: RiskLevel,
    pub last_class_status: LastClassStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtRiskReport {
    pub class_id: String,
    pub students: Vec<AtRiskStudent>,
    /// Matching students before pagination.
    pub total: u64,
    pub threshold: u32,
    pub skip: u64,
    pub limit: u64,
    pub session_count: u64,
    pub mode: WindowMode,
    pub range: Option<WindowRange>,
}

#[derive(Debug, Clone, Copy)]
pub struct DistributionQuery {
    pub excellent: u32,
    pub good: u32,
}

impl Default for DistributionQuery {
    fn default() -> Self {
        Self {
            excellent: DEFAULT_EXCELLENT,
            good: DEFAULT_GOOD,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdLabels {
    pub excellent: String,
    pub good: String,
    pub poor: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub class_id: String,
    pub excellent: u64,
    pub good: u64,
    pub poor: u64,
    pub total: u64,
    pub thresholds: ThresholdLabels,
    pub session_count: u64,
    pub mode: WindowMode,
    pub range: Option<WindowRange>,
}

#[derive(Debug, Clone)]
pub struct TrendQuery {
    pub period: Period,
    pub window: WindowSpec,
    pub last_n: usize,
}

impl Default for TrendQuery {
    fn default() -> Self {
        Self {
            period: Period::default(),
            window: WindowSpec::All,
            last_n: DEFAULT_TREND_PERIODS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub class_id: String,
    pub period: Period,
    pub mode: WindowMode,
    pub range: Option<WindowRange>,
    pub trend: Vec<TrendPoint>,
}

/// Everything the per-student views need, computed once per request.
struct Snapshot {
    class: class::Model,
    roster: Vec<user::Model>,
    window: ResolvedWindow,
    presence: PresenceCounts,
}

impl Snapshot {
    fn rate_of(&self, user_id: i64) -> u32 {
        percent(self.presence.of(user_id), self.window.session_count())
    }
}

pub struct AnalyticsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AnalyticsService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolves `spec` to the class's sessions, newest first.
    pub async fn resolve_window(
        &self,
        class_id: i64,
        spec: &WindowSpec,
        now: DateTime<Utc>,
    ) -> ServiceResult<ResolvedWindow> {
        let base = attendance_session::Entity::find()
            .filter(attendance_session::Column::ClassId.eq(class_id))
            .order_by_desc(attendance_session::Column::ClassStart)
            .order_by_desc(attendance_session::Column::Id);

        match *spec {
            WindowSpec::Days { from, to } => {
                let to = to.unwrap_or(now);
                let from = match from {
                    Some(from) => from,
                    None => to
                        .checked_sub_signed(Duration::days(DEFAULT_WINDOW_DAYS))
                        .ok_or_else(|| ServiceError::BadRequest("'to' is out of range".into()))?,
                };
                if from > to {
                    return Err(ServiceError::BadRequest(
                        "'from' must not be after 'to'".into(),
                    ));
                }
                let sessions = base
                    .filter(attendance_session::Column::ClassStart.between(from, to))
                    .all(self.db)
                    .await?;
                Ok(ResolvedWindow {
                    mode: WindowMode::Days,
                    range: Some(WindowRange::Days { from, to }),
                    sessions,
                })
            }
            WindowSpec::Sessions { last_n } => {
                let last_n = last_n.unwrap_or(DEFAULT_LAST_N_SESSIONS);
                if last_n == 0 || last_n > MAX_ROW_COUNT {
                    return Err(ServiceError::BadRequest(format!(
                        "sessions must be between 1 and {MAX_ROW_COUNT}"
                    )));
                }
                let sessions = base.limit(last_n).all(self.db).await?;
                Ok(ResolvedWindow {
                    mode: WindowMode::Sessions,
                    range: Some(WindowRange::Sessions {
                        last_n_sessions: last_n,
                    }),
                    sessions,
                })
            }
            WindowSpec::All => Ok(ResolvedWindow {
                mode: WindowMode::All,
                range: None,
                sessions: base.all(self.db).await?,
            }),
        }
    }

    /// One grouped query over the window's attendance records.
    pub async fn presence_counts(&self, window: &ResolvedWindow) -> ServiceResult<PresenceCounts> {
        let counts =
            attendance_record::Model::counts_by_user(self.db, &window.session_ids()).await?;
        Ok(PresenceCounts(
            counts
                .into_iter()
                .map(|(user, n)| (user, n.max(0) as u64))
                .collect(),
        ))
    }

    pub async fn overview(
        &self,
        caller: &Caller,
        class_code: &str,
        spec: &WindowSpec,
        now: DateTime<Utc>,
    ) -> ServiceResult<Overview> {
        let snap = self.snapshot(caller, class_code, spec, now).await?;
        let session_count = snap.window.session_count();
        let total_students = snap.roster.len() as u64;

        let mut presences = 0u64;
        let mut at_risk = 0u64;
        for student in &snap.roster {
            presences += snap.presence.of(student.id);
            if session_count > 0 && snap.rate_of(student.id) < AT_RISK_RATE {
                at_risk += 1;
            }
        }
        let possible = session_count * total_students;

        Ok(Overview {
            class_id: snap.class.code,
            total_students,
            avg_attendance_rate: percent(presences, possible),
            at_risk_students: at_risk,
            total_absences: possible.saturating_sub(presences),
            session_count,
            mode: snap.window.mode,
            range: snap.window.range,
        })
    }

    pub async fn at_risk(
        &self,
        caller: &Caller,
        class_code: &str,
        spec: &WindowSpec,
        query: AtRiskQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<AtRiskReport> {
        if query.limit == 0 {
            return Err(ServiceError::BadRequest("limit must be at least 1".into()));
        }
        if query.threshold > 100 {
            return Err(ServiceError::BadRequest(
                "threshold must be between 0 and 100".into(),
            ));
        }

        let snap = self.snapshot(caller, class_code, spec, now).await?;
        let session_count = snap.window.session_count();

        let mut matching: Vec<(u32, &user::Model)> = if session_count == 0 {
            Vec::new()
        } else {
            snap.roster
                .iter()
                .map(|s| (snap.rate_of(s.id), s))
                .filter(|(rate, _)| *rate < query.threshold)
                .collect()
        };
        matching.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.username.cmp(&b.username)));
        let total = matching.len() as u64;

        let latest_present: Option<HashSet<i64>> = match snap.window.latest() {
            Some(latest) => Some(
                attendance_record::Entity::find()
                    .select_only()
                    .column(attendance_record::Column::UserId)
                    .filter(attendance_record::Column::SessionId.eq(latest.id))
                    .into_tuple::<i64>()
                    .all(self.db)
                    .await?
                    .into_iter()
                    .collect(),
            ),
            None => None,
        };

        let students = matching
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .map(|(rate, s)| AtRiskStudent {
                user_id: s.id,
                name: s.name.clone(),
                roll: s.username.clone(),
                attendance_rate: rate,
                risk_level: RiskLevel::for_rate(rate),
                last_class_status: match &latest_present {
                    Some(set) if set.contains(&s.id) => LastClassStatus::Present,
                    Some(_) => LastClassStatus::Absent,
                    None => LastClassStatus::NotAvailable,
                },
            })
            .collect();

        Ok(AtRiskReport {
            class_id: snap.class.code,
            students,
            total,
            threshold: query.threshold,
            skip: query.skip,
            limit: query.limit,
            session_count,
            mode: snap.window.mode,
            range: snap.window.range,
        })
    }

    pub async fn distribution(
        &self,
        caller: &Caller,
        class_code: &str,
        spec: &WindowSpec,
        query: DistributionQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<Distribution> {
        if query.excellent > 100 || query.good > query.excellent {
            return Err(ServiceError::BadRequest(
                "thresholds must satisfy good <= excellent <= 100".into(),
            ));
        }

        let snap = self.snapshot(caller, class_code, spec, now).await?;

        let (mut excellent, mut good, mut poor) = (0u64, 0u64, 0u64);
        for student in &snap.roster {
            match bucket(snap.rate_of(student.id), query.excellent, query.good) {
                Bucket::Excellent => excellent += 1,
                Bucket::Good => good += 1,
                Bucket::Poor => poor += 1,
            }
        }

        Ok(Distribution {
            class_id: snap.class.code,
            excellent,
            good,
            poor,
            total: snap.roster.len() as u64,
            thresholds: ThresholdLabels {
                excellent: format!(">{}%", query.excellent),
                good: format!("{}–{}%", query.good, query.excellent),
                poor: format!("<{}%", query.good),
            },
            session_count: snap.window.session_count(),
            mode: snap.window.mode,
            range: snap.window.range,
        })
    }

    pub async fn trend(
        &self,
        caller: &Caller,
        class_code: &str,
        query: &TrendQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<Trend> {
        if query.last_n == 0 {
            return Err(ServiceError::BadRequest("last_n must be at least 1".into()));
        }

        let class = self.authorized_class(caller, class_code).await?;
        let window = self.resolve_window(class.id, &query.window, now).await?;
        let total_students = class_student::Model::count_for_class(self.db, class.id).await?;

        let per_session =
            attendance_record::Model::counts_by_session(self.db, &window.session_ids()).await?;
        let points: Vec<(DateTime<Utc>, u64)> = window
            .sessions
            .iter()
            .map(|s| {
                let n = per_session.get(&s.id).copied().unwrap_or(0).max(0) as u64;
                (s.class_start, n)
            })
            .collect();

        Ok(Trend {
            class_id: class.code,
            period: query.period,
            mode: window.mode,
            range: window.range,
            trend: bucket_trend(&points, query.period, total_students, query.last_n),
        })
    }

    async fn authorized_class(&self, caller: &Caller, class_code: &str) -> ServiceResult<class::Model> {
        let class = class::Model::find_by_code(self.db, class_code)
            .await?
            .ok_or_else(|| ServiceError::class_not_found(class_code))?;
        caller.ensure_can_manage(&class)?;
        Ok(class)
    }

    async fn snapshot(
        &self,
        caller: &Caller,
        class_code: &str,
        spec: &WindowSpec,
        now: DateTime<Utc>,
    ) -> ServiceResult<Snapshot> {
        let class = self.authorized_class(caller, class_code).await?;
        let window = self.resolve_window(class.id, spec, now).await?;
        let presence = self.presence_counts(&window).await?;
        let roster = class.students(self.db).await?;

        Ok(Snapshot {
            class,
            roster,
            window,
            presence,
        })
    }
}
