use crate::routes::common::{DayEdge, parse_count, parse_instant, parse_opt};
use serde::Deserialize;
use services::ServiceError;
use services::analytics::{
    AtRiskQuery, DEFAULT_AT_RISK_LIMIT, DEFAULT_TREND_PERIODS, DistributionQuery, AT_RISK_RATE,
    DEFAULT_EXCELLENT, DEFAULT_GOOD, Period, TrendQuery, WindowMode, WindowSpec,
};

/// Raw query string of every analytics endpoint. Each handler validates only
/// the fields it uses.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    pub class_id: Option<String>,
    pub mode: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Window size in `sessions` mode.
    pub sessions: Option<String>,
    pub threshold: Option<String>,
    pub skip: Option<String>,
    pub limit: Option<String>,
    pub excellent: Option<String>,
    pub good: Option<String>,
    pub period: Option<String>,
    pub last_n: Option<String>,
}

impl AnalysisQuery {
    pub fn class_code(&self) -> Result<&str, ServiceError> {
        self.class_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::BadRequest("Missing class_id".into()))
    }

    /// Window for overview, at-risk and distribution: `days` unless told otherwise.
    pub fn window(&self) -> Result<WindowSpec, ServiceError> {
        self.window_or(WindowMode::Days)
    }

    /// Without `mode`, trend covers every session unless `from`/`to` is given.
    pub fn trend_window(&self) -> Result<WindowSpec, ServiceError> {
        if self.mode.is_none() && self.from.is_none() && self.to.is_none() {
            return self.window_or(WindowMode::All);
        }
        self.window_or(WindowMode::Days)
    }

    fn window_or(&self, default: WindowMode) -> Result<WindowSpec, ServiceError> {
        let mode = match self.mode.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => m.parse::<WindowMode>()?,
            None => default,
        };

        Ok(match mode {
            WindowMode::Days => WindowSpec::Days {
                from: parse_instant("from", self.from.as_deref(), DayEdge::Start)?,
                to: parse_instant("to", self.to.as_deref(), DayEdge::End)?,
            },
            WindowMode::Sessions => WindowSpec::Sessions {
                last_n: parse_count("sessions", self.sessions.as_deref())?,
            },
            WindowMode::All => WindowSpec::All,
        })
    }

    pub fn at_risk(&self) -> Result<AtRiskQuery, ServiceError> {
        Ok(AtRiskQuery {
            threshold: parse_opt("threshold", self.threshold.as_deref())?.unwrap_or(AT_RISK_RATE),
            skip: parse_count("skip", self.skip.as_deref())?.unwrap_or(0),
            limit: parse_count("limit", self.limit.as_deref())?.unwrap_or(DEFAULT_AT_RISK_LIMIT),
        })
    }

    pub fn distribution(&self) -> Result<DistributionQuery, ServiceError> {
        Ok(DistributionQuery {
            excellent: parse_opt("excellent", self.excellent.as_deref())?
                .unwrap_or(DEFAULT_EXCELLENT),
            good: parse_opt("good", self.good.as_deref())?.unwrap_or(DEFAULT_GOOD),
        })
    }

    pub fn trend(&self) -> Result<TrendQuery, ServiceError> {
        let period = match self.period.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p.parse::<Period>()?,
            None => Period::default(),
        };
        Ok(TrendQuery {
            period,
            window: self.trend_window()?,
            last_n: parse_opt("last_n", self.last_n.as_deref())?.unwrap_or(DEFAULT_TREND_PERIODS),
        })
    }
}
