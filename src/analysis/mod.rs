//! Aggregate statistics over the stored incidents.

pub mod aggregator;

pub use self::aggregator::{analyze, IncidentAggregator};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::IncidentType;

/// Maximum entries in each "top" list.
pub const TOP_N: usize = 5;
/// Maximum entries in [`AnalysisResult::recent_critical`].
pub const RECENT_CRITICAL_LIMIT: usize = 10;

/// A grouped value and how many incidents carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

/// A Critical incident as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriticalIncident {
    pub timestamp: NaiveDateTime,
    pub source_ip: String,
    pub username: String,
    pub incident_type: IncidentType,
}

/// Result of the fixed query set, all read from one snapshot.
///
/// Group lists are sorted by descending count; order among equal counts is whatever
/// SQLite returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub total: i64,
    pub by_severity: Vec<GroupCount>,
    pub top_ips: Vec<GroupCount>,
    pub top_users: Vec<GroupCount>,
    pub top_types: Vec<GroupCount>,
    /// Newest first.
    pub recent_critical: Vec<CriticalIncident>,
}
