//! Incident data model: severities, incident types, and stored rows.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp layout used for the `timestamp` column and the report.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown severity label: {0:?}")]
    UnknownSeverity(String),

    #[error("unknown incident type label: {0:?}")]
    UnknownIncidentType(String),

    #[error("malformed timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
}

/// Severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities in ascending order. Weight vectors are positional over this array.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| ModelError::UnknownSeverity(s.to_string()))
    }
}

/// Kind of security incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    BruteForce,
    Malware,
    Phishing,
    PortScan,
    SuspiciousLogin,
    DataExfilAttempt,
}

impl IncidentType {
    pub const ALL: [IncidentType; 6] = [
        IncidentType::BruteForce,
        IncidentType::Malware,
        IncidentType::Phishing,
        IncidentType::PortScan,
        IncidentType::SuspiciousLogin,
        IncidentType::DataExfilAttempt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::BruteForce => "Brute Force",
            IncidentType::Malware => "Malware",
            IncidentType::Phishing => "Phishing",
            IncidentType::PortScan => "Port Scan",
            IncidentType::SuspiciousLogin => "Suspicious Login",
            IncidentType::DataExfilAttempt => "Data Exfil Attempt",
        }
    }

    /// Severity weights `[Low, Medium, High, Critical]` used when generating this type.
    ///
    /// Exfiltration and malware lean severe, noisy network activity leans low/medium,
    /// everything else leans low.
    pub fn severity_weights(&self) -> [u32; 4] {
        match self {
            IncidentType::DataExfilAttempt | IncidentType::Malware => [5, 20, 35, 40],
            IncidentType::BruteForce | IncidentType::PortScan => [20, 35, 30, 15],
            IncidentType::Phishing | IncidentType::SuspiciousLogin => [35, 35, 20, 10],
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncidentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ModelError::UnknownIncidentType(s.to_string()))
    }
}

/// Parse a stored `timestamp` column value.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ModelError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
        ModelError::Timestamp {
            value: value.to_string(),
            source,
        }
    })
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// An incident that has not been written yet.
///
/// The description is computed from the other fields on construction and cannot be
/// set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIncident {
    pub timestamp: NaiveDateTime,
    pub source_ip: String,
    pub username: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    description: String,
}

impl NewIncident {
    pub fn new(
        timestamp: NaiveDateTime,
        source_ip: impl Into<String>,
        username: impl Into<String>,
        incident_type: IncidentType,
        severity: Severity,
    ) -> Self {
        let source_ip = source_ip.into();
        let username = username.into();
        let description = describe(incident_type, &username, &source_ip);
        Self {
            timestamp,
            source_ip,
            username,
            incident_type,
            severity,
            description,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Build the description line for an incident.
pub fn describe(incident_type: IncidentType, username: &str, source_ip: &str) -> String {
    format!("{incident_type} detected for user '{username}' from IP {source_ip}")
}

/// A row read back from the `incidents` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incident {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub source_ip: String,
    pub username: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub description: String,
}
