use crate::analysis::{
    AnalysisResult, CriticalIncident, GroupCount, RECENT_CRITICAL_LIMIT, TOP_N,
};
use crate::model::{self, Severity};
use crate::storage::Pool;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};

/// Columns the aggregator groups by. Kept as an enum so column names never come from input.
#[derive(Debug, Clone, Copy)]
enum GroupColumn {
    Severity,
    SourceIp,
    Username,
    IncidentType,
}

impl GroupColumn {
    fn name(self) -> &'static str {
        match self {
            GroupColumn::Severity => "severity",
            GroupColumn::SourceIp => "source_ip",
            GroupColumn::Username => "username",
            GroupColumn::IncidentType => "incident_type",
        }
    }
}

/// Runs the fixed query set over the incidents table.
pub struct IncidentAggregator;

impl IncidentAggregator {
    /// Compute every statistic using `conn`. Callers wanting a single snapshot pass a
    /// transaction.
    pub fn compute(conn: &Connection) -> Result<AnalysisResult> {
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))
            .context("failed to count incidents")?;

        Ok(AnalysisResult {
            total,
            by_severity: Self::group_counts(conn, GroupColumn::Severity, None)?,
            top_ips: Self::group_counts(conn, GroupColumn::SourceIp, Some(TOP_N))?,
            top_users: Self::group_counts(conn, GroupColumn::Username, Some(TOP_N))?,
            top_types: Self::group_counts(conn, GroupColumn::IncidentType, Some(TOP_N))?,
            recent_critical: Self::recent_critical(conn, RECENT_CRITICAL_LIMIT)?,
        })
    }

    /// `(value, count)` per distinct value of `column`, highest count first.
    fn group_counts(
        conn: &Connection,
        column: GroupColumn,
        limit: Option<usize>,
    ) -> Result<Vec<GroupCount>> {
        let col = column.name();
        let sql = format!(
            "SELECT {col}, COUNT(*) AS qtd
             FROM incidents
             GROUP BY {col}
             ORDER BY qtd DESC
             LIMIT ?1"
        );
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |n| n as i64);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(GroupCount {
                    key: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to group incidents by {col}"))?;

        Ok(rows)
    }

    fn recent_critical(conn: &Connection, limit: usize) -> Result<Vec<CriticalIncident>> {
        let mut stmt = conn.prepare(
            "SELECT timestamp, source_ip, username, incident_type
             FROM incidents
             WHERE severity = ?1
             ORDER BY timestamp DESC
             LIMIT ?2",
        )?;

        let rows: Vec<(String, String, String, String)> = stmt
            .query_map(params![Severity::Critical.as_str(), limit], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<_, _>>()
            .context("failed to list recent critical incidents")?;

        let mut incidents = Vec::with_capacity(rows.len());
        for (timestamp, source_ip, username, incident_type) in rows {
            incidents.push(CriticalIncident {
                timestamp: model::parse_timestamp(&timestamp)?,
                source_ip,
                username,
                incident_type: incident_type.parse()?,
            });
        }
        Ok(incidents)
    }
}

/// Check out a connection and compute all statistics inside one read transaction.
pub fn analyze(pool: &Pool) -> Result<AnalysisResult> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    let result = IncidentAggregator::compute(&tx)?;
    tx.commit()?;

    tracing::debug!(
        total = result.total,
        severities = result.by_severity.len(),
        critical = result.recent_critical.len(),
        "Analysis complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Vocabulary;
    use crate::model::{IncidentType, NewIncident};
    use crate::seed::Seeder;
    use crate::storage;
    use chrono::{Duration, NaiveDateTime};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn base_time() -> NaiveDateTime {
        model::parse_timestamp("2024-06-15 12:00:00").unwrap()
    }

    fn pool_with(incidents: &[NewIncident]) -> (tempfile::TempDir, Pool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = storage::open_pool(&dir.path().join("incidents.db")).unwrap();
        storage::insert_incidents(&pool.get().unwrap(), incidents).unwrap();
        (dir, pool)
    }

    fn counts(groups: &[GroupCount]) -> Vec<(&str, i64)> {
        groups.iter().map(|g| (g.key.as_str(), g.count)).collect()
    }

    #[test]
    fn test_empty_store() {
        let (_dir, pool) = pool_with(&[]);
        let result = analyze(&pool).unwrap();
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn test_top_lists_are_sorted_and_truncated() {
        // ip/user number i appears i times.
        let mut incidents = Vec::new();
        for i in 1..=7i64 {
            for _ in 0..i {
                incidents.push(NewIncident::new(
                    base_time() - Duration::minutes(i),
                    format!("10.0.0.{i}"),
                    format!("user{i}"),
                    IncidentType::PortScan,
                    Severity::Low,
                ));
            }
        }
        let (_dir, pool) = pool_with(&incidents);

        let result = analyze(&pool).unwrap();
        assert_eq!(result.total, 28);
        assert_eq!(counts(&result.by_severity), [("Low", 28)]);
        assert_eq!(
            counts(&result.top_ips),
            [
                ("10.0.0.7", 7),
                ("10.0.0.6", 6),
                ("10.0.0.5", 5),
                ("10.0.0.4", 4),
                ("10.0.0.3", 3)
            ]
        );
        assert_eq!(result.top_users.len(), TOP_N);
        assert_eq!(result.top_users[0].key, "user7");
        assert_eq!(counts(&result.top_types), [("Port Scan", 28)]);
        assert!(result.recent_critical.is_empty());
    }

    #[test]
    fn test_by_severity_descending() {
        let mut incidents = Vec::new();
        for (sev, n) in [(Severity::Low, 1), (Severity::High, 4), (Severity::Critical, 2)] {
            for _ in 0..n {
                incidents.push(NewIncident::new(
                    base_time(),
                    "8.8.8.8",
                    "admin",
                    IncidentType::Malware,
                    sev,
                ));
            }
        }
        let (_dir, pool) = pool_with(&incidents);

        let result = analyze(&pool).unwrap();
        assert_eq!(
            counts(&result.by_severity),
            [("High", 4), ("Critical", 2), ("Low", 1)]
        );
    }

    #[test]
    fn test_recent_critical_filters_orders_and_limits() {
        let mut incidents = Vec::new();
        // 12 critical incidents, one per hour going back.
        for h in 0..12 {
            incidents.push(NewIncident::new(
                base_time() - Duration::hours(h + 1),
                "45.33.32.156",
                "analyst",
                IncidentType::DataExfilAttempt,
                Severity::Critical,
            ));
        }
        // Newer but not critical.
        for m in 0..3 {
            incidents.push(NewIncident::new(
                base_time() - Duration::minutes(m),
                "172.16.0.3",
                "guest",
                IncidentType::Malware,
                Severity::High,
            ));
        }
        let (_dir, pool) = pool_with(&incidents);

        let result = analyze(&pool).unwrap();
        let recent = &result.recent_critical;
        assert_eq!(recent.len(), RECENT_CRITICAL_LIMIT);
        assert_eq!(recent[0].timestamp, base_time() - Duration::hours(1));
        assert_eq!(recent[9].timestamp, base_time() - Duration::hours(10));
        assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(recent.iter().all(|c| c.source_ip == "45.33.32.156"));
        assert!(recent
            .iter()
            .all(|c| c.incident_type == IncidentType::DataExfilAttempt));
    }

    #[test]
    fn test_counts_are_conserved_on_seeded_data() {
        let dir = tempfile::tempdir().unwrap();
        let pool = storage::open_pool(&dir.path().join("incidents.db")).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        Seeder::new(pool.clone(), Vocabulary::default())
            .seed(300, base_time(), &mut rng)
            .unwrap();

        let result = analyze(&pool).unwrap();
        assert_eq!(result.total, 300);
        assert_eq!(result.by_severity.iter().map(|g| g.count).sum::<i64>(), 300);
        assert!(result.by_severity.len() <= Severity::ALL.len());

        let conn = pool.get().unwrap();
        let all_types =
            IncidentAggregator::group_counts(&conn, GroupColumn::IncidentType, None).unwrap();
        assert_eq!(all_types.iter().map(|g| g.count).sum::<i64>(), 300);
        for top in &result.top_types {
            assert!(all_types.contains(top));
        }

        assert!(result.top_ips.len() <= TOP_N);
        assert!(result.top_users.len() <= TOP_N);
        assert!(result.top_types.len() <= TOP_N);
        for list in [&result.top_ips, &result.top_users, &result.top_types] {
            assert!(list.windows(2).all(|w| w[0].count >= w[1].count));
        }
    }
}
