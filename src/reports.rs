//! Aggregate reports over package and transaction logs

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PackageEntry {
    #[serde(alias = "fecha")]
    pub date: DateTime<Utc>,
    #[serde(alias = "estado")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    #[serde(alias = "fecha")]
    pub date: DateTime<Utc>,
    #[serde(alias = "monto")]
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    DailySales,
    PackagesByStatus,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::DailySales => "daily_sales",
            ReportKind::PackagesByStatus => "packages_by_status",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily_sales" | "ventas_diarias" => Ok(ReportKind::DailySales),
            "packages_by_status" | "paquetes_por_estado" => Ok(ReportKind::PackagesByStatus),
            other => Err(AppError::InvalidInput(format!("Unknown report type: {}", other))),
        }
    }
}

/// Calendar dates, both ends included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AppError> {
        if from > to {
            return Err(AppError::InvalidInput(format!(
                "Report range starts after it ends: {} > {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Parse `YYYY-MM-DD` bounds
    pub fn parse(from: &str, to: &str) -> Result<Self, AppError> {
        let parse_day = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
                AppError::InvalidInput(format!("Invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
            })
        };
        Self::new(parse_day(from)?, parse_day(to)?)
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from <= day && day <= self.to
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySalesRow {
    pub date: NaiveDate,
    pub amount: f64,
    /// Packages registered that day
    pub packages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySalesReport {
    pub rows: Vec<DailySalesRow>,
    pub total: f64,
    /// Mean over days with sales; 0 without any
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub status: String,
    pub count: usize,
    /// Share of all packages in range, two decimals
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub rows: Vec<StatusRow>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    DailySales(DailySalesReport),
    PackagesByStatus(StatusReport),
}

impl Report {
    pub fn title(&self) -> &'static str {
        match self {
            Report::DailySales(_) => "Daily Sales",
            Report::PackagesByStatus(_) => "Packages by Status",
        }
    }
}

pub fn generate(
    kind: ReportKind,
    range: DateRange,
    packages: &[PackageEntry],
    transactions: &[Transaction],
) -> Report {
    let packages: Vec<&PackageEntry> = packages.iter().filter(|p| range.contains(&p.date)).collect();
    let transactions: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| range.contains(&t.date))
        .collect();

    debug!(
        "{} report for {}..={}: {} packages, {} transactions in range",
        kind,
        range.from,
        range.to,
        packages.len(),
        transactions.len()
    );

    match kind {
        ReportKind::DailySales => Report::DailySales(daily_sales(&packages, &transactions)),
        ReportKind::PackagesByStatus => Report::PackagesByStatus(packages_by_status(&packages)),
    }
}

fn daily_sales(packages: &[&PackageEntry], transactions: &[&Transaction]) -> DailySalesReport {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in transactions {
        *per_day.entry(t.date.date_naive()).or_insert(0.0) += t.amount;
    }

    let rows: Vec<DailySalesRow> = per_day
        .into_iter()
        .map(|(date, amount)| DailySalesRow {
            date,
            amount,
            packages: packages.iter().filter(|p| p.date.date_naive() == date).count(),
        })
        .collect();

    let total: f64 = rows.iter().map(|r| r.amount).sum();
    let average = if rows.is_empty() {
        0.0
    } else {
        total / rows.len() as f64
    };

    DailySalesReport {
        rows,
        total,
        average,
    }
}

fn packages_by_status(packages: &[&PackageEntry]) -> StatusReport {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for p in packages {
        *counts.entry(p.status.as_str()).or_insert(0) += 1;
    }

    let total = packages.len();
    let rows = counts
        .into_iter()
        .map(|(status, count)| StatusRow {
            status: status.to_string(),
            count,
            percentage: (count as f64 / total as f64 * 10_000.0).round() / 100.0,
        })
        .collect();

    StatusReport { rows, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn pkg(date: &str, status: &str) -> PackageEntry {
        PackageEntry {
            date: at(date),
            status: status.to_string(),
        }
    }

    fn tx(date: &str, amount: f64) -> Transaction {
        Transaction {
            date: at(date),
            amount,
        }
    }

    fn january() -> DateRange {
        DateRange::parse("2025-01-01", "2025-01-31").unwrap()
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("ventas_diarias".parse::<ReportKind>().unwrap(), ReportKind::DailySales);
        assert_eq!(
            "packages_by_status".parse::<ReportKind>().unwrap(),
            ReportKind::PackagesByStatus
        );
        let err = "rutas_mas_utilizadas".parse::<ReportKind>().unwrap_err();
        assert_eq!(err.error_code(), "invalid_input");
    }

    #[test]
    fn test_range_validation() {
        assert!(DateRange::parse("2025-02-01", "2025-01-01").is_err());
        assert!(DateRange::parse("01/02/2025", "2025-03-01").is_err());
        let single = DateRange::parse("2025-01-15", "2025-01-15").unwrap();
        assert!(single.contains(&at("2025-01-15T23:59:59Z")));
        assert!(!single.contains(&at("2025-01-16T00:00:00Z")));
    }

    #[test]
    fn test_daily_sales() {
        let packages = vec![
            pkg("2025-01-10T09:00:00Z", "entregado"),
            pkg("2025-01-10T15:00:00Z", "en_transito"),
            pkg("2025-01-12T10:00:00Z", "entregado"),
        ];
        let transactions = vec![
            tx("2025-01-12T10:05:00Z", 40.0),
            tx("2025-01-10T09:10:00Z", 25.5),
            tx("2025-01-10T15:30:00Z", 14.5),
            tx("2025-02-01T08:00:00Z", 999.0),
        ];

        let Report::DailySales(report) = generate(ReportKind::DailySales, january(), &packages, &transactions)
        else {
            panic!("wrong report kind");
        };

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(report.rows[0].amount, 40.0);
        assert_eq!(report.rows[0].packages, 2);
        assert_eq!(report.rows[1].packages, 1);
        assert_eq!(report.total, 80.0);
        assert_eq!(report.average, 40.0);
    }

    #[test]
    fn test_daily_sales_includes_last_day() {
        let transactions = vec![tx("2025-01-31T18:00:00Z", 10.0)];
        let Report::DailySales(report) = generate(ReportKind::DailySales, january(), &[], &transactions)
        else {
            panic!("wrong report kind");
        };
        assert_eq!(report.total, 10.0);
    }

    #[test]
    fn test_daily_sales_without_data() {
        let Report::DailySales(report) = generate(ReportKind::DailySales, january(), &[], &[]) else {
            panic!("wrong report kind");
        };
        assert!(report.rows.is_empty());
        assert_eq!(report.total, 0.0);
        assert_eq!(report.average, 0.0);
    }

    #[test]
    fn test_packages_by_status() {
        let packages = vec![
            pkg("2025-01-10T09:00:00Z", "entregado"),
            pkg("2025-01-11T09:00:00Z", "en_transito"),
            pkg("2025-01-12T09:00:00Z", "entregado"),
            pkg("2024-12-31T23:00:00Z", "pendiente"),
        ];
        let Report::PackagesByStatus(report) =
            generate(ReportKind::PackagesByStatus, january(), &packages, &[])
        else {
            panic!("wrong report kind");
        };

        assert_eq!(report.total, 3);
        let statuses: Vec<&str> = report.rows.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, vec!["en_transito", "entregado"]);
        assert_eq!(report.rows[0].percentage, 33.33);
        assert_eq!(report.rows[1].count, 2);
        assert_eq!(report.rows[1].percentage, 66.67);
    }

    #[test]
    fn test_entries_accept_spanish_keys() {
        let entry: PackageEntry =
            serde_json::from_str(r#"{"fecha": "2025-01-10T09:00:00Z", "estado": "entregado"}"#).unwrap();
        assert_eq!(entry.status, "entregado");
        let t: Transaction =
            serde_json::from_str(r#"{"fecha": "2025-01-10T09:00:00Z", "monto": 12.5}"#).unwrap();
        assert_eq!(t.amount, 12.5);
    }

    #[test]
    fn test_report_serializes_with_kind_tag() {
        let report = generate(ReportKind::PackagesByStatus, january(), &[], &[]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "packages_by_status");
        assert_eq!(json["total"], 0);
    }
}
