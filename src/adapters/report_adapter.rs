//! Profile report adapters: a JSON array or a flat CSV table.

use crate::domain::error::ScreenerError;
use crate::domain::profile::StockProfile;
use crate::ports::report_port::ReportPort;
use std::io::Write;
use std::str::FromStr;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown report format {other:?}, expected json or csv")),
        }
    }
}

impl ReportFormat {
    pub fn adapter(self) -> Box<dyn ReportPort> {
        match self {
            ReportFormat::Json => Box::new(JsonReportAdapter),
            ReportFormat::Csv => Box::new(CsvReportAdapter),
        }
    }
}

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(&self, profiles: &[StockProfile], out: &mut dyn Write) -> Result<(), ScreenerError> {
        serde_json::to_writer_pretty(&mut *out, profiles)?;
        writeln!(out)?;
        Ok(())
    }
}

/// One row per profile. Columns follow the first profile: the fixed
/// fields, then return windows, criteria labels and `score`.
pub struct CsvReportAdapter;

fn header(profile: Option<&StockProfile>) -> Vec<String> {
    let mut columns: Vec<String> = ["code", "exchange", "date", "close"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    if let Some(p) = profile {
        columns.extend(p.returns.iter().map(|(key, _)| key.clone()));
        columns.extend(p.criteria.iter().map(|(label, _)| label.clone()));
        if p.score.is_some() {
            columns.push("score".to_string());
        }
    }
    columns
}

fn row(profile: &StockProfile) -> Vec<String> {
    let mut fields = vec![
        profile.code.clone(),
        profile.exchange.clone(),
        profile.date.format("%Y-%m-%d").to_string(),
        profile.close.to_string(),
    ];
    fields.extend(profile.returns.iter().map(|(_, v)| v.to_string()));
    fields.extend(profile.criteria.iter().map(|(_, passed)| passed.to_string()));
    if let Some(score) = profile.score {
        fields.push(score.to_string());
    }
    fields
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, profiles: &[StockProfile], out: &mut dyn Write) -> Result<(), ScreenerError> {
        let mut writer = csv::Writer::from_writer(out);
        writer
            .write_record(header(profiles.first()))
            .map_err(std::io::Error::from)?;
        for profile in profiles {
            writer.write_record(row(profile)).map_err(std::io::Error::from)?;
        }
        writer.flush()?;
        Ok(())
    }
}
