//! Rendering of a finished run.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rosterbot_scheduler::{Alert, RunSummary};
use serde::Serialize;
use std::fmt::Write as _;

use crate::cli::output::OutputFormat;

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: &'a RunSummary,
}

impl<'a> RunReport<'a> {
    pub fn new(summary: &'a RunSummary) -> Self {
        Self {
            generated_at: Utc::now(),
            summary,
        }
    }

    pub fn render(&self, format: &OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Human => self.human(),
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
            OutputFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    fn human(&self) -> String {
        let summary = self.summary;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Run summary ({})",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let _ = writeln!(out, "\nWorklists");
        for program in &summary.programs {
            match &program.skipped {
                Some(reason) => {
                    let _ = writeln!(out, "  {} (skipped: {reason})", program.program);
                }
                None if program.worklists.is_empty() => {
                    let _ = writeln!(out, "  {}: nothing to carry over", program.program);
                }
                None => {
                    let _ = writeln!(out, "  {}", program.program);
                    for worklist in &program.worklists {
                        let _ = writeln!(
                            out,
                            "    {}: {}",
                            worklist.day,
                            worklist.names.join(", ")
                        );
                    }
                }
            }
        }

        let _ = writeln!(out, "\nOutcomes");
        if summary.outcomes.is_empty() {
            let _ = writeln!(out, "  none");
        }
        for record in &summary.outcomes {
            let _ = writeln!(
                out,
                "  {} {} - {} - {}: {}",
                record.outcome.marker(),
                record.program,
                record.day,
                record.student,
                record.outcome
            );
        }

        if !summary.alerts.is_empty() {
            let _ = writeln!(out, "\nAlerts");
            for alert in &summary.alerts {
                let _ = writeln!(out, "  {}", alert_line(alert));
            }
        }

        let _ = writeln!(
            out,
            "\n{} enrolled, {} failed, {} alert(s)",
            summary.enrolled_count(),
            summary.failed_count(),
            summary.alerts.len()
        );
        out
    }
}

fn alert_line(alert: &Alert) -> String {
    match alert {
        Alert::Waitlist {
            program,
            day,
            names,
        } => format!(
            "⚠ {program} - {day}: {} student(s) on the waitlist: {}. Consider enrolling them if there is space available.",
            names.len(),
            names.join(", ")
        ),
        Alert::LowAttendance {
            program,
            day,
            student,
            phone,
            present,
            slots,
            re_enroll,
        } => format!(
            "⚠ {program} - {day}: low attendance for {student} ({phone}), present {present} out of {slots} sessions, re-enroll: {}",
            if *re_enroll { "yes" } else { "no" }
        ),
        Alert::AmbiguousMatch {
            program,
            day,
            student,
            candidates,
        } => format!(
            "⚠ {program} - {day}: {student} matched {candidates} accounts, select the correct one manually"
        ),
        Alert::DayLabelMismatch {
            program,
            unmatched,
            current,
        } => format!(
            "⚠ {program}: no current day labelled {} (current days: {})",
            unmatched.join(", "),
            current.join(", ")
        ),
        Alert::StepFailed {
            program,
            day: Some(day),
            reason,
        } => format!("✗ {program} - {day}: {reason}"),
        Alert::StepFailed {
            program,
            day: None,
            reason,
        } => format!("✗ {program}: {reason}"),
    }
}
