//! Report retrieval and rendering.

pub mod parser;

use std::fmt::Write as _;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{ClientResult, JobId, TranscriptionReport};
use crate::session::SessionManager;
use crate::task::run_cancellable;

pub use parser::{parse_sections, ReportSections};

/// Sections the renderer knows how to present, in display order.
pub const KNOWN_SECTIONS: [(&str, &str); 6] = [
    ("RÉSUMÉ EXÉCUTIF", "Résumé Exécutif"),
    ("CONTEXTE ET OBJECTIF", "Contexte et Objectif"),
    ("POINTS CLÉS DISCUTÉS", "Points Clés Discutés"),
    ("DÉCISIONS PRISES", "Décisions Prises"),
    ("ACTIONS À ENTREPRENDRE", "Actions à Entreprendre"),
    ("PROCHAINES ÉTAPES", "Prochaines Étapes"),
];

/// A rendered block of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBlock {
    pub heading: String,
    pub body: String,
}

/// A fetched report together with its parsed sections.
#[derive(Debug, Clone)]
pub struct ReportView {
    pub report: TranscriptionReport,
    pub sections: ReportSections,
}

impl ReportView {
    pub fn new(report: TranscriptionReport) -> Self {
        let sections = parse_sections(&report.raw_summary_text);
        Self { report, sections }
    }

    /// Blocks for known sections that are present and non-empty. Missing
    /// sections are not an error; they are simply not shown.
    pub fn blocks(&self) -> Vec<ReportBlock> {
        KNOWN_SECTIONS
            .iter()
            .filter_map(|(key, heading)| {
                self.sections
                    .get(*key)
                    .filter(|body| !body.is_empty())
                    .map(|body| ReportBlock {
                        heading: heading.to_string(),
                        body: body.clone(),
                    })
            })
            .collect()
    }

    /// Plain-text rendering for terminals.
    pub fn render(&self) -> String {
        let report = &self.report;
        let mut out = String::new();

        let _ = writeln!(out, "{}", report.title);
        let mut meta = vec![format_date(&report.date)];
        if let Some(minutes) = report.duration_minutes {
            meta.push(format!("{} min", minutes));
        }
        if let Some(count) = report.participant_count.filter(|c| *c > 0) {
            meta.push(format!(
                "{} participant{}",
                count,
                if count > 1 { "s" } else { "" }
            ));
        }
        let _ = writeln!(out, "{}", meta.join(" | "));

        for block in self.blocks() {
            let _ = writeln!(out, "\n## {}\n{}", block.heading, block.body);
        }

        if !report.speaker_summaries.is_empty() {
            let _ = writeln!(out, "\n## Participants");
            for (speaker, summary) in &report.speaker_summaries {
                let _ = writeln!(out, "{}: {}", speaker, summary.trim());
            }
        }

        if !report.transcript_segments.is_empty() {
            let _ = writeln!(out, "\n## Transcription");
            for segment in &report.transcript_segments {
                let mut line = String::new();
                if let Some(ts) = &segment.timestamp {
                    let _ = write!(line, "[{}] ", ts);
                }
                if let Some(speaker) = &segment.speaker_label {
                    let _ = write!(line, "{}: ", speaker);
                }
                line.push_str(segment.text.trim());
                let _ = writeln!(out, "{}", line);
            }
        }

        out
    }
}

/// Fetches reports for the signed-in user. Reports are not cached.
pub struct ReportReader {
    session: Arc<SessionManager>,
}

impl ReportReader {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub async fn open(&self, job_id: JobId, cancel: &CancellationToken) -> ClientResult<ReportView> {
        let backend = self.session.backend().clone();
        let report = run_cancellable(
            cancel,
            self.session
                .protected(|token| async move { backend.get_report(&token, job_id).await }),
        )
        .await?;

        let view = ReportView::new(report);
        info!(
            "Opened report for job {} ({} section(s))",
            job_id,
            view.sections.len()
        );
        Ok(view)
    }
}

/// Format a backend timestamp as a short date, keeping it as-is if unparseable.
pub fn format_date(raw: &str) -> String {
    let trimmed = raw.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
            return parsed.format("%d/%m/%Y %H:%M").to_string();
        }
    }
    trimmed.to_string()
}

/// Format seconds as `m:ss`, or `N/A` when unknown.
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s > 0.0 => {
            let total = s.floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "N/A".to_string(),
    }
}
