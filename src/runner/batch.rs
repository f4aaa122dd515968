//! The batch orchestrator.
//!
//! One run: probe the API, accumulate the full pending set, then walk it one
//! submission at a time through detail fetch, download, review, grade
//! submission, and cleanup. Throttle-prone legs go through the retrying
//! executor; a broken review capability aborts the run instead of silently
//! zero-grading work that could have been graded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::download;
use crate::error::{GradrError, Result};
use crate::lms::client::LmsClient;
use crate::lms::types::{GradePayload, Submission, SubmissionDetail};
use crate::probe::{AvailabilityProber, ProbeOutcome};
use crate::review::{feedback, FileKind, Reviewer};
use crate::runner::outcome::{ItemOutcome, RunOutcome};
use crate::runner::pacing;
use crate::runner::stats::RunStats;
use crate::throttle::backoff::BackoffPolicy;
use crate::throttle::executor::{RequestExecutor, Sleeper};

/// Extra minute on top of a server-hinted probe wait.
const PROBE_WAIT_EXTRA_MINUTES: u64 = 1;

/// Conservative wait when the probe got no hint.
const PROBE_WAIT_FALLBACK_MINUTES: u64 = 20;

/// How many pending items the pre-run preview names.
const PREVIEW_ITEMS: usize = 5;

/// Zero-grade note for a submission with no attached files.
const MISSING_FILE_NOTE: &str = "No submission file was found for this attempt. \
    Please upload your work and resubmit to be graded.";

/// Everything a finished run reports.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stats: RunStats,
}

/// Drives the end-to-end pipeline across the full pending queue.
pub struct BatchRunner<C, R, S>
where
    C: LmsClient,
    R: Reviewer,
    S: Sleeper,
{
    client: Arc<C>,
    reviewer: Arc<R>,
    sleeper: Arc<S>,
    executor: RequestExecutor<S>,
    config: Config,
}

impl<C, R, S> BatchRunner<C, R, S>
where
    C: LmsClient,
    R: Reviewer,
    S: Sleeper,
{
    pub fn new(client: Arc<C>, reviewer: Arc<R>, sleeper: Arc<S>, config: Config) -> Self {
        let executor = RequestExecutor::new(
            BackoffPolicy::new(config.retry_base_delay),
            config.max_retries,
            sleeper.clone(),
        );
        Self {
            client,
            reviewer,
            sleeper,
            executor,
            config,
        }
    }

    /// Run the state machine to a terminal state.
    pub async fn run(&self) -> RunReport {
        let mut stats = RunStats::new();

        if let Err(reason) = self.gate().await {
            return RunReport {
                outcome: RunOutcome::Aborted(reason),
                stats,
            };
        }

        let pending = match self.list_pending().await {
            Ok(pending) => pending,
            Err(err) => {
                return RunReport {
                    outcome: RunOutcome::Aborted(format!("listing failed: {err}")),
                    stats,
                };
            }
        };

        if pending.is_empty() {
            tracing::info!("no pending submissions");
            return RunReport {
                outcome: RunOutcome::Completed,
                stats,
            };
        }

        tracing::info!(total = pending.len(), "pending submissions accumulated");
        for submission in pending.iter().take(PREVIEW_ITEMS) {
            tracing::info!(
                student = %submission.name,
                assignment = %submission.assessment_name,
                "queued"
            );
        }

        let total = pending.len();
        for (index, submission) in pending.iter().enumerate() {
            tracing::info!(
                index = index + 1,
                total,
                student = %submission.name,
                assignment = %submission.assessment_name,
                attempt_id = %submission.attempt_id,
                "processing submission"
            );

            match self.process_submission(submission).await {
                Ok(outcome) => {
                    tracing::info!(
                        student = %submission.name,
                        outcome = outcome.label(),
                        "submission finished"
                    );
                    let label = format!("{} - {}", submission.name, submission.assessment_name);
                    stats.record(&label, &outcome);
                }
                // Review capability is broken; stop before zero-grading
                // gradable work. Later items stay pending.
                Err(err) => {
                    return RunReport {
                        outcome: RunOutcome::Aborted(format!(
                            "review failed for {}: {err}",
                            submission.name
                        )),
                        stats,
                    };
                }
            }

            if index + 1 < total {
                if (index + 1) % self.config.batch_size as usize == 0 {
                    pacing::wait_between_batches(
                        self.sleeper.as_ref(),
                        self.config.min_delay_between_batches,
                        self.config.max_delay_between_batches,
                    )
                    .await;
                } else {
                    pacing::wait_between_requests(
                        self.sleeper.as_ref(),
                        self.config.min_delay_between_requests,
                        self.config.max_delay_between_requests,
                    )
                    .await;
                }
            }
        }

        RunReport {
            outcome: RunOutcome::Completed,
            stats,
        }
    }

    /// Probe before starting; on throttling wait once and probe again.
    async fn gate(&self) -> std::result::Result<(), String> {
        let prober = AvailabilityProber::new(self.client.clone());

        tracing::info!("probing API availability");
        match prober.probe().await {
            ProbeOutcome::Available => return Ok(()),
            ProbeOutcome::Other(reason) => return Err(format!("API unavailable: {reason}")),
            ProbeOutcome::RateLimited { wait_minutes } => {
                let minutes = wait_minutes
                    .map(|m| m as u64 + PROBE_WAIT_EXTRA_MINUTES)
                    .unwrap_or(PROBE_WAIT_FALLBACK_MINUTES);
                tracing::warn!(minutes, hinted = wait_minutes.is_some(), "rate limited before start");
                pacing::wait_with_countdown(self.sleeper.as_ref(), minutes).await;
            }
        }

        tracing::info!("re-probing after wait");
        match prober.probe().await {
            ProbeOutcome::Available => Ok(()),
            ProbeOutcome::RateLimited { .. } => Err("still rate limited after waiting".to_string()),
            ProbeOutcome::Other(reason) => Err(format!("API unavailable: {reason}")),
        }
    }

    /// Accumulate the full pending set so the run can report an accurate
    /// total up front.
    async fn list_pending(&self) -> Result<Vec<Submission>> {
        let per_page = self.config.batch_size;
        let mut pending = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .executor
                .execute("submission listing", || {
                    self.client.list_submissions(page, per_page)
                })
                .await?;
            if batch.is_empty() {
                break;
            }
            pending.extend(batch);
            page += 1;
        }
        Ok(pending)
    }

    /// The per-submission pipeline. `Err` means the review capability is
    /// broken and the run must abort; everything else is an `ItemOutcome`.
    async fn process_submission(&self, submission: &Submission) -> Result<ItemOutcome> {
        let attempt_id = submission.attempt_id.as_str();
        let detail = match self
            .executor
            .execute("submission detail", || self.client.fetch_detail(attempt_id))
            .await
        {
            Ok(detail) => detail,
            Err(err) => {
                tracing::warn!(%err, "detail fetch failed");
                return Ok(ItemOutcome::Failed(err.to_string()));
            }
        };

        let files = match download::download_files(
            self.client.as_ref(),
            &detail,
            &self.config.download_dir,
        )
        .await
        {
            Ok(files) => files,
            Err(err) => {
                tracing::warn!(%err, "download failed");
                return Ok(ItemOutcome::Failed(err.to_string()));
            }
        };

        if files.is_empty() {
            tracing::warn!(student = %submission.name, "no files attached, grading zero");
            return Ok(self
                .submit_zero(&detail, MISSING_FILE_NOTE, ItemOutcome::MissingFile, &files)
                .await);
        }

        // The first file is the canonical submission.
        let main_file = &files[0];
        match FileKind::classify(main_file) {
            FileKind::LegacyDocument => {
                let note = format!(
                    "This document format ({}) cannot be reviewed directly. \
                     Please convert your document to PDF and resubmit.",
                    extension_of(main_file)
                );
                Ok(self
                    .submit_zero(&detail, &note, ItemOutcome::LegacyDocument, &files)
                    .await)
            }
            FileKind::Unsupported => {
                let note = format!(
                    "Invalid file format ({}). Please submit your work as a PDF.",
                    extension_of(main_file)
                );
                Ok(self
                    .submit_zero(&detail, &note, ItemOutcome::InvalidFormat, &files)
                    .await)
            }
            FileKind::Pdf => self.review_and_submit(submission, &detail, &files).await,
        }
    }

    /// Zero-grade with an explanatory note; cleans up on success.
    async fn submit_zero(
        &self,
        detail: &SubmissionDetail,
        note: &str,
        outcome: ItemOutcome,
        files: &[PathBuf],
    ) -> ItemOutcome {
        let html = feedback::plain_note_html(note);
        match self.submit_grade(detail, 0, html).await {
            Ok(()) => {
                download::remove_files(files);
                outcome
            }
            Err(err) => {
                tracing::warn!(%err, "zero-grade submission failed, keeping files");
                ItemOutcome::Failed(err.to_string())
            }
        }
    }

    async fn review_and_submit(
        &self,
        submission: &Submission,
        detail: &SubmissionDetail,
        files: &[PathBuf],
    ) -> Result<ItemOutcome> {
        let main_file = &files[0];
        tracing::info!(file = %main_file.display(), "sending for review");
        let outcome = self
            .reviewer
            .review(main_file, Some(&submission.name), self.config.max_score)
            .await;

        if outcome.terminal_failure {
            // Files stay on disk for manual review.
            return Err(GradrError::Review(outcome.raw_feedback));
        }

        let score = outcome
            .score
            .unwrap_or_else(|| feedback::default_score(self.config.max_score));
        let narrative = feedback::narrative_only(&outcome.raw_feedback);
        let html = feedback::to_html(&narrative);
        tracing::info!(
            score,
            max_score = self.config.max_score,
            attempts = outcome.retry_count,
            "review complete"
        );

        match self.submit_grade(detail, score, html).await {
            Ok(()) => {
                download::remove_files(files);
                Ok(ItemOutcome::Reviewed { score })
            }
            Err(err) => {
                tracing::warn!(%err, "grade submission failed, keeping files");
                Ok(ItemOutcome::Failed(err.to_string()))
            }
        }
    }

    async fn submit_grade(&self, detail: &SubmissionDetail, mark: u32, html: String) -> Result<()> {
        let payload = GradePayload::new(&detail.exercise, mark, html);
        let attempt_id = detail.exercise.attempt_id.as_str();
        self.executor
            .execute("grade submission", || {
                self.client.submit_grade(attempt_id, &payload)
            })
            .await?;
        tracing::info!(attempt_id, mark, "grade submitted");
        Ok(())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("essay.DOCX")), ".docx");
        assert_eq!(extension_of(Path::new("work.pdf")), ".pdf");
        assert_eq!(extension_of(Path::new("no_extension")), "unknown");
    }

    #[test]
    fn test_missing_file_note_reads_as_feedback() {
        assert!(MISSING_FILE_NOTE.contains("resubmit"));
        assert!(!MISSING_FILE_NOTE.contains('\n'));
    }
}
