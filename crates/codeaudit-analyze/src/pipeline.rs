//! Run controller: walk, analyze, store, consolidate, record.

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use codeaudit_core::{
    AnalysisConfig, AnalysisTarget, FALLBACK_REPORT_PREFIX, FINAL_REPORT_PREFIX, FileReport, Role,
    RunMetadata, RunStamp, SkipWarning,
};
use codeaudit_scan::{ContentLoader, EligibilityFilter, SourceWalker, WalkItem};

use crate::consolidate::Consolidator;
use crate::error::AnalysisError;
use crate::executor::UnitExecutor;
use crate::fallback::FallbackAggregator;
use crate::metadata::MetadataWriter;
use crate::progress::{PipelineProgress, RunState};
use crate::service::AnalysisService;
use crate::store::{ReportStore, write_unique};

const PROGRESS_CAPACITY: usize = 256;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub target: AnalysisTarget,
    pub stamp: RunStamp,
    /// Consolidated report (synthesized or fallback).
    pub output_file: PathBuf,
    pub metadata_file: PathBuf,
    /// Per-file report directory; `None` for document runs.
    pub reports_dir: Option<PathBuf>,
    /// Stored reports in discovery order.
    pub per_file_reports: Vec<FileReport>,
    pub fallback: bool,
    /// Consolidation error when the fallback ran.
    pub error: Option<String>,
    /// Files left out of the run.
    pub warnings: Vec<SkipWarning>,
}

impl RunOutcome {
    pub fn total_files_analyzed(&self) -> usize {
        self.per_file_reports.len()
    }

    pub fn skipped_files(&self) -> usize {
        self.warnings.len()
    }

    /// Bytes of per-file report text written.
    pub fn reports_bytes(&self) -> u64 {
        self.per_file_reports
            .iter()
            .map(|r| r.content.len() as u64)
            .sum()
    }
}

/// Work collected before the final report is written.
struct Collected {
    target: AnalysisTarget,
    stamp: RunStamp,
    reports: Vec<FileReport>,
    warnings: Vec<SkipWarning>,
    reports_dir: Option<PathBuf>,
}

/// Final text plus the consolidation error, if the fallback produced it.
struct FinalText {
    text: String,
    error: Option<String>,
}

/// Drives one analysis run end to end, sequentially.
pub struct AnalysisPipeline<S> {
    service: S,
    config: AnalysisConfig,
    cwd: Option<PathBuf>,
    progress_tx: broadcast::Sender<PipelineProgress>,
}

impl<S: AnalysisService> AnalysisPipeline<S> {
    pub fn new(service: S, config: AnalysisConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CAPACITY);
        Self {
            service,
            config,
            cwd: None,
            progress_tx,
        }
    }

    /// Directory walked when the input does not exist. Defaults to the
    /// process working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineProgress> {
        self.progress_tx.subscribe()
    }

    /// Analyze `input`: a report document, a directory, or (when neither
    /// exists) the working directory.
    pub fn run(&self, input: &Path) -> Result<RunOutcome, AnalysisError> {
        let cwd = match &self.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir().map_err(|e| AnalysisError::io(".", e))?,
        };
        let target = AnalysisTarget::resolve(input, &cwd);
        if let AnalysisTarget::WorkingDirectory(dir) = &target {
            warn!(
                input = %input.display(),
                dir = %dir.display(),
                "input not found, analyzing working directory"
            );
        }

        let stamp = RunStamp::now();
        info!(kind = ?target.kind(), path = %target.path().display(), stamp = %stamp, "starting run");

        if target.is_tree() {
            self.run_tree(target, stamp)
        } else {
            self.run_document(target, stamp)
        }
    }

    fn run_tree(&self, target: AnalysisTarget, stamp: RunStamp) -> Result<RunOutcome, AnalysisError> {
        let max_files = self.config.max_files;
        self.emit(RunState::Scanning, 0, Some(target.path()));

        let walker = SourceWalker::new(EligibilityFilter::from_config(&self.config))
            .with_output_dir(&self.config.output_dir);
        let loader = ContentLoader::new(self.config.max_chars);
        let executor = UnitExecutor::new(&self.service);
        let mut store = ReportStore::new(&self.config.output_dir, stamp.clone());

        let mut reports: Vec<FileReport> = Vec::new();
        let mut warnings = Vec::new();

        for item in walker.walk(target.path())? {
            if reports.len() >= max_files {
                info!(max_files, "file ceiling reached, stopping traversal");
                break;
            }
            let file = match item {
                WalkItem::Eligible(file) => file,
                WalkItem::Skipped(warning) => {
                    warnings.push(warning);
                    continue;
                }
            };
            let shown = file.display_path();
            let current = Some(file.relative_path.as_path());
            self.emit(RunState::Filtering, reports.len(), current);

            self.emit(RunState::Loading, reports.len(), current);
            let content = match loader.load(&file.absolute_path) {
                Ok(content) => content,
                Err(err) => {
                    warn!(file = %shown, error = %err, "skipping unreadable file");
                    warnings.push(SkipWarning::read_error(&file.absolute_path, &err));
                    continue;
                }
            };

            self.emit(RunState::Executing, reports.len(), current);
            let body = executor
                .analyze(Role::FileAnalysis, &shown, &content)
                .into_text();

            self.emit(RunState::Storing, reports.len(), current);
            match store.store(&file.relative_path, &body) {
                Ok(report) => {
                    info!(
                        file = %shown,
                        report = %report.report_path.display(),
                        n = reports.len() + 1,
                        max_files,
                        "report stored"
                    );
                    reports.push(report);
                }
                Err(err) => {
                    error!(file = %shown, error = %err, "failed to store report");
                }
            }
        }

        if reports.is_empty() {
            self.emit(RunState::Aborted, 0, None);
            return Err(AnalysisError::NoEligibleFiles {
                root: target.path().to_path_buf(),
            });
        }

        self.emit(RunState::Consolidating, reports.len(), None);
        let consolidator = Consolidator::new(&self.service, self.config.max_chars.saturating_mul(4));
        let final_text = match consolidator.consolidate_reports(&reports) {
            Ok(text) => FinalText { text, error: None },
            Err(err) => {
                error!(error = %err, "consolidation failed, concatenating stored reports");
                self.emit(RunState::Fallback, reports.len(), None);
                FinalText {
                    text: FallbackAggregator::new().aggregate(&reports),
                    error: Some(err.to_string()),
                }
            }
        };

        let collected = Collected {
            target,
            stamp,
            reports_dir: store.reports_dir().map(Path::to_path_buf),
            reports,
            warnings,
        };
        self.finish(collected, final_text, &[Role::FileAnalysis, Role::Synthesis])
    }

    fn run_document(&self, target: AnalysisTarget, stamp: RunStamp) -> Result<RunOutcome, AnalysisError> {
        let path = target.path();
        self.emit(RunState::Loading, 0, Some(path));
        let bytes = std::fs::read(path).map_err(|e| AnalysisError::io(path, e))?;
        let document = String::from_utf8_lossy(&bytes);
        info!(path = %path.display(), chars = document.chars().count(), "loaded report document");

        self.emit(RunState::Specialized, 0, Some(path));
        let consolidator = Consolidator::new(&self.service, self.config.max_chars.saturating_mul(4));
        let analyses = consolidator.run_specialized(&document);

        self.emit(RunState::Consolidating, 0, None);
        let final_text = match consolidator.consolidate_analyses(&analyses) {
            Ok(text) => FinalText { text, error: None },
            Err(err) => {
                error!(error = %err, "consolidation failed, concatenating specialized analyses");
                self.emit(RunState::Fallback, 0, None);
                FinalText {
                    text: FallbackAggregator::new().aggregate_analyses(&analyses),
                    error: Some(err.to_string()),
                }
            }
        };

        let roles: Vec<Role> = Role::SPECIALIZED
            .iter()
            .copied()
            .chain(std::iter::once(Role::Synthesis))
            .collect();
        let collected = Collected {
            target,
            stamp,
            reports: Vec::new(),
            warnings: Vec::new(),
            reports_dir: None,
        };
        self.finish(collected, final_text, &roles)
    }

    /// Write the final report and the metadata, then report `Done`.
    fn finish(
        &self,
        collected: Collected,
        final_text: FinalText,
        roles: &[Role],
    ) -> Result<RunOutcome, AnalysisError> {
        let Collected {
            target,
            stamp,
            reports,
            warnings,
            reports_dir,
        } = collected;

        let prefix = if final_text.error.is_some() {
            FALLBACK_REPORT_PREFIX
        } else {
            FINAL_REPORT_PREFIX
        };
        let output_file = write_unique(
            &self.config.output_dir,
            &format!("{prefix}_{stamp}"),
            "md",
            &final_text.text,
        )?;
        info!(path = %output_file.display(), "final report written");

        let mut metadata = RunMetadata::new(stamp.clone(), &target, &output_file, &reports)
            .with_roles(roles.iter().copied())
            .with_model(self.service.model())
            .with_skipped(warnings.len());
        if let Some(err) = &final_text.error {
            metadata = metadata.with_fallback(err.clone());
        }
        let metadata_file = MetadataWriter::new(&self.config.output_dir).write(&metadata)?;

        self.emit(RunState::Done, reports.len(), None);
        Ok(RunOutcome {
            target,
            stamp,
            output_file,
            metadata_file,
            reports_dir,
            per_file_reports: reports,
            fallback: final_text.error.is_some(),
            error: final_text.error,
            warnings,
        })
    }

    fn emit(&self, state: RunState, files_analyzed: usize, current_path: Option<&Path>) {
        // No subscribers is fine.
        let _ = self.progress_tx.send(PipelineProgress {
            state,
            files_analyzed,
            max_files: self.config.max_files,
            current_path: current_path.map(Path::to_path_buf),
        });
    }
}
