#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use codeaudit_analyze::{AnalysisRequest, AnalysisService, ServiceError};
use codeaudit_core::{AnalysisConfig, Role};
use tempfile::TempDir;

/// In-memory service: queued replies, scripted failures, recorded requests.
#[derive(Default)]
pub struct ScriptedService {
    failing_roles: Vec<Role>,
    failing_subjects: Vec<(String, ServiceError)>,
    replies: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<AnalysisRequest>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call for `role` fails.
    pub fn fail_role(mut self, role: Role) -> Self {
        self.failing_roles.push(role);
        self
    }

    /// The per-file call for `subject` fails with `error`.
    pub fn fail_subject(mut self, subject: &str, error: ServiceError) -> Self {
        self.failing_subjects.push((subject.to_string(), error));
        self
    }

    /// Queue a reply used by the next successful call.
    pub fn reply(self, text: &str) -> Self {
        self.replies.borrow_mut().push_back(text.to_string());
        self
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.borrow().clone()
    }

    pub fn calls_for(&self, role: Role) -> usize {
        self.requests.borrow().iter().filter(|r| r.role == role).count()
    }

    /// Subjects of the per-file requests, in call order.
    pub fn file_subjects(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.role == Role::FileAnalysis)
            .filter_map(|r| {
                r.user_prompt
                    .lines()
                    .next()
                    .and_then(|line| line.strip_prefix("FILE ANALYSIS: "))
                    .map(str::to_string)
            })
            .collect()
    }
}

impl AnalysisService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn complete(&self, request: &AnalysisRequest) -> Result<String, ServiceError> {
        self.requests.borrow_mut().push(request.clone());
        let n = self.requests.borrow().len();

        if self.failing_roles.contains(&request.role) {
            return Err(ServiceError::other(format!("scripted failure for {}", request.role)));
        }
        if request.role == Role::FileAnalysis {
            let first_line = request.user_prompt.lines().next().unwrap_or_default();
            for (subject, error) in &self.failing_subjects {
                if first_line == format!("FILE ANALYSIS: {subject}") {
                    return Err(error.clone());
                }
            }
        }

        Ok(self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| format!("{} answer #{n}", request.role)))
    }
}

/// Build a tree of files under a fresh temporary directory.
pub fn tree(files: &[(&str, &[u8])]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (path, content) in files {
        let full = temp.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    temp
}

pub fn config(output_dir: &Path, max_files: usize) -> AnalysisConfig {
    AnalysisConfig::builder()
        .max_files(max_files)
        .output_dir(output_dir)
        .model("scripted-model")
        .build()
        .unwrap()
}

/// Names of the entries directly under `dir`, sorted.
pub fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
