//! Passcode-gated upload of one issue: the PDF goes to object storage, then a
//! `{year, month, file_url}` row goes to the table. The two writes are not
//! atomic; a failed insert leaves the stored object behind and only logs it.

use crate::archive::audit;
use crate::archive::cancel::CancelToken;
use crate::archive::locale::{Locale, Notice, month_label};
use crate::archive::paths::ArchivePaths;
use crate::archive::remote::{ArchiveService, NewIssue, PDF_CONTENT_TYPE};
use crate::archive::util::now_epoch_millis;
use crate::archive::warn;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// A file that passed the picker's PDF filter. The filter only looks at the
/// name; the backend never verifies the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    name: String,
    bytes: Vec<u8>,
}

impl PickedFile {
    pub fn accepts(name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    #[cfg(test)]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Option<Self> {
        let name = name.into();
        Self::accepts(&name).then_some(Self { name, bytes })
    }

    pub fn pick(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("not a file path: {}", path.display()))?
            .to_string();
        if !Self::accepts(&name) {
            anyhow::bail!("only PDF files can be chosen: {}", path.display());
        }
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub file: Option<PickedFile>,
}

impl UploadForm {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.file.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFailure {
    MissingFields,
    Upload,
    Save,
}

impl UploadFailure {
    fn notice(self) -> Notice {
        match self {
            Self::MissingFields => Notice::MissingFields,
            Self::Upload => Notice::UploadFailed,
            Self::Save => Notice::SaveFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    Succeeded,
    Failed(UploadFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Locked { rejected: bool },
    Unlocked { form: UploadForm, phase: Phase },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Locked,
    Busy,
    MissingFields,
    UploadFailed,
    /// The object at `orphaned_path` stays in storage without a table row.
    SaveFailed { orphaned_path: String },
    Uploaded { path: String, issue: NewIssue },
    Cancelled,
}

pub fn storage_key(year: i32, month: u32, millis: i64, file_name: &str) -> String {
    format!("{year}/{month}/{millis}_{file_name}")
}

pub struct UploadFlow<S> {
    service: S,
    passcode: String,
    year_options: Vec<i32>,
    locale: Locale,
    state: UploadState,
    cancel: CancelToken,
    audit_paths: Option<ArchivePaths>,
    clock: fn() -> i64,
}

fn record(paths: Option<&ArchivePaths>, phase: &str, status: &str, message: &str) {
    let Some(paths) = paths else {
        return;
    };
    if let Err(err) = audit::append_event(paths, phase, status, message) {
        warn::emit("audit-write", "upload", phase, message, &format!("{err:#}"));
    }
}

impl<S: ArchiveService> UploadFlow<S> {
    pub fn new(
        service: S,
        passcode: impl Into<String>,
        year_options: Vec<i32>,
        locale: Locale,
    ) -> Self {
        Self {
            service,
            passcode: passcode.into(),
            year_options,
            locale,
            state: UploadState::Locked { rejected: false },
            cancel: CancelToken::new(),
            audit_paths: None,
            clock: now_epoch_millis,
        }
    }

    pub fn with_audit(mut self, paths: ArchivePaths) -> Self {
        self.audit_paths = Some(paths);
        self
    }

    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, UploadState::Unlocked { .. })
    }

    pub fn year_options(&self) -> &[i32] {
        &self.year_options
    }

    pub fn month_options(&self) -> Vec<(u32, String)> {
        (1..=12)
            .map(|month| (month, month_label(self.locale, month).into_owned()))
            .collect()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    /// Compare against the shared passcode. A match unlocks the form once;
    /// later calls while unlocked change nothing.
    pub fn login(&mut self, entered: &str) -> bool {
        if self.is_authenticated() {
            return true;
        }
        if self.passcode.is_empty() {
            warn::emit("passcode-unset", "upload", "login", "", "no upload passcode configured");
        } else if entered == self.passcode {
            self.state = UploadState::Unlocked {
                form: UploadForm::default(),
                phase: Phase::Idle,
            };
            return true;
        }
        self.state = UploadState::Locked { rejected: true };
        false
    }

    fn form_mut(&mut self) -> Option<&mut UploadForm> {
        match &mut self.state {
            UploadState::Unlocked { form, .. } => Some(form),
            UploadState::Locked { .. } => None,
        }
    }

    /// Values outside the picker's options leave the field unset.
    pub fn select_year(&mut self, year: i32) -> bool {
        let offered = self.year_options.contains(&year);
        let Some(form) = self.form_mut() else {
            return false;
        };
        form.year = offered.then_some(year);
        offered
    }

    pub fn select_month(&mut self, month: u32) -> bool {
        let offered = (1..=12).contains(&month);
        let Some(form) = self.form_mut() else {
            return false;
        };
        form.month = offered.then_some(month);
        offered
    }

    pub fn choose_file(&mut self, file: PickedFile) -> bool {
        let Some(form) = self.form_mut() else {
            return false;
        };
        form.file = Some(file);
        true
    }

    pub fn form(&self) -> Option<&UploadForm> {
        match &self.state {
            UploadState::Unlocked { form, .. } => Some(form),
            UploadState::Locked { .. } => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(
            self.state,
            UploadState::Unlocked { phase, .. } if phase != Phase::Submitting
        )
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        let UploadState::Unlocked { form, phase } = &mut self.state else {
            return SubmitOutcome::Locked;
        };
        if *phase == Phase::Submitting {
            return SubmitOutcome::Busy;
        }
        let (Some(year), Some(month), Some(file)) = (form.year, form.month, form.file.as_ref())
        else {
            *phase = Phase::Failed(UploadFailure::MissingFields);
            return SubmitOutcome::MissingFields;
        };
        if self.cancel.is_cancelled() {
            return SubmitOutcome::Cancelled;
        }

        *phase = Phase::Submitting;
        let path = storage_key(year, month, (self.clock)(), file.name());
        let uploaded = self
            .service
            .upload_file(&path, &file.bytes, file.content_type());
        if self.cancel.is_cancelled() {
            return SubmitOutcome::Cancelled;
        }
        if let Err(err) = uploaded {
            warn::emit(err.code(), "upload", "upload-file", &path, &err.to_string());
            record(self.audit_paths.as_ref(), "upload", "failed", &path);
            *phase = Phase::Failed(UploadFailure::Upload);
            return SubmitOutcome::UploadFailed;
        }
        record(self.audit_paths.as_ref(), "upload", "ok", &path);

        let issue = NewIssue {
            year,
            month,
            file_url: self.service.public_url(&path),
        };
        let inserted = self.service.insert_record(&issue);
        if self.cancel.is_cancelled() {
            return SubmitOutcome::Cancelled;
        }
        if let Err(err) = inserted {
            warn::emit(err.code(), "upload", "insert-record", &path, &err.to_string());
            warn::emit(
                "orphaned-object",
                "upload",
                "insert-record",
                &path,
                "object stored without a table row",
            );
            record(self.audit_paths.as_ref(), "insert", "orphaned", &path);
            *phase = Phase::Failed(UploadFailure::Save);
            return SubmitOutcome::SaveFailed {
                orphaned_path: path,
            };
        }

        record(self.audit_paths.as_ref(), "insert", "ok", &issue.file_url);
        *form = UploadForm::default();
        *phase = Phase::Succeeded;
        SubmitOutcome::Uploaded { path, issue }
    }

    /// The status line the page shows for the current state, if any.
    pub fn status(&self) -> Option<Notice> {
        match self.state {
            UploadState::Locked { rejected: true } => Some(Notice::WrongPasscode),
            UploadState::Locked { rejected: false } => None,
            UploadState::Unlocked { phase, .. } => match phase {
                Phase::Idle => None,
                Phase::Submitting => Some(Notice::Uploading),
                Phase::Succeeded => Some(Notice::Uploaded),
                Phase::Failed(failure) => Some(failure.notice()),
            },
        }
    }

    pub fn status_text(&self) -> Option<&'static str> {
        self.status().map(|notice| notice.text(self.locale))
    }
}
