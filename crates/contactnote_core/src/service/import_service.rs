//! Contact import pipeline and its per-session gate.
//!
//! # Responsibility
//! - Pull the full contact set from a `ContactSource` and upsert it by id.
//! - Decide, per application session, whether import may run now.
//!
//! # Invariants
//! - Every run is a full refresh; no diffing against stored state.
//! - Import never runs before read and write permission are granted.
//! - After one successful run the session does not import again.
//! - A missing permission is an outcome, not an error.

use crate::model::contact::Contact;
use crate::repo::contact_repo::ContactRepository;
use crate::repo::RepoError;
use crate::source::contact_source::{ContactSource, SourceError};
use crate::source::permission::{ContactPermission, PermissionGate};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Failure of an import run after its precondition was met.
#[derive(Debug)]
pub enum ImportError {
    /// The platform read failed.
    SourceRead(SourceError),
    /// The bulk upsert failed; the contacts table is left unchanged.
    Storage(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceRead(err) => write!(f, "contact import read failed: {err}"),
            Self::Storage(err) => write!(f, "contact import write failed: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SourceRead(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<SourceError> for ImportError {
    fn from(value: SourceError) -> Self {
        Self::SourceRead(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Summary of one completed import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows written by the upsert (equals rows read from the source).
    pub imported: usize,
}

/// Result of asking the session to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    /// Import ran in this call.
    Imported(ImportReport),
    /// Import already succeeded earlier in this session.
    AlreadyImported,
    /// Host must request this permission; import is deferred until granted.
    PermissionRequired(ContactPermission),
    /// Host reported a denial; nothing ran and nothing is retried.
    Deferred(ContactPermission),
}

/// What the session decided before any I/O happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPlan {
    Run,
    Skip(ImportStatus),
}

/// Import pipeline over a contact source and contact repository.
pub struct ImportService<S: ContactSource, R: ContactRepository> {
    source: S,
    repo: R,
}

impl<S: ContactSource, R: ContactRepository> ImportService<S, R> {
    pub fn new(source: S, repo: R) -> Self {
        Self { source, repo }
    }

    /// Reads every contact from the source and upserts them by id.
    ///
    /// Errors propagate unchanged; nothing is retried.
    pub fn import_contacts(&self) -> Result<ImportReport, ImportError> {
        let started_at = Instant::now();
        info!("event=contacts_import module=import status=start");

        let result = self.read_and_store();
        match &result {
            Ok(report) => info!(
                "event=contacts_import module=import status=ok count={} duration_ms={}",
                report.imported,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=contacts_import module=import status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                import_error_code(err),
                err
            ),
        }
        result
    }

    fn read_and_store(&self) -> Result<ImportReport, ImportError> {
        let contacts = self
            .source
            .read_contacts()?
            .into_iter()
            .map(Contact::from)
            .collect::<Vec<_>>();
        let imported = self.repo.upsert_contacts(&contacts)?;
        Ok(ImportReport { imported })
    }
}

/// Once-per-session import guard.
///
/// Mirrors the host flow: check read, then write, then import. The
/// permission-result callback is the only retry trigger.
#[derive(Debug, Clone, Default)]
pub struct ImportSession {
    imported: bool,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an import already succeeded in this session.
    pub fn is_imported(&self) -> bool {
        self.imported
    }

    /// Decides what session start should do given current grants.
    pub fn plan_start(&self, gate: &(impl PermissionGate + ?Sized)) -> ImportPlan {
        if self.imported {
            return ImportPlan::Skip(ImportStatus::AlreadyImported);
        }

        match gate.first_missing() {
            Some(permission) => ImportPlan::Skip(ImportStatus::PermissionRequired(permission)),
            None => ImportPlan::Run,
        }
    }

    /// Decides what a host permission callback should do.
    pub fn plan_permission_result(
        &self,
        permission: ContactPermission,
        granted: bool,
    ) -> ImportPlan {
        if !granted {
            info!(
                "event=contacts_import module=import status=deferred permission={}",
                permission.as_str()
            );
            return ImportPlan::Skip(ImportStatus::Deferred(permission));
        }
        if self.imported {
            return ImportPlan::Skip(ImportStatus::AlreadyImported);
        }
        ImportPlan::Run
    }

    /// Records the outcome of a run started from a `Run` plan.
    ///
    /// Only success closes the session; a failed run may be retried by the
    /// next grant callback.
    pub fn record(&mut self, result: &Result<ImportReport, ImportError>) {
        if result.is_ok() {
            self.mark_imported();
        }
    }

    /// Closes the session after a successful run executed elsewhere.
    pub fn mark_imported(&mut self) {
        self.imported = true;
    }

    /// Runs session-start gating and, when allowed, the import itself.
    pub fn start<S: ContactSource, R: ContactRepository>(
        &mut self,
        gate: &(impl PermissionGate + ?Sized),
        pipeline: &ImportService<S, R>,
    ) -> Result<ImportStatus, ImportError> {
        let plan = self.plan_start(gate);
        self.execute(plan, pipeline)
    }

    /// Handles a host permission callback and imports on grant.
    pub fn on_permission_result<S: ContactSource, R: ContactRepository>(
        &mut self,
        permission: ContactPermission,
        granted: bool,
        pipeline: &ImportService<S, R>,
    ) -> Result<ImportStatus, ImportError> {
        let plan = self.plan_permission_result(permission, granted);
        self.execute(plan, pipeline)
    }

    fn execute<S: ContactSource, R: ContactRepository>(
        &mut self,
        plan: ImportPlan,
        pipeline: &ImportService<S, R>,
    ) -> Result<ImportStatus, ImportError> {
        match plan {
            ImportPlan::Skip(status) => Ok(status),
            ImportPlan::Run => {
                let result = pipeline.import_contacts();
                self.record(&result);
                result.map(ImportStatus::Imported)
            }
        }
    }
}

fn import_error_code(err: &ImportError) -> &'static str {
    match err {
        ImportError::SourceRead(_) => "source_read_failed",
        ImportError::Storage(_) => "storage_write_failed",
    }
}
