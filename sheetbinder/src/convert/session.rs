//! Scoped acquisition of host resources.
//!
//! Release happens in `Drop`, so it runs on every exit path. Release failures
//! are logged and never replace the error that caused the unwind.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::convert::host::{HostResult, SpreadsheetHost, WorkbookId};

/// A workbook held open on a host.
///
/// Opening hides the host and suppresses alerts. Dropping closes the workbook
/// and switches alert suppression back off.
pub struct WorkbookSession<'h, H: SpreadsheetHost + ?Sized> {
    host: &'h mut H,
    workbook: WorkbookId,
    path: PathBuf,
}

impl<'h, H: SpreadsheetHost + ?Sized> WorkbookSession<'h, H> {
    /// Prepare the host and open `path`.
    ///
    /// If opening fails the alert setting is restored before returning.
    pub fn open(host: &'h mut H, path: &Path) -> HostResult<Self> {
        host.set_visible(false)?;
        host.set_alerts_suppressed(true)?;

        let workbook = match host.open_workbook(path) {
            Ok(workbook) => workbook,
            Err(fault) => {
                restore_alerts(host);
                return Err(fault);
            }
        };

        tracing::debug!(path = %path.display(), ?workbook, "workbook opened");

        Ok(Self {
            host,
            workbook,
            path: path.to_path_buf(),
        })
    }

    /// Handle of the open workbook.
    pub fn workbook(&self) -> WorkbookId {
        self.workbook
    }

    /// Host the workbook is open on.
    pub fn host(&mut self) -> &mut H {
        self.host
    }
}

impl<H: SpreadsheetHost + ?Sized> Drop for WorkbookSession<'_, H> {
    fn drop(&mut self) {
        if let Err(fault) = self.host.close_workbook(self.workbook) {
            tracing::warn!(path = %self.path.display(), %fault, "failed to close workbook");
        } else {
            tracing::debug!(path = %self.path.display(), "workbook closed");
        }
        restore_alerts(self.host);
    }
}

fn restore_alerts<H: SpreadsheetHost + ?Sized>(host: &mut H) {
    if let Err(fault) = host.set_alerts_suppressed(false) {
        tracing::warn!(%fault, "failed to restore host alerts");
    }
}

/// A host started by the converter itself.
///
/// Dropping the lease quits the host.
pub struct HostLease<H: SpreadsheetHost> {
    host: H,
}

impl<H: SpreadsheetHost> HostLease<H> {
    /// Take ownership of a freshly launched host.
    pub fn new(host: H) -> Self {
        Self { host }
    }
}

impl<H: SpreadsheetHost> Deref for HostLease<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.host
    }
}

impl<H: SpreadsheetHost> DerefMut for HostLease<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: SpreadsheetHost> Drop for HostLease<H> {
    fn drop(&mut self) {
        match self.host.quit() {
            Ok(()) => tracing::debug!("spreadsheet host released"),
            Err(fault) => tracing::warn!(%fault, "failed to quit spreadsheet host"),
        }
    }
}
