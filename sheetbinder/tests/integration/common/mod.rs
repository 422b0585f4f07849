//! Shared helpers for the integration tests.
//!
//! PDFs built here carry one text label per page so tests can check which
//! pages ended up where, and in which order.

#![allow(dead_code)]

use lopdf::{Document, Object, Stream, dictionary};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use sheetbinder::convert::{
    HostFault, HostLauncher, HostResult, RenderFormat, SpreadsheetHost, WorkbookId,
};
use sheetbinder::utils::file_stem;

/// Write a PDF with one page per label.
pub fn write_labelled_pdf(path: &Path, labels: &[String]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for label in labels {
        let body = format!("BT /F1 12 Tf 72 720 Td ({label}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, body.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => labels.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    doc.save(path).unwrap();
}

/// Write a document whose pages are labelled `"<stem> doc <n>"`.
pub fn write_document(path: &Path, pages: usize) -> Vec<String> {
    let stem = file_stem(path).unwrap();
    let labels: Vec<String> = (0..pages).map(|n| format!("{stem} doc {n}")).collect();
    write_labelled_pdf(path, &labels);
    labels
}

/// Labels of every page of the PDF at `path`, in page order.
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find('(').unwrap() + 1;
            let end = start + text[start..].find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

/// Label of a sheet rendered by [`ScriptedHost`].
pub fn sheet_label(stem: &str, host_index: usize) -> String {
    format!("{stem} sheet {host_index}")
}

/// A call received by [`ScriptedHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    SetVisible(bool),
    SetAlertsSuppressed(bool),
    Open(String),
    SheetCount,
    SheetName(usize),
    Render(usize),
    Close,
    Quit,
}

/// Calls shared between a host and the test that scripted it.
pub type CallLog = Arc<Mutex<Vec<HostCall>>>;

/// In-memory spreadsheet host.
///
/// Every workbook has `sheet_count` sheets unless overridden per stem.
/// Each render writes a one-page PDF labelled with [`sheet_label`].
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    pub calls: CallLog,
    pub sheet_count: usize,
    pub sheet_counts: HashMap<String, usize>,
    pub fail_open: Vec<String>,
    pub fail_render: Vec<String>,
    open: HashMap<u64, String>,
    next_id: u64,
}

impl ScriptedHost {
    pub fn new(sheet_count: usize) -> Self {
        Self {
            calls: CallLog::default(),
            sheet_count,
            sheet_counts: HashMap::new(),
            fail_open: Vec::new(),
            fail_render: Vec::new(),
            open: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rendered(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Render(index) => Some(index),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn stem(&self, workbook: WorkbookId) -> HostResult<String> {
        self.open
            .get(&workbook.0)
            .cloned()
            .ok_or_else(|| HostFault::new(-5, "Unknown workbook"))
    }
}

impl SpreadsheetHost for ScriptedHost {
    fn set_visible(&mut self, visible: bool) -> HostResult<()> {
        self.record(HostCall::SetVisible(visible));
        Ok(())
    }

    fn set_alerts_suppressed(&mut self, suppressed: bool) -> HostResult<()> {
        self.record(HostCall::SetAlertsSuppressed(suppressed));
        Ok(())
    }

    fn open_workbook(&mut self, path: &Path) -> HostResult<WorkbookId> {
        let stem = file_stem(path).unwrap_or_default();
        self.record(HostCall::Open(stem.clone()));

        if self.fail_open.contains(&stem) {
            return Err(HostFault::new(-2147352567, "Workbook is locked"));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.open.insert(id, stem);
        Ok(WorkbookId(id))
    }

    fn sheet_count(&mut self, workbook: WorkbookId) -> HostResult<usize> {
        self.record(HostCall::SheetCount);
        let stem = self.stem(workbook)?;
        Ok(*self.sheet_counts.get(&stem).unwrap_or(&self.sheet_count))
    }

    fn sheet_name(&mut self, _workbook: WorkbookId, index: usize) -> HostResult<String> {
        self.record(HostCall::SheetName(index));
        Ok(format!("Sheet{index}"))
    }

    fn render_sheet(
        &mut self,
        workbook: WorkbookId,
        index: usize,
        output: &Path,
        _format: RenderFormat,
    ) -> HostResult<()> {
        self.record(HostCall::Render(index));
        let stem = self.stem(workbook)?;

        if self.fail_render.contains(&stem) {
            return Err(HostFault::new(-2146827284, "Export failed"));
        }

        write_labelled_pdf(output, &[sheet_label(&stem, index)]);
        Ok(())
    }

    fn close_workbook(&mut self, workbook: WorkbookId) -> HostResult<()> {
        self.record(HostCall::Close);
        self.open.remove(&workbook.0);
        Ok(())
    }

    fn quit(&mut self) -> HostResult<()> {
        self.record(HostCall::Quit);
        Ok(())
    }
}

/// Launcher handing out clones of a scripted host that share its call log.
pub struct ScriptedLauncher {
    pub template: ScriptedHost,
    pub fail_launch: bool,
}

impl ScriptedLauncher {
    pub fn new(template: ScriptedHost) -> Self {
        Self {
            template,
            fail_launch: false,
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.template.calls()
    }
}

impl HostLauncher for ScriptedLauncher {
    type Host = ScriptedHost;

    fn launch(&self) -> HostResult<ScriptedHost> {
        if self.fail_launch {
            return Err(HostFault::new(-2147221005, "Invalid class string"));
        }
        Ok(self.template.clone())
    }
}
