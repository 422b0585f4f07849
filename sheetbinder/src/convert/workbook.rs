//! Minimal `.xlsx` inspection.
//!
//! Only the sheet list is read: the `<sheet name="..">` entries of
//! `xl/workbook.xml`, in workbook order.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Errors raised while inspecting a workbook.
#[derive(Error, Debug)]
pub enum WorkbookError {
    /// The workbook file could not be opened.
    #[error("Cannot open workbook: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook is not a readable zip container.
    #[error("Workbook is not a valid xlsx container: {0}")]
    Zip(#[from] ZipError),

    /// The workbook part is not well-formed XML.
    #[error("Malformed workbook XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute in the workbook part is malformed.
    #[error("Malformed workbook attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Text in the workbook part could not be decoded.
    #[error("Cannot decode workbook text: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// A required part is missing from the container.
    #[error("Workbook is missing {0}")]
    MissingPart(&'static str),
}

/// Names of the sheets in an `.xlsx` workbook, in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, WorkbookError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let part = match archive.by_name(WORKBOOK_PART) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Err(WorkbookError::MissingPart(WORKBOOK_PART)),
        Err(err) => return Err(err.into()),
    };

    let mut reader = Reader::from_reader(BufReader::new(part));
    reader.config_mut().expand_empty_elements = true;

    let mut names = Vec::new();
    let mut buffer = Vec::with_capacity(1024);

    loop {
        match reader.read_event_into(&mut buffer)? {
            Event::Start(event) if event.local_name().as_ref() == b"sheet" => {
                for attribute in event.attributes() {
                    let attribute = attribute?;
                    if attribute.key.local_name().as_ref() == b"name" {
                        names.push(attribute.unescape_value()?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buffer.clear();
    }

    Ok(names)
}
