//! Archive assembly for multi-page exports.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{PhotonError, Result};
use crate::export::NamedPayload;

/// Bundles named payloads into one binary payload, keeping entry order.
pub trait ArchiveBuilder {
    fn build(&self, entries: &[NamedPayload]) -> Result<Vec<u8>>;
}

/// Zip archives. Entries are stored, not deflated: PNG and JPEG data is
/// already compressed.
pub struct ZipArchiveBuilder {
    compression: CompressionMethod,
    modified: NaiveDateTime,
}

impl ZipArchiveBuilder {
    /// Entries are stamped with the local time at construction.
    pub fn new() -> Self {
        Self {
            compression: CompressionMethod::Stored,
            modified: Local::now().naive_local(),
        }
    }

    pub fn with_compression(self, compression: CompressionMethod) -> Self {
        Self {
            compression,
            ..self
        }
    }

    pub fn with_timestamp(self, modified: NaiveDateTime) -> Self {
        Self { modified, ..self }
    }

    /// Zip timestamps cover 1980..=2107; anything else uses the format default.
    fn zip_timestamp(&self) -> Option<DateTime> {
        let year = u16::try_from(self.modified.year()).ok()?;
        DateTime::from_date_and_time(
            year,
            self.modified.month() as u8,
            self.modified.day() as u8,
            self.modified.hour() as u8,
            self.modified.minute() as u8,
            self.modified.second() as u8,
        )
        .ok()
    }
}

impl Default for ZipArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn assembly_error(e: impl std::fmt::Display) -> PhotonError {
    PhotonError::ArchiveAssemblyFailure(e.to_string())
}

impl ArchiveBuilder for ZipArchiveBuilder {
    fn build(&self, entries: &[NamedPayload]) -> Result<Vec<u8>> {
        let mut options = FileOptions::default().compression_method(self.compression);
        if let Some(timestamp) = self.zip_timestamp() {
            options = options.last_modified_time(timestamp);
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in entries {
            zip.start_file(entry.name.as_str(), options)
                .map_err(assembly_error)?;
            zip.write_all(&entry.bytes).map_err(assembly_error)?;
        }
        let cursor = zip.finish().map_err(assembly_error)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Read;

    fn payload(name: &str, bytes: &[u8]) -> NamedPayload {
        NamedPayload {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_entries_keep_order_and_content() {
        let entries = vec![
            payload("page-010.png", b"ten"),
            payload("page-002.png", b"two"),
            payload("page-003.png", b"three"),
        ];
        let bytes = ZipArchiveBuilder::new().build(&entries).unwrap();

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 3);
        for (i, expected) in entries.iter().enumerate() {
            let mut file = zip.by_index(i).unwrap();
            assert_eq!(file.name(), expected.name);
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            assert_eq!(content, expected.bytes);
        }
    }

    #[test]
    fn test_deflated_entries_read_back() {
        let entries = vec![payload("page-001.png", &[7u8; 4096])];
        let bytes = ZipArchiveBuilder::new()
            .with_compression(CompressionMethod::Deflated)
            .build(&entries)
            .unwrap();
        assert!(bytes.len() < 4096);

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = Vec::new();
        zip.by_index(0).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, vec![7u8; 4096]);
    }

    #[test]
    fn test_timestamp_is_recorded() {
        let stamp = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 12)
            .unwrap();
        let bytes = ZipArchiveBuilder::new()
            .with_timestamp(stamp)
            .build(&[payload("page-001.png", b"x")])
            .unwrap();

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let modified = zip.by_index(0).unwrap().last_modified();
        assert_eq!(
            (modified.year(), modified.month(), modified.day(), modified.hour(), modified.minute()),
            (2024, 3, 9, 14, 30)
        );
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = ZipArchiveBuilder::new().build(&[]).unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
