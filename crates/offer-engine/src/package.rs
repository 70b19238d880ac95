//! OOXML package (zip) access with entry order preserved.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::OfferError;
use crate::xml::XmlDocument;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

#[derive(Debug, Clone, Default)]
pub struct OfficePackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl OfficePackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self, OfferError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OfferError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push((name, data));
        }
        if !parts.iter().any(|(name, _)| name == CONTENT_TYPES_PART) {
            return Err(OfferError::Package(format!(
                "{CONTENT_TYPES_PART} is missing; not an Office document"
            )));
        }
        Ok(Self { parts })
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn part_xml(&self, name: &str) -> Result<XmlDocument, OfferError> {
        let data = self
            .part(name)
            .ok_or_else(|| OfferError::Package(format!("part {name} is missing")))?;
        let text = std::str::from_utf8(data)
            .map_err(|e| OfferError::Package(format!("part {name} is not UTF-8: {e}")))?;
        XmlDocument::parse(text)
    }

    /// Replace a part in place, or append it when new.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn set_part_xml(&mut self, name: &str, doc: &XmlDocument) -> Result<(), OfferError> {
        let xml = doc.to_xml()?;
        self.set_part(name, xml.into_bytes());
        Ok(())
    }

    pub fn remove_part(&mut self, name: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|(n, _)| n != name);
        self.parts.len() != before
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, OfferError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<(), OfferError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
