//! Company profile store backed by `companies.json`.
//!
//! ```json
//! { "companies": [ { "id": "c1", "name": "...", "inn": "...", "address": "...",
//!                    "phone": "...", "ceo": "...", "logo_path": null } ] }
//! ```

use std::path::{Path, PathBuf};

use serde_json::Value;
use shared_types::PartyProfile;
use thiserror::Error;
use tracing::info;

const REQUIRED_KEYS: [&str; 6] = ["id", "name", "inn", "address", "phone", "ceo"];

#[derive(Error, Debug)]
pub enum ProfileStoreError {
    #[error("Company profile file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} must contain a JSON object at the top level")]
    NotAnObject(PathBuf),

    #[error("'companies' in {0} must be a list")]
    CompaniesNotAList(PathBuf),

    #[error("Entry companies[{index}] must be an object")]
    EntryNotAnObject { index: usize },

    #[error("Company {company} is missing keys: {}", missing.join(", "))]
    MissingKeys {
        company: String,
        missing: Vec<&'static str>,
    },

    #[error("Unknown company id '{0}'")]
    UnknownCompany(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loaded profiles in file order. A repeated id replaces the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct CompanyStore {
    companies: Vec<PartyProfile>,
}

impl CompanyStore {
    pub fn load(path: &Path) -> Result<Self, ProfileStoreError> {
        if !path.exists() {
            return Err(ProfileStoreError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json(&text, path)?;
        info!(path = %path.display(), companies = store.companies.len(), "company profiles loaded");
        Ok(store)
    }

    /// Parse store contents; `origin` only names the source in errors.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ProfileStoreError> {
        let data: Value =
            serde_json::from_str(text).map_err(|source| ProfileStoreError::InvalidJson {
                path: origin.to_path_buf(),
                source,
            })?;
        let object = data
            .as_object()
            .ok_or_else(|| ProfileStoreError::NotAnObject(origin.to_path_buf()))?;
        let rows = match object.get("companies") {
            None => return Ok(Self::default()),
            Some(Value::Array(rows)) => rows,
            Some(_) => return Err(ProfileStoreError::CompaniesNotAList(origin.to_path_buf())),
        };

        let mut store = Self::default();
        for (index, row) in rows.iter().enumerate() {
            let profile = profile_from_row(index, row)?;
            match store.companies.iter_mut().find(|c| c.id == profile.id) {
                Some(existing) => *existing = profile,
                None => store.companies.push(profile),
            }
        }
        Ok(store)
    }

    pub fn companies(&self) -> &[PartyProfile] {
        &self.companies
    }

    pub fn get(&self, id: &str) -> Result<&PartyProfile, ProfileStoreError> {
        self.companies
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ProfileStoreError::UnknownCompany(id.to_string()))
    }
}

/// Scalar JSON value as text; numbers keep their literal form.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn profile_from_row(index: usize, row: &Value) -> Result<PartyProfile, ProfileStoreError> {
    let fields = row
        .as_object()
        .ok_or(ProfileStoreError::EntryNotAnObject { index })?;

    let missing: Vec<&'static str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !fields.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        let company = fields
            .get("name")
            .map(text_of)
            .unwrap_or_else(|| format!("#{}", index + 1));
        return Err(ProfileStoreError::MissingKeys { company, missing });
    }

    let field = |key: &str| fields.get(key).map(text_of).unwrap_or_default();
    Ok(PartyProfile {
        id: field("id"),
        name: field("name"),
        tax_id: field("inn"),
        address: field("address"),
        phone: field("phone"),
        responsible_person: field("ceo"),
        logo_path: fields
            .get("logo_path")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
