/*!
 * Term dictionaries for terminology-constrained translation.
 *
 * Two scopes are kept: the permanent dictionary shared across documents and
 * the temp dictionary reviewed for a single document. A run works from a
 * `MergedGlossary` built once from both, with temp entries winning.
 *
 * Dictionary files are JSON objects with `permanent_dict` and/or `temp_dict`
 * keys, each mapping a source term to its translation.
 */

use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::DictionaryError;

pub mod extraction;

pub use self::extraction::{ExtractionConfig, TermExtractor, extract_candidate_terms};

/// Which dictionary an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionaryScope {
    Permanent,
    Temp,
}

impl DictionaryScope {
    /// JSON key holding this scope's entries
    pub fn file_key(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent_dict",
            Self::Temp => "temp_dict",
        }
    }

    fn other(&self) -> Self {
        match self {
            Self::Permanent => Self::Temp,
            Self::Temp => Self::Permanent,
        }
    }
}

impl fmt::Display for DictionaryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Temp => write!(f, "temp"),
        }
    }
}

impl std::str::FromStr for DictionaryScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "permanent" | "perm" => Ok(Self::Permanent),
            "temp" | "temporary" => Ok(Self::Temp),
            _ => Err(anyhow::anyhow!("Invalid dictionary scope: {}", s)),
        }
    }
}

/// A single term and its required translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub term: String,
    pub translation: String,
}

impl DictionaryEntry {
    pub fn new(term: &str, translation: &str) -> Self {
        Self {
            term: term.to_string(),
            translation: translation.to_string(),
        }
    }
}

/// How `import_entries` treats a term that already has a different translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    KeepExisting,
    PreferIncoming,
}

/// A term whose incoming translation disagrees with the merged glossary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermConflict {
    pub term: String,
    pub existing: String,
    pub incoming: String,
}

/// Precedence-resolved, read-only glossary for one run
#[derive(Debug, Clone, Default)]
pub struct MergedGlossary {
    entries: Arc<BTreeMap<String, String>>,
}

impl MergedGlossary {
    pub fn from_map(entries: BTreeMap<String, String>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.entries.get(term).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries whose term literally occurs in `text`, longest term first
    pub fn subset_for(&self, text: &str) -> GlossarySubset {
        let mut entries: Vec<DictionaryEntry> = self
            .entries
            .iter()
            .filter(|(term, translation)| !translation.is_empty() && text.contains(term.as_str()))
            .map(|(term, translation)| DictionaryEntry::new(term, translation))
            .collect();

        entries.sort_by(|a, b| {
            b.term
                .chars()
                .count()
                .cmp(&a.term.chars().count())
                .then_with(|| a.term.cmp(&b.term))
        });

        GlossarySubset { entries }
    }
}

/// Glossary entries relevant to one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlossarySubset {
    entries: Vec<DictionaryEntry>,
}

impl GlossarySubset {
    pub fn new(entries: Vec<DictionaryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Narrow the subset further to the terms present in `text`
    pub fn restrict_to(&self, text: &str) -> GlossarySubset {
        GlossarySubset {
            entries: self
                .entries
                .iter()
                .filter(|e| text.contains(e.term.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// Loads, edits and persists the permanent and temp dictionaries
#[derive(Debug, Clone, Default)]
pub struct GlossaryStore {
    permanent: BTreeMap<String, String>,
    temp: BTreeMap<String, String>,
    permanent_path: Option<PathBuf>,
    temp_path: Option<PathBuf>,
}

impl GlossaryStore {
    /// Create an empty store that is not backed by files
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load both scopes. Missing files yield empty scopes; unreadable or
    /// malformed files fail the whole call.
    pub fn load(permanent_path: &Path, temp_path: Option<&Path>) -> Result<Self, DictionaryError> {
        let permanent = read_scope(permanent_path, DictionaryScope::Permanent)?;
        let temp = match temp_path {
            Some(path) => read_scope(path, DictionaryScope::Temp)?,
            None => BTreeMap::new(),
        };

        debug!(
            "Loaded {} permanent and {} temp dictionary entries",
            permanent.len(),
            temp.len()
        );

        Ok(Self {
            permanent,
            temp,
            permanent_path: Some(permanent_path.to_path_buf()),
            temp_path: temp_path.map(Path::to_path_buf),
        })
    }

    /// Load both scopes, substituting an empty store when a file cannot be loaded
    pub fn load_or_empty(permanent_path: &Path, temp_path: Option<&Path>) -> Self {
        match Self::load(permanent_path, temp_path) {
            Ok(store) => store,
            Err(e) => {
                warn!("Falling back to empty dictionaries: {}", e);
                Self {
                    permanent_path: Some(permanent_path.to_path_buf()),
                    temp_path: temp_path.map(Path::to_path_buf),
                    ..Self::default()
                }
            }
        }
    }

    pub fn entries(&self, scope: DictionaryScope) -> &BTreeMap<String, String> {
        match scope {
            DictionaryScope::Permanent => &self.permanent,
            DictionaryScope::Temp => &self.temp,
        }
    }

    fn entries_mut(&mut self, scope: DictionaryScope) -> &mut BTreeMap<String, String> {
        match scope {
            DictionaryScope::Permanent => &mut self.permanent,
            DictionaryScope::Temp => &mut self.temp,
        }
    }

    pub fn path(&self, scope: DictionaryScope) -> Option<&Path> {
        match scope {
            DictionaryScope::Permanent => self.permanent_path.as_deref(),
            DictionaryScope::Temp => self.temp_path.as_deref(),
        }
    }

    /// Add or update a term. Returns whether the scope changed.
    pub fn add(
        &mut self,
        scope: DictionaryScope,
        term: &str,
        translation: &str,
    ) -> Result<bool, DictionaryError> {
        let term = term.trim();
        let translation = translation.trim();
        if term.is_empty() || translation.is_empty() {
            return Err(DictionaryError::InvalidEntry(format!(
                "term and translation must be non-empty (term: '{}')",
                term
            )));
        }

        let entries = self.entries_mut(scope);
        if entries.get(term).is_some_and(|existing| existing == translation) {
            return Ok(false);
        }
        entries.insert(term.to_string(), translation.to_string());
        Ok(true)
    }

    /// Remove a term; absent terms are a no-op. Returns whether the scope changed.
    pub fn remove(&mut self, scope: DictionaryScope, term: &str) -> bool {
        self.entries_mut(scope).remove(term.trim()).is_some()
    }

    pub fn clear(&mut self, scope: DictionaryScope) {
        self.entries_mut(scope).clear();
    }

    /// Merge incoming entries into a scope, reporting disagreements with the
    /// current merged glossary
    pub fn import_entries(
        &mut self,
        scope: DictionaryScope,
        entries: &[DictionaryEntry],
        resolution: ConflictResolution,
    ) -> Result<Vec<TermConflict>, DictionaryError> {
        let merged = self.merge();
        let mut conflicts = Vec::new();

        for entry in entries {
            if let Some(existing) = merged.get(&entry.term) {
                if existing != entry.translation {
                    conflicts.push(TermConflict {
                        term: entry.term.clone(),
                        existing: existing.to_string(),
                        incoming: entry.translation.clone(),
                    });
                    if resolution == ConflictResolution::KeepExisting {
                        continue;
                    }
                }
            }
            self.add(scope, &entry.term, &entry.translation)?;
        }

        Ok(conflicts)
    }

    /// Build the run glossary; temp entries override permanent ones.
    ///
    /// An unreviewed temp entry (empty translation) never masks a permanent
    /// translation.
    pub fn merge(&self) -> MergedGlossary {
        let mut merged = self.permanent.clone();
        for (term, translation) in &self.temp {
            if translation.is_empty() && merged.get(term).is_some_and(|t| !t.is_empty()) {
                debug!("Temp entry '{}' has no translation, keeping the permanent one", term);
                continue;
            }
            merged.insert(term.clone(), translation.clone());
        }
        MergedGlossary::from_map(merged)
    }

    /// Persist one scope to its configured file
    pub fn save(&self, scope: DictionaryScope) -> Result<(), DictionaryError> {
        let path = match (scope, self.path(scope)) {
            (_, Some(path)) => path,
            (DictionaryScope::Temp, None) => return Err(DictionaryError::NoTempPath),
            (DictionaryScope::Permanent, None) => {
                return Err(DictionaryError::InvalidEntry(
                    "no permanent dictionary path configured".to_string(),
                ));
            }
        };
        write_scope(path, scope, self.entries(scope))
    }

    /// Extract candidate terms from a document's text
    pub fn extract_candidate_terms(&self, text: &str) -> std::collections::BTreeSet<String> {
        extract_candidate_terms(text)
    }

    /// Write a reviewable temp dictionary skeleton for `terms`.
    ///
    /// Terms known to the merged glossary get their current translation as a
    /// suggestion; non-empty entries already in the file are kept.
    pub fn materialize_temp_template<I, S>(&self, path: &Path, terms: I) -> Result<usize, DictionaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let merged = self.merge();
        let mut template = read_scope(path, DictionaryScope::Temp)?;

        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() {
                continue;
            }
            let keep = template.get(term).is_some_and(|t| !t.is_empty());
            if !keep {
                let suggestion = merged.get(term).unwrap_or_default().to_string();
                template.insert(term.to_string(), suggestion);
            }
        }

        write_scope(path, DictionaryScope::Temp, &template)?;
        Ok(template.len())
    }
}

fn read_scope(path: &Path, scope: DictionaryScope) -> Result<BTreeMap<String, String>, DictionaryError> {
    if !path.exists() {
        debug!("Dictionary file {:?} does not exist, using empty {} dictionary", path, scope);
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let value: Value = serde_json::from_str(&content).map_err(|e| DictionaryError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let object = value.as_object().ok_or_else(|| DictionaryError::Malformed {
        path: path.to_path_buf(),
        message: "top-level value must be an object".to_string(),
    })?;

    let own_key = scope.file_key();
    let other_key = scope.other().file_key();
    let section = if let Some(section) = object.get(own_key) {
        section
    } else if object.contains_key(other_key) {
        return Ok(BTreeMap::new());
    } else {
        // A bare term map is accepted as the scope's entries
        &value
    };

    parse_section(path, section)
}

fn parse_section(path: &Path, section: &Value) -> Result<BTreeMap<String, String>, DictionaryError> {
    let object = section.as_object().ok_or_else(|| DictionaryError::Malformed {
        path: path.to_path_buf(),
        message: "dictionary section must be an object".to_string(),
    })?;

    let mut entries = BTreeMap::new();
    for (term, translation) in object {
        let translation = translation.as_str().ok_or_else(|| DictionaryError::Malformed {
            path: path.to_path_buf(),
            message: format!("translation for '{}' must be a string", term),
        })?;
        entries.insert(term.clone(), translation.to_string());
    }
    Ok(entries)
}

fn write_scope(
    path: &Path,
    scope: DictionaryScope,
    entries: &BTreeMap<String, String>,
) -> Result<(), DictionaryError> {
    // Keep the other scope's section when both live in the same file
    let mut root = Map::new();
    if path.exists() {
        if let Ok(content) = fs::read_to_string(path) {
            if let Ok(Value::Object(existing)) = serde_json::from_str::<Value>(&content) {
                let other_key = scope.other().file_key();
                if let Some(other) = existing.get(other_key) {
                    root.insert(other_key.to_string(), other.clone());
                }
            }
        }
    }

    let section: Map<String, Value> = entries
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    root.insert(scope.file_key().to_string(), Value::Object(section));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| DictionaryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(&Value::Object(root)).map_err(|e| DictionaryError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, json).map_err(|source| DictionaryError::Io {
        path: path.to_path_buf(),
        source,
    })
}
