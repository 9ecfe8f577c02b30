use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::contacts::Contact;

const ROSTER_EXTENSION: &str = "csv";
const FALLBACK_LABEL: &str = "all";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Roster CSV missing: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid list name '{0}'")]
    InvalidLabel(String),
    #[error("reading roster {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("writing roster {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn write(path: &Path, source: io::Error) -> Self {
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A named roster file as offered in pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub label: String,
    pub path: PathBuf,
}

/// Directory of CSV rosters plus the configured label aliases that point into it.
#[derive(Debug, Clone)]
pub struct RosterStore {
    dir: PathBuf,
    aliases: IndexMap<String, String>,
}

impl RosterStore {
    pub fn new(dir: impl Into<PathBuf>, aliases: IndexMap<String, String>) -> Self {
        Self {
            dir: dir.into(),
            aliases,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        let stem = self
            .aliases
            .get(label)
            .map(String::as_str)
            .unwrap_or(label);
        self.dir.join(format!("{stem}.{ROSTER_EXTENSION}"))
    }

    /// Configured aliases whose files exist come first, then every other CSV
    /// in the directory by file name. An empty store still offers `all`.
    pub fn entries(&self) -> Vec<RosterEntry> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for label in self.aliases.keys() {
            let path = self.path_for(label);
            if path.is_file() {
                seen.insert(path.clone());
                entries.push(RosterEntry {
                    label: label.clone(),
                    path,
                });
            }
        }

        let mut files: Vec<PathBuf> = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| {
                    path.is_file()
                        && path.extension().and_then(|ext| ext.to_str()) == Some(ROSTER_EXTENSION)
                })
                .collect(),
            Err(err) => {
                tracing::debug!(?err, dir = %self.dir.display(), "roster directory unreadable");
                Vec::new()
            }
        };
        files.sort();
        for path in files {
            if seen.contains(&path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            entries.push(RosterEntry {
                label: stem.to_string(),
                path: path.clone(),
            });
        }

        if entries.is_empty() {
            entries.push(RosterEntry {
                label: FALLBACK_LABEL.to_string(),
                path: self.path_for(FALLBACK_LABEL),
            });
        }
        entries
    }

    pub fn find(&self, label: &str) -> Option<RosterEntry> {
        self.entries().into_iter().find(|entry| entry.label == label)
    }

    pub fn load(&self, entry: &RosterEntry) -> Result<Vec<Contact>, StoreError> {
        load_contacts(&entry.path)
    }

    pub fn save(&self, entry: &RosterEntry, contacts: &[Contact]) -> Result<(), StoreError> {
        write_contacts(&entry.path, contacts)?;
        tracing::info!(list = %entry.label, count = contacts.len(), "roster saved");
        Ok(())
    }

    /// Creates an empty roster for `label` unless one already exists.
    pub fn create(&self, label: &str) -> Result<RosterEntry, StoreError> {
        let label = label.trim();
        validate_label(label)?;
        let entry = RosterEntry {
            label: label.to_string(),
            path: self.path_for(label),
        };
        if !entry.path.exists() {
            write_contacts(&entry.path, &[])?;
            tracing::info!(list = %entry.label, "created roster");
        }
        Ok(entry)
    }
}

pub fn validate_label(label: &str) -> Result<(), StoreError> {
    let invalid = label.is_empty()
        || label.starts_with('.')
        || label.contains(['/', '\\'])
        || label.chars().any(char::is_control);
    if invalid {
        return Err(StoreError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

/// Reads a roster with a header row. Column names are matched loosely
/// (`name`/`Name`, `number`/`Number`/`Phone`, `alias`/`Alias`); rows without
/// a name or number are skipped.
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>, StoreError> {
    if !path.is_file() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let read_err = |source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;
    let headers = reader.headers().map_err(read_err)?.clone();
    let column = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| headers.iter().position(|header| header == *name))
    };
    let name_col = column(&["name", "Name"]);
    let number_col = column(&["number", "Number", "Phone"]);
    let alias_col = column(&["alias", "Alias"]);

    let mut contacts = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let field = |col: Option<usize>| col.and_then(|idx| record.get(idx)).unwrap_or("");
        let name = field(name_col);
        let number = field(number_col);
        if name.is_empty() || number.is_empty() {
            continue;
        }
        contacts.push(Contact::new(name, number, field(alias_col)));
    }
    tracing::debug!(path = %path.display(), count = contacts.len(), "roster loaded");
    Ok(contacts)
}

/// Writes `contacts` sorted by name through a temporary file that is synced
/// and renamed over the target. The temporary file is removed on failure.
pub fn write_contacts(path: &Path, contacts: &[Contact]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| StoreError::write(parent, err))?;
    }
    let mut sorted: Vec<&Contact> = contacts.iter().collect();
    sorted.sort_by_key(|contact| contact.name.to_lowercase());

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let result = write_rows(&tmp_path, &sorted)
        .and_then(|_| fs::rename(&tmp_path, path).map_err(|err| StoreError::write(path, err)));
    if result.is_err() && tmp_path.exists() {
        if let Err(err) = fs::remove_file(&tmp_path) {
            tracing::warn!(?err, path = %tmp_path.display(), "could not remove temporary roster");
        }
    }
    result
}

fn write_rows(tmp_path: &Path, contacts: &[&Contact]) -> Result<(), StoreError> {
    let file = File::create(tmp_path).map_err(|err| StoreError::write(tmp_path, err))?;
    let mut writer = csv::Writer::from_writer(file);
    let csv_err = |err: csv::Error| StoreError::write(tmp_path, io::Error::other(err));
    writer
        .write_record(["name", "number", "alias"])
        .map_err(csv_err)?;
    for contact in contacts {
        writer
            .write_record([
                contact.name.as_str(),
                contact.number.as_str(),
                contact.aliases_joined(",").as_str(),
            ])
            .map_err(csv_err)?;
    }
    let mut file = writer
        .into_inner()
        .map_err(|err| StoreError::write(tmp_path, err.into_error()))?;
    file.flush()
        .and_then(|_| file.sync_all())
        .map_err(|err| StoreError::write(tmp_path, err))
}
