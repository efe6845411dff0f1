use crate::models::catalog::{Catalog, CatalogEntry, DEFAULT_CATALOG};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog entry id '{0}' is used more than once")]
    DuplicateId(String),
    #[error("catalog entry #{0} has an empty id")]
    MissingId(usize),
}

// Either a bare list or {"entries": [...]}
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<CatalogEntry>),
    Wrapped { entries: Vec<CatalogEntry> },
}

/// Parses catalog JSON and checks that entry ids are unique.
pub fn parse_catalog(contents: &str, path: &Path) -> Result<Catalog, CatalogError> {
    let entries = match serde_json::from_str::<CatalogFile>(contents) {
        Ok(CatalogFile::List(entries)) | Ok(CatalogFile::Wrapped { entries }) => entries,
        Err(source) => {
            return Err(CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut ids = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.id.trim().is_empty() {
            return Err(CatalogError::MissingId(index));
        }
        if !ids.insert(entry.id.as_str()) {
            return Err(CatalogError::DuplicateId(entry.id.clone()));
        }
        if !entry.has_media() {
            warn!(
                "Catalog entry '{}' has no media and will show as an empty box",
                entry.id
            );
        }
    }

    Ok(Catalog::new(entries))
}

/// Loads the catalog from `path`, or the built-in one when no path is set
/// or the file does not exist.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, CatalogError> {
    let Some(path) = path else {
        debug!("No catalog file configured, using built-in catalog");
        return Ok(DEFAULT_CATALOG.clone());
    };

    if !path.exists() {
        warn!(
            "Catalog file {} not found, using built-in catalog",
            path.display()
        );
        return Ok(DEFAULT_CATALOG.clone());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse_catalog(&contents, path)?;
    info!(
        "Loaded catalog with {} entries from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_catalog(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_list_and_wrapped_files() {
        let list = write_catalog(r#"[{"id": "a", "name": "A", "video": "a.mp4"}]"#);
        let catalog = load_catalog(Some(list.path())).unwrap();
        assert_eq!(catalog.len(), 1);

        let wrapped = write_catalog(
            r#"{"entries": [
                {"id": "a", "name": "A", "images": ["a.png"]},
                {"id": "b", "name": "B"}
            ]}"#,
        );
        let catalog = load_catalog(Some(wrapped.path())).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.entries()[1].has_media());
    }

    #[test]
    fn missing_file_falls_back_to_built_in() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = load_catalog(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(catalog.len(), DEFAULT_CATALOG.len());

        assert_eq!(load_catalog(None).unwrap().len(), DEFAULT_CATALOG.len());
    }

    #[test]
    fn rejects_duplicate_and_empty_ids() {
        let duplicate = write_catalog(
            r#"[{"id": "a", "name": "A"}, {"id": "a", "name": "Again"}]"#,
        );
        assert!(matches!(
            load_catalog(Some(duplicate.path())),
            Err(CatalogError::DuplicateId(id)) if id == "a"
        ));

        let unnamed = write_catalog(r#"[{"id": " ", "name": "Blank"}]"#);
        assert!(matches!(
            load_catalog(Some(unnamed.path())),
            Err(CatalogError::MissingId(0))
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let broken = write_catalog("{ not json");
        assert!(matches!(
            load_catalog(Some(broken.path())),
            Err(CatalogError::Parse { .. })
        ));
    }
}
