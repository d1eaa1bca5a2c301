use std::fs;
use std::path::{Path, PathBuf};

use crate::{Script, ScriptLoadError};

/// File extension of script files.
pub const SCRIPT_EXTENSION: &str = "vsc";

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedScript {
    pub path: PathBuf,
    pub reason: String,
}

/// Pre-authored scripts the pool draws VFR flights from.
#[derive(Debug, Clone, Default)]
pub struct ScriptLibrary {
    scripts: Vec<Script>,
    rejected: Vec<RejectedScript>,
}

impl ScriptLibrary {
    #[must_use]
    pub fn from_scripts(scripts: Vec<Script>) -> Self {
        Self {
            scripts,
            rejected: Vec::new(),
        }
    }

    /// Parses every `*.vsc` file below `dir`, in path order.
    ///
    /// Files that fail to parse are listed in `rejected()` and skipped.
    pub fn load(dir: &Path) -> Result<Self, ScriptLoadError> {
        if !dir.is_dir() {
            return Err(ScriptLoadError::FolderMissing {
                path: dir.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        collect_script_files(dir, &mut files)?;
        files.sort();

        let mut library = Self::default();
        for path in files {
            let text = fs::read_to_string(&path).map_err(|source| ScriptLoadError::Read {
                path: path.clone(),
                source,
            })?;
            match Script::parse(&text) {
                Ok(script) => library.scripts.push(script),
                Err(error) => library.rejected.push(RejectedScript {
                    path,
                    reason: error.to_string(),
                }),
            }
        }

        Ok(library)
    }

    #[must_use]
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    #[must_use]
    pub fn rejected(&self) -> &[RejectedScript] {
        &self.rejected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    #[must_use]
    pub fn into_scripts(self) -> Vec<Script> {
        self.scripts
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptLoadError> {
        let text = fs::read_to_string(path).map_err(|source| ScriptLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ScriptLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ScriptLoadError> {
        fs::write(path, self.to_text()).map_err(|source| ScriptLoadError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn collect_script_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ScriptLoadError> {
    let entries = fs::read_dir(dir).map_err(|source| ScriptLoadError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ScriptLoadError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_script_files(&path, files)?;
        } else if path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case(SCRIPT_EXTENSION))
        {
            files.push(path);
        }
    }

    Ok(())
}
