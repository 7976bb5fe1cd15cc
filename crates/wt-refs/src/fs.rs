//! File-backed reference store.
//!
//! Each ref is a small text file under `<root>/refs/...` holding either a hex
//! commit id or `ref: <canonical name>`. HEAD lives at `<root>/HEAD` in the
//! same format, with symbolic HEAD always naming a branch.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use wt_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::{validate_branch_name, validate_ref_name};
use crate::traits::RefStore;
use crate::types::{branch_ref, Head, Ref, RefKind};

const SYMBOLIC_PREFIX: &str = "ref: ";

/// A [`RefStore`] persisted as plain files under a control directory.
#[derive(Debug, Clone)]
pub struct FsRefStore {
    root: PathBuf,
}

impl FsRefStore {
    /// Open a ref store rooted at `root` (the control directory).
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("refs").join("heads"))?;
        fs::create_dir_all(root.join("refs").join("tags"))?;
        Ok(Self { root })
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        name.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }

    fn head_path(&self) -> PathBuf {
        self.root.join("HEAD")
    }

    fn read_text(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{text}")?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn parse_ref(name: &str, text: &str) -> Result<Ref> {
        if let Some(target) = text.strip_prefix(SYMBOLIC_PREFIX) {
            return Ok(Ref::Symbolic(target.trim().to_string()));
        }
        ObjectId::from_hex(text)
            .map(Ref::Direct)
            .map_err(|e| RefError::Corrupt {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    fn format_ref(reference: &Ref) -> String {
        match reference {
            Ref::Direct(id) => id.to_hex(),
            Ref::Symbolic(target) => format!("{SYMBOLIC_PREFIX}{target}"),
        }
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        if validate_ref_name(name).is_err() {
            return Ok(None);
        }
        // `refs/remotes/origin` is a directory once `origin/HEAD` exists.
        let path = self.ref_path(name);
        if path.is_dir() {
            return Ok(None);
        }
        match Self::read_text(&path)? {
            Some(text) => Self::parse_ref(name, &text).map(Some),
            None => Ok(None),
        }
    }

    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()> {
        validate_ref_name(name)?;
        if RefKind::of(name) == RefKind::Tag {
            if let Some(existing) = self.read_ref(name)? {
                if &existing != reference {
                    return Err(RefError::TagImmutable {
                        name: name.to_string(),
                    });
                }
            }
        }
        self.write_text(&self.ref_path(name), &Self::format_ref(reference))?;
        debug!(name, target = %Self::format_ref(reference), "updated ref");
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        if let Some(Head::Symbolic(current)) = self.head()? {
            if name == branch_ref(&current) {
                return Err(RefError::DeleteCurrentBranch { name: current });
            }
        }
        validate_ref_name(name)?;
        match fs::remove_file(self.ref_path(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        let mut refs = Vec::new();
        for entry in WalkDir::new(self.root.join("refs")).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                RefError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(ErrorKind::Other, "ref directory loop")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !name.starts_with(prefix) || validate_ref_name(&name).is_err() {
                continue;
            }
            if let Some(text) = Self::read_text(entry.path())? {
                refs.push((name.clone(), Self::parse_ref(&name, &text)?));
            }
        }
        refs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(refs)
    }

    fn head(&self) -> Result<Option<Head>> {
        let Some(text) = Self::read_text(&self.head_path())? else {
            return Ok(None);
        };
        match Self::parse_ref("HEAD", &text)? {
            Ref::Direct(id) => Ok(Some(Head::Detached(id))),
            Ref::Symbolic(target) => match target.strip_prefix("refs/heads/") {
                Some(branch) => Ok(Some(Head::Symbolic(branch.to_string()))),
                None => Err(RefError::Corrupt {
                    name: "HEAD".into(),
                    reason: format!("symbolic HEAD must name a branch, got {target}"),
                }),
            },
        }
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        let text = Self::format_ref(&Ref::Symbolic(branch_ref(branch)));
        self.write_text(&self.head_path(), &text)
    }

    fn set_head_detached(&self, id: ObjectId) -> Result<()> {
        self.write_text(&self.head_path(), &id.to_hex())
    }
}
