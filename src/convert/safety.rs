//! File safety around a conversion: hashing, collision detection, backups,
//! overwrite confirmation and atomic writes.
//!
//! None of this touches the conversion itself. [`FileSafety::check_write`]
//! runs before the output exists on disk and [`FileSafety::write_atomic`]
//! replaces the target in one step, so a failed conversion never leaves a
//! partial file behind.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Read size used when hashing files.
const HASH_CHUNK_SIZE: usize = 4096;

/// Safety settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyConfig {
    /// Ask before overwriting an existing output
    pub require_confirmation: bool,

    /// Copy an existing output aside before replacing it
    pub create_backup: bool,

    /// Refuse outputs that share the input's stem but differ in content
    pub check_hash: bool,

    /// Existing outputs are only replaced after confirmation
    pub prevent_overwrite: bool,

    /// Suffix appended to backup files
    pub backup_suffix: String,
}

impl SafetyConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace outputs without asking and without the hash check.
    pub fn forced(mut self) -> Self {
        self.require_confirmation = false;
        self.prevent_overwrite = false;
        self.check_hash = false;
        self
    }

    /// Enable or disable backups.
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.create_backup = enabled;
        self
    }

    /// Enable or disable the collision check.
    pub fn with_hash_check(mut self, enabled: bool) -> Self {
        self.check_hash = enabled;
        self
    }

    /// Enable or disable the overwrite prompt.
    pub fn with_confirmation(mut self, enabled: bool) -> Self {
        self.require_confirmation = enabled;
        self
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            require_confirmation: true,
            create_backup: true,
            check_hash: true,
            prevent_overwrite: true,
            backup_suffix: ".backup".to_string(),
        }
    }
}

/// Decides whether an existing file may be overwritten.
pub trait Confirm: Send + Sync {
    /// Return `true` to allow overwriting `path`.
    fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// Fixed answer to every overwrite question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm_overwrite(&self, _path: &Path) -> bool {
        self.0
    }
}

/// Outcome of a successful safety check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteCheck {
    /// Backup made of the previous output, if any
    pub backup: Option<PathBuf>,
}

/// File safety layer.
pub struct FileSafety {
    config: SafetyConfig,
    confirm: Box<dyn Confirm>,
}

impl FileSafety {
    /// Create a safety layer that never overwrites without a `yes`.
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            config,
            confirm: Box::new(AutoConfirm(false)),
        }
    }

    /// Use a custom confirmation source.
    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// SHA-256 of a file as lowercase hex.
    pub fn file_hash(&self, path: &Path) -> Result<String> {
        hash_file(path)
    }

    /// Whether `target` exists with the source's stem but different content.
    pub fn detect_collision(&self, source: &Path, target: &Path) -> Result<bool> {
        if !target.exists() || source.file_stem() != target.file_stem() {
            return Ok(false);
        }
        Ok(hash_file(source)? != hash_file(target)?)
    }

    /// Copy `path` to the first free backup name.
    ///
    /// Returns `None` when there is nothing to back up.
    pub fn create_backup(&self, path: &Path) -> Result<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }
        let backup = backup_path(path, &self.config.backup_suffix);
        std::fs::copy(path, &backup)?;
        log::debug!("backed up {} to {}", path.display(), backup.display());
        Ok(Some(backup))
    }

    /// Run every check that must pass before `target` is written.
    pub fn check_write(&self, source: &Path, target: &Path) -> Result<WriteCheck> {
        if self.config.check_hash && self.detect_collision(source, target)? {
            return Err(refuse(target, "exists with different content"));
        }

        let mut check = WriteCheck::default();
        if target.exists() {
            if self.config.prevent_overwrite
                && self.config.require_confirmation
                && !self.confirm.confirm_overwrite(target)
            {
                return Err(refuse(target, "overwrite not confirmed"));
            }
            if self.config.create_backup {
                match self.create_backup(target) {
                    Ok(backup) => check.backup = backup,
                    Err(e) => log::warn!("could not back up {}: {}", target.display(), e),
                }
            }
        }
        Ok(check)
    }

    /// Replace `target` with `content` in one rename.
    pub fn write_atomic(&self, target: &Path, content: &[u8]) -> Result<()> {
        write_atomic(target, content)
    }
}

impl Default for FileSafety {
    fn default() -> Self {
        Self::new(SafetyConfig::default())
    }
}

impl std::fmt::Debug for FileSafety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSafety")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// SHA-256 of a file as lowercase hex.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 of a byte slice as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Write through a temporary file in the target directory.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.flush()?;
    temp.persist(target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    let first = PathBuf::from(&name);
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| {
            let mut numbered = name.clone();
            numbered.push(format!(".{}", n));
            PathBuf::from(numbered)
        })
        .find(|p| !p.exists())
        .unwrap_or(first)
}

fn refuse(path: &Path, reason: &str) -> Error {
    Error::Safety {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_hash_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_bytes(b"abc"), hash_file(&path).unwrap());
    }

    #[test]
    fn test_collision_needs_same_stem() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.md");
        let target = dir.path().join("notes.docx");
        let other = dir.path().join("other.docx");
        fs::write(&source, "# a").unwrap();
        fs::write(&target, "different").unwrap();
        fs::write(&other, "different").unwrap();

        let safety = FileSafety::default();
        assert!(safety.detect_collision(&source, &target).unwrap());
        assert!(!safety.detect_collision(&source, &other).unwrap());
        assert!(!safety
            .detect_collision(&source, &dir.path().join("missing.docx"))
            .unwrap());
    }

    #[test]
    fn test_backup_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        fs::write(&path, "v1").unwrap();

        let safety = FileSafety::default();
        let first = safety.create_backup(&path).unwrap().unwrap();
        let second = safety.create_backup(&path).unwrap().unwrap();
        assert_eq!(first, dir.path().join("out.md.backup"));
        assert_eq!(second, dir.path().join("out.md.backup.1"));
        assert_eq!(fs::read_to_string(second).unwrap(), "v1");
    }

    #[test]
    fn test_overwrite_refused_without_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.md");
        let target = dir.path().join("out.docx");
        fs::write(&source, "# a").unwrap();
        fs::write(&target, "old").unwrap();

        let safety = FileSafety::default();
        let err = safety.check_write(&source, &target).unwrap_err();
        assert!(matches!(err, Error::Safety { .. }));

        let safety = FileSafety::default().with_confirm(AutoConfirm(true));
        let check = safety.check_write(&source, &target).unwrap();
        assert_eq!(check.backup, Some(dir.path().join("out.docx.backup")));
    }

    #[test]
    fn test_forced_skips_collision_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.md");
        let target = dir.path().join("doc.docx");
        fs::write(&source, "# a").unwrap();
        fs::write(&target, "old").unwrap();

        let safety = FileSafety::new(SafetyConfig::new().forced().with_backup(false));
        let check = safety.check_write(&source, &target).unwrap();
        assert!(check.backup.is_none());
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.md");
        fs::write(&target, "old").unwrap();
        write_atomic(&target, b"new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }
}
