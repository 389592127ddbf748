use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

const STAGING_SUFFIX: &str = "astgen-tmp";
const BACKUP_SUFFIX: &str = "astgen-bak";

/// What happened to one output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// Already held the generated text; left untouched
    Unchanged,
}

/// A staged file waiting to replace its destination
struct Staged<'a> {
    staging: PathBuf,
    destination: &'a Path,
}

/// A destination already replaced, with the previous file if there was one
struct Swapped<'a> {
    destination: &'a Path,
    backup: Option<PathBuf>,
}

/// Write generated files all-or-nothing.
///
/// Every changed file is first staged next to its destination. Destinations
/// are replaced only once every stage succeeded, each previous file being
/// moved aside first. If any replacement fails, the ones already made are
/// rolled back and the staged files are removed.
pub fn write_outputs(outputs: &[(PathBuf, String)]) -> Result<Vec<(PathBuf, WriteStatus)>> {
    let mut statuses = Vec::with_capacity(outputs.len());
    let mut staged = Vec::new();

    for (path, contents) in outputs {
        if is_up_to_date(path, contents) {
            statuses.push((path.clone(), WriteStatus::Unchanged));
            continue;
        }

        match stage(path, contents) {
            Ok(staging) => staged.push(Staged {
                staging,
                destination: path,
            }),
            Err(e) => {
                discard(&staged);
                return Err(e);
            }
        }
        statuses.push((path.clone(), WriteStatus::Written));
    }

    commit(&staged)?;
    Ok(statuses)
}

/// Whether `path` already holds exactly `contents`
pub fn is_up_to_date(path: &Path, contents: &str) -> bool {
    fs::read_to_string(path)
        .map(|existing| existing == contents)
        .unwrap_or(false)
}

fn stage(path: &Path, contents: &str) -> Result<PathBuf> {
    let write_error = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    match fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_file() => {
            return Err(write_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "destination exists and is not a regular file",
            )));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(write_error(e)),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    let staging = sibling(path, STAGING_SUFFIX);
    fs::write(&staging, contents).map_err(write_error)?;
    Ok(staging)
}

/// Move every staged file into place, restoring all destinations on failure
fn commit(staged: &[Staged<'_>]) -> Result<()> {
    let mut swapped: Vec<Swapped<'_>> = Vec::with_capacity(staged.len());

    for (i, entry) in staged.iter().enumerate() {
        if let Err(source) = swap(entry, &mut swapped) {
            rollback(&swapped);
            discard(&staged[i..]);
            return Err(Error::Write {
                path: entry.destination.to_path_buf(),
                source,
            });
        }
    }

    for done in &swapped {
        if let Some(backup) = &done.backup {
            let _ = fs::remove_file(backup);
        }
    }

    Ok(())
}

fn swap<'a>(entry: &Staged<'a>, swapped: &mut Vec<Swapped<'a>>) -> io::Result<()> {
    let backup = if entry.destination.exists() {
        let backup = sibling(entry.destination, BACKUP_SUFFIX);
        fs::rename(entry.destination, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(&entry.staging, entry.destination) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, entry.destination);
        }
        return Err(e);
    }

    swapped.push(Swapped {
        destination: entry.destination,
        backup,
    });
    Ok(())
}

fn rollback(swapped: &[Swapped<'_>]) {
    for done in swapped.iter().rev() {
        let restored = match &done.backup {
            Some(backup) => fs::rename(backup, done.destination),
            None => fs::remove_file(done.destination),
        };
        if let Err(e) = restored {
            warn!(path = %done.destination.display(), error = %e, "could not restore output");
        }
    }
}

fn discard(staged: &[Staged<'_>]) {
    for entry in staged {
        let _ = fs::remove_file(&entry.staging);
    }
}

/// `<path>.<suffix>` in the same directory
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_outputs_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src").join("expr.rs");

        let statuses = write_outputs(&[(path.clone(), "pub enum Expr {}\n".into())]).unwrap();

        assert_eq!(statuses, vec![(path.clone(), WriteStatus::Written)]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "pub enum Expr {}\n");
    }

    #[test]
    fn test_unchanged_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expr.rs");
        fs::write(&path, "same").unwrap();

        let statuses = write_outputs(&[(path.clone(), "same".into())]).unwrap();
        assert_eq!(statuses, vec![(path, WriteStatus::Unchanged)]);
    }

    #[test]
    fn test_failed_stage_leaves_other_outputs_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("expr.rs");
        fs::write(&good, "old").unwrap();

        // A directory cannot be staged into: its parent is a regular file
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let bad = blocker.join("stmt.rs");

        let err = write_outputs(&[(good.clone(), "new".into()), (bad, "new".into())]).unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(fs::read_to_string(&good).unwrap(), "old");
        assert!(leftovers(dir.path()).is_empty());
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(STAGING_SUFFIX) || name.ends_with(BACKUP_SUFFIX))
            .collect()
    }

    #[test]
    fn test_directory_destination_leaves_other_outputs_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let expr = dir.path().join("expr.rs");
        fs::write(&expr, "old").unwrap();
        let stmt = dir.path().join("stmt.rs");
        fs::create_dir(&stmt).unwrap();

        let err = write_outputs(&[(expr.clone(), "new".into()), (stmt.clone(), "new".into())])
            .unwrap_err();

        assert!(matches!(err, Error::Write { ref path, .. } if *path == stmt));
        assert_eq!(fs::read_to_string(&expr).unwrap(), "old");
        assert!(stmt.is_dir());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_failed_replacement_restores_earlier_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let expr = dir.path().join("expr.rs");
        let stmt = dir.path().join("stmt.rs");
        let fresh = dir.path().join("fresh.rs");
        fs::write(&expr, "old").unwrap();

        let staged = vec![
            Staged {
                staging: stage(&expr, "new").unwrap(),
                destination: &expr,
            },
            Staged {
                staging: stage(&fresh, "new").unwrap(),
                destination: &fresh,
            },
            // Never staged, so moving it into place fails
            Staged {
                staging: sibling(&stmt, STAGING_SUFFIX),
                destination: &stmt,
            },
        ];

        let err = commit(&staged).unwrap_err();

        assert!(matches!(err, Error::Write { ref path, .. } if *path == stmt));
        assert_eq!(fs::read_to_string(&expr).unwrap(), "old");
        assert!(!fresh.exists());
        assert!(!stmt.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_successful_replacement_removes_backups() {
        let dir = tempfile::tempdir().unwrap();
        let expr = dir.path().join("expr.rs");
        fs::write(&expr, "old").unwrap();

        let statuses = write_outputs(&[(expr.clone(), "new".into())]).unwrap();

        assert_eq!(statuses, vec![(expr.clone(), WriteStatus::Written)]);
        assert_eq!(fs::read_to_string(&expr).unwrap(), "new");
        assert!(leftovers(dir.path()).is_empty());
    }
}
