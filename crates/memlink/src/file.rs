// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Whole-file persistence of byte ranges.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use tracing::{Level, event};

use crate::{Error, MemBlock, Result};

/// Writes `bytes` into a newly created or truncated file at `path`.
///
/// On Unix, `mode` sets the permission bits of a newly created file (subject to the umask of
/// the process). Elsewhere it is ignored.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the failed operation and the path if the file cannot be
/// created or written.
///
/// # Example
///
/// ```
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("greeting");
/// memlink::write_file(&path, b"hello", None)?;
///
/// let block = memlink::read_file(&path)?;
/// assert_eq!(&*block, b"hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write_file(path: impl AsRef<Path>, bytes: &[u8], mode: Option<u32>) -> Result<()> {
    let path = path.as_ref();

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;

        if let Some(mode) = mode {
            options.mode(mode);
        }
    }

    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path).map_err(|e| Error::io("open", path, e))?;
    file.write_all(bytes).map_err(|e| Error::io("write", path, e))?;

    event!(Level::DEBUG, message = "wrote file", path = %path.display(), len = bytes.len());

    Ok(())
}

/// Reads the whole file at `path` into a new block sized exactly to the file.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the failed operation and the path if the file cannot be
/// opened, examined or read, or [`Error::Alloc`] if the memory for its contents cannot be
/// allocated.
pub fn read_file(path: impl AsRef<Path>) -> Result<MemBlock<'static>> {
    let path = path.as_ref();

    let mut file = File::open(path).map_err(|e| Error::io("open", path, e))?;
    let metadata = file.metadata().map_err(|e| Error::io("stat", path, e))?;

    let len = usize::try_from(metadata.len()).ok().ok_or(Error::CapacityOverflow)?;
    let mut block: MemBlock<'static> = MemBlock::with_len(len)?;

    if let Some(bytes) = block.as_mut_slice() {
        file.read_exact(bytes).map_err(|e| Error::io("read", path, e))?;
    }

    event!(Level::DEBUG, message = "read file", path = %path.display(), len);

    Ok(block)
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    #[traced_test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");

        write_file(&path, b"\x00\x01binary\xFF", None).unwrap();
        let block = read_file(&path).unwrap();

        assert_eq!(&*block, b"\x00\x01binary\xFF");
        assert_eq!(block.capacity(), block.len());
        assert!(logs_contain("read file"));
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");

        write_file(&path, b"", None).unwrap();
        let block = read_file(&path).unwrap();

        assert!(block.is_empty());
        assert_eq!(block.capacity(), 0);
    }

    #[test]
    fn rewrite_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shrinking");

        write_file(&path, b"a long first version", None).unwrap();
        write_file(&path, b"short", None).unwrap();

        assert_eq!(&*read_file(&path).unwrap(), b"short");
    }

    #[test]
    fn missing_file_reports_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist");

        let error = read_file(&path).unwrap_err();

        match &error {
            Error::Io {
                operation,
                path: Some(error_path),
                source,
            } => {
                assert_eq!(*operation, "open");
                assert_eq!(error_path, &path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(error.os_error_code().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn mode_applies_to_new_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private");

        write_file(&path, b"secret", Some(0o600)).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
