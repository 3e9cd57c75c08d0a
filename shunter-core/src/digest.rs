//! SHA-256 file digests with `.digest` sidecar records.
//!
//! The sidecar next to a manifest remembers the hash of its last committed
//! content, letting the orchestrator skip files a re-run regenerated
//! byte-for-byte identically.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, CoreError};

/// Compute the lowercase hex SHA-256 digest of the file at `path`.
///
/// Returns an empty string with no error when the file does not exist;
/// every other I/O failure propagates.
pub fn calculate(path: &Path) -> Result<String, CoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(String::new()),
        Err(err) => return Err(io_err(path, err)),
    };

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Read the stored digest from the `.digest` sidecar of `path`.
///
/// Returns an empty string with no error when the sidecar does not exist.
pub fn stored(path: &Path) -> Result<String, CoreError> {
    let sidecar = sidecar_path(path);
    match std::fs::read_to_string(&sidecar) {
        Ok(digest) => Ok(digest),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(sidecar, err)),
    }
}

/// Compare the calculated digest of `path` against its sidecar record.
///
/// Two empty digests compare equal, so only call this on files known to
/// exist.
pub fn verify(path: &Path) -> Result<bool, CoreError> {
    Ok(calculate(path)? == stored(path)?)
}

/// Calculate the digest of `path` and write it to the sidecar, mode `0600`.
pub fn save(path: &Path) -> Result<(), CoreError> {
    let digest = calculate(path)?;
    let sidecar = sidecar_path(path);
    write_sidecar(&sidecar, digest.as_bytes()).map_err(|err| io_err(&sidecar, err))
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".digest");
    PathBuf::from(os)
}

#[cfg(unix)]
fn write_sidecar(sidecar: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(sidecar)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_sidecar(sidecar: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(sidecar, contents)
}
