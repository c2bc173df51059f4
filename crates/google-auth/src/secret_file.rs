//! Signing secret provisioning
//!
//! Resolves the HMAC secret for session tokens once at startup:
//! 1. a non-blank explicit secret from the host wins and is never written to disk
//! 2. otherwise `.simple-google-oauth.json` in the working directory is read
//! 3. otherwise 32 random bytes are hex-encoded and written to that file
//!
//! The file holds `{ "jwtSecret": "<hex>" }`. Writes go through a temp file
//! and rename so a crash never leaves a truncated secret behind. Runs before
//! any request is served, so plain blocking I/O is used.
//!
//! Two processes starting at the same time in the same directory can each
//! generate a secret; the last rename wins.

use std::path::{Path, PathBuf};

use common::Secret;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::SECRET_FILE_NAME;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct StoredSecret {
    #[serde(rename = "jwtSecret")]
    jwt_secret: Secret<String>,
}

#[derive(Serialize)]
struct StoredSecretRef<'a> {
    #[serde(rename = "jwtSecret")]
    jwt_secret: &'a str,
}

/// Resolve the signing secret relative to the process working directory.
///
/// A blank explicit secret counts as not supplied and falls through to the
/// secret file.
pub fn obtain_secret(explicit: Option<Secret<String>>) -> Result<Secret<String>> {
    if let Some(secret) = explicit.filter(|s| !s.is_blank()) {
        return obtain_secret_in(Path::new("."), Some(secret));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::Io(format!("resolving working directory: {e}")))?;
    obtain_secret_in(&cwd, None)
}

/// Resolve the signing secret, reading or creating the secret file in `dir`.
pub fn obtain_secret_in(dir: &Path, explicit: Option<Secret<String>>) -> Result<Secret<String>> {
    match explicit {
        Some(secret) if !secret.is_blank() => {
            info!("using provided jwt secret");
            return Ok(secret);
        }
        Some(_) => warn!("provided jwt secret is blank, falling back to secret file"),
        None => {}
    }

    let path = secret_path(dir);
    if path.exists() {
        let secret = read_secret(&path)?;
        info!(path = %path.display(), "loaded jwt secret from file");
        return Ok(secret);
    }

    let secret = generate_secret();
    write_atomic(&path, secret.expose())?;
    info!(path = %path.display(), "generated and saved new jwt secret");
    Ok(secret)
}

/// Location of the secret file inside `dir`.
pub fn secret_path(dir: &Path) -> PathBuf {
    dir.join(SECRET_FILE_NAME)
}

fn read_secret(path: &Path) -> Result<Secret<String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("reading secret file {}: {e}", path.display())))?;
    let stored: StoredSecret = serde_json::from_str(&contents)
        .map_err(|e| Error::SecretParse(format!("{}: {e}", path.display())))?;

    if stored.jwt_secret.is_blank() {
        return Err(Error::SecretParse(format!(
            "{}: jwtSecret is empty",
            path.display()
        )));
    }
    Ok(stored.jwt_secret)
}

/// 32 random bytes, hex encoded (64 characters).
fn generate_secret() -> Secret<String> {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    Secret::new(hex::encode(bytes))
}

/// Write the secret file atomically with 0600 permissions.
fn write_atomic(path: &Path, secret: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(&StoredSecretRef { jwt_secret: secret })
        .map_err(|e| Error::SecretParse(format!("serializing secret file: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("secret path has no parent directory".into()))?;
    let tmp_path = dir.join(format!(".simple-google-oauth.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Io(format!("writing temp secret file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::Io(format!("setting secret file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Io(format!("renaming temp secret file: {e}")))?;

    debug!(path = %path.display(), "persisted jwt secret");
    Ok(())
}
