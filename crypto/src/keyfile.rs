//! Raw 32-byte seed files for long-lived signing keys.

use std::path::Path;

use rand::RngCore;
use tracing::info;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Read a 32-byte seed from `path`.
pub fn load_seed(path: &Path) -> Result<[u8; 32], CryptoError> {
    let mut bytes = std::fs::read(path)?;
    if bytes.len() != 32 {
        let len = bytes.len();
        bytes.zeroize();
        return Err(CryptoError::SeedLength {
            path: path.display().to_string(),
            len,
        });
    }
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(seed)
}

/// Write `seed` to `path`, creating parent directories. On Unix the file is
/// readable by the owner only.
pub fn save_seed(path: &Path, seed: &[u8; 32]) -> Result<(), CryptoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, seed)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Load the seed at `path`, generating and saving a new one if the file does
/// not exist.
pub fn load_or_create_seed(path: &Path) -> Result<[u8; 32], CryptoError> {
    if path.exists() {
        return load_seed(path);
    }
    let mut seed = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    save_seed(path, &seed)?;
    info!(path = %path.display(), "generated new signing seed");
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_reload_returns_same_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("treasury.key");
        let first = load_or_create_seed(&path).unwrap();
        let second = load_or_create_seed(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wrong_length_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.key");
        std::fs::write(&path, [1u8; 10]).unwrap();
        assert!(matches!(
            load_seed(&path),
            Err(CryptoError::SeedLength { len: 10, .. })
        ));
    }
}
