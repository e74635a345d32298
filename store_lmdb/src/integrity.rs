//! LMDB database integrity checks.
//!
//! Run on open to detect corruption early, before the node starts producing
//! blocks.

use std::path::Path;

use heed::Env;

use crate::environment::{
    DB_ACCOUNTS, DB_BLOCKS, DB_ENTRIES, DB_INTENTS, DB_META, DB_PENDING, DB_TX_IDS,
};
use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

const EXPECTED_DATABASES: &[&str] = &[
    DB_INTENTS,
    DB_PENDING,
    DB_TX_IDS,
    DB_BLOCKS,
    DB_ACCOUNTS,
    DB_ENTRIES,
    DB_META,
];

/// Open each expected database and count its entries. Read failures and
/// missing databases are recorded in the report rather than returned.
pub fn check_integrity(env: &Env) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;
    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report.errors.push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }

    Ok(report)
}

/// Check that an existing data directory looks like an LMDB environment.
///
/// A nonexistent directory is fine (fresh start). An existing directory
/// without `data.mdb` suggests a wrong path or a damaged install.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 8, 10 * 1024 * 1024).unwrap();
        let report = check_integrity(env.env()).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.databases_checked, EXPECTED_DATABASES.len() as u32);
        assert_eq!(report.total_entries, 0);
    }

    #[test]
    fn data_dir_without_data_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
        assert!(check_data_dir(&dir.path().join("not-yet-created")).is_ok());
    }
}
