mod hash;

pub use hash::compute_hash;

/// Default name of the collection holding the migration ledger
pub const DEFAULT_MIGRATION_COLLECTION: &str = "migrations";

/// Default directory scanned for migration documents
pub const DEFAULT_MIGRATION_DIR: &str = "migrations";

/// File extensions recognized as migration documents
pub const MIGRATION_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Strip a single trailing migration document extension, if present
pub fn strip_migration_extension(file_name: &str) -> &str {
    for ext in MIGRATION_EXTENSIONS {
        if let Some(stem) = file_name
            .strip_suffix(ext)
            .and_then(|rest| rest.strip_suffix('.'))
        {
            return stem;
        }
    }
    file_name
}
