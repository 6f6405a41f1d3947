use std::path::{Path, PathBuf};

/// Injected configuration for where databases live on disk (spec §9: "the
/// default output path and root database path are constants referenced by
/// the source but not characterized; treat as injected configuration").
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            root: PathBuf::from("./data"),
        }
    }
}

impl EngineConfig {
    pub fn new(root: impl Into<PathBuf>) -> EngineConfig {
        EngineConfig { root: root.into() }
    }

    /// `<root>/<dbName>/` — the directory a database occupies.
    pub fn database_dir(&self, db_name: &str) -> PathBuf {
        self.root.join(db_name)
    }

    /// `<root>/<dbName>/<dbName>.db` — the whole-image snapshot file.
    pub fn database_file(&self, db_name: &str) -> PathBuf {
        self.database_dir(db_name).join(format!("{db_name}.db"))
    }

    /// The sibling path the transaction manager snapshots to at `BEGIN`,
    /// exclusively owned by it between `begin` and `commit`/`rollback`
    /// (spec §5).
    pub fn transaction_snapshot_path(&self, db_name: &str) -> PathBuf {
        self.database_dir(db_name)
            .join(format!("{db_name}.tx.snapshot"))
    }
}

pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
