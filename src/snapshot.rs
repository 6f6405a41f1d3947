use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{EngineError, EngineResult};

/// Fixed magic tag identifying an Anvil snapshot file, followed by a `u32`
/// format version. The envelope lets a future format revision refuse to
/// load a file written by an incompatible version instead of
/// misinterpreting its bytes (spec §9 design note on snapshot encoding).
const MAGIC: &[u8; 8] = b"ANVILDB\0";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    database: Database,
}

/// Writes a deterministic, versioned serialization of `database` to `path`.
/// `restore(save(d)) == d` value-wise (spec §8).
pub fn save(database: &Database, path: &Path) -> EngineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let envelope = Envelope {
        version: FORMAT_VERSION,
        database: database.clone(),
    };
    let body = bincode::serialize(&envelope).map_err(|e| EngineError::Io(e.to_string()))?;

    let mut file = fs::File::create(path)?;
    file.write_all(MAGIC)?;
    file.write_all(&body)?;
    Ok(())
}

/// Reads and decodes a snapshot written by [`save`], rejecting files with an
/// unrecognized magic tag or an unsupported format version.
pub fn load(path: &Path) -> EngineResult<Database> {
    let bytes = fs::read(path)?;
    if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
        return Err(EngineError::Io(format!(
            "'{}' is not an Anvil snapshot file",
            path.display()
        )));
    }

    let envelope: Envelope =
        bincode::deserialize(&bytes[MAGIC.len()..]).map_err(|e| EngineError::Io(e.to_string()))?;

    if envelope.version != FORMAT_VERSION {
        return Err(EngineError::Io(format!(
            "unsupported snapshot format version {} (expected {})",
            envelope.version, FORMAT_VERSION
        )));
    }

    Ok(envelope.database)
}

pub fn delete(path: &Path) -> EngineResult<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use tempfile::tempdir;

    #[test]
    fn round_trips_schema_and_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut database = Database::new("test", path.clone());
        database
            .create_table("t", &["id INTEGER PRIMARY KEY".to_string()])
            .unwrap();
        database
            .insert("t", &["id".to_string()], &[Value::Integer(1)])
            .unwrap();

        save(&database, &path).unwrap();
        let restored = load(&path).unwrap();

        assert_eq!(restored.name, database.name);
        assert_eq!(restored.tables.len(), database.tables.len());
        let original_rows = database.select("t", None, None).unwrap();
        let restored_rows = restored.select("t", None, None).unwrap();
        assert_eq!(original_rows.columns["id"], restored_rows.columns["id"]);
    }

    #[test]
    fn rejects_file_without_magic_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        fs::write(&path, b"not a snapshot").unwrap();
        assert!(load(&path).is_err());
    }
}
