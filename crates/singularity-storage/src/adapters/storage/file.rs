use crate::domain::config::StorageConfig;
use crate::domain::entities::UnitId;
use crate::domain::errors::PersistenceError;
use crate::ports::outbound::UnitStore;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One JSON file per unit: `<dir>/<prefix><id>.json`.
///
/// Writes go through a temp file that is synced and renamed over the
/// target, so a crash mid-flush leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct FileUnitStore {
    dir: PathBuf,
    prefix: String,
}

impl FileUnitStore {
    pub fn new(dir: impl AsRef<Path>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
        }
    }

    /// Store at the configured data directory and file prefix.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.data_dir, config.file_prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a unit.
    ///
    /// `[A-Za-z0-9_-]` is kept as is; every other byte of the id is written
    /// as `%XX`, so two distinct ids never share a file.
    pub fn path_for(&self, id: &UnitId) -> PathBuf {
        self.dir
            .join(format!("{}{}.json", self.prefix, escape_id(id.as_str())))
    }
}

fn escape_id(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            escaped.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push('%');
                escaped.push_str(&hex::encode_upper([byte]));
            }
        }
    }
    escaped
}

impl UnitStore for FileUnitStore {
    fn read_unit(&self, id: &UnitId) -> Result<Option<Vec<u8>>, PersistenceError> {
        match std::fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn contains_unit(&self, id: &UnitId) -> Result<bool, PersistenceError> {
        Ok(self.path_for(id).try_exists()?)
    }

    fn write_unit(&mut self, id: &UnitId, bytes: &[u8]) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_for(id);
        let temp_path = path.with_extension("json.tmp");

        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }
}
