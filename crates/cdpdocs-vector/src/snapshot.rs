//! On-disk snapshots of a [`FlatL2Index`].
//!
//! A snapshot is a JSON document `{ "dim": D, "vectors": [[..], ..] }` whose row
//! order is the position order. Writes go to a temp file in the target directory
//! and are renamed into place, so a crash never leaves a torn snapshot.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::VectorIndexer;

use crate::flat::FlatL2Index;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot { dim: self.dim(), vectors: self.rows()? };
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut w, &snapshot).map_err(|e| Error::upstream("vector snapshot", e))?;
            w.flush()?;
        }
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        info!(path = %path.display(), vectors = snapshot.vectors.len(), "saved vector snapshot");
        Ok(())
    }

    /// Load a snapshot, refusing one built for a different dimension.
    pub fn load(path: &Path, expected_dim: usize) -> Result<Self> {
        let file = fs::File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::upstream("vector snapshot", e))?;
        if snapshot.dim != expected_dim {
            return Err(Error::DimensionMismatch { expected: expected_dim, actual: snapshot.dim });
        }
        let count = snapshot.vectors.len();
        let index = Self::from_rows(snapshot.dim, snapshot.vectors)?;
        info!(path = %path.display(), vectors = count, "loaded vector snapshot");
        Ok(index)
    }

    pub fn open_or_new(path: &Path, dim: usize) -> Result<Self> {
        if path.exists() {
            Self::load(path, dim)
        } else {
            Self::new(dim)
        }
    }
}
