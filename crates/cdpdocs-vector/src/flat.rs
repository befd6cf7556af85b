use std::sync::RwLock;

use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::VectorIndexer;
use cdpdocs_core::types::Position;

use crate::distance::l2_distance;

/// Exact nearest-neighbour index over a contiguous arena of `dim`-length rows.
///
/// Row `i` of the arena is the vector added `i`-th; that row number is the
/// vector's [`Position`] and nothing else identifies it.
pub struct FlatL2Index {
    dim: usize,
    arena: RwLock<Vec<f32>>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("vector dimension must be > 0".into()));
        }
        Ok(Self { dim, arena: RwLock::new(Vec::new()) })
    }

    pub(crate) fn from_rows(dim: usize, rows: Vec<Vec<f32>>) -> Result<Self> {
        let index = Self::new(dim)?;
        {
            let mut arena = index.write()?;
            arena.reserve(rows.len() * dim);
            for row in rows {
                check_dim(dim, row.len())?;
                arena.extend_from_slice(&row);
            }
        }
        Ok(index)
    }

    /// Copy of every stored row, in position order.
    pub fn rows(&self) -> Result<Vec<Vec<f32>>> {
        let arena = self.read()?;
        Ok(arena.chunks_exact(self.dim).map(<[f32]>::to_vec).collect())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<f32>>> {
        self.arena.read().map_err(|_| Error::Upstream("vector index lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<f32>>> {
        self.arena.write().map_err(|_| Error::Upstream("vector index lock poisoned".into()))
    }
}

fn check_dim(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

impl VectorIndexer for FlatL2Index {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.arena.read().map(|a| a.len() / self.dim).unwrap_or(0)
    }

    fn add(&self, vector: Vec<f32>) -> Result<Position> {
        check_dim(self.dim, vector.len())?;
        let mut arena = self.write()?;
        let position = Position(arena.len() / self.dim);
        arena.extend_from_slice(&vector);
        Ok(position)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Position, f32)>> {
        check_dim(self.dim, query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let arena = self.read()?;
        let mut hits: Vec<(Position, f32)> = arena
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (Position(i), l2_distance(query, row)))
            .collect();
        drop(arena);
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits.truncate(k);
        Ok(hits)
    }
}
