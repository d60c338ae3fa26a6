use bevy::prelude::*;
use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use flate2::write::ZlibEncoder;
use flate2::read::ZlibDecoder;
use flate2::Compression;
use crate::scene::error::SceneError;
use super::{cell_count, NavGrid, TerrainFlags};

pub const TERRAIN_SNAPSHOT_VERSION: u32 = 1;

/// Serializable copy of a grid's terrain flags.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TerrainSnapshot {
    pub version: u32,
    pub world_size: Vec2,
    pub cell_size: UVec2,
    pub grid_size: IVec2,
    /// Row-major.
    pub flags: Vec<TerrainFlags>,
}

impl NavGrid {
    pub fn snapshot(&self) -> TerrainSnapshot {
        TerrainSnapshot {
            version: TERRAIN_SNAPSHOT_VERSION,
            world_size: self.world_size,
            cell_size: self.cell_size,
            grid_size: self.grid_size,
            flags: self.terrain.clone(),
        }
    }

    /// Resize to the snapshot's dimensions and copy its flags in.
    ///
    /// The grid is left untouched when the snapshot is rejected.
    pub fn restore(&mut self, snapshot: &TerrainSnapshot) -> Result<(), SceneError> {
        if snapshot.version != TERRAIN_SNAPSHOT_VERSION {
            return Err(SceneError::SnapshotVersion {
                found: snapshot.version,
                expected: TERRAIN_SNAPSHOT_VERSION,
            });
        }

        let cell = snapshot.cell_size.max(UVec2::ONE).as_vec2();
        let derived = (snapshot.world_size.max(Vec2::ZERO) / cell).ceil().as_ivec2();
        // Oversized headers can never match a real flag buffer
        let expected = cell_count(derived).unwrap_or(usize::MAX);
        if derived != snapshot.grid_size || snapshot.flags.len() != expected {
            return Err(SceneError::SnapshotSize { expected, found: snapshot.flags.len() });
        }

        self.resize(
            snapshot.world_size.x,
            snapshot.world_size.y,
            snapshot.cell_size.x,
            snapshot.cell_size.y,
        );
        for (cell, flags) in self.terrain.iter_mut().zip(&snapshot.flags) {
            *cell = *flags & TerrainFlags::all();
        }
        info!("[NAV] restored terrain snapshot ({}x{} cells)", self.grid_size.x, self.grid_size.y);
        Ok(())
    }
}

pub fn save_terrain(path: impl AsRef<Path>, snapshot: &TerrainSnapshot) -> Result<(), SceneError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    bincode::serialize_into(&mut encoder, snapshot)?;
    encoder.finish()?;
    Ok(())
}

pub fn load_terrain(path: impl AsRef<Path>) -> Result<TerrainSnapshot, SceneError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut decoder = ZlibDecoder::new(reader);
    let snapshot: TerrainSnapshot = bincode::deserialize_from(&mut decoder)?;
    Ok(snapshot)
}
