use thiserror::Error;

/// Failures from the I/O edges of the scene core (config files, terrain snapshots).
///
/// The spatial index, navigation grid and depth sorter themselves never fail:
/// bad geometry is clamped, ignored or routed to the catch-all bucket.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("terrain snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("unsupported terrain snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("terrain snapshot holds {found} cells but its grid needs {expected}")]
    SnapshotSize { expected: usize, found: usize },
}
