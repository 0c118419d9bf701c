//! data_runtime: data schemas and loaders for the simulation core.
//!
//! Spec databases are plain serde structs loaded once at startup from
//! `data/config/*.toml`, with in-code defaults when the file is absent so
//! tests and headless runs never depend on the working directory.

pub mod specs {
    pub mod archetypes;
    pub mod ordnance;
}
pub mod configs {
    pub mod telemetry;
    pub mod waves;
}

/// Resolve the workspace `data/` directory from the crate manifest dir.
pub(crate) fn data_root() -> std::path::PathBuf {
    let here = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let ws = here.join("../../data");
    if ws.is_dir() { ws } else { here.join("data") }
}
