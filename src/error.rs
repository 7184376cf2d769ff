use crate::gpu::device::DeviceError;
use crate::physics::{BodyHandle, PhysicsError};
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by drawables at construction or draw time.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0} drawn before a shader program was set")]
    ProgramNotSet(&'static str),
    #[error("rigid body {0:?} is unknown to the transform source")]
    UnknownBody(BodyHandle),
    #[error("graphics device is already borrowed")]
    DeviceBusy,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Loading configuration, fonts and textures from disk.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load font {path}: {message}")]
    Font { path: PathBuf, message: String },
    #[error("invalid font data: {0}")]
    FontData(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Errors of the game layer.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}
