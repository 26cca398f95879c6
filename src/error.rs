use thiserror::Error;

use crate::landmark::AngleKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no front-facing capture supplied: retake with full body and at least a front-facing photo")]
    MissingRequiredAngle,

    #[error("more than one {0} capture supplied: a scan takes one photo per angle")]
    DuplicateAngle(AngleKind),

    #[error("ensemble averaging needs at least one measurement result")]
    EmptyInput,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
