pub mod database;
pub mod fragment;
pub mod similarity;
pub mod linker;
pub mod attributes;
pub mod analyzer;

pub use database::*;
pub use fragment::*;
pub use similarity::*;
pub use linker::*;
pub use attributes::*;
pub use analyzer::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkingError {
    #[error("Cannot read drug database {path}: {source}")]
    DatabaseRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Drug database {path} is not a valid record list: {source}")]
    DatabaseParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
