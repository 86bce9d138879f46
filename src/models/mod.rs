pub mod drug;

pub use drug::*;
