#![cfg_attr(coverage, feature(coverage_attribute))]
use anyhow::Error;

pub mod distances;
pub mod io;
mod macros;
pub mod sequences;
pub mod tree;

type Result<T> = std::result::Result<T, Error>;
