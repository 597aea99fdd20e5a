//! Auxiliary data input

pub mod auxdata;

pub use auxdata::{k_distribution_file, AuxDataReader};
