//! Output writing: the CSV Finalizer (`spec.md` §4.9).

pub mod csv_finalizer;

pub use csv_finalizer::finalize_parsing;
