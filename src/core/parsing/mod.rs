//! The parse pipeline: tokenizer subprocess contract, per-file Line
//! Parser, Scanner, Pattern Aggregator, and Regex Expander
//! (`spec.md` §4.3-§4.6).

pub mod line_parser;
pub mod pattern_aggregator;
pub mod regex_expander;
pub mod scanner;
pub mod tokenizer;

pub use line_parser::parse_file_into_stats;
pub use pattern_aggregator::aggregate_scan_results;
pub use regex_expander::expand_requests;
pub use scanner::{scan_file, scan_files_parallel};
pub use tokenizer::{run_tokenizer, TokenRecord};
