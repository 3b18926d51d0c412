//! Output artifacts

pub mod writers;

pub use writers::{
    joined_to_string, scored_header, scored_to_string, write_feature_table,
    write_feature_table_file, write_joined, write_joined_file, write_report_file, write_scored,
    write_scored_file, OutputError,
};
