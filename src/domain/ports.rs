use crate::domain::model::EdgePolicy;
use std::io::{self, BufRead, Write};

/// Where input is read from and per-interval output is written to.
///
/// Callers attach the file's role to any I/O error; implementations just
/// report what the filesystem said.
pub trait Storage {
    type Reader: BufRead;
    type Writer: Write;

    fn open_input(&self, path: &str) -> io::Result<Self::Reader>;
    /// `name` is a bare file name placed wherever this storage keeps output.
    fn create_output(&self, name: &str) -> io::Result<Self::Writer>;
}

pub trait ConfigProvider {
    fn data_file(&self) -> &str;
    fn intervals_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn debug_file(&self) -> &str;
    fn sample_lines(&self) -> usize;
    fn tolerance_ms(&self) -> u64;
    fn edge_policy(&self) -> EdgePolicy;
    fn verbose(&self) -> bool;
    fn test_mode(&self) -> bool;
}
