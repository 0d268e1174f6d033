//! JSON report: the full page model, pretty-printed

use crate::report::Page;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, page: &Page) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, page)?;
    writeln!(writer)
}
