use serde_json::Value;
use std::io::{self, Write};

/// Indented JSON on stdout, newline-terminated.
pub fn print_json(value: &Value) {
    if let Err(e) = write_json(&mut io::stdout().lock(), value) {
        eprintln!("could not write JSON output: {e}");
    }
}

fn write_json(out: &mut impl Write, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
