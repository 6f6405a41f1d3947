use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::response::Response;

/// Peripheral, out-of-core collaborator (spec §1): renders a [`Response`]
/// as a fixed-width ASCII table. Not part of the engine kernel — the
/// façade only needs its contract, not its implementation, to satisfy
/// `print(outputKind, path)` (spec §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Console,
    File,
}

pub fn render(response: &Response) -> String {
    let headers: Vec<&String> = response.columns.keys().collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();

    let row_count = response.row_count();
    for (i, header) in headers.iter().enumerate() {
        let col = &response.columns[*header];
        let max_value_width = col.iter().map(|v| v.to_string().len()).max().unwrap_or(0);
        widths[i] = widths[i].max(max_value_width);
    }

    let mut out = String::new();
    write_row(&mut out, &headers.iter().map(|h| h.as_str()).collect::<Vec<_>>(), &widths);
    write_separator(&mut out, &widths);

    for i in 0..row_count {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| response.columns[*h][i].to_string())
            .collect();
        write_row(&mut out, &cells.iter().map(|c| c.as_str()).collect::<Vec<_>>(), &widths);
    }

    out
}

fn write_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    out.push_str("| ");
    for (cell, width) in cells.iter().zip(widths) {
        out.push_str(&format!("{:<width$} | ", cell, width = width));
    }
    out.push('\n');
}

fn write_separator(out: &mut String, widths: &[usize]) {
    out.push('+');
    for width in widths {
        out.push_str(&"-".repeat(width + 2));
        out.push('+');
    }
    out.push('\n');
}

pub fn print(response: &Response, kind: OutputKind, path: Option<&Path>) -> io::Result<()> {
    let rendered = render(response);
    match kind {
        OutputKind::Console => {
            print!("{}", rendered);
            io::stdout().flush()
        }
        OutputKind::File => {
            let path = path.ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "FILE output requires a path")
            })?;
            let mut file = File::create(path)?;
            file.write_all(rendered.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn renders_header_and_rows() {
        let mut response = Response::new(&["id".to_string(), "name".to_string()]);
        response.push_row(&[
            ("id".to_string(), Value::Integer(1)),
            ("name".to_string(), Value::String("Alice".to_string())),
        ]);
        let rendered = render(&response);
        assert!(rendered.contains("id"));
        assert!(rendered.contains("Alice"));
    }
}
