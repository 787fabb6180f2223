pub mod error {
    use std::io;
    use std::path::PathBuf;
    use thiserror::Error;

    /// Errors raised while reading and parsing a table.
    #[derive(Error, Debug)]
    pub enum CsvError {
        #[error("Unable to open {}", .path.display())]
        Open {
            path: PathBuf,
            #[source]
            source: io::Error,
        },

        #[error("Unable to read input: {0}")]
        Read(#[from] io::Error),

        /// The header line produced no columns.
        #[error("invalid column names")]
        Structure,

        /// `column` is 1-based within its own line.
        #[error("invalid value \"{token}\" in column {column}")]
        Value { token: String, column: usize },

        #[error("invalid number of columns (expected {expected}, got {actual})")]
        Shape { expected: usize, actual: usize },

        #[error("Line {line}: {source}")]
        Line {
            line: usize,
            #[source]
            source: Box<CsvError>,
        },
    }

    impl CsvError {
        /// Tag an error with the 1-based line it occurred on.
        pub fn at_line(self, line: usize) -> Self {
            CsvError::Line {
                line,
                source: Box::new(self),
            }
        }
    }

    pub type CsvResult<T> = Result<T, CsvError>;
}

pub mod csv_reader {
    use crate::error::{CsvError, CsvResult};
    use serde::Serialize;
    use std::fs::File;
    use std::io::{BufRead, BufReader};
    use std::path::Path;
    use tracing::{debug, trace};

    pub const DELIMITER: char = ',';

    pub type Header = Vec<String>;
    pub type Row = Vec<f64>;
    pub type Table = Vec<Row>;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct CsvTable {
        pub header: Header,
        pub rows: Table,
    }

    /// Split `line` at every occurrence of `delimiter`.
    ///
    /// An empty line gives one empty token and a trailing delimiter gives a
    /// trailing empty token.
    pub fn split_line(line: &str, delimiter: char) -> Vec<&str> {
        line.split(delimiter).collect()
    }

    // Reads one line without its `\n` / `\r\n` ending. `None` at end of input.
    fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> CsvResult<Option<String>> {
        buf.clear();
        if reader.read_until(b'\n', buf)? == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(buf).into_owned()))
    }

    /// Consume the first line of `reader` and split it into column names.
    ///
    /// An empty first line, or no line at all, has zero columns.
    pub fn parse_header<R: BufRead>(reader: &mut R) -> CsvResult<Header> {
        let mut buf = Vec::new();
        let line = next_line(reader, &mut buf)?.unwrap_or_default();
        if line.is_empty() {
            return Err(CsvError::Structure);
        }

        Ok(split_line(&line, DELIMITER)
            .into_iter()
            .map(str::to_owned)
            .collect())
    }

    /// Convert every token of `line` to `f64`, failing on the first bad one.
    pub fn parse_row(line: &str) -> CsvResult<Row> {
        split_line(line, DELIMITER)
            .into_iter()
            .enumerate()
            .map(|(i, token)| {
                token.parse::<f64>().map_err(|_| CsvError::Value {
                    token: token.to_owned(),
                    column: i + 1,
                })
            })
            .collect()
    }

    fn parse_checked_row(line: &str, ncol: usize) -> CsvResult<Row> {
        let row = parse_row(line)?;
        if row.len() != ncol {
            return Err(CsvError::Shape {
                expected: ncol,
                actual: row.len(),
            });
        }
        Ok(row)
    }

    /// Parse a header line followed by numeric rows.
    ///
    /// Line numbers in errors count the header as line 1.
    pub fn parse_table<R: BufRead>(mut reader: R) -> CsvResult<CsvTable> {
        let header = parse_header(&mut reader)?;
        let ncol = header.len();
        debug!(columns = ncol, "parsed header");

        let mut rows = Table::new();
        let mut i_line = 1;
        let mut buf = Vec::new();

        while let Some(line) = next_line(&mut reader, &mut buf)? {
            i_line += 1;

            let row = parse_checked_row(&line, ncol).map_err(|e| e.at_line(i_line))?;
            trace!(line = i_line, "parsed row");
            rows.push(row);
        }

        debug!(rows = rows.len(), "parsed table");
        Ok(CsvTable { header, rows })
    }

    pub fn read_table(filepath: impl AsRef<Path>) -> CsvResult<CsvTable> {
        let path = filepath.as_ref();
        let file = File::open(path).map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "reading table");

        parse_table(BufReader::new(file))
    }

}

pub mod table_printer {
    use crate::csv_reader::CsvTable;
    use csv::{QuoteStyle, Terminator, WriterBuilder};
    use std::io::Write;

    /// Width of the `=` rule under the header: every name plus one space between names.
    pub fn separator_width(header: &[String]) -> usize {
        header
            .iter()
            .map(|name| name.chars().count() + 1)
            .sum::<usize>()
            .saturating_sub(1)
    }

    /// Print the header, an `=` rule, then one space-separated line per row.
    pub fn write_table<W: Write>(out: W, table: &CsvTable) -> csv::Result<()> {
        let mut wtr = WriterBuilder::new()
            .delimiter(b' ')
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(out);

        wtr.write_record(&table.header)?;
        wtr.write_record([&"=".repeat(separator_width(&table.header))])?;

        for row in &table.rows {
            wtr.write_record(row.iter().map(f64::to_string))?;
        }
        wtr.flush()?;

        Ok(())
    }

}
