//! Append-only results tables.
//!
//! A comma-separated file with a header and one row per analyzed (or generated)
//! formula. The first column is the file name, quoted when it contains a comma
//! or a double quote. The remaining columns depend on the [`Record`] kind:
//!
//! | record          | header                          | undefined |
//! |-----------------|---------------------------------|-----------|
//! | [`Row`]         | `file,sparseness,const_factor`  | `*`       |
//! | [`ClauseCount`] | `file,clauses`                  | `-1`      |
//!
//! Each row is formatted first and then written with a single `write_all`
//! followed by a flush. A run that stops abruptly leaves at most one torn final
//! line, which [`Table::open`] drops, so the run can be resumed.

use std::borrow::Cow;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::analyzer::{format_value, Measurement};
use crate::error::{Error, Result};

/// One line of a results table.
pub trait Record: Sized {
    /// Header line, without the terminating newline.
    const HEADER: &'static str;

    fn file(&self) -> &str;

    /// Columns after the file name.
    fn values(&self) -> Vec<String>;

    /// Rebuilds a record from its file name and the columns after it.
    fn parse(file: String, values: &[&str]) -> Option<Self>;
}

/// Sparseness and constant factor of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub file: String,
    pub measurement: Measurement,
}

impl Row {
    pub fn new(file: impl Into<String>, measurement: Measurement) -> Self {
        Self {
            file: file.into(),
            measurement,
        }
    }
}

fn parse_value(field: &str) -> Option<Option<f64>> {
    match field {
        "*" => Some(None),
        _ => field.parse().ok().map(Some),
    }
}

impl Record for Row {
    const HEADER: &'static str = "file,sparseness,const_factor";

    fn file(&self) -> &str {
        &self.file
    }

    fn values(&self) -> Vec<String> {
        vec![
            format_value(self.measurement.sparseness),
            format_value(self.measurement.const_factor),
        ]
    }

    fn parse(file: String, values: &[&str]) -> Option<Self> {
        match *values {
            [sparseness, const_factor] => Some(Row::new(
                file,
                Measurement {
                    sparseness: parse_value(sparseness)?,
                    const_factor: parse_value(const_factor)?,
                },
            )),
            _ => None,
        }
    }
}

/// Number of normalized clauses of one file. `None` when there is not exactly
/// one goal or the file was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseCount {
    pub file: String,
    pub clauses: Option<usize>,
}

impl ClauseCount {
    pub fn new(file: impl Into<String>, clauses: Option<usize>) -> Self {
        Self {
            file: file.into(),
            clauses,
        }
    }
}

impl Record for ClauseCount {
    const HEADER: &'static str = "file,clauses";

    fn file(&self) -> &str {
        &self.file
    }

    fn values(&self) -> Vec<String> {
        vec![self.clauses.map_or_else(|| "-1".to_string(), |n| n.to_string())]
    }

    fn parse(file: String, values: &[&str]) -> Option<Self> {
        match *values {
            ["-1"] => Some(ClauseCount::new(file, None)),
            [count] => Some(ClauseCount::new(file, Some(count.parse().ok()?))),
            _ => None,
        }
    }
}

/// A results table on disk holding records of kind `R`.
pub struct Table<R> {
    path: PathBuf,
    record: PhantomData<fn() -> R>,
}

pub type ResultsTable = Table<Row>;
pub type ClauseTable = Table<ClauseCount>;

impl<R> fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("path", &self.path).finish()
    }
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            record: PhantomData,
        }
    }
}

impl<R: Record> Table<R> {
    fn at(path: PathBuf) -> Self {
        Self {
            path,
            record: PhantomData,
        }
    }

    /// Opens the table at `path` for resuming.
    ///
    /// A missing or empty file gets a header. An existing file must start with
    /// the header; an unterminated final line that does not parse is dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
            file.write_all(format!("{}\n", R::HEADER).as_bytes())?;
            file.flush()?;
            debug!("created results table {}", path.display());
            return Ok(Self::at(path));
        }

        let text = fs::read_to_string(&path)?;
        if text.is_empty() {
            fs::write(&path, format!("{}\n", R::HEADER))?;
            debug!("wrote header into empty results table {}", path.display());
            return Ok(Self::at(path));
        }
        let header = text.lines().next().unwrap_or_default();
        if header != R::HEADER {
            return Err(Error::Table(format!(
                "{}: unexpected header '{}'",
                path.display(),
                header
            )));
        }
        if !text.ends_with('\n') {
            // The final line is either the header or a possibly torn row.
            let last_start = text.rfind('\n').map_or(0, |i| i + 1);
            let last = &text[last_start..];
            if last_start > 0 && parse_line::<R>(last).is_none() {
                warn!("{}: dropping unterminated row '{}'", path.display(), last);
                let file = OpenOptions::new().write(true).open(&path)?;
                file.set_len(last_start as u64)?;
            } else {
                OpenOptions::new().append(true).open(&path)?.write_all(b"\n")?;
            }
        }
        Ok(Self::at(path))
    }

    /// Creates the table at `path`, discarding any previous content.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::write(&path, format!("{}\n", R::HEADER))?;
        debug!("created results table {}", path.display());
        Ok(Self::at(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row.
    pub fn append(&self, record: &R) -> Result<()> {
        let name = record.file();
        if name.contains(['\n', '\r']) {
            return Err(Error::InvalidArgument(format!(
                "file name '{}' cannot be stored in the table",
                name.escape_debug()
            )));
        }
        let mut line = String::new();
        line.push_str(&quote_file(name));
        for value in record.values() {
            line.push(',');
            line.push_str(&value);
        }
        line.push('\n');

        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        if file.metadata()?.len() > 0 {
            let mut last = [0u8];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                line.insert(0, '\n');
            }
        }
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Reads all rows back. An unterminated final line that does not parse is
    /// ignored; any other malformed line is an error.
    pub fn rows(&self) -> Result<Vec<R>> {
        let text = fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = text.lines().collect();
        let mut rows = Vec::new();
        for (i, line) in lines.iter().enumerate().skip(1) {
            if line.is_empty() {
                continue;
            }
            match parse_line::<R>(line) {
                Some(row) => rows.push(row),
                None if i + 1 == lines.len() && !text.ends_with('\n') => {
                    warn!("{}:{}: ignoring unterminated row '{}'", self.path.display(), i + 1, line);
                }
                None => {
                    return Err(Error::Table(format!(
                        "{}:{}: malformed row '{}'",
                        self.path.display(),
                        i + 1,
                        line
                    )))
                }
            }
        }
        Ok(rows)
    }

    /// Whether a row for `file` is already present.
    pub fn contains(&self, file: &str) -> Result<bool> {
        Ok(self.rows()?.iter().any(|row| row.file() == file))
    }
}

fn quote_file(file: &str) -> Cow<'_, str> {
    if file.contains([',', '"']) {
        Cow::Owned(format!("\"{}\"", file.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(file)
    }
}

/// Splits the file name off a line, undoing [`quote_file`].
fn split_file(line: &str) -> Option<(String, &str)> {
    let quoted = match line.strip_prefix('"') {
        Some(quoted) => quoted,
        None => return line.split_once(',').map(|(file, rest)| (file.to_string(), rest)),
    };
    let mut file = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '"' {
            file.push(c);
        } else if quoted[i + 1..].starts_with('"') {
            file.push('"');
            chars.next();
        } else {
            return quoted[i + 1..].strip_prefix(',').map(|rest| (file, rest));
        }
    }
    None
}

fn parse_line<R: Record>(line: &str) -> Option<R> {
    let (file, rest) = split_file(line)?;
    let values: Vec<&str> = rest.split(',').collect();
    R::parse(file, &values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(s: f64, f: f64) -> Measurement {
        Measurement {
            sparseness: Some(s),
            const_factor: Some(f),
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let table = ResultsTable::open(dir.path().join("results.csv")).unwrap();
        table.append(&Row::new("a.smt2", measurement(0.5, 0.25))).unwrap();
        table.append(&Row::new("b.smt2", Measurement::undefined())).unwrap();

        let text = fs::read_to_string(table.path()).unwrap();
        assert_eq!(text, "file,sparseness,const_factor\na.smt2,0.5,0.25\nb.smt2,*,*\n");

        let rows = table.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Row::new("a.smt2", measurement(0.5, 0.25)));
        assert_eq!(rows[1].measurement, Measurement::undefined());
        assert!(table.contains("b.smt2").unwrap());
        assert!(!table.contains("c.smt2").unwrap());
    }

    #[test]
    fn test_reopen_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        ResultsTable::open(&path)
            .unwrap()
            .append(&Row::new("a.smt2", measurement(1.0, 0.0)))
            .unwrap();
        let table = ResultsTable::open(&path).unwrap();
        table.append(&Row::new("b.smt2", measurement(0.0, 1.0))).unwrap();
        let files: Vec<String> = table.rows().unwrap().into_iter().map(|r| r.file).collect();
        assert_eq!(files, vec!["a.smt2", "b.smt2"]);
    }

    #[test]
    fn test_rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "name,value\n").unwrap();
        assert!(matches!(ResultsTable::open(&path), Err(Error::Table(_))));
        assert!(matches!(ClauseTable::open(dir.path().join("other.csv")), Err(Error::Table(_))));

        let path = dir.path().join("broken.csv");
        fs::write(&path, "file,sparseness,const_factor\nx.smt2,abc,0\n").unwrap();
        let table = ResultsTable::open(&path).unwrap();
        assert!(matches!(table.rows(), Err(Error::Table(_))));
        assert!(matches!(
            table.append(&Row::new("a\nb", Measurement::undefined())),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_names_with_commas_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let table = ResultsTable::open(dir.path().join("results.csv")).unwrap();
        table.append(&Row::new("/x/a,b.smt2", measurement(0.5, 0.25))).unwrap();
        table.append(&Row::new("/x/say \"hi\".smt2", Measurement::undefined())).unwrap();

        let text = fs::read_to_string(table.path()).unwrap();
        assert_eq!(
            text,
            "file,sparseness,const_factor\n\"/x/a,b.smt2\",0.5,0.25\n\"/x/say \"\"hi\"\".smt2\",*,*\n"
        );
        let rows = table.rows().unwrap();
        assert_eq!(rows[0], Row::new("/x/a,b.smt2", measurement(0.5, 0.25)));
        assert_eq!(rows[1].file, "/x/say \"hi\".smt2");
        assert!(table.contains("/x/a,b.smt2").unwrap());
    }

    #[test]
    fn test_empty_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "").unwrap();
        let table = ResultsTable::open(&path).unwrap();
        table.append(&Row::new("a.smt2", Measurement::undefined())).unwrap();
        assert_eq!(table.rows().unwrap().len(), 1);

        let table = ResultsTable::open(&path).unwrap();
        assert_eq!(table.rows().unwrap(), vec![Row::new("a.smt2", Measurement::undefined())]);
    }

    #[test]
    fn test_torn_final_row_is_dropped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "file,sparseness,const_factor\n/x/a.smt2,0.5").unwrap();

        let table = ResultsTable::open(&path).unwrap();
        assert!(table.rows().unwrap().is_empty());
        table.append(&Row::new("/x/a.smt2", measurement(0.5, 0.25))).unwrap();
        table.append(&Row::new("/x/b.smt2", measurement(1.0, 0.0))).unwrap();

        let table = ResultsTable::open(&path).unwrap();
        let files: Vec<String> = table.rows().unwrap().into_iter().map(|r| r.file).collect();
        assert_eq!(files, vec!["/x/a.smt2", "/x/b.smt2"]);
    }

    #[test]
    fn test_unterminated_rows_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        // A complete row missing its newline is kept and the next row starts on a fresh line.
        fs::write(&path, "file,sparseness,const_factor\n/x/a.smt2,0.5,0").unwrap();
        let table = ResultsTable::open(&path).unwrap();
        table.append(&Row::new("/x/b.smt2", Measurement::undefined())).unwrap();
        assert_eq!(table.rows().unwrap().len(), 2);

        // A torn row written after opening is ignored when reading.
        OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"/x/c.smt2,0.")
            .unwrap();
        assert_eq!(table.rows().unwrap().len(), 2);
        table.append(&Row::new("/x/d.smt2", Measurement::undefined())).unwrap();
        assert!(matches!(table.rows(), Err(Error::Table(_))));

        // A header without its newline is completed.
        let path = dir.path().join("header.csv");
        fs::write(&path, "file,sparseness,const_factor").unwrap();
        let table = ResultsTable::open(&path).unwrap();
        table.append(&Row::new("a.smt2", Measurement::undefined())).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "file,sparseness,const_factor\na.smt2,*,*\n"
        );
    }

    #[test]
    fn test_create_discards_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.csv");
        let table = ResultsTable::open(&path).unwrap();
        table.append(&Row::new("problem_0.smt2", measurement(0.5, 0.5))).unwrap();

        let table = ResultsTable::create(&path).unwrap();
        assert!(table.rows().unwrap().is_empty());
        table.append(&Row::new("problem_0.smt2", measurement(0.25, 0.0))).unwrap();
        assert_eq!(table.rows().unwrap(), vec![Row::new("problem_0.smt2", measurement(0.25, 0.0))]);
    }

    #[test]
    fn test_clause_counts() {
        let dir = tempfile::tempdir().unwrap();
        let table = ClauseTable::open(dir.path().join("clauses.csv")).unwrap();
        table.append(&ClauseCount::new("a.smt2", Some(3))).unwrap();
        table.append(&ClauseCount::new("b.smt2", None)).unwrap();

        let text = fs::read_to_string(table.path()).unwrap();
        assert_eq!(text, "file,clauses\na.smt2,3\nb.smt2,-1\n");
        assert_eq!(
            table.rows().unwrap(),
            vec![ClauseCount::new("a.smt2", Some(3)), ClauseCount::new("b.smt2", None)]
        );
        assert!(matches!(ResultsTable::open(table.path()), Err(Error::Table(_))));
    }
}
