use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ScrapeError;

/// Rows copied into the `_sample.csv` companion of every table.
pub const SAMPLE_ROWS: usize = 5000;

#[derive(Debug, Clone, Serialize)]
pub struct TableWritten {
    pub path: PathBuf,
    pub sample_path: PathBuf,
    pub rows: usize,
}

/// `--out-dir`, else `BALLOT_OUT_DIR`, else `./output`.
pub fn out_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("BALLOT_OUT_DIR").ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("output"))
}

/// Write `{dir}/{stem}.csv` and `{dir}/{stem}_sample.csv`. Rows must be flat
/// structs; an empty table yields empty files.
pub fn write_table<T: Serialize>(dir: &Path, stem: &str, rows: &[T]) -> Result<TableWritten, ScrapeError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{stem}.csv"));
    let sample_path = dir.join(format!("{stem}_sample.csv"));
    write_csv(&path, rows)?;
    write_csv(&sample_path, &rows[..rows.len().min(SAMPLE_ROWS)])?;
    Ok(TableWritten { path, sample_path, rows: rows.len() })
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ScrapeError> {
    let mut w = csv::Writer::from_path(path)?;
    for r in rows {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        votes: Option<u64>,
        winner: bool,
    }

    #[test]
    fn writes_full_and_sample() {
        let dir = std::env::temp_dir().join(format!("ballot-table-{}", std::process::id()));
        let rows: Vec<Row> = (0..SAMPLE_ROWS + 3)
            .map(|i| Row { name: "x", votes: if i == 0 { None } else { Some(i as u64) }, winner: i == 1 })
            .collect();
        let out = write_table(&dir, "t", &rows).unwrap();
        assert_eq!(out.rows, SAMPLE_ROWS + 3);

        let full = std::fs::read_to_string(&out.path).unwrap();
        let mut lines = full.lines();
        assert_eq!(lines.next(), Some("name,votes,winner"));
        assert_eq!(lines.next(), Some("x,,false"));
        assert_eq!(lines.next(), Some("x,1,true"));
        assert_eq!(full.lines().count(), SAMPLE_ROWS + 4);

        let sample = std::fs::read_to_string(&out.sample_path).unwrap();
        assert_eq!(sample.lines().count(), SAMPLE_ROWS + 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
