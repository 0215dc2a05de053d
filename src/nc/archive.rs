//! Precinct results archives: pick the results member out of the ZIP and read
//! it as a delimited text table of strings.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;
use zip::ZipArchive;

use crate::error::ScrapeError;

static MEMBER_RULES: LazyLock<Vec<(Regex, i32)>> = LazyLock::new(|| {
    [
        (r"(?i)results[_-]?pct", 200),
        (r"(?i)\bresults\b", 40),
        (r"(?i)\bpct\b", 20),
        (r"(?i)layout", -500),
        (r"(?i)readme|info|note", -500),
    ]
    .into_iter()
    .map(|(p, w)| (Regex::new(p).expect("member rule pattern"), w))
    .collect()
});

const DATA_EXTENSIONS: &[&str] = &[".txt", ".csv", ".tsv"];
const NOT_DATA: &[&str] = &["readme", "layout", "info", "note"];
/// Scores below this fall back to the largest data-looking member.
const CONFIDENT_SCORE: i32 = 50;

/// Cells as read, before any layout repair. `header` is `None` for files read
/// without a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn width(&self) -> usize {
        self.header.as_ref().map(Vec::len).into_iter().chain(self.rows.iter().map(Vec::len)).max().unwrap_or(0)
    }
}

fn has_data_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    DATA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn score_member(name: &str) -> i32 {
    let rules: i32 = MEMBER_RULES.iter().filter(|(rx, _)| rx.is_match(name)).map(|(_, w)| w).sum();
    rules + if has_data_extension(name) { 20 } else { 0 }
}

/// Choose the results file among `(name, uncompressed size)` members.
/// Directory entries are ignored.
pub fn select_member(members: &[(String, u64)]) -> Result<String, ScrapeError> {
    let files: Vec<&(String, u64)> = members.iter().filter(|(n, _)| !n.ends_with('/')).collect();
    // first of the top scorers, in archive order
    let best = files.iter().map(|(n, _)| (n, score_member(n))).fold(None, |acc: Option<(&String, i32)>, (n, s)| match acc {
        Some((_, bs)) if bs >= s => acc,
        _ => Some((n, s)),
    });
    let Some((best, best_score)) = best else {
        return Err(ScrapeError::ParseShape("archive has no members".into()));
    };
    if best_score >= CONFIDENT_SCORE {
        return Ok(best.clone());
    }

    files
        .iter()
        .copied()
        .filter(|(n, _)| has_data_extension(n))
        .filter(|(n, _)| {
            let lower = n.to_lowercase();
            !NOT_DATA.iter().any(|w| lower.contains(w))
        })
        .fold(None, |acc: Option<&(String, u64)>, m| match acc {
            Some(a) if a.1 >= m.1 => acc,
            _ => Some(m),
        })
        .map(|(n, _)| n.clone())
        .ok_or_else(|| ScrapeError::ParseShape(format!("could not identify results file; top candidate {best} (score {best_score})")))
}

/// Read `data` as a delimited table with a header row. NUL padding is
/// stripped first. `.csv` members are comma separated; anything else is tab
/// separated unless that yields a single column.
pub fn read_delimited(data: &[u8], member: &str) -> Result<RawTable, ScrapeError> {
    let clean: Vec<u8> = data.iter().copied().filter(|b| *b != 0).collect();
    if member.to_lowercase().ends_with(".csv") {
        return read_with(&clean, b',');
    }
    let tabbed = read_with(&clean, b'\t')?;
    if tabbed.header.as_ref().is_some_and(|h| h.len() > 1) {
        return Ok(tabbed);
    }
    read_with(&clean, b',')
}

fn read_with(data: &[u8], delimiter: u8) -> Result<RawTable, ScrapeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(data);
    let mut records = Vec::new();
    for rec in rdr.byte_records() {
        let rec = rec?;
        records.push(rec.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect::<Vec<String>>());
    }
    let mut it = records.into_iter();
    let Some(header) = it.next() else {
        return Err(ScrapeError::ParseShape("results file is empty".into()));
    };
    Ok(RawTable { header: Some(header), rows: it.collect() })
}

/// Select and read the results member of a ZIP archive.
pub fn read_results(zip_bytes: &[u8]) -> Result<(String, RawTable), ScrapeError> {
    let mut zip = ZipArchive::new(Cursor::new(zip_bytes))?;
    let mut members = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let f = zip.by_index(i)?;
        members.push((f.name().to_string(), f.size()));
    }
    let member = select_member(&members)?;
    let mut data = Vec::new();
    zip.by_name(&member)?.read_to_end(&mut data)?;
    let table = read_delimited(&data, &member)?;
    Ok((member, table))
}

#[cfg(test)]
pub(crate) fn zip_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in files {
        w.start_file(*name, SimpleFileOptions::default()).unwrap();
        w.write_all(body).unwrap();
    }
    w.finish().unwrap().into_inner()
}
