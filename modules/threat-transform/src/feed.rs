use crate::TransformError;

/// Lines of metadata the URLhaus export puts above its header row.
pub const DEFAULT_SKIP_LINES: usize = 8;

/// The feed as read from CSV, before any cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeed {
    /// Column names exactly as the header row states them (e.g. `# id`).
    pub headers: Vec<String>,
    /// One entry per data row. Rows shorter than the header are padded with empty fields.
    pub rows: Vec<Vec<String>>,
}

impl RawFeed {
    /// Position of the first header matching any of `names`.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        self.headers.iter().position(|h| names.iter().any(|n| h == n))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse raw feed text into a [`RawFeed`], dropping the first `skip_lines` lines.
///
/// Rows whose first field starts with `#` are comments or footers and are skipped.
pub fn parse_feed(text: &str, skip_lines: usize) -> Result<RawFeed, TransformError> {
    let body = skip_preamble(text, skip_lines);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(TransformError::EmptyFeed { skipped: skip_lines });
    }

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.get(0).map(|f| f.trim_start().starts_with('#')).unwrap_or(false) {
            continue;
        }
        let mut row: Vec<String> = rec.iter().map(|f| f.to_string()).collect();
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }
    Ok(RawFeed { headers, rows })
}

fn skip_preamble(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}
