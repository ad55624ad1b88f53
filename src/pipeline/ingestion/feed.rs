use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::error::{BookError, Result};
use crate::types::RawItem;

/// Reads raw items from a JSON-lines export, one object per line.
///
/// A malformed line is yielded as an error for that line only; reading
/// continues with the next one.
pub struct FeedReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> FeedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for FeedReader<R> {
    type Item = Result<RawItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(BookError::Io(e))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|source| BookError::Feed {
                line: self.line_no,
                source,
            }));
        }
    }
}

/// Open a feed file for reading.
pub fn read_feed<P: AsRef<Path>>(path: P) -> Result<FeedReader<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!("Reading item feed from {}", path.display());
    Ok(FeedReader::new(BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_items_and_skips_blank_lines() {
        let feed = concat!(
            r#"{"title": " Olio ", "stars": "Four", "extra": "ignored"}"#,
            "\n\n",
            r#"{"title": "Mesaerion"}"#,
            "\n"
        );
        let items: Vec<_> = FeedReader::new(Cursor::new(feed)).collect();
        assert_eq!(items.len(), 2);

        let first = items[0].as_ref().unwrap();
        assert_eq!(first.title.as_deref(), Some(" Olio "));
        assert_eq!(first.stars.as_deref(), Some("Four"));
        assert_eq!(first.price, None);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let feed = "{\"title\": \"ok\"}\nnot json\n{\"title\": \"also ok\"}\n";
        let items: Vec<_> = FeedReader::new(Cursor::new(feed)).collect();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], Err(BookError::Feed { line: 2, .. })));
        assert!(items[2].is_ok());
    }
}
