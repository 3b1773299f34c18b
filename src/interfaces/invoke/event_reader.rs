use crate::error::Result;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Reads an inbound event (or execution context) document as JSON.
pub struct EventReader<R: Read> {
    source: BufReader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            source: BufReader::new(source),
        }
    }

    /// Parses the whole source as a single JSON value.
    pub fn read(self) -> Result<Value> {
        Ok(serde_json::from_reader(self.source)?)
    }
}

impl EventReader<Box<dyn Read>> {
    /// Opens `path` for reading; `-` reads from standard input.
    pub fn open(path: &Path) -> Result<Self> {
        let source: Box<dyn Read> = if path == Path::new("-") {
            Box::new(io::stdin())
        } else {
            Box::new(File::open(path)?)
        };
        Ok(Self::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvokeError;

    #[test]
    fn test_reader_valid_event() {
        let data = r#"{"path": "/orders", "headers": {"authorization": "Bearer t"}}"#;
        let event = EventReader::new(data.as_bytes()).read().unwrap();

        assert_eq!(event["path"], "/orders");
        assert_eq!(event["headers"]["authorization"], "Bearer t");
    }

    #[test]
    fn test_reader_malformed_event() {
        let result = EventReader::new("{not json".as_bytes()).read();
        assert!(matches!(result, Err(InvokeError::JsonError(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let result = EventReader::open(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(InvokeError::IoError(_))));
    }
}
