use std::path::Path;

use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use crate::core::errors::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    /// 1-based index of the first differing line, or the number of lines
    /// compared when both files are equal.
    pub line: usize,
    pub is_equal: bool,
}

/// Compares two files line by line, ignoring surrounding whitespace and
/// letter case. Stops reading at the first difference. Lines are raw bytes,
/// so output that is not valid UTF-8 still gets compared.
pub async fn compare_files(actual: &Path, expected: &Path) -> Result<Comparison, EngineError> {
    let mut actual_lines = ByteLines::open(actual).await?;
    let mut expected_lines = ByteLines::open(expected).await?;

    let mut matched = 0;
    loop {
        let left = actual_lines.next_line().await?;
        let right = expected_lines.next_line().await?;

        match (left, right) {
            (None, None) => {
                return Ok(Comparison {
                    line: matched,
                    is_equal: true,
                });
            }
            (Some(left), Some(right)) if lines_match(&left, &right) => matched += 1,
            _ => {
                tracing::debug!("Output differs at line {}", matched + 1);
                return Ok(Comparison {
                    line: matched + 1,
                    is_equal: false,
                });
            }
        }
    }
}

fn lines_match(left: &[u8], right: &[u8]) -> bool {
    let left = String::from_utf8_lossy(left);
    let right = String::from_utf8_lossy(right);
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

struct ByteLines<'a> {
    reader: BufReader<File>,
    path: &'a Path,
}

impl<'a> ByteLines<'a> {
    async fn open(path: &'a Path) -> Result<Self, EngineError> {
        let file = File::open(path).await.map_err(EngineError::io(path))?;
        Ok(ByteLines {
            reader: BufReader::new(file),
            path,
        })
    }

    /// Next line without its `\n`, or `None` at end of file.
    async fn next_line(&mut self) -> Result<Option<Vec<u8>>, EngineError> {
        let mut line = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(EngineError::io(self.path))?;
        if read == 0 {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        Ok(Some(line))
    }
}
