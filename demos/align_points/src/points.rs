use std::io::BufRead;
use std::path::Path;

use glam::DVec3;

/// Error while reading a point file.
#[derive(Debug, thiserror::Error)]
pub enum PointFileError {
    /// The file could not be read.
    #[error("failed to read point file: {0}")]
    Io(#[from] std::io::Error),

    /// A row has fewer than three numeric columns.
    #[error("line {line}: expected at least 3 numbers, got {content:?}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },
}

/// Read whitespace-separated rows; the first three columns are x, y, z.
///
/// Blank lines and lines starting with `#` are skipped. Extra columns are ignored.
pub fn read_points(path: impl AsRef<Path>) -> Result<Vec<DVec3>, PointFileError> {
    let file = std::fs::File::open(path)?;
    let mut points = Vec::new();

    for (i, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let xyz: Vec<f64> = trimmed
            .split_whitespace()
            .take(3)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| PointFileError::Parse {
                line: i + 1,
                content: line.clone(),
            })?;
        if xyz.len() < 3 {
            return Err(PointFileError::Parse {
                line: i + 1,
                content: line,
            });
        }
        points.push(DVec3::new(xyz[0], xyz[1], xyz[2]));
    }

    log::debug!("read {} points", points.len());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_points_skips_comments_and_extra_columns() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "# x y z zone hemisphere err")?;
        writeln!(file, "1.0 2.0 3.0 17 1 0.25")?;
        writeln!(file)?;
        writeln!(file, "  -4 5.5 6e1")?;
        file.flush()?;

        let points = read_points(file.path())?;
        assert_eq!(
            points,
            vec![DVec3::new(1.0, 2.0, 3.0), DVec3::new(-4.0, 5.5, 60.0)]
        );
        Ok(())
    }

    #[test]
    fn test_read_points_rejects_short_rows() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "1.0 2.0 3.0")?;
        writeln!(file, "1.0 2.0")?;
        file.flush()?;

        let err = read_points(file.path()).unwrap_err();
        assert!(matches!(err, PointFileError::Parse { line: 2, .. }));
        assert_eq!(
            err.to_string(),
            "line 2: expected at least 3 numbers, got \"1.0 2.0\""
        );
        Ok(())
    }

    #[test]
    fn test_read_points_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_points(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, PointFileError::Io(_)));
        assert!(err.to_string().starts_with("failed to read point file: "));
    }
}
