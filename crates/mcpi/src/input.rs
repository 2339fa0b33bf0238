use crate::{Error, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Reads the total iteration count from the first line of `path`.
///
/// Surrounding whitespace is ignored. Only the first line is read, so the rest
/// of the file may hold anything, including bytes that are not UTF-8.
///
/// # Errors
///
/// Returns [`Error::Input`] if the file cannot be read, is empty, or its first
/// line is not a non-negative integer that fits in a `u64`.
pub fn read_iterations(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let cannot_read = |e: std::io::Error| Error::Input {
        reason: format!("cannot read {}: {e}", path.display()),
    };

    let mut first = String::new();
    BufReader::new(File::open(path).map_err(cannot_read)?)
        .read_line(&mut first)
        .map_err(cannot_read)?;
    parse_iterations(&first)
}

/// Parses an iteration count from the first line of `contents`.
///
/// # Errors
///
/// See [`read_iterations`].
pub fn parse_iterations(contents: &str) -> Result<u64> {
    let first = contents.lines().next().map(str::trim).unwrap_or_default();
    if first.is_empty() {
        return Err(Error::Input {
            reason: "first line is empty; expected the total number of iterations".to_string(),
        });
    }

    first.parse::<u64>().map_err(|e| Error::Input {
        reason: format!("{first:?} is not a non-negative integer: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_first_line() {
        assert_eq!(parse_iterations("12\n"), Ok(12));
        assert_eq!(parse_iterations("  100000000  \nignored\n"), Ok(100_000_000));
        assert_eq!(parse_iterations("0"), Ok(0));
    }

    #[test]
    fn rejects_malformed_content() {
        for bad in ["", "\n12", "twelve", "-5", "1.5", "12 13", "99999999999999999999999"] {
            assert!(
                matches!(parse_iterations(bad), Err(Error::Input { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "42").unwrap();
        assert_eq!(read_iterations(file.path()), Ok(42));
    }

    #[test]
    fn only_the_first_line_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"1000\n").unwrap();
        file.write_all(&[0xFF, 0xFE, 0x00, 0x80]).unwrap();
        file.write_all(&vec![b'x'; 1 << 20]).unwrap();
        assert_eq!(read_iterations(file.path()), Ok(1000));
    }

    #[test]
    fn invalid_utf8_first_line_is_an_input_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x31, 0xFF, b'\n']).unwrap();
        assert!(matches!(
            read_iterations(file.path()),
            Err(Error::Input { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_iterations(dir.path().join("nope.txt")),
            Err(Error::Input { .. })
        ));
    }
}
