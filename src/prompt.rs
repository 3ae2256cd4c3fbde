use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::error::{EvalError, Result};

/// Ask for a transcript name inside the results directory until one exists.
///
/// Prompts and "not found" notices go to `out`, so they land in the run log
/// when `out` is a tee. Running out of input is an error.
pub fn prompt_for_transcript<R, W>(config: &Config, input: &mut R, out: &mut W) -> Result<PathBuf>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut line = String::new();
    loop {
        write!(
            out,
            "Enter the filename inside '{}/' (e.g., zeroshot/output001.txt): ",
            config.results_dir.display()
        )?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Err(EvalError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no transcript given",
            )));
        }

        let path = config.resolve_result_path(line.trim());
        if path.is_file() {
            debug!("Transcript chosen at prompt: {}", path.display());
            return Ok(path);
        }
        writeln!(out, "ERROR: File not found: {}\nPlease try again.\n", path.display())?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            results_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_prompts_again_until_file_exists() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("zeroshot")).unwrap();
        fs::write(dir.path().join("zeroshot/output001.txt"), "log").unwrap();
        let config = config_in(dir.path());

        let mut input = Cursor::new("missing.txt\n  zeroshot/output001.txt  \n");
        let mut out = Vec::new();
        let path = prompt_for_transcript(&config, &mut input, &mut out).unwrap();

        assert_eq!(path, dir.path().join("zeroshot/output001.txt"));
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("Enter the filename").count(), 2);
        assert!(shown.contains("ERROR: File not found:"));
        assert!(shown.contains("missing.txt"));
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let mut input = Cursor::new("nope.txt\n");
        let mut out = Vec::new();
        match prompt_for_transcript(&config, &mut input, &mut out) {
            Err(EvalError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected end of input, got {:?}", other),
        }
    }
}
