//! File processing
//!
//! Reads a G-code file, runs the pipeline and writes the processed result.
//! Input lines are read as UTF-8 and trimmed. Without an explicit output
//! path the input file is replaced.

use std::fs;
use std::path::Path;

use splicekit_core::{Error, Result};

use crate::pipeline::{Pipeline, ProcessReport};

/// Read a G-code file into trimmed lines
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(content.lines().map(|line| line.trim().to_string()).collect())
}

/// Write lines to a file, one per line
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

/// Process `input`, writing to `output` or back to `input`
///
/// Nothing is written when reading fails or the pipeline aborts.
pub fn process_file(
    pipeline: Pipeline,
    input: &Path,
    output: Option<&Path>,
) -> Result<ProcessReport> {
    let lines = read_lines(input)?;
    tracing::info!("Reading file {} ({} lines)", input.display(), lines.len());

    let processed = pipeline.run(&lines)?;

    let target = output.unwrap_or(input);
    tracing::info!("Generating G-code file {}", target.display());
    write_lines(target, &processed.lines)?;

    Ok(processed.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use splicekit_settings::Settings;

    #[test]
    fn test_read_lines_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.gcode");
        fs::write(&path, "  G1 X1  \r\n;LAYER 0\n").unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines, vec!["G1 X1".to_string(), ";LAYER 0".to_string()]);
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.gcode");
        let output = dir.path().join("out.gcode");

        let err = process_file(Pipeline::new(Settings::new()), &input, Some(&output)).unwrap_err();
        assert!(err.is_io_error());
        assert!(!output.exists());
    }

    #[test]
    fn test_process_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.gcode");
        fs::write(&path, ";LAYER 0\nG1 X10 Y10 E5\nM220 S100\n").unwrap();

        let report = process_file(Pipeline::new(Settings::new()), &path, None).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            ";LAYER 0\nG1 X10 Y10 E5\n;-- removed [Feed Rate Adjustments are removed] - M220 S100\n"
        );
        assert_eq!(report.total_extruded, 5.0);
        assert_eq!(report.layer_count, 1);
    }
}
