//! Container remuxing: stream-copy into Matroska.

use std::path::Path;
use std::time::Duration;

use crate::command::ToolCommand;
use crate::{Error, Result};

/// Remux `input` into a Matroska container at `output` without re-encoding.
///
/// All streams are stream-copied. The output is verified to exist with a
/// non-zero size before returning success; a silent zero-byte result from
/// the tool is treated as a failure.
///
/// # Errors
///
/// Fails when the input is missing, ffmpeg exits non-zero or times out, or
/// the output file is missing/empty afterwards.
pub async fn remux_to_mkv(
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    tracing::info!(input = %input.display(), output = %output.display(), "remuxing to mkv");

    ToolCommand::new(ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(input.to_string_lossy())
        .arg("-c")
        .arg("copy")
        .arg(output.to_string_lossy())
        .timeout(timeout)
        .execute()
        .await?;

    verify_output(output, "remux")
}

/// Confirm a tool actually produced a usable file.
pub(crate) fn verify_output(output: &Path, operation: &str) -> Result<()> {
    let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(Error::tool_failed(
            "ffmpeg",
            format!("{operation} produced a missing or empty output file"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_input_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let result = remux_to_mkv(
            Path::new("ffmpeg"),
            &dir.path().join("absent.mp4"),
            &dir.path().join("out.mkv"),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn verify_output_rejects_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mkv");
        assert!(verify_output(&missing, "remux").is_err());

        let empty = dir.path().join("empty.mkv");
        std::fs::File::create(&empty).unwrap();
        assert!(verify_output(&empty, "remux").is_err());

        let full = dir.path().join("full.mkv");
        let mut f = std::fs::File::create(&full).unwrap();
        f.write_all(b"data").unwrap();
        assert!(verify_output(&full, "remux").is_ok());
    }
}
