//! Audio-track merging: copy the dubbed track into the original container.

use std::path::Path;
use std::time::Duration;

use super::remux::verify_output;
use crate::command::ToolCommand;
use crate::{Error, Result};

/// Merge the dubbed file's audio into the original file's container.
///
/// Maps the VO video stream and all VO audio streams, then appends the ES
/// file's audio streams, stream-copying everything. The first VO audio
/// stream is tagged `original_lang` and the appended stream `dubbed_lang`.
///
/// A partial file left at `output` after a failed invocation is removed so
/// the target name is never occupied by a corrupt merge.
///
/// # Errors
///
/// Fails when either input is missing, ffmpeg exits non-zero or times out,
/// or the output file is missing/empty afterwards.
pub async fn merge_dub_audio(
    ffmpeg: &Path,
    vo: &Path,
    es: &Path,
    output: &Path,
    original_lang: &str,
    dubbed_lang: &str,
    timeout: Duration,
) -> Result<()> {
    if !vo.exists() {
        return Err(Error::file_not_found(vo));
    }
    if !es.exists() {
        return Err(Error::file_not_found(es));
    }

    tracing::info!(
        vo = %vo.display(),
        es = %es.display(),
        output = %output.display(),
        "merging dubbed audio track"
    );

    let result = ToolCommand::new(ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(vo.to_string_lossy())
        .arg("-i")
        .arg(es.to_string_lossy())
        // Video and every audio stream from the original.
        .args(["-map", "0:v", "-map", "0:a"])
        // The dubbed audio stream(s).
        .args(["-map", "1:a"])
        // Stream copy, no re-encode.
        .args(["-c", "copy"])
        .arg("-metadata:s:a:0")
        .arg(format!("language={original_lang}"))
        .arg("-metadata:s:a:1")
        .arg(format!("language={dubbed_lang}"))
        .arg(output.to_string_lossy())
        .timeout(timeout)
        .execute()
        .await
        .and_then(|_| verify_output(output, "merge"));

    if result.is_err() && output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            tracing::warn!(output = %output.display(), "failed to remove partial merge output: {e}");
        }
    }

    result
}
