//! Dubforge-AV: external media toolkit invocation.
//!
//! This crate owns every interaction with the external toolkit (ffmpeg and
//! ffprobe): a command builder with bounded timeouts, tool discovery, JSON
//! probing, and the stream-copy remux/merge operations the pipeline uses.
//! Nothing here re-encodes media; the toolkit is invoked as an opaque
//! subprocess and only its exit status and documented probe output are
//! interpreted.

pub mod actions;
pub mod command;
pub mod container;
pub mod error;
pub mod probe;
pub mod tools;

pub use actions::{merge_dub_audio, remux_to_mkv};
pub use command::{ToolCommand, ToolOutput, DEFAULT_TIMEOUT};
pub use container::Container;
pub use error::{Error, Result};
pub use probe::{parse_ffprobe_json, probe_file, AudioTrack, MediaInfo, VideoTrack};
pub use tools::{check_tool_with_arg, check_tools, get_tool_path, require_tool, ToolInfo};
