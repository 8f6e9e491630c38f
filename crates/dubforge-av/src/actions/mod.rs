//! Media toolkit operations built on [`ToolCommand`](crate::ToolCommand).

mod merge;
mod remux;

pub use merge::merge_dub_audio;
pub use remux::remux_to_mkv;
