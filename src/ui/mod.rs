//! Discord presentation: embeds, reply texts and the playback control row.

pub mod buttons;
pub mod embeds;
