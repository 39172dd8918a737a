//! - prompt.rs: prompt builders/constants only
//! - client.rs: judge call + verdict parse boundary

pub(crate) mod client;
pub(crate) mod prompt;
