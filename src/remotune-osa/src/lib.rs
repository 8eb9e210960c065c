//! AppleScript transport for Remotune.
//!
//! [`OsaProxy`] implements the core's `RemoteObjectProxy` by rendering each
//! request as a short AppleScript, running it through `osascript -s s`, and
//! reading the source-form result back into core values.
//!
//! Every script is guarded so that a target which has quit is reported as
//! not running instead of being relaunched:
//!
//! ```text
//! if application id "com.apple.Music" is running then
//!     with timeout of 5 seconds
//!         tell application id "com.apple.Music"
//!             get name of current track
//!         end tell
//!     end timeout
//! else
//!     error "target is not running" number -600
//! end if
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use remotune_core::{Remote, SessionOptions, TargetRegistry};
//! use remotune_osa::OsaProxy;
//! use std::sync::Arc;
//!
//! let remote = Remote::new(registry, Arc::new(OsaProxy::default()), SessionOptions::default());
//! let mut music = remote.dispatcher(&"com.apple.Music".into())?;
//! music.play_pause()?;
//! ```

pub mod errors;
mod host;
pub mod parse;
mod proxy;
pub mod script;

pub use host::{HostConfig, HostError, ScriptHost};
pub use parse::{parse_result, ParseError};
pub use proxy::OsaProxy;
