//! Trigger input boundary
//!
//! The hub does not know where broadcast messages come from; anything
//! holding a [`HubHandle`](crate::hub::HubHandle) can feed it. This module
//! is the adapter the `keyrelayd` binary uses: a [`TriggerMap`] binds named
//! triggers (media-key names) to the fixed code strings clients understand,
//! and a [`TriggerSource`] reads trigger names line by line and delivers the
//! mapped codes.
//!
//! Key grabbing itself stays outside the crate; pipe the output of whatever
//! hook fires on key presses (xbindkeys, a compositor binding, a script)
//! into the source's reader.

pub mod map;
pub mod source;

pub use map::{TriggerMap, NEXT_TRACK, PLAY_PAUSE, PREV_TRACK};
pub use source::TriggerSource;
