//! Plain-text echo protocol of the streaming endpoint.
//!
//! Sending `T` yields a frame containing [`ECHO_MARKER`] followed by `T`.

pub const ECHO_MARKER: &str = "Echo:";

pub fn echo_reply(text: &str) -> String {
    format!("{ECHO_MARKER} {text}")
}

/// True when `reply` carries both the marker and `sent` verbatim.
pub fn is_echo_of(reply: &str, sent: &str) -> bool {
    reply.contains(ECHO_MARKER) && reply.contains(sent)
}
