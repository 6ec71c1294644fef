//! SMS body limits imposed by the gateway's trial tier.

use std::borrow::Cow;

/// Longest body the gateway accepts, in characters.
pub const MAX_BODY_CHARS: usize = 150;

/// Marker appended to a truncated body.
pub const ELLIPSIS: &str = "...";

/// Truncate a body to [`MAX_BODY_CHARS`], ending it with [`ELLIPSIS`].
///
/// Counts Unicode scalar values so a multi-byte character is never split.
#[must_use]
pub fn truncate_body(body: &str) -> Cow<'_, str> {
    if body.chars().count() <= MAX_BODY_CHARS {
        return Cow::Borrowed(body);
    }

    let keep = MAX_BODY_CHARS - ELLIPSIS.len();
    let mut truncated: String = body.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    Cow::Owned(truncated)
}
