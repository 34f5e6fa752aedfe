use thiserror::Error;

/// Errors surfaced through [`PlayerEvent::Error`](crate::PlayerEvent::Error)
/// or returned from fallible constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// The Iframe API script could not be fetched. Delivered to every waiter
    /// registered with the loader; there is no retry.
    #[error("YouTube Iframe API failed to load")]
    ApiLoadFailed,

    /// The embedded player reported an error code outside the known set.
    /// The facade destroys itself when this happens.
    #[error("YouTube player error. Unknown error code: {0}")]
    UnknownErrorCode(i32),

    /// Constructing the embedded player object failed.
    #[error("failed to create embedded player: {0}")]
    CreatePlayer(String),

    /// No element in the document matched the given selector.
    #[error("no element matches selector `{0}`")]
    NoSuchElement(String),
}

// Error codes reported by the embedded player's onError callback.

/// The request contains an invalid parameter value, e.g. a video id that does
/// not have 11 characters or contains invalid characters.
pub(crate) const ERROR_INVALID_PARAM: i32 = 2;
/// The requested content cannot be played in an HTML5 player, or another
/// HTML5-player-related error occurred.
pub(crate) const ERROR_HTML5: i32 = 5;
/// The video was removed or marked private.
pub(crate) const ERROR_NOT_FOUND: i32 = 100;
/// The owner does not allow embedded playback.
pub(crate) const ERROR_UNPLAYABLE_1: i32 = 101;
/// Same as 101, reported under a different code.
pub(crate) const ERROR_UNPLAYABLE_2: i32 = 150;

/// How the facade reacts to an embedded-player error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorDisposition {
    /// Swallowed entirely, never surfaced. Happens when the player switches
    /// from HTML5 to Flash to show an ad.
    Ignore,
    /// Non-fatal: the video cannot be played but the instance stays usable.
    Unplayable,
    /// Unknown code, treated as fatal.
    Fatal,
}

pub(crate) fn classify_error(code: i32) -> ErrorDisposition {
    match code {
        ERROR_HTML5 => ErrorDisposition::Ignore,
        ERROR_INVALID_PARAM | ERROR_NOT_FOUND | ERROR_UNPLAYABLE_1 | ERROR_UNPLAYABLE_2 => {
            ErrorDisposition::Unplayable
        }
        _ => ErrorDisposition::Fatal,
    }
}
