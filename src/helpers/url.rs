//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Path of a post page
///
/// # Examples
/// ```ignore
/// post_path("como-utilizar-hooks") // -> "/post/como-utilizar-hooks"
/// ```
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", utf8_percent_encode(uid, SEGMENT))
}

/// Path of a listing session
pub fn listing_path(session: &str) -> String {
    format!("/?session={}", utf8_percent_encode(session, SEGMENT))
}

/// Path the "load more" form posts to
pub fn load_more_path(session: &str) -> String {
    format!("/more/{}", utf8_percent_encode(session, SEGMENT))
}
