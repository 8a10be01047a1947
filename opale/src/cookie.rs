use std::borrow::Cow;

use time::{Duration, OffsetDateTime};

pub use cookie::*;

/// Offset of the `Expires` timestamp put on removal cookies. Kept well in
/// the past so clock skew between peers cannot resurrect the cookie.
const REMOVAL_OFFSET: Duration = Duration::hours(100);

/// Builds the replacement cookie that makes a client drop `name`: empty
/// value, negative max-age and an expiration safely in the past.
pub fn expired<N>(name: N) -> Cookie<'static>
where
    N: Into<Cow<'static, str>>,
{
    let mut cookie = Cookie::new(name, "");
    cookie.set_max_age(Duration::seconds(-1));
    cookie.set_expires(OffsetDateTime::now_utc() - REMOVAL_OFFSET);
    cookie
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn removal_cookie_shape() {
        let cookie = expired("session");

        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::seconds(-1)));

        let expires = cookie.expires().and_then(|e| e.datetime()).expect("expiration is set");
        assert!(expires < OffsetDateTime::now_utc());
    }

    #[test]
    fn removal_cookie_renders_a_negative_max_age() {
        let rendered = expired("session").to_string();
        assert!(rendered.starts_with("session="));
        assert!(rendered.contains("Max-Age=-1"));
    }
}
