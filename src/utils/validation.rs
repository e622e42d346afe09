use once_cell::sync::Lazy;
use regex::Regex;

/// ASCII letters, digits and `@ . + - _`, the set a username may use.
static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]+$").expect("compile username regex"));

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 150;

pub const INVALID_USERNAME_MESSAGE: &str = "Enter a valid username. This value may contain \
     only English letters, numbers, and @/./+/-/_ characters.";

/// Usernames end up verbatim in profile URLs and `Location` headers, so only
/// path-safe ASCII passes.
pub fn is_valid_username(name: &str) -> bool {
    let len = name.chars().count();
    (USERNAME_MIN..=USERNAME_MAX).contains(&len) && USERNAME_REGEX.is_match(name)
}
