// Fixed wire vocabulary. Every line the server writes is built here
// (error lines live on `RegistryError`), so the client and tests can
// match on the same templates.

pub const MAX_MSG_LEN: usize = 400;

// CLIENT -> SERVER //

pub const WHO: &str = "who";
pub const TO: &str = "to=";
pub const RENAME: &str = "rename=";

// client side only, never sent over the wire
pub const MENU: &str = "menu";
pub const PRIVATE: &str = "private";
pub const EXIT: &str = "exit";

// SERVER -> CLIENT //

pub const WELCOME: &str = "WELCOME TO THE LOBBY CHAT SERVER";
pub const IDLE_TIMEOUT: &str = "❌ you have been idle for too long and are being disconnected";
pub const PRIVATE_FORMAT_ERR: &str = "error: private messages look like to=<name>=<message>";

const RENAME_OK_PREFIX: &str = "success: you are now [";

pub fn joined(name: &str) -> String {
    format!("✅ [{name}] joined")
}

pub fn left(name: &str) -> String {
    format!("❌ [{name}] left")
}

pub fn renamed(old: &str, new: &str) -> String {
    format!("announcement: [{old}] renamed to [{new}]")
}

pub fn says(name: &str, text: &str) -> String {
    format!("[{name}] says {text}")
}

pub fn private_msg(from: &str, text: &str) -> String {
    format!("[private] {from} says: {text}")
}

pub fn private_sent(to: &str, text: &str) -> String {
    format!("[private] you said to [{to}]: {text}")
}

pub fn online(name: &str) -> String {
    format!("[online] {name}")
}

pub fn rename_ok(name: &str) -> String {
    format!("{RENAME_OK_PREFIX}{name}]")
}

pub fn too_long() -> String {
    format!("error: messages can only be {MAX_MSG_LEN} bytes long")
}

/// Name carried by a rename confirmation, if `line` is one.
pub fn parse_rename_ok(line: &str) -> Option<&str> {
    line.strip_prefix(RENAME_OK_PREFIX)?.strip_suffix(']')
}

/// Strips a case-insensitive command token such as `to=` off the front of `line`.
pub fn strip_token<'a>(line: &'a str, token: &str) -> Option<&'a str> {
    let (head, rest) = line.split_at_checked(token.len())?;
    head.eq_ignore_ascii_case(token).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_token_ignores_case() {
        assert_eq!(strip_token("TO=bob=hi", TO), Some("bob=hi"));
        assert_eq!(strip_token("Rename=alice", RENAME), Some("alice"));
        assert_eq!(strip_token("to", TO), None);
        assert_eq!(strip_token("tomorrow", TO), None);
    }

    #[test]
    fn strip_token_on_multibyte_input() {
        assert_eq!(strip_token("ééé", TO), None);
    }

    #[test]
    fn rename_confirmation_round_trips() {
        assert_eq!(parse_rename_ok(&rename_ok("alice")), Some("alice"));
        assert_eq!(parse_rename_ok(&renamed("a", "b")), None);
    }

    #[test]
    fn event_kinds_are_distinguishable() {
        let lines = [joined("x"), left("x"), renamed("x", "y"), says("x", "y")];
        for (i, a) in lines.iter().enumerate() {
            for b in &lines[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
