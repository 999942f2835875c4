use compact_str::CompactString;
use crate::participant::Msg;
use crate::protocol::{self, PRIVATE_FORMAT_ERR, RENAME, TO, WHO};
use crate::registry::RegistryError;

/// One line of client input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Empty,
    Who,
    Private { target: &'a str, content: &'a str },
    /// `to=` line missing a target, a message, or the second `=`
    BadPrivate,
    Rename(&'a str),
    Chat(&'a str),
}

pub fn parse(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if line.eq_ignore_ascii_case(WHO) {
        return Command::Who;
    }
    if let Some(rest) = protocol::strip_token(line, TO) {
        // message text may contain '=' too
        let Some((target, content)) = rest.split_once('=') else {
            return Command::BadPrivate;
        };
        let (target, content) = (target.trim(), content.trim());
        if target.is_empty() || content.is_empty() {
            return Command::BadPrivate;
        }
        return Command::Private { target, content };
    }
    if let Some(new_name) = protocol::strip_token(line, RENAME) {
        return Command::Rename(new_name.trim());
    }
    Command::Chat(line)
}

/// What the command interpreter needs from the server.
pub trait Hub {
    /// Online names, in display order.
    fn online(&self) -> Vec<CompactString>;
    /// Queues `msg` in `target`'s mailbox.
    fn send_private(&self, target: &str, msg: Msg) -> Result<(), RegistryError>;
    fn rename(&self, old: &str, new: &str) -> Result<(), RegistryError>;
}

/// Effects of a command that are left to the caller: replies for the
/// sender only, then at most one broadcast, which the caller submits and
/// waits on.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub replies: Vec<String>,
    pub broadcast: Option<String>,
}

impl Outcome {
    fn reply(reply: String) -> Self {
        Self { replies: vec![reply], broadcast: None }
    }
}

/// Runs `command` on behalf of the participant called `name`, updating
/// `name` if it renamed successfully.
pub fn execute<H: Hub + ?Sized>(hub: &H, name: &mut CompactString, command: Command<'_>) -> Outcome {
    match command {
        Command::Empty => Outcome::default(),
        Command::Who => Outcome {
            replies: hub.online().iter().map(|n| protocol::online(n)).collect(),
            broadcast: None,
        },
        Command::BadPrivate => Outcome::reply(PRIVATE_FORMAT_ERR.to_owned()),
        Command::Private { target, content } => {
            let msg = protocol::private_msg(name, content);
            match hub.send_private(target, msg.into()) {
                Ok(()) => Outcome::reply(protocol::private_sent(target, content)),
                Err(err) => Outcome::reply(err.to_string()),
            }
        }
        Command::Rename("") => Outcome::reply(RegistryError::NameEmpty.to_string()),
        Command::Rename(new_name) => match hub.rename(name, new_name) {
            Ok(()) => {
                let old = std::mem::replace(name, CompactString::from(new_name));
                tracing::debug!("{old} renamed to {name}");
                Outcome {
                    replies: vec![protocol::rename_ok(name)],
                    broadcast: Some(protocol::renamed(&old, name)),
                }
            }
            Err(err) => Outcome::reply(err.to_string()),
        },
        Command::Chat(text) => Outcome {
            replies: Vec::new(),
            broadcast: Some(protocol::says(name, text)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[test]
    fn parses_commands() {
        assert_eq!(parse(""), Command::Empty);
        assert_eq!(parse("   \t"), Command::Empty);
        assert_eq!(parse("who"), Command::Who);
        assert_eq!(parse("WHO  "), Command::Who);
        assert_eq!(parse("whoami"), Command::Chat("whoami"));
        assert_eq!(parse("rename= alice "), Command::Rename("alice"));
        assert_eq!(parse("RENAME=bob"), Command::Rename("bob"));
        assert_eq!(parse("rename=  "), Command::Rename(""));
        assert_eq!(parse("hello there "), Command::Chat("hello there"));
    }

    #[test]
    fn parses_private_messages() {
        assert_eq!(
            parse("to=bob=hi"),
            Command::Private { target: "bob", content: "hi" },
        );
        assert_eq!(
            parse("To= bob = a=b=c "),
            Command::Private { target: "bob", content: "a=b=c" },
        );
        assert_eq!(parse("to=bob"), Command::BadPrivate);
        assert_eq!(parse("to==hi"), Command::BadPrivate);
        assert_eq!(parse("to=bob=  "), Command::BadPrivate);
    }

    // in-memory hub keyed by name, recording what was delivered
    #[derive(Default)]
    struct FakeHub {
        inboxes: Mutex<BTreeMap<CompactString, Vec<String>>>,
    }

    impl FakeHub {
        fn with(names: &[&str]) -> Self {
            let hub = Self::default();
            for name in names {
                hub.inboxes.lock().unwrap().insert((*name).into(), Vec::new());
            }
            hub
        }
        fn inbox(&self, name: &str) -> Vec<String> {
            self.inboxes.lock().unwrap()[name].clone()
        }
    }

    impl Hub for FakeHub {
        fn online(&self) -> Vec<CompactString> {
            self.inboxes.lock().unwrap().keys().cloned().collect()
        }
        fn send_private(&self, target: &str, msg: Msg) -> Result<(), RegistryError> {
            match self.inboxes.lock().unwrap().get_mut(target) {
                Some(inbox) => {
                    inbox.push(msg.to_string());
                    Ok(())
                }
                None => Err(RegistryError::Offline(target.into())),
            }
        }
        fn rename(&self, old: &str, new: &str) -> Result<(), RegistryError> {
            let mut inboxes = self.inboxes.lock().unwrap();
            if inboxes.contains_key(new) {
                return Err(RegistryError::NameTaken(new.into()));
            }
            let inbox = inboxes.remove(old).ok_or_else(|| RegistryError::Offline(old.into()))?;
            inboxes.insert(new.into(), inbox);
            Ok(())
        }
    }

    fn run(hub: &FakeHub, name: &mut CompactString, line: &str) -> Outcome {
        execute(hub, name, parse(line))
    }

    #[test]
    fn private_message_reaches_target() {
        let hub = FakeHub::with(&["1.2.3.4:5", "5.6.7.8:9"]);
        let mut name = CompactString::from("1.2.3.4:5");
        let outcome = run(&hub, &mut name, "to=5.6.7.8:9=hi");
        assert_eq!(outcome.replies, ["[private] you said to [5.6.7.8:9]: hi"]);
        assert_eq!(outcome.broadcast, None);
        assert_eq!(hub.inbox("5.6.7.8:9"), ["[private] 1.2.3.4:5 says: hi"]);
    }

    #[test]
    fn private_message_to_offline_user() {
        let hub = FakeHub::with(&["1.2.3.4:5"]);
        let mut name = CompactString::from("1.2.3.4:5");
        let outcome = run(&hub, &mut name, "to=ghost=boo");
        assert_eq!(outcome.replies, ["error: user [ghost] is not online"]);
        assert!(hub.inbox("1.2.3.4:5").is_empty());
        assert_eq!(outcome.broadcast, None);
    }

    #[test]
    fn malformed_private_message() {
        let hub = FakeHub::with(&["me"]);
        let mut name = CompactString::from("me");
        assert_eq!(run(&hub, &mut name, "to=me").replies, [PRIVATE_FORMAT_ERR]);
        assert!(hub.inbox("me").is_empty());
    }

    #[test]
    fn rename_updates_name_and_announces() {
        let hub = FakeHub::with(&["1.2.3.4:5"]);
        let mut name = CompactString::from("1.2.3.4:5");
        let outcome = run(&hub, &mut name, "rename=alice");
        assert_eq!(name, "alice");
        assert_eq!(outcome.replies, [protocol::rename_ok("alice")]);
        assert_eq!(outcome.broadcast.as_deref(), Some("announcement: [1.2.3.4:5] renamed to [alice]"));
    }

    #[test]
    fn rename_rejections_keep_name() {
        let hub = FakeHub::with(&["alice", "5.6.7.8:9"]);
        let mut name = CompactString::from("5.6.7.8:9");
        assert_eq!(
            run(&hub, &mut name, "rename=alice").replies,
            ["error: name [alice] is already taken"],
        );
        assert_eq!(run(&hub, &mut name, "rename= ").replies, ["error: name cannot be empty"]);
        assert_eq!(name, "5.6.7.8:9");
    }

    #[test]
    fn who_lists_everyone() {
        let hub = FakeHub::with(&["bob", "alice"]);
        let mut name = CompactString::from("bob");
        let outcome = run(&hub, &mut name, "who");
        assert_eq!(outcome.replies, ["[online] alice", "[online] bob"]);
    }

    #[test]
    fn chat_is_broadcast() {
        let hub = FakeHub::with(&["bob"]);
        let mut name = CompactString::from("bob");
        assert_eq!(run(&hub, &mut name, "").broadcast, None);
        let outcome = run(&hub, &mut name, "hello world");
        assert!(outcome.replies.is_empty());
        assert_eq!(outcome.broadcast.as_deref(), Some("[bob] says hello world"));
    }
}
