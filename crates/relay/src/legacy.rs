//! The `!send <names> "<message>"` text command.

use std::sync::LazyLock;

use regex::Regex;

/// Group 1 is the shortest prefix followed by whitespace and a quote, group 2
/// everything from that quote up to the closing quote at the end.
#[allow(clippy::unwrap_used)] // static pattern
static SEND_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)^(.+?)\s+"(.+)"$"#).unwrap());

pub const USAGE_REPLY: &str = "Please provide the usernames and message in the correct format.";
pub const GUILD_NOT_FOUND_REPLY: &str = "Guild not found.";

/// Parsed arguments of a legacy send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySend {
    /// Usernames in input order; blanks already dropped.
    pub names: Vec<String>,
    pub message: String,
}

impl LegacySend {
    /// Parse `alice, bob "hello"` (names may be wrapped in quotes too).
    pub fn parse(args: &str) -> Option<Self> {
        let caps = SEND_ARGS.captures(args.trim())?;
        let names_raw = caps.get(1)?.as_str().trim().trim_matches('"');
        let message = caps.get(2)?.as_str().to_string();

        let names = names_raw
            .split(',')
            .map(|name| name.trim().trim_matches('"').trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self { names, message })
    }
}

/// Result of a legacy send, in the reply format the command has always used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyOutcome {
    pub sent: usize,
    pub failed: Vec<String>,
}

impl LegacyOutcome {
    pub fn reply(&self) -> String {
        let mut response = format!("Successfully sent messages to {} user(s).", self.sent);
        if !self.failed.is_empty() {
            response.push_str("\nFailed to send messages to: ");
            response.push_str(&self.failed.join(", "));
        }
        response
    }
}

/// Return the argument text of `<prefix><name> <args>`, or `None` when
/// `content` is a different command.
pub fn command_argument<'a>(content: &'a str, prefix: &str, name: &str) -> Option<&'a str> {
    let rest = content.trim_start().strip_prefix(prefix)?.strip_prefix(name)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let args = rest.trim();
    (!args.is_empty()).then_some(args)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(r#""alice, bob" "hello""#, &["alice", "bob"], "hello")]
    #[case(r#"alice,bob "hi there""#, &["alice", "bob"], "hi there")]
    #[case(r#"alice "one""#, &["alice"], "one")]
    #[case(r#"alice, , bob "x""#, &["alice", "bob"], "x")]
    #[case("alice \"line one\nline two\"", &["alice"], "line one\nline two")]
    #[case(r#"alice "Read the "rules" channel""#, &["alice"], r#"Read the "rules" channel"#)]
    #[case(
        r#"alice, bob "say "hi" to "everyone"""#,
        &["alice", "bob"],
        r#"say "hi" to "everyone""#
    )]
    fn parses_names_and_message(
        #[case] input: &str,
        #[case] expected_names: &[&str],
        #[case] expected_message: &str,
    ) {
        assert_eq!(
            LegacySend::parse(input),
            Some(LegacySend {
                names: names(expected_names),
                message: expected_message.to_string(),
            })
        );
    }

    #[rstest]
    #[case("alice hello")]
    #[case(r#""hello""#)]
    #[case(r#"alice """#)]
    #[case("")]
    fn rejects_bad_format(#[case] input: &str) {
        assert_eq!(LegacySend::parse(input), None);
    }

    #[test]
    fn message_starts_at_the_first_quote_after_the_names() {
        let parsed = LegacySend::parse(r#""alice" "bob" "hey""#).unwrap();
        assert_eq!(parsed.names, names(&["alice"]));
        assert_eq!(parsed.message, r#"bob" "hey"#);
    }

    #[test]
    fn reply_formats() {
        let ok = LegacyOutcome {
            sent: 2,
            failed: vec![],
        };
        assert_eq!(ok.reply(), "Successfully sent messages to 2 user(s).");

        let partial = LegacyOutcome {
            sent: 1,
            failed: names(&["bob", "eve"]),
        };
        assert_eq!(
            partial.reply(),
            "Successfully sent messages to 1 user(s).\nFailed to send messages to: bob, eve"
        );
    }

    #[rstest]
    #[case("!send alice \"hi\"", Some("alice \"hi\""))]
    #[case("  !send   alice \"hi\"  ", Some("alice \"hi\""))]
    #[case("!sendalice \"hi\"", None)]
    #[case("!send", None)]
    #[case("!send   ", None)]
    #[case("?send alice \"hi\"", None)]
    #[case("!other alice", None)]
    fn extracts_command_argument(#[case] content: &str, #[case] expected: Option<&str>) {
        assert_eq!(command_argument(content, "!", "send"), expected);
    }
}
