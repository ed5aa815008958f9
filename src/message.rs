use mail_parser::MessageParser;

pub const NO_SUBJECT: &str = "(no subject)";

/// Returns the decoded `Subject` header, or `(no subject)` when it is absent.
pub fn subject_of(raw: &[u8]) -> String {
    MessageParser::default()
        .parse(raw)
        .and_then(|message| message.subject().map(str::to_string))
        .unwrap_or_else(|| NO_SUBJECT.to_string())
}
