//! Field extraction: raw RFC 822 bytes to a canonical `Message`.

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders, PartType};
use tracing::debug;
use uuid::Uuid;

use crate::error::ExtractionError;

use super::types::{Message, RawMessage, truncate_chars};

/// Subject used when the header is missing or blank.
pub const NO_SUBJECT: &str = "(No Subject)";

/// Sender used when there is no usable `From` header.
pub const UNKNOWN_SENDER: &str = "(unknown sender)";

/// Normalizes raw messages. Holds the stored-body bound.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    stored_body_chars: usize,
}

impl FieldExtractor {
    pub fn new(stored_body_chars: usize) -> Self {
        Self { stored_body_chars }
    }

    /// Extract a `Message` from a raw record.
    ///
    /// Missing `Subject`/`From` get placeholders and undecodable bytes are
    /// replaced. Only an empty or wholly unparseable record is an error.
    pub fn extract(&self, raw: &RawMessage) -> Result<Message, ExtractionError> {
        if raw.data.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ExtractionError::Empty { id: raw.id.clone() });
        }

        let parsed = MessageParser::default()
            .parse(&raw.data)
            .ok_or_else(|| ExtractionError::Unparseable { id: raw.id.clone() })?;

        let (sender, reply_to) = extract_sender(&parsed);

        let subject = parsed
            .subject()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_SUBJECT)
            .to_string();

        let body = match first_plain_text(&parsed) {
            Some(text) => text,
            None => {
                debug!(id = %raw.id, "No plain-text part, using raw payload");
                String::from_utf8_lossy(raw.raw_body()).into_owned()
            }
        };
        let body = truncate_chars(body.trim(), self.stored_body_chars).to_string();

        let received_at = parsed
            .date()
            .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
            .unwrap_or_else(Utc::now);

        let id = if raw.id.trim().is_empty() {
            parsed
                .message_id()
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string())
        } else {
            raw.id.clone()
        };

        let message = Message::new(id, sender, subject, body).with_received_at(received_at);
        Ok(match reply_to {
            Some(address) => message.with_reply_to(address),
            None => message,
        })
    }
}

/// Display form of the first `From` address and its bare address.
fn extract_sender(parsed: &mail_parser::Message) -> (String, Option<String>) {
    let Some(addr) = parsed.from().and_then(|a| a.first()) else {
        return (UNKNOWN_SENDER.to_string(), None);
    };

    let address = addr
        .address()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let display = match (addr.name(), address.as_deref()) {
        (Some(name), Some(address)) => format!("{} <{}>", name, address),
        (None, Some(address)) => address.to_string(),
        (Some(name), None) => name.to_string(),
        (None, None) => UNKNOWN_SENDER.to_string(),
    };

    (display, address)
}

/// First `text/plain` part (parts without a content type default to it).
fn first_plain_text(parsed: &mail_parser::Message) -> Option<String> {
    parsed.parts.iter().find_map(|part| {
        let PartType::Text(text) = &part.body else {
            return None;
        };
        let is_plain = match part.content_type() {
            Some(ct) => {
                ct.ctype().eq_ignore_ascii_case("text")
                    && ct.subtype().is_none_or(|s| s.eq_ignore_ascii_case("plain"))
            }
            None => true,
        };
        is_plain.then(|| text.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(2000)
    }

    #[test]
    fn extracts_basic_fields() {
        let raw = RawMessage::new(
            "file-1.eml",
            "From: Alice Smith <alice@example.com>\r\n\
             Subject: Invoice question\r\n\
             Date: Tue, 1 Jul 2025 10:00:00 +0000\r\n\
             \r\n\
             Hi, I was charged twice.\r\n",
        );
        let msg = extractor().extract(&raw).unwrap();
        assert_eq!(msg.id(), "file-1.eml");
        assert_eq!(msg.sender(), "Alice Smith <alice@example.com>");
        assert_eq!(msg.reply_to(), Some("alice@example.com"));
        assert_eq!(msg.subject(), "Invoice question");
        assert_eq!(msg.body(), "Hi, I was charged twice.");
        assert_eq!(msg.received_at().year(), 2025);
    }

    #[test]
    fn missing_subject_gets_placeholder() {
        let raw = RawMessage::new("m", "From: bob@example.com\r\n\r\nhello");
        let msg = extractor().extract(&raw).unwrap();
        assert_eq!(msg.subject(), NO_SUBJECT);
        assert_eq!(msg.sender(), "bob@example.com");
    }

    #[test]
    fn missing_from_is_tolerated() {
        let raw = RawMessage::new("m", "Subject: anonymous\r\n\r\nwho am I");
        let msg = extractor().extract(&raw).unwrap();
        assert_eq!(msg.sender(), UNKNOWN_SENDER);
        assert!(msg.reply_to().is_none());
        assert_eq!(msg.body(), "who am I");
    }

    #[test]
    fn multipart_selects_first_plain_text_part() {
        let raw = RawMessage::new(
            "m",
            "From: carol@example.com\r\n\
             Subject: Multi\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\
             \r\n\
             --XYZ\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             \r\n\
             <p>html version</p>\r\n\
             --XYZ\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             plain version\r\n\
             --XYZ--\r\n",
        );
        let msg = extractor().extract(&raw).unwrap();
        assert_eq!(msg.body(), "plain version");
    }

    #[test]
    fn html_only_falls_back_to_raw_payload() {
        let raw = RawMessage::new(
            "m",
            "From: dave@example.com\r\n\
             Subject: Html\r\n\
             Content-Type: text/html\r\n\
             \r\n\
             <b>bold</b>",
        );
        let msg = extractor().extract(&raw).unwrap();
        assert_eq!(msg.body(), "<b>bold</b>");
    }

    #[test]
    fn invalid_bytes_do_not_fail() {
        let mut data = b"From: eve@example.com\r\nSubject: bytes\r\n\r\nbad ".to_vec();
        data.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        data.extend_from_slice(b" end");
        let msg = extractor().extract(&RawMessage::new("m", data)).unwrap();
        assert!(msg.body().starts_with("bad"));
        assert!(msg.body().ends_with("end"));
    }

    #[test]
    fn body_is_capped_to_stored_bound() {
        let body = "x".repeat(5000);
        let raw = RawMessage::new("m", format!("Subject: long\r\n\r\n{body}"));
        let msg = FieldExtractor::new(100).extract(&raw).unwrap();
        assert_eq!(msg.body().chars().count(), 100);
    }

    #[test]
    fn empty_record_is_an_extraction_error() {
        let err = extractor().extract(&RawMessage::new("empty", "  \r\n ")).unwrap_err();
        assert!(matches!(err, ExtractionError::Empty { ref id } if id == "empty"));
    }

    #[test]
    fn blank_id_is_synthesized() {
        let raw = RawMessage::new(
            "",
            "Message-ID: <abc@example.com>\r\nSubject: s\r\n\r\nbody",
        );
        let msg = extractor().extract(&raw).unwrap();
        assert_eq!(msg.id(), "abc@example.com");

        let raw = RawMessage::new(" ", "Subject: s\r\n\r\nbody");
        let msg = extractor().extract(&raw).unwrap();
        assert!(!msg.id().trim().is_empty());
    }
}
