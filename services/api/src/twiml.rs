//! TwiML Rendering
//!
//! Twilio delivers each `<Message>` of a webhook response as a separate
//! WhatsApp message and rejects bodies longer than 1600 characters, so long
//! replies are split before rendering.

/// Maximum characters Twilio accepts in one message body.
pub const MAX_MESSAGE_CHARS: usize = 1600;

/// Splits `text` into consecutive chunks of at most `limit` characters.
/// Splits fall on character boundaries, never inside a UTF-8 sequence.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.is_empty() {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders replies as a TwiML `<Response>`, one `<Message>` per chunk, in order.
pub fn render_twiml(replies: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
    for reply in replies {
        for chunk in chunk_message(reply, MAX_MESSAGE_CHARS) {
            xml.push_str("<Message>");
            xml.push_str(&escape_xml(&chunk));
            xml.push_str("</Message>");
        }
    }
    xml.push_str("</Response>");
    xml
}
