//! Turns a validated submission into the notification sent to the site owner.

use std::fmt::Write;

use crate::Submission;

const SUBJECT_PREFIX: &str = "Contact Form: ";

/// Display name and address of the `From` mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// The submitter's name on the relay-owned address. The submitter's own
    /// address never goes in `From`.
    pub from: Sender,
    pub to: String,
    /// The submitter's address, so the owner can answer directly.
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Builds [`OutboundMessage`]s for a fixed sender address and recipient.
#[derive(Debug, Clone)]
pub struct Composer {
    sender_address: String,
    recipient: String,
}

impl Composer {
    pub fn new(sender_address: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            sender_address: sender_address.into(),
            recipient: recipient.into(),
        }
    }

    #[must_use]
    pub fn compose(&self, submission: &Submission) -> OutboundMessage {
        OutboundMessage {
            from: Sender {
                name: submission.name().to_string(),
                address: self.sender_address.clone(),
            },
            to: self.recipient.clone(),
            reply_to: submission.email().to_string(),
            subject: format!("{SUBJECT_PREFIX}{}", submission.subject()),
            text_body: text_body(submission),
            html_body: html_body(submission),
        }
    }
}

fn text_body(submission: &Submission) -> String {
    format!(
        "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}\n",
        submission.name(),
        submission.email(),
        submission.subject(),
        submission.message(),
    )
}

fn html_body(submission: &Submission) -> String {
    let mut html = String::from("<h2>New Contact Form Submission</h2>\n");

    for (label, value) in [
        ("Name", submission.name()),
        ("Email", submission.email()),
        ("Subject", submission.subject()),
    ] {
        let _ = writeln!(
            html,
            "<p><strong>{label}:</strong> {}</p>",
            escape_text(value)
        );
    }

    let _ = write!(
        html,
        "<h3>Message:</h3>\n<p>{}</p>\n",
        with_line_breaks(submission.message())
    );

    html
}

/// Escape text for element content. Spaces are safe there, so they are kept
/// literal to leave the HTML source readable.
fn escape_text(text: &str) -> String {
    ammonia::clean_text(text).replace("&#32;", " ")
}

/// Escape each line of free text and join them with `<br>`.
fn with_line_breaks(text: &str) -> String {
    text.split('\n')
        .map(|line| escape_text(line.strip_suffix('\r').unwrap_or(line)))
        .collect::<Vec<_>>()
        .join("<br>")
}
