use lettre::Address;
use serde::Deserialize;

use crate::ValidationError;

/// A contact-form payload as it arrives over the wire.
///
/// Every field is optional so that an absent field and an empty one are
/// reported the same way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionCandidate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A submission that passed validation. Only [`SubmissionCandidate::validate`]
/// produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    name: String,
    email: String,
    subject: String,
    message: String,
}

impl Submission {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl SubmissionCandidate {
    /// Check the payload.
    ///
    /// Missing fields are reported before a malformed email address, so an
    /// empty payload yields [`ValidationError::MissingFields`]. Values are not
    /// trimmed.
    ///
    /// An accepted email always parses as a mailbox address, so it can be
    /// used as `Reply-To` without failing at dispatch.
    ///
    /// # Errors
    ///
    /// Returns the first rule the payload breaks.
    pub fn validate(self) -> Result<Submission, ValidationError> {
        let (Some(name), Some(email), Some(subject), Some(message)) = (
            present(self.name),
            present(self.email),
            present(self.subject),
            present(self.message),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        if !is_valid_email(&email) || email.parse::<Address>().is_err() {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Submission {
            name,
            email,
            subject,
            message,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `local@domain` with no whitespace, exactly one `@`, and a `.` inside the
/// domain with at least one character on either side of it.
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
