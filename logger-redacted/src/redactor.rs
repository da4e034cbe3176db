use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern is valid");
    static ref PHONE_REGEX: Regex =
        Regex::new(r"\+?\b\d[\d -]{8,16}\d\b").expect("phone pattern is valid");
    static ref AUTHORIZATION_REGEX: Regex =
        Regex::new(r"(?i)\b(basic|bearer)\s+[A-Za-z0-9._~+/=-]+").expect("authorization pattern is valid");
}

/// Redaction switches
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_authorization: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_authorization: true,
        }
    }
}

/// Masks credentials and contact identifiers before they reach a log field.
///
/// Identity and tenant ids are opaque UUIDs and are kept intact so that
/// operators can still correlate entries for manual repair.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    config: RedactionConfig,
}

impl Redactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_authorization {
            result = self.redact_authorization(&result);
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_phones {
            result = self.redact_phones(&result);
        }

        result
    }

    fn redact_authorization(&self, text: &str) -> String {
        AUTHORIZATION_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let scheme = caps.get(1).map_or("", |m| m.as_str());
                format!("{scheme} [REDACTED]")
            })
            .to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let email = caps.get(0).map_or("", |m| m.as_str());
                match email.split_once('@') {
                    Some((local, domain)) => {
                        let first: String = local.chars().take(1).collect();
                        format!("{first}***@{domain}")
                    }
                    None => "***@***".to_string(),
                }
            })
            .to_string()
    }

    fn redact_phones(&self, text: &str) -> String {
        PHONE_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let digits: Vec<char> = caps
                    .get(0)
                    .map_or("", |m| m.as_str())
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                let tail: String = digits.iter().skip(digits.len().saturating_sub(4)).collect();
                format!("***{tail}")
            })
            .to_string()
    }
}
