use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::config::sibling;
use crate::store::document::{ensure_parent_dir, write_atomic};
use crate::store::lock::WriteLock;
use crate::store::StoreError;

pub const DEFAULT_CONFIG_PATH: &str = "database/config.json";
pub const DEFAULT_EMAIL: &str = "orders@teslamarkets.com";
pub const DEFAULT_SALES_MESSAGE: &str =
    "Hi, I'm interested in placing an order for a Tesla. Could you please help me with the details?";
pub const DEFAULT_CUSTOM_ORDER_MESSAGE: &str =
    "Hi, I'm interested in placing a custom order for a Tesla. Could you please help me with the details?";

#[derive(Debug, Error)]
pub enum ContactConfigError {
    #[error("Email address is required")]
    MissingEmail,
    #[error("Please provide a valid email address")]
    InvalidEmail(String),
    #[error("Corrupt contact configuration at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where customer order enquiries are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactConfig {
    pub email_address: String,
    pub sales_message: String,
    pub custom_order_message: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        ContactConfig {
            email_address: DEFAULT_EMAIL.into(),
            sales_message: DEFAULT_SALES_MESSAGE.into(),
            custom_order_message: DEFAULT_CUSTOM_ORDER_MESSAGE.into(),
        }
    }
}

impl ContactConfig {
    /// `mailto:` link for a standard or a custom order enquiry.
    pub fn email_url(&self, custom_order: bool) -> String {
        let (subject, body) = if custom_order {
            ("Custom Order Request", &self.custom_order_message)
        } else {
            ("Order Request", &self.sales_message)
        };
        format!(
            "mailto:{}?subject={}&body={}",
            self.email_address,
            encode_component(subject),
            encode_component(body)
        )
    }
}

/// Admin-submitted replacement for the stored config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactUpdate {
    pub email_address: Option<String>,
    pub sales_message: Option<String>,
    pub custom_order_message: Option<String>,
}

/// File-backed contact config.
///
/// Saves are serialized the same way product writes are: clones share one
/// in-process guard, and every writer takes the sibling `.lock` file.
#[derive(Debug, Clone)]
pub struct ContactConfigStore {
    path: PathBuf,
    lock_timeout: Duration,
    stale_lock_after: Duration,
    write_guard: Arc<Mutex<()>>,
}

impl Default for ContactConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ContactConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Duration::from_secs(5),
            stale_lock_after: Duration::from_secs(30),
            write_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored config, or the defaults if nothing has been saved yet.
    pub fn load(&self) -> Result<ContactConfig, ContactConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ContactConfig::default()),
            Err(e) => return Err(StoreError::storage(&self.path, e).into()),
        };
        if bytes.is_empty() {
            debug!("Contact config at {} is empty; using defaults", self.path.display());
            return Ok(ContactConfig::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| ContactConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, update: ContactUpdate) -> Result<ContactConfig, ContactConfigError> {
        let email = update
            .email_address
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ContactConfigError::MissingEmail)?;
        if !is_valid_email(email) {
            return Err(ContactConfigError::InvalidEmail(email.to_string()));
        }

        let config = ContactConfig {
            email_address: email.to_lowercase(),
            sales_message: non_empty_or(update.sales_message, DEFAULT_SALES_MESSAGE),
            custom_order_message: non_empty_or(
                update.custom_order_message,
                DEFAULT_CUSTOM_ORDER_MESSAGE,
            ),
        };

        let bytes = serde_json::to_vec_pretty(&config).map_err(StoreError::from)?;
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ensure_parent_dir(&self.path)?;
        let _lock = WriteLock::acquire(
            &sibling(&self.path, "lock"),
            self.lock_timeout,
            self.stale_lock_after,
        )?;
        write_atomic(&self.path, &bytes)?;
        info!("Saved contact configuration to {}", self.path.display());
        Ok(config)
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// `local@domain.tld`: one `@`, no whitespace, a dot inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("orders@example.com"));
        assert!(is_valid_email("a.b@sub.example.co"));
        assert!(!is_valid_email("orders@example"));
        assert!(!is_valid_email("orders@.com"));
        assert!(!is_valid_email("orders@example."));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("or ders@example.com"));
    }

    #[test]
    fn component_encoding() {
        assert_eq!(encode_component("Order Request"), "Order%20Request");
        assert_eq!(encode_component("I'm (here)!"), "I'm%20(here)!");
        assert_eq!(encode_component("a&b=c?"), "a%26b%3Dc%3F");
        assert_eq!(encode_component("é"), "%C3%A9");
    }
}
