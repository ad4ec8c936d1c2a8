//! Compression Filter Module
//!
//! Shrinks large JSON payloads before they are cached by dropping empty
//! fields and truncating long strings. The transform is lossy and there is no
//! inverse: [`CompressionFilter::restore`] is the identity.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Policy;
use crate::error::{GovernorError, Result};

// == Public Constants ==
/// Strings longer than this many characters are truncated
pub const MAX_STRING_CHARS: usize = 1000;

/// Appended to every truncated string
pub const TRUNCATION_MARKER: &str = "...";

/// Deepest nesting the walk will descend into
pub const MAX_DEPTH: usize = 128;

// == Compression Filter ==
/// Conditional, one-way payload shrinker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionFilter {
    enabled: bool,
    threshold: usize,
}

impl CompressionFilter {
    /// Creates a filter.
    ///
    /// # Arguments
    /// * `enabled` - When false every payload passes through untouched
    /// * `threshold` - Serialized size in bytes below which payloads are left alone
    pub fn new(enabled: bool, threshold: usize) -> Self {
        Self { enabled, threshold }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self::new(policy.compression_enabled, policy.compression_threshold)
    }

    // == Shrink ==
    /// Returns a shrunk copy of `payload`, or `payload` itself when the filter
    /// is disabled, the payload is under the threshold, or shrinking fails.
    ///
    /// Object fields holding `null` or `""` are dropped; strings longer than
    /// [`MAX_STRING_CHARS`] are cut and suffixed with [`TRUNCATION_MARKER`].
    /// Array elements are walked but never removed.
    pub fn shrink(&self, payload: Value) -> Value {
        if !self.enabled {
            return payload;
        }

        match self.try_shrink(&payload) {
            Ok(Some(shrunk)) => shrunk,
            Ok(None) => payload,
            Err(e) => {
                warn!("Payload left unshrunk: {}", e);
                payload
            }
        }
    }

    // == Restore ==
    /// Identity. Shrinking discards data, so there is nothing to restore; this
    /// exists so read paths have a single place to call should that change.
    pub fn restore(&self, payload: Value) -> Value {
        payload
    }

    fn try_shrink(&self, payload: &Value) -> Result<Option<Value>> {
        let size = serde_json::to_vec(payload)?.len();
        if size < self.threshold {
            return Ok(None);
        }

        let shrunk = prune(payload, 0)?;
        debug!(
            "Shrunk payload from {} bytes (threshold {})",
            size, self.threshold
        );
        Ok(Some(shrunk))
    }
}

fn prune(value: &Value, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(GovernorError::Compression(format!(
            "payload nested deeper than {} levels",
            MAX_DEPTH
        )));
    }

    let pruned = match value {
        Value::Object(fields) => {
            let mut kept = Map::with_capacity(fields.len());
            for (name, field) in fields {
                if is_blank(field) {
                    continue;
                }
                kept.insert(name.clone(), prune(field, depth + 1)?);
            }
            Value::Object(kept)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| prune(item, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::String(s) => Value::String(truncate(s)),
        scalar => scalar.clone(),
    };

    Ok(pruned)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn truncate(s: &str) -> String {
    match s.char_indices().nth(MAX_STRING_CHARS) {
        Some((cut, _)) => format!("{}{}", &s[..cut], TRUNCATION_MARKER),
        None => s.to_string(),
    }
}
