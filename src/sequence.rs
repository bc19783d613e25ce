//! Sequential id allocation.
//!
//! Counters live in the document store rather than in process memory, so the
//! sequence stays unique across every worker and every server instance.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::store::{DocumentStore, StoreError};

lazy_static! {
    static ref COUNTER_NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_.-]{1,64}$").unwrap();
}

pub fn is_valid_counter_name(name: &str) -> bool {
    COUNTER_NAME_REGEX.is_match(name)
}

/// Returns the next value of the counter `name`, starting at 1.
///
/// Each value is handed to exactly one caller no matter how many requests
/// allocate at once; which caller gets which value is unspecified. A value
/// is consumed once this returns, even if the caller never uses it. Errors
/// are not retried here.
pub async fn next_value(db: &dyn DocumentStore, name: &str) -> Result<i64, StoreError> {
    if !is_valid_counter_name(name) {
        return Err(StoreError::InvalidCounterName { name: name.to_owned() });
    }

    let value = db.increment_counter(name).await?;
    debug!("allocated `{}` = {}", name, value);

    Ok(value)
}
