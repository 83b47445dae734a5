//! Request correlation ids.

/// Header carrying the correlation id in both directions.
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

const PREFIX: &str = "cor_";
const RANDOM_LEN: usize = 20;

/// Use the caller's id when it sent a non-blank one, otherwise mint
/// `cor_` followed by 20 lowercase alphanumerics.
pub fn correlation_id(incoming: Option<&str>) -> String {
    match incoming.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => new_correlation_id(),
    }
}

pub fn new_correlation_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    format!("{PREFIX}{}", &simple[..RANDOM_LEN])
}
