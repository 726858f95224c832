// Candidate address generation from name-based patterns
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::types::EmailCandidate;

/// Lowercase and keep only ascii alphanumerics. "O'Brien" becomes "obrien".
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Lowercase, strip scheme / www prefix / path. "https://www.Acme.com/about"
/// becomes "acme.com".
pub fn normalize_domain(domain: &str) -> String {
    let mut d = domain.trim().to_lowercase();
    for prefix in ["https://", "http://"] {
        if let Some(rest) = d.strip_prefix(prefix) {
            d = rest.to_string();
        }
    }
    if let Some(rest) = d.strip_prefix("www.") {
        d = rest.to_string();
    }
    match d.split('/').next() {
        Some(host) => host.to_string(),
        None => d,
    }
}

/// Stable fingerprint of a normalized (first, last, domain) triple, used to
/// key prior-search activity lookups.
pub fn search_fingerprint(first_name: &str, last_name: &str, domain: &str) -> String {
    let key = format!(
        "{}|{}|{}",
        normalize_name(first_name),
        normalize_name(last_name),
        normalize_domain(domain)
    );
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate up to `count` unique candidate addresses in fixed priority order.
/// The first three patterns are always `first.last`, `firstlast`, `first`;
/// initials, reversed order and numeric suffixes fill out the rest. The same
/// inputs always produce the same ordered list.
pub fn generate_candidates(
    first_name: &str,
    last_name: &str,
    domain: &str,
    count: usize,
) -> Vec<EmailCandidate> {
    let first = normalize_name(first_name);
    let last = normalize_name(last_name);
    let domain = normalize_domain(domain);

    if first.is_empty() || domain.is_empty() || count == 0 {
        return Vec::new();
    }

    let fi: String = first.chars().take(1).collect();
    let li: String = last.chars().take(1).collect();

    let mut locals: Vec<String> = if last.is_empty() {
        vec![first.clone(), fi.clone()]
    } else {
        vec![
            format!("{}.{}", first, last),
            format!("{}{}", first, last),
            first.clone(),
            last.clone(),
            format!("{}{}", fi, last),
            format!("{}{}", first, li),
            format!("{}.{}", fi, last),
            format!("{}.{}", first, li),
            format!("{}.{}", last, first),
            format!("{}{}", last, first),
            format!("{}{}", last, fi),
            format!("{}{}", fi, li),
            format!("{}_{}", first, last),
            format!("{}-{}", first, last),
        ]
    };

    // Numeric suffixes on the primary pattern until the request is satisfied.
    let primary = if last.is_empty() {
        first.clone()
    } else {
        format!("{}.{}", first, last)
    };
    for n in 1..=count {
        locals.push(format!("{}{}", primary, n));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(count);
    for local in locals {
        if out.len() >= count {
            break;
        }
        if local.is_empty() {
            continue;
        }
        let email = format!("{}@{}", local, domain);
        if seen.insert(email.clone()) {
            let priority = out.len();
            out.push(EmailCandidate { email, priority });
        }
    }
    out
}
