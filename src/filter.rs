// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Filter matching (component C4).

use serde::{Deserialize, Serialize};

use crate::event::{Event, Kind};

/// A declarative selector over events.
///
/// Array fields are "empty means no constraint" — both an absent field and
/// an explicitly empty array behave identically (serde's `default` handles
/// the absent case, and an empty `Vec` is the identity for `validate_*`
/// below either way).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    /// Event id exact strings or hex prefixes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    /// Author pubkey exact strings or hex prefixes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// Event kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<u64>,
    /// Referenced event ids (`e` tags).
    #[serde(rename = "#e", default, skip_serializing_if = "Vec::is_empty")]
    pub e: Vec<String>,
    /// Referenced pubkeys (`p` tags).
    #[serde(rename = "#p", default, skip_serializing_if = "Vec::is_empty")]
    pub p: Vec<String>,
    /// Exclusive lower bound on `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    /// Exclusive upper bound on `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    /// Cap on historical results for this filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

fn validate_scalar_prefix(candidates: &[String], subject: &str) -> bool {
    candidates.is_empty() || candidates.iter().any(|c| subject.starts_with(c.as_str()))
}

fn validate_scalar_exact<T: PartialEq>(candidates: &[T], subject: &T) -> bool {
    candidates.is_empty() || candidates.contains(subject)
}

fn validate_intersect<'a>(candidates: &[String], subjects: impl Iterator<Item = &'a str>) -> bool {
    if candidates.is_empty() {
        return true;
    }
    let subjects: Vec<&str> = subjects.collect();
    candidates.iter().any(|c| subjects.contains(&c.as_str()))
}

impl Filter {
    /// Whether `event` satisfies every constraint of this filter (§4.4).
    pub fn matches(&self, event: &Event) -> bool {
        validate_scalar_prefix(&self.ids, &event.id().to_hex())
            && validate_scalar_prefix(&self.authors, &event.pubkey().to_hex())
            && validate_scalar_exact(&self.kinds, &event.kind().as_u64())
            && validate_intersect(&self.e, event.referenced_event_ids())
            && validate_intersect(&self.p, event.referenced_pubkeys())
            && self.since.is_none_or(|since| event.created_at() > since)
            && self.until.is_none_or(|until| event.created_at() < until)
    }
}

/// Whether any of `filters` matches `event` (REQ's OR-across-filters
/// semantics, §4.7).
pub fn matches_any(filters: &[Filter], event: &Event) -> bool {
    filters.iter().any(|f| f.matches(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical;
    use crate::event::Kind as EvKind;
    use crate::keys::Keys;
    use serde_json::json;

    fn make_event(kind: u64, tags: Vec<Vec<String>>, created_at: u64) -> Event {
        let keys = Keys::generate();
        let pubkey_hex = keys.public_key().to_hex();
        let k = EvKind::new(kind);
        let id_bytes = canonical::compute_id(&pubkey_hex, created_at, k, &tags, "c");
        let sig = keys.sign_schnorr(&id_bytes);
        let value = json!({
            "id": hex::encode(id_bytes),
            "pubkey": pubkey_hex,
            "created_at": created_at,
            "kind": kind,
            "tags": tags,
            "content": "c",
            "sig": sig.to_hex(),
        });
        Event::parse(&value).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let event = make_event(1, vec![], 100);
        assert!(Filter::default().matches(&event));
    }

    #[test]
    fn kinds_filter() {
        let event = make_event(1, vec![], 100);
        let mut f = Filter::default();
        f.kinds = vec![0, 3];
        assert!(!f.matches(&event));
        f.kinds = vec![1];
        assert!(f.matches(&event));
    }

    #[test]
    fn since_until_are_exclusive() {
        let event = make_event(1, vec![], 100);
        let mut f = Filter::default();
        f.since = Some(100);
        assert!(!f.matches(&event), "since must be strictly less than created_at");
        f.since = Some(99);
        assert!(f.matches(&event));

        let mut f = Filter::default();
        f.until = Some(100);
        assert!(!f.matches(&event), "until must be strictly greater than created_at");
        f.until = Some(101);
        assert!(f.matches(&event));
    }

    #[test]
    fn e_tag_intersection() {
        let event = make_event(1, vec![vec!["e".into(), "deadbeef".into()]], 100);
        let mut f = Filter::default();
        f.e = vec!["cafe".into()];
        assert!(!f.matches(&event));
        f.e = vec!["deadbeef".into()];
        assert!(f.matches(&event));
    }

    #[test]
    fn widening_never_reduces_matches() {
        let event = make_event(1, vec![], 100);
        let narrow = Filter {
            kinds: vec![1],
            since: Some(50),
            ..Default::default()
        };
        let wide = Filter::default();
        assert!(narrow.matches(&event));
        assert!(wide.matches(&event));
    }

    #[test]
    fn id_prefix_matches() {
        let event = make_event(1, vec![], 100);
        let full = event.id().to_hex();
        let prefix = full[..8].to_string();
        let mut f = Filter::default();
        f.ids = vec![prefix];
        assert!(f.matches(&event));
    }
}
