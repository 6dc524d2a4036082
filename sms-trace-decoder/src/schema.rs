//! Key normalization for tshark layer trees
//!
//! tshark names some subtree keys after their display text, which changes
//! with capitalization, punctuation and embedded values between versions
//! (`TP-Destination-Address - (79001234567)`, `Protocol Data`, ...). Before a
//! layer is read, its keys go through a small `(prefix -> canonical key)`
//! table so the layer decoders only ever see one spelling.

use serde_json::{Map, Value};

/// One prefix rewrite rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRewrite {
    /// Prefix matched against the folded key
    pub prefix: &'static str,
    /// Key the matching entry is stored under
    pub canonical: &'static str,
}

/// Canonical key of the SMS TP-Destination-Address subtree
pub const TP_DESTINATION_ADDRESS: &str = "tp-destination-address";
/// Canonical key of the SMS TP-Originating-Address subtree
pub const TP_ORIGINATING_ADDRESS: &str = "tp-originating-address";
/// Canonical key of the M3UA protocol data subtree
pub const PROTOCOL_DATA: &str = "protocol-data";

/// Rewrites applied to the `gsm_sms` layer
pub const SMS_TRANSPORT_REWRITES: &[KeyRewrite] = &[
    KeyRewrite { prefix: "tp-destination-address", canonical: TP_DESTINATION_ADDRESS },
    KeyRewrite { prefix: "tp-originating-address", canonical: TP_ORIGINATING_ADDRESS },
];

/// Rewrites applied to the `m3ua` layer
pub const ROUTING_REWRITES: &[KeyRewrite] = &[
    KeyRewrite { prefix: "protocol-data", canonical: PROTOCOL_DATA },
];

/// Fold a key to lowercase with `_` and spaces turned into `-`
pub fn fold_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Return a copy of `tree` with its top-level keys rewritten
///
/// Keys that match no rule are kept verbatim. When two keys fold onto the
/// same canonical key the first one (in map order) wins.
pub fn normalize_keys(tree: &Map<String, Value>, rewrites: &[KeyRewrite]) -> Map<String, Value> {
    let mut normalized = Map::with_capacity(tree.len());

    for (key, value) in tree {
        let folded = fold_key(key);
        let rule = rewrites.iter().find(|rule| folded.starts_with(rule.prefix));

        match rule {
            Some(rule) if normalized.contains_key(rule.canonical) => {
                log::trace!("Ignoring duplicate key {:?} for {:?}", key, rule.canonical);
            }
            Some(rule) => {
                log::trace!("Rewriting key {:?} -> {:?}", key, rule.canonical);
                normalized.insert(rule.canonical.to_string(), value.clone());
            }
            None => {
                normalized.insert(key.clone(), value.clone());
            }
        }
    }

    normalized
}
