//! Aliyun ROA-style request signing
//!
//! The ACR API authenticates with an access key pair: the request line and
//! the `x-acs-*` headers are folded into a canonical string which is signed
//! with HMAC-SHA1 and sent as `Authorization: acs <key id>:<signature>`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::BTreeMap;

type HmacSha1 = Hmac<Sha1>;

/// Builds the canonical string covered by the signature.
///
/// Headers must contain every `x-acs-*` header of the request; the map is
/// ordered so canonicalization is stable. Query parameters are sorted by key
/// and appended to the path.
pub fn string_to_sign(
    method: &str,
    path: &str,
    query: &[(String, String)],
    headers: &BTreeMap<String, String>,
    accept: &str,
    date: &str,
) -> String {
    let mut canonical_headers = String::new();

    for (key, value) in headers {
        if key.starts_with("x-acs-") {
            canonical_headers.push_str(&format!("{}:{}\n", key, value));
        }
    }

    let mut pairs: Vec<&(String, String)> = query.iter().collect();
    pairs.sort();

    let canonical_resource = if pairs.is_empty() {
        path.to_string()
    } else {
        let joined: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}?{}", path, joined.join("&"))
    };

    // VERB \n Accept \n Content-MD5 \n Content-Type \n Date \n headers resource
    format!(
        "{}\n{}\n\n\n{}\n{}{}",
        method, accept, date, canonical_headers, canonical_resource
    )
}

/// Signs the canonical string with the access key secret.
pub fn sign(secret: &str, string_to_sign: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
