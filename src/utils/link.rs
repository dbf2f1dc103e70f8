// src/utils/link.rs

use url::Url;

pub const INVALID_ONSHAPE_LINK: &str = "Masukkan link dokumen Onshape yang valid.";

const ONSHAPE_DOMAIN: &str = "onshape.com";

/// Accepts http(s) URLs on `onshape.com` or one of its subdomains
/// (`cad.onshape.com`, ...). Returns the trimmed link.
pub fn validate_onshape_link(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let on_domain = host == ONSHAPE_DOMAIN || host.ends_with(&format!(".{}", ONSHAPE_DOMAIN));
    on_domain.then(|| trimmed.to_string())
}
