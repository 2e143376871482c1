//! Conversion between `url::Url` (used for keys and path manipulation) and
//! the LSP `Uri` type carried by results.

use std::str::FromStr;

use tower_lsp_server::ls_types::Uri;
use url::Url;

pub fn url_to_uri(url: &Url) -> Option<Uri> {
    Uri::from_str(url.as_str()).ok()
}

pub fn uri_to_url(uri: &Uri) -> Option<Url> {
    Url::parse(uri.as_str()).ok()
}
