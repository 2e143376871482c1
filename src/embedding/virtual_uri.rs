//! Virtual document URIs for embedded regions.
//!
//! For hierarchical URIs (file://, https://, ...) the virtual document sits
//! next to its host so the engine resolves relative imports and project
//! configuration exactly as it would for the host:
//! `file:///app/src/App.vue` + region `script` + `typescript` →
//! `file:///app/src/App.vue.mosaic-script.ts`.
//!
//! Cannot-be-a-base URIs (untitled:, data:) fall back to
//! `mosaic:///virtual/{percent-encoded host}/{filename}`.

use url::Url;

/// Marker between the host filename and the region id.
const VIRTUAL_MARKER: &str = ".mosaic-";

/// Scheme of the fallback form.
const FALLBACK_SCHEME: &str = "mosaic";

/// Build the URI of the virtual document for one region of `host_uri`.
///
/// `region_id` is percent-encoded by the url crate when it is pushed as a path
/// segment, so any identifier the extractor chooses yields a valid URI.
pub fn virtual_document_uri(host_uri: &Url, language_id: &str, region_id: &str) -> Url {
    debug_assert!(!region_id.is_empty(), "region_id must not be empty");

    let extension = language_to_extension(language_id);
    let host_file = host_uri
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(|name| percent_encoding::percent_decode_str(name).decode_utf8_lossy())
        .unwrap_or(std::borrow::Cow::Borrowed("document"));
    let file_name = format!("{host_file}{VIRTUAL_MARKER}{region_id}.{extension}");

    let mut url = host_uri.clone();
    url.set_query(None);
    url.set_fragment(None);
    let modified = url
        .path_segments_mut()
        .map(|mut segments| {
            segments.pop();
            segments.push(&file_name);
        })
        .is_ok();
    if modified {
        return url;
    }

    let encoded_host =
        percent_encoding::utf8_percent_encode(host_uri.as_str(), percent_encoding::NON_ALPHANUMERIC);
    let file_name = format!("document{VIRTUAL_MARKER}{region_id}.{extension}");
    match Url::parse(&format!("{FALLBACK_SCHEME}:///virtual/{encoded_host}")) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(&file_name);
            }
            url
        }
        // Unreachable in practice: the prefix is fixed and the host is fully encoded.
        Err(_) => host_uri.clone(),
    }
}

/// Check whether a URI has the shape of a virtual document URI.
///
/// Shape only: whether the document is currently registered is the region
/// registry's concern.
pub fn is_virtual_uri(uri: &Url) -> bool {
    if uri.scheme() == FALLBACK_SCHEME {
        return true;
    }
    let Some(file_name) = uri.path_segments().and_then(|mut s| s.next_back()) else {
        return false;
    };
    file_name
        .rfind(VIRTUAL_MARKER)
        .and_then(|index| file_name.get(index + VIRTUAL_MARKER.len()..))
        .and_then(|rest| rest.rsplit_once('.'))
        .is_some_and(|(region, ext)| !region.is_empty() && !ext.is_empty())
}

/// Map language id to file extension.
///
/// Engines commonly pick the dialect from the extension (`.ts` vs `.tsx`), so
/// unknown languages fall back to `txt` rather than guessing.
pub fn language_to_extension(language_id: &str) -> &'static str {
    match language_id {
        "typescript" | "ts" => "ts",
        "typescriptreact" | "tsx" => "tsx",
        "javascript" | "js" => "js",
        "javascriptreact" | "jsx" => "jsx",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "sass" => "sass",
        "stylus" => "styl",
        "postcss" => "pcss",
        "html" => "html",
        "pug" | "jade" => "pug",
        "vue" => "vue",
        "json" => "json",
        "jsonc" => "jsonc",
        "json5" => "json5",
        "yaml" => "yaml",
        "toml" => "toml",
        "markdown" | "md" => "md",
        "graphql" => "graphql",
        "python" => "py",
        "lua" => "lua",
        "rust" => "rs",
        "sql" => "sql",
        _ => "txt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn virtual_document_lives_next_to_host() {
        let host = Url::parse("file:///project/src/App.vue").unwrap();
        let uri = virtual_document_uri(&host, "typescript", "script");
        assert_eq!(uri.as_str(), "file:///project/src/App.vue.mosaic-script.ts");
    }

    #[test]
    fn query_and_fragment_are_not_carried_over() {
        let host = Url::parse("https://example.com/a/App.vue?raw#top").unwrap();
        let uri = virtual_document_uri(&host, "css", "style_0");
        assert_eq!(uri.as_str(), "https://example.com/a/App.vue.mosaic-style_0.css");
    }

    #[test]
    fn region_id_is_percent_encoded() {
        let host = Url::parse("file:///p/App.vue").unwrap();
        let uri = virtual_document_uri(&host, "css", "style 1");
        assert_eq!(uri.as_str(), "file:///p/App.vue.mosaic-style%201.css");
    }

    #[test]
    fn encoded_host_file_name_is_not_double_encoded() {
        let host = Url::parse("file:///p/My%20App.vue").unwrap();
        let uri = virtual_document_uri(&host, "typescript", "script");
        assert_eq!(uri.as_str(), "file:///p/My%20App.vue.mosaic-script.ts");
    }

    #[test]
    fn cannot_be_a_base_host_uses_fallback_scheme() {
        let host = Url::parse("untitled:Untitled-1").unwrap();
        let uri = virtual_document_uri(&host, "typescript", "script");

        assert_eq!(uri.scheme(), "mosaic");
        assert!(
            uri.as_str()
                .starts_with("mosaic:///virtual/untitled%3AUntitled%2D1/"),
            "unexpected fallback uri: {uri}"
        );
        assert!(uri.as_str().ends_with(".mosaic-script.ts"));
        assert!(is_virtual_uri(&uri));
    }

    #[test]
    fn distinct_regions_get_distinct_uris() {
        let host = Url::parse("file:///p/App.vue").unwrap();
        assert_ne!(
            virtual_document_uri(&host, "typescript", "script"),
            virtual_document_uri(&host, "typescript", "scriptSetup")
        );
    }

    #[rstest]
    #[case::virtual_file("file:///p/App.vue.mosaic-script.ts", true)]
    #[case::plain_file("file:///p/App.vue", false)]
    #[case::marker_without_extension("file:///p/App.vue.mosaic-script", false)]
    #[case::marker_in_directory("file:///p/x.mosaic-a.ts/App.vue", false)]
    #[case::fallback_scheme("mosaic:///virtual/x/document.mosaic-a.ts", true)]
    fn recognizes_virtual_uris(#[case] uri: &str, #[case] expected: bool) {
        assert_eq!(is_virtual_uri(&Url::parse(uri).unwrap()), expected);
    }

    #[test]
    fn unknown_language_falls_back_to_txt() {
        assert_eq!(language_to_extension("brainfuck"), "txt");
        assert_eq!(language_to_extension("typescript"), "ts");
    }
}
