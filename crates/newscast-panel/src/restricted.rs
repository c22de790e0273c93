use url::Url;

/// Whether commentary generation is refused on `page_url`.
///
/// Only plain web pages qualify: anything that is not `http`/`https` (browser
/// internals, extension pages, local files) is restricted, as is any URL
/// under one of `prefixes`.
pub fn is_restricted(page_url: &str, prefixes: &[String]) -> bool {
    let Ok(url) = Url::parse(page_url) else {
        return true;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return true;
    }

    prefixes
        .iter()
        .any(|prefix| url.as_str().starts_with(prefix.as_str()))
}
