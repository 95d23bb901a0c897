use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9\-_.]").unwrap();
}

/// Last segment of the URL path, exactly as written in the URL.
pub fn last_segment(url: &Url) -> Option<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
}

/// Name of the file a URL is saved to. Distinct URLs may map to the same name.
pub fn resolve_file_name(url: &Url) -> Option<String> {
    last_segment(url).map(|segment| sanitize(&unquote_plus(segment)))
}

fn unquote_plus(segment: &str) -> String {
    percent_decode_str(&segment.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

pub fn sanitize(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}
