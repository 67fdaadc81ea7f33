//! Parsing of `Link` pagination headers.
//!
//! ```text
//! <https://api.github.com/repositories/1/releases?page=2>; rel="next",
//! <https://api.github.com/repositories/1/releases?page=5>; rel="last"
//! ```

/// Extract the URL of the `next` relation from a `Link` header value.
///
/// # Examples
///
/// ```
/// use packdl::catalog::next_link;
///
/// let header = r#"<https://api.example.com/r?page=2>; rel="next", <https://api.example.com/r?page=3>; rel="last""#;
/// assert_eq!(next_link(header).as_deref(), Some("https://api.example.com/r?page=2"));
/// assert_eq!(next_link(r#"<https://api.example.com/r?page=1>; rel="prev""#), None);
/// ```
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let mut kv = param.splitn(2, '=');
            let key = kv.next().unwrap_or("").trim();
            let value = kv.next().unwrap_or("").trim().trim_matches('"');
            key.eq_ignore_ascii_case("rel")
                && value
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        is_next.then(|| url.to_string())
    })
}
