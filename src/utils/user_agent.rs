//! Coarse user-agent classification for visit events.

use woothee::parser::Parser;

/// Parsed user-agent fields: `(browser, os, device_category)`.
pub type UaFields = (Option<String>, Option<String>, Option<String>);

/// Classifies a User-Agent string into coarse browser/OS/device categories.
///
/// Unknown or empty values come back as `None`; an unparseable string
/// yields all-`None` rather than an error, since classification is
/// best-effort enrichment.
pub fn parse_user_agent(ua: Option<&str>) -> UaFields {
    let ua = match ua {
        Some(s) if !s.is_empty() => s,
        _ => return (None, None, None),
    };

    let parser = Parser::new();
    match parser.parse(ua) {
        Some(result) => {
            let browser = if result.name.is_empty() || result.name == "UNKNOWN" {
                None
            } else {
                Some(result.name.to_owned())
            };

            let os = if result.os.is_empty() || result.os == "UNKNOWN" {
                None
            } else {
                Some(result.os.to_owned())
            };

            let device = if result.category.is_empty() || result.category == "UNKNOWN" {
                None
            } else {
                Some(result.category.to_owned())
            };

            (browser, os, device)
        }
        None => (None, None, None),
    }
}
