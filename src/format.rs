//! `format` keyword validators.
//!
//! Table-driven, grounded on the teacher's `keywords/format.rs`: each known
//! format name maps to a checker function; syntactic formats use a
//! precompiled `once_cell::sync::Lazy` regex, a handful delegate to a real
//! parser (`url`, `idna`, `email_address`, `uuid`). Unknown format names are
//! accepted unconditionally, per §4.5.
use once_cell::sync::Lazy;
use regex::Regex;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in format regex must compile")
}

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| regex(r"^\d{4}-\d{2}-\d{2}$"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    regex(r"^\d{2}:\d{2}:\d{2}(\.\d+)?(([Zz])|([+-]\d{2}:\d{2}))$")
});
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    regex(r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d+)?(([Zz])|([+-]\d{2}:\d{2}))$")
});
static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    regex(r"^P(\d+W|(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+S)?)?)$")
});
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    regex(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
});
static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    regex(r"^(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}$")
});
static IPV6_RE: Lazy<Regex> = Lazy::new(|| {
    regex(r"^(([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,7}:|([0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,5}(:[0-9a-fA-F]{1,4}){1,2}|([0-9a-fA-F]{1,4}:){1,4}(:[0-9a-fA-F]{1,4}){1,3}|([0-9a-fA-F]{1,4}:){1,3}(:[0-9a-fA-F]{1,4}){1,4}|([0-9a-fA-F]{1,4}:){1,2}(:[0-9a-fA-F]{1,4}){1,5}|[0-9a-fA-F]{1,4}:((:[0-9a-fA-F]{1,4}){1,6})|:((:[0-9a-fA-F]{1,4}){1,7}|:))$")
});
static URI_TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    regex(r"^([^{}]|\{[+#./;?&=,!@|]?[A-Za-z0-9_]+(:[1-9]\d{0,3}|\*)?(,[A-Za-z0-9_]+(:[1-9]\d{0,3}|\*)?)*\})*$")
});
static RELATIVE_JSON_POINTER_RE: Lazy<Regex> =
    Lazy::new(|| regex(r"^(0|[1-9][0-9]*)(#|/(/|[^/~]|~0|~1)*)?$"));
static JSON_POINTER_RE: Lazy<Regex> = Lazy::new(|| regex(r"^(/(/|[^/~]|~0|~1)*)*$"));

pub(crate) fn is_known_format(name: &str) -> bool {
    matches!(
        name,
        "date-time"
            | "date"
            | "time"
            | "duration"
            | "email"
            | "uuid"
            | "hostname"
            | "ipv4"
            | "ipv6"
            | "uri-template"
            | "relative-json-pointer"
            | "json-pointer"
            | "uri"
            | "uri-reference"
            | "idn-hostname"
    )
}

/// Check `value` against the named format. Returns `true` for an unknown
/// format name (accept unconditionally, per §4.5).
pub(crate) fn check(name: &str, value: &str) -> bool {
    match name {
        "date-time" => DATE_TIME_RE.is_match(value),
        "date" => DATE_RE.is_match(value) && is_calendar_valid(value),
        "time" => TIME_RE.is_match(value),
        "duration" => value != "P" && DURATION_RE.is_match(value),
        "email" => email_address::EmailAddress::is_valid(value),
        "uuid" => uuid::Uuid::parse_str(value).is_ok(),
        "hostname" => value.len() <= 253 && HOSTNAME_RE.is_match(value),
        "ipv4" => IPV4_RE.is_match(value),
        "ipv6" => value.parse::<std::net::Ipv6Addr>().is_ok(),
        "uri-template" => URI_TEMPLATE_RE.is_match(value),
        "relative-json-pointer" => RELATIVE_JSON_POINTER_RE.is_match(value),
        "json-pointer" => JSON_POINTER_RE.is_match(value),
        "uri" => url::Url::parse(value).is_ok(),
        "uri-reference" => check_uri_reference(value),
        "idn-hostname" => idna::domain_to_ascii(value).is_ok(),
        _ => true,
    }
}

fn check_uri_reference(value: &str) -> bool {
    if url::Url::parse(value).is_ok() {
        return true;
    }
    // Not an absolute URI on its own; accept it as a relative-reference by
    // resolving it against an arbitrary absolute base, as the teacher does.
    url::Url::parse("http://__default__/")
        .and_then(|base| base.join(value))
        .is_ok()
}

fn is_calendar_valid(value: &str) -> bool {
    let mut parts = value.splitn(3, '-');
    let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let (Ok(month), Ok(day)) = (m.parse::<u32>(), d.parse::<u32>()) else {
        return false;
    };
    let Ok(year) = y.parse::<i32>() else {
        return false;
    };
    if !(1..=12).contains(&month) {
        return false;
    }
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let max_day = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => 31,
    };
    (1..=max_day).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("date-time", "2020-01-02T03:04:05Z", true)]
    #[test_case("date-time", "not-a-date", false)]
    #[test_case("date", "2020-02-29", true)]
    #[test_case("date", "2021-02-29", false)]
    #[test_case("time", "03:04:05+02:00", true)]
    #[test_case("email", "a@example.com", true)]
    #[test_case("email", "not-an-email", false)]
    #[test_case("uuid", "550e8400-e29b-41d4-a716-446655440000", true)]
    #[test_case("uuid", "not-a-uuid", false)]
    #[test_case("ipv4", "192.168.0.1", true)]
    #[test_case("ipv4", "999.0.0.1", false)]
    #[test_case("ipv6", "::1", true)]
    #[test_case("hostname", "example.com", true)]
    #[test_case("uri", "https://example.com/a", true)]
    #[test_case("uri", "/just/a/path", false)]
    #[test_case("uri-reference", "/just/a/path", true)]
    #[test_case("json-pointer", "/a/b/0", true)]
    #[test_case("json-pointer", "a/b", false)]
    #[test_case("unknown-format-xyz", "anything", true)]
    fn checks(name: &str, value: &str, expected: bool) {
        assert_eq!(check(name, value), expected);
    }
}
