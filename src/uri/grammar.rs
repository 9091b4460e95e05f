//! RFC 3986 grammar productions as regular expressions.
//!
//! Each production is assembled from the sources of its sub-productions,
//! the way the ABNF in RFC 3986 §3 and Appendix A composes rules. The
//! source builders are public so callers can splice productions into their
//! own patterns. Compiled, anchored forms live in a single [`Grammar`]
//! table that is built on first use and shared for the rest of the process.
//!
//! The IPv6 literal is the one production that is generated rather than
//! transcribed: the elided forms (`::`) are produced combinatorially, one
//! sub-pattern per count of 16-bit units following the gap, so that every
//! legal elision position is accepted and a second `::` never is.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::error::RangeError;

/// `unreserved` minus the enclosing brackets, for use inside a class.
const UNRESERVED: &str = r"A-Za-z0-9\-._~";

/// `sub-delims` for use inside a class.
const SUB_DELIMS: &str = r"!$&'()*+,;=";

const PCT_ENCODED: &str = "%[0-9A-Fa-f]{2}";

const H16: &str = "[0-9A-Fa-f]{1,4}";

/// Number of 16-bit units in an IPv6 address.
const IPV6_UNITS: usize = 8;

/// Compiled regex size ceiling; the URI production with its IPv6 branch is
/// larger than the crate default allows.
const REGEX_SIZE_LIMIT: usize = 1 << 24;

// -------------------------------------------------------------------------
// Source builders
// -------------------------------------------------------------------------

/// A `pchar`-style alternation: unreserved, sub-delims, the `extra`
/// characters, or a percent-encoded octet.
///
/// `extra` is spliced into a character class and must already be escaped
/// for that context.
#[must_use]
pub fn pchar_class(extra: &str) -> String {
    format!("(?:[{UNRESERVED}{SUB_DELIMS}{extra}]|{PCT_ENCODED})")
}

/// `segment = *pchar`
#[must_use]
pub fn segment_regex() -> String {
    format!("{}*", pchar_class(":@"))
}

/// `segment-nz = 1*pchar`
#[must_use]
pub fn non_zero_segment_regex() -> String {
    format!("{}+", pchar_class(":@"))
}

/// `segment-nz-nc = 1*( unreserved / pct-encoded / sub-delims / "@" )`
#[must_use]
pub fn non_zero_segment_without_colon_regex() -> String {
    format!("{}+", pchar_class("@"))
}

/// `scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
#[must_use]
pub fn scheme_regex() -> String {
    r"[A-Za-z][A-Za-z0-9+.\-]*".to_string()
}

fn dec_octet() -> &'static str {
    "(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])"
}

/// Dotted-quad `IPv4address`.
#[must_use]
pub fn ipv4_regex() -> String {
    let octet = dec_octet();
    format!(r"{octet}\.{octet}\.{octet}\.{octet}")
}

/// `ls32 = ( h16 ":" h16 ) / IPv4address`
fn ls32() -> String {
    format!("(?:{H16}:{H16}|{})", ipv4_regex())
}

/// Exactly `units` 16-bit units, the last two of which may be written as
/// an IPv4 literal.
fn ipv6_units(units: usize) -> String {
    debug_assert!(units >= 1);
    let plain = format!("(?:{H16}:){{{}}}{H16}", units - 1);
    if units < 2 {
        return plain;
    }
    format!("(?:{plain}|(?:{H16}:){{{}}}{})", units - 2, ipv4_regex())
}

/// The elided IPv6 form with `trailing` units after the `::` and at least
/// one unit before it.
///
/// Valid counts are `1..=6`: at least one unit must precede the gap and the
/// gap must stand for at least one unit, so no more than seven are written.
///
/// # Errors
///
/// Returns `RangeError` for a count outside `1..=6`.
pub fn ipv6_shorthand_mid(trailing: usize) -> Result<String, RangeError> {
    if !(1..=6).contains(&trailing) {
        return Err(RangeError::new(format!(
            "IPv6 shorthand needs 1 to 6 trailing units, got {trailing}"
        )));
    }
    let max_extra_leading = IPV6_UNITS - 2 - trailing;
    Ok(format!(
        "{H16}(?::{H16}){{0,{max_extra_leading}}}::{}",
        ipv6_units(trailing)
    ))
}

/// Eight units written out in full.
#[must_use]
pub fn ipv6_full_regex() -> String {
    format!("(?:{H16}:){{6}}{}", ls32())
}

/// `::` followed by zero to seven units.
#[must_use]
pub fn ipv6_leading_gap_regex() -> String {
    format!(
        "::(?:{H16}(?::{H16}){{0,6}}|(?:{H16}:){{0,5}}{})?",
        ipv4_regex()
    )
}

/// One to seven units followed by `::`.
#[must_use]
pub fn ipv6_trailing_gap_regex() -> String {
    format!("{H16}(?::{H16}){{0,6}}::")
}

/// `IPv6address`: the full form, the leading-gap and trailing-gap forms,
/// and the union of every internal-gap form.
#[must_use]
pub fn ipv6_regex() -> String {
    let mut branches = vec![
        ipv6_full_regex(),
        ipv6_leading_gap_regex(),
        ipv6_trailing_gap_regex(),
    ];
    branches.extend((1..=6).filter_map(|n| ipv6_shorthand_mid(n).ok()));
    format!("(?:{})", branches.join("|"))
}

/// `IPvFuture = "v" 1*HEXDIG "." 1*( unreserved / sub-delims / ":" )`
fn ipv_future() -> String {
    format!(r"v[0-9A-Fa-f]+\.[{UNRESERVED}{SUB_DELIMS}:]+")
}

/// `reg-name = *( unreserved / pct-encoded / sub-delims )`
fn reg_name() -> String {
    format!("(?:[{UNRESERVED}{SUB_DELIMS}]|{PCT_ENCODED})*")
}

/// `host = IP-literal / IPv4address / reg-name`
#[must_use]
pub fn host_regex() -> String {
    format!(
        r"(?:\[(?:{}|{})\]|{}|{})",
        ipv6_regex(),
        ipv_future(),
        ipv4_regex(),
        reg_name()
    )
}

/// `userinfo = *( unreserved / pct-encoded / sub-delims / ":" )`
#[must_use]
pub fn user_info_regex() -> String {
    format!("(?:[{UNRESERVED}{SUB_DELIMS}:]|{PCT_ENCODED})*")
}

/// `authority = [ userinfo "@" ] host [ ":" port ]` without the `//`.
#[must_use]
pub fn authority_body_regex() -> String {
    format!("(?:{}@)?{}(?::[0-9]*)?", user_info_regex(), host_regex())
}

/// `"//" authority`
#[must_use]
pub fn authority_regex() -> String {
    format!("//{}", authority_body_regex())
}

/// `path-abempty = *( "/" segment )`
#[must_use]
pub fn path_abempty_regex() -> String {
    format!("(?:/{})*", segment_regex())
}

/// `path-absolute = "/" [ segment-nz *( "/" segment ) ]`
#[must_use]
pub fn path_absolute_regex() -> String {
    format!(
        "/(?:{}(?:/{})*)?",
        non_zero_segment_regex(),
        segment_regex()
    )
}

/// `path-noscheme = segment-nz-nc *( "/" segment )`
#[must_use]
pub fn path_noscheme_regex() -> String {
    format!(
        "{}(?:/{})*",
        non_zero_segment_without_colon_regex(),
        segment_regex()
    )
}

/// `path-rootless = segment-nz *( "/" segment )`
#[must_use]
pub fn path_rootless_regex() -> String {
    format!("{}(?:/{})*", non_zero_segment_regex(), segment_regex())
}

/// Query or fragment body: `*( pchar / "/" / "?" )`.
fn query_body() -> String {
    format!("(?:{}|[/?])*", pchar_class(":@"))
}

/// `"?" query`
#[must_use]
pub fn query_regex() -> String {
    format!(r"\?{}", query_body())
}

/// `"#" fragment`
#[must_use]
pub fn fragment_regex() -> String {
    format!("#{}", query_body())
}

/// Which path productions apply, given what precedes the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathContext {
    /// No context: any of the four path forms, or empty.
    Any,
    /// After an authority: `path-abempty`.
    AfterAuthority,
    /// After a scheme, without authority: `path-absolute / path-rootless /
    /// path-empty`.
    AfterScheme,
    /// A relative reference without authority: `path-absolute /
    /// path-noscheme / path-empty`.
    Relative,
}

/// Path production for a context.
#[must_use]
pub fn path_regex(context: PathContext) -> String {
    match context {
        PathContext::Any => format!(
            "(?:{}|{}|{}|{})",
            path_rootless_regex(),
            path_noscheme_regex(),
            path_abempty_regex(),
            path_absolute_regex()
        ),
        PathContext::AfterAuthority => path_abempty_regex(),
        PathContext::AfterScheme => format!(
            "(?:{}|{})?",
            path_absolute_regex(),
            path_rootless_regex()
        ),
        PathContext::Relative => format!(
            "(?:{}|{})?",
            path_absolute_regex(),
            path_noscheme_regex()
        ),
    }
}

/// `URI = scheme ":" hier-part [ "?" query ] [ "#" fragment ]`, with the
/// components captured by name (`scheme`, `authority`, `abempty`, `path`,
/// `query`, `fragment`).
fn uri_capturing() -> String {
    format!(
        "(?P<scheme>{}):(?://(?P<authority>{})(?P<abempty>{})|(?P<path>{}))(?:\\?(?P<query>{}))?(?:#(?P<fragment>{}))?",
        scheme_regex(),
        authority_body_regex(),
        path_abempty_regex(),
        path_regex(PathContext::AfterScheme),
        query_body(),
        query_body()
    )
}

/// `relative-ref = relative-part [ "?" query ] [ "#" fragment ]`
fn relative_ref() -> String {
    format!(
        "(?:{}{}|{})(?:{})?(?:{})?",
        authority_regex(),
        path_abempty_regex(),
        path_regex(PathContext::Relative),
        query_regex(),
        fragment_regex()
    )
}

// -------------------------------------------------------------------------
// Compiled table
// -------------------------------------------------------------------------

/// Productions addressable by name through [`segment_pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Production {
    /// `scheme`
    Scheme,
    /// Any path form.
    Path,
    /// `"//" authority`
    Authority,
    /// `"?" query`
    Query,
    /// `"#" fragment`
    Fragment,
    /// `host`
    HostName,
    /// `userinfo`
    UserInfo,
}

impl Production {
    /// Looks a production up by its grammar name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scheme" => Some(Self::Scheme),
            "path" => Some(Self::Path),
            "authority" => Some(Self::Authority),
            "query" => Some(Self::Query),
            "fragment" => Some(Self::Fragment),
            "hostName" => Some(Self::HostName),
            "userInfo" => Some(Self::UserInfo),
            _ => None,
        }
    }
}

/// Anchored, compiled URI productions.
#[derive(Debug)]
pub struct Grammar {
    pub(crate) scheme: Regex,
    pub(crate) authority: Regex,
    pub(crate) authority_body: Regex,
    pub(crate) host: Regex,
    pub(crate) user_info: Regex,
    pub(crate) ipv4: Regex,
    pub(crate) ipv6: Regex,
    pub(crate) path_any: Regex,
    pub(crate) path_after_authority: Regex,
    pub(crate) path_after_scheme: Regex,
    pub(crate) path_relative: Regex,
    pub(crate) query: Regex,
    pub(crate) fragment: Regex,
    pub(crate) query_body: Regex,
    pub(crate) segment: Regex,
    pub(crate) segment_nz: Regex,
    pub(crate) segment_nz_nc: Regex,
    pub(crate) uri: Regex,
    pub(crate) uri_reference: Regex,
}

fn anchored(source: &str) -> Regex {
    RegexBuilder::new(&format!("^(?:{source})$"))
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .unwrap_or_else(|e| panic!("BUG: invalid URI grammar production: {e}"))
}

impl Grammar {
    fn build() -> Self {
        let grammar = Self {
            scheme: anchored(&scheme_regex()),
            authority: anchored(&authority_regex()),
            authority_body: anchored(&authority_body_regex()),
            host: anchored(&host_regex()),
            user_info: anchored(&user_info_regex()),
            ipv4: anchored(&ipv4_regex()),
            ipv6: anchored(&ipv6_regex()),
            path_any: anchored(&path_regex(PathContext::Any)),
            path_after_authority: anchored(&path_regex(PathContext::AfterAuthority)),
            path_after_scheme: anchored(&path_regex(PathContext::AfterScheme)),
            path_relative: anchored(&path_regex(PathContext::Relative)),
            query: anchored(&query_regex()),
            fragment: anchored(&fragment_regex()),
            query_body: anchored(&query_body()),
            segment: anchored(&segment_regex()),
            segment_nz: anchored(&non_zero_segment_regex()),
            segment_nz_nc: anchored(&non_zero_segment_without_colon_regex()),
            uri: anchored(&uri_capturing()),
            uri_reference: anchored(&format!("{}|{}", uri_capturing(), relative_ref())),
        };
        tracing::debug!("URI grammar table built");
        grammar
    }

    /// The compiled, anchored regex for a production.
    #[must_use]
    pub fn production(&self, production: Production) -> &Regex {
        match production {
            Production::Scheme => &self.scheme,
            Production::Path => &self.path_any,
            Production::Authority => &self.authority,
            Production::Query => &self.query,
            Production::Fragment => &self.fragment,
            Production::HostName => &self.host,
            Production::UserInfo => &self.user_info,
        }
    }

    /// The compiled path production for a context.
    #[must_use]
    pub fn path(&self, context: PathContext) -> &Regex {
        match context {
            PathContext::Any => &self.path_any,
            PathContext::AfterAuthority => &self.path_after_authority,
            PathContext::AfterScheme => &self.path_after_scheme,
            PathContext::Relative => &self.path_relative,
        }
    }
}

/// The process-wide grammar table.
pub fn grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(Grammar::build)
}

/// Looks up an anchored production by name (`scheme`, `path`, `authority`,
/// `query`, `fragment`, `hostName`, `userInfo`).
#[must_use]
pub fn segment_pattern(name: &str) -> Option<&'static Regex> {
    Production::from_name(name).map(|p| grammar().production(p))
}

/// Returns `true` if `s` is an `IPv4address`.
#[must_use]
pub fn is_ipv4(s: &str) -> bool {
    grammar().ipv4.is_match(s)
}

/// Returns `true` if `s` is an `IPv6address` (without brackets).
#[must_use]
pub fn is_ipv6(s: &str) -> bool {
    grammar().ipv6.is_match(s)
}

/// Returns `true` if `s` is an absolute `URI` (scheme required).
#[must_use]
pub fn is_absolute_uri(s: &str) -> bool {
    grammar().uri.is_match(s)
}

/// Returns `true` if `s` is a `URI-reference` (absolute or relative).
#[must_use]
pub fn is_uri_reference(s: &str) -> bool {
    grammar().uri_reference.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme() {
        let re = segment_pattern("scheme").unwrap();
        assert!(re.is_match("http"));
        assert!(re.is_match("svn+ssh"));
        assert!(re.is_match("a.b-c"));
        assert!(!re.is_match("1http"));
        assert!(!re.is_match(""));
        assert!(!re.is_match("ht tp"));
    }

    #[test]
    fn test_unknown_production_name() {
        assert!(segment_pattern("port").is_none());
        assert!(segment_pattern("Scheme").is_none());
    }

    #[test]
    fn test_ipv4() {
        assert!(is_ipv4("192.0.2.1"));
        assert!(is_ipv4("255.255.255.255"));
        assert!(is_ipv4("0.0.0.0"));
        assert!(!is_ipv4("256.1.1.1"));
        assert!(!is_ipv4("01.1.1.1"));
        assert!(!is_ipv4("1.1.1"));
    }

    #[test]
    fn test_ipv6_examples() {
        for ok in [
            "::1",
            "::",
            "2001:db8::1",
            "::ffff:192.0.2.1",
            "1:2:3:4:5:6:7:8",
            "1:2:3:4:5:6:192.0.2.1",
            "1::",
            "1:2:3:4:5:6:7::",
            "1::2:3:4:5:6:7",
            "1::1.2.3.4",
            "fe80::1:2",
            "::1.2.3.4",
        ] {
            assert!(is_ipv6(ok), "{ok} should match");
        }
        for bad in [
            "1::2::3",
            ":::",
            "1:2:3:4:5:6:7:8:9",
            "1:2:3:4:5:6:7:8::",
            "1:2:3:4:5:6:7",
            "12345::",
            "1:2:3:4:5:6:7:1.2.3.4",
            "",
            ":1",
        ] {
            assert!(!is_ipv6(bad), "{bad} should not match");
        }
    }

    #[test]
    fn test_ipv6_shorthand_mid_counts() {
        assert!(ipv6_shorthand_mid(0).is_err());
        assert!(ipv6_shorthand_mid(7).is_err());
        let mid = anchored(&ipv6_shorthand_mid(3).unwrap());
        assert!(mid.is_match("1::2:3:4"));
        assert!(mid.is_match("1:2:3:4::5:6:7"));
        assert!(mid.is_match("1::ffff:1.2.3.4"));
        assert!(!mid.is_match("1::2:3"));
        assert!(!mid.is_match("1:2:3:4:5::6:7:8"));
    }

    #[test]
    fn test_host_forms() {
        let host = segment_pattern("hostName").unwrap();
        assert!(host.is_match("example.com"));
        assert!(host.is_match("192.0.2.1"));
        assert!(host.is_match("[::1]"));
        assert!(host.is_match("[v1.fe80::a+en1]"));
        assert!(host.is_match(""));
        assert!(!host.is_match("[1::2::3]"));
        assert!(!host.is_match("exa mple"));
    }

    #[test]
    fn test_authority() {
        let re = segment_pattern("authority").unwrap();
        assert!(re.is_match("//example.com"));
        assert!(re.is_match("//user:pw@example.com:8080"));
        assert!(re.is_match("//[2001:db8::7]:443"));
        assert!(!re.is_match("example.com"));
        assert!(!re.is_match("//a b"));
    }

    #[test]
    fn test_user_info() {
        let re = segment_pattern("userInfo").unwrap();
        assert!(re.is_match("user:pass"));
        assert!(re.is_match("a%20b"));
        assert!(!re.is_match("a@b"));
        assert!(!re.is_match("%zz"));
    }

    #[test]
    fn test_path_contexts() {
        let g = grammar();
        assert!(g.path(PathContext::AfterAuthority).is_match(""));
        assert!(g.path(PathContext::AfterAuthority).is_match("/a/b"));
        assert!(!g.path(PathContext::AfterAuthority).is_match("a/b"));

        assert!(g.path(PathContext::AfterScheme).is_match("isbn:0451450523"));
        assert!(g.path(PathContext::AfterScheme).is_match("/etc/hosts"));
        assert!(!g.path(PathContext::AfterScheme).is_match("//host"));

        assert!(g.path(PathContext::Relative).is_match("a/b:c"));
        assert!(!g.path(PathContext::Relative).is_match("a:b/c"));

        let any = segment_pattern("path").unwrap();
        assert!(any.is_match("a:b/c"));
        assert!(any.is_match("/a//b"));
        assert!(!any.is_match("a b"));
    }

    #[test]
    fn test_query_and_fragment_are_delimited() {
        let query = segment_pattern("query").unwrap();
        assert!(query.is_match("?a=1&b=2"));
        assert!(query.is_match("?"));
        assert!(!query.is_match("a=1"));
        let fragment = segment_pattern("fragment").unwrap();
        assert!(fragment.is_match("#top/x?y"));
        assert!(!fragment.is_match("#a#b"));
    }

    #[test]
    fn test_segment_builders() {
        let g = grammar();
        assert!(g.segment.is_match(""));
        assert!(g.segment.is_match("a:b@c"));
        assert!(!g.segment_nz.is_match(""));
        assert!(g.segment_nz.is_match("a:b"));
        assert!(!g.segment_nz_nc.is_match("a:b"));
        assert!(g.segment_nz_nc.is_match("a@b"));
        assert!(!g.segment.is_match("a/b"));
    }

    #[test]
    fn test_absolute_and_reference() {
        assert!(is_absolute_uri("http://example.com/a?b#c"));
        assert!(is_absolute_uri("urn:isbn:0451450523"));
        assert!(is_absolute_uri("mailto:someone@example.com"));
        assert!(is_absolute_uri("file:///etc/hosts"));
        assert!(!is_absolute_uri("/relative/path"));
        assert!(!is_absolute_uri("http://exa mple.com"));

        assert!(is_uri_reference("../up/one"));
        assert!(is_uri_reference("//cdn.example.com/x.js"));
        assert!(is_uri_reference("#frag"));
        assert!(is_uri_reference(""));
        assert!(!is_uri_reference("a b"));
    }
}
