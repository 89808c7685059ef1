//! Repair of outbound ad links.
//!
//! The scraper upstream occasionally glues its base domain onto links that
//! already carry one. The repairs below encode those known malformations for
//! a single tracked domain; they are heuristics, not a URL grammar, and a
//! link that matches none of them is returned untouched.

use url::Url;

/// Domain whose malformed links are repaired.
pub const TRACKED_DOMAIN: &str = "bazos.cz";

/// Link shown for ads that carry none.
pub const MISSING_LINK: &str = "#";

/// Known malformations, applied in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRepair {
    /// `bazos.czbazos.cz/x` or `www.bazos.czauto.bazos.cz/x`: keep the last
    /// domain occurrence plus the subdomain label directly before it.
    DuplicatedDomain,
    /// `bazos.cz/x` or `//bazos.cz/x`: prefix `https://`.
    MissingScheme,
    /// `https://bazos.czhttps://x`: the inner scheme becomes a path separator.
    SchemeAfterDomain,
}

pub const REPAIRS: [LinkRepair; 3] = [
    LinkRepair::DuplicatedDomain,
    LinkRepair::MissingScheme,
    LinkRepair::SchemeAfterDomain,
];

impl LinkRepair {
    /// Returns the repaired link, or `None` when this malformation is absent.
    pub fn apply(self, link: &str, domain: &str) -> Option<String> {
        match self {
            LinkRepair::DuplicatedDomain => repair_duplicated_domain(link, domain),
            LinkRepair::MissingScheme => repair_missing_scheme(link),
            LinkRepair::SchemeAfterDomain => repair_scheme_after_domain(link, domain),
        }
    }
}

/// Normalizes a link for the tracked domain.
pub fn normalize_ad_link(raw: &str) -> String {
    normalize_link_for_domain(raw, TRACKED_DOMAIN)
}

pub fn normalize_link_for_domain(raw: &str, domain: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == MISSING_LINK {
        return MISSING_LINK.to_string();
    }

    let mut link = trimmed.to_string();
    let mut repaired = false;
    for repair in REPAIRS {
        if let Some(next) = repair.apply(&link, domain) {
            link = next;
            repaired = true;
        }
    }

    if repaired && Url::parse(&link).is_err() {
        return raw.to_string();
    }
    link
}

fn repair_duplicated_domain(link: &str, domain: &str) -> Option<String> {
    if link.matches(domain).count() < 2 {
        return None;
    }
    let last = link.rfind(domain)?;
    let start = match link[..last].strip_suffix('.') {
        Some(prefix) => {
            let label_len = prefix
                .bytes()
                .rev()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
                .count();
            let mut label_start = prefix.len() - label_len;
            // A label glued onto the previous domain copy starts after it.
            if let Some(previous) = prefix.rfind(domain) {
                label_start = label_start.max(previous + domain.len());
            }
            if label_start < prefix.len() {
                label_start
            } else {
                last
            }
        }
        None => last,
    };
    Some(format!("https://{}", &link[start..]))
}

fn repair_missing_scheme(link: &str) -> Option<String> {
    if link.starts_with("http://") || link.starts_with("https://") {
        return None;
    }
    let rest = link.strip_prefix("//").unwrap_or(link);
    Some(format!("https://{rest}"))
}

fn repair_scheme_after_domain(link: &str, domain: &str) -> Option<String> {
    for (index, _) in link.match_indices(domain) {
        let after = index + domain.len();
        let tail = &link[after..];
        let scheme_len = if tail.starts_with("https://") {
            "https://".len()
        } else if tail.starts_with("http://") {
            "http://".len()
        } else {
            continue;
        };
        return Some(format!("{}/{}", &link[..after], &tail[scheme_len..]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicated_domain_keeps_last_occurrence() {
        assert_eq!(
            normalize_ad_link("bazos.czbazos.cz/inzerat/1"),
            "https://bazos.cz/inzerat/1"
        );
    }

    #[test]
    fn duplicated_domain_preserves_subdomain() {
        assert_eq!(
            normalize_ad_link("https://www.bazos.czpc.bazos.cz/inzerat/7/x.php"),
            "https://pc.bazos.cz/inzerat/7/x.php"
        );
    }

    #[test]
    fn missing_scheme_is_added() {
        assert_eq!(
            normalize_ad_link("pc.bazos.cz/inzerat/2"),
            "https://pc.bazos.cz/inzerat/2"
        );
        assert_eq!(
            normalize_ad_link("//bazos.cz/inzerat/3"),
            "https://bazos.cz/inzerat/3"
        );
    }

    #[test]
    fn scheme_inside_path_becomes_separator() {
        assert_eq!(
            normalize_ad_link("https://auto.bazos.czhttps://inzerat/4"),
            "https://auto.bazos.cz/inzerat/4"
        );
    }

    #[test]
    fn well_formed_and_unrepairable_links_pass_through() {
        assert_eq!(
            normalize_ad_link("https://bazos.cz/inzerat/5"),
            "https://bazos.cz/inzerat/5"
        );
        assert_eq!(normalize_ad_link("not a link"), "not a link");
        assert_eq!(normalize_ad_link(""), "#");
        assert_eq!(normalize_ad_link("#"), "#");
    }

    #[test]
    fn repairs_are_domain_parameterised() {
        assert_eq!(
            normalize_link_for_domain("example.orgexample.org/a", "example.org"),
            "https://example.org/a"
        );
    }
}
