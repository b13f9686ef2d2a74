//! Listing-page address construction
//!
//! Pure, deterministic mapping from (target, page, options) to a URL.
//! Page 1 is the canonical unparameterized address; absent options emit
//! no query component at all.

use url::Url;

/// Relative date window accepted by the listing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Last30Days,
    Last3Months,
    Last6Months,
    Last12Months,
}

impl DateWindow {
    /// Query-string token for this window.
    pub fn as_query_value(self) -> &'static str {
        match self {
            DateWindow::Last30Days => "last30days",
            DateWindow::Last3Months => "last3months",
            DateWindow::Last6Months => "last6months",
            DateWindow::Last12Months => "last12months",
        }
    }
}

/// Immutable filter option set threaded through URL construction.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Star ratings to include; each selected value emits its own
    /// `stars` parameter, in ascending order.
    pub stars: Vec<u8>,
    pub date_window: Option<DateWindow>,
    pub search: Option<String>,
    /// Language filter; the service expects an explicit value, so this
    /// always appears ("all" by default).
    pub language: String,
    pub verified_only: bool,
    pub replies_only: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            stars: Vec::new(),
            date_window: None,
            search: None,
            language: "all".to_string(),
            verified_only: false,
            replies_only: false,
        }
    }
}

/// Build the listing address for one page of a target's reviews.
///
/// `base` is the service root (e.g. `https://www.trustpilot.com/review`);
/// `page` is 1-based and omitted from the query when 1.
pub fn build_listing_url(base: &str, target: &str, page: u32, options: &ListingOptions) -> Url {
    // The base address is validated at configuration load; the target is
    // appended as a path segment, percent-encoded by the parser if needed
    let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), target))
        .expect("validated base address plus path segment must parse");

    {
        let mut query = url.query_pairs_mut();

        let mut stars = options.stars.clone();
        stars.sort_unstable();
        stars.dedup();
        for star in stars {
            query.append_pair("stars", &star.to_string());
        }
        if let Some(window) = options.date_window {
            query.append_pair("date", window.as_query_value());
        }
        if let Some(search) = options.search.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("search", search);
        }
        if !options.language.is_empty() {
            query.append_pair("languages", &options.language);
        }
        if options.verified_only {
            query.append_pair("verified", "true");
        }
        if options.replies_only {
            query.append_pair("replies", "true");
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }

    // query_pairs_mut leaves an empty `?` when nothing was appended
    if url.query() == Some("") {
        url.set_query(None);
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.trustpilot.com/review";

    fn bare_options() -> ListingOptions {
        ListingOptions {
            language: String::new(),
            ..ListingOptions::default()
        }
    }

    #[test]
    fn first_page_with_no_options_is_canonical_address() {
        let url = build_listing_url(BASE, "example.com", 1, &bare_options());
        assert_eq!(url.as_str(), "https://www.trustpilot.com/review/example.com");
    }

    #[test]
    fn page_one_never_appears_in_query() {
        let url = build_listing_url(BASE, "example.com", 1, &ListingOptions::default());
        assert!(!url.as_str().contains("page="));
    }

    #[test]
    fn later_pages_carry_page_parameter() {
        let url = build_listing_url(BASE, "example.com", 3, &ListingOptions::default());
        assert!(url.as_str().contains("page=3"));
    }

    #[test]
    fn each_star_value_emits_its_own_parameter() {
        let options = ListingOptions {
            stars: vec![5, 4],
            ..ListingOptions::default()
        };
        let url = build_listing_url(BASE, "example.com", 1, &options);
        let stars: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "stars")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(stars, vec!["4", "5"]);
    }

    #[test]
    fn no_empty_valued_parameters_for_any_option_set() {
        let option_sets = [
            ListingOptions::default(),
            bare_options(),
            ListingOptions {
                stars: vec![1],
                date_window: Some(DateWindow::Last30Days),
                search: Some("refund".to_string()),
                language: "es".to_string(),
                verified_only: true,
                replies_only: true,
            },
            ListingOptions {
                search: Some(String::new()),
                ..ListingOptions::default()
            },
        ];
        for options in &option_sets {
            for page in [1, 2, 17] {
                let url = build_listing_url(BASE, "example.com", page, options);
                for (key, value) in url.query_pairs() {
                    assert!(!value.is_empty(), "empty value for '{}' in {}", key, url);
                }
            }
        }
    }

    #[test]
    fn full_option_set_is_deterministic_and_ordered() {
        let options = ListingOptions {
            stars: vec![4, 5],
            date_window: Some(DateWindow::Last6Months),
            search: Some("late delivery".to_string()),
            language: "en".to_string(),
            verified_only: true,
            replies_only: false,
        };
        let a = build_listing_url(BASE, "example.com", 2, &options);
        let b = build_listing_url(BASE, "example.com", 2, &options);
        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            "https://www.trustpilot.com/review/example.com?stars=4&stars=5&date=last6months&search=late+delivery&languages=en&verified=true&page=2"
        );
    }

    #[test]
    fn duplicate_star_values_collapse() {
        let options = ListingOptions {
            stars: vec![5, 5, 4],
            ..ListingOptions::default()
        };
        let url = build_listing_url(BASE, "example.com", 1, &options);
        let count = url.query_pairs().filter(|(k, _)| k == "stars").count();
        assert_eq!(count, 2);
    }
}
