//! Keyword-to-rating correlation
//!
//! Builds a bounded vocabulary from review text by document frequency,
//! then computes the Pearson correlation between each term's per-review
//! occurrence counts and the rating vector, with a two-sided p-value via
//! the Student-t transform and the regularized incomplete beta function.
//! Results are ranked by absolute correlation magnitude.

use std::collections::{HashMap, HashSet};

use crate::config::AnalysisConfig;
use crate::types::Review;

/// Common English stop words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "bottom", "but", "by", "call", "can", "cannot", "could", "did", "do",
    "does", "doing", "done", "down", "due", "during", "each", "eg", "either", "else",
    "elsewhere", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "for", "former", "formerly", "from", "front", "full",
    "further", "get", "give", "go", "had", "has", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "ie", "if", "in", "indeed", "into", "is", "it", "its", "itself", "just",
    "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me",
    "meanwhile", "might", "mine", "more", "moreover", "most", "mostly", "much", "must", "my",
    "myself", "namely", "neither", "never", "nevertheless", "next", "no", "nobody", "none",
    "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
    "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves",
    "out", "over", "own", "per", "perhaps", "please", "rather", "re", "same", "seem", "seemed",
    "seeming", "seems", "several", "she", "should", "since", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "this", "those", "though", "through",
    "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards", "under",
    "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever",
    "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
    "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole",
    "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

/// One term's correlation against the rating vector.
#[derive(Debug, Clone)]
pub struct KeywordCorrelation {
    pub term: String,
    /// Pearson correlation coefficient in [-1, 1].
    pub coefficient: f64,
    /// Two-sided significance.
    pub p_value: f64,
}

impl KeywordCorrelation {
    pub fn is_significant(&self, threshold: f64) -> bool {
        self.p_value < threshold
    }

    /// Presentation band for correlation strength.
    pub fn strength_marker(&self) -> &'static str {
        let magnitude = self.coefficient.abs();
        if magnitude > 0.5 {
            "(!)" // strong
        } else if magnitude > 0.3 {
            "(+)" // moderate
        } else {
            "   "
        }
    }

    /// Presentation band for significance level.
    pub fn significance_marker(&self) -> &'static str {
        if self.p_value < 1e-10 {
            "***"
        } else if self.p_value < 1e-3 {
            "** "
        } else {
            "*  "
        }
    }
}

/// Correlate vocabulary terms against ratings over reviews that carry
/// both text and a rating.
///
/// Fewer than two usable reviews leaves correlation undefined for every
/// term; the result is then empty rather than an error. Terms whose
/// occurrence vector has no variance (or a rating vector without
/// variance) are likewise undefined and skipped.
pub fn correlate(reviews: &[Review], config: &AnalysisConfig) -> Vec<KeywordCorrelation> {
    let usable: Vec<(&str, f64)> = reviews
        .iter()
        .filter(|r| r.is_analyzable())
        .map(|r| (r.text.as_deref().unwrap_or(""), r.rating.unwrap_or(0) as f64))
        .collect();

    if usable.len() < 2 {
        return Vec::new();
    }

    let documents: Vec<Vec<String>> = usable.iter().map(|(text, _)| tokenize(text)).collect();
    let ratings: Vec<f64> = usable.iter().map(|(_, rating)| *rating).collect();

    let vocabulary = build_vocabulary(&documents, config.max_vocabulary);

    let mut results: Vec<KeywordCorrelation> = vocabulary
        .into_iter()
        .filter_map(|term| {
            let counts: Vec<f64> = documents
                .iter()
                .map(|doc| doc.iter().filter(|t| **t == term).count() as f64)
                .collect();
            pearson(&counts, &ratings).map(|(coefficient, p_value)| KeywordCorrelation {
                term,
                coefficient,
                p_value,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.coefficient
            .abs()
            .total_cmp(&a.coefficient.abs())
            .then_with(|| a.term.cmp(&b.term))
    });
    results.truncate(config.top_correlations);
    results
}

/// Per-term rating accumulator feeding the keyword-analysis sink.
#[derive(Debug, Default)]
pub struct KeywordStats {
    totals: HashMap<String, (f64, u64)>,
}

/// One finalized keyword row.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRow {
    pub term: String,
    pub mean_rating: f64,
    pub count: u64,
}

impl KeywordStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one review's terms into the accumulator. Reviews without
    /// text or rating contribute nothing.
    pub fn observe(&mut self, review: &Review) {
        if !review.is_analyzable() {
            return;
        }
        let rating = review.rating.unwrap_or(0) as f64;
        for term in tokenize(review.text.as_deref().unwrap_or("")) {
            let entry = self.totals.entry(term).or_insert((0.0, 0));
            entry.0 += rating;
            entry.1 += 1;
        }
    }

    /// Finalize into (term, mean rating, count) rows, ordered by count
    /// descending then term.
    pub fn rows(&self) -> Vec<KeywordRow> {
        let mut rows: Vec<KeywordRow> = self
            .totals
            .iter()
            .map(|(term, (sum, count))| KeywordRow {
                term: term.clone(),
                mean_rating: sum / *count as f64,
                count: *count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        rows
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Lowercased alphanumeric runs of length >= 2.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Select up to `max_terms` non-stop-word terms by document frequency,
/// ties broken alphabetically for deterministic output.
fn build_vocabulary(documents: &[Vec<String>], max_terms: usize) -> Vec<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for doc in documents {
        let distinct: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in distinct {
            if !stop_words.contains(term) {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }
    }

    let mut terms: Vec<(&str, usize)> = document_frequency.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    terms
        .into_iter()
        .take(max_terms)
        .map(|(term, _)| term.to_string())
        .collect()
}

/// Pearson correlation with two-sided p-value.
///
/// Returns `None` when either vector has (numerically) zero variance,
/// where the coefficient is undefined.
fn pearson(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x < 1e-12 || variance_y < 1e-12 {
        return None;
    }

    let r = (covariance / (variance_x * variance_y).sqrt()).clamp(-1.0, 1.0);
    Some((r, two_sided_p(r, n)))
}

/// Two-sided p-value for a Pearson coefficient over `n` samples.
///
/// Uses the exact relation between the t statistic and the regularized
/// incomplete beta function: p = I_{df/(df+t^2)}(df/2, 1/2).
fn two_sided_p(r: f64, n: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let denominator = 1.0 - r * r;
    if denominator < 1e-12 {
        return 0.0;
    }
    let t_squared = r * r * df / denominator;
    incomplete_beta(df / 2.0, 0.5, df / (df + t_squared)).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fastest below the symmetry point
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued-fraction evaluation for the incomplete beta function
/// (modified Lentz's method).
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 200;
    const EPSILON: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut result = d;

    for m in 1..=MAX_ITERATIONS {
        let mf = m as f64;
        let m2 = 2.0 * mf;

        // Even step
        let numerator = mf * (b - mf) * x / ((qam + m2) * (a + m2));
        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        result *= d * c;

        // Odd step
        let numerator = -(a + mf) * (qab + mf) * x / ((a + m2) * (qap + m2));
        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        result *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    result
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 8] = [
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut accumulator = 0.999_999_999_999_809_9;
    for (i, coefficient) in COEFFICIENTS.iter().enumerate() {
        accumulator += coefficient / (x + (i + 1) as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + accumulator.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, rating: i64, text: &str) -> Review {
        let mut r = Review::empty(id);
        r.rating = Some(rating);
        r.text = Some(text.to_string());
        r
    }

    #[test]
    fn tokenize_lowercases_and_drops_short_tokens() {
        assert_eq!(
            tokenize("Great service, A+ refund!"),
            vec!["great", "service", "refund"]
        );
    }

    #[test]
    fn vocabulary_excludes_stop_words_and_ranks_by_document_frequency() {
        let documents = vec![
            tokenize("the delivery was slow"),
            tokenize("the delivery was fine"),
            tokenize("refund refused"),
        ];
        let vocabulary = build_vocabulary(&documents, 50);
        assert!(!vocabulary.contains(&"the".to_string()));
        assert!(!vocabulary.contains(&"was".to_string()));
        assert_eq!(vocabulary[0], "delivery");
        assert!(vocabulary.contains(&"refund".to_string()));
    }

    #[test]
    fn vocabulary_is_bounded() {
        let documents = vec![tokenize("alpha beta gamma delta epsilon zeta")];
        assert_eq!(build_vocabulary(&documents, 3).len(), 3);
    }

    #[test]
    fn incomplete_beta_known_values() {
        // I_x(1,1) = x
        assert!((incomplete_beta(1.0, 1.0, 0.25) - 0.25).abs() < 1e-10);
        // arcsine distribution median
        assert!((incomplete_beta(0.5, 0.5, 0.5) - 0.5).abs() < 1e-10);
        // bounds
        assert_eq!(incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(incomplete_beta(2.0, 3.0, 1.0), 1.0);
    }

    #[test]
    fn ln_gamma_matches_factorials() {
        // gamma(5) = 24
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
        // gamma(0.5) = sqrt(pi)
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn two_sided_p_sanity() {
        // No correlation: p = 1
        assert!((two_sided_p(0.0, 12) - 1.0).abs() < 1e-12);
        // r = sqrt(1/2) at n = 3 gives t = 1 with df = 1, where the
        // two-sided p is exactly 0.5
        let r = (0.5f64).sqrt();
        assert!((two_sided_p(r, 3) - 0.5).abs() < 1e-9);
        // Perfect correlation: p -> 0
        assert!(two_sided_p(1.0, 10) < 1e-12);
        // Degenerate sample size
        assert_eq!(two_sided_p(1.0, 2), 1.0);
    }

    #[test]
    fn pearson_detects_perfect_linear_relation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let (r, p) = pearson(&x, &y).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert!(p < 1e-12);
    }

    #[test]
    fn pearson_undefined_for_constant_vector() {
        let x = [1.0, 1.0, 1.0];
        let y = [1.0, 2.0, 3.0];
        assert!(pearson(&x, &y).is_none());
        assert!(pearson(&y, &x).is_none());
    }

    #[test]
    fn refund_in_low_ratings_correlates_strongly_negative() {
        let mut reviews = vec![
            review("n1", 1, "they refused my refund request"),
            review("n2", 1, "still waiting for the refund"),
            review("n3", 1, "no refund after weeks"),
            review("n4", 1, "refund process is a scam"),
        ];
        for i in 0..6 {
            reviews.push(review(
                &format!("p{}", i),
                5,
                "great service and friendly support",
            ));
        }

        let results = correlate(&reviews, &AnalysisConfig::default());
        let refund = results
            .iter()
            .find(|k| k.term == "refund")
            .expect("refund should be in the ranked results");

        assert!(refund.coefficient < -0.5, "got {}", refund.coefficient);
        assert!(refund.p_value < 0.05);
        assert!(refund.is_significant(0.05));
        assert_eq!(refund.strength_marker(), "(!)");
    }

    #[test]
    fn fewer_than_two_usable_reviews_yields_empty_result() {
        assert!(correlate(&[], &AnalysisConfig::default()).is_empty());
        let one = vec![review("a", 5, "excellent experience")];
        assert!(correlate(&one, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn reviews_without_text_or_rating_are_excluded() {
        let mut no_text = Review::empty("nt");
        no_text.rating = Some(4);
        let mut no_rating = Review::empty("nr");
        no_rating.text = Some("ignored words here".to_string());

        let reviews = vec![no_text, no_rating];
        assert!(correlate(&reviews, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn constant_ratings_yield_empty_result() {
        let reviews = vec![
            review("a", 5, "quick delivery"),
            review("b", 5, "slow delivery"),
            review("c", 5, "broken item"),
        ];
        assert!(correlate(&reviews, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn results_are_capped_at_configured_top_count() {
        let mut reviews = Vec::new();
        for i in 0..10 {
            let text = if i % 2 == 0 {
                "awful broken useless slow rude expensive damaged late"
            } else {
                "wonderful fast kind helpful cheap sturdy polite early"
            };
            reviews.push(review(&format!("r{}", i), if i % 2 == 0 { 1 } else { 5 }, text));
        }
        let config = AnalysisConfig {
            top_correlations: 4,
            ..AnalysisConfig::default()
        };
        let results = correlate(&reviews, &config);
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn keyword_stats_accumulate_mean_and_count() {
        let mut stats = KeywordStats::new();
        stats.observe(&review("a", 5, "great support"));
        stats.observe(&review("b", 1, "support ignored me"));
        stats.observe(&Review::empty("no-text"));

        let rows = stats.rows();
        let support = rows.iter().find(|r| r.term == "support").unwrap();
        assert_eq!(support.count, 2);
        assert!((support.mean_rating - 3.0).abs() < 1e-12);

        // count-descending order, ties alphabetical
        assert_eq!(rows[0].term, "support");
    }

    #[test]
    fn significance_markers_band_correctly() {
        let make = |p| KeywordCorrelation {
            term: "x".to_string(),
            coefficient: 0.4,
            p_value: p,
        };
        assert_eq!(make(1e-12).significance_marker(), "***");
        assert_eq!(make(1e-5).significance_marker(), "** ");
        assert_eq!(make(0.01).significance_marker(), "*  ");
    }
}
