//! Vendor knowledge: name normalization and curated recurring-vendor priors.
//!
//! Vendor strings on statements are noisy ("Netflix.com", "NETFLIX 4421",
//! "T-Mobile *AUTOPAY"). [`normalize_vendor_name`] is the single source of
//! truth for collapsing those variants to one key; every grouping operation
//! and every knowledge lookup in the crate goes through it. Two raw strings
//! that normalize to the same key are the same vendor, everywhere.
//!
//! The curated lists are plain configuration data injected at construction
//! time so they can be extended or swapped in tests without touching the
//! matching logic.

use std::sync::OnceLock;

use regex::Regex;

/// Similarity threshold for fuzzy membership in the always-recurring set.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.85;

/// Normalize a raw vendor label into its canonical grouping key.
///
/// Lowercases, strips domain suffixes, treats punctuation and whitespace as
/// separators, and drops all-digit tokens (store numbers, phone fragments).
/// Idempotent: normalizing a normalized key is a no-op.
pub fn normalize_vendor_name(raw: &str) -> String {
    let mut lowered = raw.to_lowercase();
    for suffix in [".com", ".net", ".org"] {
        lowered = lowered.replace(suffix, " ");
    }
    lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty() && !token.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Similarity ratio between two normalized keys, in [0, 1].
///
/// Containment counts as a full match (statement strings often embed the
/// brand verbatim inside payment-processor noise); otherwise the ratio is
/// Levenshtein similarity over the longer key.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b || a.contains(b) || b.contains(a) {
        return 1.0;
    }
    let distance = levenshtein(a, b);
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - distance as f64 / max_len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Curated vendor lists injected into [`VendorKnowledge`].
///
/// All entries in `always_recurring` are stored in normalized form; provider
/// lists are stored lowercase because they match with substring semantics
/// against the raw (lowercased) vendor label.
#[derive(Debug, Clone)]
pub struct VendorLists {
    /// Brands whose charges are essentially always subscriptions
    pub always_recurring: Vec<&'static str>,
    /// Utility companies (energy, water, cable, internet)
    pub utility_providers: Vec<&'static str>,
    /// Phone and wireless carriers
    pub phone_providers: Vec<&'static str>,
    /// Insurance carriers
    pub insurance_providers: Vec<&'static str>,
    /// Price points that are overwhelmingly subscription tiers
    pub common_subscription_amounts: Vec<f64>,
    /// Keyword fragments scored by how strongly they suggest a subscription
    pub keyword_scores: Vec<(&'static str, f64)>,
}

impl Default for VendorLists {
    fn default() -> Self {
        Self {
            always_recurring: vec![
                "netflix",
                "hulu",
                "spotify",
                "disneyplus",
                "amazonprime",
                "amazonprimevideo",
                "audible",
                "siriusxm",
                "planetfitness",
                "adobe",
                "norton",
                "dropbox",
                "evernote",
                "googlestorage",
                "googleone",
                "applemusic",
                "applearcade",
                "appleicloud",
                "appleone",
                "appletv",
                "microsoft365",
                "youtubepremium",
                "discordnitro",
                "playstationplus",
                "xboxgamepass",
                "tmobile",
                "verizon",
                "sprint",
                "straighttalk",
                "lemonadeinsurance",
                "cleo",
                "albert",
            ],
            utility_providers: vec![
                "duke energy",
                "pg&e",
                "con edison",
                "national grid",
                "xcel energy",
                "southern california edison",
                "dominion energy",
                "centerpoint energy",
                "atmos energy",
                "direct energy",
                "peoples gas",
                "comcast",
                "xfinity",
                "spectrum",
                "centurylink",
                "cox communications",
            ],
            phone_providers: vec![
                "at&t",
                "t-mobile",
                "verizon",
                "sprint",
                "boost mobile",
                "cricket wireless",
                "metropcs",
                "straight talk",
                "mint mobile",
                "vz wireless",
            ],
            insurance_providers: vec![
                "geico",
                "progressive",
                "allstate",
                "state farm",
                "lemonade",
                "aetna",
                "cigna",
            ],
            common_subscription_amounts: vec![
                4.99, 5.99, 9.99, 12.99, 14.99, 15.99, 19.99, 49.99, 99.99,
            ],
            keyword_scores: vec![
                ("netflix", 1.0),
                ("spotify", 1.0),
                ("subscription", 1.0),
                ("monthly", 1.0),
                ("amazon prime", 0.9),
                ("hulu", 0.9),
                ("adobe", 0.9),
                ("apple", 0.8),
                ("store", 0.1),
                ("shop", 0.1),
            ],
        }
    }
}

fn utility_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(utility|utilit|energy|water|gas|electric|power|sewage|trash|waste|heating|cable|internet|broadband)\b")
            .expect("valid utility keyword pattern")
    })
}

fn phone_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(phone|wireless|mobile|cellular)\b").expect("valid phone keyword pattern")
    })
}

fn insurance_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(insurance|insur|insuranc)\b").expect("valid insurance keyword pattern")
    })
}

/// Timing-independent vendor priors backed by the curated lists.
///
/// Pure lookups: no learning, no persistence. An empty vendor name never
/// matches anything.
#[derive(Debug, Clone)]
pub struct VendorKnowledge {
    lists: VendorLists,
}

impl VendorKnowledge {
    /// Build knowledge from explicit lists.
    pub fn new(lists: VendorLists) -> Self {
        Self { lists }
    }

    /// Borrow the underlying lists.
    pub fn lists(&self) -> &VendorLists {
        &self.lists
    }

    /// Whether the vendor belongs to the always-recurring set.
    ///
    /// Matches the normalized name exactly or fuzzily (similarity ratio at
    /// least [`FUZZY_MATCH_THRESHOLD`]) so that "Netflix.com" and
    /// "NETFLIX 4421" land on the same verdict as bare "Netflix".
    pub fn is_always_recurring(&self, name: &str) -> bool {
        let key = normalize_vendor_name(name);
        if key.is_empty() {
            return false;
        }
        self.lists
            .always_recurring
            .iter()
            .any(|vendor| similarity_ratio(&key, vendor) >= FUZZY_MATCH_THRESHOLD)
    }

    /// Whether the transaction name looks like a utility payment.
    pub fn is_utility(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        utility_keywords().is_match(&lowered)
            || self
                .lists
                .utility_providers
                .iter()
                .any(|provider| lowered.contains(provider))
    }

    /// Whether the transaction name looks like a phone/wireless payment.
    pub fn is_phone(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        phone_keywords().is_match(&lowered)
            || self
                .lists
                .phone_providers
                .iter()
                .any(|provider| lowered.contains(provider))
    }

    /// Whether the transaction name looks like an insurance payment.
    pub fn is_insurance(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        insurance_keywords().is_match(&lowered)
            || self
                .lists
                .insurance_providers
                .iter()
                .any(|provider| lowered.contains(provider))
    }

    /// Whether the amount sits on a well-known subscription price point.
    pub fn is_common_subscription_amount(&self, amount: f64) -> bool {
        self.lists
            .common_subscription_amounts
            .iter()
            .any(|&tier| (amount - tier).abs() < 1e-9)
    }

    /// Strongest subscription keyword score contained in the vendor name.
    ///
    /// Returns 0.0 when no keyword matches.
    pub fn subscription_keyword_score(&self, name: &str) -> f64 {
        let lowered = name.to_lowercase();
        self.lists
            .keyword_scores
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword))
            .map(|&(_, score)| score)
            .fold(0.0, f64::max)
    }
}

impl Default for VendorKnowledge {
    fn default() -> Self {
        Self::new(VendorLists::default())
    }
}
