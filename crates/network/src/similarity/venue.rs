//! Journal family groupings for venue similarity

use std::collections::HashMap;

/// Built-in families: related venues of one publisher or community
const BUILTIN_FAMILIES: &[(&str, &[&str])] = &[
    ("nature", &[
        "nature", "nature communications", "nature genetics", "nature medicine",
        "nature methods", "nature biotechnology", "nature neuroscience",
        "nature physics", "nature chemistry", "nature materials",
        "nature reviews cancer", "nature reviews genetics", "scientific reports",
    ]),
    ("science", &[
        "science", "science advances", "science translational medicine",
        "science immunology", "science signaling", "science robotics",
    ]),
    ("cell", &[
        "cell", "cell reports", "molecular cell", "cancer cell", "cell metabolism",
        "cell stem cell", "immunity", "neuron", "developmental cell",
    ]),
    ("plos", &[
        "plos one", "plos biology", "plos medicine", "plos genetics",
        "plos computational biology", "plos pathogens",
    ]),
    ("lancet", &[
        "the lancet", "lancet", "lancet oncology", "the lancet oncology",
        "lancet neurology", "the lancet neurology", "lancet infectious diseases",
    ]),
    ("jama", &[
        "jama", "jama oncology", "jama internal medicine", "jama pediatrics",
        "jama network open", "jama neurology",
    ]),
    ("ieee", &[
        "ieee transactions on pattern analysis and machine intelligence",
        "ieee transactions on neural networks and learning systems",
        "ieee transactions on image processing", "ieee transactions on information theory",
        "ieee transactions on signal processing", "ieee access",
        "computer vision and pattern recognition", "cvpr", "iccv",
    ]),
    ("acm", &[
        "communications of the acm", "acm computing surveys", "journal of the acm",
        "sigmod", "sigir", "kdd", "chi", "acm transactions on graphics",
    ]),
    ("ml-proceedings", &[
        "neurips", "nips", "neural information processing systems",
        "advances in neural information processing systems", "icml",
        "international conference on machine learning", "iclr",
        "international conference on learning representations",
        "journal of machine learning research", "jmlr",
    ]),
    ("aps", &[
        "physical review letters", "physical review a", "physical review b",
        "physical review d", "physical review e", "reviews of modern physics",
    ]),
    ("bmc", &[
        "bmc bioinformatics", "bmc genomics", "bmc medicine", "bmc biology",
        "genome biology",
    ]),
];

/// Lookup table from venue name to family
#[derive(Debug, Clone)]
pub struct JournalFamilies {
    by_venue: HashMap<String, String>,
}

impl JournalFamilies {
    /// Table with only the built-in families
    pub fn builtin() -> Self {
        let mut families = Self {
            by_venue: HashMap::new(),
        };
        for (family, venues) in BUILTIN_FAMILIES {
            families.insert(family, venues.iter().copied());
        }
        families
    }

    /// Add (or extend) a family
    pub fn with_family<'a>(mut self, family: &str, venues: impl IntoIterator<Item = &'a str>) -> Self {
        self.insert(family, venues);
        self
    }

    fn insert<'a>(&mut self, family: &str, venues: impl IntoIterator<Item = &'a str>) {
        for venue in venues {
            self.by_venue.insert(normalize(venue), family.to_string());
        }
    }

    /// Family of a venue, if it belongs to one
    pub fn family_of(&self, venue: &str) -> Option<&str> {
        self.by_venue.get(&normalize(venue)).map(String::as_str)
    }

    /// Whether two venues belong to the same family
    pub fn same_family(&self, a: &str, b: &str) -> bool {
        match (self.family_of(a), self.family_of(b)) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => false,
        }
    }
}

impl Default for JournalFamilies {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(venue: &str) -> String {
    venue.trim().to_lowercase()
}
