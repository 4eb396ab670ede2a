/// A named set of owner-name fragments, matched as case-insensitive literal
/// substrings.
#[derive(Debug, Clone, Copy)]
pub struct NamePattern {
    pub label: &'static str,
    pub needles: &'static [&'static str],
}

impl NamePattern {
    pub fn matches(&self, owner: &str) -> bool {
        let upper = owner.to_uppercase();
        self.matches_upper(&upper)
    }

    /// Same as [`matches`](Self::matches) for a name already in upper case.
    pub fn matches_upper(&self, upper: &str) -> bool {
        self.needles.iter().any(|needle| upper.contains(needle))
    }
}

pub const LLC: NamePattern = NamePattern {
    label: "LLC entities",
    needles: &["LLC", "L.L.C"],
};

pub const CORPORATE: NamePattern = NamePattern {
    label: "Corporate entities",
    needles: &["CORP", "INC", "CORPORATION"],
};

pub const SHELL: NamePattern = NamePattern {
    label: "Potential shell companies",
    needles: &["PROPERTIES", "HOLDINGS", "INVESTMENTS", "REAL ESTATE", "VENTURES"],
};

pub const CLASSIFICATION: [NamePattern; 3] = [LLC, CORPORATE, SHELL];

// Scoring uses narrower lists than classification: no VENTURES, and INC or
// L.L.C do not count as a corporate entity.
pub const GENERIC_BUSINESS_NAME: NamePattern = NamePattern {
    label: "generic business name",
    needles: &["PROPERTIES", "HOLDINGS", "INVESTMENTS", "REAL ESTATE"],
};

pub const CORPORATE_ENTITY: NamePattern = NamePattern {
    label: "corporate entity",
    needles: &["LLC", "CORP"],
};

/// Name signals evaluated by the risk scorer, with the points each one adds.
pub const RISK_SIGNALS: [(NamePattern, u8); 2] =
    [(GENERIC_BUSINESS_NAME, 2), (CORPORATE_ENTITY, 1)];

/// Name endings that mark an owner as a business rather than a person when
/// measuring corporate control. Matched at the very end of the name.
pub const CORPORATE_SUFFIXES: [&str; 12] = [
    "LLC",
    "INC",
    "CORP",
    "LTD",
    "LIMITED",
    "COMPANY",
    "PROPERTIES",
    "INVESTMENTS",
    "HOLDINGS",
    "GROUP",
    "TRUST",
    "PARTNERSHIP",
];

pub fn is_corporate_owner(owner: &str) -> bool {
    let upper = owner.to_uppercase();
    CORPORATE_SUFFIXES.iter().any(|suffix| upper.ends_with(suffix))
}
