//! Keyword lists used to classify event windows and table headers.
//!
//! All keywords are lower case and matched as substrings of lower-cased text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    pub goal: &'static [&'static str],
    pub substitution: &'static [&'static str],
    pub card: &'static [&'static str],
    pub for_header: &'static [&'static str],
    pub result_header: &'static [&'static str],
}

impl Vocabulary {
    /// transfermarkt.ch / transfermarkt.de
    pub const GERMAN: Vocabulary = Vocabulary {
        goal: &["tor"],
        substitution: &["wechsel", "auswechsl", "einwechsl"],
        card: &["karte", "gelb", "rote karte", " rot"],
        for_header: &["für"],
        result_header: &["ergebnis"],
    };

    /// transfermarkt.com / transfermarkt.co.uk
    pub const ENGLISH: Vocabulary = Vocabulary {
        goal: &["goal"],
        substitution: &["substitution", "substituted", "subbed"],
        card: &["card", "yellow", "red card", "booked"],
        for_header: &["for", "club"],
        result_header: &["result"],
    };

    pub fn mentions_goal(&self, lower: &str) -> bool {
        contains_any(lower, self.goal)
    }

    pub fn mentions_substitution(&self, lower: &str) -> bool {
        contains_any(lower, self.substitution)
    }

    pub fn mentions_card(&self, lower: &str) -> bool {
        contains_any(lower, self.card)
    }

    pub fn is_for_header(&self, lower: &str) -> bool {
        contains_any(lower, self.for_header)
    }

    pub fn is_result_header(&self, lower: &str) -> bool {
        contains_any(lower, self.result_header)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::GERMAN
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
