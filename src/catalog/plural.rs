//! Numerus (plural form) rules.
//!
//! Form order follows Qt Linguist, so index `i` selects the i-th
//! `<numerusform>` of a translation.

/// Plural rule families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralRule {
    /// One form for every count (Japanese, Chinese, ...).
    Single,
    /// `n == 1` is singular (English, German, Spanish, ...).
    OneOther,
    /// `n <= 1` is singular (French, Brazilian Portuguese).
    ZeroOneOther,
    /// Russian, Ukrainian, Belarusian, Serbian, Croatian, Bosnian.
    EastSlavic,
    Polish,
    /// Czech and Slovak.
    CzechSlovak,
    Latvian,
    Lithuanian,
    Irish,
    Romanian,
    Slovenian,
    Arabic,
}

const SINGLE: &[&str] = &["ja", "zh", "ko", "vi", "th", "id", "ms", "lo", "km", "my", "bo", "dz"];
const ZERO_ONE_OTHER: &[&str] = &["fr", "oc", "ti", "wa", "fil", "tl", "pt_br"];
const EAST_SLAVIC: &[&str] = &["ru", "uk", "be", "sr", "hr", "bs"];

impl PluralRule {
    /// Selects the rule for a language code such as `fr_FR`, `pt-BR` or `de`.
    ///
    /// Unknown languages use [`PluralRule::OneOther`].
    #[must_use]
    pub fn for_language(language: &str) -> Self {
        let normalized = language.to_lowercase().replace('-', "_");
        let base = normalized.split('_').next().unwrap_or_default();

        if ZERO_ONE_OTHER.contains(&normalized.as_str()) {
            return Self::ZeroOneOther;
        }
        match base {
            b if SINGLE.contains(&b) => Self::Single,
            b if ZERO_ONE_OTHER.contains(&b) => Self::ZeroOneOther,
            b if EAST_SLAVIC.contains(&b) => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::CzechSlovak,
            "lv" => Self::Latvian,
            "lt" => Self::Lithuanian,
            "ga" => Self::Irish,
            "ro" | "mo" => Self::Romanian,
            "sl" => Self::Slovenian,
            "ar" => Self::Arabic,
            _ => Self::OneOther,
        }
    }

    /// Number of `<numerusform>` entries a translation needs.
    #[must_use]
    pub const fn form_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::OneOther | Self::ZeroOneOther => 2,
            Self::EastSlavic
            | Self::Polish
            | Self::CzechSlovak
            | Self::Latvian
            | Self::Lithuanian
            | Self::Irish
            | Self::Romanian => 3,
            Self::Slovenian => 4,
            Self::Arabic => 6,
        }
    }

    /// Index of the form to use for count `n`.
    #[must_use]
    pub const fn form_index(self, n: i64) -> usize {
        let n = n.unsigned_abs();
        let n10 = n % 10;
        let n100 = n % 100;
        let teen = n100 >= 10 && n100 < 20;

        match self {
            Self::Single => 0,
            Self::OneOther => {
                if n == 1 { 0 } else { 1 }
            }
            Self::ZeroOneOther => {
                if n <= 1 { 0 } else { 1 }
            }
            Self::EastSlavic => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n10 >= 2 && n10 <= 4 && !teen {
                    1
                } else {
                    2
                }
            }
            Self::Polish => {
                if n == 1 {
                    0
                } else if n10 >= 2 && n10 <= 4 && !teen {
                    1
                } else {
                    2
                }
            }
            Self::CzechSlovak => {
                if n == 1 {
                    0
                } else if n >= 2 && n <= 4 {
                    1
                } else {
                    2
                }
            }
            Self::Latvian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n != 0 {
                    1
                } else {
                    2
                }
            }
            Self::Lithuanian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n10 >= 2 && !teen {
                    1
                } else {
                    2
                }
            }
            Self::Irish => match n {
                1 => 0,
                2 => 1,
                _ => 2,
            },
            Self::Romanian => {
                if n == 1 {
                    0
                } else if n == 0 || (n100 >= 1 && n100 <= 19) {
                    1
                } else {
                    2
                }
            }
            Self::Slovenian => match n100 {
                1 => 0,
                2 => 1,
                3 | 4 => 2,
                _ => 3,
            },
            Self::Arabic => {
                if n == 0 {
                    0
                } else if n == 1 {
                    1
                } else if n == 2 {
                    2
                } else if n100 >= 3 && n100 <= 10 {
                    3
                } else if n100 >= 11 {
                    4
                } else {
                    5
                }
            }
        }
    }
}

/// Form index for `n` in `language`.
#[must_use]
pub fn plural_form_index(language: &str, n: i64) -> usize {
    PluralRule::for_language(language).form_index(n)
}

/// Number of forms `language` needs.
#[must_use]
pub fn plural_form_count(language: &str) -> usize {
    PluralRule::for_language(language).form_count()
}
