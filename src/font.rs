//! Font identity: family plus weight/style variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Weight/style combination of a font family.
///
/// Tokens follow the remote catalog's naming (`100`, `100italic`, …,
/// `regular`, `italic`, …, `900italic`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Variant {
    Thin,
    ThinItalic,
    ExtraLight,
    ExtraLightItalic,
    Light,
    LightItalic,
    Regular,
    RegularItalic,
    Medium,
    MediumItalic,
    SemiBold,
    SemiBoldItalic,
    Bold,
    BoldItalic,
    ExtraBold,
    ExtraBoldItalic,
    Black,
    BlackItalic,
}

impl Variant {
    /// Every recognized variant, lightest first.
    pub const ALL: [Variant; 18] = [
        Variant::Thin,
        Variant::ThinItalic,
        Variant::ExtraLight,
        Variant::ExtraLightItalic,
        Variant::Light,
        Variant::LightItalic,
        Variant::Regular,
        Variant::RegularItalic,
        Variant::Medium,
        Variant::MediumItalic,
        Variant::SemiBold,
        Variant::SemiBoldItalic,
        Variant::Bold,
        Variant::BoldItalic,
        Variant::ExtraBold,
        Variant::ExtraBoldItalic,
        Variant::Black,
        Variant::BlackItalic,
    ];

    /// Raw catalog token.
    pub const fn token(self) -> &'static str {
        match self {
            Variant::Thin => "100",
            Variant::ThinItalic => "100italic",
            Variant::ExtraLight => "200",
            Variant::ExtraLightItalic => "200italic",
            Variant::Light => "300",
            Variant::LightItalic => "300italic",
            Variant::Regular => "regular",
            Variant::RegularItalic => "italic",
            Variant::Medium => "500",
            Variant::MediumItalic => "500italic",
            Variant::SemiBold => "600",
            Variant::SemiBoldItalic => "600italic",
            Variant::Bold => "700",
            Variant::BoldItalic => "700italic",
            Variant::ExtraBold => "800",
            Variant::ExtraBoldItalic => "800italic",
            Variant::Black => "900",
            Variant::BlackItalic => "900italic",
        }
    }

    /// Capitalized style suffix used in registered font names
    /// (`Roboto-Regular`, `Roboto-BoldItalic`).
    pub const fn style_name(self) -> &'static str {
        match self {
            Variant::Thin => "Thin",
            Variant::ThinItalic => "ThinItalic",
            Variant::ExtraLight => "Extralight",
            Variant::ExtraLightItalic => "ExtralightItalic",
            Variant::Light => "Light",
            Variant::LightItalic => "LightItalic",
            Variant::Regular => "Regular",
            Variant::RegularItalic => "RegularItalic",
            Variant::Medium => "Medium",
            Variant::MediumItalic => "MediumItalic",
            Variant::SemiBold => "Semibold",
            Variant::SemiBoldItalic => "SemiboldItalic",
            Variant::Bold => "Bold",
            Variant::BoldItalic => "BoldItalic",
            Variant::ExtraBold => "Extrabold",
            Variant::ExtraBoldItalic => "ExtraboldItalic",
            Variant::Black => "Black",
            Variant::BlackItalic => "BlackItalic",
        }
    }

    /// Parse a raw catalog token. Returns `None` for unrecognized tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.token() == token)
    }

    /// Whether this is an italic style.
    pub const fn is_italic(self) -> bool {
        matches!(
            self,
            Variant::ThinItalic
                | Variant::ExtraLightItalic
                | Variant::LightItalic
                | Variant::RegularItalic
                | Variant::MediumItalic
                | Variant::SemiBoldItalic
                | Variant::BoldItalic
                | Variant::ExtraBoldItalic
                | Variant::BlackItalic
        )
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| format!("Unknown font variant '{}'", s))
    }
}

impl From<Variant> for &'static str {
    fn from(variant: Variant) -> Self {
        variant.token()
    }
}

impl TryFrom<String> for Variant {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identifies a requested font style: family plus variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontIdentity {
    family: String,
    variant: Variant,
}

impl FontIdentity {
    /// File extension of stored font files.
    pub const EXTENSION: &'static str = "ttf";

    pub fn new(family: impl Into<String>, variant: Variant) -> Self {
        Self {
            family: family.into(),
            variant,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Name the font is expected to be registered under, e.g. `Roboto-BoldItalic`.
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.family, self.variant.style_name())
    }

    /// Stable cache key, e.g. `Roboto-700italic`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.family, self.variant.token())
    }

    /// File name for the stored font, e.g. `Roboto-700italic.ttf`.
    ///
    /// Path separators in the family are replaced so the file always lands
    /// directly inside the storage directory.
    pub fn filename(&self) -> String {
        let key: String = self
            .key()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect();
        format!("{}.{}", key, Self::EXTENSION)
    }
}

impl fmt::Display for FontIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tokens_roundtrip() {
        for variant in Variant::ALL {
            assert_eq!(Variant::from_token(variant.token()), Some(variant));
        }
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut tokens: Vec<_> = Variant::ALL.iter().map(|v| v.token()).collect();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), 18);
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(Variant::from_token("1000"), None);
        assert_eq!(Variant::from_token("Regular"), None);
        assert!("bold".parse::<Variant>().is_err());
    }

    #[test]
    fn test_italic_classification() {
        assert!(Variant::RegularItalic.is_italic());
        assert!(Variant::BlackItalic.is_italic());
        assert!(!Variant::Regular.is_italic());
        assert!(!Variant::Bold.is_italic());
    }

    #[test]
    fn test_identity_names() {
        let font = FontIdentity::new("Roboto", Variant::BoldItalic);
        assert_eq!(font.display_name(), "Roboto-BoldItalic");
        assert_eq!(font.key(), "Roboto-700italic");
        assert_eq!(font.filename(), "Roboto-700italic.ttf");
    }

    #[test]
    fn test_regular_identity_names() {
        let font = FontIdentity::new("Roboto", Variant::Regular);
        assert_eq!(font.display_name(), "Roboto-Regular");
        assert_eq!(font.key(), "Roboto-regular");
        assert_eq!(font.filename(), "Roboto-regular.ttf");
    }

    #[test]
    fn test_filename_strips_separators() {
        let font = FontIdentity::new("../evil", Variant::Regular);
        assert!(!font.filename().contains('/'));
    }

    #[test]
    fn test_variant_serde_uses_token() {
        let json = serde_json::to_string(&Variant::SemiBoldItalic).unwrap();
        assert_eq!(json, "\"600italic\"");
        let parsed: Variant = serde_json::from_str("\"italic\"").unwrap();
        assert_eq!(parsed, Variant::RegularItalic);
        assert!(serde_json::from_str::<Variant>("\"heavy\"").is_err());
    }
}
