use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CountdownId(pub Uuid);

impl CountdownId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero id, reserved for the companion placeholder.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl Default for CountdownId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CountdownId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Reference to another user the countdown is shared with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeerRef(pub String);

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Default,
    Serif,
    Rounded,
    Monospaced,
}

impl FontStyle {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Serif => "serif",
            Self::Rounded => "rounded",
            Self::Monospaced => "monospaced",
        }
    }

    /// Tags written by other app versions that this one does not know fall
    /// back to the default font.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "serif" => Self::Serif,
            "rounded" => Self::Rounded,
            "monospaced" => Self::Monospaced,
            _ => Self::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStyle {
    #[default]
    Color,
    Image,
}

impl BackgroundStyle {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Image => "image",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "image" => Self::Image,
            _ => Self::Color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_tags() {
        for font in [
            FontStyle::Default,
            FontStyle::Serif,
            FontStyle::Rounded,
            FontStyle::Monospaced,
        ] {
            assert_eq!(FontStyle::from_tag(font.as_tag()), font);
        }
        assert_eq!(FontStyle::from_tag("handwritten"), FontStyle::Default);
    }

    #[test]
    fn test_background_unknown_tag_is_color() {
        assert_eq!(BackgroundStyle::from_tag("image"), BackgroundStyle::Image);
        assert_eq!(BackgroundStyle::from_tag("gradient"), BackgroundStyle::Color);
    }

    #[test]
    fn test_countdown_id_parse() {
        let id = CountdownId::new();
        assert_eq!(CountdownId::parse(&id.to_string()).unwrap(), id);
        assert!(CountdownId::parse("not-a-uuid").is_err());
    }
}
