//! The user-facing quality choice: a pixel height or audio-only.

use std::fmt;

/// Quality requested for one download. Callers validate heights against
/// the offered menu; this type does not re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    /// Best video stream at or below this height, muxed with best audio
    Resolution(u32),
    /// Best audio stream, transcoded to mp3
    AudioOnly,
}

impl Quality {
    pub fn is_audio(self) -> bool {
        matches!(self, Quality::AudioOnly)
    }

    /// Compact token used on the callback wire ("720" / "audio")
    pub fn as_token(self) -> String {
        match self {
            Quality::Resolution(h) => h.to_string(),
            Quality::AudioOnly => "audio".to_string(),
        }
    }

    /// Parse a wire token back into a quality
    pub fn parse_token(token: &str) -> Option<Self> {
        if token == "audio" {
            return Some(Quality::AudioOnly);
        }
        token.parse::<u32>().ok().map(Quality::Resolution)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Resolution(h) => write!(f, "{}p", h),
            Quality::AudioOnly => write!(f, "audio"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for q in [Quality::Resolution(720), Quality::Resolution(2160), Quality::AudioOnly] {
            assert_eq!(Quality::parse_token(&q.as_token()), Some(q));
        }
    }

    #[test]
    fn test_parse_token_rejects_garbage() {
        assert_eq!(Quality::parse_token("1080p"), None);
        assert_eq!(Quality::parse_token(""), None);
        assert_eq!(Quality::parse_token("Audio"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Quality::Resolution(480).to_string(), "480p");
        assert_eq!(Quality::AudioOnly.to_string(), "audio");
    }
}
