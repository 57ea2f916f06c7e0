use serde::{Deserialize, Serialize};

/// How well the physical sheet matches the on-screen guide.
///
/// Capture is only allowed at [`AlignmentQuality::Good`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentQuality {
    Good,
    Warning,
    #[default]
    Poor,
}

impl AlignmentQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            AlignmentQuality::Good => "good",
            AlignmentQuality::Warning => "warning",
            AlignmentQuality::Poor => "poor",
        }
    }

    pub fn is_good(self) -> bool {
        self == AlignmentQuality::Good
    }
}

impl std::fmt::Display for AlignmentQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlignmentQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "good" => Ok(AlignmentQuality::Good),
            "warning" => Ok(AlignmentQuality::Warning),
            "poor" => Ok(AlignmentQuality::Poor),
            other => Err(format!("unknown alignment quality {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_poor_and_parses_names() {
        assert_eq!(AlignmentQuality::default(), AlignmentQuality::Poor);
        assert_eq!("Good".parse::<AlignmentQuality>(), Ok(AlignmentQuality::Good));
        assert!("great".parse::<AlignmentQuality>().is_err());
        assert_eq!(
            serde_json::to_string(&AlignmentQuality::Warning).expect("json"),
            "\"warning\""
        );
    }
}
