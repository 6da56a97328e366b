use std::{fmt, str::FromStr};

/// Stroke dash pattern. Parsing never fails: unrecognised text means [`DashPattern::Solid`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DashPattern {
    /// One dash as long as the whole outline; needed so the dash offset can "draw" it.
    #[default]
    Solid,
    Dashed,
    Dotted,
    Custom { dash: f64, gap: f64 },
}

impl DashPattern {
    /// `[dash, gap]` for an outline of length `len`.
    pub fn dash_array(self, len: f64) -> [f64; 2] {
        match self {
            Self::Solid => [len, len],
            Self::Dashed => [25.0, 25.0],
            Self::Dotted => [2.0, 25.0],
            Self::Custom { dash, gap } => [dash, gap],
        }
    }

    /// CSS `stroke-dasharray` text.
    pub fn css(self, len: f64) -> String {
        let [dash, gap] = self.dash_array(len);
        format!("{dash}px, {gap}px")
    }
}

fn parse_px(token: &str) -> Option<f64> {
    let n: f64 = token.strip_suffix("px").unwrap_or(token).parse().ok()?;
    (n.is_finite() && n >= 0.0).then_some(n)
}

impl FromStr for DashPattern {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_ascii_lowercase().as_str() {
            "" | "solid" => Self::Solid,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            other => {
                let tokens: Vec<&str> = other
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|t| !t.is_empty())
                    .collect();
                match tokens.as_slice() {
                    [one] => parse_px(one).map_or(Self::Solid, |n| Self::Custom { dash: n, gap: n }),
                    [a, b, ..] => match (parse_px(a), parse_px(b)) {
                        (Some(dash), Some(gap)) => Self::Custom { dash, gap },
                        _ => Self::Solid,
                    },
                    [] => Self::Solid,
                }
            }
        })
    }
}

impl From<String> for DashPattern {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(p) => p,
            Err(never) => match never {},
        }
    }
}

impl From<DashPattern> for String {
    fn from(value: DashPattern) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DashPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => f.write_str("solid"),
            Self::Dashed => f.write_str("dashed"),
            Self::Dotted => f.write_str("dotted"),
            Self::Custom { dash, gap } => write!(f, "{dash},{gap}"),
        }
    }
}
