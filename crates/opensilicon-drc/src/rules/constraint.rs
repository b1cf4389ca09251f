use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies a kind of design check. Providers request constraints by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    Clearance,
    TrackWidth,
    ViaDiameter,
    MinArea,
    Disallow,
}

impl ConstraintType {
    pub const ALL: [ConstraintType; 5] = [
        ConstraintType::Clearance,
        ConstraintType::TrackWidth,
        ConstraintType::ViaDiameter,
        ConstraintType::MinArea,
        ConstraintType::Disallow,
    ];

    /// Keyword used in rule documents.
    pub fn keyword(self) -> &'static str {
        match self {
            ConstraintType::Clearance => "clearance",
            ConstraintType::TrackWidth => "track_width",
            ConstraintType::ViaDiameter => "via_diameter",
            ConstraintType::MinArea => "min_area",
            ConstraintType::Disallow => "disallow",
        }
    }

    /// Categorical types carry a list of keywords instead of a min/opt/max bound.
    pub fn is_categorical(self) -> bool {
        self == ConstraintType::Disallow
    }

    /// Area constraints are written in square units of the length suffix.
    pub fn is_area(self) -> bool {
        self == ConstraintType::MinArea
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ConstraintType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConstraintType::ALL
            .into_iter()
            .find(|t| t.keyword() == s)
            .ok_or_else(|| format!("unknown constraint type '{s}'"))
    }
}

/// A scalar bound, all parts optional. Values are in canonical units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MinOptMax {
    pub min: Option<f64>,
    pub opt: Option<f64>,
    pub max: Option<f64>,
}

impl MinOptMax {
    pub fn min(value: f64) -> Self {
        Self {
            min: Some(value),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.opt.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintValue {
    Bound(MinOptMax),
    Categorical(Vec<String>),
}

/// A typed value declared by a rule. Immutable once the rule is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintType,
    pub value: ConstraintValue,
    /// Name of the declaring rule.
    pub rule_name: String,
    /// Position of the declaring rule in the document.
    pub rule_priority: usize,
}

impl Constraint {
    pub fn bound(&self) -> Option<&MinOptMax> {
        match &self.value {
            ConstraintValue::Bound(b) => Some(b),
            ConstraintValue::Categorical(_) => None,
        }
    }

    pub fn categories(&self) -> &[String] {
        match &self.value {
            ConstraintValue::Categorical(c) => c,
            ConstraintValue::Bound(_) => &[],
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.bound().and_then(|b| b.min)
    }

    pub fn max(&self) -> Option<f64> {
        self.bound().and_then(|b| b.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_roundtrip() {
        for t in ConstraintType::ALL {
            assert_eq!(t.keyword().parse::<ConstraintType>(), Ok(t));
        }
        assert!("hole_size".parse::<ConstraintType>().is_err());
    }

    #[test]
    fn test_payload_accessors() {
        let c = Constraint {
            kind: ConstraintType::Clearance,
            value: ConstraintValue::Bound(MinOptMax::min(100.0)),
            rule_name: "r".into(),
            rule_priority: 0,
        };
        assert_eq!(c.min(), Some(100.0));
        assert_eq!(c.max(), None);
        assert!(c.categories().is_empty());

        let d = Constraint {
            kind: ConstraintType::Disallow,
            value: ConstraintValue::Categorical(vec!["via".into()]),
            rule_name: "r".into(),
            rule_priority: 1,
        };
        assert!(d.bound().is_none());
        assert_eq!(d.categories(), ["via".to_string()]);
    }
}
