//! Plan tiers and the watermark policy attached to them.

use serde::{Deserialize, Deserializer, Serialize};

/// Plan tier enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Trial,
    Paid,
    Pro,
    Studio,
}

impl PlanTier {
    /// Parse from string (case-insensitive). Unknown tiers are treated as free.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "trial" => PlanTier::Trial,
            "paid" => PlanTier::Paid,
            "pro" => PlanTier::Pro,
            "studio" => PlanTier::Studio,
            _ => PlanTier::Free,
        }
    }

    /// Whether exports on this tier must carry a watermark.
    pub fn requires_watermark(&self) -> bool {
        matches!(self, PlanTier::Free | PlanTier::Trial)
    }

    /// Get the plan name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Trial => "trial",
            PlanTier::Paid => "paid",
            PlanTier::Pro => "pro",
            PlanTier::Studio => "studio",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlanTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(PlanTier::from_str).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_tier_from_string() {
        assert_eq!(PlanTier::from_str("free"), PlanTier::Free);
        assert_eq!(PlanTier::from_str("trial"), PlanTier::Trial);
        assert_eq!(PlanTier::from_str("PAID"), PlanTier::Paid);
        assert_eq!(PlanTier::from_str("Pro"), PlanTier::Pro);
        assert_eq!(PlanTier::from_str("studio"), PlanTier::Studio);
        assert_eq!(PlanTier::from_str("enterprise-ish"), PlanTier::Free);
    }

    #[test]
    fn test_watermark_policy() {
        assert!(PlanTier::Free.requires_watermark());
        assert!(PlanTier::Trial.requires_watermark());
        assert!(!PlanTier::Paid.requires_watermark());
        assert!(!PlanTier::Pro.requires_watermark());
        assert!(!PlanTier::Studio.requires_watermark());
    }

    #[test]
    fn test_deserialize_lenient() {
        let tier: PlanTier = serde_json::from_str(r#""paid""#).unwrap();
        assert_eq!(tier, PlanTier::Paid);
        let tier: PlanTier = serde_json::from_str(r#""mystery""#).unwrap();
        assert_eq!(tier, PlanTier::Free);
        let tier: PlanTier = serde_json::from_str("null").unwrap();
        assert_eq!(tier, PlanTier::Free);
    }
}
