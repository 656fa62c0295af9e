//! Resolved administrative hierarchy for a point.

use serde::{Deserialize, Serialize};

use super::{RegionRef, RegionType};

/// One optional region per tier.
///
/// Unset fields are a normal outcome: they mean no region of that tier
/// covers the point, or the tier was not reachable from the matched region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionHierarchy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<RegionRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ac: Option<RegionRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc: Option<RegionRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<RegionRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RegionRef>,
}

impl RegionHierarchy {
    /// Set the entry for a given tier
    pub fn set(&mut self, tier: RegionType, entry: Option<RegionRef>) {
        match tier {
            RegionType::Ward => self.ward = entry,
            RegionType::Ac => self.ac = entry,
            RegionType::Pc => self.pc = entry,
            RegionType::District => self.district = entry,
            RegionType::State => self.state = entry,
        }
    }

    /// Get the entry for a given tier
    pub fn get(&self, tier: RegionType) -> Option<&RegionRef> {
        match tier {
            RegionType::Ward => self.ward.as_ref(),
            RegionType::Ac => self.ac.as_ref(),
            RegionType::Pc => self.pc.as_ref(),
            RegionType::District => self.district.as_ref(),
            RegionType::State => self.state.as_ref(),
        }
    }

    /// Identifier at a tier, if resolved
    pub fn id(&self, tier: RegionType) -> Option<&str> {
        self.get(tier).map(|r| r.id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        RegionType::precedence().iter().all(|t| self.get(*t).is_none())
    }
}
