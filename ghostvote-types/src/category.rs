use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The ballot categories a proposal can compete in.
///
/// The wire identifiers date from the contract's gallery origins and do not
/// match the display names, see [`Category::descriptor`].
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    #[default]
    #[serde(rename = "best-photography")]
    Photography,
    #[serde(rename = "best-digital")]
    Digital,
    #[serde(rename = "best-abstract")]
    Abstract,
    #[serde(rename = "best-contemporary")]
    Contemporary,
}

/// Presentation data attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

const TECH: Descriptor = Descriptor {
    name: "Tech Innovation",
    icon: "🔬",
    description: "Technical breakthroughs, product innovation and research projects",
};

const SOCIAL: Descriptor = Descriptor {
    name: "Social Good",
    icon: "🌍",
    description: "Environment, education and charitable projects",
};

const CREATIVE: Descriptor = Descriptor {
    name: "Creative Design",
    icon: "🎨",
    description: "Design proposals, artwork and brand planning",
};

const BUSINESS: Descriptor = Descriptor {
    name: "Business Model",
    icon: "💼",
    description: "Startups, business plans and go-to-market proposals",
};

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Photography,
        Category::Digital,
        Category::Abstract,
        Category::Contemporary,
    ];

    /// Identifier used by the contract.
    pub fn id(self) -> &'static str {
        match self {
            Self::Photography => "best-photography",
            Self::Digital => "best-digital",
            Self::Abstract => "best-abstract",
            Self::Contemporary => "best-contemporary",
        }
    }

    pub fn descriptor(self) -> &'static Descriptor {
        match self {
            Self::Photography => &TECH,
            Self::Digital => &SOCIAL,
            Self::Abstract => &CREATIVE,
            Self::Contemporary => &BUSINESS,
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
