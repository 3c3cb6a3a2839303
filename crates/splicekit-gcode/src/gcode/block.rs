//! Block classes and structural marker comments

use serde::{Deserialize, Serialize};

/// Semantic block an instruction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockClass {
    /// Model printing
    #[default]
    Normal,
    /// Start of a toolchange block
    ToolStart,
    /// Filament unload inside a toolchange
    ToolUnload,
    /// Purge (wipe) inside a toolchange
    ToolPurge,
    /// Empty tower grid without a toolchange
    Empty,
    /// First layer tower brim
    Brim,
    /// Closes the brim measurement window
    BrimEnd,
    /// End of an empty grid
    EndGrid,
    /// Pure comment
    Comment,
    /// End of a purge block
    EndPurge,
    /// Transition back to model printing
    ToNormal,
}

impl BlockClass {
    /// Entering this class reclassifies instructions back to the last tower entry
    pub fn triggers_backpass(self) -> bool {
        matches!(
            self,
            Self::Brim | Self::ToolStart | Self::ToolUnload | Self::Empty
        )
    }

    /// Classes that belong to a toolchange sequence
    pub fn is_toolchange(self) -> bool {
        matches!(self, Self::ToolStart | Self::ToolUnload | Self::ToolPurge)
    }

    /// Classes whose extrusion is purge material
    pub fn is_purge(self) -> bool {
        matches!(self, Self::ToolPurge | Self::EndPurge | Self::Empty)
    }
}

/// Structural marker comments written by the slicer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    BrimStart,
    BrimEnd,
    EmptyGridStart,
    EmptyGridEnd,
    ToolchangeStart,
    ToolchangeUnload,
    ToolchangeWipe,
    ToolchangeEnd,
}

impl Marker {
    pub const ALL: [Marker; 8] = [
        Marker::BrimStart,
        Marker::BrimEnd,
        Marker::EmptyGridStart,
        Marker::EmptyGridEnd,
        Marker::ToolchangeStart,
        Marker::ToolchangeUnload,
        Marker::ToolchangeWipe,
        Marker::ToolchangeEnd,
    ];

    /// The literal marker text
    pub fn text(self) -> &'static str {
        match self {
            Self::BrimStart => "; CP WIPE TOWER FIRST LAYER BRIM START",
            Self::BrimEnd => "; CP WIPE TOWER FIRST LAYER BRIM END",
            Self::EmptyGridStart => "; CP EMPTY GRID START",
            Self::EmptyGridEnd => "; CP EMPTY GRID END",
            Self::ToolchangeStart => "; CP TOOLCHANGE START",
            Self::ToolchangeUnload => "; CP TOOLCHANGE UNLOAD",
            Self::ToolchangeWipe => "; CP TOOLCHANGE WIPE",
            Self::ToolchangeEnd => "; CP TOOLCHANGE END",
        }
    }

    /// Recognize a marker by exact match of the trimmed line
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        Self::ALL.into_iter().find(|m| m.text() == line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_exact_match() {
        for marker in Marker::ALL {
            assert_eq!(Marker::parse(marker.text()), Some(marker));
        }
        assert_eq!(
            Marker::parse("  ; CP TOOLCHANGE END  "),
            Some(Marker::ToolchangeEnd)
        );
        assert_eq!(Marker::parse("; CP TOOLCHANGE ENDS"), None);
        assert_eq!(Marker::parse(";CP TOOLCHANGE END"), None);
    }

    #[test]
    fn test_backpass_classes() {
        assert!(BlockClass::Brim.triggers_backpass());
        assert!(BlockClass::Empty.triggers_backpass());
        assert!(!BlockClass::ToolPurge.triggers_backpass());
        assert!(!BlockClass::Normal.triggers_backpass());
        assert_eq!(BlockClass::default(), BlockClass::Normal);
    }
}
