use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAccent {
    Amber,
    Red,
    Gray,
    Violet,
    Emerald,
    Fuchsia,
}

impl ViewAccent {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Amber => (180, 83, 9),
            Self::Red => (220, 38, 38),
            Self::Gray => (31, 41, 55),
            Self::Violet => (124, 58, 237),
            Self::Emerald => (5, 150, 105),
            Self::Fuchsia => (192, 38, 211),
        }
    }

    /// ANSI 256-colour index closest to the accent.
    pub fn ansi(self) -> u8 {
        match self {
            Self::Amber => 130,
            Self::Red => 160,
            Self::Gray => 236,
            Self::Violet => 93,
            Self::Emerald => 29,
            Self::Fuchsia => 164,
        }
    }
}

/// One labelled cell of the composite analysis grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub accent: ViewAccent,
}

/// Columns of the composite grid; views fill it row by row.
pub const GRID_COLUMNS: usize = 2;
pub const GRID_ROWS: usize = 3;

pub const VIEW_DEFINITIONS: [ViewDefinition; 6] = [
    ViewDefinition {
        id: "brown",
        title: "Brown Spots",
        description: "Pigmentation & Melanin",
        accent: ViewAccent::Amber,
    },
    ViewDefinition {
        id: "red",
        title: "Red Areas",
        description: "Vascular & Inflammation",
        accent: ViewAccent::Red,
    },
    ViewDefinition {
        id: "uv",
        title: "UV Spots",
        description: "Deep Sun Damage",
        accent: ViewAccent::Gray,
    },
    ViewDefinition {
        id: "wood",
        title: "Wood's Light",
        description: "Porphyrins & Bacteria",
        accent: ViewAccent::Violet,
    },
    ViewDefinition {
        id: "wrinkles",
        title: "Wrinkles",
        description: "Polarized Texture & Lines",
        accent: ViewAccent::Emerald,
    },
    ViewDefinition {
        id: "pores",
        title: "Pores",
        description: "Surface Topography",
        accent: ViewAccent::Fuchsia,
    },
];

/// Zero-based `(row, column)` of a view in the grid.
pub fn grid_cell(index: usize) -> (usize, usize) {
    (index / GRID_COLUMNS, index % GRID_COLUMNS)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{grid_cell, ViewAccent, GRID_COLUMNS, GRID_ROWS, VIEW_DEFINITIONS};

    #[test]
    fn six_unique_views_fill_the_grid() {
        assert_eq!(VIEW_DEFINITIONS.len(), GRID_COLUMNS * GRID_ROWS);
        let ids = VIEW_DEFINITIONS
            .iter()
            .map(|view| view.id)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), VIEW_DEFINITIONS.len());
        assert_eq!(grid_cell(0), (0, 0));
        assert_eq!(grid_cell(3), (1, 1));
        assert_eq!(grid_cell(5), (2, 1));
    }

    #[test]
    fn every_view_has_a_distinct_accent() {
        let accents = VIEW_DEFINITIONS
            .iter()
            .map(|view| view.accent.ansi())
            .collect::<HashSet<_>>();
        assert_eq!(accents.len(), VIEW_DEFINITIONS.len());
        assert_eq!(VIEW_DEFINITIONS[3].title, "Wood's Light");
        assert_eq!(VIEW_DEFINITIONS[5].accent, ViewAccent::Fuchsia);
    }
}
