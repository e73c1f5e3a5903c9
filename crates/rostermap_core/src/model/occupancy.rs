//! Occupancy categories and their glyph symbols.

/// Occupancy category of one address.
///
/// Classification is total: anything unrecognized is [`Occupancy::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupancy {
    Unknown,
    Vacant,
    Permanent,
    Occasional,
    Holidays,
    Accommodation,
    Business,
}

impl Occupancy {
    pub const ALL: [Occupancy; 7] = [
        Occupancy::Unknown,
        Occupancy::Vacant,
        Occupancy::Permanent,
        Occupancy::Occasional,
        Occupancy::Holidays,
        Occupancy::Accommodation,
        Occupancy::Business,
    ];

    /// Classifies a roster category. Matching is exact after trimming.
    pub fn classify(category: Option<&str>) -> Self {
        let Some(category) = category.map(str::trim) else {
            return Self::Unknown;
        };
        Self::ALL
            .into_iter()
            .find(|occupancy| occupancy.label() == category)
            .unwrap_or(Self::Unknown)
    }

    /// Category label as written in the roster and the legend.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Vacant => "Vacant",
            Self::Permanent => "Permanent",
            Self::Occasional => "Occasional",
            Self::Holidays => "Holidays",
            Self::Accommodation => "Accommodation",
            Self::Business => "Business",
        }
    }

    /// `id` of the `<symbol>` drawn for this category.
    pub fn symbol_id(self) -> &'static str {
        match self {
            Self::Unknown => "question_mark_symbol",
            Self::Vacant => "empty_square_symbol",
            Self::Permanent => "house_symbol",
            Self::Occasional => "bach_symbol",
            Self::Holidays => "bach_in_sun_symbol",
            Self::Accommodation => "bedroom_symbol",
            Self::Business => "warehouse_symbol",
        }
    }

    /// Cross-reference value for `xlink:href`.
    pub fn glyph_href(self) -> String {
        format!("#{}", self.symbol_id())
    }
}
