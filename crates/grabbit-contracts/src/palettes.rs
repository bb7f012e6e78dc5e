use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorPalette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: Option<&'static str>,
}

impl ColorPalette {
    const fn new(primary: &'static str, secondary: &'static str, accent: &'static str) -> Self {
        Self {
            primary,
            secondary,
            accent: Some(accent),
        }
    }

    const fn two_tone(primary: &'static str, secondary: &'static str) -> Self {
        Self {
            primary,
            secondary,
            accent: None,
        }
    }
}

pub const DEFAULT_PALETTE: ColorPalette = ColorPalette::new("#B8E4F0", "#A1E5CC", "#F7ABAD");

/// Keyword table. Order is significant: the first keyword found in the
/// lower-cased category name wins.
pub const CATEGORY_PALETTES: &[(&str, ColorPalette)] = &[
    ("labubu", ColorPalette::new("#E8B4BC", "#F5E6E8", "#D4A5A5")),
    ("skullpanda", ColorPalette::new("#2D2D2D", "#4A4A4A", "#9B59B6")),
    ("hacipupu", ColorPalette::new("#98D8C8", "#F7DC6F", "#F5B7B1")),
    ("crybaby", ColorPalette::new("#AED6F1", "#D5DBDB", "#F9E79F")),
    ("sonny angel", ColorPalette::new("#F9E79F", "#FADBD8", "#D5F5E3")),
    ("smiski", ColorPalette::new("#D5F5E3", "#A9DFBF", "#F9E79F")),
    ("tech", ColorPalette::new("#D6EAF8", "#E8DAEF", "#FCF3CF")),
    ("audio", ColorPalette::two_tone("#E8DAEF", "#D6EAF8")),
    ("gaming", ColorPalette::two_tone("#AED6F1", "#F5B7B1")),
    ("pokemon", ColorPalette::new("#F9E79F", "#AED6F1", "#F5B7B1")),
    ("one piece", ColorPalette::new("#F5B7B1", "#F9E79F", "#AED6F1")),
    ("stanley", ColorPalette::new("#A9DFBF", "#D5F5E3", "#F9E79F")),
    ("magic", ColorPalette::new("#E8DAEF", "#D6EAF8", "#F5B7B1")),
    ("jellycat", ColorPalette::new("#FADBD8", "#F5EEF8", "#D5F5E3")),
    ("anime", ColorPalette::new("#AED6F1", "#F5B7B1", "#F9E79F")),
    ("sanrio", ColorPalette::new("#F5B7B1", "#FADBD8", "#F9E79F")),
];

/// Resolves the palette for a game or category name. Total: unmatched names
/// get [`DEFAULT_PALETTE`].
pub fn resolve(category_name: &str) -> ColorPalette {
    let lowered = category_name.to_lowercase();
    CATEGORY_PALETTES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, palette)| *palette)
        .unwrap_or(DEFAULT_PALETTE)
}
