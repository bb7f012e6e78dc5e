use crate::palettes::ColorPalette;

pub const PRIZE_STYLE_TEMPLATE: &str = include_str!("../resources/prize_style.txt");
pub const BANNER_STYLE_TEMPLATE: &str = include_str!("../resources/banner_style.txt");

/// Banners enumerate at most this many prize names.
pub const BANNER_PRIZE_LIMIT: usize = 6;

const PRIZE_CLOSING: &str = "Use a cute pastel gradient background that complements the product's colors (soft pink, lavender, mint, sky blue).";
const BANNER_FALLBACK_PRIZES: &str = "various collectible items";

/// Style template, subject (with or without a lookup phase), optional notes,
/// closing background directive; blank-line separated.
pub fn compose_prize_prompt(
    prize_name: &str,
    game_name: &str,
    notes: Option<&str>,
    grounded: bool,
) -> String {
    let mut parts = vec![PRIZE_STYLE_TEMPLATE.trim().to_string()];

    let subject = if grounded {
        format!(
            "FIRST: Use Google Search to look up what \"{prize_name}\" looks like. This is a real collectible product.\n\
             Find reference images of the actual product to understand its appearance, shape, colors, and distinctive features.\n\
             \n\
             THEN: Create a 2D pastel illustration of this EXACT product \"{prize_name}\".\n\
             - The illustration must accurately represent the real product's appearance\n\
             - Keep all distinctive features, colors, and design elements from the real product\n\
             - Render it in a cute, simplified pastel art style\n\
             - Make it look like a desirable collectible prize\n\
             \n\
             This is a prize for the \"{game_name}\" claw machine game.\n\
             The final image should be instantly recognizable as \"{prize_name}\" to someone who knows the product."
        )
    } else {
        format!(
            "Subject: Create a 2D pastel illustration of \"{prize_name}\".\n\
             This is a prize for the \"{game_name}\" claw machine game.\n\
             The item should be rendered in a cute, simplified pastel art style.\n\
             Make it look like a cute, desirable collectible that players would want to win."
        )
    };
    parts.push(subject);

    if let Some(notes) = notes.map(str::trim).filter(|value| !value.is_empty()) {
        parts.push(format!("Additional details: {notes}"));
    }

    parts.push(PRIZE_CLOSING.to_string());
    parts.join("\n\n")
}

/// Style template followed by the game, its first [`BANNER_PRIZE_LIMIT`]
/// prizes and the palette's colours.
pub fn compose_banner_prompt<S: AsRef<str>>(
    game_name: &str,
    prize_names: &[S],
    palette: &ColorPalette,
) -> String {
    let prize_list = if prize_names.is_empty() {
        BANNER_FALLBACK_PRIZES.to_string()
    } else {
        prize_names
            .iter()
            .take(BANNER_PRIZE_LIMIT)
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(", ")
    };

    let mut colors = format!(
        "Claw machine colors: Use {} as the main machine color, with {} accents.",
        palette.primary, palette.secondary
    );
    if let Some(accent) = palette.accent {
        colors.push_str(&format!(" Small highlight details can use {accent}."));
    }

    let subject = format!(
        "Game Name: \"{game_name}\"\n\
         Prizes to show INSIDE the claw machine: {prize_list}\n\
         \n\
         {colors}\n\
         \n\
         Create a cute 2D kawaii claw machine arcade game illustration.\n\
         - The claw machine cabinet should be filled with these prizes: {prize_list}\n\
         - Show the prizes piled up inside the glass display area\n\
         - The claw should be visible, hovering or grabbing one of the prizes\n\
         - Use pastel colors for the machine frame matching the color scheme above\n\
         - Background should be a soft pastel gradient that complements the machine colors\n\
         \n\
         Match the style of the reference image - a cute pastel claw machine illustration."
    );

    [BANNER_STYLE_TEMPLATE.trim().to_string(), subject].join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::{
        compose_banner_prompt, compose_prize_prompt, BANNER_STYLE_TEMPLATE,
        PRIZE_STYLE_TEMPLATE,
    };
    use crate::palettes::{resolve, DEFAULT_PALETTE};

    #[test]
    fn prize_prompt_starts_with_template_and_ends_with_background() {
        let prompt = compose_prize_prompt("Labubu Mini", "Labubu", None, false);
        assert!(prompt.starts_with(PRIZE_STYLE_TEMPLATE.trim()));
        assert!(prompt.ends_with("(soft pink, lavender, mint, sky blue)."));
        assert!(prompt.contains("\"Labubu Mini\""));
        assert!(prompt.contains("\"Labubu\" claw machine game"));
        assert!(!prompt.contains("Additional details"));
    }

    #[test]
    fn grounded_prize_prompt_has_lookup_phase_first() {
        let grounded = compose_prize_prompt("AirPods Max", "Tech", None, true);
        let lookup = grounded.find("FIRST: Use Google Search").unwrap_or(usize::MAX);
        let render = grounded.find("THEN: Create").unwrap_or(0);
        assert!(lookup < render);

        let direct = compose_prize_prompt("AirPods Max", "Tech", None, false);
        assert!(!direct.contains("Google Search"));
        assert!(direct.contains("Subject: Create a 2D pastel illustration"));
    }

    #[test]
    fn prize_notes_are_appended_before_closing() {
        let prompt = compose_prize_prompt("Bath", "Smiski", Some(" glows in the dark "), false);
        let notes = prompt
            .find("Additional details: glows in the dark")
            .unwrap_or(usize::MAX);
        let closing = prompt.find("Use a cute pastel gradient").unwrap_or(0);
        assert!(notes < closing);

        let blank = compose_prize_prompt("Bath", "Smiski", Some("   "), false);
        assert!(!blank.contains("Additional details"));
    }

    #[test]
    fn banner_prompt_caps_prize_list_at_six() {
        let prizes = [
            "Alpha Plush",
            "Bravo Keychain",
            "Charlie Figure",
            "Delta Pin",
            "Echo Sticker",
            "Foxtrot Mug",
            "Golf Hoodie",
            "Hotel Poster",
        ];
        let prompt = compose_banner_prompt("Labubu", &prizes, &resolve("Labubu"));
        assert!(prompt.starts_with(BANNER_STYLE_TEMPLATE.trim()));
        for name in &prizes[..6] {
            assert!(prompt.contains(name), "missing {name}");
        }
        assert!(!prompt.contains("Golf Hoodie"));
        assert!(!prompt.contains("Hotel Poster"));
    }

    #[test]
    fn banner_prompt_embeds_palette_colors() {
        let palette = resolve("Labubu");
        let prompt = compose_banner_prompt("Labubu", &["Mini"], &palette);
        assert!(prompt.contains(&format!("Use {} as the main machine color", palette.primary)));
        assert!(prompt.contains(&format!("with {} accents", palette.secondary)));
    }

    #[test]
    fn banner_prompt_without_prizes_uses_fallback() {
        let prompt = compose_banner_prompt::<&str>("Mystery", &[], &DEFAULT_PALETTE);
        assert!(prompt.contains("Prizes to show INSIDE the claw machine: various collectible items"));
    }
}
