//! Post text composition.
//!
//! A randomly chosen caption line, the strip's long-form date and title,
//! then fixed hashtags and attribution. Sunday strips (the big color ones)
//! draw from their own caption pool.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::seq::SliceRandom;

const CAPTIONS: &[&str] = &[
    "Time for some Calvin and Hobbes wisdom! \u{1f42f}",
    "Starting the day with Calvin's adventures! \u{1f31f}",
    "A dose of childhood nostalgia coming up! \u{1f4da}",
    "Philosophy with Calvin and Hobbes! \u{1f914}",
    "Time to explore with Calvin and his tiger friend! \u{1f3a8}",
    "Ready for some Calvin and Hobbes magic? \u{2728}",
    "Let's see what trouble Calvin's getting into today! \u{1f30d}",
    "Another classic Calvin and Hobbes moment! \u{1f31f}",
    "Time for imagination and adventure! \u{1f680}",
    "Join Calvin and Hobbes in today's exploration! \u{1f5fa}\u{fe0f}",
];

const SUNDAY_CAPTIONS: &[&str] = &[
    "Sunday special: a full-color Calvin and Hobbes! \u{1f308}",
    "Big Sunday strip, big Sunday adventures! \u{2600}\u{fe0f}",
    "The Sunday funnies wouldn't be the same without these two! \u{1f4f0}",
];

/// Pick a caption for the strip's date.
pub fn pick_caption(date: NaiveDate) -> &'static str {
    let pool = if date.weekday() == Weekday::Sun {
        SUNDAY_CAPTIONS
    } else {
        CAPTIONS
    };
    // Pools are non-empty constants.
    pool.choose(&mut rand::thread_rng()).copied().unwrap_or(CAPTIONS[0])
}

/// The body below the caption: date line, optional title, hashtags,
/// attribution.
pub fn body_text(date: NaiveDate, title: Option<&str>) -> String {
    let date_str = date.format("%B %d, %Y").to_string();

    let mut lines = vec![format!("\u{1f4d6} Calvin and Hobbes - {date_str}")];
    if let Some(title) = title {
        lines.push(format!("\n{title}"));
    }
    lines.push("\n#CalvinAndHobbes #Comics #Nostalgia".to_string());
    lines.push("Original by Bill Watterson".to_string());

    lines.join("\n")
}

/// Full post text: caption, blank line, body.
pub fn compose(date: NaiveDate, title: Option<&str>) -> String {
    format!("{}\n\n{}", pick_caption(date), body_text(date, title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn body_contains_date_and_attribution() {
        let body = body_text(d(2024, 1, 15), None);
        assert!(body.contains("January 15, 2024"));
        assert!(body.contains("#CalvinAndHobbes"));
        assert!(body.ends_with("Original by Bill Watterson"));
    }

    #[test]
    fn body_includes_title_when_present() {
        let body = body_text(d(2024, 1, 15), Some("Snow Day"));
        assert!(body.contains("Snow Day"));
        // title sits between the date line and the hashtags
        let title_idx = body.find("Snow Day").unwrap();
        let tags_idx = body.find("#CalvinAndHobbes").unwrap();
        assert!(title_idx < tags_idx);
    }

    #[test]
    fn weekday_caption_comes_from_main_pool() {
        // 2024-01-15 is a Monday
        let caption = pick_caption(d(2024, 1, 15));
        assert!(CAPTIONS.contains(&caption));
    }

    #[test]
    fn sunday_caption_comes_from_sunday_pool() {
        // 2024-01-14 is a Sunday
        let caption = pick_caption(d(2024, 1, 14));
        assert!(SUNDAY_CAPTIONS.contains(&caption));
    }

    #[test]
    fn compose_has_caption_and_body() {
        let text = compose(d(2024, 1, 15), Some("Snow Day"));
        let (caption, rest) = text.split_once("\n\n").unwrap();
        assert!(CAPTIONS.contains(&caption));
        assert!(rest.contains("January 15, 2024"));
    }
}
