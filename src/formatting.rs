use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static EMOJI_SHORTCODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("+1", "\u{1F44D}");
    m.insert("thumbsup", "\u{1F44D}");
    m.insert("-1", "\u{1F44E}");
    m.insert("thumbsdown", "\u{1F44E}");
    m.insert("heart", "\u{2764}\u{FE0F}");
    m.insert("joy", "\u{1F602}");
    m.insert("tada", "\u{1F389}");
    m.insert("thinking", "\u{1F914}");
    m.insert("thinking_face", "\u{1F914}");
    m.insert("eyes", "\u{1F440}");
    m.insert("smile", "\u{1F604}");
    m.insert("grinning", "\u{1F600}");
    m.insert("laughing", "\u{1F606}");
    m.insert("wink", "\u{1F609}");
    m.insert("blush", "\u{1F60A}");
    m.insert("sunglasses", "\u{1F60E}");
    m.insert("heart_eyes", "\u{1F60D}");
    m.insert("sob", "\u{1F62D}");
    m.insert("cry", "\u{1F622}");
    m.insert("scream", "\u{1F631}");
    m.insert("fire", "\u{1F525}");
    m.insert("100", "\u{1F4AF}");
    m.insert("rocket", "\u{1F680}");
    m.insert("star", "\u{2B50}");
    m.insert("wave", "\u{1F44B}");
    m.insert("pray", "\u{1F64F}");
    m.insert("clap", "\u{1F44F}");
    m.insert("muscle", "\u{1F4AA}");
    m.insert("ok_hand", "\u{1F44C}");
    m.insert("raised_hands", "\u{1F64C}");
    m.insert("check", "\u{2705}");
    m.insert("white_check_mark", "\u{2705}");
    m.insert("x", "\u{274C}");
    m.insert("warning", "\u{26A0}\u{FE0F}");
    m.insert("question", "\u{2753}");
    m.insert("exclamation", "\u{2757}");
    m
});

/// The quick-reaction set offered in the message view.
pub const REACTION_PICKER: [&str; 6] = [
    "\u{1F44D}",
    "\u{2764}\u{FE0F}",
    "\u{1F602}",
    "\u{1F389}",
    "\u{1F914}",
    "\u{1F440}",
];

static IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://\S+\.(?:jpg|jpeg|gif|png)").expect("image url pattern")
});

pub fn emoji_from_shortcode(name: &str) -> Option<&'static str> {
    EMOJI_SHORTCODES.get(name).copied()
}

fn is_shortcode_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '+')
}

/// Replace :emoji_name: patterns in text with Unicode characters.
pub fn convert_shortcodes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(':') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        if let Some(end) = after.find(':') {
            let name = &after[..end];
            if is_shortcode_name(name) {
                if let Some(emoji) = emoji_from_shortcode(name) {
                    result.push_str(emoji);
                    rest = &after[end + 1..];
                    continue;
                }
            }
        }
        result.push(':');
        rest = after;
    }
    result.push_str(rest);
    result
}

/// Resolve a reaction argument: a shortcode (with or without colons) or a
/// raw emoji, returned as the emoji to send.
pub fn normalize_emoji(arg: &str) -> String {
    let name = arg.trim().trim_matches(':');
    match emoji_from_shortcode(name) {
        Some(emoji) => emoji.to_string(),
        None => arg.trim().to_string(),
    }
}

/// Image URLs embedded in a message body, rendered as distinct markers.
pub fn find_image_urls(text: &str) -> Vec<String> {
    IMAGE_URL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Server timestamps come as "YYYY-MM-DD HH:MM:SS"; show the clock time.
pub fn format_timestamp(created_at: &str) -> String {
    match NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt.format("%H:%M").to_string(),
        Err(_) => created_at.to_string(),
    }
}
