use crate::keywords::KeywordSet;

pub const STORY: &str = include_str!("../data/prompts/story.txt");
pub const STORY_STYLE: &str = include_str!("../data/prompts/story_style.txt");
pub const IMAGE: &str = include_str!("../data/prompts/image.txt");
pub const PLACEHOLDER_STORY: &str = include_str!("../data/prompts/placeholder_story.txt");

/// Marker that precedes the keyword list in the story prompt.
pub const KEYWORD_MARKER: &str = "키워드:";

const UNKNOWN_SUBJECT: &str = "어떤 존재";
const TITLE_SUFFIX: &str = "에 관한 이야기";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

pub fn story_prompt(keywords: &KeywordSet) -> String {
    render(STORY, &[("keywords", &keywords.join(", "))])
        .trim()
        .to_string()
}

/// Story prompt plus the narration-style directive sent to the provider.
pub fn styled_story_prompt(prompt: &str) -> String {
    render(STORY_STYLE, &[("prompt", prompt)]).trim().to_string()
}

pub fn image_prompt(story: &str) -> String {
    render(IMAGE, &[("story", story.trim())]).trim().to_string()
}

/// Canned story for placeholder mode, built around the prompt's keywords.
pub fn placeholder_story(prompt: &str) -> String {
    let subject = prompt
        .split_once(KEYWORD_MARKER)
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
        .unwrap_or(UNKNOWN_SUBJECT);

    render(PLACEHOLDER_STORY, &[("subject", subject)])
        .trim()
        .to_string()
}

pub fn title_for(keywords: &KeywordSet) -> String {
    format!("{}{}", keywords.first(), TITLE_SUFFIX)
}
