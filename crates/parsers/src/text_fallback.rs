//! CoC checks that reached the chat as plain text instead of a roll
//! template, e.g. `관찰력 기준치: 60/30/12 굴림: 45 판정결과: 보통 성공`.

use regex::Regex;
use rollscribe_core::entry::{DiceInputs, DicePayload};
use rollscribe_core::text::{normalize_text, rendered_text, sanitize_trailing_colon};
use std::sync::LazyLock;

use crate::coc;

pub const TEMPLATE: &str = "coc-text";

static TEXT_CHECK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<skill>.+?)\s*기준치\s*:\s*(?P<success>-?\d+)(?:\s*/\s*-?\d+)*\s*굴림\s*:\s*(?P<roll>-?\d+)(?:\s*판정결과\s*:\s*(?P<result>.*?))?\s*$",
    )
    .unwrap()
});

/// Recover `{skill, success, roll, result?}` from the rendered text of a
/// message fragment.
pub fn parse_text_check(html: &str) -> Option<DicePayload> {
    let text = rendered_text(html);
    let caps = TEXT_CHECK_RE.captures(&text)?;

    let skill = sanitize_trailing_colon(caps.name("skill")?.as_str());
    if skill.is_empty() {
        return None;
    }
    let success = caps.name("success")?.as_str().parse().ok()?;
    let roll = caps.name("roll")?.as_str().parse().ok()?;
    let result = caps
        .name("result")
        .map(|m| normalize_text(m.as_str()))
        .filter(|value| !value.is_empty());

    Some(DicePayload::new(
        coc::RULE,
        TEMPLATE,
        DiceInputs::TextCheck {
            skill,
            success,
            roll,
            result,
        },
    ))
}
