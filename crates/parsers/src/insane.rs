//! Insane (インセイン) roll templates: skill checks, ability/item cards and
//! scene/plot tables.

use rollscribe_core::entry::{DiceInputs, DicePayload};
use rollscribe_core::text::{normalize_text, rendered_text, sanitize_trailing_colon};

use crate::RuleParser;
use crate::extract::{
    Element, collect_elements, collect_inline_roll_span_integers,
    extract_element_inner_html_by_class, find_element, inline_roll_in_div,
};

pub const RULE: &str = "insane";

const TEMPLATES: &[&str] = &["insane", "insdice", "insskill", "insdesc", "insplot"];

const EMOTION_TYPE: &str = "감정";
const SCENE_TABLE_TITLE: &str = "장면표";
const PLOT_SKILL_ALIASES: &[(&str, &str)] = &[("파괴", "포박")];

pub struct InsaneRuleParser;

impl RuleParser for InsaneRuleParser {
    fn rule(&self) -> &str {
        RULE
    }

    fn handles(&self, template: &str) -> bool {
        TEMPLATES.contains(&template)
    }

    fn parse(&self, template: &str, html: &str) -> Option<DicePayload> {
        match template {
            "insane" => parse_legacy_check(html),
            "insdice" => parse_skill_check(html),
            "insskill" => parse_ability(html),
            "insdesc" => parse_description(html),
            "insplot" => parse_plot(html),
            _ => None,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn card(
    template: &str,
    kind: Option<String>,
    title: String,
    detail: Option<String>,
) -> DicePayload {
    DicePayload::new(
        RULE,
        template,
        DiceInputs::Card {
            kind,
            title,
            detail,
            skill: None,
            target: None,
            roll: None,
        },
    )
}

/// `<span>type</span><strong>title</strong>` header of the first
/// `div.sheet-subj` that has one.
fn subject_heading(html: &str) -> Option<(String, String)> {
    collect_elements(html, "div", &["sheet-subj"])
        .into_iter()
        .find_map(|subject| {
            let kind = find_element(subject.inner_html, "span", &[])?;
            let title = find_element(subject.inner_html, "strong", &[])?;
            Some((kind.text(), title.text()))
        })
}

fn description_text(html: &str) -> String {
    find_element(html, "div", &["sheet-desc"])
        .map(|el| el.text())
        .unwrap_or_default()
}

/// Legacy `insane` template: the check name sits in the dice area's
/// `<strong>`, the target is the area's last inline roll and the result is
/// the first inline roll of the result box.
fn parse_legacy_check(html: &str) -> Option<DicePayload> {
    let dice_area = extract_element_inner_html_by_class(html, "div", "sheet-dice-area");
    let result = extract_element_inner_html_by_class(html, "div", "sheet-dice-result");
    let check = extract_element_inner_html_by_class(dice_area, "strong", "");
    let check = if check.is_empty() { dice_area } else { check };

    let skill = non_empty(sanitize_trailing_colon(&rendered_text(check)))?;
    let target = *collect_inline_roll_span_integers(dice_area).last()?;
    let roll = *collect_inline_roll_span_integers(result).first()?;
    Some(DicePayload::new(
        RULE,
        "insane-dice",
        DiceInputs::TargetCheck {
            skill,
            target,
            roll,
        },
    ))
}

fn parse_skill_check(html: &str) -> Option<DicePayload> {
    let skill = find_element(html, "div", &["sheet-subj"]).map(|el| el.text())?;
    let skill = non_empty(skill)?;
    let target = inline_roll_in_div(html, "sheet-target")?;
    let roll = inline_roll_in_div(html, "sheet-dice-val")?;
    Some(DicePayload::new(
        RULE,
        "insane-dice",
        DiceInputs::TargetCheck {
            skill,
            target,
            roll,
        },
    ))
}

/// Ability card. The check block (`sheet-data` skill, target, roll) is
/// optional; the header and description are not.
fn parse_ability(html: &str) -> Option<DicePayload> {
    let (kind, title) = subject_heading(html)?;
    let kind = non_empty(kind)?;
    let title = non_empty(title)?;
    let detail = non_empty(description_text(html))?;

    let skill = find_element(html, "div", &["sheet-data"])
        .and_then(|data| find_element(data.inner_html, "div", &["sheet-subj"]))
        .map(|el| el.text())
        .and_then(non_empty);

    Some(DicePayload::new(
        RULE,
        "ability",
        DiceInputs::Card {
            kind: Some(kind),
            title,
            detail: Some(detail),
            skill,
            target: inline_roll_in_div(html, "sheet-target"),
            roll: inline_roll_in_div(html, "sheet-dice-val"),
        },
    ))
}

/// `insdesc` covers three layouts, tried in order: emotion, item card,
/// scene table.
fn parse_description(html: &str) -> Option<DicePayload> {
    let emotion = find_element(html, "div", &["sheet-desc", "sheet-emot"])
        .map(|el| el.text())
        .and_then(non_empty);
    if let Some(title) = emotion {
        return Some(card("emotion", Some(EMOTION_TYPE.to_string()), title, None));
    }

    let detail = description_text(html);
    if let Some((kind, title)) = subject_heading(html)
        && !kind.is_empty()
        && !title.is_empty()
        && !detail.is_empty()
    {
        return Some(card("item", Some(kind), title, Some(detail)));
    }

    let subject = find_element(html, "div", &["sheet-subj"])
        .map(|el| el.text())
        .unwrap_or_default();
    if subject.is_empty() || detail.is_empty() {
        return None;
    }
    Some(card(
        "scene-table",
        None,
        SCENE_TABLE_TITLE.to_string(),
        Some(detail),
    ))
}

/// `"3.Title"` -> `"3. Title"`.
pub fn normalize_plot_title(raw: &str) -> String {
    let text = normalize_text(raw);
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0
        && let Some(rest) = text[digits..].strip_prefix('.')
    {
        return format!("{}. {}", &text[..digits], rest.trim_start());
    }
    text
}

pub fn normalize_plot_skill(raw: &str) -> String {
    let text = normalize_text(raw);
    PLOT_SKILL_ALIASES
        .iter()
        .find(|(from, _)| *from == text)
        .map(|(_, to)| to.to_string())
        .unwrap_or(text)
}

fn emphasis_in(container: &Element<'_>) -> Option<String> {
    find_element(container.inner_html, "em", &[]).map(|em| em.text())
}

fn parse_plot(html: &str) -> Option<DicePayload> {
    let random = find_element(html, "div", &["sheet-random"])?;
    let title = find_element(random.inner_html, "strong", &[])
        .and_then(|strong| emphasis_in(&strong))
        .map(|raw| normalize_plot_title(&raw))
        .and_then(non_empty)?;
    let skill = collect_elements(random.inner_html, "span", &[])
        .iter()
        .find_map(emphasis_in)
        .map(|raw| normalize_plot_skill(&raw))
        .and_then(non_empty)?;

    Some(DicePayload::new(
        RULE,
        "dice",
        DiceInputs::Card {
            kind: None,
            title,
            detail: None,
            skill: Some(skill),
            target: None,
            roll: None,
        },
    ))
}
