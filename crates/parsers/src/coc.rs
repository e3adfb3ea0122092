//! Call of Cthulhu 7th edition roll templates (`sheet-rolltemplate-coc*`).

use regex::Regex;
use rollscribe_core::entry::{DiceInputs, DicePayload, MadnessLabel, RowLabel, TemplateRow};
use rollscribe_core::text::{
    extract_all_integers, extract_first_integer, normalize_text, sanitize_trailing_colon,
};
use std::sync::LazyLock;

use crate::RuleParser;
use crate::extract::{
    CellRow, collect_template_rows, collect_template_rows_with_cells,
    collect_template_value_cells, extract_caption_suffix, extract_caption_text,
    find_integer_from_text_by_keyword,
};

pub const RULE: &str = "coc7";

const TEMPLATES: &[&str] = &[
    "coc-1",
    "coc-default",
    "coc-dice-roll",
    "coc-body-hit-loc",
    "coc-init-stc",
    "coc-defence-2",
    "coc-bomadness-rt",
    "coc-bomadness-summ",
    "coc-attack",
    "coc-attack-1",
    "coc",
    "coc-bonus",
];

const ARMOR_TITLE_PREFIX: &str = "장갑(방어구) : ";
const FIREARM_SKILL: &str = "총";

static ROLL_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+roll\s*$").unwrap());

static FIREARM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(라이플|권총|산탄총|총|rifle|pistol|shotgun|smg|gun)").unwrap()
});

static SUCCESS_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)기준치|value").unwrap());
static ROLL_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)굴림|rolled").unwrap());
static DAMAGE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)피해|dam").unwrap());

pub struct CocRuleParser;

impl RuleParser for CocRuleParser {
    fn rule(&self) -> &str {
        RULE
    }

    fn handles(&self, template: &str) -> bool {
        TEMPLATES.contains(&template)
    }

    fn parse(&self, template: &str, html: &str) -> Option<DicePayload> {
        match template {
            "coc-1" | "coc-default" => parse_skill_check(html),
            "coc-dice-roll" | "coc-body-hit-loc" => parse_titled_rows(template, html),
            "coc-init-stc" => parse_init_stc(html),
            "coc-defence-2" => parse_defence(html),
            "coc-bomadness-rt" | "coc-bomadness-summ" => parse_bout_of_madness(template, html),
            "coc-attack" => parse_attack(html),
            "coc-attack-1" => parse_single_attack(html),
            "coc" => parse_plain_check(html),
            "coc-bonus" => parse_bonus_check(html),
            _ => None,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn find_row<'a>(rows: &'a [CellRow], label: &Regex) -> Option<&'a CellRow> {
    rows.iter().find(|row| label.is_match(&row.label))
}

fn row_integer(rows: &[CellRow], label: &Regex) -> Option<i64> {
    find_row(rows, label).and_then(|row| extract_first_integer(&row.value))
}

fn row_integers(rows: &[CellRow], label: &Regex) -> Vec<i64> {
    find_row(rows, label)
        .map(|row| extract_all_integers(&row.value))
        .unwrap_or_default()
}

fn payload(template: &str, inputs: DiceInputs) -> DicePayload {
    DicePayload::new(RULE, template, inputs)
}

/// `coc-1` / `coc-default`: caption `"<skill> Roll"`, value cells
/// `[success, roll]`.
fn parse_skill_check(html: &str) -> Option<DicePayload> {
    let caption = extract_caption_text(html);
    let skill = non_empty(ROLL_SUFFIX_RE.replace(&caption, "").trim().to_string())?;
    let cells = collect_template_value_cells(html);
    let success = extract_first_integer(cells.first()?)?;
    let roll = extract_first_integer(cells.get(1)?)?;
    Some(payload(
        "coc-1",
        DiceInputs::SkillCheck {
            skill,
            roll,
            success,
        },
    ))
}

fn parse_titled_rows(template: &str, html: &str) -> Option<DicePayload> {
    let title = non_empty(extract_caption_text(html))?;
    let rows: Vec<TemplateRow> = collect_template_rows(html)
        .into_iter()
        .map(TemplateRow::text)
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(payload(template, DiceInputs::Rows { title, rows }))
}

fn parse_init_stc(html: &str) -> Option<DicePayload> {
    let title = non_empty(extract_caption_text(html))?;
    let rows = collect_template_rows_with_cells(html);
    let first = rows.first()?;
    if first.label.is_empty() && first.value.is_empty() {
        return None;
    }
    let label = normalize_text(&format!(
        "{}: {}",
        sanitize_trailing_colon(&first.label),
        first.value
    ));
    Some(payload(
        "coc-init-stc",
        DiceInputs::Rows {
            title,
            rows: vec![TemplateRow::text(label)],
        },
    ))
}

fn parse_defence(html: &str) -> Option<DicePayload> {
    let caption = non_empty(extract_caption_text(html))?;
    let rows = collect_template_rows_with_cells(html);
    let value = extract_first_integer(&rows.first()?.value)?;
    Some(payload(
        "coc-defence-2",
        DiceInputs::Rows {
            title: format!("{ARMOR_TITLE_PREFIX}{caption}"),
            rows: vec![TemplateRow::text(value.to_string())],
        },
    ))
}

fn parse_bout_of_madness(template: &str, html: &str) -> Option<DicePayload> {
    let title = non_empty(extract_caption_suffix(&extract_caption_text(html)))?;
    let cells = collect_template_value_cells(html);
    let heading = non_empty(sanitize_trailing_colon(cells.first()?))?;
    let detail = non_empty(normalize_text(cells.get(1)?))?;

    let real_time = template == "coc-bomadness-rt";
    let label = MadnessLabel {
        title: heading,
        detail,
        duration: find_integer_from_text_by_keyword(&cells, "duration"),
        number: real_time
            .then(|| find_integer_from_text_by_keyword(&cells, "mania number"))
            .flatten(),
        rounds: real_time
            .then(|| find_integer_from_text_by_keyword(&cells, "rounds"))
            .flatten(),
    };

    Some(payload(
        template,
        DiceInputs::Rows {
            title,
            rows: vec![TemplateRow {
                label: RowLabel::Madness(label),
            }],
        },
    ))
}

/// Firearm captions collapse to one skill name.
pub fn map_attack_skill(caption: &str) -> String {
    let safe = normalize_text(caption);
    if !safe.is_empty() && FIREARM_RE.is_match(&safe) {
        FIREARM_SKILL.to_string()
    } else {
        safe
    }
}

fn parse_attack(html: &str) -> Option<DicePayload> {
    let caption = non_empty(extract_caption_text(html))?;
    let rows = collect_template_rows_with_cells(html);
    if rows.is_empty() {
        return None;
    }
    let success = row_integer(&rows, &SUCCESS_LABEL_RE)?;
    let rolls = row_integers(&rows, &ROLL_LABEL_RE);
    if rolls.is_empty() {
        return None;
    }
    let damage = row_integer(&rows, &DAMAGE_LABEL_RE)?;
    Some(payload(
        "coc-attack",
        DiceInputs::Attack {
            skill: map_attack_skill(&caption),
            success,
            rolls,
            damage,
        },
    ))
}

fn parse_single_attack(html: &str) -> Option<DicePayload> {
    let skill = non_empty(extract_caption_text(html))?;
    let rows = collect_template_rows_with_cells(html);
    let success = row_integer(&rows, &SUCCESS_LABEL_RE)?;
    let damage = row_integer(&rows, &DAMAGE_LABEL_RE)?;
    Some(payload(
        "coc-attack-1",
        DiceInputs::Attack {
            skill,
            success,
            rolls: vec![success],
            damage,
        },
    ))
}

/// Bare `coc`: success is the first number of the rolled row.
fn parse_plain_check(html: &str) -> Option<DicePayload> {
    let skill = non_empty(extract_caption_text(html))?;
    let rows = collect_template_rows_with_cells(html);
    let rolls = row_integers(&rows, &ROLL_LABEL_RE);
    let success = *rolls.first()?;
    Some(payload(
        "coc",
        DiceInputs::SkillRolls {
            skill: Some(skill),
            success,
            rolls,
        },
    ))
}

/// `coc-bonus` renders the success column as `full/half/fifth`; only the
/// full value is kept.
fn parse_bonus_check(html: &str) -> Option<DicePayload> {
    let rows = collect_template_rows_with_cells(html);
    let success = row_integer(&rows, &SUCCESS_LABEL_RE)?;
    let rolls = row_integers(&rows, &ROLL_LABEL_RE);
    if rolls.is_empty() {
        return None;
    }
    Some(payload(
        "coc",
        DiceInputs::SkillRolls {
            skill: non_empty(extract_caption_text(html)),
            success,
            rolls,
        },
    ))
}
