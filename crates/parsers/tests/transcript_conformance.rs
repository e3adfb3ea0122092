use rollscribe_core::entry::Role;
use rollscribe_core::export::entries_to_values;
use rollscribe_core::validate::validate_entries;
use rollscribe_parsers::avatar::ROLL20_BASE_URL;
use rollscribe_parsers::{
    AvatarReplacement, CollectOptions, ExportOptions, ReplacementMaps, TranscriptOptions,
    collect_avatar_mappings, collect_export_messages, export_document,
};
use serde_json::json;
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn session_html() -> String {
    let path = fixture_root().join("session.html");
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("read {}", path.display()))
}

fn visible_only() -> ExportOptions<'static> {
    ExportOptions {
        collect: CollectOptions {
            skip_hidden_placeholders: true,
        },
        ..Default::default()
    }
}

#[test]
fn test_collect_skips_hidden_messages() {
    let html = session_html();
    let all = collect_export_messages(&html, CollectOptions::default());
    let ids: Vec<_> = all.iter().filter_map(|m| m.id.as_deref()).collect();
    assert!(!ids.contains(&"-Nx08"));
    assert!(ids.contains(&"-Nx09"));
    assert_eq!(all.len(), 10);

    let visible = collect_export_messages(
        &html,
        CollectOptions {
            skip_hidden_placeholders: true,
        },
    );
    assert_eq!(visible.len(), 9);
}

#[test]
fn test_session_roles_and_speakers() {
    let entries = export_document(&session_html(), &visible_only());
    let summary: Vec<_> = entries
        .iter()
        .map(|entry| (entry.id.as_str(), entry.speaker.as_str(), entry.role))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("-Nx01", "Alice", Role::Character),
            ("-Nx02", "Alice", Role::Character),
            ("-Nx03", "KP", Role::Dice),
            ("-Nx04", "KP (to Alice)", Role::Dice),
            ("-Nx05", "KP (to Alice)", Role::Secret),
            ("-Nx06", "Bob", Role::Character),
            ("-Nx07", "Bob", Role::Character),
            ("-Nx10", "", Role::System),
            ("-Nx11", "KP", Role::Dice),
        ]
    );
}

#[test]
fn test_first_message_shape() {
    let entries = export_document(&session_html(), &visible_only());
    assert_eq!(
        entries[0].to_value(),
        json!({
            "id": "-Nx01",
            "speaker": "Alice",
            "role": "character",
            "text": "We should check the cellar first.",
            "safetext": "We should check the cellar first.",
            "timestamp": "오후 9:05",
            "speakerImageUrl": "https://app.roll20.net/users/avatar/3307646/30"
        })
    );
}

#[test]
fn test_continuation_keeps_speaker_image() {
    let entries = export_document(&session_html(), &visible_only());
    let second = &entries[1];
    assert_eq!(second.text, "Bring the lantern 🔦 please!");
    assert_eq!(second.safetext, "Bring the lantern please!");
    assert_eq!(
        second.speaker_image_url.as_deref(),
        Some("https://app.roll20.net/users/avatar/3307646/30")
    );
    assert_eq!(second.timestamp, None);
}

#[test]
fn test_san_roll_payload() {
    let entries = export_document(&session_html(), &visible_only());
    let value = entries[2].to_value();
    assert_eq!(
        value["dice"],
        json!({
            "v": 1,
            "source": "roll20",
            "rule": "coc7",
            "template": "coc-1",
            "inputs": {"skill": "SAN", "roll": 67, "success": 55}
        })
    );
    assert_eq!(value["timestamp"], "오후 9:07");
}

#[test]
fn test_private_roll_is_dice() {
    let entries = export_document(&session_html(), &visible_only());
    assert_eq!(
        entries[3].to_value()["dice"]["inputs"],
        json!({"title": "Hidden Noise", "rows": [{"label": "1D100: 42"}]})
    );
    assert!(entries[4].dice.is_none());
}

#[test]
fn test_default_table_on_plain_message() {
    let entries = export_document(&session_html(), &visible_only());
    let value = entries[5].to_value();
    assert_eq!(value["role"], "character");
    assert_eq!(value["textColor"], "#3a5f9e");
    assert_eq!(
        value["dice"],
        json!({
            "v": 1,
            "source": "roll20",
            "rule": "table",
            "template": "default",
            "inputs": {
                "title": "Weather",
                "rows": [
                    {"key": "Sky", "value": "Overcast"},
                    {"key": "Wind", "value": "3 knots"}
                ]
            }
        })
    );
}

#[test]
fn test_unknown_template_has_no_dice_key() {
    let entries = export_document(&session_html(), &visible_only());
    let value = entries[6].to_value();
    assert_eq!(value["id"], "-Nx07");
    assert!(value.get("dice").is_none());
    assert_eq!(value["text"], "Luck Result 12");
}

#[test]
fn test_desc_message_stands_alone() {
    let entries = export_document(&session_html(), &visible_only());
    let value = entries[7].to_value();
    assert_eq!(
        value,
        json!({
            "id": "-Nx10",
            "speaker": "",
            "role": "system",
            "text": "The lights go out.",
            "safetext": "The lights go out."
        })
    );
}

#[test]
fn test_unknown_coc_template_reads_text_check() {
    let entries = export_document(&session_html(), &visible_only());
    let value = entries[8].to_value();
    assert_eq!(value["id"], "-Nx11");
    assert_eq!(
        value["text"],
        "관찰력 기준치: 60/30/12 굴림: 45 판정결과: 보통 성공"
    );
    assert_eq!(
        value["dice"],
        json!({
            "v": 1,
            "source": "roll20",
            "rule": "coc7",
            "template": "coc-text",
            "inputs": {"skill": "관찰력", "success": 60, "roll": 45, "result": "보통 성공"}
        })
    );
}

#[test]
fn test_exported_values_validate() {
    let entries = export_document(&session_html(), &ExportOptions::default());
    let values = entries_to_values(&entries);
    assert_eq!(values.len(), 10);
    assert_eq!(validate_entries(&values), Ok(()));
}

#[test]
fn test_avatar_mappings_and_replacement() {
    let html = session_html();
    let messages = collect_export_messages(&html, CollectOptions::default());
    let mappings = collect_avatar_mappings(&messages, ROLL20_BASE_URL);
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].name, "Alice");

    let maps = ReplacementMaps::build(
        &[AvatarReplacement {
            name: mappings[0].name.clone(),
            original_url: mappings[0].original_url.clone(),
            new_url: "https://i.imgur.com/alice.png".to_string(),
        }],
        ROLL20_BASE_URL,
    );
    let options = ExportOptions {
        transcript: TranscriptOptions {
            replacements: Some(&maps),
            ..Default::default()
        },
        ..visible_only()
    };
    let entries = export_document(&html, &options);
    assert_eq!(
        entries[0].speaker_image_url.as_deref(),
        Some("https://i.imgur.com/alice.png")
    );
    assert_eq!(
        entries[1].speaker_image_url.as_deref(),
        Some("https://i.imgur.com/alice.png")
    );
}
