//! Role classification from the structure of one `div.message`.

use rollscribe_core::entry::{Role, RoleFlags};
use scraper::ElementRef;

const SYSTEM_CLASSES: &[&str] = &["desc", "em", "emas"];
const SECRET_CLASS: &str = "private";
const DICE_TEMPLATE_CLASS_PREFIX: &str = "sheet-rolltemplate-coc";

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|token| token == class)
}

/// The element itself followed by every descendant element.
fn self_and_descendants(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.descendants().filter_map(ElementRef::wrap)
}

pub(crate) fn child_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Direct child `span.by`, the speaker line.
pub(crate) fn speaker_span(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    child_elements(el).find(|child| child.value().name() == "span" && has_class(*child, "by"))
}

pub(crate) fn contains_any_class(el: ElementRef<'_>, classes: &[&str]) -> bool {
    self_and_descendants(el).any(|node| classes.iter().any(|class| has_class(node, class)))
}

fn is_dice_message(el: ElementRef<'_>) -> bool {
    let after_speaker = speaker_span(el).and_then(|by| by.next_siblings().find_map(ElementRef::wrap));
    if after_speaker.is_some_and(|next| {
        next.value()
            .classes()
            .any(|token| token.starts_with(DICE_TEMPLATE_CLASS_PREFIX))
    }) {
        return true;
    }

    // Raw class attribute substring on any descendant, not a token match.
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|node| {
            node.value()
                .attr("class")
                .is_some_and(|class| class.contains(DICE_TEMPLATE_CLASS_PREFIX))
        })
}

pub fn collect_role_flags(el: ElementRef<'_>) -> RoleFlags {
    RoleFlags {
        is_system: contains_any_class(el, SYSTEM_CLASSES),
        is_secret: contains_any_class(el, &[SECRET_CLASS]),
        is_dice: is_dice_message(el),
    }
}

pub fn resolve_role_for_message(el: ElementRef<'_>) -> Role {
    collect_role_flags(el).resolve()
}
