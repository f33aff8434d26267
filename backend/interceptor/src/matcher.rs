use crate::dom::Dom;

const APPROVE_KEYWORD: &str = "approve";

/// Whether a control label identifies an approval action.
pub fn is_approve_label(raw: &str) -> bool {
    let txt = raw.trim().to_lowercase();
    if txt.is_empty() {
        return false;
    }
    // Exact label first; the substring check below also catches "Approved",
    // "Approve request" and similar variants.
    if txt == APPROVE_KEYWORD {
        return true;
    }
    txt.contains(APPROVE_KEYWORD)
}

pub fn is_approve_control<D: Dom>(dom: &D, node: &D::Node) -> bool {
    is_approve_label(&dom.text(node))
}
