/// Slice the outermost `{ ... }` out of a model reply.
///
/// Models asked for JSON still wrap it in code fences or a lead-in sentence
/// now and then. Returns `None` when no brace pair exists.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
