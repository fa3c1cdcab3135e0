use ammonia::Builder;

/// Strips all markup from user-supplied display text (quiz titles,
/// descriptions, prompts, choices).
///
/// These fields are plain text, so unlike a whitelist-based clean nothing
/// is preserved; `<script>alert(1)</script>` and `<b>bold</b>` both reduce
/// to their text content. Canonical answers are NOT passed through here:
/// grading compares them verbatim.
pub fn sanitize_text(input: &str) -> String {
    Builder::empty().clean(input).to_string()
}
