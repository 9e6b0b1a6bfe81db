// src/utils/html.rs

/// Strips unsafe markup from user-supplied listing text with `ammonia`.
///
/// Safe inline tags such as `<b>` and `<p>` survive; `<script>` elements are
/// removed together with their content, as are event-handler attributes.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Removes every tag from plain-text fields, keeping only the text.
///
/// `<script>` and `<style>` contents go with their tags.
pub fn strip_tags(input: &str) -> String {
    ammonia::Builder::empty()
        .clean_content_tags(["script", "style"].into_iter().collect())
        .clean(input)
        .to_string()
}
