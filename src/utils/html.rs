// src/utils/html.rs

/// Strips markup from free text typed by teachers (exam descriptions, grading
/// feedback) before it is stored.
///
/// Whitelist-based: harmless inline tags survive, `<script>` and event
/// handler attributes do not. Plain text passes through unchanged apart from
/// entity escaping of stray `<`/`>`.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
