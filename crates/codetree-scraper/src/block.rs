/// Whether a page title signals that the crawler was denied content.
#[must_use]
pub fn is_block_title(title: &str) -> bool {
    title.contains("403") || title.to_lowercase().contains("forbidden")
}
