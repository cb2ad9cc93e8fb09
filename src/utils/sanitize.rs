/// Strips every HTML tag from user text, keeping the words in between.
/// Script and style bodies are dropped entirely.
pub fn plain_text(input: &str) -> String {
    ammonia::Builder::empty()
        .clean(input.trim())
        .to_string()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_removed() {
        assert_eq!(plain_text("<b>Hello</b> there"), "Hello there");
        assert_eq!(plain_text("<script>alert(1)</script>ok"), "ok");
        assert_eq!(plain_text("  <p>spaced</p>  "), "spaced");
    }

    #[test]
    fn plain_words_survive() {
        assert_eq!(plain_text("Leaking tap in the kitchen"), "Leaking tap in the kitchen");
        assert_eq!(plain_text("<img src=x onerror=alert(1)>"), "");
    }
}
