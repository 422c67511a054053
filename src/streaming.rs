//! Word-by-word replay of a finished answer.
//!
//! The model returns its answer in one piece; the shells replay it a word at a
//! time so the reply appears to be typed out. Content and order are unchanged.

use std::time::Duration;

use futures::stream::{self, Stream};

/// Splits on single spaces, keeping empty pieces between consecutive spaces,
/// and appends one space to every piece. Empty input yields nothing.
pub fn split_words(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(' ').map(|word| format!("{} ", word)).collect()
}

/// Lazily yields the pieces of [`split_words`], waiting `delay` before every
/// piece except the first.
pub fn stream_words(text: &str, delay: Duration) -> impl Stream<Item = String> + Send + 'static {
    let words = split_words(text).into_iter();
    stream::unfold((words, true), move |(mut words, first)| async move {
        let word = words.next()?;
        if !first && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Some((word, (words, false)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::time::Instant;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("hello world"), vec!["hello ", "world "]);
        assert_eq!(split_words("a  b"), vec!["a ", " ", "b "]);
        assert_eq!(split_words("single"), vec!["single "]);
        assert!(split_words("").is_empty());
    }

    #[test]
    fn test_split_keeps_tabs_and_newlines_inside_words() {
        assert_eq!(
            split_words("Zestofy: \t Focus\non ROI."),
            vec!["Zestofy: ", "\t ", "Focus\non ", "ROI. "]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_paces_words() {
        let delay = Duration::from_millis(100);
        let mut words = Box::pin(stream_words("hello world", delay));

        let start = Instant::now();
        assert_eq!(words.next().await.as_deref(), Some("hello "));
        let first_at = Instant::now();
        assert_eq!(words.next().await.as_deref(), Some("world "));
        let second_at = Instant::now();
        assert_eq!(words.next().await, None);

        assert!(first_at - start < delay);
        assert!(second_at - first_at >= delay);
    }

    #[tokio::test]
    async fn test_stream_empty_text() {
        let words: Vec<String> = stream_words("", Duration::from_millis(100)).collect().await;
        assert!(words.is_empty());
    }

    #[tokio::test]
    async fn test_stream_consecutive_spaces() {
        let words: Vec<String> = stream_words("a  b", Duration::ZERO).collect().await;
        assert_eq!(words, vec!["a ", " ", "b "]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_reassembles_text() {
        let text = "Focus on ROI.";
        let words: Vec<String> = stream_words(text, Duration::from_millis(100)).collect().await;
        assert_eq!(words.concat().trim_end(), text);
    }
}
