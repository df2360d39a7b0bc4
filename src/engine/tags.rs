//! HTML tag counting
//!
//! Runs the html5ever tokenizer (no tree building) over a document and
//! counts every start tag and self-closing tag by name. End tags, text,
//! comments and doctypes are ignored, so `<p>lol</p>` counts one `p`.

use std::collections::HashMap;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};
use thiserror::Error;

use super::models::Element;

#[derive(Debug, Error)]
pub enum TagCountError {
    #[error("tokenizer suspended before end of input")]
    Suspended,
}

/// Occurrences per tag name, local to one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCounts(HashMap<String, usize>);

impl TagCounts {
    pub fn get(&self, tag_name: &str) -> usize {
        self.0.get(tag_name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Emission order is unspecified.
    pub fn into_elements(self) -> Vec<Element> {
        self.0
            .into_iter()
            .map(|(tag_name, count)| Element { tag_name, count })
            .collect()
    }
}

/// Count start and self-closing tags in `body`.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn count_tags(body: &[u8]) -> Result<TagCounts, TagCountError> {
    let text = String::from_utf8_lossy(body).into_owned();

    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from(text));

    let mut tokenizer = Tokenizer::new(TagSink::default(), TokenizerOpts::default());
    let outcome = tokenizer.feed(&mut input);
    tokenizer.end();

    match outcome {
        TokenizerResult::Done => Ok(TagCounts(tokenizer.sink.counts)),
        TokenizerResult::Script(_) => Err(TagCountError::Suspended),
    }
}

#[derive(Default)]
struct TagSink {
    counts: HashMap<String, usize>,
}

impl TokenSink for TagSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            self_closing,
            ..
        }) = token
        else {
            return TokenSinkResult::Continue;
        };

        *self.counts.entry(name.to_string()).or_insert(0) += 1;

        // Without a tree builder the tokenizer never leaves the data state
        // on its own, so `<script>a<b</script>` would yield a bogus `b`.
        if self_closing {
            return TokenSinkResult::Continue;
        }
        match &*name {
            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
            "plaintext" => TokenSinkResult::Plaintext,
            _ => TokenSinkResult::Continue,
        }
    }
}
