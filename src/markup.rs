//! A flat, document-ordered view of a page as written.
//!
//! Events come straight from the HTML tokenizer, so stray `<tr>`s and `<td>`s survive even
//! outside of a `<table>`.  Extractors in [`crate::parser`] are reducers over these events.

use html5ever::{
    tendril::StrTendril,
    tokenizer::{
        states::RawKind, BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer,
        TokenizerOpts,
    },
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
}
impl StartTag {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of the first attribute called `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value.as_str()))
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MarkupEvent {
    Open(StartTag),
    Text(String),
    Close(String),
}

/// Tokenizes `markup`.  Character references are resolved, adjacent text is merged,
/// and a self-closing tag yields both [`MarkupEvent::Open`] and [`MarkupEvent::Close`].
pub fn events(markup: &str) -> Vec<MarkupEvent> {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(markup));
    let mut tokenizer = Tokenizer::new(EventSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    tokenizer.sink.events
}

#[derive(Default)]
struct EventSink {
    events: Vec<MarkupEvent>,
}

impl TokenSink for EventSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let attrs = tag
                            .attrs
                            .iter()
                            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                            .collect();
                        self.events.push(MarkupEvent::Open(StartTag {
                            name: name.clone(),
                            attrs,
                        }));
                        if tag.self_closing {
                            self.events.push(MarkupEvent::Close(name));
                        } else {
                            // The tokenizer alone does not know where raw text elements end.
                            match &*name {
                                "script" => return TokenSinkResult::RawData(RawKind::ScriptData),
                                "style" => return TokenSinkResult::RawData(RawKind::Rawtext),
                                "title" | "textarea" => {
                                    return TokenSinkResult::RawData(RawKind::Rcdata)
                                }
                                _ => {}
                            }
                        }
                    }
                    TagKind::EndTag => self.events.push(MarkupEvent::Close(name)),
                }
            }
            Token::CharacterTokens(text) => match self.events.last_mut() {
                Some(MarkupEvent::Text(last)) => last.push_str(&text),
                _ => self.events.push(MarkupEvent::Text(text.to_string())),
            },
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
