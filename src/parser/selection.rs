use log::trace;

use crate::markup::{events, MarkupEvent};

/// Values of the `<option>`s of the `<select name="{field_name}">`, in document order.
///
/// An `<option>` without a `value` attribute contributes its text, as a browser would submit it.
/// An absent field yields an empty list.
pub fn extract_options(markup: &str, field_name: &str) -> Vec<String> {
    let mut collector = OptionCollector::new(field_name);
    for event in &events(markup) {
        collector.feed(event);
    }
    collector.finish()
}

/// The day and hour choices offered by the playlist form.
#[derive(Debug)]
pub struct Selection {
    pub days: Vec<String>,
    pub hours: Vec<String>,
}

pub fn parse(markup: &str, day_field: &str, hour_field: &str) -> Selection {
    let mut days = OptionCollector::new(day_field);
    let mut hours = OptionCollector::new(hour_field);
    for event in &events(markup) {
        days.feed(event);
        hours.feed(event);
    }
    let selection = Selection {
        days: days.finish(),
        hours: hours.finish(),
    };
    trace!("Selection: {selection:?}");
    selection
}

struct OptionCollector<'f> {
    field_name: &'f str,
    current_field: Option<String>,
    text_of_option: Option<String>,
    options: Vec<String>,
}

impl<'f> OptionCollector<'f> {
    fn new(field_name: &'f str) -> Self {
        Self {
            field_name,
            current_field: None,
            text_of_option: None,
            options: vec![],
        }
    }

    fn feed(&mut self, event: &MarkupEvent) {
        match event {
            MarkupEvent::Open(tag) if tag.name() == "select" => {
                self.flush_option();
                self.current_field = tag.attr("name").map(str::to_owned);
            }
            MarkupEvent::Open(tag) if tag.name() == "option" => {
                // `</option>` is optional.
                self.flush_option();
                if self.current_field.as_deref() == Some(self.field_name) {
                    match tag.attr("value") {
                        Some(value) => self.options.push(value.to_owned()),
                        None => self.text_of_option = Some(String::new()),
                    }
                }
            }
            MarkupEvent::Text(text) => {
                if let Some(buffer) = &mut self.text_of_option {
                    buffer.push_str(text);
                }
            }
            MarkupEvent::Close(name) if name == "option" || name == "select" => {
                self.flush_option();
            }
            _ => {}
        }
    }

    fn flush_option(&mut self) {
        if let Some(text) = self.text_of_option.take() {
            self.options.push(text.trim().to_owned());
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush_option();
        self.options
    }
}
