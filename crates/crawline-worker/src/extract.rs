//! Article text extraction.
//!
//! The extractor is a pure collaborator: raw record payload in, text or
//! nothing out. The default implementation streams the HTML through
//! lol_html, collecting text nodes and suppressing the content of
//! script/style/noscript subtrees.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lol_html::{HtmlRewriter, Settings, text};

/// Pure text-extraction capability: `None` means nothing extractable.
pub trait TextExtractor {
    fn extract(&self, raw: &[u8]) -> Option<String>;
}

/// Default extractor: collects text content from HTML, skipping
/// script/style/noscript, and collapses whitespace runs.
#[derive(Debug, Default)]
pub struct HtmlTextExtractor;

impl TextExtractor for HtmlTextExtractor {
    fn extract(&self, raw: &[u8]) -> Option<String> {
        let collected: Rc<RefCell<String>> = Rc::new(RefCell::new(String::new()));
        let sink = collected.clone();
        // Removing an element only drops it from the rewriter output;
        // text handlers still fire for its content. Suppression is
        // tracked explicitly: the first handler flags chunks inside
        // unwanted subtrees, and the collector drops flagged chunks,
        // clearing the flag at the end of each text node.
        let suppressed = Rc::new(Cell::new(false));
        let marker = suppressed.clone();

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    text!("script, style, noscript", move |_| {
                        marker.set(true);
                        Ok(())
                    }),
                    text!("*", move |t| {
                        if suppressed.get() {
                            if t.last_in_text_node() {
                                suppressed.set(false);
                            }
                            return Ok(());
                        }
                        let mut buf = sink.borrow_mut();
                        buf.push_str(t.as_str());
                        buf.push(' ');
                        Ok(())
                    }),
                ],
                ..Settings::default()
            },
            |_: &[u8]| {},
        );

        if rewriter.write(raw).is_err() || rewriter.end().is_err() {
            return None;
        }

        let raw_text = collected.borrow();
        let text: String = raw_text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() { None } else { Some(text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_paragraph_text() {
        let html = b"<html><body><p>Hello world.</p><p>Second paragraph.</p></body></html>";
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert!(text.contains("Hello world."));
        assert!(text.contains("Second paragraph."));
    }

    #[test]
    fn skips_script_and_style() {
        let html = b"<html><head><style>body{color:red}</style></head>\
<body><script>var x = 1;</script><p>Visible</p></body></html>";
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert!(text.contains("Visible"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color:red"));
    }

    #[test]
    fn script_and_style_between_paragraphs_do_not_leak() {
        let html = b"<style>p{color:red}</style><script>var secret = 42;</script><p>Real text</p>";
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert_eq!(text, "Real text");
    }

    #[test]
    fn noscript_content_skipped() {
        let html = b"<body><noscript><p>Enable JavaScript</p></noscript><p>Kept</p></body>";
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert!(text.contains("Kept"));
        assert!(!text.contains("Enable JavaScript"));
    }

    #[test]
    fn text_between_scripts_still_collected() {
        let html = b"<script>a();</script><p>one</p><script>b();</script><p>two</p>";
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert_eq!(text, "one two");
    }

    #[test]
    fn collapses_whitespace() {
        let html = b"<p>one\n\n   two\t three</p>";
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert_eq!(text, "one two three");
    }

    #[test]
    fn empty_document_yields_none() {
        assert!(HtmlTextExtractor.extract(b"").is_none());
        assert!(HtmlTextExtractor.extract(b"<html><body></body></html>").is_none());
    }

    #[test]
    fn markup_only_yields_none() {
        assert!(HtmlTextExtractor.extract(b"<div><img src=\"x.png\"></div>").is_none());
    }
}
