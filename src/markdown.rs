//! Markdown front-end.
//!
//! Turns a markdown document into a [`Root`] tree, and records every image
//! reference it saw. That set is the caller's tracked set: references the
//! batch driver replaces are removed from it, and whatever remains is copied
//! through to the output by the site build.
//!
//! Rendering is pulldown-cmark's own HTML writer, with tables, footnotes,
//! strikethrough, and task lists enabled. Only images become tree elements:
//! each image's events are swapped for a marker before rendering, and the
//! rendered HTML is split at the markers into [`Node::Raw`] runs around
//! addressable `img` elements.
//!
//! ```text
//! "Hi ![cat](cat.jpg)"  ->  [Raw("<p>Hi "), img(src="cat.jpg", alt="cat"), Raw("</p>\n")]
//! ```

use crate::tree::{Element, Node, Root};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use std::collections::BTreeSet;

/// Result of parsing one markdown document.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub root: Root,
    /// Text of the first level-one heading.
    pub title: Option<String>,
    /// Raw `src` of every markdown image, exactly as written.
    pub image_paths: BTreeSet<String>,
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

fn marker(index: usize) -> String {
    format!("<!--picturize-image:{}-->", index)
}

pub fn parse(markdown: &str) -> ParsedDocument {
    let mut parser = Parser::new_ext(markdown, options());
    let mut events = Vec::new();
    let mut images = Vec::new();
    let mut image_paths = BTreeSet::new();
    let mut title: Option<String> = None;
    let mut heading: Option<String> = None;

    while let Some(event) = parser.next() {
        match event {
            Event::Start(Tag::Image {
                dest_url,
                title: image_title,
                ..
            }) => {
                let alt = image_alt(&mut parser);
                if let Some(text) = heading.as_mut() {
                    text.push_str(&alt);
                }
                let mut img = Element::new("img")
                    .with_attr("src", dest_url.to_string())
                    .with_attr("alt", alt);
                if !image_title.is_empty() {
                    img.set_attr("title", image_title.to_string());
                }
                image_paths.insert(dest_url.to_string());
                events.push(Event::InlineHtml(marker(images.len()).into()));
                images.push(img);
            }
            event => {
                match &event {
                    Event::Start(Tag::Heading {
                        level: HeadingLevel::H1,
                        ..
                    }) if title.is_none() => heading = Some(String::new()),
                    Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                        if let Some(text) = heading.take() {
                            title = Some(text.trim().to_string()).filter(|t| !t.is_empty());
                        }
                    }
                    Event::Text(text) | Event::Code(text) => {
                        if let Some(heading) = heading.as_mut() {
                            heading.push_str(text);
                        }
                    }
                    _ => {}
                }
                events.push(event);
            }
        }
    }

    let mut rendered = String::new();
    html::push_html(&mut rendered, events.into_iter());

    ParsedDocument {
        root: splice(&rendered, images),
        title,
        image_paths,
    }
}

/// Consume an image's inner events up to its end tag, flattening them to
/// plain text. Nested images contribute their own alt text.
fn image_alt(parser: &mut Parser<'_>) -> String {
    let mut alt = String::new();
    let mut depth = 1;
    for event in parser.by_ref() {
        match event {
            Event::Start(Tag::Image { .. }) => depth += 1,
            Event::End(TagEnd::Image) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Text(text) | Event::Code(text) => alt.push_str(&text),
            Event::SoftBreak | Event::HardBreak => alt.push(' '),
            _ => {}
        }
    }
    alt
}

/// Split rendered HTML at the image markers, in order.
fn splice(rendered: &str, images: Vec<Element>) -> Root {
    let mut children = Vec::new();
    let mut rest = rendered;
    for (index, img) in images.into_iter().enumerate() {
        let Some((before, after)) = rest.split_once(marker(index).as_str()) else {
            break;
        };
        push_raw(&mut children, before);
        children.push(img.into());
        rest = after;
    }
    push_raw(&mut children, rest);
    Root::new(children)
}

fn push_raw(children: &mut Vec<Node>, html: &str) {
    if !html.is_empty() {
        children.push(Node::Raw(html.to_string()));
    }
}
