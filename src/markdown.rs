// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Best-effort Markdown to HTML conversion for pull request descriptions.
//!
//! Pull request bodies are written in GitHub flavoured Markdown, but the
//! changelog only needs a readable approximation. The text is parsed with
//! `pulldown-cmark` and a small event walker emits HTML for:
//!
//! * paragraphs and ATX headings,
//! * unordered and ordered lists,
//! * fenced and indented code blocks,
//! * block quotes, nested at most [`MAX_QUOTE_DEPTH`] levels,
//! * code spans, emphasis, strong emphasis and `[text](url)` links,
//! * bare `http(s)://` URLs inside ordinary text.
//!
//! Anything else (raw HTML, tables, images, rules) passes through as its
//! literal source text. Only code contents are escaped; the rest is inserted
//! verbatim, so the output is as trustworthy as its input.

use std::sync::LazyLock;

use html_escape::encode_text;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;

/// Deepest block quote nesting rendered as markup. Further `>` markers on the
/// same line are kept as literal text.
const MAX_QUOTE_DEPTH: usize = 32;

static AUTOLINK: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>()\[\]]+",).expect("valid autolink regex",),);

/// Converts a Markdown fragment to HTML.
///
/// Never fails: empty or whitespace-only input yields an empty string, and
/// text without Markdown syntax comes back wrapped in a single paragraph.
///
/// # Examples
///
/// ```
/// use prlog::render_fragment;
///
/// assert_eq!(render_fragment("Fixes the `loader`."), "<p>Fixes the <code>loader</code>.</p>");
/// assert_eq!(render_fragment("- one\n- two"), "<ul>\n<li>one</li>\n<li>two</li>\n</ul>");
/// assert_eq!(render_fragment(""), "");
/// ```
pub fn render_fragment(text: &str,) -> String
{
    let source = limit_quote_depth(&text.replace("\r\n", "\n",),);
    let mut writer = FragmentWriter::default();
    let mut skipping = 0_usize;

    for (event, range,) in Parser::new(&source,).into_offset_iter() {
        if skipping > 0 {
            match event {
                Event::Start(_,) => skipping += 1,
                Event::End(_,) => skipping -= 1,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(tag,) => {
                if !writer.open(tag,) {
                    writer.literal(source[range].trim_end(),);
                    skipping = 1;
                }
            }
            Event::End(tag,) => writer.close(tag,),
            Event::Text(text,) => writer.text(&text,),
            Event::Code(code,) => writer.code_span(&code,),
            Event::Html(html,) | Event::InlineHtml(html,) => writer.literal(&html,),
            Event::SoftBreak | Event::HardBreak => writer.text("\n",),
            Event::Rule => {
                writer.literal(source[range].trim(),);
                writer.literal("\n",);
            }
            _ => writer.literal(&source[range],),
        }
    }

    writer.finish()
}

/// Escapes the quote marker that would open a block quote deeper than
/// [`MAX_QUOTE_DEPTH`], so the rest of the line is read as text.
fn limit_quote_depth(text: &str,) -> String
{
    let mut limited = String::with_capacity(text.len(),);
    for line in text.split_inclusive('\n',) {
        match quote_overflow(line,) {
            Some(index,) => {
                limited.push_str(&line[..index],);
                limited.push('\\',);
                limited.push_str(&line[index..],);
            }
            None => limited.push_str(line,),
        }
    }
    limited
}

fn quote_overflow(line: &str,) -> Option<usize,>
{
    let mut depth = 0;
    for (index, ch,) in line.char_indices() {
        match ch {
            '>' if depth == MAX_QUOTE_DEPTH => return Some(index,),
            '>' => depth += 1,
            ' ' | '\t' => {}
            _ => return None,
        }
    }
    None
}

#[derive(Debug, Default,)]
struct FragmentWriter
{
    html:       String,
    pending:    String,
    code:       Option<String,>,
    link_depth: usize,
}

impl FragmentWriter
{
    /// Emits the opening markup for `tag`. Returns `false` for tags that are
    /// not rendered, whose source the caller copies instead.
    fn open(&mut self, tag: Tag<'_,>,) -> bool
    {
        self.flush_text();
        let markup = match tag {
            Tag::Paragraph => "<p>".to_owned(),
            Tag::Heading {
                level, ..
            } => format!("<h{}>", heading_rank(level)),
            Tag::BlockQuote(_,) => "<blockquote>\n".to_owned(),
            Tag::CodeBlock(_,) => {
                self.code = Some(String::new(),);
                return true;
            }
            Tag::List(None,) => "<ul>\n".to_owned(),
            Tag::List(Some(_,),) => "<ol>\n".to_owned(),
            Tag::Item => "<li>".to_owned(),
            Tag::Emphasis => "<em>".to_owned(),
            Tag::Strong => "<strong>".to_owned(),
            Tag::Link {
                dest_url, ..
            } => {
                self.link_depth += 1;
                format!("<a href=\"{dest_url}\">")
            }
            Tag::HtmlBlock => return true,
            _ => return false,
        };
        self.html.push_str(&markup,);
        true
    }

    fn close(&mut self, tag: TagEnd,)
    {
        self.flush_text();
        match tag {
            TagEnd::Paragraph => self.html.push_str("</p>\n",),
            TagEnd::Heading(level,) => {
                self.html.push_str(&format!("</h{}>\n", heading_rank(level)),)
            }
            TagEnd::BlockQuote(_,) => self.html.push_str("</blockquote>\n",),
            TagEnd::CodeBlock => {
                let code = self.code.take().unwrap_or_default();
                self.html.push_str(&format!(
                    "<pre><code>{}</code></pre>\n",
                    encode_text(code.trim_end_matches('\n',))
                ),);
            }
            TagEnd::List(true,) => self.html.push_str("</ol>\n",),
            TagEnd::List(false,) => self.html.push_str("</ul>\n",),
            TagEnd::Item => self.html.push_str("</li>\n",),
            TagEnd::Emphasis => self.html.push_str("</em>",),
            TagEnd::Strong => self.html.push_str("</strong>",),
            TagEnd::Link => {
                self.link_depth = self.link_depth.saturating_sub(1,);
                self.html.push_str("</a>",);
            }
            _ => {}
        }
    }

    /// Text is buffered so URLs split across several text events are still
    /// recognized as one.
    fn text(&mut self, text: &str,)
    {
        match self.code.as_mut() {
            Some(code,) => code.push_str(text,),
            None => self.pending.push_str(text,),
        }
    }

    fn code_span(&mut self, code: &str,)
    {
        self.flush_text();
        self.html.push_str(&format!("<code>{}</code>", encode_text(code)),);
    }

    fn literal(&mut self, text: &str,)
    {
        self.flush_text();
        self.html.push_str(text,);
    }

    fn flush_text(&mut self,)
    {
        let pending = std::mem::take(&mut self.pending,);
        if self.link_depth > 0 {
            self.html.push_str(&pending,);
        } else {
            self.html.push_str(&autolink(&pending,),);
        }
    }

    fn finish(mut self,) -> String
    {
        self.flush_text();
        self.html.truncate(self.html.trim_end_matches('\n',).len(),);
        self.html
    }
}

fn heading_rank(level: HeadingLevel,) -> u8
{
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn autolink(text: &str,) -> String
{
    let mut html = String::with_capacity(text.len(),);
    let mut cursor = 0;

    for found in AUTOLINK.find_iter(text,) {
        let url = found.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?',],);
        html.push_str(&text[cursor..found.start()],);
        html.push_str(&format!("<a href=\"{url}\">{url}</a>"),);
        cursor = found.start() + url.len();
    }

    html.push_str(&text[cursor..],);
    html
}
