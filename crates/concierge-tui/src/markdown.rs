//! Lightweight markup for bot messages

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Render markup into styled terminal lines.
///
/// Covers bold, italic, code spans and blocks, links, lists and headings.
/// Anything else falls through as plain text.
pub fn render(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(base);
    for event in Parser::new_ext(text, Options::empty()) {
        renderer.handle(event);
    }
    renderer.finish()
}

/// One line per source line, no markup interpretation
pub fn plain(text: &str, base: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(Span::styled(line.to_string(), base)))
        .collect()
}

struct Renderer {
    base: Style,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    bold: usize,
    italic: usize,
    heading: bool,
    code_block: bool,
    link: Option<String>,
    list_depth: usize,
}

impl Renderer {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            current: Vec::new(),
            bold: 0,
            italic: 0,
            heading: false,
            code_block: false,
            link: None,
            list_depth: 0,
        }
    }

    fn style(&self) -> Style {
        let mut style = self.base;
        if self.bold > 0 || self.heading {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.link.is_some() {
            style = style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    fn code_style(&self) -> Style {
        self.base.fg(Color::Yellow)
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank_line(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::from(""));
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Paragraph => {
                    if self.list_depth == 0 {
                        self.blank_line();
                    }
                }
                Tag::Heading { .. } => {
                    self.blank_line();
                    self.heading = true;
                }
                Tag::Strong => self.bold += 1,
                Tag::Emphasis => self.italic += 1,
                Tag::CodeBlock(_) => {
                    self.blank_line();
                    self.code_block = true;
                }
                Tag::Link { dest_url, .. } => self.link = Some(dest_url.to_string()),
                Tag::List(_) => {
                    self.flush();
                    self.list_depth += 1;
                }
                Tag::Item => {
                    self.flush();
                    let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                    self.current
                        .push(Span::styled(format!("{}• ", indent), self.base));
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph | TagEnd::Item => self.flush(),
                TagEnd::Heading(_) => {
                    self.heading = false;
                    self.flush();
                }
                TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
                TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
                TagEnd::CodeBlock => {
                    self.code_block = false;
                    self.flush();
                }
                TagEnd::Link => {
                    if let Some(url) = self.link.take() {
                        self.current.push(Span::styled(
                            format!(" ({})", url),
                            self.base.fg(Color::DarkGray),
                        ));
                    }
                }
                TagEnd::List(_) => {
                    self.flush();
                    self.list_depth = self.list_depth.saturating_sub(1);
                }
                _ => {}
            },
            Event::Text(text) => {
                if self.code_block {
                    for line in text.lines() {
                        self.current
                            .push(Span::styled(format!("  {}", line), self.code_style()));
                        self.flush();
                    }
                } else {
                    let style = self.style();
                    self.current.push(Span::styled(text.to_string(), style));
                }
            }
            Event::Code(code) => {
                self.current
                    .push(Span::styled(code.to_string(), self.code_style()));
            }
            Event::SoftBreak => self.current.push(Span::styled(" ", self.base)),
            Event::HardBreak => self.flush(),
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.first().is_some_and(|line| line.width() == 0) {
            self.lines.remove(0);
        }
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}
