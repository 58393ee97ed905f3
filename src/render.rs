use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::Result;

/// Print a markdown report to stdout with colors and styling
pub fn print_report(markdown: &str) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    render_report(&mut stdout, markdown)
}

/// Render markdown into any color-capable writer
pub fn render_report<W: WriteColor>(out: &mut W, markdown: &str) -> Result<()> {
    let parser = Parser::new_ext(markdown, Options::all());
    let mut state = FormatState::new();

    for event in parser {
        state.handle_event(out, event)?;
    }
    out.reset()?;
    out.flush()?;
    Ok(())
}

/// Tracks the current formatting state
struct FormatState {
    list_level: usize,
    /// Next number per open list, `None` for bullet lists
    list_numbers: Vec<Option<u64>>,
    format_stack: Vec<ColorSpec>,
    table_cell: usize,
}

impl FormatState {
    fn new() -> Self {
        Self {
            list_level: 0,
            list_numbers: Vec::new(),
            format_stack: Vec::new(),
            table_cell: 0,
        }
    }

    fn handle_event<W: WriteColor>(&mut self, out: &mut W, event: Event) -> Result<()> {
        match event {
            Event::Start(tag) => self.handle_start(out, tag),
            Event::End(tag_end) => self.handle_end(out, tag_end),
            Event::Text(text) => {
                write!(out, "{}", text)?;
                Ok(())
            }
            Event::Code(code) => self.write_inline_code(out, &code),
            Event::SoftBreak | Event::HardBreak => {
                writeln!(out)?;
                Ok(())
            }
            Event::Rule => {
                writeln!(out, "{}", "─".repeat(40))?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn push_spec<W: WriteColor>(&mut self, out: &mut W, spec: ColorSpec) -> Result<()> {
        out.set_color(&spec)?;
        self.format_stack.push(spec);
        Ok(())
    }

    fn pop_spec<W: WriteColor>(&mut self, out: &mut W) -> Result<()> {
        self.format_stack.pop();
        match self.format_stack.last() {
            Some(spec) => out.set_color(spec)?,
            None => out.reset()?,
        }
        Ok(())
    }

    fn handle_start<W: WriteColor>(&mut self, out: &mut W, tag: Tag) -> Result<()> {
        match tag {
            Tag::Heading { level, .. } => {
                let level_color = match level {
                    HeadingLevel::H1 => Color::Rgb(255, 99, 71),
                    HeadingLevel::H2 => Color::Rgb(70, 130, 180),
                    _ => Color::Cyan,
                };
                if level == HeadingLevel::H1 {
                    writeln!(out)?;
                }
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(level_color)).set_bold(true);
                self.push_spec(out, spec)?;
            }
            Tag::Paragraph => {
                if self.list_level == 0 {
                    writeln!(out)?;
                }
            }
            Tag::Strong => {
                let mut spec = ColorSpec::new();
                spec.set_bold(true);
                self.push_spec(out, spec)?;
            }
            Tag::Emphasis => {
                let mut spec = ColorSpec::new();
                spec.set_italic(true);
                self.push_spec(out, spec)?;
            }
            Tag::BlockQuote(_) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Yellow));
                self.push_spec(out, spec)?;
                write!(out, "  │ ")?;
            }
            Tag::CodeBlock(kind) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Green));
                self.push_spec(out, spec.clone())?;
                writeln!(out)?;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        let mut lang_spec = ColorSpec::new();
                        lang_spec.set_fg(Some(Color::Blue)).set_italic(true);
                        out.set_color(&lang_spec)?;
                        writeln!(out, "[{}]", lang)?;
                        out.set_color(&spec)?;
                    }
                }
            }
            Tag::List(start) => {
                self.list_level += 1;
                self.list_numbers.push(start);
            }
            Tag::Item => {
                let indent = "  ".repeat(self.list_level.saturating_sub(1));
                match self.list_numbers.last_mut() {
                    Some(Some(n)) => {
                        write!(out, "{}{:2}. ", indent, n)?;
                        *n += 1;
                    }
                    _ => write!(out, "{}• ", indent)?,
                }
            }
            Tag::Link { .. } => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Blue)).set_underline(true);
                self.push_spec(out, spec)?;
            }
            Tag::TableHead => {
                let mut spec = ColorSpec::new();
                spec.set_bold(true);
                self.push_spec(out, spec)?;
                self.table_cell = 0;
            }
            Tag::TableRow => self.table_cell = 0,
            Tag::TableCell => {
                if self.table_cell > 0 {
                    write!(out, " │ ")?;
                }
                self.table_cell += 1;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_end<W: WriteColor>(&mut self, out: &mut W, tag_end: TagEnd) -> Result<()> {
        match tag_end {
            TagEnd::Heading(_) => {
                self.pop_spec(out)?;
                writeln!(out)?;
            }
            TagEnd::Paragraph => {
                if self.list_level == 0 {
                    writeln!(out)?;
                }
            }
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Link => self.pop_spec(out)?,
            TagEnd::BlockQuote(_) | TagEnd::CodeBlock => {
                self.pop_spec(out)?;
                writeln!(out)?;
            }
            TagEnd::List(_) => {
                self.list_level = self.list_level.saturating_sub(1);
                self.list_numbers.pop();
                if self.list_level == 0 {
                    writeln!(out)?;
                }
            }
            TagEnd::Item => writeln!(out)?,
            TagEnd::TableHead => {
                self.pop_spec(out)?;
                writeln!(out)?;
            }
            TagEnd::TableRow => writeln!(out)?,
            TagEnd::Table => writeln!(out)?,
            _ => {}
        }
        Ok(())
    }

    fn write_inline_code<W: WriteColor>(&self, out: &mut W, code: &str) -> Result<()> {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "`{}`", code)?;

        match self.format_stack.last() {
            Some(spec) => out.set_color(spec)?,
            None => out.reset()?,
        }
        Ok(())
    }
}
