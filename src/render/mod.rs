//! Math-aware text rendering.
//!
//! [`render`] turns a model answer (LaTeX fragments plus markdown-lite) into
//! an ordered block list. The work is phased so later phases never re-scan
//! text an earlier phase converted: display math, then inline math (both in
//! [`scan`]), then a line-oriented pass here for bold spans, list items,
//! blank lines, and paragraphs. Typesetting is delegated per fragment to a
//! [`Typesetter`]; a fragment that fails to typeset degrades to its raw
//! source text without aborting the rest of the render.

pub mod scan;
pub mod typeset;

pub use typeset::{NullTypesetter, TexTypesetter, TypesetError, Typesetter};

use tracing::warn;

use scan::Segment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Math(String),
    Bold(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    MathDisplay(String),
    Paragraph(Vec<Inline>),
    ListItem { ordered: bool, spans: Vec<Inline> },
    LineBreak,
}

pub fn render(raw: &str, typesetter: &dyn Typesetter) -> Vec<Block> {
    if !typesetter.available() {
        return vec![Block::Paragraph(vec![Inline::Text(raw.to_string())])];
    }

    let mut assembler = LineAssembler::default();
    for segment in scan::segment(raw) {
        match segment {
            Segment::MathDisplay(src) => assembler.push_display(&src, typesetter),
            Segment::MathInline(src) => assembler.push_inline_math(&src, typesetter),
            Segment::Text(text) => assembler.push_text(&text),
        }
    }
    assembler.finish()
}

#[derive(Default)]
struct LineAssembler {
    blocks: Vec<Block>,
    line: Vec<Inline>,
    /// A display block was emitted on the current source line, so an empty
    /// remainder is residue of that line, not a blank line.
    line_consumed_by_display: bool,
}

impl LineAssembler {
    fn push_display(&mut self, src: &str, typesetter: &dyn Typesetter) {
        self.flush_partial_line();
        match typesetter.typeset(src) {
            Ok(rendered) => self.blocks.push(Block::MathDisplay(rendered)),
            Err(e) => {
                warn!("display math fragment failed to typeset, keeping raw text: {e}");
                self.blocks
                    .push(Block::Paragraph(vec![Inline::Text(format!("$${src}$$"))]));
            }
        }
        self.line_consumed_by_display = true;
    }

    fn push_inline_math(&mut self, src: &str, typesetter: &dyn Typesetter) {
        match typesetter.typeset(src) {
            Ok(rendered) => self.line.push(Inline::Math(rendered)),
            Err(e) => {
                warn!("inline math fragment failed to typeset, keeping raw text: {e}");
                self.line.push(Inline::Text(format!("${src}$")));
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            if !first.is_empty() {
                self.line.push(Inline::Text(first.to_string()));
            }
        }
        for piece in pieces {
            self.end_line();
            if !piece.is_empty() {
                self.line.push(Inline::Text(piece.to_string()));
            }
        }
    }

    /// A newline was consumed: close out the current line, emitting an
    /// explicit break for a genuinely blank one.
    fn end_line(&mut self) {
        if line_is_blank(&self.line) {
            self.line.clear();
            if !self.line_consumed_by_display {
                self.blocks.push(Block::LineBreak);
            }
        } else {
            let block = finish_line(std::mem::take(&mut self.line));
            self.blocks.push(block);
        }
        self.line_consumed_by_display = false;
    }

    /// Flush whatever precedes a display block on the same source line,
    /// without emitting a break when there is nothing pending.
    fn flush_partial_line(&mut self) {
        if !line_is_blank(&self.line) {
            let block = finish_line(std::mem::take(&mut self.line));
            self.blocks.push(block);
        }
        self.line.clear();
    }

    fn finish(mut self) -> Vec<Block> {
        if !line_is_blank(&self.line) {
            let block = finish_line(std::mem::take(&mut self.line));
            self.blocks.push(block);
        }
        self.blocks
    }
}

fn line_is_blank(spans: &[Inline]) -> bool {
    spans
        .iter()
        .all(|span| matches!(span, Inline::Text(t) if t.trim().is_empty()))
}

/// Turn one accumulated line into a paragraph or a list item: strip a list
/// marker off the leading text span, then expand `**bold**` runs.
fn finish_line(mut spans: Vec<Inline>) -> Block {
    let mut ordered_marker: Option<bool> = None;
    if let Some(Inline::Text(first)) = spans.first_mut() {
        let trimmed = first.trim_start();
        if let Some(rest) = trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("- ")) {
            ordered_marker = Some(false);
            *first = rest.to_string();
        } else if let Some(rest) = strip_ordered_marker(trimmed) {
            ordered_marker = Some(true);
            *first = rest.to_string();
        }
    }

    let spans: Vec<Inline> = spans
        .into_iter()
        .flat_map(|span| match span {
            Inline::Text(text) => parse_bold(&text),
            other => vec![other],
        })
        .collect();

    match ordered_marker {
        Some(ordered) => Block::ListItem { ordered, spans },
        None => Block::Paragraph(spans),
    }
}

fn strip_ordered_marker(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

/// Split `**bold**` runs out of a text span. Unpaired or empty markers stay
/// literal.
fn parse_bold(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;
    while let Some(open_rel) = text[cursor..].find("**") {
        let open = cursor + open_rel;
        match text[open + 2..].find("**") {
            Some(close_rel) => {
                let close = open + 2 + close_rel;
                let interior = &text[open + 2..close];
                if interior.is_empty() {
                    cursor = close;
                    continue;
                }
                if open > literal_start {
                    out.push(Inline::Text(text[literal_start..open].to_string()));
                }
                out.push(Inline::Bold(interior.to_string()));
                literal_start = close + 2;
                cursor = literal_start;
            }
            None => break,
        }
    }
    if literal_start < text.len() {
        out.push(Inline::Text(text[literal_start..].to_string()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_default(raw: &str) -> Vec<Block> {
        render(raw, &TexTypesetter)
    }

    #[test]
    fn inline_math_sits_inside_its_paragraph() {
        let blocks = render_default("Solve: $x^2+5x+6=0$");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                Inline::Text("Solve: ".into()),
                Inline::Math("x^2+5x+6=0".into()),
            ])]
        );
    }

    #[test]
    fn display_math_is_a_single_block_with_no_paragraphs() {
        let blocks = render_default("$$\\int_0^\\infty \\frac{\\sin x}{x}dx$$");
        assert_eq!(
            blocks,
            vec![Block::MathDisplay("\\int_0^\\infty \\frac{\\sin x}{x}dx".into())]
        );
    }

    #[test]
    fn display_math_on_its_own_line_leaves_no_stray_breaks() {
        let blocks = render_default("Consider:\n$$a+b$$\nDone.");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![Inline::Text("Consider:".into())]),
                Block::MathDisplay("a+b".into()),
                Block::Paragraph(vec![Inline::Text("Done.".into())]),
            ]
        );
    }

    #[test]
    fn blank_lines_become_explicit_breaks() {
        let blocks = render_default("first\n\nsecond");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![Inline::Text("first".into())]),
                Block::LineBreak,
                Block::Paragraph(vec![Inline::Text("second".into())]),
            ]
        );
    }

    #[test]
    fn list_markers_are_stripped() {
        let blocks = render_default("* apples\n- pears\n2. oranges");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem {
                    ordered: false,
                    spans: vec![Inline::Text("apples".into())],
                },
                Block::ListItem {
                    ordered: false,
                    spans: vec![Inline::Text("pears".into())],
                },
                Block::ListItem {
                    ordered: true,
                    spans: vec![Inline::Text("oranges".into())],
                },
            ]
        );
    }

    #[test]
    fn indented_list_markers_are_recognized() {
        let blocks = render_default("   * indented");
        assert_eq!(
            blocks,
            vec![Block::ListItem {
                ordered: false,
                spans: vec![Inline::Text("indented".into())],
            }]
        );
    }

    #[test]
    fn list_items_can_carry_math_and_bold() {
        let blocks = render_default("1. the **discriminant** is $b^2-4ac$");
        assert_eq!(
            blocks,
            vec![Block::ListItem {
                ordered: true,
                spans: vec![
                    Inline::Text("the ".into()),
                    Inline::Bold("discriminant".into()),
                    Inline::Text(" is ".into()),
                    Inline::Math("b^2-4ac".into()),
                ],
            }]
        );
    }

    #[test]
    fn bold_runs_split_out_of_paragraph_text() {
        let blocks = render_default("a **b** c **d** e");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                Inline::Text("a ".into()),
                Inline::Bold("b".into()),
                Inline::Text(" c ".into()),
                Inline::Bold("d".into()),
                Inline::Text(" e".into()),
            ])]
        );
    }

    #[test]
    fn unpaired_bold_markers_stay_literal() {
        let blocks = render_default("2 ** 3 is exponentiation");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Text(
                "2 ** 3 is exponentiation".into()
            )])]
        );
    }

    #[test]
    fn stray_dollar_does_not_swallow_following_lines() {
        let blocks = render_default("lunch cost $12\nnext line");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![Inline::Text("lunch cost $12".into())]),
                Block::Paragraph(vec![Inline::Text("next line".into())]),
            ]
        );
    }

    #[test]
    fn failed_inline_fragment_degrades_to_raw_text() {
        // Unbalanced brace fails the typesetter; the raw source survives.
        let blocks = render_default("see ${a$ here");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                Inline::Text("see ".into()),
                Inline::Text("${a$".into()),
                Inline::Text(" here".into()),
            ])]
        );
    }

    #[test]
    fn failed_display_fragment_degrades_in_place() {
        let blocks = render_default("$${a$$");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Text("$${a$$".into())])]
        );
    }

    #[test]
    fn unavailable_backend_returns_input_as_one_block() {
        let raw = "some $x$ math";
        let blocks = render(raw, &NullTypesetter);
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Text(raw.into())])]
        );
    }

    #[test]
    fn hostile_inputs_never_panic() {
        for raw in [
            "",
            "$",
            "$$",
            "$$$",
            "$$$$",
            "$a",
            "a$b$c$d",
            "$$\n$\n$$",
            "**",
            "****",
            "\n\n\n",
            "1.",
            "- ",
        ] {
            let _ = render_default(raw);
        }
    }

    #[test]
    fn multiline_display_math_is_normalized() {
        let blocks = render_default("$$\nx = 1\ny = 2\n$$");
        assert_eq!(blocks, vec![Block::MathDisplay("x = 1 y = 2".into())]);
    }
}
