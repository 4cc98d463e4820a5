//! Delimiter scanning for math fragments.
//!
//! Two passes over an immutable input produce a flat segment list: first
//! `$$...$$` display math (newlines allowed inside), then single `$...$`
//! inline math within the remaining text. Later phases only ever see
//! [`Segment::Text`], so converted math is never re-interpreted.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Inner source of a `$$...$$` fragment, whitespace-trimmed.
    MathDisplay(String),
    /// Inner source of a `$...$` fragment.
    MathInline(String),
}

pub fn segment(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for piece in split_display_math(raw) {
        match piece {
            Segment::Text(text) => split_inline_math(&text, &mut segments),
            math => segments.push(math),
        }
    }
    segments
}

/// Extract non-greedy `$$...$$` spans. An opener with no closer stays
/// literal text.
fn split_display_math(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = raw;
    loop {
        let Some(start) = rest.find("$$") else {
            break;
        };
        let Some(close) = rest[start + 2..].find("$$") else {
            break;
        };
        let end = start + 2 + close;
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        segments.push(Segment::MathDisplay(rest[start + 2..end].trim().to_string()));
        rest = &rest[end + 2..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    segments
}

/// Extract `$...$` spans with a non-empty interior containing neither `$`
/// nor a newline. A `$` with no same-line partner stays literal, so a stray
/// dollar sign never swallows the paragraphs after it.
fn split_inline_math(text: &str, out: &mut Vec<Segment>) {
    let mut literal_start = 0;
    let mut cursor = 0;
    while let Some(open_rel) = text[cursor..].find('$') {
        let open = cursor + open_rel;
        let after_open = open + 1;
        match text[after_open..].find('$') {
            Some(close_rel) => {
                let close = after_open + close_rel;
                let interior = &text[after_open..close];
                if interior.is_empty() || interior.contains('\n') {
                    // Not a fragment; keep the opener literal and rescan
                    // from the candidate closer.
                    cursor = close;
                    continue;
                }
                if open > literal_start {
                    out.push(Segment::Text(text[literal_start..open].to_string()));
                }
                out.push(Segment::MathInline(interior.to_string()));
                literal_start = close + 1;
                cursor = literal_start;
            }
            None => break,
        }
    }
    if literal_start < text.len() {
        out.push(Segment::Text(text[literal_start..].to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Segment::{MathDisplay, MathInline, Text};

    #[test]
    fn display_math_is_extracted_and_trimmed() {
        let segments = segment("before $$ x^2 $$ after");
        assert_eq!(
            segments,
            vec![
                Text("before ".into()),
                MathDisplay("x^2".into()),
                Text(" after".into()),
            ]
        );
    }

    #[test]
    fn display_math_spans_newlines() {
        let segments = segment("$$\n\\int_0^1 x\\,dx\n$$");
        assert_eq!(segments, vec![MathDisplay("\\int_0^1 x\\,dx".into())]);
    }

    #[test]
    fn display_matching_is_non_greedy() {
        let segments = segment("$$a$$ mid $$b$$");
        assert_eq!(
            segments,
            vec![
                MathDisplay("a".into()),
                Text(" mid ".into()),
                MathDisplay("b".into()),
            ]
        );
    }

    #[test]
    fn unmatched_double_dollars_stay_literal() {
        // The orphaned "$$" falls through to the inline pass, which cannot
        // match it either (empty interior), so it survives as text.
        assert_eq!(segment("cost is $$20"), vec![Text("cost is $$20".into())]);
    }

    #[test]
    fn inline_math_is_extracted() {
        let segments = segment("Solve: $x^2+5x+6=0$ now");
        assert_eq!(
            segments,
            vec![
                Text("Solve: ".into()),
                MathInline("x^2+5x+6=0".into()),
                Text(" now".into()),
            ]
        );
    }

    #[test]
    fn inline_math_never_crosses_a_newline() {
        let segments = segment("price was $5\nthen $x$ appeared");
        assert_eq!(
            segments,
            vec![
                Text("price was $5\nthen ".into()),
                MathInline("x".into()),
                Text(" appeared".into()),
            ]
        );
    }

    #[test]
    fn lone_dollar_stays_literal() {
        assert_eq!(segment("it costs $10"), vec![Text("it costs $10".into())]);
    }

    #[test]
    fn display_interior_is_opaque_to_the_inline_pass() {
        let segments = segment("$$a $ b$$ and $c$");
        assert_eq!(
            segments,
            vec![
                MathDisplay("a $ b".into()),
                Text(" and ".into()),
                MathInline("c".into()),
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert_eq!(segment(""), Vec::<Segment>::new());
    }
}
