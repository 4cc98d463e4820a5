use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesetError {
    #[error("empty math fragment")]
    EmptyFragment,
    #[error("unbalanced braces in math fragment")]
    UnbalancedBraces,
}

/// Math typesetting backend. Fragment sources arrive without their `$`
/// delimiters; the renderer falls back to the raw source when `typeset`
/// fails, so implementations should reject anything they cannot display
/// rather than guess.
pub trait Typesetter {
    fn available(&self) -> bool {
        true
    }

    fn typeset(&self, src: &str) -> Result<String, TypesetError>;
}

/// Default backend: validates TeX-ish fragments and normalizes internal
/// whitespace so multi-line display math renders on one line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TexTypesetter;

impl Typesetter for TexTypesetter {
    fn typeset(&self, src: &str) -> Result<String, TypesetError> {
        let trimmed = src.trim();
        if trimmed.is_empty() {
            return Err(TypesetError::EmptyFragment);
        }

        let mut depth: i32 = 0;
        let mut chars = trimmed.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    // An escaped brace (or any escaped char) is literal.
                    chars.next();
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(TypesetError::UnbalancedBraces);
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(TypesetError::UnbalancedBraces);
        }

        Ok(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Stand-in for a missing backend; the renderer then returns the raw input
/// as a single untouched block.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTypesetter;

impl Typesetter for NullTypesetter {
    fn available(&self) -> bool {
        false
    }

    fn typeset(&self, _src: &str) -> Result<String, TypesetError> {
        Err(TypesetError::EmptyFragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_fragments_pass_through() {
        let ts = TexTypesetter;
        assert_eq!(ts.typeset("x^2+5x+6=0"), Ok("x^2+5x+6=0".into()));
        assert_eq!(
            ts.typeset("\\frac{a}{b}"),
            Ok("\\frac{a}{b}".into())
        );
    }

    #[test]
    fn newlines_collapse_to_spaces() {
        let ts = TexTypesetter;
        assert_eq!(
            ts.typeset("\\int_0^\\infty\n  \\frac{\\sin x}{x}dx"),
            Ok("\\int_0^\\infty \\frac{\\sin x}{x}dx".into())
        );
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        let ts = TexTypesetter;
        assert_eq!(ts.typeset("\\frac{a}{b"), Err(TypesetError::UnbalancedBraces));
        assert_eq!(ts.typeset("a}b"), Err(TypesetError::UnbalancedBraces));
    }

    #[test]
    fn escaped_braces_do_not_count_toward_balance() {
        let ts = TexTypesetter;
        assert_eq!(ts.typeset("\\{a\\}"), Ok("\\{a\\}".into()));
    }

    #[test]
    fn blank_fragment_is_rejected() {
        assert_eq!(TexTypesetter.typeset("   "), Err(TypesetError::EmptyFragment));
    }

    #[test]
    fn null_backend_reports_unavailable() {
        assert!(!NullTypesetter.available());
    }
}
