//! Line tokenizer.
//!
//! Splits on single spaces and honors `"`, `'` and `` ` `` quoting. The
//! splitting is deliberately literal: every space outside a quote ends a
//! token, so runs of spaces produce empty tokens, and there are no escape
//! sequences.

fn is_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '`')
}

/// Tokenize a command line.
///
/// - A quote character opens a quoted region that ends at the next
///   occurrence of the same character; other quote characters inside it are
///   literal.
/// - An unterminated quote runs to the end of the line.
/// - The closing quote of a region is dropped only when it is the last
///   character of its token.
/// - Empty input yields a single empty token.
pub fn tokenize(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let Some(last) = chars.len().checked_sub(1) else {
        return vec![String::new()];
    };

    let mut tokens = Vec::new();
    let mut holder = String::new();
    let mut quote_active = false;
    let mut quote_char: Option<char> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if is_quote(ch) {
            if !quote_active {
                quote_active = true;
                quote_char = Some(ch);
            } else if Some(ch) == quote_char {
                quote_active = false;
            }
        }

        if quote_active {
            if Some(ch) != quote_char {
                holder.push(ch);
            }
        } else if ch != ' ' {
            holder.push(ch);
        }

        if !quote_active && ch == ' ' {
            flush(&mut tokens, &mut holder, &mut quote_char);
        } else if i == last {
            flush(&mut tokens, &mut holder, &mut quote_char);
        }
    }

    tokens
}

fn flush(tokens: &mut Vec<String>, holder: &mut String, quote_char: &mut Option<char>) {
    if let Some(q) = quote_char.take()
        && holder.ends_with(q)
    {
        holder.pop();
    }
    tokens.push(std::mem::take(holder));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line)
    }

    #[test]
    fn tokenize_simple() {
        assert_eq!(toks("ls -la /tmp"), vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn tokenize_double_quotes() {
        assert_eq!(
            toks(r#"echo "hello world" foo"#),
            vec!["echo", "hello world", "foo"]
        );
    }

    #[test]
    fn tokenize_single_and_backtick_quotes() {
        assert_eq!(toks("say 'a b' `c d`"), vec!["say", "a b", "c d"]);
    }

    #[test]
    fn tokenize_quote_at_end_of_line() {
        assert_eq!(toks(r#"echo "hi there""#), vec!["echo", "hi there"]);
    }

    #[test]
    fn tokenize_other_quotes_inside_are_literal() {
        assert_eq!(toks(r#"echo "it's""#), vec!["echo", "it's"]);
    }

    #[test]
    fn tokenize_double_space_keeps_empty_token() {
        assert_eq!(toks("a  b"), vec!["a", "", "b"]);
    }

    #[test]
    fn tokenize_leading_space() {
        assert_eq!(toks(" ls"), vec!["", "ls"]);
    }

    #[test]
    fn tokenize_trailing_space_flushes_once() {
        assert_eq!(toks("a "), vec!["a"]);
    }

    #[test]
    fn tokenize_empty() {
        assert_eq!(toks(""), vec![""]);
    }

    #[test]
    fn tokenize_single_space() {
        assert_eq!(toks(" "), vec![""]);
    }

    #[test]
    fn tokenize_unterminated_quote_runs_to_end() {
        assert_eq!(toks(r#"echo "abc def"#), vec!["echo", "abc def"]);
    }

    #[test]
    fn tokenize_closing_quote_mid_token_is_kept() {
        assert_eq!(toks(r#""ab"cd"#), vec![r#"ab"cd"#]);
    }

    #[test]
    fn tokenize_empty_quotes() {
        assert_eq!(toks(r#"echo """#), vec!["echo", ""]);
    }

    #[test]
    fn tokenize_tabs_are_not_separators() {
        assert_eq!(toks("a\tb c"), vec!["a\tb", "c"]);
    }

    #[test]
    fn tokenize_unicode() {
        assert_eq!(toks("echo 日本 'ä ö'"), vec!["echo", "日本", "ä ö"]);
    }

    proptest! {
        #[test]
        fn unquoted_input_splits_on_every_space(s in "[a-z ]{0,24}[a-z]") {
            let expected: Vec<String> = s.split(' ').map(str::to_string).collect();
            prop_assert_eq!(tokenize(&s), expected);
        }

        #[test]
        fn never_panics(s in "\\PC{0,40}") {
            prop_assert!(!tokenize(&s).is_empty());
        }
    }
}
