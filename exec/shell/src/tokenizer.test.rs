use pretty_assertions::assert_eq;

use super::*;

fn words(line: &str) -> Vec<String> {
    tokenize(line).expect("tokenize")
}

#[test]
fn test_simple_words() {
    assert_eq!(words("ls -r /a"), vec!["ls", "-r", "/a"]);
}

#[test]
fn test_collapses_runs_of_whitespace() {
    assert_eq!(words("  echo \t hi  "), vec!["echo", "hi"]);
}

#[test]
fn test_empty_line_has_no_words() {
    assert_eq!(words(""), Vec::<String>::new());
    assert_eq!(words("   "), Vec::<String>::new());
}

#[test]
fn test_double_quotes_group_whitespace() {
    assert_eq!(words(r#"echo "a b  c""#), vec!["echo", "a b  c"]);
}

#[test]
fn test_single_quotes_group_whitespace() {
    assert_eq!(words("cat 'my file.txt'"), vec!["cat", "my file.txt"]);
}

#[test]
fn test_quotes_glue_to_adjacent_text() {
    assert_eq!(words(r#"a"b c"d"#), vec!["ab cd"]);
}

#[test]
fn test_quote_kinds_nest_each_other_literally() {
    assert_eq!(words(r#"echo "it's""#), vec!["echo", "it's"]);
    assert_eq!(words(r#"echo 'say "hi"'"#), vec!["echo", r#"say "hi""#]);
}

#[test]
fn test_empty_quotes_make_an_empty_word() {
    assert_eq!(words(r#"echo """#), vec!["echo", ""]);
}

#[test]
fn test_unterminated_quote_is_an_error() {
    assert_eq!(
        tokenize(r#"echo "oops"#),
        Err(TokenizeError::UnterminatedQuote)
    );
    assert_eq!(tokenize("echo 'oops"), Err(TokenizeError::UnterminatedQuote));
}
