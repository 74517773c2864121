use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(parse_color("#ff0000"), Some(Rgba8::rgb(255, 0, 0)));
    assert_eq!(parse_color("#0F0"), Some(Rgba8::rgb(0, 255, 0)));
    assert_eq!(parse_color("#0000ff80"), Some(Rgba8::rgba(0, 0, 255, 128)));
    assert_eq!(parse_color("#12345"), None);
    assert_eq!(parse_color("#zzzzzz"), None);
}

#[test]
fn parses_functional_forms() {
    assert_eq!(parse_color("rgb(10, 20, 30)"), Some(Rgba8::rgb(10, 20, 30)));
    assert_eq!(
        parse_color("rgba(10,20,30,0.5)"),
        Some(Rgba8::rgba(10, 20, 30, 128))
    );
    assert_eq!(parse_color("hsl(0, 100%, 50%)"), Some(Rgba8::rgb(255, 0, 0)));
    assert_eq!(parse_color("rgb(1,2)"), None);
}

#[test]
fn parses_named_colors_case_insensitively() {
    assert_eq!(parse_color("Red"), Some(Rgba8::rgb(255, 0, 0)));
    assert_eq!(parse_color(" gold "), Some(Rgba8::rgb(255, 215, 0)));
    assert_eq!(parse_color("notacolor"), None);
    assert_eq!(parse_color(""), None);
}
