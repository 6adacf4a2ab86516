use aria_rs::tokenize;
use pretty_assertions::assert_eq;

#[test]
fn lowercases_and_splits_on_whitespace() {
    assert_eq!(
        tokenize("The Weather IS Beautiful Today"),
        vec!["the", "weather", "is", "beautiful", "today"]
    );
}

#[test]
fn punctuation_becomes_a_separator() {
    assert_eq!(
        tokenize("hello, world! (really)"),
        vec!["hello", "world", "really"]
    );
}

#[test]
fn keeps_apostrophes_hyphens_underscores_and_digits() {
    assert_eq!(
        tokenize("don't re-run the_test 42 times"),
        vec!["don't", "re-run", "the_test", "42", "times"]
    );
}

#[test]
fn drops_tokens_shorter_than_two_characters() {
    assert_eq!(tokenize("a b cd e fg"), vec!["cd", "fg"]);
}

#[test]
fn collapses_runs_of_separators() {
    assert_eq!(tokenize("so    many\t\tspaces...here"), vec!["so", "many", "spaces", "here"]);
}

#[test]
fn empty_and_symbol_only_input_yield_nothing() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("   ").is_empty());
    assert!(tokenize("!?!? ... @#$").is_empty());
}

#[test]
fn tokenization_is_idempotent_on_its_own_output() {
    let first = tokenize("Some, mixed! INPUT with-dashes and 'quotes'");
    let rejoined = first.join(" ");
    assert_eq!(tokenize(&rejoined), first);
}

#[test]
fn same_input_tokenizes_identically_twice() {
    let text = "The quick brown fox, jumps -- over; the lazy dog!";
    assert_eq!(tokenize(text), tokenize(text));
}
