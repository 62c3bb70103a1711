use crate::Lexer;
use cinder_diagnostic::{DiagnosticSink, MemoryEmitter};
use cinder_ir::{Options, Token, TokenKind};
use cinder_reader::Reader;

use pretty_assertions::assert_eq;
use std::rc::Rc;

use cinder_ir::TokenKind::*;

fn lexer_with(text: &str, options: Options) -> (Lexer, MemoryEmitter) {
    let emitter = MemoryEmitter::new();
    let sink = Rc::new(DiagnosticSink::new(Box::new(emitter.clone())));
    let mut reader = Reader::new(options, Rc::clone(&sink));
    reader.push_str(text);
    (Lexer::new(reader, options, sink), emitter)
}

fn lexer(text: &str) -> (Lexer, MemoryEmitter) {
    lexer_with(text, Options::default())
}

/// Raw-scan everything through `End` (inclusive).
fn scan_all(lexer: &mut Lexer) -> Vec<Token> {
    let mut out = Vec::new();
    loop {
        let tok = lexer.scan();
        let done = tok.kind == End;
        out.push(tok);
        if done {
            break;
        }
    }
    out
}

fn scan_kinds(text: &str) -> Vec<TokenKind> {
    let (mut lx, _) = lexer(text);
    scan_all(&mut lx).iter().map(|t| t.kind).collect()
}

// === Scenario: identifiers and operators ===

#[test]
fn identifier_then_increment() {
    let (mut lx, _) = lexer("i++");
    let toks = scan_all(&mut lx);
    assert_eq!(
        toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![Identifier, PlusPlus, NewLine, End]
    );
    assert_eq!(toks[0].literal, "i");
}

#[test]
fn comment_space_identifier_raw_stream() {
    let (mut lx, _) = lexer("/* a */ x");
    let toks = scan_all(&mut lx);
    assert_eq!(
        toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![Comment, Space, Identifier, NewLine, End]
    );
    assert_eq!(toks[0].literal, "/* a */");
    assert_eq!(toks[1].spaces, 1);
    assert_eq!(toks[2].literal, "x");
}

#[test]
fn next_collapses_trivia_into_following_token() {
    let (mut lx, _) = lexer("/* a */ x");
    let tok = lx.next();
    assert_eq!(tok.kind, Identifier);
    assert_eq!(tok.literal, "x");
    assert_eq!(tok.spaces, 2);
    assert!(tok.bol);
}

// === Scenario: splice through a token ===

#[test]
fn spliced_directive_keyword() {
    let (mut lx, _) = lexer("#inc\\\nlude");
    let toks = scan_all(&mut lx);
    assert_eq!(
        toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![Hash, Identifier, NewLine, End]
    );
    assert_eq!(toks[1].literal, "include");
    assert_eq!((toks[1].loc.line, toks[1].loc.column), (1, 2));
}

#[test]
fn reader_line_advances_across_splice() {
    let (mut lx, _) = lexer("#inc\\\nlude");
    let _ = lx.scan(); // '#'
    let _ = lx.scan(); // identifier spanning the splice
    assert_eq!(lx.reader().line(), Some(2));
}

// === Scenario: character constants ===

#[test]
fn hex_escape_decodes_into_literal() {
    let (mut lx, emitter) = lexer("'\\x41'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, CharConst);
    assert_eq!(toks[0].literal, &b"\x41"[..]);
    assert!(emitter.messages().is_empty());
}

#[test]
fn lone_quote_produces_token_and_two_errors() {
    let (mut lx, emitter) = lexer("'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, CharConst);
    assert!(toks[0].literal.is_empty());
    assert_eq!(
        emitter.messages(),
        vec!["missing terminating ' character", "empty character constant"]
    );
}

#[test]
fn empty_char_constant_is_an_error() {
    let (mut lx, emitter) = lexer("''");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, CharConst);
    assert_eq!(emitter.messages(), vec!["empty character constant"]);
}

#[test]
fn only_first_character_of_constant_is_kept() {
    let (mut lx, _) = lexer("'ab'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, CharConst);
    assert_eq!(toks[0].literal, "a");
}

#[test]
fn simple_escapes_map_to_control_bytes() {
    for (source, byte) in [
        ("'\\a'", 0x07u8),
        ("'\\b'", 0x08),
        ("'\\f'", 0x0C),
        ("'\\n'", 0x0A),
        ("'\\r'", 0x0D),
        ("'\\t'", 0x09),
        ("'\\v'", 0x0B),
        ("'\\\\'", b'\\'),
        ("'\\''", b'\''),
        ("'\\\"'", b'"'),
        ("'\\?'", b'?'),
        ("'\\e'", 0x1B),
    ] {
        let (mut lx, _) = lexer(source);
        let toks = scan_all(&mut lx);
        assert_eq!(toks[0].literal, &[byte][..], "for {source}");
    }
}

#[test]
fn octal_escape_folds_up_to_three_digits() {
    let (mut lx, _) = lexer("'\\012'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].literal, &[0o12][..]);

    let (mut lx, _) = lexer("'\\0'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].literal, &[0][..]);

    // A fourth octal digit is ordinary content.
    let (mut lx, _) = lexer("'\\1234'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].literal, &[0o123][..]);
}

#[test]
fn hex_escape_without_digits_is_an_error() {
    let (mut lx, emitter) = lexer("'\\x'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, CharConst);
    assert_eq!(
        emitter.messages(),
        vec!["\\x used with no following hex digits"]
    );
    assert_eq!(emitter.diagnostics()[0].loc.line, 1);
}

#[test]
fn unknown_escape_warns_and_keeps_byte() {
    let (mut lx, emitter) = lexer("'\\q'");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].literal, "q");
    assert_eq!(emitter.messages(), vec!["unknown escape character: 'q'"]);
}

#[test]
fn gnu_e_escape_warns_only_in_strict_mode() {
    let (mut lx, emitter) = lexer("'\\e'");
    let _ = scan_all(&mut lx);
    assert!(emitter.messages().is_empty());

    let (mut lx, emitter) = lexer_with("'\\e'", Options::STRICT_ESCAPES);
    let _ = scan_all(&mut lx);
    assert_eq!(emitter.messages(), vec!["nonstandard escape sequence '\\e'"]);
}

// === Scenario: string literals and encodings ===

#[test]
fn utf8_string_decodes_universal_character_name() {
    let (mut lx, emitter) = lexer("u8\"\\u00e9\"");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, Utf8StringConst);
    assert_eq!(toks[0].literal, &[0xC3, 0xA9][..]);
    assert!(emitter.messages().is_empty());
}

#[test]
fn encoding_prefixes_select_kinds() {
    for (source, kind) in [
        ("\"s\"", StringConst),
        ("L\"s\"", WstringConst),
        ("u\"s\"", String16Const),
        ("U\"s\"", String32Const),
        ("u8\"s\"", Utf8StringConst),
        ("'c'", CharConst),
        ("L'c'", WcharConst),
        ("u'c'", Char16Const),
        ("U'c'", Char32Const),
        ("u8'c'", Utf8CharConst),
    ] {
        let (mut lx, _) = lexer(source);
        let toks = scan_all(&mut lx);
        assert_eq!(toks[0].kind, kind, "for {source}");
        assert_eq!(toks[0].literal.len(), 1, "for {source}");
    }
}

#[test]
fn prefix_without_quote_is_an_identifier() {
    for (source, literal) in [("u8x", "u8x"), ("ux", "ux"), ("Ux", "Ux"), ("Lx", "Lx")] {
        let (mut lx, _) = lexer(source);
        let toks = scan_all(&mut lx);
        assert_eq!(toks[0].kind, Identifier, "for {source}");
        assert_eq!(toks[0].literal, literal, "for {source}");
    }
}

#[test]
fn unterminated_string_reports_and_produces_token() {
    let (mut lx, emitter) = lexer("\"abc");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, StringConst);
    assert_eq!(toks[0].literal, "abc");
    assert_eq!(emitter.messages(), vec!["unterminated string literal"]);
    // Lexing continues after the error.
    assert_eq!(toks.last().map(|t| t.kind), Some(End));
}

#[test]
fn string_stops_at_newline() {
    let (mut lx, emitter) = lexer("\"ab\ncd");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, StringConst);
    assert_eq!(toks[0].literal, "ab");
    assert_eq!(emitter.messages(), vec!["unterminated string literal"]);
    // The newline is consumed by the aborted literal; the rest still lexes.
    assert_eq!(toks[1].kind, Identifier);
    assert_eq!(toks[1].literal, "cd");
}

#[test]
fn invalid_ucn_digit_is_an_error_but_literal_survives() {
    let (mut lx, emitter) = lexer("\"\\u00g1\"");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, StringConst);
    assert_eq!(emitter.messages(), vec!["invalid universal character"]);
    // The closing quote still terminated the literal.
    assert_eq!(toks.iter().filter(|t| t.kind == StringConst).count(), 1);
    assert_eq!(toks.last().map(|t| t.kind), Some(End));
}

#[test]
fn ucn_in_identifier_encodes_utf8() {
    let (mut lx, _) = lexer("a\\u00e9b");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, Identifier);
    assert_eq!(toks[0].literal, &[b'a', 0xC3, 0xA9, b'b'][..]);
}

#[test]
fn identifier_may_start_with_ucn() {
    let (mut lx, _) = lexer("\\u0041bc");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, Identifier);
    assert_eq!(toks[0].literal, "Abc");
}

#[test]
fn backslash_without_ucn_is_its_own_token() {
    assert_eq!(scan_kinds("a\\b"), vec![Identifier, Backslash, Identifier, NewLine, End]);
}

#[test]
fn high_bytes_continue_identifiers() {
    let (mut lx, _) = lexer("a\u{00e9}b"); // é is 0xC3 0xA9, both in 0x80..=0xFD
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, Identifier);
    assert_eq!(toks[0].literal, "aéb");
}

#[test]
fn dollar_is_an_identifier_character() {
    let (mut lx, _) = lexer("$tmp a$b");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].literal, "$tmp");
    assert_eq!(toks[2].literal, "a$b");
}

// === Scenario: pp-numbers ===

#[test]
fn period_digit_starts_a_number() {
    let (mut lx, _) = lexer(".5e+2");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, Number);
    assert_eq!(toks[0].literal, ".5e+2");
}

#[test]
fn ellipsis_and_period_disambiguation() {
    assert_eq!(scan_kinds("..."), vec![Ellipsis, NewLine, End]);
    assert_eq!(scan_kinds(".."), vec![Period, Period, NewLine, End]);
    assert_eq!(scan_kinds("."), vec![Period, NewLine, End]);
}

#[test]
fn pp_number_is_permissive() {
    for source in ["0x1p-3", "1e+5f", "1..2", "4'000'000", "0xdeadBEEF", "9z9"] {
        let (mut lx, _) = lexer(source);
        let toks = scan_all(&mut lx);
        assert_eq!(toks[0].kind, Number, "for {source}");
        assert_eq!(toks[0].literal, source, "for {source}");
    }
}

#[test]
fn sign_without_exponent_ends_the_number() {
    let (mut lx, _) = lexer("1+2");
    let toks = scan_all(&mut lx);
    assert_eq!(
        toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![Number, Plus, Number, NewLine, End]
    );
}

// === Operators: maximal munch ===

#[test]
fn compound_assignment_operators() {
    assert_eq!(
        scan_kinds("+= -= *= /= %= &= |= ^= <<= >>="),
        vec![
            PlusEqual, Space, MinusEqual, Space, StarEqual, Space, SlashEqual, Space,
            PercentEqual, Space, AmpEqual, Space, PipeEqual, Space, CaretEqual, Space,
            LessLessEqual, Space, GreaterGreaterEqual, NewLine, End
        ]
    );
}

#[test]
fn relational_and_shift_operators() {
    assert_eq!(
        scan_kinds("< << <= > >> >= == != ="),
        vec![
            Less, Space, LessLess, Space, LessEqual, Space, Greater, Space, GreaterGreater,
            Space, GreaterEqual, Space, EqualEqual, Space, ExclaimEqual, Space, Equal,
            NewLine, End
        ]
    );
}

#[test]
fn exclaim_munches_equal() {
    assert_eq!(scan_kinds("!"), vec![Exclaim, NewLine, End]);
    assert_eq!(scan_kinds("!="), vec![ExclaimEqual, NewLine, End]);
}

#[test]
fn arrow_and_decrement() {
    assert_eq!(
        scan_kinds("a->b--"),
        vec![Identifier, Arrow, Identifier, MinusMinus, NewLine, End]
    );
}

#[test]
fn plus_runs_munch_greedily() {
    // Maximal munch: "+++" is "++" then "+".
    assert_eq!(scan_kinds("+++"), vec![PlusPlus, Plus, NewLine, End]);
}

#[test]
fn logical_operators() {
    assert_eq!(
        scan_kinds("&& & || | ^ ~"),
        vec![AmpAmp, Space, Amp, Space, PipePipe, Space, Pipe, Space, Caret, Space, Tilde, NewLine, End]
    );
}

#[test]
fn structural_punctuation() {
    assert_eq!(
        scan_kinds("[](){},;:?"),
        vec![LSquare, RSquare, LParen, RParen, LBrace, RBrace, Comma, Semi, Colon, Question, NewLine, End]
    );
}

// === Digraphs canonicalize ===

#[test]
fn digraphs_produce_canonical_kinds() {
    assert_eq!(
        scan_kinds("<: :> <% %> %: %:%:"),
        vec![
            LSquare, Space, RSquare, Space, LBrace, Space, RBrace, Space, Hash, Space,
            HashHash, NewLine, End
        ]
    );
}

#[test]
fn hash_and_hashhash() {
    assert_eq!(scan_kinds("# ##"), vec![Hash, Space, HashHash, NewLine, End]);
}

#[test]
fn percent_colon_not_doubled_is_hash() {
    // "%:%" is '#' followed by '%'.
    assert_eq!(scan_kinds("%:%"), vec![Hash, Percent, NewLine, End]);
}

// === Comments ===

#[test]
fn line_comment_excludes_newline() {
    let (mut lx, _) = lexer("// hi\nx");
    let toks = scan_all(&mut lx);
    assert_eq!(
        toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![Comment, NewLine, Identifier, NewLine, End]
    );
    assert_eq!(toks[0].literal, "// hi");
}

#[test]
fn block_comment_spans_newlines() {
    let (mut lx, _) = lexer("/* a\nb */x");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, Comment);
    assert_eq!(toks[0].literal, "/* a\nb */");
    assert_eq!(toks[1].kind, Identifier);
}

#[test]
fn unterminated_block_comment_reports() {
    let (mut lx, emitter) = lexer("/* open");
    let toks = scan_all(&mut lx);
    assert_eq!(toks[0].kind, Comment);
    assert_eq!(emitter.messages(), vec!["unterminated comment"]);
    assert_eq!(toks.last().map(|t| t.kind), Some(End));
}

#[test]
fn slash_alone_is_division() {
    assert_eq!(scan_kinds("a/b"), vec![Identifier, Slash, Identifier, NewLine, End]);
    assert_eq!(scan_kinds("a/=b"), vec![Identifier, SlashEqual, Identifier, NewLine, End]);
}

// === Unexpected bytes ===

#[test]
fn unexpected_byte_yields_unknown_and_continues() {
    let (mut lx, emitter) = lexer("a @ b");
    let toks = scan_all(&mut lx);
    assert_eq!(
        toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![Identifier, Space, Unknown, Space, Identifier, NewLine, End]
    );
    assert_eq!(toks[2].literal, "@");
    assert_eq!(emitter.messages(), vec!["unexpected character"]);
}

// === next / peek / untread ===

#[test]
fn peek_is_idempotent() {
    let (mut lx, _) = lexer("a b");
    let first = lx.peek();
    let second = lx.peek();
    assert_eq!(first, second);
    assert_eq!(lx.next(), first);
}

#[test]
fn peek_at_end_is_stable() {
    let (mut lx, _) = lexer("");
    assert_eq!(lx.peek().kind, End);
    assert_eq!(lx.peek().kind, End);
    assert_eq!(lx.next().kind, End);
}

#[test]
fn untread_then_next_round_trips() {
    let (mut lx, _) = lexer("a b");
    let tok = lx.next();
    lx.untread(tok.clone());
    assert_eq!(lx.next(), tok);
}

#[test]
fn untread_sequence_restores_order() {
    let (mut lx, _) = lexer("a b c");
    let first = lx.next();
    let second = lx.next();
    let third = lx.next();
    // Push back in reverse so forward reads recover the sequence.
    lx.untread(third.clone());
    lx.untread(second.clone());
    lx.untread(first.clone());
    assert_eq!(lx.next(), first);
    assert_eq!(lx.next(), second);
    assert_eq!(lx.next(), third);
}

#[test]
fn bol_is_set_for_line_one_only() {
    let (mut lx, _) = lexer("x\ny");
    assert!(lx.next().bol); // x
    assert!(lx.next().bol); // newline, still on line 1 when scanned
    assert!(!lx.next().bol); // y
}

// === Stash frames ===

#[test]
fn stash_frame_serves_its_own_untreads() {
    let (mut lx, _) = lexer("a b");
    lx.stash();
    let tok = lx.next();
    lx.untread(tok.clone());
    assert_eq!(lx.next(), tok);
    lx.unstash();
}

#[test]
fn unstash_drains_pending_tokens() {
    let (mut lx, _) = lexer("a b");
    let a = lx.next();
    lx.stash();
    lx.untread(a);
    lx.unstash();
    // The dropped frame took the untread token with it; lexing resumes
    // from the reader.
    let tok = lx.next();
    assert_eq!(tok.literal, "b");
}

#[test]
fn inner_frame_shadows_outer_untreads() {
    let (mut lx, _) = lexer("x y");
    let x = lx.next();
    lx.untread(x.clone());
    lx.stash();
    // The outer frame holds x, but next() consults only the inner frame.
    let tok = lx.next();
    assert_eq!(tok.literal, "y");
    lx.unstash();
    assert_eq!(lx.next(), x);
}

#[test]
fn stash_frames_nest() {
    let (mut lx, _) = lexer("a b c");
    let a = lx.next();
    lx.stash();
    lx.untread(a.clone());
    lx.stash();
    let b = lx.next(); // inner frame empty, scans 'b'
    assert_eq!(b.literal, "b");
    lx.unstash();
    assert_eq!(lx.next(), a); // middle frame still holds a
    lx.unstash();
}

// === Date / time snapshot ===

#[test]
fn date_is_frozen_and_formatted() {
    let (lx, _) = lexer("");
    let date = lx.date();
    // "Mmm dd yyyy" with a space-padded day: always 11 bytes.
    assert_eq!(date.len(), 11);
    assert_eq!(date, lx.date());
    assert_eq!(date.as_bytes()[3], b' ');
}

#[test]
fn time_is_frozen_and_formatted() {
    let (lx, _) = lexer("");
    let time = lx.time();
    assert_eq!(time.len(), 8);
    assert_eq!(time.as_bytes()[2], b':');
    assert_eq!(time.as_bytes()[5], b':');
    assert_eq!(time, lx.time());
}

// === Locations ===

#[test]
fn token_locations_are_one_based() {
    let (mut lx, _) = lexer("a bb\nccc");
    let toks = scan_all(&mut lx);
    let positions: Vec<_> = toks
        .iter()
        .filter(|t| t.kind == Identifier)
        .map(|t| (t.loc.line, t.loc.column))
        .collect();
    assert_eq!(positions, vec![(1, 1), (1, 3), (2, 1)]);
}

#[test]
fn token_location_names_the_source() {
    let (mut lx, _) = lexer("x");
    let tok = lx.next();
    assert_eq!(
        tok.loc.name.as_ref().map(ToString::to_string),
        Some("<string>".to_owned())
    );
}

#[test]
fn line_note_reprints_physical_line() {
    let (mut lx, _) = lexer("int x;\n");
    let tok = lx.next();
    let note = tok.loc.note.as_ref().map(|n| n.line().to_vec());
    assert_eq!(note, Some(b"int x;".to_vec()));
}

// === Trivia round-trip ===

/// Reconstruct source text from a raw scan.
fn reprint_all(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::new();
    for tok in tokens {
        if tok.kind != End {
            out.extend_from_slice(tok.reprint().as_bytes());
        }
    }
    out
}

#[test]
fn raw_scan_reconstructs_canonical_source() {
    let source = "int main() {\n    return a->b + 0x1f; // done\n}\n";
    let (mut lx, _) = lexer(source);
    let toks = scan_all(&mut lx);
    assert_eq!(String::from_utf8_lossy(&reprint_all(&toks)), source);
}

mod props {
    use super::*;
    use proptest::prelude::*;

    /// Canonically-spelled atoms that never merge across a single space.
    fn atom() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z][a-z0-9_]{0,5}".prop_map(|s| s),
            "[0-9]{1,4}".prop_map(|s| s),
            Just("(".to_owned()),
            Just(")".to_owned()),
            Just("[".to_owned()),
            Just("]".to_owned()),
            Just("{".to_owned()),
            Just("}".to_owned()),
            Just(",".to_owned()),
            Just(";".to_owned()),
            Just("?".to_owned()),
            Just("~".to_owned()),
            Just("->".to_owned()),
            Just("++".to_owned()),
            Just("<<=".to_owned()),
            Just(">>=".to_owned()),
            Just("...".to_owned()),
            Just("&&".to_owned()),
            Just("##".to_owned()),
            Just("==".to_owned()),
            Just("!=".to_owned()),
        ]
    }

    proptest! {
        #[test]
        fn trivia_round_trip(atoms in proptest::collection::vec(atom(), 0..24)) {
            let mut source = atoms.join(" ");
            source.push('\n');
            let (mut lx, _) = lexer(&source);
            let toks = scan_all(&mut lx);
            prop_assert_eq!(
                String::from_utf8_lossy(&reprint_all(&toks)).into_owned(),
                source
            );
        }
    }
}
