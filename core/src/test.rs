//! Tests for the Tessera Templating Engine.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    crate::{
        config::Config,
        context::Context,
        env::Environment,
        error::{
            Error,
            EvalErrorKind,
            Result,
        },
        lexer::tokenize,
        loader::{
            FileSystemLoader,
            MemoryLoader,
        },
        nodes::{
            Expr,
            Node,
            StatementBlock,
            Template,
            Wrapper,
        },
        render::{
            escape,
            Renderer,
        },
        statements::{
            ControlStructure,
            IfStatement,
            Statement,
        },
        token::TokenKind,
        value::{
            Signature,
            Value,
            VarArgs,
        },
    },
    serde_json::{
        json,
        Value as JsonValue,
    },
    std::{
        rc::Rc,
        sync::Arc,
    },
};

fn env_with(config: Config, templates: &[(&str, &str)]) -> Environment {
    let loader = templates.iter().copied().collect::<MemoryLoader>();
    Environment::new(config, loader).unwrap()
}

fn render_with(config: Config, source: &str, ctx: JsonValue) -> Result<String> {
    let env = env_with(config, &[]);
    let ctx = Context::from_json(&ctx).unwrap();
    env.render_str(source, &ctx)
}

fn render(source: &str, ctx: JsonValue) -> String {
    render_with(Config::default(), source, ctx).unwrap()
}

fn render_err(config: Config, source: &str, ctx: JsonValue) -> Error {
    match render_with(config, source, ctx) {
        Ok(out) => panic!("Render should have failed but produced {:?}", out),
        Err(e) => e,
    }
}

fn strict() -> Config {
    Config {
        strict_undefined: true,
        ..Config::default()
    }
}

fn escaping() -> Config {
    Config {
        auto_escape: true,
        ..Config::default()
    }
}

fn eval_kind(e: &Error) -> EvalErrorKind {
    match e {
        Error::Eval(e, _, _) => e.kind(),
        Error::Include(e, _, _) => eval_kind(e),
        e => panic!("Expected an evaluation error, found {:?}", e),
    }
}

#[test]
fn lexer_1() {
    let source = "a {%- if x -%} b";
    let tokens = tokenize("trim", source, &Config::default()).unwrap();

    let text = tokens.iter().map(|t| t.text.as_str()).collect::<String>();
    assert_eq!(source, text);

    assert_eq!(TokenKind::Data, tokens[0].kind);
    assert!(tokens[0].trim_right);
    assert_eq!("{%-", tokens[1].text);

    let data = &tokens[tokens.len() - 2];
    assert_eq!(" b", data.text);
    assert!(data.trim_left);
    assert_eq!(TokenKind::Eof, tokens[tokens.len() - 1].kind);
}

#[test]
fn lexer_2() {
    let tokens = tokenize("coords", "one\n{{ two }}", &Config::default()).unwrap();
    let name = tokens.iter().find(|t| t.kind == TokenKind::Name).unwrap();
    assert_eq!("two", name.text);
    assert_eq!(1, name.coord.line());
    assert_eq!(3, name.coord.position());
}

#[test]
fn lexer_3() {
    let config = Config {
        variable_start_string: "<<".to_owned(),
        variable_end_string: ">>".to_owned(),
        ..Config::default()
    };
    assert_eq!("Hi Ann {{ x }}", render_with(config, "Hi << name >> {{ x }}", json!({ "name": "Ann" })).unwrap());
}


#[test]
fn lexer_4() {
    let source = "{{ {'a': {'b': 1}}}}";
    let tokens = tokenize("nested", source, &Config::default()).unwrap();
    let text = tokens.iter().map(|t| t.text.as_str()).collect::<String>();
    assert_eq!(source, text);
    assert_eq!(TokenKind::VariableEnd, tokens[tokens.len() - 2].kind);

    assert_eq!("{'a': {'b': 1}}", render(source, json!({})));
}

#[test]
fn lexer_error_1() {
    match render_err(Config::default(), "{{ 'abc }}", json!({})) {
        Error::UnterminatedString(c, name) => {
            assert_eq!(3, c.position());
            assert_eq!("<string>", name);
        },
        e => panic!("Expected UnterminatedString, found {:?}", e),
    }
}

#[test]
fn lexer_error_2() {
    match render_err(Config::default(), "{{ a) }}", json!({})) {
        Error::UnexpectedDelimiter(')', _, _) => (),
        e => panic!("Expected UnexpectedDelimiter, found {:?}", e),
    }
}

#[test]
fn lexer_error_3() {
    match render_err(Config::default(), "{{ (a", json!({})) {
        Error::UnclosedDelimiter(')', _, _) => (),
        e => panic!("Expected UnclosedDelimiter, found {:?}", e),
    }
}

#[test]
fn lexer_error_4() {
    match render_err(Config::default(), "{{ 1.2.3 }}", json!({})) {
        Error::InvalidNumber(n, _, _) => assert_eq!("1.2.3", n),
        e => panic!("Expected InvalidNumber, found {:?}", e),
    }
}

#[test]
fn lexer_error_5() {
    match render_err(Config::default(), "{{ a $ b }}", json!({})) {
        Error::UnexpectedCharacter('$', _, _) => (),
        e => panic!("Expected UnexpectedCharacter, found {:?}", e),
    }
}

#[test]
fn lexer_error_6() {
    match render_err(Config::default(), "text {# never closed", json!({})) {
        Error::UnterminatedTag(tag, c, _) => {
            assert_eq!("comment", tag);
            assert_eq!(0, c.line());
        },
        e => panic!("Expected UnterminatedTag, found {:?}", e),
    }
}

#[test]
fn output_1() {
    assert_eq!("Hello World!", render("Hello {{ name }}!", json!({ "name": "World" })));
}

#[test]
fn output_2() {
    assert_eq!(
        "|True|1.5|[1, 'a']|{'k': 2}|(none)",
        render("{{ none }}|{{ true }}|{{ 1.5 }}|{{ [1, 'a'] }}|{{ {'k': 2} }}|(none)", json!({})),
    );
}

#[test]
fn output_3() {
    assert_eq!("y", render("{{ 'y' if x else 'n' }}", json!({ "x": true })));
    assert_eq!("n", render("{{ 'y' if x else 'n' }}", json!({ "x": false })));
    assert_eq!("", render("{{ 'y' if x }}", json!({ "x": false })));
}

#[test]
fn output_4() {
    assert_eq!("a\"b\n", render(r#"{{ 'a"' "b\n" }}"#, json!({})));
}

#[test]
fn arithmetic_1() {
    assert_eq!("7", render("{{ 1 + 2 * 3 }}", json!({})));
    assert_eq!("512", render("{{ 2 ** 3 ** 2 }}", json!({})));
    assert_eq!("3", render("{{ 7 // 2 }}", json!({})));
    assert_eq!("-4", render("{{ -7 // 2 }}", json!({})));
    assert_eq!("2", render("{{ -7 % 3 }}", json!({})));
    assert_eq!("3.5", render("{{ 7 / 2 }}", json!({})));
    assert_eq!("2.0", render("{{ 4 / 2 }}", json!({})));
    assert_eq!("0.5", render("{{ 2 ** -1 }}", json!({})));
    assert_eq!("a1", render("{{ 'a' ~ 1 }}", json!({})));
    assert_eq!("[1, 2, 3]", render("{{ [1] + [2, 3] }}", json!({})));
    assert_eq!("abab", render("{{ 'ab' * 2 }}", json!({})));
}

#[test]
fn arithmetic_2() {
    let e = render_err(Config::default(), "{{ 1 / 0 }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Runtime));

    let e = render_err(Config::default(), "{{ 9223372036854775807 + 1 }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Runtime));

    let e = render_err(Config::default(), "{{ 'a' - 1 }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Type));
}


#[test]
fn arithmetic_4() {
    let e = render_err(Config::default(), "{{ 'ab' * 4611686018427387904 }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Runtime));

    let e = render_err(Config::default(), "{{ [1, 2] * 4611686018427387904 }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Runtime));

    assert_eq!("", render("{{ 'ab' * -3 }}", json!({})));
}

#[test]
fn arithmetic_5() {
    assert_eq!("1", render("{{ -1|abs }}", json!({})));
    assert_eq!("2", render("{{ -x|abs }}", json!({ "x": 2 })));
    assert_eq!("-4", render("{{ -2 ** 2 }}", json!({})));
}

#[test]
fn arithmetic_3() {
    match render_err(Config::default(), "first line\n{{ 1 / 0 }}", json!({})) {
        Error::Eval(e, c, name) => {
            assert_eq!(1, c.line());
            assert_eq!("<string>", name);
            assert!(!e.trace().is_empty());
        },
        e => panic!("Expected Eval, found {:?}", e),
    }
}

#[test]
fn logic_1() {
    assert_eq!("x", render("{{ 0 or 'x' }}", json!({})));
    assert_eq!("0", render("{{ 1 and 0 }}", json!({})));
    assert_eq!("False", render("{{ not 1 }}", json!({})));
    assert_eq!("True", render("{{ 'a' in 'cat' }}", json!({})));
    assert_eq!("True", render("{{ 3 not in [1, 2] }}", json!({})));
    assert_eq!("True", render("{{ 1 == 1.0 }}", json!({})));
    assert_eq!("True", render("{{ 'b' > 'a' }}", json!({})));
}

#[test]
fn logic_2() {
    // the right operand is never evaluated
    assert_eq!("False", render("{{ false and (1 / 0) }}", json!({})));
    assert_eq!("True", render("{{ true or (1 / 0) }}", json!({})));
}

#[test]
fn access_1() {
    let ctx = json!({ "user": { "name": "Ann", "tags": [ "a", "b" ] } });
    assert_eq!(
        "Ann|Ann|b|a|b",
        render("{{ user.name }}|{{ user['name'] }}|{{ user.tags[1] }}|{{ user.tags.0 }}|{{ user.tags[-1] }}", ctx),
    );
}

#[test]
fn access_2() {
    let ctx = json!({ "user": { "name": "Ann", "age": 3 } });
    assert_eq!("ANN", render("{{ user.name.upper() }}", ctx.clone()));
    assert_eq!("2", render("{{ user.items()|list|length }}", ctx.clone()));
    assert_eq!("x", render("{{ ' x '.strip() }}", ctx.clone()));
    assert_eq!("['a', 'b']", render("{{ 'a,b'.split(',') }}", ctx.clone()));
    assert_eq!("fallback", render("{{ user.get('missing', 'fallback') }}", ctx));
}

#[test]
fn access_3() {
    assert_eq!("[2, 3]", render("{{ [1, 2, 3, 4][1:3] }}", json!({})));
    assert_eq!("olleh", render("{{ 'hello'[::-1] }}", json!({})));
    assert_eq!("[2, 3]", render("{{ [1, 2, 3][-2:] }}", json!({})));
}


#[test]
fn access_4() {
    assert_eq!("[3]", render("{{ [1, 2, 3][2::9223372036854775807] }}", json!({})));
    assert_eq!("b", render("{{ 'abc'[1::9223372036854775807] }}", json!({})));
    assert_eq!("[3]", render("{{ [1, 2, 3][::-9223372036854775807] }}", json!({})));
    assert_eq!("c", render("{{ 'abc'[::-9223372036854775807] }}", json!({})));
    assert_eq!("[3]", render("{{ [1, 2, 3][::-9223372036854775807 - 1] }}", json!({})));
}

#[test]
fn undefined_1() {
    assert_eq!("[][]", render("[{{ missing }}][{{ missing.attr }}]", json!({})));
    assert_eq!("[]", render("[{{ items[10] }}]", json!({ "items": [ 1 ] })));
}

#[test]
fn undefined_2() {
    let e = render_err(strict(), "{{ missing }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Undefined));

    let e = render_err(strict(), "{{ items[10] }}", json!({ "items": [ 1 ] }));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Undefined));
}

#[test]
fn undefined_3() {
    assert_eq!("False", render_with(strict(), "{{ missing is defined }}", json!({})).unwrap());
    assert_eq!("x", render_with(strict(), "{{ missing|default('x') }}", json!({})).unwrap());
    assert_eq!("x", render_with(strict(), "{{ user.name|d('x') }}", json!({ "user": {} })).unwrap());
}

#[test]
fn undefined_4() {
    let ctx = json!({ "x": null });
    assert_eq!("True", render("{{ x is defined }}", ctx.clone()));
    assert_eq!("False", render("{{ y is defined }}", ctx.clone()));
    assert_eq!("True", render("{{ y is undefined }}", ctx.clone()));
    assert_eq!("True", render("{{ x is none }}", ctx));
}

#[test]
fn filter_1() {
    assert_eq!("Hello World", render("{{ 'hello world'|title }}", json!({})));
    assert_eq!("1,2,3", render("{{ [3, 1, 2]|sort|join(',') }}", json!({})));
    assert_eq!("CBA", render("{{ 'abc'|upper|reverse }}", json!({})));
    assert_eq!("6", render("{{ [1, 2, 3]|sum }}", json!({})));
    assert_eq!("d", render("{{ missing|default('d') }}", json!({})));
    assert_eq!("", render("{{ none|default('d') }}", json!({})));
    assert_eq!("d", render("{{ ''|default('d', true) }}", json!({})));
}

#[test]
fn filter_2() {
    let ctx = json!({
        "users": [
            { "name": "b", "active": true, "age": 30 },
            { "name": "a", "active": false, "age": 20 },
            { "name": "c", "active": true, "age": 25 },
        ],
    });

    assert_eq!("b,a,c", render("{{ users|map(attribute='name')|join(',') }}", ctx.clone()));
    assert_eq!("b,c", render("{{ users|selectattr('active')|map(attribute='name')|join(',') }}", ctx.clone()));
    assert_eq!("a", render("{{ users|rejectattr('active')|map(attribute='name')|join(',') }}", ctx.clone()));
    assert_eq!("a,c,b", render("{{ users|sort(attribute='age')|map(attribute='name')|join(',') }}", ctx.clone()));
    assert_eq!("30", render("{{ (users|max(attribute='age')).age }}", ctx.clone()));
    assert_eq!("75", render("{{ users|sum(attribute='age') }}", ctx));
}

#[test]
fn filter_3() {
    assert_eq!("1,3", render("{{ [1, 2, 3, 4]|select('odd')|join(',') }}", json!({})));
    assert_eq!("2,4", render("{{ [1, 2, 3, 4]|reject('odd')|join(',') }}", json!({})));
    assert_eq!("A,B", render("{{ ['a', 'b']|map('upper')|join(',') }}", json!({})));
    assert_eq!("[[1, 2], [3, 0]]", render("{{ [1, 2, 3]|batch(2, 0) }}", json!({})));
    assert_eq!("[1, 2]", render("{{ [1, 2, 1, 2]|unique }}", json!({})));
}

#[test]
fn filter_4() {
    assert_eq!("42", render("{{ '42'|int }}", json!({})));
    assert_eq!("7", render("{{ 'x'|int(7) }}", json!({})));
    assert_eq!("2.5", render("{{ '2.5'|float }}", json!({})));
    assert_eq!("3", render("{{ (-3)|abs }}", json!({})));
    assert_eq!("2.57", render("{{ 2.567|round(2) }}", json!({})));
    assert_eq!("3.0", render("{{ 2.1|round(method='ceil') }}", json!({})));
    assert_eq!("3", render("{{ 'one two  three'|wordcount }}", json!({})));
    assert_eq!("5", render("{{ 'hello'|length }}", json!({})));
}

#[test]
fn filter_5() {
    assert_eq!("Hexxo", render("{{ 'Hello'|replace('l', 'x') }}", json!({})));
    assert_eq!("Hexlo", render("{{ 'Hello'|replace('l', 'x', 1) }}", json!({})));
    assert_eq!("a\n  b", render("{{ 'a\nb'|indent(2) }}", json!({})));
    assert_eq!("foo...", render("{{ 'foo bar baz'|truncate(9, leeway=0) }}", json!({})));
    assert_eq!("foo ba...", render("{{ 'foo bar baz'|truncate(9, true, leeway=0) }}", json!({})));
    assert_eq!("Word", render("{{ 'wORD'|capitalize }}", json!({})));
    assert_eq!("ab", render("{{ '  ab '|trim }}", json!({})));
}

#[test]
fn filter_6() {
    assert_eq!(
        r#"{"a":[1,"\u003cb\u003e"]}"#,
        render("{{ data|tojson }}", json!({ "data": { "a": [ 1, "<b>" ] } })),
    );
    assert_eq!("a=2;b=1;", render(
        "{% for k, v in d|dictsort %}{{ k }}={{ v }};{% endfor %}",
        json!({ "d": { "b": 1, "a": 2 } }),
    ));
    assert_eq!("b=1;a=2;", render(
        "{% for k, v in d|dictsort(by='value') %}{{ k }}={{ v }};{% endfor %}",
        json!({ "d": { "a": 2, "b": 1 } }),
    ));
}

#[test]
fn filter_error_1() {
    let e = render_err(Config::default(), "{{ 1|frobnicate }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Unknown));

    let e = render_err(Config::default(), "{{ 'a'|upper(1) }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Call));
}

#[test]
fn test_1() {
    assert_eq!("True", render("{{ 4 is even }}", json!({})));
    assert_eq!("False", render("{{ 5 is not odd }}", json!({})));
    assert_eq!("True", render("{{ 9 is divisibleby(3) }}", json!({})));
    assert_eq!("True", render("{{ 'a' is string }}", json!({})));
    assert_eq!("True", render("{{ {} is mapping }}", json!({})));
    assert_eq!("True", render("{{ 2 is lt(3) }}", json!({})));
    assert_eq!("True", render("{{ 2 is in([1, 2]) }}", json!({})));
    assert_eq!("True", render("{{ range is callable }}", json!({})));
    assert_eq!("False", render("{{ 1.5 is integer }}", json!({})));
}

#[test]
fn test_error_1() {
    let e = render_err(Config::default(), "{{ 1 is frobnicated }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Unknown));
}

#[test]
fn if_tag_1() {
    let source = "{% if x > 1 %}big{% elif x == 1 %}one{% else %}small{% endif %}";
    assert_eq!("small", render(source, json!({ "x": 0 })));
    assert_eq!("one", render(source, json!({ "x": 1 })));
    assert_eq!("big", render(source, json!({ "x": 2 })));
}

#[test]
fn if_tag_2() {
    let source = "{% if a %}{% if b %}ab{% else %}a{% endif %}{% else %}none{% endif %}";
    assert_eq!("ab", render(source, json!({ "a": true, "b": true })));
    assert_eq!("a", render(source, json!({ "a": true, "b": false })));
    assert_eq!("none", render(source, json!({ "a": false, "b": true })));
}


fn only_if(wrapper: &Wrapper) -> &IfStatement {
    match wrapper.nodes.as_slice() {
        [ Node::Statement(block), ] => match &block.statement {
            Statement::If(s) => s,
            s => panic!("Expected an if statement, found {:?}", s),
        },
        nodes => panic!("Expected a single if statement, found {:?}", nodes),
    }
}

fn data_text(wrapper: &Wrapper) -> String {
    wrapper.nodes.iter()
        .map(|n| match n {
            Node::Data(data) => data.trimmed().to_owned(),
            n => panic!("Expected data, found {:?}", n),
        })
        .collect()
}

#[test]
fn if_tag_3() {
    let env = env_with(Config::default(), &[]);
    let template = env.parse_str(
        "nested",
        "{% if a %}{% if b %}ab{% else %}a{% endif %}{% else %}none{% endif %}",
    ).unwrap();

    let outer = only_if(&template.root);
    assert_eq!(1, outer.branches.len());
    assert_eq!(Some("else"), outer.branches[0].1.end_tag.as_deref());
    assert_eq!("none", data_text(outer.otherwise.as_ref().unwrap()));

    let inner = only_if(&outer.branches[0].1);
    assert_eq!(1, inner.branches.len());
    assert_eq!("ab", data_text(&inner.branches[0].1));
    assert_eq!("a", data_text(inner.otherwise.as_ref().unwrap()));
    assert_eq!(Some("endif"), inner.otherwise.as_ref().unwrap().end_tag.as_deref());
}

#[test]
fn for_tag_1() {
    assert_eq!(
        "1:a,2:b,3:c",
        render(
            "{% for i in items %}{{ loop.index }}:{{ i }}{% if not loop.last %},{% endif %}{% endfor %}",
            json!({ "items": [ "a", "b", "c" ] }),
        ),
    );
}

#[test]
fn for_tag_2() {
    assert_eq!("empty", render("{% for i in [] %}x{% else %}empty{% endfor %}", json!({})));
    assert_eq!("empty", render("{% for i in [1, 3] if i is even %}x{% else %}empty{% endfor %}", json!({})));
}

#[test]
fn for_tag_3() {
    assert_eq!("02468", render("{% for i in range(10) if i is even %}{{ i }}{% endfor %}", json!({})));
    assert_eq!("55555", render("{% for i in range(10) if i is odd %}{{ loop.length }}{% endfor %}", json!({})));
}

#[test]
fn for_tag_4() {
    assert_eq!("a=1;b=2;", render(
        "{% for k, v in d %}{{ k }}={{ v }};{% endfor %}",
        json!({ "d": { "a": 1, "b": 2 } }),
    ));
    assert_eq!("ab", render("{% for k in d %}{{ k }}{% endfor %}", json!({ "d": { "a": 1, "b": 2 } })));
    assert_eq!("3 7 ", render("{% for a, b in [[1, 2], [3, 4]] %}{{ a + b }} {% endfor %}", json!({})));
}

#[test]
fn for_tag_5() {
    assert_eq!("aba", render("{% for i in range(3) %}{{ loop.cycle('a', 'b') }}{% endfor %}", json!({})));
    assert_eq!(
        "-2,1-",
        render("{% for i in [1, 2] %}{{ loop.previtem }}-{{ loop.nextitem }}{% if loop.first %},{% endif %}{% endfor %}", json!({})),
    );
    assert_eq!("3210", render("{% for i in range(4) %}{{ loop.revindex0 }}{% endfor %}", json!({})));
}

#[test]
fn for_tag_6() {
    assert_eq!(
        "1",
        render("{% set x = 1 %}{% for i in range(2) %}{% set x = i + 10 %}{% endfor %}{{ x }}", json!({})),
    );
}

#[test]
fn for_tag_7() {
    assert_eq!("abc", render("{% for c in 'abc' %}{{ c }}{% endfor %}", json!({})));
    assert_eq!("", render("{% for c in missing %}{{ c }}{% endfor %}", json!({})));

    let e = render_err(Config::default(), "{% for c in 1 %}{% endfor %}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Type));
}

#[test]
fn set_tag_1() {
    assert_eq!("12", render("{% set a, b = 1, 2 %}{{ a }}{{ b }}", json!({})));
    assert_eq!("2", render("{% set xs = [1, 2] %}{{ xs|length }}", json!({})));
    assert_eq!("ab", render("{% set a, b = 'ab' %}{{ a }}{{ b }}", json!({})));
}

#[test]
fn set_tag_2() {
    assert_eq!(
        "[HI BOB]",
        render("{% set greeting | upper %}hi {{ name }}{% endset %}[{{ greeting }}]", json!({ "name": "bob" })),
    );
    assert_eq!("<b>", render("{% set html %}<b>{% endset %}{{ html }}", json!({})));
}

#[test]
fn set_tag_3() {
    let e = render_err(Config::default(), "{% set a, b = [1, 2, 3] %}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Type));
}

#[test]
fn with_tag_1() {
    assert_eq!("3|", render("{% with a = 1, b = 2 %}{{ a + b }}{% endwith %}|{{ a }}", json!({})));
    assert_eq!("2", render("{% with a = x + 1 %}{{ a }}{% endwith %}", json!({ "x": 1 })));
}

#[test]
fn filter_tag_1() {
    assert_eq!(
        "HELLO BOB",
        render("{% filter upper %}hello {{ name }}{% endfilter %}", json!({ "name": "bob" })),
    );
    assert_eq!(
        "Xb",
        render("{% filter replace('a', 'x')|capitalize %}ab{% endfilter %}", json!({})),
    );
}

#[test]
fn autoescape_1() {
    assert_eq!(
        "&lt;b&gt;<b>",
        render("{% autoescape true %}{{ '<b>' }}{% endautoescape %}{{ '<b>' }}", json!({})),
    );
    assert_eq!(
        "<b>&lt;b&gt;",
        render_with(escaping(), "{% autoescape false %}{{ '<b>' }}{% endautoescape %}{{ '<b>' }}", json!({})).unwrap(),
    );
}

#[test]
fn escape_1() {
    assert_eq!(
        "&lt;i&gt;&amp;&lt;/i&gt;|<i>&</i>|&lt;i&gt;&amp;&lt;/i&gt;",
        render_with(escaping(), "{{ html }}|{{ html|safe }}|{{ html|e }}", json!({ "html": "<i>&</i>" })).unwrap(),
    );
}

#[test]
fn escape_2() {
    assert_eq!(
        "<a>&lt;b&gt;",
        render_with(escaping(), "{{ '<a>'|safe ~ '<b>' }}", json!({})).unwrap(),
    );
    assert_eq!(
        "&#39;&#34;",
        render_with(escaping(), r#"{{ "'\"" }}"#, json!({})).unwrap(),
    );
    assert_eq!("&lt;a&gt; &amp; &#34;b&#34;", escape("<a> & \"b\""));
}

#[test]
fn escape_3() {
    assert_eq!(
        "&lt;a&gt;, <b>",
        render_with(escaping(), "{{ [a, b|safe]|join(', ') }}", json!({ "a": "<a>", "b": "<b>" })).unwrap(),
    );
}

#[test]
fn raw_tag_1() {
    assert_eq!("{{ not parsed }}{% if %}", render("{% raw %}{{ not parsed }}{% if %}{% endraw %}", json!({})));
    assert_eq!("x", render("{% raw -%}   x   {%- endraw %}", json!({})));
}

#[test]
fn comment_1() {
    assert_eq!("ab", render("a{# comment {{ x }} #}b", json!({})));
    assert_eq!("ab", render("a  {#- comment -#}  b", json!({})));
}

#[test]
fn whitespace_1() {
    assert_eq!("abc", render("a  {%- if true -%}  b  {%- endif -%}  c", json!({})));
    assert_eq!("a b", render("a {{- ' ' -}} b", json!({})));
}

#[test]
fn whitespace_2() {
    let config = Config {
        trim_blocks: true,
        ..Config::default()
    };
    assert_eq!("yes\n", render_with(config, "{% if true %}\nyes\n{% endif %}\n", json!({})).unwrap());
}

#[test]
fn whitespace_3() {
    let config = Config {
        trim_blocks: true,
        lstrip_blocks: true,
        ..Config::default()
    };
    let source = "<ul>\n    {% for i in [1, 2] %}\n    <li>{{ i }}</li>\n    {% endfor %}\n</ul>";
    assert_eq!(
        "<ul>\n    <li>1</li>\n    <li>2</li>\n</ul>",
        render_with(config.clone(), source, json!({})).unwrap(),
    );
    assert_eq!("  x", render_with(config, "  {%+ if true %}x{% endif %}", json!({})).unwrap());
}

#[test]
fn whitespace_4() {
    assert_eq!("a", render("a\n", json!({})));

    let config = Config {
        keep_trailing_newline: true,
        ..Config::default()
    };
    assert_eq!("a\n", render_with(config, "a\n", json!({})).unwrap());
}

#[test]
fn macro_tag_1() {
    assert_eq!(
        "Hello, Ann! Hi, Bob!",
        render(
            "{% macro greet(name, greeting='Hello') %}{{ greeting }}, {{ name }}!{% endmacro %}{{ greet('Ann') }} {{ greet('Bob', greeting='Hi') }}",
            json!({}),
        ),
    );
}

#[test]
fn macro_tag_2() {
    assert_eq!(
        "3210",
        render("{% macro count(n) %}{{ n }}{% if n > 0 %}{{ count(n - 1) }}{% endif %}{% endmacro %}{{ count(3) }}", json!({})),
    );
    assert_eq!(
        "[b]",
        render("{% macro a() %}[{{ b() }}]{% endmacro %}{% macro b() %}b{% endmacro %}{{ a() }}", json!({})),
    );
}

#[test]
fn macro_tag_3() {
    let e = render_err(Config::default(), "{% macro m(a) %}{% endmacro %}{{ m(1, 2) }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Call));

    let e = render_err(Config::default(), "{% macro m(a) %}{% endmacro %}{{ m(b=1) }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Call));
}

#[test]
fn macro_tag_4() {
    assert_eq!("[]", render("{% macro m(a) %}[{{ a }}]{% endmacro %}{{ m() }}", json!({})));
    assert_eq!(
        "False",
        render_with(strict(), "{% macro m(a) %}{{ a is defined }}{% endmacro %}{{ m() }}", json!({})).unwrap(),
    );

    let e = render_err(strict(), "{% macro m(a) %}{{ a }}{% endmacro %}{{ m() }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Undefined));
}

#[test]
fn macro_tag_5() {
    match render_err(Config::default(), "{% macro m(a, a) %}{% endmacro %}", json!({})) {
        Error::DuplicateParameter(name, _, _) => assert_eq!("a", name),
        e => panic!("Expected DuplicateParameter, found {:?}", e),
    }
}

#[test]
fn macro_tag_6() {
    assert_eq!(
        "<b>&lt;</b>",
        render_with(escaping(), "{% macro m() %}<b>{{ '<' }}</b>{% endmacro %}{{ m() }}", json!({})).unwrap(),
    );
    assert_eq!(
        "2",
        render("{% macro m() %}{{ g }}{% endmacro %}{{ m() }}", json!({ "g": 2 })),
    );
}

fn inheritance() -> Environment {
    env_with(Config::default(), &[
        ("base", "<{% block title %}Base{% endblock %}>{% block body %}body{% endblock %}"),
        ("child", "{% extends 'base' %}ignored{% block title %}Child{% endblock %}"),
        ("child2", "{% extends 'base' %}{% block title %}C/{{ super() }}{% endblock %}"),
        ("grand", "{% extends 'child2' %}{% block title %}G/{{ super() }}{% endblock %}"),
        ("vars", "{% extends 'base' %}{% set who = 'kid' %}{% block title %}{{ who }}{% endblock %}"),
        ("loop_base", "{% for i in [1, 2] %}{% block item %}{{ i }}{% endblock %}{% endfor %}"),
        ("loop_child", "{% extends 'loop_base' %}{% block item %}<{{ i }}>{% endblock %}"),
        ("nested_base", "{% block outer %}[{% block inner %}i{% endblock %}]{% endblock %}"),
        ("nested_child", "{% extends 'nested_base' %}{% block inner %}I{% endblock %}"),
        ("twice", "{% extends 'base' %}{% extends 'base' %}"),
        ("circle_a", "{% extends 'circle_b' %}"),
        ("circle_b", "{% extends 'circle_a' %}"),
        ("missing_parent", "{% extends 'nope' %}"),
    ])
}


#[test]
fn macro_tag_7() {
    let config = Config {
        recursion_limit: 10,
        ..Config::default()
    };
    let e = render_err(config, "{% macro f() %}{{ f() }}{% endmacro %}{{ f() }}", json!({}));
    assert!(matches!(eval_kind(&e), EvalErrorKind::Runtime));
    assert!(e.to_string().contains("maximum recursion depth"));

    assert_eq!(
        "10",
        render("{% macro count(n) %}{% if n > 0 %}{{ count(n - 1) }}{% else %}10{% endif %}{% endmacro %}{{ count(10) }}", json!({})),
    );
}

#[test]
fn extends_1() {
    let env = inheritance();
    let ctx = Context::new();
    assert_eq!("<Base>body", env.render("base", &ctx).unwrap());
    assert_eq!("<Child>body", env.render("child", &ctx).unwrap());
}

#[test]
fn extends_2() {
    let env = inheritance();
    let ctx = Context::new();
    assert_eq!("<C/Base>body", env.render("child2", &ctx).unwrap());
    assert_eq!("<G/C/Base>body", env.render("grand", &ctx).unwrap());
}

#[test]
fn extends_3() {
    let env = inheritance();
    let ctx = Context::new();
    assert_eq!("<kid>body", env.render("vars", &ctx).unwrap());
    assert_eq!("<1><2>", env.render("loop_child", &ctx).unwrap());
    assert_eq!("[I]", env.render("nested_child", &ctx).unwrap());
}

#[test]
fn extends_4() {
    let env = inheritance();
    match env.get_template("twice") {
        Err(Error::AlreadyExtending(_, name)) => assert_eq!("twice", name),
        r => panic!("Expected AlreadyExtending, found {:?}", r.map(|t| t.name.clone())),
    }
}

#[test]
fn extends_5() {
    let env = inheritance();
    match env.get_template("circle_a") {
        Err(Error::CircularExtends(name, _, _)) => assert_eq!("circle_a", name),
        r => panic!("Expected CircularExtends, found {:?}", r.map(|t| t.name.clone())),
    }
}

#[test]
fn extends_6() {
    let env = inheritance();
    match env.get_template("missing_parent") {
        Err(Error::Include(e, _, name)) => {
            assert_eq!("missing_parent", name);
            assert!(matches!(*e, Error::TemplateNotFound(_)));
        },
        r => panic!("Expected Include, found {:?}", r.map(|t| t.name.clone())),
    }
}

#[test]
fn extends_7() {
    let env = inheritance();
    let chain = env.get_template("grand").unwrap().chain()
        .iter()
        .map(|t| t.name.clone())
        .collect::<Vec<String>>();
    assert_eq!(vec![ "grand", "child2", "base", ], chain);
}

#[test]
fn block_tag_1() {
    match render_err(Config::default(), "{% block a %}{% endblock %}{% block a %}{% endblock %}", json!({})) {
        Error::DuplicateBlock(name, _, _) => assert_eq!("a", name),
        e => panic!("Expected DuplicateBlock, found {:?}", e),
    }
}

#[test]
fn block_tag_2() {
    assert_eq!("x", render("{% block a %}x{% endblock a %}", json!({})));
    match render_err(Config::default(), "{% block a %}x{% endblock b %}", json!({})) {
        Error::InvalidSyntax(..) => (),
        e => panic!("Expected InvalidSyntax, found {:?}", e),
    }
}

#[test]
fn statement_error_1() {
    match render_err(Config::default(), "{% frobnicate %}", json!({})) {
        Error::UnknownStatement(name, _, _) => assert_eq!("frobnicate", name),
        e => panic!("Expected UnknownStatement, found {:?}", e),
    }
}

#[test]
fn statement_error_2() {
    match render_err(Config::default(), "{% if true %}x", json!({})) {
        Error::UnexpectedEof(expected, _, _) => assert!(expected.contains("endif")),
        e => panic!("Expected UnexpectedEof, found {:?}", e),
    }
}

#[test]
fn statement_error_3() {
    match render_err(Config::default(), "{% if true extra %}x{% endif %}", json!({})) {
        Error::UnexpectedToken(expected, found, _, _) => {
            assert_eq!("end of tag", expected);
            assert!(found.contains("extra"));
        },
        e => panic!("Expected UnexpectedToken, found {:?}", e),
    }
}

#[test]
#[should_panic]
fn statement_error_4() {
    render("{% for x %}{% endfor %}", json!({}));
}

fn includes() -> Environment {
    env_with(Config::default(), &[
        ("header", "Hi {{ name }}"),
        ("page", "{% include 'header' %}!"),
        ("isolated", "{% include 'header' without context %}!"),
        ("choice", "{% include ['missing', 'header'] %}"),
        ("local", "{% set name = 'Bob' %}{% include 'header' %}"),
        ("optional", "[{% include 'missing' ignore missing %}]"),
        ("broken", "{% include 'missing' %}"),
        ("m", "{% macro hello(n) %}Hello {{ n }}{% endmacro %}{% set version = 2 %}top-level output"),
        ("import", "{% import 'm' as m %}{{ m.hello('Ann') }} v{{ m.version }}"),
        ("from", "{% from 'm' import hello as hi, version %}{{ hi('Bob') }} {{ version }}"),
        ("from_missing", "{% from 'm' import nope %}"),
    ])
}

#[test]
fn include_tag_1() {
    let env = includes();
    let ctx = Context::from_json(&json!({ "name": "Ann" })).unwrap();
    assert_eq!("Hi Ann!", env.render("page", &ctx).unwrap());
    assert_eq!("Hi !", env.render("isolated", &ctx).unwrap());
    assert_eq!("Hi Ann", env.render("choice", &ctx).unwrap());
    assert_eq!("Hi Bob", env.render("local", &ctx).unwrap());
    assert_eq!("[]", env.render("optional", &ctx).unwrap());
}

#[test]
fn include_tag_2() {
    let env = includes();
    match env.render("broken", &Context::new()) {
        Err(Error::Include(e, _, name)) => {
            assert_eq!("broken", name);
            assert!(matches!(*e, Error::TemplateNotFound(_)));
        },
        r => panic!("Expected Include, found {:?}", r),
    }
}


#[test]
fn include_tag_3() {
    let env = env_with(Config::default(), &[
        ("self", "x{% include 'self' %}"),
        ("loop_a", "{% import 'loop_b' as b %}"),
        ("loop_b", "{% import 'loop_a' as a %}"),
    ]);

    let e = env.render("self", &Context::new()).unwrap_err();
    assert!(matches!(eval_kind(&e), EvalErrorKind::Runtime));

    let e = env.render("loop_a", &Context::new()).unwrap_err();
    assert!(matches!(eval_kind(&e), EvalErrorKind::Runtime));
}

#[test]
fn import_tag_1() {
    let env = includes();
    let ctx = Context::new();
    assert_eq!("Hello Ann v2", env.render("import", &ctx).unwrap());
    assert_eq!("Hello Bob 2", env.render("from", &ctx).unwrap());
}

#[test]
fn import_tag_2() {
    let env = includes();
    let e = env.render("from_missing", &Context::new()).unwrap_err();
    assert!(matches!(eval_kind(&e), EvalErrorKind::Undefined));
}

#[test]
fn loader_1() {
    let env = Environment::new(Config::default(), FileSystemLoader::new("test/loader/1")).unwrap();
    assert_eq!("<main>part</main>", env.render("pages/index.html", &Context::new()).unwrap());
    assert_eq!("root part", env.render("part.html", &Context::new()).unwrap());
}

#[test]
fn loader_2() {
    let env = Environment::new(Config::default(), FileSystemLoader::new("test/loader/2")).unwrap();
    let ctx = Context::from_json(&json!({ "url": "/x", "title": "X" })).unwrap();
    assert_eq!(r#"<a href="/x">X</a>"#, env.render("page.html", &ctx).unwrap());
}

#[test]
fn loader_3() {
    let env = Environment::new(Config::default(), FileSystemLoader::new("test/loader/1")).unwrap();
    match env.get_template("nope.html") {
        Err(Error::TemplateNotFound(name)) => assert_eq!("nope.html", name),
        r => panic!("Expected TemplateNotFound, found {:?}", r.map(|t| t.name.clone())),
    }
}

#[test]
fn cache_1() {
    let env = includes();
    let a = env.get_template("header").unwrap();
    let b = env.clone().get_template("header").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    env.clear_cache();
    let c = env.get_template("header").unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
}


#[test]
fn cache_2() {
    let env = env_with(Config::default(), &[
        ("layout", "<{% block body %}{% endblock %}>"),
        ("page", concat!(
            "{% extends 'layout' %}",
            "{% macro item(x) %}[{{ x }}]{% endmacro %}",
            "{% block body %}{% for i in items %}{{ item(i) }}{% endfor %}{% endblock %}",
        )),
    ]);
    let ctx = Context::from_json(&json!({ "items": [ 1, 2, 3 ] })).unwrap();

    let first = env.render("page", &ctx).unwrap();
    let cached = env.get_template("page").unwrap();
    let second = env.render("page", &ctx).unwrap();

    assert_eq!("<[1][2][3]>", first);
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&cached, &env.get_template("page").unwrap()));
    assert_eq!(first, env.render_template(cached, &ctx).unwrap());
}

#[test]
fn environment_1() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Environment>();
    assert_send_sync::<Template>();
}

#[test]
fn environment_2() {
    let env = env_with(Config::default(), &[])
        .with_filter("double", |_, v, _| match v.as_int() {
            Some(i) => Value::Int(i * 2),
            None => Value::Nil,
        })
        .with_test("answer", |_, v, _| Ok(v.as_int() == Some(42)))
        .with_global_fn("shout", |_, args| {
            Value::from(args.get(0).map(|v| v.to_output().to_uppercase()).unwrap_or_default())
        })
        .with_global("site", json!({ "name": "Tessera" }));

    let ctx = Context::new();
    assert_eq!("42", env.render_str("{{ 21|double }}", &ctx).unwrap());
    assert_eq!("True", env.render_str("{{ 42 is answer }}", &ctx).unwrap());
    assert_eq!("HEY", env.render_str("{{ shout('hey') }}", &ctx).unwrap());
    assert_eq!("Tessera", env.render_str("{{ site.name }}", &ctx).unwrap());
}

#[derive(Debug)]
struct Shout {
    expr: Expr,
}

impl ControlStructure for Shout {
    fn execute(
        &self,
        renderer: &mut Renderer<'_>,
        _: &StatementBlock,
        ctx: &Rc<Context>,
        out: &mut String,
    ) -> Result<()> {
        let value = renderer.eval(&self.expr, ctx)?;
        out.push_str(&value.to_output().to_uppercase());
        Ok(())
    }
}

#[test]
fn environment_3() {
    let env = env_with(Config::default(), &[])
        .with_statement("shout", |_, args| {
            let expr = args.parse_expression()?;
            Ok(Statement::Extension(Arc::new(Shout { expr, })))
        });

    let ctx = Context::from_json(&json!({ "name": "ann" })).unwrap();
    assert_eq!("Hi ANN!", env.render_str("Hi {% shout name %}!", &ctx).unwrap());
}

#[test]
fn environment_4() {
    let env = includes();
    assert_eq!("Hi Ann", env.render_json("header", &json!({ "name": "Ann" })).unwrap());
    assert!(matches!(env.render_json("header", &json!([ 1 ])), Err(Error::NotAMap(_))));
}

#[test]
fn globals_1() {
    assert_eq!("[0, 1, 2]", render("{{ range(3) }}", json!({})));
    assert_eq!("[5, 3]", render("{{ range(5, 1, -2) }}", json!({})));
    assert_eq!("1", render("{{ dict(a=1).a }}", json!({})));

    let e = render_err(Config::default(), "{{ raise_exception('boom') }}", json!({}));
    match e {
        Error::Eval(e, _, _) => assert_eq!("boom", e.message()),
        e => panic!("Expected Eval, found {:?}", e),
    }
}

#[test]
fn context_1() {
    let root = Context::new();
    root.set("a", 1);
    root.set("b", 2);

    let child = root.inherit();
    child.set("a", 10);

    assert_eq!(Some(Value::Int(10)), child.get("a"));
    assert_eq!(Some(Value::Int(2)), child.get("b"));
    assert_eq!(Some(Value::Int(1)), root.get("a"));
    assert!(child.has("b"));
    assert!(!root.has("c"));

    let flat = child.flatten();
    assert_eq!(Some(&Value::Int(10)), flat.get("a"));
    assert_eq!(1, child.locals().len());
}

#[test]
fn context_2() {
    let ctx = Context::read("test/context/1/ctx.json").unwrap();
    assert_eq!(Some(Value::from("Tessera")), ctx.get("title"));
    assert_eq!(Some(Value::Int(3)), ctx.get("count"));

    ctx.read_in_as("test/context/2/meta.json", "site.meta").unwrap();
    let env = env_with(Config::default(), &[]);
    assert_eq!("meta/False", env.render_str("{{ site.meta.name }}/{{ site.meta.draft }}", &ctx).unwrap());
}

#[test]
fn context_3() {
    assert!(matches!(Context::read("test/context/2/list.json"), Err(Error::NotAMap(_))));
    assert!(matches!(Context::read("test/context/missing.json"), Err(Error::IO(..))));
}

#[test]
fn config_1() {
    let config = Config::read("test/config/1/config.json").unwrap();
    assert!(config.trim_blocks);
    assert!(config.lstrip_blocks);
    assert!(config.strict_undefined);
    assert!(!config.auto_escape);
    assert_eq!("{%", config.block_start_string);
    assert_eq!(32, config.recursion_limit);
}

#[test]
fn config_2() {
    assert!(matches!(Config::read("test/config/1/clash.json"), Err(Error::InvalidConfig(_))));

    let config = Config {
        block_end_string: String::new(),
        ..Config::default()
    };
    assert!(matches!(Environment::new(config, MemoryLoader::new()), Err(Error::InvalidConfig(_))));
}

#[test]
fn value_1() {
    let value = Value::from(&json!({ "a": [ 1, 2.5, "x", null, true ] }));
    assert_eq!("{'a': [1, 2.5, 'x', None, True]}", value.repr());
    assert_eq!(json!({ "a": [ 1, 2.5, "x", null, true ] }), value.to_json().unwrap());
    assert!(Value::Int(1).equals(&Value::Float(1.0)));
    assert!(!Value::from("1").equals(&Value::Int(1)));
    assert!(!Value::list(Vec::new()).is_truthy());
}

#[test]
fn value_2() {
    let signature = Signature::new(vec![ "a", "b", ], 1);
    assert!(signature.check("f", &VarArgs::positional(vec![ Value::Int(1), ])).is_ok());
    assert!(signature.check("f", &VarArgs::positional(Vec::new())).is_err());
    assert!(signature.check("f", &VarArgs::positional(vec![ Value::Nil; 3 ])).is_err());

    let mut kwargs = indexmap::IndexMap::new();
    kwargs.insert("a".to_owned(), Value::Int(1));
    assert!(signature.check("f", &VarArgs::new(vec![ Value::Int(1), ], kwargs)).is_err());
}
