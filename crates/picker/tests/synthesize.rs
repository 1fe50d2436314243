#![cfg(test)]
#![allow(
    clippy::expect_used,
    reason = "Fixtures are known-good; a failure here is a broken test"
)]
#![allow(
    clippy::tests_outside_test_module,
    reason = "Integration tests live at the crate root"
)]

use css_selectors::DocumentQuery as _;
use html::{Document, NodeId};
use picker::{MAX_PATH_SEGMENTS, is_unique, synthesize};

fn parse(markup: &str) -> Document {
    let _ = env_logger::builder().is_test(true).try_init();
    Document::parse(markup).expect("test markup parses")
}

fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.get_element_by_id(id).expect("element with id exists")
}

fn first(doc: &Document, selector: &str) -> NodeId {
    doc.query_selector(selector)
        .expect("valid selector")
        .expect("element exists")
}

#[test]
fn unique_id_wins() {
    let doc = parse(r#"<div id="main"><p id="intro" class="lead">Hi</p></div>"#);
    assert_eq!(synthesize(&doc, by_id(&doc, "intro")), "#intro");
}

#[test]
fn id_with_space_and_colon_is_escaped_and_still_matches() {
    let doc = parse(r#"<div><span id="a b:c">x</span></div>"#);
    let target = by_id(&doc, "a b:c");
    let selector = synthesize(&doc, target);
    assert_eq!(selector, r"#a\ b\:c");
    assert_eq!(doc.query_all(&selector), Ok(vec![target]));
}

#[test]
fn stable_attribute_beats_shared_class() {
    let doc = parse(
        r#"<form>
             <button class="btn" data-testid="save">Save</button>
             <button class="btn">Cancel</button>
           </form>"#,
    );
    let target = first(&doc, "[data-testid=save]");
    assert_eq!(synthesize(&doc, target), r#"button[data-testid="save"]"#);
}

#[test]
fn attribute_priority_follows_list_order() {
    let doc = parse(r#"<input name="email" aria-label="Email address" data-qa="email-field">"#);
    let target = first(&doc, "input");
    assert_eq!(synthesize(&doc, target), r#"input[data-qa="email-field"]"#);
}

#[test]
fn overlong_attribute_is_skipped_for_the_next_one() {
    let long_label = "x".repeat(65);
    let markup = format!(r#"<input aria-label="{long_label}" name="q">"#);
    let doc = parse(&markup);
    let target = first(&doc, "input");
    assert_eq!(synthesize(&doc, target), r#"input[name="q"]"#);
}

#[test]
fn attribute_value_quotes_are_escaped() {
    let doc = parse(r#"<a aria-label='Say "hi"' href="/">hi</a>"#);
    let target = first(&doc, "a");
    let selector = synthesize(&doc, target);
    assert_eq!(selector, r#"a[aria-label="Say \"hi\""]"#);
    assert!(is_unique(&doc, &selector));
}

#[test]
fn duplicate_attribute_falls_back_to_path() {
    let doc = parse(
        r#"<ul class="menu"><li name="item">a</li><li name="item">b</li></ul>"#,
    );
    let second = doc.query_all("li").expect("valid")[1];
    let selector = synthesize(&doc, second);
    assert_eq!(selector, "li:nth-of-type(2)");
    assert!(is_unique(&doc, &selector));
}

#[test]
fn nth_of_type_disambiguates_with_ancestor_context() {
    let doc = parse(
        r#"<ul><li>a</li><li>b</li></ul>
           <ul><li>c</li><li>d</li></ul>"#,
    );
    let target = doc.query_all("li").expect("valid")[3];
    let selector = synthesize(&doc, target);
    assert_eq!(selector, "ul:nth-of-type(2) > li:nth-of-type(2)");
    assert_eq!(doc.query_all(&selector), Ok(vec![target]));
}

#[test]
fn classes_are_limited_to_two_per_segment() {
    let doc = parse(
        r#"<section><p class="one two three">a</p></section>
           <section><p class="one two three">b</p><p>c</p></section>"#,
    );
    let target = doc.query_all("p.one").expect("valid")[1];
    let selector = synthesize(&doc, target);
    assert_eq!(selector, "section:nth-of-type(2) > p.one.two:nth-of-type(1)");
    assert!(is_unique(&doc, &selector));
}

#[test]
fn id_ancestor_anchors_the_path() {
    let doc = parse(
        r#"<div id="app"><p>one</p><p>two</p></div>
           <div><p>three</p><p>four</p></div>"#,
    );
    let target = doc.query_all("p").expect("valid")[1];
    assert_eq!(synthesize(&doc, target), "div#app > p:nth-of-type(2)");
}

#[test]
fn duplicate_id_is_accepted_even_when_not_unique() {
    let doc = parse(r#"<div id="dup">a</div><div id="dup">b</div>"#);
    let second = doc.query_all("div").expect("valid")[1];
    let selector = synthesize(&doc, second);
    assert_eq!(selector, "div#dup");
    assert!(!is_unique(&doc, &selector));
}

#[test]
fn id_that_is_not_a_valid_identifier_still_terminates() {
    let doc = parse(r#"<section id="1st"><p>a</p></section>"#);
    let target = by_id(&doc, "1st");
    assert!(!is_unique(&doc, "#1st"));
    assert_eq!(synthesize(&doc, target), "section#1st");
}

#[test]
fn deep_repetitive_nesting_stops_at_six_segments() {
    let branch = format!(
        "{}<span>leaf</span>{}",
        r#"<div class="box">"#.repeat(10),
        "</div>".repeat(10)
    );
    let doc = parse(&format!("{branch}{branch}"));
    let target = doc.query_all("span").expect("valid")[1];
    let selector = synthesize(&doc, target);
    assert!(!selector.is_empty());
    assert_eq!(selector.split(" > ").count(), MAX_PATH_SEGMENTS);
    assert!(!is_unique(&doc, &selector));
}

#[test]
fn root_element_falls_back_to_tag_name() {
    let doc = parse("<p>x</p>");
    let html = doc.document_element().expect("root element");
    assert_eq!(synthesize(&doc, html), "html");
}

#[test]
fn detached_element_still_gets_a_selector() {
    let mut doc = parse(r#"<div class="card"><b class="title">t</b></div><div class="card"></div>"#);
    let title = first(&doc, "b.title");
    let card = first(&doc, "div.card");
    doc.detach(card);
    let selector = synthesize(&doc, title);
    assert_eq!(selector, "div.card > b.title");
    assert!(!is_unique(&doc, &selector));
}

#[test]
fn invalid_selector_is_not_unique() {
    let doc = parse("<p>x</p>");
    assert!(!is_unique(&doc, "p >"));
    assert!(!is_unique(&doc, "p:hover"));
    assert!(is_unique(&doc, "p"));
    assert!(is_unique(&doc, "p:nth-of-type(n-2147483648)"));
    assert!(!is_unique(&doc, "p:nth-of-type(-n-2147483648)"));
}
