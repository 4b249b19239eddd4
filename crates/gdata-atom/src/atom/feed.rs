//! `<feed>`: a page of entries plus OpenSearch paging metadata.

use gdata_core::time::format_iso8601;
use gdata_parsable::parser::{self, ParserOptions};
use gdata_parsable::{
    ATOM_NS, Claim, KindInfo, Namespaces, ParseContext, ParseError, ParseResult, Parsable,
    ParsableBase, ParsableKind, XmlElement, XmlWriter, collect_namespaces, parse_element,
    parse_json_value, to_json_value,
};
use serde_json::{Map, Value};
use tracing::trace;

use super::entry::non_empty_string;
use super::link::REL_SELF;
use super::{Author, Category, Entry, Generator, Link, add_unique};
use crate::{GD_NS, OPENSEARCH_NS};

/// A feed of `E` entries, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed<E = Entry> {
    base: ParsableBase,
    etag: Option<String>,
    id: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    logo: Option<String>,
    icon: Option<String>,
    rights: Option<String>,
    updated: Option<i64>,
    categories: Vec<Category>,
    links: Vec<Link>,
    authors: Vec<Author>,
    generator: Option<Generator>,
    total_results: Option<u32>,
    start_index: Option<u32>,
    items_per_page: Option<u32>,
    next_page_token: Option<String>,
    entries: Vec<E>,
}

impl<E: ParsableKind> Feed<E> {
    pub fn new(id: impl Into<String>, updated: i64) -> Self {
        Self {
            id: Some(id.into()),
            updated: Some(updated),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn rights(&self) -> Option<&str> {
        self.rights.as_deref()
    }

    pub fn updated(&self) -> Option<i64> {
        self.updated
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn generator(&self) -> Option<&Generator> {
        self.generator.as_ref()
    }

    pub fn total_results(&self) -> Option<u32> {
        self.total_results
    }

    /// One-based index of the first entry on this page.
    pub fn start_index(&self) -> Option<u32> {
        self.start_index
    }

    pub fn items_per_page(&self) -> Option<u32> {
        self.items_per_page
    }

    /// Continuation token of JSON feeds.
    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<E> {
        self.entries
    }

    pub fn look_up_link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.has_relation(rel))
    }

    pub fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_owned);
        self.base.invalidate();
    }

    pub fn set_page_info(&mut self, total_results: Option<u32>, items_per_page: Option<u32>) {
        self.total_results = total_results;
        self.items_per_page = items_per_page;
        self.base.invalidate();
    }

    pub fn push_entry(&mut self, entry: E) {
        self.entries.push(entry);
        self.base.invalidate();
    }

    fn parse_atom(&mut self, child: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<Claim> {
        let once = ParserOptions::NO_DUPES;
        match child.name.as_str() {
            "title" => parser::string_from_element(
                child,
                ctx,
                ParserOptions::DEFAULT | once,
                &mut self.title,
            ),
            "subtitle" => parser::string_from_element(child, ctx, once, &mut self.subtitle),
            "id" => parser::string_from_element(
                child,
                ctx,
                ParserOptions::REQUIRED | ParserOptions::NON_EMPTY | once,
                &mut self.id,
            ),
            "logo" => parser::string_from_element(child, ctx, once, &mut self.logo),
            "icon" => parser::string_from_element(child, ctx, once, &mut self.icon),
            "rights" => parser::string_from_element(child, ctx, once, &mut self.rights),
            "updated" => parser::time_from_element(child, ctx, once, &mut self.updated),
            "generator" => parser::object_from_element(child, ctx, once, &mut self.generator),
            "category" => {
                add_unique(&mut self.categories, parse_element(child, ctx.options)?);
                Ok(Claim::Handled)
            }
            "link" => {
                add_unique(&mut self.links, parse_element(child, ctx.options)?);
                Ok(Claim::Handled)
            }
            "author" => {
                add_unique(&mut self.authors, parse_element(child, ctx.options)?);
                Ok(Claim::Handled)
            }
            _ => Ok(Claim::Unhandled),
        }
    }
}

const FEED_KIND: KindInfo = KindInfo::atom("feed");

impl<E: ParsableKind> ParsableKind for Feed<E> {
    const KIND: KindInfo = FEED_KIND;
}

impl<E: ParsableKind> Parsable for Feed<E> {
    fn kind_info(&self) -> &'static KindInfo {
        &FEED_KIND
    }

    fn base(&self) -> &ParsableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ParsableBase {
        &mut self.base
    }

    fn pre_parse_xml(&mut self, root: &XmlElement, _ctx: &ParseContext<'_>) -> ParseResult<()> {
        self.etag = root.attribute_ns(GD_NS, "etag").map(str::to_owned);
        Ok(())
    }

    fn parse_xml(&mut self, child: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<Claim> {
        if E::KIND.matches(child) {
            let entry = parse_element::<E>(child, ctx.options)?;
            trace!(count = self.entries.len() + 1, "parsed feed entry");
            self.entries.push(entry);
            return Ok(Claim::Handled);
        }

        if child.in_namespace(OPENSEARCH_NS) {
            let dest = match child.name.as_str() {
                "totalResults" => &mut self.total_results,
                "startIndex" => &mut self.start_index,
                "itemsPerPage" => &mut self.items_per_page,
                _ => return Ok(Claim::Unhandled),
            };
            return parser::number_from_element(child, ctx, ParserOptions::NO_DUPES, dest);
        }

        if child.in_namespace(ATOM_NS) {
            return self.parse_atom(child, ctx);
        }
        Ok(Claim::Unhandled)
    }

    fn post_parse_xml(&mut self) -> ParseResult<()> {
        if self.id.is_none() {
            return Err(ParseError::required_element("id", "feed"));
        }
        if self.updated.is_none() {
            return Err(ParseError::required_element("updated", "feed"));
        }
        Ok(())
    }

    fn pre_get_xml(&self, out: &mut XmlWriter) {
        out.optional_attribute("gd:etag", self.etag.as_deref());
    }

    fn get_xml(&self, out: &mut XmlWriter) {
        out.text_element(
            "title",
            &[("type", "text")],
            self.title.as_deref().unwrap_or_default(),
        );
        out.optional_text_element("subtitle", self.subtitle.as_deref());
        out.optional_text_element("id", self.id.as_deref());
        out.optional_text_element("updated", self.updated.and_then(format_iso8601).as_deref());
        out.optional_text_element("logo", self.logo.as_deref());
        out.optional_text_element("icon", self.icon.as_deref());
        out.optional_text_element("rights", self.rights.as_deref());
        out.children(&self.categories);
        out.children(&self.links);
        out.children(&self.authors);
        if let Some(generator) = &self.generator {
            out.child(generator);
        }

        let paging = [
            ("openSearch:totalResults", self.total_results),
            ("openSearch:startIndex", self.start_index),
            ("openSearch:itemsPerPage", self.items_per_page),
        ];
        for (name, value) in paging {
            if let Some(value) = value {
                out.text_element(name, &[], &value.to_string());
            }
        }

        out.children(&self.entries);
    }

    fn get_namespaces(&self, namespaces: &mut Namespaces) {
        if self.etag.is_some() {
            namespaces.insert("gd", GD_NS);
        }
        let paged = self.total_results.is_some()
            || self.start_index.is_some()
            || self.items_per_page.is_some();
        if paged {
            namespaces.insert("openSearch", OPENSEARCH_NS);
        }
        for category in &self.categories {
            collect_namespaces(category, namespaces);
        }
        for link in &self.links {
            collect_namespaces(link, namespaces);
        }
        for author in &self.authors {
            collect_namespaces(author, namespaces);
        }
        if let Some(generator) = &self.generator {
            collect_namespaces(generator, namespaces);
        }
        for entry in &self.entries {
            collect_namespaces(entry, namespaces);
        }
    }

    fn parse_json(&mut self, member: &str, value: &Value) -> ParseResult<Claim> {
        match member {
            "items" => {
                let Value::Array(items) = value else {
                    return Err(ParseError::WrongMemberType {
                        member: member.to_owned(),
                        expected: "array",
                    });
                };
                for item in items {
                    self.entries.push(parse_json_value::<E>(item)?);
                }
                Ok(Claim::Handled)
            }
            "selfLink" => {
                let uri = non_empty_string(member, value)?;
                add_unique(&mut self.links, Link::new(uri, Some(REL_SELF)));
                Ok(Claim::Handled)
            }
            "kind" => Ok(Claim::Handled),
            "etag" => {
                parser::string_from_json_member(member, value, ParserOptions::NONE, &mut self.etag)
            }
            "nextPageToken" => parser::string_from_json_member(
                member,
                value,
                ParserOptions::NONE,
                &mut self.next_page_token,
            ),
            _ => Ok(Claim::Unhandled),
        }
    }

    fn get_json(&self, out: &mut Map<String, Value>) {
        if let Some(etag) = &self.etag {
            out.insert("etag".to_owned(), Value::from(etag.as_str()));
        }
        if let Some(link) = self.look_up_link(REL_SELF) {
            out.insert("selfLink".to_owned(), Value::from(link.uri()));
        }
        if let Some(token) = &self.next_page_token {
            out.insert("nextPageToken".to_owned(), Value::from(token.as_str()));
        }
        let items = self
            .entries
            .iter()
            .map(|entry| to_json_value(entry))
            .collect();
        out.insert("items".to_owned(), Value::Array(items));
    }
}

impl Feed<Entry> {
    /// Finds an entry by ID.
    pub fn look_up_entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_parsable::{ParseErrorKind, parse_json, parse_xml, to_xml};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:openSearch="http://a9.com/-/spec/opensearch/1.1/" xmlns:gd="http://schemas.google.com/g/2005">
  <id>http://example.com/feeds/default</id>
  <updated>2009-04-25T15:22:47.000Z</updated>
  <title>Documents</title>
  <generator version="1.0" uri="http://example.com">Example</generator>
  <link href="http://example.com/feeds/default?start-index=26" rel="next"/>
  <openSearch:totalResults>52</openSearch:totalResults>
  <openSearch:startIndex>1</openSearch:startIndex>
  <openSearch:itemsPerPage>25</openSearch:itemsPerPage>
  <entry gd:etag="W/&quot;1&quot;"><id>urn:a</id><title>A</title></entry>
  <entry><id>urn:b</id><title>B</title></entry>
</feed>"#;

    #[test]
    fn parses_paging_and_entries_in_order() {
        let feed: Feed = parse_xml(FEED).unwrap();
        assert_eq!(feed.id(), Some("http://example.com/feeds/default"));
        assert_eq!(feed.title(), Some("Documents"));
        assert_eq!(feed.total_results(), Some(52));
        assert_eq!(feed.start_index(), Some(1));
        assert_eq!(feed.items_per_page(), Some(25));
        assert_eq!(feed.generator().and_then(Generator::name), Some("Example"));
        assert!(feed.look_up_link("next").is_some());

        let ids: Vec<_> = feed.entries().iter().filter_map(Entry::id).collect();
        assert_eq!(ids, ["urn:a", "urn:b"]);
        assert_eq!(feed.look_up_entry("urn:b").and_then(Entry::title), Some("B"));
    }

    #[test]
    fn id_and_updated_are_required() {
        let err = parse_xml::<Feed>(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><updated>2009-04-25T15:22:47Z</updated></feed>"#,
        )
        .unwrap_err();
        assert_eq!(err, ParseError::required_element("id", "feed"));

        let err = parse_xml::<Feed>(r#"<feed xmlns="http://www.w3.org/2005/Atom"><id>x</id></feed>"#)
            .unwrap_err();
        assert_eq!(err, ParseError::required_element("updated", "feed"));
    }

    #[test]
    fn duplicate_paging_element_is_rejected() {
        let err = parse_xml::<Feed>(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:openSearch="http://a9.com/-/spec/opensearch/1.1/">
                 <openSearch:totalResults>1</openSearch:totalResults>
                 <openSearch:totalResults>2</openSearch:totalResults>
               </feed>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::DuplicateElement);
    }

    #[test]
    fn namespaces_cover_feed_and_entries() {
        let feed: Feed = parse_xml(FEED).unwrap();
        let xml = to_xml(&feed);
        assert!(xml.starts_with(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005" xmlns:openSearch="http://a9.com/-/spec/opensearch/1.1/">"#
        ));
        assert!(xml.contains(r#"<entry gd:etag="W/&quot;1&quot;"><title type="text">A</title><id>urn:a</id></entry>"#));

        let again: Feed = parse_xml(&xml).unwrap();
        assert_eq!(again, feed);
    }

    #[test]
    fn extensions_on_feed_children_stay_bound() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><id>urn:f</id><updated>2009-04-25T15:22:47Z</updated>
            <category term="c"><y:tag xmlns:y="urn:y"/></category>
            <link href="http://example.com/" rel="alternate"><x:meta xmlns:x="urn:x"/></link>
            <generator uri="http://example.com"><z:build xmlns:z="urn:z"/>Example</generator>
          </feed>"#;
        let feed: Feed = parse_xml(xml).unwrap();
        let out = to_xml(&feed);
        assert!(out.starts_with(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:x="urn:x" xmlns:y="urn:y" xmlns:z="urn:z">"#
        ));

        let again: Feed = parse_xml(&out).unwrap();
        let link = again.look_up_link("alternate").unwrap();
        assert!(link.base().extensions().find("urn:x", "meta").is_some());
    }

    #[test]
    fn unpaged_feed_declares_no_opensearch() {
        let mut feed: Feed = Feed::new("urn:feed", 0);
        feed.push_entry(Entry::new(Some("urn:1")));
        assert_eq!(
            to_xml(&feed),
            concat!(
                r#"<feed xmlns="http://www.w3.org/2005/Atom">"#,
                r#"<title type="text"></title><id>urn:feed</id><updated>1970-01-01T00:00:00.000Z</updated>"#,
                r#"<entry><title type="text"></title><id>urn:1</id></entry>"#,
                "</feed>",
            )
        );
    }

    #[test]
    fn json_items_become_entries() {
        let feed: Feed = parse_json(
            r#"{"kind":"tasks#tasks","etag":"\"f\"","nextPageToken":"p2",
                "selfLink":"https://example.com/lists",
                "items":[{"id":"t1","title":"One"},{"id":"t2","title":"Two"}]}"#,
        )
        .unwrap();
        assert_eq!(feed.entries().len(), 2);
        assert_eq!(feed.next_page_token(), Some("p2"));
        assert_eq!(feed.etag(), Some("\"f\""));
        assert_eq!(feed.look_up_link("self").map(Link::uri), Some("https://example.com/lists"));

        let err = parse_json::<Feed>(r#"{"items":{"id":"t1"}}"#).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
    }
}
