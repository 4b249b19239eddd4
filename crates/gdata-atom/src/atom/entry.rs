//! `<entry>`: a single Atom entry with its GData extensions.

use gdata_core::time::format_iso8601;
use gdata_parsable::parser::{self, ParserOptions};
use gdata_parsable::{
    ATOM_NS, Claim, KindInfo, Namespaces, ParseContext, ParseError, ParseResult, Parsable,
    ParsableBase, ParsableKind, XmlElement, XmlWriter, collect_namespaces, parse_element,
};
use serde_json::{Map, Value};
use tracing::debug;

use super::category::KIND_SCHEME;
use super::link::REL_SELF;
use super::{Author, Category, Content, Link, add_unique};
use crate::{BATCH_NS, GD_NS};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    base: ParsableBase,
    etag: Option<String>,
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    rights: Option<String>,
    content: Option<Content>,
    updated: Option<i64>,
    published: Option<i64>,
    categories: Vec<Category>,
    links: Vec<Link>,
    authors: Vec<Author>,
}

impl Entry {
    pub fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_owned),
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

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn rights(&self) -> Option<&str> {
        self.rights.as_deref()
    }

    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Last update time in epoch milliseconds.
    pub fn updated(&self) -> Option<i64> {
        self.updated
    }

    pub fn published(&self) -> Option<i64> {
        self.published
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

    /// An entry has been inserted on the server once it carries an ID or
    /// an update time.
    pub fn is_inserted(&self) -> bool {
        self.id.is_some() || self.updated.is_some()
    }

    /// The `batch:id` a batch response echoes back for this entry.
    pub fn batch_id(&self) -> Option<String> {
        self.base.extensions().find(BATCH_NS, "id")?.text()
    }

    /// The HTTP status code and reason of a batch response entry.
    pub fn batch_status(&self) -> Option<(u16, Option<&str>)> {
        let status = self.base.extensions().find(BATCH_NS, "status")?;
        let code = status.attribute("code")?.trim().parse().ok()?;
        Some((code, status.attribute("reason")))
    }

    /// The first link with relation `rel` (short or URI form).
    pub fn look_up_link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.has_relation(rel))
    }

    pub fn look_up_links<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.has_relation(rel))
    }

    /// Drops the entity tag and the cached serialization. Every setter
    /// calls this.
    fn touch(&mut self) {
        self.etag = None;
        self.base.invalidate();
    }

    pub fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_owned);
        self.touch();
    }

    pub fn set_summary(&mut self, summary: Option<&str>) {
        self.summary = summary.map(str::to_owned);
        self.touch();
    }

    pub fn set_rights(&mut self, rights: Option<&str>) {
        self.rights = rights.map(str::to_owned);
        self.touch();
    }

    pub fn set_content(&mut self, content: Option<Content>) {
        self.content = content;
        self.touch();
    }

    pub fn set_id(&mut self, id: Option<&str>) {
        self.id = id.map(str::to_owned);
        self.touch();
    }

    pub fn set_updated(&mut self, updated: Option<i64>) {
        self.updated = updated;
        self.touch();
    }

    pub fn set_published(&mut self, published: Option<i64>) {
        self.published = published;
        self.touch();
    }

    /// Records the tag the server returned for this version of the entry.
    pub fn set_etag(&mut self, etag: Option<&str>) {
        self.etag = etag.map(str::to_owned);
        self.base.invalidate();
    }

    /// Adds `category` unless one with the same term exists. A kind
    /// category replaces the entry's current one with that term.
    pub fn add_category(&mut self, category: Category) -> bool {
        let added = self.push_category(category);
        if added {
            self.touch();
        }
        added
    }

    pub fn add_link(&mut self, link: Link) -> bool {
        let added = add_unique(&mut self.links, link);
        if added {
            self.touch();
        }
        added
    }

    pub fn remove_link(&mut self, link: &Link) -> bool {
        let before = self.links.len();
        self.links.retain(|existing| existing != link);
        let removed = self.links.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn add_author(&mut self, author: Author) -> bool {
        let added = add_unique(&mut self.authors, author);
        if added {
            self.touch();
        }
        added
    }

    fn push_category(&mut self, category: Category) -> bool {
        if category.is_kind() {
            self.categories
                .retain(|existing| !(existing.is_kind() && existing.term() == category.term()));
        }
        add_unique(&mut self.categories, category)
    }

    fn kind_term(&self) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.is_kind())
            .map(Category::term)
    }
}

impl ParsableKind for Entry {
    const KIND: KindInfo = KindInfo::atom("entry");
}

impl Parsable for Entry {
    fn kind_info(&self) -> &'static KindInfo {
        &Self::KIND
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
        // Batch elements stay in the extension slot; see `batch_status`.
        if !child.in_namespace(ATOM_NS) {
            return Ok(Claim::Unhandled);
        }

        let once = ParserOptions::NO_DUPES;
        match child.name.as_str() {
            "title" => parser::string_from_element(
                child,
                ctx,
                ParserOptions::DEFAULT | once,
                &mut self.title,
            ),
            "id" => parser::string_from_element(
                child,
                ctx,
                ParserOptions::REQUIRED | ParserOptions::NON_EMPTY | once,
                &mut self.id,
            ),
            "summary" => parser::string_from_element(child, ctx, once, &mut self.summary),
            "rights" => parser::string_from_element(child, ctx, once, &mut self.rights),
            "updated" => parser::time_from_element(child, ctx, once, &mut self.updated),
            "published" => parser::time_from_element(child, ctx, once, &mut self.published),
            "content" => {
                self.content = Some(Content::from_element(child));
                Ok(Claim::Handled)
            }
            "category" => {
                self.push_category(parse_element(child, ctx.options)?);
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

    fn pre_get_xml(&self, out: &mut XmlWriter) {
        out.optional_attribute("gd:etag", self.etag.as_deref());
    }

    fn get_xml(&self, out: &mut XmlWriter) {
        out.text_element(
            "title",
            &[("type", "text")],
            self.title.as_deref().unwrap_or_default(),
        );
        out.optional_text_element("id", self.id.as_deref());
        out.optional_text_element("updated", self.updated.and_then(format_iso8601).as_deref());
        out.optional_text_element(
            "published",
            self.published.and_then(format_iso8601).as_deref(),
        );
        if let Some(summary) = &self.summary {
            out.text_element("summary", &[("type", "text")], summary);
        }
        out.optional_text_element("rights", self.rights.as_deref());
        if let Some(content) = &self.content {
            content.write(out);
        }

        out.children(&self.categories);
        out.children(&self.links);
        out.children(&self.authors);
    }

    fn get_namespaces(&self, namespaces: &mut Namespaces) {
        if self.etag.is_some() {
            namespaces.insert("gd", GD_NS);
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
    }

    fn parse_json(&mut self, member: &str, value: &Value) -> ParseResult<Claim> {
        let once = ParserOptions::NO_DUPES;
        match member {
            "title" => parser::string_from_json_member(
                member,
                value,
                ParserOptions::DEFAULT | once,
                &mut self.title,
            ),
            "id" => parser::string_from_json_member(
                member,
                value,
                ParserOptions::NON_EMPTY | once,
                &mut self.id,
            ),
            "description" => {
                parser::string_from_json_member(member, value, ParserOptions::NONE, &mut self.summary)
            }
            "updated" => parser::time_from_json_member(
                member,
                value,
                ParserOptions::REQUIRED | once,
                &mut self.updated,
            ),
            "etag" => parser::string_from_json_member(
                member,
                value,
                ParserOptions::NON_EMPTY | once,
                &mut self.etag,
            ),
            "selfLink" => {
                let uri = non_empty_string(member, value)?;
                add_unique(&mut self.links, Link::new(uri, Some(REL_SELF)));
                Ok(Claim::Handled)
            }
            "kind" => {
                let term = non_empty_string(member, value)?;
                debug!(kind = term, "entry kind from JSON");
                self.push_category(Category::new(term).with_scheme(KIND_SCHEME));
                Ok(Claim::Handled)
            }
            _ => Ok(Claim::Unhandled),
        }
    }

    fn get_json(&self, out: &mut Map<String, Value>) {
        out.insert(
            "title".to_owned(),
            Value::from(self.title.as_deref().unwrap_or_default()),
        );
        if let Some(id) = &self.id {
            out.insert("id".to_owned(), Value::from(id.as_str()));
        }
        if let Some(summary) = &self.summary {
            out.insert("description".to_owned(), Value::from(summary.as_str()));
        }
        if let Some(updated) = self.updated.and_then(format_iso8601) {
            out.insert("updated".to_owned(), Value::from(updated));
        }
        if let Some(kind) = self.kind_term() {
            out.insert("kind".to_owned(), Value::from(kind));
        }
        if let Some(etag) = &self.etag {
            out.insert("etag".to_owned(), Value::from(etag.as_str()));
        }
        if let Some(link) = self.look_up_link(REL_SELF) {
            out.insert("selfLink".to_owned(), Value::from(link.uri()));
        }
    }
}

pub(crate) fn non_empty_string<'a>(member: &str, value: &'a Value) -> ParseResult<&'a str> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ParseError::MemberContentMissing {
            member: member.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_parsable::{ParseErrorKind, parse_json, parse_xml, to_json_value, to_xml};
    use serde_json::json;

    const ENTRY: &str = r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005" xmlns:batch="http://schemas.google.com/gdata/batch" gd:etag="W/&quot;abc&quot;">
  <id>http://example.com/entries/1</id>
  <title>Quarterly report</title>
  <updated>2009-04-25T15:22:47.000Z</updated>
  <published>2009-04-25T15:22:47Z</published>
  <summary>Numbers &amp; charts</summary>
  <content src="http://example.com/report.pdf" type="application/pdf"/>
  <category term="report" scheme="http://example.com/tags"/>
  <category term="report" scheme="http://example.com/tags"/>
  <link href="http://example.com/entries/1" rel="self"/>
  <link href="http://example.com/report" rel="alternate" type="text/html"/>
  <author><name>Alice</name></author>
  <batch:id>7</batch:id>
  <batch:status code="404" reason="Not Found"/>
  <gd:deleted/>
</entry>"#;

    #[test]
    fn parses_entry_fields() {
        let entry: Entry = parse_xml(ENTRY).unwrap();
        assert_eq!(entry.etag(), Some(r#"W/"abc""#));
        assert_eq!(entry.id(), Some("http://example.com/entries/1"));
        assert_eq!(entry.title(), Some("Quarterly report"));
        assert_eq!(entry.summary(), Some("Numbers & charts"));
        assert_eq!(entry.updated(), Some(1_240_672_967_000));
        assert_eq!(entry.published(), Some(1_240_672_967_000));
        assert!(entry.content().is_some_and(Content::is_uri));
        assert_eq!(entry.categories().len(), 1);
        assert_eq!(entry.links().len(), 2);
        assert_eq!(entry.authors()[0].name(), Some("Alice"));
        assert!(entry.is_inserted());

        let link = entry.look_up_link("self").unwrap();
        assert_eq!(link.uri(), "http://example.com/entries/1");

        // gd:deleted is unknown to the entry and kept verbatim.
        assert!(entry.base().extensions().find(GD_NS, "deleted").is_some());
        assert_eq!(entry.batch_id().as_deref(), Some("7"));
        assert_eq!(entry.batch_status(), Some((404, Some("Not Found"))));
    }

    #[test]
    fn serializes_in_canonical_order() {
        let entry: Entry = parse_xml(ENTRY).unwrap();
        assert_eq!(
            to_xml(&entry),
            concat!(
                r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:batch="http://schemas.google.com/gdata/batch" xmlns:gd="http://schemas.google.com/g/2005" gd:etag="W/&quot;abc&quot;">"#,
                r#"<title type="text">Quarterly report</title>"#,
                "<id>http://example.com/entries/1</id>",
                "<updated>2009-04-25T15:22:47.000Z</updated>",
                "<published>2009-04-25T15:22:47.000Z</published>",
                r#"<summary type="text">Numbers &amp; charts</summary>"#,
                r#"<content type="application/pdf" src="http://example.com/report.pdf"/>"#,
                r#"<category term="report" scheme="http://example.com/tags"/>"#,
                r#"<link href="http://example.com/entries/1" rel="http://www.iana.org/assignments/relation/self"/>"#,
                r#"<link href="http://example.com/report" rel="http://www.iana.org/assignments/relation/alternate" type="text/html"/>"#,
                "<author><name>Alice</name></author>",
                "<batch:id>7</batch:id>",
                r#"<batch:status code="404" reason="Not Found"/>"#,
                "<gd:deleted/>",
                "</entry>",
            )
        );
    }

    #[test]
    fn xml_round_trip_preserves_fields() {
        let entry: Entry = parse_xml(ENTRY).unwrap();
        let again: Entry = parse_xml(&to_xml(&entry)).unwrap();
        assert_eq!(again, entry);
        assert_eq!(to_xml(&again), to_xml(&entry));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let err = parse_xml::<Entry>(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>1</id><id>2</id></entry>"#,
        )
        .unwrap_err();
        assert_eq!(err, ParseError::duplicate_element("id", "entry"));

        let err = parse_xml::<Entry>(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><updated>soon</updated></entry>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::MalformedProperty);
    }

    #[test]
    fn setters_drop_the_etag_and_cache() {
        let mut entry: Entry = parse_xml(ENTRY).unwrap();
        let before = to_xml(&entry);

        entry.set_title(Some("Annual report"));
        assert_eq!(entry.etag(), None);
        let after = to_xml(&entry);
        assert_ne!(before, after);
        assert!(after.contains("<title type=\"text\">Annual report</title>"));
        assert!(!after.contains("gd:etag"));
    }

    #[test]
    fn built_entry_snapshot() {
        let mut entry = Entry::new(Some("urn:note:1"));
        entry.set_title(Some("Groceries"));
        entry.set_content(Some(Content::text("milk <2L>")));
        entry.add_author(Author::new("Alice"));
        insta::assert_snapshot!(
            to_xml(&entry),
            @r#"<entry xmlns="http://www.w3.org/2005/Atom"><title type="text">Groceries</title><id>urn:note:1</id><content type="text">milk &lt;2L&gt;</content><author><name>Alice</name></author></entry>"#
        );
    }

    #[test]
    fn adders_skip_duplicates() {
        let mut entry = Entry::new(None);
        assert!(!entry.is_inserted());
        assert!(entry.add_author(Author::new("Alice")));
        assert!(!entry.add_author(Author::new("Alice").with_email("a@example.com")));
        assert!(entry.add_link(Link::new("http://x", Some("edit"))));
        assert!(!entry.add_link(Link::new("http://x", Some(crate::atom::link::REL_EDIT))));
        assert!(entry.add_category(Category::new("misc")));
        assert!(!entry.add_category(Category::new("misc")));
        assert_eq!(entry.authors().len(), 1);
        assert_eq!(entry.links().len(), 1);

        let edit = entry.links()[0].clone();
        assert!(entry.remove_link(&edit));
        assert!(entry.look_up_link("edit").is_none());
    }

    #[test]
    fn kind_category_is_replaced() {
        let mut entry = Entry::new(None);
        entry.add_category(Category::new("calendar#event").with_scheme(KIND_SCHEME));
        entry.add_category(
            Category::new("calendar#event")
                .with_scheme(KIND_SCHEME)
                .with_label("event"),
        );
        assert_eq!(entry.categories().len(), 1);
        assert_eq!(entry.categories()[0].label(), Some("event"));
    }

    #[test]
    fn json_members_map_to_fields() {
        let entry: Entry = parse_json(
            r#"{"kind":"tasks#task","id":"t1","title":"Buy milk","description":"2 litres",
                "updated":"2009-04-25T15:22:47.000Z","etag":"\"e1\"",
                "selfLink":"https://example.com/tasks/t1","status":"needsAction"}"#,
        )
        .unwrap();
        assert_eq!(entry.id(), Some("t1"));
        assert_eq!(entry.summary(), Some("2 litres"));
        assert_eq!(entry.updated(), Some(1_240_672_967_000));
        assert_eq!(entry.categories()[0].term(), "tasks#task");
        assert_eq!(entry.look_up_link("self").unwrap().uri(), "https://example.com/tasks/t1");

        assert_eq!(
            to_json_value(&entry),
            json!({
                "title": "Buy milk",
                "id": "t1",
                "description": "2 litres",
                "updated": "2009-04-25T15:22:47.000Z",
                "kind": "tasks#task",
                "etag": "\"e1\"",
                "selfLink": "https://example.com/tasks/t1",
                "status": "needsAction",
            })
        );
    }

    #[test]
    fn empty_self_link_is_rejected() {
        let err = parse_json::<Entry>(r#"{"selfLink":""}"#).unwrap_err();
        assert_eq!(
            err,
            ParseError::MemberContentMissing {
                member: "selfLink".to_owned()
            }
        );
    }
}
