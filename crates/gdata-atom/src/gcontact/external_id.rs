//! `<gContact:externalId>`: an identifier of a contact in an external
//! system, typed either by a relation or by a free-form label.

use gdata_parsable::{
    KindInfo, ParseContext, ParseError, ParseResult, Parsable, ParsableBase, ParsableKind,
    XmlElement, XmlWriter,
};

use crate::GCONTACT_NS;

pub const REL_ACCOUNT: &str = "account";
pub const REL_CUSTOMER: &str = "customer";
pub const REL_NETWORK: &str = "network";
pub const REL_ORGANIZATION: &str = "organization";

/// Exactly one of `relation_type` and `label` is set on a valid ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalId {
    base: ParsableBase,
    value: String,
    relation_type: Option<String>,
    label: Option<String>,
}

impl ExternalId {
    pub fn with_relation(value: impl Into<String>, relation_type: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            relation_type: Some(relation_type.into()),
            ..Self::default()
        }
    }

    pub fn with_label(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn relation_type(&self) -> Option<&str> {
        self.relation_type.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.base.invalidate();
    }

    /// Sets the relation type and clears the label.
    pub fn set_relation_type(&mut self, relation_type: impl Into<String>) {
        self.relation_type = Some(relation_type.into());
        self.label = None;
        self.base.invalidate();
    }

    /// Sets the label and clears the relation type.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
        self.relation_type = None;
        self.base.invalidate();
    }

    pub fn equals(&self, other: &Self) -> bool {
        self.value == other.value
            && self.relation_type == other.relation_type
            && self.label == other.label
    }
}

impl ParsableKind for ExternalId {
    const KIND: KindInfo = KindInfo::namespaced("gContact", GCONTACT_NS, "externalId");
}

impl Parsable for ExternalId {
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
        let element = root.qualified_name();
        let value = root
            .attribute("value")
            .ok_or_else(|| ParseError::required_property("value", element.as_str()))?;

        let rel = root.attribute("rel");
        let label = root.attribute("label");
        let blank = |attr: Option<&str>| attr.is_none_or(str::is_empty);
        if blank(rel) && blank(label) {
            return Err(ParseError::required_property("rel", element));
        }
        if rel.is_some() && label.is_some() {
            return Err(ParseError::mutexed_properties("rel", "label", element));
        }

        self.value = value.to_owned();
        self.relation_type = rel.map(str::to_owned);
        self.label = label.map(str::to_owned);
        Ok(())
    }

    fn pre_get_xml(&self, out: &mut XmlWriter) {
        out.attribute("value", &self.value);
        match (&self.relation_type, &self.label) {
            (Some(rel), _) => out.attribute("rel", rel),
            (None, Some(label)) => out.attribute("label", label),
            (None, None) => {}
        }
    }
}
