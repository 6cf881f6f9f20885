//! Selectors and the rendered-table contract.
//!
//! A [`Selector`] describes *what* to find; drivers turn it into a CSS or
//! XPath [`Query`] plus an optional exact-text filter. The [`TableContract`]
//! holds the attribute names and control identities a rendered table must
//! expose, and builds every selector the engine uses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "div.ms-DetailsRow")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Element id
    Id(String),
    /// Any element whose own text equals the given string
    Text(String),
    /// CSS selector filtered to elements whose trimmed text equals `text`
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// Elements of `tag` carrying `name='value'`
    Attribute {
        /// Tag name
        tag: String,
        /// Attribute name
        name: String,
        /// Attribute value
        value: String,
    },
    /// Parent of the first `tag` element whose text contains `text`
    ParentOfText {
        /// Tag of the element holding the text
        tag: String,
        /// Text to look for
        text: String,
    },
    /// `tag` descendants of another selector
    Within {
        /// Enclosing selector
        scope: Box<Selector>,
        /// Descendant tag name
        tag: String,
    },
}

/// Query language a selector resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// CSS query
    Css(String),
    /// XPath query
    XPath(String),
}

impl Query {
    /// Query string regardless of language
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create an exact-text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an attribute selector
    #[must_use]
    pub fn attribute(
        tag: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Attribute {
            tag: tag.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Narrow this selector to elements with the given text
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Css(css) => Self::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        }
    }

    /// Select `tag` descendants of this selector
    #[must_use]
    pub fn descendant(self, tag: impl Into<String>) -> Self {
        Self::Within {
            scope: Box::new(self),
            tag: tag.into(),
        }
    }

    /// Resolve to a CSS or XPath query
    #[must_use]
    pub fn query(&self) -> Query {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => Query::Css(css.clone()),
            Self::XPath(xpath) => Query::XPath(xpath.clone()),
            Self::Id(id) => Query::Css(format!("#{id}")),
            Self::Text(text) => Query::XPath(format!("//*[text()={}]", xpath_literal(text))),
            Self::Attribute { tag, name, value } => {
                Query::Css(format!("{tag}[{name}='{}']", css_escape(value)))
            }
            Self::ParentOfText { tag, text } => Query::XPath(format!(
                "//{tag}[contains(text(), {})]/..",
                xpath_literal(text)
            )),
            Self::Within { scope, tag } => match scope.query() {
                Query::Css(css) => Query::Css(format!("{css} {tag}")),
                Query::XPath(xpath) => Query::XPath(format!("{xpath}//{tag}")),
            },
        }
    }

    /// Exact text an element must carry after the query matched
    #[must_use]
    pub fn text_filter(&self) -> Option<&str> {
        match self {
            Self::CssWithText { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text_filter() {
            Some(text) => write!(f, "{} (text = {text:?})", self.query().as_str()),
            None => f.write_str(self.query().as_str()),
        }
    }
}

/// Quote a string as an XPath literal.
///
/// XPath 1.0 has no escape sequences, so values holding both quote kinds are
/// spliced together with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Attribute names and control identities a rendered table exposes.
///
/// Defaults match a Fluent UI `DetailsList` with a page-size `Dropdown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableContract {
    /// Tag of data cells and headers
    pub cell_tag: String,
    /// Attribute on each data cell whose value is the column key
    pub cell_attribute: String,
    /// Attribute on each column header whose value is the column key
    pub header_attribute: String,
    /// Sort-state attribute on column headers
    pub sort_attribute: String,
    /// Element id of the page-size control
    pub page_size_id: String,
    /// CSS selector of the page-size options once the control is open
    pub page_size_option: String,
    /// Tag of the anchor inside link-bearing rows
    pub link_tag: String,
}

impl Default for TableContract {
    fn default() -> Self {
        Self {
            cell_tag: "div".to_string(),
            cell_attribute: "data-automation-key".to_string(),
            header_attribute: "data-item-key".to_string(),
            sort_attribute: "aria-sort".to_string(),
            page_size_id: "pageSize".to_string(),
            page_size_option: ".ms-Dropdown-item".to_string(),
            link_tag: "a".to_string(),
        }
    }
}

impl TableContract {
    /// Create the default contract
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All data cells of a column, in rendered order
    #[must_use]
    pub fn cells(&self, column_key: &str) -> Selector {
        Selector::attribute(&self.cell_tag, &self.cell_attribute, column_key)
    }

    /// Header of a column
    #[must_use]
    pub fn header(&self, column_key: &str) -> Selector {
        Selector::attribute(&self.cell_tag, &self.header_attribute, column_key)
    }

    /// Any element showing exactly this header text
    #[must_use]
    pub fn header_text(&self, column_name: &str) -> Selector {
        Selector::text(column_name)
    }

    /// The page-size control
    #[must_use]
    pub fn page_size_control(&self) -> Selector {
        Selector::id(&self.page_size_id)
    }

    /// Every page-size option of the open control
    #[must_use]
    pub fn page_size_options(&self) -> Selector {
        Selector::css(&self.page_size_option)
    }

    /// The page-size option labelled with `size`
    #[must_use]
    pub fn page_size_option(&self, size: usize) -> Selector {
        self.page_size_options().with_text(size.to_string())
    }

    /// The row holding a cell whose text contains `value`
    #[must_use]
    pub fn row_containing(&self, value: &str) -> Selector {
        Selector::ParentOfText {
            tag: self.cell_tag.clone(),
            text: value.to_string(),
        }
    }

    /// The anchor inside the row holding `value`
    #[must_use]
    pub fn row_link(&self, value: &str) -> Selector {
        self.row_containing(value).descendant(&self.link_tag)
    }
}
