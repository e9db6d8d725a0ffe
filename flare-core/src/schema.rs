//! Declarative payload schema.
//!
//! Every extendable payload variant is a `'static` [`PayloadKind`] naming its
//! parent and the reserved keys it declares itself. Inherited keys are never
//! repeated; [`crate::registry`] folds the ancestor chain.
//!
//! ```text
//! extendable
//! ├── data
//! ├── message
//! ├── request
//! │   └── http_request
//! ├── person
//! ├── server
//! └── client
//!     └── javascript_client
//! ```

use core::fmt;
use core::hash::{Hash, Hasher};

/// A reserved key and the schema field slot it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDecl {
    /// Wire name; custom data may never use it
    pub key: &'static str,
    /// Name of the schema slot the key writes to
    pub field: &'static str,
}

impl FieldDecl {
    pub const fn new(key: &'static str, field: &'static str) -> Self {
        Self { key, field }
    }

    /// A declaration whose wire key and field slot share a name.
    pub const fn same(name: &'static str) -> Self {
        Self {
            key: name,
            field: name,
        }
    }
}

/// One variant in the single-rooted hierarchy of extendable payloads.
pub struct PayloadKind {
    /// Unique kind name
    pub name: &'static str,
    /// Parent kind; `None` only for [`EXTENDABLE`]
    pub parent: Option<&'static PayloadKind>,
    /// Keys declared at this level only
    pub fields: &'static [FieldDecl],
}

impl PayloadKind {
    /// Whether this is the hierarchy root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Number of levels between this kind and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent;
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent;
        }
        depth
    }

    /// This kind followed by each ancestor, ending with the root.
    pub fn lineage(&'static self) -> Lineage {
        Lineage { next: Some(self) }
    }

    /// Whether `ancestor` is this kind or one of its ancestors.
    pub fn descends_from(&'static self, ancestor: &PayloadKind) -> bool {
        self.lineage().any(|kind| kind == ancestor)
    }
}

impl fmt::Debug for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadKind")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Kind names are unique across the hierarchy, so identity is the name.
impl PartialEq for PayloadKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PayloadKind {}

impl Hash for PayloadKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Iterator over a kind and its ancestors.
pub struct Lineage {
    next: Option<&'static PayloadKind>,
}

impl Iterator for Lineage {
    type Item = &'static PayloadKind;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

/// Root of every extendable payload; reserves nothing itself.
pub static EXTENDABLE: PayloadKind = PayloadKind {
    name: "extendable",
    parent: None,
    fields: &[],
};

/// The `data` body of an envelope: everything known about one event.
pub static DATA: PayloadKind = PayloadKind {
    name: "data",
    parent: Some(&EXTENDABLE),
    fields: &[
        FieldDecl::same("environment"),
        FieldDecl::same("body"),
        FieldDecl::same("level"),
        FieldDecl::same("timestamp"),
        FieldDecl::same("code_version"),
        FieldDecl::same("platform"),
        FieldDecl::same("language"),
        FieldDecl::same("framework"),
        FieldDecl::same("context"),
        FieldDecl::same("request"),
        FieldDecl::same("person"),
        FieldDecl::same("server"),
        FieldDecl::same("client"),
        FieldDecl::same("custom"),
        FieldDecl::same("fingerprint"),
        FieldDecl::same("title"),
        FieldDecl::same("uuid"),
        FieldDecl::same("notifier"),
    ],
};

/// A plain log message body.
pub static MESSAGE: PayloadKind = PayloadKind {
    name: "message",
    parent: Some(&EXTENDABLE),
    fields: &[FieldDecl::same("body")],
};

/// Request detail attached to a data payload.
pub static REQUEST: PayloadKind = PayloadKind {
    name: "request",
    parent: Some(&EXTENDABLE),
    fields: &[
        FieldDecl::same("url"),
        FieldDecl::same("method"),
        FieldDecl::same("headers"),
        FieldDecl::same("params"),
        FieldDecl::new("GET", "get_params"),
        FieldDecl::same("query_string"),
        FieldDecl::new("POST", "post_params"),
        FieldDecl::new("body", "post_body"),
        FieldDecl::same("user_ip"),
    ],
};

/// A request captured while serving HTTP, with per-request attributes.
pub static HTTP_REQUEST: PayloadKind = PayloadKind {
    name: "http_request",
    parent: Some(&REQUEST),
    fields: &[
        FieldDecl::same("request_id"),
        FieldDecl::same("status_code"),
        FieldDecl::same("scheme"),
        FieldDecl::same("protocol"),
        FieldDecl::same("timestamp"),
    ],
};

/// The affected user.
pub static PERSON: PayloadKind = PayloadKind {
    name: "person",
    parent: Some(&EXTENDABLE),
    fields: &[
        FieldDecl::same("id"),
        FieldDecl::same("username"),
        FieldDecl::same("email"),
    ],
};

/// The reporting host.
pub static SERVER: PayloadKind = PayloadKind {
    name: "server",
    parent: Some(&EXTENDABLE),
    fields: &[
        FieldDecl::same("host"),
        FieldDecl::same("root"),
        FieldDecl::same("branch"),
        FieldDecl::same("code_version"),
    ],
};

/// The client process.
pub static CLIENT: PayloadKind = PayloadKind {
    name: "client",
    parent: Some(&EXTENDABLE),
    fields: &[FieldDecl::same("cpu")],
};

/// A browser client running JavaScript.
pub static JAVASCRIPT_CLIENT: PayloadKind = PayloadKind {
    name: "javascript_client",
    parent: Some(&CLIENT),
    fields: &[
        FieldDecl::same("browser"),
        FieldDecl::same("code_version"),
        FieldDecl::same("source_map_enabled"),
        FieldDecl::same("guess_uncaught_frames"),
    ],
};

/// Every built-in kind, root first.
pub static BUILTIN_KINDS: [&PayloadKind; 9] = [
    &EXTENDABLE,
    &DATA,
    &MESSAGE,
    &REQUEST,
    &HTTP_REQUEST,
    &PERSON,
    &SERVER,
    &CLIENT,
    &JAVASCRIPT_CLIENT,
];

/// Look up a built-in kind by name.
pub fn builtin(name: &str) -> Option<&'static PayloadKind> {
    BUILTIN_KINDS.iter().copied().find(|kind| kind.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_kinds_share_one_root() {
        for kind in BUILTIN_KINDS {
            let root = kind.lineage().last().unwrap();
            assert_eq!(root, &EXTENDABLE);
        }
    }

    #[test]
    fn depth_counts_levels_below_root() {
        assert_eq!(EXTENDABLE.depth(), 0);
        assert_eq!(DATA.depth(), 1);
        assert_eq!(HTTP_REQUEST.depth(), 2);
    }

    #[test]
    fn lineage_walks_up_to_root() {
        let names: Vec<_> = JAVASCRIPT_CLIENT.lineage().map(|k| k.name).collect();
        assert_eq!(names, ["javascript_client", "client", "extendable"]);
        assert!(HTTP_REQUEST.descends_from(&REQUEST));
        assert!(!HTTP_REQUEST.descends_from(&CLIENT));
    }

    #[test]
    fn kind_names_are_unique() {
        for (i, a) in BUILTIN_KINDS.iter().enumerate() {
            for b in &BUILTIN_KINDS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
        assert_eq!(builtin("person"), Some(&PERSON));
        assert!(builtin("nope").is_none());
    }
}
