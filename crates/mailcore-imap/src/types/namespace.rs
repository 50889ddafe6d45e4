//! Namespace types (RFC 2342), spec §3.3 "Namespace".

/// One namespace entry: a mailbox-name prefix plus its hierarchy
/// separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDescriptor {
    /// Mailbox-name prefix, e.g. `""`, `"INBOX."`, `"#shared/"`.
    pub prefix: String,
    /// Hierarchy separator for mailboxes under this prefix, if any.
    pub separator: Option<char>,
}

/// The three namespace categories a server can report: personal, other
/// users', and shared. Each is a list of `(prefix, separator)` pairs;
/// RFC 2342 allows more than one entry per category even though most
/// servers report exactly one personal namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespace {
    /// The user's own mailboxes.
    pub personal: Vec<NamespaceDescriptor>,
    /// Other users' mailboxes the user can access.
    pub other_users: Vec<NamespaceDescriptor>,
    /// Shared mailboxes.
    pub shared: Vec<NamespaceDescriptor>,
}

impl Namespace {
    /// Builds a single-entry personal namespace, used as the fallback
    /// when a server has no `NAMESPACE` support: a `LIST "" ""` probe
    /// returns exactly one hierarchy delimiter for the personal
    /// namespace and nothing else (spec §4.3.3, data model §3.3).
    #[must_use]
    pub fn from_list_probe(separator: Option<char>) -> Self {
        Self {
            personal: vec![NamespaceDescriptor {
                prefix: String::new(),
                separator,
            }],
            other_users: Vec::new(),
            shared: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_probe_fallback_has_one_personal_entry() {
        let ns = Namespace::from_list_probe(Some('/'));
        assert_eq!(ns.personal.len(), 1);
        assert_eq!(ns.personal[0].prefix, "");
        assert_eq!(ns.personal[0].separator, Some('/'));
        assert!(ns.other_users.is_empty());
        assert!(ns.shared.is_empty());
    }

    #[test]
    fn default_is_empty() {
        let ns = Namespace::default();
        assert!(ns.personal.is_empty());
        assert!(ns.other_users.is_empty());
        assert!(ns.shared.is_empty());
    }
}
