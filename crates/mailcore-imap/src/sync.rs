//! Folder-list and UID-cache reconciliation (spec §4.3.7/§4.3.8).
//!
//! Both algorithms are pure functions over parsed server state and a
//! caller-owned local cache: this module issues no commands of its own.
//! The shape mirrors `imap_get_msg_list_full()` and the `LIST`-response
//! walk in the original's `libsylph/imap.c` (UIDVALIDITY-gated cache
//! invalidation, per-UID flag diffing, `\Noinferiors` propagation), with
//! the `GSList`/hash-table bookkeeping replaced by plain `Vec`s.

use std::collections::HashMap;

use crate::types::{Flags, Uid, UidValidity};

/// One decoded `LIST` entry (spec §4.3.7 steps 1-4): Unicode path with
/// `/` as the separator, selectability resolved per the `INBOX` exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedListEntry {
    /// Slash-separated path, decoded from modified UTF-7.
    pub path: String,
    /// `\Noinferiors`: this mailbox cannot have children.
    pub no_inferiors: bool,
    /// `\Noselect`: this mailbox cannot be the target of SELECT/EXAMINE.
    /// Always `false` for `INBOX`, regardless of the server's flags.
    pub no_select: bool,
}

/// Decodes raw `LIST` responses into [`DecodedListEntry`] values,
/// implementing spec §4.3.7 steps 2-4.
///
/// `separator` is the hierarchy delimiter the server reported (from the
/// same `LIST` response, or a prior `NAMESPACE`); it is substituted for
/// `/` in decoded names. Entries whose leaf component starts with `.`
/// are dropped, matching the original's dotfile-folder convention.
///
/// A mailbox name that is not valid modified UTF-7 is passed through
/// unchanged (with a warning logged by the codec) rather than failing the
/// whole listing — see `mailcore_codec::mutf7::decode`.
#[must_use]
pub fn decode_list_responses(
    responses: &[crate::types::ListResponse],
    separator: Option<char>,
) -> Vec<DecodedListEntry> {
    let mut out = Vec::with_capacity(responses.len());

    for resp in responses {
        let decoded = mailcore_codec::mutf7::decode(resp.mailbox.as_str());
        let path = match separator {
            Some(sep) if sep != '/' => substitute_separator(&decoded, sep),
            _ => decoded,
        };

        let leaf = path.rsplit('/').next().unwrap_or(&path);
        if leaf.starts_with('.') {
            continue;
        }

        let is_inbox = path.eq_ignore_ascii_case("INBOX");
        let no_inferiors = resp
            .attributes
            .contains(&crate::types::MailboxAttribute::NoInferiors);
        let no_select = !is_inbox
            && resp
                .attributes
                .contains(&crate::types::MailboxAttribute::NoSelect);

        out.push(DecodedListEntry {
            path,
            no_inferiors,
            no_select,
        });
    }

    out
}

/// Substitutes `sep` (the server's hierarchy delimiter) with `/`,
/// leaving `/` that appears literally in the decoded Unicode text alone
/// — there is nothing left to confuse it with once decoding has already
/// happened, since the modified UTF-7 escaping is already resolved.
fn substitute_separator(decoded: &str, sep: char) -> String {
    decoded.replace(sep, "/")
}

/// Synthesises intermediate parent entries that are implied by returned
/// names but were not themselves present in the `LIST` response (spec
/// §4.3.7 step 5). Synthesised parents are always `\Noselect`.
pub fn synthesize_intermediate_parents(entries: &mut Vec<DecodedListEntry>) {
    let existing: std::collections::HashSet<String> =
        entries.iter().map(|e| e.path.clone()).collect();
    let mut synthesized: Vec<DecodedListEntry> = Vec::new();
    let mut seen_synthesized = std::collections::HashSet::new();

    for entry in entries.iter() {
        let mut segments: Vec<&str> = entry.path.split('/').collect();
        segments.pop();
        while !segments.is_empty() {
            let parent = segments.join("/");
            segments.pop();
            if parent.is_empty() || existing.contains(&parent) || seen_synthesized.contains(&parent)
            {
                continue;
            }
            seen_synthesized.insert(parent.clone());
            synthesized.push(DecodedListEntry {
                path: parent,
                no_inferiors: false,
                no_select: true,
            });
        }
    }

    entries.extend(synthesized);
}

/// A node in the locally cached folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// Slash-separated path, matching [`DecodedListEntry::path`].
    pub path: String,
    /// Mirrors [`DecodedListEntry::no_inferiors`].
    pub no_inferiors: bool,
    /// Mirrors [`DecodedListEntry::no_select`].
    pub no_select: bool,
    /// A node the server never reported, e.g. a GUI-only virtual
    /// mailbox (All Mail, a saved search). Never removed by
    /// reconciliation even if the server stops listing its path.
    pub is_virtual: bool,
    /// Child nodes, keyed by their own `path`.
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    /// Creates a new non-virtual, selectable leaf node.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            no_inferiors: false,
            no_select: false,
            is_virtual: false,
            children: Vec::new(),
        }
    }
}

/// Reconciles a local folder tree against a fresh (already decoded and
/// parent-synthesised) set of server entries, per spec §4.3.7's
/// reconciliation paragraph:
///
/// - A local child matching a server path by name adopts the server's
///   `no_inferiors`/`no_select` bits.
/// - A local child the server no longer reports is removed, unless it
///   is a virtual node.
/// - Server entries with no local match are appended as new nodes.
/// - A node that gained `\Noinferiors` has its children dropped.
pub fn reconcile_folder_tree(local: &mut Vec<FolderNode>, server_entries: &[DecodedListEntry]) {
    let by_path: HashMap<&str, &DecodedListEntry> =
        server_entries.iter().map(|e| (e.path.as_str(), e)).collect();

    local.retain_mut(|node| {
        let Some(entry) = by_path.get(node.path.as_str()) else {
            return node.is_virtual;
        };
        node.no_inferiors = entry.no_inferiors;
        node.no_select = entry.no_select;
        if node.no_inferiors {
            node.children.clear();
        }
        true
    });

    let existing: std::collections::HashSet<String> =
        local.iter().map(|n| n.path.clone()).collect();
    for entry in server_entries {
        if existing.contains(&entry.path) {
            continue;
        }
        local.push(FolderNode {
            path: entry.path.clone(),
            no_inferiors: entry.no_inferiors,
            no_select: entry.no_select,
            is_virtual: false,
            children: Vec::new(),
        });
    }
}

/// One message's UID and current flags, as held in the local cache or
/// just fetched from the server (spec §4.3.8's `{uid -> IMAPFlags}` map).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    /// The message's UID.
    pub uid: Uid,
    /// Its permanent flags, including any `$labelN` color-label keyword.
    pub flags: Flags,
}

/// The outcome of reconciling a local UID-keyed cache against a fresh
/// `{uid -> IMAPFlags}` map from the server (spec §4.3.8).
#[derive(Debug, Clone, Default)]
pub struct CacheReconciliation {
    /// `true` if UIDVALIDITY changed and the entire cache was discarded
    /// rather than incrementally reconciled.
    pub discarded: bool,
    /// UIDs present locally but no longer on the server; already
    /// removed from [`reconcile_uid_cache`]'s returned message list.
    pub removed: Vec<Uid>,
    /// UIDs whose flags (including color label) changed and were
    /// updated in place.
    pub updated: Vec<Uid>,
    /// `[begin, last_uid]`: the UID range to fetch fresh envelopes for.
    /// `None` when every server UID is already cached and unchanged.
    pub fetch_range: Option<(Uid, Uid)>,
}

/// Reconciles `local_cache` against `server_flags` (the just-fetched
/// `UID FETCH 1:* (UID FLAGS)` map) for a folder whose SELECT returned
/// `server_uid_validity`.
///
/// Returns the reconciliation summary and the surviving, flag-updated
/// cache (UIDs outside `[first_uid, last_uid]` already pruned, per step
/// 3). When `discarded` is `true` the returned cache is always empty —
/// the caller re-fetches every envelope in `fetch_range` from scratch.
#[must_use]
pub fn reconcile_uid_cache(
    local_uid_validity: Option<UidValidity>,
    server_uid_validity: UidValidity,
    local_cache: &[CachedMessage],
    server_flags: &[(Uid, Flags)],
) -> (CacheReconciliation, Vec<CachedMessage>) {
    if local_uid_validity != Some(server_uid_validity) {
        let last_uid = server_flags.iter().map(|(uid, _)| *uid).max();
        let fetch_range = last_uid.and_then(|last| {
            server_flags
                .iter()
                .map(|(uid, _)| *uid)
                .min()
                .map(|first| (first, last))
        });
        return (
            CacheReconciliation {
                discarded: true,
                removed: Vec::new(),
                updated: Vec::new(),
                fetch_range,
            },
            Vec::new(),
        );
    }

    let server_map: HashMap<Uid, &Flags> = server_flags.iter().map(|(u, f)| (*u, f)).collect();
    let mut result = CacheReconciliation::default();
    let mut survivors: Vec<CachedMessage> = Vec::with_capacity(local_cache.len());

    for cached in local_cache {
        match server_map.get(&cached.uid) {
            None => {
                result.removed.push(cached.uid);
            }
            Some(server_flags) => {
                let mut flags = cached.flags.clone();
                if flags_differ(&flags, server_flags) {
                    sync_flags(&mut flags, server_flags);
                    result.updated.push(cached.uid);
                }
                survivors.push(CachedMessage {
                    uid: cached.uid,
                    flags,
                });
            }
        }
    }

    let last_uid = server_flags.iter().map(|(uid, _)| *uid).max();
    let cached_uids: std::collections::HashSet<Uid> =
        survivors.iter().map(|m| m.uid).collect();
    let mut sorted_server_uids: Vec<Uid> = server_flags.iter().map(|(u, _)| *u).collect();
    sorted_server_uids.sort_unstable();
    let begin = sorted_server_uids
        .into_iter()
        .find(|uid| !cached_uids.contains(uid));

    result.fetch_range = match (begin, last_uid) {
        (Some(begin), Some(last)) if begin <= last => Some((begin, last)),
        _ => None,
    };

    let first_uid = survivors.iter().map(|m| m.uid).min().or(begin);
    if let (Some(first_uid), Some(last_uid)) = (first_uid, last_uid) {
        survivors.retain(|m| m.uid >= first_uid && m.uid <= last_uid);
    }

    (result, survivors)
}

fn flags_differ(local: &Flags, server: &Flags) -> bool {
    local.is_seen() != server.is_seen()
        || local.is_flagged() != server.is_flagged()
        || local.is_answered() != server.is_answered()
        || local.color_label() != server.color_label()
}

fn sync_flags(local: &mut Flags, server: &Flags) {
    use crate::types::Flag;

    for (flag, present) in [
        (Flag::Seen, server.is_seen()),
        (Flag::Flagged, server.is_flagged()),
        (Flag::Answered, server.is_answered()),
    ] {
        if present {
            local.insert(flag);
        } else {
            local.remove(&flag);
        }
    }
    local.set_color_label(server.color_label());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flag, ListResponse, Mailbox, MailboxAttribute};

    fn list(mailbox: &str, attrs: Vec<MailboxAttribute>) -> ListResponse {
        ListResponse {
            attributes: attrs,
            delimiter: Some('.'),
            mailbox: Mailbox::new(mailbox),
        }
    }

    mod list_decode {
        use super::*;

        #[test]
        fn decodes_name_and_substitutes_separator() {
            let responses = vec![list("INBOX.Archive", vec![])];
            let decoded = decode_list_responses(&responses, Some('.'));
            assert_eq!(decoded.len(), 1);
            assert_eq!(decoded[0].path, "INBOX/Archive");
        }

        #[test]
        fn skips_dotfile_leaves() {
            let responses = vec![list("INBOX.Archive..state", vec![])];
            let decoded = decode_list_responses(&responses, Some('.'));
            assert!(decoded.is_empty());
        }

        #[test]
        fn noselect_marks_unselectable() {
            let responses = vec![list("INBOX.Drafts", vec![MailboxAttribute::NoSelect])];
            let decoded = decode_list_responses(&responses, Some('.'));
            assert!(decoded[0].no_select);
        }

        #[test]
        fn inbox_is_always_selectable() {
            let responses = vec![list("INBOX", vec![MailboxAttribute::NoSelect])];
            let decoded = decode_list_responses(&responses, Some('.'));
            assert!(!decoded[0].no_select);
        }

        #[test]
        fn decodes_modified_utf7_names() {
            let encoded = mailcore_codec::mutf7::encode("INBOX.Entwürfe");
            let responses = vec![list(&encoded, vec![])];
            let decoded = decode_list_responses(&responses, Some('.'));
            assert_eq!(decoded[0].path, "INBOX/Entwürfe");
        }

        #[test]
        fn synthesizes_missing_intermediate_parents() {
            let mut entries = vec![DecodedListEntry {
                path: "INBOX/A/B/C".to_string(),
                no_inferiors: false,
                no_select: false,
            }];
            synthesize_intermediate_parents(&mut entries);
            let paths: std::collections::HashSet<_> =
                entries.iter().map(|e| e.path.as_str()).collect();
            assert!(paths.contains("INBOX/A"));
            assert!(paths.contains("INBOX/A/B"));
            let synthesized = entries
                .iter()
                .find(|e| e.path == "INBOX/A")
                .unwrap();
            assert!(synthesized.no_select);
        }
    }

    mod tree_reconciliation {
        use super::*;

        #[test]
        fn matched_node_adopts_server_bits() {
            let mut local = vec![FolderNode::new("INBOX/Archive")];
            let server = vec![DecodedListEntry {
                path: "INBOX/Archive".to_string(),
                no_inferiors: true,
                no_select: false,
            }];
            reconcile_folder_tree(&mut local, &server);
            assert!(local[0].no_inferiors);
        }

        #[test]
        fn gaining_noinferiors_drops_children() {
            let mut parent = FolderNode::new("INBOX/Archive");
            parent.children.push(FolderNode::new("INBOX/Archive/Old"));
            let mut local = vec![parent];
            let server = vec![DecodedListEntry {
                path: "INBOX/Archive".to_string(),
                no_inferiors: true,
                no_select: false,
            }];
            reconcile_folder_tree(&mut local, &server);
            assert!(local[0].children.is_empty());
        }

        #[test]
        fn removed_from_server_is_dropped() {
            let mut local = vec![FolderNode::new("INBOX/Gone")];
            reconcile_folder_tree(&mut local, &[]);
            assert!(local.is_empty());
        }

        #[test]
        fn virtual_node_survives_even_if_unreported() {
            let mut node = FolderNode::new("All Mail");
            node.is_virtual = true;
            let mut local = vec![node];
            reconcile_folder_tree(&mut local, &[]);
            assert_eq!(local.len(), 1);
        }

        #[test]
        fn server_new_child_is_appended() {
            let mut local: Vec<FolderNode> = Vec::new();
            let server = vec![DecodedListEntry {
                path: "INBOX/New".to_string(),
                no_inferiors: false,
                no_select: false,
            }];
            reconcile_folder_tree(&mut local, &server);
            assert_eq!(local.len(), 1);
            assert_eq!(local[0].path, "INBOX/New");
        }
    }

    mod uid_cache_reconciliation {
        use super::*;

        fn uid(n: u32) -> Uid {
            Uid::new(n).unwrap()
        }

        fn uv(n: u32) -> UidValidity {
            UidValidity::new(n).unwrap()
        }

        #[test]
        fn uid_validity_mismatch_discards_everything() {
            let local_cache = vec![CachedMessage {
                uid: uid(5),
                flags: Flags::new(),
            }];
            let server_flags = vec![(uid(1), Flags::new()), (uid(2), Flags::new())];
            let (result, survivors) =
                reconcile_uid_cache(Some(uv(1)), uv(2), &local_cache, &server_flags);
            assert!(result.discarded);
            assert!(survivors.is_empty());
            assert_eq!(result.fetch_range, Some((uid(1), uid(2))));
        }

        #[test]
        fn no_local_uidvalidity_is_a_fresh_folder() {
            let server_flags = vec![(uid(1), Flags::new())];
            let (result, survivors) = reconcile_uid_cache(None, uv(1), &[], &server_flags);
            assert!(result.discarded);
            assert!(survivors.is_empty());
            assert_eq!(result.fetch_range, Some((uid(1), uid(1))));
        }

        #[test]
        fn spec_scenario_3_uid_sync() {
            // cache last-UID 100, UIDVALIDITY 42; server now reports
            // EXISTS 105 / UIDVALIDITY 42 and UIDs {1..50, 52..100,
            // 101..105} (51 was expunged server-side).
            let mut cached: Vec<CachedMessage> = (1..=50)
                .chain(52..=100)
                .map(|n| CachedMessage {
                    uid: uid(n),
                    flags: Flags::new(),
                })
                .collect();
            cached.push(CachedMessage {
                uid: uid(51),
                flags: Flags::new(),
            });
            cached.sort_by_key(|m| m.uid);

            let server_flags: Vec<(Uid, Flags)> = (1..=50)
                .chain(52..=105)
                .map(|n| (uid(n), Flags::new()))
                .collect();

            let (result, survivors) =
                reconcile_uid_cache(Some(uv(42)), uv(42), &cached, &server_flags);

            assert!(!result.discarded);
            assert_eq!(result.removed, vec![uid(51)]);
            assert_eq!(result.fetch_range, Some((uid(101), uid(105))));
            assert!(!survivors.iter().any(|m| m.uid == uid(51)));
            assert!(survivors.iter().any(|m| m.uid == uid(1)));
            assert!(survivors.iter().any(|m| m.uid == uid(100)));
        }

        #[test]
        fn changed_flags_are_synced_and_color_label_replaced() {
            let mut cached_flags = Flags::new();
            cached_flags.set_color_label(Some(2));
            let local_cache = vec![CachedMessage {
                uid: uid(1),
                flags: cached_flags,
            }];

            let mut server_side = Flags::from_vec(vec![Flag::Seen, Flag::Flagged]);
            server_side.set_color_label(Some(5));
            let server_flags = vec![(uid(1), server_side)];

            let (result, survivors) =
                reconcile_uid_cache(Some(uv(1)), uv(1), &local_cache, &server_flags);

            assert_eq!(result.updated, vec![uid(1)]);
            let updated = survivors.iter().find(|m| m.uid == uid(1)).unwrap();
            assert!(updated.flags.is_seen());
            assert!(updated.flags.is_flagged());
            assert_eq!(updated.flags.color_label(), Some(5));
        }

        #[test]
        fn unchanged_cache_reports_no_fetch_range() {
            let local_cache = vec![CachedMessage {
                uid: uid(1),
                flags: Flags::new(),
            }];
            let server_flags = vec![(uid(1), Flags::new())];
            let (result, survivors) =
                reconcile_uid_cache(Some(uv(1)), uv(1), &local_cache, &server_flags);
            assert!(result.fetch_range.is_none());
            assert_eq!(survivors.len(), 1);
        }
    }
}
