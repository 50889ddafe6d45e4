//! Compact IMAP sequence-set string builder with a length cap (spec
//! §4.3.12), used to batch large UID lists into commands that stay under
//! a server's or proxy's maximum command-line length.

/// Hard cap on the length of a single produced sequence-set string
/// (spec §4.3.12: "below 1000 characters").
pub const MAX_SEQUENCE_SET_LEN: usize = 1000;

/// Per-command UID count cap used for `COPY` (spec §4.3.12).
pub const COPY_UID_COUNT_CAP: usize = 200;

/// Builds one or more IMAP sequence-set strings covering every UID in
/// `uids`, encoding consecutive runs as `start:end` and keeping each
/// returned string no longer than `max_len` characters. `uids` does not
/// need to be sorted; the builder sorts and deduplicates it first.
///
/// When `max_count` is `Some(cap)`, no returned piece covers more than
/// `cap` UIDs even if they form one consecutive run — `COPY` uses this
/// to bound a single command to [`COPY_UID_COUNT_CAP`] UIDs regardless
/// of how compactly they would otherwise encode.
///
/// An empty `uids` slice yields an empty `Vec`. `max_len` is clamped to
/// at least the width of the widest single number plus one, so a single
/// UID is never split across strings.
#[must_use]
pub fn build_sequence_set(uids: &[u32], max_len: usize, max_count: Option<usize>) -> Vec<String> {
    if uids.is_empty() {
        return Vec::new();
    }

    let mut sorted = uids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let runs = compact_runs(&sorted);
    let runs = match max_count {
        Some(cap) => split_runs_by_count(&runs, cap.max(1)),
        None => runs,
    };

    let mut batches = Vec::new();
    let mut current = String::new();
    let mut current_count: usize = 0;

    for (start, end) in runs {
        let piece = if start == end {
            start.to_string()
        } else {
            format!("{start}:{end}")
        };
        let piece_count = run_len(start, end);

        let needed_len = if current.is_empty() {
            piece.len()
        } else {
            piece.len() + 1
        };
        let exceeds_len =
            !current.is_empty() && current.len() + needed_len > max_len.max(piece.len());
        let exceeds_count = !current.is_empty()
            && max_count.is_some_and(|cap| current_count.saturating_add(piece_count) > cap);

        if exceeds_len || exceeds_count {
            batches.push(std::mem::take(&mut current));
            current_count = 0;
        }

        if !current.is_empty() {
            current.push(',');
        }
        current.push_str(&piece);
        current_count += piece_count;
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

const fn run_len(start: u32, end: u32) -> usize {
    (end - start) as usize + 1
}

/// Splits any run longer than `cap` UIDs into consecutive sub-runs of
/// at most `cap` UIDs each, so a single compact run never forces a
/// piece over the per-command count limit.
fn split_runs_by_count(runs: &[(u32, u32)], cap: usize) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    for &(start, end) in runs {
        let mut s = start;
        loop {
            let remaining = u64::from(end) - u64::from(s) + 1;
            let take = remaining.min(cap as u64);
            // `take - 1` fits in u32 since it is bounded by `cap`.
            let piece_end = s + (take as u32 - 1);
            out.push((s, piece_end));
            if piece_end == end {
                break;
            }
            s = piece_end + 1;
        }
    }
    out
}

fn compact_runs(sorted: &[u32]) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut iter = sorted.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };

    let mut start = first;
    let mut end = first;

    for uid in iter {
        if uid == end + 1 {
            end = uid;
        } else {
            runs.push((start, end));
            start = uid;
            end = uid;
        }
    }
    runs.push((start, end));

    runs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(build_sequence_set(&[], 100, None).is_empty());
    }

    #[test]
    fn consecutive_uids_collapse_to_a_range() {
        let batches = build_sequence_set(&[1, 2, 3, 4, 5], 100, None);
        assert_eq!(batches, vec!["1:5".to_string()]);
    }

    #[test]
    fn gaps_are_preserved_as_separate_runs() {
        let batches = build_sequence_set(&[1, 2, 3, 10, 11, 20], 100, None);
        assert_eq!(batches, vec!["1:3,10:11,20".to_string()]);
    }

    #[test]
    fn unsorted_duplicate_input_is_normalized() {
        let batches = build_sequence_set(&[5, 1, 3, 2, 4, 3], 100, None);
        assert_eq!(batches, vec!["1:5".to_string()]);
    }

    #[test]
    fn output_is_split_once_max_len_is_exceeded() {
        let uids: Vec<u32> = (1..=20).step_by(2).collect();
        let batches = build_sequence_set(&uids, 10, None);
        assert!(batches.len() > 1);
        for batch in &batches {
            assert!(batch.len() <= 10 || !batch.contains(','));
        }
    }

    #[test]
    fn every_uid_appears_exactly_once_across_batches() {
        let uids: Vec<u32> = (1..=500).collect();
        let batches = build_sequence_set(&uids, 32, None);
        let mut recovered = Vec::new();
        for batch in &batches {
            for part in batch.split(',') {
                if let Some((a, b)) = part.split_once(':') {
                    let a: u32 = a.parse().unwrap();
                    let b: u32 = b.parse().unwrap();
                    recovered.extend(a..=b);
                } else {
                    recovered.push(part.parse().unwrap());
                }
            }
        }
        recovered.sort_unstable();
        assert_eq!(recovered, uids);
    }

    #[test]
    fn count_cap_splits_a_single_long_run() {
        let uids: Vec<u32> = (1..=500).collect();
        let batches = build_sequence_set(&uids, MAX_SEQUENCE_SET_LEN, Some(COPY_UID_COUNT_CAP));

        let mut recovered = Vec::new();
        for batch in &batches {
            let mut count_in_batch = 0usize;
            for part in batch.split(',') {
                if let Some((a, b)) = part.split_once(':') {
                    let a: u32 = a.parse().unwrap();
                    let b: u32 = b.parse().unwrap();
                    count_in_batch += (b - a) as usize + 1;
                    recovered.extend(a..=b);
                } else {
                    count_in_batch += 1;
                    recovered.push(part.parse().unwrap());
                }
            }
            assert!(count_in_batch <= COPY_UID_COUNT_CAP);
        }
        recovered.sort_unstable();
        assert_eq!(recovered, uids);
    }

    #[test]
    fn no_batch_exceeds_the_hard_length_cap() {
        let uids: Vec<u32> = (1..=100_000).step_by(2).collect();
        let batches = build_sequence_set(&uids, MAX_SEQUENCE_SET_LEN, None);
        for batch in &batches {
            assert!(batch.len() <= MAX_SEQUENCE_SET_LEN);
        }
    }

    #[test]
    fn every_piece_matches_sequence_set_grammar() {
        let uids: Vec<u32> = vec![1, 2, 3, 9, 50, 51, 52, 1000];
        let batches = build_sequence_set(&uids, MAX_SEQUENCE_SET_LEN, Some(COPY_UID_COUNT_CAP));
        let valid_piece = |s: &str| -> bool {
            s.split(',').all(|part| {
                part.split(':')
                    .all(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            })
        };
        for batch in &batches {
            assert!(valid_piece(batch), "malformed piece: {batch}");
        }
    }
}
