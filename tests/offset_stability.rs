//! Property tests for the reverse-order application pass.

use apply_edits::{apply_edits, Edit};
use proptest::prelude::*;
use std::path::Path;

/// Reference implementation: apply ascending, one edit at a time, shifting
/// each later edit by the accumulated byte delta of everything applied
/// before it.
fn apply_sequentially(buffer: &[u8], edits: &[Edit]) -> Vec<u8> {
    let mut sorted = edits.to_vec();
    sorted.sort();

    let mut contents = buffer.to_vec();
    let mut delta: i64 = 0;
    for edit in &sorted {
        let offset = (edit.offset as i64 + delta) as usize;
        contents.splice(offset..offset + edit.length, edit.replacement.bytes());
        delta += edit.replacement.len() as i64 - edit.length as i64;
    }
    contents
}

/// A buffer plus a set of non-overlapping, non-conflicting replacement
/// edits at strictly increasing offsets. Replacements are non-empty so the
/// deletion-extension heuristic stays out of the comparison.
fn buffer_and_edits() -> impl Strategy<Value = (Vec<u8>, Vec<Edit>)> {
    (
        "[ -~]{0,80}",
        prop::collection::vec((0usize..6, 0usize..4, "[A-Z]{1,3}"), 0..6),
    )
        .prop_map(|(buffer, spans)| {
            let buffer = buffer.into_bytes();
            let mut edits = Vec::new();
            let mut cursor = 0usize;
            for (gap, length, replacement) in spans {
                let offset = cursor + gap;
                if offset + length > buffer.len() {
                    break;
                }
                // Always advance past the offset so no two edits share a
                // target range.
                cursor = offset + length.max(1);
                edits.push(Edit::new("r", offset, length, replacement));
            }
            (buffer, edits)
        })
}

proptest! {
    #[test]
    fn reverse_batch_matches_sequential_application((buffer, edits) in buffer_and_edits()) {
        let mut batch = edits.clone();
        let mut contents = buffer.clone();
        let outcome = apply_edits(&mut contents, &mut batch, Path::new("prop.cc"));

        prop_assert_eq!(outcome.errors, 0);
        prop_assert_eq!(outcome.edits_applied, edits.len());
        prop_assert_eq!(contents, apply_sequentially(&buffer, &edits));
    }

    #[test]
    fn duplicated_records_change_nothing((buffer, edits) in buffer_and_edits()) {
        let mut once = edits.clone();
        let mut twice: Vec<Edit> = edits.iter().cloned().chain(edits.iter().cloned()).collect();

        let mut contents_once = buffer.clone();
        let mut contents_twice = buffer.clone();
        let outcome_once = apply_edits(&mut contents_once, &mut once, Path::new("prop.cc"));
        let outcome_twice = apply_edits(&mut contents_twice, &mut twice, Path::new("prop.cc"));

        prop_assert_eq!(contents_once, contents_twice);
        prop_assert_eq!(outcome_once.edits_applied, outcome_twice.edits_applied);
        prop_assert_eq!(outcome_twice.errors, 0);
    }
}
