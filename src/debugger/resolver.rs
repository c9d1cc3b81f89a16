use super::routines::{RoutineId, RoutineTree};

/// Find the routine under `start` that owns `line`.
///
/// The innermost routine whose range contains the line wins. A line that
/// falls between routines (a comment between two sub-routines, say) goes to
/// the first routine starting after it. A script root with nothing nested
/// around the line owns it.
pub fn find_routine_by_line<S>(tree: &RoutineTree<S>, start: RoutineId, line: u32) -> Option<RoutineId> {
    let mut end_line = u32::MAX;
    find_innermost(tree, start, line, &mut end_line)
}

/// `end_line` tracks the smallest enclosing end seen so far, shared with
/// the caller so the tightest match survives the recursion.
fn find_innermost<S>(
    tree: &RoutineTree<S>,
    id: RoutineId,
    line: u32,
    end_line: &mut u32,
) -> Option<RoutineId> {
    let mut found = None;
    let mut next_routine = None;
    let mut earliest_end = u32::MAX;

    for &child in tree.children(id) {
        let sub = tree.node(child);
        if sub.end_line < earliest_end && sub.contains(line) {
            earliest_end = sub.end_line;
            found = find_innermost(tree, child, line, &mut earliest_end);
        }

        if sub.begin_line >= line && next_routine.is_none() {
            next_routine = Some(child);
        }
    }

    let node = tree.node(id);
    if node.is_function() {
        if node.end_line >= line && node.end_line < earliest_end {
            found = Some(id);
        }
        if found.is_none() {
            found = next_routine;
        }
    } else if found.is_none() {
        found = Some(id);
    }

    if earliest_end < *end_line {
        *end_line = earliest_end;
    }

    found
}
