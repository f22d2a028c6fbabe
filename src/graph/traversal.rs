//! Graph traversal algorithms

use super::VertexId;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Directed cycle search (iterative three-colour DFS).
///
/// `roots` are the vertices to start from, `bound` is one past the largest id
/// that can appear. Returns a vertex lying on some cycle, or None if the
/// relation given by `successors` is acyclic. Ids at or above `bound` are ignored.
pub fn find_cycle<I, F>(roots: I, bound: usize, mut successors: F) -> Option<VertexId>
where
    I: IntoIterator<Item = VertexId>,
    F: FnMut(VertexId) -> Vec<VertexId>,
{
    let mut marks = vec![Mark::Unvisited; bound];
    // (vertex, its successors, next successor to look at)
    let mut stack: Vec<(VertexId, Vec<VertexId>, usize)> = Vec::new();

    for root in roots {
        match marks.get(root as usize) {
            Some(Mark::Unvisited) => {}
            _ => continue,
        }
        marks[root as usize] = Mark::OnPath;
        stack.push((root, successors(root), 0));

        while let Some((node, children, next)) = stack.last_mut() {
            let Some(&child) = children.get(*next) else {
                marks[*node as usize] = Mark::Done;
                stack.pop();
                continue;
            };
            *next += 1;

            match marks.get(child as usize) {
                Some(Mark::OnPath) => return Some(child),
                Some(Mark::Unvisited) => {
                    marks[child as usize] = Mark::OnPath;
                    let grandchildren = successors(child);
                    stack.push((child, grandchildren, 0));
                }
                _ => {}
            }
        }
    }

    None
}
