//! Pure list reordering primitive shared by unit and chapter lists.

/// Returns a copy of `list` with the element at `start_index` removed and
/// reinserted at `end_index`.
///
/// # Contract
/// - `reorder(list, i, i)` returns an order-equal copy.
/// - The result is a permutation of `list`: same elements, same
///   multiplicity.
/// - Out-of-range indices are clamped to the list bounds; an empty list
///   yields an empty list. Callers holding validated indices (the outline
///   store) reject out-of-range input at their own boundary instead of
///   relying on the clamp.
pub fn reorder<T: Clone>(list: &[T], start_index: usize, end_index: usize) -> Vec<T> {
    let mut result = list.to_vec();
    if result.is_empty() {
        return result;
    }

    let from = start_index.min(result.len() - 1);
    let to = end_index.min(result.len() - 1);
    let moved = result.remove(from);
    result.insert(to, moved);
    result
}
