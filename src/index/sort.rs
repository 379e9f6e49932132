use feruca::{Collator, Locale, Tailoring};
use std::cell::RefCell;
use std::cmp::Ordering;

thread_local! {
    // Root collation, punctuation non-ignorable, code-point tiebreak.
    static COLLATOR: RefCell<Collator> = RefCell::new(Collator::new(Tailoring::Cldr(Locale::Root), false, true));
}

/// Orders entry and type names for serialization
///
/// When either name starts with an ASCII digit both are treated as possibly
/// versioned and split on `.` and `-`. A name with a single component sorts
/// before one with several. Every other case, including two multi-component
/// names, falls back to a case-insensitive collation of the whole strings
/// (Unicode root collation, so accented letters sort beside their base letter).
///
/// This relation is not transitive across mixed inputs (for example
/// `z < 1.0`, `1.0 < a.b`, `a.b < z`), so it must only be used with
/// [`sort_by_name`], never with `slice::sort_by`.
///
/// # Examples
///
/// ```
/// use docbundle::index::compare_names;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_names("zlib", "1.2.0"), Ordering::Less);
/// assert_eq!(compare_names("1.10.0", "1.9.0"), Ordering::Less);
/// assert_eq!(compare_names("Abc", "abd"), Ordering::Less);
/// ```
pub fn compare_names(a: &str, b: &str) -> Ordering {
    if starts_with_digit(a) || starts_with_digit(b) {
        match (is_single_component(a), is_single_component(b)) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }

    caseless_cmp(a, b)
}

/// Stable merge sort of `items` under [`compare_names`]
///
/// Equal names keep their input order. The merge never assumes a total
/// order, so it terminates and returns every item for any input.
pub fn sort_by_name<T, F>(items: Vec<T>, name: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    merge_sort(items, &name)
}

fn merge_sort<T, F>(mut items: Vec<T>, name: &F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, name);
    let right = merge_sort(right, name);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare_names(name(r), name(l)) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };

        let next = if take_right { right.next() } else { left.next() };
        if let Some(item) = next {
            merged.push(item);
        }
    }

    merged
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn is_single_component(s: &str) -> bool {
    !s.contains(|c: char| c == '.' || c == '-')
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    COLLATOR.with(|collator| collator.borrow_mut().collate(a.as_str(), b.as_str()))
}
