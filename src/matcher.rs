//! Weighted edit distance between a free-form query and zone names.
//!
//! Costs are asymmetric: turning the query into a zone name is cheap when
//! characters are only added, and expensive when the query has characters the
//! name lacks. A short prefix like `"chic"` therefore stays close to
//! `"Chicago"`, while a query with stray letters drifts away quickly.

/// Cost of inserting a character into the query.
pub const INSERT_COST: u32 = 1;
/// Cost of deleting a character from the query.
pub const DELETE_COST: u32 = 3;
/// Cost of substituting one character of the query for another.
pub const SUBSTITUTE_COST: u32 = 5;
/// Largest distance still accepted as a match.
pub const MAX_DISTANCE: u32 = 8;

/// The weighted Levenshtein distance to transform `query` into `target`.
///
/// Comparison ignores ASCII and Unicode case.
pub fn weighted_levenshtein(query: &str, target: &str) -> u32 {
    let query: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let target: Vec<char> = target.chars().flat_map(char::to_lowercase).collect();

    // previous[j]: cost of turning the first i - 1 query chars into target[..j]
    let mut previous: Vec<u32> = (0..=target.len() as u32).map(|j| j * INSERT_COST).collect();
    let mut current = vec![0; target.len() + 1];

    for (i, q) in query.iter().enumerate() {
        current[0] = (i as u32 + 1) * DELETE_COST;
        for (j, t) in target.iter().enumerate() {
            let substitute = previous[j] + if q == t { 0 } else { SUBSTITUTE_COST };
            let delete = previous[j + 1] + DELETE_COST;
            let insert = current[j] + INSERT_COST;
            current[j + 1] = substitute.min(delete).min(insert);
        }
        core::mem::swap(&mut previous, &mut current);
    }

    previous[target.len()]
}

/// The human readable location of a key: its last segment with
/// underscores read as spaces, e.g. `"New York"` for `"America/New_York"`.
pub fn location_form(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).replace('_', " ")
}

/// Distance between a query and a zone name.
///
/// The smaller of the distance to the full key and the distance to its
/// location form.
pub fn distance(query: &str, key: &str) -> u32 {
    let full = weighted_levenshtein(query, key);
    if full == 0 {
        return 0;
    }
    full.min(weighted_levenshtein(query, &location_form(key)))
}

/// A name chosen by [`best_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub name: &'a str,
    pub distance: u32,
}

/// Finds the closest name to `query` within [`MAX_DISTANCE`].
///
/// On equal distances the name that comes first in `names` wins, so callers
/// pass names in sorted order to get the lexicographically smallest one.
pub fn best_match<'a, I>(query: &str, names: I) -> Option<Match<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<Match<'a>> = None;
    for name in names {
        let distance = distance(query, name);
        if distance > MAX_DISTANCE {
            continue;
        }
        if best.is_none_or(|b| distance < b.distance) {
            log::trace!("{query:?} is {distance} from {name}");
            best = Some(Match { name, distance });
            if distance == 0 {
                break;
            }
        }
    }
    best
}
