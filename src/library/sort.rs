use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::suno::SongRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Date,
    Project,
    Tags,
    Favorites,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Date => "date",
            SortField::Project => "project",
            SortField::Tags => "tags",
            SortField::Favorites => "favorites",
        }
    }

    /// Three-way comparison of two songs on this field alone.
    fn compare(&self, a: &SongRecord, b: &SongRecord) -> Ordering {
        match self {
            SortField::Name => cmp_text(a.title.as_deref(), b.title.as_deref()),
            SortField::Date => a.created_at.cmp(&b.created_at),
            SortField::Project => cmp_text(a.project_name(), b.project_name()),
            SortField::Tags => cmp_text(a.tags(), b.tags()),
            SortField::Favorites => a.upvote_count.cmp(&b.upvote_count),
        }
    }
}

/// Case-insensitive lexicographic order; a missing value sorts as "".
fn cmp_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or("").chars().flat_map(char::to_lowercase);
    let b = b.unwrap_or("").chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "title" => Ok(SortField::Name),
            "date" | "created" => Ok(SortField::Date),
            "project" | "playlist" => Ok(SortField::Project),
            "tags" => Ok(SortField::Tags),
            "favorites" | "favorite" | "upvotes" => Ok(SortField::Favorites),
            other => Err(format!(
                "unknown sort field '{}' (expected name, date, project, tags or favorites)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortCriterion {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}:{}", self.field.as_str(), dir)
    }
}

/// Parses `field` or `field:asc|desc`; a bare field sorts ascending.
impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, dir) = match s.split_once(':') {
            Some((field, dir)) => (field, Some(dir)),
            None => (s, None),
        };
        let field: SortField = field.parse()?;
        let direction = match dir.map(|d| d.trim().to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(d) => return Err(format!("unknown sort direction '{}' (expected asc or desc)", d)),
        };
        Ok(Self { field, direction })
    }
}

/// Ordered tie-break chain of sort criteria, primary first.
/// Never holds two criteria for the same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortStack(Vec<SortCriterion>);

impl Default for SortStack {
    /// Newest first.
    fn default() -> Self {
        SortStack(vec![SortCriterion::desc(SortField::Date)])
    }
}

impl SortStack {
    /// Build a stack from criteria in priority order. A repeated field keeps
    /// its first (highest-priority) occurrence.
    pub fn new(criteria: impl IntoIterator<Item = SortCriterion>) -> Self {
        let mut stack: Vec<SortCriterion> = Vec::new();
        for c in criteria {
            if !stack.iter().any(|s| s.field == c.field) {
                stack.push(c);
            }
        }
        SortStack(stack)
    }

    pub fn criteria(&self) -> &[SortCriterion] {
        &self.0
    }

    /// Column-header click: re-clicking the primary field flips its
    /// direction; clicking a secondary field moves it to the front with its
    /// direction unchanged; clicking a new field puts it in front, ascending.
    pub fn promote(&mut self, field: SortField) {
        match self.0.iter().position(|c| c.field == field) {
            Some(0) => {
                let primary = &mut self.0[0];
                primary.direction = primary.direction.flipped();
            }
            Some(i) => {
                let c = self.0.remove(i);
                self.0.insert(0, c);
            }
            None => self.0.insert(0, SortCriterion::asc(field)),
        }
    }

    /// Walk the chain; the first non-equal criterion decides.
    pub fn compare(&self, a: &SongRecord, b: &SongRecord) -> Ordering {
        for c in &self.0 {
            let ord = c.field.compare(a, b);
            if ord != Ordering::Equal {
                return c.direction.apply(ord);
            }
        }
        Ordering::Equal
    }
}

/// Stable multi-key sort: complete ties keep their input order.
pub fn sort(songs: &mut [&SongRecord], stack: &SortStack) {
    songs.sort_by(|a, b| stack.compare(a, b));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn song(id: &str, title: &str, created: &str, upvotes: u64) -> SongRecord {
        serde_json::from_value(json!({
            "id": id,
            "title": title,
            "created_at": created,
            "upvote_count": upvotes,
        }))
        .unwrap()
    }

    fn ids(songs: &[&SongRecord]) -> Vec<String> {
        songs.iter().map(|s| s.id.clone()).collect()
    }

    fn library() -> Vec<SongRecord> {
        vec![
            song("a", "beta", "2024-01-02T00:00:00Z", 5),
            song("b", "Alpha", "2024-01-03T00:00:00Z", 1),
            song("c", "alpha", "2024-01-01T00:00:00Z", 5),
            song("d", "Gamma", "2024-01-02T00:00:00Z", 0),
        ]
    }

    #[test]
    fn test_default_stack_is_newest_first() {
        let lib = library();
        let mut view: Vec<_> = lib.iter().collect();
        sort(&mut view, &SortStack::default());
        assert_eq!(ids(&view), ["b", "a", "d", "c"]);
    }

    #[test]
    fn test_name_sort_is_case_insensitive_and_stable() {
        let lib = library();
        let mut view: Vec<_> = lib.iter().collect();
        sort(&mut view, &SortStack::new([SortCriterion::asc(SortField::Name)]));
        // "Alpha" and "alpha" tie; input order b before c is kept.
        assert_eq!(ids(&view), ["b", "c", "a", "d"]);
    }

    #[test]
    fn test_secondary_criterion_breaks_ties() {
        let lib = library();
        let mut view: Vec<_> = lib.iter().collect();
        let stack = SortStack::new([
            SortCriterion::desc(SortField::Favorites),
            SortCriterion::asc(SortField::Date),
        ]);
        sort(&mut view, &stack);
        // a and c both have 5 upvotes; c is older.
        assert_eq!(ids(&view), ["c", "a", "b", "d"]);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let lib = library();
        let stack = SortStack::new([
            SortCriterion::asc(SortField::Date),
            SortCriterion::desc(SortField::Name),
        ]);
        let mut once: Vec<_> = lib.iter().collect();
        sort(&mut once, &stack);
        let mut twice = once.clone();
        sort(&mut twice, &stack);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_missing_values_sort_first_ascending() {
        let lib: Vec<SongRecord> = vec![
            serde_json::from_value(json!({"id": "x", "title": "zed", "created_at": "2024-01-01T00:00:00Z"})).unwrap(),
            serde_json::from_value(json!({"id": "y"})).unwrap(),
        ];
        let mut view: Vec<_> = lib.iter().collect();
        sort(&mut view, &SortStack::new([SortCriterion::asc(SortField::Date)]));
        assert_eq!(ids(&view), ["y", "x"]);
        sort(&mut view, &SortStack::new([SortCriterion::asc(SortField::Name)]));
        assert_eq!(ids(&view), ["y", "x"]);
    }

    #[test]
    fn test_promote_primary_flips_direction() {
        let mut stack = SortStack::default();
        stack.promote(SortField::Date);
        assert_eq!(stack.criteria(), [SortCriterion::asc(SortField::Date)]);
        stack.promote(SortField::Date);
        assert_eq!(stack.criteria(), [SortCriterion::desc(SortField::Date)]);
    }

    #[test]
    fn test_promote_secondary_moves_to_front_unchanged() {
        let mut stack = SortStack::new([
            SortCriterion::desc(SortField::Date),
            SortCriterion::asc(SortField::Name),
        ]);
        stack.promote(SortField::Name);
        assert_eq!(
            stack.criteria(),
            [
                SortCriterion::asc(SortField::Name),
                SortCriterion::desc(SortField::Date),
            ]
        );
    }

    #[test]
    fn test_promote_new_field_inserts_ascending_at_front() {
        let mut stack = SortStack::default();
        stack.promote(SortField::Tags);
        assert_eq!(
            stack.criteria(),
            [
                SortCriterion::asc(SortField::Tags),
                SortCriterion::desc(SortField::Date),
            ]
        );
    }

    #[test]
    fn test_stack_never_repeats_a_field() {
        let stack = SortStack::new([
            SortCriterion::asc(SortField::Name),
            SortCriterion::desc(SortField::Name),
            SortCriterion::asc(SortField::Date),
        ]);
        assert_eq!(
            stack.criteria(),
            [
                SortCriterion::asc(SortField::Name),
                SortCriterion::asc(SortField::Date),
            ]
        );
    }

    #[test]
    fn test_parses_criteria() {
        assert_eq!("date:desc".parse::<SortCriterion>(), Ok(SortCriterion::desc(SortField::Date)));
        assert_eq!("Name".parse::<SortCriterion>(), Ok(SortCriterion::asc(SortField::Name)));
        assert_eq!("playlist:ASC".parse::<SortCriterion>(), Ok(SortCriterion::asc(SortField::Project)));
        assert_eq!("favorite:desc".parse::<SortCriterion>(), Ok(SortCriterion::desc(SortField::Favorites)));
        assert!("color".parse::<SortCriterion>().is_err());
        assert!("date:sideways".parse::<SortCriterion>().is_err());
        assert_eq!(SortCriterion::desc(SortField::Tags).to_string(), "tags:desc");
    }
}
