//! Join keys shared by every source.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::Serialize;

use super::cell::{Cell, format_number};

/// How an identifier column was stored in its workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Number cells.
    Numeric,
    /// Text cells.
    Text,
    /// A mix of both.
    Mixed,
}

impl KeyKind {
    /// Folds the kinds of every key in a column into one.
    ///
    /// Returns `None` for a column without keys.
    pub fn of<'a>(ids: impl IntoIterator<Item = &'a EntityId>) -> Option<KeyKind> {
        ids.into_iter().fold(None, |acc, id| match acc {
            None => Some(id.kind()),
            Some(kind) if kind == id.kind() => Some(kind),
            Some(_) => Some(KeyKind::Mixed),
        })
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Numeric => write!(f, "numeric"),
            KeyKind::Text => write!(f, "text"),
            KeyKind::Mixed => write!(f, "mixed"),
        }
    }
}

/// An employee identifier.
///
/// Equality and hashing use the canonical text only, so the same person
/// stored as `1001` in one export and `"1001"` in another compares equal.
/// Ordering is numeric when both identifiers are numbers.
///
/// # Examples
///
/// ```
/// use absence_recon::models::{Cell, EntityId, KeyKind};
///
/// let numeric = EntityId::from_cell(&Cell::Number(1001.0)).unwrap();
/// let text = EntityId::from_cell(&Cell::Text(" 1001 ".to_string())).unwrap();
/// assert_eq!(numeric, text);
/// assert_eq!(numeric.kind(), KeyKind::Numeric);
/// assert_eq!(text.kind(), KeyKind::Text);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct EntityId {
    canonical: String,
    #[serde(skip)]
    kind: KeyKind,
}

impl EntityId {
    /// Creates a text identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            canonical: value.into().trim().to_string(),
            kind: KeyKind::Text,
        }
    }

    /// Reads an identifier from a cell. Blank cells hold no identifier.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Number(n) => Some(Self {
                canonical: format_number(*n),
                kind: KeyKind::Numeric,
            }),
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Empty => None,
            other => Some(Self::new(other.display())),
        }
    }

    /// The canonical text.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// How the identifier was stored.
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    fn numeric_value(&self) -> Option<f64> {
        self.canonical.parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_value(), other.numeric_value()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.canonical.cmp(&other.canonical)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.canonical.cmp(&other.canonical),
        }
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// The (entity, start date) pair every cross-source join matches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MatchKey {
    /// The employee.
    pub entity: EntityId,
    /// The absence start date.
    pub date: NaiveDate,
}

impl MatchKey {
    /// Creates a match key.
    pub fn new(entity: EntityId, date: NaiveDate) -> Self {
        Self { entity, date }
    }
}
