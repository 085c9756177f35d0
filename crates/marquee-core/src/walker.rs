//! Discovery of screening-shaped records in an arbitrary dump.
//!
//! Screenings show up in two shapes:
//!
//! - grouped: a record with a `screenings` list, whose other keys (venue,
//!   poster, ...) are shared by every element of the list
//! - free-standing: any object carrying both a title-like and a time-like key
//!
//! [`SourceWalker`] accepts both, anywhere in the tree. It is a lazy iterator
//! over an explicit work-list, so stack usage is independent of nesting depth,
//! and it refuses to descend past [`WalkOptions::max_depth`].

use std::ops::Index;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::fields::Record;

/// Default nesting limit for tree traversals.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Key holding a list of grouped screenings.
const GROUP_KEY: &str = "screenings";

/// Key under which bare (non-object) group elements are attached.
const SYNTHETIC_SHOWTIME_KEY: &str = "showtimes";

const TITLE_KEYS: &[&str] = &["title", "film", "films"];
const TIME_KEYS: &[&str] = &["showtime", "showtimes", "when", "screening_times"];

static NULL: Value = Value::Null;

/// Traversal limits shared by the walker and the venue index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Nodes nested deeper than this are skipped.
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One borrowed slice of a candidate's fields.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Layer<'a> {
    /// An enclosing group record. Its `screenings` list is hidden.
    Group(&'a Map<String, Value>),
    /// The record's own fields.
    Own(&'a Map<String, Value>),
    /// A bare `screenings` element, seen as `showtimes`.
    Showtime(&'a Value),
}

impl<'a> Layer<'a> {
    fn get(self, key: &str) -> Option<&'a Value> {
        match self {
            Layer::Group(_) if key == GROUP_KEY => None,
            Layer::Group(map) | Layer::Own(map) => map.get(key),
            Layer::Showtime(value) => (key == SYNTHETIC_SHOWTIME_KEY).then_some(value),
        }
    }

    fn copy_into(self, merged: &mut Map<String, Value>) {
        match self {
            Layer::Group(map) => {
                for (key, value) in map.iter().filter(|(key, _)| key.as_str() != GROUP_KEY) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Layer::Own(map) => {
                for (key, value) in map {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Layer::Showtime(value) => {
                merged.insert(SYNTHETIC_SHOWTIME_KEY.to_string(), value.clone());
            }
        }
    }
}

/// Fields inherited from enclosing `screenings` groups, innermost last.
///
/// Borrows from the dump; a nested group produces a new context rather than
/// editing this one, and siblings share theirs behind an [`Rc`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context<'a> {
    layers: Vec<Layer<'a>>,
}

impl<'a> Context<'a> {
    /// The innermost group's value for `key`.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn with_group(&self, group: &'a Map<String, Value>) -> Self {
        let mut layers = self.layers.clone();
        layers.push(Layer::Group(group));
        Self { layers }
    }
}

/// A record that may describe a screening: its own fields over the fields
/// inherited from enclosing groups.
///
/// Lookups go straight to the dump; nothing is copied until [`to_map`] is
/// called.
///
/// [`to_map`]: CandidateEntry::to_map
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEntry<'a> {
    context: Rc<Context<'a>>,
    own: Layer<'a>,
}

impl<'a> CandidateEntry<'a> {
    /// A record with no inherited fields.
    pub fn from_record(record: &'a Map<String, Value>) -> Self {
        Self {
            context: Rc::default(),
            own: Layer::Own(record),
        }
    }

    fn new(context: Rc<Context<'a>>, own: Layer<'a>) -> Self {
        Self { context, own }
    }

    /// Own fields win over inherited ones.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.own.get(key).or_else(|| self.context.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The inherited fields this record sees.
    pub fn context(&self) -> &Context<'a> {
        &self.context
    }

    /// An owned, flattened copy of the record.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut merged = Map::new();
        for layer in &self.context.layers {
            layer.copy_into(&mut merged);
        }
        self.own.copy_into(&mut merged);
        merged
    }
}

impl Record for CandidateEntry<'_> {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl Index<&str> for CandidateEntry<'_> {
    type Output = Value;

    /// `Value::Null` for missing keys, like indexing a [`Value`].
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

/// Pending node on the work-list.
struct Frame<'a> {
    node: &'a Value,
    /// Direct element of a `screenings` list, seen through its group context.
    member: bool,
    context: Rc<Context<'a>>,
    depth: usize,
}

/// Lazy, depth-first iterator over the [`CandidateEntry`] records of a dump,
/// in document order.
///
/// ```
/// use marquee_core::walker::SourceWalker;
/// use serde_json::json;
///
/// let dump = json!({
///     "screenings": [{
///         "venue": "vista",
///         "screenings": [{"title": "Ran", "showtime": "2026-06-12 19:30"}]
///     }]
/// });
/// let found: Vec<_> = SourceWalker::new(&dump).collect();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0]["venue"], "vista");
/// ```
pub struct SourceWalker<'a> {
    stack: Vec<Frame<'a>>,
    options: WalkOptions,
}

impl<'a> SourceWalker<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self::with_options(root, WalkOptions::default())
    }

    pub fn with_options(root: &'a Value, options: WalkOptions) -> Self {
        Self {
            stack: vec![Frame {
                node: root,
                member: false,
                context: Rc::default(),
                depth: 0,
            }],
            options,
        }
    }

    fn push_children<I>(
        &mut self,
        children: I,
        context: &Rc<Context<'a>>,
        depth: usize,
        member: bool,
    ) where
        I: IntoIterator<Item = &'a Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.stack
            .extend(children.into_iter().rev().map(|node| Frame {
                node,
                member,
                context: Rc::clone(context),
                depth: depth + 1,
            }));
    }
}

impl<'a> Iterator for SourceWalker<'a> {
    type Item = CandidateEntry<'a>;

    fn next(&mut self) -> Option<CandidateEntry<'a>> {
        while let Some(Frame {
            node,
            member,
            context,
            depth,
        }) = self.stack.pop()
        {
            if depth > self.options.max_depth {
                tracing::warn!(depth, "source walker skipped a node past the depth limit");
                continue;
            }

            match node {
                Value::Object(map) => {
                    if let Some(Value::Array(group)) = map.get(GROUP_KEY) {
                        let inherited = Rc::new(context.with_group(map));
                        self.push_children(group, &inherited, depth, true);
                        continue;
                    }
                    // Group members are judged with their inherited fields,
                    // anything else on its own keys.
                    let entry = CandidateEntry::new(Rc::clone(&context), Layer::Own(map));
                    let shaped = if member {
                        is_screening_shaped(&entry)
                    } else {
                        is_screening_shaped(map)
                    };
                    if shaped {
                        return Some(entry);
                    }
                    self.push_children(map.values(), &context, depth, false);
                }
                other if member => {
                    let entry = CandidateEntry::new(context, Layer::Showtime(other));
                    if is_screening_shaped(&entry) {
                        return Some(entry);
                    }
                }
                Value::Array(items) => self.push_children(items, &context, depth, false),
                _ => {}
            }
        }
        None
    }
}

fn is_screening_shaped<R: Record + ?Sized>(record: &R) -> bool {
    TITLE_KEYS.iter().any(|key| record.lookup(key).is_some())
        && TIME_KEYS.iter().any(|key| record.lookup(key).is_some())
}
