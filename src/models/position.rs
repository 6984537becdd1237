use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Die position at which a critical dimension is read
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Position {
    Top,
    Center,
    Bottom,
    Left,
    Right,
}

impl Position {
    /// All positions in report order
    pub fn all() -> impl Iterator<Item = Position> {
        Position::iter()
    }
}

/// One value per die position, serialized in a fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionMap<T> {
    pub top: T,
    pub center: T,
    pub bottom: T,
    pub left: T,
    pub right: T,
}

impl<T> PositionMap<T> {
    /// Build a map by evaluating `f` for every position
    pub fn from_fn(mut f: impl FnMut(Position) -> T) -> Self {
        Self {
            top: f(Position::Top),
            center: f(Position::Center),
            bottom: f(Position::Bottom),
            left: f(Position::Left),
            right: f(Position::Right),
        }
    }

    /// Fallible variant of [`PositionMap::from_fn`]; stops at the first error
    pub fn try_from_fn<E>(mut f: impl FnMut(Position) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            top: f(Position::Top)?,
            center: f(Position::Center)?,
            bottom: f(Position::Bottom)?,
            left: f(Position::Left)?,
            right: f(Position::Right)?,
        })
    }

    pub fn get(&self, position: Position) -> &T {
        match position {
            Position::Top => &self.top,
            Position::Center => &self.center,
            Position::Bottom => &self.bottom,
            Position::Left => &self.left,
            Position::Right => &self.right,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PositionMap<U> {
        PositionMap::from_fn(|position| f(self.get(position)))
    }

    /// Iterate `(position, value)` pairs in report order
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        Position::all().map(move |position| (position, self.get(position)))
    }
}

impl<T: Copy> PositionMap<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().map(|(_, value)| *value).collect()
    }
}
