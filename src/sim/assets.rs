/// Asset handles and the table that resolves them.
///
/// Handles are plain enums so the simulation can name a texture or a sound
/// without knowing how the front end draws or plays it. Each front end
/// fills an `AssetTable` at start-up; asking for a handle nobody
/// registered is a programming error and panics.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::domain::tile::{Edge, TileVariant};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureId {
    Character,
    CharacterStunned,
    Raccoon,
    Dog,
    Goal,
    Coin,
    GroundSurface,
    GroundFill,
    GroundDeep,
    Platform,
    Background,
}

impl TextureId {
    pub const ALL: [TextureId; 11] = [
        TextureId::Character,
        TextureId::CharacterStunned,
        TextureId::Raccoon,
        TextureId::Dog,
        TextureId::Goal,
        TextureId::Coin,
        TextureId::GroundSurface,
        TextureId::GroundFill,
        TextureId::GroundDeep,
        TextureId::Platform,
        TextureId::Background,
    ];

    pub fn for_variant(v: TileVariant) -> TextureId {
        match v {
            TileVariant::Surface(_) => TextureId::GroundSurface,
            TileVariant::Fill(_) => TextureId::GroundFill,
            TileVariant::DeepFill(Edge::Enclosed) | TileVariant::Deeper(_) => TextureId::GroundDeep,
            TileVariant::DeepFill(_) => TextureId::GroundFill,
            TileVariant::Platform => TextureId::Platform,
        }
    }

    /// Texture for an enemy species by its level symbol index.
    pub fn for_enemy(species: usize) -> TextureId {
        match species {
            0 => TextureId::Raccoon,
            _ => TextureId::Dog,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SoundId {
    Jump,
    Land,
    Push,
    Collect,
    Win,
    Lose,
    Click,
}

impl SoundId {
    pub const ALL: [SoundId; 7] = [
        SoundId::Jump,
        SoundId::Land,
        SoundId::Push,
        SoundId::Collect,
        SoundId::Win,
        SoundId::Lose,
        SoundId::Click,
    ];
}

/// Handle → loaded asset, filled once at start-up.
#[derive(Clone, Debug)]
pub struct AssetTable<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Copy + Eq + Hash + Debug, V> Default for AssetTable<K, V> {
    fn default() -> Self {
        AssetTable { entries: HashMap::new() }
    }
}

impl<K: Copy + Eq + Hash + Debug, V> AssetTable<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table by loading every key in `keys`.
    pub fn load_all(keys: &[K], mut load: impl FnMut(K) -> V) -> Self {
        let mut table = Self::new();
        for &k in keys {
            table.register(k, load(k));
        }
        table
    }

    pub fn register(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Panics when `key` was never registered.
    pub fn get(&self, key: K) -> &V {
        match self.entries.get(&key) {
            Some(v) => v,
            None => panic!("asset {key:?} was never registered"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
