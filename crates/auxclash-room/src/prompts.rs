//! Prompt packs and the per-room prompt deck.
//!
//! A prompt is the theme a matchup plays to ("a song that makes you
//! drive too fast"). Packs are loaded outside the core — from disk, a
//! database, wherever — and reach it through [`PromptSource`]. The room
//! only consumes: it keeps a shuffled deck of the active pack and refills
//! from the pack when the deck runs dry.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Drawn when a deck has nothing to offer (empty pack slipped through).
const FREE_CHOICE: &str = "Play anything you want";

/// A named collection of prompt strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPack {
    pub name: String,
    pub prompts: Vec<String>,
}

/// Supplies named prompt packs to the registry.
///
/// Implementations load from wherever they like; the built-in one is
/// compiled in. Sync and object-safe — the registry holds an
/// `Arc<dyn PromptSource>`.
pub trait PromptSource: Send + Sync + 'static {
    /// Names of the packs on offer, for lobby display.
    fn pack_names(&self) -> Vec<String>;

    /// Fetch a pack by name; `None` if unknown.
    fn pack(&self, name: &str) -> Option<PromptPack>;
}

/// The compiled-in prompt packs: a usable default and a spare.
pub struct BuiltinPrompts;

const CLASSICS: &[&str] = &[
    "A song that gets the whole room moving",
    "The best opening 10 seconds you know",
    "A track you'd play to win over a stranger",
    "Something that peaked before the year 2000",
    "The guiltiest pleasure on your playlist",
    "A song that belongs in a movie chase scene",
    "The best cover version of anything",
    "A track that deserves more plays than it gets",
    "Something you'd scream along to in a car",
    "The saddest banger you know",
];

const CRATE_DIGGERS: &[&str] = &[
    "A B-side better than the single",
    "The deepest cut from a famous artist",
    "Something with under a million plays",
    "A song in a language you don't speak",
    "The best thing you found through a sample",
    "A genre nobody here expects you to play",
    "An instrumental that needs no words",
    "The weirdest track you unironically love",
];

impl PromptSource for BuiltinPrompts {
    fn pack_names(&self) -> Vec<String> {
        vec!["classics".into(), "crate-diggers".into()]
    }

    fn pack(&self, name: &str) -> Option<PromptPack> {
        let prompts: &[&str] = match name {
            "classics" => CLASSICS,
            "crate-diggers" => CRATE_DIGGERS,
            _ => return None,
        };
        Some(PromptPack {
            name: name.to_owned(),
            prompts: prompts.iter().map(|p| (*p).to_owned()).collect(),
        })
    }
}

/// The room's consumable, shuffled copy of its active pack.
pub(crate) struct PromptDeck {
    pack: PromptPack,
    remaining: Vec<String>,
}

impl PromptDeck {
    /// A fresh deck; the first draw shuffles and deals from the pack.
    pub(crate) fn new(pack: PromptPack) -> Self {
        Self {
            pack,
            remaining: Vec::new(),
        }
    }

    pub(crate) fn pack_name(&self) -> &str {
        &self.pack.name
    }

    /// Draws and consumes one prompt, refilling (reshuffled) from the
    /// pack when the deck is exhausted.
    pub(crate) fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        if self.remaining.is_empty() {
            self.remaining = self.pack.prompts.clone();
            self.remaining.shuffle(rng);
        }
        self.remaining
            .pop()
            .unwrap_or_else(|| FREE_CHOICE.to_owned())
    }
}
