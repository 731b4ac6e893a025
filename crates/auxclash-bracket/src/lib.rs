//! Single-elimination bracket engine for AuxClash.
//!
//! Pure and self-contained: no I/O, no clocks, no channels. The room layer
//! drives it by alternating [`Bracket::next_matchup`] and
//! [`Bracket::play_next_matchup`] until a winner emerges.
//!
//! # Key types
//!
//! - [`Bracket`] — the tree: pending rounds, played history, winner
//! - [`Matchup`] — a 1-or-2 contestant unit (1 = bye, auto-win)
//! - [`RoundsCache`] — injectable memo table for [`total_rounds`]

mod bracket;
mod error;
mod matchup;
mod rounds;

pub use bracket::Bracket;
pub use error::BracketError;
pub use matchup::{Matchup, MatchupId};
pub use rounds::{total_rounds, RoundsCache};
