//! Placement policies.
//!
//! A [`Placement`] only *chooses* a free block; it never mutates the list.
//! The pool splits and marks the chosen block the same way for every
//! policy.
//!
//! | Policy | Scan order | Picks |
//! |--------|------------|-------|
//! | [`FirstFit`](Placement::FirstFit) | head to tail | first block that fits |
//! | [`NextFit`](Placement::NextFit) | after the cursor, wrapping once | first block that fits |
//! | [`BestFit`](Placement::BestFit) | every free block | smallest leftover, earliest on ties |
//! | [`WorstFit`](Placement::WorstFit) | every free block | largest leftover, earliest on ties |

use std::fmt;
use std::str::FromStr;

use crate::block::{Block, BlockId, BlockList};
use crate::error::Error;

/// Strategy for choosing a free block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    /// First qualifying block in address order.
    #[default]
    FirstFit,
    /// First qualifying block after the last successful allocation.
    NextFit,
    /// Qualifying block leaving the least space unused.
    BestFit,
    /// Qualifying block leaving the most space unused.
    WorstFit,
}

/// Outcome of a placement search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The chosen block, if any qualified.
    pub block: Option<BlockId>,
    /// Block records examined during the search.
    pub examined: usize,
}

impl Placement {
    /// Every policy, in declaration order.
    pub const ALL: [Placement; 4] = [
        Placement::FirstFit,
        Placement::NextFit,
        Placement::BestFit,
        Placement::WorstFit,
    ];

    /// Returns the canonical name (`first-fit`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Placement::FirstFit => "first-fit",
            Placement::NextFit => "next-fit",
            Placement::BestFit => "best-fit",
            Placement::WorstFit => "worst-fit",
        }
    }

    /// Chooses a free block of at least `requested` bytes.
    ///
    /// `cursor` is the block of the last successful allocation and only
    /// matters to [`Placement::NextFit`]; `None` starts at the head.
    #[must_use]
    pub fn select(
        self,
        blocks: &BlockList,
        requested: usize,
        cursor: Option<BlockId>,
    ) -> Selection {
        match self {
            Placement::FirstFit => first_fit(blocks, requested),
            Placement::NextFit => next_fit(blocks, requested, cursor),
            Placement::BestFit => best_fit(blocks, requested),
            Placement::WorstFit => worst_fit(blocks, requested),
        }
    }
}

fn first_fit(blocks: &BlockList, requested: usize) -> Selection {
    let mut scan = blocks.scan(requested);
    let block = scan.next().map(|(id, _)| id);
    Selection {
        block,
        examined: scan.visited(),
    }
}

fn next_fit(
    blocks: &BlockList,
    requested: usize,
    cursor: Option<BlockId>,
) -> Selection {
    let origin = cursor
        .and_then(|c| blocks.get(c))
        .and_then(Block::next)
        .unwrap_or_else(|| blocks.head());

    let mut scan = blocks.scan_from(origin, requested);
    let block = scan.next().map(|(id, _)| id);
    Selection {
        block,
        examined: scan.visited(),
    }
}

fn best_fit(blocks: &BlockList, requested: usize) -> Selection {
    let mut scan = blocks.scan(requested);
    let mut best: Option<(BlockId, usize)> = None;

    for (id, block) in scan.by_ref() {
        if best.is_none_or(|(_, size)| block.size() < size) {
            best = Some((id, block.size()));
        }
        if block.size() == requested {
            break;
        }
    }

    Selection {
        block: best.map(|(id, _)| id),
        examined: scan.visited(),
    }
}

fn worst_fit(blocks: &BlockList, requested: usize) -> Selection {
    let mut scan = blocks.scan(requested);
    let mut worst: Option<(BlockId, usize)> = None;

    for (id, block) in scan.by_ref() {
        if worst.is_none_or(|(_, size)| block.size() > size) {
            worst = Some((id, block.size()));
        }
    }

    Selection {
        block: worst.map(|(id, _)| id),
        examined: scan.visited(),
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = Error;

    /// Parses `first-fit`, `next_fit`, `BestFit`, `worst` and similar
    /// spellings, ignoring case.
    ///
    /// ```
    /// use fitpool::Placement;
    ///
    /// assert_eq!("best-fit".parse(), Ok(Placement::BestFit));
    /// assert_eq!("NEXT_FIT".parse(), Ok(Placement::NextFit));
    /// assert!("buddy".parse::<Placement>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.strip_suffix("fit").unwrap_or(&normalized) {
            "first" => Ok(Placement::FirstFit),
            "next" => Ok(Placement::NextFit),
            "best" => Ok(Placement::BestFit),
            "worst" => Ok(Placement::WorstFit),
            _ => Err(Error::UnknownAlgorithm { name: s.to_owned() }),
        }
    }
}
