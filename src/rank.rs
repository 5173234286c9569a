use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Foundation,
    Consistent,
    Focused,
    Driven,
    Relentless,
    Elite,
    GrandDiscipline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankThreshold {
    pub rank: Rank,
    pub min_dr: u32,
    pub max_dr: Option<u32>, // inclusive; None for the open-ended top tier
    pub tier: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextRank {
    pub rank: Rank,
    pub remaining_dr: u32,
}

/// Ascending rank table
pub const RANK_THRESHOLDS: [RankThreshold; 7] = [
    RankThreshold { rank: Rank::Foundation, min_dr: 0, max_dr: Some(99), tier: 1 },
    RankThreshold { rank: Rank::Consistent, min_dr: 100, max_dr: Some(249), tier: 2 },
    RankThreshold { rank: Rank::Focused, min_dr: 250, max_dr: Some(499), tier: 3 },
    RankThreshold { rank: Rank::Driven, min_dr: 500, max_dr: Some(799), tier: 4 },
    RankThreshold { rank: Rank::Relentless, min_dr: 800, max_dr: Some(1199), tier: 5 },
    RankThreshold { rank: Rank::Elite, min_dr: 1200, max_dr: Some(1599), tier: 6 },
    RankThreshold { rank: Rank::GrandDiscipline, min_dr: 1600, max_dr: None, tier: 7 },
];

impl Rank {
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Foundation => "Foundation",
            Rank::Consistent => "Consistent",
            Rank::Focused => "Focused",
            Rank::Driven => "Driven",
            Rank::Relentless => "Relentless",
            Rank::Elite => "Elite",
            Rank::GrandDiscipline => "Grand Discipline",
        }
    }

    pub fn meta(&self) -> RankThreshold {
        RANK_THRESHOLDS
            .iter()
            .copied()
            .find(|t| t.rank == *self)
            .unwrap_or(RANK_THRESHOLDS[0])
    }

    pub fn tier(&self) -> u8 {
        self.meta().tier
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn clamp_dr(dr: i64) -> u32 {
    dr.clamp(0, i64::from(u32::MAX)) as u32
}

/// Highest tier whose minimum the rating has reached. Negative ratings
/// are treated as zero.
pub fn rank_of(dr: i64) -> Rank {
    let dr = clamp_dr(dr);
    RANK_THRESHOLDS
        .iter()
        .rev()
        .find(|t| dr >= t.min_dr)
        .map(|t| t.rank)
        .unwrap_or(Rank::Foundation)
}

/// The first tier above the rating and how far away it is, or `None`
/// when already in the top tier
pub fn next_rank(dr: i64) -> Option<NextRank> {
    let dr = clamp_dr(dr);
    RANK_THRESHOLDS
        .iter()
        .find(|t| t.min_dr > dr)
        .map(|t| NextRank {
            rank: t.rank,
            remaining_dr: t.min_dr - dr,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(rank_of(99), Rank::Foundation);
        assert_eq!(rank_of(100), Rank::Consistent);
        assert_eq!(rank_of(1599), Rank::Elite);
        assert_eq!(rank_of(1600), Rank::GrandDiscipline);
        assert_eq!(rank_of(1600).name(), "Grand Discipline");
        assert_eq!(next_rank(1600), None);
        assert_eq!(next_rank(50_000), None);
    }

    #[test]
    fn negative_ratings_clamp_to_foundation() {
        assert_eq!(rank_of(-40), Rank::Foundation);
        assert_eq!(
            next_rank(-40),
            Some(NextRank { rank: Rank::Consistent, remaining_dr: 100 })
        );
    }

    #[test]
    fn distance_to_next_tier() {
        assert_eq!(
            next_rank(0),
            Some(NextRank { rank: Rank::Consistent, remaining_dr: 100 })
        );
        assert_eq!(
            next_rank(249),
            Some(NextRank { rank: Rank::Focused, remaining_dr: 1 })
        );
        assert_eq!(
            next_rank(1200),
            Some(NextRank { rank: Rank::GrandDiscipline, remaining_dr: 400 })
        );
    }

    #[test]
    fn rank_never_decreases_as_rating_grows() {
        let mut previous = rank_of(0);
        for dr in 0..2_000 {
            let rank = rank_of(dr);
            assert!(rank >= previous);
            let meta = rank.meta();
            assert!(dr as u32 >= meta.min_dr);
            if let Some(max) = meta.max_dr {
                assert!(dr as u32 <= max);
            }
            previous = rank;
        }
    }

    #[test]
    fn tiers_are_numbered_in_order() {
        for (i, threshold) in RANK_THRESHOLDS.iter().enumerate() {
            assert_eq!(threshold.tier as usize, i + 1);
            assert_eq!(threshold.rank.tier(), threshold.tier);
        }
    }
}
