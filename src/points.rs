//! Points systems by championship era.
//!
//! Award schedules taken from the list of Formula One World Championship
//! points scoring systems. Only the finishing-position awards are modelled;
//! fastest-lap and shared-drive bonuses are not.

use crate::models::Season;

const SYSTEM_1950: &[u32] = &[8, 6, 4, 3, 2];
const SYSTEM_1960: &[u32] = &[9, 6, 4, 3, 2, 1];
const SYSTEM_1991: &[u32] = &[10, 6, 4, 3, 2, 1];
const SYSTEM_2003: &[u32] = &[10, 8, 6, 5, 4, 3, 2, 1];
const SYSTEM_2010: &[u32] = &[25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Era table: inclusive first and last year, award schedule
const ERAS: &[(i32, i32, &[u32])] = &[
    (1950, 1959, SYSTEM_1950),
    (1960, 1990, SYSTEM_1960),
    (1991, 2002, SYSTEM_1991),
    (2003, 2009, SYSTEM_2003),
    (2010, i32::MAX, SYSTEM_2010),
];

/// Award schedule in force for `year`, newest system outside known eras
pub fn points_for_year(year: i32) -> &'static [u32] {
    ERAS.iter()
        .find(|(first, last, _)| (*first..=*last).contains(&year))
        .map(|(_, _, points)| *points)
        .unwrap_or(SYSTEM_2010)
}

/// Award schedule for a year label; non-numeric labels get the newest system
pub fn points_for_label(label: &str) -> &'static [u32] {
    label
        .trim()
        .parse::<i32>()
        .map(points_for_year)
        .unwrap_or(SYSTEM_2010)
}

/// Sum of the two largest awards (a one-two finish)
pub fn top_two_sum(points: &[u32]) -> u32 {
    points.iter().take(2).sum()
}

/// Points schedule for a run, honouring a configured override
#[derive(Debug, Clone, Default)]
pub struct PointsSystem {
    override_points: Option<Vec<u32>>,
}

impl PointsSystem {
    pub fn new(override_points: Option<Vec<u32>>) -> Self {
        Self { override_points }
    }

    pub fn for_season(&self, season: &Season) -> Vec<u32> {
        match &self.override_points {
            Some(points) => points.clone(),
            None => match season.year() {
                Some(year) => points_for_year(year).to_vec(),
                None => points_for_label(season.label()).to_vec(),
            },
        }
    }

    /// Most points one car pair can score in a single race
    pub fn max_per_race(&self, season: &Season) -> u32 {
        top_two_sum(&self.for_season(season))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_boundaries_both_sides() {
        assert_eq!(points_for_year(1950), SYSTEM_1950);
        assert_eq!(points_for_year(1959), SYSTEM_1950);
        assert_eq!(points_for_year(1960), SYSTEM_1960);
        assert_eq!(points_for_year(1990), SYSTEM_1960);
        assert_eq!(points_for_year(1991), SYSTEM_1991);
        assert_eq!(points_for_year(2002), SYSTEM_1991);
        assert_eq!(points_for_year(2003), SYSTEM_2003);
        assert_eq!(points_for_year(2009), SYSTEM_2003);
        assert_eq!(points_for_year(2010), SYSTEM_2010);
        assert_eq!(points_for_year(2024), SYSTEM_2010);
    }

    #[test]
    fn test_exactly_one_era_per_year() {
        for year in 1950..2100 {
            let matches = ERAS
                .iter()
                .filter(|(first, last, _)| (*first..=*last).contains(&year))
                .count();
            assert_eq!(matches, 1, "year {} matched {} eras", year, matches);
        }
    }

    #[test]
    fn test_systems_are_longest_first_and_descending() {
        for (_, _, points) in ERAS {
            assert!(points.windows(2).all(|w| w[0] >= w[1]));
        }
        assert_eq!(points_for_year(1955).len(), 5);
        assert_eq!(points_for_year(1975).len(), 6);
        assert_eq!(points_for_year(1995).len(), 6);
        assert_eq!(points_for_year(2005).len(), 8);
        assert_eq!(points_for_year(2015).len(), 10);
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(points_for_year(1900), SYSTEM_2010);
        assert_eq!(points_for_label("1992"), SYSTEM_1991);
        assert_eq!(points_for_label("not a year"), SYSTEM_2010);
    }

    #[test]
    fn test_top_two_sum() {
        assert_eq!(top_two_sum(points_for_year(2010)), 43);
        assert_eq!(top_two_sum(points_for_year(1992)), 16);
        assert_eq!(top_two_sum(&[]), 0);
    }

    #[test]
    fn test_points_system_override() {
        let season = Season::new(1992);
        assert_eq!(PointsSystem::default().max_per_race(&season), 16);

        let overridden = PointsSystem::new(Some(vec![25, 18, 15]));
        assert_eq!(overridden.for_season(&season), vec![25, 18, 15]);
        assert_eq!(overridden.max_per_race(&season), 43);
    }
}
