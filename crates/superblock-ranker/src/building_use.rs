//! Building-use scoring and per-parcel aggregation.
//!
//! Every existing building is scored from its class code: housing scores
//! high, industry, storage and traffic buildings low. The per-parcel sum of
//! those scores becomes the raw `score_gebaeude_sum` of the candidate block.

use std::collections::BTreeMap;

use serde::Serialize;
use superblock_common::{AttributeValue, BuildingRecord, CandidateFeature, FeatureId};
use superblock_db::BuildingSumRow;
use tracing::{debug, info};

/// Origin of the building dataset; decides which code fields are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingSource {
    /// Federal register: `GKLAS` class, `GSTAT` status.
    Gwr,
    /// Cantonal inventory: `GEBKATEGO` category, `GEBSTATUS` status.
    Cantonal,
}

impl BuildingSource {
    /// GWR if any record carries a `GKLAS` code, cantonal otherwise.
    pub fn detect(buildings: &[BuildingRecord]) -> Self {
        if buildings.iter().any(|b| b.gklas.is_some()) {
            BuildingSource::Gwr
        } else {
            BuildingSource::Cantonal
        }
    }

    fn code(&self, b: &BuildingRecord) -> Option<i64> {
        match self {
            BuildingSource::Gwr => b.gklas,
            BuildingSource::Cantonal => b.gebkatego,
        }
    }

    fn status(&self, b: &BuildingRecord) -> Option<i64> {
        match self {
            BuildingSource::Gwr => b.gstat,
            BuildingSource::Cantonal => b.gebstatus,
        }
    }

    /// Score and label of a class code, `None` for unknown codes.
    pub fn classify(&self, code: i64) -> Option<(i32, &'static str)> {
        let table = match self {
            BuildingSource::Gwr => GWR_CLASSES,
            BuildingSource::Cantonal => CANTONAL_CATEGORIES,
        };
        table
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|&(_, score, label)| (score, label))
    }
}

impl std::fmt::Display for BuildingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildingSource::Gwr => write!(f, "GWR (GKLAS)"),
            BuildingSource::Cantonal => write!(f, "cantonal (GEBKATEGO)"),
        }
    }
}

/// GWR building classes: (GKLAS, score, label).
const GWR_CLASSES: &[(i64, i32, &str)] = &[
    (1110, 3, "Building with one dwelling"),
    (1121, 3, "Building with two dwellings"),
    (1122, 3, "Building with three or more dwellings"),
    (1130, 2, "Residential building for communities"),
    (1211, 1, "Hotel building"),
    (1212, 1, "Other short-stay accommodation"),
    (1220, 0, "Office building"),
    (1230, 1, "Wholesale and retail building"),
    (1231, 1, "Restaurants and bars without residential use"),
    (1241, -2, "Transport and communication building without garages"),
    (1242, -2, "Garage building"),
    (1251, -3, "Industrial building"),
    (1252, -3, "Tanks, silos and warehouses"),
    (1261, 2, "Culture and leisure building"),
    (1262, 1, "Museums and libraries"),
    (1263, 1, "School, university and research building"),
    (1264, -2, "Hospitals and healthcare facilities"),
    (1265, 0, "Sports halls"),
    (1271, -2, "Agricultural operations building"),
    (1272, 0, "Churches and other religious buildings"),
    (1273, -2, "Monuments and listed structures"),
    (1274, -1, "Other structures not elsewhere classified"),
    (1275, 1, "Other collective accommodation"),
    (1276, -3, "Livestock building"),
    (1277, -3, "Crop production building"),
    (1278, -3, "Other agricultural building"),
];

/// Cantonal building categories: (GEBKATEGO, score, label).
const CANTONAL_CATEGORIES: &[(i64, i32, &str)] = &[
    (1021, 2, "Purely residential building"),
    (1025, 3, "Purely residential building (multi-family)"),
    (1030, 1, "Other residential building"),
    (1040, 0, "Other building with secondary residential use"),
    (1060, -1, "Other building without residential use"),
    (1080, -3, "Special structure"),
    (1090, -2, "Unknown building category"),
];

/// Outcome of aggregating a building dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingSummary {
    pub source: BuildingSource,
    /// One row per parcel holding at least one existing building.
    pub parcels: Vec<BuildingSumRow>,
    /// Buildings dropped because their status is not "existing".
    pub not_existing: usize,
    /// Existing buildings whose code has no score.
    pub unclassified: usize,
    /// Existing buildings outside every parcel.
    pub unassigned: usize,
}

impl BuildingSummary {
    pub fn sums(&self) -> BTreeMap<FeatureId, Option<i64>> {
        self.parcels
            .iter()
            .map(|row| (row.parcel_id, row.score_gebaeude_sum))
            .collect()
    }
}

/// Filter existing buildings, score them and sum the scores per parcel.
///
/// A parcel whose existing buildings all have unknown codes keeps a `None`
/// sum, matching the null a spatial join would produce.
pub fn aggregate_by_parcel(buildings: &[BuildingRecord], existing_status: i64) -> BuildingSummary {
    let source = BuildingSource::detect(buildings);
    let mut per_parcel: BTreeMap<FeatureId, (Option<i64>, usize)> = BTreeMap::new();
    let mut not_existing = 0;
    let mut unclassified = 0;
    let mut unassigned = 0;

    for building in buildings {
        if source.status(building) != Some(existing_status) {
            not_existing += 1;
            continue;
        }
        let score = source.code(building).and_then(|c| source.classify(c)).map(|(s, _)| s);
        if score.is_none() {
            unclassified += 1;
        }
        let Some(parcel) = building.parcel_id else {
            unassigned += 1;
            continue;
        };
        let entry = per_parcel.entry(parcel).or_insert((None, 0));
        entry.1 += 1;
        if let Some(s) = score {
            entry.0 = Some(entry.0.unwrap_or(0) + i64::from(s));
        }
    }

    info!(
        %source,
        parcels = per_parcel.len(),
        not_existing,
        unclassified,
        unassigned,
        "Building scores aggregated"
    );

    BuildingSummary {
        source,
        parcels: per_parcel
            .into_iter()
            .map(|(parcel_id, (sum, count))| BuildingSumRow {
                parcel_id,
                score_gebaeude_sum: sum,
                building_count: count,
            })
            .collect(),
        not_existing,
        unclassified,
        unassigned,
    }
}

/// Replace each candidate's `building_score_sum` with its parcel sum.
/// Candidates without a scored building get `Null`. Returns the number of
/// candidates that received a value.
pub fn apply_building_sums(candidates: &mut [CandidateFeature], sums: &BTreeMap<FeatureId, Option<i64>>) -> usize {
    let mut assigned = 0;
    for candidate in candidates.iter_mut() {
        candidate.building_score_sum = match sums.get(&candidate.id).copied().flatten() {
            Some(sum) => {
                assigned += 1;
                AttributeValue::Integer(sum)
            }
            None => AttributeValue::Null,
        };
    }
    debug!(assigned, total = candidates.len(), "Building sums applied");
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use superblock_test_utils::fixtures::{cantonal_building, candidate, gwr_building};

    #[test]
    fn test_gwr_table() {
        let gwr = BuildingSource::Gwr;
        assert_eq!(gwr.classify(1110).map(|c| c.0), Some(3));
        assert_eq!(gwr.classify(1130).map(|c| c.0), Some(2));
        assert_eq!(gwr.classify(1220).map(|c| c.0), Some(0));
        assert_eq!(gwr.classify(1242).map(|c| c.0), Some(-2));
        assert_eq!(gwr.classify(1251).map(|c| c.0), Some(-3));
        assert_eq!(gwr.classify(1274).map(|c| c.0), Some(-1));
        assert_eq!(gwr.classify(1278).map(|c| c.0), Some(-3));
        assert_eq!(gwr.classify(9999), None);
        assert!(GWR_CLASSES.iter().all(|(_, s, _)| (-3..=3).contains(s)));
    }

    #[test]
    fn test_cantonal_table() {
        let kt = BuildingSource::Cantonal;
        assert_eq!(kt.classify(1021).map(|c| c.0), Some(2));
        assert_eq!(kt.classify(1025).map(|c| c.0), Some(3));
        assert_eq!(kt.classify(1080).map(|c| c.0), Some(-3));
        assert_eq!(kt.classify(1090).map(|c| c.0), Some(-2));
        // GWR codes mean nothing in the cantonal table
        assert_eq!(kt.classify(1110), None);
    }

    #[test]
    fn test_source_detection() {
        assert_eq!(BuildingSource::detect(&[gwr_building(1, 1110)]), BuildingSource::Gwr);
        assert_eq!(BuildingSource::detect(&[cantonal_building(1, 1021)]), BuildingSource::Cantonal);
        assert_eq!(BuildingSource::detect(&[]), BuildingSource::Cantonal);
    }

    #[test]
    fn test_sum_per_parcel() {
        let buildings = vec![
            gwr_building(1, 1110),
            gwr_building(1, 1122),
            gwr_building(1, 1251),
            gwr_building(2, 1242),
        ];
        let summary = aggregate_by_parcel(&buildings, 1004);
        assert_eq!(
            summary.parcels,
            vec![
                BuildingSumRow { parcel_id: 1, score_gebaeude_sum: Some(3), building_count: 3 },
                BuildingSumRow { parcel_id: 2, score_gebaeude_sum: Some(-2), building_count: 1 },
            ]
        );
        assert_eq!(summary.source, BuildingSource::Gwr);
    }

    #[test]
    fn test_status_filter() {
        let mut demolished = gwr_building(1, 1251);
        demolished.gstat = Some(1007);
        let mut planned = gwr_building(1, 1251);
        planned.gstat = None;
        let buildings = vec![gwr_building(1, 1110), demolished, planned];

        let summary = aggregate_by_parcel(&buildings, 1004);
        assert_eq!(summary.not_existing, 2);
        assert_eq!(summary.sums()[&1], Some(3));
    }

    #[test]
    fn test_unknown_codes_and_unassigned_buildings() {
        let mut outside = cantonal_building(0, 1025);
        outside.parcel_id = None;
        let buildings = vec![cantonal_building(5, 4242), outside, cantonal_building(6, 1060)];

        let summary = aggregate_by_parcel(&buildings, 1004);
        assert_eq!(summary.unclassified, 1);
        assert_eq!(summary.unassigned, 1);
        assert_eq!(summary.sums()[&5], None);
        assert_eq!(summary.sums()[&6], Some(-1));
    }

    #[test]
    fn test_apply_building_sums() {
        let mut candidates = vec![
            candidate(1, AttributeValue::Null, 10.0, 10.0),
            candidate(2, 99, 10.0, 10.0),
            candidate(3, AttributeValue::Null, 10.0, 10.0),
        ];
        let sums = BTreeMap::from([(1, Some(7)), (3, None)]);

        assert_eq!(apply_building_sums(&mut candidates, &sums), 1);
        assert_eq!(candidates[0].building_score_sum, AttributeValue::Integer(7));
        assert_eq!(candidates[1].building_score_sum, AttributeValue::Null);
        assert_eq!(candidates[2].building_score_sum, AttributeValue::Null);
    }
}
