//! Election result aggregation.
//!
//! Ingests per-candidate rows into per-ward results, per-body seat
//! counts and winners, and the state-wide front tally the legend shows.
//!
//! Every container on the aggregation path is an insertion-ordered
//! `Vec`, keyed by first appearance in the row sequence. The body
//! winner tie-break walks seat counters in that order, so a tie flips
//! the running winner to TIE at a reproducible point — results are a
//! pure function of the row sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ingest::ElectionRow;

/// Political front (alliance) affiliation.
///
/// `Ind` is a display-only subcategory of `Oth`; tallies fold it into
/// the OTH bucket. `Tie` is a sentinel produced by aggregation, never
/// parsed from source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Front {
    Nda,
    Udf,
    Ldf,
    Oth,
    Ind,
    Tie,
}

impl Front {
    /// Parse a source front label. Unrecognized or empty labels default
    /// to `Oth`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "NDA" => Front::Nda,
            "UDF" => Front::Udf,
            "LDF" => Front::Ldf,
            "IND" => Front::Ind,
            _ => Front::Oth,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Front::Nda => "NDA",
            Front::Udf => "UDF",
            Front::Ldf => "LDF",
            Front::Oth => "OTH",
            Front::Ind => "IND",
            Front::Tie => "TIE",
        }
    }

    /// One of the three state-wide alliances (NDA/UDF/LDF)?
    pub fn is_major(&self) -> bool {
        matches!(self, Front::Nda | Front::Udf | Front::Ldf)
    }
}

impl fmt::Display for Front {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate's result in one ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct CandidateRecord {
    pub name: String,
    pub party: String,
    pub front: Front,
    pub votes: u32,
    /// Rank supplied by the source data (1 = winner), not recomputed
    /// from votes.
    pub rank: u32,
}

/// Aggregated result for one ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct WardResult {
    pub ward_no: u32,
    /// Candidates in row order.
    pub candidates: Vec<CandidateRecord>,
    /// The rank-1 candidate. When a second rank-1 row arrives for the
    /// same ward the record keeps the first candidate's details but its
    /// front is overwritten to `Tie` — a data-quality fallback, not a
    /// recount.
    pub winner: Option<CandidateRecord>,
    pub is_tie: bool,
    pub total_votes: u64,
}

impl WardResult {
    fn new(ward_no: u32) -> Self {
        Self {
            ward_no,
            candidates: Vec::new(),
            winner: None,
            is_tie: false,
            total_votes: 0,
        }
    }

    /// Candidates ordered by descending votes (row order for equal
    /// votes) — the order the results panel lists them in.
    pub fn candidates_by_votes(&self) -> Vec<&CandidateRecord> {
        let mut ordered: Vec<&CandidateRecord> = self.candidates.iter().collect();
        ordered.sort_by(|a, b| b.votes.cmp(&a.votes));
        ordered
    }

    /// A candidate's share of the ward's total votes, in percent.
    pub fn vote_share(&self, candidate: &CandidateRecord) -> f64 {
        if self.total_votes == 0 {
            return 0.0;
        }
        candidate.votes as f64 / self.total_votes as f64 * 100.0
    }

    /// A candidate's votes relative to the leading candidate, 0..=1
    /// (drives the result bar widths).
    pub fn bar_fraction(&self, candidate: &CandidateRecord) -> f64 {
        let max = self.candidates.iter().map(|c| c.votes).max().unwrap_or(0);
        if max == 0 {
            return 0.0;
        }
        candidate.votes as f64 / max as f64
    }
}

/// Seat count for one front within one body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FrontSeats {
    pub front: Front,
    pub seats: u32,
}

/// Aggregated results for one local body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct BodyResults {
    /// Body name as spelled by the election dataset.
    pub name: String,
    /// Wards in first-appearance order.
    pub wards: Vec<WardResult>,
    /// Ward-winner seat counts per front, in first-win order. A ward
    /// later marked tied keeps the seat it already granted.
    pub seats: Vec<FrontSeats>,
    /// Front with the most ward seats; `Tie` when the maximum is
    /// shared. `None` when no ward in the body produced a winner.
    pub winner: Option<Front>,
}

impl BodyResults {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            wards: Vec::new(),
            seats: Vec::new(),
            winner: None,
        }
    }

    pub fn ward(&self, ward_no: u32) -> Option<&WardResult> {
        self.wards.iter().find(|w| w.ward_no == ward_no)
    }
}

/// Aggregated results for one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct DistrictResults {
    pub name: String,
    pub bodies: Vec<BodyResults>,
}

/// State-wide ward-winner counts per front (not vote sums) — the
/// numbers behind the state legend. IND and unrecognized fronts bucket
/// into OTH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FrontTally {
    pub nda: u32,
    pub udf: u32,
    pub ldf: u32,
    pub oth: u32,
}

impl FrontTally {
    fn bump(&mut self, front: Front) {
        match front {
            Front::Nda => self.nda += 1,
            Front::Udf => self.udf += 1,
            Front::Ldf => self.ldf += 1,
            _ => self.oth += 1,
        }
    }
}

/// The complete aggregation output: per-ward results, per-body winners,
/// and the global tally. Replaced wholesale on dataset reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ElectionResults {
    /// Districts in first-appearance order.
    pub districts: Vec<DistrictResults>,
    pub totals: FrontTally,
}

impl ElectionResults {
    pub fn district(&self, name: &str) -> Option<&DistrictResults> {
        self.districts.iter().find(|d| d.name == name)
    }
}

fn position_or_push<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool, make: impl FnOnce() -> T) -> usize {
    match items.iter().position(|item| matches(item)) {
        Some(i) => i,
        None => {
            items.push(make());
            items.len() - 1
        }
    }
}

/// Aggregate election rows.
///
/// Each row appends a candidate to its ward and accumulates votes. A
/// rank-1 row either installs the ward winner (counting a global and a
/// body seat for its front) or, when a winner already exists, marks the
/// ward tied and overwrites the existing winner's front with `Tie`.
/// Body winners are decided afterwards by plurality of ward seats.
pub fn aggregate_elections(rows: &[ElectionRow]) -> ElectionResults {
    let mut results = ElectionResults::default();
    let ElectionResults { districts, totals } = &mut results;

    for row in rows {
        let di = position_or_push(
            districts,
            |d| d.name == row.district,
            || DistrictResults {
                name: row.district.clone(),
                bodies: Vec::new(),
            },
        );
        let bi = position_or_push(
            &mut districts[di].bodies,
            |b| b.name == row.lsgd,
            || BodyResults::new(&row.lsgd),
        );
        let body = &mut districts[di].bodies[bi];
        let wi = position_or_push(
            &mut body.wards,
            |w| w.ward_no == row.ward_no,
            || WardResult::new(row.ward_no),
        );

        let candidate = CandidateRecord {
            name: row.candidate.clone(),
            party: row.party.clone(),
            front: Front::parse(&row.front),
            votes: row.votes,
            rank: row.rank,
        };

        let ward = &mut body.wards[wi];
        ward.candidates.push(candidate.clone());
        ward.total_votes += row.votes as u64;

        if row.rank == 1 {
            if ward.winner.is_some() {
                ward.is_tie = true;
                if let Some(winner) = ward.winner.as_mut() {
                    winner.front = Front::Tie;
                }
            } else {
                let front = candidate.front;
                ward.winner = Some(candidate);
                totals.bump(front);
                let si = position_or_push(
                    &mut body.seats,
                    |s| s.front == front,
                    || FrontSeats { front, seats: 0 },
                );
                body.seats[si].seats += 1;
            }
        }
    }

    // Body winners: plurality of ward seats, insertion order, a later
    // front matching the running maximum flips the result to TIE
    for district in districts.iter_mut() {
        for body in district.bodies.iter_mut() {
            if body.seats.is_empty() {
                continue;
            }
            let mut max: i64 = -1;
            let mut winner = Front::Tie;
            for entry in &body.seats {
                let seats = entry.seats as i64;
                if seats > max {
                    max = seats;
                    winner = entry.front;
                } else if seats == max {
                    winner = Front::Tie;
                }
            }
            body.winner = Some(winner);
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        district: &str,
        lsgd: &str,
        ward_no: u32,
        rank: u32,
        front: &str,
        candidate: &str,
        votes: u32,
    ) -> ElectionRow {
        ElectionRow {
            district: district.to_string(),
            lsgd: lsgd.to_string(),
            ward_no,
            rank,
            front: front.to_string(),
            candidate: candidate.to_string(),
            party: format!("{} party", front),
            votes,
        }
    }

    #[test]
    fn test_front_parse() {
        assert_eq!(Front::parse("ldf"), Front::Ldf);
        assert_eq!(Front::parse(" NDA "), Front::Nda);
        assert_eq!(Front::parse("IND"), Front::Ind);
        assert_eq!(Front::parse("SOMETHING"), Front::Oth);
        assert_eq!(Front::parse(""), Front::Oth);
    }

    #[test]
    fn test_single_winner() {
        let rows = vec![
            row("Palakkad", "Ala", 1, 1, "LDF", "Winner", 900),
            row("Palakkad", "Ala", 1, 2, "UDF", "Runner", 700),
        ];
        let results = aggregate_elections(&rows);
        let ward = results.district("Palakkad").unwrap().bodies[0].ward(1).unwrap();
        assert!(!ward.is_tie);
        assert_eq!(ward.winner.as_ref().unwrap().name, "Winner");
        assert_eq!(ward.winner.as_ref().unwrap().front, Front::Ldf);
        assert_eq!(ward.total_votes, 1600);
        assert_eq!(results.totals.ldf, 1);
    }

    #[test]
    fn test_duplicate_rank_one_marks_tie() {
        let rows = vec![
            row("Palakkad", "Ala", 1, 1, "LDF", "First", 800),
            row("Palakkad", "Ala", 1, 1, "UDF", "Second", 800),
        ];
        let results = aggregate_elections(&rows);
        let ward = results.district("Palakkad").unwrap().bodies[0].ward(1).unwrap();
        assert!(ward.is_tie);
        let winner = ward.winner.as_ref().unwrap();
        // Only the front label changes; the first candidate's details stay
        assert_eq!(winner.front, Front::Tie);
        assert_eq!(winner.name, "First");
        // The seat and the global count granted to the first front are
        // not taken back — order-sensitive by design, pinned here
        assert_eq!(results.totals.ldf, 1);
        assert_eq!(results.totals.udf, 0);
        let body = &results.district("Palakkad").unwrap().bodies[0];
        assert_eq!(body.seats, vec![FrontSeats { front: Front::Ldf, seats: 1 }]);
    }

    #[test]
    fn test_body_winner_plurality() {
        // NDA 3, UDF 2, LDF 1
        let rows = vec![
            row("Palakkad", "Ala", 1, 1, "NDA", "a", 10),
            row("Palakkad", "Ala", 2, 1, "NDA", "b", 10),
            row("Palakkad", "Ala", 3, 1, "NDA", "c", 10),
            row("Palakkad", "Ala", 4, 1, "UDF", "d", 10),
            row("Palakkad", "Ala", 5, 1, "UDF", "e", 10),
            row("Palakkad", "Ala", 6, 1, "LDF", "f", 10),
        ];
        let results = aggregate_elections(&rows);
        let body = &results.district("Palakkad").unwrap().bodies[0];
        assert_eq!(body.winner, Some(Front::Nda));
    }

    #[test]
    fn test_body_winner_tie() {
        // 2-2 at the maximum resolves to TIE, not to either front
        let rows = vec![
            row("Palakkad", "Ala", 1, 1, "NDA", "a", 10),
            row("Palakkad", "Ala", 2, 1, "NDA", "b", 10),
            row("Palakkad", "Ala", 3, 1, "UDF", "c", 10),
            row("Palakkad", "Ala", 4, 1, "UDF", "d", 10),
            row("Palakkad", "Ala", 5, 1, "LDF", "e", 10),
        ];
        let results = aggregate_elections(&rows);
        let body = &results.district("Palakkad").unwrap().bodies[0];
        assert_eq!(body.winner, Some(Front::Tie));
    }

    #[test]
    fn test_unknown_front_buckets_into_oth() {
        let rows = vec![
            row("Palakkad", "Ala", 1, 1, "TWENTY20", "a", 10),
            row("Palakkad", "Ala", 2, 1, "IND", "b", 10),
        ];
        let results = aggregate_elections(&rows);
        assert_eq!(results.totals.oth, 2);
        // IND keeps its identity at candidate level
        let body = &results.district("Palakkad").unwrap().bodies[0];
        assert_eq!(body.ward(2).unwrap().winner.as_ref().unwrap().front, Front::Ind);
    }

    #[test]
    fn test_no_rank_one_leaves_body_undecided() {
        let rows = vec![row("Palakkad", "Ala", 1, 2, "LDF", "a", 10)];
        let results = aggregate_elections(&rows);
        let body = &results.district("Palakkad").unwrap().bodies[0];
        assert_eq!(body.winner, None);
        assert!(body.ward(1).unwrap().winner.is_none());
    }

    #[test]
    fn test_candidates_by_votes_and_shares() {
        let rows = vec![
            row("Palakkad", "Ala", 1, 2, "UDF", "Runner", 300),
            row("Palakkad", "Ala", 1, 1, "LDF", "Winner", 700),
        ];
        let results = aggregate_elections(&rows);
        let ward = results.district("Palakkad").unwrap().bodies[0].ward(1).unwrap();

        let ordered = ward.candidates_by_votes();
        assert_eq!(ordered[0].name, "Winner");
        assert_eq!(ordered[1].name, "Runner");

        assert!((ward.vote_share(ordered[0]) - 70.0).abs() < 1e-9);
        assert!((ward.bar_fraction(ordered[1]) - 300.0 / 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_districts_keep_insertion_order() {
        let rows = vec![
            row("Thrissur", "Kodungallur", 1, 1, "UDF", "a", 10),
            row("Palakkad", "Ala", 1, 1, "LDF", "b", 10),
            row("Thrissur", "Kodungallur", 2, 1, "LDF", "c", 10),
        ];
        let results = aggregate_elections(&rows);
        let names: Vec<&str> = results.districts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Thrissur", "Palakkad"]);
    }
}
